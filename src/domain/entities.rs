//! Domain entities. Plain value records for the valuation engine.
//!
//! No HTTP/UI types here; adapters map into these. Percentages are decimal
//! fractions (0.15 = 15%), money is in millions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of explicitly projected years in the DCF.
pub const PROJECTION_YEARS: usize = 5;

/// Regulatory / development maturity of the product. Ordered from least to most mature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalStage {
    PreClinical,
    ClinicalTrials,
    FdaSubmitted,
    FdaCleared,
    ReimbursementSecured,
}

/// Stage -> terminal value risk factor. Monotonically increasing with maturity.
/// Indexed by the stage discriminant, so rows stay in declaration order.
pub const STAGE_RISK_FACTORS: [(ClinicalStage, f64); 5] = [
    (ClinicalStage::PreClinical, 0.40),
    (ClinicalStage::ClinicalTrials, 0.55),
    (ClinicalStage::FdaSubmitted, 0.70),
    (ClinicalStage::FdaCleared, 0.85),
    (ClinicalStage::ReimbursementSecured, 1.00),
];

impl ClinicalStage {
    pub const ALL: [ClinicalStage; 5] = [
        ClinicalStage::PreClinical,
        ClinicalStage::ClinicalTrials,
        ClinicalStage::FdaSubmitted,
        ClinicalStage::FdaCleared,
        ClinicalStage::ReimbursementSecured,
    ];

    /// Risk-adjustment factor applied to the DCF terminal value.
    pub const fn risk_factor(self) -> f64 {
        STAGE_RISK_FACTORS[self as usize].1
    }
}

impl fmt::Display for ClinicalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClinicalStage::PreClinical => "Pre-Clinical/Concept",
            ClinicalStage::ClinicalTrials => "Clinical Trials",
            ClinicalStage::FdaSubmitted => "FDA Submitted",
            ClinicalStage::FdaCleared => "FDA Cleared/CE Marked",
            ClinicalStage::ReimbursementSecured => "Reimbursement Secured",
        };
        f.write_str(label)
    }
}

/// How the startup makes money. Informational; does not change the formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueModel {
    B2bSaas,
    PayerContract,
    ProviderLicensing,
    DirectToConsumer,
}

impl RevenueModel {
    pub const ALL: [RevenueModel; 4] = [
        RevenueModel::B2bSaas,
        RevenueModel::PayerContract,
        RevenueModel::ProviderLicensing,
        RevenueModel::DirectToConsumer,
    ];
}

impl fmt::Display for RevenueModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RevenueModel::B2bSaas => "B2B SaaS",
            RevenueModel::PayerContract => "Payer Contract",
            RevenueModel::ProviderLicensing => "Provider Licensing",
            RevenueModel::DirectToConsumer => "Direct to Consumer",
        };
        f.write_str(label)
    }
}

/// Startup parameters shared by the DCF, comparables and sensitivity calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    #[serde(default = "default_company_name")]
    pub name: String,
    pub current_revenue: f64,
    /// Year-over-year growth for each projected year.
    pub revenue_growth_rates: [f64; PROJECTION_YEARS],
    /// Used as the free cash flow proxy (FCF = revenue x margin).
    pub ebitda_margin: f64,
    pub discount_rate: f64,
    pub terminal_growth_rate: f64,
    pub clinical_stage: ClinicalStage,
    pub revenue_model: RevenueModel,
}

fn default_company_name() -> String {
    "HealthTech Co".to_string()
}

impl Default for ValuationInputs {
    /// Remote patient monitoring startup at $15M ARR with declining growth.
    fn default() -> Self {
        Self {
            name: default_company_name(),
            current_revenue: 15.0,
            revenue_growth_rates: [0.80, 0.60, 0.45, 0.35, 0.25],
            ebitda_margin: 0.20,
            discount_rate: 0.15,
            terminal_growth_rate: 0.03,
            clinical_stage: ClinicalStage::FdaSubmitted,
            revenue_model: RevenueModel::B2bSaas,
        }
    }
}

impl ValuationInputs {
    /// Copy with a different discount / terminal growth pair (sensitivity cells).
    pub fn with_rates(&self, discount_rate: f64, terminal_growth_rate: f64) -> Self {
        Self {
            discount_rate,
            terminal_growth_rate,
            ..self.clone()
        }
    }

    /// Copy with a different clinical stage (stage impact rows).
    pub fn with_stage(&self, clinical_stage: ClinicalStage) -> Self {
        Self {
            clinical_stage,
            ..self.clone()
        }
    }

    /// First projected year's growth; the target growth used against peers.
    pub fn near_term_growth(&self) -> f64 {
        self.revenue_growth_rates[0]
    }
}

/// Raw figures returned by the market-data collaborator for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub enterprise_value: f64,
    pub revenue_ttm: f64,
    pub market_cap: Option<f64>,
    pub revenue_growth: Option<f64>,
}

/// Public peer used by the comparables calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableCompany {
    pub ticker: String,
    pub name: String,
    /// None when the fetch failed or revenue was not positive.
    pub ev_revenue_multiple: Option<f64>,
    pub growth_rate: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub enterprise_value: Option<f64>,
    #[serde(default)]
    pub revenue_ttm: Option<f64>,
}

impl ComparableCompany {
    /// Builds a peer from a snapshot; the multiple is EV / TTM revenue.
    pub fn from_snapshot(ticker: &str, name: &str, snap: &MarketSnapshot) -> Self {
        let multiple = (snap.revenue_ttm > 0.0 && snap.enterprise_value.is_finite())
            .then(|| snap.enterprise_value / snap.revenue_ttm);
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            ev_revenue_multiple: multiple,
            growth_rate: snap.revenue_growth,
            market_cap: snap.market_cap,
            enterprise_value: Some(snap.enterprise_value),
            revenue_ttm: Some(snap.revenue_ttm),
        }
    }

    /// Peer whose data could not be fetched.
    pub fn unavailable(ticker: &str, name: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            ev_revenue_multiple: None,
            growth_rate: None,
            market_cap: None,
            enterprise_value: None,
            revenue_ttm: None,
        }
    }

    /// Usable multiple: present, finite and non-negative.
    pub fn valid_multiple(&self) -> Option<f64> {
        self.ev_revenue_multiple
            .filter(|m| m.is_finite() && *m >= 0.0)
    }
}

/// Inputs for the venture-capital method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcMethodInputs {
    pub exit_value: f64,
    pub target_return_multiple: f64,
    pub years_to_exit: u32,
    #[serde(default)]
    pub expected_dilution: f64,
    #[serde(default)]
    pub current_revenue: Option<f64>,
    #[serde(default)]
    pub exit_revenue: Option<f64>,
}

impl VcMethodInputs {
    /// Exit value from projected exit revenue and an exit EV/Revenue multiple.
    pub fn from_exit_revenue(
        current_revenue: f64,
        exit_revenue: f64,
        exit_multiple: f64,
        target_return_multiple: f64,
        years_to_exit: u32,
        expected_dilution: f64,
    ) -> Self {
        Self {
            exit_value: exit_revenue * exit_multiple,
            target_return_multiple,
            years_to_exit,
            expected_dilution,
            current_revenue: Some(current_revenue),
            exit_revenue: Some(exit_revenue),
        }
    }
}

impl Default for VcMethodInputs {
    /// $100M exit revenue at 8x, 5x target over 5 years.
    fn default() -> Self {
        Self::from_exit_revenue(15.0, 100.0, 8.0, 5.0, 5, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    Dcf,
    Comparables,
    Vc,
}

impl fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuationMethod::Dcf => f.write_str("DCF"),
            ValuationMethod::Comparables => f.write_str("Comparables"),
            ValuationMethod::Vc => f.write_str("VC Method"),
        }
    }
}

/// One labelled number shown alongside a valuation for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateValue {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub method: ValuationMethod,
    pub implied_valuation: f64,
    /// Insertion-ordered so renderers keep the calculator's order.
    pub intermediate_values: Vec<IntermediateValue>,
}

impl ValuationResult {
    pub fn new(method: ValuationMethod, implied_valuation: f64) -> Self {
        Self {
            method,
            implied_valuation,
            intermediate_values: Vec::new(),
        }
    }

    pub fn with(mut self, label: &str, value: f64) -> Self {
        self.intermediate_values.push(IntermediateValue {
            label: label.to_string(),
            value,
        });
        self
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.intermediate_values
            .iter()
            .find(|v| v.label == label)
            .map(|v| v.value)
    }
}

/// One row of the DCF projection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    pub revenue: f64,
    pub ebitda_margin: f64,
    pub free_cash_flow: f64,
    pub discount_factor: f64,
    pub pv_free_cash_flow: f64,
}

/// Discount rate x terminal growth matrix. `None` marks an undefined cell (r <= g).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub discount_rates: Vec<f64>,
    pub terminal_growth_rates: Vec<f64>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl SensitivityGrid {
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn undefined_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_none()).count()
    }
}

/// DCF enterprise value under one clinical stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageImpact {
    pub stage: ClinicalStage,
    pub risk_factor: f64,
    pub enterprise_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_table_endpoints_and_order() {
        assert_eq!(ClinicalStage::PreClinical.risk_factor(), 0.40);
        assert_eq!(ClinicalStage::ReimbursementSecured.risk_factor(), 1.00);
        for pair in STAGE_RISK_FACTORS.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 < pair[1].1);
        }
        for (stage, factor) in STAGE_RISK_FACTORS {
            assert_eq!(stage.risk_factor(), factor);
            assert!((0.40..=1.00).contains(&factor));
        }
    }

    #[test]
    fn test_risk_rows_line_up_with_stages() {
        for (i, stage) in ClinicalStage::ALL.iter().enumerate() {
            assert_eq!(STAGE_RISK_FACTORS[i].0, *stage);
            assert_eq!(*stage as usize, i);
        }
    }

    #[test]
    fn test_comparable_from_snapshot() {
        let snap = MarketSnapshot {
            enterprise_value: 1_200.0,
            revenue_ttm: 400.0,
            market_cap: Some(1_500.0),
            revenue_growth: Some(0.12),
        };
        let c = ComparableCompany::from_snapshot("DOCS", "Doximity", &snap);
        assert_eq!(c.ev_revenue_multiple, Some(3.0));
        assert_eq!(c.valid_multiple(), Some(3.0));
        assert_eq!(c.growth_rate, Some(0.12));
    }

    #[test]
    fn test_comparable_zero_revenue_has_no_multiple() {
        let snap = MarketSnapshot {
            enterprise_value: 500.0,
            revenue_ttm: 0.0,
            market_cap: None,
            revenue_growth: None,
        };
        let c = ComparableCompany::from_snapshot("XYZ", "Pre-revenue", &snap);
        assert_eq!(c.ev_revenue_multiple, None);
        assert_eq!(c.valid_multiple(), None);
    }

    #[test]
    fn test_negative_multiple_is_not_valid() {
        let mut c = ComparableCompany::unavailable("NEG", "Negative EV");
        c.ev_revenue_multiple = Some(-0.4);
        assert_eq!(c.valid_multiple(), None);
    }

    #[test]
    fn test_inputs_json_uses_snake_case_enums() {
        let json = serde_json::to_value(ValuationInputs::default()).unwrap();
        assert_eq!(json["clinical_stage"], "fda_submitted");
        assert_eq!(json["revenue_model"], "b2b_saas");
    }

    #[test]
    fn test_vc_inputs_from_exit_revenue() {
        let vc = VcMethodInputs::default();
        assert_eq!(vc.exit_value, 800.0);
        assert_eq!(vc.exit_revenue, Some(100.0));
    }
}
