//! Discounted cash flow with a clinical-stage-adjusted terminal value.
//!
//! FCF is approximated as revenue x EBITDA margin; no capex or working-capital
//! adjustments are applied.

use crate::domain::{
    DomainError, PROJECTION_YEARS, ValuationInputs, ValuationMethod, ValuationResult,
    YearProjection,
};

pub const PV_OF_PROJECTED_FCF: &str = "PV of Projected FCF";
pub const TERMINAL_VALUE: &str = "Terminal Value";
pub const PV_OF_TERMINAL_VALUE: &str = "PV of Terminal Value";
pub const ENTERPRISE_VALUE: &str = "Enterprise Value";
pub const IMPLIED_EV_REVENUE: &str = "Implied EV/Revenue Multiple";
pub const RISK_ADJUSTMENT: &str = "Risk Adjustment Applied";

/// Rejects inputs that would produce an infinite, negative-denominator or NaN valuation.
pub fn validate(inputs: &ValuationInputs) -> Result<(), DomainError> {
    let scalars = [
        ("current revenue", inputs.current_revenue),
        ("EBITDA margin", inputs.ebitda_margin),
        ("discount rate", inputs.discount_rate),
        ("terminal growth rate", inputs.terminal_growth_rate),
    ];
    for (label, v) in scalars {
        if !v.is_finite() {
            return Err(DomainError::invalid(format!("{label} must be a finite number")));
        }
    }
    if let Some(year) = inputs
        .revenue_growth_rates
        .iter()
        .position(|g| !g.is_finite())
    {
        return Err(DomainError::invalid(format!(
            "growth rate for year {} must be a finite number",
            year + 1
        )));
    }
    if inputs.current_revenue <= 0.0 {
        return Err(DomainError::invalid(format!(
            "current revenue must be positive, got {}",
            inputs.current_revenue
        )));
    }
    if inputs.discount_rate <= -1.0 {
        return Err(DomainError::invalid("discount rate must be above -100%"));
    }
    if inputs.discount_rate <= inputs.terminal_growth_rate {
        return Err(DomainError::invalid(format!(
            "discount rate ({:.2}%) must exceed terminal growth rate ({:.2}%)",
            inputs.discount_rate * 100.0,
            inputs.terminal_growth_rate * 100.0
        )));
    }
    Ok(())
}

/// Projects revenue and free cash flow over the explicit horizon.
///
/// Does not validate the rate pair; call [`validate`] first when the discount
/// factors matter.
pub fn project(inputs: &ValuationInputs) -> Vec<YearProjection> {
    let mut revenue = inputs.current_revenue;
    inputs
        .revenue_growth_rates
        .iter()
        .enumerate()
        .map(|(i, growth)| {
            let year = (i + 1) as u32;
            revenue *= 1.0 + growth;
            let free_cash_flow = revenue * inputs.ebitda_margin;
            let discount_factor = (1.0 + inputs.discount_rate).powi(-(year as i32));
            YearProjection {
                year,
                revenue,
                ebitda_margin: inputs.ebitda_margin,
                free_cash_flow,
                discount_factor,
                pv_free_cash_flow: free_cash_flow * discount_factor,
            }
        })
        .collect()
}

/// Perpetuity-growth terminal value on the final year's FCF, scaled by the stage risk factor.
pub fn risk_adjusted_terminal_value(inputs: &ValuationInputs, final_fcf: f64) -> f64 {
    let r = inputs.discount_rate;
    let g = inputs.terminal_growth_rate;
    let terminal = final_fcf * (1.0 + g) / (r - g);
    terminal * inputs.clinical_stage.risk_factor()
}

/// Enterprise value via DCF.
pub fn calculate(inputs: &ValuationInputs) -> Result<ValuationResult, DomainError> {
    validate(inputs)?;

    let projections = project(inputs);
    let pv_fcf_sum: f64 = projections.iter().map(|p| p.pv_free_cash_flow).sum();
    let final_fcf = projections.last().map(|p| p.free_cash_flow).unwrap_or(0.0);

    let terminal_value = risk_adjusted_terminal_value(inputs, final_fcf);
    let pv_terminal =
        terminal_value / (1.0 + inputs.discount_rate).powi(PROJECTION_YEARS as i32);
    let enterprise_value = pv_fcf_sum + pv_terminal;

    if !enterprise_value.is_finite() {
        return Err(DomainError::invalid(
            "inputs produce a non-finite enterprise value",
        ));
    }

    Ok(ValuationResult::new(ValuationMethod::Dcf, enterprise_value)
        .with(PV_OF_PROJECTED_FCF, pv_fcf_sum)
        .with(TERMINAL_VALUE, terminal_value)
        .with(PV_OF_TERMINAL_VALUE, pv_terminal)
        .with(ENTERPRISE_VALUE, enterprise_value)
        .with(IMPLIED_EV_REVENUE, enterprise_value / inputs.current_revenue)
        .with(RISK_ADJUSTMENT, inputs.clinical_stage.risk_factor()))
}
