//! Valuation use case. Request/response entry point over every calculator.
//!
//! Each request names a method and carries its inputs; the response carries the
//! result or a typed `DomainError`. Only `comparables` without caller-supplied
//! peers touches the network.

use crate::domain::{
    ComparableCompany, DomainError, SensitivityGrid, StageImpact, ValuationInputs, ValuationResult,
    VcMethodInputs, YearProjection, comparables, dcf, limits, sensitivity, vc_method,
};
use crate::usecases::comparables_service::{ComparablesRun, ComparablesService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ValuationRequest {
    Dcf {
        inputs: ValuationInputs,
    },
    Comparables {
        inputs: ValuationInputs,
        #[serde(default = "default_true")]
        apply_growth_premium: bool,
        /// Caller-supplied peers; when absent they are fetched.
        #[serde(default)]
        comparables: Option<Vec<ComparableCompany>>,
    },
    Vc {
        inputs: VcMethodInputs,
    },
    Sensitivity {
        inputs: ValuationInputs,
        #[serde(default)]
        discount_rates: Option<Vec<f64>>,
        #[serde(default)]
        terminal_growth_rates: Option<Vec<f64>>,
    },
    StageImpact {
        inputs: ValuationInputs,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ValuationResponse {
    Dcf {
        result: ValuationResult,
        projections: Vec<YearProjection>,
    },
    Comparables(ComparablesRun),
    Vc {
        result: ValuationResult,
    },
    Sensitivity {
        grid: SensitivityGrid,
    },
    StageImpact {
        rows: Vec<StageImpact>,
    },
}

pub struct ValuationService {
    comparables: Arc<ComparablesService>,
}

impl ValuationService {
    pub fn new(comparables: Arc<ComparablesService>) -> Self {
        Self { comparables }
    }

    /// Drop cached peer data so the next comparables run fetches fresh quotes.
    pub async fn refresh_market_data(&self) -> usize {
        self.comparables.refresh().await
    }

    /// DCF result plus the projection table it was built from.
    pub fn dcf(
        &self,
        inputs: &ValuationInputs,
    ) -> Result<(ValuationResult, Vec<YearProjection>), DomainError> {
        let result = dcf::calculate(inputs)?;
        Ok((result, dcf::project(inputs)))
    }

    pub async fn comparables(
        &self,
        inputs: &ValuationInputs,
        apply_growth_premium: bool,
    ) -> Result<ComparablesRun, DomainError> {
        self.comparables.value(inputs, apply_growth_premium).await
    }

    pub fn vc(&self, inputs: &VcMethodInputs) -> Result<ValuationResult, DomainError> {
        vc_method::calculate(inputs)
    }

    pub fn sensitivity(
        &self,
        inputs: &ValuationInputs,
        discount_rates: Option<&[f64]>,
        terminal_growth_rates: Option<&[f64]>,
    ) -> SensitivityGrid {
        match (discount_rates, terminal_growth_rates) {
            (None, None) => sensitivity::default_grid(inputs),
            (rates, growths) => {
                let default_rates = sensitivity::linspace(
                    sensitivity::DEFAULT_DISCOUNT_RANGE.0,
                    sensitivity::DEFAULT_DISCOUNT_RANGE.1,
                    sensitivity::DEFAULT_STEPS,
                );
                let default_growths = sensitivity::linspace(
                    sensitivity::DEFAULT_GROWTH_RANGE.0,
                    sensitivity::DEFAULT_GROWTH_RANGE.1,
                    sensitivity::DEFAULT_STEPS,
                );
                sensitivity::analyze(
                    inputs,
                    rates.unwrap_or(&default_rates),
                    growths.unwrap_or(&default_growths),
                )
            }
        }
    }

    pub fn stage_impact(&self, inputs: &ValuationInputs) -> Result<Vec<StageImpact>, DomainError> {
        sensitivity::stage_impact(inputs)
    }

    /// Dispatch one request. Calling twice with the same request gives the same
    /// answer, except for `comparables` whose live peers may change between fetches.
    ///
    /// Inputs are held to the same ranges the interactive prompts enforce.
    pub async fn handle(
        &self,
        request: ValuationRequest,
    ) -> Result<ValuationResponse, DomainError> {
        match &request {
            ValuationRequest::Vc { inputs } => limits::check_vc_inputs(inputs)?,
            ValuationRequest::Dcf { inputs }
            | ValuationRequest::Comparables { inputs, .. }
            | ValuationRequest::Sensitivity { inputs, .. }
            | ValuationRequest::StageImpact { inputs } => limits::check_inputs(inputs)?,
        }
        match request {
            ValuationRequest::Dcf { inputs } => {
                let (result, projections) = self.dcf(&inputs)?;
                info!(name = %inputs.name, ev = result.implied_valuation, "dcf valuation");
                Ok(ValuationResponse::Dcf {
                    result,
                    projections,
                })
            }
            ValuationRequest::Comparables {
                inputs,
                apply_growth_premium,
                comparables: Some(peers),
            } => {
                let valuation = comparables::calculate(&inputs, &peers, apply_growth_premium)?;
                Ok(ValuationResponse::Comparables(ComparablesRun {
                    source: "request",
                    fell_back: false,
                    comparables: peers,
                    valuation,
                }))
            }
            ValuationRequest::Comparables {
                inputs,
                apply_growth_premium,
                comparables: None,
            } => {
                let run = self.comparables(&inputs, apply_growth_premium).await?;
                Ok(ValuationResponse::Comparables(run))
            }
            ValuationRequest::Vc { inputs } => Ok(ValuationResponse::Vc {
                result: self.vc(&inputs)?,
            }),
            ValuationRequest::Sensitivity {
                inputs,
                discount_rates,
                terminal_growth_rates,
            } => Ok(ValuationResponse::Sensitivity {
                grid: self.sensitivity(
                    &inputs,
                    discount_rates.as_deref(),
                    terminal_growth_rates.as_deref(),
                ),
            }),
            ValuationRequest::StageImpact { inputs } => Ok(ValuationResponse::StageImpact {
                rows: self.stage_impact(&inputs)?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::market_data::ReferenceMarketData;
    use std::time::Duration;

    fn service() -> ValuationService {
        let peers = crate::shared::config::DEFAULT_COMPARABLES
            .iter()
            .map(|(t, n)| (t.to_string(), n.to_string()))
            .collect();
        let comps = ComparablesService::new(
            Arc::new(ReferenceMarketData::new()),
            None,
            peers,
            Duration::from_secs(1),
        );
        ValuationService::new(Arc::new(comps))
    }

    fn parse(json: serde_json::Value) -> ValuationRequest {
        serde_json::from_value(json).unwrap()
    }

    fn inputs_json() -> serde_json::Value {
        serde_json::to_value(ValuationInputs::default()).unwrap()
    }

    #[tokio::test]
    async fn test_dcf_request() {
        let req = parse(serde_json::json!({"method": "dcf", "inputs": inputs_json()}));
        match service().handle(req).await.unwrap() {
            ValuationResponse::Dcf {
                result,
                projections,
            } => {
                assert!(result.implied_valuation > 0.0);
                assert_eq!(projections.len(), 5);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dcf_request_invalid_rates() {
        let mut inputs = inputs_json();
        inputs["discount_rate"] = serde_json::json!(0.03);
        inputs["terminal_growth_rate"] = serde_json::json!(0.03);
        let req = parse(serde_json::json!({"method": "dcf", "inputs": inputs}));
        let err = service().handle(req).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAssumption(_)));
    }

    #[tokio::test]
    async fn test_vc_request() {
        let req = parse(serde_json::json!({
            "method": "vc",
            "inputs": {"exit_value": 800.0, "target_return_multiple": 5.0, "years_to_exit": 5}
        }));
        match service().handle(req).await.unwrap() {
            ValuationResponse::Vc { result } => assert_eq!(result.implied_valuation, 160.0),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_comparables_with_supplied_peers() {
        let req = parse(serde_json::json!({
            "method": "comparables",
            "inputs": inputs_json(),
            "comparables": [
                {"ticker": "A", "name": "A", "ev_revenue_multiple": 4.0, "growth_rate": null}
            ]
        }));
        let err = service().handle(req).await.unwrap_err();
        assert_eq!(err, DomainError::InsufficientComparables { valid: 1 });
    }

    #[tokio::test]
    async fn test_comparables_fetched() {
        let req = parse(serde_json::json!({"method": "comparables", "inputs": inputs_json()}));
        match service().handle(req).await.unwrap() {
            ValuationResponse::Comparables(run) => {
                assert_eq!(run.source, "reference");
                assert!(run.valuation.implied_valuation > 0.0);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sensitivity_custom_axes() {
        let req = parse(serde_json::json!({
            "method": "sensitivity",
            "inputs": inputs_json(),
            "discount_rates": [0.02, 0.12],
        }));
        match service().handle(req).await.unwrap() {
            ValuationResponse::Sensitivity { grid } => {
                assert_eq!(grid.cells.len(), 2);
                assert_eq!(grid.cells[0].len(), sensitivity::DEFAULT_STEPS);
                // 2% discount rate is at or below every default growth rate (2%..5%).
                assert!(grid.cells[0].iter().all(Option::is_none));
                assert!(grid.cells[1].iter().all(Option::is_some));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stage_impact_request() {
        let req = parse(serde_json::json!({"method": "stage_impact", "inputs": inputs_json()}));
        match service().handle(req).await.unwrap() {
            ValuationResponse::StageImpact { rows } => assert_eq!(rows.len(), 5),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_inputs_rejected() {
        let mut inputs = inputs_json();
        inputs["discount_rate"] = serde_json::json!(5.0);
        let req = parse(serde_json::json!({"method": "dcf", "inputs": inputs}));
        let err = service().handle(req).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAssumption(_)));

        let mut inputs = inputs_json();
        inputs["current_revenue"] = serde_json::json!(0.0);
        let req = parse(serde_json::json!({"method": "comparables", "inputs": inputs}));
        let err = service().handle(req).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAssumption(_)));
    }

    #[tokio::test]
    async fn test_refresh_without_cache_drops_nothing() {
        assert_eq!(service().refresh_market_data().await, 0);
    }

    #[test]
    fn test_unknown_method_rejected() {
        let res: Result<ValuationRequest, _> =
            serde_json::from_value(serde_json::json!({"method": "lbo", "inputs": {}}));
        assert!(res.is_err());
    }
}
