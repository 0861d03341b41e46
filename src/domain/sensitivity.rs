//! DCF sensitivity: discount rate x terminal growth grid, and per-stage impact.

use crate::domain::{
    ClinicalStage, DomainError, SensitivityGrid, StageImpact, ValuationInputs, dcf,
};

pub const DEFAULT_DISCOUNT_RANGE: (f64, f64) = (0.10, 0.20);
pub const DEFAULT_GROWTH_RANGE: (f64, f64) = (0.02, 0.05);
pub const DEFAULT_STEPS: usize = 5;

/// `steps` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Re-runs the DCF for each (discount rate, terminal growth) pair.
///
/// A failing cell (r <= g or otherwise invalid) is left undefined; the rest of
/// the grid is still computed.
pub fn analyze(
    inputs: &ValuationInputs,
    discount_rates: &[f64],
    terminal_growth_rates: &[f64],
) -> SensitivityGrid {
    let cells = discount_rates
        .iter()
        .map(|&r| {
            terminal_growth_rates
                .iter()
                .map(|&g| {
                    dcf::calculate(&inputs.with_rates(r, g))
                        .ok()
                        .map(|res| res.implied_valuation)
                })
                .collect()
        })
        .collect();

    SensitivityGrid {
        discount_rates: discount_rates.to_vec(),
        terminal_growth_rates: terminal_growth_rates.to_vec(),
        cells,
    }
}

/// 5x5 grid over 10%-20% discount rate and 2%-5% terminal growth.
pub fn default_grid(inputs: &ValuationInputs) -> SensitivityGrid {
    let rates = linspace(DEFAULT_DISCOUNT_RANGE.0, DEFAULT_DISCOUNT_RANGE.1, DEFAULT_STEPS);
    let growths = linspace(DEFAULT_GROWTH_RANGE.0, DEFAULT_GROWTH_RANGE.1, DEFAULT_STEPS);
    analyze(inputs, &rates, &growths)
}

/// DCF enterprise value under every clinical stage, least mature first.
pub fn stage_impact(inputs: &ValuationInputs) -> Result<Vec<StageImpact>, DomainError> {
    ClinicalStage::ALL
        .iter()
        .map(|&stage| {
            let result = dcf::calculate(&inputs.with_stage(stage))?;
            Ok(StageImpact {
                stage,
                risk_factor: stage.risk_factor(),
                enterprise_value: result.implied_valuation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(0.1, 0.2, 1), vec![0.1]);
        assert!(linspace(0.1, 0.2, 0).is_empty());
        assert_eq!(*linspace(0.10, 0.20, 5).last().unwrap(), 0.20);
    }

    #[test]
    fn test_cells_match_direct_dcf() {
        let inputs = ValuationInputs::default();
        let grid = analyze(&inputs, &[0.12, 0.18], &[0.02, 0.04]);
        for (i, &r) in grid.discount_rates.iter().enumerate() {
            for (j, &g) in grid.terminal_growth_rates.iter().enumerate() {
                let direct = dcf::calculate(&inputs.with_rates(r, g)).unwrap();
                assert_eq!(grid.cell(i, j), Some(direct.implied_valuation));
            }
        }
    }

    #[test]
    fn test_invalid_pairs_are_undefined_others_finite() {
        let inputs = ValuationInputs::default();
        let grid = analyze(&inputs, &[0.03, 0.05, 0.15], &[0.03, 0.04]);
        // r=3%: g=3% equal, g=4% above. r=5%: both valid. r=15%: both valid.
        assert_eq!(grid.cell(0, 0), None);
        assert_eq!(grid.cell(0, 1), None);
        assert_eq!(grid.undefined_count(), 2);
        for i in 1..3 {
            for j in 0..2 {
                assert!(grid.cell(i, j).unwrap().is_finite());
            }
        }
    }

    #[test]
    fn test_value_falls_as_discount_rate_rises() {
        let grid = default_grid(&ValuationInputs::default());
        assert_eq!(grid.cells.len(), DEFAULT_STEPS);
        for col in 0..DEFAULT_STEPS {
            for row in 1..DEFAULT_STEPS {
                assert!(grid.cell(row, col).unwrap() < grid.cell(row - 1, col).unwrap());
            }
        }
    }

    #[test]
    fn test_stage_impact_is_monotonic() {
        let rows = stage_impact(&ValuationInputs::default()).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].stage, ClinicalStage::PreClinical);
        for pair in rows.windows(2) {
            assert!(pair[0].enterprise_value < pair[1].enterprise_value);
        }
    }

    #[test]
    fn test_stage_impact_propagates_invalid_rates() {
        let inputs = ValuationInputs::default().with_rates(0.02, 0.04);
        assert!(matches!(
            stage_impact(&inputs),
            Err(DomainError::InvalidAssumption(_))
        ));
    }

    #[test]
    fn test_idempotent() {
        let inputs = ValuationInputs::default();
        assert_eq!(default_grid(&inputs), default_grid(&inputs));
    }
}
