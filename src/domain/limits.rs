//! Accepted input ranges, shared by the prompts and the JSON entry point.
//!
//! Calculators only reject what would make their math undefined; these bounds
//! are the stricter envelope a user-facing surface enforces.

use crate::domain::{DomainError, ValuationInputs, VcMethodInputs};
use std::fmt;

/// Numeric bounds. Upper bound is always inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
    /// Excludes `min` itself (e.g. "revenue > 0").
    pub open_min: bool,
}

impl InputRange {
    pub const fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            open_min: false,
        }
    }

    pub const fn above(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            open_min: true,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        let above_min = if self.open_min { v > self.min } else { v >= self.min };
        v.is_finite() && above_min && v <= self.max
    }

    /// `Ok` when `v` is in range, otherwise `InvalidAssumption` naming `field`.
    pub fn check(&self, field: &str, v: f64) -> Result<(), DomainError> {
        if self.contains(v) {
            Ok(())
        } else {
            Err(DomainError::invalid(format!(
                "{} must be in {}, got {}",
                field, self, v
            )))
        }
    }
}

impl fmt::Display for InputRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.open_min { '(' } else { '[' };
        write!(f, "{}{}, {}]", open, self.min, self.max)
    }
}

pub const REVENUE_RANGE: InputRange = InputRange::above(0.0, 1_000_000.0);
pub const GROWTH_RANGE: InputRange = InputRange::closed(-0.95, 5.0);
pub const MARGIN_RANGE: InputRange = InputRange::closed(-1.0, 1.0);
pub const DISCOUNT_RATE_RANGE: InputRange = InputRange::closed(0.01, 0.50);
pub const TERMINAL_GROWTH_RANGE: InputRange = InputRange::closed(-0.05, 0.10);
pub const DILUTION_RANGE: InputRange = InputRange::closed(0.0, 0.95);
pub const TARGET_MULTIPLE_RANGE: InputRange = InputRange::above(0.0, 100.0);
pub const EXIT_MULTIPLE_RANGE: InputRange = InputRange::closed(0.0, 100.0);
pub const YEARS_TO_EXIT_RANGE: (u32, u32) = (1, 15);

pub fn check_inputs(inputs: &ValuationInputs) -> Result<(), DomainError> {
    REVENUE_RANGE.check("current revenue", inputs.current_revenue)?;
    for (i, g) in inputs.revenue_growth_rates.iter().enumerate() {
        GROWTH_RANGE.check(&format!("year {} revenue growth", i + 1), *g)?;
    }
    MARGIN_RANGE.check("EBITDA margin", inputs.ebitda_margin)?;
    DISCOUNT_RATE_RANGE.check("discount rate", inputs.discount_rate)?;
    TERMINAL_GROWTH_RANGE.check("terminal growth rate", inputs.terminal_growth_rate)
}

pub fn check_vc_inputs(inputs: &VcMethodInputs) -> Result<(), DomainError> {
    TARGET_MULTIPLE_RANGE.check("target return multiple", inputs.target_return_multiple)?;
    DILUTION_RANGE.check("expected dilution", inputs.expected_dilution)?;
    let (min, max) = YEARS_TO_EXIT_RANGE;
    if !(min..=max).contains(&inputs.years_to_exit) {
        return Err(DomainError::invalid(format!(
            "years to exit must be in [{min}, {max}], got {}",
            inputs.years_to_exit
        )));
    }
    if let Some(current) = inputs.current_revenue {
        REVENUE_RANGE.check("current revenue", current)?;
    }
    if let Some(exit) = inputs.exit_revenue {
        REVENUE_RANGE.check("exit revenue", exit)?;
    }
    Ok(())
}
