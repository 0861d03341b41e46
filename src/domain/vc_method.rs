//! Venture-capital method: work backwards from the exit.
//!
//! The return multiple is the only discounting applied; there is no separate
//! time-value adjustment.

use crate::domain::{DomainError, ValuationMethod, ValuationResult, VcMethodInputs};

pub const EXIT_VALUE: &str = "Exit Value";
pub const TARGET_RETURN_MULTIPLE: &str = "Target Return Multiple";
pub const PRE_MONEY_VALUATION: &str = "Pre-Money Valuation";
pub const POST_DILUTION_VALUATION: &str = "Post-Dilution Valuation";
pub const IMPLIED_IRR: &str = "Implied IRR";
pub const REQUIRED_REVENUE_CAGR: &str = "Required Revenue CAGR";

fn validate(inputs: &VcMethodInputs) -> Result<(), DomainError> {
    if !inputs.target_return_multiple.is_finite() || inputs.target_return_multiple <= 0.0 {
        return Err(DomainError::invalid(format!(
            "target return multiple must be positive, got {}",
            inputs.target_return_multiple
        )));
    }
    if !inputs.exit_value.is_finite() {
        return Err(DomainError::invalid("exit value must be a finite number"));
    }
    if !(0.0..1.0).contains(&inputs.expected_dilution) {
        return Err(DomainError::invalid(format!(
            "expected dilution must be in [0%, 100%), got {:.1}%",
            inputs.expected_dilution * 100.0
        )));
    }
    if inputs.years_to_exit == 0 {
        return Err(DomainError::invalid("years to exit must be at least 1"));
    }
    Ok(())
}

/// Compound annual rate turning `start` into `end` over `years`.
fn cagr(start: f64, end: f64, years: u32) -> f64 {
    (end / start).powf(1.0 / f64::from(years)) - 1.0
}

/// Constant-growth revenue path from today (year 0) to the exit year, inclusive.
pub fn revenue_path(current_revenue: f64, exit_revenue: f64, years_to_exit: u32) -> Vec<f64> {
    if years_to_exit == 0 {
        return vec![current_revenue];
    }
    let ratio = exit_revenue / current_revenue;
    (0..=years_to_exit)
        .map(|y| current_revenue * ratio.powf(f64::from(y) / f64::from(years_to_exit)))
        .collect()
}

/// Post-dilution valuation implied by the exit value and target return.
pub fn calculate(inputs: &VcMethodInputs) -> Result<ValuationResult, DomainError> {
    validate(inputs)?;

    let pre_money = inputs.exit_value / inputs.target_return_multiple;
    let post_dilution = pre_money * (1.0 - inputs.expected_dilution);
    let implied_irr = cagr(1.0, inputs.target_return_multiple, inputs.years_to_exit);

    let mut result = ValuationResult::new(ValuationMethod::Vc, post_dilution)
        .with(EXIT_VALUE, inputs.exit_value)
        .with(TARGET_RETURN_MULTIPLE, inputs.target_return_multiple)
        .with(PRE_MONEY_VALUATION, pre_money)
        .with(POST_DILUTION_VALUATION, post_dilution)
        .with(IMPLIED_IRR, implied_irr);

    if let (Some(current), Some(exit)) = (inputs.current_revenue, inputs.exit_revenue) {
        if current > 0.0 && exit > 0.0 {
            result = result.with(
                REQUIRED_REVENUE_CAGR,
                cagr(current, exit, inputs.years_to_exit),
            );
        }
    }
    Ok(result)
}
