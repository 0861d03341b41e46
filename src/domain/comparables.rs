//! Comparable company analysis on EV/Revenue multiples.
//!
//! Peers are passed in already fetched; this module does no I/O.

use crate::domain::{
    ComparableCompany, DomainError, ValuationInputs, ValuationMethod, ValuationResult,
};

/// Growth adjustment bounds. Keeps a hyper-growth target from exploding the multiple.
pub const MIN_GROWTH_ADJUSTMENT: f64 = 0.5;
pub const MAX_GROWTH_ADJUSTMENT: f64 = 2.0;

/// Minimum number of peers with a usable multiple.
pub const MIN_VALID_COMPARABLES: usize = 2;

pub const MEDIAN_MULTIPLE: &str = "Median EV/Revenue Multiple";
pub const P25_MULTIPLE: &str = "25th Percentile Multiple";
pub const P75_MULTIPLE: &str = "75th Percentile Multiple";
pub const GROWTH_ADJUSTMENT: &str = "Growth Adjustment Factor";
pub const IMPLIED_EV_LOW: &str = "Implied EV - Low";
pub const IMPLIED_EV_MID: &str = "Implied EV - Mid";
pub const IMPLIED_EV_HIGH: &str = "Implied EV - High";
pub const PEERS_USED: &str = "Peers Used";

/// Linear-interpolated quantile of an ascending slice. `q` in [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}

/// Target growth / median peer growth, clamped. 1.0 when peer growth is unknown or not positive.
pub fn growth_adjustment(target_growth: f64, peer_growth: &[f64]) -> f64 {
    match median(peer_growth) {
        Some(m) if m > 0.0 && target_growth.is_finite() => {
            (target_growth / m).clamp(MIN_GROWTH_ADJUSTMENT, MAX_GROWTH_ADJUSTMENT)
        }
        _ => 1.0,
    }
}

/// Implied valuation from peer multiples.
///
/// Uses the median (not the mean) of usable multiples. With `apply_growth_premium`
/// the multiple is scaled by [`growth_adjustment`] using the target's first-year growth.
pub fn calculate(
    inputs: &ValuationInputs,
    comparables: &[ComparableCompany],
    apply_growth_premium: bool,
) -> Result<ValuationResult, DomainError> {
    if !inputs.current_revenue.is_finite() || inputs.current_revenue <= 0.0 {
        return Err(DomainError::invalid(format!(
            "current revenue must be a positive number, got {}",
            inputs.current_revenue
        )));
    }

    let valid: Vec<&ComparableCompany> = comparables
        .iter()
        .filter(|c| c.valid_multiple().is_some())
        .collect();
    if valid.len() < MIN_VALID_COMPARABLES {
        return Err(DomainError::InsufficientComparables { valid: valid.len() });
    }

    let mut multiples: Vec<f64> = valid.iter().filter_map(|c| c.valid_multiple()).collect();
    multiples.sort_by(f64::total_cmp);
    // non-empty: at least MIN_VALID_COMPARABLES entries
    let mid = quantile(&multiples, 0.5).unwrap_or_default();
    let low = quantile(&multiples, 0.25).unwrap_or_default();
    let high = quantile(&multiples, 0.75).unwrap_or_default();

    let adjustment = if apply_growth_premium {
        let peer_growth: Vec<f64> = valid
            .iter()
            .filter_map(|c| c.growth_rate)
            .filter(|g| g.is_finite())
            .collect();
        growth_adjustment(inputs.near_term_growth(), &peer_growth)
    } else {
        1.0
    };

    let revenue = inputs.current_revenue;
    let implied = revenue * mid * adjustment;

    Ok(ValuationResult::new(ValuationMethod::Comparables, implied)
        .with(MEDIAN_MULTIPLE, mid)
        .with(P25_MULTIPLE, low)
        .with(P75_MULTIPLE, high)
        .with(GROWTH_ADJUSTMENT, adjustment)
        .with(IMPLIED_EV_LOW, revenue * low * adjustment)
        .with(IMPLIED_EV_MID, implied)
        .with(IMPLIED_EV_HIGH, revenue * high * adjustment)
        .with(PEERS_USED, valid.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(ticker: &str, multiple: Option<f64>, growth: Option<f64>) -> ComparableCompany {
        ComparableCompany {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            ev_revenue_multiple: multiple,
            growth_rate: growth,
            market_cap: None,
            enterprise_value: None,
            revenue_ttm: None,
        }
    }

    fn inputs_with_growth(g: f64) -> ValuationInputs {
        let mut inputs = ValuationInputs::default();
        inputs.current_revenue = 10.0;
        inputs.revenue_growth_rates[0] = g;
        inputs
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 0.75), Some(3.25));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_median_ignores_outlier() {
        assert_eq!(median(&[2.0, 3.0, 4.0, 500.0, 1.0]), Some(3.0));
    }

    #[test]
    fn test_zero_comparables_is_insufficient() {
        let err = calculate(&inputs_with_growth(0.2), &[], true).unwrap_err();
        assert_eq!(err, DomainError::InsufficientComparables { valid: 0 });
    }

    #[test]
    fn test_one_valid_comparable_is_insufficient() {
        let peers = vec![
            peer("A", Some(4.0), Some(0.2)),
            peer("B", None, Some(0.2)),
            peer("C", Some(-1.0), None),
            peer("D", Some(f64::NAN), None),
        ];
        let err = calculate(&inputs_with_growth(0.2), &peers, true).unwrap_err();
        assert_eq!(err, DomainError::InsufficientComparables { valid: 1 });
    }

    #[test]
    fn test_two_valid_comparables_give_result() {
        let peers = vec![peer("A", Some(2.0), Some(0.2)), peer("B", Some(4.0), Some(0.2))];
        let result = calculate(&inputs_with_growth(0.2), &peers, true).unwrap();
        assert_eq!(result.method, ValuationMethod::Comparables);
        assert_eq!(result.get(MEDIAN_MULTIPLE), Some(3.0));
        assert_eq!(result.get(GROWTH_ADJUSTMENT), Some(1.0));
        assert_eq!(result.implied_valuation, 30.0);
        assert_eq!(result.get(PEERS_USED), Some(2.0));
    }

    #[test]
    fn test_growth_premium_is_capped() {
        let peers = vec![peer("A", Some(3.0), Some(0.1)), peer("B", Some(3.0), Some(0.1))];
        let fast = calculate(&inputs_with_growth(0.9), &peers, true).unwrap();
        assert_eq!(fast.get(GROWTH_ADJUSTMENT), Some(MAX_GROWTH_ADJUSTMENT));
        assert_eq!(fast.implied_valuation, 60.0);

        let shrinking = calculate(&inputs_with_growth(-0.3), &peers, true).unwrap();
        assert_eq!(shrinking.get(GROWTH_ADJUSTMENT), Some(MIN_GROWTH_ADJUSTMENT));
        assert_eq!(shrinking.implied_valuation, 15.0);
    }

    #[test]
    fn test_growth_adjustment_within_bounds() {
        let peers = vec![peer("A", Some(3.0), Some(0.2)), peer("B", Some(3.0), Some(0.2))];
        let result = calculate(&inputs_with_growth(0.3), &peers, true).unwrap();
        let adj = result.get(GROWTH_ADJUSTMENT).unwrap();
        assert!((adj - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_peer_growth_means_no_adjustment() {
        let peers = vec![peer("A", Some(3.0), None), peer("B", Some(5.0), None)];
        let result = calculate(&inputs_with_growth(0.9), &peers, true).unwrap();
        assert_eq!(result.get(GROWTH_ADJUSTMENT), Some(1.0));
    }

    #[test]
    fn test_premium_can_be_disabled() {
        let peers = vec![peer("A", Some(3.0), Some(0.1)), peer("B", Some(3.0), Some(0.1))];
        let result = calculate(&inputs_with_growth(0.9), &peers, false).unwrap();
        assert_eq!(result.get(GROWTH_ADJUSTMENT), Some(1.0));
        assert_eq!(result.implied_valuation, 30.0);
    }

    #[test]
    fn test_low_mid_high_are_ordered() {
        let peers = vec![
            peer("A", Some(1.0), Some(0.2)),
            peer("B", Some(2.0), Some(0.2)),
            peer("C", Some(6.0), Some(0.2)),
            peer("D", Some(9.0), Some(0.2)),
        ];
        let r = calculate(&inputs_with_growth(0.2), &peers, true).unwrap();
        let low = r.get(IMPLIED_EV_LOW).unwrap();
        let mid = r.get(IMPLIED_EV_MID).unwrap();
        let high = r.get(IMPLIED_EV_HIGH).unwrap();
        assert!(low <= mid && mid <= high);
        assert_eq!(mid, r.implied_valuation);
    }

    #[test]
    fn test_zero_revenue_is_invalid_not_zero_value() {
        let peers = vec![peer("A", Some(2.5), None), peer("B", Some(7.0), None)];
        let mut inputs = inputs_with_growth(0.2);
        inputs.current_revenue = 0.0;
        assert!(matches!(
            calculate(&inputs, &peers, false),
            Err(DomainError::InvalidAssumption(_))
        ));
    }

    #[test]
    fn test_idempotent() {
        let peers = vec![peer("A", Some(2.5), Some(0.3)), peer("B", Some(7.0), Some(0.15))];
        let inputs = inputs_with_growth(0.4);
        assert_eq!(
            calculate(&inputs, &peers, true).unwrap(),
            calculate(&inputs, &peers, true).unwrap()
        );
    }
}
