//! Plain-text rendering of valuation output for the terminal.
//!
//! Every function returns a `String` so the TUI only prints.

use crate::domain::{
    ComparableCompany, SensitivityGrid, StageImpact, ValuationResult, YearProjection, comparables,
    dcf,
};
use crate::usecases::ComparablesRun;
use std::fmt::Write;

/// Width of the longest bar in bar charts.
const BAR_WIDTH: usize = 32;

pub fn money(v: f64) -> String {
    if v < 0.0 {
        format!("-${:.1}M", -v)
    } else {
        format!("${:.1}M", v)
    }
}

pub fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

pub fn multiple(v: f64) -> String {
    format!("{:.2}x", v)
}

/// Picks a unit from the label of an intermediate value.
fn format_intermediate(label: &str, value: f64) -> String {
    if label.contains("IRR") || label.contains("CAGR") || label.contains("Risk Adjustment") {
        pct(value)
    } else if label.contains("Multiple") || label.contains("Factor") {
        multiple(value)
    } else if label.contains("Peers") {
        format!("{}", value as u64)
    } else {
        money(value)
    }
}

/// Cells a bar of `value` occupies when `max` fills the full width.
/// Positive values get at least one.
fn bar_cells(value: f64, max: f64) -> usize {
    if max <= 0.0 || value <= 0.0 || !value.is_finite() {
        return 0;
    }
    let n = ((value / max) * BAR_WIDTH as f64).round() as usize;
    n.clamp(1, BAR_WIDTH)
}

fn bar(value: f64, max: f64) -> String {
    "█".repeat(bar_cells(value, max))
}

/// Headline valuation followed by its audit values.
pub fn valuation(result: &ValuationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} implied valuation: {}",
        result.method,
        money(result.implied_valuation)
    );
    let width = result
        .intermediate_values
        .iter()
        .map(|v| v.label.len())
        .max()
        .unwrap_or(0);
    for v in &result.intermediate_values {
        let _ = writeln!(
            out,
            "  {:<width$}  {:>12}",
            v.label,
            format_intermediate(&v.label, v.value),
            width = width
        );
    }
    out
}

pub fn projections(rows: &[YearProjection]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:>12}  {:>7}  {:>10}  {:>8}  {:>10}",
        "Year", "Revenue", "Margin", "FCF", "DF", "PV of FCF"
    );
    for p in rows {
        let _ = writeln!(
            out,
            "{:>4}  {:>12}  {:>7}  {:>10}  {:>8.3}  {:>10}",
            p.year,
            money(p.revenue),
            pct(p.ebitda_margin),
            money(p.free_cash_flow),
            p.discount_factor,
            money(p.pv_free_cash_flow)
        );
    }
    out
}

/// Revenue bars per projected year, FCF bars on the same scale underneath.
pub fn revenue_fcf_chart(rows: &[YearProjection]) -> String {
    let max = rows.iter().map(|p| p.revenue).fold(0.0_f64, f64::max);
    let mut out = String::new();
    for p in rows {
        let _ = writeln!(
            out,
            "Y{:<3} Revenue {:>10}  {}",
            p.year,
            money(p.revenue),
            bar(p.revenue, max)
        );
        let _ = writeln!(
            out,
            "     FCF     {:>10}  {}",
            money(p.free_cash_flow),
            "▒".repeat(bar_cells(p.free_cash_flow, max))
        );
    }
    out
}

/// DCF bridge: PV of projected FCF, PV of terminal value stacked on top, then the total.
///
/// Empty for results that carry no DCF components.
pub fn valuation_bridge(result: &ValuationResult) -> String {
    let (Some(pv_fcf), Some(pv_tv)) = (
        result.get(dcf::PV_OF_PROJECTED_FCF),
        result.get(dcf::PV_OF_TERMINAL_VALUE),
    ) else {
        return String::new();
    };
    let ev = result.implied_valuation;
    let scale = [pv_fcf, pv_fcf + pv_tv, ev].into_iter().fold(0.0_f64, f64::max);

    let start = bar_cells(pv_fcf, scale);
    let step = bar_cells(pv_fcf + pv_tv, scale).saturating_sub(start);
    let steps = [
        (dcf::PV_OF_PROJECTED_FCF, pv_fcf, "█".repeat(start)),
        (
            dcf::PV_OF_TERMINAL_VALUE,
            pv_tv,
            format!("{}{}", " ".repeat(start), "▓".repeat(step)),
        ),
        (dcf::ENTERPRISE_VALUE, ev, bar(ev, scale)),
    ];

    let mut out = String::new();
    for (label, value, cells) in steps {
        let _ = writeln!(out, "{:<22} {:>10}  {}", label, money(value), cells);
    }
    out
}

/// EV/Revenue per peer with the median marked as a vertical rule.
pub fn multiples_chart(run: &ComparablesRun) -> String {
    let max = run
        .comparables
        .iter()
        .filter_map(ComparableCompany::valid_multiple)
        .fold(0.0_f64, f64::max);
    let median = run.valuation.get(comparables::MEDIAN_MULTIPLE);
    let marker = median.map(|m| bar_cells(m, max));

    let mut out = String::new();
    for c in &run.comparables {
        let Some(m) = c.valid_multiple() else {
            let _ = writeln!(out, "{:<6} {:>9}", c.ticker, "n/a");
            continue;
        };
        let filled = bar_cells(m, max);
        let cells: String = (0..=BAR_WIDTH)
            .map(|i| match (Some(i) == marker, i < filled) {
                (true, _) => '│',
                (false, true) => '█',
                (false, false) => ' ',
            })
            .collect();
        let _ = writeln!(
            out,
            "{:<6} {:>9}  {}",
            c.ticker,
            multiple(m),
            cells.trim_end()
        );
    }
    if let (Some(m), Some(col)) = (median, marker) {
        let _ = writeln!(
            out,
            "{:<6} {:>9}  {}│ median",
            "",
            multiple(m),
            " ".repeat(col)
        );
    }
    out
}

fn comparable_row(c: &ComparableCompany) -> String {
    let opt = |v: Option<f64>, f: fn(f64) -> String| v.map(f).unwrap_or_else(|| "n/a".into());
    format!(
        "{:<6} {:<16} {:>12} {:>12} {:>9} {:>8}",
        c.ticker,
        c.name,
        opt(c.enterprise_value, money),
        opt(c.revenue_ttm, money),
        opt(c.valid_multiple(), multiple),
        opt(c.growth_rate, pct)
    )
}

pub fn comparables(run: &ComparablesRun) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Peers from {} data{}",
        run.source,
        if run.fell_back {
            " (live data insufficient, using reference multiples)"
        } else {
            ""
        }
    );
    let _ = writeln!(
        out,
        "{:<6} {:<16} {:>12} {:>12} {:>9} {:>8}",
        "Ticker", "Company", "EV", "Revenue", "EV/Rev", "Growth"
    );
    for c in &run.comparables {
        let _ = writeln!(out, "{}", comparable_row(c));
    }
    out.push('\n');
    out.push_str(&valuation(&run.valuation));
    out
}

/// Discount rates down, terminal growth across. Undefined cells print as "n/a".
pub fn sensitivity(grid: &SensitivityGrid) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:>8}", "r \\ g");
    for g in &grid.terminal_growth_rates {
        let _ = write!(out, " {:>10}", pct(*g));
    }
    out.push('\n');
    for (i, r) in grid.discount_rates.iter().enumerate() {
        let _ = write!(out, "{:>8}", pct(*r));
        for j in 0..grid.terminal_growth_rates.len() {
            let cell = grid.cell(i, j).map(money).unwrap_or_else(|| "n/a".into());
            let _ = write!(out, " {:>10}", cell);
        }
        out.push('\n');
    }
    out
}

pub fn stage_impact(rows: &[StageImpact]) -> String {
    let max = rows
        .iter()
        .map(|r| r.enterprise_value)
        .fold(0.0_f64, f64::max);
    let mut out = String::new();
    for r in rows {
        let _ = writeln!(
            out,
            "{:<22} {:>5} {:>10}  {}",
            r.stage.to_string(),
            pct(r.risk_factor),
            money(r.enterprise_value),
            bar(r.enterprise_value, max)
        );
    }
    out
}

/// Year-by-year revenue path to exit, as a bar chart.
pub fn revenue_path(path: &[f64]) -> String {
    let max = path.iter().copied().fold(0.0_f64, f64::max);
    let mut out = String::new();
    for (year, rev) in path.iter().enumerate() {
        let _ = writeln!(out, "Y{:<3} {:>10}  {}", year, money(*rev), bar(*rev, max));
    }
    out
}
