//! CSV export of valuation tables. Uses the `csv` crate for quoting.
//!
//! Only runs on explicit user request; nothing is read back in later sessions.

use crate::domain::{DomainError, SensitivityGrid, StageImpact, YearProjection};
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

fn into_string(wtr: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let bytes = wtr.into_inner().map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;
    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

/// Projection table: one row per year.
pub fn projections_to_csv(rows: &[YearProjection]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "Year",
        "Revenue ($M)",
        "EBITDA Margin",
        "FCF ($M)",
        "Discount Factor",
        "PV of FCF ($M)",
    ])?;
    for p in rows {
        wtr.write_record([
            p.year.to_string(),
            format!("{:.4}", p.revenue),
            format!("{:.4}", p.ebitda_margin),
            format!("{:.4}", p.free_cash_flow),
            format!("{:.6}", p.discount_factor),
            format!("{:.4}", p.pv_free_cash_flow),
        ])?;
    }
    wtr.flush()?;
    into_string(wtr)
}

/// Sensitivity matrix: discount rate rows x terminal growth columns. Undefined cells are empty.
pub fn sensitivity_to_csv(grid: &SensitivityGrid) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["Discount Rate".to_string()];
    header.extend(
        grid.terminal_growth_rates
            .iter()
            .map(|g| format!("g={:.2}%", g * 100.0)),
    );
    wtr.write_record(&header)?;

    for (i, r) in grid.discount_rates.iter().enumerate() {
        let mut row = vec![format!("{:.2}%", r * 100.0)];
        row.extend(
            (0..grid.terminal_growth_rates.len())
                .map(|j| grid.cell(i, j).map(|v| format!("{:.4}", v)).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    into_string(wtr)
}

pub fn stage_impact_to_csv(rows: &[StageImpact]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["Stage", "Risk Factor", "Enterprise Value ($M)"])?;
    for r in rows {
        wtr.write_record([
            r.stage.to_string(),
            format!("{:.2}", r.risk_factor),
            format!("{:.4}", r.enterprise_value),
        ])?;
    }
    wtr.flush()?;
    into_string(wtr)
}

/// Writes CSV tables into a directory, one file per table.
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Lowercase, dash-separated file stem from the company name.
    fn slug(name: &str) -> String {
        let slug: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() { "company".to_string() } else { slug }
    }

    /// Write projections, sensitivity grid and stage impact. Returns the written paths.
    pub async fn export(
        &self,
        company: &str,
        projections: &[YearProjection],
        grid: &SensitivityGrid,
        stages: &[StageImpact],
    ) -> Result<Vec<PathBuf>, DomainError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::Export(format!("create {}: {}", self.dir.display(), e)))?;

        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let stem = Self::slug(company);
        let to_export = |e: csv::Error| DomainError::Export(format!("CSV encode: {}", e));

        let tables = [
            ("projections", projections_to_csv(projections).map_err(to_export)?),
            ("sensitivity", sensitivity_to_csv(grid).map_err(to_export)?),
            ("stages", stage_impact_to_csv(stages).map_err(to_export)?),
        ];

        let mut written = Vec::with_capacity(tables.len());
        for (kind, content) in tables {
            let path = self.dir.join(format!("{}_{}_{}.csv", stem, kind, stamp));
            fs::write(&path, content)
                .await
                .map_err(|e| DomainError::Export(format!("write {}: {}", path.display(), e)))?;
            info!(path = %path.display(), "table exported");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ValuationInputs, dcf, sensitivity};

    #[test]
    fn test_projections_csv() {
        let rows = dcf::project(&ValuationInputs::default());
        let csv = projections_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Year,Revenue ($M)"));
        assert!(lines[1].starts_with("1,27.0000"));
    }

    #[test]
    fn test_sensitivity_csv_leaves_undefined_empty() {
        let grid = sensitivity::analyze(&ValuationInputs::default(), &[0.03, 0.15], &[0.03]);
        let csv = sensitivity_to_csv(&grid).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Discount Rate,g=3.00%");
        assert_eq!(lines[1], "3.00%,");
        assert!(lines[2].starts_with("15.00%,"));
        assert!(lines[2].len() > "15.00%,".len());
    }

    #[test]
    fn test_slug() {
        assert_eq!(CsvExporter::slug("HealthTech Co."), "healthtech-co");
        assert_eq!(CsvExporter::slug("  "), "company");
    }

    #[tokio::test]
    async fn test_export_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = ValuationInputs::default();
        let exporter = CsvExporter::new(dir.path().join("reports"));
        let paths = exporter
            .export(
                &inputs.name,
                &dcf::project(&inputs),
                &sensitivity::default_grid(&inputs),
                &sensitivity::stage_impact(&inputs).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(paths.len(), 3);
        for p in paths {
            assert!(p.exists());
        }
    }
}
