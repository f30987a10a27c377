/*!
 * Export functionality for derived reports
 *
 * Writes forecast, opportunity, and portfolio results to JSON or CSV for
 * the presentation layer. Monetary values are exported as plain numerics;
 * human-readable formatting ("$1.2M") is a presentation concern and stays
 * out of the library.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::forecast::ForecastResult;
use crate::market::PortfolioAnalysis;
use crate::opportunity::{OpportunityCategory, RevenueOpportunity};
use crate::Result;

/// JSON exporter for derived reports
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
    /// Whether to export as JSON Lines (one record per line)
    pub json_lines: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self {
            pretty_print: true,
            json_lines: false,
        }
    }
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pretty printing
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set JSON Lines format
    pub fn as_json_lines(mut self) -> Self {
        self.json_lines = true;
        self.pretty_print = false; // JSON Lines shouldn't be pretty printed
        self
    }

    /// Export one report as a JSON document
    pub fn export<T: Serialize>(&self, report: &T, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        if self.pretty_print {
            serde_json::to_writer_pretty(writer, report)?;
        } else {
            serde_json::to_writer(writer, report)?;
        }

        Ok(())
    }

    /// Export a slice of records, one JSON document per line when JSON
    /// Lines is enabled
    pub fn export_items<T: Serialize>(&self, items: &[T], path: &Path) -> Result<()> {
        if !self.json_lines {
            return self.export(&items, path);
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for item in items {
            let json = serde_json::to_string(item)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }
}

/// CSV exporter for derived reports
pub struct CsvExporter {
    /// Whether to include headers
    pub include_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
        }
    }
}

impl CsvExporter {
    /// Create a new CSV exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn writer(&self, path: &Path) -> Result<csv::Writer<File>> {
        Ok(csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_path(path)?)
    }

    /// Export the 12-month projection curve, one row per month
    pub fn export_forecast(&self, result: &ForecastResult, path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;

        if self.include_headers {
            writer.write_record([
                "month",
                "ccm_revenue",
                "rpm_revenue",
                "bhi_revenue",
                "awv_revenue",
                "coding_revenue",
                "total",
                "cumulative",
            ])?;
        }

        for month in &result.monthly {
            writer.write_record(&[
                month.month.to_string(),
                format!("{:.2}", month.ccm_revenue),
                format!("{:.2}", month.rpm_revenue),
                format!("{:.2}", month.bhi_revenue),
                format!("{:.2}", month.awv_revenue),
                format!("{:.2}", month.coding_revenue),
                format!("{:.2}", month.total),
                format!("{:.2}", month.cumulative),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export ranked opportunities, one row per opportunity
    pub fn export_opportunities(
        &self,
        opportunities: &[RevenueOpportunity],
        path: &Path,
    ) -> Result<()> {
        let mut writer = self.writer(path)?;

        if self.include_headers {
            writer.write_record([
                "rank",
                "category",
                "description",
                "estimated_revenue",
                "current_rate",
                "target_rate",
                "affected_providers",
                "confidence",
            ])?;
        }

        for opportunity in opportunities {
            let category = match opportunity.category {
                OpportunityCategory::Program(program) => program.as_code(),
                OpportunityCategory::CodingUpgrade => "coding",
            };
            writer.write_record(&[
                opportunity.rank.to_string(),
                category.to_string(),
                opportunity.description.clone(),
                format!("{:.2}", opportunity.estimated_revenue),
                format!("{:.4}", opportunity.current_rate),
                format!("{:.4}", opportunity.target_rate),
                opportunity.affected_providers.to_string(),
                opportunity.confidence.as_str().to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export a portfolio analysis, one row per holding
    pub fn export_portfolio(&self, analysis: &PortfolioAnalysis, path: &Path) -> Result<()> {
        let mut writer = self.writer(path)?;

        if self.include_headers {
            writer.write_record([
                "practice_id",
                "specialty",
                "acquisition_score",
                "tier",
                "current_payment",
                "projected_revenue",
                "estimated_upside",
                "revenue_increase_pct",
            ])?;
        }

        for holding in &analysis.practices {
            writer.write_record(&[
                holding.id.as_str().to_string(),
                holding.specialty.clone(),
                format!("{:.0}", holding.acquisition.overall),
                holding.acquisition.tier.label().to_string(),
                format!("{:.2}", holding.current_payment),
                format!("{:.2}", holding.acquisition.projected_revenue),
                format!("{:.2}", holding.acquisition.estimated_upside),
                format!("{:.0}", holding.acquisition.revenue_increase_pct),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{Confidence, Program};
    use crate::forecast::{run_forecast, ForecastInputs, ProgramGap, Scenario};

    fn forecast() -> ForecastResult {
        let inputs = ForecastInputs {
            gaps: vec![ProgramGap {
                program: Program::Ccm,
                eligible_patients: 200,
                enrolled_patients: 0,
                rate: 62.0,
                current_annual_revenue: 0.0,
                potential_annual_revenue: 148_800.0,
            }],
            annual_coding_gap: 12_000.0,
        };
        run_forecast(&inputs, &Scenario::CcmOnly.config())
    }

    #[test]
    fn test_json_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.json");

        JsonExporter::new().export(&forecast(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: ForecastResult = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.monthly.len(), 12);
        assert_eq!(parsed, forecast());
    }

    #[test]
    fn test_json_lines_writes_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("months.jsonl");

        let result = forecast();
        JsonExporter::new()
            .as_json_lines()
            .export_items(&result.monthly, &path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 12);
    }

    #[test]
    fn test_forecast_csv_has_header_and_twelve_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");

        CsvExporter::new().export_forecast(&forecast(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[0].starts_with("month,ccm_revenue"));
    }

    #[test]
    fn test_opportunity_csv_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.csv");

        let opportunities = vec![RevenueOpportunity {
            rank: 1,
            category: OpportunityCategory::Program(Program::Ccm),
            description: "test".to_string(),
            estimated_revenue: 100_000.0,
            current_rate: 0.05,
            target_rate: 0.20,
            affected_providers: 150,
            confidence: Confidence::High,
        }];
        CsvExporter::new()
            .export_opportunities(&opportunities, &path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(",ccm,"));
        assert!(contents.contains("high"));
    }
}
