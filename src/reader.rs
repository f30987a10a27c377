/*!
 * CSV reader for practice, benchmark, and state extract files
 *
 * Parses upstream billing extracts into the structured record types with
 * header validation and per-record invariant checks. This is the boundary
 * where loosely-typed extract data becomes validated records; the engines
 * downstream never see raw fields.
 */

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::data_types::*;
use crate::{ErrorContext, Result, RevPulseError};

/// Expected header for `practices.csv`
pub const PRACTICE_COLUMNS: [&str; 20] = [
    "practice_id",
    "specialty",
    "state",
    "city",
    "total_patients",
    "total_services",
    "total_payment",
    "em_99213",
    "em_99214",
    "em_99215",
    "ccm_services",
    "ccm_payment",
    "rpm_services",
    "rpm_payment",
    "bhi_services",
    "bhi_payment",
    "awv_services",
    "awv_payment",
    "distinct_codes",
    "last_refreshed",
];

/// Expected header for `benchmarks.csv`
pub const BENCHMARK_COLUMNS: [&str; 15] = [
    "specialty",
    "provider_count",
    "avg_patients",
    "avg_revenue_per_patient",
    "avg_total_payment",
    "avg_total_services",
    "pct_99213",
    "pct_99214",
    "pct_99215",
    "ccm_adoption",
    "rpm_adoption",
    "bhi_adoption",
    "awv_adoption",
    "chronic_prevalence",
    "last_refreshed",
];

/// Expected header for `states.csv`. Rows with an empty `specialty` carry
/// the state-level totals; the rest are per-specialty slices.
pub const STATE_COLUMNS: [&str; 8] = [
    "state",
    "specialty",
    "provider_count",
    "avg_payment",
    "ccm_providers",
    "rpm_providers",
    "bhi_providers",
    "awv_providers",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// CSV reader for revenue extract files
pub struct RevPulseReader {
    /// Whether to validate CSV headers against the expected schema
    validate_headers: bool,
    /// Whether to skip invalid records (true) or fail on first error (false)
    skip_invalid_records: bool,
    /// Whether to show a progress bar on the practice file
    #[cfg(feature = "progress")]
    show_progress_bar: bool,
}

impl Default for RevPulseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RevPulseReader {
    /// Create a new reader with default settings
    pub fn new() -> Self {
        Self {
            validate_headers: true,
            skip_invalid_records: false,
            #[cfg(feature = "progress")]
            show_progress_bar: true,
        }
    }

    /// Enable or disable header validation
    pub fn with_header_validation(mut self, validate: bool) -> Self {
        self.validate_headers = validate;
        self
    }

    /// Enable or disable skipping invalid records
    pub fn with_skip_invalid_records(mut self, skip: bool) -> Self {
        self.skip_invalid_records = skip;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the progress bar
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Load practice billing profiles from CSV
    pub fn load_practices<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PracticeProfile>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RevPulseError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        if self.validate_headers {
            let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
            validate_headers(&headers, &PRACTICE_COLUMNS)?;
        }

        #[cfg(feature = "progress")]
        let progress_bar = if self.show_progress_bar {
            let pb = ProgressBar::new(file_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };
        #[cfg(not(feature = "progress"))]
        let _ = file_size;

        let mut records = Vec::new();
        let mut invalid_count = 0usize;

        for (row_index, result) in reader.records().enumerate() {
            let line = row_index + 2; // header occupies line 1

            #[cfg(feature = "progress")]
            {
                if let Some(ref pb) = progress_bar {
                    if let Some(pos) = result.as_ref().ok().and_then(|r| r.position()) {
                        pb.set_position(pos.byte());
                    }
                }
            }

            let csv_record = result?;
            match parse_practice(&csv_record, line) {
                Ok(profile) => records.push(profile),
                Err(_) if self.skip_invalid_records => invalid_count += 1,
                Err(e) => return Err(e),
            }
        }

        #[cfg(feature = "progress")]
        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }

        if invalid_count > 0 {
            println!("Skipped {} invalid practice records", invalid_count);
        }

        Ok(records)
    }

    /// Load specialty benchmarks from CSV
    pub fn load_benchmarks<P: AsRef<Path>>(&self, path: P) -> Result<Vec<SpecialtyBenchmark>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RevPulseError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        if self.validate_headers {
            let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
            validate_headers(&headers, &BENCHMARK_COLUMNS)?;
        }

        let mut records = Vec::new();
        let mut invalid_count = 0usize;

        for (row_index, result) in reader.records().enumerate() {
            let line = row_index + 2;
            let csv_record = result?;
            match parse_benchmark(&csv_record, line) {
                Ok(benchmark) => records.push(benchmark),
                Err(_) if self.skip_invalid_records => invalid_count += 1,
                Err(e) => return Err(e),
            }
        }

        if invalid_count > 0 {
            println!("Skipped {} invalid benchmark records", invalid_count);
        }

        Ok(records)
    }

    /// Load state aggregates from CSV, grouping per-specialty rows under
    /// their state-level row
    pub fn load_state_aggregates<P: AsRef<Path>>(&self, path: P) -> Result<Vec<StateAggregate>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RevPulseError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        if self.validate_headers {
            let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
            validate_headers(&headers, &STATE_COLUMNS)?;
        }

        let mut states: Vec<StateAggregate> = Vec::new();

        for (row_index, result) in reader.records().enumerate() {
            let line = row_index + 2;
            let csv_record = result?;

            let state_code = field(&csv_record, 0, line)?.to_ascii_uppercase();
            let specialty = field(&csv_record, 1, line)?.to_string();
            let provider_count = parse_u32(&csv_record, 2, line)?;
            let avg_payment = parse_f64(&csv_record, 3, line)?;
            let program_providers = ProgramCounts {
                ccm: parse_u32(&csv_record, 4, line)?,
                rpm: parse_u32(&csv_record, 5, line)?,
                bhi: parse_u32(&csv_record, 6, line)?,
                awv: parse_u32(&csv_record, 7, line)?,
            };

            let index = match states.iter().position(|s| s.state == state_code) {
                Some(index) => index,
                None => {
                    states.push(StateAggregate {
                        state: state_code.clone(),
                        provider_count: 0,
                        avg_payment: 0.0,
                        program_providers: ProgramCounts::default(),
                        specialties: Vec::new(),
                    });
                    states.len() - 1
                }
            };
            let entry = &mut states[index];

            if specialty.is_empty() {
                entry.provider_count = provider_count;
                entry.avg_payment = avg_payment;
                entry.program_providers = program_providers;
            } else {
                entry.specialties.push(StateSpecialtyAggregate {
                    specialty,
                    provider_count,
                    avg_payment,
                    program_providers,
                });
            }
        }

        Ok(states)
    }
}

/// Validate actual CSV headers against an expected column list
pub fn validate_headers(headers: &[String], expected: &[&str]) -> Result<()> {
    if headers.len() != expected.len() {
        return Err(RevPulseError::schema_mismatch_detailed(
            expected.len(),
            headers.len(),
            None,
        ));
    }
    for (index, (expected_col, actual)) in expected.iter().zip(headers.iter()).enumerate() {
        if expected_col != actual {
            return Err(RevPulseError::schema_mismatch_detailed(
                expected.len(),
                headers.len(),
                Some((index, expected_col.to_string(), actual.clone())),
            ));
        }
    }
    Ok(())
}

fn parse_practice(record: &StringRecord, line: usize) -> Result<PracticeProfile> {
    let profile = PracticeProfile {
        id: PracticeId::new(field(record, 0, line)?.to_string())?,
        specialty: field(record, 1, line)?.to_string(),
        state: field(record, 2, line)?.to_ascii_uppercase(),
        city: optional_string(record, 3),
        total_patients: parse_u32(record, 4, line)?,
        total_services: parse_u64(record, 5, line)?,
        total_payment: parse_f64(record, 6, line)?,
        em_99213: parse_u64(record, 7, line)?,
        em_99214: parse_u64(record, 8, line)?,
        em_99215: parse_u64(record, 9, line)?,
        ccm: ProgramActivity {
            services: parse_u64(record, 10, line)?,
            payment: parse_f64(record, 11, line)?,
        },
        rpm: ProgramActivity {
            services: parse_u64(record, 12, line)?,
            payment: parse_f64(record, 13, line)?,
        },
        bhi: ProgramActivity {
            services: parse_u64(record, 14, line)?,
            payment: parse_f64(record, 15, line)?,
        },
        awv: ProgramActivity {
            services: parse_u64(record, 16, line)?,
            payment: parse_f64(record, 17, line)?,
        },
        distinct_codes: optional_u32(record, 18, line)?,
        last_refreshed: optional_date(record, 19)?,
    };
    profile.validate()?;
    Ok(profile)
}

fn parse_benchmark(record: &StringRecord, line: usize) -> Result<SpecialtyBenchmark> {
    let benchmark = SpecialtyBenchmark {
        specialty: field(record, 0, line)?.to_string(),
        provider_count: parse_u32(record, 1, line)?,
        avg_patients: parse_f64(record, 2, line)?,
        avg_revenue_per_patient: parse_f64(record, 3, line)?,
        avg_total_payment: parse_f64(record, 4, line)?,
        avg_total_services: parse_f64(record, 5, line)?,
        pct_99213: parse_f64(record, 6, line)?,
        pct_99214: parse_f64(record, 7, line)?,
        pct_99215: parse_f64(record, 8, line)?,
        ccm_adoption: parse_f64(record, 9, line)?,
        rpm_adoption: parse_f64(record, 10, line)?,
        bhi_adoption: parse_f64(record, 11, line)?,
        awv_adoption: parse_f64(record, 12, line)?,
        chronic_prevalence: optional_f64(record, 13, line)?,
        last_refreshed: optional_date(record, 14)?,
    };
    benchmark.validate()?;
    Ok(benchmark)
}

fn field<'a>(record: &'a StringRecord, index: usize, line: usize) -> Result<&'a str> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| RevPulseError::CsvParse {
            message: format!("missing column {}", index),
            line: Some(line),
            column: None,
            context: ErrorContext::default(),
        })
}

fn optional_string(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn parse_u32(record: &StringRecord, index: usize, line: usize) -> Result<u32> {
    let raw = field(record, index, line)?;
    raw.parse().map_err(|_| RevPulseError::CsvParse {
        message: format!("cannot parse '{}' as an unsigned integer", raw),
        line: Some(line),
        column: Some(format!("column {}", index)),
        context: ErrorContext::default(),
    })
}

fn parse_u64(record: &StringRecord, index: usize, line: usize) -> Result<u64> {
    let raw = field(record, index, line)?;
    raw.parse().map_err(|_| RevPulseError::CsvParse {
        message: format!("cannot parse '{}' as an unsigned integer", raw),
        line: Some(line),
        column: Some(format!("column {}", index)),
        context: ErrorContext::default(),
    })
}

fn parse_f64(record: &StringRecord, index: usize, line: usize) -> Result<f64> {
    let raw = field(record, index, line)?;
    raw.parse().map_err(|_| RevPulseError::CsvParse {
        message: format!("cannot parse '{}' as a number", raw),
        line: Some(line),
        column: Some(format!("column {}", index)),
        context: ErrorContext::default(),
    })
}

fn optional_u32(record: &StringRecord, index: usize, line: usize) -> Result<Option<u32>> {
    match record.get(index).map(str::trim) {
        None | Some("") => Ok(None),
        Some(_) => parse_u32(record, index, line).map(Some),
    }
}

fn optional_f64(record: &StringRecord, index: usize, line: usize) -> Result<Option<f64>> {
    match record.get(index).map(str::trim) {
        None | Some("") => Ok(None),
        Some(_) => parse_f64(record, index, line).map(Some),
    }
}

fn optional_date(record: &StringRecord, index: usize) -> Result<Option<NaiveDate>> {
    match record.get(index).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| RevPulseError::date_parse_with_format(raw, DATE_FORMAT)),
    }
}
