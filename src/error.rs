/*!
 * Enhanced error handling for revenue intelligence operations
 *
 * Provides detailed error types with context, suggestions, and recovery guidance.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// RevPulse library result type
pub type Result<T> = std::result::Result<T, RevPulseError>;

/// Enhanced error types with context and suggestions
#[derive(Error, Debug)]
pub enum RevPulseError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        column: Option<String>,
        context: ErrorContext,
    },

    /// Data validation errors with detailed information
    #[error("Data validation error: {message}")]
    DataValidation {
        message: String,
        field: Option<String>,
        value: Option<String>,
        context: ErrorContext,
    },

    /// File not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Rate or percentage outside its valid range
    #[error("Invalid rate '{value}' for {field}: {reason}")]
    InvalidRate {
        field: String,
        value: f64,
        reason: String,
        suggestion: String,
    },

    /// Schema mismatch with details
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        message: String,
        expected_columns: Option<usize>,
        found_columns: Option<usize>,
        mismatched_column: Option<(usize, String, String)>,
    },

    /// Date parsing errors with format hints
    #[error("Date parsing error: {message}")]
    DateParse {
        message: String,
        value: String,
        expected_format: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
        suggestion: Option<String>,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
    pub column_name: Option<String>,
    pub record_id: Option<String>,
}

/// Export format for error context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    JsonLines,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::JsonLines => write!(f, "JSON Lines"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl RevPulseError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let suggestion = if path.to_string_lossy().contains("practice") {
            format!(
                "Check if the file exists at '{}'. Practice billing extracts are expected as \
                'practices.csv' with one row per billing entity.",
                path.display()
            )
        } else if path.to_string_lossy().contains("benchmark") {
            format!(
                "Check if the benchmark file exists at '{}'. Specialty benchmarks are expected as \
                'benchmarks.csv' with one row per specialty.",
                path.display()
            )
        } else {
            format!(
                "Check if the file exists at '{}'. Make sure the path is correct and you have read permissions.",
                path.display()
            )
        };

        Self::FileNotFound { path, suggestion }
    }

    /// Create an invalid rate error with range guidance
    pub fn invalid_rate(field: &str, value: f64) -> Self {
        let (reason, suggestion) = if value.is_nan() {
            ("rate is not a number".to_string(),
             "Provide a numeric adoption rate between 0.0 and 1.0".to_string())
        } else if value < 0.0 {
            ("rate cannot be negative".to_string(),
             "Adoption rates are fractions of the peer population, between 0.0 and 1.0".to_string())
        } else {
            ("rate exceeds 1.0".to_string(),
             "Adoption rates are fractions, not percentages; divide by 100 if the source is percentage-valued".to_string())
        };

        Self::InvalidRate {
            field: field.to_string(),
            value,
            reason,
            suggestion,
        }
    }

    /// Create a validation error for a negative count or amount
    pub fn negative_value(field: &str, value: &str) -> Self {
        Self::DataValidation {
            message: format!("'{}' must be non-negative, found {}", field, value),
            field: Some(field.to_string()),
            value: Some(value.to_string()),
            context: ErrorContext::default(),
        }
    }

    /// Create a schema mismatch error with detailed information
    pub fn schema_mismatch_detailed(
        expected_columns: usize,
        found_columns: usize,
        mismatched_column: Option<(usize, String, String)>,
    ) -> Self {
        let message = if let Some((index, expected, found)) = &mismatched_column {
            format!(
                "Column {} mismatch: expected '{}', found '{}'",
                index, expected, found
            )
        } else {
            format!(
                "Expected {} columns, found {}",
                expected_columns, found_columns
            )
        };

        Self::SchemaMismatch {
            message,
            expected_columns: Some(expected_columns),
            found_columns: Some(found_columns),
            mismatched_column,
        }
    }

    /// Create a date parsing error with format information
    pub fn date_parse_with_format(value: &str, expected_format: &str) -> Self {
        Self::DateParse {
            message: format!("Cannot parse '{}' as date", value),
            value: value.to_string(),
            expected_format: expected_format.to_string(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::InvalidRate { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::DateParse { expected_format, .. } => {
                format!("{}\n\nExpected format: {}", self, expected_format)
            }
            Self::Configuration { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for RevPulseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for RevPulseError {
    fn from(err: csv::Error) -> Self {
        let (line, message) = match err.position() {
            Some(pos) => (Some(pos.line() as usize), err.to_string()),
            None => (None, err.to_string()),
        };

        Self::CsvParse {
            message,
            line,
            column: None,
            context: ErrorContext::default(),
        }
    }
}

impl From<serde_json::Error> for RevPulseError {
    fn from(err: serde_json::Error) -> Self {
        RevPulseError::Export {
            message: err.to_string(),
            format: ExportFormat::Json,
            suggestion: Some("Check if the data is serializable to JSON.".to_string()),
        }
    }
}
