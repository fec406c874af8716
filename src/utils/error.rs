use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV encoding error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' - {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Extraction error: {message}")]
    ExtractionError { message: String },

    #[error("Batch error: {message}")]
    BatchError { message: String },
}

/// Broad grouping used when reporting a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Config,
}

/// How bad a failure is, from "logged and skipped" to "stop everything".
/// Drives the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::SerializationError(_)
            | EtlError::CsvError(_)
            | EtlError::ExtractionError { .. }
            | EtlError::BatchError { .. } => ErrorCategory::Data,
            EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Config,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorSeverity::High,
            EtlError::SerializationError(_)
            | EtlError::CsvError(_)
            | EtlError::BatchError { .. } => ErrorSeverity::Medium,
            EtlError::ExtractionError { .. } => ErrorSeverity::Low,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::IoError(_) => {
                "Check that the cache and save directories exist and are readable/writable"
            }
            EtlError::SerializationError(_) => {
                "Inspect the offending response file; cached responses must be valid JSON"
            }
            EtlError::CsvError(_) => "Retry with --format json to rule out CSV encoding issues",
            EtlError::MissingConfigError { .. } => {
                "Add the missing field to the configuration file or pass it on the command line"
            }
            EtlError::InvalidConfigValueError { .. } => {
                "Correct the configuration value; see --help for accepted ranges"
            }
            EtlError::ConfigValidationError { .. } => {
                "Review the configuration file against the documented schema"
            }
            EtlError::ExtractionError { .. } => {
                "The response file does not look like a search response; it is skipped"
            }
            EtlError::BatchError { .. } => {
                "Check earlier warnings for the batch that failed to encode or persist"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) => format!("File system problem: {}", e),
            EtlError::SerializationError(e) => format!("Could not read response JSON: {}", e),
            EtlError::CsvError(e) => format!("Could not encode batch as CSV: {}", e),
            EtlError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            EtlError::InvalidConfigValueError { field, value, reason } => {
                format!("'{}' is not a valid {}: {}", value, field, reason)
            }
            EtlError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            EtlError::ExtractionError { message } => {
                format!("Response could not be processed: {}", message)
            }
            EtlError::BatchError { message } => format!("Batch problem: {}", message),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
