use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolingError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("SVG parsing error: {0}")]
    SvgError(#[from] resvg::usvg::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Marker '{marker}' not found in {file}")]
    MarkerNotFound { marker: String, file: String },

    #[error("{file} already contains the seed block")]
    AlreadySeeded { file: String },

    #[error("Malformed SQL: {message}")]
    MalformedSql { message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("Query failed with exit code {code:?}")]
    QueryFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Command timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Io,
    Input,
    Rendering,
    Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ToolingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
            Self::ImageError(_) | Self::SvgError(_) | Self::RenderError { .. } => {
                ErrorCategory::Rendering
            }
            Self::QueryFailed { .. } | Self::Timeout { .. } => ErrorCategory::Database,
            Self::MarkerNotFound { .. }
            | Self::AlreadySeeded { .. }
            | Self::MalformedSql { .. }
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadySeeded { .. } => ErrorSeverity::Low,
            Self::Timeout { .. } => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("File not found: {}", e)
            }
            Self::MarkerNotFound { marker, file } => {
                format!("Could not find the line '{}' in {}", marker, file)
            }
            Self::AlreadySeeded { file } => {
                format!("{} already has the initial data, nothing was changed", file)
            }
            Self::QueryFailed { code, .. } => match code {
                Some(code) => format!("Database client exited with code {}", code),
                None => "Database client was terminated by a signal".to_string(),
            },
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check faturix-tools.toml (or the file passed with --config) and try again"
            }
            ErrorCategory::Io => "Check that the input file exists and the output directory is writable",
            ErrorCategory::Input => match self {
                Self::AlreadySeeded { .. } => "Start again from a freshly sanitized dump",
                _ => "Regenerate the input file from a fresh database dump",
            },
            ErrorCategory::Rendering => "Make sure the SVG sources are valid and readable",
            ErrorCategory::Database => {
                "Check that PostgreSQL is running and the connection settings in [database] are correct"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = ToolingError::MarkerNotFound {
            marker: "-- Completed on".to_string(),
            file: "dump.sql".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = ToolingError::Timeout { seconds: 30 };
        assert_eq!(err.category(), ErrorCategory::Database);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_not_found_message() {
        let err = ToolingError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "pdv2.sql",
        ));
        assert!(err.user_friendly_message().starts_with("File not found"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
