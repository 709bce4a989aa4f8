use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Account already registered: {identifier}")]
    DuplicateAccount { identifier: String },

    #[error("Link '{name}' appears more than once in the chain")]
    DuplicateLink { name: String },

    #[error("Chain has no links")]
    EmptyChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Registration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::IoError(_) => ErrorCategory::Io,
            AuthError::DuplicateAccount { .. } => ErrorCategory::Registration,
            AuthError::TomlError(_)
            | AuthError::SerializationError(_)
            | AuthError::ConfigError { .. }
            | AuthError::InvalidConfigValueError { .. }
            | AuthError::MissingConfigError { .. }
            | AuthError::DuplicateLink { .. }
            | AuthError::EmptyChain => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AuthError::DuplicateAccount { .. } => ErrorSeverity::Medium,
            AuthError::IoError(_) | AuthError::SerializationError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AuthError::IoError(_) => "Check that the file exists and is readable".to_string(),
            AuthError::TomlError(_) => "Fix the TOML syntax in the configuration file".to_string(),
            AuthError::SerializationError(_) => "Report this as a bug".to_string(),
            AuthError::ConfigError { .. } | AuthError::MissingConfigError { .. } => {
                "Review the configuration file against the documented layout".to_string()
            }
            AuthError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}'", field)
            }
            AuthError::DuplicateAccount { identifier } => {
                format!("Remove the second registration of '{}'", identifier)
            }
            AuthError::DuplicateLink { name } => {
                format!("List '{}' only once in the [[chain]] section", name)
            }
            AuthError::EmptyChain => "Add at least one [[chain]] entry".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Registration => format!("Registration failed: {}", self),
            ErrorCategory::Io => format!("Could not read input: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
