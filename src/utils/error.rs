use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Invalid transition: cannot {action} request {request_id} while it is {from}")]
    InvalidTransition {
        request_id: String,
        from: String,
        action: String,
    },

    #[error("Unresolvable reference: {kind} '{id}' not found")]
    UnresolvableReference { kind: String, id: String },

    #[error("Counter overflow: {counter} of user {user_id} cannot grow any further")]
    CounterOverflow { user_id: String, counter: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error on {field} ('{value}'): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lifecycle,
    Reference,
    Storage,
    Configuration,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl SwapError {
    pub fn invalid_transition(request_id: &str, from: impl ToString, action: &str) -> Self {
        SwapError::InvalidTransition {
            request_id: request_id.to_string(),
            from: from.to_string(),
            action: action.to_string(),
        }
    }

    pub fn missing_user(id: &str) -> Self {
        SwapError::UnresolvableReference {
            kind: "user".to_string(),
            id: id.to_string(),
        }
    }

    pub fn missing_request(id: &str) -> Self {
        SwapError::UnresolvableReference {
            kind: "request".to_string(),
            id: id.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SwapError::InvalidTransition { .. } | SwapError::CounterOverflow { .. } => {
                ErrorCategory::Lifecycle
            }
            SwapError::UnresolvableReference { .. } => ErrorCategory::Reference,
            SwapError::IoError(_) | SwapError::SerializationError(_) => ErrorCategory::Storage,
            SwapError::TomlError(_)
            | SwapError::ConfigError { .. }
            | SwapError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SwapError::ValidationError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 被拒絕的操作不會改動任何資料
            ErrorCategory::Lifecycle | ErrorCategory::Reference => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SwapError::InvalidTransition { .. } => {
                "Check the request status; only Pending requests can be accepted or rejected and only Accepted ones completed"
            }
            SwapError::UnresolvableReference { .. } => {
                "Verify the id or name exists in the data file"
            }
            SwapError::CounterOverflow { .. } => "Inspect the user's stored counters for corruption",
            SwapError::IoError(_) => "Check the data file path and its permissions",
            SwapError::SerializationError(_) => "Make sure the data file is valid JSON",
            SwapError::TomlError(_) => "Make sure the configuration file is valid TOML",
            SwapError::ConfigError { .. } | SwapError::MissingConfigError { .. } => {
                "Review the configuration file and command line flags"
            }
            SwapError::ValidationError { .. } => "Correct the highlighted value and retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SwapError::InvalidTransition { from, action, .. } => {
                format!("This request is {}, so '{}' is not allowed", from, action)
            }
            SwapError::UnresolvableReference { kind, id } => {
                format!("No {} matches '{}'", kind, id)
            }
            SwapError::IoError(e) => format!("Could not access the data file: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_operations_are_not_critical() {
        let err = SwapError::invalid_transition("r1", "Completed", "accept");
        assert_eq!(err.category(), ErrorCategory::Lifecycle);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("r1"));

        let err = SwapError::missing_user("u9");
        assert_eq!(err.category(), ErrorCategory::Reference);
        assert_eq!(err.user_friendly_message(), "No user matches 'u9'");
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err: SwapError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_refused_input_is_high() {
        let err = SwapError::ValidationError {
            field: "yes".into(),
            value: "false".into(),
            reason: "confirmation required".into(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.severity() > ErrorSeverity::Medium);
    }
}
