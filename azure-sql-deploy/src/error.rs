// Error taxonomy for the deployment wizard
//
// Input-absent outcomes (no accounts / subscriptions / servers) are NOT errors; they are field
// states. Everything here is either a validation-adjacent lookup failure or a transport/credential
// failure that the session boundary turns into a user-visible message.

use crate::wizard::fields::Field;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Token retrieval or account resolution failed inside the credential provider.
    #[error("Credential error for account '{account}': {details}")]
    Credential { account: String, details: String },

    /// The HTTP call itself failed (DNS, TLS, timeout, connection reset).
    #[error("Request to {url} failed: {details}")]
    Transport { url: String, details: String },

    /// The management API answered with a non-2xx status.
    #[error("Azure returned HTTP {status} for {context}: {message}")]
    ManagementStatus {
        status: u16,
        context: String,
        message: String,
    },

    /// A 2xx body that does not match the expected `{ value: [...] }` shape.
    #[error("Unexpected response body for {context}: {details}")]
    Decode { context: String, details: String },

    #[error("'{query}' is not an available {field} option")]
    UnknownOption { field: Field, query: String },

    #[error("{0} is derived and cannot be selected directly")]
    DerivedField(Field),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid deployment answers: {0}")]
    Answers(#[from] toml::de::Error),

    /// Parameters were requested before every page validated.
    #[error("Deployment settings are incomplete: {0}")]
    Incomplete(String),

    #[error("Notebook generation failed: {0}")]
    Notebook(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DeployError {
    /// Message that is safe to show in the wizard (no URLs with ids, no token fragments).
    pub fn user_message(&self) -> String {
        match self {
            DeployError::Credential { .. } => {
                "Unable to get an access token for the selected account. Sign in again and retry."
                    .to_string()
            }
            DeployError::Transport { .. } => {
                "Unable to reach Azure. Check network connectivity and try again.".to_string()
            }
            DeployError::ManagementStatus {
                status, message, ..
            } => {
                if message.trim().is_empty() {
                    format!("Azure returned an error (HTTP {}).", status)
                } else {
                    format!("Azure returned an error (HTTP {}): {}", status, message)
                }
            }
            DeployError::Decode { .. } => {
                "Azure returned a response the wizard could not read.".to_string()
            }
            DeployError::UnknownOption { .. } | DeployError::DerivedField(_) => self.to_string(),
            DeployError::Config(_) | DeployError::Answers(_) | DeployError::Incomplete(_) => {
                self.to_string()
            }
            DeployError::Notebook(_) | DeployError::Io(_) | DeployError::Json(_) => {
                "Unable to write the deployment notebook. Check the output path and logs."
                    .to_string()
            }
        }
    }
}

pub type DeployResult<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_user_message_hides_url() {
        let err = DeployError::Transport {
            url: "https://management.azure.com/subscriptions/abc/providers".to_string(),
            details: "connection reset".to_string(),
        };
        let msg = err.user_message();
        assert!(!msg.contains("subscriptions/abc"), "leaked url: {}", msg);
        assert!(msg.contains("Unable to reach Azure"));
        // Internal details stay available for logs
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn management_status_user_message_includes_arm_message() {
        let err = DeployError::ManagementStatus {
            status: 403,
            context: "list servers".to_string(),
            message: "AuthorizationFailed".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Azure returned an error (HTTP 403): AuthorizationFailed"
        );
    }

    #[test]
    fn credential_user_message_does_not_echo_details() {
        let err = DeployError::Credential {
            account: "someone@contoso.com".to_string(),
            details: "token=TOKEN_SHOULD_BE_REDACTED".to_string(),
        };
        assert!(!err.user_message().contains("TOKEN_SHOULD_BE_REDACTED"));
    }

    #[test]
    fn deploy_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DeployError>();
    }
}
