use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadGenError {
    #[error("HTTP request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("API endpoint returned HTTP {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    #[error("Failed to decode API response: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error {code} in {method}: {message} ({data})")]
    ApiError {
        method: String,
        code: i64,
        message: String,
        data: String,
    },

    #[error("Unexpected response from {method}: {message}")]
    UnexpectedResponseError { method: String, message: String },

    #[error("Failed to send {key} for host {host}: {message}")]
    SinkError {
        host: String,
        key: String,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration value: {field}")]
    MissingConfigError { field: String },
}

impl LoadGenError {
    /// Network, HTTP status and decode failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LoadGenError::TransportError(_)
                | LoadGenError::HttpStatusError { .. }
                | LoadGenError::SerializationError(_)
                | LoadGenError::UnexpectedResponseError { .. }
        )
    }

    pub fn is_api(&self) -> bool {
        matches!(self, LoadGenError::ApiError { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(
            self,
            LoadGenError::ConfigError { .. }
                | LoadGenError::InvalidConfigValueError { .. }
                | LoadGenError::MissingConfigError { .. }
        )
    }

    /// Process exit code for a run that ends with this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_config() {
            2
        } else {
            1
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LoadGenError::TransportError(_) | LoadGenError::HttpStatusError { .. } => {
                "Check the API URL (it usually ends in /api_jsonrpc.php) and that the frontend is reachable"
            }
            LoadGenError::SerializationError(_) | LoadGenError::UnexpectedResponseError { .. } => {
                "The endpoint did not answer like a JSON-RPC API; verify the URL path"
            }
            LoadGenError::ApiError { code: -32602, .. } => {
                "The API rejected the parameters; the object may conflict with an existing one or the server version differs"
            }
            LoadGenError::ApiError { .. } => {
                "Check that the API token is valid and has write permission on hosts and host groups"
            }
            LoadGenError::SinkError { .. } => {
                "Make sure the sender binary is installed and the server accepts trapper data from this machine"
            }
            LoadGenError::IoError(_) => "Check file paths and permissions",
            LoadGenError::ConfigError { .. }
            | LoadGenError::InvalidConfigValueError { .. }
            | LoadGenError::MissingConfigError { .. } => {
                "Fix the value on the command line or in the configuration file and retry"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let api = LoadGenError::ApiError {
            method: "host.create".to_string(),
            code: -32602,
            message: "Invalid params.".to_string(),
            data: "Host with the same name already exists.".to_string(),
        };
        assert!(api.is_api());
        assert!(!api.is_transport());
        assert_eq!(api.exit_code(), 1);
        assert!(api.to_string().contains("already exists"));

        let status = LoadGenError::HttpStatusError {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert!(status.is_transport());

        let missing = LoadGenError::MissingConfigError {
            field: "token".to_string(),
        };
        assert_eq!(missing.exit_code(), 2);
    }
}
