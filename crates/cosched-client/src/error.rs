use miette::Diagnostic;
use thiserror::Error;

/// Error type for reads against the cluster API
#[derive(Error, Debug, Diagnostic)]
pub enum ClientError {
    /// The request never produced a response
    #[error("Request to {url} failed: {message}")]
    #[diagnostic(
        code(cosched::client::request_failed),
        help("Check that the API server is reachable from the scheduler and that the request timeout is long enough")
    )]
    RequestFailed {
        #[allow(unused)]
        url: String,
        #[allow(unused)]
        message: String,
    },

    /// The API server answered with a status other than 2xx or 404
    #[error("GET {url} returned status {status}: {body}")]
    #[diagnostic(
        code(cosched::client::unexpected_status),
        help("A 401/403 usually means the service account lacks get permission on pods, persistentvolumeclaims or sharemanagers.longhorn.io")
    )]
    UnexpectedStatus {
        #[allow(unused)]
        url: String,
        #[allow(unused)]
        status: u16,
        #[allow(unused)]
        body: String,
    },

    /// The response body did not decode into the expected object
    #[error("Failed to decode response from {url}: {message}")]
    #[diagnostic(
        code(cosched::client::decode_failed),
        help("The API server returned an object of an unexpected shape. Verify the API version of the requested resource")
    )]
    DecodeFailed {
        #[allow(unused)]
        url: String,
        #[allow(unused)]
        message: String,
    },

    /// Invalid client configuration
    #[error("Invalid client configuration: {message}")]
    #[diagnostic(code(cosched::client::invalid_config), help("{suggestion}"))]
    InvalidConfig {
        #[allow(unused)]
        message: String,
        #[allow(unused)]
        suggestion: String,
    },

    /// A credential or certificate file could not be read
    #[error("Failed to read {path}")]
    #[diagnostic(
        code(cosched::client::file_unreadable),
        help("Verify the file exists and is readable by the scheduler process")
    )]
    FileUnreadable {
        #[allow(unused)]
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn request_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn unexpected_status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn decode_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecodeFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn file_unreadable(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileUnreadable {
            path: path.into(),
            source,
        }
    }
}
