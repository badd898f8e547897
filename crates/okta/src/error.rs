use catalog_model::EntityNameError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Why a single group or user could not be given a catalog name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("profile field {field:?} is missing")]
    MissingField { field: String },

    #[error("profile field {field:?} is a {found}, expected a string or number")]
    InvalidFieldType { field: String, found: &'static str },

    #[error("invalid entity name: {0}")]
    InvalidName(#[from] EntityNameError),

    #[error("{0}")]
    Custom(String),
}

impl NamingError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid directory URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("pagination revisited {url}")]
    PaginationCycle { url: String },

    #[error("pagination stopped after {pages} pages")]
    TooManyPages { pages: usize },

    #[error("next link {url} leaves the org origin {origin}")]
    ForeignNextLink { url: String, origin: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("okta provider config: {field} must be non-empty")]
    MissingField { field: &'static str },

    #[error("okta provider config: org_url is not a valid URL: {0}")]
    InvalidOrgUrl(#[from] url::ParseError),

    #[error("unknown {kind} naming strategy {value:?} (expected one of: {expected})")]
    UnknownStrategy {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider {provider} is not connected to a catalog")]
    NotConnected { provider: String },

    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("catalog connection rejected mutation: {0}")]
    Sink(String),
}
