use thiserror::Error;

/// Enumeration of errors raised by calls against the platform API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("error requesting {url}: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("invalid response code {status} from {url}")]
    Status {
        status: http::StatusCode,
        url: String,
    },
    #[error("empty response body from {url}")]
    EmptyBody { url: String },
    #[error("undecodable response body from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
    #[error("invalid API url")]
    Url(#[from] url::ParseError),
}

/// Enumeration of errors that abort an entire processing run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no group id supplied for a group job")]
    MissingGroup,
}
