use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("failed to read certificate {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not decode PEM certificate: {0}")]
    Certificate(openssl::error::ErrorStack),
    #[error("certificate subject is empty")]
    EmptySubject,
    #[error("first subject attribute is not a UID (0.9.2342.19200300.100.1.1)")]
    MissingUid,
    #[error("UID attribute is not a string: {0}")]
    Encoding(openssl::error::ErrorStack),
}

#[derive(Debug, Error)]
pub enum SenderError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid client identity: {0}")]
    Identity(reqwest::Error),
    #[error("failed to build push client: {0}")]
    Client(reqwest::Error),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("push transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {path}: {source}")]
    Bind { path: PathBuf, source: io::Error },
    #[error("failed to accept connection: {0}")]
    Accept(io::Error),
    #[error("request admission closed")]
    Admission(#[from] tokio::sync::AcquireError),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to connect to syslog: {0}")]
    Syslog(String),
    #[error("failed to install logger: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read request: {0}")]
    Read(#[from] io::Error),
    #[error("connection closed before a request line arrived")]
    Closed,
    #[error("request line is empty")]
    Empty,
}
