use std::path::PathBuf;

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/courier/courierapns.socket";
pub const DEFAULT_MAX_CONCURRENT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    Syslog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// One request at a time, handled on the accept loop.
    Serialized,
    /// One task per connection, at most `max_in_flight` running at once.
    Concurrent { max_in_flight: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Sandbox,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
    pub socket: PathBuf,
    pub log_target: LogTarget,
    pub log_level: String,
    pub concurrency: Concurrency,
    pub environment: Environment,
}

