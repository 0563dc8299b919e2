/// Failures of a single OS query. Callers degrade these to "Unknown" or an absent field.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("query {key} failed: {reason}")]
    QueryFailed { key: &'static str, reason: String },

    #[error("query {0} returned no data")]
    Empty(&'static str),

    #[error("{0} is not available on this platform")]
    Unsupported(&'static str),

    #[error("{operation} failed: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("command {command} exited with {status}")]
    Command { command: &'static str, status: String },

    #[error("could not parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },
}

impl ProbeError {
    pub(crate) fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }

    pub(crate) fn last_os_error(operation: &'static str) -> Self {
        Self::io(operation, std::io::Error::last_os_error())
    }
}
