use core::fmt;

/// Result alias for `commune`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction, clustering, and detection runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// The graph source failed to produce a graph.
    GraphSource(String),

    /// The entity resolver failed (distinct from a clean miss, which is `None`).
    Resolver(String),

    /// The community store rejected a write.
    Store(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::GraphSource(msg) => write!(f, "graph source error: {msg}"),
            Error::Resolver(msg) => write!(f, "entity resolver error: {msg}"),
            Error::Store(msg) => write!(f, "community store error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
