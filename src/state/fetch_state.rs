/// Fetch state definitions for entries of the visited set
use std::fmt;

/// Represents how far a discovered URL has progressed
///
/// The only legal transition is `Discovered -> Fetched`; it records that a
/// fetch was attempted, not that it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    /// URL has been enqueued but no worker has picked it up yet
    Discovered,

    /// A crawl worker dispatched the URL to the fetcher
    Fetched,
}

impl FetchState {
    /// Returns true once a fetch has been attempted
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Fetched => "fetched",
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
