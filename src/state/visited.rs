use crate::state::FetchState;
use crate::url::CanonicalUrl;
use std::collections::HashMap;

/// Counts describing the visited set at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisitedSnapshot {
    /// Every URL ever inserted
    pub total: usize,

    /// URLs in state `Fetched`
    pub fetched: usize,

    /// URLs whose page has not yet reported its discovered links
    pub outstanding: usize,
}

impl VisitedSnapshot {
    /// True when nothing is left to fetch or process
    pub fn is_quiescent(&self) -> bool {
        self.total > 0 && self.outstanding == 0
    }

    /// True when every known URL has been dispatched to the fetcher
    pub fn all_fetched(&self) -> bool {
        self.fetched == self.total
    }
}

/// Map from canonical URL to its fetch state
///
/// The set only grows: a key is inserted at most once and a `Fetched`
/// entry never reverts. It is not synchronised; the dedup stage owns it
/// and every other task observes it through [`VisitedSnapshot`]s.
#[derive(Debug, Default)]
pub struct VisitedSet {
    entries: HashMap<CanonicalUrl, FetchState>,
    fetched: usize,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a URL as `Discovered` unless it is already known
    ///
    /// Returns true when this call inserted the URL, i.e. the caller is the
    /// first writer and must enqueue it for fetching.
    pub fn insert_if_absent(&mut self, url: CanonicalUrl) -> bool {
        use std::collections::hash_map::Entry;

        match self.entries.entry(url) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(FetchState::Discovered);
                true
            }
        }
    }

    /// Transitions a known URL from `Discovered` to `Fetched`
    ///
    /// Returns true only when the transition happened. Unknown URLs are not
    /// inserted.
    pub fn mark_fetched(&mut self, url: &CanonicalUrl) -> bool {
        match self.entries.get_mut(url) {
            Some(state) if !state.is_fetched() => {
                *state = FetchState::Fetched;
                self.fetched += 1;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, url: &CanonicalUrl) -> Option<FetchState> {
        self.entries.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched
    }

    pub fn discovered_count(&self) -> usize {
        self.entries.len() - self.fetched
    }

    pub fn snapshot(&self, outstanding: usize) -> VisitedSnapshot {
        VisitedSnapshot {
            total: self.entries.len(),
            fetched: self.fetched,
            outstanding,
        }
    }
}
