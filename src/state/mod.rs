//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FetchState`: whether a discovered URL has been handed to the fetcher
//! - `VisitedSet`: every canonical URL ever enqueued during this crawl
//! - `VisitedSnapshot`: point-in-time counts published to the monitor

mod fetch_state;
mod visited;

// Re-export main types
pub use fetch_state::FetchState;
pub use visited::{VisitedSet, VisitedSnapshot};
