//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageOutcome`: What happened to a single visited page
//! - `TraversalState`: Frontier, visited set and accumulated emails of one site crawl

mod page_state;
mod traversal;

pub use page_state::PageOutcome;
pub use traversal::TraversalState;
