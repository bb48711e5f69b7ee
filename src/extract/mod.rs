//! Email extraction engine
//!
//! This module turns raw page content into scored, deduplicated email
//! candidates.
//!
//! # Pipeline
//!
//! 1. Match address-shaped substrings (case-insensitive, lowercased)
//! 2. Drop addresses matching an exclusion pattern or a disposable domain
//! 3. Drop structurally invalid addresses
//! 4. Score the rest and drop those under the minimum confidence
//! 5. In markup, also read `mailto:` targets, which score higher
//! 6. Deduplicate by address, keeping the highest confidence
//!
//! Extraction is synchronous and never fails on malformed input. The
//! optional DNS check lives in [`DomainResolver`] and is applied by the
//! crawler.

mod candidate;
mod dns;
mod extractor;
mod scoring;

pub use candidate::{deduplicate, filter_by_domain, EmailCandidate, EmailSet};
pub use dns::{DnsAnswer, DomainResolver, MailDns, SystemDns};
pub use extractor::{ContentKind, EmailExtractor, MAILTO_CONTEXT};
pub use scoring::{is_well_formed, score};
