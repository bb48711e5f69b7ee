//! URL handling module for Email-Scout
//!
//! This module provides URL normalization (the identity used by the cache
//! and by per-site visited sets), public-suffix-aware domain extraction,
//! and the link filter that keeps a crawl on one site.

mod domain;
mod filter;
mod normalize;

pub use domain::{canonical_domain, canonical_domain_str};
pub use filter::{LinkFilter, LinkRejection};
pub use normalize::{normalize_parsed, normalize_url, UrlKey};
