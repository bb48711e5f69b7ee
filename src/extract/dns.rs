//! Mail deliverability check for candidate domains
//!
//! A domain can receive mail when it publishes MX records, or, when it has
//! none at all, when it has an address record (the implicit MX of RFC 5321).
//! A null MX (a single exchanger `.`) means the domain accepts no mail.

use crate::extract::EmailCandidate;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::TokioAsyncResolver;

/// Answer to a single DNS query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsAnswer {
    /// The query returned these records
    Records(Vec<String>),

    /// The name exists but has no records of the requested type, or does not exist
    NoRecords,

    /// The lookup itself failed (timeout, refused, server failure)
    Failed(String),
}

/// DNS queries needed to decide whether a domain receives mail
#[async_trait]
pub trait MailDns: fmt::Debug + Send + Sync {
    /// Mail exchanger host names of the domain
    async fn mail_exchangers(&self, domain: &str) -> DnsAnswer;

    /// IPv4 and IPv6 addresses of the domain
    async fn addresses(&self, domain: &str) -> DnsAnswer;
}

/// `MailDns` backed by the system resolver configuration
#[derive(Clone)]
pub struct SystemDns {
    resolver: TokioAsyncResolver,
}

impl fmt::Debug for SystemDns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemDns").finish_non_exhaustive()
    }
}

impl SystemDns {
    /// Builds a resolver from `/etc/resolv.conf`, or public defaults when that is unreadable
    pub fn new() -> Result<Self, ResolveError> {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                debug!(error = %e, "System resolver configuration unavailable, using defaults");
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())?
            }
        };
        Ok(Self { resolver })
    }
}

fn answer_from_error(e: &ResolveError) -> DnsAnswer {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => DnsAnswer::NoRecords,
        _ => DnsAnswer::Failed(e.to_string()),
    }
}

#[async_trait]
impl MailDns for SystemDns {
    async fn mail_exchangers(&self, domain: &str) -> DnsAnswer {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => DnsAnswer::Records(lookup.iter().map(|mx| mx.exchange().to_utf8()).collect()),
            Err(e) => answer_from_error(&e),
        }
    }

    async fn addresses(&self, domain: &str) -> DnsAnswer {
        match self.resolver.lookup_ip(domain).await {
            Ok(lookup) => DnsAnswer::Records(lookup.iter().map(|ip| ip.to_string()).collect()),
            Err(e) => answer_from_error(&e),
        }
    }
}

fn is_null_mx(exchangers: &[String]) -> bool {
    exchangers.iter().all(|host| host.trim_end_matches('.').is_empty())
}

/// Decides mail deliverability of email domains, remembering each answer
///
/// One resolver lives for one site crawl, so a domain is looked up at most
/// once per site.
#[derive(Debug)]
pub struct DomainResolver {
    dns: Arc<dyn MailDns>,
    answers: HashMap<String, bool>,
}

impl DomainResolver {
    pub fn new(dns: Arc<dyn MailDns>) -> Self {
        Self {
            dns,
            answers: HashMap::new(),
        }
    }

    /// Returns true if the domain can receive mail
    pub async fn accepts_mail(&mut self, domain: &str) -> bool {
        if let Some(&known) = self.answers.get(domain) {
            return known;
        }

        let accepts = match self.dns.mail_exchangers(domain).await {
            DnsAnswer::Records(exchangers) if !exchangers.is_empty() => {
                let accepts = !is_null_mx(&exchangers);
                if !accepts {
                    debug!(domain, "Email domain publishes a null MX");
                }
                accepts
            }
            DnsAnswer::Records(_) | DnsAnswer::NoRecords => match self.dns.addresses(domain).await {
                DnsAnswer::Records(addrs) => !addrs.is_empty(),
                DnsAnswer::NoRecords => {
                    debug!(domain, "Email domain has no MX or address records");
                    false
                }
                DnsAnswer::Failed(error) => {
                    debug!(domain, error = %error, "Address lookup failed");
                    false
                }
            },
            DnsAnswer::Failed(error) => {
                debug!(domain, error = %error, "MX lookup failed");
                false
            }
        };

        self.answers.insert(domain.to_string(), accepts);
        accepts
    }

    /// Drops candidates whose domain cannot receive mail
    pub async fn retain_deliverable(&mut self, candidates: Vec<EmailCandidate>) -> Vec<EmailCandidate> {
        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self.accepts_mail(candidate.domain()).await {
                kept.push(candidate);
            }
        }
        kept
    }
}
