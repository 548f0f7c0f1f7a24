use std::collections::HashSet;

/// Hosts accepted when no allowlist is configured
pub const DEFAULT_SAFE_HOSTS: &[&str] = &[
    "yearbook.com",
    "www.yearbook.com",
    "yearbookmachine.com",
    "www.yearbookmachine.com",
    "twitter.com",
    "www.twitter.com",
    "facebook.com",
    "www.facebook.com",
];

/// Set of hosts that are safe redirect targets.
///
/// Membership is an exact string match: no wildcards, no subdomain folding,
/// no case normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allowlist {
    hosts: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Allowlist {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl Default for Allowlist {
    fn default() -> Self {
        Allowlist::new(DEFAULT_SAFE_HOSTS.iter().copied())
    }
}
