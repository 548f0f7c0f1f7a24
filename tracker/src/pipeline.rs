use crate::allowlist::Allowlist;
use crate::errors::ClickError;
use crate::payload::{Envelope, RedirectDescriptor};
use std::sync::Arc;
use url::Url;

/// A click whose target passed every check
#[derive(Debug)]
pub struct ValidatedClick {
    pub descriptor: RedirectDescriptor,
    pub url: Url,
}

impl ValidatedClick {
    /// Redirect target exactly as it appeared in the payload
    pub fn target(&self) -> &str {
        &self.descriptor.url
    }
}

/// Decodes a click-tracking payload and decides whether its target may be
/// redirected to.
///
/// The payload signature cannot be verified here, so the target host has to
/// match both the domain the caller put in the route and the allowlist.
#[derive(Clone, Debug)]
pub struct ClickPipeline {
    allowlist: Arc<Allowlist>,
}

impl ClickPipeline {
    pub fn new(allowlist: Arc<Allowlist>) -> Self {
        Self { allowlist }
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// Runs every check in order and stops at the first failure
    pub fn validate(&self, domain: &str, payload: Option<&str>) -> Result<ValidatedClick, ClickError> {
        let payload = payload
            .filter(|p| !p.is_empty())
            .ok_or(ClickError::MissingPayload)?;

        let envelope = Envelope::decode(payload)?;
        let descriptor = envelope.descriptor()?;
        let url = Url::parse(&descriptor.url)?;

        // Compare on the host as written; Url lowercases it and drops default ports
        let host = raw_host(&descriptor.url);
        if domain != host {
            return Err(ClickError::DomainMismatch);
        }

        if !self.allowlist.contains(host) {
            return Err(ClickError::UnsafeHost);
        }

        Ok(ValidatedClick { descriptor, url })
    }
}

/// Authority of `url` as written, minus any userinfo. Includes the port when
/// one is given. Empty for URLs without an authority.
fn raw_host(url: &str) -> &str {
    let Some((_, rest)) = url.split_once("://") else {
        return "";
    };

    let authority = match rest.find(['/', '?', '#']) {
        Some(end) => &rest[..end],
        None => rest,
    };

    match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    }
}
