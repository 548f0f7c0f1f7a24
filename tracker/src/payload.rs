//! Click-tracking payload model.
//!
//! The `p` query parameter is standard base64 with the trailing padding
//! stripped. It decodes to an [`Envelope`] whose `p` field is itself a JSON
//! document describing the redirect ([`RedirectDescriptor`]).

use crate::errors::ClickError;
use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

/// Standard alphabet, canonical padding, lenient about unused trailing bits
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Outer structure of a decoded payload. The signature is carried but never verified.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Envelope {
    #[serde(rename = "s")]
    pub signature: String,
    #[serde(rename = "v")]
    pub version: i64,
    /// Nested JSON document, see [`RedirectDescriptor`]
    #[serde(rename = "p")]
    pub payload: String,
}

/// Target of a tracked click
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RedirectDescriptor {
    #[serde(rename = "u")]
    pub account_id: i64,
    #[serde(rename = "v")]
    pub version: i64,
    pub url: String,
    #[serde(rename = "id")]
    pub tracking_id: String,
    pub url_ids: Vec<String>,
}

impl Envelope {
    /// Decodes the raw `p` query value into an envelope
    pub fn decode(param: &str) -> Result<Self, ClickError> {
        let bytes = PAYLOAD_ENGINE.decode(repad(param))?;
        // A JSON `null` leaves every field at its default
        serde_json::from_slice::<Option<Self>>(&bytes)
            .map(Option::unwrap_or_default)
            .map_err(ClickError::InvalidEnvelope)
    }

    /// Parses the nested payload string
    pub fn descriptor(&self) -> Result<RedirectDescriptor, ClickError> {
        serde_json::from_str::<Option<RedirectDescriptor>>(&self.payload)
            .map(Option::unwrap_or_default)
            .map_err(ClickError::InvalidDescriptor)
    }
}

/// Restores the padding the sender strips.
///
/// The value arrives form-urlencoded, so an unescaped `+` shows up as a
/// space. Spaces are never valid base64 and are mapped back first.
pub fn repad(param: &str) -> String {
    let mut normalized = param.replace(' ', "+");

    let rem = normalized.len() % 4;
    if rem != 0 {
        normalized.push_str(&"=".repeat(4 - rem));
    }

    normalized
}
