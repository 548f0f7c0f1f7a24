use crate::payload::{Envelope, RedirectDescriptor};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;

pub fn descriptor_for(url: &str) -> RedirectDescriptor {
    RedirectDescriptor {
        account_id: 1,
        version: 1,
        url: url.into(),
        tracking_id: "abc".into(),
        url_ids: vec![],
    }
}

pub fn envelope_for(descriptor: &RedirectDescriptor) -> Envelope {
    Envelope {
        signature: "x".into(),
        version: 1,
        payload: serde_json::to_string(descriptor).unwrap(),
    }
}

/// Encodes the way the provider does: standard alphabet, padding stripped
pub fn encode_envelope(envelope: &Envelope) -> String {
    STANDARD_NO_PAD.encode(serde_json::to_vec(envelope).unwrap())
}

/// `p` query value for a payload redirecting to `url`
pub fn encode_payload(url: &str) -> String {
    encode_envelope(&envelope_for(&descriptor_for(url)))
}
