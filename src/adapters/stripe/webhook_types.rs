//! Stripe wire types.
//!
//! Only the fields this service reads are modeled; everything else in the
//! Stripe JSON is ignored.

use std::collections::HashMap;

use serde::Deserialize;

/// Why a `Stripe-Signature` header could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureParseError {
    #[error("Missing Stripe-Signature header")]
    MissingHeader,
    #[error("Missing timestamp (t=) in signature")]
    MissingTimestamp,
    #[error("Missing v1 signature in header")]
    MissingV1Signature,
    #[error("Invalid timestamp format")]
    InvalidTimestamp,
    #[error("Invalid signature format (not valid hex)")]
    InvalidSignatureFormat,
}

/// Parsed `t=<unix>,v1=<hex>[,v1=<hex>...]` header.
///
/// Stripe sends several `v1` entries while a signing secret is being rolled;
/// any one of them may match.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" => {
                    let parsed = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| SignatureParseError::InvalidTimestamp)?;
                    timestamp = Some(parsed);
                }
                "v1" => {
                    let bytes = hex_decode(value.trim())
                        .ok_or(SignatureParseError::InvalidSignatureFormat)?;
                    v1_signatures.push(bytes);
                }
                // v0 and future schemes
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }
        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: StripeEventData,
    #[serde(default)]
    pub livemode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Checkout session, as returned on create and inside `checkout.session.*`
/// events.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Charge object inside `charge.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCharge {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// `{"error": {...}}` body on non-2xx API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub decline_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timestamp_and_signature() {
        let header = SignatureHeader::parse("t=1704067200,v1=0a0b").unwrap();
        assert_eq!(header.timestamp, 1704067200);
        assert_eq!(header.v1_signatures, vec![vec![0x0a, 0x0b]]);
    }

    #[test]
    fn keeps_every_v1_and_ignores_v0() {
        let header = SignatureHeader::parse("t=1,v1=aa,v0=ff,v1=bb").unwrap();
        assert_eq!(header.v1_signatures, vec![vec![0xaa], vec![0xbb]]);
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(
            SignatureHeader::parse("").unwrap_err(),
            SignatureParseError::MissingHeader
        );
        assert_eq!(
            SignatureHeader::parse("v1=aa").unwrap_err(),
            SignatureParseError::MissingTimestamp
        );
        assert_eq!(
            SignatureHeader::parse("t=1").unwrap_err(),
            SignatureParseError::MissingV1Signature
        );
        assert_eq!(
            SignatureHeader::parse("t=soon,v1=aa").unwrap_err(),
            SignatureParseError::InvalidTimestamp
        );
        assert_eq!(
            SignatureHeader::parse("t=1,v1=abc").unwrap_err(),
            SignatureParseError::InvalidSignatureFormat
        );
        assert_eq!(
            SignatureHeader::parse("t=1,v1=zz").unwrap_err(),
            SignatureParseError::InvalidSignatureFormat
        );
    }

    #[test]
    fn hex_encode_is_lowercase() {
        assert_eq!(hex_encode(&[0xde, 0xad, 0x01]), "dead01");
        assert_eq!(hex_decode("DEAD01"), Some(vec![0xde, 0xad, 0x01]));
    }

    #[test]
    fn checkout_session_tolerates_missing_fields() {
        let json = r#"{"id":"cs_1","object":"checkout.session","metadata":{"user_id":"u1"}}"#;
        let session: StripeCheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "cs_1");
        assert_eq!(session.payment_status, None);
        assert_eq!(session.metadata["user_id"], "u1");
    }

    #[test]
    fn error_body_parses_decline() {
        let json = r#"{"error":{"type":"card_error","code":"card_declined","decline_code":"insufficient_funds","message":"Your card has insufficient funds."}}"#;
        let body: StripeErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.error_type.as_deref(), Some("card_error"));
        assert_eq!(body.error.decline_code.as_deref(), Some("insufficient_funds"));
    }
}
