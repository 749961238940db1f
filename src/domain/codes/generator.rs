//! Random human-shareable codes.
//!
//! Access codes look like `MEM-7K2Q9XZA`; coupon codes are a tier prefix
//! followed by random characters, capped at twelve characters. Randomness
//! comes from the thread-local generator; the codes are lookup keys, not
//! secrets.

use rand::Rng;
use std::collections::HashSet;

use crate::domain::foundation::Timestamp;
use crate::domain::pricing::DiscountTier;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_ACCESS_CODE_PREFIX: &str = "MEM";
pub const DEFAULT_ACCESS_CODE_LENGTH: usize = 8;
pub const DEFAULT_ACCESS_CODE_VALIDITY_DAYS: i64 = 365;

const COUPON_MAX_LENGTH: usize = 12;
/// Random characters every coupon keeps after its prefix.
const COUPON_MIN_RANDOM: usize = 4;
const COUPON_MAX_RANDOM: usize = 6;

fn random_chars(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Generates `{PREFIX}-{length random A-Z0-9}`. The prefix is uppercased.
pub fn generate_access_code(prefix: &str, length: usize) -> String {
    format!("{}-{}", prefix.to_uppercase(), random_chars(length))
}

/// Generates `count` pairwise-distinct access codes.
pub fn generate_access_code_batch(count: usize, prefix: Option<&str>) -> Vec<String> {
    let prefix = prefix.unwrap_or(DEFAULT_ACCESS_CODE_PREFIX);
    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);

    while codes.len() < count {
        let code = generate_access_code(prefix, DEFAULT_ACCESS_CODE_LENGTH);
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}

/// True for `^[A-Z]+-[A-Z0-9]+$`.
pub fn is_valid_access_code_format(code: &str) -> bool {
    let Some((prefix, body)) = code.split_once('-') else {
        return false;
    };
    !prefix.is_empty()
        && !body.is_empty()
        && prefix.bytes().all(|b| b.is_ascii_uppercase())
        && body
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Strips dashes and regroups in blocks of four: `ABCD1234` -> `ABCD-1234`.
pub fn format_access_code(code: &str) -> String {
    let clean: Vec<char> = code.chars().filter(|c| *c != '-').collect();
    clean
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// Expiry timestamp `days` from now.
pub fn calculate_access_code_expiration(days: i64) -> Timestamp {
    Timestamp::now().add_days(days)
}

pub fn is_access_code_expired(expires_at: &Timestamp) -> bool {
    expires_at.is_before(&Timestamp::now())
}

/// Whole days until expiry, rounded up, never negative.
pub fn access_code_remaining_days(expires_at: &Timestamp) -> i64 {
    let remaining = expires_at.duration_since(&Timestamp::now());
    if remaining <= chrono::Duration::zero() {
        return 0;
    }
    let seconds = remaining.num_seconds();
    (seconds + 86_399) / 86_400
}

/// Coupon prefix: the A-Z0-9 characters of `custom`, uppercased and cut so
/// that `COUPON_MIN_RANDOM` characters still fit. Falls back to the tier's
/// prefix when nothing usable is left.
fn coupon_prefix(tier: DiscountTier, custom: Option<&str>) -> String {
    let clean = |raw: &str| -> String {
        raw.chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .take(COUPON_MAX_LENGTH - COUPON_MIN_RANDOM)
            .collect()
    };
    let prefix = custom.map(clean).unwrap_or_default();
    if prefix.is_empty() {
        clean(tier.prefix())
    } else {
        prefix
    }
}

/// Generates up to `count` distinct coupon codes for a tier.
///
/// Each code is the prefix followed by up to six random characters, at most
/// twelve characters in all. The prefix defaults to the tier's own. When
/// `count` exceeds the number of distinct codes the random part can spell,
/// every one of them is returned instead.
pub fn generate_coupon_batch(
    tier: DiscountTier,
    count: usize,
    prefix: Option<&str>,
) -> Vec<String> {
    let prefix = coupon_prefix(tier, prefix);
    let random_len = COUPON_MAX_RANDOM.min(COUPON_MAX_LENGTH - prefix.len());
    let space = u32::try_from(random_len)
        .ok()
        .and_then(|len| CHARSET.len().checked_pow(len))
        .unwrap_or(usize::MAX);
    let count = count.min(space);

    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    while codes.len() < count {
        let code = format!("{}{}", prefix, random_chars(random_len));
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}
