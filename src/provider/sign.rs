//! Request signing for the provider's web API
//!
//! Every `/b/api` request carries a query parameter of the form
//! `{timeSign}={epoch}-{nonce}-{dataSign}`:
//! - `timeSign` is the CRC-32 of the current minute (`yyyyMMddHHmm`, UTC+8)
//!   with each digit substituted through a fixed letter table
//! - `dataSign` is the CRC-32 of `{epoch}|{nonce}|{path}|{platform}|{version}|{timeSign}`
//!
//! `path` starts at the first `/api` in the URL.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rand::Rng;

/// Digit-to-letter substitution applied to the minute timestamp
const DIGIT_TABLE: [char; 10] = ['a', 'd', 'e', 'f', 'g', 'h', 'l', 'm', 'y', 'i'];

/// Provider's local offset (Asia/Shanghai has no DST)
const PROVIDER_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Exclusive upper bound of the nonce
const NONCE_BOUND: u32 = 10_000_000;

/// Client identification that participates in the data signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignContext {
    /// `platform` header value
    pub platform: String,
    /// `app-version` header value
    pub app_version: String,
}

impl Default for SignContext {
    fn default() -> Self {
        Self {
            platform: "web".to_string(),
            app_version: "3".to_string(),
        }
    }
}

/// Sign `url` with the current time and a random nonce
///
/// Signing is best effort: when the URL has no `/api` segment it is returned
/// unchanged and the provider decides whether to accept it.
pub fn sign_url(url: &str, ctx: &SignContext) -> String {
    let nonce = rand::thread_rng().gen_range(0..NONCE_BOUND);
    match sign_url_at(url, ctx, Utc::now(), nonce) {
        Some(signed) => signed,
        None => {
            tracing::warn!(url = %url, "cannot sign request URL, sending unsigned");
            url.to_string()
        }
    }
}

/// Deterministic signing at a fixed instant with a fixed nonce
///
/// Returns `None` when the URL cannot be signed.
pub fn sign_url_at(
    url: &str,
    ctx: &SignContext,
    now: DateTime<Utc>,
    nonce: u32,
) -> Option<String> {
    let path = signed_path(url)?;
    let epoch = now.timestamp();

    let time_sign = time_signature(now)?;
    let data = format!(
        "{epoch}|{nonce}|{path}|{}|{}|{time_sign}",
        ctx.platform, ctx.app_version
    );
    let data_sign = crc32fast::hash(data.as_bytes());

    let separator = if url.contains('?') { '&' } else { '?' };
    Some(format!(
        "{url}{separator}{time_sign}={epoch}-{nonce}-{data_sign}"
    ))
}

/// CRC-32 of the substituted minute timestamp
fn time_signature(now: DateTime<Utc>) -> Option<u32> {
    let offset = FixedOffset::east_opt(PROVIDER_UTC_OFFSET_SECS)?;
    let minute = offset
        .from_utc_datetime(&now.naive_utc())
        .format("%Y%m%d%H%M")
        .to_string();

    let substituted: String = minute
        .chars()
        .map(|c| c.to_digit(10).map(|d| DIGIT_TABLE[d as usize]))
        .collect::<Option<String>>()?;

    Some(crc32fast::hash(substituted.as_bytes()))
}

/// Request path participating in the signature, stripped of any query
fn signed_path(url: &str) -> Option<&str> {
    let start = url.find("/api")?;
    let path = &url[start..];
    Some(path.split('?').next().unwrap_or(path))
}
