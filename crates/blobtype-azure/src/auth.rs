//! Shared Key request signing.
//!
//! Every request is signed with HMAC-SHA256 over a canonical
//! string-to-sign built from the verb, the standard headers, the `x-ms-*`
//! headers and the resource path.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use jiff::fmt::rfc2822::DateTimePrinter;
use reqwest::Request;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const X_MS_DATE: HeaderName = HeaderName::from_static("x-ms-date");

/// Standard headers in string-to-sign order.
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Signs requests for one storage account.
#[derive(Clone)]
pub(crate) struct SharedKey {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKey")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKey {
    /// Creates a signer from the account name and base64 account key.
    pub fn new(account: impl Into<String>, encoded_key: &str) -> Result<Self> {
        let key = STANDARD.decode(encoded_key.trim())?;
        Ok(Self {
            account: account.into(),
            key,
        })
    }

    /// Stamps `x-ms-date` with the current time and adds `Authorization`.
    pub fn sign(&self, request: &mut Request) -> Result<()> {
        self.sign_at(request, Timestamp::now())
    }

    /// Stamps `x-ms-date` with `now` and adds `Authorization`.
    pub fn sign_at(&self, request: &mut Request, now: Timestamp) -> Result<()> {
        let date = DateTimePrinter::new().timestamp_to_rfc9110_string(&now)?;
        request
            .headers_mut()
            .insert(X_MS_DATE, HeaderValue::from_str(&date)?);

        let string_to_sign = self.string_to_sign(request);
        let signature = self.signature(&string_to_sign);

        let authorization = format!("SharedKey {}:{}", self.account, signature);
        request
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);

        Ok(())
    }

    /// Computes the base64 HMAC-SHA256 of `string_to_sign`.
    pub fn signature(&self, string_to_sign: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(string_to_sign.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Builds the canonical string-to-sign for `request`.
    pub fn string_to_sign(&self, request: &Request) -> String {
        let headers = request.headers();
        let mut out = String::with_capacity(256);

        out.push_str(request.method().as_str());
        out.push('\n');

        for name in SIGNED_HEADERS {
            let value = header_str(headers, name);
            // A zero length is signed as an empty string.
            if name == CONTENT_LENGTH.as_str() && value == "0" {
                out.push('\n');
                continue;
            }
            out.push_str(value);
            out.push('\n');
        }

        out.push_str(&canonicalized_headers(headers));
        out.push_str(&self.canonicalized_resource(request.url()));
        out
    }

    fn canonicalized_resource(&self, url: &url::Url) -> String {
        let mut resource = format!("/{}{}", self.account, url.path());

        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in url.query_pairs() {
            params
                .entry(name.to_lowercase())
                .or_default()
                .push(value.into_owned());
        }

        for (name, mut values) in params {
            values.sort();
            resource.push('\n');
            resource.push_str(&name);
            resource.push(':');
            resource.push_str(&values.join(","));
        }

        resource
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut ms_headers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        if !name.as_str().starts_with("x-ms-") {
            continue;
        }
        if let Ok(value) = value.to_str() {
            ms_headers
                .entry(name.as_str())
                .or_default()
                .push(value.trim());
        }
    }

    let mut out = String::new();
    for (name, values) in ms_headers {
        out.push_str(name);
        out.push(':');
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}
