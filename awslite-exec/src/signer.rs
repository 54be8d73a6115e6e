//! Request signing. [`SigV4Signer`] implements AWS Signature Version 4 with
//! signed headers; alternative schemes plug in through [`Signer`].

use std::collections::BTreeMap;

use awslite_core::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::http::HttpRequestParts;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

// Never covered by the signature.
const UNSIGNED_HEADERS: [&str; 3] = ["authorization", "user-agent", "content-length"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("cannot sign request: URL has no host")]
    MissingHost,
    #[error("cannot sign request: {0}")]
    Key(String),
}

/// Everything a signer needs besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    pub service: &'a str,
    pub region: &'a str,
    pub credentials: &'a Credentials,
    pub time: DateTime<Utc>,
}

pub trait Signer: Send + Sync {
    /// Add authentication headers to `req`. Called once per attempt.
    fn sign(&self, req: &mut HttpRequestParts, ctx: &SigningContext<'_>)
        -> Result<(), SigningError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SigV4Signer;

impl Signer for SigV4Signer {
    fn sign(
        &self,
        req: &mut HttpRequestParts,
        ctx: &SigningContext<'_>,
    ) -> Result<(), SigningError> {
        let amz_date = ctx.time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = ctx.time.format("%Y%m%d").to_string();

        req.headers.retain(|k, _| {
            !["authorization", "host", "x-amz-date", "x-amz-security-token"]
                .iter()
                .any(|h| k.eq_ignore_ascii_case(h))
        });
        req.headers.insert("host".into(), host_header(&req.url)?);
        req.headers.insert("x-amz-date".into(), amz_date.clone());
        if let Some(token) = ctx.credentials.session_token() {
            req.headers.insert("x-amz-security-token".into(), token.to_string());
        }

        let (canonical_headers, signed_headers) = canonical_headers(&req.headers);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            req.method.to_ascii_uppercase(),
            canonical_uri(&req.url),
            canonical_query(&req.url),
            canonical_headers,
            signed_headers,
            sha256_hex(&req.body),
        );

        let scope = format!("{date}/{}/{}/aws4_request", ctx.region, ctx.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );
        let key = signing_key(ctx.credentials.secret_access_key(), &date, ctx.region, ctx.service)?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        req.headers.insert(
            "authorization".into(),
            format!(
                "{ALGORITHM} Credential={}/{scope}, \
                 SignedHeaders={signed_headers}, Signature={signature}",
                ctx.credentials.access_key_id()
            ),
        );
        Ok(())
    }
}

/// `kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`
pub fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| SigningError::Key(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn host_header(url: &url::Url) -> Result<String, SigningError> {
    let host = url.host_str().ok_or(SigningError::MissingHost)?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

// Path segments are encoded a second time, as every service except S3 expects.
fn canonical_uri(url: &url::Url) -> String {
    let path = url.path();
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &url::Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (urlencoding::encode(&k).into_owned(), urlencoding::encode(&v).into_owned()))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_headers(headers: &BTreeMap<String, String>) -> (String, String) {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        if UNSIGNED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        grouped.entry(name).or_default().push(value);
    }
    let canonical = grouped
        .iter()
        .map(|(name, values)| format!("{name}:{}\n", values.join(",")))
        .collect::<String>();
    let signed = grouped.keys().cloned().collect::<Vec<_>>().join(";");
    (canonical, signed)
}
