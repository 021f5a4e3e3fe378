// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::canonical::CanonicalRequest;
use crate::constants::{
    AUTHORIZATION, AWS4_HMAC_SHA256, AWS4_REQUEST, HOST, UNSIGNED_PAYLOAD, X_AMZ_CONTENT_SHA_256,
    X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::request::{header_get, header_remove, header_set, Payload, SigningRequest};
use crate::Credential;
use amzsign_core::hash::{hex_hmac_sha256, hmac_sha256};
use amzsign_core::time::{format_date, format_iso8601, now, DateTime};
use http::header::{HeaderName, HeaderValue};
use http::request::Parts;
use http::{HeaderMap, Uri};
use log::debug;
use std::fmt::Write;

/// Signer that implement AWS SigV4 with header based signing.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug, Clone)]
pub struct Signer {
    credential: Credential,

    time: Option<DateTime>,
}

impl Signer {
    /// Create a new signer with the given credential.
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,

            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Sign the request and return the full set of headers to send.
    pub fn sign(&self, req: SigningRequest) -> amzsign_core::Result<SignedRequest> {
        let cred = &self.credential;
        cred.check()?;

        // Captured once, shared by X-Amz-Date and the scope.
        let now = self.time.unwrap_or_else(now);

        let mut headers = canonicalize_header(&req, cred, now);
        // Normalized above, so this is exactly what the header line carries.
        let payload_hash = header_get(&headers, X_AMZ_CONTENT_SHA_256)
            .unwrap_or(req.payload.as_str())
            .to_string();

        let creq = CanonicalRequest::build(
            &req.method,
            req.uri.path(),
            req.uri.query(),
            &headers,
            req.path_encoding,
            &payload_hash,
        )?;
        debug!("calculated canonical request: {creq}");

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = format!(
            "{}/{}/{}/{AWS4_REQUEST}",
            format_date(now),
            req.region,
            req.service
        );
        debug!("calculated scope: {scope}");

        let string_to_sign = string_to_sign(now, &scope, &creq)?;
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &req.region, &req.service)?;
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes())?;

        let authorization = format!(
            "{AWS4_HMAC_SHA256} Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id, scope, creq.signed_headers, signature
        );
        header_set(&mut headers, AUTHORIZATION, authorization.clone());

        Ok(SignedRequest {
            time: now,
            scope,
            canonical_request: creq,
            signature,
            authorization,
            headers,
        })
    }

    /// Sign the request and return only the `Authorization` header value.
    pub fn authorization(&self, req: SigningRequest) -> amzsign_core::Result<String> {
        Ok(self.sign(req)?.authorization)
    }
}

/// Make sure Host, X-Amz-Date and X-Amz-Content-Sha256 are present.
fn canonicalize_header(
    req: &SigningRequest,
    cred: &Credential,
    now: DateTime,
) -> Vec<(String, String)> {
    let mut headers = req.headers.clone();

    // A previous signature is never part of what gets signed.
    header_remove(&mut headers, AUTHORIZATION);

    // Insert HOST header if not present.
    if header_get(&headers, HOST).is_none() {
        headers.push((HOST.to_string(), host_header(&req.uri)));
    }

    // X-Amz-Date must carry the same instant as the scope.
    header_set(&mut headers, X_AMZ_DATE, format_iso8601(now));

    match &req.payload {
        Payload::Unsigned => {
            header_set(
                &mut headers,
                X_AMZ_CONTENT_SHA_256,
                UNSIGNED_PAYLOAD.to_string(),
            );
        }
        Payload::Hash(hash) => {
            // A caller supplied hash wins; keep only its first value, trimmed,
            // so the header line and the payload line agree.
            let value = match header_get(&headers, X_AMZ_CONTENT_SHA_256) {
                Some(v) => v.trim().to_string(),
                None => hash.clone(),
            };
            header_set(&mut headers, X_AMZ_CONTENT_SHA_256, value);
        }
    }

    if let Some(token) = &cred.session_token {
        header_set(&mut headers, X_AMZ_SECURITY_TOKEN, token.clone());
    }

    headers
}

/// Host header value: the uri host, plus the port if it's not the scheme default.
fn host_header(uri: &Uri) -> String {
    let host = uri.host().unwrap_or_default();
    let default_port = match uri.scheme_str() {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    };

    match uri.port_u16() {
        Some(port) if Some(port) != default_port => format!("{host}:{port}"),
        _ => host.to_string(),
    }
}

/// StringToSign:
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20220313T072004Z
/// 20220313/<region>/<service>/aws4_request
/// <hashed_canonical_request>
/// ```
fn string_to_sign(
    now: DateTime,
    scope: &str,
    creq: &CanonicalRequest,
) -> amzsign_core::Result<String> {
    let mut f = String::new();
    writeln!(f, "{AWS4_HMAC_SHA256}")?;
    writeln!(f, "{}", format_iso8601(now))?;
    writeln!(f, "{scope}")?;
    write!(f, "{}", creq.hash())?;
    Ok(f)
}

fn generate_signing_key(
    secret: &str,
    time: DateTime,
    region: &str,
    service: &str,
) -> amzsign_core::Result<Vec<u8>> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes())?;
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes())?;
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes())?;
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}

/// Output of a signing call.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    time: DateTime,
    scope: String,
    canonical_request: CanonicalRequest,
    signature: String,
    authorization: String,
    headers: Vec<(String, String)>,
}

impl SignedRequest {
    /// The `Authorization` header value.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Hex encoded signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Credential scope: `<date>/<region>/<service>/aws4_request`.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The instant used for both `X-Amz-Date` and the scope.
    pub fn time(&self) -> DateTime {
        self.time
    }

    /// The canonical request that has been signed.
    pub fn canonical_request(&self) -> &CanonicalRequest {
        &self.canonical_request
    }

    /// All headers to send, `Authorization` included.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    /// Take the headers out.
    pub fn into_headers(self) -> Vec<(String, String)> {
        self.headers
    }

    /// Convert the headers into a `HeaderMap`.
    ///
    /// `Authorization` and `X-Amz-Security-Token` are marked as sensitive.
    pub fn to_header_map(&self) -> amzsign_core::Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            let mut value = HeaderValue::from_str(value)?;
            if name.as_str().eq_ignore_ascii_case(AUTHORIZATION)
                || name.as_str().eq_ignore_ascii_case(X_AMZ_SECURITY_TOKEN)
            {
                // Set value sensitive to avoid leaking.
                value.set_sensitive(true);
            }
            map.append(name, value);
        }

        Ok(map)
    }

    /// Apply the signed headers to http::request::Parts.
    ///
    /// Every header present in the signed set replaces the existing values of
    /// the same name.
    pub fn apply(&self, parts: &mut Parts) -> amzsign_core::Result<()> {
        let map = self.to_header_map()?;
        for name in map.keys() {
            parts.headers.remove(name);
        }
        for (name, value) in map.iter() {
            parts.headers.append(name.clone(), value.clone());
        }

        Ok(())
    }
}
