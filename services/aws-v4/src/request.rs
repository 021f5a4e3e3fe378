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

use crate::constants::{DEFAULT_REGION, EMPTY_BODY_SHA256, UNSIGNED_PAYLOAD};
use amzsign_core::hash::hex_sha256;
use amzsign_core::Error;
use http::header::{HeaderName, HeaderValue};
use http::request::Parts;
use http::{Method, Uri};

/// How the uri path is turned into the canonical uri.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathEncoding {
    /// Percent decode the path, then encode every byte outside the unreserved
    /// set (keeping `/`) exactly once.
    ///
    /// An encoded slash is decoded too: the S3 key `a%2Fb` is signed as
    /// `/a/b`. Use [`PathEncoding::Raw`] for keys that contain a literal `%2F`.
    #[default]
    Encoded,
    /// Use the path as it appears in the uri.
    ///
    /// Only useful to reproduce signatures of signers that never re-encode
    /// the path.
    Raw,
}

/// The payload hash that goes into `X-Amz-Content-Sha256` and the canonical
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Hex encoded SHA256 of the body.
    Hash(String),
    /// The body is not signed: `UNSIGNED-PAYLOAD`.
    Unsigned,
}

impl Payload {
    /// Build a payload from the raw body.
    pub fn from_body(body: &[u8]) -> Self {
        Payload::Hash(hash_body(body))
    }

    /// The value used in the canonical request.
    pub fn as_str(&self) -> &str {
        match self {
            Payload::Hash(v) => v,
            Payload::Unsigned => UNSIGNED_PAYLOAD,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Hash(EMPTY_BODY_SHA256.to_string())
    }
}

/// Hex encoded SHA256 of the given body.
///
/// `hash_body(b"")` is [`EMPTY_BODY_SHA256`].
pub fn hash_body(body: &[u8]) -> String {
    hex_sha256(body)
}

/// Input of a signing call.
///
/// Built by [`SigningRequest::builder`] and consumed by
/// [`Signer::sign`](crate::Signer::sign).
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) service: String,
    pub(crate) region: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) payload: Payload,
    pub(crate) path_encoding: PathEncoding,
}

impl SigningRequest {
    /// Start building a request for the given method and uri.
    pub fn builder(method: Method, uri: Uri) -> SigningRequestBuilder {
        SigningRequestBuilder {
            method,
            uri,
            service: None,
            region: DEFAULT_REGION.to_string(),
            headers: Vec::new(),
            payload: Payload::default(),
            path_encoding: PathEncoding::default(),
        }
    }

    /// Start building a request from http::request::Parts.
    ///
    /// Method, uri and headers are copied; the parts are left untouched.
    pub fn from_parts(parts: &Parts) -> amzsign_core::Result<SigningRequestBuilder> {
        let mut builder = Self::builder(parts.method.clone(), parts.uri.clone());
        for (name, value) in parts.headers.iter() {
            builder = builder.header(name.as_str(), value.to_str()?);
        }

        Ok(builder)
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target uri.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Service name, like `s3`.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Region name, like `us-east-1`.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Caller supplied headers in their original order and casing.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Payload hash to sign.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// Builder for [`SigningRequest`].
#[derive(Debug, Clone)]
pub struct SigningRequestBuilder {
    method: Method,
    uri: Uri,
    service: Option<String>,
    region: String,
    headers: Vec<(String, String)>,
    payload: Payload,
    path_encoding: PathEncoding,
}

impl SigningRequestBuilder {
    /// Specify service like "s3".
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Specify region like "us-east-1".
    ///
    /// Default to `default`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Add a header.
    ///
    /// Names are matched case-insensitively while signing; repeated names are
    /// signed as one comma separated value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add all headers from an iterator.
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Use a precomputed hex encoded SHA256 of the body.
    pub fn payload_hash(mut self, hash: impl Into<String>) -> Self {
        self.payload = Payload::Hash(hash.into());
        self
    }

    /// Hash the given body and sign it.
    pub fn body(mut self, body: &[u8]) -> Self {
        self.payload = Payload::from_body(body);
        self
    }

    /// Don't sign the body, use `UNSIGNED-PAYLOAD` instead.
    pub fn unsigned_payload(mut self) -> Self {
        self.payload = Payload::Unsigned;
        self
    }

    /// Specify how the path is canonicalized.
    pub fn path_encoding(mut self, encoding: PathEncoding) -> Self {
        self.path_encoding = encoding;
        self
    }

    /// Validate input and build the request.
    pub fn build(self) -> amzsign_core::Result<SigningRequest> {
        let service = match self.service {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::request_invalid("service must be set")),
        };
        if self.region.is_empty() {
            return Err(Error::request_invalid("region must not be empty"));
        }
        match self.uri.host() {
            Some(host) if !host.is_empty() => {}
            _ => {
                return Err(Error::request_invalid(format!(
                    "uri without host is invalid for signing: {}",
                    self.uri
                )))
            }
        }
        if let Payload::Hash(hash) = &self.payload {
            if hash.is_empty() || !hash.bytes().all(|b| b.is_ascii_graphic()) {
                return Err(Error::request_invalid(format!(
                    "payload hash is not a valid header value: {hash:?}"
                )));
            }
        }

        // Reject anything that can't be sent as an http header later.
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())?;
            HeaderValue::from_str(value)?;
        }

        Ok(SigningRequest {
            method: self.method,
            uri: self.uri,
            service,
            region: self.region,
            headers: self.headers,
            payload: self.payload,
            path_encoding: self.path_encoding,
        })
    }
}

/// Get the value of a header by case-insensitive name.
pub(crate) fn header_get<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Set a header, replacing every case variant of the same name.
///
/// The first existing entry keeps its position and casing.
pub(crate) fn header_set(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter().position(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(idx) => {
            headers[idx].1 = value;
            let mut seen = 0;
            headers.retain(|(k, _)| {
                if !k.eq_ignore_ascii_case(name) {
                    return true;
                }
                seen += 1;
                seen == 1
            });
        }
        None => headers.push((name.to_string(), value)),
    }
}

/// Remove every case variant of a header.
pub(crate) fn header_remove(headers: &mut Vec<(String, String)>, name: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
}
