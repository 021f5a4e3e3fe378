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

use crate::constants::{AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET};
use crate::request::PathEncoding;
use amzsign_core::hash::hex_sha256;
use amzsign_core::Error;
use http::Method;
use percent_encoding::{percent_decode_str, percent_encode};
use std::collections::BTreeMap;
use std::fmt;

/// The canonical form of a request.
///
/// - [Create a canonical request](https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html#create-canonical-request)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Uppercase HTTP method.
    pub method: String,
    /// Canonical uri path.
    pub uri: String,
    /// Canonical query string, empty if the request has no query.
    pub query: String,
    /// Canonical headers block, every line ends with `\n`.
    pub headers: String,
    /// Lowercase header names joined with `;`.
    pub signed_headers: String,
    /// Payload hash.
    pub payload_hash: String,
}

impl CanonicalRequest {
    /// Build the canonical request from already normalized parts.
    pub fn build(
        method: &Method,
        path: &str,
        query: Option<&str>,
        headers: &[(String, String)],
        path_encoding: PathEncoding,
        payload_hash: &str,
    ) -> amzsign_core::Result<Self> {
        let (headers, signed_headers) = canonical_headers(headers);

        Ok(CanonicalRequest {
            method: method.as_str().to_ascii_uppercase(),
            uri: canonical_uri(path, path_encoding),
            query: canonical_query_string(query.unwrap_or_default())?,
            headers,
            signed_headers,
            payload_hash: payload_hash.to_string(),
        })
    }

    /// Hex encoded SHA256 of the canonical request.
    pub fn hash(&self) -> String {
        hex_sha256(self.to_string().as_bytes())
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.uri)?;
        writeln!(f, "{}", self.query)?;
        // Every header line already ends with '\n'.
        writeln!(f, "{}", self.headers)?;
        writeln!(f, "{}", self.signed_headers)?;
        write!(f, "{}", self.payload_hash)
    }
}

/// Percent encode input with the AWS unreserved set.
///
/// Every byte except `A-Z a-z 0-9 - _ . ~` becomes `%XX`.
pub fn uri_encode(input: &[u8]) -> String {
    percent_encode(input, &AWS_QUERY_ENCODE_SET).to_string()
}

/// Build the canonical uri from the request path.
pub fn canonical_uri(path: &str, encoding: PathEncoding) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    match encoding {
        PathEncoding::Raw => path.to_string(),
        PathEncoding::Encoded => {
            let decoded: Vec<u8> = percent_decode_str(path).collect();
            percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string()
        }
    }
}

/// Build the canonical query string from the raw query (without `?`).
///
/// Pairs are sorted by encoded name, keeping the input order of pairs that
/// share a name.
pub fn canonical_query_string(query: &str) -> amzsign_core::Result<String> {
    if query.is_empty() {
        return Ok(String::new());
    }

    let mut pairs = Vec::new();
    for pair in query.split('&').filter(|v| !v.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name.is_empty() {
            return Err(Error::request_invalid(format!(
                "query pair without name is invalid: {pair}"
            )));
        }

        let name: Vec<u8> = percent_decode_str(name).collect();
        let value: Vec<u8> = percent_decode_str(value).collect();
        pairs.push((uri_encode(&name), uri_encode(&value)));
    }

    // Stable sort by param name only.
    pairs.sort_by(|(l, _), (r, _)| l.as_bytes().cmp(r.as_bytes()));

    Ok(pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Build the canonical headers block and the signed headers list.
///
/// Names are lowercased and sorted, values are trimmed. Names that only
/// differ in case are merged into one line with comma separated values.
pub fn canonical_headers(headers: &[(String, String)]) -> (String, String) {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = value.trim();
        merged
            .entry(name.to_ascii_lowercase())
            .and_modify(|v| {
                v.push(',');
                v.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    let mut block = String::with_capacity(256);
    for (name, value) in &merged {
        block.push_str(name);
        block.push(':');
        block.push_str(value);
        block.push('\n');
    }
    let signed = merged.keys().map(String::as_str).collect::<Vec<_>>().join(";");

    (block, signed)
}
