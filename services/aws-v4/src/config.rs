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

use crate::constants::*;
use crate::{Credential, Signer, SigningRequest, SigningRequestBuilder};
use amzsign_core::{Env, Error};
use http::{Method, Uri};
use log::debug;

/// Config for aws services.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(Debug))]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SESSION_TOKEN`]
    pub session_token: Option<String>,
    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`]
    /// - env value: [`AWS_DEFAULT_REGION`]
    /// - default to `default` while signing
    pub region: Option<String>,
    /// `service` like `s3`, never loaded from env.
    pub service: Option<String>,
}

impl Config {
    /// Load config from env.
    ///
    /// Fields that are already set are kept.
    pub fn from_env(mut self, env: &impl Env) -> Self {
        if self.access_key_id.is_none() {
            self.access_key_id = env.var(AWS_ACCESS_KEY_ID);
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = env.var(AWS_SECRET_ACCESS_KEY);
        }
        if self.session_token.is_none() {
            self.session_token = env.var(AWS_SESSION_TOKEN);
        }
        if self.region.is_none() {
            self.region = env
                .var(AWS_REGION)
                .or_else(|| env.var(AWS_DEFAULT_REGION))
                .filter(|v| !v.is_empty());
        }
        debug!("config loaded from env, region: {:?}", self.region);

        self
    }

    /// Build the credential described by this config.
    pub fn credential(&self) -> amzsign_core::Result<Credential> {
        let (Some(ak), Some(sk)) = (&self.access_key_id, &self.secret_access_key) else {
            return Err(Error::config_invalid(format!(
                "both {AWS_ACCESS_KEY_ID} and {AWS_SECRET_ACCESS_KEY} must be set"
            )));
        };

        let mut cred = Credential::new(ak, sk);
        if let Some(token) = &self.session_token {
            cred = cred.with_session_token(token);
        }
        Ok(cred)
    }

    /// Build a signer from the credential of this config.
    pub fn signer(&self) -> amzsign_core::Result<Signer> {
        Ok(Signer::new(self.credential()?))
    }

    /// Start a request with the configured service and region applied.
    pub fn request(&self, method: Method, uri: Uri) -> SigningRequestBuilder {
        let mut builder = SigningRequest::builder(method, uri);
        if let Some(service) = &self.service {
            builder = builder.service(service);
        }
        if let Some(region) = &self.region {
            builder = builder.region(region);
        }
        builder
    }
}
