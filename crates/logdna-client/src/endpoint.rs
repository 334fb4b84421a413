// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::ClientError;
use reqwest::Url;
use std::fmt::{self, Debug};

/// Unix nanoseconds of the zero instant (0001-01-01T00:00:00Z) after
/// int64 wraparound. The ingest API has always been called with this `now`.
pub const ZERO_TIME_UNIX_NANOS: i64 = -6_795_364_578_871_345_152;

/// Fully-qualified ingest URL: credentials in the user-info, `hostname`
/// and `now` in the query.
#[derive(Clone, PartialEq, Eq)]
pub struct IngestEndpoint {
    url: Url,
    request_url: Url,
}

impl IngestEndpoint {
    /// Builds the endpoint from a base URL. Fails only if `base_url` does
    /// not parse or cannot carry credentials.
    pub fn new(base_url: &str, api_key: &str, hostname: &str) -> Result<Self, ClientError> {
        let no_credentials = || {
            ClientError::InvalidConfig(format!("ingest url '{base_url}' cannot carry credentials"))
        };

        let mut request_url = Url::parse(base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid ingest url '{base_url}': {e}"))
        })?;
        request_url
            .set_username("")
            .and_then(|()| request_url.set_password(None))
            .map_err(|()| no_credentials())?;
        request_url.set_query(None);
        request_url
            .query_pairs_mut()
            .append_pair("hostname", hostname)
            .append_pair("now", &ZERO_TIME_UNIX_NANOS.to_string());

        let mut url = request_url.clone();
        url.set_username(api_key).map_err(|()| no_credentials())?;

        Ok(Self { url, request_url })
    }

    /// The URL including the API key as user-info.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        self.url.username()
    }

    /// The URL without credentials, suitable for sending with a separate
    /// `Authorization` header or for logging.
    #[must_use]
    pub fn request_url(&self) -> &Url {
        &self.request_url
    }
}

impl Debug for IngestEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestEndpoint")
            .field("url", &self.request_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}
