//! Credential and endpoint construction
//!
//! Builds the authentication headers and base URL for a given API resource
//! path. Tokens come from configuration or the environment; nothing is ever
//! embedded in source.

use crate::config::{API_TOKEN_ENV, ApiConfig};
use crate::error::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

/// Header the API expects the token in
const API_TOKEN_HEADER: &str = "x-api-token";

/// Resolved credentials plus the endpoint root they apply to
#[derive(Clone, Debug)]
pub struct Credentials {
    token: String,
    api_root: String,
    directory_id: Option<String>,
}

impl Credentials {
    /// Resolve credentials from configuration
    ///
    /// The token is taken from `config.api_token`, falling back to the
    /// `QUALTRICS_API_TOKEN` environment variable. Fails with
    /// [`Error::Config`] when neither is set. The endpoint root is derived
    /// from the data center unless `config.base_url` overrides it.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let token = match &config.api_token {
            Some(token) if !token.is_empty() => token.clone(),
            _ => std::env::var(API_TOKEN_ENV).map_err(|_| Error::Config {
                message: format!(
                    "no API token configured and {API_TOKEN_ENV} is not set in the environment"
                ),
                key: Some("api.api_token".into()),
            })?,
        };
        let api_root = match &config.base_url {
            Some(root) => root.trim_end_matches('/').to_string(),
            None => format!("https://{}.qualtrics.com/API/v3", config.data_center),
        };
        Ok(Self {
            token,
            api_root,
            directory_id: config.directory_id.clone(),
        })
    }

    /// Build the request headers for an API call
    ///
    /// `json_body` adds the JSON content type for endpoints that take a
    /// request body.
    pub fn headers(&self, json_body: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&self.token).map_err(|_| Error::Config {
            message: "API token contains characters not valid in a header".into(),
            key: Some("api.api_token".into()),
        })?;
        headers.insert(HeaderName::from_static(API_TOKEN_HEADER), token);
        if json_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// Build the base URL for a resource path under the v3 API
    ///
    /// When `directory_scoped` is set the path is prefixed with
    /// `directories/{directory_id}/`; that requires a directory id in the
    /// configuration and fails with [`Error::Config`] otherwise.
    pub fn base_url(&self, path: &str, directory_scoped: bool) -> Result<String> {
        let path = path.trim_start_matches('/');
        if directory_scoped {
            let directory_id = self.directory_id.as_deref().ok_or_else(|| Error::Config {
                message: "directory-scoped endpoints require a directory id; \
                          set api.directory_id"
                    .into(),
                key: Some("api.directory_id".into()),
            })?;
            Ok(format!(
                "{}/directories/{}/{}",
                self.api_root, directory_id, path
            ))
        } else {
            Ok(format!("{}/{}", self.api_root, path))
        }
    }
}
