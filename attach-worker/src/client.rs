use std::time::Duration;

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ApiError;

/// Marshals authenticated calls to the platform API.
///
/// The client is cheap to clone; clones share the underlying connection
/// pool and issue requests statelessly, so it can be handed to any number
/// of concurrent tasks.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    user: String,
    password: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        base_uri: &str,
        user: &str,
        password: &str,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_uri)?;
        // Url::join drops the last path segment of a base that has no
        // trailing slash.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("failed to construct reqwest client for api client");

        Ok(Self {
            base,
            user: user.to_owned(),
            password: password.to_owned(),
            client,
        })
    }

    /// GET `path` with the given query parameters and deserialize the
    /// JSON body. A non-200 status and an empty body are both errors.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("making call to {} with query {:?}", url, query);

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|source| ApiError::Request {
            url: url.to_string(),
            source,
        })?;
        if body.is_empty() {
            return Err(ApiError::EmptyBody {
                url: url.to_string(),
            });
        }

        debug!("completed request to {}", url);
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// POST an empty JSON object to `path`. The response is handed back
    /// unexamined; what counts as a failed status is the caller's policy.
    pub async fn post_empty(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path)?;
        debug!("posting to {}", url);

        self.client
            .post(url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }
}
