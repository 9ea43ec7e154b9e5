//! HTTP group directory.
//!
//! REST client for the user/group service. Successful calls (200 or 201)
//! decode the documented body; anything else is mapped to
//! [`DirectoryError::Rejected`] carrying the service's `error` text.

use async_trait::async_trait;
use konnect_core::{
    CreatedGroup, CreatedUser, DirectoryError, GroupDirectory, GroupMembers, GroupSummary,
    JoinedGroup,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGroupRequest<'a> {
    group_name: &'a str,
    creator_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinGroupRequest<'a> {
    user_name: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`GroupDirectory`] backed by the REST service.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    base_url: String,
    http: Client,
}

impl HttpDirectory {
    /// Client for the service at `base_url`, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), http: Client::new() }
    }

    /// Service base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DirectoryError::Network(format!("invalid url '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| {
                DirectoryError::Network(format!("url '{}' cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl GroupDirectory for HttpDirectory {
    async fn create_user(&self, name: &str) -> Result<CreatedUser, DirectoryError> {
        let url = self.endpoint(&["users"])?;
        tracing::debug!(%url, "create user");
        let response =
            self.http.post(url).json(&CreateUserRequest { name }).send().await.map_err(network)?;
        parse_response(response).await
    }

    async fn create_group(
        &self,
        group_name: &str,
        creator_name: &str,
    ) -> Result<CreatedGroup, DirectoryError> {
        let url = self.endpoint(&["groups"])?;
        tracing::debug!(%url, "create group");
        let response = self
            .http
            .post(url)
            .json(&CreateGroupRequest { group_name, creator_name })
            .send()
            .await
            .map_err(network)?;
        parse_response(response).await
    }

    async fn join_group(
        &self,
        group_id: &str,
        user_name: &str,
    ) -> Result<JoinedGroup, DirectoryError> {
        let url = self.endpoint(&["groups", group_id, "join"])?;
        tracing::debug!(%url, "join group");
        let response = self
            .http
            .post(url)
            .json(&JoinGroupRequest { user_name })
            .send()
            .await
            .map_err(network)?;
        parse_response(response).await
    }

    async fn list_groups(&self) -> Result<Vec<GroupSummary>, DirectoryError> {
        let url = self.endpoint(&["groups"])?;
        let response = self.http.get(url).send().await.map_err(network)?;
        parse_response(response).await
    }

    async fn group_members(&self, group_id: &str) -> Result<GroupMembers, DirectoryError> {
        let url = self.endpoint(&["groups", group_id, "members"])?;
        tracing::debug!(%url, "group members");
        let response = self.http.get(url).send().await.map_err(network)?;
        parse_response(response).await
    }
}

fn network(err: reqwest::Error) -> DirectoryError {
    DirectoryError::Network(err.to_string())
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, DirectoryError> {
    let status = response.status();
    let body = response.text().await.map_err(network)?;

    match status {
        StatusCode::OK | StatusCode::CREATED => {
            serde_json::from_str(&body).map_err(|e| DirectoryError::Decode(e.to_string()))
        },
        _ => Err(rejection(status, &body)),
    }
}

/// Error for a non-success response. Prefers the body's `error` field, then
/// the raw body, then the status text.
fn rejection(status: StatusCode, body: &str) -> DirectoryError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    tracing::debug!(status = status.as_u16(), %message, "directory rejected request");
    DirectoryError::Rejected { status: status.as_u16(), message }
}
