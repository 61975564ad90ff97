use reqwest::StatusCode;
use serde_derive::Deserialize;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::credentials::Credential;

/// Profile payload returned by the identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile endpoint rejected the credential: {status}")]
    AuthenticationFailed { status: StatusCode },
    #[error("profile endpoint is unreachable: {source}")]
    NetworkUnavailable { source: reqwest::Error },
    #[error("profile response is missing required fields: {source}")]
    MalformedResponse { source: reqwest::Error },
}

/// One-shot resolver for the identity endpoint. Performs exactly one round
/// trip per call; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct ProfileResolver {
    http: reqwest::Client,
    profile_url: String,
}

impl ProfileResolver {
    pub fn new(profile_url: String) -> Self {
        ProfileResolver {
            http: reqwest::Client::new(),
            profile_url,
        }
    }

    /// Exchanges the bearer token for the caller's profile.
    ///
    /// The token is transmitted as-is in the `Authorization` header; format
    /// validation happens before this call.
    #[instrument(skip_all, fields(url = %self.profile_url))]
    pub async fn resolve(&self, credential: &Credential) -> Result<UserProfile, ProfileError> {
        info!("resolving user profile");
        let response = self
            .http
            .get(&self.profile_url)
            .header(reqwest::header::AUTHORIZATION, credential.token.as_str())
            .send()
            .await
            .map_err(|e| {
                error!(error=%e, "profile request failed");
                ProfileError::NetworkUnavailable { source: e }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status=%status, "profile request rejected");
            return Err(ProfileError::AuthenticationFailed { status });
        }

        let profile = response.json::<UserProfile>().await.map_err(|e| {
            error!(error=%e, "profile response did not parse");
            ProfileError::MalformedResponse { source: e }
        })?;

        info!(user_id = %profile.user_id, "profile resolved");
        Ok(profile)
    }
}
