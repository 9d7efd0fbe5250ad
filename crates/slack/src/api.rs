use std::time::Duration;

use async_trait::async_trait;
use pollbot_core::{config::SlackConfig, ChannelId, MessageTs, PostedMessage};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::blocks::{Block, MessageTemplate};

/// Error code used when Slack answers `ok: false` without naming the error.
pub const UNKNOWN_ERROR_CODE: &str = "unknown_error";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SlackApiError {
    /// `ok: false` from the Web API. Displays as the bare error code, e.g.
    /// `channel_not_found`.
    #[error("{0}")]
    Platform(String),
    #[error("ratelimited")]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack response could not be decoded: {0}")]
    Decode(String),
}

/// Bare acknowledgement returned by write-only Web API methods.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiAck {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiAck {
    pub fn success() -> Self {
        Self { ok: true, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { ok: false, error: Some(error.into()) }
    }
}

/// Workspace and bot user the token belongs to, as reported by `auth.test`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthIdentity {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub user_id: String,
}

/// The Web API methods pollbot calls.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `auth.test`. Confirms the bot token is accepted by the workspace.
    async fn auth_test(&self) -> Result<AuthIdentity, SlackApiError>;

    /// `chat.postMessage`. An `ok: false` answer is returned as
    /// [`SlackApiError::Platform`].
    async fn post_message(
        &self,
        channel: &ChannelId,
        message: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError>;

    /// `reactions.add`. The acknowledgement is passed through untouched so
    /// callers decide what a non-`ok` answer means.
    async fn add_reaction(
        &self,
        channel: &ChannelId,
        timestamp: &MessageTs,
        name: &str,
    ) -> Result<ApiAck, SlackApiError>;
}

#[derive(Serialize)]
struct PostMessageBody<'a> {
    channel: &'a str,
    text: &'a str,
    blocks: &'a [Block],
}

#[derive(Serialize)]
struct AddReactionBody<'a> {
    channel: &'a str,
    timestamp: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct EmptyBody {}

#[derive(Deserialize)]
struct AuthTestResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    identity: AuthIdentity,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    message: Option<PostedMessageBody>,
}

#[derive(Deserialize)]
struct PostedMessageBody {
    #[serde(default)]
    ts: Option<String>,
}

/// Web API client over HTTPS with bot token bearer auth.
pub struct WebApiClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl WebApiClient {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url, bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, SlackApiError> {
        Self::new(
            config.api_base_url.clone(),
            config.bot_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, SlackApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.base_url);
        debug!(event_name = "egress.slack.request", method, "calling slack web api");

        let response = self
            .http
            .post(url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| SlackApiError::Transport(error.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            return Err(SlackApiError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            return Err(SlackApiError::Transport(format!("{method} returned HTTP {status}")));
        }

        response.json::<R>().await.map_err(|error| SlackApiError::Decode(error.to_string()))
    }
}

fn platform_error(error: Option<String>) -> SlackApiError {
    SlackApiError::Platform(error.unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_owned()))
}

#[async_trait]
impl SlackApi for WebApiClient {
    async fn auth_test(&self) -> Result<AuthIdentity, SlackApiError> {
        let response: AuthTestResponse = self.call("auth.test", &EmptyBody {}).await?;
        if !response.ok {
            return Err(platform_error(response.error));
        }
        Ok(response.identity)
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        message: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        let body = PostMessageBody {
            channel: &channel.0,
            text: &message.fallback_text,
            blocks: &message.blocks,
        };
        let response: PostMessageResponse = self.call("chat.postMessage", &body).await?;

        if !response.ok {
            return Err(platform_error(response.error));
        }

        let ts = response
            .ts
            .or_else(|| response.message.and_then(|message| message.ts))
            .ok_or_else(|| SlackApiError::Decode("no message timestamp in response".to_owned()))?;
        let channel = response.channel.map(ChannelId).unwrap_or_else(|| channel.clone());

        Ok(PostedMessage { channel, ts: MessageTs(ts) })
    }

    async fn add_reaction(
        &self,
        channel: &ChannelId,
        timestamp: &MessageTs,
        name: &str,
    ) -> Result<ApiAck, SlackApiError> {
        let body = AddReactionBody { channel: &channel.0, timestamp: &timestamp.0, name };
        self.call("reactions.add", &body).await
    }
}
