use async_trait::async_trait;
use pollbot_core::{ChannelId, MessageTs, PostedMessage};
use pollbot_slack::{
    api::{ApiAck, AuthIdentity, SlackApi, SlackApiError},
    blocks::MessageTemplate,
};
use tokio::sync::Mutex;

/// In-memory Slack stand-in that counts calls and can be told to fail.
#[derive(Default)]
pub struct StubSlackApi {
    pub fail_auth_with: Option<String>,
    pub fail_post_with: Option<String>,
    pub reactions: Mutex<Vec<String>>,
    pub posts: Mutex<usize>,
}

#[async_trait]
impl SlackApi for StubSlackApi {
    async fn auth_test(&self) -> Result<AuthIdentity, SlackApiError> {
        match &self.fail_auth_with {
            Some(code) => Err(SlackApiError::Platform(code.clone())),
            None => Ok(AuthIdentity { team: "Acme".to_owned(), user_id: "U0BOT".to_owned() }),
        }
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        _message: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        *self.posts.lock().await += 1;
        match &self.fail_post_with {
            Some(code) => Err(SlackApiError::Platform(code.clone())),
            None => Ok(PostedMessage {
                channel: channel.clone(),
                ts: MessageTs("1700000000.000100".to_owned()),
            }),
        }
    }

    async fn add_reaction(
        &self,
        _channel: &ChannelId,
        _timestamp: &MessageTs,
        name: &str,
    ) -> Result<ApiAck, SlackApiError> {
        self.reactions.lock().await.push(name.to_owned());
        Ok(ApiAck::success())
    }
}
