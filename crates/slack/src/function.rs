use std::sync::Arc;

use pollbot_core::{FunctionOutcome, PollRequest, PostedMessage, ReactionMarker};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    api::{SlackApi, UNKNOWN_ERROR_CODE},
    blocks,
    manifest::{FunctionDefinition, Parameter, ParameterSet, ParameterType},
};

pub const FUNCTION_CALLBACK_ID: &str = "polling_function";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to add reaction `{marker}`: {reason}")]
pub struct ReactionFailure {
    pub marker: ReactionMarker,
    pub reason: String,
}

/// What happened to each reaction planted on a posted poll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactionReport {
    pub attempted: Vec<ReactionMarker>,
    pub failures: Vec<ReactionFailure>,
}

impl ReactionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn planted(&self) -> usize {
        self.attempted.len() - self.failures.len()
    }
}

pub struct PollingFunction {
    api: Arc<dyn SlackApi>,
}

impl PollingFunction {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    pub async fn execute(&self, request: &PollRequest) -> FunctionOutcome {
        let correlation_id = Uuid::new_v4().to_string();
        self.execute_with_correlation(request, &correlation_id).await
    }

    /// Posts the poll, then plants the three voting reactions.
    ///
    /// Only a failed post is reported to the caller. Reaction failures are
    /// logged and the step is still left open with `completed: false`.
    pub async fn execute_with_correlation(
        &self,
        request: &PollRequest,
        correlation_id: &str,
    ) -> FunctionOutcome {
        let message = blocks::poll_message(request);

        let posted = match self.api.post_message(&request.channel_id, &message).await {
            Ok(posted) => posted,
            Err(error) => {
                error!(
                    event_name = "function.polling.post_failed",
                    correlation_id,
                    channel_id = %request.channel_id,
                    error = %error,
                    "failed to post poll message"
                );
                return FunctionOutcome::generation_failed(&error);
            }
        };
        info!(
            event_name = "function.polling.posted",
            correlation_id,
            channel_id = %posted.channel,
            message_ts = %posted.ts,
            "poll message posted"
        );

        let report = self.plant_reactions(&posted, correlation_id).await;
        if !report.is_complete() {
            warn!(
                event_name = "function.polling.reactions_incomplete",
                correlation_id,
                channel_id = %posted.channel,
                message_ts = %posted.ts,
                planted = report.planted(),
                failed = report.failures.len(),
                "poll posted without every voting reaction"
            );
        }

        FunctionOutcome::pending()
    }

    pub async fn plant_reactions(
        &self,
        posted: &PostedMessage,
        correlation_id: &str,
    ) -> ReactionReport {
        let mut report = ReactionReport::default();

        for marker in ReactionMarker::ALL {
            report.attempted.push(marker);
            if let Err(failure) = self.add_reaction(posted, marker).await {
                warn!(
                    event_name = "function.polling.reaction_failed",
                    correlation_id,
                    channel_id = %posted.channel,
                    message_ts = %posted.ts,
                    reaction = %marker,
                    error = %failure,
                    "failed to add poll reaction; continuing"
                );
                report.failures.push(failure);
            }
        }

        report
    }

    async fn add_reaction(
        &self,
        posted: &PostedMessage,
        marker: ReactionMarker,
    ) -> Result<(), ReactionFailure> {
        let ack = self
            .api
            .add_reaction(&posted.channel, &posted.ts, marker.name())
            .await
            .map_err(|error| ReactionFailure { marker, reason: error.to_string() })?;

        if ack.ok {
            Ok(())
        } else {
            Err(ReactionFailure {
                marker,
                reason: ack.error.unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_owned()),
            })
        }
    }
}

pub fn definition() -> FunctionDefinition {
    FunctionDefinition {
        callback_id: FUNCTION_CALLBACK_ID,
        title: "Generate poll",
        description: "Generate poll",
        input_parameters: ParameterSet::default()
            .property("interactivity", Parameter::new(ParameterType::Interactivity))
            .property(
                "channel_id",
                Parameter::new(ParameterType::ChannelId).description("Channel ID"),
            )
            .property(
                "poll_question",
                Parameter::new(ParameterType::String).description("Question to ask"),
            )
            .property("option_1", Parameter::new(ParameterType::String).description("Option 1"))
            .property("option_2", Parameter::new(ParameterType::String).description("Option 2"))
            .property("option_3", Parameter::new(ParameterType::String).description("Option 3"))
            .required(["channel_id", "poll_question", "option_1", "option_2", "option_3"]),
        output_parameters: ParameterSet::default(),
    }
}
