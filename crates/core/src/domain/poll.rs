use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const POLL_GENERATION_ERROR_PREFIX: &str = "An error was encountered during poll generation";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageTs(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MessageTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactor {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// The user who triggered the interactive flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactivity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactivity_pointer: Option<String>,
    pub interactor: Interactor,
}

impl Interactivity {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            interactivity_pointer: None,
            interactor: Interactor { id: UserId(user_id.into()), secret: None },
        }
    }
}

/// Inputs of the polling function. Field names match the function's input
/// parameters so the platform payload deserializes directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRequest {
    pub channel_id: ChannelId,
    pub poll_question: String,
    pub option_1: String,
    pub option_2: String,
    pub option_3: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactivity: Option<Interactivity>,
}

impl PollRequest {
    pub fn new(
        channel_id: impl Into<String>,
        poll_question: impl Into<String>,
        options: [&str; 3],
    ) -> Self {
        let [option_1, option_2, option_3] = options;
        Self {
            channel_id: ChannelId(channel_id.into()),
            poll_question: poll_question.into(),
            option_1: option_1.to_owned(),
            option_2: option_2.to_owned(),
            option_3: option_3.to_owned(),
            interactivity: None,
        }
    }

    pub fn with_interactivity(mut self, interactivity: Interactivity) -> Self {
        self.interactivity = Some(interactivity);
        self
    }

    pub fn options(&self) -> [(ReactionMarker, &str); 3] {
        [
            (ReactionMarker::One, self.option_1.as_str()),
            (ReactionMarker::Two, self.option_2.as_str()),
            (ReactionMarker::Three, self.option_3.as_str()),
        ]
    }

    pub fn interactor_id(&self) -> Option<&UserId> {
        self.interactivity.as_ref().map(|interactivity| &interactivity.interactor.id)
    }

    /// Rejects blank required fields. The platform validates these before
    /// invocation; hosts that accept raw payloads call this themselves.
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("channel_id", self.channel_id.0.as_str()),
            ("poll_question", self.poll_question.as_str()),
            ("option_1", self.option_1.as_str()),
            ("option_2", self.option_2.as_str()),
            ("option_3", self.option_3.as_str()),
        ];

        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(DomainError::MissingField((*name).to_owned())),
            None => Ok(()),
        }
    }
}

/// Reactions planted on every poll, in the order they are added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionMarker {
    One,
    Two,
    Three,
}

impl ReactionMarker {
    pub const ALL: [ReactionMarker; 3] = [Self::One, Self::Two, Self::Three];

    pub fn name(self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Two => "two",
            Self::Three => "three",
        }
    }

    pub fn emoji(self) -> String {
        format!(":{}:", self.name())
    }
}

impl fmt::Display for ReactionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub channel: ChannelId,
    pub ts: MessageTs,
}

/// Return value of the polling function.
///
/// The function itself only ever builds `completed: false` through
/// [`FunctionOutcome::pending`]; completing the step belongs to the follow-up
/// interaction handlers. `completed` stays a plain flag so outcomes reported
/// by the platform deserialize unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionOutcome {
    Error { error: String },
    Pending { completed: bool },
}

impl FunctionOutcome {
    pub fn pending() -> Self {
        Self::Pending { completed: false }
    }

    pub fn generation_failed(message: impl fmt::Display) -> Self {
        Self::Error { error: format!("{POLL_GENERATION_ERROR_PREFIX}: `{message}`") }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FunctionOutcome, Interactivity, PollRequest, ReactionMarker};
    use crate::errors::DomainError;

    #[test]
    fn completed_outcome_from_platform_deserializes_as_pending_shape() {
        let outcome: FunctionOutcome =
            serde_json::from_value(json!({ "completed": true })).expect("deserialize");

        assert_eq!(outcome, FunctionOutcome::Pending { completed: true });
        assert!(!outcome.is_error());
        assert_ne!(outcome, FunctionOutcome::pending());
    }

    #[test]
    fn outcome_serializes_to_platform_shapes() {
        let pending = serde_json::to_value(FunctionOutcome::pending()).expect("serialize");
        assert_eq!(pending, json!({ "completed": false }));

        let failed = serde_json::to_value(FunctionOutcome::generation_failed("channel_not_found"))
            .expect("serialize");
        assert_eq!(
            failed,
            json!({ "error": "An error was encountered during poll generation: `channel_not_found`" })
        );
    }

    #[test]
    fn request_deserializes_from_function_inputs() {
        let request: PollRequest = serde_json::from_value(json!({
            "channel_id": "C1",
            "poll_question": "Lunch?",
            "option_1": "Pizza",
            "option_2": "Sushi",
            "option_3": "Salad",
            "interactivity": {
                "interactivity_pointer": "123.abc",
                "interactor": { "id": "U42", "secret": "s3cr3t" }
            }
        }))
        .expect("payload should deserialize");

        assert_eq!(request.channel_id.0, "C1");
        assert_eq!(request.interactor_id().map(|id| id.0.as_str()), Some("U42"));
        assert_eq!(request.options()[2], (ReactionMarker::Three, "Salad"));
    }

    #[test]
    fn interactivity_is_optional() {
        let request: PollRequest = serde_json::from_value(json!({
            "channel_id": "C1",
            "poll_question": "Lunch?",
            "option_1": "Pizza",
            "option_2": "Sushi",
            "option_3": "Salad"
        }))
        .expect("payload should deserialize");

        assert!(request.interactivity.is_none());
        assert!(request.interactor_id().is_none());
    }

    #[test]
    fn validate_names_first_blank_field() {
        let request = PollRequest::new("C1", "  ", ["Pizza", "", "Salad"]);
        assert_eq!(request.validate(), Err(DomainError::MissingField("poll_question".to_owned())));

        let request = PollRequest::new("C1", "Lunch?", ["Pizza", "Sushi", "Salad"])
            .with_interactivity(Interactivity::for_user("U1"));
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn markers_keep_fixed_order() {
        let names: Vec<_> = ReactionMarker::ALL.iter().map(|marker| marker.name()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(ReactionMarker::Two.emoji(), ":two:");
    }
}
