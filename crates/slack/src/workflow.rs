use std::collections::BTreeMap;

use pollbot_core::{ChannelId, FunctionOutcome, Interactivity, PollRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    function::{PollingFunction, FUNCTION_CALLBACK_ID},
    manifest::{Parameter, ParameterSet, ParameterType, WorkflowDefinition, WorkflowStep},
};

pub const WORKFLOW_CALLBACK_ID: &str = "polling_workflow";
pub const OPEN_FORM_FUNCTION_ID: &str = "slack#/functions/open_form";
pub const FORM_TITLE: &str = "Start a poll";
pub const FORM_SUBMIT_LABEL: &str = "Start poll";

pub const FIELD_CHANNEL: &str = "channel";
pub const FIELD_QUESTION: &str = "poll_question";
pub const FIELD_OPTION_1: &str = "option_1";
pub const FIELD_OPTION_2: &str = "option_2";
pub const FIELD_OPTION_3: &str = "option_3";

pub const REQUIRED_FIELDS: [&str; 5] =
    [FIELD_CHANNEL, FIELD_QUESTION, FIELD_OPTION_1, FIELD_OPTION_2, FIELD_OPTION_3];

/// Inputs the workflow trigger provides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactivity: Option<Interactivity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormElement {
    pub name: &'static str,
    pub title: &'static str,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub long: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FormElement {
    fn new(name: &'static str, title: &'static str, kind: ParameterType) -> Self {
        Self { name, title, kind, long: false, default: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormFields {
    pub elements: Vec<FormElement>,
    pub required: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub title: &'static str,
    pub submit_label: &'static str,
    pub fields: FormFields,
}

/// Values the user entered, keyed by form field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl FormSubmission {
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str).filter(|value| !value.trim().is_empty())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("form field `{0}` is required")]
    MissingField(&'static str),
}

impl FormError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(name) => name,
        }
    }
}

fn form_fields(default_channel: Option<&ChannelId>) -> FormFields {
    let mut channel =
        FormElement::new(FIELD_CHANNEL, "Channel to send poll to", ParameterType::ChannelId);
    channel.default = default_channel.map(|channel| channel.0.clone());

    let mut question = FormElement::new(FIELD_QUESTION, "Question to poll", ParameterType::String);
    question.long = true;

    FormFields {
        elements: vec![
            channel,
            question,
            FormElement::new(FIELD_OPTION_1, "Option 1", ParameterType::String),
            FormElement::new(FIELD_OPTION_2, "Option 2", ParameterType::String),
            FormElement::new(FIELD_OPTION_3, "Option 3", ParameterType::String),
        ],
        required: REQUIRED_FIELDS.to_vec(),
    }
}

/// First step: the form, pre-filled with the trigger's channel.
pub fn open_form(inputs: &WorkflowInputs) -> FormView {
    FormView {
        title: FORM_TITLE,
        submit_label: FORM_SUBMIT_LABEL,
        fields: form_fields(inputs.channel.as_ref()),
    }
}

/// Maps a submitted form onto the polling function's inputs. A blank channel
/// falls back to the form's default.
pub fn collect(
    inputs: &WorkflowInputs,
    submission: &FormSubmission,
) -> Result<PollRequest, FormError> {
    let channel_id = match submission.value(FIELD_CHANNEL) {
        Some(channel) => ChannelId(channel.to_owned()),
        None => inputs.channel.clone().ok_or(FormError::MissingField(FIELD_CHANNEL))?,
    };
    let field = |name: &'static str| {
        submission.value(name).map(str::to_owned).ok_or(FormError::MissingField(name))
    };

    Ok(PollRequest {
        channel_id,
        poll_question: field(FIELD_QUESTION)?,
        option_1: field(FIELD_OPTION_1)?,
        option_2: field(FIELD_OPTION_2)?,
        option_3: field(FIELD_OPTION_3)?,
        interactivity: inputs.interactivity.clone(),
    })
}

pub struct PollingWorkflow {
    function: PollingFunction,
}

impl PollingWorkflow {
    pub fn new(function: PollingFunction) -> Self {
        Self { function }
    }

    pub fn form(&self, inputs: &WorkflowInputs) -> FormView {
        open_form(inputs)
    }

    pub async fn submit(
        &self,
        inputs: &WorkflowInputs,
        submission: &FormSubmission,
    ) -> Result<FunctionOutcome, FormError> {
        let correlation_id = Uuid::new_v4().to_string();
        self.submit_with_correlation(inputs, submission, &correlation_id).await
    }

    /// Second step: hands the submitted form to the polling function.
    pub async fn submit_with_correlation(
        &self,
        inputs: &WorkflowInputs,
        submission: &FormSubmission,
        correlation_id: &str,
    ) -> Result<FunctionOutcome, FormError> {
        let request = match collect(inputs, submission) {
            Ok(request) => request,
            Err(error) => {
                warn!(
                    event_name = "workflow.polling.form_rejected",
                    correlation_id = %correlation_id,
                    error = %error,
                    "poll form submission rejected"
                );
                return Err(error);
            }
        };

        info!(
            event_name = "workflow.polling.form_submitted",
            correlation_id = %correlation_id,
            channel_id = %request.channel_id,
            "poll form submitted; invoking polling function"
        );
        Ok(self.function.execute_with_correlation(&request, correlation_id).await)
    }
}

pub fn definition() -> WorkflowDefinition {
    let form = FormView {
        title: FORM_TITLE,
        submit_label: FORM_SUBMIT_LABEL,
        fields: form_fields(Some(&ChannelId("{{inputs.channel}}".to_owned()))),
    };

    WorkflowDefinition {
        callback_id: WORKFLOW_CALLBACK_ID,
        title: "Start a poll",
        description: "Start a poll in a selected channel",
        input_parameters: ParameterSet::default()
            .property("interactivity", Parameter::new(ParameterType::Interactivity))
            .property("channel", Parameter::new(ParameterType::ChannelId)),
        steps: vec![
            WorkflowStep {
                id: "0".to_owned(),
                function_id: OPEN_FORM_FUNCTION_ID.to_owned(),
                inputs: json!({
                    "title": form.title,
                    "submit_label": form.submit_label,
                    "interactivity": "{{inputs.interactivity}}",
                    "fields": form.fields,
                }),
            },
            WorkflowStep {
                id: "1".to_owned(),
                function_id: format!("#/functions/{FUNCTION_CALLBACK_ID}"),
                inputs: json!({
                    "interactivity": "{{steps.0.interactivity}}",
                    "channel_id": "{{steps.0.fields.channel}}",
                    "poll_question": "{{steps.0.fields.poll_question}}",
                    "option_1": "{{steps.0.fields.option_1}}",
                    "option_2": "{{steps.0.fields.option_2}}",
                    "option_3": "{{steps.0.fields.option_3}}",
                }),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pollbot_core::{ChannelId, FunctionOutcome, Interactivity};
    use serde_json::json;

    use super::{
        collect, definition, open_form, FormError, FormSubmission, PollingWorkflow, WorkflowInputs,
    };
    use crate::function::{tests::RecordingSlackApi, PollingFunction};
    use crate::manifest::ParameterType;

    fn full_submission() -> FormSubmission {
        FormSubmission::default()
            .with("channel", "C9")
            .with("poll_question", "Lunch?")
            .with("option_1", "Pizza")
            .with("option_2", "Sushi")
            .with("option_3", "Salad")
    }

    #[test]
    fn form_is_seeded_with_default_channel() {
        let inputs =
            WorkflowInputs { channel: Some(ChannelId("C1".to_owned())), interactivity: None };
        let form = open_form(&inputs);

        assert_eq!(form.title, "Start a poll");
        assert_eq!(form.submit_label, "Start poll");
        assert_eq!(form.fields.elements[0].default.as_deref(), Some("C1"));
        assert!(form.fields.elements[1].long);
        assert_eq!(form.fields.required.len(), 5);
    }

    #[test]
    fn option_fields_are_free_text() {
        let form = open_form(&WorkflowInputs::default());
        let option_types: Vec<ParameterType> = form.fields.elements[2..]
            .iter()
            .map(|element| element.kind)
            .collect();
        assert_eq!(option_types, vec![ParameterType::String; 3]);
    }

    #[test]
    fn collect_maps_channel_and_carries_interactivity() {
        let inputs = WorkflowInputs {
            interactivity: Some(Interactivity::for_user("U1")),
            channel: Some(ChannelId("C1".to_owned())),
        };

        let request = collect(&inputs, &full_submission()).expect("submission should map");

        assert_eq!(request.channel_id, ChannelId("C9".to_owned()));
        assert_eq!(request.poll_question, "Lunch?");
        assert_eq!(request.option_3, "Salad");
        assert_eq!(request.interactor_id().map(|id| id.0.as_str()), Some("U1"));
    }

    #[test]
    fn blank_channel_falls_back_to_default() {
        let inputs =
            WorkflowInputs { channel: Some(ChannelId("C1".to_owned())), interactivity: None };
        let submission = full_submission().with("channel", " ");

        let request = collect(&inputs, &submission).expect("default channel should apply");
        assert_eq!(request.channel_id, ChannelId("C1".to_owned()));
    }

    #[test]
    fn missing_fields_are_named() {
        let inputs = WorkflowInputs::default();

        let no_channel = FormSubmission::default().with("poll_question", "Lunch?");
        assert_eq!(collect(&inputs, &no_channel), Err(FormError::MissingField("channel")));

        let no_option = full_submission().with("option_2", "");
        assert_eq!(collect(&inputs, &no_option), Err(FormError::MissingField("option_2")));
    }

    #[tokio::test]
    async fn submit_invokes_polling_function() {
        let api = Arc::new(RecordingSlackApi::default());
        let workflow = PollingWorkflow::new(PollingFunction::new(api.clone()));

        let outcome = workflow
            .submit(&WorkflowInputs::default(), &full_submission())
            .await
            .expect("submission should be accepted");

        assert_eq!(outcome, FunctionOutcome::pending());
        let posts = api.posts().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "C9");
        assert_eq!(api.reactions().await.len(), 3);
    }

    #[tokio::test]
    async fn rejected_submission_makes_no_calls() {
        let api = Arc::new(RecordingSlackApi::default());
        let workflow = PollingWorkflow::new(PollingFunction::new(api.clone()));

        let result = workflow
            .submit(&WorkflowInputs::default(), &FormSubmission::default().with("channel", "C1"))
            .await;

        assert_eq!(result, Err(FormError::MissingField("poll_question")));
        assert!(api.posts().await.is_empty());
    }

    #[test]
    fn definition_opens_form_then_calls_function() {
        let definition = serde_json::to_value(definition()).expect("serialize");
        let steps = &definition["steps"];

        assert_eq!(definition["callback_id"], "polling_workflow");
        assert_eq!(steps[0]["function_id"], "slack#/functions/open_form");
        assert_eq!(
            steps[0]["inputs"]["fields"]["elements"][0],
            json!({
                "name": "channel",
                "title": "Channel to send poll to",
                "type": "slack#/types/channel_id",
                "default": "{{inputs.channel}}"
            })
        );
        assert_eq!(steps[1]["inputs"]["channel_id"], "{{steps.0.fields.channel}}");
        assert!(definition["input_parameters"]["required"]
            .as_array()
            .is_some_and(|required| required.is_empty()));
    }
}
