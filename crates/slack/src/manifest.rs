//! Manifest shapes for functions and workflows as the platform expects them.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "slack#/types/channel_id")]
    ChannelId,
    #[serde(rename = "slack#/types/interactivity")]
    Interactivity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(kind: ParameterType) -> Self {
        Self { kind, description: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    pub properties: BTreeMap<String, Parameter>,
    pub required: Vec<String>,
}

impl ParameterSet {
    pub fn property(mut self, name: impl Into<String>, parameter: Parameter) -> Self {
        self.properties.insert(name.into(), parameter);
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionDefinition {
    pub callback_id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_parameters: ParameterSet,
    pub output_parameters: ParameterSet,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkflowStep {
    pub id: String,
    pub function_id: String,
    pub inputs: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkflowDefinition {
    pub callback_id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_parameters: ParameterSet,
    pub steps: Vec<WorkflowStep>,
}

/// App manifest fragment holding every function and workflow this crate
/// defines, keyed by callback id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppManifest {
    pub functions: BTreeMap<&'static str, FunctionDefinition>,
    pub workflows: BTreeMap<&'static str, WorkflowDefinition>,
}

pub fn app_manifest() -> AppManifest {
    let function = crate::function::definition();
    let workflow = crate::workflow::definition();
    AppManifest {
        functions: BTreeMap::from([(function.callback_id, function)]),
        workflows: BTreeMap::from([(workflow.callback_id, workflow)]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{app_manifest, Parameter, ParameterSet, ParameterType};

    #[test]
    fn parameter_types_use_platform_identifiers() {
        let set = ParameterSet::default()
            .property("channel_id", Parameter::new(ParameterType::ChannelId))
            .property("question", Parameter::new(ParameterType::String).description("Question"))
            .required(["channel_id"]);

        assert_eq!(
            serde_json::to_value(&set).expect("serialize"),
            json!({
                "properties": {
                    "channel_id": { "type": "slack#/types/channel_id" },
                    "question": { "type": "string", "description": "Question" }
                },
                "required": ["channel_id"]
            })
        );
    }

    #[test]
    fn app_manifest_lists_function_and_workflow() {
        let manifest = serde_json::to_value(app_manifest()).expect("serialize");

        assert_eq!(manifest["functions"]["polling_function"]["title"], "Generate poll");
        assert_eq!(manifest["workflows"]["polling_workflow"]["title"], "Start a poll");
        assert_eq!(
            manifest["workflows"]["polling_workflow"]["steps"][1]["function_id"],
            "#/functions/polling_function"
        );
    }
}
