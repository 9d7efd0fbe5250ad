use std::sync::Arc;

use pollbot_core::config::{AppConfig, LoadOptions};
use pollbot_core::{Interactivity, PollRequest};
use pollbot_slack::{api::WebApiClient, function::PollingFunction};

use crate::commands::CommandResult;

#[derive(Clone, Debug)]
pub struct PostArgs {
    pub channel: String,
    pub question: String,
    pub options: Vec<String>,
    pub user: Option<String>,
}

pub fn run(options: &LoadOptions, args: PostArgs) -> CommandResult {
    let request = match build_request(&args) {
        Ok(request) => request,
        Err(message) => return CommandResult::failure("post", "invalid_input", message, 3),
    };

    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("post", "config_validation", error.to_string(), 2)
        }
    };

    let client = match WebApiClient::from_config(&config.slack) {
        Ok(client) => client,
        Err(error) => return CommandResult::failure("post", "slack_client", error.to_string(), 4),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "post",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                4,
            )
        }
    };

    let function = PollingFunction::new(Arc::new(client));
    let outcome = runtime.block_on(function.execute(&request));
    let rendered = serde_json::to_string(&outcome).unwrap_or_else(|error| error.to_string());

    if outcome.is_error() {
        CommandResult::failure("post", "poll_generation", rendered, 6)
    } else {
        CommandResult::success("post", rendered)
    }
}

fn build_request(args: &PostArgs) -> Result<PollRequest, String> {
    let [first, second, third] = args.options.as_slice() else {
        return Err(format!("exactly 3 options are required, got {}", args.options.len()));
    };

    let mut request = PollRequest::new(
        args.channel.as_str(),
        args.question.as_str(),
        [first.as_str(), second.as_str(), third.as_str()],
    );
    if let Some(user) = &args.user {
        request = request.with_interactivity(Interactivity::for_user(user.as_str()));
    }

    request.validate().map_err(|error| error.to_string())?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::{build_request, PostArgs};

    fn args(options: &[&str]) -> PostArgs {
        PostArgs {
            channel: "C1".to_string(),
            question: "Lunch?".to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
            user: Some("U1".to_string()),
        }
    }

    #[test]
    fn build_request_requires_exactly_three_options() {
        let error = build_request(&args(&["Pizza", "Sushi"])).expect_err("two options");
        assert!(error.contains("exactly 3 options"));
    }

    #[test]
    fn build_request_rejects_blank_option() {
        let error = build_request(&args(&["Pizza", " ", "Salad"])).expect_err("blank option");
        assert!(error.contains("option_2"));
    }

    #[test]
    fn build_request_attaches_interactor() {
        let request = build_request(&args(&["Pizza", "Sushi", "Salad"])).expect("valid request");
        assert_eq!(request.interactor_id().map(|id| id.0.as_str()), Some("U1"));
        assert_eq!(request.option_3, "Salad");
    }
}
