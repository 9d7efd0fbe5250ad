use pollbot_slack::manifest::app_manifest;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    match serde_json::to_string_pretty(&app_manifest()) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(
            "manifest",
            "serialization",
            format!("failed to render manifest: {error}"),
            5,
        ),
    }
}
