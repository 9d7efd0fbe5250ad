pub mod config;
pub mod doctor;
pub mod manifest;
pub mod post;

use serde_json::json;

/// What a subcommand prints and the process exit code it maps to.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    /// Free-form report that always exits cleanly.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let envelope = json!({
            "command": command,
            "status": "ok",
            "error_class": null,
            "message": message.into(),
        });
        Self { exit_code: 0, output: envelope.to_string() }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let envelope = json!({
            "command": command,
            "status": "error",
            "error_class": error_class,
            "message": message.into(),
        });
        Self { exit_code, output: envelope.to_string() }
    }
}
