use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("required field `{0}` is missing or blank")]
    MissingField(String),
    #[error("request payload is invalid: {0}")]
    InvalidPayload(String),
}

/// A rejected request as reported to the caller: user-safe text plus the
/// correlation id that ties it to the server logs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("bad request: {message}")]
pub struct InterfaceError {
    message: String,
    correlation_id: String,
}

impl InterfaceError {
    pub fn bad_request(error: DomainError, correlation_id: impl Into<String>) -> Self {
        Self { message: error.to_string(), correlation_id: correlation_id.into() }
    }

    pub fn user_message(&self) -> &'static str {
        "The request could not be processed. Check inputs and try again."
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{DomainError, InterfaceError};

    #[test]
    fn missing_field_is_named_in_bad_request() {
        let interface =
            InterfaceError::bad_request(DomainError::MissingField("option_2".to_owned()), "req-1");

        assert_eq!(interface.correlation_id(), "req-1");
        assert!(interface.message().contains("option_2"));
        assert_eq!(
            interface.to_string(),
            "bad request: required field `option_2` is missing or blank"
        );
    }

    #[test]
    fn invalid_payload_keeps_parser_detail() {
        let interface = InterfaceError::bad_request(
            DomainError::InvalidPayload("missing field `option_3`".to_owned()),
            "req-2",
        );

        assert_eq!(interface.message(), "request payload is invalid: missing field `option_3`");
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }
}
