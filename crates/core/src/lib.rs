pub mod config;
pub mod domain;
pub mod errors;

pub use domain::poll::{
    ChannelId, FunctionOutcome, Interactivity, Interactor, MessageTs, PollRequest, PostedMessage,
    ReactionMarker, UserId,
};
pub use errors::{DomainError, InterfaceError};
