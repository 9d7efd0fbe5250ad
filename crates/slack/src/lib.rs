//! Slack Integration - polling function and intake workflow
//!
//! This crate provides the Slack side of pollbot:
//! - **Web API** (`api`) - `chat.postMessage` and `reactions.add` over HTTPS
//! - **Block Kit** (`blocks`) - Poll message layout
//! - **Function** (`function`) - `polling_function`: post the poll, plant reactions
//! - **Workflow** (`workflow`) - `polling_workflow`: open a form, then call the function
//! - **Manifest** (`manifest`) - Function and workflow definitions for the app manifest
//!
//! # Architecture
//!
//! ```text
//! Form submission → PollingWorkflow → PollingFunction → chat.postMessage
//!                                                     → reactions.add ×3
//! ```
//!
//! The function always leaves the step open (`completed: false`); the button
//! handlers that finish it live outside this crate.

pub mod api;
pub mod blocks;
pub mod function;
pub mod manifest;
pub mod workflow;
