//! Reelcraft: Video to Learning App Generation
//!
//! A two-stage pipeline that turns an educational video into a written app spec and then
//! into a single-file interactive HTML app, with a session state machine that tracks
//! progress, failures, spec edits, and code-only regeneration.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod edit;
pub mod error;
pub mod extract;
pub mod host;
pub mod logging;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod synthesis;
