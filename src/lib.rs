//! Score hackathon teams from the terminal.
//!
//! A [`session::ScoringSession`] walks one judge through picking a round and a
//! team, entering rubric scores and submitting them once per team, backed by
//! the judging server through [`api::JudgingClient`].

pub mod api;
pub mod config;
pub mod credentials;
pub mod draft;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod rubric;
pub mod session;

pub use error::{SessionError, SessionResult};
