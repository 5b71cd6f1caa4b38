//! Workflow engine for structured technical interviews.
//!
//! The engine owns the interview lifecycle (candidate intake, domain-biased question
//! selection, per-answer scoring and assisted rating) and synchronizes drafts with an
//! external record store. Rendering, identity lookup and the rating oracle are
//! collaborators supplied by the host through the traits in [`workflows::interview`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
