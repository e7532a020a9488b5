//! Intake boundary for free-text regimens.
//!
//! An external language-understanding service turns a clinician's free text
//! into structured medications. This crate owns the prompt and output schema
//! sent to that service and the parsing of its response into engine queries.
//! Nothing here validates clinical content; `ome-core` does that.

pub mod extraction;
pub mod prompts;

pub use extraction::*;
pub use prompts::*;
