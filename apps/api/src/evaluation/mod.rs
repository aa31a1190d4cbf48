//! Answer evaluation — the submit → score → summarize → persist pipeline.

pub mod aggregate;
pub mod handlers;
pub mod judgment;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod store;
