// src/cli/handlers/mod.rs

// One module per command, plus shared helpers in `commons`.

pub mod clear;
pub mod commons;
pub mod mailchimp;
pub mod retriever;
pub mod subscribers;
