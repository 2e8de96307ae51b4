pub mod config_resolver;
pub mod config_store;
pub mod paths;
pub mod poll;
pub mod prompter;
pub mod task_runner;
