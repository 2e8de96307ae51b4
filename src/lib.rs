pub mod cli;
pub mod constants;
pub mod core;
pub mod net;
pub mod system;
