// src/constants.rs

/// The name of the directory holding persisted state (inside the system config dir).
pub const APP_DIR: &str = "sst";

/// The name of the persisted key-value store file (inside ~/.config/sst/).
pub const CONFIG_STORE_FILENAME: &str = "config.json";

/// Namespace for the Retriever upload settings.
pub const RETRIEVER_CONFIG_KEY: &str = "retriever";

/// Namespace for the Mailchimp settings shared by all newsletter commands.
pub const MAILCHIMP_CONFIG_KEY: &str = "mailchimp";
