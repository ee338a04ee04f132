pub mod commands;
pub mod error;
pub mod http;
pub mod manager;
pub mod options;
pub mod plist;
pub mod podfile;
pub mod runtime;

/// Version reported in the welcome banner and by `--version`.
pub const VERSION: &str = env!("SKAD_UPDATER_VERSION");
