pub mod config;
pub mod debug_log;
pub mod locale;
pub mod output;
pub mod paths;
pub mod record;
pub mod watch;

pub use debug_log::DebugLog;
