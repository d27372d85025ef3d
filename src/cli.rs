use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gdk-debug-log",
    about = "Write, read and follow the GTK backend debug log",
    version
)]
pub struct Cli {
    /// Log file [default: /tmp/cmclient_gtk.log]
    #[arg(long, env = "GDK_DEBUG_LOG_PATH", global = true)]
    pub path: Option<String>,

    /// Config file [default: ~/.config/gdk-debug-log.toml]
    #[arg(long, env = "GDK_DEBUG_LOG_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Append a record (only when the gating variable is set, unless --force)
    Emit {
        /// Message text
        message: String,
        /// Function name to record
        #[arg(long, default_value = "main")]
        function: String,
        /// Line number to record
        #[arg(long, default_value_t = 0)]
        line: u32,
        /// Source file to record
        #[arg(long, default_value = "shell")]
        file: String,
        /// Write even if the gating variable is unset
        #[arg(long)]
        force: bool,
    },

    /// Show where the log lives and whether logging is enabled
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the records in the log
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Only the last N records
        #[arg(long)]
        tail: Option<usize>,
    },

    /// Print records as they are appended (runs until interrupted)
    Follow {
        /// One JSON object per line
        #[arg(long)]
        json: bool,
        /// Print the existing content first
        #[arg(long)]
        from_start: bool,
    },

    /// Parse a locale tag and print its parts and platform names
    Locale {
        /// BCP 47 tag such as `sr-Latn-RS` (or a POSIX name with --posix)
        input: String,
        /// Parse INPUT as a POSIX locale name such as `fr_BE.UTF-8@euro`
        #[arg(long)]
        posix: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
