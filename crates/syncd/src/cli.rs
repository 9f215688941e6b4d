//! The `syncd` command line: global configuration/format/verbosity flags
//! plus a `handlers` introspection subcommand, replacing the original's
//! dynamic module-scanning `cowbird.cli` with a closed `clap::Subcommand`
//! enum (same closed-sum-type reasoning as the handler factory).

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "syncd")]
#[command(about = "permission and filesystem-event coordination middleware", version, author)]
#[command(group(
    ArgGroup::new("verbosity")
        .args(["quiet", "debug", "log_level"])
        .multiple(false)
))]
pub struct Cli {
    /// Path to a config file or directory of config files. Overrides any
    /// path set via the environment when explicitly supplied.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Output format for introspection subcommands.
    #[arg(short = 'f', long = "format", global = true, value_enum, default_value_t = OutputFormat::Flat)]
    pub format: OutputFormat,

    /// Suppress all logging below error level.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Enable debug-level logging.
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Explicit log level, overriding `quiet`/`debug` (mutually exclusive with both).
    #[arg(short = 'l', long = "log-level", global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Resolves the three verbosity flags (already enforced mutually
    /// exclusive by the `ArgGroup`) down to one `tracing` filter directive.
    pub fn effective_log_level(&self) -> String {
        if let Some(level) = &self.log_level {
            level.clone()
        } else if self.quiet {
            "error".to_string()
        } else if self.debug {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Flat,
    Json,
    Yaml,
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect the configured handler set without starting the HTTP server.
    Handlers {
        #[command(subcommand)]
        action: HandlersAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum HandlersAction {
    /// List every active handler and its dispatch priority.
    List,
    /// Print detail for one handler by name.
    Info {
        /// Handler name, as declared in the `handlers` config section.
        name: String,
    },
}
