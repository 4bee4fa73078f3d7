//! Command-line interface for the session-cleaner demo binary.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::IdProviderKind;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Idle window in milliseconds (overrides config file).
    pub idle_timeout_ms: Option<u64>,
    /// Extend a session's life on every read.
    pub sliding: bool,
    /// ID provider (overrides config file).
    pub id_provider: Option<IdProviderKind>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("idle-timeout") => {
                let value: String = parser.value()?.parse()?;
                let ms = value
                    .parse()
                    .ok()
                    .filter(|&ms: &u64| ms > 0)
                    .ok_or(ArgsError::InvalidValue("idle-timeout", value))?;
                result.idle_timeout_ms = Some(ms);
            }
            Long("sliding") => {
                result.sliding = true;
            }
            Short('i') | Long("id-provider") => {
                let value: String = parser.value()?.parse()?;
                let kind = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("id-provider", value))?;
                result.id_provider = Some(kind);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-cleaner {version}
In-memory session store with idle-timeout eviction (demo harness)

USAGE:
    session-cleaner [OPTIONS]

OPTIONS:
    -c, --config <FILE>        Path to configuration file (JSON)
    -t, --idle-timeout <MS>    Idle window in milliseconds [default: 5000]
        --sliding              Reads also restart the idle window
    -i, --id-provider <KIND>   Session ID provider: random, counter [default: random]
    -l, --log-level <LVL>      Log level (error, warn, info, debug, trace)
    -h, --help                 Print help
    -V, --version              Print version

ENVIRONMENT VARIABLES:
    SESSION_CLEANER_IDLE_TIMEOUT_MS  Idle window (overrides config)
    SESSION_CLEANER_POLICY           on_update or sliding (overrides config)
    SESSION_CLEANER_ID_PROVIDER      random or counter (overrides config)
    SESSION_CLEANER_LOG_LEVEL        Log level (overrides config)
    RUST_LOG                         Alternative log level setting

EXAMPLES:
    # Run the demo with the default 5 second window
    session-cleaner

    # Short window, verbose store logging
    session-cleaner -t 500 -l debug
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-cleaner {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    /// Lexopt parsing error.
    #[error(transparent)]
    Lexopt(#[from] lexopt::Error),
    /// Invalid argument value.
    #[error("invalid value for --{0}: '{1}'")]
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}
