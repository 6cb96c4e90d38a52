//! Command-line interface for support-desk.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Options left unset fall through to the environment, the config file and
/// finally the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Session file path.
    pub store: Option<PathBuf>,
    /// Keep sessions in memory only.
    pub memory: bool,
    /// Inactivity timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Seconds between sweeps.
    pub sweep_interval_secs: Option<u64>,
    /// Do not clear sessions at startup.
    pub keep_sessions: bool,
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
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                result.port = Some(parse_number(&mut parser, "port")?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("store") => {
                result.store = Some(parser.value()?.parse()?);
            }
            Long("memory") => {
                result.memory = true;
            }
            Short('t') | Long("timeout") => {
                result.timeout_secs = Some(parse_number(&mut parser, "timeout")?);
            }
            Short('i') | Long("sweep-interval") => {
                result.sweep_interval_secs = Some(parse_number(&mut parser, "sweep-interval")?);
            }
            Long("keep-sessions") => {
                result.keep_sessions = true;
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

fn parse_number<T: std::str::FromStr>(
    parser: &mut lexopt::Parser,
    name: &'static str,
) -> Result<T, ArgsError> {
    use lexopt::ValueExt;

    let value: String = parser.value()?.parse()?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue(name, value))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"support-desk {version}
Session lifecycle and menu routing service for message-based support channels

USAGE:
    support-desk [OPTIONS]

OPTIONS:
    -H, --host <ADDR>           Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>           Port to listen on [default: 3000]
    -c, --config <FILE>         Path to configuration file (JSON)
    -s, --store <FILE>          Session file [default: contacts.json]
        --memory                Keep sessions in memory only
    -t, --timeout <SECS>        Inactivity timeout [default: 300]
    -i, --sweep-interval <SECS> Seconds between timeout sweeps [default: 60]
        --keep-sessions         Do not clear sessions at startup
    -l, --log-level <LVL>       Log level (error, warn, info, debug, trace)
    -h, --help                  Print help
    -V, --version               Print version

ENVIRONMENT VARIABLES:
    SUPPORT_DESK_HOST           Host address (overrides config)
    SUPPORT_DESK_PORT           Port number (overrides config)
    SUPPORT_DESK_STORE          Session file (overrides config)
    SUPPORT_DESK_TIMEOUT_SECS   Inactivity timeout (overrides config)
    SUPPORT_DESK_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                    Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:3000, ./contacts.json, 5 minute timeout)
    support-desk

    # Listen on all interfaces with a 10 minute timeout
    support-desk -H 0.0.0.0 -p 8080 -t 600

    # Start with config file
    support-desk -c /etc/support-desk/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("support-desk {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
