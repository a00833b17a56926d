use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use std::ffi::OsString;
use std::path::PathBuf;

/// CLI arguments for citizens-server
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config_file: Option<PathBuf>,
    pub max_request_size: Option<usize>,
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Parse command line arguments
    pub fn parse() -> Self {
        let matches = Self::command().get_matches();

        if matches.get_flag("help_env") {
            Self::print_env_help();
            std::process::exit(0);
        }

        Self::from_matches(&matches)
    }

    /// Parse an explicit argument list
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    /// The clap command definition
    pub fn command() -> Command {
        Command::new("citizens-server")
            .version(citizens::VERSION)
            .about("HTTP API server for the citizens registry")
            .long_about(
                r#"Citizens Server exposes the citizens registry over a JSON REST API.
Clients upload imports of citizens with their relatives, patch individual
citizens and query birthday and age reports.

The server can be configured through command line arguments or environment
variables. Command line arguments take precedence over environment variables.

Examples:
  citizens-server --port 8080
  citizens-server --config citizens.toml --log-level debug"#,
            )
            .arg(
                Arg::new("host")
                    .long("host")
                    .value_name("HOST")
                    .help("Address to bind to")
                    .long_help(
                        "IP address for the HTTP server to bind to.
Environment variable: CITIZENS_HOST",
                    )
                    .value_hint(ValueHint::Hostname),
            )
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .help("Port to listen on")
                    .long_help(
                        "Port number for the HTTP server to listen on.
Environment variable: CITIZENS_PORT",
                    )
                    .value_hint(ValueHint::Other)
                    .value_parser(clap::value_parser!(u16)),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Registry configuration file path")
                    .long_help(
                        "Path to a TOML, YAML or JSON file with the registry configuration
(storage and logging). Environment variables override values from the file.
Without this option citizens.toml, citizens.yaml, citizens.yml and citizens.json
are looked up in the working directory.",
                    )
                    .value_hint(ValueHint::FilePath)
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                Arg::new("max_request_size")
                    .long("max-request-size")
                    .value_name("BYTES")
                    .help("Maximum request body size in bytes")
                    .long_help(
                        "Largest accepted request body in bytes. Larger bodies are
rejected with 413.
Environment variable: CITIZENS_MAX_REQUEST_SIZE",
                    )
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                Arg::new("log_level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level")
                    .long_help(
                        "Logging verbosity. RUST_LOG takes precedence when set.
Environment variable: CITIZENS_LOGGING__LEVEL",
                    )
                    .value_parser(["trace", "debug", "info", "warn", "error"]),
            )
            .arg(
                Arg::new("help_env")
                    .long("help-env")
                    .help("Show environment variable help")
                    .action(ArgAction::SetTrue),
            )
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            host: matches.get_one::<String>("host").cloned(),
            port: matches.get_one::<u16>("port").copied(),
            config_file: matches.get_one::<PathBuf>("config").cloned(),
            max_request_size: matches.get_one::<usize>("max_request_size").copied(),
            log_level: matches.get_one::<String>("log_level").cloned(),
        }
    }

    /// Print environment variable help
    fn print_env_help() {
        println!("Citizens Server Environment Variables");
        println!("=====================================");
        println!();
        println!("Server:");
        println!("  CITIZENS_HOST                 - Bind address (default: 0.0.0.0)");
        println!("  CITIZENS_PORT                 - Server port (default: 8080)");
        println!(
            "  CITIZENS_MAX_REQUEST_SIZE     - Max request body size in bytes (default: 16MB)"
        );
        println!();
        println!("Storage:");
        println!("  CITIZENS_STORAGE__BACKEND     - memory or rocksdb (default: memory)");
        println!("  CITIZENS_STORAGE__DATA_DIR    - Data directory for rocksdb");
        println!();
        println!("Logging:");
        println!("  CITIZENS_LOGGING__LEVEL       - trace, debug, info, warn, error (default: info)");
        println!("  CITIZENS_LOGGING__FORMAT      - default, json, compact, pretty");
        println!("  CITIZENS_LOGGING__FILE        - Also write logs to this file");
        println!("  RUST_LOG                      - Filter directives, overrides the level");
        println!();
        println!("Note: Command line arguments take precedence over environment variables.");
    }
}
