use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the postcache binary.
#[derive(Debug, Parser)]
#[command(
    name = "postcache",
    version,
    about = "Caching proxy in front of a Ghost content API"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "POSTCACHE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP proxy (default).
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override how long in-flight requests may drain after a shutdown signal.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the upstream Ghost base URL.
    #[arg(long = "upstream-url", value_name = "URL")]
    pub upstream_url: Option<String>,

    /// Override the upstream content API key.
    #[arg(long = "upstream-key", value_name = "KEY")]
    pub upstream_key: Option<String>,

    /// Override the `Accept-Version` sent upstream.
    #[arg(long = "upstream-version", value_name = "VERSION")]
    pub upstream_version: Option<String>,

    /// Override the upstream request timeout.
    #[arg(long = "upstream-timeout-seconds", value_name = "SECONDS")]
    pub upstream_timeout_seconds: Option<u64>,

    /// Override the webhook signing secret.
    #[arg(long = "webhook-secret", value_name = "SECRET")]
    pub webhook_secret: Option<String>,

    /// Override the snapshot population attempt budget.
    #[arg(long = "cache-max-retries", value_name = "COUNT")]
    pub cache_max_retries: Option<u32>,

    /// Restrict CORS to the allowed origins.
    #[arg(
        long = "cors-restrict",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cors_restrict: Option<bool>,

    /// Replace the allowed CORS origins; repeat for several.
    #[arg(long = "cors-allowed-origin", value_name = "ORIGIN")]
    pub cors_allowed_origins: Vec<String>,
}
