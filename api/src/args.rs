use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser};
use loanboard_core::domain::common::{
    FixturesConfig, LoanboardConfig, RecordSourceConfig, UpstreamConfig,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "loanboard-api", version, about = "Loanboard listing API")]
pub struct Args {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub upstream: UpstreamArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ServerArgs {
    #[arg(long = "server-host", env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long = "server-port", env = "PORT", default_value_t = 3333)]
    pub port: u16,

    /// Prefix for every route, e.g. `/api`.
    #[arg(long = "server-root-path", env = "SERVER_ROOT_PATH", default_value = "")]
    pub root_path: String,

    #[arg(
        long = "allowed-origins",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct UpstreamArgs {
    /// Base URL of the back-office REST API.
    #[arg(
        long = "upstream-url",
        env = "UPSTREAM_BASE_URL",
        default_value = "http://localhost:3000/api"
    )]
    pub base_url: String,

    /// Bearer token forwarded to the upstream API.
    #[arg(long = "upstream-token", env = "UPSTREAM_TOKEN")]
    pub token: Option<String>,

    #[arg(long = "upstream-page-limit", env = "UPSTREAM_PAGE_LIMIT", default_value_t = 1000)]
    pub page_limit: u32,

    #[arg(long = "upstream-timeout-secs", env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Serve `{dir}/{listing}.json` instead of calling the upstream API.
    #[arg(long = "fixtures-dir", env = "FIXTURES_DIR")]
    pub fixtures_dir: Option<PathBuf>,

    #[arg(long = "refresh-debounce-ms", env = "REFRESH_DEBOUNCE_MS", default_value_t = 300)]
    pub refresh_debounce_ms: u64,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LogArgs {
    #[arg(long = "log-filter", env = "LOG_FILTER", default_value = "info")]
    pub filter: String,

    #[arg(long = "log-json", env = "LOG_JSON", default_value_t = false)]
    pub json: bool,
}

impl From<Args> for LoanboardConfig {
    fn from(args: Args) -> Self {
        let source = match args.upstream.fixtures_dir {
            Some(directory) => RecordSourceConfig::Fixtures(FixturesConfig { directory }),
            None => RecordSourceConfig::Upstream(UpstreamConfig {
                base_url: args.upstream.base_url,
                token: args.upstream.token,
                page_limit: args.upstream.page_limit,
                timeout: Duration::from_secs(args.upstream.timeout_secs),
            }),
        };

        LoanboardConfig {
            source,
            refresh_debounce: Duration::from_millis(args.upstream.refresh_debounce_ms),
        }
    }
}
