//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "sfoglia";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_EMBED_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_USER_AGENT: &str = concat!("sfoglia/", env!("CARGO_PKG_VERSION"));

/// Command-line arguments for the Sfoglia binary.
#[derive(Debug, Parser)]
#[command(name = "sfoglia", version, about = "Sfoglia slide page server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SFOGLIA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the Sfoglia HTTP service.
    Serve(Box<ServeArgs>),
    /// Render a deck once and print the extracted pages to stdout.
    #[command(name = "render")]
    Render(RenderArgs),
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

    /// Override the base URL written into generated embed code.
    #[arg(long = "embed-base-url", value_name = "URL")]
    pub embed_base_url: Option<String>,

    #[command(flatten)]
    pub fetch: FetchOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct FetchOverride {
    /// Override the User-Agent header sent when fetching markdown.
    #[arg(long = "fetch-user-agent", value_name = "VALUE")]
    pub fetch_user_agent: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Markdown deck URL to fetch and render.
    #[arg(value_name = "URL")]
    pub url: String,

    /// Print only the page at this index; all pages when omitted.
    #[arg(long, value_name = "INDEX")]
    pub page: Option<i64>,

    #[command(flatten)]
    pub fetch: FetchOverride,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub embed: EmbedSettings,
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct EmbedSettings {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("SFOGLIA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => raw.apply_fetch_override(&args.fetch),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    embed: RawEmbedSettings,
    fetch: RawFetchSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.embed_base_url.as_ref() {
            self.embed.base_url = Some(url.clone());
        }

        self.apply_fetch_override(&overrides.fetch);
    }

    fn apply_fetch_override(&mut self, overrides: &FetchOverride) {
        if let Some(agent) = overrides.fetch_user_agent.as_ref() {
            self.fetch.user_agent = Some(agent.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            embed,
            fetch,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let embed = build_embed_settings(embed)?;
        let fetch = build_fetch_settings(fetch)?;

        Ok(Self {
            server,
            logging,
            embed,
            fetch,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let listen_addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.listen_addr", reason))?;

    Ok(ServerSettings { listen_addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_embed_settings(embed: RawEmbedSettings) -> Result<EmbedSettings, LoadError> {
    let candidate = embed
        .base_url
        .unwrap_or_else(|| DEFAULT_EMBED_BASE_URL.to_string());

    let parsed = Url::parse(&candidate)
        .map_err(|err| LoadError::invalid("embed.base_url", format!("failed to parse: {err}")))?;
    if parsed.cannot_be_a_base() {
        return Err(LoadError::invalid(
            "embed.base_url",
            "URL cannot serve as a base",
        ));
    }

    Ok(EmbedSettings {
        base_url: candidate.trim_end_matches('/').to_string(),
    })
}

fn build_fetch_settings(fetch: RawFetchSettings) -> Result<FetchSettings, LoadError> {
    let user_agent = fetch
        .user_agent
        .and_then(|value| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Ok(FetchSettings { user_agent })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEmbedSettings {
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFetchSettings {
    user_agent: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.listen_addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn embed_base_url_trims_trailing_slash() {
        let mut raw = RawSettings::default();
        raw.embed.base_url = Some("https://slides.example.com/".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.embed.base_url, "https://slides.example.com");
    }

    #[test]
    fn embed_base_url_rejects_garbage() {
        let mut raw = RawSettings::default();
        raw.embed.base_url = Some("not a url".to_string());

        let error = Settings::from_raw(raw).expect_err("invalid base URL");
        assert!(matches!(
            error,
            LoadError::Invalid {
                key: "embed.base_url",
                ..
            }
        ));
    }

    #[test]
    fn fetch_user_agent_defaults_to_crate_version() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert!(settings.fetch.user_agent.starts_with("sfoglia/"));
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["sfoglia"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_render_arguments() {
        let args = CliArgs::parse_from([
            "sfoglia",
            "render",
            "https://example.com/deck.md",
            "--page",
            "2",
        ]);

        match args.command.expect("render command") {
            Command::Render(render) => {
                assert_eq!(render.url, "https://example.com/deck.md");
                assert_eq!(render.page, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
