//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "inklet";
const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POSTS_LIMIT: u32 = 100;
const DEFAULT_PHOTOS_LIMIT: u32 = 500;

/// Command-line arguments for the inklet binary.
#[derive(Debug, Parser)]
#[command(name = "inklet", version, about = "Blog post synchronization store")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "INKLET_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Fetch the remote collection and print it.
    Fetch(FetchArgs),
    /// Create a post.
    Create(CreateArgs),
    /// Update an existing post's title and body.
    Update(UpdateArgs),
    /// Delete a post by id.
    Delete(DeleteArgs),
    /// Attach a comment to a post.
    Comment(CommentArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the external API base URL.
    #[arg(long = "api-base-url", value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Override the request timeout in seconds.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS")]
    pub api_timeout_seconds: Option<u64>,

    /// Override the number of remote posts requested per fetch.
    #[arg(long = "api-posts-limit", value_name = "COUNT")]
    pub api_posts_limit: Option<u32>,

    /// Override the number of remote photos requested per fetch.
    #[arg(long = "api-photos-limit", value_name = "COUNT")]
    pub api_photos_limit: Option<u32>,

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
}

#[derive(Debug, Args, Default, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Title of the new post.
    #[arg(long)]
    pub title: String,

    /// Body of the new post (plain text; wrapped as HTML on insert).
    #[arg(long)]
    pub content: String,

    /// Category label.
    #[arg(long, default_value = "General")]
    pub category: String,

    /// Author display name.
    #[arg(long, default_value = "Local Author")]
    pub author: String,

    /// Cover image URL; a derived excerpt and placeholder are used when omitted.
    #[arg(long)]
    pub image: Option<String>,

    /// Explicit excerpt; derived from the body when omitted.
    #[arg(long)]
    pub excerpt: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Id of the post to update.
    #[arg(long)]
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: String,

    /// New body (plain text).
    #[arg(long)]
    pub content: String,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Id of the post to delete.
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct CommentArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Id of the post to comment on.
    #[arg(long)]
    pub id: String,

    /// Comment author display name.
    #[arg(long)]
    pub author: String,

    /// Comment body.
    #[arg(long)]
    pub content: String,
}

impl CliArgs {
    fn overrides(&self) -> Overrides {
        match self.command.as_ref() {
            Some(Command::Fetch(args)) => args.overrides.clone(),
            Some(Command::Create(args)) => args.overrides.clone(),
            Some(Command::Update(args)) => args.overrides.clone(),
            Some(Command::Delete(args)) => args.overrides.clone(),
            Some(Command::Comment(args)) => args.overrides.clone(),
            None => Overrides::default(),
        }
    }
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub posts_limit: u32,
    pub photos_limit: u32,
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

    builder = builder.add_source(Environment::with_prefix("INKLET").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides());

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for
/// downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    request_timeout_seconds: Option<u64>,
    posts_limit: Option<u32>,
    photos_limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.request_timeout_seconds = Some(seconds);
        }
        if let Some(limit) = overrides.api_posts_limit {
            self.api.posts_limit = Some(limit);
        }
        if let Some(limit) = overrides.api_photos_limit {
            self.api.photos_limit = Some(limit);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { api, logging } = raw;

        let api = build_api_settings(api)?;
        let logging = build_logging_settings(logging)?;

        Ok(Self { api, logging })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base_url = api
        .base_url
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let base_url = Url::parse(&base_url)
        .map_err(|err| LoadError::invalid("api.base_url", format!("failed to parse: {err}")))?;

    let timeout_secs = api
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "api.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let posts_limit = api.posts_limit.unwrap_or(DEFAULT_POSTS_LIMIT);
    if posts_limit == 0 {
        return Err(LoadError::invalid(
            "api.posts_limit",
            "must be greater than zero",
        ));
    }

    let photos_limit = api.photos_limit.unwrap_or(DEFAULT_PHOTOS_LIMIT);
    if photos_limit == 0 {
        return Err(LoadError::invalid(
            "api.photos_limit",
            "must be greater than zero",
        ));
    }

    Ok(ApiSettings {
        base_url,
        request_timeout: Duration::from_secs(timeout_secs),
        posts_limit,
        photos_limit,
    })
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_public_mock_api() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.api.base_url.as_str(), "https://jsonplaceholder.typicode.com/");
        assert_eq!(settings.api.posts_limit, DEFAULT_POSTS_LIMIT);
        assert_eq!(settings.api.photos_limit, DEFAULT_PHOTOS_LIMIT);
        assert_eq!(
            settings.api.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert!(matches!(settings.logging.format, LogFormat::Compact));
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.api.posts_limit = Some(50);
        raw.logging.level = Some("info".to_string());

        let overrides = Overrides {
            api_posts_limit: Some(25),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.api.posts_limit, 25);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut raw = RawSettings::default();
        raw.api.posts_limit = Some(0);

        let result = Settings::from_raw(raw);
        assert!(matches!(
            result,
            Err(LoadError::Invalid {
                key: "api.posts_limit",
                ..
            })
        ));
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let mut raw = RawSettings::default();
        raw.api.base_url = Some("not a url".to_string());

        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = Overrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn parse_update_arguments() {
        let args = CliArgs::parse_from([
            "inklet",
            "update",
            "--id",
            "42",
            "--title",
            "new title",
            "--content",
            "new body",
            "--api-posts-limit",
            "10",
        ]);

        match args.command.expect("update command") {
            Command::Update(update) => {
                assert_eq!(update.id, "42");
                assert_eq!(update.title, "new title");
                assert_eq!(update.overrides.api_posts_limit, Some(10));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_to_fetch_command() {
        let args = CliArgs::parse_from(["inklet"]);
        assert!(args.command.is_none());
        assert_eq!(args.overrides().api_base_url, None);
    }
}
