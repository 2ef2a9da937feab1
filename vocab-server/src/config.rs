//! Server configuration
//!
//! Command-line flags (each with an environment variable fallback) override
//! the TOML file, which overrides compiled defaults. The result is validated
//! once at startup and handed to the components that need it.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use vocab_common::config::{non_blank, resolve_data_folder, TomlConfig};
use vocab_common::time::DEFAULT_UTC_OFFSET_MINUTES;
use vocab_common::{Error, ReferenceZone, Result};

use crate::ai::AiClientConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5790;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GLOSS_LANGUAGE: &str = "Simplified Chinese";
pub const DEFAULT_STREAM_BUFFER: usize = 32;

/// Command-line arguments for vocab-server
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "vocab-server")]
#[command(about = "Vocabulary review service with spaced repetition and AI helpers")]
#[command(version)]
pub struct CliArgs {
    /// TOML config file
    #[arg(short, long, env = "VOCAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Folder holding vocab.db
    #[arg(short, long, env = "VOCAB_DATA_FOLDER")]
    pub data_folder: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "VOCAB_BIND")]
    pub bind: Option<String>,

    /// Listen port
    #[arg(short, long, env = "VOCAB_PORT")]
    pub port: Option<u16>,

    /// Reference zone offset east of UTC, in minutes
    #[arg(long, env = "VOCAB_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,

    /// Secret gesture pattern for login
    #[arg(long, env = "VOCAB_LOGIN_PATTERN", hide_env_values = true)]
    pub login_pattern: Option<String>,

    /// Mark the session cookie Secure
    #[arg(long, env = "VOCAB_SECURE_COOKIES")]
    pub secure_cookies: Option<bool>,

    /// Provider API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Provider base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Chat model name
    #[arg(long, env = "OPENAI_MODEL")]
    pub model: Option<String>,

    /// Language used for glosses
    #[arg(long, env = "VOCAB_GLOSS_LANGUAGE")]
    pub gloss_language: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VOCAB_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_folder: PathBuf,
    pub listen_addr: SocketAddr,
    pub zone: ReferenceZone,
    /// `None` disables authentication
    pub login_pattern: Option<String>,
    pub secure_cookies: bool,
    pub ai: AiClientConfig,
    pub log_level: String,
}

impl ServerConfig {
    /// Merge arguments over the TOML file and validate the result
    pub fn resolve(args: &CliArgs, toml: &TomlConfig) -> Result<Self> {
        let data_folder = resolve_data_folder(args.data_folder.as_deref(), toml);

        let bind = args
            .bind
            .clone()
            .or_else(|| toml.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let ip: IpAddr = bind
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind, e)))?;
        let port = args.port.or(toml.port).unwrap_or(DEFAULT_PORT);

        let offset = args
            .utc_offset_minutes
            .or(toml.utc_offset_minutes)
            .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES);
        let zone = ReferenceZone::from_offset_minutes(offset)?;

        let api_key = non_blank(args.api_key.clone())
            .or_else(|| non_blank(toml.ai.api_key.clone()))
            .ok_or_else(|| {
                Error::Config(
                    "No provider API key configured (set OPENAI_API_KEY or [ai] api_key)".to_string(),
                )
            })?;

        let stream_buffer = toml.ai.stream_buffer.unwrap_or(DEFAULT_STREAM_BUFFER);
        if stream_buffer == 0 {
            return Err(Error::Config("[ai] stream_buffer must be at least 1".to_string()));
        }

        let ai = AiClientConfig {
            base_url: non_blank(args.base_url.clone())
                .or_else(|| non_blank(toml.ai.base_url.clone()))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: non_blank(args.model.clone())
                .or_else(|| non_blank(toml.ai.model.clone()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gloss_language: non_blank(args.gloss_language.clone())
                .or_else(|| non_blank(toml.ai.gloss_language.clone()))
                .unwrap_or_else(|| DEFAULT_GLOSS_LANGUAGE.to_string()),
            request_timeout: toml
                .ai
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            stream_buffer,
        };

        Ok(Self {
            data_folder,
            listen_addr: SocketAddr::new(ip, port),
            zone,
            login_pattern: non_blank(args.login_pattern.clone())
                .or_else(|| non_blank(toml.login_pattern.clone())),
            secure_cookies: args.secure_cookies.or(toml.secure_cookies).unwrap_or(false),
            ai,
            log_level: non_blank(args.log_level.clone())
                .unwrap_or_else(|| toml.logging.level.clone()),
        })
    }

    pub fn auth_enabled(&self) -> bool {
        self.login_pattern.is_some()
    }
}
