use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use shotbot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", &["SHOTBOT_DATABASE_URL"]),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", &["SHOTBOT_DATABASE_MAX_CONNECTIONS"]),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", &["SHOTBOT_DATABASE_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "slack.bot_token",
        &redact_token(config.slack.bot_token.expose_secret()),
        source("slack.bot_token", &["SHOTBOT_SLACK_BOT_TOKEN", "SLACK_AUTH_TOKEN"]),
    ));
    lines.push(render_line(
        "slack.prod_webhook_url",
        &redact_webhook(config.slack.prod_webhook_url.expose_secret()),
        source("slack.prod_webhook_url", &["SHOTBOT_SLACK_PROD_WEBHOOK_URL", "SLACK_PROD_WEBHOOK"]),
    ));
    lines.push(render_line(
        "slack.dev_webhook_url",
        &redact_webhook(config.slack.dev_webhook_url.expose_secret()),
        source("slack.dev_webhook_url", &["SHOTBOT_SLACK_DEV_WEBHOOK_URL", "SLACK_DEV_WEBHOOK"]),
    ));
    lines.push(render_line(
        "slack.api_base_url",
        &config.slack.api_base_url,
        source("slack.api_base_url", &["SHOTBOT_SLACK_API_BASE_URL"]),
    ));
    lines.push(render_line(
        "slack.timeout_secs",
        &config.slack.timeout_secs.to_string(),
        source("slack.timeout_secs", &["SHOTBOT_SLACK_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["SHOTBOT_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["SHOTBOT_SERVER_PORT", "PORT"]),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", &["SHOTBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ));

    lines.push(render_line(
        "scoring.session_gap_secs",
        &config.scoring.session_gap_secs.to_string(),
        source("scoring.session_gap_secs", &["SHOTBOT_SCORING_SESSION_GAP_SECS"]),
    ));
    lines.push(render_line(
        "scoring.duplicate_lookback",
        &config.scoring.duplicate_lookback.to_string(),
        source("scoring.duplicate_lookback", &["SHOTBOT_SCORING_DUPLICATE_LOOKBACK"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["SHOTBOT_LOGGING_LEVEL", "SHOTBOT_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["SHOTBOT_LOGGING_FORMAT", "SHOTBOT_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("shotbot.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/shotbot.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

/// Webhook URLs carry their secret in the path, so only the host is shown.
fn redact_webhook(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return "<redacted>".to_string();
    };
    let host = rest.split('/').next().unwrap_or_default();
    format!("{scheme}://{host}/***")
}
