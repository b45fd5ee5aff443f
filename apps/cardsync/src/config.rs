use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use card_sync::SyncOptions;
use serde::Deserialize;
use shared::domain::UnknownDirectivePolicy;

pub const DEFAULT_CONFIG_PATH: &str = "cardsync.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub server_url: Option<String>,
    pub sync: SyncOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    message_name: Option<String>,
    marker_class: Option<String>,
    placeholder_id: Option<String>,
    unknown_directive: Option<UnknownDirectivePolicy>,
}

/// Defaults, then the TOML file, then environment variables.
///
/// Without an explicit `path` a missing `cardsync.toml` is fine; a file that
/// exists but does not parse is always an error.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = Some(v);
    }
    if let Some(v) = file_cfg.message_name {
        settings.sync.message_name = v;
    }
    if let Some(v) = file_cfg.marker_class {
        settings.sync.layout.marker_class = v;
    }
    if let Some(v) = file_cfg.placeholder_id {
        settings.sync.layout.placeholder_id = v;
    }
    if let Some(v) = file_cfg.unknown_directive {
        settings.sync.unknown_directive = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("CARDSYNC_SERVER_URL") {
        settings.server_url = Some(v);
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = Some(v);
    }

    if let Some(v) = lookup("APP__MESSAGE_NAME") {
        settings.sync.message_name = v;
    }
    if let Some(v) = lookup("APP__MARKER_CLASS") {
        settings.sync.layout.marker_class = v;
    }
    if let Some(v) = lookup("APP__PLACEHOLDER_ID") {
        settings.sync.layout.placeholder_id = v;
    }

    if let Some(v) = lookup("APP__UNKNOWN_DIRECTIVE") {
        settings.sync.unknown_directive = parse_policy(&v)?;
    }

    Ok(())
}

fn parse_policy(raw: &str) -> anyhow::Result<UnknownDirectivePolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "treat_as_remove" | "remove" => Ok(UnknownDirectivePolicy::TreatAsRemove),
        "reject" => Ok(UnknownDirectivePolicy::Reject),
        other => Err(anyhow!(
            "APP__UNKNOWN_DIRECTIVE must be 'treat_as_remove' or 'reject', got '{other}'"
        )),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
