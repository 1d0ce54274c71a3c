// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Runtime configuration.
//!
//! Values are resolved from built-in defaults, then an optional TOML file,
//! then environment variables. Command line flags are applied last by the
//! caller.

use std::fs;
use std::path::{Path, PathBuf};

use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "chatterm";

pub(crate) const DEFAULT_HISTORY_LIMIT: usize = 30;
pub(crate) const DEFAULT_ASCII_WIDTH: u32 = 30;
pub(crate) const DEFAULT_DIALOG_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    /// Fetch photo attachments and render them as text rasters.
    pub auto_download_image: bool,
    /// Max messages fetched per conversation view and per index build.
    pub history_limit: usize,
    /// Wrap raster glyphs in 24-bit color escapes.
    pub ascii_color: bool,
    /// Column count of rendered rasters.
    pub ascii_width: u32,
    /// Max conversations offered in the selection menu.
    pub dialog_limit: usize,
    /// Attachment cache directory.
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            auto_download_image: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            ascii_color: true,
            ascii_width: DEFAULT_ASCII_WIDTH,
            dialog_limit: DEFAULT_DIALOG_LIMIT,
            download_dir: cwd.join("downloads"),
        }
    }
}

/// On-disk representation. Every key is optional so a partial file only
/// overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub auto_download_image: Option<bool>,
    pub history_limit: Option<usize>,
    pub ascii_color: Option<bool>,
    pub ascii_width: Option<u32>,
    pub dialog_limit: Option<usize>,
    pub download_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub(crate) fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply(self, config: &mut Config) {
        if let Some(v) = self.auto_download_image {
            config.auto_download_image = v;
        }
        if let Some(v) = self.history_limit {
            config.history_limit = v;
        }
        if let Some(v) = self.ascii_color {
            config.ascii_color = v;
        }
        if let Some(v) = self.ascii_width {
            config.ascii_width = v;
        }
        if let Some(v) = self.dialog_limit {
            config.dialog_limit = v;
        }
        if let Some(v) = self.download_dir {
            config.download_dir = v;
        }
    }
}

impl Config {
    pub(crate) fn config_dir() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(APP_DIR))
    }

    pub(crate) fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    pub(crate) fn cache_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".cache").join(APP_DIR))
    }

    /// Load configuration from `path` (or the default location) and the
    /// process environment.
    ///
    /// A missing file is not an error; a malformed one is.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let path = path.map(Path::to_path_buf).or_else(Self::config_path);
        if let Some(path) = path
            && path.exists()
        {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let file = ConfigFile::parse(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            file.apply(&mut config);
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment-style overrides using `lookup` to read variables.
    pub(crate) fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AUTO_DOWNLOAD_IMAGE") {
            self.auto_download_image = parse_bool("AUTO_DOWNLOAD_IMAGE", &v)?;
        }
        if let Some(v) = lookup("HISTORY_LIMIT") {
            self.history_limit = parse_number("HISTORY_LIMIT", &v)?;
        }
        if let Some(v) = lookup("ASCII_COLOR") {
            self.ascii_color = parse_bool("ASCII_COLOR", &v)?;
        }
        if let Some(v) = lookup("ASCII_WIDTH") {
            self.ascii_width = parse_number("ASCII_WIDTH", &v)?;
        }
        if let Some(v) = lookup("DIALOG_LIMIT") {
            self.dialog_limit = parse_number("DIALOG_LIMIT", &v)?;
        }
        if let Some(v) = lookup("DOWNLOAD_DIR")
            && !v.trim().is_empty()
        {
            self.download_dir = PathBuf::from(v.trim());
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}: expected a number, got '{}'", value.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.auto_download_image);
        assert!(config.ascii_color);
        assert_eq!(config.history_limit, 30);
        assert_eq!(config.ascii_width, 30);
        assert_eq!(config.dialog_limit, 20);
        assert!(config.download_dir.ends_with("downloads"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("AUTO_DOWNLOAD_IMAGE", "False"),
                ("HISTORY_LIMIT", " 50 "),
                ("ASCII_COLOR", "off"),
                ("DOWNLOAD_DIR", "/tmp/cache"),
            ]))
            .unwrap();
        assert!(!config.auto_download_image);
        assert!(!config.ascii_color);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.download_dir, PathBuf::from("/tmp/cache"));
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("ASCII_COLOR", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("ASCII_COLOR"));

        let err = config
            .apply_env(env(&[("HISTORY_LIMIT", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("HISTORY_LIMIT"));
    }

    #[test]
    fn test_file_partial_override() {
        let file = ConfigFile::parse("history_limit = 5\nascii_width = 40\n").unwrap();
        let mut config = Config::default();
        file.apply(&mut config);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.ascii_width, 40);
        assert!(config.auto_download_image);
    }

    #[test]
    fn test_file_unknown_key_is_error() {
        assert!(ConfigFile::parse("colour = true\n").is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "dialog_limit = 3\nauto_download_image = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.dialog_limit, 3);
        assert!(!config.auto_download_image);
    }
}
