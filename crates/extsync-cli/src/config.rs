use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use extsync_core::MatchKey;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

pub const VALID_KEYS: &str = "api_key, state, match_key, include_config_on_deploy, log_level, format";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub api_key: Option<String>,
    pub state: Option<PathBuf>,
    pub match_key: Option<MatchKey>,
    pub include_config_on_deploy: Option<bool>,
    pub log_level: Option<String>,
    pub format: Option<String>,
}

impl ProfileConfig {
    /// Set `key` from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_key" => self.api_key = Some(value.to_string()),
            "state" => self.state = Some(PathBuf::from(value)),
            "match_key" => {
                self.match_key = Some(value.parse().map_err(anyhow::Error::msg)?);
            }
            "include_config_on_deploy" => {
                self.include_config_on_deploy = Some(
                    value
                        .parse()
                        .with_context(|| format!("Expected true or false, got '{value}'"))?,
                );
            }
            "log_level" => self.log_level = Some(value.to_string()),
            "format" => {
                value.parse::<OutputFormat>().map_err(anyhow::Error::msg)?;
                self.format = Some(value.to_ascii_lowercase());
            }
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: {VALID_KEYS}"),
        }
        Ok(())
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format.as_deref().and_then(|f| f.parse().ok())
    }
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".extsync");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(cfg)
}

pub fn save_profile_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all_from(path)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let all = load_all_from(&config_path()?)?;
    Ok(all.get(profile).cloned().unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_to(&config_path()?, profile, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_known_keys() {
        let mut cfg = ProfileConfig::default();
        cfg.set("api_key", "appId").unwrap();
        cfg.set("match_key", "id").unwrap();
        cfg.set("include_config_on_deploy", "true").unwrap();
        cfg.set("format", "JSON").unwrap();

        assert_eq!(cfg.api_key.as_deref(), Some("appId"));
        assert_eq!(cfg.match_key, Some(MatchKey::Id));
        assert_eq!(cfg.include_config_on_deploy, Some(true));
        assert_eq!(cfg.output_format(), Some(OutputFormat::Json));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut cfg = ProfileConfig::default();
        assert!(cfg.set("server", "x").is_err());
        assert!(cfg.set("match_key", "handle").is_err());
        assert!(cfg.set("include_config_on_deploy", "maybe").is_err());
        assert!(cfg.set("format", "yaml").is_err());
    }

    #[test]
    fn test_profiles_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(load_all_from(&path).unwrap().is_empty());

        let mut staging = ProfileConfig::default();
        staging.set("api_key", "staging-key").unwrap();
        staging.set("state", "/tmp/state.json").unwrap();
        save_profile_to(&path, "staging", &staging).unwrap();

        let mut default = ProfileConfig::default();
        default.set("log_level", "debug").unwrap();
        save_profile_to(&path, "default", &default).unwrap();

        let all = load_all_from(&path).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["staging"], staging);
        assert_eq!(all["default"].log_level.as_deref(), Some("debug"));
    }
}
