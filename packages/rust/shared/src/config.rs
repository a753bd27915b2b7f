//! Application configuration for ghostwriter.
//!
//! User config lives at `~/.ghostwriter/ghostwriter.toml`.
//! CLI flags (and their env fallbacks) override the selected profile, which
//! overrides the legacy single-instance `url`/`key` pair.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GhostwriterError, Result};
use crate::types::Endpoint;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ghostwriter.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ghostwriter";

/// Profile name used when migrating a legacy single-instance config.
pub const LEGACY_PROFILE_NAME: &str = "default";

// ---------------------------------------------------------------------------
// Config structs (matching ghostwriter.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Profile used when none is selected explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Legacy single-instance site URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Legacy single-instance admin key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Named site profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Page size used when walking every page of a listing.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_page_size() -> u32 {
    100
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[profiles.<name>]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Site URL.
    pub url: String,
    /// Admin API key (`<id>:<hexsecret>`).
    pub key: String,
}

// ---------------------------------------------------------------------------
// Endpoint resolution (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Values supplied on the command line (already merged with env fallbacks).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub key: Option<String>,
    pub profile: Option<String>,
}

impl AppConfig {
    /// Resolve the endpoint to talk to.
    ///
    /// Priority: overrides > selected profile > legacy `url`/`key`.
    pub fn resolve_endpoint(&self, overrides: &Overrides) -> Result<Endpoint> {
        let mut url: Option<String> = None;
        let mut key: Option<String> = None;

        let profile_name = overrides
            .profile
            .as_deref()
            .or(self.default_profile.as_deref());

        if let Some(name) = profile_name {
            match self.profiles.get(name) {
                Some(profile) => {
                    url = Some(profile.url.clone());
                    key = Some(profile.key.clone());
                }
                None if overrides.profile.is_some() => {
                    return Err(GhostwriterError::config(format!(
                        "profile '{name}' not found (run 'ghostwriter profiles' to list profiles)"
                    )));
                }
                None => {
                    tracing::debug!(profile = name, "default profile missing, ignoring");
                }
            }
        }

        if url.is_none() {
            url = non_empty(self.url.as_deref());
            key = non_empty(self.key.as_deref());
        }

        if let Some(u) = non_empty(overrides.url.as_deref()) {
            url = Some(u);
        }
        if let Some(k) = non_empty(overrides.key.as_deref()) {
            key = Some(k);
        }

        let url = url.ok_or_else(|| {
            GhostwriterError::config(
                "ghost URL not configured (use 'ghostwriter login', set GHOST_URL, or use --url)",
            )
        })?;
        let key = key.ok_or_else(|| {
            GhostwriterError::config(
                "ghost admin key not configured (use 'ghostwriter login', set GHOST_ADMIN_KEY, or use --key)",
            )
        })?;

        Endpoint::new(&url, key)
    }

    /// Add or replace a profile.
    ///
    /// A legacy single-instance config is first migrated into a
    /// [`LEGACY_PROFILE_NAME`] profile. The first profile becomes the default.
    pub fn upsert_profile(&mut self, name: &str, profile: Profile, set_default: bool) {
        if self.profiles.is_empty() {
            if let (Some(url), Some(key)) = (self.url.take(), self.key.take()) {
                self.profiles
                    .insert(LEGACY_PROFILE_NAME.to_string(), Profile { url, key });
                self.default_profile
                    .get_or_insert_with(|| LEGACY_PROFILE_NAME.to_string());
            }
        }

        self.profiles.insert(name.to_string(), profile);

        if set_default || self.default_profile.is_none() {
            self.default_profile = Some(name.to_string());
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ghostwriter/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GhostwriterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ghostwriter/ghostwriter.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_file_path()?)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| GhostwriterError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        GhostwriterError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write the config to a specific file path, creating parent directories.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| GhostwriterError::io(dir, e))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| GhostwriterError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| GhostwriterError::io(path, e))?;
    restrict_permissions(path)?;
    tracing::info!(?path, "wrote config file");

    Ok(())
}

/// The file holds admin keys; keep it owner-only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| GhostwriterError::io(path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Save (or replace) a named profile in the config file at `path`.
///
/// A file that no longer parses is moved to `<name>.bak` and replaced, so
/// logging in again can always repair a broken config.
pub fn save_profile_to(path: &Path, name: &str, profile: Profile, set_default: bool) -> Result<()> {
    let mut config = match load_config_from(path) {
        Ok(config) => config,
        Err(GhostwriterError::Config { message }) => {
            let backup = backup_path(path);
            std::fs::rename(path, &backup).map_err(|e| GhostwriterError::io(path, e))?;
            tracing::warn!(?backup, %message, "moved unreadable config aside");
            AppConfig::default()
        }
        Err(e) => return Err(e),
    };
    config.upsert_profile(name, profile, set_default);
    save_config_to(&config, path)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Save (or replace) a named profile in the user's config file.
pub fn save_profile(name: &str, profile: Profile, set_default: bool) -> Result<PathBuf> {
    let path = config_file_path()?;
    save_profile_to(&path, name, profile, set_default)?;
    Ok(path)
}

/// Configured profile names (sorted) and the default profile, if any.
pub fn list_profiles(config: &AppConfig) -> (Vec<String>, Option<String>) {
    (
        config.profiles.keys().cloned().collect(),
        config.default_profile.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "6489a1b2c3d4e5f6a7b8c9d0:deadbeef";

    fn profile(url: &str) -> Profile {
        Profile {
            url: url.into(),
            key: KEY.into(),
        }
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("page_size"));
        assert!(toml_str.contains("timeout_secs"));
    }

    #[test]
    fn config_with_profiles() {
        let toml_str = r#"
default_profile = "blog"

[defaults]
page_size = 50

[profiles.blog]
url = "https://blog.example.com"
key = "abc:deadbeef"

[profiles.work]
url = "https://work.example.com/"
key = "def:cafebabe"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.defaults.page_size, 50);
        assert_eq!(config.defaults.timeout_secs, 30);

        let endpoint = config.resolve_endpoint(&Overrides::default()).unwrap();
        assert_eq!(endpoint.base_url(), "https://blog.example.com");

        let endpoint = config
            .resolve_endpoint(&Overrides {
                profile: Some("work".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(endpoint.base_url(), "https://work.example.com");
        assert_eq!(endpoint.admin_key(), "def:cafebabe");
    }

    #[test]
    fn overrides_beat_profile() {
        let mut config = AppConfig::default();
        config.upsert_profile("blog", profile("https://blog.example.com"), false);

        let endpoint = config
            .resolve_endpoint(&Overrides {
                url: Some("https://other.example.com".into()),
                key: None,
                profile: None,
            })
            .unwrap();
        assert_eq!(endpoint.base_url(), "https://other.example.com");
        assert_eq!(endpoint.admin_key(), KEY);
    }

    #[test]
    fn legacy_fields_are_a_fallback() {
        let config: AppConfig =
            toml::from_str("url = \"https://legacy.example.com\"\nkey = \"abc:00ff\"\n").unwrap();
        let endpoint = config.resolve_endpoint(&Overrides::default()).unwrap();
        assert_eq!(endpoint.base_url(), "https://legacy.example.com");
    }

    #[test]
    fn unknown_explicit_profile_is_an_error() {
        let config = AppConfig::default();
        let err = config
            .resolve_endpoint(&Overrides {
                profile: Some("missing".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("profile 'missing' not found"));
    }

    #[test]
    fn missing_url_names_remedies() {
        let err = AppConfig::default()
            .resolve_endpoint(&Overrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("GHOST_URL"));

        let err = AppConfig::default()
            .resolve_endpoint(&Overrides {
                url: Some("https://blog.example.com".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("GHOST_ADMIN_KEY"));
    }

    #[test]
    fn upsert_migrates_legacy_config() {
        let mut config = AppConfig {
            url: Some("https://legacy.example.com".into()),
            key: Some("abc:00ff".into()),
            ..Default::default()
        };
        config.upsert_profile("work", profile("https://work.example.com"), false);

        assert!(config.url.is_none());
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.default_profile.as_deref(), Some(LEGACY_PROFILE_NAME));

        config.upsert_profile("work", profile("https://work.example.com"), true);
        assert_eq!(config.default_profile.as_deref(), Some("work"));
    }

    #[test]
    fn save_and_reload_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        save_profile_to(&path, "blog", profile("https://blog.example.com"), false).unwrap();
        save_profile_to(&path, "work", profile("https://work.example.com"), false).unwrap();

        let config = load_config_from(&path).unwrap();
        let (names, default) = list_profiles(&config);
        assert_eq!(names, vec!["blog".to_string(), "work".to_string()]);
        assert_eq!(default.as_deref(), Some("blog"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "profiles = 7").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, GhostwriterError::Config { .. }));
    }

    #[test]
    fn saving_over_malformed_file_keeps_a_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "profiles = 7").unwrap();

        save_profile_to(&path, "blog", profile("https://blog.example.com"), false).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("blog"));
        let backup = dir.path().join(format!("{CONFIG_FILE_NAME}.bak"));
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "profiles = 7");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.profiles.is_empty());
        assert_eq!(config.defaults.page_size, 100);
    }
}
