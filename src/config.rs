use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Saved catalog response to read instead of calling the API.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
    /// Extra query parameters sent with every request.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
            limit: default_limit(),
            fixture: None,
            params: BTreeMap::new(),
        }
    }
}

fn default_base_url() -> String {
    "https://gateway.marvel.com/v1/public".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_limit() -> usize {
    50
}

/// Largest page the catalog API serves.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    #[serde(default = "default_display_cap")]
    pub display_cap: usize,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            display_cap: default_display_cap(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_display_cap() -> usize {
    100
}
fn default_placeholder() -> String {
    "—".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;

    // Relative fixture paths are relative to the config file.
    if let Some(ref fixture) = config.catalog.fixture {
        if fixture.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.catalog.fixture = Some(base.join(fixture));
        }
    }

    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate catalog
    if config.catalog.base_url.trim().is_empty() {
        bail!("catalog.base_url must not be empty");
    }
    if config.catalog.timeout_secs == 0 {
        bail!("catalog.timeout_secs must be > 0");
    }
    if !(1..=MAX_LIMIT).contains(&config.catalog.limit) {
        bail!("catalog.limit must be in [1, {}]", MAX_LIMIT);
    }

    // Validate view
    if config.view.display_cap == 0 {
        bail!("view.display_cap must be > 0");
    }

    Ok(config)
}

/// Commented example written by `mdash init`.
pub const EXAMPLE_CONFIG: &str = r#"# mdash configuration

[catalog]
base_url = "https://gateway.marvel.com/v1/public"
# Environment variable holding the public API key (sent as `apikey`).
# api_key_env = "MARVEL_API_KEY"
timeout_secs = 30
limit = 50
# Read a saved response instead of calling the API.
# fixture = "characters.json"

# Extra query parameters sent with every request.
# [catalog.params]
# ts = "1"
# hash = "..."

[view]
display_cap = 100
placeholder = "—"
"#;

/// Write [`EXAMPLE_CONFIG`] to `path`, refusing to overwrite.
pub fn scaffold_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.catalog.limit, 50);
        assert_eq!(config.catalog.timeout_secs, 30);
        assert_eq!(config.view.display_cap, 100);
        assert_eq!(config.view.placeholder, "—");
        assert!(config.catalog.fixture.is_none());
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse_config(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.catalog.base_url, "https://gateway.marvel.com/v1/public");
        assert!(config.catalog.api_key_env.is_none());
    }

    #[test]
    fn test_params_table() {
        let config = parse_config(
            r#"
[catalog.params]
ts = "1"
hash = "abc"
"#,
        )
        .unwrap();
        assert_eq!(config.catalog.params.get("ts").map(String::as_str), Some("1"));
        assert_eq!(config.catalog.params.len(), 2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(parse_config("[catalog]\nlimit = 0").is_err());
        assert!(parse_config("[catalog]\nlimit = 101").is_err());
        assert!(parse_config("[catalog]\ntimeout_secs = 0").is_err());
        assert!(parse_config("[catalog]\nbase_url = \" \"").is_err());
        assert!(parse_config("[view]\ndisplay_cap = 0").is_err());
    }

    #[test]
    fn test_relative_fixture_resolved_against_config_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mdash.toml");
        std::fs::write(&path, "[catalog]\nfixture = \"data/characters.json\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.catalog.fixture,
            Some(tmp.path().join("data/characters.json"))
        );
    }

    #[test]
    fn test_scaffold_refuses_overwrite() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config").join("mdash.toml");
        scaffold_config(&path).unwrap();
        assert!(load_config(&path).is_ok());
        assert!(scaffold_config(&path).is_err());
    }
}
