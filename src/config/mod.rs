/// Configuration system for smartsni-panel.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::PanelConfig::default()`]
/// 2. **User global config**: `~/.smartsni/config.toml`
/// 3. **Project local config**: `.smartsni.toml` in the current directory
/// 4. **Environment variables**: `SMARTSNI_*` overrides (highest precedence)
///
/// File layers merge key by key: a project file that sets only `[poll]`
/// keeps the global `panel.base_url`. Keys no file sets fall back to
/// built-in defaults.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::PanelConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> PanelConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_file);
    let mut config = resolve_layers(layers);

    apply_env_overrides(&mut config);

    config
}

/// Merge file layers in order and deserialize the result over defaults.
fn resolve_layers(layers: impl IntoIterator<Item = toml::Value>) -> PanelConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for layer in layers {
        merge_values(&mut merged, layer);
    }
    match merged.try_into::<PanelConfig>() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config layers do not combine, using defaults");
            PanelConfig::default()
        }
    }
}

/// Overlay `overlay` onto `base`, recursing into tables.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Read a TOML config file as a raw table. Missing files yield `None`;
/// malformed ones are logged and skipped.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let parsed = content
        .parse::<toml::Table>()
        .map_err(|e| e.to_string())
        .and_then(|table| {
            let value = toml::Value::Table(table);
            // A layer must make sense on its own before it is merged.
            value
                .clone()
                .try_into::<PanelConfig>()
                .map(|_| value)
                .map_err(|e| e.to_string())
        });
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".smartsni").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".smartsni.toml"))
}

/// Path to the global config file, for display and `config init`.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path to the project config file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `SMARTSNI_PANEL_URL`: panel base URL
/// - `SMARTSNI_PANEL_TIMEOUT_MS`: request timeout
/// - `SMARTSNI_POLL_INTERVAL_MS`: dashboard refresh interval
/// - `SMARTSNI_SESSION_PATH`: session state file
/// - `SMARTSNI_LOG_LEVEL`: diagnostic log level
/// - `SMARTSNI_AUDIT`: audit log on/off (`1`/`true`/`yes`/`on`)
pub fn apply_env_overrides(config: &mut PanelConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut PanelConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("SMARTSNI_PANEL_URL")
        && !val.is_empty()
    {
        config.panel.base_url = val;
    }
    if let Some(val) = var("SMARTSNI_PANEL_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.panel.timeout_ms = ms;
    }
    if let Some(val) = var("SMARTSNI_POLL_INTERVAL_MS")
        && let Ok(ms) = val.parse::<u64>()
        && ms > 0
    {
        config.poll.interval_ms = ms;
    }
    if let Some(val) = var("SMARTSNI_SESSION_PATH")
        && !val.is_empty()
    {
        config.session.path = val;
    }
    if let Some(val) = var("SMARTSNI_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
    if let Some(val) = var("SMARTSNI_AUDIT") {
        config.logging.audit_enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.smartsni/config.toml`.
///
/// Fails if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.smartsni/ directory")?;
    }

    fs::write(&path, PanelConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `panel.base_url`) in the global config.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&PanelConfig::default())
            .context("failed to serialize default config")?
    };

    let updated = set_value_in_toml(&content, key, value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Apply a dotted-key update to a TOML document and return the new text.
///
/// The result must still deserialize as a [`PanelConfig`].
fn set_value_in_toml(content: &str, key: &str, value: &str) -> Result<String> {
    let mut root: toml::Value =
        toml::from_str(content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    toml::from_str::<PanelConfig>(&output)
        .with_context(|| format!("invalid value for '{key}': '{value}'"))?;
    Ok(output)
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("config keys look like 'section.field', got '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];
    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a table above '{leaf}' in '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn env_overrides_replace_fields() {
        let mut config = PanelConfig::default();
        apply_overrides(
            &mut config,
            vars(&[
                ("SMARTSNI_PANEL_URL", "https://panel.example.com"),
                ("SMARTSNI_PANEL_TIMEOUT_MS", "2500"),
                ("SMARTSNI_POLL_INTERVAL_MS", "1000"),
                ("SMARTSNI_SESSION_PATH", "/tmp/s.json"),
                ("SMARTSNI_LOG_LEVEL", "debug"),
                ("SMARTSNI_AUDIT", "off"),
            ]),
        );
        assert_eq!(config.panel.base_url, "https://panel.example.com");
        assert_eq!(config.panel.timeout_ms, 2500);
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.session.path, "/tmp/s.json");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.audit_enabled);
    }

    #[test]
    fn env_overrides_ignore_unparseable_numbers() {
        let mut config = PanelConfig::default();
        apply_overrides(
            &mut config,
            vars(&[
                ("SMARTSNI_PANEL_TIMEOUT_MS", "soon"),
                ("SMARTSNI_POLL_INTERVAL_MS", "0"),
            ]),
        );
        assert_eq!(config.panel.timeout_ms, schema::DEFAULT_TIMEOUT_MS);
        assert_eq!(config.poll.interval_ms, schema::DEFAULT_POLL_INTERVAL_MS);
    }

    fn layer(text: &str) -> toml::Value {
        toml::Value::Table(text.parse::<toml::Table>().unwrap())
    }

    #[test]
    fn project_layer_keeps_unset_global_keys() {
        let global = layer(
            "[panel]\nbase_url = \"https://global.example\"\ntimeout_ms = 3000\n",
        );
        let project = layer("[poll]\ninterval_ms = 1500\n");

        let config = resolve_layers([global, project]);

        assert_eq!(config.panel.base_url, "https://global.example");
        assert_eq!(config.panel.timeout_ms, 3000);
        assert_eq!(config.poll.interval_ms, 1500);
        assert_eq!(config.session.path, PanelConfig::default().session.path);
    }

    #[test]
    fn later_layer_wins_per_key() {
        let global = layer(
            "[panel]\nbase_url = \"https://global.example\"\ntimeout_ms = 3000\n",
        );
        let project = layer("[panel]\nbase_url = \"https://project.example\"\n");

        let config = resolve_layers([global, project]);

        assert_eq!(config.panel.base_url, "https://project.example");
        assert_eq!(config.panel.timeout_ms, 3000);
    }

    #[test]
    fn no_layers_means_defaults() {
        let config = resolve_layers([]);
        assert_eq!(config.panel.base_url, PanelConfig::default().panel.base_url);
    }

    #[test]
    fn set_value_updates_string_and_integer() {
        let base = PanelConfig::default_toml();
        let updated = set_value_in_toml(&base, "panel.base_url", "https://x.example").unwrap();
        let updated = set_value_in_toml(&updated, "poll.interval_ms", "2000").unwrap();
        let config: PanelConfig = toml::from_str(&updated).unwrap();
        assert_eq!(config.panel.base_url, "https://x.example");
        assert_eq!(config.poll.interval_ms, 2000);
    }

    #[test]
    fn set_value_updates_bool() {
        let base = PanelConfig::default_toml();
        let updated = set_value_in_toml(&base, "logging.audit_enabled", "no").unwrap();
        let config: PanelConfig = toml::from_str(&updated).unwrap();
        assert!(!config.logging.audit_enabled);
    }

    #[test]
    fn set_value_rejects_unknown_keys() {
        let base = PanelConfig::default_toml();
        assert!(set_value_in_toml(&base, "nonexistent.key", "v").is_err());
        assert!(set_value_in_toml(&base, "panel.nope", "v").is_err());
        assert!(set_value_in_toml(&base, "panel", "v").is_err());
    }

    #[test]
    fn set_value_rejects_bad_integer() {
        let base = PanelConfig::default_toml();
        assert!(set_value_in_toml(&base, "panel.timeout_ms", "fast").is_err());
    }
}
