//! Persistent settings
//!
//! The settings live in a YAML file. On load the file is migrated to the
//! current schema (saving after every step), then read through the `config`
//! crate so that `METECLI_` environment variables can override single values,
//! e.g. `METECLI_CONNECTION__UID=3`. Only the file contents are written back;
//! environment overrides never end up on disk.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use common::{ApiVersion, MeteError, MeteResult};
use connection::{ConnectionSettings, SettingsStore};

/// Current schema version
pub const SCHEMA_VERSION: u64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u64,
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSection {
    pub base_url: Option<String>,
    pub api_version: Option<ApiVersion>,
    /// The account `metecli account` acts on
    pub uid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySection {
    pub log_level: String,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            log_level: "warning".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            connection: ConnectionSection::default(),
            display: DisplaySection::default(),
        }
    }
}

impl Settings {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            base_url: self.connection.base_url.clone(),
            api_version: self.connection.api_version,
        }
    }
}

/// `$XDG_CONFIG_HOME/metecli/config.yaml`, falling back to `~/.config`
pub fn default_path() -> MeteResult<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .ok_or_else(|| {
                MeteError::config("Neither XDG_CONFIG_HOME nor HOME is set; use --config")
            })?,
    };
    Ok(base.join("metecli").join("config.yaml"))
}

/// Settings file on disk plus the effective values
#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    /// Contents of the file, as saved
    stored: Value,
    /// File contents with environment overrides applied
    effective: Settings,
}

impl SettingsFile {
    /// Open the settings at `path`, creating and migrating as needed
    pub fn open(path: impl Into<PathBuf>) -> MeteResult<Self> {
        let path = path.into();
        debug!("Using config file at: {}", path.display());

        let stored = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            let value: Value = serde_yaml::from_str(&text)
                .map_err(|e| MeteError::config(format!("{} is not valid YAML: {}", path.display(), e)))?;
            match value {
                // an empty file is a fresh start
                Value::Null => defaults_value()?,
                other => other,
            }
        } else {
            info!("Config file doesn't exist yet. Creating {}.", path.display());
            let value = defaults_value()?;
            write_value(&path, &value)?;
            value
        };

        let mut file = Self {
            path,
            stored,
            effective: Settings::default(),
        };
        file.migrate()?;
        file.reload()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.effective
    }

    /// The file contents as YAML
    pub fn stored(&self) -> &Value {
        &self.stored
    }

    fn save(&self) -> MeteResult<()> {
        debug!("Saving config...");
        write_value(&self.path, &self.stored)
    }

    /// Recompute the effective settings from the file and the environment
    fn reload(&mut self) -> MeteResult<()> {
        let yaml = serde_yaml::to_string(&self.stored)
            .map_err(|e| MeteError::config(format!("Cannot serialize settings: {}", e)))?;
        let config = Config::builder()
            .add_source(File::from_str(&yaml, FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("METECLI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| MeteError::config(format!("Cannot load settings: {}", e)))?;
        self.effective = config
            .try_deserialize()
            .map_err(|e| MeteError::config(format!("Invalid settings in {}: {}", self.path.display(), e)))?;
        Ok(())
    }

    fn version(&self) -> Option<u64> {
        self.stored.get("version").and_then(Value::as_u64)
    }

    fn migrate(&mut self) -> MeteResult<()> {
        if !self.stored.is_mapping() {
            return Err(MeteError::config(format!(
                "{} does not contain a settings mapping",
                self.path.display()
            )));
        }
        if self.version().is_none() {
            info!("Configuration doesn't have a version. Assuming v1.");
            set_path(&mut self.stored, &["version"], Value::from(1))?;
            self.save()?;
        }
        if self.version() == Some(1) {
            info!("Migrating to v2: Adding display.log_level.");
            set_path(&mut self.stored, &["display", "log_level"], Value::from("warning"))?;
            set_path(&mut self.stored, &["version"], Value::from(2))?;
            self.save()?;
        }
        if self.version() == Some(2) {
            info!("Migrating to v3: Adding 'uid' and 'base_url' to connection if they don't exist.");
            for key in ["base_url", "uid"] {
                if lookup(&self.stored, &["connection", key]).is_none() {
                    set_path(&mut self.stored, &["connection", key], Value::Null)?;
                }
            }
            set_path(&mut self.stored, &["version"], Value::from(3))?;
            self.save()?;
        }
        if self.version() == Some(3) {
            info!("Migrating to v4: Adding connection.api_version.");
            let detected = lookup(&self.stored, &["connection", "base_url"])
                .and_then(Value::as_str)
                .map(|url| Value::from(ApiVersion::detect(url).as_str()))
                .unwrap_or(Value::Null);
            set_path(&mut self.stored, &["connection", "api_version"], detected)?;
            set_path(&mut self.stored, &["version"], Value::from(4))?;
            self.save()?;
        }

        match self.version() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(MeteError::config(format!(
                "Settings version {} is not supported by this metecli (expected {})",
                other, SCHEMA_VERSION
            ))),
            None => Err(MeteError::config("Settings version is not a number")),
        }
    }

    /// Value at a dotted key such as `connection.base_url`
    pub fn get(&self, key: &str) -> MeteResult<&Value> {
        let parts = split_key(key)?;
        lookup(&self.stored, &parts)
            .ok_or_else(|| MeteError::config(format!("This configuration key doesn't exist: {}", key)))
    }

    /// Set an existing leaf key, parsing `raw` as a YAML scalar
    ///
    /// Values that would make the settings invalid are rejected and nothing
    /// is saved.
    pub fn set(&mut self, key: &str, raw: &str) -> MeteResult<()> {
        let parts = split_key(key)?;
        match lookup(&self.stored, &parts) {
            None => {
                return Err(MeteError::config(format!(
                    "This configuration key doesn't exist: {}",
                    key
                )));
            }
            Some(Value::Mapping(_)) => {
                return Err(MeteError::config(format!(
                    "The key '{}' is no leaf. It can't be set to a value.",
                    key
                )));
            }
            Some(_) => {}
        }

        let value: Value = serde_yaml::from_str(raw).unwrap_or_else(|_| Value::from(raw));
        let mut candidate = self.stored.clone();
        set_path(&mut candidate, &parts, value)?;
        serde_yaml::from_value::<Settings>(candidate.clone())
            .map_err(|e| MeteError::config(format!("Invalid value for {}: {}", key, e)))?;

        self.stored = candidate;
        self.save()?;
        self.reload()?;
        info!("Set {} to '{}'.", key, raw);
        Ok(())
    }
}

impl SettingsStore for SettingsFile {
    fn save_connection(&mut self, base_url: &str, version: ApiVersion) -> MeteResult<()> {
        set_path(&mut self.stored, &["connection", "base_url"], Value::from(base_url))?;
        set_path(
            &mut self.stored,
            &["connection", "api_version"],
            Value::from(version.as_str()),
        )?;
        self.save()?;
        self.reload()?;
        info!("Saved connection {} (API version '{}').", base_url, version);
        Ok(())
    }
}

fn defaults_value() -> MeteResult<Value> {
    serde_yaml::to_value(Settings::default())
        .map_err(|e| MeteError::config(format!("Cannot serialize default settings: {}", e)))
}

fn write_value(path: &Path, value: &Value) -> MeteResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
    }
    let text = serde_yaml::to_string(value)
        .map_err(|e| MeteError::config(format!("Cannot serialize settings: {}", e)))?;
    fs::write(path, text).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, error: std::io::Error) -> MeteError {
    MeteError::config(format!("{}: {}", path.display(), error))
}

fn split_key(key: &str) -> MeteResult<Vec<&str>> {
    let parts: Vec<&str> = key.split('.').filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        return Err(MeteError::config("Empty configuration key"));
    }
    Ok(parts)
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, part| current.get(*part))
}

/// Set `path` to `new`, creating intermediate mappings
fn set_path(root: &mut Value, path: &[&str], new: Value) -> MeteResult<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(MeteError::config("Empty configuration key"));
    };
    let mut current = root;
    for part in parents {
        let mapping = current
            .as_mapping_mut()
            .ok_or_else(|| MeteError::config(format!("'{}' is not a section", part)))?;
        current = mapping
            .entry(Value::from(*part))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if current.is_null() {
            *current = Value::Mapping(Mapping::new());
        }
    }
    current
        .as_mapping_mut()
        .ok_or_else(|| MeteError::config(format!("'{}' has no parent section", last)))?
        .insert(Value::from(*last), new);
    Ok(())
}
