//! Persistent key-value settings.
//!
//! Settings live in a JSON object with camelCase keys. The store is read
//! once when a command starts and written only by prompt-library edits.

use crate::client::DEFAULT_BASE_URL;
use crate::config::DEFAULT_MODEL;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

const DEFAULT_FILE_TYPE: &str = ".md";
const SETTINGS_DIR: &str = "prompt-mirror";
const SETTINGS_FILE: &str = "settings.json";

/// All persisted settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Prompt library, in insertion order
    pub system_prompts: Vec<String>,

    /// Only files whose name ends with this suffix are processed
    pub file_type: String,

    /// Credential for the completion endpoint
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Cap the walk at a couple of files
    pub test_run: bool,

    /// Base-name globs copied verbatim
    pub file_copy_patterns: Vec<String>,

    /// Endpoint root for OpenAI-compatible servers
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_prompts: Vec::new(),
            file_type: DEFAULT_FILE_TYPE.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            test_run: false,
            file_copy_patterns: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Read/write access to [`Settings`].
pub trait SettingsStore {
    /// Loads the current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or parsed.
    fn load(&self) -> Result<Settings>;

    /// Replaces the stored settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, settings: &Settings) -> Result<()>;

    /// Appends `prompt` to the prompt library in one read-modify-write.
    ///
    /// # Errors
    ///
    /// Propagates load and save failures.
    fn append_prompt(&self, prompt: &str) -> Result<()> {
        let mut settings = self.load()?;
        settings.system_prompts.push(prompt.to_string());
        self.save(&settings)
    }
}

/// Settings stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform config directory,
    /// e.g. `~/.config/prompt-mirror/settings.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::config("Could not determine the user config directory"))?;
        Ok(Self::new(base.join(SETTINGS_DIR).join(SETTINGS_FILE)))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("No settings at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::settings(&self.path, e.to_string()))
    }

    /// Writes through a temporary file and renames it over the target.
    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::settings(&self.path, e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;
        temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
        drop(temp_file);

        fs::rename(&temp_path, &self.path).map_err(|e| Error::io(&self.path, e))?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Settings>,
}

impl MemoryStore {
    /// Creates a store holding `settings`.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Settings> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .map_err(|_| Error::config("settings lock poisoned"))
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|_| Error::config("settings lock poisoned"))?;
        *guard = settings.clone();
        Ok(())
    }
}
