use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::decode::{DEFAULT_STRUCTURED_LIMIT, DEFAULT_WORKERS};
use crate::view::SidePanelMode;

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfloupe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Number of stream decode worker threads per document
    #[serde(default = "default_decode_workers")]
    pub decode_workers: usize,

    /// Largest stream body (bytes) handed to the structured decoder
    #[serde(default = "default_structured_decode_limit")]
    pub structured_decode_limit: usize,

    /// Side panel opened when a document is loaded
    #[serde(default)]
    pub default_side_panel: Option<SidePanelMode>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_decode_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_structured_decode_limit() -> usize {
    DEFAULT_STRUCTURED_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            decode_workers: default_decode_workers(),
            structured_decode_limit: default_structured_decode_limit(),
            default_side_panel: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Read settings from `path`.
    ///
    /// A missing or unreadable file yields defaults; older versions are
    /// migrated and written back.
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if path.exists() {
                    error!("Failed to read settings file {path:?}: {e}");
                } else {
                    debug!("No settings file at {path:?}, using defaults");
                }
                return Self::default();
            }
        };

        match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");
                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Self::default()
            }
        }
    }

    /// Log level filter, `Info` if the configured name is unknown
    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            LevelFilter::Info
        })
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

#[must_use]
pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the default location, creating the file if missing
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    let settings = Settings::load_from(path);
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(SETTINGS_HEADER);
    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!("decode_workers: {}\n", settings.decode_workers));
    content.push_str(&format!(
        "structured_decode_limit: {}\n",
        settings.structured_decode_limit
    ));
    match settings.default_side_panel {
        Some(mode) => {
            let name = match mode {
                SidePanelMode::Info => "info",
                SidePanelMode::Outlines => "outlines",
                SidePanelMode::Structure => "structure",
                SidePanelMode::Signatures => "signatures",
            };
            content.push_str(&format!("default_side_panel: {name}\n"));
        }
        None => content.push_str("# default_side_panel: structure\n"),
    }
    content.push_str(&format!("log_level: \"{}\"\n", settings.log_level));

    content
}

const SETTINGS_HEADER: &str = r"# pdfloupe settings
#
# decode_workers           threads decoding stream objects per document
# structured_decode_limit  largest signature body (bytes) parsed as DER
# default_side_panel       info | outlines | structure | signatures
# log_level                off | error | warn | info | debug | trace

";

// Public API for accessing settings

#[must_use]
pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}
