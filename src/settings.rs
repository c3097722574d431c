use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "flipstage";

pub const MIN_FLIP_SPEED_MS: u32 = 500;
pub const MAX_FLIP_SPEED_MS: u32 = 2000;
pub const MAX_SHADOW_INTENSITY: u8 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Missing in files written before versioning
    #[serde(default)]
    pub version: u32,

    /// Length of a page turn animation
    #[serde(default = "default_flip_speed")]
    pub flip_speed_ms: u32,

    /// Render the first and last pages as stiff covers
    #[serde(default = "default_true")]
    pub hard_cover: bool,

    #[serde(default = "default_true")]
    pub use_sound: bool,

    /// Fold shadow strength, 0-100
    #[serde(default = "default_shadow_intensity")]
    pub shadow_intensity: u8,
}

fn default_true() -> bool {
    true
}

fn default_flip_speed() -> u32 {
    1000
}

fn default_shadow_intensity() -> u8 {
    32
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            flip_speed_ms: default_flip_speed(),
            hard_cover: true,
            use_sound: true,
            shadow_intensity: default_shadow_intensity(),
        }
    }
}

impl Settings {
    /// Pull hand-edited values back into their slider ranges
    pub fn sanitize(&mut self) {
        self.flip_speed_ms = self
            .flip_speed_ms
            .clamp(MIN_FLIP_SPEED_MS, MAX_FLIP_SPEED_MS);
        self.shadow_intensity = self.shadow_intensity.min(MAX_SHADOW_INTENSITY);
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

/// File the settings were last loaded from, used for saving
static ACTIVE_PATH: LazyLock<RwLock<Option<PathBuf>>> = LazyLock::new(|| RwLock::new(None));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    load_settings_from(&path);
}

/// Load settings from `path`, creating it with the current values if absent
pub fn load_settings_from(path: &Path) {
    if let Ok(mut active) = ACTIVE_PATH.write() {
        *active = Some(path.to_path_buf());
    }

    if path.exists() {
        load_settings_from_path(path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, path);
        }
    }
}

fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                settings.sanitize();

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Unversioned files predate the slider ranges
    settings.sanitize();

    settings.version = CURRENT_VERSION;
}

pub fn save_settings() {
    let active = ACTIVE_PATH.read().ok().and_then(|p| p.clone());
    let Some(path) = active.or_else(preferred_config_path) else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to_file(&settings, &path);
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
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
    content.push_str(&format!(
        "# Page turn length in milliseconds ({MIN_FLIP_SPEED_MS}-{MAX_FLIP_SPEED_MS})\n"
    ));
    content.push_str(&format!("flip_speed_ms: {}\n", settings.flip_speed_ms));
    content.push_str(&format!("hard_cover: {}\n", settings.hard_cover));
    content.push_str(&format!("use_sound: {}\n", settings.use_sound));
    content.push_str(&format!(
        "# Fold shadow strength (0-{MAX_SHADOW_INTENSITY})\n"
    ));
    content.push_str(&format!(
        "shadow_intensity: {}\n",
        settings.shadow_intensity
    ));

    content
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# flipstage settings
# ============================================================================
# Values outside their range are clamped on load.

"#;

// Public API for accessing/modifying settings

pub fn snapshot() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

/// Replace every setting at once without saving
pub fn replace(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn get_flip_speed_ms() -> u32 {
    SETTINGS
        .read()
        .map(|s| s.flip_speed_ms)
        .unwrap_or_else(|_| default_flip_speed())
}

pub fn set_flip_speed_ms(ms: u32) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.flip_speed_ms = ms.clamp(MIN_FLIP_SPEED_MS, MAX_FLIP_SPEED_MS);
    }
    save_settings();
}

pub fn is_hard_cover() -> bool {
    SETTINGS.read().map(|s| s.hard_cover).unwrap_or(true)
}

pub fn set_hard_cover(hard: bool) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.hard_cover = hard;
    }
    save_settings();
}

pub fn is_sound_enabled() -> bool {
    SETTINGS.read().map(|s| s.use_sound).unwrap_or(true)
}

pub fn set_sound_enabled(enabled: bool) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.use_sound = enabled;
    }
    save_settings();
}

pub fn get_shadow_intensity() -> u8 {
    SETTINGS
        .read()
        .map(|s| s.shadow_intensity)
        .unwrap_or_else(|_| default_shadow_intensity())
}

pub fn set_shadow_intensity(intensity: u8) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.shadow_intensity = intensity.min(MAX_SHADOW_INTENSITY);
    }
    save_settings();
}
