//! Persisted user preferences.
//!
//! Stored as plain `key=value` lines. Unknown keys and unparsable values are
//! skipped so an old or hand-edited file never prevents startup.

use std::path::PathBuf;

use crate::io::DEFAULT_EXPORT_NAME;
use crate::raster::BlockSize;

/// Upper end of the GUI block-size slider unless the settings say otherwise.
pub const DEFAULT_MAX_BLOCK_SIZE: u32 = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Block size the slider starts at
    pub default_block_size: BlockSize,
    /// Largest value offered by the slider
    pub max_block_size: BlockSize,
    /// Whether the effect is on when an image is opened
    pub pixelate_enabled: bool,
    pub last_open_dir: Option<PathBuf>,
    pub last_export_dir: Option<PathBuf>,
    /// File name pre-filled in the export dialog
    pub export_file_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_block_size: BlockSize::default(),
            max_block_size: BlockSize::new(DEFAULT_MAX_BLOCK_SIZE).unwrap_or(BlockSize::ONE),
            pixelate_enabled: true,
            last_open_dir: None,
            last_export_dir: None,
            export_file_name: DEFAULT_EXPORT_NAME.to_string(),
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/pixelator/pixelator_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\Pixelator\pixelator_settings.cfg
    /// On macOS:   ~/Library/Application Support/Pixelator/pixelator_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("pixelator");
            return Some(config_dir.join("pixelator_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(
                PathBuf::from(appdata)
                    .join("Pixelator")
                    .join("pixelator_settings.cfg"),
            );
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("Pixelator")
                    .join("pixelator_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("pixelator_settings.cfg")))
        }
    }

    /// Serialize to the `key=value` file format.
    pub fn to_config_string(&self) -> String {
        let dir = |d: &Option<PathBuf>| {
            d.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        format!(
            "default_block_size={}\n\
             max_block_size={}\n\
             pixelate_enabled={}\n\
             last_open_dir={}\n\
             last_export_dir={}\n\
             export_file_name={}\n",
            self.default_block_size.get(),
            self.max_block_size.get(),
            self.pixelate_enabled,
            dir(&self.last_open_dir),
            dir(&self.last_export_dir),
            self.export_file_name,
        )
    }

    /// Parse the `key=value` format, starting from defaults.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "default_block_size" => {
                    if let Ok(v) = val.parse::<BlockSize>() {
                        s.default_block_size = v;
                    }
                }
                "max_block_size" => {
                    if let Ok(v) = val.parse::<BlockSize>() {
                        s.max_block_size = v;
                    }
                }
                "pixelate_enabled" => {
                    if let Ok(v) = val.parse::<bool>() {
                        s.pixelate_enabled = v;
                    }
                }
                "last_open_dir" => s.last_open_dir = non_empty_path(val),
                "last_export_dir" => s.last_export_dir = non_empty_path(val),
                "export_file_name" => {
                    if !val.is_empty() {
                        s.export_file_name = val.to_string();
                    }
                }
                _ => {}
            }
        }
        // the slider range must contain the default
        if s.max_block_size < s.default_block_size {
            s.max_block_size = s.default_block_size;
        }
        s
    }

    /// Save settings to disk. Failures are logged, never fatal.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            crate::log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        Self::settings_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_str(&content),
            Err(_) => Self::default(),
        }
    }
}

fn non_empty_path(val: &str) -> Option<PathBuf> {
    if val.is_empty() {
        None
    } else {
        Some(PathBuf::from(val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_page() {
        let s = AppSettings::default();
        assert_eq!(s.default_block_size.get(), 10);
        assert_eq!(s.max_block_size.get(), 100);
        assert!(s.pixelate_enabled);
        assert_eq!(s.export_file_name, "pixel-art.png");
    }

    #[test]
    fn config_text_round_trips() {
        let s = AppSettings {
            default_block_size: BlockSize::new(24).unwrap(),
            max_block_size: BlockSize::new(64).unwrap(),
            pixelate_enabled: false,
            last_open_dir: Some(PathBuf::from("/home/me/Pictures")),
            last_export_dir: None,
            export_file_name: "mosaic.png".to_string(),
        };
        assert_eq!(AppSettings::from_config_str(&s.to_config_string()), s);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let s = AppSettings::from_config_str(
            "default_block_size=0\n\
             pixelate_enabled=maybe\n\
             garbage line\n\
             unknown_key=5\n\
             export_file_name=\n",
        );
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn max_is_raised_to_cover_default() {
        let s = AppSettings::from_config_str("default_block_size=40\nmax_block_size=8\n");
        assert_eq!(s.default_block_size.get(), 40);
        assert_eq!(s.max_block_size.get(), 40);
    }

    #[test]
    fn save_and_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pixelator_settings.cfg");
        let mut s = AppSettings::default();
        s.default_block_size = BlockSize::new(3).unwrap();

        s.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), s);
        assert_eq!(
            AppSettings::load_from(&dir.path().join("absent.cfg")),
            AppSettings::default()
        );
    }
}
