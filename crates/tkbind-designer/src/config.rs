//! Designer preferences
//!
//! Stores new-form defaults, the palette order and recently opened forms.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DesignerError, DesignerResult};
use crate::model::FormModel;
use crate::palette::WIDGET_TYPES;

/// Default width of a new form in pixels
const DEFAULT_FORM_WIDTH: i32 = 800;
/// Default height of a new form in pixels
const DEFAULT_FORM_HEIGHT: i32 = 600;

/// Settings applied to newly created forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub width: i32,
    pub height: i32,
    /// Caption of a new form; empty uses the form name
    pub caption: String,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            width: DEFAULT_FORM_WIDTH,
            height: DEFAULT_FORM_HEIGHT,
            caption: String::new(),
        }
    }
}

/// Main designer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    pub form: FormDefaults,
    /// Widget types shown in the palette, in order
    pub palette: Vec<String>,
    /// Recently opened form files, most recent first
    pub recent_files: Vec<PathBuf>,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            form: FormDefaults::default(),
            palette: WIDGET_TYPES.iter().map(ToString::to_string).collect(),
            recent_files: Vec::new(),
        }
    }
}

impl DesignerConfig {
    /// Maximum number of recent files to keep
    const MAX_RECENT: usize = 10;

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tkbind").join("designer.toml"))
    }

    pub fn load(path: impl AsRef<Path>) -> DesignerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from the user config directory, falling back to defaults when
    /// the file is missing or unreadable
    pub fn load_default() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => config,
            Err(DesignerError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable designer config");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DesignerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Save to the user config directory
    pub fn save_default(&self) -> DesignerResult<()> {
        let path = Self::config_path().ok_or(DesignerError::NoConfigDir)?;
        self.save(path)
    }

    /// Add a file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        // Remove if already exists to move to front
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(Self::MAX_RECENT);
    }

    /// Start an empty form using the configured defaults
    pub fn new_form(&self, name: &str) -> FormModel {
        let caption = if self.form.caption.is_empty() {
            name
        } else {
            self.form.caption.as_str()
        };
        let mut form = FormModel::new(name, caption);
        form.width = self.form.width;
        form.height = self.form.height;
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: DesignerConfig = toml::from_str("[form]\nwidth = 1024\n").unwrap();
        assert_eq!(config.form.width, 1024);
        assert_eq!(config.form.height, 600);
        assert_eq!(config.palette.len(), WIDGET_TYPES.len());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("designer.toml");

        let mut config = DesignerConfig::default();
        config.form.caption = "Untitled".to_string();
        config.add_recent_file(PathBuf::from("a.json"));
        config.save(&path).unwrap();

        assert_eq!(DesignerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_recent_files_most_recent_first() {
        let mut config = DesignerConfig::default();
        for i in 0..12 {
            config.add_recent_file(PathBuf::from(format!("form{i}.json")));
        }
        config.add_recent_file(PathBuf::from("form5.json"));

        assert_eq!(config.recent_files.len(), 10);
        assert_eq!(config.recent_files[0], PathBuf::from("form5.json"));
        assert_eq!(config.recent_files[1], PathBuf::from("form11.json"));
        assert_eq!(config.recent_files.iter().filter(|p| p.ends_with("form5.json")).count(), 1);
    }

    #[test]
    fn test_new_form_defaults() {
        let config = DesignerConfig::default();
        let form = config.new_form("Form1");
        assert_eq!(form.caption, "Form1");
        assert_eq!((form.width, form.height), (800, 600));
        assert!(form.is_empty());
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("designer.toml");
        std::fs::write(&path, "form = 3").unwrap();
        assert!(matches!(DesignerConfig::load(&path), Err(DesignerError::TomlParse(_))));
    }
}
