use std::path::Path;

use serde::{Deserialize, Serialize};
use surfview_mesh::HeightGradient;

/// Which render backend draws the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Direct buffer upload with gradient and wireframe shaders, auto-rotating.
    #[default]
    Immediate,
    /// Retained scene with lights, helpers and orbit controls.
    Retained,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Viewer settings. Every field falls back to its default when missing from
/// the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub backend: Backend,
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Display target the retained backend attaches to.
    pub container: String,
    /// Demo surface samples per side when no mesh file is given.
    pub resolution: u32,
    /// Show the demo sample lattice as points.
    pub show_points: bool,
    /// Model rotation speed of the immediate backend, radians per second.
    pub spin_speed: f32,
    pub clear_color: [f32; 3],
    pub wire_color: [f32; 3],
    pub gradient: HeightGradient,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Immediate,
            width: 800,
            height: 600,
            title: "Surface Viewer".into(),
            container: "viewer".into(),
            resolution: 30,
            show_points: true,
            spin_speed: 0.5,
            clear_color: [0.0, 0.0, 0.0],
            wire_color: [0.7, 0.7, 0.7],
            gradient: HeightGradient::default(),
        }
    }
}

impl ViewerConfig {
    /// Parse a YAML document. A blank document is the default config.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "loaded viewer config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ViewerConfig::from_yaml("backend: retained\nwidth: 1024\n").unwrap();
        assert_eq!(config.backend, Backend::Retained);
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 600);
        assert_eq!(config.title, "Surface Viewer");
        assert_eq!(config.gradient, HeightGradient::default());
    }

    #[test]
    fn nested_gradient_fields_default_individually() {
        let config = ViewerConfig::from_yaml("gradient:\n  max: 5.0\n").unwrap();
        assert_eq!(config.gradient.max, 5.0);
        assert_eq!(config.gradient.min, -2.0);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(ViewerConfig::from_yaml("").unwrap(), ViewerConfig::default());
        assert_eq!(ViewerConfig::from_yaml("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title: Test Window\nspin_speed: 1.5").unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.title, "Test Window");
        assert_eq!(config.spin_speed, 1.5);
    }

    #[test]
    fn unknown_backend_is_a_yaml_error() {
        assert!(matches!(
            ViewerConfig::from_yaml("backend: vulkan"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ViewerConfig::load(&dir.path().join("absent.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
