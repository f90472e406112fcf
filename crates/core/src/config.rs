use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::collect::SpanAttrs;
use crate::document::SpanColor;
use crate::{CoreError, Result};

const DEFAULT_FONT_SIZE: f32 = 11.0;
const DEFAULT_OUTPUT_SUFFIX: &str = "_edited";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Font size used when a span reports none
    pub default_font_size: f32,
    /// Packed 0xRRGGBB color used when a span reports none
    pub default_color: u32,
    /// Appended to the input file stem when deriving an output path
    pub output_suffix: String,
    pub case_sensitive: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE,
            default_color: 0,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            case_sensitive: false,
        }
    }
}

impl EditorConfig {
    /// Attributes used when nothing better is known about a replacement site.
    pub fn default_attrs(&self) -> SpanAttrs {
        SpanAttrs {
            font: String::new(),
            size: self.default_font_size,
            color: SpanColor::Packed(self.default_color),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            return Err(CoreError::Config(format!(
                "defaultFontSize must be positive, got {}",
                self.default_font_size
            )));
        }
        if self.default_color > 0xFF_FFFF {
            return Err(CoreError::Config(format!(
                "defaultColor must be a 24-bit RGB value, got {:#x}",
                self.default_color
            )));
        }
        Ok(())
    }
}

/// Read the config at `path`, falling back to defaults when the file is missing.
pub fn load_config(path: &Path) -> Result<EditorConfig> {
    if !path.exists() {
        return Ok(EditorConfig::default());
    }
    let raw = fs::read_to_string(path)?;
    let config: EditorConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &EditorConfig) -> Result<()> {
    config.validate()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}

/// Derive `output_dir/<stem><suffix>.<ext>` from `input`, creating `output_dir`.
pub fn output_path_for(input: &Path, output_dir: &Path, suffix: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let file_name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext),
        None => format!("{}{}", stem, suffix),
    };
    Ok(output_dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.default_font_size, 11.0);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EditorConfig {
            default_font_size: 9.5,
            case_sensitive: true,
            ..Default::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"caseSensitive": true}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert!(config.case_sensitive);
        assert_eq!(config.output_suffix, "_edited");
    }

    #[test]
    fn test_invalid_font_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"defaultFontSize": 0}"#).unwrap();
        assert!(matches!(load_config(&path), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_output_path_for() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let path = output_path_for(Path::new("/docs/report.pdf"), &out_dir, "_edited").unwrap();
        assert_eq!(path, out_dir.join("report_edited.pdf"));
        assert!(out_dir.is_dir());
    }
}
