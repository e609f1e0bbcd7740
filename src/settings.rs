//! Settings
//!
//! Immutable run configuration: the class/spec registry, colour tables,
//! chart constants and file locations. Loaded once at start-up from an
//! optional YAML file plus environment overrides, then passed explicitly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classes::ClassSpecRegistry;
use crate::error::{ComparisonError, Result};
use crate::model::{Color, ColorBuckets};

/// Environment variable naming the YAML settings file
pub const CONFIG_ENV: &str = "IO_COMPARISON_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "io_comparison.yaml";

/// Encoded format of the output image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            other => Err(ComparisonError::InvalidConfig(format!(
                "unsupported output format '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Ordered classes and their specs
    pub classes: ClassSpecRegistry,
    /// Bar colour per class
    pub class_colors: HashMap<String, Color>,
    /// Badge colour per raid completion fraction
    pub progression_colors: ColorBuckets,
    /// Score drawn at the top of the chart
    pub max_score: f64,
    /// Logical plot size in pixels (square)
    pub image_size: u32,
    /// Spec icon edge in pixels
    pub icon_size: u32,
    /// Scores below this get the compact label
    pub label_threshold: f64,
    pub current_raid: String,
    pub current_raid_bosses: u32,
    pub api_base_url: String,
    pub icon_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    /// Overrides the dataset tag as output file stem
    pub output_basename: Option<String>,
    /// TrueType/OpenType face for chart text; the built-in bitmap face otherwise
    pub font_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let class_colors = [
            ("death_knight", "#C41E3A"),
            ("demon_hunter", "#A330C9"),
            ("druid", "#FF7C0A"),
            ("hunter", "#AAD372"),
            ("mage", "#3FC7EB"),
            ("monk", "#00FF98"),
            ("paladin", "#F48CBA"),
            ("priest", "#FFFFFF"),
            ("rogue", "#FFF468"),
            ("shaman", "#0070DD"),
            ("warlock", "#8788EE"),
            ("warrior", "#C69B6D"),
        ]
        .into_iter()
        .filter_map(|(class, hex)| Some((class.to_string(), hex.parse().ok()?)))
        .collect();

        Self {
            classes: ClassSpecRegistry::default(),
            class_colors,
            progression_colors: ColorBuckets::default(),
            max_score: 3500.0,
            image_size: 1000,
            icon_size: 20,
            label_threshold: 400.0,
            current_raid: "castle-nathria".to_string(),
            current_raid_bosses: 10,
            api_base_url: "https://raider.io/api/v1/characters/profile".to_string(),
            icon_dir: PathBuf::from("data/icons"),
            output_dir: PathBuf::from("plots"),
            output_format: OutputFormat::Png,
            output_basename: None,
            font_path: None,
        }
    }
}

impl Settings {
    /// Load `.env`, the YAML settings file (if any) and environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut settings = if Path::new(&path).exists() {
            info!("Loading settings from {}", path);
            Self::from_path(&path)?
        } else {
            debug!("No settings file at {}, using defaults", path);
            Self::default()
        };

        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = env::var("IO_COMPARISON_ICON_DIR") {
            self.icon_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("IO_COMPARISON_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Ok(format) = env::var("IO_COMPARISON_OUTPUT_FORMAT") {
            self.output_format = OutputFormat::parse(&format)?;
        }
        if let Ok(url) = env::var("IO_COMPARISON_API_URL") {
            self.api_base_url = url;
        }
        if let Ok(font) = env::var("IO_COMPARISON_FONT") {
            self.font_path = Some(PathBuf::from(font));
        }
        Ok(())
    }

    /// Cross-field checks serde cannot express
    pub fn validate(&self) -> Result<()> {
        for entry in self.classes.entries() {
            if !self.class_colors.contains_key(&entry.class_name) {
                return Err(ComparisonError::InvalidConfig(format!(
                    "class '{}' has no colour",
                    entry.class_name
                )));
            }
        }
        if self.max_score.is_nan() || self.max_score <= 0.0 {
            return Err(ComparisonError::InvalidConfig("max_score must be positive".into()));
        }
        if self.image_size == 0 || self.icon_size == 0 || self.icon_size * 4 > self.image_size {
            return Err(ComparisonError::InvalidConfig(format!(
                "icon_size {} does not fit image_size {}",
                self.icon_size, self.image_size
            )));
        }
        if self.current_raid_bosses == 0 {
            return Err(ComparisonError::InvalidConfig(
                "current_raid_bosses must be positive".into(),
            ));
        }
        if self.current_raid.trim().is_empty() {
            return Err(ComparisonError::InvalidConfig("current_raid is empty".into()));
        }
        Ok(())
    }

    pub fn class_color(&self, class_name: &str) -> Result<Color> {
        self.class_colors.get(class_name).copied().ok_or_else(|| {
            ComparisonError::InvalidConfig(format!("class '{}' has no colour", class_name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.class_colors.len(), 12);
        assert_eq!(settings.class_color("priest").unwrap(), Color::WHITE);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml_str(
            "max_score: 3000\noutput_format: jpeg\ncurrent_raid: sanctum-of-domination\n",
        )
        .unwrap();
        assert_eq!(settings.max_score, 3000.0);
        assert_eq!(settings.output_format, OutputFormat::Jpg);
        assert_eq!(settings.current_raid, "sanctum-of-domination");
        assert_eq!(settings.image_size, 1000);
        assert_eq!(settings.font_path, None);

        let with_font = Settings::from_yaml_str("font_path: fonts/DejaVuSans.ttf\n").unwrap();
        assert_eq!(with_font.font_path, Some(PathBuf::from("fonts/DejaVuSans.ttf")));
    }

    #[test]
    fn test_yaml_registry_and_buckets() {
        let yaml = r##"
classes:
  - name: priest
    specs: [discipline, holy, shadow]
progression_colors:
  - { low: 0.0, high: 0.5, color: "#000000" }
  - { low: 0.5, high: 1.01, color: "#FFD700" }
"##;
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.classes.class_count(), 1);
        assert_eq!(settings.progression_colors.len(), 2);
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let gapped = r##"
progression_colors:
  - { low: 0.0, high: 0.4, color: "#000000" }
  - { low: 0.5, high: 1.01, color: "#FFD700" }
"##;
        assert!(Settings::from_yaml_str(gapped).is_err());

        let uncoloured = r#"
classes:
  - name: evoker
    specs: [devastation, preservation]
"#;
        assert!(matches!(
            Settings::from_yaml_str(uncoloured),
            Err(ComparisonError::InvalidConfig(_))
        ));

        assert!(Settings::from_yaml_str("max_scor: 10").is_err());
        assert!(Settings::from_yaml_str("max_score: -1").is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("PNG").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::parse("jpeg").unwrap().extension(), "jpg");
        assert!(OutputFormat::parse("gif").is_err());
    }
}
