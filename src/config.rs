use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// An ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const GRAY: Color = Color(0xFF88_8888);
    pub const BLUE: Color = Color(0xFF00_00FF);
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        match hex.len() {
            6 => Ok(Color(0xFF00_0000 | value)),
            8 => Ok(Color(value)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

/// Style sheet configuration. Point based measurements are multiplied by `density`
/// when the style sheet resolves them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub density: f32,
    pub font: FontConfig,
    pub paragraph: ParagraphConfig,
    pub heading: HeadingConfig,
    pub quote: QuoteConfig,
    pub list: ListConfig,
    pub code: CodeConfig,
    pub links: LinksConfig,
    pub render: RenderOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            density: 1.0,
            font: FontConfig::default(),
            paragraph: ParagraphConfig::default(),
            heading: HeadingConfig::default(),
            quote: QuoteConfig::default(),
            list: ListConfig::default(),
            code: CodeConfig::default(),
            links: LinksConfig::default(),
            render: RenderOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: i32,
    pub color: Color,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            size: 17,
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParagraphConfig {
    pub spacing_before: i32,
    pub spacing_after: i32,
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            spacing_before: 6,
            spacing_after: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    /// Relative font size for heading levels 1 through 6.
    pub multipliers: [f32; 6],
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            multipliers: [1.7, 1.5, 1.25, 1.25, 1.25, 1.25],
        }
    }
}

impl HeadingConfig {
    /// Get the size multiplier for a heading level.
    /// Returns None for levels outside 1..=6.
    pub fn multiplier_for(&self, level: u8) -> Option<f32> {
        match level {
            1..=6 => Some(self.multipliers[usize::from(level) - 1]),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub color: Color,
    pub stripe_color: Color,
    pub stripe_width: i32,
    /// Gap between the stripe and the quoted text.
    pub gap_width: i32,
    pub spacing_before: i32,
    pub spacing_after: i32,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            color: Color::GRAY,
            stripe_color: Color::GRAY,
            stripe_width: 2,
            gap_width: 16,
            spacing_before: 16,
            spacing_after: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub prefix_color: Color,
    /// Gap between the prefix column and the item content.
    pub prefix_gap_width: i32,
    pub item_spacing_before: i32,
    pub item_spacing_after: i32,
    /// Width of the widest decimal digit in the base font. Supplied by the layout
    /// engine that measures the font.
    pub digit_width: f32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            prefix_color: Color::GRAY,
            prefix_gap_width: 8,
            item_spacing_before: 4,
            item_spacing_after: 4,
            digit_width: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub color: Color,
    pub block_indentation: i32,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            color: Color::GRAY,
            block_indentation: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub color: Color,
    /// Urls starting with this scheme reach the link callback unmodified.
    pub custom_scheme: Option<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            color: Color::BLUE,
            custom_scheme: None,
        }
    }
}

/// Traversal policies of the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Render soft line breaks as newlines instead of spaces.
    pub soft_breaks_as_hard_breaks: bool,
    /// Only the outermost block quote of a nested group gets a quote span.
    pub flatten_nested_quotes: bool,
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            soft_breaks_as_hard_breaks: true,
            flatten_nested_quotes: true,
            max_depth: 256,
        }
    }
}

impl Config {
    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// The bundled default config. It is validated by the build script, so falling back
    /// to the built-in defaults only happens if the two drift apart in type.
    pub fn compiled_default() -> Self {
        Self::from_toml(DEFAULT_CONFIG).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colors() {
        assert_eq!("#1a4f8b".parse::<Color>().unwrap(), Color(0xFF1A_4F8B));
        assert_eq!("#801a4f8b".parse::<Color>().unwrap(), Color(0x801A_4F8B));
        assert!("1a4f8b".parse::<Color>().is_err());
        assert!("#1a4f".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn compiled_default_matches_builtin_defaults() {
        assert_eq!(Config::compiled_default(), Config::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = Config::from_toml(
            "density = 2.0\n[links]\ncolor = \"#ff0000\"\ncustom_scheme = \"wire://\"\n",
        )
        .unwrap();
        assert_eq!(config.density, 2.0);
        assert_eq!(config.links.color, Color(0xFFFF_0000));
        assert_eq!(config.links.custom_scheme.as_deref(), Some("wire://"));
        assert_eq!(config.quote, QuoteConfig::default());
        assert!(config.render.soft_breaks_as_hard_breaks);
    }

    #[test]
    fn invalid_color_is_an_error() {
        let err = Config::from_toml("[font]\ncolor = \"black\"\n").unwrap_err();
        assert!(err.to_string().contains("black"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn heading_multipliers() {
        let heading = HeadingConfig::default();
        assert_eq!(heading.multiplier_for(1), Some(1.7));
        assert_eq!(heading.multiplier_for(6), Some(1.25));
        assert_eq!(heading.multiplier_for(0), None);
        assert_eq!(heading.multiplier_for(7), None);
    }
}
