//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::game::BubbleColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Bubble colours by [`BubbleColor::index`]: red, green, blue, yellow, purple, cyan.
    pub bubbles: [Color; 6],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, counters).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Aiming line and other secondary marks.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// Infallible hex for the built-in tables below.
const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            bubbles: [
                rgb(0xE06C75), // cpu_end / red
                rgb(0x98C379), // mem_box / green
                rgb(0x61AFEF), // cpu_box / blue
                rgb(0xE5C07B), // cpu_mid / yellow
                rgb(0xC678DD), // net_box / purple
                rgb(0x56B6C2), // hi_fg / cyan
            ],
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    pub fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override bubble colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.bubbles = [
                    rgb(0xFF0000),
                    rgb(0x00FF00),
                    rgb(0x0088FF),
                    rgb(0xFFFF00),
                    rgb(0xFF00FF),
                    rgb(0x00FFFF),
                ];
            }
            crate::Palette::Colorblind => {
                // Paul Tol's bright scheme: no red/green pair relies on hue alone
                self.bubbles = [
                    rgb(0xCC3311), // red
                    rgb(0x009988), // teal in place of green
                    rgb(0x0077BB), // blue
                    rgb(0xEE7733), // orange in place of yellow
                    rgb(0xEE3377), // magenta
                    rgb(0x33BBEE), // cyan
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let d = Self::onedark_default();
        Self {
            bubbles: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.bubbles[0]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.bubbles[1]),
                get("cpu_box").unwrap_or(d.bubbles[2]),
                get("cpu_mid").or_else(|| get("title")).unwrap_or(d.bubbles[3]),
                get("net_box").unwrap_or(d.bubbles[4]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(d.bubbles[5]),
            ],
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    #[inline]
    pub fn bubble_color(&self, color: BubbleColor) -> Color {
        self.bubbles[color.index() as usize % 6]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_keys_map_to_bubbles() {
        let map = parse_theme_file("theme[cpu_box]=\"#0000FF\"\ntheme[net_box]='#123'");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.bubble_color(BubbleColor::Blue), Color::Rgb(0, 0, 255));
        assert_eq!(theme.bubble_color(BubbleColor::Purple), Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.bubble_color(BubbleColor::Red), rgb(0xE06C75));
    }

    #[test]
    fn test_missing_file_uses_palette_default() {
        let theme = Theme::load(
            Some(Path::new("/nonexistent/bubbletui.theme")),
            crate::Palette::HighContrast,
        )
        .unwrap();
        assert_eq!(theme.bubble_color(BubbleColor::Green), Color::Rgb(0, 255, 0));
    }
}
