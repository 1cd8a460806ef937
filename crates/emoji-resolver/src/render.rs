//! Render presets and rendered output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-selected sizing/interaction profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderProfile {
    /// Inline with text
    #[default]
    Inline,
    /// Standalone, e.g. a reaction picker or preview
    Large,
}

impl FromStr for RenderProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(RenderProfile::Inline),
            "large" => Ok(RenderProfile::Large),
            other => Err(format!("unknown render profile: {}", other)),
        }
    }
}

/// Whether a key looks like a numeric record id rather than a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyShape {
    Named,
    Numeric,
}

impl KeyShape {
    /// `"42"` and the derived `"no.42"` are numeric; anything else is named
    pub fn of(key: &str) -> Self {
        let digits = key.strip_prefix("no.").unwrap_or(key);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            KeyShape::Numeric
        } else {
            KeyShape::Named
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub height_px: u32,
    /// Clicking opens the preview overlay
    pub zoomable: bool,
}

const PRESETS: [(RenderProfile, KeyShape, Preset); 4] = [
    (
        RenderProfile::Inline,
        KeyShape::Named,
        Preset {
            height_px: 20,
            zoomable: true,
        },
    ),
    (
        RenderProfile::Inline,
        KeyShape::Numeric,
        Preset {
            height_px: 48,
            zoomable: true,
        },
    ),
    (
        RenderProfile::Large,
        KeyShape::Named,
        Preset {
            height_px: 64,
            zoomable: false,
        },
    ),
    (
        RenderProfile::Large,
        KeyShape::Numeric,
        Preset {
            height_px: 128,
            zoomable: false,
        },
    ),
];

impl RenderProfile {
    pub fn preset(self, shape: KeyShape) -> Preset {
        PRESETS
            .iter()
            .find(|(profile, s, _)| *profile == self && *s == shape)
            .map(|(_, _, preset)| *preset)
            .unwrap_or(PRESETS[0].2)
    }

    pub fn preset_for_key(self, key: &str) -> Preset {
        self.preset(KeyShape::of(key))
    }
}

/// A resolved placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedEmoji {
    Image {
        key: String,
        src: String,
        height_px: u32,
        zoomable: bool,
    },
    /// Inline `[key]` text shown when the asset could not be resolved
    Fallback { key: String },
}

impl RenderedEmoji {
    pub fn image(key: &str, src: String, preset: Preset) -> Self {
        RenderedEmoji::Image {
            key: key.to_string(),
            src,
            height_px: preset.height_px,
            zoomable: preset.zoomable,
        }
    }

    pub fn fallback(key: &str) -> Self {
        RenderedEmoji::Fallback {
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            RenderedEmoji::Image { key, .. } | RenderedEmoji::Fallback { key } => key,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RenderedEmoji::Fallback { .. })
    }

    /// HTML fragment for this emoji
    pub fn to_html(&self) -> String {
        match self {
            RenderedEmoji::Image {
                key,
                src,
                height_px,
                zoomable,
            } => {
                let key = escape_html(key);
                format!(
                    r#"<img class="emoji" src="{}" alt=":{}:" title=":{}:" height="{}" data-zoomable="{}">"#,
                    escape_html(src),
                    key,
                    key,
                    height_px,
                    zoomable
                )
            }
            RenderedEmoji::Fallback { key } => escape_html(&format!("[{}]", key)),
        }
    }
}

impl fmt::Display for RenderedEmoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        assert_eq!(KeyShape::of("42"), KeyShape::Numeric);
        assert_eq!(KeyShape::of("no.7"), KeyShape::Numeric);
        assert_eq!(KeyShape::of("blobcat"), KeyShape::Named);
        assert_eq!(KeyShape::of("no."), KeyShape::Named);
        assert_eq!(KeyShape::of("no.7a"), KeyShape::Named);
        assert_eq!(KeyShape::of(""), KeyShape::Named);
    }

    #[test]
    fn test_every_profile_shape_pair_has_a_preset() {
        for profile in [RenderProfile::Inline, RenderProfile::Large] {
            for shape in [KeyShape::Named, KeyShape::Numeric] {
                assert!(PRESETS
                    .iter()
                    .any(|(p, s, _)| *p == profile && *s == shape));
            }
        }
        assert_eq!(RenderProfile::Inline.preset_for_key("blobcat").height_px, 20);
        assert_eq!(RenderProfile::Large.preset_for_key("no.7").height_px, 128);
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("inline".parse::<RenderProfile>(), Ok(RenderProfile::Inline));
        assert_eq!("LARGE".parse::<RenderProfile>(), Ok(RenderProfile::Large));
        assert!("huge".parse::<RenderProfile>().is_err());
    }

    #[test]
    fn test_image_html() {
        let rendered = RenderedEmoji::image(
            "blobcat",
            "blob:emoji/1".to_string(),
            RenderProfile::Inline.preset_for_key("blobcat"),
        );
        assert_eq!(
            rendered.to_html(),
            r#"<img class="emoji" src="blob:emoji/1" alt=":blobcat:" title=":blobcat:" height="20" data-zoomable="true">"#
        );
    }

    #[test]
    fn test_fallback_html_is_escaped() {
        let rendered = RenderedEmoji::fallback("<b>");
        assert!(rendered.is_fallback());
        assert_eq!(rendered.to_html(), "[&lt;b&gt;]");
        assert_eq!(RenderedEmoji::fallback("blobcat").to_string(), "[blobcat]");
    }
}
