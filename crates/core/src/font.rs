//! Font name classification
//!
//! Turns raw PDF font names (often `XXXXXX+Family-Variant` subsets) into a
//! canonical family plus style flags, and picks the glyph-complete standard
//! font used when text is written back.
//!
//! Everything here is table driven and total: any string, including the empty
//! one, classifies without error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical families and their known aliases. Order matters: first match wins.
const FONT_FAMILIES: &[(&str, &[&str])] = &[
    ("helvetica", &["helvetica", "arial", "nimbus sans", "liberation sans"]),
    ("times", &["times", "times new roman", "nimbus roman", "liberation serif"]),
    ("courier", &["courier", "courier new", "nimbus mono", "liberation mono"]),
    ("georgia", &["georgia"]),
    ("garamond", &["garamond", "eb garamond", "cormorant garamond"]),
    ("palatino", &["palatino", "palatino linotype", "book antiqua", "uri"]),
    ("calibri", &["calibri"]),
    ("cambria", &["cambria"]),
    ("verdana", &["verdana"]),
    ("tahoma", &["tahoma"]),
    ("trebuchet", &["trebuchet ms"]),
    ("franklin gothic", &["franklin gothic", "itc franklin gothic"]),
];

const SERIF_FAMILIES: &[&str] = &["times", "georgia", "garamond", "palatino", "cambria", "book antiqua"];

const UNKNOWN_FAMILY: &str = "unknown";

const SUBSTITUTE_SERIF_KEYWORDS: &[&str] = &["times", "serif", "roman", "georgia", "garamond", "palatino"];
const SUBSTITUTE_MONO_KEYWORDS: &[&str] = &["courier", "mono", "consolas", "inconsolata", "sourcecodemono"];

static SUBSET_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{6}\+").unwrap());
static BOLD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(bold|heavy|black|semibold|demi)\b").unwrap());
static ITALIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(italic|oblique|it)\b").unwrap());
static MONO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(mono|monospace|console|code|courier|typewriter)\b").unwrap());

/// Glyph-complete standard fonts used for reinsertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubstituteFont {
    #[serde(rename = "helv")]
    Helvetica,
    #[serde(rename = "tiro")]
    TimesRoman,
    #[serde(rename = "cour")]
    Courier,
    #[serde(rename = "symb")]
    Symbol,
    #[serde(rename = "zadb")]
    ZapfDingbats,
}

impl SubstituteFont {
    pub const ALL: [SubstituteFont; 5] = [
        SubstituteFont::Helvetica,
        SubstituteFont::TimesRoman,
        SubstituteFont::Courier,
        SubstituteFont::Symbol,
        SubstituteFont::ZapfDingbats,
    ];

    /// Short identifier (`helv`, `tiro`, `cour`, `symb`, `zadb`).
    pub fn id(self) -> &'static str {
        match self {
            SubstituteFont::Helvetica => "helv",
            SubstituteFont::TimesRoman => "tiro",
            SubstituteFont::Courier => "cour",
            SubstituteFont::Symbol => "symb",
            SubstituteFont::ZapfDingbats => "zadb",
        }
    }

    /// PostScript name of the standard Type1 font.
    pub fn base_font(self) -> &'static str {
        match self {
            SubstituteFont::Helvetica => "Helvetica",
            SubstituteFont::TimesRoman => "Times-Roman",
            SubstituteFont::Courier => "Courier",
            SubstituteFont::Symbol => "Symbol",
            SubstituteFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }
}

/// Classification of one raw font name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontInfo {
    pub raw_name: String,
    pub family: String,
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_monospace: bool,
    pub is_serif: bool,
}

impl FontInfo {
    /// Human-readable label, e.g. `"Helvetica Bold Italic"`.
    pub fn display_name(&self) -> String {
        let mut parts = vec![title_case(&self.family)];
        if self.is_bold {
            parts.push("Bold".to_string());
        }
        if self.is_italic {
            parts.push("Italic".to_string());
        }
        parts.join(" ")
    }
}

/// Table-driven font matcher. Stateless; cheap to construct.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMatcher;

impl FontMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `raw_name` into a [`FontInfo`]. Never fails.
    pub fn match_font(&self, raw_name: &str) -> FontInfo {
        let clean = clean_name(raw_name);
        let family = find_family(&clean);
        let is_serif = is_serif(&family, raw_name);
        FontInfo {
            raw_name: raw_name.to_string(),
            is_bold: BOLD_PATTERN.is_match(raw_name),
            is_italic: ITALIC_PATTERN.is_match(raw_name),
            is_monospace: is_monospace(raw_name),
            is_serif,
            family,
        }
    }

    /// True when both names resolve to the same family.
    pub fn are_compatible(&self, a: &str, b: &str) -> bool {
        self.match_font(a).family == self.match_font(b).family
    }

    /// Pick the standard font used to redraw text originally set in `raw_name`.
    pub fn map_to_substitute(&self, raw_name: &str) -> SubstituteFont {
        if let Some(font) = SubstituteFont::from_id(raw_name) {
            return font;
        }
        let name = raw_name.rsplit('+').next().unwrap_or(raw_name).to_lowercase();
        if SUBSTITUTE_MONO_KEYWORDS.iter().any(|k| name.contains(k)) {
            SubstituteFont::Courier
        } else if SUBSTITUTE_SERIF_KEYWORDS.iter().any(|k| name.contains(k)) {
            SubstituteFont::TimesRoman
        } else {
            SubstituteFont::Helvetica
        }
    }
}

/// `"ABCDEF+Arial-BoldMT"` -> `"arial"`.
fn clean_name(raw_name: &str) -> String {
    let bare = SUBSET_PREFIX.replace(raw_name, "");
    let head = bare.split('-').next().unwrap_or("");
    head.to_lowercase().trim().to_string()
}

fn find_family(clean: &str) -> String {
    if clean.is_empty() {
        return UNKNOWN_FAMILY.to_string();
    }
    FONT_FAMILIES
        .iter()
        .find(|(_, aliases)| {
            aliases
                .iter()
                .any(|alias| clean.contains(alias) || alias.contains(clean))
        })
        .map(|(family, _)| family.to_string())
        .unwrap_or_else(|| clean.to_string())
}

fn is_serif(family: &str, raw_name: &str) -> bool {
    if SERIF_FAMILIES.contains(&family) {
        return true;
    }
    let lower = raw_name.to_lowercase();
    SERIF_FAMILIES.iter().any(|name| lower.contains(name))
}

// Token test plus the substitute keywords, so every name that reinserts in
// Courier also reports monospace.
fn is_monospace(raw_name: &str) -> bool {
    if MONO_PATTERN.is_match(raw_name) {
        return true;
    }
    let lower = raw_name.to_lowercase();
    SUBSTITUTE_MONO_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_prefix_is_stripped() {
        let info = FontMatcher::new().match_font("ABCDEF+Helvetica-Bold");
        assert_eq!(info.family, "helvetica");
        assert!(info.is_bold);
        assert!(!info.is_italic);
        assert!(!info.is_serif);
        assert_eq!(info.raw_name, "ABCDEF+Helvetica-Bold");
    }

    #[test]
    fn test_lowercase_prefix_is_not_a_subset_tag() {
        let info = FontMatcher::new().match_font("abcdef+Zapfino");
        assert_eq!(info.family, "abcdef+zapfino");
    }

    #[test]
    fn test_aliases_resolve_to_family() {
        let m = FontMatcher::new();
        assert_eq!(m.match_font("Arial-BoldMT").family, "helvetica");
        assert_eq!(m.match_font("TimesNewRomanPSMT").family, "times");
        assert_eq!(m.match_font("LiberationMono-Regular").family, "liberationmono");
        assert_eq!(m.match_font("Courier").family, "courier");
        assert_eq!(m.match_font("Georgia-Italic").family, "georgia");
        assert_eq!(m.match_font("Trebuchet MS").family, "trebuchet");
    }

    #[test]
    fn test_truncated_name_matches_alias() {
        // "tim" is contained in the alias "times"
        assert_eq!(FontMatcher::new().match_font("Tim").family, "times");
    }

    #[test]
    fn test_unknown_family_falls_back_to_clean_name() {
        let info = FontMatcher::new().match_font("QWERTY+Zapfino-Regular");
        assert_eq!(info.family, "zapfino");
    }

    #[test]
    fn test_empty_name_is_unknown() {
        let info = FontMatcher::new().match_font("");
        assert_eq!(info.family, "unknown");
        assert!(!info.is_bold && !info.is_italic && !info.is_monospace && !info.is_serif);
    }

    #[test]
    fn test_style_flags_use_word_boundaries() {
        let m = FontMatcher::new();
        assert!(m.match_font("Helvetica-Oblique").is_italic);
        assert!(m.match_font("Minion It").is_italic);
        assert!(!m.match_font("Titillium").is_italic);
        assert!(m.match_font("Myriad-Semibold").is_bold);
        assert!(m.match_font("Arial Black").is_bold);
        assert!(!m.match_font("Arial-BoldMT").is_bold);
    }

    #[test]
    fn test_monospace_detection() {
        let m = FontMatcher::new();
        for name in ["Courier", "CourierNewPSMT", "DejaVuSansMono", "Consolas", "Fira Code", "ABCDEF+Inconsolata"] {
            assert!(m.match_font(name).is_monospace, "{name} should be monospace");
        }
        assert!(!m.match_font("Helvetica").is_monospace);
    }

    #[test]
    fn test_serif_detection() {
        let m = FontMatcher::new();
        assert!(m.match_font("Times-Roman").is_serif);
        assert!(!m.match_font("XYZABC+BookAntiqua").is_serif);
        assert!(m.match_font("Book Antiqua").is_serif);
        assert!(m.match_font("MyGaramondPro").is_serif);
        assert!(!m.match_font("Verdana").is_serif);
    }

    #[test]
    fn test_match_is_deterministic() {
        let m = FontMatcher::new();
        for name in ["", "+", "ABCDEF+", "-", "ÄÖÜ-Bold", "ABCDEF+Helvetica-Bold"] {
            assert_eq!(m.match_font(name), m.match_font(name));
        }
    }

    #[test]
    fn test_display_name() {
        let m = FontMatcher::new();
        assert_eq!(m.match_font("Helvetica-BoldOblique").display_name(), "Helvetica");
        assert_eq!(m.match_font("Helvetica Bold Italic").display_name(), "Helvetica Bold Italic");
        assert_eq!(m.match_font("ITCFranklinGothic").display_name(), "Itcfranklingothic");
        assert_eq!(m.match_font("Franklin Gothic Book").display_name(), "Franklin Gothic");
    }

    #[test]
    fn test_are_compatible() {
        let m = FontMatcher::new();
        assert!(m.are_compatible("Arial-BoldMT", "ABCDEF+Helvetica"));
        assert!(!m.are_compatible("Arial", "Times New Roman"));
    }

    #[test]
    fn test_map_to_substitute() {
        let m = FontMatcher::new();
        assert_eq!(m.map_to_substitute("ABCDEF+CourierNewPSMT"), SubstituteFont::Courier);
        assert_eq!(m.map_to_substitute("Consolas-Bold"), SubstituteFont::Courier);
        assert_eq!(m.map_to_substitute("TimesNewRomanPS-BoldMT"), SubstituteFont::TimesRoman);
        assert_eq!(m.map_to_substitute("NotoSerif"), SubstituteFont::TimesRoman);
        assert_eq!(m.map_to_substitute("Arial"), SubstituteFont::Helvetica);
        assert_eq!(m.map_to_substitute(""), SubstituteFont::Helvetica);
    }

    #[test]
    fn test_substitute_ids_pass_through() {
        let m = FontMatcher::new();
        for font in SubstituteFont::ALL {
            assert_eq!(m.map_to_substitute(font.id()), font);
        }
    }

    #[test]
    fn test_substitute_serde_uses_ids() {
        let json = serde_json::to_string(&SubstituteFont::TimesRoman).unwrap();
        assert_eq!(json, "\"tiro\"");
    }
}
