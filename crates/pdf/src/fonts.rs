//! Page font resources: code splitting, glyph widths and Unicode mapping.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::cmap::ToUnicode;
use crate::metrics::{standard_widths, winansi_char};
use crate::utils::{get_number, get_stream_content, name_string, page_font_dicts, resolve};

/// Default glyph width of a CID font without `/DW`.
const CID_DEFAULT_WIDTH: f32 = 1000.0;

/// One character code taken from a shown string.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CharCode {
    pub bytes: Vec<u8>,
    /// Unicode text for the code; empty when it cannot be mapped.
    pub text: String,
    /// Horizontal advance in glyph space (1/1000 em).
    pub width: f32,
    /// Single-byte code 32, the only code word spacing applies to.
    pub is_word_space: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PageFont {
    pub base_font: Option<String>,
    two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    missing_width: Option<f32>,
    standard: Option<&'static [u16; 256]>,
    to_unicode: Option<ToUnicode>,
}

impl PageFont {
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = dict.get(b"BaseFont").ok().and_then(name_string);
        let subtype = dict.get(b"Subtype").ok().and_then(name_string);
        let to_unicode = dict.get(b"ToUnicode").ok().and_then(|obj| match resolve(doc, obj) {
            Object::Stream(stream) => Some(ToUnicode::parse(&get_stream_content(stream))),
            _ => None,
        })
        .filter(|map| !map.is_empty());

        let mut font = PageFont {
            standard: base_font.as_deref().and_then(standard_widths),
            base_font,
            to_unicode,
            ..Default::default()
        };

        if subtype.as_deref() == Some("Type0") {
            font.two_byte = true;
            font.missing_width = Some(CID_DEFAULT_WIDTH);
            if let Some(descendant) = descendant_font(doc, dict) {
                font.load_cid_widths(doc, descendant);
            }
            return font;
        }

        font.first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(get_number)
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(0);
        if let Ok(widths) = dict.get(b"Widths") {
            if let Ok(arr) = resolve(doc, widths).as_array() {
                font.widths = arr
                    .iter()
                    .map(|w| get_number(resolve(doc, w)).unwrap_or(0.0))
                    .collect();
            }
        }
        font.missing_width = dict
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| resolve(doc, d).as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(get_number)
            .filter(|w| *w > 0.0);
        font
    }

    fn load_cid_widths(&mut self, doc: &Document, descendant: &Dictionary) {
        if let Some(dw) = descendant.get(b"DW").ok().and_then(get_number) {
            self.missing_width = Some(dw);
        }
        let Some(w) = descendant.get(b"W").ok().and_then(|w| resolve(doc, w).as_array().ok()) else {
            return;
        };
        // Entries are `c [w1 w2 ...]` or `c_first c_last w`.
        let mut i = 0;
        while i < w.len() {
            let Some(first) = get_number(&w[i]).map(|n| n as u32) else {
                break;
            };
            match w.get(i + 1).map(|o| resolve(doc, o)) {
                Some(Object::Array(run)) => {
                    for (offset, width) in run.iter().enumerate() {
                        if let Some(width) = get_number(width) {
                            self.cid_widths.insert(first + offset as u32, width);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(width)) = (get_number(last), w.get(i + 2).and_then(get_number)) else {
                        break;
                    };
                    for cid in first..=last as u32 {
                        self.cid_widths.insert(cid, width);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    /// Split a shown string into character codes.
    pub fn decode(&self, bytes: &[u8]) -> Vec<CharCode> {
        let step = if self.two_byte { 2 } else { 1 };
        bytes
            .chunks(step)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                CharCode {
                    bytes: chunk.to_vec(),
                    text: self.unicode(code),
                    width: self.width(code),
                    is_word_space: !self.two_byte && code == 32,
                }
            })
            .collect()
    }

    fn unicode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(code)) {
            return text.to_string();
        }
        let ch = if self.two_byte {
            char::from_u32(code)
        } else {
            winansi_char(code as u8)
        };
        ch.map(String::from).unwrap_or_default()
    }

    fn width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .or(self.missing_width)
                .unwrap_or(CID_DEFAULT_WIDTH);
        }
        if let Some(w) = code
            .checked_sub(self.first_char)
            .and_then(|idx| self.widths.get(idx as usize))
        {
            return *w;
        }
        if let Some(table) = self.standard {
            let w = table[(code & 0xFF) as usize];
            if w > 0 {
                return w as f32;
            }
        }
        self.missing_width.unwrap_or_else(|| estimate_char_width(code))
    }
}

/// Width guess for fonts that carry no metrics at all.
fn estimate_char_width(code: u32) -> f32 {
    if code < 128 {
        550.0
    } else {
        1000.0
    }
}

fn descendant_font<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    let descendants = resolve(doc, dict.get(b"DescendantFonts").ok()?).as_array().ok()?;
    resolve(doc, descendants.first()?).as_dict().ok()
}

/// All fonts reachable from the page's resources, keyed by resource name.
pub(crate) fn load_page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, PageFont> {
    page_font_dicts(doc, page_id)
        .into_iter()
        .map(|(name, dict)| (name, PageFont::from_dict(doc, dict)))
        .collect()
}
