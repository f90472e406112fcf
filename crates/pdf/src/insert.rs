//! Drawing replacement text with the standard substitute fonts.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use pdforge_core::{SubstituteFont, TextInsertion};

use crate::content::PageSpace;
use crate::error::PdfResult;
use crate::metrics::encode_winansi;
use crate::utils::{inherited, resolve};

/// Resource name a substitute font is registered under on a page.
pub(crate) fn resource_name(font: SubstituteFont) -> String {
    format!("PF{}", font.id())
}

fn font_dictionary(font: SubstituteFont) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
    };
    // Symbol and ZapfDingbats use their built-in encodings.
    if !matches!(font, SubstituteFont::Symbol | SubstituteFont::ZapfDingbats) {
        dict.set("Encoding", "WinAnsiEncoding");
    }
    dict
}

/// Shared font objects, one per substitute used in the document.
#[derive(Debug, Default)]
pub(crate) struct FontRegistry {
    objects: HashMap<SubstituteFont, ObjectId>,
}

impl FontRegistry {
    fn object_id(&mut self, doc: &mut Document, font: SubstituteFont) -> ObjectId {
        *self
            .objects
            .entry(font)
            .or_insert_with(|| doc.add_object(font_dictionary(font)))
    }

    /// Make `font` available on the page and return its resource name.
    ///
    /// The page's effective resources (possibly inherited) are copied onto
    /// the page itself, so sibling pages sharing them stay untouched.
    pub fn register(&mut self, doc: &mut Document, page_id: ObjectId, font: SubstituteFont) -> PdfResult<String> {
        let font_id = self.object_id(doc, font);
        let name = resource_name(font);

        let mut resources = inherited(doc, page_id, b"Resources")
            .and_then(|r| r.as_dict().ok())
            .cloned()
            .unwrap_or_default();
        let mut fonts = resources
            .get(b"Font")
            .ok()
            .map(|f| resolve(doc, f))
            .and_then(|f| f.as_dict().ok())
            .cloned()
            .unwrap_or_default();

        fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));
        doc.get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Resources", Object::Dictionary(resources));
        Ok(name)
    }
}

/// Content operations drawing one insertion in its own graphics state.
pub(crate) fn text_operations(resource: &str, insertion: &TextInsertion, space: PageSpace) -> Vec<Operation> {
    let (x, y) = space.to_user(insertion.origin);
    let [r, g, b] = insertion.color;
    vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(resource.as_bytes().to_vec()), Object::Real(insertion.size)]),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_winansi(&insertion.text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

pub(crate) fn encode_operations(operations: Vec<Operation>) -> PdfResult<Vec<u8>> {
    Ok(Content { operations }.encode()?)
}
