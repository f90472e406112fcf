use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{PdfError, PdfResult};

/// Page trees deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 32;

/// US Letter, used when a page declares no usable box.
const DEFAULT_PAGE_BOX: (f32, f32, f32, f32) = (0.0, 0.0, 612.0, 792.0);

pub fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Follow one level of indirection.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up a page attribute, walking up the page tree for inheritable keys.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn extract_box_values(obj: &Object) -> Option<(f32, f32, f32, f32)> {
    let values: Vec<f32> = obj.as_array().ok()?.iter().filter_map(get_number).collect();
    if values.len() == 4 {
        Some((
            values[0].min(values[2]),
            values[1].min(values[3]),
            values[0].max(values[2]),
            values[1].max(values[3]),
        ))
    } else {
        None
    }
}

/// Visible page box as `(llx, lly, urx, ury)`: CropBox, else MediaBox, else Letter.
pub fn get_media_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    inherited(doc, page_id, b"CropBox")
        .and_then(extract_box_values)
        .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(extract_box_values))
        .unwrap_or_else(|| {
            log::warn!("[PdfDocument] page {:?} has no usable box, assuming Letter", page_id);
            DEFAULT_PAGE_BOX
        })
}

/// Decoded stream data, or the raw bytes when no filter applies.
pub fn get_stream_content(stream: &Stream) -> Vec<u8> {
    match stream.decompressed_content() {
        Ok(data) => data,
        Err(_) => stream.content.clone(),
    }
}

/// Concatenated content of a page. A page without `Contents` is empty.
pub fn get_page_content(doc: &Document, page_id: ObjectId) -> PdfResult<Vec<u8>> {
    let dict = doc.get_dictionary(page_id)?;
    let contents = match dict.get(b"Contents") {
        Ok(contents) => resolve(doc, contents),
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Stream(stream) => Ok(get_stream_content(stream)),
        Object::Array(parts) => {
            let mut all_content = Vec::new();
            for part in parts {
                if let Object::Stream(stream) = resolve(doc, part) {
                    all_content.extend(get_stream_content(stream));
                    all_content.push(b'\n');
                }
            }
            Ok(all_content)
        }
        _ => Err(PdfError::Content("page contents is neither a stream nor an array".to_string())),
    }
}

/// Replace the page's content with a single new stream.
pub fn set_page_content(doc: &mut Document, page_id: ObjectId, data: Vec<u8>) -> PdfResult<()> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), data));
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", Object::Reference(stream_id));
    Ok(())
}

/// Add a stream after the page's existing content.
pub fn append_page_content(doc: &mut Document, page_id: ObjectId, data: Vec<u8>) -> PdfResult<()> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), data));
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    let contents = match page.get(b"Contents").ok().cloned() {
        Some(Object::Array(mut parts)) => {
            parts.push(Object::Reference(stream_id));
            Object::Array(parts)
        }
        Some(existing @ Object::Reference(_)) => {
            Object::Array(vec![existing, Object::Reference(stream_id)])
        }
        _ => Object::Reference(stream_id),
    };
    page.set("Contents", contents);
    Ok(())
}

/// Font dictionaries from the page's (possibly inherited) resources, by resource name.
pub fn page_font_dicts<'a>(doc: &'a Document, page_id: ObjectId) -> Vec<(Vec<u8>, &'a Dictionary)> {
    let Some(resources) = inherited(doc, page_id, b"Resources").and_then(|r| r.as_dict().ok()) else {
        return Vec::new();
    };
    let Some(fonts) = resources
        .get(b"Font")
        .ok()
        .map(|f| resolve(doc, f))
        .and_then(|f| f.as_dict().ok())
    else {
        return Vec::new();
    };
    fonts
        .iter()
        .filter_map(|(name, font)| {
            resolve(doc, font)
                .as_dict()
                .ok()
                .map(|dict| (name.clone(), dict))
        })
        .collect()
}

pub fn name_string(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}
