//! Clears marked regions from a page's content.
//!
//! Removed glyphs are replaced by negative `TJ` adjustments of the same
//! advance, so every glyph that stays keeps its exact position.

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use pdforge_core::{Rect, RemovalOptions};

use crate::content::{Glyph, PageScan, PlacementKind, ShowItem, ShowOp};

#[derive(Debug, Clone, Default)]
pub(crate) struct Removal {
    pub operations: Vec<Operation>,
    pub glyphs: usize,
    pub images: usize,
    pub paths: usize,
}

impl Removal {
    pub fn changed(&self) -> bool {
        self.glyphs + self.images + self.paths > 0
    }
}

fn hit(rects: &[Rect], glyph: &Glyph) -> bool {
    let center = glyph.bbox.center();
    rects.iter().any(|r| r.contains(center))
}

/// `TJ` operand for a show with the hit glyphs swapped for spacing.
fn rebuild_array(show: &ShowOp, rects: &[Rect]) -> (Vec<Object>, usize) {
    let mut parts = Vec::new();
    let mut pending: Option<(Vec<u8>, bool)> = None;
    let mut removed = 0;

    let flush = |parts: &mut Vec<Object>, pending: &mut Option<(Vec<u8>, bool)>| {
        if let Some((bytes, hex)) = pending.take() {
            let format = if hex {
                StringFormat::Hexadecimal
            } else {
                StringFormat::Literal
            };
            parts.push(Object::String(bytes, format));
        }
    };

    for item in &show.items {
        match item {
            ShowItem::Glyph(glyph) if hit(rects, glyph) => {
                flush(&mut parts, &mut pending);
                parts.push(Object::Real(-glyph.advance));
                removed += 1;
            }
            ShowItem::Glyph(glyph) => {
                pending
                    .get_or_insert_with(|| (Vec::new(), glyph.hex))
                    .0
                    .extend_from_slice(&glyph.bytes);
            }
            ShowItem::Kern(kern) => {
                flush(&mut parts, &mut pending);
                parts.push(kern.clone());
            }
        }
    }
    flush(&mut parts, &mut pending);
    (parts, removed)
}

/// Operations that replace a show operation once glyphs are dropped from it.
fn rewrite_show(original: &Operation, parts: Vec<Object>) -> Vec<Operation> {
    let tj = Operation::new("TJ", vec![Object::Array(parts)]);
    match original.operator.as_str() {
        "'" => vec![Operation::new("T*", vec![]), tj],
        "\"" => {
            let mut ops = Vec::new();
            if let [aw, ac, ..] = original.operands.as_slice() {
                ops.push(Operation::new("Tw", vec![aw.clone()]));
                ops.push(Operation::new("Tc", vec![ac.clone()]));
            }
            ops.push(Operation::new("T*", vec![]));
            ops.push(tj);
            ops
        }
        _ => vec![tj],
    }
}

/// Rewrite the scanned operations with everything inside `rects` removed.
pub(crate) fn remove_regions(scan: &PageScan, rects: &[Rect], options: RemovalOptions) -> Removal {
    let mut removal = Removal::default();
    let mut replaced: Vec<Option<Vec<Operation>>> = vec![None; scan.operations.len()];

    for show in &scan.shows {
        if !show.glyphs().any(|g| hit(rects, g)) {
            continue;
        }
        let (parts, removed) = rebuild_array(show, rects);
        removal.glyphs += removed;
        replaced[show.op_index] = Some(rewrite_show(&scan.operations[show.op_index], parts));
    }

    for placement in &scan.placements {
        if !rects.iter().any(|r| r.intersects(&placement.bbox)) {
            continue;
        }
        match placement.kind {
            PlacementKind::Image if !options.preserve_images => {
                replaced[placement.op_index] = Some(Vec::new());
                removal.images += 1;
            }
            PlacementKind::Rect if !options.preserve_vector_graphics => {
                // Keep a current point so the following painting operator stays valid.
                let operands = scan.operations[placement.op_index].operands.iter().take(2).cloned().collect();
                replaced[placement.op_index] = Some(vec![Operation::new("m", operands)]);
                removal.paths += 1;
            }
            _ => {}
        }
    }

    removal.operations = scan
        .operations
        .iter()
        .zip(replaced)
        .flat_map(|(op, replacement)| replacement.unwrap_or_else(|| vec![op.clone()]))
        .collect();
    removal
}
