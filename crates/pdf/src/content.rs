//! Content stream interpretation.
//!
//! Walks a page's operations tracking the graphics and text state, and
//! records where every glyph, image placement and rectangle lands on the
//! page. Positions are reported in top-left page space (origin at the top
//! left of the visible box, y growing down).

use std::collections::HashMap;

use lopdf::content::Operation;
use lopdf::Object;
use pdforge_core::{Point, Rect};

use crate::fonts::PageFont;
use crate::utils::get_number;

pub(crate) type Matrix = [f32; 6];

pub(crate) const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Glyph box extent above and below the baseline, in em.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// `m` applied first, then `n`.
pub(crate) fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

pub(crate) fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}

fn translate(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Maps PDF user space onto top-left page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageSpace {
    pub llx: f32,
    pub ury: f32,
}

impl PageSpace {
    pub fn new(page_box: (f32, f32, f32, f32)) -> Self {
        Self {
            llx: page_box.0,
            ury: page_box.3,
        }
    }

    pub fn to_page(&self, x: f32, y: f32) -> Point {
        Point::new(x - self.llx, self.ury - y)
    }

    pub fn to_user(&self, p: Point) -> (f32, f32) {
        (p.x + self.llx, self.ury - p.y)
    }

    /// Page-space bounding box of user-space points.
    fn bounds(&self, points: &[(f32, f32)]) -> Rect {
        let mut rect = Rect::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for &(x, y) in points {
            let p = self.to_page(x, y);
            rect = Rect::new(rect.x0.min(p.x), rect.y0.min(p.y), rect.x1.max(p.x), rect.y1.max(p.y));
        }
        rect
    }
}

/// A single drawn character code.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub bytes: Vec<u8>,
    pub text: String,
    /// Baseline origin
    pub origin: Point,
    pub bbox: Rect,
    /// Font size after scaling by the text and graphics matrices
    pub size: f32,
    pub font: Option<String>,
    pub color: [f32; 3],
    /// Displacement of this glyph in `TJ` units (thousandths of text space),
    /// spacing included.
    pub advance: f32,
    pub hex: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum ShowItem {
    Glyph(Glyph),
    /// A `TJ` position adjustment, kept as written.
    Kern(Object),
}

/// One text showing operation (`Tj`, `TJ`, `'` or `"`).
#[derive(Debug, Clone)]
pub(crate) struct ShowOp {
    pub op_index: usize,
    pub items: Vec<ShowItem>,
}

impl ShowOp {
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.items.iter().filter_map(|item| match item {
            ShowItem::Glyph(g) => Some(g),
            ShowItem::Kern(_) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlacementKind {
    /// An XObject drawn with `Do`
    Image,
    /// A path rectangle from `re`
    Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placement {
    pub op_index: usize,
    pub kind: PlacementKind,
    pub bbox: Rect,
}

/// Interpreted page content.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageScan {
    pub operations: Vec<Operation>,
    pub shows: Vec<ShowOp>,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: [f32; 3],
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    /// `Tz` divided by 100
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            fill: [0.0, 0.0, 0.0],
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

fn numbers(operands: &[Object]) -> Vec<f32> {
    operands.iter().filter_map(get_number).collect()
}

fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> [f32; 3] {
    [(1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)]
}

/// Fill color from a numeric component list, guessing the space by arity.
fn color_from_components(components: &[f32]) -> Option<[f32; 3]> {
    match components {
        [g] => Some([*g, *g, *g]),
        [r, g, b] => Some([*r, *g, *b]),
        [c, m, y, k] => Some(cmyk_to_rgb(*c, *m, *y, *k)),
        _ => None,
    }
}

struct Interpreter<'a> {
    fonts: &'a HashMap<Vec<u8>, PageFont>,
    space: PageSpace,
    unknown_font: PageFont,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    in_text: bool,
    scan: PageScan,
}

impl<'a> Interpreter<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, PageFont>, space: PageSpace) -> Self {
        Self {
            fonts,
            space,
            unknown_font: PageFont::default(),
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            in_text: false,
            scan: PageScan::default(),
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translate(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_line(0.0, -leading);
    }

    fn step(&mut self, op_index: usize, op: &Operation) {
        let nums = numbers(&op.operands);
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" if nums.len() == 6 => {
                let m = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                self.state.ctm = multiply(&m, &self.state.ctm);
            }
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(color) = color_from_components(&nums) {
                    self.state.fill = color;
                }
            }
            "BT" => {
                self.in_text = true;
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.state.font = Some(name.clone());
                }
                if let Some(size) = op.operands.get(1).and_then(get_number) {
                    self.state.size = size;
                }
            }
            "Tc" if !nums.is_empty() => self.state.char_spacing = nums[0],
            "Tw" if !nums.is_empty() => self.state.word_spacing = nums[0],
            "Tz" if !nums.is_empty() => self.state.horizontal_scale = nums[0] / 100.0,
            "TL" if !nums.is_empty() => self.state.leading = nums[0],
            "Ts" if !nums.is_empty() => self.state.rise = nums[0],
            "Tm" if nums.len() == 6 => {
                self.text_matrix = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                self.line_matrix = self.text_matrix;
            }
            "Td" if nums.len() == 2 => self.move_line(nums[0], nums[1]),
            "TD" if nums.len() == 2 => {
                self.state.leading = -nums[1];
                self.move_line(nums[0], nums[1]);
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, format)) = op.operands.first() {
                    let mut items = Vec::new();
                    self.show_string(bytes, matches!(format, lopdf::StringFormat::Hexadecimal), &mut items);
                    self.push_show(op_index, items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, format)) = op.operands.first() {
                    let mut items = Vec::new();
                    self.show_string(bytes, matches!(format, lopdf::StringFormat::Hexadecimal), &mut items);
                    self.push_show(op_index, items);
                }
            }
            "\"" if op.operands.len() == 3 => {
                if let (Some(aw), Some(ac)) = (get_number(&op.operands[0]), get_number(&op.operands[1])) {
                    self.state.word_spacing = aw;
                    self.state.char_spacing = ac;
                }
                self.next_line();
                if let Object::String(bytes, format) = &op.operands[2] {
                    let mut items = Vec::new();
                    self.show_string(bytes, matches!(format, lopdf::StringFormat::Hexadecimal), &mut items);
                    self.push_show(op_index, items);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = op.operands.first() {
                    let mut items = Vec::new();
                    for part in parts {
                        match part {
                            Object::String(bytes, format) => {
                                self.show_string(
                                    bytes,
                                    matches!(format, lopdf::StringFormat::Hexadecimal),
                                    &mut items,
                                );
                            }
                            other => {
                                if let Some(n) = get_number(other) {
                                    let tx = -n / 1000.0 * self.state.size * self.state.horizontal_scale;
                                    self.text_matrix = multiply(&translate(tx, 0.0), &self.text_matrix);
                                    items.push(ShowItem::Kern(other.clone()));
                                }
                            }
                        }
                    }
                    self.push_show(op_index, items);
                }
            }
            "Do" => {
                let ctm = self.state.ctm;
                let corners = [
                    transform(&ctm, 0.0, 0.0),
                    transform(&ctm, 1.0, 0.0),
                    transform(&ctm, 0.0, 1.0),
                    transform(&ctm, 1.0, 1.0),
                ];
                self.scan.placements.push(Placement {
                    op_index,
                    kind: PlacementKind::Image,
                    bbox: self.space.bounds(&corners),
                });
            }
            "re" if nums.len() == 4 => {
                let ctm = self.state.ctm;
                let (x, y, w, h) = (nums[0], nums[1], nums[2], nums[3]);
                let corners = [
                    transform(&ctm, x, y),
                    transform(&ctm, x + w, y),
                    transform(&ctm, x, y + h),
                    transform(&ctm, x + w, y + h),
                ];
                self.scan.placements.push(Placement {
                    op_index,
                    kind: PlacementKind::Rect,
                    bbox: self.space.bounds(&corners),
                });
            }
            _ => {}
        }
    }

    fn push_show(&mut self, op_index: usize, items: Vec<ShowItem>) {
        if !self.in_text {
            log::debug!("[PdfDocument] text shown outside BT/ET at operation {}", op_index);
        }
        self.scan.shows.push(ShowOp { op_index, items });
    }

    fn show_string(&mut self, bytes: &[u8], hex: bool, items: &mut Vec<ShowItem>) {
        let font = match &self.state.font {
            Some(name) => self.fonts.get(name).unwrap_or(&self.unknown_font),
            None => &self.unknown_font,
        };
        let GraphicsState {
            ctm,
            fill,
            size,
            char_spacing,
            word_spacing,
            horizontal_scale,
            rise,
            ..
        } = self.state.clone();

        for code in font.decode(bytes) {
            let text_to_user = multiply(&self.text_matrix, &ctm);
            let glyph_to_user = multiply(&[size * horizontal_scale, 0.0, 0.0, size, 0.0, rise], &text_to_user);
            let w = code.width / 1000.0;

            let (ox, oy) = transform(&glyph_to_user, 0.0, 0.0);
            let bbox = self.space.bounds(&[
                transform(&glyph_to_user, 0.0, -DESCENT),
                transform(&glyph_to_user, w, -DESCENT),
                transform(&glyph_to_user, 0.0, ASCENT),
                transform(&glyph_to_user, w, ASCENT),
            ]);
            let effective_size = size.abs() * text_to_user[2].hypot(text_to_user[3]);

            let spacing = char_spacing + if code.is_word_space { word_spacing } else { 0.0 };
            let advance = if size != 0.0 {
                code.width + spacing * 1000.0 / size
            } else {
                code.width
            };

            items.push(ShowItem::Glyph(Glyph {
                bytes: code.bytes,
                text: code.text,
                origin: self.space.to_page(ox, oy),
                bbox,
                size: effective_size,
                font: font.base_font.clone(),
                color: fill,
                advance,
                hex,
            }));

            let tx = (w * size + spacing) * horizontal_scale;
            self.text_matrix = multiply(&translate(tx, 0.0), &self.text_matrix);
        }
    }
}

/// Interpret `operations` against the page's fonts.
pub(crate) fn scan_page(
    operations: Vec<Operation>,
    fonts: &HashMap<Vec<u8>, PageFont>,
    space: PageSpace,
) -> PageScan {
    let mut interpreter = Interpreter::new(fonts, space);
    for (index, op) in operations.iter().enumerate() {
        interpreter.step(index, op);
    }
    let mut scan = interpreter.scan;
    scan.operations = operations;
    scan
}
