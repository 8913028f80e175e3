//! Positioned text extraction using lopdf
//!
//! Table detection needs to know where every piece of text sits on the
//! page, so this module walks each page's content stream and records the
//! text shown by `Tj`/`TJ`/`'`/`"` together with its position and rendered
//! size.

use crate::tounicode::ToUnicodeCMap;
use crate::LabelError;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::path::Path;

/// `TJ` adjustments below this (in thousandths of an em) read as a word gap
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// A text item with position information
#[derive(Debug, Clone)]
pub struct TextItem {
    /// The text content
    pub text: String,
    /// X position on page
    pub x: f32,
    /// Y position on page (PDF coordinates, origin at bottom-left)
    pub y: f32,
    /// Estimated width, see [`estimate_width`]
    pub width: f32,
    /// Rendered font size
    pub font_size: f32,
    /// Page number (1-indexed)
    pub page: u32,
}

impl TextItem {
    /// Horizontal centre of the item
    pub fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Right edge of the item
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Load a PDF file, rejecting encrypted documents
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document, LabelError> {
    ensure_readable(Document::load(path)?)
}

/// Load a PDF from a memory buffer, rejecting encrypted documents
pub fn load_document_mem(buffer: &[u8]) -> Result<Document, LabelError> {
    ensure_readable(Document::load_mem(buffer)?)
}

fn ensure_readable(doc: Document) -> Result<Document, LabelError> {
    if doc.is_encrypted() {
        return Err(LabelError::Encrypted);
    }
    Ok(doc)
}

/// Extract positioned text from every page, in page order
pub fn extract_text_items(doc: &Document) -> Result<Vec<TextItem>, LabelError> {
    let mut all_items = Vec::new();

    for (page_num, &page_id) in doc.get_pages().iter() {
        let items = extract_page_text_items(doc, page_id, *page_num)?;
        log::debug!("page {}: {} text items", page_num, items.len());
        all_items.extend(items);
    }

    Ok(all_items)
}

/// Estimate the rendered width of `text`
///
/// Content streams carry no widths for us to read cheaply, so wide (CJK,
/// full-width) characters count as one em and everything else as half.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| if is_wide_char(c) { 1.0 } else { 0.5 })
        .sum::<f32>()
        * font_size
}

/// East Asian wide and full-width characters
pub fn is_wide_char(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x3FFFD
    )
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// How to turn the string operands of one font into text
struct FontDecoder<'a> {
    dict: &'a Dictionary,
    to_unicode: Option<ToUnicodeCMap>,
    two_byte: bool,
}

impl FontDecoder<'_> {
    fn decode(&self, doc: &Document, bytes: &[u8]) -> String {
        if let Some(cmap) = &self.to_unicode {
            return if self.two_byte {
                cmap.decode_cids(bytes)
            } else {
                cmap.decode_bytes(bytes)
            };
        }

        if let Ok(encoding) = self.dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return text;
            }
        }

        decode_without_font(bytes)
    }
}

/// Build decoders for every font in a page's resources
fn page_decoders(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, FontDecoder<'_>> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    fonts
        .into_iter()
        .map(|(name, dict)| {
            let two_byte = dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .map(|subtype| subtype == b"Type0")
                .unwrap_or(false);
            let to_unicode = load_to_unicode(doc, dict);
            (
                name,
                FontDecoder {
                    dict,
                    to_unicode,
                    two_byte,
                },
            )
        })
        .collect()
}

fn load_to_unicode(doc: &Document, font: &Dictionary) -> Option<ToUnicodeCMap> {
    let stream = match font.get(b"ToUnicode").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_stream().ok()?,
        Object::Stream(stream) => stream,
        _ => return None,
    };
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    ToUnicodeCMap::parse(&content)
}

/// UTF-16BE with BOM, otherwise Latin-1
fn decode_without_font(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Text state carried across the operators of one page
struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    in_text_block: bool,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            in_text_block: false,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let translate = [1.0, 0.0, 0.0, 1.0, tx, ty];
        self.line_matrix = multiply_matrices(&translate, &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    /// Record `text` at the current position and advance past it
    fn show(&mut self, text: String, page: u32, items: &mut Vec<TextItem>) {
        let advance = estimate_width(&text, self.font_size);

        if !text.trim().is_empty() {
            let combined = multiply_matrices(&self.text_matrix, &self.ctm);
            let scale = matrix_scale(&combined);
            let rendered_size = self.font_size * scale;
            items.push(TextItem {
                width: estimate_width(&text, rendered_size),
                text,
                x: combined[4],
                y: combined[5],
                font_size: rendered_size,
                page,
            });
        }

        let translate = [1.0, 0.0, 0.0, 1.0, advance, 0.0];
        self.text_matrix = multiply_matrices(&translate, &self.text_matrix);
    }
}

/// Scale factor of a matrix, the larger of its two axes
fn matrix_scale(m: &[f32; 6]) -> f32 {
    let scale_x = (m[0].powi(2) + m[1].powi(2)).sqrt();
    let scale_y = (m[2].powi(2) + m[3].powi(2)).sqrt();
    scale_x.max(scale_y)
}

/// Extract text items from a single page
fn extract_page_text_items(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
) -> Result<Vec<TextItem>, LabelError> {
    let decoders = page_decoders(doc, page_id);
    let content_data = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_data)?;

    let decode = |state: &TextState, obj: &Object| -> Option<String> {
        let Object::String(bytes, _) = obj else {
            return None;
        };
        Some(match decoders.get(&state.font) {
            Some(decoder) => decoder.decode(doc, bytes),
            None => decode_without_font(bytes),
        })
    };

    let mut items = Vec::new();
    let mut state = TextState::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" if operands.len() >= 6 => {
                let m = matrix_operands(operands);
                state.ctm = multiply_matrices(&m, &state.ctm);
            }
            "BT" => {
                state.in_text_block = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "ET" => state.in_text_block = false,
            "Tf" if operands.len() >= 2 => {
                if let Ok(name) = operands[0].as_name() {
                    state.font = name.to_vec();
                }
                if let Some(size) = get_number(&operands[1]) {
                    state.font_size = size;
                }
            }
            "TL" if !operands.is_empty() => {
                state.leading = get_number(&operands[0]).unwrap_or(0.0);
            }
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = get_number(&operands[0]).unwrap_or(0.0);
                let ty = get_number(&operands[1]).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" if operands.len() >= 6 => {
                state.text_matrix = matrix_operands(operands);
                state.line_matrix = state.text_matrix;
            }
            "T*" => state.next_line(),
            "Tj" if state.in_text_block && !operands.is_empty() => {
                if let Some(text) = decode(&state, &operands[0]) {
                    state.show(text, page_num, &mut items);
                }
            }
            "TJ" if state.in_text_block && !operands.is_empty() => {
                if let Ok(array) = operands[0].as_array() {
                    let mut combined_text = String::new();
                    for element in array {
                        if let Some(text) = decode(&state, element) {
                            combined_text.push_str(&text);
                        } else if get_number(element).is_some_and(|n| n < TJ_SPACE_THRESHOLD)
                            && !combined_text.ends_with(' ')
                        {
                            combined_text.push(' ');
                        }
                    }
                    state.show(combined_text, page_num, &mut items);
                }
            }
            "'" if !operands.is_empty() => {
                state.next_line();
                if let Some(text) = decode(&state, &operands[0]) {
                    state.show(text, page_num, &mut items);
                }
            }
            "\"" if operands.len() >= 3 => {
                state.next_line();
                if let Some(text) = decode(&state, &operands[2]) {
                    state.show(text, page_num, &mut items);
                }
            }
            _ => {}
        }
    }

    Ok(items)
}

fn matrix_operands(operands: &[Object]) -> [f32; 6] {
    let mut m = IDENTITY;
    for (i, operand) in operands.iter().take(6).enumerate() {
        m[i] = get_number(operand).unwrap_or(IDENTITY[i]);
    }
    m
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
