//! Label page rendering with lopdf
//!
//! Every [`LabelEntry`] becomes one small page with four centered
//! paragraphs: name, spec, `i/N` fraction and the bold serial.

use crate::fonts::{encode_win_ansi, Glyph, LabelFont, TrueTypeFont};
use crate::sequencer::LabelEntry;
use crate::tounicode::ToUnicodeCMap;
use crate::LabelError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Points per centimetre
pub const CM: f32 = 72.0 / 2.54;

const REGULAR_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

/// Stroke width for simulated bold, as a fraction of the font size
const FAKE_BOLD_STROKE: f32 = 0.03;

/// Page size and margins, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Same margin on all four sides
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 4.9 * CM,
            height: 2.9 * CM,
            margin: 0.1 * CM,
        }
    }
}

impl PageGeometry {
    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

/// Typography of a label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub page: PageGeometry,
    /// Size the fitting search starts from
    pub max_font_size: f32,
    /// Floor; used even when text still does not fit
    pub min_font_size: f32,
    /// Serial size relative to the body size
    pub serial_scale: f32,
    /// Space after each paragraph
    pub paragraph_spacing: f32,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            max_font_size: 16.0,
            min_font_size: 8.0,
            serial_scale: 1.2,
            paragraph_spacing: 2.0,
        }
    }
}

/// Largest size at which name, every spec line and the fraction fit the page
///
/// Sizes step down by 1pt from `max_font_size`; when nothing above the floor
/// fits, the floor is returned.
pub fn fit_font_size(font: &LabelFont, entry: &LabelEntry, layout: &LabelLayout) -> f32 {
    let usable = layout.page.usable_width();
    let texts: Vec<&str> = entry
        .name
        .split('\n')
        .chain(entry.spec.split('\n'))
        .chain(std::iter::once(entry.fraction.as_str()))
        .collect();

    let mut size = layout.max_font_size;
    while size > layout.min_font_size {
        if texts.iter().all(|t| font.text_width(t, size) <= usable) {
            return size;
        }
        size -= 1.0;
    }
    layout.min_font_size
}

/// Greedy line breaking: at spaces where possible, else between characters
///
/// A single character wider than `max_width` still gets a line of its own.
pub fn wrap_line(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    if measure(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure(word) <= max_width {
            current = word.to_string();
            continue;
        }

        for ch in word.chars() {
            current.push(ch);
            if current.chars().count() > 1 && measure(&current) > max_width {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Output document, accumulated in memory until saved
pub struct LabelDocument {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    regular_font_id: ObjectId,
    bold_font_id: Option<ObjectId>,
    page_ids: Vec<ObjectId>,
    font: LabelFont,
    layout: LabelLayout,
    /// Glyphs drawn with an embedded font, keyed by glyph id
    used_glyphs: BTreeMap<u16, Glyph>,
}

impl LabelDocument {
    pub fn new(font: LabelFont, layout: LabelLayout) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_font_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        fonts.set(REGULAR_FONT, regular_font_id);
        let bold_font_id = match font {
            LabelFont::Helvetica => {
                let id = doc.new_object_id();
                fonts.set(BOLD_FONT, id);
                Some(id)
            }
            LabelFont::TrueType(_) => None,
        };
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        Self {
            doc,
            pages_id,
            resources_id,
            regular_font_id,
            bold_font_id,
            page_ids: Vec::new(),
            font,
            layout,
            used_glyphs: BTreeMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Render one label onto a new page
    pub fn add_label(&mut self, entry: &LabelEntry) -> Result<(), LabelError> {
        let size = fit_font_size(&self.font, entry, &self.layout);
        let serial_size = size * self.layout.serial_scale;
        let page = self.layout.page;

        let paragraphs = [
            (entry.name.as_str(), size, false),
            (entry.spec.as_str(), size, false),
            (entry.fraction.as_str(), size, false),
            (entry.serial.as_str(), serial_size, true),
        ];

        let mut operations = Vec::new();
        let mut top = page.height - page.margin;

        for (text, size, bold) in paragraphs {
            for line in self.layout_lines(text, size, bold) {
                let width = self.measure(&line, size, bold);
                let x = page.margin + (page.usable_width() - width) / 2.0;
                let baseline = top - self.font.ascent() * size;
                self.show_text(&mut operations, &line, x, baseline, size, bold);
                top -= size;
            }
            top -= self.layout.paragraph_spacing;
        }

        if top < page.margin {
            log::debug!(
                "label {} overflows the page bottom by {:.1}pt",
                entry.serial,
                page.margin - top
            );
        }

        let content = Content { operations }.encode()?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), page.width.into(), page.height.into()],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn measure(&self, text: &str, size: f32, bold: bool) -> f32 {
        if bold {
            self.font.bold_text_width(text, size)
        } else {
            self.font.text_width(text, size)
        }
    }

    /// Split a paragraph into lines that fit the usable width
    fn layout_lines(&self, text: &str, size: f32, bold: bool) -> Vec<String> {
        let usable = self.layout.page.usable_width();
        text.split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .flat_map(|line| wrap_line(line, usable, |t| self.measure(t, size, bold)))
            .collect()
    }

    fn show_text(
        &mut self,
        operations: &mut Vec<Operation>,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
    ) {
        let (font_name, encoded, fake_bold) = match &self.font {
            LabelFont::Helvetica => {
                let name = if bold { BOLD_FONT } else { REGULAR_FONT };
                let bytes = Object::String(encode_win_ansi(text), StringFormat::Literal);
                (name, bytes, false)
            }
            LabelFont::TrueType(font) => {
                let glyphs = font.glyphs(text);
                let bytes: Vec<u8> = glyphs.iter().flat_map(|g| g.id.to_be_bytes()).collect();
                for glyph in glyphs {
                    self.used_glyphs.entry(glyph.id).or_insert(glyph);
                }
                (REGULAR_FONT, Object::String(bytes, StringFormat::Hexadecimal), bold)
            }
        };

        if fake_bold {
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new("w", vec![(size * FAKE_BOLD_STROKE).into()]));
        }
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(font_name.to_vec()), size.into()],
        ));
        if fake_bold {
            operations.push(Operation::new("Tr", vec![Object::Integer(2)]));
        }
        operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![encoded]));
        operations.push(Operation::new("ET", vec![]));
        if fake_bold {
            operations.push(Operation::new("Q", vec![]));
        }
    }

    /// Finish the document and serialize it
    pub fn into_bytes(mut self) -> Result<Vec<u8>, LabelError> {
        self.finish()?;
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Finish the document and write it to `path`
    ///
    /// The bytes go to a temporary sibling first and are renamed into place,
    /// so a failed save never leaves a partial file at `path`.
    pub fn save(self, path: &Path) -> Result<(), LabelError> {
        let pages = self.page_ids.len();
        let bytes = self.into_bytes()?;
        let tmp = temporary_sibling(path);

        let written = std::fs::write(&tmp, &bytes).and_then(|_| std::fs::rename(&tmp, path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        log::info!("wrote {} label pages to {}", pages, path.display());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LabelError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );

        match &self.font {
            LabelFont::Helvetica => {
                self.doc
                    .objects
                    .insert(self.regular_font_id, Object::Dictionary(base_font("Helvetica")));
                if let Some(bold_id) = self.bold_font_id {
                    self.doc
                        .objects
                        .insert(bold_id, Object::Dictionary(base_font("Helvetica-Bold")));
                }
            }
            LabelFont::TrueType(font) => {
                let type0 = embed_font(&mut self.doc, font, &self.used_glyphs)?;
                self.doc
                    .objects
                    .insert(self.regular_font_id, Object::Dictionary(type0));
            }
        }

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();
        Ok(())
    }
}

fn base_font(name: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => name,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Add the descendant font, descriptor, font program and ToUnicode CMap,
/// returning the Type0 font dictionary
fn embed_font(
    doc: &mut Document,
    font: &TrueTypeFont,
    used_glyphs: &BTreeMap<u16, Glyph>,
) -> Result<Dictionary, LabelError> {
    let metrics = font.metrics();
    let scale = 1000.0 / f32::from(metrics.units_per_em);
    let to_pdf_units = |v: i16| (f32::from(v) * scale).round() as i64;
    let base_font = font.postscript_name().to_string();

    log::debug!(
        "embedding {} ({} bytes) for {} glyphs",
        base_font,
        font.data().len(),
        used_glyphs.len()
    );
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(font.data())?;
    let compressed = encoder.finish()?;

    let (file_key, program_dict) = if metrics.cff {
        ("FontFile3", dictionary! { "Subtype" => "OpenType", "Filter" => "FlateDecode" })
    } else {
        (
            "FontFile2",
            dictionary! { "Length1" => font.data().len() as i64, "Filter" => "FlateDecode" },
        )
    };
    let mut program = Stream::new(program_dict, compressed);
    program.allows_compression = false;
    let program_id = doc.add_object(program);

    let mut descriptor = dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => base_font.as_str(),
        "Flags" => 4,
        "FontBBox" => metrics.bbox.iter().map(|&v| to_pdf_units(v).into()).collect::<Vec<Object>>(),
        "ItalicAngle" => 0,
        "Ascent" => to_pdf_units(metrics.ascender),
        "Descent" => to_pdf_units(metrics.descender),
        "CapHeight" => to_pdf_units(metrics.cap_height),
        "StemV" => 80,
    };
    descriptor.set(file_key, program_id);
    let descriptor_id = doc.add_object(descriptor);

    let mut widths = Vec::with_capacity(used_glyphs.len() * 2);
    for glyph in used_glyphs.values() {
        let advance = (f32::from(glyph.advance) * scale).round() as i64;
        widths.push(Object::Integer(i64::from(glyph.id)));
        widths.push(Object::Array(vec![advance.into()]));
    }

    let mut cid_font = dictionary! {
        "Type" => "Font",
        "Subtype" => if metrics.cff { "CIDFontType0" } else { "CIDFontType2" },
        "BaseFont" => base_font.as_str(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => widths,
    };
    if !metrics.cff {
        cid_font.set("CIDToGIDMap", "Identity");
    }
    let cid_font_id = doc.add_object(cid_font);

    let mut cmap = ToUnicodeCMap::new();
    for glyph in used_glyphs.values().filter(|g| g.id != 0) {
        cmap.insert(glyph.id, glyph.ch.to_string());
    }
    let to_unicode_id = doc.add_object(Stream::new(Dictionary::new(), cmap.to_cmap_stream()));

    Ok(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => base_font.as_str(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "labels.pdf".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
