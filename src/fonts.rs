//! Fonts for label rendering
//!
//! Labels are mostly Chinese, which the PDF base-14 fonts cannot show, so a
//! system CJK font is embedded when one can be found. [`SystemFonts`] tries
//! the usual install locations; when nothing usable turns up the labels fall
//! back to built-in Helvetica and Chinese glyphs will not render.

use crate::LabelError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use ttf_parser::{name_id, Face, GlyphId, RawFace, Tag};

/// Text a candidate font must be able to draw
pub const REQUIRED_TEXT: &str = "测试";

/// Well-known CJK font locations, tried in order
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Light.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
    r"C:\Windows\Fonts\simhei.ttf",
    r"C:\Windows\Fonts\msyh.ttc",
];

pub const NO_FONT_WARNING: &str = "No suitable Chinese font found. Using default font which may not support Chinese characters.";

static POSTSCRIPT_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]").expect("valid name pattern"));

/// Helvetica widths for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for Latin-1 characters outside the ASCII tables
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// Helvetica ascent, in 1/1000 em
const HELVETICA_ASCENT: f32 = 718.0;

/// The font labels are drawn with
#[derive(Debug)]
pub enum LabelFont {
    /// Base-14 Helvetica (bold text uses Helvetica-Bold)
    Helvetica,
    /// An embedded TrueType/OpenType font
    TrueType(TrueTypeFont),
}

impl LabelFont {
    pub fn name(&self) -> &str {
        match self {
            LabelFont::Helvetica => "Helvetica",
            LabelFont::TrueType(font) => font.postscript_name(),
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, LabelFont::TrueType(_))
    }

    /// Width of `text` in points at `size`
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match self {
            LabelFont::Helvetica => helvetica_width(text, size, false),
            LabelFont::TrueType(font) => font.text_width(text, size),
        }
    }

    /// Width of bold `text` in points at `size`
    ///
    /// Embedded fonts fake bold with a stroke, which keeps the advance widths.
    pub fn bold_text_width(&self, text: &str, size: f32) -> f32 {
        match self {
            LabelFont::Helvetica => helvetica_width(text, size, true),
            LabelFont::TrueType(font) => font.text_width(text, size),
        }
    }

    /// Distance from the top of a line to its baseline, as a fraction of the size
    pub fn ascent(&self) -> f32 {
        match self {
            LabelFont::Helvetica => HELVETICA_ASCENT / 1000.0,
            LabelFont::TrueType(font) => {
                let metrics = font.metrics();
                f32::from(metrics.ascender) / f32::from(metrics.units_per_em)
            }
        }
    }
}

/// Encode text as WinAnsi bytes; characters Helvetica cannot show become `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            cp @ (0x20..=0x7E | 0xA0..=0xFF) => cp as u8,
            _ => b'?',
        })
        .collect()
}

fn helvetica_width(text: &str, size: f32, bold: bool) -> f32 {
    let table = if bold {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|b| match b {
            0x20..=0x7E => u32::from(table[usize::from(b - 0x20)]),
            _ => u32::from(HELVETICA_DEFAULT_WIDTH),
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Font-wide metrics, in font units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    /// x_min, y_min, x_max, y_max
    pub bbox: [i16; 4],
    /// CFF outlines (embedded as FontFile3) rather than TrueType glyf
    pub cff: bool,
}

/// A character mapped to a glyph of an embedded font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub id: u16,
    pub ch: char,
    /// Advance width in font units
    pub advance: u16,
}

/// A TrueType or OpenType font ready to be embedded
pub struct TrueTypeFont {
    source: PathBuf,
    postscript_name: String,
    /// Standalone sfnt data (collections are split on load)
    data: Vec<u8>,
    metrics: FontMetrics,
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("source", &self.source)
            .field("postscript_name", &self.postscript_name)
            .field("bytes", &self.data.len())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl TrueTypeFont {
    /// Load the first face of a font file or collection
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, path)
    }

    pub fn from_bytes(data: Vec<u8>, source: &Path) -> Result<Self, LabelError> {
        let data = standalone_sfnt(data)?;
        let face = parse_face(&data)?;

        let bbox = face.global_bounding_box();
        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            cff: face.raw_face().table(Tag::from_bytes(b"CFF ")).is_some(),
        };
        if metrics.units_per_em == 0 {
            return Err(LabelError::Font("font declares zero units per em".into()));
        }

        let raw_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .or_else(|| {
                source
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        let mut postscript_name = POSTSCRIPT_UNSAFE.replace_all(&raw_name, "").into_owned();
        if postscript_name.is_empty() {
            postscript_name = "LabelFont".to_string();
        }

        Ok(Self {
            source: source.to_path_buf(),
            postscript_name,
            data,
            metrics,
        })
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    /// Font program bytes to embed
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Map each printable character of `text` to a glyph
    ///
    /// Characters the font lacks map to glyph 0 (`.notdef`).
    pub fn glyphs(&self, text: &str) -> Vec<Glyph> {
        let Ok(face) = parse_face(&self.data) else {
            return Vec::new();
        };
        text.chars()
            .filter(|c| !c.is_control())
            .map(|ch| {
                let id = face.glyph_index(ch).unwrap_or(GlyphId(0));
                Glyph {
                    id: id.0,
                    ch,
                    advance: face.glyph_hor_advance(id).unwrap_or(0),
                }
            })
            .collect()
    }

    /// Whether every character of `text` has a real glyph
    pub fn covers(&self, text: &str) -> bool {
        let glyphs = self.glyphs(text);
        !glyphs.is_empty() && glyphs.iter().all(|g| g.id != 0)
    }

    /// Width of `text` in points at `size`
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = self.glyphs(text).iter().map(|g| u32::from(g.advance)).sum();
        units as f32 * size / f32::from(self.metrics.units_per_em)
    }
}

fn parse_face(data: &[u8]) -> Result<Face<'_>, LabelError> {
    Face::parse(data, 0).map_err(|e| LabelError::Font(e.to_string()))
}

/// Turn the first face of a collection into a standalone font file
///
/// PDF viewers expect a single sfnt in `FontFile2`, so the face's tables are
/// copied out of the collection behind a fresh table directory. Plain font
/// files are returned unchanged.
fn standalone_sfnt(data: Vec<u8>) -> Result<Vec<u8>, LabelError> {
    if !data.starts_with(b"ttcf") {
        return Ok(data);
    }

    let face = RawFace::parse(&data, 0).map_err(|e| LabelError::Font(e.to_string()))?;
    let records: Vec<_> = face.table_records.into_iter().collect();
    let num_tables = u16::try_from(records.len())
        .map_err(|_| LabelError::Font("too many font tables".into()))?;

    let entry_selector = 15 - num_tables.max(1).leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;
    let is_cff = records.iter().any(|r| &r.tag.to_bytes() == b"CFF ");

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(if is_cff { b"OTTO" } else { &[0, 1, 0, 0] });
    for value in [num_tables, search_range, entry_selector, range_shift] {
        out.extend_from_slice(&value.to_be_bytes());
    }

    let mut offset = 12 + 16 * records.len();
    let mut tables = Vec::with_capacity(records.len());
    for record in &records {
        let start = record.offset as usize;
        let table = start
            .checked_add(record.length as usize)
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| LabelError::Font("font table outside the collection".into()))?;

        out.extend_from_slice(&record.tag.to_bytes());
        out.extend_from_slice(&record.check_sum.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&record.length.to_be_bytes());

        tables.push(table);
        offset += (table.len() + 3) & !3;
    }
    for table in tables {
        out.extend_from_slice(table);
        out.resize((out.len() + 3) & !3, 0);
    }

    Ok(out)
}

/// The font picked for a run, plus what went wrong along the way
#[derive(Debug)]
pub struct FontSelection {
    pub font: LabelFont,
    /// Non-fatal problems, for the operator
    pub warnings: Vec<String>,
}

/// Source of the label font
pub trait FontSupplier {
    fn load(&self) -> FontSelection;
}

/// Always Helvetica; for tests and machines without CJK fonts
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinFont;

impl FontSupplier for BuiltinFont {
    fn load(&self) -> FontSelection {
        FontSelection {
            font: LabelFont::Helvetica,
            warnings: Vec::new(),
        }
    }
}

/// Tries a list of font files and embeds the first usable one
#[derive(Debug, Clone)]
pub struct SystemFonts {
    candidates: Vec<PathBuf>,
    required_text: String,
}

impl Default for SystemFonts {
    fn default() -> Self {
        Self::with_candidates(DEFAULT_FONT_PATHS.iter().map(PathBuf::from))
    }
}

impl SystemFonts {
    pub fn with_candidates<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            required_text: REQUIRED_TEXT.to_string(),
        }
    }

    /// Only accept fonts with glyphs for every character of `text`
    pub fn requiring(mut self, text: impl Into<String>) -> Self {
        self.required_text = text.into();
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }
}

impl FontSupplier for SystemFonts {
    fn load(&self) -> FontSelection {
        let mut warnings = Vec::new();

        for path in self.candidates.iter().filter(|p| p.exists()) {
            let loaded = TrueTypeFont::load(path).and_then(|font| {
                if font.covers(&self.required_text) {
                    Ok(font)
                } else {
                    Err(LabelError::Font(format!("no glyphs for {:?}", self.required_text)))
                }
            });

            match loaded {
                Ok(font) => {
                    log::info!("using font {} from {}", font.postscript_name(), path.display());
                    return FontSelection {
                        font: LabelFont::TrueType(font),
                        warnings,
                    };
                }
                Err(e) => {
                    let message = format!("Could not use font {}: {}", path.display(), e);
                    log::warn!("{}", message);
                    warnings.push(message);
                }
            }
        }

        log::warn!("{}", NO_FONT_WARNING);
        warnings.push(NO_FONT_WARNING.to_string());
        FontSelection {
            font: LabelFont::Helvetica,
            warnings,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// A Latin TrueType font commonly installed, if this machine has one
    pub(crate) fn installed_ttf() -> Option<TrueTypeFont> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            r"C:\Windows\Fonts\arial.ttf",
        ]
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(|p| TrueTypeFont::load(p).ok())
    }

    fn be_u16(data: &[u8], at: usize) -> u16 {
        u16::from_be_bytes([data[at], data[at + 1]])
    }

    fn be_u32(data: &[u8], at: usize) -> u32 {
        u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    /// Put a single font file behind a one-face collection header
    fn wrap_in_collection(font: &[u8]) -> Vec<u8> {
        let mut out = b"ttcf".to_vec();
        out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        out.extend_from_slice(&1u32.to_be_bytes());
        out.extend_from_slice(&16u32.to_be_bytes());

        let mut face = font.to_vec();
        for i in 0..usize::from(be_u16(font, 4)) {
            let at = 12 + 16 * i + 8;
            let shifted = be_u32(font, at) + 16;
            face[at..at + 4].copy_from_slice(&shifted.to_be_bytes());
        }
        out.extend_from_slice(&face);
        out
    }

    #[test]
    fn test_helvetica_widths() {
        let font = LabelFont::Helvetica;
        // "1/3" = 556 + 278 + 556
        assert!((font.text_width("1/3", 10.0) - 13.9).abs() < 1e-4);
        // Bold digits share the regular width
        assert!((font.bold_text_width("1234-01", 10.0) - 36.69).abs() < 1e-4);
        assert!(font.text_width("Wide", 12.0) > font.text_width("ill", 12.0));
    }

    #[test]
    fn test_unencodable_text_measures_as_question_marks() {
        assert_eq!(encode_win_ansi("M6螺栓"), b"M6??");
        assert_eq!(encode_win_ansi("café"), b"caf\xE9");
        let font = LabelFont::Helvetica;
        assert_eq!(font.text_width("螺栓", 10.0), font.text_width("??", 10.0));
    }

    #[test]
    fn test_garbage_is_not_a_font() {
        let result = TrueTypeFont::from_bytes(b"not a font".to_vec(), Path::new("x.ttf"));
        assert!(matches!(result, Err(LabelError::Font(_))));
    }

    #[test]
    fn test_collection_face_becomes_standalone_font() {
        // ttcf header, then one face with two tables; `cmap` is 5 bytes long
        let mut ttc = b"ttcf".to_vec();
        ttc.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        ttc.extend_from_slice(&1u32.to_be_bytes());
        ttc.extend_from_slice(&16u32.to_be_bytes());
        ttc.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        for value in [2u16, 32, 1, 0] {
            ttc.extend_from_slice(&value.to_be_bytes());
        }
        let cmap_at: u32 = 16 + 12 + 2 * 16;
        for (tag, check_sum, offset, length) in [
            (b"cmap", 0x1111_1111u32, cmap_at, 5u32),
            (b"head", 0x2222_2222, cmap_at + 8, 4),
        ] {
            ttc.extend_from_slice(tag);
            ttc.extend_from_slice(&check_sum.to_be_bytes());
            ttc.extend_from_slice(&offset.to_be_bytes());
            ttc.extend_from_slice(&length.to_be_bytes());
        }
        ttc.extend_from_slice(b"CMAP!\0\0\0HEAD");

        let font = standalone_sfnt(ttc).unwrap();

        assert_eq!(&font[..4], &[0, 1, 0, 0]);
        assert_eq!(be_u16(&font, 4), 2, "numTables");
        assert_eq!(be_u16(&font, 6), 32, "searchRange");
        assert_eq!(be_u16(&font, 8), 1, "entrySelector");
        assert_eq!(be_u16(&font, 10), 0, "rangeShift");

        assert_eq!(&font[12..16], b"cmap");
        assert_eq!(be_u32(&font, 16), 0x1111_1111);
        assert_eq!(be_u32(&font, 20), 44);
        assert_eq!(be_u32(&font, 24), 5);
        assert_eq!(&font[28..32], b"head");
        assert_eq!(be_u32(&font, 36), 52, "tables start on 4-byte boundaries");
        assert_eq!(be_u32(&font, 40), 4);

        assert_eq!(&font[44..49], b"CMAP!");
        assert_eq!(&font[49..52], &[0, 0, 0]);
        assert_eq!(&font[52..56], b"HEAD");
        assert_eq!(font.len(), 56);
    }

    #[test]
    fn test_plain_font_is_not_rebuilt() {
        let data = vec![0, 1, 0, 0, 0, 0];
        assert_eq!(standalone_sfnt(data.clone()).unwrap(), data);
    }

    #[test]
    fn test_truncated_collection_is_a_font_error() {
        let mut ttc = b"ttcf".to_vec();
        ttc.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        ttc.extend_from_slice(&1u32.to_be_bytes());
        ttc.extend_from_slice(&400u32.to_be_bytes());
        assert!(matches!(standalone_sfnt(ttc), Err(LabelError::Font(_))));
    }

    #[test]
    fn test_installed_font_loads_from_a_collection() {
        let Some(font) = installed_ttf() else {
            return;
        };
        let loaded = TrueTypeFont::from_bytes(wrap_in_collection(font.data()), Path::new("x.ttc"))
            .unwrap();

        assert_eq!(loaded.postscript_name(), font.postscript_name());
        assert_eq!(loaded.glyphs("Hex bolt 1/2"), font.glyphs("Hex bolt 1/2"));
        assert_eq!(loaded.data().len() % 4, 0);
        let face = Face::parse(loaded.data(), 0).unwrap();
        assert_eq!(
            face.raw_face().table(Tag::from_bytes(b"glyf")),
            Face::parse(font.data(), 0)
                .unwrap()
                .raw_face()
                .table(Tag::from_bytes(b"glyf"))
        );
    }

    #[test]
    fn test_installed_font_metrics() {
        let Some(font) = installed_ttf() else {
            return;
        };
        assert!(font.covers("Hex bolt"));
        assert!(!font.covers("\u{10FFFD}"));
        let glyphs = font.glyphs("a\nb");
        assert_eq!(glyphs.len(), 2, "control characters are skipped");
        assert!(font.text_width("WWW", 10.0) > font.text_width("iii", 10.0));
        assert!(font.metrics().units_per_em > 0);
        assert!(!font.postscript_name().is_empty());
    }

    #[test]
    fn test_font_without_chinese_glyphs_is_skipped() {
        let Some(font) = installed_ttf() else {
            return;
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(font.data()).unwrap();

        let selection = SystemFonts::with_candidates([file.path()]).load();
        assert!(matches!(selection.font, LabelFont::Helvetica));
        assert!(selection.warnings[0].contains("no glyphs"));
    }

    #[test]
    fn test_first_usable_candidate_is_embedded() {
        let Some(font) = installed_ttf() else {
            return;
        };
        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        garbage.write_all(b"not a font either").unwrap();
        let mut usable = tempfile::NamedTempFile::new().unwrap();
        usable.write_all(font.data()).unwrap();

        let selection = SystemFonts::with_candidates([
            Path::new("/nonexistent/a.ttf"),
            garbage.path(),
            usable.path(),
        ])
        .requiring("Hex bolt")
        .load();

        assert!(selection.font.is_embedded());
        assert_eq!(selection.font.name(), font.postscript_name());
        assert_eq!(selection.warnings.len(), 1, "{:?}", selection.warnings);
        assert!(selection.warnings[0].starts_with("Could not use font"));
    }

    #[test]
    fn test_missing_candidates_fall_back_to_helvetica() {
        let fonts = SystemFonts::with_candidates(["/nonexistent/a.ttf", "/nonexistent/b.ttc"]);
        let selection = fonts.load();

        assert!(matches!(selection.font, LabelFont::Helvetica));
        assert_eq!(selection.warnings, vec![NO_FONT_WARNING.to_string()]);
    }

    #[test]
    fn test_unreadable_candidate_warns_and_continues() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not truetype").unwrap();

        let fonts = SystemFonts::with_candidates([file.path()]);
        let selection = fonts.load();

        assert!(!selection.font.is_embedded());
        assert_eq!(selection.warnings.len(), 2);
        assert!(selection.warnings[0].starts_with("Could not use font"));
        assert_eq!(selection.warnings[1], NO_FONT_WARNING);
    }

    #[test]
    fn test_default_candidates() {
        let fonts = SystemFonts::default();
        assert_eq!(fonts.candidates().len(), DEFAULT_FONT_PATHS.len());
        assert_eq!(
            fonts.candidates()[4],
            PathBuf::from("/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf")
        );
    }

    #[test]
    fn test_builtin_font_has_no_warnings() {
        let selection = BuiltinFont.load();
        assert_eq!(selection.font.name(), "Helvetica");
        assert!(selection.warnings.is_empty());
    }
}
