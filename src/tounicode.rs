//! ToUnicode CMap reading and writing
//!
//! Purchase orders produced by CJK office suites almost always use Type0
//! fonts whose codes only make sense through the `/ToUnicode` CMap, so the
//! extractor relies on this module to recover cell text. The label writer
//! uses the same type in the other direction, emitting a CMap for the
//! glyphs it embeds.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Entries per `beginbfchar` block; the CMap format caps a block at 100.
const MAX_BFCHAR_ENTRIES: usize = 100;

/// A code -> Unicode mapping read from or written to a ToUnicode CMap
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ToUnicodeCMap {
    /// Single code mappings (`bfchar`)
    pub char_map: BTreeMap<u16, String>,
    /// Range mappings as (first code, last code, Unicode of first code)
    pub ranges: Vec<(u16, u16, u32)>,
}

impl ToUnicodeCMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a ToUnicode CMap from its decompressed content
    ///
    /// Returns `None` when the content contains no usable mapping.
    pub fn parse(content: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(content);
        let mut cmap = ToUnicodeCMap::new();

        for section in sections(&text, "beginbfchar", "endbfchar") {
            cmap.parse_bfchar_section(section);
        }
        for section in sections(&text, "beginbfrange", "endbfrange") {
            cmap.parse_bfrange_section(section);
        }

        if cmap.char_map.is_empty() && cmap.ranges.is_empty() {
            None
        } else {
            Some(cmap)
        }
    }

    /// `<src> <dst>` pairs
    fn parse_bfchar_section(&mut self, section: &str) {
        let mut tokens = HexTokens::new(section);
        while let (Some(src), Some(dst)) = (tokens.next_hex(), tokens.next_hex()) {
            if let (Some(code), Some(text)) = (parse_hex_u16(src), hex_to_unicode_string(dst)) {
                self.char_map.insert(code, text);
            }
        }
    }

    /// `<start> <end> <base>` or `<start> <end> [<dst> <dst> ...]` triplets
    fn parse_bfrange_section(&mut self, section: &str) {
        let mut tokens = HexTokens::new(section);
        loop {
            let (Some(start_hex), Some(end_hex)) = (tokens.next_hex(), tokens.next_hex()) else {
                break;
            };
            let (Some(start), Some(end)) = (parse_hex_u16(start_hex), parse_hex_u16(end_hex))
            else {
                break;
            };

            if tokens.at_array() {
                // Each code in the range gets its own destination string.
                let mut code = start;
                for dst in tokens.array() {
                    if let Some(text) = hex_to_unicode_string(dst) {
                        self.char_map.insert(code, text);
                    }
                    if code == end {
                        break;
                    }
                    code = code.saturating_add(1);
                }
            } else if let Some(base) = tokens.next_hex().and_then(parse_hex_u32) {
                self.ranges.push((start, end, base));
            } else {
                break;
            }
        }
    }

    /// Record a mapping from `code` to `text`
    pub fn insert(&mut self, code: u16, text: impl Into<String>) {
        self.char_map.insert(code, text.into());
    }

    /// Look up a code and return the Unicode string
    pub fn lookup(&self, code: u16) -> Option<String> {
        if let Some(s) = self.char_map.get(&code) {
            return Some(s.clone());
        }

        self.ranges
            .iter()
            .find(|&&(start, end, _)| code >= start && code <= end)
            .and_then(|&(start, _, base)| char::from_u32(base + u32::from(code - start)))
            .map(String::from)
    }

    /// Decode 2-byte big-endian codes (Type0 fonts)
    pub fn decode_cids(&self, bytes: &[u8]) -> String {
        let mut result = String::new();

        for chunk in bytes.chunks_exact(2) {
            let cid = u16::from_be_bytes([chunk[0], chunk[1]]);
            if let Some(s) = self.lookup(cid) {
                result.push_str(&s);
            } else if let Some(c) = char::from_u32(u32::from(cid)) {
                result.push(c);
            }
        }

        result
    }

    /// Decode 1-byte codes (simple fonts)
    pub fn decode_bytes(&self, bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| {
                self.lookup(u16::from(b))
                    .unwrap_or_else(|| char::from(b).to_string())
            })
            .collect()
    }

    /// Serialize as a CMap stream body for 2-byte codes
    pub fn to_cmap_stream(&self) -> Vec<u8> {
        let mut out = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n",
        );

        let entries: Vec<(&u16, &String)> = self.char_map.iter().collect();
        for block in entries.chunks(MAX_BFCHAR_ENTRIES) {
            let _ = writeln!(out, "{} beginbfchar", block.len());
            for (code, text) in block {
                let _ = writeln!(out, "<{:04X}> <{}>", code, unicode_to_hex(text));
            }
            out.push_str("endbfchar\n");
        }

        if !self.ranges.is_empty() {
            let _ = writeln!(out, "{} beginbfrange", self.ranges.len());
            for (start, end, base) in &self.ranges {
                let _ = writeln!(out, "<{:04X}> <{:04X}> <{:04X}>", start, end, base);
            }
            out.push_str("endbfrange\n");
        }

        out.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        out.into_bytes()
    }
}

/// Iterate over the bodies of `begin ... end` sections
fn sections<'a>(text: &'a str, begin: &'a str, end: &'a str) -> impl Iterator<Item = &'a str> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let start = pos + text[pos..].find(begin)? + begin.len();
        let len = text[start..].find(end)?;
        pos = start + len + end.len();
        Some(&text[start..start + len])
    })
}

/// Cursor over the `<hex>` tokens of a CMap section
struct HexTokens<'a> {
    rest: &'a str,
}

impl<'a> HexTokens<'a> {
    fn new(section: &'a str) -> Self {
        Self { rest: section }
    }

    fn next_hex(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        let body = trimmed.strip_prefix('<')?;
        let close = body.find('>')?;
        self.rest = &body[close + 1..];
        Some(&body[..close])
    }

    fn at_array(&self) -> bool {
        self.rest.trim_start().starts_with('[')
    }

    /// Consume a `[<..> <..>]` array and return its hex tokens
    fn array(&mut self) -> Vec<&'a str> {
        let trimmed = self.rest.trim_start();
        let Some(body) = trimmed.strip_prefix('[') else {
            return Vec::new();
        };
        let close = body.find(']').unwrap_or(body.len());
        self.rest = body.get(close + 1..).unwrap_or("");

        let mut inner = HexTokens::new(&body[..close]);
        std::iter::from_fn(|| inner.next_hex()).collect()
    }
}

fn parse_hex_u16(hex: &str) -> Option<u16> {
    u16::from_str_radix(hex.trim(), 16).ok()
}

fn parse_hex_u32(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex.trim(), 16).ok()
}

/// Decode UTF-16BE hex (surrogate pairs included) into a string
fn hex_to_unicode_string(hex: &str) -> Option<String> {
    let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let units: Vec<u16> = hex
        .as_bytes()
        .chunks_exact(4)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u16::from_str_radix(s, 16).ok())
        .collect();

    let result: String = char::decode_utf16(units)
        .filter_map(Result::ok)
        .collect();

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

fn unicode_to_hex(text: &str) -> String {
    text.encode_utf16().map(|u| format!("{:04X}", u)).collect()
}
