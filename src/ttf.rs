//! # TrueType Builder
//!
//! Assembles a valid TrueType file from a merged glyph map. Each glyph's
//! outline commands become one simple glyph (contours from `MoveTo`,
//! on-curve points for line and curve endpoints, off-curve points for
//! quadratic controls); the required tables are built around them:
//! glyf, loca, cmap (format 4), hmtx, head, hhea, maxp, post and name,
//! sorted by tag, 4-byte aligned, with per-table checksums and the head
//! `checkSumAdjustment` fixed up at the end.
//!
//! Glyph 0 is the empty `.notdef`. Character codes must stay inside the
//! Basic Multilingual Plane, which canonicalization guarantees.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::glyph::{GlyphData, OutlineCommand, EM_SQUARE};
use crate::materialize::FontFileBuilder;
use crate::model::FontMetrics;

/// The bundled font-file builder: writes `<out_dir>/<name>.ttf`.
#[derive(Debug, Default)]
pub struct TtfBuilder;

impl FontFileBuilder for TtfBuilder {
    fn build(
        &self,
        name: &str,
        glyphs: &BTreeMap<char, GlyphData>,
        metrics: &FontMetrics,
        out_dir: &Path,
    ) -> Result<PathBuf, String> {
        let data = build_ttf(name, glyphs, metrics)?;
        let path = out_dir.join(format!("{name}.ttf"));
        std::fs::write(&path, &data)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
        Ok(path)
    }
}

/// Build the font file bytes without touching the filesystem.
pub fn build_ttf(
    name: &str,
    glyphs: &BTreeMap<char, GlyphData>,
    metrics: &FontMetrics,
) -> Result<Vec<u8>, String> {
    let units_per_em = (EM_SQUARE as u32)
        .checked_mul(metrics.scale as u32)
        .filter(|&u| u > 0 && u <= u16::MAX as u32)
        .ok_or_else(|| format!("invalid em scale {}", metrics.scale))? as u16;

    // Glyph 0 is the empty .notdef; the map's glyphs follow in key order.
    let mut encoded: Vec<EncodedGlyph> = Vec::with_capacity(glyphs.len() + 1);
    encoded.push(EncodedGlyph::empty(units_per_em / 2));
    let mut char_to_gid: Vec<(u16, u16)> = Vec::with_capacity(glyphs.len());
    for (&character, data) in glyphs {
        let code = character as u32;
        if code > 0xFFFF {
            return Err(format!(
                "character {character:?} is outside the Basic Multilingual Plane"
            ));
        }
        char_to_gid.push((code as u16, encoded.len() as u16));
        encoded.push(encode_glyph(data));
    }
    let num_glyphs = encoded.len() as u16;

    let (glyf, loca_offsets) = assemble_glyf(&encoded);
    let loca_format: i16 = if glyf.len() > 0x1FFFE { 1 } else { 0 };
    let font_bbox = union_bbox(&encoded);

    let mut tables: Vec<(u32, Vec<u8>)> = vec![
        (tag_u32(b"cmap"), build_cmap_format4(&char_to_gid)),
        (tag_u32(b"glyf"), glyf),
        (
            tag_u32(b"head"),
            build_head(units_per_em, font_bbox, loca_format),
        ),
        (tag_u32(b"hhea"), build_hhea(metrics, &encoded, font_bbox)),
        (tag_u32(b"hmtx"), build_hmtx(&encoded)),
        (tag_u32(b"loca"), build_loca(&loca_offsets, loca_format)),
        (tag_u32(b"maxp"), build_maxp(&encoded)),
        (tag_u32(b"name"), build_name(name)),
        (tag_u32(b"post"), build_post_format3()),
    ];
    tables.sort_by_key(|(tag, _)| *tag);

    Ok(write_ttf_file(&mut tables))
}

// ─── Glyph Encoding ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct GlyphPoint {
    x: i16,
    y: i16,
    on_curve: bool,
}

struct EncodedGlyph {
    data: Vec<u8>,
    advance: u16,
    /// (xMin, yMin, xMax, yMax); zeros for an empty glyph.
    bbox: [i16; 4],
    point_count: usize,
    contour_count: usize,
}

impl EncodedGlyph {
    fn empty(advance: u16) -> Self {
        Self {
            data: Vec::new(),
            advance,
            bbox: [0, 0, 0, 0],
            point_count: 0,
            contour_count: 0,
        }
    }
}

/// Split outline commands into contours of TrueType points. A `MoveTo`
/// starts a new contour; a trailing point that repeats the contour start
/// is dropped, since TrueType closes contours implicitly.
fn collect_contours(commands: &[OutlineCommand]) -> Vec<Vec<GlyphPoint>> {
    let mut contours: Vec<Vec<GlyphPoint>> = Vec::new();
    let mut current: Vec<GlyphPoint> = Vec::new();

    let point = |x: i32, y: i32, on_curve: bool| GlyphPoint {
        x: x.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        y: y.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        on_curve,
    };

    for command in commands {
        match *command {
            OutlineCommand::MoveTo { x, y } => {
                if current.len() > 1 {
                    contours.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                current.push(point(x, y, true));
            }
            OutlineCommand::LineTo { x, y } => current.push(point(x, y, true)),
            OutlineCommand::QuadTo { cx, cy, x, y } => {
                current.push(point(cx, cy, false));
                current.push(point(x, y, true));
            }
        }
    }
    if current.len() > 1 {
        contours.push(current);
    }

    for contour in &mut contours {
        if let (Some(first), Some(last)) = (contour.first().copied(), contour.last().copied()) {
            if contour.len() > 2
                && last.on_curve
                && last.x == first.x
                && last.y == first.y
            {
                contour.pop();
            }
        }
    }
    contours
}

fn encode_glyph(glyph: &GlyphData) -> EncodedGlyph {
    let contours = collect_contours(&glyph.commands);
    if contours.is_empty() {
        return EncodedGlyph::empty(glyph.advance);
    }

    let points: Vec<GlyphPoint> = contours.iter().flatten().copied().collect();
    let mut bbox = [i16::MAX, i16::MAX, i16::MIN, i16::MIN];
    for p in &points {
        bbox[0] = bbox[0].min(p.x);
        bbox[1] = bbox[1].min(p.y);
        bbox[2] = bbox[2].max(p.x);
        bbox[3] = bbox[3].max(p.y);
    }

    let mut data = Vec::new();
    data.extend_from_slice(&(contours.len() as i16).to_be_bytes());
    for v in bbox {
        data.extend_from_slice(&v.to_be_bytes());
    }

    // endPtsOfContours
    let mut end = 0usize;
    for contour in &contours {
        end += contour.len();
        data.extend_from_slice(&((end - 1) as u16).to_be_bytes());
    }
    // instructionLength = 0
    data.extend_from_slice(&0u16.to_be_bytes());

    // Flags plus delta-encoded coordinates. No repeat compression; the
    // fonts this produces are small enough not to care.
    let mut flags = Vec::with_capacity(points.len());
    let mut x_data = Vec::new();
    let mut y_data = Vec::new();
    let (mut prev_x, mut prev_y) = (0i16, 0i16);
    for p in &points {
        let mut flag = if p.on_curve { 0x01u8 } else { 0x00 };

        let dx = p.x as i32 - prev_x as i32;
        if dx == 0 {
            flag |= 0x10; // X_IS_SAME
        } else if dx.unsigned_abs() <= 255 {
            flag |= 0x02; // X_SHORT_VECTOR
            if dx > 0 {
                flag |= 0x10;
            }
            x_data.push(dx.unsigned_abs() as u8);
        } else {
            x_data.extend_from_slice(&(dx as i16).to_be_bytes());
        }

        let dy = p.y as i32 - prev_y as i32;
        if dy == 0 {
            flag |= 0x20; // Y_IS_SAME
        } else if dy.unsigned_abs() <= 255 {
            flag |= 0x04; // Y_SHORT_VECTOR
            if dy > 0 {
                flag |= 0x20;
            }
            y_data.push(dy.unsigned_abs() as u8);
        } else {
            y_data.extend_from_slice(&(dy as i16).to_be_bytes());
        }

        flags.push(flag);
        prev_x = p.x;
        prev_y = p.y;
    }
    data.extend_from_slice(&flags);
    data.extend_from_slice(&x_data);
    data.extend_from_slice(&y_data);

    EncodedGlyph {
        data,
        advance: glyph.advance,
        bbox,
        point_count: points.len(),
        contour_count: contours.len(),
    }
}

// ─── Table Building ─────────────────────────────────────────────

fn assemble_glyf(glyphs: &[EncodedGlyph]) -> (Vec<u8>, Vec<u32>) {
    let mut glyf: Vec<u8> = Vec::new();
    let mut offsets: Vec<u32> = Vec::with_capacity(glyphs.len() + 1);
    for glyph in glyphs {
        offsets.push(glyf.len() as u32);
        glyf.extend_from_slice(&glyph.data);
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
    }
    offsets.push(glyf.len() as u32);
    (glyf, offsets)
}

fn union_bbox(glyphs: &[EncodedGlyph]) -> [i16; 4] {
    let mut bbox = [0i16; 4];
    let mut seen = false;
    for glyph in glyphs {
        if glyph.point_count == 0 {
            continue;
        }
        if !seen {
            bbox = glyph.bbox;
            seen = true;
        } else {
            bbox[0] = bbox[0].min(glyph.bbox[0]);
            bbox[1] = bbox[1].min(glyph.bbox[1]);
            bbox[2] = bbox[2].max(glyph.bbox[2]);
            bbox[3] = bbox[3].max(glyph.bbox[3]);
        }
    }
    bbox
}

fn build_loca(offsets: &[u32], format: i16) -> Vec<u8> {
    let mut data = Vec::new();
    if format == 0 {
        for &offset in offsets {
            data.extend_from_slice(&((offset / 2) as u16).to_be_bytes());
        }
    } else {
        for &offset in offsets {
            data.extend_from_slice(&offset.to_be_bytes());
        }
    }
    data
}

/// A cmap table with a single Format 4 subtable, platform 3 (Windows),
/// encoding 1 (Unicode BMP). Input pairs must be sorted by code.
fn build_cmap_format4(char_to_gid: &[(u16, u16)]) -> Vec<u8> {
    // Segments of contiguous codes, plus the required 0xFFFF sentinel.
    let mut segments: Vec<(u16, u16, Vec<u16>)> = Vec::new();
    for &(code, gid) in char_to_gid {
        if let Some(last) = segments.last_mut() {
            if last.1 != 0xFFFF && code == last.1 + 1 {
                last.1 = code;
                last.2.push(gid);
                continue;
            }
        }
        segments.push((code, code, vec![gid]));
    }
    segments.push((0xFFFF, 0xFFFF, vec![0]));

    let seg_count = segments.len() as u16;
    let seg_count_x2 = seg_count * 2;
    let entry_selector = (u16::BITS - 1 - seg_count.leading_zeros()) as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let range_shift = seg_count_x2.saturating_sub(search_range);

    let mut end_codes: Vec<u16> = Vec::new();
    let mut start_codes: Vec<u16> = Vec::new();
    let mut id_deltas: Vec<i16> = Vec::new();
    let mut id_range_offsets: Vec<u16> = Vec::new();
    let mut glyph_id_array: Vec<u16> = Vec::new();

    for (i, (start, end, gids)) in segments.iter().enumerate() {
        start_codes.push(*start);
        end_codes.push(*end);
        if *start == 0xFFFF {
            id_deltas.push(1);
            id_range_offsets.push(0);
        } else if gids.len() == 1 {
            // idDelta arithmetic is modulo 65536; the truncating cast is
            // exactly that.
            id_deltas.push((gids[0] as i32 - *start as i32) as i16);
            id_range_offsets.push(0);
        } else {
            id_deltas.push(0);
            // Offset from this idRangeOffset entry to its slice of the
            // glyph id array.
            let remaining = (segments.len() - i) as u16;
            id_range_offsets.push((remaining + glyph_id_array.len() as u16) * 2);
            glyph_id_array.extend_from_slice(gids);
        }
    }

    let subtable_len = 14 + seg_count as usize * 8 + glyph_id_array.len() * 2;
    let mut subtable: Vec<u8> = Vec::with_capacity(subtable_len);
    subtable.extend_from_slice(&4u16.to_be_bytes()); // format
    subtable.extend_from_slice(&(subtable_len as u16).to_be_bytes());
    subtable.extend_from_slice(&0u16.to_be_bytes()); // language
    subtable.extend_from_slice(&seg_count_x2.to_be_bytes());
    subtable.extend_from_slice(&search_range.to_be_bytes());
    subtable.extend_from_slice(&entry_selector.to_be_bytes());
    subtable.extend_from_slice(&range_shift.to_be_bytes());
    for &v in &end_codes {
        subtable.extend_from_slice(&v.to_be_bytes());
    }
    subtable.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for &v in &start_codes {
        subtable.extend_from_slice(&v.to_be_bytes());
    }
    for &v in &id_deltas {
        subtable.extend_from_slice(&v.to_be_bytes());
    }
    for &v in &id_range_offsets {
        subtable.extend_from_slice(&v.to_be_bytes());
    }
    for &v in &glyph_id_array {
        subtable.extend_from_slice(&v.to_be_bytes());
    }

    let mut cmap: Vec<u8> = Vec::new();
    cmap.extend_from_slice(&0u16.to_be_bytes()); // version
    cmap.extend_from_slice(&1u16.to_be_bytes()); // numTables
    cmap.extend_from_slice(&3u16.to_be_bytes()); // platformID
    cmap.extend_from_slice(&1u16.to_be_bytes()); // encodingID
    cmap.extend_from_slice(&12u32.to_be_bytes()); // subtable offset
    cmap.extend_from_slice(&subtable);
    cmap
}

fn build_head(units_per_em: u16, bbox: [i16; 4], loca_format: i16) -> Vec<u8> {
    let mut data = vec![0u8; 54];
    write_u32(&mut data, 0, 0x00010000); // version
    write_u32(&mut data, 4, 0x00010000); // fontRevision
    // checkSumAdjustment at offset 8 stays zero until final fixup
    write_u32(&mut data, 12, 0x5F0F3CF5); // magicNumber
    write_u16(&mut data, 16, 0x0003); // baseline at y=0, lsb at x=0
    write_u16(&mut data, 18, units_per_em);
    // created/modified timestamps left at zero
    write_i16(&mut data, 36, bbox[0]);
    write_i16(&mut data, 38, bbox[1]);
    write_i16(&mut data, 40, bbox[2]);
    write_i16(&mut data, 42, bbox[3]);
    write_u16(&mut data, 44, 0); // macStyle
    write_u16(&mut data, 46, 8); // lowestRecPPEM
    write_i16(&mut data, 48, 2); // fontDirectionHint
    write_i16(&mut data, 50, loca_format);
    // glyphDataFormat at 52 = 0
    data
}

fn build_hhea(metrics: &FontMetrics, glyphs: &[EncodedGlyph], bbox: [i16; 4]) -> Vec<u8> {
    let clamp = |v: i32| v.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
    let advance_max = glyphs.iter().map(|g| g.advance).max().unwrap_or(0);
    let min_lsb = glyphs
        .iter()
        .filter(|g| g.point_count > 0)
        .map(|g| g.bbox[0])
        .min()
        .unwrap_or(0);

    let mut data = vec![0u8; 36];
    write_u32(&mut data, 0, 0x00010000); // version
    write_i16(&mut data, 4, clamp(metrics.ascent));
    write_i16(&mut data, 6, clamp(-metrics.descent)); // descender is negative
    write_i16(&mut data, 8, 0); // lineGap
    write_u16(&mut data, 10, advance_max);
    write_i16(&mut data, 12, min_lsb);
    write_i16(&mut data, 14, min_lsb); // minRightSideBearing, approximated
    write_i16(&mut data, 16, bbox[2]); // xMaxExtent
    write_i16(&mut data, 18, 1); // caretSlopeRise
    // caretSlopeRun, caretOffset, reserved: zero
    // metricDataFormat at 32 = 0
    write_u16(&mut data, 34, glyphs.len() as u16); // numberOfHMetrics
    data
}

fn build_hmtx(glyphs: &[EncodedGlyph]) -> Vec<u8> {
    let mut data = Vec::with_capacity(glyphs.len() * 4);
    for glyph in glyphs {
        data.extend_from_slice(&glyph.advance.to_be_bytes());
        let lsb = if glyph.point_count > 0 { glyph.bbox[0] } else { 0 };
        data.extend_from_slice(&lsb.to_be_bytes());
    }
    data
}

fn build_maxp(glyphs: &[EncodedGlyph]) -> Vec<u8> {
    let max_points = glyphs.iter().map(|g| g.point_count).max().unwrap_or(0);
    let max_contours = glyphs.iter().map(|g| g.contour_count).max().unwrap_or(0);

    let mut data = vec![0u8; 32];
    write_u32(&mut data, 0, 0x00010000); // version 1.0
    write_u16(&mut data, 4, glyphs.len() as u16);
    write_u16(&mut data, 6, max_points as u16);
    write_u16(&mut data, 8, max_contours as u16);
    // no composite glyphs
    write_u16(&mut data, 14, 1); // maxZones
    write_u16(&mut data, 24, 64); // maxStackElements
    data
}

fn build_post_format3() -> Vec<u8> {
    // Format 3.0: no glyph names, smallest possible.
    let mut data = vec![0u8; 32];
    write_u32(&mut data, 0, 0x00030000);
    data
}

fn build_name(name: &str) -> Vec<u8> {
    let utf16: Vec<u8> = name.encode_utf16().flat_map(|c| c.to_be_bytes()).collect();
    // Two records sharing one string: family (1) and full name (4).
    let name_ids = [1u16, 4];

    let mut data = Vec::new();
    data.extend_from_slice(&0u16.to_be_bytes()); // format
    data.extend_from_slice(&(name_ids.len() as u16).to_be_bytes());
    let string_offset = 6 + name_ids.len() * 12;
    data.extend_from_slice(&(string_offset as u16).to_be_bytes());
    for id in name_ids {
        data.extend_from_slice(&3u16.to_be_bytes()); // platformID
        data.extend_from_slice(&1u16.to_be_bytes()); // encodingID
        data.extend_from_slice(&0x0409u16.to_be_bytes()); // languageID
        data.extend_from_slice(&id.to_be_bytes());
        data.extend_from_slice(&(utf16.len() as u16).to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes()); // string offset
    }
    data.extend_from_slice(&utf16);
    data
}

// ─── File Assembly ──────────────────────────────────────────────

fn write_ttf_file(tables: &mut [(u32, Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let entry_selector = (u16::BITS - 1 - num_tables.leading_zeros()) as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = (num_tables * 16).saturating_sub(search_range);

    let mut output: Vec<u8> = Vec::new();
    output.extend_from_slice(&0x00010000u32.to_be_bytes()); // sfntVersion
    output.extend_from_slice(&num_tables.to_be_bytes());
    output.extend_from_slice(&search_range.to_be_bytes());
    output.extend_from_slice(&entry_selector.to_be_bytes());
    output.extend_from_slice(&range_shift.to_be_bytes());

    for (_, data) in tables.iter_mut() {
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }

    let mut table_offset = 12 + num_tables as usize * 16;
    for (tag, data) in tables.iter() {
        output.extend_from_slice(&tag.to_be_bytes());
        output.extend_from_slice(&table_checksum(data).to_be_bytes());
        output.extend_from_slice(&(table_offset as u32).to_be_bytes());
        output.extend_from_slice(&(data.len() as u32).to_be_bytes());
        table_offset += data.len();
    }
    for (_, data) in tables.iter() {
        output.extend_from_slice(data);
    }

    fix_head_checksum(&mut output);
    output
}

fn table_checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut last = [0u8; 4];
        last[..rest.len()].copy_from_slice(rest);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

/// Write `checkSumAdjustment` into the head table so the whole file sums
/// to the magic constant.
fn fix_head_checksum(output: &mut [u8]) {
    let num_tables = read_u16(output, 4) as usize;
    let head_tag = tag_u32(b"head");
    for i in 0..num_tables {
        let dir_offset = 12 + i * 16;
        if read_u32(output, dir_offset) != head_tag {
            continue;
        }
        let table_offset = read_u32(output, dir_offset + 8) as usize;
        let file_checksum = table_checksum(output);
        let adjustment = 0xB1B0AFBAu32.wrapping_sub(file_checksum);
        if table_offset + 12 <= output.len() {
            write_u32(output, table_offset + 8, adjustment);
        }
        break;
    }
}

// ─── Byte Helpers ───────────────────────────────────────────────

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn write_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn write_i16(data: &mut [u8], offset: usize, value: i16) {
    data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

fn tag_u32(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

// ─── Tests ──────────────────────────────────────────────────────
