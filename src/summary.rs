//! Summary image rendering.
//!
//! Produces a fixed 600x400 PNG: a header with the total row count, up to
//! five ranked countries by estimated GDP, and an "Updated at" footer. Text
//! is drawn with the 8x8 bitmap glyphs from `font8x8`, scaled up, so no font
//! files are needed at runtime.

use crate::error::{CountryRatesError, Result};
use crate::models::{RankedCountry, SummaryArtifact};
use chrono::{DateTime, Utc};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::info;

pub const CANVAS_WIDTH: u32 = 600;
pub const CANVAS_HEIGHT: u32 = 400;

const SCALE: u32 = 2;
const GLYPH: u32 = 8 * SCALE;
const MARGIN: u32 = 20;
const MAX_CHARS: usize = ((CANVAS_WIDTH - 2 * MARGIN) / GLYPH) as usize;

const BACKGROUND: Rgb<u8> = Rgb([248, 249, 250]);
const HEADER_BAND: Rgb<u8> = Rgb([33, 37, 41]);
const HEADER_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const BODY_TEXT: Rgb<u8> = Rgb([33, 37, 41]);
const MUTED_TEXT: Rgb<u8> = Rgb([108, 117, 125]);

/// Render the artifact as PNG bytes.
pub fn render(total: i64, top: &[RankedCountry], generated_at: &DateTime<Utc>) -> Result<Vec<u8>> {
    let mut img = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);

    fill_rect(&mut img, 0, 0, CANVAS_WIDTH, 56, HEADER_BAND);
    draw_text(&mut img, MARGIN, MARGIN, &format!("Total countries: {total}"), HEADER_TEXT);

    draw_text(&mut img, MARGIN, 80, "Top 5 by estimated GDP", MUTED_TEXT);
    for (i, entry) in top.iter().take(5).enumerate() {
        let y = 120 + i as u32 * 36;
        draw_text(&mut img, MARGIN, y, &ranked_line(i + 1, entry), BODY_TEXT);
    }

    let footer = format!("Updated at: {}", locale_timestamp(generated_at));
    draw_text(&mut img, MARGIN, CANVAS_HEIGHT - MARGIN - GLYPH, &footer, MUTED_TEXT);

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| CountryRatesError::Render(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

/// Render `artifact` and atomically replace the file at `path` with it.
pub fn render_to_path(artifact: &SummaryArtifact, path: &Path) -> Result<()> {
    let bytes = render(artifact.total, &artifact.top, &artifact.generated_at)?;
    write_atomic(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote summary image");
    Ok(())
}

/// Write to a temp file beside `path`, then rename it into place.
///
/// Readers of `path` see either the previous file or the new one, never a
/// partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(render_io)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".summary-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(render_io)?;
    tmp.write_all(bytes).map_err(render_io)?;
    tmp.as_file().sync_all().map_err(render_io)?;
    tmp.persist(path).map_err(|e| render_io(e.error))?;
    Ok(())
}

/// `1. Name - 12345.67`, shortening the name so the line fits the canvas.
pub fn ranked_line(rank: usize, entry: &RankedCountry) -> String {
    let gdp = match entry.estimated_gdp {
        Some(v) => format!("{v:.2}"),
        None => "N/A".to_string(),
    };
    let prefix = format!("{rank}. ");
    let suffix = format!(" - {gdp}");
    let room = MAX_CHARS.saturating_sub(prefix.chars().count() + suffix.chars().count());

    let name = if entry.name.chars().count() <= room {
        entry.name.clone()
    } else {
        let kept: String = entry.name.chars().take(room.saturating_sub(2)).collect();
        format!("{kept}..")
    };
    format!("{prefix}{name}{suffix}")
}

/// en-US style `10/18/2026, 3:04:05 PM` (UTC).
pub fn locale_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

fn render_io(e: std::io::Error) -> CountryRatesError {
    CountryRatesError::Render(format!("could not write summary image: {e}"))
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..(y + h).min(img.height()) {
        for px in x..(x + w).min(img.width()) {
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    for (i, ch) in text.chars().take(MAX_CHARS).enumerate() {
        draw_glyph(img, x + i as u32 * GLYPH, y, ch, color);
    }
}

fn draw_glyph(img: &mut RgbImage, x: u32, y: u32, ch: char, color: Rgb<u8>) {
    let Some(rows) = BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
    else {
        return;
    };

    for (row, bits) in rows.iter().enumerate() {
        for col in 0..8u32 {
            // Bit 0 is the leftmost pixel.
            if bits & (1 << col) != 0 {
                fill_rect(
                    img,
                    x + col * SCALE,
                    y + row as u32 * SCALE,
                    SCALE,
                    SCALE,
                    color,
                );
            }
        }
    }
}
