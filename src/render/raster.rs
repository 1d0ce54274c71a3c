// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

//! Raster-to-text image conversion.
//!
//! Each pixel of the resized image becomes one glyph picked by luminance.
//! Text cells are roughly twice as tall as they are wide, so the row count is
//! halved to keep the aspect ratio.

use std::fmt::Write;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};

use crate::error::{Error, Result};

/// Intensity glyphs, darkest first.
const GLYPHS: [char; 10] = ['@', '%', '#', '*', '+', '=', '-', ':', '.', ' '];

/// Height correction for non-square character cells.
const CELL_ASPECT: f64 = 0.5;

/// Output row count for an image of `src_w` x `src_h` pixels at `width` columns.
pub(crate) fn row_count(src_w: u32, src_h: u32, width: u32) -> u32 {
    if src_w == 0 {
        return 0;
    }
    (src_h as f64 / src_w as f64 * width as f64 * CELL_ASPECT).round() as u32
}

fn glyph(r: u8, g: u8, b: u8) -> char {
    let luminance = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    let level = (luminance as usize).min(255);
    GLYPHS[level * GLYPHS.len() / 256]
}

/// Convert an already decoded image.
pub(crate) fn convert(img: &DynamicImage, width: u32, color: bool) -> String {
    let (src_w, src_h) = img.dimensions();
    let rows = row_count(src_w, src_h, width);
    if rows == 0 || width == 0 {
        return String::new();
    }

    let resized = img.resize_exact(width, rows, FilterType::Triangle).to_rgb8();
    let mut out = String::with_capacity((width as usize + 1) * rows as usize);
    for row in resized.rows() {
        for pixel in row {
            let [r, g, b] = pixel.0;
            let ch = glyph(r, g, b);
            if color {
                let _ = write!(out, "\x1b[38;2;{r};{g};{b}m{ch}\x1b[0m");
            } else {
                out.push(ch);
            }
        }
        out.push('\n');
    }
    out
}

/// Decode by content: cached files may carry the fallback extension.
fn decode(path: &Path) -> Result<DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Load `path` and convert it. Failures come back as a one-line diagnostic.
pub(crate) fn image_to_ascii(path: &Path, width: u32, color: bool) -> String {
    match decode(path) {
        Ok(img) => convert(&img, width, color),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to decode image");
            let reason = match e {
                Error::Image(inner) => inner.to_string(),
                Error::Io(inner) => inner.to_string(),
                other => other.to_string(),
            };
            format!("[image error: {reason}]\n")
        }
    }
}
