// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod png;
pub mod pnm;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};

/// Interleaved 8-bit samples, one or three channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub data: Vec<u8>,
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Reads a PNM (P5/P6) or PNG file, chosen by extension.
pub fn read_image(path: &Path) -> Result<RasterImage> {
    let data = std::fs::read(path).wrap_err_with(|| format!("Cannot read {path:?}"))?;
    match extension(path).as_str() {
        "ppm" | "pgm" | "pnm" => pnm::parse(&data),
        "png" => png::decode(&data),
        other => Err(eyre!("Unsupported input format {other:?}")),
    }
    .wrap_err_with(|| format!("Cannot decode {path:?}"))
}

/// Writes PPM, PGM or PNG, chosen by extension.
pub fn write_image(path: &Path, image: &RasterImage) -> Result<()> {
    let mut out = Vec::new();
    match (extension(path).as_str(), image.channels) {
        ("pgm", 1) | ("ppm", 3) | ("pnm", 1 | 3) => pnm::write(image, &mut out)?,
        ("png", _) => png::encode(image, &mut out)?,
        (ext, channels) => {
            return Err(eyre!(
                "Cannot write {channels}-channel image as {ext:?}; use .pgm, .ppm or .png"
            ));
        }
    }
    std::fs::write(path, out).wrap_err_with(|| format!("Cannot write {path:?}"))
}
