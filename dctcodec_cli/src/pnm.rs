// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::Write;

use color_eyre::eyre::{Result, eyre};

use crate::RasterImage;

/// Skips whitespace and `#` comments, then reads one decimal header field.
fn header_field(data: &[u8], pos: &mut usize) -> Result<u32> {
    loop {
        match data.get(*pos) {
            Some(b'#') => {
                while data.get(*pos).is_some_and(|&c| c != b'\n') {
                    *pos += 1;
                }
            }
            Some(c) if c.is_ascii_whitespace() => *pos += 1,
            Some(_) => break,
            None => return Err(eyre!("Truncated PNM header")),
        }
    }
    let start = *pos;
    while data.get(*pos).is_some_and(u8::is_ascii_digit) {
        *pos += 1;
    }
    std::str::from_utf8(&data[start..*pos])?
        .parse()
        .map_err(|_| eyre!("Invalid PNM header field at offset {start}"))
}

/// Parses binary PGM (P5) or PPM (P6) with a maximum value of 255.
pub fn parse(data: &[u8]) -> Result<RasterImage> {
    let channels = match data.get(..2) {
        Some(b"P5") => 1,
        Some(b"P6") => 3,
        _ => return Err(eyre!("Only binary PGM (P5) and PPM (P6) are supported")),
    };
    let mut pos = 2;
    let width = header_field(data, &mut pos)?;
    let height = header_field(data, &mut pos)?;
    let maxval = header_field(data, &mut pos)?;
    if maxval != 255 {
        return Err(eyre!("Unsupported PNM maximum value {maxval}"));
    }
    // Exactly one whitespace byte separates the header from the samples.
    pos += 1;
    let len = width as usize * height as usize * channels;
    let samples = data
        .get(pos..pos + len)
        .ok_or_else(|| eyre!("PNM data too short: expected {len} samples"))?;
    Ok(RasterImage {
        width,
        height,
        channels,
        data: samples.to_vec(),
    })
}

pub fn write<W: Write>(image: &RasterImage, w: &mut W) -> Result<()> {
    let magic = match image.channels {
        1 => "P5",
        3 => "P6",
        n => return Err(eyre!("PNM cannot hold {n} channels")),
    };
    write!(w, "{magic}\n{} {}\n255\n", image.width, image.height)?;
    w.write_all(&image.data)?;
    Ok(())
}
