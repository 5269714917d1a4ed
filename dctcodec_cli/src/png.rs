// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::{Cursor, Write};

use color_eyre::eyre::{Result, eyre};

use crate::RasterImage;

fn png_color(num_channels: usize) -> Result<png::ColorType> {
    match num_channels {
        1 => Ok(png::ColorType::Grayscale),
        3 => Ok(png::ColorType::Rgb),
        _ => Err(eyre!(
            "Invalid number of channels for PNG output {:?}",
            num_channels
        )),
    }
}

/// Decodes a PNG to 8-bit gray or RGB. Palettes are expanded and alpha is
/// dropped.
pub fn decode(data: &[u8]) -> Result<RasterImage> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let (width, height) = (reader.info().width, reader.info().height);
    let (color_type, _) = reader.output_color_type();
    let mut buf = vec![0; width as usize * height as usize * color_type.samples()];
    let frame = reader.next_frame(&mut buf)?;
    buf.truncate(frame.buffer_size());
    let (channels, keep) = match frame.color_type {
        png::ColorType::Grayscale => (1, 1),
        png::ColorType::GrayscaleAlpha => (1, 2),
        png::ColorType::Rgb => (3, 3),
        png::ColorType::Rgba => (3, 4),
        other => return Err(eyre!("Unexpected PNG color type {other:?}")),
    };
    let data = if channels == keep {
        buf
    } else {
        buf.chunks_exact(keep)
            .flat_map(|pixel| pixel[..channels].iter().copied())
            .collect()
    };
    Ok(RasterImage {
        width,
        height,
        channels,
        data,
    })
}

pub fn encode<W: Write>(image: &RasterImage, w: &mut W) -> Result<()> {
    let mut encoder = png::Encoder::new(w, image.width, image.height);
    encoder.set_color(png_color(image.channels)?);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.data)?;
    writer.finish()?;
    Ok(())
}
