// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
#![no_main]

use dctcodec::{
    Decoder,
    options::{DecoderOptions, OutputFormat, Upsampling},
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for (output_format, upsampling, max_damaged_rows) in [
        (OutputFormat::Rgb, Upsampling::Nearest, 0),
        (OutputFormat::Raw, Upsampling::Nearest, 4),
        (OutputFormat::Rgb, Upsampling::Bilinear, usize::MAX),
    ] {
        let decoder = Decoder::new(DecoderOptions {
            max_pixels: Some(1 << 22),
            max_damaged_rows,
            upsampling,
            output_format,
            ..Default::default()
        });
        if let Ok(image) = decoder.decode(data) {
            assert_eq!(
                image.pixels.len(),
                image.width() * image.height() * image.channels
            );
        }
    }
});
