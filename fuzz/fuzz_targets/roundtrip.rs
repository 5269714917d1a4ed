// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
#![no_main]

use dctcodec::{Decoder, Encoder, options::Subsampling};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&[width, quality, mode], pixels)) = data.split_first_chunk::<3>() else {
        return;
    };
    let width = width as usize % 64 + 1;
    let height = pixels.len() / 3 / width;
    if height == 0 {
        return;
    }
    let rgb = &pixels[..width * height * 3];
    let subsampling = match mode % 3 {
        0 => Subsampling::S444,
        1 => Subsampling::S422,
        _ => Subsampling::S420,
    };
    let jpeg = Encoder::new()
        .quality(quality % 100 + 1)
        .subsampling(subsampling)
        .restart_interval((mode / 3) as u16 % 4)
        .encode_rgb(rgb, width as u32, height as u32)
        .expect("valid input must encode");
    let image = Decoder::default()
        .decode(&jpeg)
        .expect("encoder output must decode");
    assert_eq!((image.width(), image.height()), (width, height));
    assert_eq!(image.damaged_rows, 0);
});
