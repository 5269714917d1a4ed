// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! BT.601 (JFIF) color conversion in 16-bit fixed point, plus the CMYK and
//! YCCK rules used for four-component images.

use num_derive::FromPrimitive;

const SCALE_BITS: i32 = 16;
const ONE_HALF: i32 = 1 << (SCALE_BITS - 1);
const CENTER: i32 = 128;

const fn fix(x: f64) -> i32 {
    (x * (1i64 << SCALE_BITS) as f64 + 0.5) as i32
}

const FIX_0_29900: i32 = fix(0.29900);
const FIX_0_58700: i32 = fix(0.58700);
const FIX_0_11400: i32 = fix(0.11400);
const FIX_0_16874: i32 = fix(0.16874);
const FIX_0_33126: i32 = fix(0.33126);
const FIX_0_50000: i32 = fix(0.50000);
const FIX_0_41869: i32 = fix(0.41869);
const FIX_0_08131: i32 = fix(0.08131);

const FIX_1_40200: i32 = fix(1.40200);
const FIX_0_34414: i32 = fix(0.34414);
const FIX_0_71414: i32 = fix(0.71414);
const FIX_1_77200: i32 = fix(1.77200);

/// Color transform code of an Adobe APP14 segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum AdobeTransform {
    /// RGB or CMYK stored directly. For CMYK, Adobe writes inverted values.
    Unknown = 0,
    YCbCr = 1,
    Ycck = 2,
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let y = (FIX_0_29900 * r + FIX_0_58700 * g + FIX_0_11400 * b + ONE_HALF) >> SCALE_BITS;
    let cb = ((-FIX_0_16874 * r - FIX_0_33126 * g + FIX_0_50000 * b + ONE_HALF) >> SCALE_BITS)
        + CENTER;
    let cr = ((FIX_0_50000 * r - FIX_0_41869 * g - FIX_0_08131 * b + ONE_HALF) >> SCALE_BITS)
        + CENTER;
    [clamp_u8(y), clamp_u8(cb), clamp_u8(cr)]
}

#[inline]
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = (y as i32) << SCALE_BITS;
    let cb = cb as i32 - CENTER;
    let cr = cr as i32 - CENTER;
    let r = (y + FIX_1_40200 * cr + ONE_HALF) >> SCALE_BITS;
    let g = (y - FIX_0_34414 * cb - FIX_0_71414 * cr + ONE_HALF) >> SCALE_BITS;
    let b = (y + FIX_1_77200 * cb + ONE_HALF) >> SCALE_BITS;
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

/// `channel = 255 * (1 - c/255) * (1 - k/255)`, rounded.
#[inline]
pub fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u32;
    let channel = |v: u8| (((255 - v as u32) * k + 127) / 255) as u8;
    [channel(c), channel(m), channel(y)]
}

/// Inverse-YCbCr on the first three channels, inverted to C, M, Y.
#[inline]
pub fn ycck_to_cmyk(y: u8, cb: u8, cr: u8, k: u8) -> [u8; 4] {
    let [r, g, b] = ycbcr_to_rgb(y, cb, cr);
    [255 - r, 255 - g, 255 - b, k]
}

/// Splits interleaved RGB into Y, Cb and Cr planes.
pub fn rgb_to_ycbcr_planes(rgb: &[u8]) -> [Vec<u8>; 3] {
    let pixels = rgb.len() / 3;
    let mut planes = [
        Vec::with_capacity(pixels),
        Vec::with_capacity(pixels),
        Vec::with_capacity(pixels),
    ];
    for pixel in rgb.chunks_exact(3) {
        let ycc = rgb_to_ycbcr(pixel[0], pixel[1], pixel[2]);
        for (plane, value) in planes.iter_mut().zip(ycc) {
            plane.push(value);
        }
    }
    planes
}
