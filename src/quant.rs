// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use dctcodec_transforms::BLOCK_SIZE;

use crate::error::{Error, Result};

/// Maps a zigzag index to its row-major position.
pub const ZIGZAG_TO_NATURAL: [usize; BLOCK_SIZE] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Maps a row-major position to its zigzag index.
pub const NATURAL_TO_ZIGZAG: [usize; BLOCK_SIZE] = {
    let mut inverse = [0; BLOCK_SIZE];
    let mut i = 0;
    while i < BLOCK_SIZE {
        inverse[ZIGZAG_TO_NATURAL[i]] = i;
        i += 1;
    }
    inverse
};

pub fn to_zigzag<T: Copy>(natural: &[T; BLOCK_SIZE]) -> [T; BLOCK_SIZE] {
    array_init::array_init(|i| natural[ZIGZAG_TO_NATURAL[i]])
}

pub fn from_zigzag<T: Copy>(zigzag: &[T; BLOCK_SIZE]) -> [T; BLOCK_SIZE] {
    array_init::array_init(|i| zigzag[NATURAL_TO_ZIGZAG[i]])
}

/// Annex K.1 luminance table, row-major.
pub const STD_LUMINANCE_QUANT: [u16; BLOCK_SIZE] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// Annex K.2 chrominance table, row-major.
pub const STD_CHROMINANCE_QUANT: [u16; BLOCK_SIZE] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

/// Percentage applied to the base tables for a quality in 1..=100.
pub fn quality_scale(quality: u8) -> Result<u32> {
    if !(1..=100).contains(&quality) {
        return Err(Error::InvalidQuality(quality));
    }
    let quality = quality as u32;
    Ok(if quality < 50 {
        5000 / quality
    } else {
        200 - quality * 2
    })
}

/// 64 step sizes in row-major order, all non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    values: [u16; BLOCK_SIZE],
}

impl QuantTable {
    pub fn new(values: [u16; BLOCK_SIZE]) -> Option<Self> {
        if values.contains(&0) {
            return None;
        }
        Some(QuantTable { values })
    }

    /// Builds a table from DQT-order (zigzag) entries.
    pub fn from_zigzag(entries: &[u16; BLOCK_SIZE]) -> Option<Self> {
        Self::new(from_zigzag(entries))
    }

    /// Scales `base` for `quality`, clamping each entry to 1..=255.
    pub fn scaled(base: &[u16; BLOCK_SIZE], quality: u8) -> Result<Self> {
        let scale = quality_scale(quality)?;
        let values = array_init::array_init(|i| {
            ((base[i] as u32 * scale + 50) / 100).clamp(1, 255) as u16
        });
        Ok(QuantTable { values })
    }

    pub fn luminance(quality: u8) -> Result<Self> {
        Self::scaled(&STD_LUMINANCE_QUANT, quality)
    }

    pub fn chrominance(quality: u8) -> Result<Self> {
        Self::scaled(&STD_CHROMINANCE_QUANT, quality)
    }

    pub fn values(&self) -> &[u16; BLOCK_SIZE] {
        &self.values
    }

    pub fn zigzag(&self) -> [u16; BLOCK_SIZE] {
        to_zigzag(&self.values)
    }

    /// Divides and rounds half away from zero.
    pub fn quantize(&self, coefficients: &[f32; BLOCK_SIZE], output: &mut [i32; BLOCK_SIZE]) {
        for ((out, &c), &q) in output.iter_mut().zip(coefficients).zip(&self.values) {
            *out = (c / q as f32).round() as i32;
        }
    }

    pub fn dequantize(&self, coefficients: &[i32; BLOCK_SIZE], output: &mut [f32; BLOCK_SIZE]) {
        for ((out, &c), &q) in output.iter_mut().zip(coefficients).zip(&self.values) {
            *out = c as f32 * q as f32;
        }
    }
}
