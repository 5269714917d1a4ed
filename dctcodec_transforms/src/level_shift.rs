// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::BLOCK_SIZE;

/// Center of the 8-bit sample range.
pub const LEVEL_SHIFT: f32 = 128.0;

/// Converts 8-bit samples to the signed range the forward DCT expects.
pub fn level_shift_to_float(pixels: &[u8; BLOCK_SIZE], output: &mut [f32; BLOCK_SIZE]) {
    for (out, &p) in output.iter_mut().zip(pixels.iter()) {
        *out = p as f32 - LEVEL_SHIFT;
    }
}

/// Converts inverse-DCT output back to 8-bit samples, rounding to nearest and
/// clamping to [0, 255].
pub fn level_shift_to_bytes(samples: &[f32; BLOCK_SIZE], output: &mut [u8; BLOCK_SIZE]) {
    for (out, &s) in output.iter_mut().zip(samples.iter()) {
        *out = clamp_sample(s + LEVEL_SHIFT);
    }
}

#[inline]
pub fn clamp_sample(value: f32) -> u8 {
    // NaN saturates to 0 through the float-to-int cast.
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn shift_round_trip() {
        let pixels: [u8; BLOCK_SIZE] = std::array::from_fn(|i| (i * 4) as u8);
        let mut floats = [0.0; BLOCK_SIZE];
        level_shift_to_float(&pixels, &mut floats);
        assert_eq!(floats[0], -128.0);
        assert_eq!(floats[63], 252.0 - 128.0);
        let mut back = [0u8; BLOCK_SIZE];
        level_shift_to_bytes(&floats, &mut back);
        assert_eq!(pixels, back);
    }

    #[test]
    fn clamps_and_rounds() {
        assert_eq!(clamp_sample(-3.0), 0);
        assert_eq!(clamp_sample(300.0), 255);
        assert_eq!(clamp_sample(12.49), 12);
        assert_eq!(clamp_sample(12.5), 13);
        assert_eq!(clamp_sample(f32::NAN), 0);
    }
}
