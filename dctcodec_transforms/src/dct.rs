// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{BLOCK_DIM, BLOCK_SIZE};

// cos(k * pi / 16) for k in 0..8.
#[allow(clippy::excessive_precision)]
const COS_PI_16THS: [f32; 8] = [
    1.0,
    0.980_785_280_403_230_4,
    0.923_879_532_511_286_7,
    0.831_469_612_302_545_2,
    0.707_106_781_186_547_5,
    0.555_570_233_019_602_2,
    0.382_683_432_365_089_8,
    0.195_090_322_016_128_3,
];

/// 1 / (2 * sqrt(2)), the orthonormal scale of the DC basis function.
#[allow(clippy::excessive_precision)]
const ALPHA_0: f32 = 0.353_553_390_593_273_8;
const ALPHA_K: f32 = 0.5;

/// Returns cos(m * pi / 16) for any non-negative `m`.
const fn cos_pi_16(m: usize) -> f32 {
    let mut m = m % 32;
    if m > 16 {
        m = 32 - m;
    }
    if m < 8 {
        COS_PI_16THS[m]
    } else if m == 8 {
        0.0
    } else {
        -COS_PI_16THS[16 - m]
    }
}

const fn alpha(k: usize) -> f32 {
    if k == 0 { ALPHA_0 } else { ALPHA_K }
}

const fn build_dct_matrix() -> [[f32; BLOCK_DIM]; BLOCK_DIM] {
    let mut matrix = [[0.0f32; BLOCK_DIM]; BLOCK_DIM];
    let mut k = 0;
    while k < BLOCK_DIM {
        let mut n = 0;
        while n < BLOCK_DIM {
            matrix[k][n] = alpha(k) * cos_pi_16((2 * n + 1) * k);
            n += 1;
        }
        k += 1;
    }
    matrix
}

/// `DCT_MATRIX[k][n] = alpha(k) * cos(pi * (2n + 1) * k / 16)`.
///
/// Row `k` is the k-th orthonormal basis vector, so the matrix is its own
/// inverse once transposed.
pub const DCT_MATRIX: [[f32; BLOCK_DIM]; BLOCK_DIM] = build_dct_matrix();

#[inline(always)]
fn dct1d(input: &[f32], output: &mut [f32]) {
    for (k, out) in output.iter_mut().enumerate() {
        *out = DCT_MATRIX[k]
            .iter()
            .zip(input.iter())
            .map(|(c, x)| c * x)
            .sum();
    }
}

#[inline(always)]
fn idct1d(input: &[f32], output: &mut [f32]) {
    for (n, out) in output.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (k, x) in input.iter().enumerate() {
            sum += DCT_MATRIX[k][n] * x;
        }
        *out = sum;
    }
}

#[inline(always)]
fn transpose(block: &mut [f32; BLOCK_SIZE]) {
    for y in 0..BLOCK_DIM {
        for x in (y + 1)..BLOCK_DIM {
            block.swap(y * BLOCK_DIM + x, x * BLOCK_DIM + y);
        }
    }
}

fn rows(
    input: &[f32; BLOCK_SIZE],
    output: &mut [f32; BLOCK_SIZE],
    transform: fn(&[f32], &mut [f32]),
) {
    for (src, dst) in input
        .chunks_exact(BLOCK_DIM)
        .zip(output.chunks_exact_mut(BLOCK_DIM))
    {
        transform(src, dst);
    }
}

/// Forward 2D DCT-II of a natural-order (row-major) 8x8 block.
///
/// Rows are transformed first, then columns. The input is expected to be
/// level-shifted already (see [`crate::level_shift_to_float`]).
pub fn forward_dct_8x8(input: &[f32; BLOCK_SIZE], output: &mut [f32; BLOCK_SIZE]) {
    let mut tmp = [0.0f32; BLOCK_SIZE];
    rows(input, &mut tmp, dct1d);
    transpose(&mut tmp);
    rows(&tmp, output, dct1d);
    transpose(output);
}

/// Inverse 2D DCT (DCT-III) of a natural-order 8x8 coefficient block.
///
/// Columns are transformed first, then rows.
pub fn inverse_dct_8x8(input: &[f32; BLOCK_SIZE], output: &mut [f32; BLOCK_SIZE]) {
    let mut transposed = *input;
    transpose(&mut transposed);
    let mut tmp = [0.0f32; BLOCK_SIZE];
    rows(&transposed, &mut tmp, idct1d);
    transpose(&mut tmp);
    rows(&tmp, output, idct1d);
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn cos_table_symmetry() {
        assert_eq!(cos_pi_16(0), 1.0);
        assert_eq!(cos_pi_16(8), 0.0);
        assert_eq!(cos_pi_16(16), -1.0);
        assert_eq!(cos_pi_16(24), 0.0);
        assert_eq!(cos_pi_16(32), 1.0);
        for m in 0..64 {
            let expected = (m as f64 * std::f64::consts::PI / 16.0).cos();
            assert!((cos_pi_16(m) as f64 - expected).abs() < 1e-6, "m = {m}");
        }
    }

    #[test]
    fn matrix_is_orthonormal() {
        for a in 0..BLOCK_DIM {
            for b in 0..BLOCK_DIM {
                let dot: f32 = (0..BLOCK_DIM)
                    .map(|n| DCT_MATRIX[a][n] * DCT_MATRIX[b][n])
                    .sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-5, "rows {a} and {b}: {dot}");
            }
        }
    }

    #[test]
    fn flat_block_has_only_dc() {
        let input = [-28.0f32; BLOCK_SIZE];
        let mut output = [0.0f32; BLOCK_SIZE];
        forward_dct_8x8(&input, &mut output);
        assert!((output[0] - (-28.0 * 8.0)).abs() < 1e-3);
        for coeff in &output[1..] {
            assert!(coeff.abs() < 1e-3);
        }
    }

    #[test]
    fn dc_only_inverse_is_flat() {
        let mut input = [0.0f32; BLOCK_SIZE];
        input[0] = 80.0;
        let mut output = [0.0f32; BLOCK_SIZE];
        inverse_dct_8x8(&input, &mut output);
        for sample in output {
            assert!((sample - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn horizontal_cosine_maps_to_first_row() {
        // A pattern that only varies along x lands entirely in row 0 of the output.
        let mut input = [0.0f32; BLOCK_SIZE];
        for y in 0..BLOCK_DIM {
            for x in 0..BLOCK_DIM {
                input[y * BLOCK_DIM + x] = DCT_MATRIX[3][x] * 100.0;
            }
        }
        let mut output = [0.0f32; BLOCK_SIZE];
        forward_dct_8x8(&input, &mut output);
        for (i, coeff) in output.iter().enumerate() {
            let expected = if i == 3 { 100.0 * 8.0f32.sqrt() } else { 0.0 };
            assert!((coeff - expected).abs() < 1e-3, "index {i}: {coeff}");
        }
    }
}
