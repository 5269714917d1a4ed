// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! Direct O(N^4) evaluation of the 2D DCT formulas, used to check the
//! separable implementation.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::{BLOCK_DIM, BLOCK_SIZE};

#[inline(always)]
fn alpha(u: usize) -> f64 {
    if u == 0 { FRAC_1_SQRT_2 * 0.5 } else { 0.5 }
}

#[inline(always)]
fn basis(spatial: usize, freq: usize) -> f64 {
    ((2 * spatial + 1) as f64 * freq as f64 * PI / (2 * BLOCK_DIM) as f64).cos()
}

/// `X[u][v] = a(u) a(v) sum_y sum_x x[y][x] cos((2y+1)u pi/16) cos((2x+1)v pi/16)`
pub fn forward_dct_2d(input: &[f64; BLOCK_SIZE]) -> [f64; BLOCK_SIZE] {
    let mut output = [0.0f64; BLOCK_SIZE];
    for u in 0..BLOCK_DIM {
        for v in 0..BLOCK_DIM {
            let mut sum = 0.0;
            for y in 0..BLOCK_DIM {
                for x in 0..BLOCK_DIM {
                    sum += input[y * BLOCK_DIM + x] * basis(y, u) * basis(x, v);
                }
            }
            output[u * BLOCK_DIM + v] = alpha(u) * alpha(v) * sum;
        }
    }
    output
}

/// `x[y][x] = sum_u sum_v a(u) a(v) X[u][v] cos((2y+1)u pi/16) cos((2x+1)v pi/16)`
pub fn inverse_dct_2d(input: &[f64; BLOCK_SIZE]) -> [f64; BLOCK_SIZE] {
    let mut output = [0.0f64; BLOCK_SIZE];
    for y in 0..BLOCK_DIM {
        for x in 0..BLOCK_DIM {
            let mut sum = 0.0;
            for u in 0..BLOCK_DIM {
                for v in 0..BLOCK_DIM {
                    sum += alpha(u)
                        * alpha(v)
                        * input[u * BLOCK_DIM + v]
                        * basis(y, u)
                        * basis(x, v);
                }
            }
            output[y * BLOCK_DIM + x] = sum;
        }
    }
    output
}
