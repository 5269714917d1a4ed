// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! 8x8 DCT-II / DCT-III transforms used by baseline JPEG.
//!
//! The fast path ([`forward_dct_8x8`], [`inverse_dct_8x8`]) is a separable
//! row-column transform over `f32`. [`slow`] holds the direct double-sum
//! formulas in `f64`, which the fast path is tested against.

pub mod dct;
pub mod level_shift;
pub mod slow;

pub use dct::*;
pub use level_shift::*;

/// Side of a DCT block.
pub const BLOCK_DIM: usize = 8;
/// Number of samples (or coefficients) in a DCT block.
pub const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;
