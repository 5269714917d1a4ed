// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use dctcodec_transforms::{BLOCK_DIM, BLOCK_SIZE};

use crate::{
    error::{Error, Result},
    util::tracing_wrappers::*,
};

/// A single-channel 8-bit sample plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Result<Plane> {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Result<Plane> {
        let total_size = width
            .checked_mul(height)
            .ok_or(Error::ImageTooLarge(width, height))?;
        trace!("allocating {width}x{height} plane");
        let mut data = vec![];
        data.try_reserve_exact(total_size)?;
        data.resize(total_size, value);
        Ok(Plane {
            width,
            height,
            data,
        })
    }

    /// Wraps row-major samples. `data.len()` must be `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Result<Plane> {
        if Some(data.len()) != width.checked_mul(height) {
            return Err(Error::BufferSizeMismatch(
                width.saturating_mul(height),
                data.len(),
            ));
        }
        Ok(Plane {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Sample at (x, y) with coordinates clamped into the plane.
    pub fn get_clamped(&self, x: usize, y: usize) -> u8 {
        self.get(x.min(self.width - 1), y.min(self.height - 1))
    }

    /// Copies the 8x8 block at block coordinates (bx, by), replicating edge
    /// samples for positions past the right or bottom border.
    pub fn read_block(&self, bx: usize, by: usize, block: &mut [u8; BLOCK_SIZE]) {
        for dy in 0..BLOCK_DIM {
            let y = (by * BLOCK_DIM + dy).min(self.height - 1);
            let row = self.row(y);
            for dx in 0..BLOCK_DIM {
                let x = (bx * BLOCK_DIM + dx).min(self.width - 1);
                block[dy * BLOCK_DIM + dx] = row[x];
            }
        }
    }

    /// Stores the 8x8 block at block coordinates (bx, by). Samples that fall
    /// outside the plane are dropped.
    pub fn write_block(&mut self, bx: usize, by: usize, block: &[u8; BLOCK_SIZE]) {
        let x0 = bx * BLOCK_DIM;
        let y0 = by * BLOCK_DIM;
        if x0 >= self.width || y0 >= self.height {
            return;
        }
        let columns = BLOCK_DIM.min(self.width - x0);
        for dy in 0..BLOCK_DIM.min(self.height - y0) {
            let row = self.row_mut(y0 + dy);
            row[x0..x0 + columns]
                .copy_from_slice(&block[dy * BLOCK_DIM..dy * BLOCK_DIM + columns]);
        }
    }

    /// Sets rows `y0..y1` (clamped to the plane) to `value`.
    pub fn fill_rows(&mut self, y0: usize, y1: usize, value: u8) {
        let y1 = y1.min(self.height);
        if y0 < y1 {
            self.data[y0 * self.width..y1 * self.width].fill(value);
        }
    }
}
