// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! Chroma subsampling and reconstruction.

use crate::{error::Result, image::Plane};

/// 2x2 box average. Odd trailing rows and columns average with themselves.
pub fn downsample_h2v2(plane: &Plane) -> Result<Plane> {
    let width = plane.width().div_ceil(2);
    let height = plane.height().div_ceil(2);
    let mut out = Plane::new(width, height)?;
    for y in 0..height {
        for x in 0..width {
            let sum = plane.get_clamped(2 * x, 2 * y) as u32
                + plane.get_clamped(2 * x + 1, 2 * y) as u32
                + plane.get_clamped(2 * x, 2 * y + 1) as u32
                + plane.get_clamped(2 * x + 1, 2 * y + 1) as u32;
            out.row_mut(y)[x] = ((sum + 2) / 4) as u8;
        }
    }
    Ok(out)
}

/// Horizontal pairwise average.
pub fn downsample_h2v1(plane: &Plane) -> Result<Plane> {
    let width = plane.width().div_ceil(2);
    let mut out = Plane::new(width, plane.height())?;
    for y in 0..plane.height() {
        for x in 0..width {
            let sum =
                plane.get_clamped(2 * x, y) as u32 + plane.get_clamped(2 * x + 1, y) as u32;
            out.row_mut(y)[x] = ((sum + 1) / 2) as u8;
        }
    }
    Ok(out)
}

/// Maps full-resolution pixel positions onto a component plane whose
/// sampling factors are `samp` out of `max_samp` per axis. Only the top-left
/// `src_size` samples of the plane are considered valid.
pub struct Upsampler<'a> {
    plane: &'a Plane,
    src_size: (usize, usize),
    samp: (usize, usize),
    max_samp: (usize, usize),
}

impl<'a> Upsampler<'a> {
    pub fn new(
        plane: &'a Plane,
        src_size: (usize, usize),
        samp: (usize, usize),
        max_samp: (usize, usize),
    ) -> Self {
        Upsampler {
            plane,
            src_size: (src_size.0.max(1), src_size.1.max(1)),
            samp,
            max_samp,
        }
    }

    /// Nearest sample: `floor(x * samp / max_samp)`.
    pub fn nearest(&self, x: usize, y: usize) -> u8 {
        let sx = (x * self.samp.0 / self.max_samp.0).min(self.src_size.0 - 1);
        let sy = (y * self.samp.1 / self.max_samp.1).min(self.src_size.1 - 1);
        self.plane.get(sx, sy)
    }

    /// Bilinear interpolation with half-pixel centers, clamped at the edges.
    pub fn bilinear(&self, x: usize, y: usize) -> u8 {
        let (x0, x1, fx) = Self::taps(x, self.samp.0, self.max_samp.0, self.src_size.0);
        let (y0, y1, fy) = Self::taps(y, self.samp.1, self.max_samp.1, self.src_size.1);
        let top = lerp(self.plane.get(x0, y0), self.plane.get(x1, y0), fx);
        let bottom = lerp(self.plane.get(x0, y1), self.plane.get(x1, y1), fx);
        (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8
    }

    fn taps(pos: usize, samp: usize, max_samp: usize, size: usize) -> (usize, usize, f32) {
        let ratio = samp as f32 / max_samp as f32;
        let center = ((pos as f32 + 0.5) * ratio - 0.5).clamp(0.0, (size - 1) as f32);
        let lo = center.floor() as usize;
        let hi = (lo + 1).min(size - 1);
        (lo, hi, center - lo as f32)
    }
}

fn lerp(a: u8, b: u8, t: f32) -> f32 {
    a as f32 + (b as f32 - a as f32) * t
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn box_average() -> Result<()> {
        let plane = Plane::from_vec(3, 3, vec![0, 10, 100, 20, 30, 200, 40, 50, 0])?;
        let down = downsample_h2v2(&plane)?;
        assert_eq!((down.width(), down.height()), (2, 2));
        // (0 + 10 + 20 + 30 + 2) / 4 = 15; right column replicates.
        assert_eq!(down.data(), &[15, 150, 45, 0]);
        let down = downsample_h2v1(&plane)?;
        assert_eq!((down.width(), down.height()), (2, 3));
        assert_eq!(down.data(), &[5, 100, 25, 200, 45, 0]);
        Ok(())
    }

    #[test]
    fn bilinear_half_pixel_centers() -> Result<()> {
        let plane = Plane::from_vec(2, 1, vec![0, 100])?;
        let up = Upsampler::new(&plane, (2, 1), (1, 1), (2, 1));
        let row: Vec<u8> = (0..4).map(|x| up.bilinear(x, 0)).collect();
        assert_eq!(row, vec![0, 25, 75, 100]);
        let row: Vec<u8> = (0..4).map(|x| up.nearest(x, 0)).collect();
        assert_eq!(row, vec![0, 0, 100, 100]);
        Ok(())
    }

    #[test]
    fn flat_planes_stay_flat() -> Result<()> {
        let plane = Plane::filled(5, 7, 77)?;
        let down = downsample_h2v2(&plane)?;
        assert!(down.data().iter().all(|&v| v == 77));
        let up = Upsampler::new(&down, (3, 4), (1, 1), (2, 2));
        for y in 0..7 {
            for x in 0..5 {
                assert_eq!(up.bilinear(x, y), 77);
            }
        }
        Ok(())
    }
}
