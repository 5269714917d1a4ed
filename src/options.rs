// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
pub use crate::headers::{Density, DensityUnits};

pub const DEFAULT_QUALITY: u8 = 75;

/// How component samples are mapped onto full-resolution pixels when
/// converting color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Upsampling {
    /// Each pixel takes the chroma sample that covers it.
    #[default]
    Nearest,
    /// Bilinear interpolation between chroma sample centers.
    Bilinear,
}

/// Interpretation of four-component images whose Adobe marker declares
/// transform 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmykConvention {
    /// Samples are stored inverted, as Adobe applications write them.
    #[default]
    AdobeInverted,
    /// Samples are stored as plain CMYK.
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// RGB, three bytes per pixel, for every component count.
    #[default]
    Rgb,
    /// The decoded component samples, one byte per component per pixel,
    /// without color conversion.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecoderOptions {
    /// MCU rows that may be blanked after truncated data or a restart
    /// mismatch. 0 makes every such error fatal.
    pub max_damaged_rows: usize,
    /// Rejects frames with more pixels than this.
    pub max_pixels: Option<usize>,
    pub upsampling: Upsampling,
    pub cmyk_convention: CmykConvention,
    /// Forces (`Some(true)`) or suppresses (`Some(false)`) the YCbCr/YCCK
    /// to RGB step, overriding the Adobe marker.
    pub color_transform: Option<bool>,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subsampling {
    /// No chroma subsampling.
    S444,
    /// Chroma halved horizontally.
    S422,
    /// Chroma halved in both directions.
    #[default]
    S420,
}

impl Subsampling {
    /// Luma sampling factors (horizontal, vertical); chroma is always 1x1.
    pub fn luma_factors(self) -> (u8, u8) {
        match self {
            Subsampling::S444 => (1, 1),
            Subsampling::S422 => (2, 1),
            Subsampling::S420 => (2, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// 1..=100.
    pub quality: u8,
    pub subsampling: Subsampling,
    /// MCUs between restart markers; 0 disables them.
    pub restart_interval: u16,
    pub density: Density,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            quality: DEFAULT_QUALITY,
            subsampling: Subsampling::default(),
            restart_interval: 0,
            density: Density::default(),
        }
    }
}
