// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use super::{Component, FrameInfo};
use crate::{
    color::{AdobeTransform, cmyk_to_rgb, ycbcr_to_rgb, ycck_to_cmyk},
    error::{Error, Result},
    headers::FrameHeader,
    options::{CmykConvention, DecoderOptions, OutputFormat, Upsampling},
    sample::Upsampler,
    util::tracing_wrappers::*,
};

fn upsamplers<'a>(frame: &FrameHeader, components: &'a [Component]) -> Vec<Upsampler<'a>> {
    let max_samp = (frame.max_h_samp_factor(), frame.max_v_samp_factor());
    components
        .iter()
        .map(|c| {
            Upsampler::new(
                &c.plane,
                c.size,
                (c.info.h_samp_factor as usize, c.info.v_samp_factor as usize),
                max_samp,
            )
        })
        .collect()
}

/// Whether a three-component image holds YCbCr.
fn is_ycbcr(options: &DecoderOptions, info: &FrameInfo) -> bool {
    options
        .color_transform
        .unwrap_or(info.adobe.is_none_or(|adobe| adobe.transform_code != 0))
}

/// Whether a four-component image holds YCCK.
fn is_ycck(options: &DecoderOptions, info: &FrameInfo) -> bool {
    options
        .color_transform
        .unwrap_or(info.adobe_transform() == Some(AdobeTransform::Ycck))
}

/// Whether four-component samples are stored inverted.
fn is_inverted(options: &DecoderOptions, info: &FrameInfo) -> bool {
    options.cmyk_convention == CmykConvention::AdobeInverted
        && info.adobe.is_some_and(|adobe| adobe.transform_code == 0)
}

/// Interleaves the decoded planes into the requested output format and
/// returns the channel count with the pixels.
pub(super) fn render(
    options: &DecoderOptions,
    info: &FrameInfo,
    frame: &FrameHeader,
    components: &[Component],
) -> Result<(usize, Vec<u8>)> {
    let (width, height) = (info.width, info.height);
    let channels = match options.output_format {
        OutputFormat::Raw => components.len(),
        OutputFormat::Rgb => 3,
    };
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(width * height * channels)?;
    let planes = upsamplers(frame, components);

    if options.output_format == OutputFormat::Raw {
        for y in 0..height {
            for x in 0..width {
                pixels.extend(planes.iter().map(|p| p.nearest(x, y)));
            }
        }
        return Ok((channels, pixels));
    }

    let bilinear = options.upsampling == Upsampling::Bilinear;
    let sample = |plane: &Upsampler<'_>, x: usize, y: usize| -> u8 {
        if bilinear {
            plane.bilinear(x, y)
        } else {
            plane.nearest(x, y)
        }
    };

    match planes.as_slice() {
        [gray] => {
            for y in 0..height {
                for x in 0..width {
                    let v = gray.nearest(x, y);
                    pixels.extend([v, v, v]);
                }
            }
        }
        [p0, p1, p2] => {
            let ycbcr = is_ycbcr(options, info);
            debug!("rendering 3 components, YCbCr: {ycbcr}");
            for y in 0..height {
                for x in 0..width {
                    let (a, b, c) = (sample(p0, x, y), sample(p1, x, y), sample(p2, x, y));
                    if ycbcr {
                        pixels.extend(ycbcr_to_rgb(a, b, c));
                    } else {
                        pixels.extend([a, b, c]);
                    }
                }
            }
        }
        [p0, p1, p2, p3] => {
            let ycck = is_ycck(options, info);
            let inverted = is_inverted(options, info);
            debug!("rendering 4 components, YCCK: {ycck}, inverted: {inverted}");
            for y in 0..height {
                for x in 0..width {
                    let mut cmyk = [
                        sample(p0, x, y),
                        sample(p1, x, y),
                        sample(p2, x, y),
                        sample(p3, x, y),
                    ];
                    if ycck {
                        cmyk = ycck_to_cmyk(cmyk[0], cmyk[1], cmyk[2], cmyk[3]);
                    } else if inverted {
                        cmyk = cmyk.map(|v| 255 - v);
                    }
                    pixels.extend(cmyk_to_rgb(cmyk[0], cmyk[1], cmyk[2], cmyk[3]));
                }
            }
        }
        _ => return Err(Error::InvalidComponentCount(planes.len())),
    }
    Ok((channels, pixels))
}
