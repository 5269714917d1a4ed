// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! Baseline JPEG encoding with the standard Huffman tables.

use std::io::Write;

use dctcodec_transforms::{BLOCK_SIZE, forward_dct_8x8, level_shift_to_float};

use crate::{
    bit_writer::BitWriter,
    color::rgb_to_ycbcr_planes,
    error::{Error, Result},
    headers::{
        ComponentInfo, FrameHeader, JfifInfo, ScanHeader, markers,
        tables::{write_dht, write_dqt, write_dri},
    },
    huffman::{HuffmanEncodeTable, HuffmanSpec, TableClass},
    image::Plane,
    options::{Density, EncoderOptions, Subsampling},
    quant::{QuantTable, ZIGZAG_TO_NATURAL, quality_scale},
    sample::{downsample_h2v1, downsample_h2v2},
    util::tracing_wrappers::*,
};

const MAX_DIMENSION: u32 = u16::MAX as u32;
/// Largest AC magnitude with a Huffman category in the standard tables.
const MAX_AC_MAGNITUDE: i32 = (1 << 10) - 1;
const EOB: u8 = 0x00;
const ZRL: u8 = 0xF0;

/// JPEG encoder with builder-style configuration.
///
/// ```
/// use dctcodec::{Encoder, options::Subsampling};
///
/// let rgb = vec![200u8; 16 * 16 * 3];
/// let jpeg = Encoder::new()
///     .quality(90)
///     .subsampling(Subsampling::S444)
///     .encode_rgb(&rgb, 16, 16)
///     .unwrap();
/// assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncoderOptions,
}

/// Quantization and Huffman tables bound to one component.
struct ComponentTables<'t> {
    quant: &'t QuantTable,
    dc: &'t HuffmanEncodeTable,
    ac: &'t HuffmanEncodeTable,
}

impl Encoder {
    pub fn new() -> Encoder {
        Encoder::default()
    }

    pub fn with_options(options: EncoderOptions) -> Encoder {
        Encoder { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Quality in 1..=100. Out-of-range values fail when encoding.
    pub fn quality(mut self, quality: u8) -> Self {
        self.options.quality = quality;
        self
    }

    pub fn subsampling(mut self, subsampling: Subsampling) -> Self {
        self.options.subsampling = subsampling;
        self
    }

    /// MCUs between restart markers, 0 to disable.
    pub fn restart_interval(mut self, interval: u16) -> Self {
        self.options.restart_interval = interval;
        self
    }

    pub fn density(mut self, density: Density) -> Self {
        self.options.density = density;
        self
    }

    /// Encodes 8-bit grayscale samples, one byte per pixel.
    pub fn encode_gray(&self, gray: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_gray_to_writer(gray, width, height, &mut out)?;
        Ok(out)
    }

    /// Encodes interleaved RGB, three bytes per pixel.
    pub fn encode_rgb(&self, rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_rgb_to_writer(rgb, width, height, &mut out)?;
        Ok(out)
    }

    pub fn encode_gray_to_writer<W: Write>(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
        writer: W,
    ) -> Result<()> {
        let (w, h) = self.validate(gray.len(), width, height, 1)?;
        let mut data = Vec::new();
        data.try_reserve_exact(gray.len())?;
        data.extend_from_slice(gray);
        let frame = FrameHeader {
            precision: 8,
            width: w as u16,
            height: h as u16,
            components: vec![component(1, (1, 1), 0)],
        };
        self.write_image(writer, &frame, &[Plane::from_vec(w, h, data)?])
    }

    pub fn encode_rgb_to_writer<W: Write>(
        &self,
        rgb: &[u8],
        width: u32,
        height: u32,
        writer: W,
    ) -> Result<()> {
        let (w, h) = self.validate(rgb.len(), width, height, 3)?;
        let [y, cb, cr] = rgb_to_ycbcr_planes(rgb);
        let luma = Plane::from_vec(w, h, y)?;
        let cb = Plane::from_vec(w, h, cb)?;
        let cr = Plane::from_vec(w, h, cr)?;
        let (cb, cr) = match self.options.subsampling {
            Subsampling::S444 => (cb, cr),
            Subsampling::S422 => (downsample_h2v1(&cb)?, downsample_h2v1(&cr)?),
            Subsampling::S420 => (downsample_h2v2(&cb)?, downsample_h2v2(&cr)?),
        };
        let frame = FrameHeader {
            precision: 8,
            width: w as u16,
            height: h as u16,
            components: vec![
                component(1, self.options.subsampling.luma_factors(), 0),
                component(2, (1, 1), 1),
                component(3, (1, 1), 1),
            ],
        };
        self.write_image(writer, &frame, &[luma, cb, cr])
    }

    fn validate(&self, len: usize, width: u32, height: u32, channels: usize) -> Result<(usize, usize)> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::InvalidDimensions(width, height));
        }
        quality_scale(self.options.quality)?;
        let expected = width as usize * height as usize * channels;
        if len != expected {
            return Err(Error::BufferSizeMismatch(expected, len));
        }
        Ok((width as usize, height as usize))
    }

    /// Writes the complete stream. Components past the first use the
    /// chrominance tables in slot 1.
    fn write_image<W: Write>(&self, mut writer: W, frame: &FrameHeader, planes: &[Plane]) -> Result<()> {
        let quality = self.options.quality;
        let color = planes.len() > 1;
        debug!(
            "encoding {}x{} with {} components, quality {quality}, {:?}",
            frame.width,
            frame.height,
            planes.len(),
            self.options.subsampling
        );

        let quant = [QuantTable::luminance(quality)?, QuantTable::chrominance(quality)?];
        let specs = [
            (HuffmanSpec::std_dc_luminance(), HuffmanSpec::std_ac_luminance()),
            (HuffmanSpec::std_dc_chrominance(), HuffmanSpec::std_ac_chrominance()),
        ];
        let slots = if color { 2 } else { 1 };

        writer.write_all(&[markers::PREFIX, markers::SOI])?;
        JfifInfo::write(&self.options.density, &mut writer)?;
        let dqt: Vec<_> = (0..slots).map(|i| (i as u8, &quant[i])).collect();
        write_dqt(&mut writer, &dqt)?;
        frame.write(&mut writer)?;
        let mut dht = Vec::new();
        for (i, (dc, ac)) in specs.iter().enumerate().take(slots) {
            dht.push((TableClass::Dc, i as u8, dc));
            dht.push((TableClass::Ac, i as u8, ac));
        }
        write_dht(&mut writer, &dht)?;
        if self.options.restart_interval > 0 {
            write_dri(&mut writer, self.options.restart_interval)?;
        }
        let scan_components: Vec<_> = (0..planes.len())
            .map(|i| {
                let slot = i.min(1) as u8;
                (i, slot, slot)
            })
            .collect();
        ScanHeader::baseline(frame, &scan_components).write(&mut writer)?;

        let encode_tables = specs
            .iter()
            .take(slots)
            .map(|(dc, ac)| -> Result<_> {
                Ok((HuffmanEncodeTable::new(dc)?, HuffmanEncodeTable::new(ac)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let bound: Vec<_> = (0..planes.len())
            .map(|i| {
                let slot = i.min(1);
                ComponentTables {
                    quant: &quant[slot],
                    dc: &encode_tables[slot].0,
                    ac: &encode_tables[slot].1,
                }
            })
            .collect();

        let mut bw = BitWriter::new(writer);
        self.write_mcus(&mut bw, frame, planes, &bound)?;
        let mut writer = bw.finish()?;
        writer.write_all(&[markers::PREFIX, markers::EOI])?;
        writer.flush()?;
        Ok(())
    }

    fn write_mcus<W: Write>(
        &self,
        bw: &mut BitWriter<W>,
        frame: &FrameHeader,
        planes: &[Plane],
        tables: &[ComponentTables],
    ) -> Result<()> {
        let (mcus_x, mcus_y) = frame.mcu_grid();
        let interval = self.options.restart_interval as usize;
        let mut dc_preds = vec![0i32; planes.len()];
        let mut next_restart = 0u8;
        let mut samples = [0u8; BLOCK_SIZE];
        let mut spatial = [0f32; BLOCK_SIZE];
        let mut frequency = [0f32; BLOCK_SIZE];
        let mut coefficients = [0i32; BLOCK_SIZE];

        for mcu in 0..mcus_x * mcus_y {
            if interval > 0 && mcu > 0 && mcu % interval == 0 {
                bw.flush_with_padding()?;
                bw.write_bytes(&[markers::PREFIX, markers::RST0 + next_restart])?;
                trace!("RST{next_restart} before MCU {mcu}");
                next_restart = (next_restart + 1) % 8;
                dc_preds.fill(0);
            }
            let (mcu_x, mcu_y) = (mcu % mcus_x, mcu / mcus_x);
            for (i, (plane, info)) in planes.iter().zip(&frame.components).enumerate() {
                let h = info.h_samp_factor as usize;
                let v = info.v_samp_factor as usize;
                for by in 0..v {
                    for bx in 0..h {
                        plane.read_block(mcu_x * h + bx, mcu_y * v + by, &mut samples);
                        level_shift_to_float(&samples, &mut spatial);
                        forward_dct_8x8(&spatial, &mut frequency);
                        tables[i].quant.quantize(&frequency, &mut coefficients);
                        encode_block(bw, &coefficients, &mut dc_preds[i], tables[i].dc, tables[i].ac)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn component(id: u8, (h, v): (u8, u8), quant_idx: u8) -> ComponentInfo {
    ComponentInfo {
        id,
        h_samp_factor: h,
        v_samp_factor: v,
        quant_idx,
    }
}

/// Huffman category of `value` and the bits that follow its symbol.
/// Negative values are sent as their one's complement.
fn magnitude(value: i32) -> (u32, u32) {
    let size = 32 - value.unsigned_abs().leading_zeros();
    let bits = (if value < 0 { value - 1 } else { value }) as u32;
    (size, bits & ((1 << size) - 1))
}

fn write_symbol<W: Write>(bw: &mut BitWriter<W>, table: &HuffmanEncodeTable, symbol: u8) -> Result<()> {
    let code = table.code(symbol)?;
    bw.write_bits(code.code as u32, code.length as u32)?;
    Ok(())
}

/// Emits one block of natural-order quantized coefficients.
pub(crate) fn encode_block<W: Write>(
    bw: &mut BitWriter<W>,
    coefficients: &[i32; BLOCK_SIZE],
    dc_pred: &mut i32,
    dc: &HuffmanEncodeTable,
    ac: &HuffmanEncodeTable,
) -> Result<()> {
    let diff = coefficients[0] - *dc_pred;
    *dc_pred = coefficients[0];
    let (size, bits) = magnitude(diff);
    write_symbol(bw, dc, size as u8)?;
    bw.write_bits(bits, size)?;

    let mut run = 0u8;
    for &pos in &ZIGZAG_TO_NATURAL[1..] {
        let value = coefficients[pos].clamp(-MAX_AC_MAGNITUDE, MAX_AC_MAGNITUDE);
        if value == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            write_symbol(bw, ac, ZRL)?;
            run -= 16;
        }
        let (size, bits) = magnitude(value);
        write_symbol(bw, ac, (run << 4) | size as u8)?;
        bw.write_bits(bits, size)?;
        run = 0;
    }
    if run > 0 {
        write_symbol(bw, ac, EOB)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::{
        bit_reader::{BitReader, extend},
        decode::decode_block,
        headers::SegmentReader,
        huffman::HuffmanDecodeTable,
        util::test::gradient_rgb,
    };

    #[test]
    fn magnitudes() {
        assert_eq!(magnitude(0), (0, 0));
        assert_eq!(magnitude(1), (1, 1));
        assert_eq!(magnitude(-1), (1, 0));
        assert_eq!(magnitude(5), (3, 0b101));
        assert_eq!(magnitude(-5), (3, 0b010));
        assert_eq!(magnitude(-2040), (11, 7));
        arbtest::arbtest(|u| {
            let value = u.int_in_range(-2047..=2047)?;
            let (size, bits) = magnitude(value);
            assert_eq!(extend(bits as u16, size), value);
            Ok(())
        });
    }

    #[test]
    fn zero_block_bits() -> Result<()> {
        let dc = HuffmanEncodeTable::new(&HuffmanSpec::std_dc_luminance())?;
        let ac = HuffmanEncodeTable::new(&HuffmanSpec::std_ac_luminance())?;
        let mut out = Vec::new();
        let mut bw = BitWriter::new(&mut out);
        let mut pred = 0;
        encode_block(&mut bw, &[0; BLOCK_SIZE], &mut pred, &dc, &ac)?;
        bw.finish()?;
        // DC category 0 is "00", EOB is "1010", then 1-padding.
        assert_eq!(out, [0b0010_1011]);
        Ok(())
    }

    #[test]
    fn block_round_trips_through_decoder() -> Result<()> {
        let mut coefficients = [0; BLOCK_SIZE];
        coefficients[0] = -300;
        coefficients[1] = 7;
        coefficients[ZIGZAG_TO_NATURAL[40]] = -2;
        coefficients[ZIGZAG_TO_NATURAL[63]] = 1;
        let dc_spec = HuffmanSpec::std_dc_chrominance();
        let ac_spec = HuffmanSpec::std_ac_chrominance();
        let mut out = Vec::new();
        let mut bw = BitWriter::new(&mut out);
        let mut pred = 100;
        encode_block(
            &mut bw,
            &coefficients,
            &mut pred,
            &HuffmanEncodeTable::new(&dc_spec)?,
            &HuffmanEncodeTable::new(&ac_spec)?,
        )?;
        bw.finish()?;

        let mut br = BitReader::new(&out);
        let mut pred = 100;
        let mut decoded = [0; BLOCK_SIZE];
        decode_block(
            &mut br,
            &HuffmanDecodeTable::new(&dc_spec)?,
            &HuffmanDecodeTable::new(&ac_spec)?,
            &mut pred,
            &mut decoded,
            0,
        )?;
        assert_eq!(decoded, coefficients);
        Ok(())
    }

    #[test]
    fn rejects_invalid_input() {
        let encoder = Encoder::new();
        assert!(matches!(
            encoder.encode_gray(&[], 0, 4),
            Err(Error::InvalidDimensions(0, 4))
        ));
        assert!(matches!(
            encoder.encode_gray(&[], 70000, 1),
            Err(Error::InvalidDimensions(70000, 1))
        ));
        assert!(matches!(
            encoder.encode_rgb(&[0; 10], 2, 2),
            Err(Error::BufferSizeMismatch(12, 10))
        ));
        for quality in [0, 101] {
            assert!(matches!(
                Encoder::new().quality(quality).encode_gray(&[0; 4], 2, 2),
                Err(Error::InvalidQuality(q)) if q == quality
            ));
        }
    }

    #[test]
    fn segment_order() -> Result<()> {
        let jpeg = Encoder::new()
            .restart_interval(2)
            .encode_rgb(&gradient_rgb(20, 20), 20, 20)?;
        let mut reader = SegmentReader::new(&jpeg);
        reader.read_soi()?;
        let mut seen = Vec::new();
        loop {
            let marker = reader.next_marker()?;
            seen.push(marker);
            if marker == markers::SOS {
                break;
            }
            reader.read_segment(marker)?;
        }
        assert_eq!(
            seen,
            [
                markers::APP0,
                markers::DQT,
                markers::SOF0,
                markers::DHT,
                markers::DRI,
                markers::SOS
            ]
        );
        assert_eq!(&jpeg[jpeg.len() - 2..], &[markers::PREFIX, markers::EOI]);
        Ok(())
    }

    #[test]
    fn restart_markers_cycle() -> Result<()> {
        // 80x8 gray is ten single-block MCUs, so nine restart markers.
        let jpeg = Encoder::new()
            .restart_interval(1)
            .encode_gray(&[90; 80 * 8], 80, 8)?;
        let restarts: Vec<u8> = jpeg
            .windows(2)
            .filter(|w| w[0] == markers::PREFIX && markers::is_rst(w[1]))
            .map(|w| w[1] - markers::RST0)
            .collect();
        assert_eq!(restarts, [0, 1, 2, 3, 4, 5, 6, 7, 0]);
        Ok(())
    }

    #[test]
    fn writer_matches_slice() -> Result<()> {
        let rgb = gradient_rgb(13, 9);
        let encoder = Encoder::new().subsampling(Subsampling::S422);
        let mut streamed = Vec::new();
        encoder.encode_rgb_to_writer(&rgb, 13, 9, &mut streamed)?;
        assert_eq!(streamed, encoder.encode_rgb(&rgb, 13, 9)?);
        Ok(())
    }

    #[test]
    fn higher_quality_is_larger() -> Result<()> {
        let rgb = gradient_rgb(64, 64);
        let low = Encoder::new().quality(20).encode_rgb(&rgb, 64, 64)?;
        let high = Encoder::new().quality(95).encode_rgb(&rgb, 64, 64)?;
        assert!(high.len() > low.len());
        Ok(())
    }
}
