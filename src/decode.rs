// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! Baseline JPEG decoding: the marker state machine and the public entry
//! points.

mod output;
mod scan;

#[cfg(test)]
pub(crate) use scan::decode_block;

use std::io::Read;

use crate::{
    color::AdobeTransform,
    error::{Error, Result},
    headers::{
        AdobeInfo, ComponentInfo, FrameHeader, JfifInfo, ScanHeader, SegmentReader, markers,
        tables::{MAX_TABLE_SLOTS, parse_dht, parse_dqt, parse_dri},
    },
    huffman::{HuffmanDecodeTable, TableClass},
    image::Plane,
    options::DecoderOptions,
    quant::QuantTable,
    util::tracing_wrappers::*,
};

/// Frame parameters known once the headers before the first scan are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: usize,
    pub height: usize,
    pub components: Vec<ComponentInfo>,
    pub restart_interval: u16,
    pub adobe: Option<AdobeInfo>,
    pub jfif: Option<JfifInfo>,
}

impl FrameInfo {
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn has_adobe(&self) -> bool {
        self.adobe.is_some()
    }

    pub fn adobe_transform(&self) -> Option<AdobeTransform> {
        self.adobe.as_ref().and_then(AdobeInfo::transform)
    }
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub info: FrameInfo,
    /// Bytes per pixel in `pixels`.
    pub channels: usize,
    /// Row-major interleaved samples.
    pub pixels: Vec<u8>,
    /// MCU rows replaced with blank data under the damaged-row budget.
    pub damaged_rows: usize,
}

impl DecodedImage {
    pub fn width(&self) -> usize {
        self.info.width
    }

    pub fn height(&self) -> usize {
        self.info.height
    }

    pub fn num_components(&self) -> usize {
        self.info.num_components()
    }

    pub fn adobe(&self) -> Option<&AdobeInfo> {
        self.info.adobe.as_ref()
    }

    pub fn jfif(&self) -> Option<&JfifInfo> {
        self.info.jfif.as_ref()
    }
}

/// Decodes baseline JPEG streams. A decoder holds only its options; every
/// call builds and discards its own tables and planes.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecoderOptions,
}

impl Decoder {
    pub fn new(options: DecoderOptions) -> Decoder {
        Decoder { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Parses the headers up to the first scan without decoding pixels.
    pub fn read_info(&self, data: &[u8]) -> Result<FrameInfo> {
        let mut session = DecodeSession::new(&self.options, data, true);
        session.run()?;
        session.frame_info()
    }

    pub fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        let mut session = DecodeSession::new(&self.options, data, false);
        session.run()?;
        let info = session.frame_info()?;
        let (channels, pixels) = output::render(
            &self.options,
            &info,
            session.frame.as_ref().ok_or(Error::NoScan)?,
            &session.components,
        )?;
        Ok(DecodedImage {
            info,
            channels,
            pixels,
            damaged_rows: session.damaged_rows,
        })
    }

    pub fn decode_reader<R: Read>(&self, mut reader: R) -> Result<DecodedImage> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.decode(&data)
    }
}

/// Per-component decoding state.
struct Component {
    info: ComponentInfo,
    /// Covers every block of the interleaved MCU grid.
    plane: Plane,
    /// Meaningful samples, `ceil(frame size * factor / max factor)`.
    size: (usize, usize),
    /// Block grid of a non-interleaved scan over this component.
    blocks: (usize, usize),
    dc_pred: i32,
    /// Set once a scan covering this component has finished.
    scanned: bool,
}

#[derive(Default)]
struct Tables {
    quant: [Option<QuantTable>; MAX_TABLE_SLOTS],
    dc: [Option<HuffmanDecodeTable>; MAX_TABLE_SLOTS],
    ac: [Option<HuffmanDecodeTable>; MAX_TABLE_SLOTS],
}

struct DecodeSession<'a> {
    options: &'a DecoderOptions,
    data: &'a [u8],
    headers_only: bool,
    frame: Option<FrameHeader>,
    components: Vec<Component>,
    tables: Tables,
    restart_interval: u16,
    adobe: Option<AdobeInfo>,
    jfif: Option<JfifInfo>,
    scans: usize,
    damaged_rows: usize,
}

impl<'a> DecodeSession<'a> {
    fn new(options: &'a DecoderOptions, data: &'a [u8], headers_only: bool) -> Self {
        DecodeSession {
            options,
            data,
            headers_only,
            frame: None,
            components: Vec::new(),
            tables: Tables::default(),
            restart_interval: 0,
            adobe: None,
            jfif: None,
            scans: 0,
            damaged_rows: 0,
        }
    }

    fn run(&mut self) -> Result<()> {
        let mut reader = SegmentReader::new(self.data);
        reader.read_soi()?;
        loop {
            let marker = match reader.next_marker() {
                Ok(marker) => marker,
                Err(error @ Error::Truncated(_)) if self.scans > 0 => {
                    return self.finish_without_eoi(error);
                }
                Err(error) => return Err(error),
            };
            debug!("marker {marker:#04x} at offset {}", reader.position());
            match marker {
                markers::SOF0 => {
                    let frame = FrameHeader::parse(reader.read_segment(marker)?)?;
                    self.install_frame(frame)?;
                }
                markers::DHT => self.install_huffman_tables(reader.read_segment(marker)?)?,
                markers::DQT => {
                    for (slot, table) in parse_dqt(reader.read_segment(marker)?)? {
                        debug!("quantization table {slot}");
                        self.tables.quant[slot as usize] = Some(table);
                    }
                }
                markers::DRI => {
                    self.restart_interval = parse_dri(reader.read_segment(marker)?)?;
                    debug!("restart interval {}", self.restart_interval);
                }
                markers::APP0 => {
                    if let Some(jfif) = JfifInfo::parse(reader.read_segment(marker)?) {
                        debug!("JFIF {:?}", jfif);
                        self.jfif.get_or_insert(jfif);
                    }
                }
                markers::APP14 => {
                    if let Some(adobe) = AdobeInfo::parse(reader.read_segment(marker)?) {
                        debug!("Adobe transform {}", adobe.transform_code);
                        self.adobe = Some(adobe);
                    }
                }
                markers::SOS => {
                    let payload = reader.read_segment(marker)?;
                    let frame = self.frame.as_ref().ok_or(Error::ScanBeforeFrame)?;
                    let scan = ScanHeader::parse(payload, frame)?;
                    if self.headers_only {
                        return Ok(());
                    }
                    let end = self.decode_scan(&scan, reader.position())?;
                    self.scans += 1;
                    for scan_component in &scan.components {
                        if let Some(component) =
                            self.components.get_mut(scan_component.component_idx)
                        {
                            component.scanned = true;
                        }
                    }
                    reader.set_position(end);
                    reader.skip_entropy_data();
                }
                markers::EOI => {
                    if self.scans == 0 {
                        return Err(Error::NoScan);
                    }
                    return Ok(());
                }
                markers::SOI => return Err(Error::UnexpectedMarker(marker)),
                marker if markers::is_rst(marker) || marker == markers::TEM => {
                    debug!("ignoring stray marker {marker:#04x}");
                }
                marker => {
                    if let Some(feature) = markers::unsupported_sof(marker) {
                        return Err(Error::Unsupported(feature));
                    }
                    let payload = reader.read_segment(marker)?;
                    debug!("skipping segment {marker:#04x}, {} bytes", payload.len());
                }
            }
        }
    }

    /// A stream may end without EOI once every component has been coded by
    /// some scan. Components no scan reached stay blank, which costs every
    /// MCU row of the frame against the damaged-row budget.
    fn finish_without_eoi(&mut self, error: Error) -> Result<()> {
        let unscanned = self.components.iter().filter(|c| !c.scanned).count();
        if unscanned == 0 {
            warn!("stream ends without EOI after {} scans", self.scans);
            return Ok(());
        }
        let rows = self.frame.as_ref().map_or(0, |frame| frame.mcu_grid().1);
        let budget = self.options.max_damaged_rows;
        if budget == 0 || self.damaged_rows + rows > budget {
            return Err(error);
        }
        warn!("stream ends before {unscanned} components were scanned, blanking {rows} rows");
        self.damaged_rows += rows;
        Ok(())
    }

    fn install_frame(&mut self, frame: FrameHeader) -> Result<()> {
        if self.frame.is_some() {
            return Err(Error::DuplicateFrame);
        }
        let (width, height) = (frame.width as usize, frame.height as usize);
        if self
            .options
            .max_pixels
            .is_some_and(|max_pixels| width * height > max_pixels)
        {
            return Err(Error::ImageTooLarge(width, height));
        }
        debug!(
            "frame {width}x{height}, {} components, MCU grid {:?}",
            frame.components.len(),
            frame.mcu_grid()
        );
        if !self.headers_only {
            for (index, info) in frame.components.iter().enumerate() {
                let (plane_width, plane_height) = frame.component_allocated_size(index);
                self.components.push(Component {
                    info: *info,
                    plane: Plane::filled(plane_width, plane_height, 128)?,
                    size: frame.component_size(index),
                    blocks: frame.component_blocks(index),
                    dc_pred: 0,
                    scanned: false,
                });
            }
        }
        self.frame = Some(frame);
        Ok(())
    }

    fn install_huffman_tables(&mut self, payload: &[u8]) -> Result<()> {
        for (class, slot, spec) in parse_dht(payload)? {
            debug!("{class:?} Huffman table {slot}, {} symbols", spec.num_symbols());
            let table = Some(HuffmanDecodeTable::new(&spec)?);
            match class {
                TableClass::Dc => self.tables.dc[slot as usize] = table,
                TableClass::Ac => self.tables.ac[slot as usize] = table,
            }
        }
        Ok(())
    }

    fn decode_scan(&mut self, scan: &ScanHeader, start: usize) -> Result<usize> {
        let frame = self.frame.as_ref().ok_or(Error::ScanBeforeFrame)?;
        let decoder = scan::ScanDecoder::new(
            self.data,
            start,
            frame,
            scan,
            &self.tables,
            &mut self.components,
            self.restart_interval as usize,
        )?;
        decoder.run(self.options.max_damaged_rows, &mut self.damaged_rows)
    }

    fn frame_info(&self) -> Result<FrameInfo> {
        let frame = self.frame.as_ref().ok_or(Error::NoScan)?;
        Ok(FrameInfo {
            width: frame.width as usize,
            height: frame.height as usize,
            components: frame.components.clone(),
            restart_interval: self.restart_interval,
            adobe: self.adobe,
            jfif: self.jfif,
        })
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use dctcodec_transforms::BLOCK_SIZE;

    use super::*;
    use crate::{
        bit_writer::BitWriter,
        color::{cmyk_to_rgb, ycbcr_to_rgb, ycck_to_cmyk},
        encode::{Encoder, encode_block},
        error::ErrorCategory,
        headers::tables::{write_dht, write_dqt},
        huffman::{HuffmanEncodeTable, HuffmanSpec},
        options::{CmykConvention, OutputFormat, Subsampling},
        util::test::gradient_rgb,
    };

    fn gray_jpeg(width: u32, height: u32, value: u8) -> Vec<u8> {
        Encoder::new()
            .quality(90)
            .encode_gray(&vec![value; (width * height) as usize], width, height)
            .unwrap()
    }

    #[test]
    fn info_without_decoding() -> Result<()> {
        let jpeg = Encoder::new()
            .subsampling(Subsampling::S422)
            .restart_interval(3)
            .encode_rgb(&gradient_rgb(40, 24), 40, 24)?;
        let info = Decoder::default().read_info(&jpeg)?;
        assert_eq!((info.width, info.height), (40, 24));
        assert_eq!(info.num_components(), 3);
        assert_eq!(info.components[0].h_samp_factor, 2);
        assert_eq!(info.components[0].v_samp_factor, 1);
        assert_eq!(info.restart_interval, 3);
        assert!(info.jfif.is_some());
        assert!(!info.has_adobe());
        Ok(())
    }

    #[test]
    fn solid_gray() -> Result<()> {
        let image = Decoder::default().decode(&gray_jpeg(13, 9, 200))?;
        assert_eq!((image.width(), image.height(), image.channels), (13, 9, 3));
        assert!(image.pixels.iter().all(|&v| v == 200));
        let raw = Decoder::new(DecoderOptions {
            output_format: OutputFormat::Raw,
            ..Default::default()
        })
        .decode(&gray_jpeg(13, 9, 200))?;
        assert_eq!(raw.channels, 1);
        assert_eq!(raw.pixels.len(), 13 * 9);
        Ok(())
    }

    #[test]
    fn rejects_missing_soi() {
        let mut jpeg = gray_jpeg(8, 8, 0);
        jpeg[1] = 0xD9;
        assert!(matches!(
            Decoder::default().decode(&jpeg),
            Err(Error::InvalidSignature(0xFF, 0xD9))
        ));
    }

    #[test]
    fn rejects_truncated_headers() {
        let jpeg = gray_jpeg(8, 8, 0);
        let error = Decoder::default().decode(&jpeg[..30]).unwrap_err();
        assert_eq!(error.category(), ErrorCategory::Truncated);
    }

    #[test]
    fn rejects_image_without_scan() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xD9];
        assert!(matches!(Decoder::default().decode(&jpeg), Err(Error::NoScan)));
        assert!(matches!(
            Decoder::default().read_info(&jpeg),
            Err(Error::NoScan)
        ));
    }

    #[test]
    fn rejects_oversized_frame() {
        let decoder = Decoder::new(DecoderOptions {
            max_pixels: Some(100),
            ..Default::default()
        });
        assert!(matches!(
            decoder.decode(&gray_jpeg(11, 10, 0)),
            Err(Error::ImageTooLarge(11, 10))
        ));
        assert!(decoder.decode(&gray_jpeg(10, 10, 0)).is_ok());
    }

    #[test]
    fn rejects_unsupported_frames() {
        for (marker, name) in [(0xC1, "SOF1"), (0xC2, "SOF2"), (0xC3, "SOF3"), (0xC9, "SOF9")] {
            let jpeg = [0xFF, 0xD8, 0xFF, marker, 0x00, 0x0B, 8, 0, 8, 0, 8, 1, 1, 0x11, 0];
            let error = Decoder::default().decode(&jpeg).unwrap_err();
            assert_eq!(error.category(), ErrorCategory::Unsupported, "{name}");
        }
    }

    #[test]
    fn rejects_duplicate_frame() {
        let jpeg = gray_jpeg(8, 8, 0);
        // Repeat the SOF0 segment in front of the original one.
        let sof = jpeg
            .windows(2)
            .position(|w| w == [0xFF, markers::SOF0])
            .unwrap();
        let length = u16::from_be_bytes([jpeg[sof + 2], jpeg[sof + 3]]) as usize;
        let mut doubled = jpeg[..sof].to_vec();
        doubled.extend_from_slice(&jpeg[sof..sof + 2 + length]);
        doubled.extend_from_slice(&jpeg[sof..]);
        assert!(matches!(
            Decoder::default().decode(&doubled),
            Err(Error::DuplicateFrame)
        ));
    }

    #[test]
    fn reader_entry_point() -> Result<()> {
        let jpeg = gray_jpeg(16, 16, 60);
        let image = Decoder::default().decode_reader(std::io::Cursor::new(jpeg))?;
        assert!(image.pixels.iter().all(|&v| v == 60));
        Ok(())
    }

    #[test]
    fn missing_eoi_is_tolerated() -> Result<()> {
        let jpeg = gray_jpeg(16, 16, 60);
        let image = Decoder::default().decode(&jpeg[..jpeg.len() - 2])?;
        assert!(image.pixels.iter().all(|&v| v == 60));
        Ok(())
    }

    #[test]
    fn skips_comments_and_unknown_app_segments() -> Result<()> {
        let jpeg = gray_jpeg(8, 8, 90);
        let mut patched = jpeg[..2].to_vec();
        patched.extend_from_slice(&[0xFF, markers::COM, 0, 5, b'a', b'b', b'c']);
        patched.extend_from_slice(&[0xFF, 0xE1, 0, 4, 0xFF, 0xFF]);
        patched.extend_from_slice(&jpeg[2..]);
        let image = Decoder::default().decode(&patched)?;
        assert!(image.pixels.iter().all(|&v| v == 90));
        Ok(())
    }

    /// A 16x8 stream of flat components, coded with unit quantization so the
    /// samples survive exactly. Non-interleaved streams carry one scan per
    /// component.
    fn flat_stream(values: &[u8], adobe: Option<u8>, interleaved: bool) -> Vec<u8> {
        let frame = FrameHeader {
            precision: 8,
            width: 16,
            height: 8,
            components: (0..values.len())
                .map(|i| ComponentInfo {
                    id: i as u8 + 1,
                    h_samp_factor: 1,
                    v_samp_factor: 1,
                    quant_idx: 0,
                })
                .collect(),
        };
        let quant = QuantTable::new([1; BLOCK_SIZE]).unwrap();
        let dc = HuffmanSpec::std_dc_luminance();
        let ac = HuffmanSpec::std_ac_luminance();
        let dc_enc = HuffmanEncodeTable::new(&dc).unwrap();
        let ac_enc = HuffmanEncodeTable::new(&ac).unwrap();

        let mut out = vec![0xFF, markers::SOI];
        if let Some(transform_code) = adobe {
            let adobe = AdobeInfo {
                version: 100,
                flags0: 0,
                flags1: 0,
                transform_code,
            };
            adobe.write(&mut out).unwrap();
        }
        write_dqt(&mut out, &[(0, &quant)]).unwrap();
        frame.write(&mut out).unwrap();
        write_dht(&mut out, &[(TableClass::Dc, 0, &dc), (TableClass::Ac, 0, &ac)]).unwrap();
        let scans: Vec<Vec<usize>> = if interleaved {
            vec![(0..values.len()).collect()]
        } else {
            (0..values.len()).map(|i| vec![i]).collect()
        };
        for scan in scans {
            let tables: Vec<_> = scan.iter().map(|&i| (i, 0, 0)).collect();
            ScanHeader::baseline(&frame, &tables).write(&mut out).unwrap();
            let mut bw = BitWriter::new(&mut out);
            let mut preds = vec![0; values.len()];
            for _ in 0..2 {
                for &i in &scan {
                    let mut coefficients = [0; BLOCK_SIZE];
                    coefficients[0] = (values[i] as i32 - 128) * 8;
                    encode_block(&mut bw, &coefficients, &mut preds[i], &dc_enc, &ac_enc).unwrap();
                }
            }
            bw.finish().unwrap();
        }
        out.extend_from_slice(&[0xFF, markers::EOI]);
        out
    }

    fn decode_flat(stream: &[u8], options: DecoderOptions) -> Result<Vec<u8>> {
        let image = Decoder::new(options).decode(stream)?;
        assert_eq!((image.width(), image.height()), (16, 8));
        let channels = image.channels;
        let first = image.pixels[..channels].to_vec();
        assert!(image.pixels.chunks(channels).all(|pixel| pixel == first));
        Ok(first)
    }

    #[test]
    fn non_interleaved_scans() -> Result<()> {
        let values = [90, 100, 160];
        let expected = ycbcr_to_rgb(90, 100, 160);
        for interleaved in [true, false] {
            let pixel = decode_flat(&flat_stream(&values, None, interleaved), Default::default())?;
            assert_eq!(pixel, expected, "interleaved: {interleaved}");
        }
        Ok(())
    }

    fn second_scan_offset(stream: &[u8]) -> usize {
        stream
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair == &[0xFF, markers::SOS])
            .nth(1)
            .unwrap()
            .0
    }

    #[test]
    fn stream_ending_before_all_components_are_scanned() -> Result<()> {
        let stream = flat_stream(&[90, 100, 160], None, false);
        let cut = &stream[..second_scan_offset(&stream)];

        let error = Decoder::default().decode(cut).unwrap_err();
        assert_eq!(error.category(), ErrorCategory::Truncated);

        // The frame is one MCU row; with that budget Cb and Cr stay neutral.
        let image = Decoder::new(DecoderOptions {
            max_damaged_rows: 1,
            ..Default::default()
        })
        .decode(cut)?;
        assert_eq!(image.damaged_rows, 1);
        assert_eq!(&image.pixels[..3], &ycbcr_to_rgb(90, 128, 128)[..]);
        Ok(())
    }

    #[test]
    fn garbage_between_scans_is_reported() {
        let stream = flat_stream(&[90, 100, 160], None, false);
        let mut patched = stream[..second_scan_offset(&stream)].to_vec();
        write_dqt(&mut patched, &[(1, &QuantTable::new([2; BLOCK_SIZE]).unwrap())]).unwrap();
        patched.extend_from_slice(&[0x12, 0x34]);
        let offset = patched.len() - 2;
        assert!(matches!(
            Decoder::default().decode(&patched),
            Err(Error::ExpectedMarker(at, 0x12)) if at == offset
        ));
    }

    #[test]
    fn three_component_color_transform() -> Result<()> {
        let values = [90, 100, 160];
        // Adobe transform 0 marks RGB.
        let rgb = decode_flat(&flat_stream(&values, Some(0), true), Default::default())?;
        assert_eq!(rgb, values);
        let forced = DecoderOptions {
            color_transform: Some(true),
            ..Default::default()
        };
        let pixel = decode_flat(&flat_stream(&values, Some(0), true), forced)?;
        assert_eq!(pixel, ycbcr_to_rgb(90, 100, 160));
        Ok(())
    }

    #[test]
    fn four_component_conventions() -> Result<()> {
        let values = [10, 200, 30, 100];
        let plain = cmyk_to_rgb(10, 200, 30, 100);
        let inverted = cmyk_to_rgb(245, 55, 225, 155);
        let [c, m, y, k] = ycck_to_cmyk(10, 200, 30, 100);
        let ycck = cmyk_to_rgb(c, m, y, k);

        let decode = |adobe, options| decode_flat(&flat_stream(&values, adobe, false), options);
        assert_eq!(decode(None, DecoderOptions::default())?, plain);
        assert_eq!(decode(Some(0), DecoderOptions::default())?, inverted);
        assert_eq!(decode(Some(2), DecoderOptions::default())?, ycck);
        let standard = DecoderOptions {
            cmyk_convention: CmykConvention::Standard,
            ..Default::default()
        };
        assert_eq!(decode(Some(0), standard)?, plain);
        let raw = DecoderOptions {
            output_format: OutputFormat::Raw,
            ..Default::default()
        };
        assert_eq!(decode(Some(2), raw)?, values);
        Ok(())
    }

    #[test]
    fn scan_with_undefined_table() {
        let mut stream = flat_stream(&[90], None, true);
        // Point the scan at AC table 1, which was never defined.
        let sos = stream
            .windows(2)
            .position(|w| w == [0xFF, markers::SOS])
            .unwrap();
        stream[sos + 6] = 0x01;
        assert!(matches!(
            Decoder::default().decode(&stream),
            Err(Error::UndefinedTable("AC Huffman", 1))
        ));
    }
}
