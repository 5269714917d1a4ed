// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use super::{check_length, frame::FrameHeader, markers};
use crate::error::{Error, Result};

/// Upper bound on blocks in one interleaved MCU.
pub const MAX_BLOCKS_PER_MCU: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanComponent {
    pub component_id: u8,
    /// Index of the component in the frame header.
    pub component_idx: usize,
    pub dc_tbl_idx: u8,
    pub ac_tbl_idx: u8,
}

/// SOS header. Spectral selection and successive approximation are kept
/// for inspection only; baseline decoding ignores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHeader {
    pub components: Vec<ScanComponent>,
    pub ss: u8,
    pub se: u8,
    pub ah: u8,
    pub al: u8,
}

impl ScanHeader {
    pub fn parse(payload: &[u8], frame: &FrameHeader) -> Result<ScanHeader> {
        check_length(markers::SOS, payload, 1)?;
        let num_components = payload[0] as usize;
        if num_components == 0 || num_components > frame.components.len() {
            return Err(Error::InvalidScan("component count"));
        }
        check_length(markers::SOS, payload, 4 + 2 * num_components)?;
        let mut components: Vec<ScanComponent> = Vec::with_capacity(num_components);
        for entry in payload[1..1 + 2 * num_components].chunks_exact(2) {
            let component_id = entry[0];
            let component_idx = frame
                .component_index(component_id)
                .ok_or(Error::UnknownComponent(component_id))?;
            if components.iter().any(|c| c.component_idx == component_idx) {
                return Err(Error::InvalidScan("duplicate component"));
            }
            let dc_tbl_idx = entry[1] >> 4;
            let ac_tbl_idx = entry[1] & 0xF;
            if dc_tbl_idx > 3 {
                return Err(Error::InvalidTableId("DC Huffman", dc_tbl_idx));
            }
            if ac_tbl_idx > 3 {
                return Err(Error::InvalidTableId("AC Huffman", ac_tbl_idx));
            }
            components.push(ScanComponent {
                component_id,
                component_idx,
                dc_tbl_idx,
                ac_tbl_idx,
            });
        }
        if num_components > 1 {
            let blocks: usize = components
                .iter()
                .map(|sc| {
                    let c = &frame.components[sc.component_idx];
                    c.h_samp_factor as usize * c.v_samp_factor as usize
                })
                .sum();
            if blocks > MAX_BLOCKS_PER_MCU {
                return Err(Error::InvalidScan("too many blocks per MCU"));
            }
        }
        let tail = &payload[1 + 2 * num_components..];
        Ok(ScanHeader {
            components,
            ss: tail[0],
            se: tail[1],
            ah: tail[2] >> 4,
            al: tail[2] & 0xF,
        })
    }

    /// A baseline scan over `components` given as (frame index, DC table, AC table).
    pub fn baseline(frame: &FrameHeader, components: &[(usize, u8, u8)]) -> ScanHeader {
        ScanHeader {
            components: components
                .iter()
                .map(|&(component_idx, dc_tbl_idx, ac_tbl_idx)| ScanComponent {
                    component_id: frame.components[component_idx].id,
                    component_idx,
                    dc_tbl_idx,
                    ac_tbl_idx,
                })
                .collect(),
            ss: 0,
            se: 63,
            ah: 0,
            al: 0,
        }
    }

    pub fn is_interleaved(&self) -> bool {
        self.components.len() > 1
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&[markers::PREFIX, markers::SOS])?;
        w.write_u16::<BigEndian>(6 + 2 * self.components.len() as u16)?;
        w.write_u8(self.components.len() as u8)?;
        for c in &self.components {
            w.write_all(&[c.component_id, (c.dc_tbl_idx << 4) | c.ac_tbl_idx])?;
        }
        w.write_all(&[self.ss, self.se, (self.ah << 4) | self.al])?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;
    use crate::headers::frame::ComponentInfo;

    fn frame(sampling: &[(u8, u8)]) -> FrameHeader {
        FrameHeader {
            precision: 8,
            width: 64,
            height: 64,
            components: sampling
                .iter()
                .enumerate()
                .map(|(i, &(h, v))| ComponentInfo {
                    id: i as u8 + 1,
                    h_samp_factor: h,
                    v_samp_factor: v,
                    quant_idx: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn parse_interleaved() -> Result<()> {
        let frame = frame(&[(2, 2), (1, 1), (1, 1)]);
        let scan = ScanHeader::parse(&[3, 1, 0x00, 2, 0x11, 3, 0x11, 0, 63, 0], &frame)?;
        assert!(scan.is_interleaved());
        assert_eq!(scan.components[1].component_idx, 1);
        assert_eq!(scan.components[2].dc_tbl_idx, 1);
        assert_eq!((scan.ss, scan.se, scan.ah, scan.al), (0, 63, 0, 0));
        assert_eq!(scan, ScanHeader::baseline(&frame, &[(0, 0, 0), (1, 1, 1), (2, 1, 1)]));
        Ok(())
    }

    #[test]
    fn write_then_parse() -> Result<()> {
        let frame = frame(&[(1, 1), (1, 1), (1, 1)]);
        let scan = ScanHeader::baseline(&frame, &[(2, 1, 1)]);
        let mut out = Vec::new();
        scan.write(&mut out)?;
        assert_eq!(out, vec![0xFF, 0xDA, 0, 8, 1, 3, 0x11, 0, 63, 0]);
        assert_eq!(ScanHeader::parse(&out[4..], &frame)?, scan);
        Ok(())
    }

    #[test]
    fn rejects_bad_scans() {
        let frame = frame(&[(4, 4), (1, 1), (1, 1)]);
        assert!(matches!(
            ScanHeader::parse(&[1, 9, 0x00, 0, 63, 0], &frame),
            Err(Error::UnknownComponent(9))
        ));
        assert!(matches!(
            ScanHeader::parse(&[2, 2, 0x00, 2, 0x00, 0, 63, 0], &frame),
            Err(Error::InvalidScan("duplicate component"))
        ));
        assert!(matches!(
            ScanHeader::parse(&[1, 1, 0x40, 0, 63, 0], &frame),
            Err(Error::InvalidTableId("DC Huffman", 4))
        ));
        assert!(matches!(
            ScanHeader::parse(&[2, 1, 0x00, 2, 0x00, 0, 63, 0], &frame),
            Err(Error::InvalidScan("too many blocks per MCU"))
        ));
        assert!(matches!(
            ScanHeader::parse(&[0, 0, 63, 0], &frame),
            Err(Error::InvalidScan("component count"))
        ));
        assert!(matches!(
            ScanHeader::parse(&[1, 1, 0x00, 0], &frame),
            Err(Error::InvalidSegmentLength(markers::SOS, 6))
        ));
    }
}
