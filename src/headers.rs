// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! Marker segments: constants, a cursor over the marker stream, and
//! parsing/serialization of every segment the codec handles.

pub mod app;
pub mod frame;
pub mod scan;
pub mod tables;

use byteorder::{BigEndian, ByteOrder};

pub use app::{AdobeInfo, Density, DensityUnits, JfifInfo};
pub use frame::{ComponentInfo, FrameHeader};
pub use scan::{ScanComponent, ScanHeader};

use crate::{
    error::{Error, Result},
    util::tracing_wrappers::*,
};

pub mod markers {
    pub const PREFIX: u8 = 0xFF;
    pub const SOF0: u8 = 0xC0;
    pub const SOF1: u8 = 0xC1;
    pub const SOF2: u8 = 0xC2;
    pub const SOF3: u8 = 0xC3;
    pub const DHT: u8 = 0xC4;
    pub const DAC: u8 = 0xCC;
    pub const RST0: u8 = 0xD0;
    pub const RST7: u8 = 0xD7;
    pub const SOI: u8 = 0xD8;
    pub const EOI: u8 = 0xD9;
    pub const SOS: u8 = 0xDA;
    pub const DQT: u8 = 0xDB;
    pub const DRI: u8 = 0xDD;
    pub const APP0: u8 = 0xE0;
    pub const APP14: u8 = 0xEE;
    pub const APP15: u8 = 0xEF;
    pub const COM: u8 = 0xFE;
    pub const TEM: u8 = 0x01;

    pub fn is_rst(marker: u8) -> bool {
        (RST0..=RST7).contains(&marker)
    }

    /// SOF markers other than SOF0: extended, progressive, lossless,
    /// hierarchical and arithmetic-coded frames.
    pub fn unsupported_sof(marker: u8) -> Option<&'static str> {
        match marker {
            SOF1 => Some("extended sequential frame (SOF1)"),
            SOF2 => Some("progressive frame (SOF2)"),
            SOF3 => Some("lossless frame (SOF3)"),
            0xC5..=0xC7 => Some("hierarchical frame"),
            0xC9..=0xCB | 0xCD..=0xCF => Some("arithmetic-coded frame"),
            _ => None,
        }
    }
}

/// Cursor over the marker segments of a JPEG stream.
#[derive(Debug, Clone)]
pub struct SegmentReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SegmentReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SegmentReader { data, pos: 0 }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Consumes the SOI marker, which must be the first two bytes.
    pub fn read_soi(&mut self) -> Result<()> {
        match self.data {
            [markers::PREFIX, markers::SOI, ..] => {
                self.pos = 2;
                Ok(())
            }
            [a, b, ..] => Err(Error::InvalidSignature(*a, *b)),
            _ => Err(Error::Truncated("SOI marker")),
        }
    }

    /// Reads the next marker code, skipping `FF` fill bytes.
    pub fn next_marker(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.pos) else {
            return Err(Error::Truncated("marker"));
        };
        if byte != markers::PREFIX {
            return Err(Error::ExpectedMarker(self.pos, byte));
        }
        let mut pos = self.pos + 1;
        while self.data.get(pos) == Some(&markers::PREFIX) {
            pos += 1;
        }
        let Some(&marker) = self.data.get(pos) else {
            return Err(Error::Truncated("marker"));
        };
        if marker == 0 {
            return Err(Error::ExpectedMarker(pos, marker));
        }
        self.pos = pos + 1;
        Ok(marker)
    }

    /// Reads a length-prefixed segment and returns its payload.
    pub fn read_segment(&mut self, marker: u8) -> Result<&'a [u8]> {
        let Some(length_bytes) = self.data.get(self.pos..self.pos + 2) else {
            return Err(Error::Truncated("segment length"));
        };
        let length = BigEndian::read_u16(length_bytes) as usize;
        if length < 2 {
            return Err(Error::InvalidSegmentLength(marker, length));
        }
        let Some(payload) = self.data.get(self.pos + 2..self.pos + length) else {
            return Err(Error::Truncated("segment payload"));
        };
        trace!("segment {marker:#04x} with {} payload bytes", payload.len());
        self.pos += length;
        Ok(payload)
    }

    /// Skips entropy-coded bytes up to the next marker that is neither a
    /// stuffed `FF 00` nor a restart marker.
    pub fn skip_entropy_data(&mut self) {
        let start = self.pos;
        while self.pos + 1 < self.data.len() {
            if self.data[self.pos] == markers::PREFIX {
                let next = self.data[self.pos + 1];
                if next != 0 && !markers::is_rst(next) {
                    break;
                }
            }
            self.pos += 1;
        }
        if self.pos + 1 >= self.data.len() {
            self.pos = self.data.len();
        }
        if self.pos > start {
            debug!("skipped {} bytes of entropy-coded data", self.pos - start);
        }
    }
}

/// Finds the first restart marker at or after `pos`, returning its offset
/// and number.
pub fn find_restart_marker(data: &[u8], pos: usize) -> Option<(usize, u8)> {
    let start = pos.min(data.len());
    data[start..]
        .windows(2)
        .position(|w| w[0] == markers::PREFIX && markers::is_rst(w[1]))
        .map(|offset| {
            let at = start + offset;
            (at, data[at + 1] - markers::RST0)
        })
}

pub(crate) fn check_length(marker: u8, payload: &[u8], min: usize) -> Result<()> {
    if payload.len() < min {
        return Err(Error::InvalidSegmentLength(marker, payload.len() + 2));
    }
    Ok(())
}
