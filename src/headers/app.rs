// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! JFIF (APP0) and Adobe (APP14) application segments.

use std::io::Write;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::markers;
use crate::{color::AdobeTransform, error::Result};

const JFIF_IDENTIFIER: &[u8; 5] = b"JFIF\0";
const ADOBE_IDENTIFIER: &[u8; 5] = b"Adobe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromPrimitive)]
pub enum DensityUnits {
    /// Only the aspect ratio is meaningful.
    #[default]
    None = 0,
    PerInch = 1,
    PerCentimeter = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    pub units: DensityUnits,
    pub x: u16,
    pub y: u16,
}

impl Default for Density {
    fn default() -> Self {
        Density {
            units: DensityUnits::None,
            x: 1,
            y: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JfifInfo {
    pub version: (u8, u8),
    pub density: Density,
}

impl JfifInfo {
    /// Returns `None` for APP0 segments that are not JFIF headers.
    pub fn parse(payload: &[u8]) -> Option<JfifInfo> {
        if payload.len() < 14 || &payload[..5] != JFIF_IDENTIFIER {
            return None;
        }
        Some(JfifInfo {
            version: (payload[5], payload[6]),
            density: Density {
                units: DensityUnits::from_u8(payload[7]).unwrap_or_default(),
                x: BigEndian::read_u16(&payload[8..10]),
                y: BigEndian::read_u16(&payload[10..12]),
            },
        })
    }

    /// Writes a JFIF 1.01 APP0 segment without a thumbnail.
    pub fn write<W: Write>(density: &Density, w: &mut W) -> Result<()> {
        w.write_all(&[markers::PREFIX, markers::APP0])?;
        w.write_u16::<BigEndian>(16)?;
        w.write_all(JFIF_IDENTIFIER)?;
        w.write_all(&[1, 1, density.units as u8])?;
        w.write_u16::<BigEndian>(density.x)?;
        w.write_u16::<BigEndian>(density.y)?;
        w.write_all(&[0, 0])?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdobeInfo {
    pub version: u16,
    pub flags0: u16,
    pub flags1: u16,
    /// Raw color transform code, normally 0, 1 or 2.
    pub transform_code: u8,
}

impl AdobeInfo {
    /// Returns `None` for APP14 segments that are not Adobe markers.
    pub fn parse(payload: &[u8]) -> Option<AdobeInfo> {
        if payload.len() < 12 || &payload[..5] != ADOBE_IDENTIFIER {
            return None;
        }
        Some(AdobeInfo {
            version: BigEndian::read_u16(&payload[5..7]),
            flags0: BigEndian::read_u16(&payload[7..9]),
            flags1: BigEndian::read_u16(&payload[9..11]),
            transform_code: payload[11],
        })
    }

    pub fn transform(&self) -> Option<AdobeTransform> {
        AdobeTransform::from_u8(self.transform_code)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&[markers::PREFIX, markers::APP14])?;
        w.write_u16::<BigEndian>(14)?;
        w.write_all(ADOBE_IDENTIFIER)?;
        w.write_u16::<BigEndian>(self.version)?;
        w.write_u16::<BigEndian>(self.flags0)?;
        w.write_u16::<BigEndian>(self.flags1)?;
        w.write_u8(self.transform_code)?;
        Ok(())
    }
}
