// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use std::io::Write;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use dctcodec_transforms::BLOCK_DIM;

use super::{check_length, markers};
use crate::error::{Error, Result};

pub const MAX_COMPONENTS: usize = 4;
pub const MAX_SAMPLING_FACTOR: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    pub id: u8,
    pub h_samp_factor: u8,
    pub v_samp_factor: u8,
    pub quant_idx: u8,
}

/// Baseline (SOF0) frame header and the MCU geometry derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    pub components: Vec<ComponentInfo>,
}

impl FrameHeader {
    pub fn parse(payload: &[u8]) -> Result<FrameHeader> {
        check_length(markers::SOF0, payload, 6)?;
        let precision = payload[0];
        if precision != 8 {
            return Err(Error::InvalidPrecision(precision));
        }
        let height = BigEndian::read_u16(&payload[1..3]);
        let width = BigEndian::read_u16(&payload[3..5]);
        if width == 0 || height == 0 {
            return Err(Error::InvalidFrameSize(width, height));
        }
        let num_components = payload[5] as usize;
        if !matches!(num_components, 1 | 3 | 4) {
            return Err(Error::InvalidComponentCount(num_components));
        }
        check_length(markers::SOF0, payload, 6 + 3 * num_components)?;
        let mut components: Vec<ComponentInfo> = Vec::with_capacity(num_components);
        for entry in payload[6..6 + 3 * num_components].chunks_exact(3) {
            let component = ComponentInfo {
                id: entry[0],
                h_samp_factor: entry[1] >> 4,
                v_samp_factor: entry[1] & 0xF,
                quant_idx: entry[2],
            };
            let valid = 1..=MAX_SAMPLING_FACTOR;
            if !valid.contains(&component.h_samp_factor)
                || !valid.contains(&component.v_samp_factor)
            {
                return Err(Error::InvalidSamplingFactor(
                    component.id,
                    component.h_samp_factor,
                    component.v_samp_factor,
                ));
            }
            if component.quant_idx > 3 {
                return Err(Error::InvalidTableId("quantization", component.quant_idx));
            }
            if components.iter().any(|c| c.id == component.id) {
                return Err(Error::InvalidComponentCount(num_components));
            }
            components.push(component);
        }
        Ok(FrameHeader {
            precision,
            width,
            height,
            components,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&[markers::PREFIX, markers::SOF0])?;
        w.write_u16::<BigEndian>(8 + 3 * self.components.len() as u16)?;
        w.write_u8(self.precision)?;
        w.write_u16::<BigEndian>(self.height)?;
        w.write_u16::<BigEndian>(self.width)?;
        w.write_u8(self.components.len() as u8)?;
        for c in &self.components {
            w.write_all(&[c.id, (c.h_samp_factor << 4) | c.v_samp_factor, c.quant_idx])?;
        }
        Ok(())
    }

    pub fn max_h_samp_factor(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.h_samp_factor as usize)
            .max()
            .unwrap_or(1)
    }

    pub fn max_v_samp_factor(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.v_samp_factor as usize)
            .max()
            .unwrap_or(1)
    }

    /// MCU size in pixels for interleaved scans.
    pub fn mcu_size(&self) -> (usize, usize) {
        (
            self.max_h_samp_factor() * BLOCK_DIM,
            self.max_v_samp_factor() * BLOCK_DIM,
        )
    }

    /// Number of MCU columns and rows for interleaved scans.
    pub fn mcu_grid(&self) -> (usize, usize) {
        let (mcu_width, mcu_height) = self.mcu_size();
        (
            (self.width as usize).div_ceil(mcu_width),
            (self.height as usize).div_ceil(mcu_height),
        )
    }

    /// Component dimensions in samples, `ceil(size * factor / max_factor)`.
    pub fn component_size(&self, index: usize) -> (usize, usize) {
        let c = &self.components[index];
        (
            (self.width as usize * c.h_samp_factor as usize).div_ceil(self.max_h_samp_factor()),
            (self.height as usize * c.v_samp_factor as usize).div_ceil(self.max_v_samp_factor()),
        )
    }

    /// Blocks needed to cover the component; the MCU grid of a scan that
    /// codes this component alone.
    pub fn component_blocks(&self, index: usize) -> (usize, usize) {
        let (width, height) = self.component_size(index);
        (width.div_ceil(BLOCK_DIM), height.div_ceil(BLOCK_DIM))
    }

    /// Plane size that holds every block of the interleaved MCU grid.
    pub fn component_allocated_size(&self, index: usize) -> (usize, usize) {
        let c = &self.components[index];
        let (mcus_x, mcus_y) = self.mcu_grid();
        (
            mcus_x * c.h_samp_factor as usize * BLOCK_DIM,
            mcus_y * c.v_samp_factor as usize * BLOCK_DIM,
        )
    }

    pub fn component_index(&self, id: u8) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }
}
