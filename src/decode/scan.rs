// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use dctcodec_transforms::{BLOCK_DIM, BLOCK_SIZE, inverse_dct_8x8, level_shift_to_bytes};

use super::{Component, Tables};
use crate::{
    bit_reader::{BitReader, Decoded},
    error::{Error, Result},
    headers::{FrameHeader, ScanHeader, find_restart_marker, markers},
    huffman::HuffmanDecodeTable,
    quant::{QuantTable, ZIGZAG_TO_NATURAL},
    util::tracing_wrappers::*,
};

const MAX_DC_CATEGORY: u8 = 11;
const BLANK_SAMPLE: u8 = 128;

#[derive(Clone, Copy)]
struct BoundComponent<'a> {
    index: usize,
    dc: &'a HuffmanDecodeTable,
    ac: &'a HuffmanDecodeTable,
    quant: &'a QuantTable,
}

/// Decodes the entropy-coded segment of one scan into the component planes.
pub(super) struct ScanDecoder<'a, 'c> {
    data: &'a [u8],
    br: BitReader<'a>,
    bound: Vec<BoundComponent<'a>>,
    components: &'c mut [Component],
    interleaved: bool,
    mcus_x: usize,
    mcus_y: usize,
    restart_interval: usize,
    next_restart: u8,
}

impl<'a, 'c> ScanDecoder<'a, 'c> {
    pub(super) fn new(
        data: &'a [u8],
        start: usize,
        frame: &FrameHeader,
        scan: &ScanHeader,
        tables: &'a Tables,
        components: &'c mut [Component],
        restart_interval: usize,
    ) -> Result<Self> {
        let mut bound = Vec::with_capacity(scan.components.len());
        for sc in &scan.components {
            let index = sc.component_idx;
            let quant_idx = components[index].info.quant_idx;
            bound.push(BoundComponent {
                index,
                dc: tables.dc[sc.dc_tbl_idx as usize]
                    .as_ref()
                    .ok_or(Error::UndefinedTable("DC Huffman", sc.dc_tbl_idx))?,
                ac: tables.ac[sc.ac_tbl_idx as usize]
                    .as_ref()
                    .ok_or(Error::UndefinedTable("AC Huffman", sc.ac_tbl_idx))?,
                quant: tables.quant[quant_idx as usize]
                    .as_ref()
                    .ok_or(Error::UndefinedTable("quantization", quant_idx))?,
            });
            components[index].dc_pred = 0;
        }
        let interleaved = scan.is_interleaved();
        let (mcus_x, mcus_y) = if interleaved {
            frame.mcu_grid()
        } else {
            components[scan.components[0].component_idx].blocks
        };
        debug!(
            "scan over {} components, {mcus_x}x{mcus_y} MCUs, restart interval {restart_interval}",
            bound.len()
        );
        Ok(ScanDecoder {
            data,
            br: BitReader::new_at(data, start),
            bound,
            components,
            interleaved,
            mcus_x,
            mcus_y,
            restart_interval,
            next_restart: 0,
        })
    }

    /// Decodes every MCU and returns the offset where entropy-coded data
    /// stopped.
    pub(super) fn run(mut self, max_damaged_rows: usize, damaged_rows: &mut usize) -> Result<usize> {
        let total = self.mcus_x * self.mcus_y;
        let mut mcu = 0;
        let mut resumed = false;
        while mcu < total {
            let at_boundary =
                self.restart_interval > 0 && mcu > 0 && mcu % self.restart_interval == 0;
            let mut result = Ok(());
            if at_boundary && !resumed {
                result = self.restart(mcu);
            }
            resumed = false;
            if result.is_ok() {
                result = self.decode_mcu(mcu);
            }
            let Err(error) = result else {
                mcu += 1;
                continue;
            };
            if max_damaged_rows == 0 || !error.is_recoverable_in_scan() {
                return Err(error);
            }
            let resume = self.resync(mcu, at_boundary);
            let first_row = mcu / self.mcus_x;
            let end_row = match resume {
                Some(resume) if resume > mcu => (resume - 1) / self.mcus_x + 1,
                Some(_) => first_row,
                None => self.mcus_y,
            };
            *damaged_rows += end_row - first_row;
            if *damaged_rows > max_damaged_rows {
                return Err(error);
            }
            warn!("{error}; blanking MCU rows {first_row}..{end_row}, resuming at {resume:?}");
            self.blank_rows(first_row, end_row);
            match resume {
                Some(resume) => {
                    mcu = resume;
                    resumed = true;
                }
                None => break,
            }
        }
        self.br.align_to_byte();
        Ok(self.br.position())
    }

    fn reset_predictors(&mut self) {
        for b in &self.bound {
            self.components[b.index].dc_pred = 0;
        }
    }

    fn restart(&mut self, mcu: usize) -> Result<()> {
        let expected = self.next_restart;
        let before = self.br.clone();
        match self.br.read_marker() {
            Some(marker) if marker == markers::RST0 + expected => {
                trace!("RST{expected} before MCU {mcu}");
                self.next_restart = (expected + 1) % 8;
                self.reset_predictors();
                Ok(())
            }
            found => {
                // Leave a misplaced marker in the stream for resynchronization.
                self.br = before;
                Err(Error::RestartMismatch {
                    expected,
                    mcu,
                    found,
                })
            }
        }
    }

    /// Moves the reader to the next restart marker found in the data and
    /// returns the MCU that follows it. Restart numbers cycle through eight
    /// values, so the nearest boundary with a matching number is chosen.
    fn resync(&mut self, mcu: usize, at_boundary: bool) -> Option<usize> {
        let interval = self.restart_interval;
        if interval == 0 {
            return None;
        }
        let (offset, number) = find_restart_marker(self.data, self.br.position())?;
        let first = (if at_boundary { mcu / interval } else { mcu / interval + 1 }).max(1);
        let boundary = first + (number as usize + 1 + 8 - first % 8) % 8;
        let resume = boundary * interval;
        if resume >= self.mcus_x * self.mcus_y {
            return None;
        }
        self.br = BitReader::new_at(self.data, offset);
        self.br.read_marker()?;
        self.next_restart = (number + 1) % 8;
        self.reset_predictors();
        Some(resume)
    }

    fn blank_rows(&mut self, first_row: usize, end_row: usize) {
        for i in 0..self.bound.len() {
            let component = &mut self.components[self.bound[i].index];
            let rows_per_mcu = if self.interleaved {
                component.info.v_samp_factor as usize * BLOCK_DIM
            } else {
                BLOCK_DIM
            };
            component
                .plane
                .fill_rows(first_row * rows_per_mcu, end_row * rows_per_mcu, BLANK_SAMPLE);
        }
    }

    fn decode_mcu(&mut self, mcu: usize) -> Result<()> {
        let mcu_x = mcu % self.mcus_x;
        let mcu_y = mcu / self.mcus_x;
        let mut coefficients = [0i32; BLOCK_SIZE];
        let mut dequantized = [0f32; BLOCK_SIZE];
        let mut spatial = [0f32; BLOCK_SIZE];
        let mut samples = [0u8; BLOCK_SIZE];
        for i in 0..self.bound.len() {
            let b = self.bound[i];
            let component = &mut self.components[b.index];
            let (h, v) = if self.interleaved {
                (
                    component.info.h_samp_factor as usize,
                    component.info.v_samp_factor as usize,
                )
            } else {
                (1, 1)
            };
            for by in 0..v {
                for bx in 0..h {
                    decode_block(
                        &mut self.br,
                        b.dc,
                        b.ac,
                        &mut component.dc_pred,
                        &mut coefficients,
                        mcu,
                    )?;
                    b.quant.dequantize(&coefficients, &mut dequantized);
                    inverse_dct_8x8(&dequantized, &mut spatial);
                    level_shift_to_bytes(&spatial, &mut samples);
                    component
                        .plane
                        .write_block(mcu_x * h + bx, mcu_y * v + by, &samples);
                }
            }
        }
        Ok(())
    }
}

fn symbol(decoded: Decoded<u8>, mcu: usize) -> Result<u8> {
    match decoded {
        Decoded::Value(value) => Ok(value),
        Decoded::EndOfData => Err(Error::UnexpectedEndOfScan(mcu)),
        Decoded::Malformed => Err(Error::InvalidHuffmanCode(mcu)),
    }
}

/// Decodes one block into natural-order coefficients, updating the DC
/// predictor.
pub(crate) fn decode_block(
    br: &mut BitReader,
    dc: &HuffmanDecodeTable,
    ac: &HuffmanDecodeTable,
    dc_pred: &mut i32,
    coefficients: &mut [i32; BLOCK_SIZE],
    mcu: usize,
) -> Result<()> {
    coefficients.fill(0);
    let category = symbol(dc.decode(br), mcu)?;
    if category > MAX_DC_CATEGORY {
        return Err(Error::InvalidHuffmanCode(mcu));
    }
    let diff = br
        .receive_extend(category as u32)
        .ok_or(Error::UnexpectedEndOfScan(mcu))?;
    *dc_pred = dc_pred.wrapping_add(diff);
    coefficients[0] = *dc_pred;

    let mut k = 1;
    while k < BLOCK_SIZE {
        let rs = symbol(ac.decode(br), mcu)?;
        let run = (rs >> 4) as usize;
        let size = (rs & 0xF) as u32;
        if size == 0 {
            if run == 15 {
                k += 16;
                continue;
            }
            // EOB, or an invalid run without a value: the block ends here.
            break;
        }
        k += run;
        let value = br
            .receive_extend(size)
            .ok_or(Error::UnexpectedEndOfScan(mcu))?;
        // Runs past the last coefficient are dropped after reading their bits.
        if k < BLOCK_SIZE {
            coefficients[ZIGZAG_TO_NATURAL[k]] = value;
        }
        k += 1;
    }
    trace!("MCU {mcu}: DC {}", coefficients[0]);
    Ok(())
}
