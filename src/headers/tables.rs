// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! DQT, DHT and DRI segments.

use std::io::Write;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use dctcodec_transforms::BLOCK_SIZE;

use super::{check_length, markers};
use crate::{
    error::{Error, Result},
    huffman::{HuffmanSpec, MAX_CODE_LENGTH, TableClass},
    quant::QuantTable,
};

pub const MAX_TABLE_SLOTS: usize = 4;

/// Parses every table of a DQT segment, returning (slot, table) pairs.
pub fn parse_dqt(payload: &[u8]) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut rest = payload;
    while let Some((&pq_tq, tail)) = rest.split_first() {
        let precision = pq_tq >> 4;
        let slot = pq_tq & 0xF;
        if precision > 1 {
            return Err(Error::InvalidQuantPrecision(precision));
        }
        if slot as usize >= MAX_TABLE_SLOTS {
            return Err(Error::InvalidTableId("quantization", slot));
        }
        let entry_size = precision as usize + 1;
        let Some(values) = tail.get(..BLOCK_SIZE * entry_size) else {
            return Err(Error::InvalidSegmentLength(markers::DQT, payload.len() + 2));
        };
        let entries: [u16; BLOCK_SIZE] = array_init::array_init(|i| {
            if precision == 0 {
                values[i] as u16
            } else {
                BigEndian::read_u16(&values[2 * i..])
            }
        });
        let table = QuantTable::from_zigzag(&entries).ok_or(Error::ZeroQuantValue(slot))?;
        tables.push((slot, table));
        rest = &tail[BLOCK_SIZE * entry_size..];
    }
    Ok(tables)
}

/// Writes one DQT segment holding all `tables`. Tables with entries above
/// 255 use 16-bit precision.
pub fn write_dqt<W: Write>(w: &mut W, tables: &[(u8, &QuantTable)]) -> Result<()> {
    let wide = |t: &QuantTable| t.values().iter().any(|&v| v > 255);
    let length: usize = 2 + tables
        .iter()
        .map(|(_, t)| 1 + BLOCK_SIZE * if wide(t) { 2 } else { 1 })
        .sum::<usize>();
    w.write_all(&[markers::PREFIX, markers::DQT])?;
    w.write_u16::<BigEndian>(length as u16)?;
    for &(slot, table) in tables {
        if wide(table) {
            w.write_u8(0x10 | slot)?;
            for value in table.zigzag() {
                w.write_u16::<BigEndian>(value)?;
            }
        } else {
            w.write_u8(slot)?;
            for value in table.zigzag() {
                w.write_u8(value as u8)?;
            }
        }
    }
    Ok(())
}

/// Parses every table of a DHT segment.
pub fn parse_dht(payload: &[u8]) -> Result<Vec<(TableClass, u8, HuffmanSpec)>> {
    let mut tables = Vec::new();
    let mut rest = payload;
    while let Some((&tc_th, tail)) = rest.split_first() {
        let class = match tc_th >> 4 {
            0 => TableClass::Dc,
            1 => TableClass::Ac,
            _ => return Err(Error::InvalidHuffmanTable("table class")),
        };
        let slot = tc_th & 0xF;
        if slot as usize >= MAX_TABLE_SLOTS {
            return Err(Error::InvalidTableId("Huffman", slot));
        }
        let Some(count_bytes) = tail.get(..MAX_CODE_LENGTH) else {
            return Err(Error::InvalidSegmentLength(markers::DHT, payload.len() + 2));
        };
        let mut counts = [0u8; MAX_CODE_LENGTH];
        counts.copy_from_slice(count_bytes);
        let num_values: usize = counts.iter().map(|&c| c as usize).sum();
        let Some(values) = tail.get(MAX_CODE_LENGTH..MAX_CODE_LENGTH + num_values) else {
            return Err(Error::InvalidSegmentLength(markers::DHT, payload.len() + 2));
        };
        tables.push((class, slot, HuffmanSpec::new(counts, values.to_vec())?));
        rest = &tail[MAX_CODE_LENGTH + num_values..];
    }
    Ok(tables)
}

pub fn write_dht<W: Write>(w: &mut W, tables: &[(TableClass, u8, &HuffmanSpec)]) -> Result<()> {
    let length: usize = 2 + tables
        .iter()
        .map(|(_, _, spec)| 1 + MAX_CODE_LENGTH + spec.num_symbols())
        .sum::<usize>();
    w.write_all(&[markers::PREFIX, markers::DHT])?;
    w.write_u16::<BigEndian>(length as u16)?;
    for &(class, slot, spec) in tables {
        w.write_u8(((class as u8) << 4) | slot)?;
        w.write_all(&spec.counts)?;
        w.write_all(&spec.values)?;
    }
    Ok(())
}

pub fn parse_dri(payload: &[u8]) -> Result<u16> {
    check_length(markers::DRI, payload, 2)?;
    Ok(BigEndian::read_u16(payload))
}

pub fn write_dri<W: Write>(w: &mut W, restart_interval: u16) -> Result<()> {
    w.write_all(&[markers::PREFIX, markers::DRI, 0, 4])?;
    w.write_u16::<BigEndian>(restart_interval)?;
    Ok(())
}
