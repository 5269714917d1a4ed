// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use std::fmt;

use crate::util::tracing_wrappers::*;

/// Outcome of decoding one entropy-coded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<T> {
    Value(T),
    /// The entropy-coded segment ended, either at the end of input or at a marker.
    EndOfData,
    /// The bits read do not form a valid code.
    Malformed,
}

/// Reads bits MSB-first from JPEG entropy-coded data.
///
/// Stuffed `FF 00` pairs yield a single `FF` data byte. Any marker, restart
/// markers included, stops the reader: no further bits are produced, and the
/// marker stays unconsumed at [`BitReader::position`] until
/// [`BitReader::read_marker`] takes it.
#[derive(Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_buf: u8,
    bits_in_buf: u32,
    marker: Option<u8>,
}

impl<'a> BitReader<'a> {
    /// Constructs a BitReader for a given range of data.
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        Self::new_at(data, 0)
    }

    /// Constructs a BitReader that starts at byte offset `pos` of `data`.
    pub fn new_at(data: &'a [u8], pos: usize) -> BitReader<'a> {
        BitReader {
            data,
            pos: pos.min(data.len()),
            bit_buf: 0,
            bits_in_buf: 0,
            marker: None,
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        if self.marker.is_some() {
            return None;
        }
        loop {
            let byte = *self.data.get(self.pos)?;
            if byte != 0xFF {
                self.pos += 1;
                return Some(byte);
            }
            match *self.data.get(self.pos + 1)? {
                0x00 => {
                    self.pos += 2;
                    return Some(0xFF);
                }
                // Fill byte in front of a marker.
                0xFF => self.pos += 1,
                marker => {
                    trace!("entropy-coded data stopped by marker {marker:#04x}");
                    self.marker = Some(marker);
                    return None;
                }
            }
        }
    }

    /// Reads one bit.
    /// ```
    /// # use dctcodec::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0b1000_0000]);
    /// assert_eq!(br.read_bit(), Some(1));
    /// assert_eq!(br.read_bit(), Some(0));
    /// ```
    pub fn read_bit(&mut self) -> Option<u32> {
        if self.bits_in_buf == 0 {
            self.bit_buf = self.next_byte()?;
            self.bits_in_buf = 8;
        }
        self.bits_in_buf -= 1;
        Some(((self.bit_buf >> self.bits_in_buf) & 1) as u32)
    }

    /// Reads `num` bits, most significant first. At most 16 bits per call.
    /// ```
    /// # use dctcodec::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0xFF, 0x00, 0x12]);
    /// assert_eq!(br.read_bits(4), Some(0xF));
    /// assert_eq!(br.read_bits(8), Some(0xF1));
    /// assert_eq!(br.read_bits(4), Some(0x2));
    /// assert_eq!(br.read_bits(1), None);
    /// ```
    pub fn read_bits(&mut self, num: u32) -> Option<u16> {
        debug_assert!(num <= 16);
        let mut value = 0u32;
        for _ in 0..num {
            value = (value << 1) | self.read_bit()?;
        }
        Some(value as u16)
    }

    /// Reads `num` bits without consuming them.
    pub fn peek_bits(&self, num: u32) -> Option<u16> {
        self.clone().read_bits(num)
    }

    /// Skips `num` bits.
    pub fn skip_bits(&mut self, num: u32) -> Option<()> {
        for _ in 0..num {
            self.read_bit()?;
        }
        Some(())
    }

    /// Reads `num` bits and sign-extends them as a JPEG magnitude category.
    pub fn receive_extend(&mut self, num: u32) -> Option<i32> {
        if num == 0 {
            return Some(0);
        }
        Some(extend(self.read_bits(num)?, num))
    }

    /// Discards the remaining bits of the current byte.
    pub fn align_to_byte(&mut self) {
        self.bits_in_buf = 0;
    }

    /// Aligns and returns the next `num` bytes verbatim.
    pub fn read_aligned_bytes(&mut self, num: usize) -> Option<&'a [u8]> {
        self.align_to_byte();
        let bytes = self.data.get(self.pos..self.pos.checked_add(num)?)?;
        self.pos += num;
        Some(bytes)
    }

    /// Aligns, skips `FF` fill bytes and consumes the marker that follows.
    /// Returns `None` if the next bytes are not a marker.
    /// ```
    /// # use dctcodec::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0xA0, 0xFF, 0xFF, 0xD3, 0x55]);
    /// assert_eq!(br.read_bits(3), Some(0b101));
    /// assert_eq!(br.read_marker(), Some(0xD3));
    /// assert_eq!(br.read_bits(8), Some(0x55));
    /// ```
    pub fn read_marker(&mut self) -> Option<u8> {
        self.align_to_byte();
        if let Some(marker) = self.marker.take() {
            // The position still points at the marker; step over it.
            self.skip_fill_bytes();
            self.pos += 2;
            return Some(marker);
        }
        self.skip_fill_bytes();
        match self.data.get(self.pos..self.pos + 2)? {
            [0xFF, marker] if *marker != 0 => {
                self.pos += 2;
                Some(*marker)
            }
            _ => None,
        }
    }

    fn skip_fill_bytes(&mut self) {
        while self.data.get(self.pos) == Some(&0xFF) && self.data.get(self.pos + 1) == Some(&0xFF)
        {
            self.pos += 1;
        }
    }

    /// The marker that stopped the reader, if any.
    pub fn marker(&self) -> Option<u8> {
        self.marker
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_aligned(&self) -> bool {
        self.bits_in_buf == 0
    }
}

impl fmt::Debug for BitReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BitReader{{ pos: {}, bits_in_buf: {}, marker: {:?}, remaining: {} }}",
            self.pos,
            self.bits_in_buf,
            self.marker,
            self.data.len().saturating_sub(self.pos)
        )
    }
}

/// Maps a raw `num`-bit value to a signed coefficient: values below
/// `2^(num-1)` are negative.
/// ```
/// # use dctcodec::bit_reader::extend;
/// assert_eq!(extend(0b011, 3), -4);
/// assert_eq!(extend(0b100, 3), 4);
/// assert_eq!(extend(0, 1), -1);
/// ```
pub fn extend(value: u16, num: u32) -> i32 {
    if num == 0 {
        return 0;
    }
    let value = value as i32;
    if value < (1 << (num - 1)) {
        value - (1 << num) + 1
    } else {
        value
    }
}
