// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use std::io::{self, Write};

/// Writes bits MSB-first, inserting a `00` after every `FF` data byte.
pub struct BitWriter<W: Write> {
    output: W,
    bit_buf: u32,
    bits_in_buf: u32,
    bytes_written: usize,
}

impl<W: Write> BitWriter<W> {
    pub fn new(output: W) -> Self {
        BitWriter {
            output,
            bit_buf: 0,
            bits_in_buf: 0,
            bytes_written: 0,
        }
    }

    /// Appends the low `num` bits of `value`. At most 16 bits per call.
    pub fn write_bits(&mut self, value: u32, num: u32) -> io::Result<()> {
        debug_assert!(num <= 16);
        if num == 0 {
            return Ok(());
        }
        self.bit_buf = (self.bit_buf << num) | (value & ((1 << num) - 1));
        self.bits_in_buf += num;
        while self.bits_in_buf >= 8 {
            let byte = (self.bit_buf >> (self.bits_in_buf - 8)) as u8;
            self.bits_in_buf -= 8;
            self.emit_stuffed(byte)?;
        }
        self.bit_buf &= (1 << self.bits_in_buf) - 1;
        Ok(())
    }

    fn emit_stuffed(&mut self, byte: u8) -> io::Result<()> {
        if byte == 0xFF {
            self.output.write_all(&[0xFF, 0x00])?;
            self.bytes_written += 2;
        } else {
            self.output.write_all(&[byte])?;
            self.bytes_written += 1;
        }
        Ok(())
    }

    /// Pads the pending partial byte with 1-bits and emits it.
    pub fn flush_with_padding(&mut self) -> io::Result<()> {
        if self.bits_in_buf > 0 {
            let pad = 8 - self.bits_in_buf;
            self.write_bits((1 << pad) - 1, pad)?;
        }
        Ok(())
    }

    /// Writes bytes verbatim, with no stuffing. Only valid on a byte boundary.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        debug_assert_eq!(self.bits_in_buf, 0);
        self.output.write_all(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    /// Number of bytes handed to the output so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn is_aligned(&self) -> bool {
        self.bits_in_buf == 0
    }

    /// Flushes with padding and returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush_with_padding()?;
        Ok(self.output)
    }
}
