// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
//! Canonical Huffman tables as carried by DHT segments.

use crate::{
    bit_reader::{BitReader, Decoded},
    error::{Error, Result},
};

pub const MAX_CODE_LENGTH: usize = 16;
pub const MAX_SYMBOLS: usize = 256;

/// DC or AC; the table class nibble of a DHT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableClass {
    Dc = 0,
    Ac = 1,
}

/// Code counts per length plus symbols in code order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanSpec {
    /// `counts[i]` is the number of codes of length `i + 1`.
    pub counts: [u8; MAX_CODE_LENGTH],
    pub values: Vec<u8>,
}

impl HuffmanSpec {
    pub fn new(counts: [u8; MAX_CODE_LENGTH], values: Vec<u8>) -> Result<Self> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if total > MAX_SYMBOLS {
            return Err(Error::InvalidHuffmanTable("more than 256 symbols"));
        }
        if total != values.len() {
            return Err(Error::InvalidHuffmanTable("symbol count mismatch"));
        }
        let spec = HuffmanSpec { counts, values };
        // Rejects over-subscribed code spaces early.
        spec.codes()?;
        Ok(spec)
    }

    pub fn num_symbols(&self) -> usize {
        self.values.len()
    }

    /// Assigns canonical codes in table order: codes of one length are
    /// consecutive, and the running code is doubled at each length step.
    pub fn codes(&self) -> Result<Vec<HuffmanCode>> {
        let mut codes = Vec::with_capacity(self.values.len());
        let mut code = 0u32;
        for (index, &count) in self.counts.iter().enumerate() {
            let length = index as u32 + 1;
            for _ in 0..count {
                if code >= (1 << length) {
                    return Err(Error::InvalidHuffmanTable("code space overflow"));
                }
                codes.push(HuffmanCode {
                    code: code as u16,
                    length: length as u8,
                });
                code += 1;
            }
            code <<= 1;
        }
        Ok(codes)
    }

    /// Annex K.3 luminance DC table.
    pub fn std_dc_luminance() -> Self {
        Self::from_std(&DC_LUMINANCE_COUNTS, &DC_VALUES)
    }

    /// Annex K.3 chrominance DC table.
    pub fn std_dc_chrominance() -> Self {
        Self::from_std(&DC_CHROMINANCE_COUNTS, &DC_VALUES)
    }

    /// Annex K.3 luminance AC table.
    pub fn std_ac_luminance() -> Self {
        Self::from_std(&AC_LUMINANCE_COUNTS, &AC_LUMINANCE_VALUES)
    }

    /// Annex K.3 chrominance AC table.
    pub fn std_ac_chrominance() -> Self {
        Self::from_std(&AC_CHROMINANCE_COUNTS, &AC_CHROMINANCE_VALUES)
    }

    fn from_std(counts: &[u8; MAX_CODE_LENGTH], values: &[u8]) -> Self {
        HuffmanSpec {
            counts: *counts,
            values: values.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HuffmanCode {
    pub code: u16,
    /// 0 when the symbol has no code.
    pub length: u8,
}

/// Symbol to code lookup used by the encoder.
#[derive(Debug, Clone)]
pub struct HuffmanEncodeTable {
    codes: [HuffmanCode; MAX_SYMBOLS],
}

impl HuffmanEncodeTable {
    pub fn new(spec: &HuffmanSpec) -> Result<Self> {
        let mut codes = [HuffmanCode::default(); MAX_SYMBOLS];
        for (code, &symbol) in spec.codes()?.into_iter().zip(spec.values.iter()) {
            codes[symbol as usize] = code;
        }
        Ok(HuffmanEncodeTable { codes })
    }

    pub fn code(&self, symbol: u8) -> Result<HuffmanCode> {
        let code = self.codes[symbol as usize];
        if code.length == 0 {
            return Err(Error::MissingHuffmanCode(symbol));
        }
        Ok(code)
    }
}

/// Per-length code ranges for bit-serial decoding.
#[derive(Debug, Clone)]
pub struct HuffmanDecodeTable {
    /// Largest code of each length, or -1 if there is none. Index 0 is unused.
    max_code: [i32; MAX_CODE_LENGTH + 1],
    min_code: [i32; MAX_CODE_LENGTH + 1],
    /// Index into `values` of the first code of each length.
    val_ptr: [usize; MAX_CODE_LENGTH + 1],
    values: Vec<u8>,
}

impl HuffmanDecodeTable {
    pub fn new(spec: &HuffmanSpec) -> Result<Self> {
        let codes = spec.codes()?;
        let mut max_code = [-1i32; MAX_CODE_LENGTH + 1];
        let mut min_code = [0i32; MAX_CODE_LENGTH + 1];
        let mut val_ptr = [0usize; MAX_CODE_LENGTH + 1];
        let mut index = 0;
        for length in 1..=MAX_CODE_LENGTH {
            let count = spec.counts[length - 1] as usize;
            if count == 0 {
                continue;
            }
            val_ptr[length] = index;
            min_code[length] = codes[index].code as i32;
            max_code[length] = codes[index + count - 1].code as i32;
            index += count;
        }
        Ok(HuffmanDecodeTable {
            max_code,
            min_code,
            val_ptr,
            values: spec.values.clone(),
        })
    }

    pub fn decode(&self, br: &mut BitReader) -> Decoded<u8> {
        let mut code = 0i32;
        for length in 1..=MAX_CODE_LENGTH {
            let Some(bit) = br.read_bit() else {
                return Decoded::EndOfData;
            };
            code = (code << 1) | bit as i32;
            if code <= self.max_code[length] {
                let index = self.val_ptr[length] + (code - self.min_code[length]) as usize;
                return Decoded::Value(self.values[index]);
            }
        }
        Decoded::Malformed
    }
}

pub const DC_LUMINANCE_COUNTS: [u8; MAX_CODE_LENGTH] =
    [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
pub const DC_CHROMINANCE_COUNTS: [u8; MAX_CODE_LENGTH] =
    [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
pub const DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

pub const AC_LUMINANCE_COUNTS: [u8; MAX_CODE_LENGTH] =
    [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];
pub const AC_LUMINANCE_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

pub const AC_CHROMINANCE_COUNTS: [u8; MAX_CODE_LENGTH] =
    [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];
pub const AC_CHROMINANCE_VALUES: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

#[cfg(test)]
mod test {
    use arbtest::{
        arbitrary::{self, Unstructured},
        arbtest,
    };
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    use super::*;
    use crate::bit_writer::BitWriter;

    fn all_std() -> [HuffmanSpec; 4] {
        [
            HuffmanSpec::std_dc_luminance(),
            HuffmanSpec::std_dc_chrominance(),
            HuffmanSpec::std_ac_luminance(),
            HuffmanSpec::std_ac_chrominance(),
        ]
    }

    #[test]
    fn std_tables_are_valid() {
        for spec in all_std() {
            let total: usize = spec.counts.iter().map(|&c| c as usize).sum();
            assert_eq!(total, spec.num_symbols());
            HuffmanSpec::new(spec.counts, spec.values.clone()).unwrap();
        }
        assert_eq!(HuffmanSpec::std_ac_luminance().num_symbols(), 162);
        assert_eq!(HuffmanSpec::std_dc_chrominance().num_symbols(), 12);
    }

    #[test]
    fn canonical_assignment() {
        let codes = HuffmanSpec::std_dc_luminance().codes().unwrap();
        // One 2-bit code, five 3-bit codes, then one code per length.
        assert_eq!(codes[0], HuffmanCode { code: 0b00, length: 2 });
        assert_eq!(codes[1], HuffmanCode { code: 0b010, length: 3 });
        assert_eq!(codes[5], HuffmanCode { code: 0b110, length: 3 });
        assert_eq!(codes[6], HuffmanCode { code: 0b1110, length: 4 });
        assert_eq!(codes[11], HuffmanCode { code: 0b1_1111_1110, length: 9 });
    }

    #[test]
    fn eob_and_zrl_codes() {
        let table = HuffmanEncodeTable::new(&HuffmanSpec::std_ac_luminance()).unwrap();
        assert_eq!(table.code(0x00).unwrap(), HuffmanCode { code: 0b1010, length: 4 });
        assert_eq!(
            table.code(0xF0).unwrap(),
            HuffmanCode {
                code: 0b111_1111_1001,
                length: 11
            }
        );
        assert!(matches!(table.code(0x0B), Err(Error::MissingHuffmanCode(0x0B))));
    }

    #[test]
    fn rejects_overflow() {
        let mut counts = [0u8; MAX_CODE_LENGTH];
        counts[0] = 3;
        assert!(matches!(
            HuffmanSpec::new(counts, vec![1, 2, 3]),
            Err(Error::InvalidHuffmanTable(_))
        ));
        counts[0] = 2;
        assert!(HuffmanSpec::new(counts, vec![1, 2]).is_ok());
    }

    #[test]
    fn rejects_count_mismatch() {
        let mut counts = [0u8; MAX_CODE_LENGTH];
        counts[2] = 2;
        assert!(HuffmanSpec::new(counts, vec![7]).is_err());
    }

    #[test]
    fn decode_reports_end_and_malformed() {
        let spec = HuffmanSpec::std_dc_luminance();
        let table = HuffmanDecodeTable::new(&spec).unwrap();
        let mut br = BitReader::new(&[]);
        assert_eq!(table.decode(&mut br), Decoded::EndOfData);

        // A table with a single 1-bit code: "1" never matches.
        let mut counts = [0u8; MAX_CODE_LENGTH];
        counts[0] = 1;
        let table = HuffmanDecodeTable::new(&HuffmanSpec::new(counts, vec![5]).unwrap()).unwrap();
        let mut br = BitReader::new(&[0b0111_1111, 0xFE, 0x00]);
        assert_eq!(table.decode(&mut br), Decoded::Value(5));
        assert_eq!(table.decode(&mut br), Decoded::Malformed);
    }

    #[test]
    fn decode_what_was_encoded() {
        let mut rng = XorShiftRng::seed_from_u64(0);
        for spec in all_std() {
            let encode = HuffmanEncodeTable::new(&spec).unwrap();
            let decode = HuffmanDecodeTable::new(&spec).unwrap();
            let symbols: Vec<u8> = (0..500)
                .map(|_| spec.values[rng.random_range(0..spec.values.len())])
                .collect();
            let mut bw = BitWriter::new(Vec::new());
            for &symbol in &symbols {
                let code = encode.code(symbol).unwrap();
                bw.write_bits(code.code as u32, code.length as u32).unwrap();
            }
            let data = bw.finish().unwrap();
            let mut br = BitReader::new(&data);
            for &symbol in &symbols {
                assert_eq!(decode.decode(&mut br), Decoded::Value(symbol));
            }
        }
    }

    /// Draws a length histogram that never over-subscribes the code space,
    /// with distinct symbols in random order.
    fn arbitrary_spec(u: &mut Unstructured<'_>) -> arbitrary::Result<HuffmanSpec> {
        let mut counts = [0u8; MAX_CODE_LENGTH];
        let mut available = 2u32;
        let mut total = 0usize;
        for count in counts.iter_mut() {
            let max = available.min((MAX_SYMBOLS - total) as u32).min(u8::MAX as u32);
            *count = u.int_in_range(0..=max)? as u8;
            total += *count as usize;
            available = (available - *count as u32) * 2;
        }
        if total == 0 {
            counts[0] = 1;
            total = 1;
        }
        let mut symbols: Vec<u8> = (0..=255).collect();
        for i in 0..total {
            let j = u.int_in_range(i..=255)?;
            symbols.swap(i, j);
        }
        symbols.truncate(total);
        Ok(HuffmanSpec::new(counts, symbols).unwrap())
    }

    #[test]
    fn arbitrary_specs_are_prefix_free() {
        arbtest(|u| {
            let spec = arbitrary_spec(u)?;
            let codes = spec.codes().unwrap();
            for (i, a) in codes.iter().enumerate() {
                for b in &codes[i + 1..] {
                    assert!(a.length <= b.length);
                    let prefix = b.code >> (b.length - a.length);
                    assert_ne!(prefix, a.code, "{a:?} is a prefix of {b:?}");
                }
            }
            Ok(())
        });
    }

    #[test]
    fn arbitrary_specs_decode_what_was_encoded() {
        arbtest(|u| {
            let spec = arbitrary_spec(u)?;
            let encode = HuffmanEncodeTable::new(&spec).unwrap();
            let decode = HuffmanDecodeTable::new(&spec).unwrap();
            let count = u.int_in_range(1..=200)?;
            let mut symbols = Vec::with_capacity(count);
            let mut bw = BitWriter::new(Vec::new());
            for _ in 0..count {
                let symbol = *u.choose(&spec.values)?;
                let code = encode.code(symbol).unwrap();
                bw.write_bits(code.code as u32, code.length as u32).unwrap();
                symbols.push(symbol);
            }
            let data = bw.finish().unwrap();
            let mut br = BitReader::new(&data);
            for symbol in symbols {
                assert_eq!(decode.decode(&mut br), Decoded::Value(symbol));
            }
            Ok(())
        });
    }
}
