// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use std::collections::TryReserveError;

use thiserror::Error;

/// Broad failure classes, used by callers and by the damaged-row policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed stream structure: fatal.
    Format,
    /// Valid JPEG that uses a feature outside baseline: fatal by design.
    Unsupported,
    /// Ran out of data.
    Truncated,
    /// Restart marker missing or out of sequence.
    Resync,
    /// The caller passed bad parameters or pixel buffers.
    InvalidInput,
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid signature {0:02x}{1:02x}, expected ffd8")]
    InvalidSignature(u8, u8),
    #[error("Expected a marker at offset {0}, found byte {1:#04x}")]
    ExpectedMarker(usize, u8),
    #[error("Unexpected marker {0:#04x}")]
    UnexpectedMarker(u8),
    #[error("Invalid segment length {1} for marker {0:#04x}")]
    InvalidSegmentLength(u8, usize),
    #[error("Invalid sample precision {0}, only 8-bit samples are supported")]
    InvalidPrecision(u8),
    #[error("Invalid number of components: {0}")]
    InvalidComponentCount(usize),
    #[error("Invalid sampling factors {1}x{2} for component {0}")]
    InvalidSamplingFactor(u8, u8, u8),
    #[error("Invalid frame size: {0}x{1}")]
    InvalidFrameSize(u16, u16),
    #[error("Duplicate frame header")]
    DuplicateFrame,
    #[error("Scan header before frame header")]
    ScanBeforeFrame,
    #[error("Invalid scan header: {0}")]
    InvalidScan(&'static str),
    #[error("Scan references unknown component {0}")]
    UnknownComponent(u8),
    #[error("Invalid {0} table id {1}")]
    InvalidTableId(&'static str, u8),
    #[error("{0} table {1} referenced before definition")]
    UndefinedTable(&'static str, u8),
    #[error("Invalid quantization table precision {0}")]
    InvalidQuantPrecision(u8),
    #[error("Quantization table {0} contains a zero entry")]
    ZeroQuantValue(u8),
    #[error("Invalid Huffman table: {0}")]
    InvalidHuffmanTable(&'static str),
    #[error("Invalid Huffman code in MCU {0}")]
    InvalidHuffmanCode(usize),
    #[error("Symbol {0:#04x} has no Huffman code")]
    MissingHuffmanCode(u8),
    #[error("No scan found before end of image")]
    NoScan,
    #[error("Image size too large: {0}x{1}")]
    ImageTooLarge(usize, usize),
    #[error("Unsupported feature: {0}")]
    Unsupported(&'static str),
    #[error("Unexpected end of data while reading {0}")]
    Truncated(&'static str),
    #[error("Entropy-coded data ended inside MCU {0}")]
    UnexpectedEndOfScan(usize),
    #[error("Expected RST{expected} before MCU {mcu}, found {found:?}")]
    RestartMismatch {
        expected: u8,
        mcu: usize,
        found: Option<u8>,
    },
    #[error("Invalid image dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("Buffer size mismatch: expected {0}, got {1}")]
    BufferSizeMismatch(usize, usize),
    #[error("Invalid quality value: {0} (must be 1-100)")]
    InvalidQuality(u8),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Unsupported(_) => ErrorCategory::Unsupported,
            Error::Truncated(_) | Error::UnexpectedEndOfScan(_) => ErrorCategory::Truncated,
            Error::RestartMismatch { .. } => ErrorCategory::Resync,
            Error::InvalidDimensions(..)
            | Error::BufferSizeMismatch(..)
            | Error::InvalidQuality(_)
            | Error::MissingHuffmanCode(_) => ErrorCategory::InvalidInput,
            Error::Io(_) | Error::OutOfMemory(_) => ErrorCategory::Io,
            _ => ErrorCategory::Format,
        }
    }

    /// Whether the damaged-row budget may absorb this error.
    pub fn is_recoverable_in_scan(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Truncated | ErrorCategory::Resync
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
