// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Baseline sequential JPEG (DCTDecode/DCTEncode) codec.
//!
//! ```
//! use dctcodec::{Decoder, Encoder, options::DecoderOptions};
//!
//! let gray = vec![128u8; 32 * 16];
//! let jpeg = Encoder::new().quality(90).encode_gray(&gray, 32, 16)?;
//! let image = Decoder::new(DecoderOptions::default()).decode(&jpeg)?;
//! assert_eq!((image.width(), image.height()), (32, 16));
//! assert_eq!(image.pixels.len(), 32 * 16 * 3);
//! # Ok::<(), dctcodec::error::Error>(())
//! ```

#![deny(unsafe_code)]
pub mod bit_reader;
pub mod bit_writer;
pub mod color;
pub mod decode;
pub mod encode;
pub mod error;
pub mod headers;
pub mod huffman;
pub mod image;
pub mod options;
pub mod quant;
pub mod sample;
pub mod util;

pub use decode::{DecodedImage, Decoder, FrameInfo};
pub use encode::Encoder;
pub use error::{Error, Result};
