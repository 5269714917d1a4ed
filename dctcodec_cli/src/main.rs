// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, eyre};
use dctcodec::{
    Decoder, Encoder,
    options::{
        CmykConvention, DEFAULT_QUALITY, DecoderOptions, OutputFormat, Subsampling, Upsampling,
    },
};
use dctcodec_cli::{RasterImage, read_image, write_image};

#[derive(Clone, Copy, ValueEnum)]
enum SubsamplingArg {
    #[value(name = "444")]
    S444,
    #[value(name = "422")]
    S422,
    #[value(name = "420")]
    S420,
}

impl From<SubsamplingArg> for Subsampling {
    fn from(arg: SubsamplingArg) -> Subsampling {
        match arg {
            SubsamplingArg::S444 => Subsampling::S444,
            SubsamplingArg::S422 => Subsampling::S422,
            SubsamplingArg::S420 => Subsampling::S420,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Decodes a baseline JPEG to .ppm, .pgm or .png
    Decode {
        input: PathBuf,
        output: PathBuf,
        /// Writes component samples without color conversion
        #[clap(long)]
        raw: bool,
        /// Interpolates subsampled chroma instead of replicating it
        #[clap(long)]
        bilinear: bool,
        /// Treats Adobe CMYK as plain rather than inverted
        #[clap(long)]
        standard_cmyk: bool,
        /// MCU rows that may be blanked when the data is damaged
        #[clap(long, default_value_t = 0)]
        max_damaged_rows: usize,
    },
    /// Encodes a .ppm, .pgm or .png image as baseline JPEG
    Encode {
        input: PathBuf,
        output: PathBuf,
        #[clap(long, default_value_t = DEFAULT_QUALITY)]
        quality: u8,
        #[clap(long, value_enum, default_value_t = SubsamplingArg::S420)]
        subsampling: SubsamplingArg,
        /// MCUs between restart markers, 0 for none
        #[clap(long, default_value_t = 0)]
        restart_interval: u16,
    },
    /// Prints the frame parameters of a JPEG
    Info { input: PathBuf },
}

#[derive(Parser)]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).wrap_err_with(|| format!("Cannot read {path:?}"))
}

fn decode(input: PathBuf, output: PathBuf, options: DecoderOptions) -> Result<()> {
    let image = Decoder::new(options)
        .decode(&read(&input)?)
        .wrap_err_with(|| format!("Cannot decode {input:?}"))?;
    if image.damaged_rows > 0 {
        eprintln!("Warning: {} damaged MCU rows were blanked", image.damaged_rows);
    }
    let raster = RasterImage {
        width: image.width() as u32,
        height: image.height() as u32,
        channels: image.channels,
        data: image.pixels,
    };
    write_image(&output, &raster)
}

fn encode(input: PathBuf, output: PathBuf, encoder: Encoder) -> Result<()> {
    let image = read_image(&input)?;
    let jpeg = match image.channels {
        1 => encoder.encode_gray(&image.data, image.width, image.height)?,
        3 => encoder.encode_rgb(&image.data, image.width, image.height)?,
        n => return Err(eyre!("Cannot encode {n}-channel input")),
    };
    std::fs::write(&output, jpeg).wrap_err_with(|| format!("Cannot write {output:?}"))
}

fn info(input: PathBuf) -> Result<()> {
    let info = Decoder::default()
        .read_info(&read(&input)?)
        .wrap_err_with(|| format!("Cannot parse {input:?}"))?;
    let sampling: Vec<String> = info
        .components
        .iter()
        .map(|c| format!("{}x{}", c.h_samp_factor, c.v_samp_factor))
        .collect();
    println!(
        "{}x{}, {} components, sampling {}",
        info.width,
        info.height,
        info.num_components(),
        sampling.join(" ")
    );
    if info.restart_interval > 0 {
        println!("restart interval: {} MCUs", info.restart_interval);
    }
    if let Some(jfif) = &info.jfif {
        println!(
            "JFIF {}.{:02}, density {}x{} {:?}",
            jfif.version.0, jfif.version.1, jfif.density.x, jfif.density.y, jfif.density.units
        );
    }
    if let Some(adobe) = &info.adobe {
        println!("Adobe transform {}", adobe.transform_code);
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    #[cfg(feature = "tracing-subscriber")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }

    match Opt::parse().command {
        Command::Decode {
            input,
            output,
            raw,
            bilinear,
            standard_cmyk,
            max_damaged_rows,
        } => {
            let options = DecoderOptions {
                max_damaged_rows,
                upsampling: if bilinear {
                    Upsampling::Bilinear
                } else {
                    Upsampling::Nearest
                },
                cmyk_convention: if standard_cmyk {
                    CmykConvention::Standard
                } else {
                    CmykConvention::AdobeInverted
                },
                output_format: if raw {
                    OutputFormat::Raw
                } else {
                    OutputFormat::Rgb
                },
                ..Default::default()
            };
            decode(input, output, options)
        }
        Command::Encode {
            input,
            output,
            quality,
            subsampling,
            restart_interval,
        } => {
            let encoder = Encoder::new()
                .quality(quality)
                .subsampling(subsampling.into())
                .restart_interval(restart_interval);
            encode(input, output, encoder)
        }
        Command::Info { input } => info(input),
    }
}
