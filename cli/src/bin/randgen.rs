//! `randgen` — dump random PINs, passwords, hex keys, or pronounceable
//! names to stdout, one per line.
//!
//! ```text
//! randgen 10 pass          # ten 12-symbol passwords
//! randgen 5 pin 6          # five 6-digit PINs
//! randgen 3 name 2-4       # three names of 2–4 syllables
//! randgen 1 bytes 32       # one 64-hex-digit key
//! ```

use std::process::ExitCode;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use passkeeper_crypto_core::{
    make_hex_block, make_name, make_number, make_password, make_pin, EntropyPool,
};

#[derive(Parser)]
#[command(name = "randgen", about = "Dump cryptographically random values")]
struct Cli {
    /// Number of values to generate.
    count: u32,

    /// What to generate, matched by substring: name, pin, pass, byte.
    kind: String,

    /// Length, or an inclusive `min-max` range. Defaults: name 2-5
    /// syllables, pin 4 digits, password 12 symbols, 16 bytes.
    #[arg(value_parser = parse_range)]
    length: Option<LengthRange>,
}

#[derive(Clone, Copy)]
enum Kind {
    Name,
    Pin,
    Password,
    Bytes,
}

impl Kind {
    fn detect(kind: &str) -> Option<Self> {
        if kind.contains("name") {
            Some(Self::Name)
        } else if kind.contains("pin") {
            Some(Self::Pin)
        } else if kind.contains("pass") {
            Some(Self::Password)
        } else if kind.contains("byte") {
            Some(Self::Bytes)
        } else {
            None
        }
    }

    const fn default_range(self) -> LengthRange {
        match self {
            Self::Name => LengthRange { min: 2, max: 5 },
            Self::Pin => LengthRange { min: 4, max: 4 },
            Self::Password => LengthRange { min: 12, max: 12 },
            Self::Bytes => LengthRange { min: 16, max: 16 },
        }
    }
}

#[derive(Clone, Copy)]
struct LengthRange {
    min: u32,
    max: u32,
}

fn parse_range(text: &str) -> Result<LengthRange, String> {
    let (min, max) = match text.split_once('-') {
        Some((low, high)) => {
            let min = low
                .parse::<u32>()
                .map_err(|_| format!("bad range start {low:?}"))?;
            let max = high
                .parse::<u32>()
                .map_err(|_| format!("bad range end {high:?}"))?;
            (min, max)
        }
        None => {
            let n = text
                .parse::<u32>()
                .map_err(|_| format!("bad length {text:?}"))?;
            (n, n)
        }
    };
    if min > max {
        return Err(format!("range {min}-{max} is inverted"));
    }
    Ok(LengthRange { min, max })
}

fn main() -> ExitCode {
    env_logger::init();

    // Bad usage exits 1; only help and version output exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("randgen: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let Some(kind) = Kind::detect(&cli.kind) else {
        bail!("unknown kind {:?} (expected name, pin, pass, or byte)", cli.kind);
    };
    let range = cli.length.unwrap_or_else(|| kind.default_range());

    let mut pool = EntropyPool::global()
        .lock()
        .map_err(|_| anyhow!("entropy pool mutex poisoned"))?;

    for _ in 0..cli.count {
        let line = match kind {
            // Names draw their own syllable count; a short name on pool
            // failure is still a usable suggestion.
            Kind::Name => make_name(&mut pool, range.min, range.max),
            Kind::Pin => {
                let length = draw_length(&mut pool, range)?;
                make_pin(&mut pool, length)?
            }
            Kind::Password => {
                let length = draw_length(&mut pool, range)?;
                make_password(&mut pool, length)?
            }
            Kind::Bytes => {
                let length = draw_length(&mut pool, range)?;
                make_hex_block(&mut pool, length)?
            }
        };
        println!("{line}");
    }
    Ok(())
}

/// Pick a length uniformly from the range (degenerate ranges draw nothing).
fn draw_length(pool: &mut EntropyPool, range: LengthRange) -> Result<usize> {
    if range.min == range.max {
        return Ok(range.min as usize);
    }
    let width = range
        .max
        .saturating_sub(range.min)
        .saturating_add(1);
    let offset = make_number(pool, width)?;
    Ok(range.min.saturating_add(offset) as usize)
}
