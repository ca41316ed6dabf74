// src/io/spmlist.rs
//! Suffix-prefix match lists.
//!
//! Text lines are `s +|- p +|- length` for exact matches and
//! `s +|- p +|- suffix_length prefix_length unit_edist` for approximate ones.
//! The binary formats start with one format byte and store each match as
//! three little-endian words: suffix read, prefix read and
//! `length << 2 | suffix_direct << 1 | prefix_direct`.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::str::FromStr;

use tracing::debug;

use crate::pairwise::Spm;

const BIN32_MARKER: u8 = 0x01;
const BIN64_MARKER: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpmFormat {
    #[default]
    Text,
    Bin32,
    Bin64,
}

impl SpmFormat {
    fn word_size(self) -> usize {
        match self {
            SpmFormat::Text => 0,
            SpmFormat::Bin32 => 4,
            SpmFormat::Bin64 => 8,
        }
    }
}

impl fmt::Display for SpmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpmFormat::Text => "text",
            SpmFormat::Bin32 => "bin32",
            SpmFormat::Bin64 => "bin64",
        })
    }
}

impl FromStr for SpmFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(SpmFormat::Text),
            "bin32" => Ok(SpmFormat::Bin32),
            "bin64" => Ok(SpmFormat::Bin64),
            other => Err(format!("unknown SPM list format: {}", other)),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SpmListError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: wrong number of tokens (expected {expected}, found {found})")]
    TokenCount { line: usize, expected: usize, found: usize },
    #[error("line {line}: token {token} unrecognized")]
    Token { line: usize, token: usize },
    #[error("SPM binary file error: premature end of file")]
    PrematureEof,
    #[error("SPM list is empty")]
    Empty,
    #[error("value {value} does not fit the {format} format")]
    Overflow { value: usize, format: SpmFormat },
    #[error("the {0} format stores exact matches only")]
    ApproximateBinary(SpmFormat),
}

/// Streams matches to `out` in one of the list formats
pub struct SpmWriter<W: Write> {
    out: W,
    format: SpmFormat,
    approximate: bool,
    written: usize,
}

impl<W: Write> SpmWriter<W> {
    /// Binary formats write their format byte immediately. They keep a
    /// single length per match, so approximate matches need the text format.
    pub fn new(mut out: W, format: SpmFormat, approximate: bool) -> Result<Self, SpmListError> {
        if approximate && format != SpmFormat::Text {
            return Err(SpmListError::ApproximateBinary(format));
        }
        match format {
            SpmFormat::Text => {}
            SpmFormat::Bin32 => out.write_all(&[BIN32_MARKER])?,
            SpmFormat::Bin64 => out.write_all(&[BIN64_MARKER])?,
        }
        Ok(Self { out, format, approximate, written: 0 })
    }

    pub fn write(&mut self, spm: &Spm) -> Result<(), SpmListError> {
        match self.format {
            SpmFormat::Text if self.approximate => writeln!(
                self.out,
                "{} {} {} {} {} {} {}",
                spm.suffix_read,
                strand(spm.suffix_direct),
                spm.prefix_read,
                strand(spm.prefix_direct),
                spm.suffix_length,
                spm.prefix_length,
                spm.unit_edist
            )?,
            SpmFormat::Text => writeln!(
                self.out,
                "{} {} {} {} {}",
                spm.suffix_read,
                strand(spm.suffix_direct),
                spm.prefix_read,
                strand(spm.prefix_direct),
                spm.suffix_length
            )?,
            SpmFormat::Bin32 => {
                let [s, p, l] = self.encode(spm, u32::MAX as u64)?;
                for word in [s as u32, p as u32, l as u32] {
                    self.out.write_all(&word.to_le_bytes())?;
                }
            }
            SpmFormat::Bin64 => {
                for word in self.encode(spm, u64::MAX)? {
                    self.out.write_all(&word.to_le_bytes())?;
                }
            }
        }
        self.written += 1;
        Ok(())
    }

    fn encode(&self, spm: &Spm, max: u64) -> Result<[u64; 3], SpmListError> {
        let fits = |value: usize, limit: u64| {
            if value as u64 <= limit {
                Ok(value as u64)
            } else {
                Err(SpmListError::Overflow { value, format: self.format })
            }
        };
        let suffix = fits(spm.suffix_read, max)?;
        let prefix = fits(spm.prefix_read, max)?;
        let length = fits(spm.suffix_length, max >> 2)?;
        let flags = (u64::from(spm.suffix_direct) << 1) | u64::from(spm.prefix_direct);
        Ok([suffix, prefix, length << 2 | flags])
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

fn strand(direct: bool) -> char {
    if direct {
        '+'
    } else {
        '-'
    }
}

fn parse_strand(token: &str) -> Option<bool> {
    match token {
        "+" => Some(true),
        "-" => Some(false),
        _ => None,
    }
}

/// Parse one text line; `None` when the match is shorter than `min_length`
fn parse_line(
    line: &str,
    line_no: usize,
    min_length: usize,
    approximate: bool,
) -> Result<Option<Spm>, SpmListError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    let expected = if approximate { 7 } else { 5 };
    if tokens.len() != expected {
        return Err(SpmListError::TokenCount { line: line_no, expected, found: tokens.len() });
    }
    let number = |i: usize| {
        tokens[i]
            .parse::<usize>()
            .map_err(|_| SpmListError::Token { line: line_no, token: i })
    };
    let direct = |i: usize| {
        parse_strand(tokens[i]).ok_or(SpmListError::Token { line: line_no, token: i })
    };

    let suffix_read = number(0)?;
    let suffix_direct = direct(1)?;
    let prefix_read = number(2)?;
    let prefix_direct = direct(3)?;
    let suffix_length = number(4)?;
    let (prefix_length, unit_edist) = if approximate {
        (number(5)?, number(6)?)
    } else {
        (suffix_length, 0)
    };

    let long_enough = suffix_length >= min_length || (approximate && prefix_length >= min_length);
    Ok(long_enough.then_some(Spm {
        suffix_read,
        prefix_read,
        suffix_length,
        prefix_length,
        unit_edist,
        suffix_direct,
        prefix_direct,
    }))
}

fn parse_text<R, F>(
    reader: R,
    min_length: usize,
    approximate: bool,
    on_spm: &mut F,
) -> Result<usize, SpmListError>
where
    R: BufRead,
    F: FnMut(Spm),
{
    let mut accepted = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if let Some(spm) = parse_line(line, index + 1, min_length, approximate)? {
            on_spm(spm);
            accepted += 1;
        }
    }
    Ok(accepted)
}

/// Fill `buf` unless the input ends first; returns the bytes read
fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn parse_binary<R, F>(
    mut reader: R,
    format: SpmFormat,
    min_length: usize,
    on_spm: &mut F,
) -> Result<usize, SpmListError>
where
    R: Read,
    F: FnMut(Spm),
{
    let width = format.word_size();
    let mut record = vec![0u8; 3 * width];
    let mut accepted = 0;
    loop {
        match read_record(&mut reader, &mut record)? {
            0 => break,
            n if n < record.len() => return Err(SpmListError::PrematureEof),
            _ => {}
        }
        let word = |i: usize| -> u64 {
            let bytes = &record[i * width..(i + 1) * width];
            bytes.iter().rev().fold(0u64, |acc, &b| acc << 8 | u64::from(b))
        };
        let packed = word(2);
        let length = (packed >> 2) as usize;
        if length >= min_length {
            on_spm(Spm {
                suffix_read: word(0) as usize,
                prefix_read: word(1) as usize,
                suffix_length: length,
                prefix_length: length,
                unit_edist: 0,
                suffix_direct: packed & 2 != 0,
                prefix_direct: packed & 1 != 0,
            });
            accepted += 1;
        }
    }
    Ok(accepted)
}

/// Replay every match of a list through `on_spm`, detecting the format from
/// its first byte. Returns the number of matches passed on.
pub fn parse_spm_list<R, F>(
    mut reader: R,
    min_length: usize,
    approximate: bool,
    mut on_spm: F,
) -> Result<usize, SpmListError>
where
    R: BufRead,
    F: FnMut(Spm),
{
    let first = match reader.fill_buf()?.first() {
        None => return Err(SpmListError::Empty),
        Some(&byte) => byte,
    };
    match first {
        BIN32_MARKER | BIN64_MARKER => {
            let format = if first == BIN32_MARKER { SpmFormat::Bin32 } else { SpmFormat::Bin64 };
            debug!("SPM list format: {}", format);
            reader.consume(1);
            parse_binary(reader, format, min_length, &mut on_spm)
        }
        _ => {
            debug!("SPM list format: text");
            parse_text(reader, min_length, approximate, &mut on_spm)
        }
    }
}

pub fn parse_spm_file<F>(
    path: &str,
    min_length: usize,
    approximate: bool,
    on_spm: F,
) -> Result<usize, SpmListError>
where
    F: FnMut(Spm),
{
    let file = File::open(path)?;
    parse_spm_list(BufReader::new(file), min_length, approximate, on_spm)
}
