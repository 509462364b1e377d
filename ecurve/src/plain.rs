//! The plain-text ecurve format: a human-readable, grep-able dump used mostly
//! for debugging and small fixtures (see `binary`/`mmap` for the formats a
//! production-size index is actually stored in).
//!
//! ```text
//! >> alphabet: ACDEFGHIKLMNPQRSTVWY, suffixes: 2
//! >AAAAAA 1
//! AAAAAAAAAAAA 7
//! >YYYYYY 1
//! AAAAAAAAAAAA 9
//! ```

use std::io::{BufRead, Write};

use alphabet::Alphabet;
use word::{AMINO_BITS, PREFIX_LEN, SUFFIX_LEN, Word};

use crate::{builder::EcurveBuilder, unrepack_prefix, Ecurve, EcurveError};

const DIGIT_MASK: u64 = (1 << AMINO_BITS) - 1;

fn pack_digits(s: &str, alpha: &Alphabet, len: usize) -> Result<u64, EcurveError> {
    let bytes = s.as_bytes();
    if bytes.len() != len {
        return Err(EcurveError::Invalid(format!(
            "expected a {}-character word string, got {:?} ({} characters)",
            len,
            s,
            bytes.len()
        )));
    }
    let mut value = 0_u64;
    for &b in bytes {
        let amino = alpha.char_to_amino(b);
        if amino < 0 {
            return Err(EcurveError::Invalid(format!("unknown character {:?} in word string", b as char)));
        }
        value = (value << AMINO_BITS) | amino as u64;
    }
    Ok(value)
}

fn unpack_digits(mut value: u64, len: usize, alpha: &Alphabet) -> String {
    let mut digits = vec![0_u8; len];
    for slot in digits.iter_mut().rev() {
        *slot = (value & DIGIT_MASK) as u8;
        value >>= AMINO_BITS;
    }
    digits.into_iter().map(|d| alpha.amino_to_char(d) as char).collect()
}

/// Writes `ecurve` in the plain-text format described in the module docs.
pub fn write_plain(ecurve: &Ecurve, w: &mut impl Write) -> std::io::Result<()> {
    writeln!(w, ">> alphabet: {}, suffixes: {}", ecurve.alphabet.as_str(), ecurve.suffix_count())?;

    let radix = ecurve.alphabet.len() as u64;
    for (compact_prefix, entry) in ecurve.prefix_table.iter().enumerate() {
        if entry.is_edge() || entry.count == 0 {
            continue;
        }

        let raw_prefix = unrepack_prefix(compact_prefix as u64, radix);
        let prefix_str = unpack_digits(raw_prefix as u64, PREFIX_LEN, &ecurve.alphabet);
        writeln!(w, ">{} {}", prefix_str, entry.count)?;

        let start = entry.first as usize;
        let end = start + entry.count as usize;
        for i in start .. end {
            let suffix_str = unpack_digits(ecurve.suffixes[i], SUFFIX_LEN, &ecurve.alphabet);
            writeln!(w, "{} {}", suffix_str, ecurve.classes[i])?;
        }
    }

    Ok(())
}

fn parse_header(line: &str) -> Result<(String, usize), EcurveError> {
    let body = line
        .strip_prefix(">> alphabet: ")
        .ok_or_else(|| EcurveError::Invalid(format!("malformed header line: {:?}", line)))?;
    let (alpha_part, suffixes_part) = body
        .split_once(", suffixes: ")
        .ok_or_else(|| EcurveError::Invalid(format!("malformed header line: {:?}", line)))?;
    let count: usize = suffixes_part
        .trim()
        .parse()
        .map_err(|_| EcurveError::Invalid(format!("malformed suffix count: {:?}", suffixes_part)))?;
    Ok((alpha_part.to_string(), count))
}

/// Reads an [`Ecurve`] from its plain-text representation.
///
/// # Errors
///
/// Returns [`EcurveError::Invalid`] for a missing/malformed header, a bucket
/// header line missing its leading `>`, a word string of the wrong length, or
/// a word containing a character outside the declared alphabet.
pub fn read_plain(r: impl BufRead) -> Result<Ecurve, EcurveError> {
    let mut lines = r.lines().filter(|l| l.as_ref().map(|s| !s.starts_with('#')).unwrap_or(true));

    let header = lines
        .next()
        .ok_or_else(|| EcurveError::Invalid("empty ecurve file".to_string()))??;
    let (alpha_str, expected_count) = parse_header(&header)?;
    let alphabet = Alphabet::new(&alpha_str).map_err(|e| EcurveError::Invalid(e.to_string()))?;

    let mut builder = EcurveBuilder::new(alphabet);
    let mut seen = 0_usize;

    let mut pending: Option<String> = None;
    loop {
        let line = match pending.take() {
            Some(l) => l,
            None => match lines.next() {
                None => break,
                Some(l) => l?
            }
        };

        let bucket_header = line
            .strip_prefix('>')
            .ok_or_else(|| EcurveError::Invalid(format!("expected a bucket header line, got {:?}", line)))?;
        let (prefix_str, count_str) = bucket_header
            .rsplit_once(' ')
            .ok_or_else(|| EcurveError::Invalid(format!("malformed bucket header: {:?}", line)))?;
        let count: usize = count_str
            .trim()
            .parse()
            .map_err(|_| EcurveError::Invalid(format!("malformed bucket count: {:?}", count_str)))?;

        let prefix_raw = pack_digits(prefix_str, builder.alphabet(), PREFIX_LEN)? as u32;

        for _ in 0 .. count {
            let entry_line = lines
                .next()
                .ok_or_else(|| EcurveError::Invalid("truncated bucket: expected more suffix lines".to_string()))??;
            let (suffix_str, class_str) = entry_line
                .rsplit_once(' ')
                .ok_or_else(|| EcurveError::Invalid(format!("malformed suffix line: {:?}", entry_line)))?;
            let suffix_raw = pack_digits(suffix_str, builder.alphabet(), SUFFIX_LEN)?;
            let class: i64 = class_str
                .trim()
                .parse()
                .map_err(|_| EcurveError::Invalid(format!("malformed class label: {:?}", class_str)))?;

            builder.insert(Word { prefix: prefix_raw, suffix: suffix_raw }, class);
            seen += 1;
        }
    }

    if seen != expected_count {
        return Err(EcurveError::Invalid(format!(
            "header declared {} suffixes but {} were read",
            expected_count, seen
        )));
    }

    Ok(builder.build())
}
