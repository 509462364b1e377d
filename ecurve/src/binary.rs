//! The binary ecurve format: a host-endian, host-size-dependent dump of the
//! in-memory layout (minus the mmap format's page alignment), meant for fast
//! load of a production-size index. See the module docs on `mmap` for the
//! zero-copy counterpart of this same layout.

use std::io::{Read, Write};

use alphabet::Alphabet;
use word::PREFIX_LEN;

use crate::{Ecurve, EcurveError, PrefixEntry};

/// Writes `ecurve` in the binary format: one length byte `N`, `N` alphabet
/// bytes, a native-endian suffix count, the suffix values, the class values,
/// then `N^PREFIX_LEN + 1` `(first, count)` prefix-table entries.
///
/// # Errors
///
/// Returns [`EcurveError::Io`] if `w` fails.
pub fn write_binary(ecurve: &Ecurve, w: &mut impl Write) -> Result<(), EcurveError> {
    let alpha_bytes = ecurve.alphabet.as_str().as_bytes();
    w.write_all(&[alpha_bytes.len() as u8])?;
    w.write_all(alpha_bytes)?;

    let c = ecurve.suffixes.len() as u64;
    w.write_all(&c.to_ne_bytes())?;

    for &suffix in &ecurve.suffixes {
        w.write_all(&suffix.to_ne_bytes())?;
    }
    for &class in &ecurve.classes {
        w.write_all(&class.to_ne_bytes())?;
    }
    for entry in &ecurve.prefix_table {
        w.write_all(&entry.first.to_ne_bytes())?;
        w.write_all(&entry.count.to_ne_bytes())?;
    }

    Ok(())
}

/// Reads an [`Ecurve`] from its binary representation.
///
/// # Errors
///
/// Returns [`EcurveError::Invalid`] if the alphabet bytes do not form a valid
/// [`Alphabet`], or [`EcurveError::Io`] on a truncated stream.
pub fn read_binary(mut r: impl Read) -> Result<Ecurve, EcurveError> {
    let mut len_byte = [0_u8; 1];
    r.read_exact(&mut len_byte)?;
    let mut alpha_bytes = vec![0_u8; len_byte[0] as usize];
    r.read_exact(&mut alpha_bytes)?;
    let alpha_str = std::str::from_utf8(&alpha_bytes).map_err(|e| EcurveError::Invalid(e.to_string()))?;
    let alphabet = Alphabet::new(alpha_str).map_err(|e| EcurveError::Invalid(e.to_string()))?;

    let mut buf8 = [0_u8; 8];
    r.read_exact(&mut buf8)?;
    let c = u64::from_ne_bytes(buf8) as usize;

    let mut suffixes = Vec::with_capacity(c);
    for _ in 0 .. c {
        r.read_exact(&mut buf8)?;
        suffixes.push(u64::from_ne_bytes(buf8));
    }

    let mut classes = Vec::with_capacity(c);
    for _ in 0 .. c {
        r.read_exact(&mut buf8)?;
        classes.push(i64::from_ne_bytes(buf8));
    }

    let radix = alphabet.len() as u64;
    let prefix_count = radix.pow(PREFIX_LEN as u32) as usize + 1;
    let mut prefix_table = Vec::with_capacity(prefix_count);
    let mut prefix_of = Vec::with_capacity(c);

    for p in 0 .. prefix_count {
        let mut first_buf = [0_u8; 8];
        r.read_exact(&mut first_buf)?;
        let first = u64::from_ne_bytes(first_buf);
        r.read_exact(&mut buf8)?;
        let count = u64::from_ne_bytes(buf8);

        let entry = PrefixEntry { first, count };
        if !entry.is_edge() {
            for _ in 0 .. entry.count {
                prefix_of.push(p as u64);
            }
        }
        prefix_table.push(entry);
    }

    Ok(Ecurve { alphabet, suffixes, classes, prefix_of, prefix_table })
}

#[cfg(test)]
mod tests {
    use alphabet::Alphabet;
    use word::Word;

    use super::*;
    use crate::builder::EcurveBuilder;

    // Kept tiny on purpose: `compact_prefix`'s radix is `alphabet.len()`, not a
    // hardcoded 20, so a 3-letter alphabet exercises the same prefix-table code
    // paths as the real 20-amino one without allocating a multi-million-entry
    // table per test.
    fn alpha() -> Alphabet {
        Alphabet::new("ABC").unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let alpha = alpha();
        let mut builder = EcurveBuilder::new(alpha.clone());
        let lo = Word::from_string(&("A".repeat(6) + &"A".repeat(12)), &alpha).unwrap();
        let hi = Word::from_string(&("C".repeat(6) + &"A".repeat(12)), &alpha).unwrap();
        builder.insert(lo, 1);
        builder.insert(hi, 2);
        let ecurve = builder.build();

        let mut buf = Vec::new();
        write_binary(&ecurve, &mut buf).unwrap();
        let loaded = read_binary(buf.as_slice()).unwrap();

        assert_eq!(loaded.suffix_count(), 2);
        assert_eq!(loaded.lookup(lo).unwrap().lower_class, 1);
        assert_eq!(loaded.lookup(hi).unwrap().lower_class, 2);
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        // Declares a 20-byte alphabet but supplies only 3 more bytes: the
        // alphabet read itself runs out of stream.
        let err = read_binary(&[20_u8, 0, 0, 0][..]).unwrap_err();
        assert!(matches!(err, EcurveError::Io(_)));
    }
}
