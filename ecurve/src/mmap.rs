//! Zero-copy (beyond the OS page cache) reader for the binary ecurve layout.
//!
//! The file format is exactly `binary`'s; what differs here is that the
//! suffixes, classes, and prefix table are read directly out of the mapped
//! pages on every access rather than copied into owned `Vec`s up front, which
//! is the whole point for a multi-GB production index. The mapping must
//! outlive every [`MmapEcurve`] built from it; this struct holds it for you.

use std::{fs::File, path::Path};

use alphabet::Alphabet;
use memmap2::Mmap;
use word::{PREFIX_LEN, Word};

use crate::{repack, unrepack_prefix, EcurveError, EcurveLike, Neighbors, PrefixEntry};

/// A read-only ecurve backed by a memory-mapped file.
///
/// Not portable across architectures or pointer widths: like `binary`, this is
/// a host-native format.
pub struct MmapEcurve {
    mmap:                Mmap,
    alphabet:             Alphabet,
    suffix_count:         usize,
    suffixes_offset:      usize,
    classes_offset:       usize,
    prefix_table_offset:  usize
}

impl MmapEcurve {
    /// Maps `path` read-only and parses its header.
    ///
    /// # Errors
    ///
    /// Returns [`EcurveError::Io`] if the file cannot be opened or mapped, or
    /// [`EcurveError::Invalid`] if its alphabet bytes do not form a valid
    /// [`Alphabet`] or the file is too short for its declared suffix count.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EcurveError> {
        let file = File::open(path)?;
        // SAFETY: the caller must not truncate or rewrite the backing file
        // while this mapping (or any `MmapEcurve` built from it) is alive; this
        // is the same precondition spec.md's concurrency model already places
        // on any memory-mapped ecurve.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.is_empty() {
            return Err(EcurveError::Invalid("file too short for an ecurve header".to_string()));
        }
        let alphabet_len = mmap[0] as usize;

        if mmap.len() < 1 + alphabet_len + 8 {
            return Err(EcurveError::Invalid("file too short for an ecurve header".to_string()));
        }

        let alpha_str = std::str::from_utf8(&mmap[1 .. 1 + alphabet_len])
            .map_err(|e| EcurveError::Invalid(e.to_string()))?;
        let alphabet = Alphabet::new(alpha_str).map_err(|e| EcurveError::Invalid(e.to_string()))?;

        let mut offset = 1 + alphabet_len;
        let suffix_count = u64::from_ne_bytes(mmap[offset .. offset + 8].try_into().unwrap()) as usize;
        offset += 8;

        let suffixes_offset = offset;
        offset += suffix_count * 8;
        let classes_offset = offset;
        offset += suffix_count * 8;
        let prefix_table_offset = offset;

        let radix = alphabet.len() as u64;
        let prefix_count = radix.pow(PREFIX_LEN as u32) as usize + 1;
        let expected_len = prefix_table_offset + prefix_count * 16;
        if mmap.len() < expected_len {
            return Err(EcurveError::Invalid(format!(
                "file too short: expected at least {} bytes, got {}",
                expected_len,
                mmap.len()
            )));
        }

        Ok(Self { mmap, alphabet, suffix_count, suffixes_offset, classes_offset, prefix_table_offset })
    }

    fn suffix_at(&self, i: usize) -> u64 {
        let o = self.suffixes_offset + i * 8;
        u64::from_ne_bytes(self.mmap[o .. o + 8].try_into().unwrap())
    }

    fn class_at(&self, i: usize) -> i64 {
        let o = self.classes_offset + i * 8;
        i64::from_ne_bytes(self.mmap[o .. o + 8].try_into().unwrap())
    }

    fn prefix_entry(&self, p: usize) -> PrefixEntry {
        let o = self.prefix_table_offset + p * 16;
        let first = u64::from_ne_bytes(self.mmap[o .. o + 8].try_into().unwrap());
        let count = u64::from_ne_bytes(self.mmap[o + 8 .. o + 16].try_into().unwrap());
        PrefixEntry { first, count }
    }

    fn word_at(&self, idx: u64, radix: u64, prefix_of: u64) -> Word {
        Word { prefix: unrepack_prefix(prefix_of, radix), suffix: self.suffix_at(idx as usize) }
    }

    /// The alphabet shared by this ecurve and any substitution matrix used
    /// against it.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The number of indexed (suffix, class) pairs, `C`.
    pub fn suffix_count(&self) -> usize {
        self.suffix_count
    }

    /// See [`crate::Ecurve::lookup`]; identical semantics, served from the
    /// mapped pages instead of owned vectors.
    pub fn lookup(&self, w: Word) -> Result<Neighbors, EcurveError> {
        let c = self.suffix_count as u64;
        if c == 0 {
            return Err(EcurveError::Empty);
        }

        let radix = self.alphabet.len() as u64;
        let p = repack(w.prefix as u64, PREFIX_LEN, radix);
        let entry = self.prefix_entry(p as usize);
        let first = entry.first;
        let count = if entry.is_edge() { 0 } else { entry.count };

        if count > 0 {
            let mut lo_idx = first as usize;
            let mut hi_idx = (first + count) as usize;
            while lo_idx < hi_idx {
                let mid = lo_idx + (hi_idx - lo_idx) / 2;
                if self.suffix_at(mid) < w.suffix {
                    lo_idx = mid + 1;
                } else {
                    hi_idx = mid;
                }
            }
            if lo_idx < (first + count) as usize && self.suffix_at(lo_idx) == w.suffix {
                let word = Word { prefix: w.prefix, suffix: w.suffix };
                let class = self.class_at(lo_idx);
                return Ok(Neighbors { lower_word: word, lower_class: class, upper_word: word, upper_class: class });
            }

            let boundary = lo_idx as u64;
            let lo = self.neighbor_at(boundary.saturating_sub(1).min(c - 1), radix);
            let hi = self.neighbor_at(boundary.min(c - 1), radix);
            return Ok(Neighbors { lower_word: lo.0, lower_class: lo.1, upper_word: hi.0, upper_class: hi.1 });
        }

        let lo = self.neighbor_at(first.saturating_sub(1).min(c.saturating_sub(1)), radix);
        let hi = self.neighbor_at(first.min(c - 1), radix);
        Ok(Neighbors { lower_word: lo.0, lower_class: lo.1, upper_word: hi.0, upper_class: hi.1 })
    }

    /// Resolves the word/class pair at suffix-array index `idx`, reconstructing
    /// its prefix with [`Self::prefix_containing`].
    fn neighbor_at(&self, idx: u64, radix: u64) -> (Word, i64) {
        let owning_prefix = self.prefix_containing(idx);
        (self.word_at(idx, radix, owning_prefix), self.class_at(idx as usize))
    }

    /// Finds the prefix whose bucket owns suffix-array index `idx`.
    ///
    /// `PrefixEntry::first` is the running count of suffixes strictly below a
    /// prefix, so across the whole table it is monotonically non-decreasing in
    /// `p`; the populated prefix owning `idx` is the unique entry whose `first`
    /// is the *rightmost* one `<= idx` (every EDGE entry shares its `first`
    /// with either the populated bucket it immediately follows or precedes,
    /// never with a value strictly between two populated buckets). Binary
    /// searching that invariant makes this O(log(N^P)) even when `idx` sits at
    /// the end of a long run of EDGE prefixes, unlike a linear walk seeded
    /// from a query's own prefix.
    fn prefix_containing(&self, idx: u64) -> u64 {
        let prefix_count = radix_pow(self.alphabet.len() as u64, PREFIX_LEN);
        let mut lo = 0_u64;
        let mut hi = prefix_count;

        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if self.prefix_entry(mid as usize).first <= idx {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        lo
    }
}

fn radix_pow(radix: u64, exp: usize) -> u64 {
    radix.pow(exp as u32)
}

impl EcurveLike for MmapEcurve {
    fn alphabet(&self) -> &Alphabet {
        MmapEcurve::alphabet(self)
    }

    fn lookup(&self, w: Word) -> Result<Neighbors, EcurveError> {
        MmapEcurve::lookup(self, w)
    }
}

#[cfg(test)]
mod tests {
    use word::Word;

    use super::*;
    use crate::{binary::write_binary, builder::EcurveBuilder};

    // Kept tiny on purpose: `compact_prefix`'s radix is `alphabet.len()`, not a
    // hardcoded 20, so a 3-letter alphabet exercises the same prefix-table code
    // paths as the real 20-amino one without allocating a multi-million-entry
    // table per test.
    fn alpha() -> Alphabet {
        Alphabet::new("ABC").unwrap()
    }

    #[test]
    fn test_mmap_matches_owned_lookup() {
        let alpha = alpha();
        let mut builder = EcurveBuilder::new(alpha.clone());
        let lo = Word::from_string(&("A".repeat(6) + &"A".repeat(12)), &alpha).unwrap();
        let hi = Word::from_string(&("C".repeat(6) + &"A".repeat(12)), &alpha).unwrap();
        let mid = Word::from_string(&("B".repeat(6) + &"A".repeat(12)), &alpha).unwrap();
        builder.insert(lo, 1);
        builder.insert(hi, 2);
        let owned = builder.build();

        let dir = tempdir::TempDir::new("ecurve-mmap-test").unwrap();
        let path = dir.path().join("test.ecurve");
        let mut file = std::fs::File::create(&path).unwrap();
        write_binary(&owned, &mut file).unwrap();
        drop(file);

        let mapped = MmapEcurve::open(&path).unwrap();
        assert_eq!(mapped.suffix_count(), owned.suffix_count());

        for query in [lo, hi, mid] {
            let owned_neighbors = owned.lookup(query).unwrap();
            let mapped_neighbors = mapped.lookup(query).unwrap();
            assert_eq!(owned_neighbors.lower_word, mapped_neighbors.lower_word);
            assert_eq!(owned_neighbors.lower_class, mapped_neighbors.lower_class);
            assert_eq!(owned_neighbors.upper_word, mapped_neighbors.upper_word);
            assert_eq!(owned_neighbors.upper_class, mapped_neighbors.upper_class);
        }
    }
}
