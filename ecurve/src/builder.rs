//! Builds an [`Ecurve`] from a stream of `(word, class)` insertions.

use std::collections::BTreeMap;

use alphabet::Alphabet;
use word::{PREFIX_LEN, Word};

use crate::{repack, Ecurve, PrefixEntry};

/// Accumulates `(word, class)` pairs and, on [`EcurveBuilder::build`], packs them
/// into the dense prefix/suffix layout [`Ecurve`] expects.
///
/// Insertion order does not matter: entries are sorted by `(prefix, suffix)`
/// before the dense tables are assembled. Inserting the same word twice keeps
/// only the most recent class, matching the "last write wins" convention used
/// by the rest of this workspace's offline builders (compare
/// `sa-builder::build_ssa`, which likewise consumes its input once up front and
/// emits one finished structure).
pub struct EcurveBuilder {
    alphabet: Alphabet,
    entries:  BTreeMap<(u64, u64), i64>
}

impl EcurveBuilder {
    /// Starts an empty builder for the given alphabet.
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet, entries: BTreeMap::new() }
    }

    /// Records that `word` belongs to `class`.
    pub fn insert(&mut self, word: Word, class: i64) {
        let radix = self.alphabet.len() as u64;
        let compact_prefix = repack(word.prefix as u64, PREFIX_LEN, radix);
        self.entries.insert((compact_prefix, word.suffix), class);
    }

    /// The alphabet this builder was created with.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The number of distinct words inserted so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no words have been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assembles the dense `Ecurve`: a `suffixes`/`classes` pair sorted and
    /// grouped by prefix, and a prefix table of `alphabet.len()^PREFIX_LEN + 1`
    /// entries where every unpopulated prefix is marked EDGE with `first`
    /// pointing at the boundary its neighbor lookup should fall back to.
    pub fn build(self) -> Ecurve {
        let radix = self.alphabet.len() as u64;
        let prefix_count = radix.pow(PREFIX_LEN as u32);

        let total = self.entries.len();
        let mut suffixes = Vec::with_capacity(total);
        let mut classes = Vec::with_capacity(total);
        let mut prefix_of = Vec::with_capacity(total);
        let mut prefix_table = Vec::with_capacity(prefix_count as usize + 1);

        let mut iter = self.entries.into_iter().peekable();
        let mut running: u64 = 0;

        for p in 0 ..= prefix_count {
            let boundary = running;
            let mut count: u64 = 0;

            while let Some(&((cp, _), _)) = iter.peek() {
                if cp != p {
                    break;
                }
                let ((cp, suffix), class) = iter.next().unwrap();
                suffixes.push(suffix);
                classes.push(class);
                prefix_of.push(cp);
                count += 1;
            }

            if count > 0 {
                prefix_table.push(PrefixEntry::populated(boundary, count));
                running += count;
            } else {
                prefix_table.push(PrefixEntry::edge(boundary));
            }
        }

        Ecurve { alphabet: self.alphabet, suffixes, classes, prefix_of, prefix_table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Kept tiny on purpose: `repack`'s radix is `alphabet.len()`, not a
    // hardcoded 20, so a 3-letter alphabet exercises the same prefix-table code
    // paths as the real 20-amino one without allocating a multi-million-entry
    // table per test.
    fn alpha() -> Alphabet {
        Alphabet::new("ABC").unwrap()
    }

    #[test]
    fn test_empty_builder() {
        let builder = EcurveBuilder::new(alpha());
        assert!(builder.is_empty());
        let ecurve = builder.build();
        assert_eq!(ecurve.suffix_count(), 0);
    }

    #[test]
    fn test_duplicate_insert_keeps_last_class() {
        let alpha = alpha();
        let w = Word::from_string(&"A".repeat(18), &alpha).unwrap();
        let mut builder = EcurveBuilder::new(alpha.clone());
        builder.insert(w, 1);
        builder.insert(w, 2);
        assert_eq!(builder.len(), 1);
        let ecurve = builder.build();
        let neighbors = ecurve.lookup(w).unwrap();
        assert_eq!(neighbors.lower_class, 2);
    }
}
