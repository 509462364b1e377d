//! Open-reading-frame extraction: translates a DNA sequence in up to six
//! reading frames and splits each at stop codons into candidate proteins.

mod codon_table;

use codon_table::{translate_codon, STOP};

/// How many of the six reading frames (3 forward, 3 reverse complement) to
/// translate, in the fixed order `[fwd0, fwd1, fwd2, rev0, rev1, rev2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrfMode {
    /// Forward frame 0 only.
    One,
    /// Forward frames 0 and 1.
    Two,
    /// All three forward frames.
    Three,
    /// All three forward frames and all three reverse-complement frames.
    Six
}

impl OrfMode {
    /// Number of frames this mode translates.
    pub fn frame_count(self) -> usize {
        match self {
            OrfMode::One => 1,
            OrfMode::Two => 2,
            OrfMode::Three => 3,
            OrfMode::Six => 6
        }
    }
}

/// One stop-codon-delimited candidate protein translated from a DNA frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orf {
    /// Which of the six reading frames this came from (`0..6`,
    /// `0..3` forward, `3..6` reverse complement).
    pub frame:    usize,
    /// The translated amino-acid string, with no stop codon in it.
    pub sequence: String,
    /// 0-based offset, in the frame's own strand, of this stretch's first codon.
    pub start:    usize
}

fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b.to_ascii_uppercase() {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            other => other
        })
        .collect()
}

/// Translates `strand` starting at codon offset `offset` (in codons, i.e. the
/// frame's shift within the first codon) into amino-acid-and-stop bytes, one
/// per complete codon.
fn translate_frame(strand: &[u8], offset: usize) -> Vec<u8> {
    if offset >= strand.len() {
        return Vec::new();
    }
    strand[offset ..]
        .chunks_exact(3)
        .map(|chunk| {
            let codon = [
                chunk[0].to_ascii_uppercase(),
                chunk[1].to_ascii_uppercase(),
                chunk[2].to_ascii_uppercase()
            ];
            translate_codon(codon)
        })
        .collect()
}

/// Splits a translated frame at every [`STOP`] byte into non-empty stretches,
/// each tagged with its starting codon index within the frame.
fn split_on_stops(translated: &[u8]) -> Vec<(usize, &[u8])> {
    let mut stretches = Vec::new();
    let mut start = 0;
    for (i, &amino) in translated.iter().enumerate() {
        if amino == STOP {
            if i > start {
                stretches.push((start, &translated[start .. i]));
            }
            start = i + 1;
        }
    }
    if start < translated.len() {
        stretches.push((start, &translated[start ..]));
    }
    stretches
}

/// Translates `seq` in up to `mode.frame_count()` reading frames and splits
/// each at stop codons into candidate proteins.
///
/// Any byte outside `A`/`C`/`G`/`T` (case-insensitive) translates to an
/// unknown amino acid rather than aborting the frame; it behaves like any
/// other non-stop amino for the purposes of stretch-splitting.
pub fn extract_orfs(seq: &[u8], mode: OrfMode) -> Vec<Orf> {
    let rev = reverse_complement(seq);
    let strands: [(&[u8], usize); 6] =
        [(seq, 0), (seq, 1), (seq, 2), (rev.as_slice(), 0), (rev.as_slice(), 1), (rev.as_slice(), 2)];

    let mut orfs = Vec::new();
    for (frame, (strand, shift)) in strands.into_iter().take(mode.frame_count()).enumerate() {
        let translated = translate_frame(strand, shift);
        for (codon_start, stretch) in split_on_stops(&translated) {
            orfs.push(Orf {
                frame,
                sequence: String::from_utf8(stretch.to_vec()).expect("translated aminos are always ASCII"),
                start: codon_start * 3 + shift
            });
        }
    }
    orfs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_stop_codon_yields_one_orf_per_frame() {
        // 6 codons, no stops, exactly divisible by 3.
        let seq = b"ATGAAACCCGGGTTTGGG";
        let orfs = extract_orfs(seq, OrfMode::One);
        assert_eq!(orfs.len(), 1);
        assert_eq!(orfs[0].frame, 0);
        assert_eq!(orfs[0].start, 0);
        assert_eq!(orfs[0].sequence, "MKPGFG");
    }

    #[test]
    fn test_internal_stop_splits_into_two_stretches() {
        let seq = b"ATGAAATAAGGGTTT"; // M K * G F
        let orfs = extract_orfs(seq, OrfMode::One);
        assert_eq!(orfs.len(), 2);
        assert_eq!(orfs[0].sequence, "MK");
        assert_eq!(orfs[0].start, 0);
        assert_eq!(orfs[1].sequence, "GF");
        assert_eq!(orfs[1].start, 9); // codon index 3 * 3 + shift(0)
    }

    #[test]
    fn test_shorter_than_one_codon_yields_nothing() {
        let seq = b"AT";
        let orfs = extract_orfs(seq, OrfMode::Six);
        assert!(orfs.is_empty());
    }

    #[test]
    fn test_mode_frame_counts() {
        assert_eq!(OrfMode::One.frame_count(), 1);
        assert_eq!(OrfMode::Two.frame_count(), 2);
        assert_eq!(OrfMode::Three.frame_count(), 3);
        assert_eq!(OrfMode::Six.frame_count(), 6);
    }

    #[test]
    fn test_six_mode_includes_reverse_frames() {
        let seq = b"ATGAAACCCGGGTTTGGG";
        let orfs = extract_orfs(seq, OrfMode::Six);
        let frames: std::collections::HashSet<_> = orfs.iter().map(|o| o.frame).collect();
        assert!(frames.contains(&0));
        assert!(frames.iter().any(|&f| f >= 3));
    }

    #[test]
    fn test_reverse_complement_translation() {
        // CAT reverse-complemented is ATG (Met); put it at the end of a
        // forward-frame-0 sequence so frame-0 reverse complement starts
        // on it.
        let seq = b"CAT";
        let rev = reverse_complement(seq);
        assert_eq!(rev, b"ATG");
    }

    #[test]
    fn test_lowercase_bases_translate_like_uppercase() {
        let upper = extract_orfs(b"ATGAAACCC", OrfMode::One);
        let lower = extract_orfs(b"atgaaaccc", OrfMode::One);
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_ambiguous_base_is_unknown_amino_not_a_stop() {
        let orfs = extract_orfs(b"ATGNNNCCC", OrfMode::One);
        assert_eq!(orfs.len(), 1);
        assert_eq!(orfs[0].sequence, "MXP");
    }
}
