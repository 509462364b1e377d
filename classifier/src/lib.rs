//! Orchestrates the core search-and-score pipeline: scans a query for words,
//! looks each up in one or two ecurves, scores the neighbors found, and folds
//! the result into a per-class [`ScoreAggregator`].

use alphabet::Alphabet;
use ecurve::{EcurveLike, ScoreAggregator};
use orf::{extract_orfs, OrfMode};
use rayon::prelude::*;
use substmat::{align_suffixes, SubstMat};
use word::{Word, WordIterator};

/// Looks `word` up in `ecurve` and folds the alignment score of every
/// distinct neighbor it returns into `aggregator` at query position `index`.
fn score_neighbors(ecurve: &dyn EcurveLike, word: Word, index: usize, mat: &SubstMat, aggregator: &mut ScoreAggregator) {
    let neighbors = match ecurve.lookup(word) {
        Ok(neighbors) => neighbors,
        Err(_) => return
    };

    let lower_dist = align_suffixes(word.suffix, neighbors.lower_word.suffix, mat);
    aggregator.add(neighbors.lower_class, index, lower_dist);

    if neighbors.upper_word != neighbors.lower_word {
        let upper_dist = align_suffixes(word.suffix, neighbors.upper_word.suffix, mat);
        aggregator.add(neighbors.upper_class, index, upper_dist);
    }
}

/// Classifies one protein query against a forward ecurve and, optionally, a
/// second ecurve built over the same words read back to front (`rev_word`
/// from [`WordIterator`]; not a biological reverse complement).
///
/// Returns the highest-scoring class and its score, or `None` if the query
/// contains no complete word, no word matched anything, or `prot_filter`
/// rejects the winning score.
///
/// # Arguments
///
/// * `seq` - The protein sequence to classify.
/// * `alpha` - The alphabet shared by `seq`, both ecurves, and `mat`.
/// * `mat` - The substitution matrix used to score word alignments.
/// * `fwd_ecurve` - The primary (forward) ecurve.
/// * `rev_ecurve` - An optional secondary ecurve indexed on reversed words,
///   for extra sensitivity.
/// * `prot_filter` - An optional acceptance predicate over the winning score;
///   `None` accepts every result, matching the default behavior described in
///   the project's design notes.
pub fn classify_protein(
    seq: &[u8],
    alpha: &Alphabet,
    mat: &SubstMat,
    fwd_ecurve: &dyn EcurveLike,
    rev_ecurve: Option<&dyn EcurveLike>,
    prot_filter: Option<&dyn Fn(f64) -> bool>
) -> Option<(i64, f64)> {
    let mut aggregator = ScoreAggregator::new();

    for (index, fwd_word, rev_word) in WordIterator::new(seq, alpha) {
        score_neighbors(fwd_ecurve, fwd_word, index, mat, &mut aggregator);
        if let Some(rev_ecurve) = rev_ecurve {
            score_neighbors(rev_ecurve, rev_word, index, mat, &mut aggregator);
        }
    }

    let result = aggregator.finalize()?;
    match prot_filter {
        Some(filter) if !filter(result.1) => None,
        _ => Some(result)
    }
}

/// One reading frame's classification outcome from [`classify_dna`].
#[derive(Debug, Clone, PartialEq)]
pub struct DnaHit {
    /// Which of the translated reading frames (`0..mode.frame_count()`) this
    /// result came from.
    pub frame:  usize,
    /// `None` if the frame produced no open reading frame at all; otherwise
    /// the classification of one ORF stretch within that frame (itself
    /// `None` if that stretch matched nothing).
    pub result: Option<(i64, f64)>
}

/// Extracts open reading frames from `seq` with [`orf::extract_orfs`] and
/// classifies each translated stretch with [`classify_protein`].
///
/// A frame that produced no ORF at all is reported as one [`DnaHit`] with
/// `result: None`, keeping "no candidate protein" distinguishable from "a
/// candidate was found but matched nothing". A frame with `n` stop-delimited
/// stretches produces `n` [`DnaHit`]s, one per stretch.
pub fn classify_dna(
    seq: &[u8],
    mode: OrfMode,
    alpha: &Alphabet,
    mat: &SubstMat,
    fwd_ecurve: &dyn EcurveLike,
    rev_ecurve: Option<&dyn EcurveLike>,
    prot_filter: Option<&dyn Fn(f64) -> bool>
) -> Vec<DnaHit> {
    let orfs = extract_orfs(seq, mode);

    (0 .. mode.frame_count())
        .flat_map(|frame| {
            let frame_orfs: Vec<_> = orfs.iter().filter(|orf| orf.frame == frame).collect();
            if frame_orfs.is_empty() {
                return vec![DnaHit { frame, result: None }];
            }
            frame_orfs
                .into_iter()
                .map(|orf| DnaHit {
                    frame,
                    result: classify_protein(orf.sequence.as_bytes(), alpha, mat, fwd_ecurve, rev_ecurve, prot_filter)
                })
                .collect()
        })
        .collect()
}

/// Classifies a batch of independent protein queries in parallel, mirroring
/// how a peptide search fans out across a read-only index with `rayon`.
///
/// Result `i` corresponds to `seqs[i]`; no other ordering is guaranteed.
pub fn classify_all(
    seqs: &[Vec<u8>],
    alpha: &Alphabet,
    mat: &SubstMat,
    fwd_ecurve: &(dyn EcurveLike + Sync),
    rev_ecurve: Option<&(dyn EcurveLike + Sync)>,
    prot_filter: Option<&(dyn Fn(f64) -> bool + Sync)>
) -> Vec<Option<(i64, f64)>> {
    seqs.par_iter()
        .map(|seq| classify_protein(seq, alpha, mat, fwd_ecurve, rev_ecurve, prot_filter))
        .collect()
}
