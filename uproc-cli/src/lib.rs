//! Command-line front-end wiring `seqio`, `classifier`, `ecurve`, and
//! `idmap` together behind two subcommands: `classify` and `build`.

use std::{
    error::Error,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::Path
};

use alphabet::Alphabet;
use classifier::{classify_dna, classify_protein};
use clap::{Parser, Subcommand, ValueEnum};
use ecurve::{binary, plain, EcurveBuilder, EcurveLike, MmapEcurve};
use idmap::IdMap;
use orf::OrfMode;
use seqio::FastaReader;
use substmat::SubstMat;
use word::Word;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "uproc", about = "Classifies protein and DNA sequences against a precomputed k-mer index")]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command
}

/// The two subcommands this binary exposes.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classifies FASTA records from a query file against a stored ecurve.
    Classify(ClassifyArgs),
    /// Builds a stored ecurve from a plain-text word list.
    Build(BuildArgs)
}

/// Arguments for the `classify` subcommand.
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Path to the forward ecurve (`.txt` plain text, `.mmap` memory-mapped,
    /// anything else binary).
    #[arg(long)]
    pub index:     String,
    /// Path to a second ecurve indexed on reversed words, for extra
    /// sensitivity.
    #[arg(long)]
    pub rev_index: Option<String>,
    /// Path to the flat-row substitution matrix file.
    #[arg(long)]
    pub substmat:  String,
    /// The alphabet string shared by the ecurve(s) and substitution matrix.
    #[arg(long)]
    pub alphabet:  String,
    /// Path to the FASTA file of query sequences.
    #[arg(long)]
    pub fasta:     String,
    /// Treat queries as DNA: extract open reading frames before classifying.
    #[arg(long)]
    pub dna:       bool,
    /// How many reading frames to translate when `--dna` is given (1, 2, 3, or 6).
    #[arg(long, value_parser = parse_orf_mode, default_value = "1")]
    pub orf_mode:  OrfMode,
    /// Optional class-id-to-label tsv file; without it, class ids are printed directly.
    #[arg(long)]
    pub id_map:    Option<String>
}

fn parse_orf_mode(s: &str) -> Result<OrfMode, String> {
    match s {
        "1" => Ok(OrfMode::One),
        "2" => Ok(OrfMode::Two),
        "3" => Ok(OrfMode::Three),
        "6" => Ok(OrfMode::Six),
        other => Err(format!("invalid --orf-mode {:?}: expected one of 1, 2, 3, 6", other))
    }
}

/// Arguments for the `build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Path to a `<k-mer>\t<class>` word-list file, one entry per line.
    #[arg(long)]
    pub words:  String,
    /// The alphabet string the word list's characters belong to.
    #[arg(long)]
    pub alphabet: String,
    /// Where to write the built ecurve.
    #[arg(long)]
    pub output: String,
    /// Storage format to write.
    #[arg(long, value_enum, default_value_t = StorageFormat::Binary)]
    pub format: StorageFormat
}

/// The two on-disk ecurve formats `build` can write (`mmap` is a read path
/// only: nothing builds directly into it).
#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum StorageFormat {
    Plain,
    Binary
}

/// Either an owned [`ecurve::Ecurve`] or a memory-mapped [`MmapEcurve`],
/// unified behind [`EcurveLike`] so the classify loop doesn't care which.
enum EcurveSource {
    Owned(ecurve::Ecurve),
    Mapped(MmapEcurve)
}

impl EcurveSource {
    fn as_ecurve_like(&self) -> &dyn EcurveLike {
        match self {
            EcurveSource::Owned(e) => e,
            EcurveSource::Mapped(e) => e
        }
    }
}

/// Loads an ecurve from `path`, picking the storage format by file
/// extension: `.txt` is plain text, `.mmap` is memory-mapped, anything else
/// is the binary format.
fn load_ecurve(path: &str) -> Result<EcurveSource, Box<dyn Error>> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("txt") => {
            let file = File::open(path)?;
            Ok(EcurveSource::Owned(plain::read_plain(BufReader::new(file))?))
        }
        Some("mmap") => Ok(EcurveSource::Mapped(MmapEcurve::open(path)?)),
        _ => {
            let file = File::open(path)?;
            Ok(EcurveSource::Owned(binary::read_binary(BufReader::new(file))?))
        }
    }
}

fn load_substmat(path: &str, alpha: Alphabet) -> Result<SubstMat, Box<dyn Error>> {
    let content = std::fs::read_to_string(path)?;
    let flat: Vec<f64> =
        content.split_whitespace().map(|tok| tok.parse::<f64>()).collect::<Result<_, _>>()?;
    Ok(SubstMat::from_flat_rows(alpha, &flat)?)
}

fn resolve_label(id_map: &Option<IdMap>, class: i64) -> String {
    match id_map {
        Some(map) if class >= 0 => {
            map.label(class as u32).map(str::to_string).unwrap_or_else(|| class.to_string())
        }
        _ => class.to_string()
    }
}

/// Runs the `classify` subcommand: streams FASTA records through
/// `classify_protein` or `classify_dna` and prints one tsv line per result.
///
/// # Errors
///
/// Returns an error if any input file cannot be opened or parsed.
pub fn run_classify(args: &ClassifyArgs) -> Result<(), Box<dyn Error>> {
    let alpha = Alphabet::new(&args.alphabet)?;

    eprintln!("Loading forward ecurve from {}", args.index);
    let fwd = load_ecurve(&args.index)?;
    let rev = match &args.rev_index {
        Some(path) => {
            eprintln!("Loading reverse ecurve from {}", path);
            Some(load_ecurve(path)?)
        }
        None => None
    };

    eprintln!("Loading substitution matrix from {}", args.substmat);
    let mat = load_substmat(&args.substmat, alpha.clone())?;

    let id_map = match &args.id_map {
        Some(path) => {
            eprintln!("Loading id-map from {}", path);
            Some(IdMap::try_from_tsv_file(path)?)
        }
        None => None
    };

    let fwd_like = fwd.as_ecurve_like();
    let rev_like = rev.as_ref().map(EcurveSource::as_ecurve_like);

    let fasta_file = File::open(&args.fasta)?;
    let mut reader = FastaReader::new(BufReader::new(fasta_file));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut record_count = 0_usize;
    while let Some(record) = reader.next_record()? {
        record_count += 1;
        if args.dna {
            let hits = classify_dna(&record.sequence, args.orf_mode, &alpha, &mat, fwd_like, rev_like, None);
            for hit in hits {
                match hit.result {
                    Some((class, score)) => {
                        writeln!(out, "{}\t{}\t{}\t{}", record.id, hit.frame, resolve_label(&id_map, class), score)?
                    }
                    None => writeln!(out, "{}\t{}\tno_match\t", record.id, hit.frame)?
                }
            }
        } else {
            match classify_protein(&record.sequence, &alpha, &mat, fwd_like, rev_like, None) {
                Some((class, score)) => writeln!(out, "{}\t{}\t{}", record.id, resolve_label(&id_map, class), score)?,
                None => writeln!(out, "{}\tno_match\t", record.id)?
            }
        }
    }

    eprintln!("Classified {} records.", record_count);
    Ok(())
}

/// Runs the `build` subcommand: reads a word-list file, builds an
/// [`EcurveBuilder`], and stores the result in the requested format.
///
/// # Errors
///
/// Returns an error if the word-list file cannot be read, a line is
/// malformed, or the output file cannot be written.
pub fn run_build(args: &BuildArgs) -> Result<(), Box<dyn Error>> {
    let alpha = Alphabet::new(&args.alphabet)?;

    eprintln!("Reading word list from {}", args.words);
    let words_file = File::open(&args.words)?;
    let mut builder = EcurveBuilder::new(alpha.clone());

    for line in BufReader::new(words_file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (word_str, class_str) =
            trimmed.split_once('\t').ok_or("malformed word-list line: missing tab separator")?;
        let word = Word::from_string(word_str, &alpha)?;
        let class: i64 = class_str.trim().parse()?;
        builder.insert(word, class);
    }

    eprintln!("Built ecurve with {} words.", builder.len());
    let ecurve = builder.build();

    let mut output = File::create(&args.output)?;
    match args.format {
        StorageFormat::Plain => plain::write_plain(&ecurve, &mut output)?,
        StorageFormat::Binary => binary::write_binary(&ecurve, &mut output)?
    }

    eprintln!("Wrote ecurve to {}", args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_parse_orf_mode_accepts_valid_values() {
        assert_eq!(parse_orf_mode("1"), Ok(OrfMode::One));
        assert_eq!(parse_orf_mode("6"), Ok(OrfMode::Six));
        assert!(parse_orf_mode("4").is_err());
    }

    #[test]
    fn test_build_then_classify_roundtrip() {
        let dir = tempdir::TempDir::new("uproc-cli-test").unwrap();
        let alpha = "ACDEFGHIKLMNPQRSTVWY";
        let word = "ACDEFGHIKLMNPQRSTVWY";
        assert_eq!(word.len(), word::WORD_LEN);

        let words_path = dir.path().join("words.tsv");
        let mut words_file = File::create(&words_path).unwrap();
        writeln!(words_file, "{}\t3", word).unwrap();
        drop(words_file);

        let output_path = dir.path().join("out.ecurve");
        run_build(&BuildArgs {
            words:    words_path.to_str().unwrap().to_string(),
            alphabet: alpha.to_string(),
            output:   output_path.to_str().unwrap().to_string(),
            format:   StorageFormat::Binary
        })
        .unwrap();

        let loaded = load_ecurve(output_path.to_str().unwrap()).unwrap();
        let neighbors = loaded.as_ecurve_like().lookup(Word::from_string(word, &Alphabet::new(alpha).unwrap()).unwrap());
        assert!(neighbors.is_ok());
    }

    #[test]
    fn test_resolve_label_falls_back_to_class_id() {
        assert_eq!(resolve_label(&None, 5), "5");
    }
}
