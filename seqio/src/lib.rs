//! A small FASTA reader/writer: pulls one [`ProteinRecord`] at a time from any
//! `BufRead`, mirroring a one-record-at-a-time, non-allocating-ahead pull
//! model rather than eagerly parsing the whole file into memory.

use std::{
    error::Error,
    fmt,
    io::{BufRead, Lines, Write}
};

/// One FASTA entry: its id, optional comment, and raw sequence bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinRecord {
    /// The header line's content after the leading `>`.
    pub id:       String,
    /// The comment block, if any, with its per-line leading `;` stripped and
    /// its lines newline-joined.
    pub comment:  Option<String>,
    /// The sequence lines, concatenated with no separator.
    pub sequence: Vec<u8>
}

/// Errors reported by [`FastaReader`].
#[derive(Debug)]
pub enum FastaError {
    /// A line expected to be a FASTA header (`>...`) was not.
    Invalid(String),
    /// An I/O error from the underlying reader.
    Io(std::io::Error)
}

impl fmt::Display for FastaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FastaError::Invalid(msg) => write!(f, "invalid FASTA record: {}", msg),
            FastaError::Io(e) => write!(f, "FASTA I/O error: {}", e)
        }
    }
}

impl Error for FastaError {}

impl From<std::io::Error> for FastaError {
    fn from(e: std::io::Error) -> Self {
        FastaError::Io(e)
    }
}

/// Pulls [`ProteinRecord`]s one at a time from a `BufRead`.
///
/// Grammar: a record is a header line starting with `>`, followed by zero or
/// more comment lines starting with `;`, followed by zero or more sequence
/// lines, up to the next header line or end of input. A comment block ends
/// as soon as a non-`;` line is seen; that line (even if it starts with `;`
/// again later) is sequence from then on, matching `libecurve`'s reader.
pub struct FastaReader<R: BufRead> {
    lines:          Lines<R>,
    pending_header: Option<String>
}

impl<R: BufRead> FastaReader<R> {
    /// Wraps `r` in a new reader.
    pub fn new(r: R) -> Self {
        Self { lines: r.lines(), pending_header: None }
    }

    /// Reads the next record, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`FastaError::Invalid`] if the next non-consumed line is not a
    /// header line, or [`FastaError::Io`] on a read failure.
    pub fn next_record(&mut self) -> Result<Option<ProteinRecord>, FastaError> {
        let header_line = match self.pending_header.take() {
            Some(line) => line,
            None => match self.lines.next() {
                None => return Ok(None),
                Some(line) => line?
            }
        };

        let id = header_line
            .strip_prefix('>')
            .ok_or_else(|| FastaError::Invalid(format!("expected a header line, got {:?}", header_line)))?
            .to_string();

        let mut comment_lines = Vec::new();
        let mut seq_lines = Vec::new();
        let mut reading_comments = true;

        loop {
            let line = match self.lines.next() {
                None => break,
                Some(line) => line?
            };

            if line.starts_with('>') {
                self.pending_header = Some(line);
                break;
            }

            if reading_comments && line.starts_with(';') {
                comment_lines.push(line[1 ..].to_string());
                continue;
            }

            reading_comments = false;
            seq_lines.push(line);
        }

        let comment = if comment_lines.is_empty() { None } else { Some(comment_lines.join("\n")) };
        let sequence = seq_lines.concat().into_bytes();

        Ok(Some(ProteinRecord { id, comment, sequence }))
    }
}

/// Writes one FASTA record: a header line, then the comment block (one `;`
/// line per `\n`-separated line of `comment`, if any), then `seq` wrapped at
/// `width` columns (`None` writes it as a single line).
pub fn write_record(
    w: &mut impl Write,
    id: &str,
    comment: Option<&str>,
    seq: &[u8],
    width: Option<usize>
) -> std::io::Result<()> {
    writeln!(w, ">{}", id)?;

    if let Some(comment) = comment {
        for line in comment.split('\n') {
            writeln!(w, ";{}", line)?;
        }
    }

    match width {
        Some(width) if width > 0 => {
            for chunk in seq.chunks(width) {
                w.write_all(chunk)?;
                writeln!(w)?;
            }
        }
        _ => {
            w.write_all(seq)?;
            writeln!(w)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_records() {
        let mut reader = FastaReader::new("".as_bytes());
        assert_eq!(reader.next_record().unwrap(), None);
    }

    #[test]
    fn test_header_without_leading_gt_is_invalid() {
        let mut reader = FastaReader::new("not a header\n".as_bytes());
        assert!(matches!(reader.next_record(), Err(FastaError::Invalid(_))));
    }

    #[test]
    fn test_single_record_with_comment() {
        let input = ">seq1 description\n;a comment\n;second line\nACDEFG\nHIKLMN\n";
        let mut reader = FastaReader::new(input.as_bytes());
        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record.id, "seq1 description");
        assert_eq!(record.comment.as_deref(), Some("a comment\nsecond line"));
        assert_eq!(record.sequence, b"ACDEFGHIKLMN");
        assert_eq!(reader.next_record().unwrap(), None);
    }

    #[test]
    fn test_two_records_back_to_back() {
        let input = ">one\nACD\n>two\nEFG\n";
        let mut reader = FastaReader::new(input.as_bytes());
        let first = reader.next_record().unwrap().unwrap();
        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(first.id, "one");
        assert_eq!(first.sequence, b"ACD");
        assert_eq!(second.id, "two");
        assert_eq!(second.sequence, b"EFG");
        assert_eq!(reader.next_record().unwrap(), None);
    }

    #[test]
    fn test_header_with_no_body_yields_empty_record() {
        let input = ">empty\n>next\nACD\n";
        let mut reader = FastaReader::new(input.as_bytes());
        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.comment, None);
        assert!(first.sequence.is_empty());
        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.id, "next");
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut buf = Vec::new();
        write_record(&mut buf, "myseq", Some("line one\nline two"), b"ACDEFGHIKLMN", Some(5)).unwrap();

        let mut reader = FastaReader::new(buf.as_slice());
        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record.id, "myseq");
        assert_eq!(record.comment.as_deref(), Some("line one\nline two"));
        assert_eq!(record.sequence, b"ACDEFGHIKLMN");
    }

    #[test]
    fn test_write_record_no_width_is_single_line() {
        let mut buf = Vec::new();
        write_record(&mut buf, "s", None, b"ACDEFG", None).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), ">s\nACDEFG\n");
    }
}
