//! A flat class-id ↔ string-label lookup table, loaded from a two-column tsv
//! file.

use std::{
    collections::HashMap,
    error::Error,
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path
};

/// Error returned when a tsv line cannot be parsed as `class_id\tlabel`.
#[derive(Debug, PartialEq, Eq)]
pub enum IdMapError {
    /// A line is missing its tab separator or has a non-numeric class id.
    Invalid(String)
}

impl fmt::Display for IdMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdMapError::Invalid(msg) => write!(f, "invalid id-map line: {}", msg)
        }
    }
}

impl Error for IdMapError {}

/// A read-only class id ↔ label table.
///
/// Classes are expected to be assigned densely from 0, matching how an
/// ecurve's `classes` column is populated at build time; a class id with no
/// corresponding tsv line has no label (`label` returns `None` for it) rather
/// than being an error.
pub struct IdMap {
    class_to_label: Vec<String>,
    label_to_class: HashMap<String, u32>
}

impl IdMap {
    /// Loads an [`IdMap`] from a `class_id\tlabel` tsv file.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// Returns an [`IdMapError::Invalid`] (boxed) for a malformed line, or
    /// the underlying I/O error if `path` cannot be read.
    pub fn try_from_tsv_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let file = File::open(path)?;
        Self::try_from_reader(BufReader::new(file))
    }

    fn try_from_reader(r: impl BufRead) -> Result<Self, Box<dyn Error>> {
        let mut pairs = Vec::new();

        for line in r.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (id_str, label) = trimmed
                .split_once('\t')
                .ok_or_else(|| IdMapError::Invalid(format!("missing tab separator: {:?}", line)))?;
            let class: u32 = id_str
                .trim()
                .parse()
                .map_err(|_| IdMapError::Invalid(format!("invalid class id: {:?}", id_str)))?;

            pairs.push((class, label.to_string()));
        }

        let size = pairs.iter().map(|&(class, _)| class as usize + 1).max().unwrap_or(0);
        let mut class_to_label = vec![String::new(); size];
        let mut label_to_class = HashMap::with_capacity(pairs.len());

        for (class, label) in pairs {
            class_to_label[class as usize] = label.clone();
            label_to_class.insert(label, class);
        }

        Ok(Self { class_to_label, label_to_class })
    }

    /// The label for `class`, or `None` if it has none.
    pub fn label(&self, class: u32) -> Option<&str> {
        self.class_to_label.get(class as usize).map(String::as_str).filter(|s| !s.is_empty())
    }

    /// The class id for `label`, or `None` if it is unknown.
    pub fn class(&self, label: &str) -> Option<u32> {
        self.label_to_class.get(label).copied()
    }

    /// The number of distinct class/label pairs loaded.
    pub fn len(&self) -> usize {
        self.label_to_class.len()
    }

    /// Whether no pairs were loaded.
    pub fn is_empty(&self) -> bool {
        self.label_to_class.is_empty()
    }
}
