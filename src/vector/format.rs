//! Vector File Formats
//!
//! Two on-disk layouts are understood:
//!
//! Text (GloVe / word2vec): one `word v1 v2 ... vN` row per line, with an
//! optional word2vec `count dimension` header on the first line.
//!
//! Binary vector table:
//! - Magic: 4 bytes "WVEC"
//! - Version: 1 byte
//! - Dimension: 4 bytes (u32 LE)
//! - Row count: 4 bytes (u32 LE)
//! - Rows: [word_len (u16 LE) + word + dimension * f32 LE]*

use bytes::{Buf, Bytes};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::store::{VectorStore, VectorTableBuilder};
use crate::error::LoadError;

pub const TABLE_MAGIC: &[u8; 4] = b"WVEC";
pub const TABLE_VERSION: u8 = 1;

/// magic + version + dimension + row count
const TABLE_HEADER_SIZE: usize = 4 + 1 + 4 + 4;

pub(crate) const READ_PERCENT: u8 = 5;
const PARSE_START_PERCENT: u8 = 10;
const PARSE_END_PERCENT: u8 = 80;
pub(crate) const NORMALIZE_PERCENT: u8 = 85;
pub(crate) const INDEX_PERCENT: u8 = 95;

/// Coarse load milestones reported while a store is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Reading,
    Parsing,
    Normalizing,
    Indexing,
}

impl LoadStage {
    pub fn message(self) -> &'static str {
        match self {
            LoadStage::Reading => "Reading vector file...",
            LoadStage::Parsing => "Parsing vectors...",
            LoadStage::Normalizing => "Normalizing vectors...",
            LoadStage::Indexing => "Building vocabulary index...",
        }
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// On-disk layout of a vector file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    Text,
    Table,
}

impl VectorFormat {
    /// Sniff the format from the file's leading bytes
    pub fn detect(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        let mut head = Vec::with_capacity(TABLE_MAGIC.len());
        file.take(TABLE_MAGIC.len() as u64)
            .read_to_end(&mut head)
            .map_err(|e| LoadError::io(path, e))?;

        if head.as_slice() == TABLE_MAGIC {
            Ok(VectorFormat::Table)
        } else {
            Ok(VectorFormat::Text)
        }
    }
}

/// Map `done / total` onto the parsing band of the progress range
fn parse_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return PARSE_END_PERCENT;
    }
    let span = (PARSE_END_PERCENT - PARSE_START_PERCENT) as u64;
    PARSE_START_PERCENT + (done.min(total) * span / total) as u8
}

/// Read a vector file in whichever format it is stored
pub fn read_vectors(
    path: &Path,
    progress: &mut dyn FnMut(u8, LoadStage),
) -> Result<VectorStore, LoadError> {
    progress(READ_PERCENT, LoadStage::Reading);
    let format = VectorFormat::detect(path)?;
    debug!(path = %path.display(), ?format, "Detected vector file format");

    match format {
        VectorFormat::Text => read_text(path, progress),
        VectorFormat::Table => read_table(path, progress),
    }
}

/// Parse a word2vec `count dimension` header line
fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut tokens = line.split_whitespace();
    let rows = tokens.next()?.parse().ok()?;
    let dimension = tokens.next()?.parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Some((rows, dimension))
}

/// Read whitespace-separated text rows
pub fn read_text(
    path: &Path,
    progress: &mut dyn FnMut(u8, LoadStage),
) -> Result<VectorStore, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mut reader = BufReader::new(file);

    let mut builder = VectorTableBuilder::new();
    let mut expected_rows = None;
    let mut line = String::new();
    let mut values: Vec<f32> = Vec::new();
    let mut consumed = 0u64;
    let mut line_no = 0usize;
    let mut last_percent = PARSE_START_PERCENT;

    progress(PARSE_START_PERCENT, LoadStage::Parsing);

    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .map_err(|e| LoadError::io(path, e))?;
        if n == 0 {
            break;
        }
        consumed += n as u64;
        line_no += 1;

        let mut tokens = line.split_whitespace();
        let Some(word) = tokens.next() else {
            continue;
        };

        if builder.is_empty() && expected_rows.is_none() {
            if let Some((rows, dimension)) = parse_header(&line) {
                if dimension == 0 {
                    return Err(LoadError::malformed(line_no, "header declares zero dimensions"));
                }
                debug!(rows, dimension, "Found word2vec header");
                expected_rows = Some(rows);
                builder = VectorTableBuilder::with_dimension(dimension);
                continue;
            }
        }

        values.clear();
        for token in tokens {
            let value = token.parse::<f32>().map_err(|_| {
                LoadError::malformed(line_no, format!("invalid vector component '{}'", token))
            })?;
            values.push(value);
        }

        builder
            .push(word, &values)
            .map_err(|reason| LoadError::malformed(line_no, reason))?;

        let percent = parse_percent(consumed, total);
        if percent > last_percent {
            progress(percent, LoadStage::Parsing);
            last_percent = percent;
        }
    }

    if let Some(rows) = expected_rows {
        if rows != builder.len() {
            warn!(
                declared = rows,
                loaded = builder.len(),
                "Header row count does not match the rows read"
            );
        }
    }

    debug!(lines = line_no, rows = builder.len(), "Parsed text vectors");
    builder.build(progress)
}

/// Read a binary vector table
pub fn read_table(
    path: &Path,
    progress: &mut dyn FnMut(u8, LoadStage),
) -> Result<VectorStore, LoadError> {
    let data = fs::read(path).map_err(|e| LoadError::io(path, e))?;
    let total_len = data.len();
    let mut buf = Bytes::from(data);

    if buf.remaining() < TABLE_HEADER_SIZE {
        return Err(LoadError::InvalidTable("truncated header".to_string()));
    }

    let magic = buf.copy_to_bytes(TABLE_MAGIC.len());
    if magic.as_ref() != TABLE_MAGIC {
        return Err(LoadError::InvalidTable("bad magic".to_string()));
    }

    let version = buf.get_u8();
    if version != TABLE_VERSION {
        return Err(LoadError::InvalidTable(format!(
            "unsupported version {}",
            version
        )));
    }

    let dimension = buf.get_u32_le() as usize;
    let rows = buf.get_u32_le() as usize;
    if dimension == 0 {
        return Err(LoadError::InvalidTable("zero dimension".to_string()));
    }

    if rows == 0 {
        return Err(LoadError::Empty);
    }

    // Header sizes are checked against the bytes present before anything is allocated
    let row_floor = dimension
        .checked_mul(4)
        .and_then(|n| n.checked_add(2))
        .ok_or_else(|| LoadError::InvalidTable(format!("dimension {} too large", dimension)))?;
    if row_floor > buf.remaining() {
        return Err(LoadError::InvalidTable(format!(
            "dimension {} exceeds the {} bytes left in the file",
            dimension,
            buf.remaining()
        )));
    }
    let capacity = rows.min(total_len / row_floor);
    let mut builder = VectorTableBuilder::with_capacity(capacity, dimension);
    let mut values = vec![0.0f32; dimension];
    let mut last_percent = PARSE_START_PERCENT;

    progress(PARSE_START_PERCENT, LoadStage::Parsing);

    for row in 0..rows {
        if buf.remaining() < 2 {
            return Err(LoadError::InvalidTable(format!("truncated at row {}", row)));
        }
        let word_len = buf.get_u16_le() as usize;
        if buf.remaining() < word_len + dimension * 4 {
            return Err(LoadError::InvalidTable(format!("truncated at row {}", row)));
        }

        let word_bytes = buf.copy_to_bytes(word_len);
        let word = std::str::from_utf8(&word_bytes).map_err(|_| {
            LoadError::InvalidTable(format!("row {} has a non UTF-8 word", row))
        })?;

        for value in values.iter_mut() {
            *value = buf.get_f32_le();
        }

        builder
            .push(word, &values)
            .map_err(|reason| LoadError::InvalidTable(format!("row {}: {}", row, reason)))?;

        let percent = parse_percent(row as u64 + 1, rows as u64);
        if percent > last_percent {
            progress(percent, LoadStage::Parsing);
            last_percent = percent;
        }
    }

    if buf.has_remaining() {
        return Err(LoadError::InvalidTable(format!(
            "{} trailing bytes after {} rows",
            buf.remaining(),
            rows
        )));
    }

    builder.build_normalized(progress)
}

/// Write `store` as a binary vector table
pub fn write_table(path: &Path, store: &VectorStore) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let rows = u32::try_from(store.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many rows"))?;
    let dimension = u32::try_from(store.dimension())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "dimension too large"))?;

    // Header
    writer.write_all(TABLE_MAGIC)?;
    writer.write_all(&[TABLE_VERSION])?;
    writer.write_all(&dimension.to_le_bytes())?;
    writer.write_all(&rows.to_le_bytes())?;

    for (word, vector) in store.iter() {
        let word_len = u16::try_from(word.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("word too long: {} bytes", word.len()),
            )
        })?;
        writer.write_all(&word_len.to_le_bytes())?;
        writer.write_all(word.as_bytes())?;
        for value in vector {
            writer.write_all(&value.to_le_bytes())?;
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn text_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn no_progress() -> impl FnMut(u8, LoadStage) {
        |_, _| {}
    }

    #[test]
    fn test_read_glove_text() {
        let file = text_file("the 0.1 0.2 0.3\nof 0.3 0.2 0.1\n\nAnd -0.5 0.5 0.0\n");
        let store = read_vectors(file.path(), &mut no_progress()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.dimension(), 3);
        assert_eq!(store.sample_words(3), vec!["the", "of", "and"]);
    }

    #[test]
    fn test_read_word2vec_header() {
        let file = text_file("2 2\ncat 1.0 0.0\ndog 0.0 1.0\n");
        let store = read_vectors(file.path(), &mut no_progress()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.dimension(), 2);
        assert!(store.contains("cat"));
    }

    #[test]
    fn test_header_dimension_enforced() {
        let file = text_file("1 3\ncat 1.0 0.0\n");
        let err = read_vectors(file.path(), &mut no_progress()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_malformed_component() {
        let file = text_file("cat 1.0 0.0\ndog 0.0 abc\n");
        let err = read_vectors(file.path(), &mut no_progress()).unwrap_err();
        match err {
            LoadError::Malformed { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("abc"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_row_without_components() {
        let file = text_file("cat 1.0 0.0\nlonely\n");
        let err = read_vectors(file.path(), &mut no_progress()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_empty_file() {
        let file = text_file("\n\n");
        let err = read_vectors(file.path(), &mut no_progress()).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_vectors(&dir.path().join("absent.txt"), &mut no_progress()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_progress_is_monotonic_and_staged() {
        let rows: String = (0..200)
            .map(|i| format!("w{} {} 1.0\n", i, i as f32))
            .collect();
        let file = text_file(&rows);

        let mut seen = Vec::new();
        read_vectors(file.path(), &mut |p, stage| seen.push((p, stage))).unwrap();

        assert_eq!(seen.first(), Some(&(READ_PERCENT, LoadStage::Reading)));
        assert_eq!(seen.last(), Some(&(INDEX_PERCENT, LoadStage::Indexing)));
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(seen.iter().any(|&(_, s)| s == LoadStage::Normalizing));
        assert!(seen.iter().any(|&(p, s)| s == LoadStage::Parsing && p == PARSE_END_PERCENT));
    }

    #[test]
    fn test_table_written_from_text_loads_back() {
        let file = text_file("king 1.0 1.0\nqueen -1.0 1.0\nman 1.0 0.0\n");
        let store = read_vectors(file.path(), &mut no_progress()).unwrap();

        let dir = TempDir::new().unwrap();
        let table = dir.path().join("vectors.wvec");
        write_table(&table, &store).unwrap();

        assert_eq!(VectorFormat::detect(&table).unwrap(), VectorFormat::Table);
        let loaded = read_vectors(&table, &mut no_progress()).unwrap();

        assert_eq!(loaded.len(), store.len());
        assert_eq!(loaded.dimension(), store.dimension());
        for (word, vector) in store.iter() {
            assert_eq!(loaded.vector(word).unwrap(), vector);
        }
    }

    #[test]
    fn test_table_bad_version() {
        let mut bytes = TABLE_MAGIC.to_vec();
        bytes.push(9);
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v9.wvec");
        fs::write(&path, bytes).unwrap();

        let err = read_vectors(&path, &mut no_progress()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidTable(ref m) if m.contains("version")));
    }

    #[test]
    fn test_table_truncated_row() {
        let mut bytes = TABLE_MAGIC.to_vec();
        bytes.push(TABLE_VERSION);
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(b"cat");
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(b"dog");
        bytes.extend_from_slice(&1.0f32.to_le_bytes());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.wvec");
        fs::write(&path, bytes).unwrap();

        let err = read_vectors(&path, &mut no_progress()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidTable(ref m) if m.contains("row 1")));
    }

    fn table_header(dimension: u32, rows: u32) -> Vec<u8> {
        let mut bytes = TABLE_MAGIC.to_vec();
        bytes.push(TABLE_VERSION);
        bytes.extend_from_slice(&dimension.to_le_bytes());
        bytes.extend_from_slice(&rows.to_le_bytes());
        bytes
    }

    #[test]
    fn test_table_dimension_larger_than_file() {
        let mut bytes = table_header(u32::MAX, 1);
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(b"cat");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.wvec");
        fs::write(&path, bytes).unwrap();

        let err = read_vectors(&path, &mut no_progress()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidTable(ref m) if m.contains("dimension")));

        fs::write(&path, table_header(u32::MAX, 0)).unwrap();
        assert!(matches!(
            read_vectors(&path, &mut no_progress()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn test_table_rows_are_renormalized_when_not_unit() {
        let mut bytes = table_header(2, 1);
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(b"cat");
        bytes.extend_from_slice(&3.0f32.to_le_bytes());
        bytes.extend_from_slice(&4.0f32.to_le_bytes());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.wvec");
        fs::write(&path, bytes).unwrap();

        let store = read_vectors(&path, &mut no_progress()).unwrap();
        let cat = store.vector("cat").unwrap();
        assert!((cat[0] - 0.6).abs() < 1e-6);
        assert!((cat[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_row_rejected() {
        let file = text_file("cat 1.0 0.0
pad 0.0 0.0
");
        let err = read_vectors(file.path(), &mut no_progress()).unwrap_err();
        match err {
            LoadError::Malformed { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("zero-length"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_table_with_no_rows_is_empty() {
        let mut bytes = TABLE_MAGIC.to_vec();
        bytes.push(TABLE_VERSION);
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.wvec");
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            read_vectors(&path, &mut no_progress()),
            Err(LoadError::Empty)
        ));
    }
}
