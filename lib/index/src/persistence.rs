use crate::record::Record;
use parliament_common::error::{CorruptionError, StorageError};
use parliament_model::Term;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Converts index values to and from their textual form in a [RecordFile].
pub trait ValueCodec<V> {
    fn encode(&self, value: &V) -> String;

    fn decode(&self, text: &str) -> Result<V, CorruptionError>;
}

/// A flat file holding the records of an index, one per line.
///
/// Each line contains the key in N-Triples syntax, a tab and the encoded value. The file is
/// rewritten completely on [RecordFile::store]. The content is first written to a temporary
/// sibling file which then replaces the previous file by a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads all records. A missing file holds no records.
    pub fn load<V>(&self, codec: &impl ValueCodec<V>) -> Result<Vec<Record<V>>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };
        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            records.push(parse_line(&line, codec).map_err(|error| {
                CorruptionError::msg(format!(
                    "{}:{}: {error}",
                    self.path.display(),
                    number + 1
                ))
            })?);
        }
        Ok(records)
    }

    /// Replaces the content of the file with `records`.
    pub fn store<'a, V: 'a>(
        &self,
        records: impl IntoIterator<Item = &'a Record<V>>,
        codec: &impl ValueCodec<V>,
    ) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.temp_path();
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        for record in records {
            writeln!(writer, "{}\t{}", record.key, codec.encode(&record.value))?;
        }
        let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Removes the file. Deleting a missing file succeeds.
    pub fn delete(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Turns `text`, e.g., an IRI, into a string that can be used as a file name on any platform.
pub fn encode_for_filename(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            result.push(char::from(byte));
        } else {
            result.push_str(&format!("_{byte:02X}"));
        }
    }
    result
}

fn parse_line<V>(line: &str, codec: &impl ValueCodec<V>) -> Result<Record<V>, CorruptionError> {
    let Some((key, value)) = line.rsplit_once('\t') else {
        return Err(CorruptionError::msg("missing value separator"));
    };
    let key = Term::from_str(key).map_err(CorruptionError::new)?;
    Ok(Record::new(key, codec.decode(value)?))
}
