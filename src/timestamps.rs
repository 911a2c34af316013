//! Timestamp log files.
//!
//! A timestamp log is plain text with one decimal value (seconds) per line,
//! in the same order as the frames it describes. Values are expected to be
//! non-decreasing but this is not checked.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use crate::error::SequenceError;

/// Read a timestamp log into a flat list of seconds.
///
/// Blank lines and lines starting with `#` are ignored. Surrounding
/// whitespace is trimmed.
///
/// # Errors
///
/// - [`SequenceError::IoError`] if the file cannot be read.
/// - [`SequenceError::TimestampParse`] for the first line that is not a
///   number.
pub fn read_timestamps<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, SequenceError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let mut timestamps = Vec::new();
    for (line_index, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| SequenceError::TimestampParse {
                path: path.to_path_buf(),
                line: line_index + 1,
                value: trimmed.to_string(),
            })?;
        timestamps.push(value);
    }

    log::debug!("Read {} timestamps from {}", timestamps.len(), path.display());
    Ok(timestamps)
}

/// Write `timestamps` one per line.
///
/// Values use the shortest representation that parses back to the same
/// `f64`, so [`read_timestamps`] recovers them exactly.
pub fn write_timestamps<P: AsRef<Path>>(path: P, timestamps: &[f64]) -> Result<(), SequenceError> {
    write_lines(path, timestamps.iter().map(|timestamp| timestamp.to_string()))
}

/// Write each item of `lines` followed by a newline, replacing the file.
pub fn write_lines<P, I, S>(path: P, lines: I) -> Result<(), SequenceError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for line in lines {
        writer.write_all(line.as_ref().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
