//! Numbered file name templates.
//!
//! Frame folders name their images with a single zero-padded integer
//! field, written the way Python format strings spell it:
//! `frame_{:010d}.png`, `{:06d}.png`, or `img{}.jpg`. [`FileTemplate`]
//! parses such a template once and then formats indices into names or
//! recovers indices from names found on disk.
//!
//! # Example
//!
//! ```
//! use frameseq::FileTemplate;
//!
//! let template = FileTemplate::parse("frame_{:010d}.png")?;
//! assert_eq!(template.format(42), "frame_0000000042.png");
//! assert_eq!(template.match_index("frame_0000000042.png"), Some(42));
//! assert_eq!(template.match_index("frame_42.jpg"), None);
//! # Ok::<(), frameseq::SequenceError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
};

use crate::error::SequenceError;

/// A parsed file name template with exactly one integer field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTemplate {
    prefix: String,
    suffix: String,
    /// Minimum number of digits. Zero means unpadded.
    width: usize,
}

impl FileTemplate {
    /// Parse a template such as `frame_{:010d}.png`.
    ///
    /// Accepted field forms are `{}`, `{:d}`, `{:0Nd}` and `{:0N}`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidTemplate`] when the template has no
    /// field, more than one field, or a field this parser does not
    /// understand.
    pub fn parse(template: &str) -> Result<Self, SequenceError> {
        let invalid = |reason: &str| SequenceError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let open = template
            .find('{')
            .ok_or_else(|| invalid("missing integer field"))?;
        let close = template[open..]
            .find('}')
            .map(|offset| open + offset)
            .ok_or_else(|| invalid("unterminated field"))?;

        let prefix = &template[..open];
        let suffix = &template[close + 1..];
        if suffix.contains('{') || suffix.contains('}') || prefix.contains('}') {
            return Err(invalid("expected exactly one integer field"));
        }

        let width = parse_field_spec(&template[open + 1..close])
            .ok_or_else(|| invalid("unsupported field specification"))?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            width,
        })
    }

    /// Render the file name for `index`.
    pub fn format(&self, index: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.suffix,
            width = self.width
        )
    }

    /// Recover the index from a file name, if the name fits the template.
    ///
    /// The digits between prefix and suffix must be at least as many as the
    /// padding width, so `frame_{:04d}.png` accepts `frame_0007.png` and
    /// `frame_12345.png` but not `frame_7.png`.
    pub fn match_index(&self, file_name: &str) -> Option<u64> {
        let digits = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;

        if digits.is_empty() || digits.len() < self.width {
            return None;
        }
        if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// List the files in `directory` that match the template, in ascending
    /// index order.
    ///
    /// Gaps in the numbering are allowed. Names that map to the same index
    /// (e.g. `7.png` and `007.png` under `{}.png`) are ordered by name.
    ///
    /// # Errors
    ///
    /// Propagates the I/O error if `directory` cannot be read.
    pub fn enumerate<P: AsRef<Path>>(&self, directory: P) -> Result<Vec<PathBuf>, SequenceError> {
        let directory = directory.as_ref();
        log::debug!("Enumerating {} in {}", self, directory.display());

        let mut matches: Vec<(u64, String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(index) = self.match_index(name) {
                matches.push((index, name.to_string(), entry.path()));
            }
        }

        matches.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        log::debug!("Found {} matching files", matches.len());
        Ok(matches.into_iter().map(|(_, _, path)| path).collect())
    }
}

impl Display for FileTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.width == 0 {
            write!(f, "{}{{}}{}", self.prefix, self.suffix)
        } else {
            write!(f, "{}{{:0{}d}}{}", self.prefix, self.width, self.suffix)
        }
    }
}

/// Returns the padding width of a field body (the text between braces).
fn parse_field_spec(spec: &str) -> Option<usize> {
    if spec.is_empty() {
        return Some(0);
    }
    let spec = spec.strip_prefix(':')?;
    let spec = spec.strip_suffix('d').unwrap_or(spec);
    if spec.is_empty() {
        return Some(0);
    }
    let digits = spec.strip_prefix('0')?;
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_forms() {
        assert_eq!(FileTemplate::parse("{}.png").unwrap().width, 0);
        assert_eq!(FileTemplate::parse("{:d}.png").unwrap().width, 0);
        assert_eq!(FileTemplate::parse("{:06d}.png").unwrap().width, 6);
        assert_eq!(FileTemplate::parse("{:06}.png").unwrap().width, 6);
    }

    #[test]
    fn parse_rejects_malformed_fields() {
        assert!(FileTemplate::parse("frame.png").is_err());
        assert!(FileTemplate::parse("frame_{:06d.png").is_err());
        assert!(FileTemplate::parse("{}_{}.png").is_err());
        assert!(FileTemplate::parse("{:6d}.png").is_err());
        assert!(FileTemplate::parse("{:x}.png").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["frame_{:010d}.png", "{}.jpg"] {
            let template = FileTemplate::parse(text).unwrap();
            assert_eq!(template.to_string(), text);
        }
    }
}
