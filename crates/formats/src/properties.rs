//! Streaming `.properties` reader
//!
//! Reads Java-style properties files one logical line at a time:
//! comments (`#`, `!`), backslash line continuations, the `=`, `:` and
//! whitespace separators, and `\t \n \r \f \uXXXX` escapes. Every
//! assignment is yielded, including repeated keys, so callers can see
//! duplicates that a map-based loader would silently overwrite.

use crate::{Error, PropertyEntry, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Buffer size for the underlying BufReader
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming properties reader yielding entries in file order
pub struct PropertiesReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    bytes_read: u64,
    total_bytes: Option<u64>,
}

impl PropertiesReader<Box<dyn Read>> {
    /// Open a properties file, auto-detecting gzip compression
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (reader, total_bytes) = open_source(path.as_ref())?;
        Ok(Self::with_capacity(DEFAULT_BUFFER_SIZE, reader, total_bytes))
    }
}

impl<R: Read> PropertiesReader<R> {
    /// Create a new reader from any Read source
    pub fn new(reader: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, reader, None)
    }

    /// Create a new reader with a custom buffer size
    pub fn with_capacity(capacity: usize, reader: R, total_bytes: Option<u64>) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            bytes_read: 0,
            total_bytes,
        }
    }

    /// Get the number of physical lines read
    pub fn lines_processed(&self) -> usize {
        self.line_number
    }

    /// Get the number of bytes read
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }

    /// Get total file size if known
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// Read one physical line without its terminator
    fn read_physical(&mut self) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        let n = self.reader.read_until(b'\n', &mut bytes)?;
        if n == 0 {
            return Ok(None);
        }

        self.bytes_read += n as u64;
        self.line_number += 1;

        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        let mut line = decode(bytes);
        if self.line_number == 1 {
            if let Some(stripped) = line.strip_prefix('\u{feff}') {
                line = stripped.to_string();
            }
        }

        Ok(Some(line))
    }

    /// Read the next logical line, joining continuations.
    ///
    /// Returns the joined text and the physical line it started on.
    fn read_logical(&mut self) -> Result<Option<(String, usize)>> {
        loop {
            let line = match self.read_physical()? {
                Some(line) => line,
                None => return Ok(None),
            };
            let start = self.line_number;

            let trimmed = line.trim_start_matches(is_blank);
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let mut logical = trimmed.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match self.read_physical()? {
                    Some(next) => logical.push_str(next.trim_start_matches(is_blank)),
                    None => {
                        debug!("Continuation at line {} runs past end of input", self.line_number);
                        break;
                    }
                }
            }

            return Ok(Some((logical, start)));
        }
    }
}

impl<R: Read> Iterator for PropertiesReader<R> {
    type Item = Result<PropertyEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_logical() {
            Ok(Some((logical, line))) => Some(split_entry(&logical, line)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read a whole properties file as text, gunzipping `*.gz` files.
///
/// Input that is not valid UTF-8 is decoded as ISO-8859-1.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let (mut reader, _) = open_source(path.as_ref())?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode(bytes))
}

/// UTF-8 if valid, otherwise ISO-8859-1 (every byte maps to U+0000..U+00FF)
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// Parse every entry in `text`
pub fn parse_str(text: &str) -> Result<Vec<PropertyEntry>> {
    PropertiesReader::new(text.as_bytes()).collect()
}

fn open_source(path: &Path) -> Result<(Box<dyn Read>, Option<u64>)> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(Error::InvalidFile(format!("{} is not a regular file", path.display())));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => {
            debug!("Opening gzip-compressed properties file: {:?}", path);
            Ok((Box::new(GzDecoder::new(file)), None))
        }
        _ => {
            debug!("Opening plain properties file: {:?}", path);
            Ok((Box::new(file), Some(metadata.len())))
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000C}')
}

/// An odd number of trailing backslashes continues the line
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line into an unescaped key and value
fn split_entry(logical: &str, line: usize) -> Result<PropertyEntry> {
    let chars: Vec<char> = logical.chars().collect();
    let mut key_end = chars.len();
    let mut value_start = chars.len();
    let mut has_separator = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if !escaped && (c == '=' || c == ':') {
            key_end = i;
            value_start = i + 1;
            has_separator = true;
            break;
        }
        if !escaped && is_blank(c) {
            key_end = i;
            value_start = i + 1;
            break;
        }
        escaped = c == '\\' && !escaped;
    }

    // Whitespace, at most one more separator, whitespace
    while let Some(&c) = chars.get(value_start) {
        if is_blank(c) {
            value_start += 1;
        } else if !has_separator && (c == '=' || c == ':') {
            has_separator = true;
            value_start += 1;
        } else {
            break;
        }
    }

    let key = unescape(&chars[..key_end], line)?;
    let value = unescape(&chars[value_start..], line)?;
    Ok(PropertyEntry::new(key, value, line))
}

fn unescape(raw: &[char], line: usize) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    // \u escapes are UTF-16 code units; surrogate pairs span two escapes
    let mut units: Vec<u16> = Vec::new();
    let mut i = 0;

    while i < raw.len() {
        let c = raw[i];
        i += 1;
        if c != '\\' {
            flush_units(&mut units, &mut out);
            out.push(c);
            continue;
        }

        let Some(&next) = raw.get(i) else {
            break;
        };
        i += 1;

        if next == 'u' {
            let digits = raw.get(i..i + 4).ok_or(Error::MalformedEscape { line })?;
            if !digits.iter().all(|d| d.is_ascii_hexdigit()) {
                return Err(Error::MalformedEscape { line });
            }
            let hex: String = digits.iter().collect();
            let unit = u16::from_str_radix(&hex, 16).map_err(|_| Error::MalformedEscape { line })?;
            units.push(unit);
            i += 4;
            continue;
        }

        flush_units(&mut units, &mut out);
        out.push(match next {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\u{000C}',
            other => other,
        });
    }

    flush_units(&mut units, &mut out);
    Ok(out)
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if units.is_empty() {
        return;
    }
    out.extend(
        char::decode_utf16(units.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn pairs(text: &str) -> Vec<(String, String)> {
        parse_str(text)
            .unwrap()
            .into_iter()
            .map(PropertyEntry::into_pair)
            .collect()
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_reader_basic() {
        let data = "alpha=val1\nbeta=val2\nalpha=val1\nbeta=val2\n";

        let entries = parse_str(data).unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], PropertyEntry::new("alpha", "val1", 1));
        assert_eq!(entries[3], PropertyEntry::new("beta", "val2", 4));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let data = "# comment\n\n   ! bang comment\n  key = value\n\t\n";

        let entries = parse_str(data).unwrap();

        assert_eq!(entries, vec![PropertyEntry::new("key", "value", 4)]);
    }

    #[test]
    fn test_separators() {
        assert_eq!(pairs("a=b"), vec![pair("a", "b")]);
        assert_eq!(pairs("a:b"), vec![pair("a", "b")]);
        assert_eq!(pairs("a b"), vec![pair("a", "b")]);
        assert_eq!(pairs("a \t = : b"), vec![pair("a", ": b")]);
        assert_eq!(pairs("a==b"), vec![pair("a", "=b")]);
        assert_eq!(pairs("a = b  "), vec![pair("a", "b  ")]);
        assert_eq!(pairs("bare"), vec![pair("bare", "")]);
        assert_eq!(pairs("empty="), vec![pair("empty", "")]);
    }

    #[test]
    fn test_escaped_key_characters() {
        assert_eq!(pairs(r"my\ key=1"), vec![pair("my key", "1")]);
        assert_eq!(pairs(r"a\=b=c"), vec![pair("a=b", "c")]);
        assert_eq!(pairs(r"a\:b:c"), vec![pair("a:b", "c")]);
        assert_eq!(pairs(r"path=C:\\dir"), vec![pair("path", r"C:\dir")]);
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(pairs(r"k=a\tb\nc\rd\fe\qf"), vec![pair("k", "a\tb\nc\rd\u{000C}eqf")]);
        assert_eq!(pairs(r"k=caf\u00e9"), vec![pair("k", "café")]);
        assert_eq!(pairs(r"k=\uD83D\uDE00!"), vec![pair("k", "\u{1F600}!")]);
        assert_eq!(pairs(r"k=\uD83Dx"), vec![pair("k", "\u{FFFD}x")]);
    }

    #[test]
    fn test_malformed_unicode_escape() {
        let result = parse_str("ok=1\nbad=\\u12G4\n");
        assert!(matches!(result, Err(Error::MalformedEscape { line: 2 })));

        let result = parse_str("bad=\\u12");
        assert!(matches!(result, Err(Error::MalformedEscape { line: 1 })));
    }

    #[test]
    fn test_line_continuation() {
        let data = "first=1\nlong = one, \\\n       two, \\\n   three\nlast=2\n";

        let entries = parse_str(data).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], PropertyEntry::new("long", "one, two, three", 2));
        assert_eq!(entries[2], PropertyEntry::new("last", "2", 5));
    }

    #[test]
    fn test_even_backslashes_do_not_continue() {
        let data = "a=x\\\\\nb=y\n";
        assert_eq!(pairs(data), vec![pair("a", r"x\"), pair("b", "y")]);
    }

    #[test]
    fn test_continuation_at_end_of_input() {
        assert_eq!(pairs("a=x\\"), vec![pair("a", "x")]);
    }

    #[test]
    fn test_crlf_and_bom() {
        let data = "\u{feff}a=1\r\nb=2\r\n";
        assert_eq!(pairs(data), vec![pair("a", "1"), pair("b", "2")]);
    }

    #[test]
    fn test_latin1_fallback() {
        let data: &[u8] = b"caf\xe9=1\nname=Jos\xe9\nplain=ok\n";

        let entries: Vec<_> = PropertiesReader::new(data)
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(entries[0], PropertyEntry::new("café", "1", 1));
        assert_eq!(entries[1].value, "José");
        assert_eq!(entries[2].value, "ok");
    }

    #[test]
    fn test_read_text_latin1_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"k=\xe9t\xe9\n").unwrap();
        temp_file.flush().unwrap();

        assert_eq!(read_text(temp_file.path()).unwrap(), "k=été\n");
    }

    #[test]
    fn test_progress_tracking() {
        let data = "a=1\n# skip\nb=2\n";

        let mut reader = PropertiesReader::new(data.as_bytes());
        assert_eq!(reader.lines_processed(), 0);
        assert_eq!(reader.bytes_processed(), 0);

        let _ = reader.next();
        assert_eq!(reader.lines_processed(), 1);

        let _ = reader.next();
        assert_eq!(reader.lines_processed(), 3);
        assert_eq!(reader.bytes_processed(), data.len() as u64);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "alpha=1").unwrap();
        writeln!(temp_file, "alpha=2").unwrap();
        temp_file.flush().unwrap();

        let reader = PropertiesReader::open(temp_file.path()).unwrap();
        assert_eq!(reader.total_bytes(), Some(16));
        let entries: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(read_text(temp_file.path()).unwrap(), "alpha=1\nalpha=2\n");
    }

    #[test]
    fn test_reader_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().with_extension("properties.gz");

        {
            let file = File::create(&temp_path).unwrap();
            let mut encoder = GzEncoder::new(file, Compression::default());
            writeln!(encoder, "compressed=yes").unwrap();
            writeln!(encoder, "compressed=still").unwrap();
            encoder.finish().unwrap();
        }

        let reader = PropertiesReader::open(&temp_path).unwrap();
        let entries: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].value, "still");
        assert_eq!(read_text(&temp_path).unwrap(), "compressed=yes\ncompressed=still\n");

        std::fs::remove_file(temp_path).unwrap();
    }

    #[test]
    fn test_open_missing_and_directory() {
        assert!(matches!(
            PropertiesReader::open("/nonexistent/file.properties"),
            Err(Error::Io(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_text(dir.path()), Err(Error::InvalidFile(_))));
    }
}
