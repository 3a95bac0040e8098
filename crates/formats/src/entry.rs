//! A single key/value pair read from a properties file

/// One logical `key=value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    /// Unescaped key
    pub key: String,
    /// Unescaped value
    pub value: String,
    /// 1-based physical line the entry starts on
    pub line: usize,
}

impl PropertyEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, line: usize) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            line,
        }
    }

    /// Split into a (key, value) pair
    pub fn into_pair(self) -> (String, String) {
        (self.key, self.value)
    }

    /// Split into a (key, value, line) triple
    pub fn into_located(self) -> (String, String, usize) {
        (self.key, self.value, self.line)
    }
}
