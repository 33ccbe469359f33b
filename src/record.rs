//! Parsing of raw input lines into records.
//!
//! Lines are handled as bytes: fields are opaque and need not be valid UTF-8.

/// Bytes treated as whitespace when deciding whether a line is blank.
pub const BLANK_BYTES: &[u8] = b" \t\n\r\x0b\x0c";

/// A single input line split into its roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<'a> {
    /// Line made only of [`BLANK_BYTES`].
    Blank,
    /// Feature values followed by the label taken from the last field.
    Vector {
        /// Every field except the last, in order; may be empty.
        features: Vec<&'a [u8]>,
        /// The last field of the line.
        label: &'a [u8],
    },
}

impl<'a> Record<'a> {
    /// Parses `line`, which may still carry its `\n` or `\r\n` terminator.
    ///
    /// Only the terminator is removed; whitespace inside and around fields is kept verbatim.
    #[must_use]
    pub fn parse(line: &'a [u8], delimiter: u8) -> Self {
        if is_blank(line) {
            return Self::Blank;
        }
        let body = strip_terminator(line);
        let mut fields: Vec<&[u8]> = body.split(|&b| b == delimiter).collect();
        // `split` always yields at least one field.
        let label = fields.pop().unwrap_or(body);
        Self::Vector {
            features: fields,
            label,
        }
    }

    /// Returns `true` for [`Record::Blank`].
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Number of integers this record occupies once encoded, sentinel included.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Blank => 1,
            Self::Vector { features, .. } => features.len() + 2,
        }
    }
}

/// Returns `true` when `line` holds nothing but ASCII whitespace.
#[must_use]
pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|b| BLANK_BYTES.contains(b))
}

/// Removes a single trailing `\n` or `\r\n`.
#[must_use]
pub fn strip_terminator(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n")
        .map(|rest| rest.strip_suffix(b"\r").unwrap_or(rest))
        .unwrap_or(line)
}
