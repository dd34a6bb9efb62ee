//! Container header values.

use bstr::{BStr, BString};

/// The free-form header text stored after the BAM magic.
///
/// The text is kept verbatim, including any trailing NUL padding some
/// writers add.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    text: BString,
}

impl Header {
    /// Create a header from its text.
    pub fn new(text: impl Into<BString>) -> Self {
        Self { text: text.into() }
    }

    /// The header text.
    #[must_use]
    pub fn text(&self) -> &BStr {
        self.text.as_ref()
    }

    /// Length of the text in bytes (the `l_text` field).
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One entry of the reference dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSequence {
    /// Reference name, without the NUL terminator used on disk.
    pub name: String,
    /// Reference length in bases.
    pub length: i32,
}

impl ReferenceSequence {
    /// Create a reference entry.
    pub fn new(name: impl Into<String>, length: i32) -> Self {
        Self { name: name.into(), length }
    }
}
