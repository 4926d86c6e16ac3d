// crates/liquichange/src/config.rs
//! Options controlling how a changelog document is written out.

use std::borrow::Cow;
use std::fmt::Write;

/// Indentation used when pretty-printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indent {
    pub char: u8,
    pub size: usize,
}

impl Default for Indent {
    fn default() -> Self {
        Self { char: b' ', size: 2 }
    }
}

/// Character encoding of the written document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Plain ASCII; every other character becomes a numeric character reference.
    UsAscii,
}

impl Encoding {
    /// The label written into the XML declaration.
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::UsAscii => "us-ascii",
        }
    }

    /// Re-encodes a rendered document.
    pub(crate) fn apply(self, xml: &str) -> Cow<'_, str> {
        match self {
            Encoding::UsAscii if !xml.is_ascii() => {
                let mut out = String::with_capacity(xml.len() + 16);
                for c in xml.chars() {
                    if c.is_ascii() {
                        out.push(c);
                    } else {
                        // Writing into a String cannot fail.
                        let _ = write!(out, "&#{};", u32::from(c));
                    }
                }
                Cow::Owned(out)
            }
            _ => Cow::Borrowed(xml),
        }
    }
}

/// Settings for [`save_changelog_to_string`](crate::save_changelog_to_string)
/// and [`save_changelog_to_file`](crate::save_changelog_to_file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// `None` writes everything on one line.
    pub indent: Option<Indent>,
    /// Whether to start with `<?xml version="1.0" encoding="..."?>`.
    pub xml_declaration: bool,
    pub encoding: Encoding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: Some(Indent::default()),
            xml_declaration: true,
            encoding: Encoding::Utf8,
        }
    }
}

impl WriteOptions {
    /// Single-line output without a declaration.
    pub fn compact() -> Self {
        Self {
            indent: None,
            xml_declaration: false,
            encoding: Encoding::Utf8,
        }
    }
}
