//! XML payloads
//!
//! Key records are opaque to the repository. The only thing it checks is that
//! a payload is a well-formed XML document, both before it is written and
//! after it is read back.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A well-formed XML document, kept as the exact text it was parsed from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmlDocument {
    text: String,
}

impl XmlDocument {
    /// Parses `text` and keeps it if it is a well-formed XML document.
    ///
    /// Documents carrying a DTD are rejected.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        roxmltree::Document::parse(&text).map_err(|e| Error::InvalidXml(e.to_string()))?;
        Ok(Self { text })
    }

    /// The document text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the document, returning its text
    pub fn into_string(self) -> String {
        self.text
    }

    /// Local name of the root element
    pub fn root_name(&self) -> Result<String> {
        let doc =
            roxmltree::Document::parse(&self.text).map_err(|e| Error::InvalidXml(e.to_string()))?;
        Ok(doc.root_element().tag_name().name().to_string())
    }
}

impl FromStr for XmlDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for XmlDocument {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
