//! File name patterns
//!
//! Names carry the checksum the game expects as leading decimal digits:
//! `3149245302.src.lua` compresses to `3149245302.lua`, and back. Matching
//! is anchored at the start of the name only, so `12.src.lua.bak` still
//! counts as `12.src.lua`.

use regex::Regex;

/// Maps `<digits><from>` names to `<digits><to>` names
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
    to_suffix: String,
}

/// A file name that matched a [`NamePattern`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    /// The leading digits, as written
    pub digits: String,
    /// Name of the file to produce
    pub output_name: String,
}

impl NameMatch {
    /// The digits as a CRC32, or `None` if they do not fit in 32 bits
    pub fn checksum(&self) -> Option<u32> {
        self.digits.parse().ok()
    }
}

impl NamePattern {
    /// Pattern turning `<digits><from_suffix>` into `<digits><to_suffix>`
    pub fn new(from_suffix: &str, to_suffix: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^([0-9]+){}", regex::escape(from_suffix)))?;
        Ok(Self {
            regex,
            to_suffix: to_suffix.to_string(),
        })
    }

    /// Match a bare file name
    pub fn match_name(&self, file_name: &str) -> Option<NameMatch> {
        let digits = self.regex.captures(file_name)?.get(1)?.as_str();
        Some(NameMatch {
            digits: digits.to_string(),
            output_name: format!("{digits}{}", self.to_suffix),
        })
    }
}
