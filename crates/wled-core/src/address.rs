//! Device address validation
//!
//! The same classifier backs both the settings path (before a session starts
//! polling) and the CLI `validate` command, so an address is accepted in one
//! place iff it is accepted everywhere.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Addresses shorter than this after cleaning are always rejected
const MIN_ADDRESS_LEN: usize = 4;

static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").expect("Invalid IPv4 regex")
});

/// Dotted hostnames with an alphabetic TLD, plus the bare names a WLED device
/// announces itself under out of the box.
static HOSTNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$|^wled(?:-[0-9]+)?$|^wled\.local$")
        .expect("Invalid hostname regex")
});

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("Invalid scheme regex"));

/// Classification of a free-text address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Ipv4,
    Hostname,
    Invalid,
}

impl AddressKind {
    pub fn is_valid(self) -> bool {
        !matches!(self, AddressKind::Invalid)
    }
}

/// A device address that passed [`classify_address`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Clean and validate `input`
    pub fn parse(input: &str) -> Result<Self> {
        let cleaned = clean_address(input);
        match classify_cleaned(&cleaned) {
            AddressKind::Invalid => Err(Error::invalid_address(input)),
            _ => Ok(Self(cleaned)),
        }
    }

    /// Like [`DeviceAddress::parse`] but treats blank input as "not configured"
    pub fn from_setting(input: Option<&str>) -> Option<Self> {
        let input = input?;
        if input.trim().is_empty() {
            return None;
        }
        Self::parse(input).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> AddressKind {
        classify_cleaned(&self.0)
    }

    /// Full URL for `path` (which must start with `/`)
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.0, path)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DeviceAddress> for String {
    fn from(value: DeviceAddress) -> Self {
        value.0
    }
}

/// Strip scheme prefix, trailing slashes, surrounding whitespace and
/// non-printable characters.
///
/// Applied until nothing changes, so cleaning an already-clean string is a no-op.
pub fn clean_address(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(input: &str) -> String {
    let printable: String = input.chars().filter(|c| (' '..='~').contains(c)).collect();
    let trimmed = printable.trim();
    let without_scheme = SCHEME_PREFIX.replace(trimmed, "");
    without_scheme.trim_end_matches('/').trim().to_string()
}

/// Classify free text as a device address
pub fn classify_address(input: &str) -> AddressKind {
    classify_cleaned(&clean_address(input))
}

fn classify_cleaned(cleaned: &str) -> AddressKind {
    if cleaned.len() < MIN_ADDRESS_LEN {
        AddressKind::Invalid
    } else if IPV4_PATTERN.is_match(cleaned) {
        AddressKind::Ipv4
    } else if HOSTNAME_PATTERN.is_match(cleaned) {
        AddressKind::Hostname
    } else {
        AddressKind::Invalid
    }
}
