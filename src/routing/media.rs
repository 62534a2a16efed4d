//! Media types and `Accept` header parsing.
//!
//! # Responsibilities
//! - Parse media ranges (`type/subtype`, `type/*`, `*/*`) from route declarations
//!   and from `Content-Type`
//! - Parse `Accept` into ranges with quality values
//! - Decide compatibility and how specific a match is
//!
//! # Design Decisions
//! - Comparison is case-insensitive; ranges are stored lowercased
//! - Media type parameters other than `q` are ignored
//! - Quality is kept in thousandths (RFC 7231 allows three decimals),
//!   so scores compare exactly

use std::fmt;
use std::str::FromStr;

use crate::routing::error::RoutingError;

/// Highest quality value, in thousandths.
pub const MAX_QUALITY: u16 = 1000;

const WILDCARD: &str = "*";

/// A media range such as `application/json` or `text/*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaRange {
    kind: String,
    subtype: String,
}

/// How closely two compatible ranges match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchSpecificity {
    /// One side is `*/*`.
    Any = 1,
    /// Same type, one side has a subtype wildcard.
    Subtype = 2,
    /// Same type and subtype.
    Exact = 3,
}

impl MediaRange {
    /// `*/*`
    pub fn any() -> Self {
        Self {
            kind: WILDCARD.to_string(),
            subtype: WILDCARD.to_string(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Precision of the range itself: `type/subtype` > `type/*` > `*/*`.
    pub fn precision(&self) -> MatchSpecificity {
        if self.kind == WILDCARD {
            MatchSpecificity::Any
        } else if self.subtype == WILDCARD {
            MatchSpecificity::Subtype
        } else {
            MatchSpecificity::Exact
        }
    }

    /// Returns how specific the match is, or `None` if the ranges are incompatible.
    pub fn matches(&self, other: &MediaRange) -> Option<MatchSpecificity> {
        let kind_wild = self.kind == WILDCARD || other.kind == WILDCARD;
        if !kind_wild && self.kind != other.kind {
            return None;
        }
        let subtype_wild = self.subtype == WILDCARD || other.subtype == WILDCARD;
        if !subtype_wild && self.subtype != other.subtype {
            return None;
        }

        Some(if kind_wild {
            MatchSpecificity::Any
        } else if subtype_wild {
            MatchSpecificity::Subtype
        } else {
            MatchSpecificity::Exact
        })
    }
}

impl FromStr for MediaRange {
    type Err = RoutingError;

    /// Parses `type/subtype[; params]`. Parameters are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        let invalid = || RoutingError::InvalidMediaType(s.to_string());

        let (kind, subtype) = essence.split_once('/').ok_or_else(invalid)?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if !is_token(kind) || !is_token(subtype) {
            return Err(invalid());
        }
        // `*/json` is not a range
        if kind == WILDCARD && subtype != WILDCARD {
            return Err(invalid());
        }

        Ok(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptEntry {
    pub range: MediaRange,
    /// Quality in thousandths, `0..=1000`.
    pub quality: u16,
}

/// Parse an `Accept` header.
///
/// Malformed entries are skipped. A missing header, or one without any
/// usable entry, accepts everything.
pub fn parse_accept(header: Option<&str>) -> Vec<AcceptEntry> {
    let entries: Vec<AcceptEntry> = header
        .unwrap_or_default()
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(parse_accept_entry)
        .collect();

    if entries.is_empty() {
        vec![AcceptEntry {
            range: MediaRange::any(),
            quality: MAX_QUALITY,
        }]
    } else {
        entries
    }
}

fn parse_accept_entry(part: &str) -> Option<AcceptEntry> {
    let range: MediaRange = part.parse().ok()?;
    let mut quality = MAX_QUALITY;

    for param in part.split(';').skip(1) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("q") {
            quality = parse_quality(value.trim())?;
        }
    }

    Some(AcceptEntry { range, quality })
}

/// Parse a qvalue (`0`, `0.5`, `1.000`) into thousandths.
fn parse_quality(value: &str) -> Option<u16> {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if fraction.len() > 3 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let thousandths = format!("{:0<3}", fraction).parse::<u16>().ok()?;

    match whole {
        "0" => Some(thousandths),
        "1" if thousandths == 0 => Some(MAX_QUALITY),
        _ => None,
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || "!#$&-^_.+*'`|~".contains(c)
        })
}
