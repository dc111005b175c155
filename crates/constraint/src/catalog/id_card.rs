//! `id_card`: regional identity card numbers
//!
//! - `mainland`: 18 characters, a six-digit region code, an eight-digit
//!   birth date, a three-digit sequence and an ISO 7064 MOD 11-2 check
//!   character. With `legacy = true` the 15-digit pre-1999 form (two-digit
//!   year, no check character) is accepted as well.
//! - `taiwan`: a letter, a gender digit and eight digits, weighted checksum.
//! - `hongkong`: one or two letters, six digits and a check character that
//!   may be written in parentheses.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::Catalog;
use crate::constraint::{Constraint, ConstraintMetadata, factory};
use crate::criterion::{AnyCriterion, Criterion};
use crate::error::AnalysisError;
use crate::foundation::{TypeDescriptor, ValidationFailure, Value};
use crate::node::ConstrainedNode;

static MAINLAND: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\d{17}[\dXx]$").unwrap());

static MAINLAND_LEGACY: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\d{15}$").unwrap());

static TAIWAN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Z][12]\d{8}$").unwrap());

static HONGKONG: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^([A-Z]{1,2})(\d{6})(?:\(([0-9A])\)|([0-9A]))$").unwrap()
});

const MAINLAND_WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];
const MAINLAND_CHECK: &[u8; 11] = b"10X98765432";

// ============================================================================
// REGION
// ============================================================================

/// Issuing region of an identity card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Mainland,
    Taiwan,
    HongKong,
}

impl Region {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mainland => "mainland",
            Self::Taiwan => "taiwan",
            Self::HongKong => "hongkong",
        }
    }

    /// Checks a card number of this region.
    #[must_use]
    pub fn is_valid(self, number: &str, legacy: bool) -> bool {
        match self {
            Self::Mainland => mainland(number, legacy),
            Self::Taiwan => taiwan(number),
            Self::HongKong => hongkong(number),
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainland" => Ok(Self::Mainland),
            "taiwan" => Ok(Self::Taiwan),
            "hongkong" => Ok(Self::HongKong),
            other => Err(format!(
                "unknown region '{other}', expected mainland, taiwan or hongkong"
            )),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CHECKS
// ============================================================================

fn digit(b: u8) -> u32 {
    u32::from(b - b'0')
}

fn mainland(number: &str, legacy: bool) -> bool {
    let bytes = number.as_bytes();
    if legacy && MAINLAND_LEGACY.is_match(number) {
        let year = 1900 + digits(&bytes[6..8]);
        return is_date(year, digits(&bytes[8..10]), digits(&bytes[10..12]));
    }
    if !MAINLAND.is_match(number) {
        return false;
    }
    if !is_date(
        digits(&bytes[6..10]),
        digits(&bytes[10..12]),
        digits(&bytes[12..14]),
    ) {
        return false;
    }
    let sum: u32 = bytes[..17]
        .iter()
        .zip(MAINLAND_WEIGHTS)
        .map(|(b, w)| digit(*b) * w)
        .sum();
    MAINLAND_CHECK[(sum % 11) as usize] == bytes[17].to_ascii_uppercase()
}

fn digits(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |acc, b| acc * 10 + digit(*b))
}

fn is_date(year: u32, month: u32, day: u32) -> bool {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    year >= 1800 && (1..=days).contains(&day)
}

/// Two-digit codes of the Taiwanese area letters, `A` to `Z`.
const TAIWAN_LETTERS: [u32; 26] = [
    10, 11, 12, 13, 14, 15, 16, 17, 34, 18, 19, 20, 21, 22, 35, 23, 24, 25, 26, 27, 28, 29, 32,
    30, 31, 33,
];

fn taiwan(number: &str) -> bool {
    if !TAIWAN.is_match(number) {
        return false;
    }
    let bytes = number.as_bytes();
    let code = TAIWAN_LETTERS[usize::from(bytes[0] - b'A')];
    let body: u32 = bytes[1..9]
        .iter()
        .zip((1..=8).rev())
        .map(|(b, w)| digit(*b) * w)
        .sum();
    let sum = code / 10 + (code % 10) * 9 + body + digit(bytes[9]);
    sum % 10 == 0
}

fn hongkong(number: &str) -> bool {
    let Some(caps) = HONGKONG.captures(number) else {
        return false;
    };
    let letter = |b: u8| u32::from(b - b'A') + 10;
    let prefix = caps[1].as_bytes();
    let letters = match prefix {
        [single] => 36 * 9 + letter(*single) * 8,
        [first, second] => letter(*first) * 9 + letter(*second) * 8,
        _ => return false,
    };
    let body: u32 = caps[2]
        .bytes()
        .zip((2..=7).rev())
        .map(|(b, w)| digit(b) * w)
        .sum();
    let expected = match (11 - (letters + body) % 11) % 11 {
        10 => b'A',
        n => b'0' + n as u8,
    };
    let check = caps.get(3).or_else(|| caps.get(4)).map(|m| m.as_str().as_bytes()[0]);
    check == Some(expected)
}

// ============================================================================
// REGISTRATION
// ============================================================================

fn id_card_criterion(
    _node: &ConstrainedNode,
    constraint: &Constraint,
) -> Result<AnyCriterion, AnalysisError> {
    let region: Region = constraint
        .str("region")?
        .parse()
        .map_err(|reason: String| constraint.invalid("region", reason))?;
    let legacy = constraint.bool("legacy")?;
    let code = constraint.kind().to_owned();

    Ok(AnyCriterion::Object(Criterion::leaf(move |value: &Value| {
        match value {
            Value::Null => Ok(()),
            Value::String(number) if region.is_valid(number, legacy) => Ok(()),
            Value::String(_) => Err(ValidationFailure::new(
                code.clone(),
                "invalid {region} identity card number",
                value.clone(),
            )
            .with_param("region", region.name())),
            other => Err(ValidationFailure::type_mismatch(TypeDescriptor::String, other)),
        }
    })))
}

pub(super) fn register(catalog: &mut Catalog) -> Result<(), AnalysisError> {
    catalog.register(
        ConstraintMetadata::builder("id_card")
            .attribute("region", Region::Mainland.name())
            .attribute("legacy", false)
            .message("invalid {region} identity card number")
            .factory(factory(
                |ty| matches!(ty, TypeDescriptor::String),
                id_card_criterion,
            ))
            .build()?,
    )?;
    Ok(())
}
