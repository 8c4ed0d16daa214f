use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::error::FieldError;
use super::tax_id::check_tax_id;

/// The single date-time layout used on the wire, e.g. `2023-06-18T12:40:30+02:00`.
pub const DATE_TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%:z";

// ---------------------------------------------------------------------------
// CurrencyAmount
// ---------------------------------------------------------------------------

/// A monetary amount rendered with exactly two fractional digits.
///
/// Values are kept as [`Decimal`], never floating point. Validation rejects
/// inputs with more than two fractional digits; formatting a value that
/// nevertheless carries more rounds half away from zero (`5.005` → `5.01`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CurrencyAmount(Decimal);

impl CurrencyAmount {
    /// Largest magnitude the protocol accepts.
    pub const MAX: Decimal = dec!(99999999.99);

    /// Wrap a decimal without checking it.
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Parse and validate a textual amount.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = Decimal::from_str(raw.trim())
            .map_err(|e| FieldError::Format(format!("'{raw}' is not a decimal: {e}")))?;
        Self::checked(value)
    }

    /// Validate a decimal and wrap it.
    pub fn checked(value: Decimal) -> Result<Self, FieldError> {
        let amount = Self(value);
        amount.validate()?;
        Ok(amount)
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        let scale = self.0.normalize().scale();
        if scale > 2 {
            return Err(FieldError::Precision {
                max: 2,
                actual: scale,
            });
        }
        if self.0.abs() > Self::MAX {
            return Err(FieldError::OutOfRange(format!(
                "|{}| exceeds {}",
                self.0,
                Self::MAX
            )));
        }
        Ok(())
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The value rounded to two decimal places, scale fixed at 2.
    pub fn rounded(&self) -> Decimal {
        let mut r = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if r.is_zero() {
            r.set_sign_positive(true);
        }
        r.rescale(2);
        r
    }
}

impl From<Decimal> for CurrencyAmount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded())
    }
}

impl FromStr for CurrencyAmount {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CurrencyAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

// ---------------------------------------------------------------------------
// FiscalDateTime
// ---------------------------------------------------------------------------

/// A timestamp with an explicit UTC offset and whole-second precision.
///
/// An unset timestamp is modelled as `Option<FiscalDateTime>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiscalDateTime(DateTime<FixedOffset>);

impl FiscalDateTime {
    /// Wrap a timestamp, dropping sub-second precision the layout cannot carry.
    pub fn new(value: DateTime<FixedOffset>) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }

    /// Parse exactly `YYYY-MM-DDThh:mm:ss±hh:mm`; padding, separators and
    /// surrounding whitespace must all match the rendered form.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let layout_error = |detail: String| {
            FieldError::Format(format!(
                "'{raw}' does not match YYYY-MM-DDThh:mm:ss±hh:mm: {detail}"
            ))
        };
        let parsed = DateTime::parse_from_str(raw, DATE_TIME_LAYOUT)
            .map_err(|e| layout_error(e.to_string()))?;
        if parsed.format(DATE_TIME_LAYOUT).to_string() != raw {
            return Err(layout_error("not in canonical form".into()));
        }
        Ok(Self(parsed))
    }

    pub fn value(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl From<DateTime<FixedOffset>> for FiscalDateTime {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FiscalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_TIME_LAYOUT))
    }
}

impl FromStr for FiscalDateTime {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FiscalDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FiscalDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// BoundedString
// ---------------------------------------------------------------------------

/// A string of at most `N` characters from the protocol's identifier alphabet
/// (`0-9 a-z A-Z . , : ; / # - _` and space).
///
/// Construction does not check anything; [`BoundedString::validate`] does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundedString<const N: usize>(String);

/// Cash-register identifier (`id_pokl`).
pub type CashRegisterId = BoundedString<20>;

/// Receipt sequence number (`porad_cis`).
pub type ReceiptNumber = BoundedString<25>;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | ':' | ';' | '/' | '#' | '-' | '_' | ' ')
}

impl<const N: usize> BoundedString<N> {
    pub const MAX_LEN: usize = N;

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let s = Self::new(raw);
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if self.0.is_empty() {
            return Err(FieldError::Missing);
        }
        let len = self.0.chars().count();
        if len > N {
            return Err(FieldError::TooLong {
                max: N,
                actual: len,
            });
        }
        match self.0.chars().find(|c| !is_identifier_char(*c)) {
            Some(c) => Err(FieldError::InvalidCharacter(c)),
            None => Ok(()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// TaxId
// ---------------------------------------------------------------------------

/// A national tax identifier, e.g. `CZ00000019`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse and run the structural and checksum rules.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        check_tax_id(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        check_tax_id(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// MessageUuid
// ---------------------------------------------------------------------------

/// Identifier of one submission attempt: an RFC 4122 UUID of version 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageUuid(Uuid);

impl MessageUuid {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let value = Uuid::parse_str(raw)
            .map_err(|e| FieldError::Format(format!("'{raw}' is not a UUID: {e}")))?;
        if value.get_variant() != uuid::Variant::RFC4122 {
            return Err(FieldError::Format("UUID variant must be RFC 4122".into()));
        }
        if !(1..=5).contains(&value.get_version_num()) {
            return Err(FieldError::Format(format!(
                "UUID version {} is not between 1 and 5",
                value.get_version_num()
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MessageUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

// ---------------------------------------------------------------------------
// EstablishmentId
// ---------------------------------------------------------------------------

/// Establishment (premises) number assigned by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EstablishmentId(u32);

impl EstablishmentId {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 999_999;

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn parse(raw: i64) -> Result<Self, FieldError> {
        if !(Self::MIN..=Self::MAX).contains(&raw) {
            return Err(FieldError::OutOfRange(format!(
                "{raw} is not within {}..={}",
                Self::MIN,
                Self::MAX
            )));
        }
        u32::try_from(raw)
            .map(Self)
            .map_err(|e| FieldError::OutOfRange(e.to_string()))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EstablishmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Regime
// ---------------------------------------------------------------------------

/// Sales-reporting regime (`rezim`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Regime {
    #[default]
    Standard,
    Simplified,
}

impl Regime {
    pub fn code(self) -> u8 {
        match self {
            Self::Standard => 0,
            Self::Simplified => 1,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, FieldError> {
        match code {
            0 => Ok(Self::Standard),
            1 => Ok(Self::Simplified),
            other => Err(FieldError::OutOfRange(format!(
                "regime code {other} is not one of 0 (standard), 1 (simplified)"
            ))),
        }
    }
}
