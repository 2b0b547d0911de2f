//! # Amount Codec
//!
//! Converts user-entered decimal strings into the contract's base unit and
//! renders base units back for display.
//!
//! All arithmetic is exact integer arithmetic on `U256`; a decimal string is
//! split into whole and fractional digit runs and each run is scaled
//! separately, so `"0.1"` becomes exactly `100000000000000000`.

use primitive_types::U256;
use shared_types::Amount;

use crate::error::ValidationError;

/// Decimals of the staking token's display unit.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest scale whose power of ten still fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Decimals shown by balance widgets.
pub const DEFAULT_DISPLAY_PRECISION: usize = 5;

/// Decimal <-> base unit converter for one token scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountCodec {
    decimals: u8,
}

impl Default for AmountCodec {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl AmountCodec {
    /// Codec for a token with `decimals` fractional digits.
    ///
    /// Returns `None` when `10^decimals` would not fit in 256 bits.
    #[must_use]
    pub fn new(decimals: u8) -> Option<Self> {
        (decimals <= MAX_DECIMALS).then_some(Self { decimals })
    }

    /// Fractional digits of the display unit.
    #[must_use]
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    fn unit(&self) -> U256 {
        U256::exp10(usize::from(self.decimals))
    }

    /// Parse a decimal string into base units.
    ///
    /// Accepts `123`, `123.`, `123.45`, `.45` with an optional leading `-`.
    /// Surrounding whitespace is ignored. Exponents, `+` signs and digit
    /// separators are rejected as `NotANumber`. Fractional digits beyond the
    /// token's decimals are tolerated only when they are zeros.
    ///
    /// # Errors
    /// - `EmptyInput` for a blank string
    /// - `NotANumber` for anything outside the grammar above
    /// - `TooManyDecimals` when significant digits exceed the scale
    /// - `Overflow` when the scaled value exceeds `U256::MAX`
    /// - `Negative` for a value below zero (`-0` is zero)
    pub fn encode(&self, input: &str) -> Result<Amount, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, fraction) = match body.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (body, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(ValidationError::NotANumber);
        }
        if !is_digits(whole) || !is_digits(fraction) {
            return Err(ValidationError::NotANumber);
        }

        let scale = usize::from(self.decimals);
        let significant = fraction.trim_end_matches('0');
        if significant.len() > scale {
            return Err(ValidationError::TooManyDecimals { max: self.decimals });
        }

        let whole_units = parse_digits(whole)?
            .checked_mul(self.unit())
            .ok_or(ValidationError::Overflow)?;
        let fraction_units = parse_digits(significant)?
            .checked_mul(U256::exp10(scale - significant.len()))
            .ok_or(ValidationError::Overflow)?;
        let units = whole_units
            .checked_add(fraction_units)
            .ok_or(ValidationError::Overflow)?;

        if negative && !units.is_zero() {
            return Err(ValidationError::Negative);
        }

        Ok(Amount::from_base_units(units))
    }

    /// Render base units exactly, in the `formatEther` style.
    ///
    /// Trailing fractional zeros are dropped but at least one fractional
    /// digit is kept: `110.0`, `0.5`, `0.000000000000000001`.
    #[must_use]
    pub fn decode(&self, amount: Amount) -> String {
        let (whole, fraction) = self.split(amount);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            format!("{whole}.0")
        } else {
            format!("{whole}.{fraction}")
        }
    }

    /// Render with exactly `places` fractional digits, truncating.
    ///
    /// Truncation never shows a user more than they actually hold.
    #[must_use]
    pub fn format_fixed(&self, amount: Amount, places: usize) -> String {
        let (whole, mut fraction) = self.split(amount);
        if places == 0 {
            return whole;
        }
        if fraction.len() < places {
            fraction.push_str(&"0".repeat(places - fraction.len()));
        }
        fraction.truncate(places);
        format!("{whole}.{fraction}")
    }

    /// Whole part and zero-padded fractional digits.
    fn split(&self, amount: Amount) -> (String, String) {
        let units = amount.base_units();
        let unit = self.unit();
        let whole = units / unit;
        let remainder = units % unit;

        let scale = usize::from(self.decimals);
        let fraction = if scale == 0 {
            String::new()
        } else {
            format!("{:0>width$}", remainder.to_string(), width = scale)
        };
        (whole.to_string(), fraction)
    }
}

/// Parse with the default 18-decimal codec.
pub fn encode(input: &str) -> Result<Amount, ValidationError> {
    AmountCodec::default().encode(input)
}

/// Render with the default 18-decimal codec.
#[must_use]
pub fn decode(amount: Amount) -> String {
    AmountCodec::default().decode(amount)
}

/// Fixed-precision rendering with the default 18-decimal codec.
#[must_use]
pub fn format_fixed(amount: Amount, places: usize) -> String {
    AmountCodec::default().format_fixed(amount, places)
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_digits(digits: &str) -> Result<U256, ValidationError> {
    digits.bytes().try_fold(U256::zero(), |acc, b| {
        acc.checked_mul(U256::from(10u8))
            .and_then(|v| v.checked_add(U256::from(b - b'0')))
            .ok_or(ValidationError::Overflow)
    })
}
