// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input validation and normalization.
//!
//! A pure, synchronous gate in front of the engine: nothing here touches the
//! network. Every failure is a [`FhevmError::Validation`] naming the expected
//! type and the offending value.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{FhevmError, Result};

/// Plaintext type declared by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint128,
    Uint256,
    Address,
    Bytes,
}

impl InputType {
    pub const ALL: [InputType; 9] = [
        InputType::Bool,
        InputType::Uint8,
        InputType::Uint16,
        InputType::Uint32,
        InputType::Uint64,
        InputType::Uint128,
        InputType::Uint256,
        InputType::Address,
        InputType::Bytes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Bool => "bool",
            InputType::Uint8 => "uint8",
            InputType::Uint16 => "uint16",
            InputType::Uint32 => "uint32",
            InputType::Uint64 => "uint64",
            InputType::Uint128 => "uint128",
            InputType::Uint256 => "uint256",
            InputType::Address => "address",
            InputType::Bytes => "bytes",
        }
    }

    /// Bit width of numeric types, `None` otherwise.
    pub fn bits(&self) -> Option<usize> {
        match self {
            InputType::Uint8 => Some(8),
            InputType::Uint16 => Some(16),
            InputType::Uint32 => Some(32),
            InputType::Uint64 => Some(64),
            InputType::Uint128 => Some(128),
            InputType::Uint256 => Some(256),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.bits().is_some()
    }

    /// Largest accepted value (`2^n - 1`) for numeric types.
    pub fn max_value(&self) -> Option<U256> {
        self.bits().map(|bits| {
            if bits == 256 {
                U256::MAX
            } else {
                (U256::from(1u8) << bits) - U256::from(1u8)
            }
        })
    }

    /// Ciphertext tag produced for this input type.
    pub fn encrypted_type(&self) -> EncryptedType {
        match self {
            InputType::Bool => EncryptedType::Ebool,
            InputType::Uint8 => EncryptedType::Euint8,
            InputType::Uint16 => EncryptedType::Euint16,
            InputType::Uint32 => EncryptedType::Euint32,
            InputType::Uint64 => EncryptedType::Euint64,
            InputType::Uint128 => EncryptedType::Euint128,
            InputType::Uint256 => EncryptedType::Euint256,
            InputType::Address => EncryptedType::Eaddress,
            InputType::Bytes => EncryptedType::Ebytes256,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = FhevmError;

    fn from_str(s: &str) -> Result<Self> {
        InputType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| FhevmError::Validation(format!("Unknown input type: {s}")))
    }
}

/// Tag of an on-chain encrypted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptedType {
    Ebool,
    Euint4,
    Euint8,
    Euint16,
    Euint32,
    Euint64,
    Euint128,
    Euint256,
    Eaddress,
    Ebytes64,
    Ebytes128,
    Ebytes256,
}

impl EncryptedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptedType::Ebool => "ebool",
            EncryptedType::Euint4 => "euint4",
            EncryptedType::Euint8 => "euint8",
            EncryptedType::Euint16 => "euint16",
            EncryptedType::Euint32 => "euint32",
            EncryptedType::Euint64 => "euint64",
            EncryptedType::Euint128 => "euint128",
            EncryptedType::Euint256 => "euint256",
            EncryptedType::Eaddress => "eaddress",
            EncryptedType::Ebytes64 => "ebytes64",
            EncryptedType::Ebytes128 => "ebytes128",
            EncryptedType::Ebytes256 => "ebytes256",
        }
    }
}

impl fmt::Display for EncryptedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plaintext value as handed in by the caller, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    Bool(bool),
    Int(i128),
    Uint(U256),
    Float(f64),
    Text(String),
}

impl PlainValue {
    /// Short name of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PlainValue::Bool(_) => "boolean",
            PlainValue::Int(_) | PlainValue::Uint(_) => "integer",
            PlainValue::Float(_) => "float",
            PlainValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for PlainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlainValue::Bool(v) => write!(f, "{v}"),
            PlainValue::Int(v) => write!(f, "{v}"),
            PlainValue::Uint(v) => write!(f, "{v}"),
            PlainValue::Float(v) => write!(f, "{v}"),
            PlainValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for PlainValue {
    fn from(value: bool) -> Self {
        PlainValue::Bool(value)
    }
}

macro_rules! plain_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for PlainValue {
            fn from(value: $ty) -> Self {
                PlainValue::Int(i128::from(value))
            }
        })*
    };
}

plain_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<u128> for PlainValue {
    fn from(value: u128) -> Self {
        PlainValue::Uint(U256::from(value))
    }
}

impl From<U256> for PlainValue {
    fn from(value: U256) -> Self {
        PlainValue::Uint(value)
    }
}

impl From<f64> for PlainValue {
    fn from(value: f64) -> Self {
        PlainValue::Float(value)
    }
}

impl From<&str> for PlainValue {
    fn from(value: &str) -> Self {
        PlainValue::Text(value.to_string())
    }
}

impl From<String> for PlainValue {
    fn from(value: String) -> Self {
        PlainValue::Text(value)
    }
}

/// Signed arbitrary-precision integer (sign + 256-bit magnitude).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerValue {
    pub negative: bool,
    pub magnitude: U256,
}

impl IntegerValue {
    fn new(negative: bool, magnitude: U256) -> Self {
        // -0 is 0
        Self {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }
}

impl fmt::Display for IntegerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "{}", self.magnitude)
        }
    }
}

/// Canonical value handed to the engine after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    Bool(bool),
    Uint(U256),
    /// Lower-case, `0x`-prefixed address
    Address(String),
    /// Lower-case, `0x`-prefixed hex
    Bytes(String),
}

/// Coerce a plaintext value to an integer.
///
/// Booleans are rejected, floats must be integral, strings must be an
/// optional `-` followed by decimal digits or a `0x` hex literal.
pub fn to_integer(value: &PlainValue) -> Result<IntegerValue> {
    match value {
        PlainValue::Bool(_) => Err(FhevmError::Validation(
            "Cannot convert boolean to integer".to_string(),
        )),
        PlainValue::Int(v) => Ok(IntegerValue::new(*v < 0, U256::from(v.unsigned_abs()))),
        PlainValue::Uint(v) => Ok(IntegerValue::new(false, *v)),
        PlainValue::Float(v) => {
            if !v.is_finite() || v.fract() != 0.0 {
                return Err(FhevmError::Validation(
                    "Decimal numbers not supported".to_string(),
                ));
            }
            let magnitude = integral_f64_to_u256(v.abs()).ok_or_else(|| {
                FhevmError::Validation(format!(
                    "Failed to convert value to integer: {v} is out of range"
                ))
            })?;
            Ok(IntegerValue::new(*v < 0.0, magnitude))
        }
        PlainValue::Text(raw) => parse_integer_text(raw),
    }
}

/// Exact value of a finite, non-negative, integral `f64`; `None` from 2^256 up.
fn integral_f64_to_u256(abs: f64) -> Option<U256> {
    if abs == 0.0 {
        return Some(U256::ZERO);
    }
    let bits = abs.to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    // integral non-zero values are never subnormal
    let mantissa = fraction | (1u64 << 52);
    let shift = biased_exp - 1075;

    if shift >= 0 {
        // mantissa occupies 53 bits
        if shift + 53 > 256 {
            return None;
        }
        Some(U256::from(mantissa) << (shift as usize))
    } else {
        Some(U256::from(mantissa >> ((-shift) as u32)))
    }
}

fn parse_integer_text(raw: &str) -> Result<IntegerValue> {
    let invalid = || FhevmError::Validation(format!("Failed to convert value to integer: {raw}"));

    let trimmed = raw.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let magnitude = match strip_hex_prefix(unsigned) {
        Some(digits) => {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            U256::from_str_radix(digits, 16).map_err(|_| invalid())?
        }
        None => {
            if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            U256::from_str_radix(unsigned, 10).map_err(|_| invalid())?
        }
    };

    Ok(IntegerValue::new(negative, magnitude))
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// 40 hex digits, `0x` prefix optional.
pub fn is_valid_address(address: &str) -> bool {
    Address::from_str(address).is_ok()
}

/// Hex digits with an optional `0x` prefix. A bare prefix is the empty byte string.
pub fn is_valid_hex(hex: &str) -> bool {
    match strip_hex_prefix(hex) {
        Some(digits) => digits.bytes().all(|b| b.is_ascii_hexdigit()),
        None => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
    }
}

pub fn validate_contract_address(address: &str) -> Result<()> {
    if !is_valid_address(address) {
        return Err(FhevmError::Validation(format!(
            "Invalid contract address: {address}"
        )));
    }
    Ok(())
}

/// Ciphertext handles are `0x`-prefixed hex with at least one digit.
pub fn validate_handle(handle: &str) -> Result<()> {
    if handle.is_empty() {
        return Err(FhevmError::Validation(
            "Handle must be a non-empty string".to_string(),
        ));
    }
    match strip_hex_prefix(handle) {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit()) => {
            Ok(())
        }
        _ => Err(FhevmError::Validation(format!(
            "Invalid handle format: {handle}"
        ))),
    }
}

/// Check a plaintext value against its declared type.
pub fn validate_encryption_input(value: &PlainValue, ty: InputType) -> Result<()> {
    match ty {
        InputType::Bool => match value {
            PlainValue::Bool(_) => Ok(()),
            other => Err(FhevmError::Validation(format!(
                "Expected boolean for type 'bool', got {}",
                other.type_name()
            ))),
        },
        InputType::Address => {
            let text = expect_text(value, ty)?;
            if !is_valid_address(text) {
                return Err(FhevmError::Validation(format!(
                    "Invalid Ethereum address: {text}"
                )));
            }
            Ok(())
        }
        InputType::Bytes => {
            let text = expect_text(value, ty)?;
            if !is_valid_hex(text) {
                return Err(FhevmError::Validation(format!(
                    "Invalid hex string for bytes: {text}"
                )));
            }
            Ok(())
        }
        _ => validate_numeric(value, ty).map(|_| ()),
    }
}

fn expect_text(value: &PlainValue, ty: InputType) -> Result<&str> {
    match value {
        PlainValue::Text(text) => Ok(text),
        other => Err(FhevmError::Validation(format!(
            "Expected string for type '{ty}', got {}",
            other.type_name()
        ))),
    }
}

fn validate_numeric(value: &PlainValue, ty: InputType) -> Result<U256> {
    if matches!(value, PlainValue::Bool(_)) {
        return Err(FhevmError::Validation(format!(
            "Expected numeric value for type '{ty}', got boolean"
        )));
    }

    let max = ty
        .max_value()
        .ok_or_else(|| FhevmError::Validation(format!("Unknown numeric type: {ty}")))?;

    let integer = to_integer(value)?;
    if integer.negative {
        return Err(FhevmError::Validation(format!(
            "Value must be non-negative for type '{ty}'"
        )));
    }
    if integer.magnitude > max {
        return Err(FhevmError::Validation(format!(
            "Value {integer} exceeds maximum for type '{ty}' (max: {max})"
        )));
    }
    Ok(integer.magnitude)
}

/// Validate and canonicalize a plaintext value.
///
/// Addresses and bytes become lower-case and `0x`-prefixed; numeric inputs
/// become a 256-bit unsigned integer already checked against the type bound.
pub fn normalize_value(value: &PlainValue, ty: InputType) -> Result<CanonicalValue> {
    validate_encryption_input(value, ty)?;

    match (ty, value) {
        (InputType::Bool, PlainValue::Bool(b)) => Ok(CanonicalValue::Bool(*b)),
        (InputType::Address, PlainValue::Text(text)) => {
            Ok(CanonicalValue::Address(canonical_hex(text)))
        }
        (InputType::Bytes, PlainValue::Text(text)) => Ok(CanonicalValue::Bytes(canonical_hex(text))),
        _ => validate_numeric(value, ty).map(CanonicalValue::Uint),
    }
}

fn canonical_hex(text: &str) -> String {
    let digits = strip_hex_prefix(text).unwrap_or(text);
    format!("0x{}", digits.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x1234567890123456789012345678901234567890";

    #[test]
    fn bool_inputs() {
        assert!(validate_encryption_input(&true.into(), InputType::Bool).is_ok());
        assert!(validate_encryption_input(&false.into(), InputType::Bool).is_ok());
        let err = validate_encryption_input(&1.into(), InputType::Bool).unwrap_err();
        assert!(matches!(err, FhevmError::Validation(_)));
        assert!(err.to_string().contains("bool"));
    }

    #[test]
    fn numeric_bounds_hold_for_every_width() {
        for ty in InputType::ALL.into_iter().filter(InputType::is_numeric) {
            let max = ty.max_value().unwrap();
            assert!(validate_encryption_input(&U256::ZERO.into(), ty).is_ok());
            assert!(validate_encryption_input(&max.into(), ty).is_ok(), "{ty} max");
            assert!(validate_encryption_input(&(-1).into(), ty).is_err(), "{ty} negative");

            if ty != InputType::Uint256 {
                let over = max + U256::from(1u8);
                let err = validate_encryption_input(&over.into(), ty).unwrap_err();
                assert!(err.to_string().contains("exceeds maximum"), "{ty}: {err}");
            }
        }
    }

    #[test]
    fn floats_convert_exactly_at_wide_boundaries() {
        let two_128 = U256::from(1u8) << 128;
        let float_128 = PlainValue::Float(2f64.powi(128));

        let err = validate_encryption_input(&float_128, InputType::Uint128).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"), "{err}");
        assert_eq!(
            normalize_value(&float_128, InputType::Uint256).unwrap(),
            CanonicalValue::Uint(two_128)
        );

        let float_255 = PlainValue::Float(2f64.powi(255));
        assert_eq!(
            normalize_value(&float_255, InputType::Uint256).unwrap(),
            CanonicalValue::Uint(U256::from(1u8) << 255)
        );

        let big = normalize_value(&PlainValue::Float(1e40), InputType::Uint256).unwrap();
        assert!(matches!(big, CanonicalValue::Uint(v) if v > two_128));

        assert!(validate_encryption_input(&PlainValue::Float(2f64.powi(256)), InputType::Uint256).is_err());
        assert_eq!(
            normalize_value(&PlainValue::Float(255.0), InputType::Uint8).unwrap(),
            CanonicalValue::Uint(U256::from(255u8))
        );
    }

    #[test]
    fn uint256_overflow_in_text_is_rejected() {
        let too_big = format!("{}0", U256::MAX);
        let err = validate_encryption_input(&too_big.into(), InputType::Uint256).unwrap_err();
        assert!(matches!(err, FhevmError::Validation(_)));
    }

    #[test]
    fn small_widths_match_known_limits() {
        assert!(validate_encryption_input(&255.into(), InputType::Uint8).is_ok());
        assert!(validate_encryption_input(&256.into(), InputType::Uint8).is_err());
        assert!(validate_encryption_input(&65535.into(), InputType::Uint16).is_ok());
        assert!(validate_encryption_input(&65536.into(), InputType::Uint16).is_err());
        assert!(validate_encryption_input(&4_294_967_295u64.into(), InputType::Uint32).is_ok());
        assert!(validate_encryption_input(&4_294_967_296u64.into(), InputType::Uint32).is_err());
    }

    #[test]
    fn booleans_are_not_numbers() {
        let err = validate_encryption_input(&true.into(), InputType::Uint8).unwrap_err();
        assert!(err.to_string().contains("got boolean"));
        assert!(validate_encryption_input(&false.into(), InputType::Uint32).is_err());
    }

    #[test]
    fn address_inputs() {
        assert!(validate_encryption_input(&ADDR.into(), InputType::Address).is_ok());
        assert!(validate_encryption_input(&ADDR[2..].into(), InputType::Address).is_ok());
        assert!(validate_encryption_input(&"invalid".into(), InputType::Address).is_err());
        assert!(validate_encryption_input(&123.into(), InputType::Address).is_err());
    }

    #[test]
    fn bytes_inputs() {
        assert!(validate_encryption_input(&"0x1234".into(), InputType::Bytes).is_ok());
        assert!(validate_encryption_input(&"invalid".into(), InputType::Bytes).is_err());
        assert!(validate_encryption_input(&123.into(), InputType::Bytes).is_err());
    }

    #[test]
    fn addresses_normalize_to_lower_case_with_prefix() {
        let mixed = "0xABCDEFabcdef1234567890123456789012345678";
        for input in [mixed, &mixed[2..]] {
            let normalized = normalize_value(&input.into(), InputType::Address).unwrap();
            assert_eq!(
                normalized,
                CanonicalValue::Address("0xabcdefabcdef1234567890123456789012345678".into())
            );
        }
        assert!(normalize_value(&"0x123".into(), InputType::Address).is_err());
    }

    #[test]
    fn bytes_normalize_like_addresses() {
        assert_eq!(
            normalize_value(&"DEADbeef".into(), InputType::Bytes).unwrap(),
            CanonicalValue::Bytes("0xdeadbeef".into())
        );
    }

    #[test]
    fn numeric_normalization_yields_u256() {
        assert_eq!(
            normalize_value(&"0xff".into(), InputType::Uint8).unwrap(),
            CanonicalValue::Uint(U256::from(255u16))
        );
        assert_eq!(
            normalize_value(&42.0.into(), InputType::Uint32).unwrap(),
            CanonicalValue::Uint(U256::from(42u8))
        );
    }

    #[test]
    fn contract_address_shape() {
        assert!(validate_contract_address(ADDR).is_ok());
        assert!(validate_contract_address("0xabcdefABCDEF1234567890123456789012345678").is_ok());
        assert!(validate_contract_address("invalid").is_err());
        assert!(validate_contract_address("0x123").is_err());
        assert!(validate_contract_address("").is_err());
    }

    #[test]
    fn handle_shape() {
        assert!(validate_handle("0x1234").is_ok());
        assert!(validate_handle("0xabcdef").is_ok());
        assert!(validate_handle("invalid").is_err());
        assert!(validate_handle("123").is_err());
        assert!(validate_handle("0x").is_err());
        let err = validate_handle("").unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(to_integer(&0.into()).unwrap().magnitude, U256::ZERO);
        assert_eq!(to_integer(&999_999.into()).unwrap().magnitude, U256::from(999_999u32));
        assert_eq!(
            to_integer(&"999999999999999999".into()).unwrap().magnitude,
            U256::from(999_999_999_999_999_999u64)
        );
        let negative = to_integer(&"-5".into()).unwrap();
        assert!(negative.negative);
        assert_eq!(negative.to_string(), "-5");
        assert!(!to_integer(&"-0".into()).unwrap().negative);
    }

    #[test]
    fn integer_coercion_rejects_decimals_and_garbage() {
        let err = to_integer(&1.5.into()).unwrap_err();
        assert!(err.to_string().contains("Decimal numbers not supported"));
        assert!(to_integer(&2.5.into()).is_err());
        assert!(to_integer(&f64::NAN.into()).is_err());
        assert!(to_integer(&"invalid".into()).is_err());
        assert!(to_integer(&"12.34".into()).is_err());
        assert!(to_integer(&"".into()).is_err());
    }

    #[test]
    fn encrypted_type_mapping() {
        assert_eq!(InputType::Bool.encrypted_type(), EncryptedType::Ebool);
        assert_eq!(InputType::Uint64.encrypted_type(), EncryptedType::Euint64);
        assert_eq!(InputType::Address.encrypted_type(), EncryptedType::Eaddress);
        assert_eq!(InputType::Bytes.encrypted_type(), EncryptedType::Ebytes256);
        assert_eq!("uint128".parse::<InputType>().unwrap(), InputType::Uint128);
        assert!("uint7".parse::<InputType>().is_err());
    }
}
