//! Type marshaler
//!
//! Converts between a caller-visible buffer of a given size and a field's
//! fixed stored width, for each [`ParamKind`]. Three paths:
//!
//! - [`from_text`]: parse a source literal (defaults, console input) into the
//!   stored representation
//! - [`read`]: decode the stored bytes into a caller buffer, widening scalars
//!   to the caller's requested width
//! - [`write`]: encode a caller buffer into the stored width, narrowing as
//!   needed
//!
//! Scalar widening is exact. A stored 4-byte signed field sign-extends
//! through i32 before reaching 64 bits, unsigned fields zero-extend, and
//! floats convert through f64. Strings and arrays truncate silently to the
//! smaller of the two sizes. Scalar width mismatches are hard errors that
//! leave the destination untouched. All stored scalars are little-endian.

use super::table::ParamKind;

/// Marshaling failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MarshalError {
    /// Caller buffer width not supported for this kind
    UnsupportedWidth,
}

/// Parse an integer literal with C `strtoll(str, NULL, 0)` semantics
///
/// Skips leading whitespace, accepts an optional sign, then auto-detects the
/// base: `0x`/`0X` hex, leading `0` octal, otherwise decimal. Parsing stops
/// at the first invalid digit; no digits at all yields 0.
pub(crate) fn parse_int_auto(s: &str) -> i64 {
    let bytes = s.trim_start().as_bytes();
    let (neg, rest) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let (base, digits) = if rest.len() >= 2 && rest[0] == b'0' && (rest[1] | 0x20) == b'x' {
        (16u64, &rest[2..])
    } else if rest.first() == Some(&b'0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };

    let mut value = 0u64;
    for &b in digits {
        let digit = match hex_digit(b) {
            Some(d) if (d as u64) < base => d as u64,
            _ => break,
        };
        value = value.wrapping_mul(base).wrapping_add(digit);
    }

    if neg {
        (value as i64).wrapping_neg()
    } else {
        value as i64
    }
}

/// Parse a hexadecimal literal (no prefix expected, sign accepted)
pub(crate) fn parse_hex(s: &str) -> u64 {
    let bytes = s.trim_start().as_bytes();
    let (neg, rest) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let rest = if rest.len() >= 2 && rest[0] == b'0' && (rest[1] | 0x20) == b'x' {
        &rest[2..]
    } else {
        rest
    };

    let mut value = 0u64;
    for &b in rest {
        match hex_digit(b) {
            Some(d) => value = value.wrapping_mul(16).wrapping_add(d as u64),
            None => break,
        }
    }

    if neg {
        value.wrapping_neg()
    } else {
        value
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parse hex byte pairs separated by any single delimiter into `dst`
///
/// "AB CD EF", "AB-CD-EF" and "AB:CD:EF" all decode the same way. Excess
/// tokens beyond the field size are dropped; missing tokens leave the
/// remaining bytes at zero.
fn parse_hex_bytes(dst: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    let mut pos = 0;
    for slot in dst.iter_mut() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut value = 0u32;
        while pos < bytes.len() {
            match hex_digit(bytes[pos]) {
                Some(d) => {
                    value = value.wrapping_mul(16).wrapping_add(d as u32);
                    pos += 1;
                }
                None => break,
            }
        }
        *slot = value as u8;
        if pos >= bytes.len() {
            break;
        }
        pos += 1; // skip one delimiter
    }
}

/// Parse a source literal into the stored representation
///
/// The field is zeroed first, so short strings, short arrays, and narrow
/// literals leave deterministic padding.
pub fn from_text(kind: ParamKind, field: &mut [u8], text: &str) {
    field.fill(0);
    match kind {
        ParamKind::Str => {
            let max = field.len() - 1;
            let len = text.len().min(max);
            field[..len].copy_from_slice(&text.as_bytes()[..len]);
        }
        ParamKind::Array => parse_hex_bytes(field, text),
        ParamKind::Int => {
            let v = parse_int_auto(text);
            store_scalar(field, v as u64);
        }
        ParamKind::Hex => {
            let v = parse_hex(text);
            store_scalar(field, v);
        }
        ParamKind::Float => {
            let v: f64 = text.trim().parse().unwrap_or(0.0);
            if field.len() == 4 {
                field.copy_from_slice(&(v as f32).to_le_bytes());
            } else {
                field.copy_from_slice(&v.to_le_bytes());
            }
        }
    }
}

/// Decode stored bytes into a caller buffer
///
/// # Errors
///
/// `UnsupportedWidth` if the caller width is illegal for the kind
/// (Int/Hex: 1/2/4/8, Float: 4/8, Str: at least 1 byte for the NUL). The
/// output buffer is untouched on error.
pub fn read(kind: ParamKind, field: &[u8], out: &mut [u8]) -> Result<(), MarshalError> {
    match kind {
        ParamKind::Str => {
            if out.is_empty() {
                return Err(MarshalError::UnsupportedWidth);
            }
            let stored_len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
            let len = stored_len.min(out.len() - 1);
            out[..len].copy_from_slice(&field[..len]);
            out[len] = 0;
        }
        ParamKind::Array => {
            let len = field.len().min(out.len());
            out[..len].copy_from_slice(&field[..len]);
        }
        ParamKind::Int => {
            check_scalar_width(out.len())?;
            let v = load_signed(field) as u64;
            out.copy_from_slice(&v.to_le_bytes()[..out.len()]);
        }
        ParamKind::Hex => {
            check_scalar_width(out.len())?;
            let v = load_unsigned(field);
            out.copy_from_slice(&v.to_le_bytes()[..out.len()]);
        }
        ParamKind::Float => {
            check_float_width(out.len())?;
            let v = load_float(field);
            if out.len() == 4 {
                out.copy_from_slice(&(v as f32).to_le_bytes());
            } else {
                out.copy_from_slice(&v.to_le_bytes());
            }
        }
    }
    Ok(())
}

/// Encode a caller buffer into the stored width
///
/// # Errors
///
/// `UnsupportedWidth` as for [`read`]. The field is untouched on error.
pub fn write(kind: ParamKind, field: &mut [u8], input: &[u8]) -> Result<(), MarshalError> {
    match kind {
        ParamKind::Str => {
            if field.is_empty() {
                return Err(MarshalError::UnsupportedWidth);
            }
            // Input ends at the first NUL, like a C string
            let text_len = input.iter().position(|&b| b == 0).unwrap_or(input.len());
            let len = text_len.min(field.len() - 1);
            field[..len].copy_from_slice(&input[..len]);
            field[len] = 0;
        }
        ParamKind::Array => {
            let len = input.len().min(field.len());
            field[..len].copy_from_slice(&input[..len]);
        }
        ParamKind::Int => {
            let v = match input.len() {
                1 => input[0] as i8 as i64,
                2 => i16::from_le_bytes([input[0], input[1]]) as i64,
                4 => i32::from_le_bytes([input[0], input[1], input[2], input[3]]) as i64,
                8 => i64::from_le_bytes([
                    input[0], input[1], input[2], input[3], input[4], input[5], input[6], input[7],
                ]),
                _ => return Err(MarshalError::UnsupportedWidth),
            };
            store_scalar(field, v as u64);
        }
        ParamKind::Hex => {
            let v = match input.len() {
                1 => input[0] as u64,
                2 => u16::from_le_bytes([input[0], input[1]]) as u64,
                4 => u32::from_le_bytes([input[0], input[1], input[2], input[3]]) as u64,
                8 => u64::from_le_bytes([
                    input[0], input[1], input[2], input[3], input[4], input[5], input[6], input[7],
                ]),
                _ => return Err(MarshalError::UnsupportedWidth),
            };
            store_scalar(field, v);
        }
        ParamKind::Float => {
            let v = match input.len() {
                4 => f32::from_le_bytes([input[0], input[1], input[2], input[3]]) as f64,
                8 => f64::from_le_bytes([
                    input[0], input[1], input[2], input[3], input[4], input[5], input[6], input[7],
                ]),
                _ => return Err(MarshalError::UnsupportedWidth),
            };
            if field.len() == 4 {
                field.copy_from_slice(&(v as f32).to_le_bytes());
            } else {
                field.copy_from_slice(&v.to_le_bytes());
            }
        }
    }
    Ok(())
}

fn check_scalar_width(len: usize) -> Result<(), MarshalError> {
    match len {
        1 | 2 | 4 | 8 => Ok(()),
        _ => Err(MarshalError::UnsupportedWidth),
    }
}

fn check_float_width(len: usize) -> Result<(), MarshalError> {
    match len {
        4 | 8 => Ok(()),
        _ => Err(MarshalError::UnsupportedWidth),
    }
}

/// Store the low `field.len()` bytes of a 64-bit value, little-endian
fn store_scalar(field: &mut [u8], value: u64) {
    field.copy_from_slice(&value.to_le_bytes()[..field.len()]);
}

/// Sign-extend a stored 4- or 8-byte signed field to i64
///
/// The 4-byte case goes through i32 so the sign propagates.
fn load_signed(field: &[u8]) -> i64 {
    if field.len() == 4 {
        i32::from_le_bytes([field[0], field[1], field[2], field[3]]) as i64
    } else {
        i64::from_le_bytes([
            field[0], field[1], field[2], field[3], field[4], field[5], field[6], field[7],
        ])
    }
}

/// Zero-extend a stored 4- or 8-byte unsigned field to u64
fn load_unsigned(field: &[u8]) -> u64 {
    if field.len() == 4 {
        u32::from_le_bytes([field[0], field[1], field[2], field[3]]) as u64
    } else {
        u64::from_le_bytes([
            field[0], field[1], field[2], field[3], field[4], field[5], field[6], field[7],
        ])
    }
}

/// Widen a stored 4- or 8-byte float field to f64
fn load_float(field: &[u8]) -> f64 {
    if field.len() == 4 {
        f32::from_le_bytes([field[0], field[1], field[2], field[3]]) as f64
    } else {
        f64::from_le_bytes([
            field[0], field[1], field[2], field[3], field[4], field[5], field[6], field[7],
        ])
    }
}
