//! Canonical text for names and default values.
//!
//! Numbers follow C `printf`: integers in plain decimal, `float` as `%.9g` and
//! `double` as `%.17g`, which is enough digits to parse back to the same bits.
//! Every returned string is allocated through the arena with its exact length.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::registry::{DefaultValue, EnumDef, FieldDef, Named};
use std::fmt::{self, Write};

/// Significant digits that round-trip an `f32`
const FLOAT_DIGITS: usize = 9;
/// Significant digits that round-trip an `f64`
const DOUBLE_DIGITS: usize = 17;

/// Copies `s` into the arena unchanged
pub fn dup(arena: &Arena, s: &str) -> Result<String> {
    arena.alloc_str(s)
}

/// Turns a full name into a reference: `pkg.Foo` becomes `.pkg.Foo`
pub fn qualified(arena: &Arena, full_name: &str) -> Result<String> {
    let mut out = arena.alloc_string(full_name.len() + 1)?;
    out.push('.');
    out.push_str(full_name);
    Ok(out)
}

/// Renders the explicit default of `field`, or `None` when it has none.
///
/// Enum defaults render as the name of the value with the default number;
/// a number that names no value is an error.
pub fn field_default<F: FieldDef>(arena: &Arena, field: &F) -> Result<Option<String>> {
    let Some(default) = field.explicit_default() else {
        return Ok(None);
    };
    let text = match default {
        DefaultValue::Enum(number) => {
            enum_default(arena, field.enum_type().as_ref(), field.full_name(), number)?
        }
        scalar => scalar_default(arena, &scalar)?,
    };
    Ok(Some(text))
}

/// Renders an enum default as the name of its value
pub fn enum_default<E: EnumDef>(
    arena: &Arena,
    enum_type: Option<&E>,
    field_name: &str,
    number: i32,
) -> Result<String> {
    let value = enum_type
        .and_then(|e| e.value_by_number(number))
        .ok_or_else(|| Error::unknown_enum_default(field_name, number))?;
    arena.alloc_str(value.name())
}

/// Renders a non-enum default; floats as `%.9g` would, doubles as `%.17g`
pub fn scalar_default(arena: &Arena, value: &DefaultValue<'_>) -> Result<String> {
    let mut scratch = Scratch::new();
    let written = match value {
        DefaultValue::Bool(v) => return arena.alloc_str(if *v { "true" } else { "false" }),
        DefaultValue::String(v) => return dup(arena, v),
        DefaultValue::Bytes(v) => return escape_bytes(arena, v),
        DefaultValue::Int32(v) => write!(scratch, "{}", v),
        DefaultValue::Int64(v) => write!(scratch, "{}", v),
        DefaultValue::UInt32(v) => write!(scratch, "{}", v),
        DefaultValue::UInt64(v) => write!(scratch, "{}", v),
        DefaultValue::Float(v) => format_g(&mut scratch, f64::from(*v), FLOAT_DIGITS),
        DefaultValue::Double(v) => format_g(&mut scratch, *v, DOUBLE_DIGITS),
        DefaultValue::Enum(v) => write!(scratch, "{}", v),
    };
    written.map_err(|_| Error::AllocationFailure)?;
    arena.alloc_str(scratch.as_str())
}

fn escaped_len(byte: u8) -> usize {
    match byte {
        b'\n' | b'\r' | b'\t' | b'\\' | b'\'' | b'"' => 2,
        0x20..=0x7e => 1,
        _ => 4,
    }
}

/// C-escapes a `bytes` default. Non-printable bytes become three-digit octal
/// escapes, so `\x00\x7fA` renders as `\000\177A`.
pub fn escape_bytes(arena: &Arena, bytes: &[u8]) -> Result<String> {
    let len = bytes.iter().map(|&b| escaped_len(b)).sum();
    let mut out = arena.alloc_string(len)?;
    for &byte in bytes {
        match byte {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => {
                out.push('\\');
                out.push(char::from(b'0' + (byte >> 6)));
                out.push(char::from(b'0' + ((byte >> 3) & 7)));
                out.push(char::from(b'0' + (byte & 7)));
            }
        }
    }
    debug_assert_eq!(out.len(), len);
    Ok(out)
}

/// `%.<precision>g`, including C's spelling of the special values
fn format_g(out: &mut Scratch, value: f64, precision: usize) -> fmt::Result {
    if value.is_nan() {
        return out.write_str("nan");
    }
    if value.is_infinite() {
        return out.write_str(if value > 0.0 { "inf" } else { "-inf" });
    }

    // The exponent of the value rounded to `precision` digits picks the style.
    let mut sci = Scratch::new();
    write!(sci, "{:.*e}", precision - 1, value)?;
    let (mantissa, exp) = sci.as_str().split_once('e').ok_or(fmt::Error)?;
    let exp: i32 = exp.parse().map_err(|_| fmt::Error)?;

    if exp < -4 || exp >= precision as i32 {
        out.write_str(trim_fraction(mantissa))?;
        let sign = if exp < 0 { '-' } else { '+' };
        write!(out, "e{}{:02}", sign, exp.unsigned_abs())
    } else {
        let decimals = (precision as i32 - 1 - exp) as usize;
        let mut fixed = Scratch::new();
        write!(fixed, "{:.*}", decimals, value)?;
        out.write_str(trim_fraction(fixed.as_str()))
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Fixed-size formatting buffer; numbers never need more than a few dozen bytes
struct Scratch {
    buf: [u8; 64],
    len: usize,
}

impl Scratch {
    fn new() -> Self {
        Self {
            buf: [0; 64],
            len: 0,
        }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }
}

impl Write for Scratch {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        let dest = self.buf.get_mut(self.len..end).ok_or(fmt::Error)?;
        dest.copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
