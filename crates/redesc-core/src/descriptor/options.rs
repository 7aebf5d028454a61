//! Options messages that survive re-encoding untouched.
//!
//! `prost_types` option messages drop every field they do not know about,
//! which loses custom options and anything added by newer versions of
//! `descriptor.proto`. [`Options`] instead stores the exact encoded form and
//! only decodes on demand into the typed `prost_types` view.

use bytes::{Buf, BufMut};
use prost::encoding::{decode_key, decode_varint, encode_key, encode_varint, DecodeContext, WireType};
use prost::{DecodeError, Message};
use std::fmt;
use std::marker::PhantomData;

/// Nesting limit for group-encoded fields inside an options message
const GROUP_DEPTH_LIMIT: u32 = 100;

/// An options message held in its encoded form.
///
/// `T` is the typed view (e.g. [`prost_types::FieldOptions`]); it only
/// matters when calling [`Options::value`].
pub struct Options<T> {
    encoded: Vec<u8>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Options<T> {
    /// Wraps an already encoded options message
    pub fn from_encoded(encoded: Vec<u8>) -> Self {
        Self {
            encoded,
            _marker: PhantomData,
        }
    }

    /// The exact encoded bytes, unknown fields included
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl<T: Message + Default> Options<T> {
    /// Decodes the typed view. Fields unknown to `T` are skipped.
    pub fn value(&self) -> Result<T, DecodeError> {
        T::decode(self.encoded.as_slice())
    }
}

impl<T> Default for Options<T> {
    fn default() -> Self {
        Self::from_encoded(Vec::new())
    }
}

impl<T> Clone for Options<T> {
    fn clone(&self) -> Self {
        Self::from_encoded(self.encoded.clone())
    }
}

impl<T> PartialEq for Options<T> {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl<T> Eq for Options<T> {}

impl<T> fmt::Debug for Options<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("encoded_len", &self.encoded.len())
            .finish()
    }
}

impl<T> Message for Options<T> {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.encoded);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        _ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        encode_key(tag, wire_type, &mut self.encoded);
        copy_value(tag, wire_type, buf, &mut self.encoded, GROUP_DEPTH_LIMIT)
    }

    fn encoded_len(&self) -> usize {
        self.encoded.len()
    }

    fn clear(&mut self) {
        self.encoded.clear();
    }
}

/// Copies the value of one field (its key already consumed) from `buf` to `out`
fn copy_value(
    tag: u32,
    wire_type: WireType,
    buf: &mut impl Buf,
    out: &mut Vec<u8>,
    depth: u32,
) -> Result<(), DecodeError> {
    match wire_type {
        WireType::Varint => encode_varint(decode_varint(buf)?, out),
        WireType::ThirtyTwoBit => copy_exact(buf, 4, out)?,
        WireType::SixtyFourBit => copy_exact(buf, 8, out)?,
        WireType::LengthDelimited => {
            let len = decode_varint(buf)?;
            encode_varint(len, out);
            let len = usize::try_from(len)
                .map_err(|_| DecodeError::new("length-delimited field too large"))?;
            copy_exact(buf, len, out)?;
        }
        WireType::StartGroup => {
            let depth = depth
                .checked_sub(1)
                .ok_or_else(|| DecodeError::new("recursion limit reached"))?;
            loop {
                let (inner_tag, inner_wire_type) = decode_key(buf)?;
                encode_key(inner_tag, inner_wire_type, out);
                if inner_wire_type == WireType::EndGroup {
                    if inner_tag != tag {
                        return Err(DecodeError::new("unexpected end group tag"));
                    }
                    break;
                }
                copy_value(inner_tag, inner_wire_type, buf, out, depth)?;
            }
        }
        WireType::EndGroup => return Err(DecodeError::new("unexpected end group tag")),
    }
    Ok(())
}

fn copy_exact(buf: &mut impl Buf, len: usize, out: &mut Vec<u8>) -> Result<(), DecodeError> {
    if buf.remaining() < len {
        return Err(DecodeError::new("buffer underflow"));
    }
    let start = out.len();
    out.resize(start + len, 0);
    buf.copy_to_slice(&mut out[start..]);
    Ok(())
}
