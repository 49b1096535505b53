// SPDX-License-Identifier: MPL-2.0

//! The per-type codec contract (`Encodable` in the design doc) and the leaf
//! type implementations of it.
//!
//! Grounded directly on this codebase's `BinaryEncodable`/`BinaryDecodable`
//! trait pair in `encoding.rs`: same method shapes (`byte_len`, generic
//! `encode<S: Write + ?Sized>`/`decode<S: Read + ?Sized>`), same
//! `encode_to_vec` convenience method.
//!
//! Design decision (see `DESIGN.md`): every fixed-width numeric leaf type
//! (`bool` aside) is encoded through the cross-kind varint codec
//! ([`crate::varint`]) rather than through a second, always-fixed-width
//! encoding. The distilled spec describes both a fixed-width leaf class and
//! a cross-kind varint class; since every numeric kind must support
//! cross-kind decode conversion (§8's "Cross-kind varint" testable
//! property) regardless, giving every numeric leaf type the varint
//! representation directly satisfies that property without duplicating
//! conversion logic between two wire forms.

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::{
    context::Context,
    varint::{self, EncodedNumber},
    Error,
};

/// Result alias local to this module, re-exported at the crate root.
pub type EncodingResult<T> = Result<T, Error>;

/// A codec for one target type. Encodables may be stateful and are never
/// assumed `Sync` — see [`crate::concurrent::Concurrent`] for the pooling
/// wrapper used when one codec tree must serve multiple threads.
pub trait BinaryEncodable {
    /// Upper bound, in bytes, on what `encode` will write. Used to
    /// pre-size buffers; returning an over-estimate is safe, an
    /// under-estimate is not (callers may rely on it for allocation).
    fn byte_len(&self, ctx: &Context<'_>) -> usize;

    /// Write this value's encoding to `stream`.
    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()>;

    /// Convenience for tests and small one-off encodes; prefer reusing a
    /// buffer via [`Self::encode`] on a hot path.
    fn encode_to_vec(&self, ctx: &Context<'_>) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.byte_len(ctx));
        let _ = self.encode(&mut buf, ctx);
        buf
    }
}

/// The decode half of the per-type codec contract.
pub trait BinaryDecodable: Sized {
    /// Read a value of this type from `stream`. Implementations must
    /// respect the ceilings in `ctx.options()` before allocating, and must
    /// take a depth lease ([`Context::options`]`().depth_lock()`) before
    /// recursing into another compound decode.
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self>;
}

impl BinaryEncodable for bool {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        1
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        stream.write_u8(if *self { 1 } else { 0 })?;
        Ok(())
    }
}

impl BinaryDecodable for bool {
    fn decode<S: Read + ?Sized>(stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<Self> {
        Ok(stream.read_u8()? != 0)
    }
}

macro_rules! impl_signed_leaf {
    ($t:ty) => {
        impl BinaryEncodable for $t {
            fn byte_len(&self, _ctx: &Context<'_>) -> usize {
                9
            }

            fn encode<S: Write + ?Sized>(
                &self,
                stream: &mut S,
                _ctx: &Context<'_>,
            ) -> EncodingResult<()> {
                varint::write_varint_cross(stream, EncodedNumber::Signed(*self as i64))
            }
        }

        impl BinaryDecodable for $t {
            fn decode<S: Read + ?Sized>(stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<Self> {
                let n = varint::read_varint_cross(stream)?;
                Ok(n.to_i64() as $t)
            }
        }
    };
}

macro_rules! impl_unsigned_leaf {
    ($t:ty) => {
        impl BinaryEncodable for $t {
            fn byte_len(&self, _ctx: &Context<'_>) -> usize {
                9
            }

            fn encode<S: Write + ?Sized>(
                &self,
                stream: &mut S,
                _ctx: &Context<'_>,
            ) -> EncodingResult<()> {
                varint::write_varint_cross(stream, EncodedNumber::Unsigned(*self as u64))
            }
        }

        impl BinaryDecodable for $t {
            fn decode<S: Read + ?Sized>(stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<Self> {
                let n = varint::read_varint_cross(stream)?;
                Ok(n.to_u64() as $t)
            }
        }
    };
}

impl_signed_leaf!(i8);
impl_signed_leaf!(i16);
impl_signed_leaf!(i32);
impl_signed_leaf!(i64);
impl_unsigned_leaf!(u8);
impl_unsigned_leaf!(u16);
impl_unsigned_leaf!(u32);
impl_unsigned_leaf!(u64);
impl_unsigned_leaf!(usize);

impl BinaryEncodable for f32 {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        5
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        varint::write_varint_cross(stream, EncodedNumber::F32(*self))
    }
}

impl BinaryDecodable for f32 {
    fn decode<S: Read + ?Sized>(stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<Self> {
        Ok(varint::read_varint_cross(stream)?.to_f32())
    }
}

impl BinaryEncodable for f64 {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        9
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        varint::write_varint_cross(stream, EncodedNumber::F64(*self))
    }
}

impl BinaryDecodable for f64 {
    fn decode<S: Read + ?Sized>(stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<Self> {
        Ok(varint::read_varint_cross(stream)?.to_f64())
    }
}

impl BinaryEncodable for String {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        9 + self.len()
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        varint::write_varuint(stream, self.len() as u64)?;
        stream.write_all(self.as_bytes())?;
        Ok(())
    }
}

impl BinaryDecodable for String {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let len = varint::read_varuint(stream)? as usize;
        if len > ctx.options().max_string_length {
            return Err(Error::malformed(format!(
                "string length {len} exceeds ceiling {}",
                ctx.options().max_string_length
            )));
        }
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::malformed(format!("invalid utf-8: {e}")))
    }
}

/// A user-defined type that marshals itself to/from an opaque byte vector
/// (the distilled spec's "opaque binary-marshalable" leaf kind). Wired as
/// `uint32 length` then the raw bytes, matching this codebase's
/// `write_byte_string`-style simple-encodable idiom.
pub trait OpaqueBinary: Sized {
    /// Serialize to an owned byte vector.
    fn serialize(&self) -> Vec<u8>;
    /// Deserialize from an exact-length byte slice.
    fn deserialize(bytes: &[u8]) -> EncodingResult<Self>;
}

/// Newtype wrapper marking a value as encoded via its [`OpaqueBinary`] impl
/// rather than via `BinaryEncodable`/`BinaryDecodable` directly (Rust has no
/// specialization, so the opaque-marshalable leaf kind needs its own
/// wrapper type to pick the right blanket impl unambiguously).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque<T>(pub T);

impl<T: OpaqueBinary> BinaryEncodable for Opaque<T> {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        4 + self.0.serialize().len()
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        let bytes = self.0.serialize();
        stream.write_u32::<byteorder::LittleEndian>(bytes.len() as u32)?;
        stream.write_all(&bytes)?;
        Ok(())
    }
}

impl<T: OpaqueBinary> BinaryDecodable for Opaque<T> {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let len = stream.read_u32::<byteorder::LittleEndian>()? as usize;
        if len > ctx.options().max_message_size {
            return Err(Error::malformed(format!(
                "opaque payload length {len} exceeds ceiling {}",
                ctx.options().max_message_size
            )));
        }
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf)?;
        Ok(Opaque(T::deserialize(&buf)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodingOptions;
    use crate::resolver::Resolver;
    use crate::source::Source;

    fn ctx_owned() -> (DecodingOptions, Resolver, Source) {
        (DecodingOptions::test(), Resolver::default(), Source::default())
    }

    #[test]
    fn bool_roundtrip() {
        let (opts, resolver, source) = ctx_owned();
        let ctx = Context::new(&opts, &resolver, &source);
        for v in [true, false] {
            let bytes = v.encode_to_vec(&ctx);
            let mut cursor = std::io::Cursor::new(bytes);
            assert_eq!(bool::decode(&mut cursor, &ctx).unwrap(), v);
        }
    }

    #[test]
    fn string_roundtrip() {
        let (opts, resolver, source) = ctx_owned();
        let ctx = Context::new(&opts, &resolver, &source);
        let v = "hello, world".to_string();
        let bytes = v.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(String::decode(&mut cursor, &ctx).unwrap(), v);
    }

    #[test]
    fn string_over_ceiling_is_malformed() {
        let (mut opts, resolver, source) = ctx_owned();
        opts.max_string_length = 4;
        let ctx = Context::new(&opts, &resolver, &source);
        let bytes = "way too long".to_string().encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(String::decode(&mut cursor, &ctx).is_err());
    }

    #[test]
    fn numeric_cross_kind_widening() {
        let (opts, resolver, source) = ctx_owned();
        let ctx = Context::new(&opts, &resolver, &source);
        // Encoded as a signed integer leaf, decoded as a float leaf: the
        // wire form tags its own family, so the destination type drives the
        // conversion rather than the source type.
        let v: i32 = -7;
        let bytes = v.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(f64::decode(&mut cursor, &ctx).unwrap(), -7.0);
    }
}
