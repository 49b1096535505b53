// SPDX-License-Identifier: MPL-2.0

//! The front façade (§6): `Encoder<W>`/`Decoder<R>`, the entry points a
//! caller actually uses. Every top-level call gets its own fresh
//! [`RefTable`], scoped to that one operation (§3's lifecycle rule), while
//! the [`ContextOwned`] backing it (and therefore its [`Resolver`]/
//! [`Source`] registrations) is expected to outlive many calls.
//!
//! Grounded on this crate's `type_loader.rs`, which binds a resolver and
//! options together the same way, and on the teacher's top-level
//! encode/decode entry points referenced from `encoding.rs`.

use std::io::{Read, Write};

use crate::{
    context::ContextOwned,
    dynamic::DescribedType,
    encodable::{BinaryDecodable, BinaryEncodable},
    fingerprint::Fingerprint,
    refs::RefTable,
    Error,
};

/// Writes a root value preceded by its type fingerprint (§6's wire-level
/// entry point). One `Encoder` can make many top-level `encode` calls; each
/// gets its own reference table.
pub struct Encoder<'a, W> {
    stream: W,
    ctx: &'a ContextOwned,
}

impl<'a, W: Write> Encoder<'a, W> {
    /// Bind an output stream to a (typically long-lived) owned context.
    pub fn new(stream: W, ctx: &'a ContextOwned) -> Self {
        Self { stream, ctx }
    }

    /// Encode one root value: its 16-byte type fingerprint, then its
    /// encoding.
    pub fn encode<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: BinaryEncodable + DescribedType,
    {
        let table = RefTable::new();
        let context = self.ctx.context(&table);
        let fingerprint = context.resolver().fingerprint_of(&T::descriptor())?;
        self.stream.write_all(&fingerprint.to_bytes())?;
        value.encode(&mut self.stream, &context)
    }

    /// Recover the underlying stream.
    pub fn into_inner(self) -> W {
        self.stream
    }
}

/// Reads a root value written by [`Encoder::encode`].
pub struct Decoder<'a, R> {
    stream: R,
    ctx: &'a ContextOwned,
}

impl<'a, R: Read> Decoder<'a, R> {
    /// Bind an input stream to a (typically long-lived) owned context.
    pub fn new(stream: R, ctx: &'a ContextOwned) -> Self {
        Self { stream, ctx }
    }

    /// Decode one root value, validating its wire fingerprint against `T`'s
    /// expected descriptor before dispatching to `T::decode` (§4.4's
    /// registered/observed/expected/loose fallback chain, via
    /// [`crate::resolver::Resolver::resolve`]).
    pub fn decode<T>(&mut self) -> Result<T, Error>
    where
        T: BinaryDecodable + DescribedType,
    {
        let table = RefTable::new();
        let context = self.ctx.context(&table);
        let mut fp_buf = [0u8; Fingerprint::WIRE_LEN];
        self.stream.read_exact(&mut fp_buf)?;
        let fingerprint = Fingerprint::from_bytes(fp_buf);
        let expected = T::descriptor();
        context.resolver().resolve(fingerprint, Some(&expected))?;
        T::decode(&mut self.stream, &context)
    }

    /// Recover the underlying stream.
    pub fn into_inner(self) -> R {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodingOptions;
    use crate::descriptor::{Descriptor, DescriptorRef, FieldInfo};
    use crate::resolver::Resolver;
    use crate::source::Source;
    use crate::Context;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl DescribedType for Point {
        fn descriptor() -> DescriptorRef {
            std::sync::Arc::new(Descriptor::named_struct(
                "facade_tests::Point",
                vec![
                    FieldInfo {
                        name: "x".to_string(),
                        ty: Descriptor::int32(),
                        exported: true,
                    },
                    FieldInfo {
                        name: "y".to_string(),
                        ty: Descriptor::int32(),
                        exported: true,
                    },
                ],
            ))
        }
    }

    impl BinaryEncodable for Point {
        fn byte_len(&self, ctx: &Context<'_>) -> usize {
            self.x.byte_len(ctx) + self.y.byte_len(ctx)
        }

        fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> Result<(), Error> {
            self.x.encode(stream, ctx)?;
            self.y.encode(stream, ctx)
        }
    }

    impl BinaryDecodable for Point {
        fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> Result<Self, Error> {
            Ok(Point {
                x: i32::decode(stream, ctx)?,
                y: i32::decode(stream, ctx)?,
            })
        }
    }

    #[test]
    fn facade_roundtrips_a_registered_root_value() {
        let owned = ContextOwned::new(DecodingOptions::test(), Resolver::default(), Source::default());
        owned.resolver().register(Point::descriptor()).unwrap();

        let mut buf = Vec::new();
        {
            let mut encoder = Encoder::new(&mut buf, &owned);
            encoder.encode(&Point { x: 3, y: -4 }).unwrap();
        }

        let mut decoder = Decoder::new(buf.as_slice(), &owned);
        let decoded: Point = decoder.decode().unwrap();
        assert_eq!(decoded, Point { x: 3, y: -4 });
    }
}
