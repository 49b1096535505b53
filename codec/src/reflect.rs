// SPDX-License-Identifier: MPL-2.0

//! Reflect-type and reflect-value codecs (§4.2's "V-type"/"V-value"): a
//! type descriptor as a value, and a universal "any typed value" cell.
//!
//! Grounded on this crate's `ExtensionObject` (the reflect-value cell and
//! the Interface codec in `compound::interface` share one implementation
//! shape, differing only in how a loose-typed substitute's trait bound is
//! checked — see `DESIGN.md`).

use std::io::{Read, Write};

use crate::{
    context::Context,
    descriptor::DescriptorRef,
    dynamic::{DescribedType, DynEncodable},
    encodable::{BinaryDecodable, BinaryEncodable, EncodingResult},
    fingerprint::Fingerprint,
    refs::{self, Recursive},
    Error,
};

/// The reflect-type codec's target: a type descriptor carried as an
/// ordinary encodable value, wired as its 16-byte fingerprint.
///
/// Decode fallback order (§4.2): (a) registered map; (b) observed-but-
/// unregistered map; (c) the caller-supplied expected descriptor if its
/// fingerprint matches; (d) under loose typing, the best loose-half match;
/// (e) bad-type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor(pub DescriptorRef);

impl BinaryEncodable for TypeDescriptor {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        Fingerprint::WIRE_LEN
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        let fingerprint = ctx.resolver().fingerprint_of(&self.0)?;
        stream.write_all(&fingerprint.to_bytes())?;
        Ok(())
    }
}

impl BinaryDecodable for TypeDescriptor {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let mut buf = [0u8; Fingerprint::WIRE_LEN];
        stream.read_exact(&mut buf)?;
        let fingerprint = Fingerprint::from_bytes(buf);
        let descriptor = ctx.resolver().resolve(fingerprint, None)?;
        Ok(TypeDescriptor(descriptor))
    }
}

/// The reflect-value codec's target: a universal "any typed value" slot.
/// Wire form: `1 byte validity`, then if valid, the back-reference protocol
/// wrapping the type fingerprint followed by the value via that type's
/// dynamic codec (§4.2).
///
/// A reflect-value is a reference-bearing kind (§4.3): its inner payload is
/// held in a [`Recursive`] cell and participates in the reference table `P`
/// exactly like `Pointer<T>`, so a shared or self-referential AnyValue
/// round-trips its sharing instead of being deep-copied on every decode.
#[derive(Debug)]
pub struct AnyValue {
    inner: Option<Recursive<Box<dyn DynEncodable>>>,
}

impl AnyValue {
    /// Wrap a concrete, registered value.
    pub fn new<T>(value: T) -> Self
    where
        T: BinaryEncodable + BinaryDecodable + DescribedType + DynEncodable + 'static,
    {
        Self {
            inner: Some(Recursive::new(Box::new(value))),
        }
    }

    /// The empty/nil cell.
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// `true` if this cell holds no value.
    pub fn is_none(&self) -> bool {
        self.inner.is_none()
    }
}

impl Default for AnyValue {
    fn default() -> Self {
        Self::none()
    }
}

impl Clone for AnyValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => match (a.borrow().as_ref(), b.borrow().as_ref()) {
                (Some(a), Some(b)) => a.dyn_eq(b.as_ref()),
                _ => false,
            },
            _ => false,
        }
    }
}

impl BinaryEncodable for AnyValue {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        match &self.inner {
            None => 1,
            Some(r) => {
                1 + 9
                    + r.borrow()
                        .as_ref()
                        .map(|v| Fingerprint::WIRE_LEN + v.byte_len_dyn(ctx))
                        .unwrap_or(0)
            }
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        match &self.inner {
            None => {
                stream.write_all(&[0u8])?;
            }
            Some(recursive) => {
                stream.write_all(&[1u8])?;
                refs::encode_recursive(recursive, stream, ctx.ref_table(), |inner, s| {
                    let descriptor = inner.descriptor_dyn();
                    let fingerprint = ctx.resolver().fingerprint_of(&descriptor)?;
                    s.write_all(&fingerprint.to_bytes())?;
                    inner.encode_dyn(s, ctx)
                })
            }
        }
    }
}

impl BinaryDecodable for AnyValue {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let _lease = ctx.options().depth_lock()?;
        let mut validity = [0u8; 1];
        stream.read_exact(&mut validity)?;
        if validity[0] == 0 {
            return Ok(AnyValue::none());
        }
        let recursive = refs::decode_recursive(stream, ctx, |s| {
            let mut fp_buf = [0u8; Fingerprint::WIRE_LEN];
            s.read_exact(&mut fp_buf)?;
            let fingerprint = Fingerprint::from_bytes(fp_buf);
            // Exact (loose+strict) match first; under loose typing, fall
            // back to any registered type whose loose glob matches (§4.2),
            // mirroring `compound::interface`'s identical fallback.
            match ctx.source().construct(fingerprint, s, ctx) {
                Ok(v) => Ok(v),
                Err(_) if !ctx.options().strict_typing => {
                    ctx.source().construct_loose(fingerprint.loose, s, ctx)
                }
                Err(e) => Err(e),
            }
        })?;
        Ok(AnyValue {
            inner: Some(recursive),
        })
    }
}

/// Error produced when code expects an [`AnyValue`] (or Interface slot, see
/// `compound::interface`) to hold a particular concrete type but it holds
/// another.
pub fn expect<T: 'static + Clone>(value: &AnyValue) -> Result<T, Error> {
    let Some(recursive) = &value.inner else {
        return Err(Error::invalid_target("AnyValue is nil"));
    };
    let guard = recursive.borrow();
    let inner = guard
        .as_ref()
        .expect("Recursive<T> read before its cell was filled");
    inner
        .as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| Error::bad_type(std::any::type_name::<T>(), inner.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodingOptions;
    use crate::descriptor::{Descriptor, FieldInfo};
    use crate::refs::RefTable;
    use crate::resolver::Resolver;
    use crate::source::Source;

    #[derive(Debug, Clone, PartialEq)]
    struct Num(i32);

    impl DescribedType for Num {
        fn descriptor() -> DescriptorRef {
            std::sync::Arc::new(Descriptor::named_struct(
                "reflect_tests::Num",
                vec![FieldInfo {
                    name: "0".to_string(),
                    ty: Descriptor::int32(),
                    exported: true,
                }],
            ))
        }
    }

    impl BinaryEncodable for Num {
        fn byte_len(&self, ctx: &Context<'_>) -> usize {
            self.0.byte_len(ctx)
        }

        fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
            self.0.encode(stream, ctx)
        }
    }

    impl BinaryDecodable for Num {
        fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
            Ok(Num(i32::decode(stream, ctx)?))
        }
    }

    #[test]
    fn nil_any_value_roundtrip() {
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        let value = AnyValue::none();
        let bytes = value.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(AnyValue::decode(&mut cursor, &ctx).unwrap().is_none());
    }

    #[test]
    fn shared_any_value_decodes_to_same_cell() {
        // Two fields holding the same AnyValue must decode sharing one
        // back-reference cell, the same contract `Pointer<T>` gives.
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        source.register::<Num>().unwrap();
        resolver.register(Num::descriptor()).unwrap();
        let table = RefTable::new();
        let ctx = Context::with_ref_table(&opts, &resolver, &source, &table);

        let shared = AnyValue::new(Num(9));
        let a = shared.clone();
        let b = shared.clone();

        let mut buf = Vec::new();
        a.encode(&mut buf, &ctx).unwrap();
        b.encode(&mut buf, &ctx).unwrap();

        let decode_table = RefTable::new();
        let decode_ctx = Context::with_ref_table(&opts, &resolver, &source, &decode_table);
        let mut cursor = std::io::Cursor::new(buf);
        let a2 = AnyValue::decode(&mut cursor, &decode_ctx).unwrap();
        let b2 = AnyValue::decode(&mut cursor, &decode_ctx).unwrap();

        assert_eq!(expect::<Num>(&a2).unwrap(), Num(9));
        assert_eq!(expect::<Num>(&b2).unwrap(), Num(9));
        assert_eq!(a2.inner.as_ref().unwrap().address(), b2.inner.as_ref().unwrap().address());
    }

    #[test]
    fn loose_typing_falls_back_to_loose_half_match() {
        let opts = DecodingOptions::loose();
        let resolver = Resolver::default();
        let source = Source::default();
        let registered_fp = source.register::<Num>().unwrap();
        resolver.register(Num::descriptor()).unwrap();
        let ctx = Context::new(&opts, &resolver, &source);

        // Encode as if by a type sharing Num's loose half but a different
        // strict half, so `Source::construct`'s exact lookup misses.
        let mut buf = Vec::new();
        buf.push(1u8);
        crate::varint::write_varint_signed(&mut buf, -1).unwrap(); // no prior back-reference
        let mismatched = crate::fingerprint::Fingerprint {
            loose: registered_fp.loose,
            strict: registered_fp.strict.wrapping_add(1),
        };
        buf.extend_from_slice(&mismatched.to_bytes());
        Num(5).encode(&mut buf, &ctx).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let decoded = AnyValue::decode(&mut cursor, &ctx).unwrap();
        assert_eq!(expect::<Num>(&decoded).unwrap(), Num(5));
    }
}
