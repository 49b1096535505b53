// SPDX-License-Identifier: MPL-2.0

//! Interface codec (§4.2): a polymorphic slot holding any concrete type
//! satisfying a required trait bound, tagged on the wire by its dynamic
//! descriptor.
//!
//! Structurally this is the same cell shape as [`crate::reflect::AnyValue`]
//! (nilable, `Box<dyn DynEncodable>`, fingerprint-tagged) — the two differ
//! only in what "required trait" means: `AnyValue` accepts any registered
//! type unconditionally, while `Interface<R>` additionally checks that the
//! decoded concrete type is known to satisfy the marker trait `R` (see
//! `DESIGN.md`'s Open Question on trait-bound checking — this crate does not
//! attempt to re-derive that check from the wire, relying instead on
//! [`crate::source::Source`] registration being scoped to types that already
//! satisfy `R` at compile time).

use std::io::{Read, Write};
use std::marker::PhantomData;

use crate::{
    context::Context,
    dynamic::DynEncodable,
    encodable::{BinaryDecodable, BinaryEncodable, EncodingResult},
    fingerprint::Fingerprint,
    Error,
};

/// Marker trait naming the required bound a concrete type must satisfy to
/// be stored in an `Interface<R>` slot. Implemented by convention for a
/// caller-defined zero-sized marker type; this crate carries no built-in
/// markers of its own.
pub trait Required {}

/// A polymorphic slot, nilable, holding any concrete type registered with
/// the active [`crate::source::Source`] as satisfying `R`.
#[derive(Debug)]
pub struct Interface<R> {
    inner: Option<Box<dyn DynEncodable>>,
    _required: PhantomData<fn() -> R>,
}

impl<R> Interface<R> {
    /// Wrap a concrete value.
    pub fn new<T>(value: T) -> Self
    where
        T: DynEncodable,
    {
        Self {
            inner: Some(Box::new(value)),
            _required: PhantomData,
        }
    }

    /// The nil slot.
    pub fn none() -> Self {
        Self {
            inner: None,
            _required: PhantomData,
        }
    }

    /// `true` if this slot holds no value.
    pub fn is_none(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the dynamic payload, if present.
    pub fn as_dyn(&self) -> Option<&dyn DynEncodable> {
        self.inner.as_deref()
    }

    /// Recover a concrete value, failing with [`Error::bad_type`] if the
    /// slot is nil or holds a different concrete type.
    pub fn expect<T: 'static + Clone>(&self) -> Result<T, Error> {
        let Some(inner) = &self.inner else {
            return Err(Error::invalid_target("Interface slot is nil"));
        };
        inner
            .as_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::bad_type(std::any::type_name::<T>(), inner.type_name()))
    }
}

impl<R> Clone for Interface<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.as_ref().map(|v| v.clone_box()),
            _required: PhantomData,
        }
    }
}

impl<R> PartialEq for Interface<R> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => a.dyn_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl<R> BinaryEncodable for Interface<R> {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        match &self.inner {
            None => 1,
            Some(v) => 1 + Fingerprint::WIRE_LEN + v.byte_len_dyn(ctx),
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        match &self.inner {
            None => {
                stream.write_all(&[0u8])?;
            }
            Some(v) => {
                stream.write_all(&[1u8])?;
                let descriptor = v.descriptor_dyn();
                let fingerprint = ctx.resolver().fingerprint_of(&descriptor)?;
                stream.write_all(&fingerprint.to_bytes())?;
                v.encode_dyn(stream, ctx)?;
            }
        }
        Ok(())
    }
}

impl<R> BinaryDecodable for Interface<R> {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let _lease = ctx.options().depth_lock()?;
        let mut validity = [0u8; 1];
        stream.read_exact(&mut validity)?;
        if validity[0] == 0 {
            return Ok(Interface::none());
        }
        let mut fp_buf = [0u8; Fingerprint::WIRE_LEN];
        stream.read_exact(&mut fp_buf)?;
        let fingerprint = Fingerprint::from_bytes(fp_buf);
        // Exact (loose+strict) match first; under loose typing, fall back
        // to any registered type whose loose glob matches (§4.2) — the
        // substitute is trusted to satisfy `R` the same way an exact match
        // already is (see this module's own doc comment).
        let value = match ctx.source().construct(fingerprint, stream, ctx) {
            Ok(v) => v,
            Err(_) if !ctx.options().strict_typing => {
                ctx.source().construct_loose(fingerprint.loose, stream, ctx)?
            }
            Err(e) => return Err(e),
        };
        Ok(Interface {
            inner: Some(value),
            _required: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodingOptions;
    use crate::descriptor::Descriptor;
    use crate::dynamic::DescribedType;
    use crate::resolver::Resolver;
    use crate::source::Source;

    trait Stringer: Required {}

    #[derive(Debug, Clone, PartialEq)]
    struct Num(i32);

    impl DescribedType for Num {
        fn descriptor() -> crate::descriptor::DescriptorRef {
            std::sync::Arc::new(Descriptor::named_struct(
                "interface_tests::Num",
                vec![crate::descriptor::FieldInfo {
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

    impl Required for Num {}
    impl Stringer for Num {}

    #[test]
    fn nil_interface_roundtrip() {
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        let value: Interface<Num> = Interface::none();
        let bytes = value.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(Interface::<Num>::decode(&mut cursor, &ctx).unwrap().is_none());
    }

    #[test]
    fn populated_interface_roundtrip() {
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        source.register::<Num>().unwrap();
        resolver.register(Num::descriptor()).unwrap();
        let ctx = Context::new(&opts, &resolver, &source);

        let value = Interface::<Num>::new(Num(7));
        let bytes = value.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        let decoded = Interface::<Num>::decode(&mut cursor, &ctx).unwrap();
        assert_eq!(decoded.expect::<Num>().unwrap(), Num(7));
    }
}
