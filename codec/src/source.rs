// SPDX-License-Identifier: MPL-2.0

//! Factory/cache of codecs for dynamically-typed decode (§4.4).
//!
//! Grounded on this crate's `TypeLoaderCollection`/`TypeLoader` priority
//! dispatch chain: register a constructor per concrete type, then resolve a
//! wire-observed fingerprint back to "decode this concrete type" at decode
//! time.
//!
//! Design note: the distilled spec calls for three layered implementations
//! (Direct Source, Recursion-resolving Source, Caching Source). In this
//! crate the three collapse into one `Source` type, because:
//! - statically-known recursive Rust types never need the recursion-
//!   resolving placeholder protocol at all (see `SPEC_FULL.md` §4.3); the
//!   only place a `Source` is consulted dynamically is decoding a
//!   polymorphic Interface/AnyValue slot whose concrete type is only known
//!   after reading its fingerprint off the wire, and
//! - a registration-time map *is* already a cache: there is nothing left
//!   for a separate caching layer to memoize.

use std::any::Any;
use std::io::Read;
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;

use crate::{
    context::Context,
    descriptor::DescriptorRef,
    dynamic::{DescribedType, DynEncodable},
    encodable::{BinaryDecodable, EncodingResult},
    fingerprint::Fingerprint,
    Error,
};

/// Object-safe "decode this concrete type from the stream" entry, one per
/// registered Rust type.
trait TypeConstructor: Send + Sync {
    fn decode(&self, stream: &mut dyn Read, ctx: &Context<'_>) -> EncodingResult<Box<dyn DynEncodable>>;
    fn descriptor(&self) -> DescriptorRef;
}

struct TypedConstructor<T>(std::marker::PhantomData<fn() -> T>);

impl<T> TypeConstructor for TypedConstructor<T>
where
    T: BinaryDecodable + DynEncodable + DescribedType + Send + Sync + 'static,
{
    fn decode(&self, stream: &mut dyn Read, ctx: &Context<'_>) -> EncodingResult<Box<dyn DynEncodable>> {
        let value = T::decode(stream, ctx)?;
        Ok(Box::new(value))
    }

    fn descriptor(&self) -> DescriptorRef {
        T::descriptor()
    }
}

/// Factory/cache of dynamically-dispatchable codecs, keyed by [`Fingerprint`].
///
/// Used by the Interface and reflect-value (AnyValue) codecs to turn a
/// wire-observed type fingerprint into a concrete decode call. Read-mostly
/// after startup registration, guarded the same way as
/// [`crate::resolver::Resolver`].
#[derive(Default)]
pub struct Source {
    constructors: RwLock<HashMap<Fingerprint, Arc<dyn TypeConstructor>>>,
}

impl Source {
    /// Register `T` so that decoding an Interface/AnyValue slot whose wire
    /// fingerprint matches `T::descriptor()` dispatches to `T::decode`.
    pub fn register<T>(&self) -> Result<Fingerprint, Error>
    where
        T: BinaryDecodable + DynEncodable + DescribedType + Send + Sync + 'static,
    {
        let descriptor = T::descriptor();
        let fingerprint = Fingerprint::of(&descriptor);
        let mut constructors = self.constructors.write().expect("source lock poisoned");
        constructors
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(TypedConstructor::<T>(std::marker::PhantomData)));
        Ok(fingerprint)
    }

    /// Decode a type-erased value whose concrete type was previously
    /// registered under `fingerprint`.
    pub fn construct(
        &self,
        fingerprint: Fingerprint,
        stream: &mut dyn Read,
        ctx: &Context<'_>,
    ) -> EncodingResult<Box<dyn DynEncodable>> {
        let constructor = {
            let constructors = self.constructors.read().expect("source lock poisoned");
            constructors.get(&fingerprint).cloned()
        };
        let Some(constructor) = constructor else {
            return Err(Error::bad_type(
                "<registered type>",
                format!("unregistered fingerprint {fingerprint}"),
            ));
        };
        constructor.decode(stream, ctx)
    }

    /// The descriptor registered under `fingerprint`, if any. Used by the
    /// Interface codec to validate that a loose-typed substitute still
    /// satisfies the slot's required trait.
    pub fn descriptor_for(&self, fingerprint: Fingerprint) -> Option<DescriptorRef> {
        let constructors = self.constructors.read().expect("source lock poisoned");
        constructors.get(&fingerprint).map(|c| c.descriptor())
    }

    /// Best-effort loose-half fallback for [`Self::construct`]: used when no
    /// exact (loose+strict) fingerprint match exists, to substitute any
    /// registered type whose loose glob matches (§4.2, mirroring
    /// [`crate::resolver::Resolver::resolve`]'s step (d)). Callers must gate
    /// this on `!ctx.options().strict_typing`.
    pub fn construct_loose(
        &self,
        loose: u64,
        stream: &mut dyn Read,
        ctx: &Context<'_>,
    ) -> EncodingResult<Box<dyn DynEncodable>> {
        let constructor = {
            let constructors = self.constructors.read().expect("source lock poisoned");
            constructors
                .iter()
                .find(|(fp, _)| fp.loose == loose)
                .map(|(_, c)| c.clone())
        };
        let Some(constructor) = constructor else {
            return Err(Error::bad_type(
                "<registered type>",
                format!("no loose match for fingerprint loose-half {loose:016x}"),
            ));
        };
        constructor.decode(stream, ctx)
    }
}

/// Downcast a type-erased [`DynEncodable`] value back to a concrete type.
/// Used after [`Source::construct`] resolves which concrete decoder ran.
pub fn downcast<T: Any>(value: Box<dyn DynEncodable>) -> Result<T, Error> {
    value
        .into_any_box()
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| Error::malformed("decoded dynamic value has unexpected concrete type"))
}
