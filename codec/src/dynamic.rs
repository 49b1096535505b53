// SPDX-License-Identifier: MPL-2.0

//! The object-safe, type-erased counterpart of [`BinaryEncodable`]/
//! [`BinaryDecodable`], used wherever a polymorphic slot (Interface,
//! AnyValue) must hold an arbitrary concrete type behind one trait object.
//!
//! Grounded directly on this codebase's `DynEncodable` trait and
//! `blanket_dyn_encodable!` macro in `extension_object.rs`: same shape
//! (object-safe encode/byte_len, `as_any`/`clone_box`/`dyn_eq` for
//! downcasting, cloning, and comparing type-erased payloads), generalized
//! from "anything encodable as an OPC-UA extension object" to "anything
//! encodable as a polymorphic slot value".

use std::any::Any;
use std::io::Write;

use crate::{
    context::Context,
    descriptor::DescriptorRef,
    encodable::{BinaryDecodable, BinaryEncodable, EncodingResult},
};

/// Object-safe encode/inspect surface for a type-erased value stored behind
/// `Box<dyn DynEncodable>`.
pub trait DynEncodable: Any + std::fmt::Debug {
    /// Object-safe `encode`.
    fn encode_dyn(&self, stream: &mut dyn Write, ctx: &Context<'_>) -> EncodingResult<()>;

    /// Object-safe `byte_len`.
    fn byte_len_dyn(&self, ctx: &Context<'_>) -> usize;

    /// The dynamic type's descriptor, used to write the type fingerprint
    /// that precedes the value on the wire (Interface/AnyValue codecs).
    fn descriptor_dyn(&self) -> DescriptorRef;

    /// Downcast support, by reference.
    fn as_any(&self) -> &dyn Any;

    /// Downcast support, by owned box (required to recover a concrete
    /// value out of a `Box<dyn DynEncodable>` once its fingerprint has
    /// identified which concrete type it is).
    fn into_any_box(self: Box<Self>) -> Box<dyn Any>;

    /// Clone through the trait object, required to implement `Clone` for
    /// the Interface/AnyValue wrapper types.
    fn clone_box(&self) -> Box<dyn DynEncodable>;

    /// Compare through the trait object by downcasting `other` to `Self`
    /// and delegating to `PartialEq`.
    fn dyn_eq(&self, other: &dyn DynEncodable) -> bool;

    /// `std::any::type_name` of the concrete type, useful for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl PartialEq for dyn DynEncodable {
    fn eq(&self, other: &dyn DynEncodable) -> bool {
        self.dyn_eq(other)
    }
}

/// Blanket impl: anything `BinaryEncodable + BinaryDecodable + Clone +
/// PartialEq + Debug + 'static` (and able to produce its own descriptor,
/// via [`DescribedType`]) automatically implements `DynEncodable`. Mirrors
/// the teacher's `blanket_dyn_encodable!` macro's bound list, minus the
/// JSON/XML bounds this crate does not carry.
pub trait DescribedType {
    /// This type's descriptor, used for registration and fingerprinting.
    fn descriptor() -> DescriptorRef;
}

impl<T> DynEncodable for T
where
    T: BinaryEncodable + BinaryDecodable + DescribedType + Any + std::fmt::Debug + Clone + PartialEq,
{
    fn encode_dyn(&self, stream: &mut dyn Write, ctx: &Context<'_>) -> EncodingResult<()> {
        BinaryEncodable::encode(self, stream, ctx)
    }

    fn byte_len_dyn(&self, ctx: &Context<'_>) -> usize {
        BinaryEncodable::byte_len(self, ctx)
    }

    fn descriptor_dyn(&self) -> DescriptorRef {
        T::descriptor()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_box(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_box(&self) -> Box<dyn DynEncodable> {
        Box::new(self.clone())
    }

    fn dyn_eq(&self, other: &dyn DynEncodable) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| o == self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
