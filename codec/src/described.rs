// SPDX-License-Identifier: MPL-2.0

//! [`Described`]: produces a field's [`Descriptor`] directly (not behind
//! `Arc`), for use as the `ty` of a [`FieldInfo`] when the derive macro
//! assembles a struct's [`Descriptor::named_struct`].
//!
//! [`crate::dynamic::DescribedType`] (returning a shared [`DescriptorRef`])
//! is the right shape for a type that may itself be registered and
//! fingerprinted at the top level; `Described` is the complementary shape a
//! field needs, and every leaf/compound wrapper kind implements it directly
//! here so the derive macro never needs to special-case "is this a leaf
//! type or a user type" at codegen time — it just emits
//! `<FieldType as wire_codec::Described>::describe()` for every field.
//!
//! A blanket `impl<T: DescribedType> Described for T` is deliberately not
//! provided (it would conflict with the concrete leaf impls below under
//! Rust's coherence rules); instead `#[derive(Encodable)]` emits a small
//! concrete `impl Described for TheStruct` alongside `DescribedType` for
//! every derived type.

use crate::descriptor::{Descriptor, DescriptorRef, Kind};
use crate::reflect::{AnyValue, TypeDescriptor};
use crate::refs::Recursive;

/// Produces a [`Descriptor`] for `Self`, used as a struct field's type in a
/// generated [`Descriptor::named_struct`] call.
pub trait Described {
    /// This type's descriptor.
    fn describe() -> Descriptor;
}

macro_rules! impl_described_leaf {
    ($t:ty, $ctor:ident) => {
        impl Described for $t {
            fn describe() -> Descriptor {
                Descriptor::$ctor()
            }
        }
    };
}

impl_described_leaf!(bool, bool_);
impl_described_leaf!(i8, int8);
impl_described_leaf!(i16, int16);
impl_described_leaf!(i32, int32);
impl_described_leaf!(i64, int64);
impl_described_leaf!(u8, uint8);
impl_described_leaf!(u16, uint16);
impl_described_leaf!(u32, uint32);
impl_described_leaf!(u64, uint64);
impl_described_leaf!(usize, uintptr);
impl_described_leaf!(f32, float32);
impl_described_leaf!(f64, float64);
impl_described_leaf!(String, string);

impl<T: Described> Described for Option<Vec<T>> {
    fn describe() -> Descriptor {
        Descriptor::anonymous(Kind::Slice {
            element: Box::new(T::describe()),
        })
    }
}

impl<K: Described, V: Described> Described for Option<std::collections::HashMap<K, V>> {
    fn describe() -> Descriptor {
        Descriptor::anonymous(Kind::Map {
            key: Box::new(K::describe()),
            value: Box::new(V::describe()),
        })
    }
}

impl<T: Described> Described for Option<Recursive<T>> {
    fn describe() -> Descriptor {
        Descriptor::anonymous(Kind::Pointer {
            element: Box::new(T::describe()),
        })
    }
}

impl<T: Described, const N: usize> Described for [T; N] {
    fn describe() -> Descriptor {
        Descriptor::anonymous(Kind::Array {
            len: N,
            element: Box::new(T::describe()),
        })
    }
}

impl<R> Described for crate::compound::Interface<R> {
    fn describe() -> Descriptor {
        Descriptor::interface(std::any::type_name::<R>())
    }
}

impl Described for AnyValue {
    fn describe() -> Descriptor {
        Descriptor::anonymous(Kind::AnyValue)
    }
}

impl Described for TypeDescriptor {
    fn describe() -> Descriptor {
        Descriptor::anonymous(Kind::TypeDescriptor)
    }
}

/// Convenience used by generated `DescribedType::descriptor` impls: turn a
/// by-value [`Descriptor`] into a shared [`DescriptorRef`].
pub fn share(descriptor: Descriptor) -> DescriptorRef {
    std::sync::Arc::new(descriptor)
}
