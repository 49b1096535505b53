// SPDX-License-Identifier: MPL-2.0

//! The runtime type-descriptor value (`T` in the design doc's data model).
//!
//! Grounded on this crate's structural type registry (`StructTypeInfo`,
//! `TypeInfo`, `ParsedStructureField`): a descriptor is built once per type,
//! generalized here from a fixed-id OPC-UA type to a content-hashed one.

use std::sync::Arc;

/// The kind of a type descriptor. Mirrors the leaf/compound kind universe in
/// the design doc's data model, minus `complex64`/`complex128` (this engine
/// has no user-facing complex-number leaf type; the distilled spec's "number"
/// loose-glob collapsing already accounts for complex separately, which this
/// crate's fingerprint module documents explicitly as unreachable).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `bool`.
    Bool,
    /// `i8`.
    Int8,
    /// `i16`.
    Int16,
    /// `i32`.
    Int32,
    /// `i64`.
    Int64,
    /// `u8`.
    Uint8,
    /// `u16`.
    Uint16,
    /// `u32`.
    Uint32,
    /// `u64`.
    Uint64,
    /// `usize`, encoded exactly like `u64` on the wire.
    Uintptr,
    /// `f32`.
    Float32,
    /// `f64`.
    Float64,
    /// `String`.
    String,
    /// A fixed-length array of a known element type.
    Array {
        /// Element count (part of the type, not the value).
        len: usize,
        /// The element descriptor.
        element: Box<Descriptor>,
    },
    /// A length-prefixed, possibly-nil sequence.
    Slice {
        /// The element descriptor.
        element: Box<Descriptor>,
    },
    /// A length-prefixed, possibly-nil collection of key/value pairs.
    Map {
        /// The key descriptor.
        key: Box<Descriptor>,
        /// The value descriptor.
        value: Box<Descriptor>,
    },
    /// A struct with an ordered field list.
    Struct {
        /// The fields, always stored in ascending lexical name order.
        fields: Vec<FieldInfo>,
    },
    /// A nilable reference to an element type.
    Pointer {
        /// The element descriptor.
        element: Box<Descriptor>,
    },
    /// A polymorphic slot: any concrete type satisfying a required trait
    /// bound, tagged on the wire by its dynamic descriptor.
    Interface,
    /// An opaque user type that marshals itself to/from a byte vector.
    OpaqueBinary,
    /// The reflect-type codec's own target: a type descriptor as a value.
    TypeDescriptor,
    /// The reflect-value codec's target: any typed value, validity-tagged.
    AnyValue,
}

/// One field of a struct descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    /// The field's Rust identifier, used verbatim as the wire name for the
    /// strict struct codec's lexical ordering and as the loose struct
    /// codec's field-id hash input.
    pub name: String,
    /// The field's type descriptor.
    pub ty: Descriptor,
    /// Whether the field is `pub` (participates in strict encoding by
    /// default) — see `#[codec(include)]`/`#[codec(skip)]` for the override.
    pub exported: bool,
}

/// A first-class value identifying a concrete local type.
///
/// Two descriptors are identity-equal iff they denote the same local type;
/// `PartialEq`/`Eq` here compare structurally, which is sufficient since a
/// type's structural shape uniquely determines it within one process (no two
/// distinct Rust types built by this crate's derive macro can compare equal
/// unless they really are the same type, because the `name` field is the
/// type's fully qualified Rust path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// Fully qualified name for named kinds (structs, interfaces); empty for
    /// anonymous/leaf/compound kinds, which are identified purely by shape.
    pub name: String,
    /// The descriptor's kind.
    pub kind: Kind,
}

impl Descriptor {
    /// Build a descriptor for an unnamed leaf or compound kind.
    pub fn anonymous(kind: Kind) -> Self {
        Self {
            name: String::new(),
            kind,
        }
    }

    /// Build a descriptor for a named struct.
    pub fn named_struct(name: impl Into<String>, mut fields: Vec<FieldInfo>) -> Self {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            name: name.into(),
            kind: Kind::Struct { fields },
        }
    }

    /// Build a descriptor for the interface kind, named after the required
    /// trait.
    pub fn interface(trait_name: impl Into<String>) -> Self {
        Self {
            name: trait_name.into(),
            kind: Kind::Interface,
        }
    }

    /// `true` if this descriptor denotes a kind that carries reference
    /// semantics and therefore participates in the reference table `P`
    /// (pointer, slice, map, interface, any-value — see the design doc's
    /// Open Question #2).
    pub fn is_reference_kind(&self) -> bool {
        matches!(
            self.kind,
            Kind::Pointer { .. } | Kind::Slice { .. } | Kind::Map { .. } | Kind::Interface | Kind::AnyValue
        )
    }
}

macro_rules! leaf_descriptor_ctor {
    ($ctor:ident, $kind:ident) => {
        impl Descriptor {
            #[doc = concat!("Build the well-known `", stringify!($kind), "` leaf descriptor.")]
            pub fn $ctor() -> Self {
                Self::anonymous(Kind::$kind)
            }
        }
    };
}

leaf_descriptor_ctor!(bool_, Bool);
leaf_descriptor_ctor!(int8, Int8);
leaf_descriptor_ctor!(int16, Int16);
leaf_descriptor_ctor!(int32, Int32);
leaf_descriptor_ctor!(int64, Int64);
leaf_descriptor_ctor!(uint8, Uint8);
leaf_descriptor_ctor!(uint16, Uint16);
leaf_descriptor_ctor!(uint32, Uint32);
leaf_descriptor_ctor!(uint64, Uint64);
leaf_descriptor_ctor!(uintptr, Uintptr);
leaf_descriptor_ctor!(float32, Float32);
leaf_descriptor_ctor!(float64, Float64);
leaf_descriptor_ctor!(string, String);

/// A descriptor shared behind an `Arc` so the [`crate::resolver::Resolver`]
/// and the [`crate::source::Source`] can both hold cheap handles to it.
pub type DescriptorRef = Arc<Descriptor>;
