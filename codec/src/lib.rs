// SPDX-License-Identifier: MPL-2.0

//! A self-describing binary serialization engine: values carry enough type
//! information on the wire (a 128-bit structural fingerprint per root value)
//! that two independently-built peers can exchange values without sharing a
//! schema file, as long as their local type definitions agree closely enough
//! — exactly, under strict typing, or merely in shape, under loose typing.
//!
//! Start at [`facade::Encoder`]/[`facade::Decoder`] for the top-level entry
//! points. [`encodable::BinaryEncodable`]/[`encodable::BinaryDecodable`] is
//! the per-type codec contract every leaf, compound, and derived struct type
//! implements; [`resolver::Resolver`] and [`source::Source`] are the type
//! registries that make self-description possible; [`refs::Recursive`] is
//! the wrapper that lets cyclic and shared-reference values round-trip.

pub mod compound;
pub mod concurrent;
pub mod context;
pub mod described;
pub mod descriptor;
pub mod dynamic;
pub mod encodable;
mod error;
pub mod facade;
pub mod fingerprint;
pub mod reflect;
pub mod refs;
pub mod resolver;
pub mod source;
pub mod varint;

pub use compound::Interface;
pub use context::{Context, ContextOwned, DecodingOptions};
pub use described::Described;
pub use descriptor::{Descriptor, DescriptorRef, FieldInfo, Kind};
pub use dynamic::{DescribedType, DynEncodable};
pub use encodable::{BinaryDecodable, BinaryEncodable, EncodingResult, Opaque, OpaqueBinary};
pub use error::{Error, Result};
pub use facade::{Decoder, Encoder};
pub use fingerprint::Fingerprint;
pub use reflect::{AnyValue, TypeDescriptor};
pub use refs::{Recursive, RefTable};
pub use resolver::Resolver;
pub use source::Source;

/// `#[derive(Encodable)]`: generates [`BinaryEncodable`], [`BinaryDecodable`]
/// and [`DescribedType`] for a struct, honoring `#[codec(skip)]`,
/// `#[codec(include)]`, and `#[codec(rename = "...")]` field attributes. See
/// `wire-codec-macros` for the implementation.
pub use wire_codec_macros::Encodable;
