// SPDX-License-Identifier: MPL-2.0

//! Compound codecs (§4.2): array, slice, map, pointer, struct (strict and
//! loose), interface.
//!
//! Struct encode/decode itself is generated per-type by
//! `wire-codec-macros`' `#[derive(Encodable)]`; this module supplies the
//! shared machinery the generated code calls into (field-id hashing and the
//! loose sub-frame reader), plus the codecs for the built-in compound kinds
//! that apply uniformly across element types (array, slice, map, pointer,
//! interface).

pub mod array;
pub mod interface;
pub mod map;
pub mod pointer;
pub mod slice;
pub mod struct_codec;

pub use interface::Interface;
pub use pointer::{decode_pointer, encode_pointer};
