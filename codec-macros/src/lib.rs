#![warn(missing_docs)]

//! Derive macro for `wire-codec`'s self-describing binary serialization
//! engine.

mod struct_derive;
mod utils;

use proc_macro::TokenStream;
use struct_derive::derive_encodable_inner;
use syn::parse_macro_input;

#[proc_macro_derive(Encodable, attributes(codec))]
/// Derive `BinaryEncodable`, `BinaryDecodable`, `DescribedType` and
/// `Described` for a struct.
///
/// Every `pub` field participates in strict encoding by default; a
/// non-`pub` field can be opted in with `#[codec(include)]`, and any field
/// can be dropped from the wire form (and rebuilt via `Default` on decode)
/// with `#[codec(skip)]`. A field's wire name (and the 32-bit id the loose
/// struct codec hashes it to) defaults to the Rust identifier, overridable
/// with `#[codec(rename = "...")]`.
///
/// # Example
///
/// ```ignore
/// #[derive(Encodable)]
/// struct Point {
///     pub x: i32,
///     pub y: i32,
///     #[codec(skip)]
///     cached_distance: f64,
/// }
/// ```
pub fn derive_encodable(item: TokenStream) -> TokenStream {
    match derive_encodable_inner(parse_macro_input!(item)) {
        Ok(r) => r.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
