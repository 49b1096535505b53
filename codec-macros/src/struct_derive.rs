//! Code generation for `#[derive(Encodable)]` (§9b): emits `DescribedType`,
//! `Described`, `BinaryEncodable` and `BinaryDecodable` impls for a struct,
//! branching at run time on `ctx.options().strict_typing` between the
//! strict (positional, ascending field-name order, no framing) and loose
//! (field-id-tagged, length-framed, superset/subset tolerant) struct wire
//! forms described in §4.2.
//!
//! Grounded on `encoding/binary.rs`'s `generate_binary_encode_impl`/
//! `generate_binary_decode_impl` for the general per-field codegen shape
//! (accumulate a `byte_len`/`encode`/`decode` token stream per field, then
//! wrap it in one `impl`), generalized from one fixed OPC-UA wire form to
//! two (strict/loose) selected at run time rather than at macro-expansion
//! time.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Visibility};

use crate::utils::{EmptyAttribute, FieldAttr, StructItem};

pub fn derive_encodable_inner(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = input.ident.clone();
    let data = crate::utils::expect_struct(input.data)?;
    let item: StructItem<FieldAttr, EmptyAttribute> =
        StructItem::from_input(data, input.attrs, ident)?;

    let ident = item.ident;

    struct IncludedField {
        rust_ident: syn::Ident,
        wire_name: String,
        typ: syn::Type,
        exported: bool,
    }

    let mut included: Vec<IncludedField> = Vec::new();
    let mut skipped: Vec<syn::Ident> = Vec::new();

    for field in item.fields {
        if field.attr.skip {
            skipped.push(field.ident);
            continue;
        }
        let wire_name = field.attr.rename.clone().unwrap_or_else(|| field.ident.to_string());
        let exported = matches!(field.vis, Visibility::Public(_)) || field.attr.include;
        included.push(IncludedField {
            rust_ident: field.ident,
            wire_name,
            typ: field.typ,
            exported,
        });
    }

    // Ascending wire-name order, both for the descriptor and for the
    // strict/loose codec bodies (§4.2's "fixed total order" rule).
    included.sort_by(|a, b| a.wire_name.cmp(&b.wire_name));

    let field_info_entries = included.iter().map(|f| {
        let wire_name = &f.wire_name;
        let typ = &f.typ;
        let exported = f.exported;
        quote! {
            ::wire_codec::FieldInfo {
                name: #wire_name.to_string(),
                ty: <#typ as ::wire_codec::Described>::describe(),
                exported: #exported,
            }
        }
    });

    let strict_byte_len = included.iter().map(|f| {
        let rust_ident = &f.rust_ident;
        quote! { size += self.#rust_ident.byte_len(ctx); }
    });
    let loose_byte_len = included.iter().map(|f| {
        let rust_ident = &f.rust_ident;
        quote! { size += 4 + 9 + self.#rust_ident.byte_len(ctx); }
    });

    let strict_encode = included.iter().map(|f| {
        let rust_ident = &f.rust_ident;
        quote! { self.#rust_ident.encode(stream, ctx)?; }
    });
    let loose_encode = included.iter().map(|f| {
        let rust_ident = &f.rust_ident;
        let wire_name = &f.wire_name;
        quote! {
            frame.push(::wire_codec::compound::struct_codec::field_id(#wire_name), &self.#rust_ident, ctx)?;
        }
    });

    let strict_decode_fields = included.iter().map(|f| {
        let rust_ident = &f.rust_ident;
        quote! { #rust_ident: ::wire_codec::BinaryDecodable::decode(stream, ctx)?, }
    });
    let loose_decode_fields = included.iter().map(|f| {
        let rust_ident = &f.rust_ident;
        let wire_name = &f.wire_name;
        quote! {
            #rust_ident: frame.decode_field(::wire_codec::compound::struct_codec::field_id(#wire_name), ctx)?,
        }
    });
    let skipped_decode_fields = skipped.iter().map(|ident| {
        quote! { #ident: Default::default(), }
    });

    let type_name = format!("{}", ident);
    let full_name = quote! { concat!(module_path!(), "::", #type_name) };

    Ok(quote! {
        impl ::wire_codec::DescribedType for #ident {
            fn descriptor() -> ::wire_codec::DescriptorRef {
                ::wire_codec::described::share(::wire_codec::Descriptor::named_struct(
                    #full_name,
                    vec![ #(#field_info_entries),* ],
                ))
            }
        }

        impl ::wire_codec::Described for #ident {
            // A nominal stub (name set, no fields), not a call into
            // `descriptor()`: a field of this type nested inside itself
            // (directly, or through a Pointer/Slice/Map) would otherwise
            // recurse forever building the field list. Named structs are
            // already identified purely by name at any nested position (see
            // `fingerprint::hash_loose`/`hash_strict`'s `Kind::Struct` arms),
            // so the stub carries everything a nested reference needs; the
            // full field list is only ever materialized once, here, at the
            // type's own top-level `descriptor()`.
            fn describe() -> ::wire_codec::Descriptor {
                ::wire_codec::Descriptor::named_struct(#full_name, Vec::new())
            }
        }

        impl ::wire_codec::BinaryEncodable for #ident {
            #[allow(unused_mut, unused_variables)]
            fn byte_len(&self, ctx: &::wire_codec::Context<'_>) -> usize {
                let mut size = 0usize;
                if ctx.options().strict_typing {
                    #(#strict_byte_len)*
                } else {
                    size += 9;
                    #(#loose_byte_len)*
                }
                size
            }

            #[allow(unused_variables)]
            fn encode<S: std::io::Write + ?Sized>(
                &self,
                stream: &mut S,
                ctx: &::wire_codec::Context<'_>,
            ) -> ::wire_codec::EncodingResult<()> {
                if ctx.options().strict_typing {
                    #(#strict_encode)*
                    Ok(())
                } else {
                    let mut frame = ::wire_codec::compound::struct_codec::LooseFrameWriter::default();
                    #(#loose_encode)*
                    frame.finish(stream)
                }
            }
        }

        impl ::wire_codec::BinaryDecodable for #ident {
            #[allow(unused_variables)]
            fn decode<S: std::io::Read + ?Sized>(
                stream: &mut S,
                ctx: &::wire_codec::Context<'_>,
            ) -> ::wire_codec::EncodingResult<Self> {
                if ctx.options().strict_typing {
                    Ok(Self {
                        #(#strict_decode_fields)*
                        #(#skipped_decode_fields)*
                    })
                } else {
                    let frame = ::wire_codec::compound::struct_codec::LooseFrame::read(stream, ctx)?;
                    Ok(Self {
                        #(#loose_decode_fields)*
                        #(#skipped_decode_fields)*
                    })
                }
            }
        }
    })
}
