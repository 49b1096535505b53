// SPDX-License-Identifier: MPL-2.0

//! Pointer codec (§4.2): a nilable reference to an element value, always
//! constructed wrapped in [`crate::refs::Recursive`] — the design note in
//! §9 ("the conservative rule is to wrap all pointers") is taken literally
//! here, so there is no un-wrapped Pointer codec at all.
//!
//! Grounded on this crate's `ExtensionObject`'s boxed indirection for the
//! general shape, and directly on the distilled spec's §4.3 run-time
//! back-reference protocol (delegated to [`crate::refs::encode_recursive`]/
//! [`crate::refs::decode_recursive`]).

use std::io::{Read, Write};

use crate::{
    context::Context,
    encodable::{BinaryDecodable, BinaryEncodable, EncodingResult},
    refs::{self, Recursive},
};

/// Upper-bound byte length of a [`Recursive`] pointer: the nil byte, plus
/// (conservatively, ignoring whether this particular address has already
/// been seen in the operation) the back-reference varint and a full
/// encoding of the element.
pub fn pointer_byte_len<T: BinaryEncodable>(value: &Option<Recursive<T>>, ctx: &Context<'_>) -> usize {
    match value {
        None => 1,
        Some(r) => {
            1 + 9
                + r.borrow()
                    .as_ref()
                    .map(|inner| inner.byte_len(ctx))
                    .unwrap_or(0)
        }
    }
}

/// Encode a nilable, cycle-safe pointer: one nil-flag byte (`0` = non-nil,
/// `1` = nil — the distilled spec's literal byte assignment, preserved even
/// though it reads unusually), then if non-nil the Recursive back-reference
/// protocol.
pub fn encode_pointer<T, S>(
    value: &Option<Recursive<T>>,
    stream: &mut S,
    ctx: &Context<'_>,
) -> EncodingResult<()>
where
    T: BinaryEncodable,
    S: Write + ?Sized,
{
    match value {
        None => {
            stream.write_all(&[1u8])?;
            Ok(())
        }
        Some(recursive) => {
            stream.write_all(&[0u8])?;
            refs::encode_recursive(recursive, stream, ctx.ref_table(), |inner, s| inner.encode(s, ctx))
        }
    }
}

/// Decode a value encoded by [`encode_pointer`].
pub fn decode_pointer<T, S>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Option<Recursive<T>>>
where
    T: BinaryDecodable + 'static,
    S: Read + ?Sized,
{
    let mut nil_byte = [0u8; 1];
    stream.read_exact(&mut nil_byte)?;
    if nil_byte[0] == 1 {
        return Ok(None);
    }
    let recursive = refs::decode_recursive(stream, ctx, |s| T::decode(s, ctx))?;
    Ok(Some(recursive))
}

impl<T: BinaryEncodable> BinaryEncodable for Option<Recursive<T>> {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        pointer_byte_len(self, ctx)
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        encode_pointer(self, stream, ctx)
    }
}

impl<T: BinaryDecodable + 'static> BinaryDecodable for Option<Recursive<T>> {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        decode_pointer(stream, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodingOptions;
    use crate::refs::RefTable;
    use crate::resolver::Resolver;
    use crate::source::Source;

    #[test]
    fn nil_pointer_roundtrip() {
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        let table = RefTable::new();
        let ctx = Context::with_ref_table(&opts, &resolver, &source, &table);

        let value: Option<Recursive<i32>> = None;
        let bytes = value.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(Option::<Recursive<i32>>::decode(&mut cursor, &ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn shared_pointer_decodes_to_same_address() {
        // Mirrors the distilled spec's `Pair{ a: &x, b: &x }` scenario: two
        // fields pointing at the same address must decode sharing one cell.
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        let table = RefTable::new();
        let ctx = Context::with_ref_table(&opts, &resolver, &source, &table);

        let shared = Recursive::new(1i32);
        let a = Some(shared.clone());
        let b = Some(shared.clone());

        let mut buf = Vec::new();
        a.encode(&mut buf, &ctx).unwrap();
        b.encode(&mut buf, &ctx).unwrap();

        let decode_table = RefTable::new();
        let decode_ctx = Context::with_ref_table(&opts, &resolver, &source, &decode_table);
        let mut cursor = std::io::Cursor::new(buf);
        let a2 = Option::<Recursive<i32>>::decode(&mut cursor, &decode_ctx).unwrap();
        let b2 = Option::<Recursive<i32>>::decode(&mut cursor, &decode_ctx).unwrap();

        let a2 = a2.unwrap();
        let b2 = b2.unwrap();
        assert_eq!(a2.address(), b2.address());
        assert_eq!(a2.get(), 1);
        assert_eq!(b2.get(), 1);
    }
}
