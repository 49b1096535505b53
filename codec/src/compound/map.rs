// SPDX-License-Identifier: MPL-2.0

//! Map codec (§4.2): signed-varint length prefix (`-1` = nil), then that
//! many `(key, value)` pairs. Decode always builds a fresh map (this
//! crate's Rust realisation of "the destination is replaced with a fresh
//! map of the exact target type, then populated").
//!
//! Iteration order on encode is the `HashMap`'s natural (unspecified) order,
//! matching the distilled spec's "undefined" encode-order allowance; decode
//! only needs to reconstruct the same pairs, not the same iteration order.
//!
//! Grounded on this codebase's `Option<Vec<T>>` array codec in
//! `encoding.rs` (same nil/length-prefix shape, generalized to pairs).

use std::collections::HashMap;
use std::hash::Hash;
use std::io::{Read, Write};

use crate::{
    context::Context,
    encodable::{BinaryDecodable, BinaryEncodable, EncodingResult},
    varint, Error,
};

impl<K, V> BinaryEncodable for Option<HashMap<K, V>>
where
    K: BinaryEncodable + Eq + Hash,
    V: BinaryEncodable,
{
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        match self {
            None => 1,
            Some(m) => {
                9 + m
                    .iter()
                    .map(|(k, v)| k.byte_len(ctx) + v.byte_len(ctx))
                    .sum::<usize>()
            }
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        match self {
            None => varint::write_varint_signed(stream, -1),
            Some(m) => {
                varint::write_varint_signed(stream, m.len() as i64)?;
                for (k, v) in m {
                    k.encode(stream, ctx)?;
                    v.encode(stream, ctx)?;
                }
                Ok(())
            }
        }
    }
}

impl<K, V> BinaryDecodable for Option<HashMap<K, V>>
where
    K: BinaryDecodable + Eq + Hash,
    V: BinaryDecodable,
{
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let len = varint::read_varint_signed(stream)?;
        if len < -1 {
            return Err(Error::malformed(format!("negative map length {len}")));
        }
        if len == -1 {
            return Ok(None);
        }
        let len = len as usize;
        if len > ctx.options().max_array_length {
            return Err(Error::malformed(format!(
                "map length {len} exceeds ceiling {}",
                ctx.options().max_array_length
            )));
        }
        let _lease = ctx.options().depth_lock()?;
        let mut out = HashMap::with_capacity(len.min(4096));
        for _ in 0..len {
            let key = K::decode(stream, ctx)?;
            let value = V::decode(stream, ctx)?;
            out.insert(key, value);
        }
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodingOptions;
    use crate::resolver::Resolver;
    use crate::source::Source;

    #[test]
    fn map_nil_and_populated_roundtrip() {
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        let nil: Option<HashMap<i32, String>> = None;
        let bytes = nil.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(
            Option::<HashMap<i32, String>>::decode(&mut cursor, &ctx).unwrap(),
            None
        );

        let mut m = HashMap::new();
        m.insert(1, "one".to_string());
        m.insert(2, "two".to_string());
        let some = Some(m);
        let bytes = some.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(
            Option::<HashMap<i32, String>>::decode(&mut cursor, &ctx).unwrap(),
            some
        );
    }

    #[test]
    fn map_over_ceiling_is_malformed() {
        let mut opts = DecodingOptions::test();
        opts.max_array_length = 1;
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        let mut m = HashMap::new();
        m.insert(1i32, 1i32);
        m.insert(2, 2);
        let some = Some(m);
        let bytes = some.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(Option::<HashMap<i32, i32>>::decode(&mut cursor, &ctx).is_err());
    }
}
