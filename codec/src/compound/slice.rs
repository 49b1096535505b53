// SPDX-License-Identifier: MPL-2.0

//! Slice codec (§4.2): signed-varint length prefix (`-1` = nil, `>= 0` =
//! element count), then elements back-to-back.
//!
//! Modeled as `Option<Vec<T>>` so the nil/empty distinction the distilled
//! spec requires has somewhere to live (a bare `Vec<T>` cannot represent
//! "absent" separately from "empty"). Decode always builds a fresh `Vec<T>`
//! — see `DESIGN.md`'s Open Question decision on destination-capacity reuse.
//! Grounded on this codebase's `Option<Vec<T>>` array codec in
//! `encoding.rs`.

use std::io::{Read, Write};

use crate::{
    context::Context,
    encodable::{BinaryDecodable, BinaryEncodable, EncodingResult},
    varint, Error,
};

impl<T: BinaryEncodable> BinaryEncodable for Option<Vec<T>> {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        match self {
            None => 1,
            Some(v) => 9 + v.iter().map(|e| e.byte_len(ctx)).sum::<usize>(),
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        match self {
            None => varint::write_varint_signed(stream, -1),
            Some(v) => {
                varint::write_varint_signed(stream, v.len() as i64)?;
                for element in v {
                    element.encode(stream, ctx)?;
                }
                Ok(())
            }
        }
    }
}

impl<T: BinaryDecodable> BinaryDecodable for Option<Vec<T>> {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let len = varint::read_varint_signed(stream)?;
        if len < -1 {
            return Err(Error::malformed(format!("negative slice length {len}")));
        }
        if len == -1 {
            return Ok(None);
        }
        let len = len as usize;
        if len > ctx.options().max_array_length {
            return Err(Error::malformed(format!(
                "slice length {len} exceeds ceiling {}",
                ctx.options().max_array_length
            )));
        }
        let _lease = ctx.options().depth_lock()?;
        let mut out = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            out.push(T::decode(stream, ctx)?);
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
    fn slice_nil_and_populated_roundtrip() {
        let opts = DecodingOptions::test();
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        let nil: Option<Vec<i32>> = None;
        let bytes = nil.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(Option::<Vec<i32>>::decode(&mut cursor, &ctx).unwrap(), None);

        let some = Some(vec![1, 2, 3]);
        let bytes = some.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(Option::<Vec<i32>>::decode(&mut cursor, &ctx).unwrap(), some);

        let empty: Option<Vec<i32>> = Some(Vec::new());
        let bytes = empty.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert_eq!(Option::<Vec<i32>>::decode(&mut cursor, &ctx).unwrap(), empty);
    }

    #[test]
    fn slice_over_ceiling_is_malformed() {
        let mut opts = DecodingOptions::test();
        opts.max_array_length = 2;
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        let v = Some(vec![1, 2, 3]);
        let bytes = v.encode_to_vec(&ctx);
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(Option::<Vec<i32>>::decode(&mut cursor, &ctx).is_err());
    }
}
