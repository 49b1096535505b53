// SPDX-License-Identifier: MPL-2.0

//! Fixed-length array codec (§4.2): elements back-to-back, no length prefix
//! — the element count is part of the type, not the value.
//!
//! Grounded on this codebase's `Option<Vec<T>>` array codec in
//! `encoding.rs`, generalized from a runtime-length OPC-UA array to a
//! compile-time-length Rust `[T; N]`.

use std::io::{Read, Write};

use crate::{
    context::Context,
    encodable::{BinaryDecodable, BinaryEncodable, EncodingResult},
};

impl<T: BinaryEncodable, const N: usize> BinaryEncodable for [T; N] {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        self.iter().map(|v| v.byte_len(ctx)).sum()
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        for element in self {
            element.encode(stream, ctx)?;
        }
        Ok(())
    }
}

impl<T: BinaryDecodable, const N: usize> BinaryDecodable for [T; N] {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let _lease = ctx.options().depth_lock()?;
        // `std::array::try_from_fn` is unstable; build a `Vec` of exactly
        // `N` elements (propagating the first decode error) and convert.
        let mut elements = Vec::with_capacity(N);
        for _ in 0..N {
            elements.push(T::decode(stream, ctx)?);
        }
        match elements.try_into() {
            Ok(array) => Ok(array),
            Err(_) => unreachable!("exactly N elements were pushed above"),
        }
    }
}
