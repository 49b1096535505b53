// SPDX-License-Identifier: MPL-2.0

//! Shared struct-codec machinery (§4.2): the field-id hash used by the loose
//! struct wire form, and the loose frame reader/writer the derive macro's
//! generated code calls into.
//!
//! The strict struct codec needs no shared helpers beyond what the derive
//! macro emits directly (fields are written back-to-back in ascending
//! lexical-name order with no per-field framing, since both ends must already
//! agree on the exact field list for a strict match to succeed at all). The
//! loose struct codec is the opposite: every field is self-delimiting, so a
//! decoder can skip fields it doesn't recognize and default fields the wire
//! never sent — this module carries that machinery once for every generated
//! type rather than duplicating it per struct.
//!
//! Grounded on this crate's `write_byte_string`/length-prefixed-payload idiom
//! in `encoding.rs`, generalized from "one opaque payload" to "one
//! field-id-tagged payload per struct field".

use std::collections::HashMap;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::hash::Hasher as _;
use twox_hash::XxHash32;

use crate::{
    context::Context,
    encodable::{BinaryDecodable, BinaryEncodable},
    Error,
};

/// Stable 32-bit identifier for a field name, used by the loose struct wire
/// form instead of positional ordering. Collisions between two fields of the
/// same struct are a derive-macro-time concern (see `DESIGN.md`), not
/// something this function guards against at run time.
pub fn field_id(name: &str) -> u32 {
    let mut hasher = XxHash32::with_seed(0);
    hasher.write(name.as_bytes());
    hasher.finish() as u32
}

/// Accumulates a loose struct's fields before writing them, so the field
/// count can be written as a header before any field entry.
#[derive(Default)]
pub struct LooseFrameWriter {
    fields: Vec<(u32, Vec<u8>)>,
}

impl LooseFrameWriter {
    /// Encode one field's value into the frame under `id`.
    pub fn push<T: BinaryEncodable>(&mut self, id: u32, value: &T, ctx: &Context<'_>) -> Result<(), Error> {
        let mut payload = Vec::with_capacity(value.byte_len(ctx));
        value.encode(&mut payload, ctx)?;
        self.fields.push((id, payload));
        Ok(())
    }

    /// Upper-bound byte length of the finished frame.
    pub fn byte_len(&self) -> usize {
        4 + self
            .fields
            .iter()
            .map(|(_, payload)| 4 + 4 + payload.len())
            .sum::<usize>()
    }

    /// Write the accumulated frame: a `uint32` field count, then each field
    /// as `(4-byte little-endian id, 4-byte little-endian payload length,
    /// payload bytes)` — the exact framing §6's wire table binds the loose
    /// struct form to.
    pub fn finish<S: Write + ?Sized>(self, stream: &mut S) -> Result<(), Error> {
        stream.write_u32::<LittleEndian>(self.fields.len() as u32)?;
        for (id, payload) in self.fields {
            stream.write_u32::<LittleEndian>(id)?;
            stream.write_u32::<LittleEndian>(payload.len() as u32)?;
            stream.write_all(&payload)?;
        }
        Ok(())
    }
}

/// A decoded loose struct frame: every field the wire sent, keyed by its
/// field-id, still in encoded form until [`Self::decode_field`] is asked for
/// a particular one. Fields the destination type doesn't recognize are kept
/// in the map but never looked up (the "superset" half of §4.2's loose
/// struct matching); fields the destination expects but the wire never sent
/// resolve to [`Default::default`] (the "subset" half).
pub struct LooseFrame {
    fields: HashMap<u32, Vec<u8>>,
}

impl LooseFrame {
    /// Read a frame written by [`LooseFrameWriter::finish`].
    pub fn read<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> Result<Self, Error> {
        let count = stream.read_u32::<LittleEndian>()? as usize;
        if count > ctx.options().max_array_length {
            return Err(Error::malformed(format!(
                "struct field count {count} exceeds ceiling {}",
                ctx.options().max_array_length
            )));
        }
        let mut fields = HashMap::with_capacity(count.min(64));
        for _ in 0..count {
            let id = stream.read_u32::<LittleEndian>()?;
            let len = stream.read_u32::<LittleEndian>()? as usize;
            if len > ctx.options().max_message_size {
                return Err(Error::malformed(format!(
                    "struct field payload length {len} exceeds ceiling {}",
                    ctx.options().max_message_size
                )));
            }
            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload)?;
            fields.insert(id, payload);
        }
        Ok(Self { fields })
    }

    /// Decode the field stored under `id`, or `T::default()` if the wire
    /// never sent it.
    pub fn decode_field<T: BinaryDecodable + Default>(&self, id: u32, ctx: &Context<'_>) -> Result<T, Error> {
        match self.fields.get(&id) {
            Some(payload) => {
                let mut cursor = std::io::Cursor::new(payload.as_slice());
                T::decode(&mut cursor, ctx)
            }
            None => Ok(T::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DecodingOptions;
    use crate::resolver::Resolver;
    use crate::source::Source;

    #[test]
    fn loose_struct_superset_ignores_unknown_field() {
        let opts = DecodingOptions::loose();
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        // Sender has { name: String, age: i32, nickname: String }.
        let mut writer = LooseFrameWriter::default();
        writer.push(field_id("name"), &"Alice".to_string(), &ctx).unwrap();
        writer.push(field_id("age"), &30i32, &ctx).unwrap();
        writer
            .push(field_id("nickname"), &"Al".to_string(), &ctx)
            .unwrap();
        let mut buf = Vec::new();
        writer.finish(&mut buf).unwrap();

        // Receiver only knows { name, age } — the extra field is dropped.
        let mut cursor = std::io::Cursor::new(buf);
        let frame = LooseFrame::read(&mut cursor, &ctx).unwrap();
        let name: String = frame.decode_field(field_id("name"), &ctx).unwrap();
        let age: i32 = frame.decode_field(field_id("age"), &ctx).unwrap();
        assert_eq!(name, "Alice");
        assert_eq!(age, 30);
    }

    #[test]
    fn loose_struct_subset_defaults_missing_field() {
        let opts = DecodingOptions::loose();
        let resolver = Resolver::default();
        let source = Source::default();
        let ctx = Context::new(&opts, &resolver, &source);

        // Sender only has { name: String }.
        let mut writer = LooseFrameWriter::default();
        writer.push(field_id("name"), &"Bob".to_string(), &ctx).unwrap();
        let mut buf = Vec::new();
        writer.finish(&mut buf).unwrap();

        // Receiver expects { name, age } — missing `age` defaults to 0.
        let mut cursor = std::io::Cursor::new(buf);
        let frame = LooseFrame::read(&mut cursor, &ctx).unwrap();
        let name: String = frame.decode_field(field_id("name"), &ctx).unwrap();
        let age: i32 = frame.decode_field(field_id("age"), &ctx).unwrap();
        assert_eq!(name, "Bob");
        assert_eq!(age, 0);
    }
}
