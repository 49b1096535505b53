//! Black-box end-to-end scenarios driven entirely through the public façade
//! (`Encoder`/`Decoder`) and `#[derive(Encodable)]`, the way a downstream
//! crate would actually use this one.

use std::io::Cursor;

use wire_codec::compound::interface::Required;
use wire_codec::{
    AnyValue, BinaryDecodable, BinaryEncodable, ContextOwned, DecodingOptions, Decoder, DescribedType,
    Encodable, Encoder, Interface, Recursive, Resolver, Source,
};

#[derive(Debug, Clone, PartialEq, Default, Encodable)]
struct Node {
    pub value: i32,
    pub next: Option<Recursive<Node>>,
}

#[derive(Debug, Clone, PartialEq, Default, Encodable)]
struct Pair {
    pub a: Option<Recursive<i32>>,
    pub b: Option<Recursive<i32>>,
}

#[derive(Debug, Clone, PartialEq, Default, Encodable)]
struct RecMap {
    pub label: String,
    pub children: Option<std::collections::HashMap<String, Option<Recursive<RecMap>>>>,
}

struct AnyThing;
impl Required for AnyThing {}

#[derive(Debug, Clone, PartialEq, Default, Encodable)]
struct Count {
    pub n: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Encodable)]
struct Holder {
    pub payload: AnyValue,
}

fn fresh_ctx() -> ContextOwned {
    ContextOwned::new(DecodingOptions::test(), Resolver::default(), Source::default())
}

#[test]
fn self_referential_node_chain_roundtrips() {
    let ctx = fresh_ctx();
    ctx.resolver().register(Node::descriptor()).unwrap();

    let tail = Node { value: 3, next: None };
    let middle = Node {
        value: 2,
        next: Some(Recursive::new(tail)),
    };
    let head = Node {
        value: 1,
        next: Some(Recursive::new(middle)),
    };

    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&head).unwrap();
    let decoded: Node = Decoder::new(Cursor::new(buf), &ctx).decode().unwrap();
    assert_eq!(decoded, head);
}

#[test]
fn pair_of_fields_sharing_one_cell_decodes_to_the_same_address() {
    let ctx = fresh_ctx();
    ctx.resolver().register(Pair::descriptor()).unwrap();

    let shared = Recursive::new(42i32);
    let pair = Pair {
        a: Some(shared.clone()),
        b: Some(shared.clone()),
    };

    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&pair).unwrap();
    let decoded: Pair = Decoder::new(Cursor::new(buf), &ctx).decode().unwrap();

    let a = decoded.a.unwrap();
    let b = decoded.b.unwrap();
    assert_eq!(a.address(), b.address());
    assert_eq!(a.get(), 42);
}

#[test]
fn self_referential_map_value_roundtrips() {
    let ctx = fresh_ctx();
    ctx.resolver().register(RecMap::descriptor()).unwrap();

    let leaf = RecMap {
        label: "leaf".to_string(),
        children: None,
    };
    let mut children = std::collections::HashMap::new();
    children.insert("only-child".to_string(), Some(Recursive::new(leaf)));
    let root = RecMap {
        label: "root".to_string(),
        children: Some(children),
    };

    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&root).unwrap();
    let decoded: RecMap = Decoder::new(Cursor::new(buf), &ctx).decode().unwrap();
    assert_eq!(decoded, root);
}

#[test]
fn interface_slot_round_trips_nil_and_populated() {
    let opts = DecodingOptions::test();
    let resolver = Resolver::default();
    let source = Source::default();
    resolver.register(Count::descriptor()).unwrap();
    source.register::<Count>().unwrap();
    let table = wire_codec::RefTable::new();
    let ctx = wire_codec::Context::with_ref_table(&opts, &resolver, &source, &table);

    let nil: Interface<AnyThing> = Interface::none();
    let bytes = nil.encode_to_vec(&ctx);
    let mut cursor = Cursor::new(bytes);
    assert!(Interface::<AnyThing>::decode(&mut cursor, &ctx)
        .unwrap()
        .is_none());

    let populated = Interface::<AnyThing>::new(Count { n: 7 });
    let bytes = populated.encode_to_vec(&ctx);
    let mut cursor = Cursor::new(bytes);
    let decoded = Interface::<AnyThing>::decode(&mut cursor, &ctx).unwrap();
    assert_eq!(decoded.expect::<Count>().unwrap(), Count { n: 7 });
}

#[test]
fn any_value_field_round_trips_through_the_facade() {
    let ctx = fresh_ctx();
    ctx.resolver().register(Holder::descriptor()).unwrap();
    ctx.resolver().register(Count::descriptor()).unwrap();
    ctx.source().register::<Count>().unwrap();

    let holder = Holder {
        payload: AnyValue::new(Count { n: 99 }),
    };

    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&holder).unwrap();
    let decoded: Holder = Decoder::new(Cursor::new(buf), &ctx).decode().unwrap();
    assert!(!decoded.payload.is_none());

    let empty = Holder {
        payload: AnyValue::none(),
    };
    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&empty).unwrap();
    let decoded: Holder = Decoder::new(Cursor::new(buf), &ctx).decode().unwrap();
    assert!(decoded.payload.is_none());
}

#[derive(Debug, Clone, PartialEq, Default, Encodable)]
struct WideRecord {
    pub name: String,
    pub age: i32,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Default, Encodable)]
struct NarrowRecord {
    pub name: String,
    pub age: i32,
}

#[test]
fn loose_struct_tolerates_a_superset_sender() {
    let mut opts = DecodingOptions::test();
    opts.strict_typing = false;
    let ctx = ContextOwned::new(opts, Resolver::default(), Source::default());

    let sent = WideRecord {
        name: "Alice".to_string(),
        age: 30,
        nickname: "Al".to_string(),
    };
    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&sent).unwrap();
    let received: NarrowRecord = Decoder::new(Cursor::new(buf), &ctx).decode().unwrap();
    assert_eq!(received.name, "Alice");
    assert_eq!(received.age, 30);
}

#[test]
fn loose_struct_tolerates_a_subset_sender() {
    let mut opts = DecodingOptions::test();
    opts.strict_typing = false;
    let ctx = ContextOwned::new(opts, Resolver::default(), Source::default());

    let sent = NarrowRecord {
        name: "Bob".to_string(),
        age: 0,
    };
    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&sent).unwrap();
    let received: WideRecord = Decoder::new(Cursor::new(buf), &ctx).decode().unwrap();
    assert_eq!(received.name, "Bob");
    assert_eq!(received.age, 0);
    assert_eq!(received.nickname, "");
}

#[test]
fn independent_top_level_operations_do_not_share_back_references() {
    // Two separate `encode` calls on the same `Encoder`, each sharing one
    // cell internally, must not have their reference tables bleed into each
    // other: decoding them back (in two separate `decode` calls) must yield
    // two independently-addressed pairs, not one shared across both.
    let ctx = fresh_ctx();
    ctx.resolver().register(Pair::descriptor()).unwrap();

    let first = Recursive::new(1i32);
    let pair1 = Pair {
        a: Some(first.clone()),
        b: Some(first.clone()),
    };
    let second = Recursive::new(2i32);
    let pair2 = Pair {
        a: Some(second.clone()),
        b: Some(second.clone()),
    };

    let mut buf = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buf, &ctx);
        encoder.encode(&pair1).unwrap();
        encoder.encode(&pair2).unwrap();
    }

    let mut decoder = Decoder::new(Cursor::new(buf), &ctx);
    let decoded1: Pair = decoder.decode().unwrap();
    let decoded2: Pair = decoder.decode().unwrap();

    let a1 = decoded1.a.unwrap();
    let b1 = decoded1.b.unwrap();
    let a2 = decoded2.a.unwrap();
    let b2 = decoded2.b.unwrap();
    assert_eq!(a1.address(), b1.address());
    assert_eq!(a2.address(), b2.address());
    assert_ne!(a1.address(), a2.address());
    assert_eq!(a1.get(), 1);
    assert_eq!(a2.get(), 2);
}

#[test]
fn truncated_length_prefixed_payload_is_rejected_not_over_read() {
    let mut opts = DecodingOptions::test();
    opts.strict_typing = false;
    let ctx = ContextOwned::new(opts, Resolver::default(), Source::default());

    let sent = WideRecord {
        name: "Carol".to_string(),
        age: 41,
        nickname: "Caz".to_string(),
    };
    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&sent).unwrap();

    // Chop off the tail: the loose frame's length-prefixed last field can no
    // longer be read in full.
    buf.truncate(buf.len() - 2);
    let result: Result<WideRecord, _> = Decoder::new(Cursor::new(buf), &ctx).decode();
    assert!(result.is_err());
}
