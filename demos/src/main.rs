//! End-to-end demonstration of the wire-codec front façade: a
//! self-referential chain and a pair of fields sharing one backing cell,
//! both round-tripped through `Encoder`/`Decoder`.

use wire_codec::{
    ContextOwned, DecodingOptions, Decoder, DescribedType, Encodable, Encoder, Recursive, Resolver,
    Source,
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

fn main() {
    env_logger::init();

    let resolver = Resolver::default();
    let source = Source::default();
    resolver.register(Node::descriptor()).expect("register Node");
    resolver.register(Pair::descriptor()).expect("register Pair");
    let ctx = ContextOwned::new(DecodingOptions::default(), resolver, source);

    let tail = Node {
        value: 3,
        next: None,
    };
    let middle = Node {
        value: 2,
        next: Some(Recursive::new(tail)),
    };
    let head = Node {
        value: 1,
        next: Some(Recursive::new(middle)),
    };

    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&head).expect("encode chain");
    let decoded: Node = Decoder::new(buf.as_slice(), &ctx).decode().expect("decode chain");
    assert_eq!(decoded, head);
    println!("chain round-tripped: {decoded:?}");

    let shared = Recursive::new(42i32);
    let pair = Pair {
        a: Some(shared.clone()),
        b: Some(shared.clone()),
    };

    let mut buf = Vec::new();
    Encoder::new(&mut buf, &ctx).encode(&pair).expect("encode pair");
    let decoded: Pair = Decoder::new(buf.as_slice(), &ctx).decode().expect("decode pair");
    let a = decoded.a.as_ref().unwrap();
    let b = decoded.b.as_ref().unwrap();
    assert_eq!(a.address(), b.address());
    println!("pair shares one backing cell: a={}, b={}", a.get(), b.get());
}
