use std::collections::BTreeMap;
use std::convert::Infallible;

use kvpack::{
    deserialize, serialize, ConcurrentMap, DecodeError, HostMap, Key, KeyKind, MapDecoder,
    MapEncoder, MapError, OrderedMap, Reader, Reference, Tag, Value, ValueKind, Writer,
};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Point {
    x: i32,
    y: i32,
    label: String,
}

impl Point {
    fn new(x: i32, y: i32, label: &str) -> Self {
        Self {
            x,
            y,
            label: label.to_owned(),
        }
    }
}

impl Reference for Point {
    fn encode(&self, writer: &mut Writer) {
        writer.i32(self.x);
        writer.i32(self.y);
        writer.str(Some(&self.label));
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let x = reader.i32()?;
        let y = reader.i32()?;
        let label = reader.str()?.ok_or(DecodeError::NullValue)?.to_owned();
        Ok(Self { x, y, label })
    }

    fn write_json(&self, writer: &mut Writer) {
        writer.utf8(&format!(r#"{{"x":{},"y":{}}}"#, self.x, self.y));
    }
}

fn text_map<R: Reference + Ord>(entries: Vec<(&str, Value<R>)>) -> OrderedMap<R> {
    entries
        .into_iter()
        .map(|(k, v)| (Key::from(k), v))
        .collect()
}

fn roundtrip<R: Reference + Ord + std::fmt::Debug>(map: &OrderedMap<R>) {
    let bytes = serialize(map).expect("serialize");
    let back: OrderedMap<R> = deserialize(&bytes).expect("deserialize");
    assert_eq!(back.snapshot(), map.snapshot());
}

#[test]
fn scalar_kinds_roundtrip_matrix() {
    let cases: Vec<Value<Infallible>> = vec![
        Value::Text("hello".into()),
        Value::Bool(true),
        Value::I32(i32::MIN),
        Value::I64(i64::MAX),
        Value::F32(-0.125),
        Value::F64(std::f64::consts::E),
    ];
    for value in cases {
        let map = text_map(vec![("one", value.clone()), ("two", value)]);
        roundtrip(&map);
    }
}

#[test]
fn array_kinds_roundtrip_matrix() {
    let cases: Vec<Value<Infallible>> = vec![
        Value::TextArray(vec!["a".into(), "".into(), "ünï".into()]),
        Value::BoolArray(vec![true, false, true]),
        Value::I32Array(vec![1, -2, 3]),
        Value::I64Array(vec![]),
        Value::F32Array(vec![1.5, -2.5]),
        Value::F64Array(vec![0.1, 0.2, 0.3]),
    ];
    for value in cases {
        let map = text_map(vec![("k", value)]);
        roundtrip(&map);
    }
}

#[test]
fn reference_keys_and_values_roundtrip() {
    let by_point: OrderedMap<Point> = vec![
        (Key::Ref(Point::new(1, 2, "a")), Value::I64(12)),
        (Key::Ref(Point::new(3, 4, "b")), Value::I64(34)),
    ]
    .into_iter()
    .collect();
    let bytes = serialize(&by_point).unwrap();
    assert_eq!(bytes[0], Tag::new(KeyKind::Reference, ValueKind::Int64, false).encode());
    assert_eq!(*bytes.last().unwrap(), 0, "null reference terminates the map");
    roundtrip(&by_point);

    let points = text_map(vec![
        ("p", Value::Ref(Point::new(0, 0, "origin"))),
        ("q", Value::Ref(Point::new(-1, 1, ""))),
    ]);
    roundtrip(&points);

    let arrays = text_map(vec![(
        "path",
        Value::RefArray(vec![Point::new(1, 1, "s"), Point::new(2, 2, "t")]),
    )]);
    roundtrip(&arrays);
}

#[test]
fn empty_string_key_is_not_the_terminator() {
    let map = text_map::<Infallible>(vec![("", Value::I32(7))]);
    roundtrip(&map);
}

#[test]
fn empty_map_roundtrip() {
    let empty = OrderedMap::<Infallible>::new();
    assert_eq!(serialize(&empty).unwrap(), vec![Tag::EMPTY]);
    let back: OrderedMap<Infallible> = deserialize(&[Tag::EMPTY]).unwrap();
    assert!(back.is_empty());
}

#[test]
fn heterogeneous_values_are_rejected() {
    let map = text_map::<Infallible>(vec![("a", Value::I32(1)), ("b", Value::Text("x".into()))]);
    assert!(matches!(
        serialize(&map),
        Err(MapError::TypeMismatch { .. })
    ));
}

#[test]
fn heterogeneous_keys_are_rejected() {
    let map: OrderedMap<Point> = vec![
        (Key::from("a"), Value::I32(1)),
        (Key::Ref(Point::new(1, 1, "p")), Value::I32(2)),
    ]
    .into_iter()
    .collect();
    let err = serialize(&map).unwrap_err();
    assert_eq!(
        err,
        MapError::TypeMismatch {
            expected: Tag::new(KeyKind::Text, ValueKind::Int32, false),
            found: Tag::new(KeyKind::Reference, ValueKind::Int32, false),
        }
    );
}

#[test]
fn duplicate_keys_keep_last_value() {
    let mut writer = Writer::new();
    writer.u8(Tag::new(KeyKind::Text, ValueKind::Text, false).encode());
    writer.str(Some("k"));
    writer.str(Some("first"));
    writer.str(Some("other"));
    writer.str(Some("x"));
    writer.str(Some("k"));
    writer.str(Some("second"));
    writer.str(None);
    let bytes = writer.flush();

    let map: OrderedMap<Infallible> = deserialize(&bytes).unwrap();
    assert_eq!(map.size(), 2);
    assert_eq!(map.get(&Key::from("k")), Some(Value::Text("second".into())));
}

#[test]
fn trailing_bytes_after_terminator_are_ignored() {
    let map = text_map::<Infallible>(vec![("a", Value::Bool(false))]);
    let mut bytes = serialize(&map).unwrap();
    bytes.extend_from_slice(&[0xde, 0xad]);
    let back: OrderedMap<Infallible> = deserialize(&bytes).unwrap();
    assert_eq!(back, map);
}

#[test]
fn truncation_at_every_offset_fails() {
    let map = text_map::<Infallible>(vec![
        ("alpha", Value::F64Array(vec![1.0, 2.0])),
        ("beta", Value::F64Array(vec![3.0])),
    ]);
    let bytes = serialize(&map).unwrap();
    for end in 0..bytes.len() {
        let err = deserialize::<Infallible>(&bytes[..end]).unwrap_err();
        assert!(
            matches!(
                err,
                MapError::Decode(DecodeError::UnexpectedEof | DecodeError::ArrayLength { .. })
            ),
            "offset {}: {:?}",
            end,
            err
        );
    }
}

#[test]
fn invalid_reference_marker() {
    let mut writer = Writer::new();
    writer.u8(Tag::new(KeyKind::Reference, ValueKind::Boolean, false).encode());
    writer.u8(7);
    let bytes = writer.flush();
    assert_eq!(
        deserialize::<Point>(&bytes).unwrap_err(),
        MapError::Decode(DecodeError::InvalidMarker(7))
    );
}

#[test]
fn decode_into_concurrent_map() {
    let map = text_map::<Infallible>(vec![("a", Value::I64(1)), ("b", Value::I64(2))]);
    let bytes = map.serialize().unwrap();
    let back = ConcurrentMap::<Infallible>::from_bytes(&bytes).unwrap();
    assert_eq!(back.size(), 2);
    assert_eq!(back.get(&Key::from("b")), Some(Value::I64(2)));

    let mut decoder = MapDecoder::new(&bytes);
    let again: OrderedMap<Infallible> = decoder.decode().unwrap();
    assert_eq!(again, map);
    assert_eq!(decoder.reader.size(), 0);
}

#[test]
fn encoder_is_reusable_across_maps() {
    let mut encoder = MapEncoder::new();
    let first = encoder
        .encode(&text_map::<Infallible>(vec![("a", Value::I32(1))]))
        .unwrap();
    let second = encoder
        .encode(&text_map::<Infallible>(vec![("a", Value::I32(1))]))
        .unwrap();
    assert_eq!(first, second);
}

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z0-9]{0,8}"
}

proptest! {
    #[test]
    fn int_array_maps_roundtrip(
        entries in proptest::collection::btree_map(arb_key(), proptest::collection::vec(any::<i32>(), 0..8), 0..16)
    ) {
        let map: OrderedMap<Infallible> = entries
            .into_iter()
            .map(|(k, v)| (Key::Text(k), Value::I32Array(v)))
            .collect();
        let back: OrderedMap<Infallible> = deserialize(&serialize(&map).unwrap()).unwrap();
        prop_assert_eq!(back.snapshot(), map.snapshot());
    }

    #[test]
    fn float_maps_roundtrip(
        entries in proptest::collection::btree_map(arb_key(), -1.0e12f64..1.0e12, 0..16)
    ) {
        let map: OrderedMap<Infallible> = entries
            .into_iter()
            .map(|(k, v)| (Key::Text(k), Value::F64(v)))
            .collect();
        let back: OrderedMap<Infallible> = deserialize(&serialize(&map).unwrap()).unwrap();
        prop_assert_eq!(back.snapshot(), map.snapshot());
    }

    #[test]
    fn text_maps_roundtrip(entries in proptest::collection::btree_map(arb_key(), ".{0,12}", 0..16)) {
        let expected: BTreeMap<Key<Infallible>, Value<Infallible>> = entries
            .into_iter()
            .map(|(k, v)| (Key::Text(k), Value::Text(v)))
            .collect();
        let map: OrderedMap<Infallible> = expected.clone().into_iter().collect();
        let back: OrderedMap<Infallible> = deserialize(&serialize(&map).unwrap()).unwrap();
        prop_assert_eq!(back.snapshot(), expected);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = deserialize::<Point>(&bytes);
    }
}
