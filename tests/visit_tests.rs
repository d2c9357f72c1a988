use binlog_core::shape::{IntegerKind, Shape, SizeKind};
use binlog_core::visit::{encode_value, visit, visit_tag, Value};
use binlog_core::{to_bytes, Classify, Error};

#[test]
fn test_empty_input() {
    let data: Vec<u8> = Vec::new();
    let err = visit_tag("i", &mut data.as_slice()).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput { .. }));
}

#[test]
fn test_primitive_types() {
    let bytes = to_bytes(&(42i32, true, 3.25f64, -7i8, 250u8)).unwrap();
    let mut source = bytes.as_slice();

    let value = visit_tag("(iydbB)", &mut source).unwrap();
    assert_eq!(
        value,
        Value::Aggregate(vec![
            Value::Signed(42),
            Value::Bool(true),
            Value::Float(3.25),
            Value::Signed(-7),
            Value::Unsigned(250),
        ])
    );
    assert!(source.is_empty(), "visit should consume the whole record");
}

#[test]
fn test_multiple_records() {
    let mut stream = Vec::<u8>::new();
    for i in 0..3u32 {
        binlog_core::serialize(&(i, format!("record {i}")), &mut stream).unwrap();
    }

    let shape = <(u32, String)>::shape();
    let mut source = stream.as_slice();
    let mut rendered = Vec::new();
    while !source.is_empty() {
        rendered.push(visit(&shape, &mut source).unwrap().to_string());
    }

    assert_eq!(rendered, ["(0, record 0)", "(1, record 1)", "(2, record 2)"]);
}

#[test]
fn test_sequences() {
    let bytes = to_bytes(&(vec![[1u16, 2], [3, 4]], [true, false, true], vec!["x".to_string()])).unwrap();

    let value = visit_tag("([[2S[3y[[c)", &mut bytes.as_slice()).unwrap();
    assert_eq!(value.to_string(), "([[1, 2], [3, 4]], [true, false, true], [x])");
}

#[test]
fn test_f32_widens() {
    let bytes = to_bytes(&0.5f32).unwrap();
    assert_eq!(visit_tag("f", &mut bytes.as_slice()).unwrap(), Value::Float(0.5));
}

#[test]
fn test_wrong_shape_fails() {
    let bytes = to_bytes(&7u16).unwrap();
    assert!(visit_tag("L", &mut bytes.as_slice()).is_err());
    assert!(matches!(
        visit_tag("q", &mut bytes.as_slice()),
        Err(Error::InvalidTag { .. })
    ));
}

#[test]
fn test_encode_matches_typed_encoder() {
    let typed = (5u8, vec![true, true, false], [-1i32, 2], "label".to_string());
    let expected = to_bytes(&typed).unwrap();
    let shape = <(u8, Vec<bool>, [i32; 2], String)>::shape();

    let value = visit(&shape, &mut expected.as_slice()).unwrap();
    let mut encoded = Vec::<u8>::new();
    encode_value(&shape, &value, &mut encoded).unwrap();

    assert_eq!(encoded, expected, "dynamic encoding should reproduce the typed bytes");
}

#[test]
fn test_encode_rejects_wrong_fixed_size() {
    let shape = Shape::sequence(Shape::Integer(IntegerKind::I32), SizeKind::Fixed(3));
    let value = Value::Sequence(vec![Value::Signed(1), Value::Signed(2)]);

    let err = encode_value(&shape, &value, &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { expected: 3, actual: 2 }));
}

#[test]
fn test_encode_rejects_mismatched_value() {
    let err = encode_value(&Shape::String, &Value::Bool(true), &mut Vec::<u8>::new()).unwrap_err();
    match err {
        Error::ShapeMismatch { shape, value } => {
            assert_eq!(shape, "[c");
            assert_eq!(value, "true");
        }
        other => panic!("expected a shape mismatch, got {other:?}"),
    }

    let fields = Shape::Aggregate(vec![Shape::Bool, Shape::Bool]);
    let err = encode_value(&fields, &Value::Aggregate(vec![Value::Bool(false)]), &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { expected: 2, actual: 1 }));
}
