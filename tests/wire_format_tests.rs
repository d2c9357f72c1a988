use binlog_core::to_bytes;
use std::collections::LinkedList;

fn prefix(n: u32) -> Vec<u8> {
    n.to_ne_bytes().to_vec()
}

#[test]
fn test_primitive_layout() {
    assert_eq!(to_bytes(&true).unwrap(), [1]);
    assert_eq!(to_bytes(&false).unwrap(), [0]);
    assert_eq!(to_bytes(&-2i8).unwrap(), [0xfe]);
    assert_eq!(to_bytes(&0x1234u16).unwrap(), 0x1234u16.to_ne_bytes());
    assert_eq!(to_bytes(&-5i64).unwrap(), (-5i64).to_ne_bytes());
    assert_eq!(to_bytes(&1.5f32).unwrap(), 1.5f32.to_ne_bytes());
    assert_eq!(to_bytes(&-0.25f64).unwrap(), (-0.25f64).to_ne_bytes());
}

#[test]
fn test_string_layout() {
    let mut expected = prefix(6);
    expected.extend_from_slice(b"foobar");
    assert_eq!(to_bytes("foobar").unwrap(), expected);

    assert_eq!(to_bytes(&String::new()).unwrap(), prefix(0), "an empty string is only its prefix");
}

#[test]
fn test_fixed_array_has_no_prefix() {
    let bytes = to_bytes(&[1u16, 2, 3]).unwrap();

    let mut expected = Vec::new();
    for v in [1u16, 2, 3] {
        expected.extend_from_slice(&v.to_ne_bytes());
    }
    assert_eq!(bytes, expected);

    assert!(to_bytes(&[0u32; 0]).unwrap().is_empty(), "an empty array encodes to nothing");
}

#[test]
fn test_variable_sequence_layout() {
    let list: LinkedList<i32> = [7, -1].into_iter().collect();

    let mut expected = prefix(2);
    expected.extend_from_slice(&7i32.to_ne_bytes());
    expected.extend_from_slice(&(-1i32).to_ne_bytes());

    assert_eq!(to_bytes(&list).unwrap(), expected);
    assert_eq!(to_bytes(&vec![7i32, -1]).unwrap(), expected, "containers of one shape encode identically");
}

#[test]
fn test_bool_packing() {
    let flags = vec![true, false, true, true, false, false, false, false, true];

    let mut expected = prefix(9);
    expected.extend_from_slice(&[0b0000_1101, 0b0000_0001]);
    assert_eq!(to_bytes(&flags).unwrap(), expected);

    assert_eq!(to_bytes(&[false, true]).unwrap(), [0b10], "fixed bool arrays pack without a prefix");
    assert_eq!(to_bytes(&Vec::<bool>::new()).unwrap(), prefix(0));
}

#[test]
fn test_bool_packing_across_chunks() {
    let flags: Vec<bool> = (0..2049).map(|i| i == 2048).collect();
    let bytes = to_bytes(&flags).unwrap();

    assert_eq!(bytes.len(), 4 + 257);
    assert!(bytes[4..260].iter().all(|&b| b == 0), "only the last flag is set");
    assert_eq!(bytes[260], 1);
}

#[test]
fn test_aggregate_layout() {
    let bytes = to_bytes(&(1u8, "a", [true])).unwrap();

    let mut expected = vec![1u8];
    expected.extend(prefix(1));
    expected.push(b'a');
    expected.push(1);
    assert_eq!(bytes, expected);

    assert!(to_bytes(&()).unwrap().is_empty());
}

#[test]
fn test_nested_sequence_layout() {
    let bytes = to_bytes(&vec![vec![5u8], vec![]]).unwrap();

    let mut expected = prefix(2);
    expected.extend(prefix(1));
    expected.push(5);
    expected.extend(prefix(0));
    assert_eq!(bytes, expected);
}
