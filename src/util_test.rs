use super::*;

#[test]
fn test_cbor_bytes() {
    let val: u64 = 0x00de_adbe_ef00_1234;
    let data = into_cbor_bytes(val).unwrap();
    let (out, n) = from_cbor_bytes::<u64>(&data).unwrap();
    assert_eq!(out, val);
    assert_eq!(n, data.len());

    let val: Vec<u8> = b"hello world".to_vec();
    let data = into_cbor_bytes(val.clone()).unwrap();
    let (out, n) = from_cbor_bytes::<Vec<u8>>(&data).unwrap();
    assert_eq!(out, val);
    assert_eq!(n, data.len());
}

#[test]
fn test_from_cbor_bytes_garbage() {
    assert!(from_cbor_bytes::<u64>(&[]).is_err());
    assert!(from_cbor_bytes::<u64>(&[0xff, 0xff, 0xff]).is_err());
}
