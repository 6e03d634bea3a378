use super::*;

#[test]
fn test_memlog() {
    let mut log = MemLog::new();
    log.ready().unwrap();
    assert_eq!(log.len().unwrap(), 0);

    assert_eq!(log.append(b"zero").unwrap(), 0);
    assert_eq!(log.append(b"one").unwrap(), 1);
    assert_eq!(log.len().unwrap(), 2);

    assert_eq!(log.get(0).unwrap(), b"zero".to_vec());
    assert_eq!(log.get(1).unwrap(), b"one".to_vec());
    assert!(log.get(2).is_err());
}

#[test]
fn test_memlog_truncate() {
    let mut log = MemLog::new();
    assert_eq!(log.append(b"zero").unwrap(), 0);
    assert_eq!(log.append(b"one").unwrap(), 1);
    assert_eq!(log.append(b"two").unwrap(), 2);

    log.truncate(1).unwrap();
    assert_eq!(log.len().unwrap(), 1);
    assert!(log.get(1).is_err());

    // appends after truncation reuse the dropped seq numbers
    assert_eq!(log.append(b"uno").unwrap(), 1);
    assert_eq!(log.get(1).unwrap(), b"uno".to_vec());
}
