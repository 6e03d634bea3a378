use super::*;
use crate::wire::Child;

fn to_block(seq: u64, levels: &[Level]) -> Block {
    let record = Record {
        key: b"key".to_vec(),
        value: Some(b"value".to_vec()),
        index: wire::to_index_bytes(levels).unwrap(),
    };
    Block::from_record(seq, record)
}

#[test]
fn test_to_node() {
    let levels = vec![
        Level {
            keys: vec![2],
            children: vec![Child { seq: 3, offset: 1 }, Child { seq: 1, offset: 0 }],
        },
        Level { keys: vec![3], children: vec![] },
    ];
    let mut block = to_block(4, &levels);
    assert_eq!(block.to_seq(), 4);

    let node = block.to_node(0).unwrap();
    assert!(!node.is_leaf());
    assert_eq!(node.keys.len(), 1);
    assert_eq!(node.keys[0].seq, 2);
    assert_eq!(node.children.len(), 2);
    assert_eq!((node.children[0].seq, node.children[0].offset), (3, 1));

    // the same block hands out views at other offsets
    let node = block.to_node(1).unwrap();
    assert!(node.is_leaf());
    assert_eq!(node.keys[0].seq, 3);
}

#[test]
fn test_to_node_offset_out_of_range() {
    let levels = vec![Level { keys: vec![1], children: vec![] }];
    let mut block = to_block(1, &levels);
    assert!(matches!(block.to_node(1), Err(Error::Corrupt(_, _))));
}

#[test]
fn test_to_node_bad_child_count() {
    // a non-leaf level with one key must carry two children
    let levels = vec![Level {
        keys: vec![1],
        children: vec![Child { seq: 1, offset: 1 }],
    }];
    let mut block = to_block(2, &levels);
    assert!(matches!(block.to_node(0), Err(Error::Corrupt(_, _))));
}

#[test]
fn test_to_node_bad_blob() {
    // truncated varint in place of an index
    let record = Record { key: vec![], value: None, index: vec![0x80] };
    let mut block = Block::from_record(0, record);
    assert!(matches!(block.to_node(0), Err(Error::Corrupt(_, _))));
}
