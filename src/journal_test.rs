use arbitrary::Unstructured;
use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};

use crate::Tree;

use super::*;

#[test]
fn test_journal() {
    use std::env;

    let seed: u64 = random();
    let mut rng = SmallRng::seed_from_u64(seed);
    println!("test_journal {}", seed);

    let name = format!("test-journal-{}", rng.gen::<u32>());
    let dir = env::temp_dir().into_os_string();
    let mut config: Config = {
        let bytes = rng.gen::<[u8; 32]>();
        let mut uns = Unstructured::new(&bytes);
        uns.arbitrary().unwrap()
    };
    config.name = name.clone();
    config.dir = dir.clone();
    config.set_fsync(false);

    let mut jn = Journal::create(config).unwrap();
    assert_eq!(jn.len().unwrap(), 0);

    let blocks: Vec<Vec<u8>> = (0..100)
        .map(|_| {
            let n = (rng.gen::<usize>() % 1024) + 1;
            (0..n).map(|_| rng.gen::<u8>()).collect()
        })
        .collect();
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(jn.append(block).unwrap(), i as u64);
    }
    assert_eq!(jn.len().unwrap(), 100);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(jn.get(i as u64).unwrap(), block.clone(), "block {}", i);
    }
    assert!(jn.get(100).is_err());

    let location = jn.to_location();
    std::mem::drop(jn);

    let mut jn = Journal::load(Config::new(&dir, &name)).unwrap();
    assert_eq!(jn.len().unwrap(), 100);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(jn.get(i as u64).unwrap(), block.clone(), "block {}", i);
    }
    std::mem::drop(jn);

    fs::remove_file(&location).unwrap();
}

#[test]
fn test_journal_torn_tail() {
    use std::env;
    use std::io::Write;

    let seed: u64 = random();
    let mut rng = SmallRng::seed_from_u64(seed);
    println!("test_journal_torn_tail {}", seed);

    let name = format!("test-journal-torn-{}", rng.gen::<u32>());
    let dir = env::temp_dir().into_os_string();
    let mut config = Config::new(&dir, &name);
    config.set_fsync(false);

    let mut jn = Journal::create(config).unwrap();
    for i in 0..10_u64 {
        jn.append(format!("block-{}", i).as_bytes()).unwrap();
    }
    let location = jn.to_location();
    std::mem::drop(jn);

    // garbage after the last whole entry
    {
        let mut fd = fs::OpenOptions::new().append(true).open(&location).unwrap();
        fd.write_all(&[0xff, 0xff, 0xff]).unwrap();
    }
    let mut jn = Journal::load(Config::new(&dir, &name)).unwrap();
    assert_eq!(jn.len().unwrap(), 10);
    assert_eq!(jn.get(9).unwrap(), b"block-9".to_vec());
    std::mem::drop(jn);

    // shear the file mid-entry
    {
        let fd = fs::OpenOptions::new().write(true).open(&location).unwrap();
        let n = fd.metadata().unwrap().len();
        fd.set_len(n - 6).unwrap();
    }
    let mut jn = Journal::load(Config::new(&dir, &name)).unwrap();
    assert_eq!(jn.len().unwrap(), 9);
    assert_eq!(jn.get(8).unwrap(), b"block-8".to_vec());

    // the dropped seq is reused by the next append
    assert_eq!(jn.append(b"block-9-redone").unwrap(), 9);
    std::mem::drop(jn);

    let mut jn = Journal::load(Config::new(&dir, &name)).unwrap();
    assert_eq!(jn.len().unwrap(), 10);
    assert_eq!(jn.get(9).unwrap(), b"block-9-redone".to_vec());
    std::mem::drop(jn);

    fs::remove_file(&location).unwrap();
}

#[test]
fn test_journal_as_tree_log() {
    use std::env;

    let seed: u64 = random();
    let mut rng = SmallRng::seed_from_u64(seed);
    println!("test_journal_as_tree_log {}", seed);

    let name = format!("test-journal-tree-{}", rng.gen::<u32>());
    let dir = env::temp_dir().into_os_string();
    let mut config = Config::new(&dir, &name);
    config.set_fsync(false);

    let mut tree = Tree::open(Journal::create(config).unwrap()).unwrap();
    for i in 0..100_usize {
        let (key, value) = (format!("key-{:03}", i), format!("value-{}", i));
        tree.put(key.as_bytes(), value.as_bytes()).unwrap();
    }
    for i in 0..100_usize {
        let (key, value) = (format!("key-{:03}", i), format!("value-{}", i));
        let block = tree.get(key.as_bytes()).unwrap().unwrap();
        assert_eq!(block.as_value(), Some(value.as_bytes()));
    }

    let location = tree.as_log().to_location();
    std::mem::drop(tree);

    let mut tree = Tree::open(Journal::load(Config::new(&dir, &name)).unwrap()).unwrap();
    let keys: Vec<Vec<u8>> = tree
        .iter()
        .unwrap()
        .map(|item| item.unwrap().as_key().to_vec())
        .collect();
    let want: Vec<Vec<u8>> =
        (0..100_usize).map(|i| format!("key-{:03}", i).into_bytes()).collect();
    assert_eq!(keys, want);
    std::mem::drop(tree);

    fs::remove_file(&location).unwrap();
}
