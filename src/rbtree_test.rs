use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use simplelog::{Config, LevelFilter, TestLogger};

use crate::error::Error;
use crate::rbtree::RankTree;

#[test]
fn test_id() {
    let tree: RankTree<i64> = RankTree::new("test-rbtree");
    assert_eq!(tree.id(), "test-rbtree".to_string());
}

#[test]
fn test_empty() {
    let tree: RankTree<i64> = RankTree::new("test-rbtree");
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert!(!tree.contains(&10));
    assert_eq!(tree.rank_of(&10), 0);
    assert_eq!(tree.select(0), Err(Error::RankOutOfRange { rank: 0, size: 0 }));
    assert!(tree.iter().next().is_none());

    let stats = tree.validate().unwrap();
    assert_eq!(stats.entries(), 0);
    assert_eq!(stats.blacks(), Some(0));
    let depths = stats.depths().unwrap();
    assert_eq!((depths.samples(), depths.max()), (1, 0));
}

#[test]
fn test_scenario() {
    init_logger();
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    for key in [103, 161, 166, 261].iter() {
        assert!(tree.insert(*key));
    }
    assert!(tree.validate().is_ok());

    assert_eq!(tree.len(), 4);
    assert_eq!(tree.rank_of(&137), 1);
    assert_eq!(tree.rank_of(&161), 1);
    assert_eq!(tree.select(0), Ok(103));
    assert_eq!(tree.select(3), Ok(261));
    assert_eq!(tree.select(4), Err(Error::RankOutOfRange { rank: 4, size: 4 }));
    assert_eq!(tree.select(599), Err(Error::RankOutOfRange { rank: 599, size: 4 }));
    assert!(tree.contains(&166));
    assert!(!tree.contains(&200));
}

#[test]
fn test_insert_duplicate() {
    init_logger();
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    for key in (0..150).step_by(3) {
        assert!(tree.insert(key));
    }

    let before = snapshot(&tree, 160);
    for key in (0..150).step_by(3) {
        assert!(!tree.insert(key), "insert {}", key);
    }
    assert_eq!(snapshot(&tree, 160), before);
    assert!(tree.validate().is_ok());
}

#[test]
fn test_rank_select_inverse() {
    init_logger();
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());
    for _ in 0..2000 {
        tree.insert(rng.gen_range(-5000, 5000));
    }

    for rank in 0..tree.len() {
        let key = tree.select(rank).unwrap();
        assert_eq!(tree.rank_of(&key), rank);
    }
    for key in tree.iter() {
        assert_eq!(tree.select(tree.rank_of(&key)), Ok(key));
    }
}

#[test]
fn test_ascending_height() {
    init_logger();
    let n = 10_000_i64;
    let mut tree: RankTree<i64> = RankTree::with_capacity("test-rbtree", n as usize);
    for key in 0..n {
        assert!(tree.insert(key));
    }
    check_height(&tree, n as usize);

    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    for key in (0..n).rev() {
        assert!(tree.insert(key));
    }
    check_height(&tree, n as usize);
    assert_eq!(tree.select(0), Ok(0));
    assert_eq!(tree.select((n - 1) as usize), Ok(n - 1));
}

#[test]
fn test_stats() {
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    for key in 1..=3 {
        tree.insert(key);
    }
    assert_eq!(tree.stats().entries(), 3);
    assert!(tree.stats().depths().is_none());

    let stats = tree.validate().unwrap();
    assert_eq!(stats.entries(), 3);
    assert_eq!(stats.blacks(), Some(1));
    let depths = stats.depths().unwrap();
    assert_eq!(depths.samples(), 4);
    assert_eq!((depths.min(), depths.max()), (2, 2));
}

#[test]
fn test_dump() {
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    assert_eq!(format!("{:?}", tree), "null\n");

    for key in [2, 1, 3].iter() {
        tree.insert(*key);
    }
    let out = [
        "black 2 size:3",
        "    red 1 size:1",
        "        null",
        "        null",
        "    red 3 size:1",
        "        null",
        "        null",
    ];
    assert_eq!(format!("{:?}", tree), out.join("\n") + "\n");

    let mut dump = String::new();
    tree.dump(&mut dump).unwrap();
    assert_eq!(dump, format!("{:?}", tree));
}

#[test]
fn test_load_from() {
    let keys = vec![5, 3, 9, 5, 1, 3];
    let tree: RankTree<i64> = RankTree::load_from("test-rbtree", keys.into_iter());
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.iter().collect::<Vec<i64>>(), vec![1, 3, 5, 9]);
    assert!(tree.validate().is_ok());
}

#[test]
fn test_iter() {
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());
    let mut refkeys = RefKeys::new(1000);
    for _ in 0..1000 {
        let key = rng.gen_range(0, 10_000);
        tree.insert(key);
        refkeys.insert(key);
    }
    assert!(tree.iter().eq(refkeys.iter()));
}

#[test]
fn test_random() {
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    let mut rng = SmallRng::from_seed(make_seed().to_le_bytes());

    assert_eq!(tree.random(&mut rng), None);

    assert!(tree.insert(0));
    assert_eq!(tree.random(&mut rng), Some(0));

    for key in 1..50 {
        assert!(tree.insert(key * 7));
    }
    let mut seen = vec![false; 50];
    for _ in 0..10_000 {
        let key = tree.random(&mut rng).unwrap();
        assert_eq!(key % 7, 0);
        seen[(key / 7) as usize] = true;
    }
    assert!(seen.into_iter().all(|x| x));
}

#[test]
fn test_clear() {
    init_logger();
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    for key in 0..1000 {
        tree.insert(key * 2);
    }
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert!(!tree.contains(&10));
    assert!(tree.select(0).is_err());
    assert!(tree.validate().is_ok());

    // reuse after clear
    for key in (0..100).rev() {
        assert!(tree.insert(key));
    }
    assert_eq!(tree.len(), 100);
    assert_eq!(tree.select(42), Ok(42));
    assert!(tree.validate().is_ok());
}

#[test]
fn test_clone() {
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    for key in 0..100 {
        tree.insert(key);
    }
    let mut other = tree.clone();
    other.insert(1000);
    drop(tree);
    assert_eq!(other.len(), 101);
    assert_eq!(other.select(100), Ok(1000));
    assert!(other.validate().is_ok());
}

#[test]
fn test_borrowed_lookup() {
    let mut tree: RankTree<String> = RankTree::new("test-rbtree");
    for key in ["kiwi", "apple", "mango", "fig"].iter() {
        tree.insert(key.to_string());
    }
    assert!(tree.contains("fig"));
    assert!(!tree.contains("pear"));
    assert_eq!(tree.rank_of("lemon"), 3);
    assert_eq!(tree.select(0), Ok("apple".to_string()));
}

#[test]
fn test_error_display() {
    let err: Error<i64> = Error::RankOutOfRange { rank: 4, size: 4 };
    assert_eq!(err.to_string(), "rank 4 out of range for 4 keys");
    let err: Error<i64> = Error::SortError(3, 2);
    assert_eq!(err.to_string(), "keys out of order 3 2");
}

#[test]
fn test_differential() {
    init_logger();
    let seed = make_seed();
    println!("seed {}", seed);
    let mut rng = SmallRng::from_seed(seed.to_le_bytes());

    for _round in 0..3 {
        let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
        check_against_ref(&mut tree, &mut rng, 300, 1000);
    }
    let mut tree: RankTree<i64> = RankTree::new("test-rbtree");
    check_against_ref(&mut tree, &mut rng, 1000, 2000);
}

fn check_height(tree: &RankTree<i64>, n: usize) {
    let stats = match tree.validate() {
        Ok(stats) => stats,
        Err(err) => panic!("validate: {}", err),
    };
    assert_eq!(stats.entries(), n);
    let height = stats.depths().unwrap().max();
    let bound = 2.0 * ((n + 1) as f64).log2();
    assert!((height as f64) <= bound, "height {} bound {}", height, bound);
}

fn snapshot(tree: &RankTree<i64>, domain: i64) -> (Vec<bool>, Vec<usize>, Vec<i64>, String) {
    let contains = (0..domain).map(|k| tree.contains(&k)).collect();
    let ranks = (0..domain).map(|k| tree.rank_of(&k)).collect();
    let keys = (0..tree.len()).map(|r| tree.select(r).unwrap()).collect();
    (contains, ranks, keys, format!("{:?}", tree))
}

fn init_logger() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

fn make_seed() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

include!("./ref_test.rs");
