//! Ordered set of unique keys, backed by a red-black tree whose nodes
//! count their subtree, so that rank and select run in O(log n).
//!
//! ```
//! use rank_rbtree::{Error, RankTree};
//!
//! let mut tree: RankTree<i32> = RankTree::new("example");
//! for key in [103, 161, 166, 261].iter() {
//!     assert!(tree.insert(*key));
//! }
//! assert!(!tree.insert(166));
//!
//! assert_eq!(tree.rank_of(&137), 1);
//! assert_eq!(tree.rank_of(&161), 1);
//! assert_eq!(tree.select(0), Ok(103));
//! assert_eq!(tree.select(3), Ok(261));
//! assert_eq!(tree.select(4), Err(Error::RankOutOfRange { rank: 4, size: 4 }));
//! ```

mod arena;
mod depth;
mod error;
mod rbtree;

pub use crate::depth::Depth;
pub use crate::error::Error;
pub use crate::rbtree::{Iter, RankTree, Stats};

#[cfg(test)]
mod rbtree_test;
