use std::{error, fmt};

/// Error enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, PartialEq)]
pub enum Error<K>
where
    K: Clone + Ord,
{
    /// Returned by select() API when `rank` is not less than the number
    /// of keys held by the tree.
    RankOutOfRange { rank: usize, size: usize },
    /// Fatal case, root node is colored red.
    RedRoot,
    /// Fatal case, a red node has a red child.
    ConsecutiveReds,
    /// Fatal case, black height differs between left and right child.
    /// The String component of this variant can be used for debugging.
    UnbalancedBlacks(String),
    /// Fatal case, index entries are not in sort-order.
    SortError(K, K),
    /// Fatal case, subtree-size counter does not match the subtree.
    SizeMismatch(String),
    /// Fatal case, child's parent back-reference points elsewhere.
    BrokenParent(String),
}

impl<K> fmt::Display for Error<K>
where
    K: Clone + Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::RankOutOfRange { rank, size } => {
                write!(f, "rank {} out of range for {} keys", rank, size)
            }
            Error::RedRoot => write!(f, "root node is red"),
            Error::ConsecutiveReds => write!(f, "consecutive red nodes"),
            Error::UnbalancedBlacks(msg) => write!(f, "unbalanced blacks, {}", msg),
            Error::SortError(a, b) => write!(f, "keys out of order {:?} {:?}", a, b),
            Error::SizeMismatch(msg) => write!(f, "size mismatch, {}", msg),
            Error::BrokenParent(msg) => write!(f, "broken parent link, {}", msg),
        }
    }
}

impl<K> error::Error for Error<K> where K: Clone + Ord + fmt::Debug {}
