use std::{borrow::Borrow, cmp::Ordering, fmt, mem};

use log::{debug, trace};
use rand::Rng;

use crate::arena::{Arena, NodeId};
use crate::depth::Depth;
use crate::error::Error;

/// RankTree manage a single instance of in-memory ordered set using a
/// [red-black][rbtree] tree, where every node also counts the nodes in
/// its subtree. The counters answer [`RankTree::rank_of`] and
/// [`RankTree::select`] in O(log n).
///
/// Nodes hold a back-reference to their parent, and all of them are
/// owned by the tree through a slot arena.
///
/// [rbtree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
#[derive(Clone)]
pub struct RankTree<K>
where
    K: Clone + Ord,
{
    name: String,
    nodes: Arena<Node<K>>,
    root: Option<NodeId>,
}

/// Different ways to construct a new RankTree instance.
impl<K> RankTree<K>
where
    K: Clone + Ord,
{
    /// Create an empty instance of RankTree, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> RankTree<K>
    where
        S: AsRef<str>,
    {
        RankTree::with_capacity(name, 0)
    }

    /// Same as new(), but make room for `capacity` keys upfront.
    pub fn with_capacity<S>(name: S, capacity: usize) -> RankTree<K>
    where
        S: AsRef<str>,
    {
        RankTree {
            name: name.as_ref().to_string(),
            nodes: Arena::with_capacity(capacity),
            root: Default::default(),
        }
    }

    /// Create a new instance of RankTree and load it with keys from
    /// `iter`. Keys repeated in `iter` are loaded only once.
    pub fn load_from<S, I>(name: S, iter: I) -> RankTree<K>
    where
        S: AsRef<str>,
        I: Iterator<Item = K>,
    {
        let mut tree = RankTree::new(name);
        for key in iter {
            tree.insert(key);
        }
        tree
    }
}

/// Maintenance API.
impl<K> RankTree<K>
where
    K: Clone + Ord,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating RankTree instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of keys in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.size_of(self.root)
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Return quickly with basic statisics, only entries() and
    /// node_size() are valid with this statisics.
    pub fn stats(&self) -> Stats {
        Stats::new(self.len(), mem::size_of::<Node<K>>())
    }

    /// Release every key held by this instance. The instance can be
    /// used again afterwards.
    pub fn clear(&mut self) {
        self.teardown()
    }

    /// Validate the tree with following rules:
    ///
    /// * Root node is black.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Number of blacks should be same under left child and right child.
    /// * Make sure keys are in sorted order.
    /// * Subtree size of every node is one more than its children's.
    /// * Children point back to their parent.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, Error<K>> {
        if self.is_red(self.root) {
            return Err(Error::RedRoot);
        }
        if let Some(root) = self.root {
            if let Some(parent) = self.node(root).parent {
                let err = format!("root has parent {:?}", parent);
                return Err(Error::BrokenParent(err));
            }
        }

        let mut stats = Stats::new(self.len(), mem::size_of::<Node<K>>());
        stats.set_depths(Depth::new());
        let bounds = (None, None);
        let (blacks, _) = self.validate_tree(self.root, bounds, false, 0, 0, &mut stats)?;
        stats.set_blacks(blacks);
        Ok(stats)
    }
}

/// Read operations on RankTree instance.
impl<K> RankTree<K>
where
    K: Clone + Ord,
{
    /// Check whether key is present in the tree.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut curr = self.root;
        while let Some(id) = curr {
            let node = self.node(id);
            curr = match node.key.borrow().cmp(key) {
                Ordering::Less => node.right,
                Ordering::Greater => node.left,
                Ordering::Equal => return true,
            };
        }
        false
    }

    /// Return the number of keys in the tree that are strictly less
    /// than `key`. The key itself need not be present.
    pub fn rank_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.do_rank_of(self.root, key)
    }

    /// Return the key having exactly `rank` smaller keys in the tree,
    /// that is, the smallest key is at rank 0. Return error if tree
    /// has `rank` keys or fewer.
    pub fn select(&self, rank: usize) -> Result<K, Error<K>> {
        match self.do_select(self.root, rank) {
            Some(key) => Ok(key.clone()),
            None => Err(Error::RankOutOfRange {
                rank,
                size: self.len(),
            }),
        }
    }

    /// Return a random key from this index, every key being equally
    /// likely.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<K> {
        match self.len() {
            0 => None,
            n => self.select(rng.gen_range(0, n)).ok(),
        }
    }

    /// Return an iterator over all keys in this instance, in sort order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tree: self,
            next: self.root.map(|root| self.leftmost(root)),
        }
    }

    /// Render color, key and subtree size of every node, one node per
    /// line and children indented below their parent.
    pub fn dump<W>(&self, out: &mut W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Debug,
    {
        self.dump_node(self.root, 0, out)
    }
}

/// Write operations on RankTree instance.
impl<K> RankTree<K>
where
    K: Clone + Ord,
{
    /// Insert key into the tree. Return true if key was added and false
    /// if key was already present, in which case the tree is left as is.
    pub fn insert(&mut self, key: K) -> bool {
        match self.insert_key(key) {
            Some(id) => {
                self.fixup_from(id);
                true
            }
            None => false,
        }
    }
}

impl<K> RankTree<K>
where
    K: Clone + Ord,
{
    #[inline]
    fn node(&self, id: NodeId) -> &Node<K> {
        self.nodes.get(id)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K> {
        self.nodes.get_mut(id)
    }

    #[inline]
    fn size_of(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |id| self.node(id).size)
    }

    #[inline]
    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.map_or(false, |id| self.node(id).color == Color::Red)
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color
    }

    fn is_left_child(&self, id: NodeId) -> bool {
        match self.node(id).parent {
            Some(parent) => self.node(parent).left == Some(id),
            None => false,
        }
    }

    // other child of node's parent.
    fn sibling_of(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(self.node(id).parent?);
        if parent.left == Some(id) {
            parent.right
        } else {
            parent.left
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.node(id).right {
            return Some(self.leftmost(right));
        }
        let mut id = id;
        loop {
            let parent = self.node(id).parent?;
            if self.node(parent).left == Some(id) {
                return Some(parent);
            }
            id = parent;
        }
    }

    // Plain BST insert. Locate the empty position first, so that a
    // duplicate key leaves the tree untouched, then wire in a new node
    // and bump the size of every ancestor.
    fn insert_key(&mut self, key: K) -> Option<NodeId> {
        let (mut parent, mut curr, mut is_left) = (None, self.root, false);
        while let Some(id) = curr {
            let node = self.node(id);
            parent = Some(id);
            curr = match node.key.cmp(&key) {
                Ordering::Greater => {
                    is_left = true;
                    node.left
                }
                Ordering::Less => {
                    is_left = false;
                    node.right
                }
                Ordering::Equal => return None,
            };
        }

        let id = self.nodes.alloc(Node::new(key, parent));
        match parent {
            None => self.root = Some(id),
            Some(pid) if is_left => self.node_mut(pid).left = Some(id),
            Some(pid) => self.node_mut(pid).right = Some(id),
        }

        let mut up = parent;
        while let Some(aid) = up {
            let ancestor = self.node_mut(aid);
            ancestor.size += 1;
            up = ancestor.parent;
        }
        Some(id)
    }

    // Restore red-black properties, treating the tree as a 2-3-4 tree
    // where a black node and its red children form one 2-3-4 node.
    //
    //           G
    //          / \
    //         P   A
    //        / \
    //       N   S
    //
    fn fixup_from(&mut self, mut node: NodeId) {
        loop {
            let parent = match self.node(node).parent {
                Some(parent) => parent,
                None => break, // root stays black.
            };
            let grandparent = self.node(parent).parent;
            let sibling = self.sibling_of(node);
            let aunt = self.sibling_of(parent);
            let parent_red = self.is_red(Some(parent));

            if !parent_red && !self.is_red(sibling) {
                trace!("{}: insert into 2-node", self.name);
                self.set_color(node, Color::Red);
                break;
            }

            if !parent_red {
                trace!("{}: insert into 3-node, black parent", self.name);
                self.set_color(node, Color::Red);
                break;
            }

            // a red parent is never the root.
            let grandparent = match grandparent {
                Some(grandparent) => grandparent,
                None => panic!("fixup_from(): red root ? Call the programmer"),
            };

            if !self.is_red(aunt) {
                if self.is_left_child(node) != self.is_left_child(parent) {
                    //       B           B           N           B
                    //      / \         / \         / \         / \
                    //     R   B  -->  N   B  -->  R   B  -->  R   R
                    //      \         /                 \           \
                    //       N       R                   B           B
                    //
                    trace!("{}: insert into 3-node, zig-zag", self.name);
                    self.rotate_with_parent(node);
                    self.rotate_with_parent(node);
                    self.set_color(grandparent, Color::Red);
                } else {
                    //       B           R           B
                    //      / \         / \         / \
                    //     R   B  -->  N   B  -->  R   R
                    //    /                 \           \
                    //   N                   B           B
                    //
                    trace!("{}: insert into 3-node, zig-zig", self.name);
                    self.rotate_with_parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(node, Color::Red);
                    self.set_color(grandparent, Color::Red);
                }
                break;
            }

            // Split a 4-node, the grandparent's key is kicked up one level
            // and inserted into the 2-3-4 node above.
            trace!("{}: insert into 4-node, split", self.name);
            self.set_color(parent, Color::Black);
            if let Some(aunt) = aunt {
                self.set_color(aunt, Color::Black);
            }
            self.set_color(node, Color::Red);
            node = grandparent;
        }
    }

    //       (gp)                   (gp)
    //        |                      |
    //       parent                 node
    //        /  \                  / \
    //      node  c      -->       a  parent
    //      / \                        /  \
    //     a  middle               middle  c
    //
    // And its mirror image when node is the right child.
    fn rotate_with_parent(&mut self, node: NodeId) {
        let parent = match self.node(node).parent {
            Some(parent) => parent,
            None => panic!("rotate_with_parent(): rotating the root ? Call the programmer"),
        };
        let grandparent = self.node(parent).parent;

        let middle = if self.node(parent).left == Some(node) {
            let middle = self.node(node).right;
            self.node_mut(node).right = Some(parent);
            self.node_mut(parent).left = middle;
            middle
        } else {
            let middle = self.node(node).left;
            self.node_mut(node).left = Some(parent);
            self.node_mut(parent).right = middle;
            middle
        };

        // only the two rotated nodes change their subtree size.
        let size = self.node(parent).size;
        self.node_mut(node).size = size;
        let (left, right) = (self.node(parent).left, self.node(parent).right);
        let size = 1 + self.size_of(left) + self.size_of(right);
        self.node_mut(parent).size = size;

        match grandparent {
            Some(gp) if self.node(gp).left == Some(parent) => {
                self.node_mut(gp).left = Some(node)
            }
            Some(gp) => self.node_mut(gp).right = Some(node),
            None => self.root = Some(node),
        }

        if let Some(middle) = middle {
            self.node_mut(middle).parent = Some(parent);
        }
        self.node_mut(node).parent = grandparent;
        self.node_mut(parent).parent = Some(node);
    }

    fn do_rank_of<Q>(&self, id: Option<NodeId>, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = match id {
            Some(id) => self.node(id),
            None => return 0,
        };
        match node.key.borrow().cmp(key) {
            Ordering::Greater => self.do_rank_of(node.left, key),
            Ordering::Less => 1 + self.size_of(node.left) + self.do_rank_of(node.right, key),
            Ordering::Equal => self.size_of(node.left),
        }
    }

    fn do_select(&self, id: Option<NodeId>, rank: usize) -> Option<&K> {
        let node = self.node(id?);
        let left_count = self.size_of(node.left);
        match rank.cmp(&left_count) {
            Ordering::Less => self.do_select(node.left, rank),
            Ordering::Equal => Some(&node.key),
            Ordering::Greater => self.do_select(node.right, rank - left_count - 1),
        }
    }

    // Release all nodes without recursion and with O(1) extra space. If
    // the root has no left child release it and move on to its right
    // child, else rotate right at the root, which shrinks the root's
    // right subtree by one node. Colors, sizes and parent links are
    // left stale, they die with the nodes.
    fn teardown(&mut self) {
        if self.root.is_some() {
            debug!("{}: teardown {} nodes", self.name, self.nodes.len());
        }
        while let Some(root) = self.root {
            let left = self.node(root).left;
            match left {
                None => {
                    let node = self.nodes.take(root);
                    self.root = node.right;
                }
                Some(left) => {
                    let middle = self.node(left).right;
                    self.node_mut(root).left = middle;
                    self.node_mut(left).right = Some(root);
                    self.root = Some(left);
                }
            }
        }
        self.nodes.clear();
    }

    // Return (black-height, subtree-size). Every key in the subtree must
    // lie strictly between `bounds`, an absent bound is open.
    fn validate_tree(
        &self,
        id: Option<NodeId>,
        bounds: (Option<&K>, Option<&K>),
        fromred: bool,
        mut nb: usize,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<(usize, usize), Error<K>> {
        let id = match id {
            Some(id) => id,
            None => {
                if let Some(depths) = stats.depths.as_mut() {
                    depths.sample(depth);
                }
                return Ok((nb, 0));
            }
        };

        let red = self.is_red(Some(id));
        if fromred && red {
            return Err(Error::ConsecutiveReds);
        }
        if !red {
            nb += 1;
        }

        let node = self.node(id);
        let (lower, upper) = bounds;
        match lower {
            Some(lower) if node.key.le(lower) => {
                return Err(Error::SortError(node.key.clone(), lower.clone()));
            }
            _ => (),
        }
        match upper {
            Some(upper) if node.key.ge(upper) => {
                return Err(Error::SortError(node.key.clone(), upper.clone()));
            }
            _ => (),
        }

        let (left, right) = (node.left, node.right);
        let lbounds = (lower, Some(&node.key));
        let (lblacks, lsize) = self.validate_tree(left, lbounds, red, nb, depth + 1, stats)?;
        let rbounds = (Some(&node.key), upper);
        let (rblacks, rsize) = self.validate_tree(right, rbounds, red, nb, depth + 1, stats)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(Error::UnbalancedBlacks(err));
        }
        if node.size != 1 + lsize + rsize {
            let err = format!("size: {} left: {} right: {}", node.size, lsize, rsize);
            return Err(Error::SizeMismatch(err));
        }
        for child in left.into_iter().chain(right) {
            if self.node(child).parent != Some(id) {
                let err = format!("{:?} under {:?}", child, id);
                return Err(Error::BrokenParent(err));
            }
        }
        Ok((lblacks, node.size))
    }

    fn dump_node<W>(&self, id: Option<NodeId>, indent: usize, out: &mut W) -> fmt::Result
    where
        W: fmt::Write,
        K: fmt::Debug,
    {
        let node = match id {
            Some(id) => self.node(id),
            None => return writeln!(out, "{:indent$}null", "", indent = indent),
        };
        writeln!(
            out,
            "{:indent$}{} {:?} size:{}",
            "",
            node.color,
            node.key,
            node.size,
            indent = indent
        )?;
        self.dump_node(node.left, indent + 4, out)?;
        self.dump_node(node.right, indent + 4, out)
    }
}

impl<K> Drop for RankTree<K>
where
    K: Clone + Ord,
{
    fn drop(&mut self) {
        self.teardown()
    }
}

impl<K> fmt::Debug for RankTree<K>
where
    K: Clone + Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.dump(f)
    }
}

/// In-order iterator over keys, created by [`RankTree::iter`].
pub struct Iter<'a, K>
where
    K: Clone + Ord,
{
    tree: &'a RankTree<K>,
    next: Option<NodeId>,
}

impl<'a, K> Iterator for Iter<'a, K>
where
    K: Clone + Ord,
{
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.successor(id);
        Some(self.tree.node(id).key.clone())
    }
}

/// Node color.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Node corresponds to a single key in RankTree instance.
#[derive(Clone)]
pub(crate) struct Node<K>
where
    K: Clone + Ord,
{
    key: K,
    color: Color,
    left: Option<NodeId>,   // left child
    right: Option<NodeId>,  // right child
    parent: Option<NodeId>, // back-reference, does not own
    size: usize,            // number of nodes in this subtree
}

impl<K> Node<K>
where
    K: Clone + Ord,
{
    // Color is settled by fixup_from().
    fn new(key: K, parent: Option<NodeId>) -> Node<K> {
        Node {
            key,
            color: Color::Black,
            left: None,
            right: None,
            parent,
            size: 1,
        }
    }
}

/// Statistics on [`RankTree`]. Serves two purpose:
///
/// * To get partial but quick statistics via [`RankTree::stats`] method.
/// * To get full statisics via [`RankTree::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of keys in the tree.
    node_size: usize,
    blacks: Option<usize>,
    depths: Option<Depth>,
}

impl Stats {
    fn new(entries: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            node_size,
            blacks: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    fn set_blacks(&mut self, blacks: usize) {
        self.blacks = Some(blacks)
    }

    #[inline]
    fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    /// Return number of keys in [`RankTree`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return node-size, including over-head for `RankTree<K>`. The
    /// overhead is constant, the node size varies with the key type.
    ///
    /// ```
    /// use rank_rbtree::RankTree;
    /// let tree: RankTree<u64> = RankTree::new("myinstance");
    ///
    /// assert!(tree.stats().node_size() > std::mem::size_of::<u64>());
    /// ```
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return number of black nodes from root to any empty subtree.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Return [`Depth`] statistics.
    pub fn depths(&self) -> Option<Depth> {
        self.depths.as_ref().filter(|d| d.samples() > 0).cloned()
    }
}
