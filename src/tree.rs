use log::debug;

use crate::error::BTreeError;
use crate::iter::{Cursor, PositionBias};
use crate::node::Node;

/// An in-memory ordered-key container backed by a classical B-tree.
///
/// `BTree<K>` stores a flat **set** of totally-ordered keys (no duplicates,
/// no attached payload) and supports search, insertion, deletion,
/// minimum/maximum, and bidirectional ordered iteration from an arbitrary
/// starting key. It is not internally synchronized; concurrent access from
/// multiple threads requires external exclusion.
pub struct BTree<K> {
    min_degree: usize,
    root: Option<Box<Node<K>>>,
    len: usize,
}

impl<K> BTree<K> {
    /// Creates a fresh, empty tree with the given minimum degree.
    ///
    /// Every non-root node will hold between `min_degree - 1` and
    /// `2 * min_degree - 1` keys. Larger `min_degree` means a shallower,
    /// wider tree.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::InvalidDegree`] if `min_degree < 2`.
    pub fn new(min_degree: usize) -> Result<Self, BTreeError> {
        if min_degree < 2 {
            return Err(BTreeError::InvalidDegree { min_degree });
        }

        Ok(BTree {
            min_degree,
            root: Some(Box::new(Node::empty_leaf())),
            len: 0,
        })
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Releases every node in the tree.
    ///
    /// Rust's ownership model already frees every node when a `BTree` is
    /// dropped (each `Node`'s `Vec<Box<Node<K>>>` recursively drops its
    /// children), so this method exists only to mirror the `destroy(tree)`
    /// operation's contract: it consumes `self`, so the handle cannot be
    /// used afterward.
    pub fn destroy(self) {}

    fn root(&self) -> &Node<K> {
        self.root.as_deref().expect("root is always present between public calls")
    }
}

impl<K: Ord> BTree<K> {
    /// Returns a reference to the stored key equal to `key`, or `None` if
    /// absent.
    pub fn search(&self, key: &K) -> Option<&K> {
        let mut node = self.root();
        loop {
            let (found, idx) = node.search(key);
            if found {
                return Some(&node.keys[idx]);
            }
            if node.is_leaf() {
                return None;
            }
            node = node.children.as_ref().expect("internal node has children")[idx].as_ref();
        }
    }

    /// Returns the least key in the tree, or `None` if the tree is empty.
    pub fn min(&self) -> Option<&K> {
        let root = self.root();
        if root.is_leaf() && root.size() == 0 {
            return None;
        }
        Some(Node::min_key(root))
    }

    /// Returns the greatest key in the tree, or `None` if the tree is empty.
    pub fn max(&self) -> Option<&K> {
        let root = self.root();
        if root.is_leaf() && root.size() == 0 {
            return None;
        }
        Some(Node::max_key(root))
    }

    /// Positions a cursor so that the first call to [`Cursor::next`] yields
    /// the smallest stored key that is `>= key`.
    pub fn first<'a>(&'a self, key: &K) -> Cursor<'a, K> {
        Cursor::position(Some(self.root()), key, PositionBias::First)
    }

    /// Positions a cursor so that the first call to [`Cursor::prev`] yields
    /// the largest stored key that is `<= key`.
    pub fn last<'a>(&'a self, key: &K) -> Cursor<'a, K> {
        Cursor::position(Some(self.root()), key, PositionBias::Last)
    }
}

impl<K: Ord + Clone> BTree<K> {
    /// Inserts `key` into the tree.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::DuplicateKey`] if `key` is already present, or
    /// [`BTreeError::AllocationFailure`] if a node allocation needed to make
    /// room for the new key fails. On either error the tree remains a valid
    /// B-tree (see [`BTreeError::AllocationFailure`] for the precise
    /// atomicity guarantee).
    pub fn insert(&mut self, key: K) -> Result<(), BTreeError> {
        let t = self.min_degree;
        let mut root = self.root.take().expect("root is always present between public calls");

        if let Err(err) = Self::split_root_if_full(&mut root, t) {
            self.root = Some(root);
            return Err(err);
        }

        let result = Self::insert_non_full(&mut root, key, t);
        self.root = Some(root);
        result?;
        self.len += 1;
        Ok(())
    }

    /// If `root` is full, wraps it in a new internal root and splits it
    /// (§4.3.3 step 1) — the only place tree height increases. Restores the
    /// prior root untouched if an allocation in the process fails.
    fn split_root_if_full(root: &mut Box<Node<K>>, t: usize) -> Result<(), BTreeError> {
        if root.size() < 2 * t - 1 {
            return Ok(());
        }

        let old_root = std::mem::replace(root, Box::new(Node::empty_leaf()));
        let mut new_root = match Node::try_new(false, t) {
            Ok(node) => node,
            Err(err) => {
                *root = old_root;
                return Err(err);
            }
        };
        new_root
            .children
            .as_mut()
            .expect("new_root is internal")
            .push(old_root);

        if let Err(err) = Node::split_child(&mut new_root, 0, t) {
            let old_root = new_root
                .children
                .as_mut()
                .expect("new_root is internal")
                .pop()
                .expect("old root was just pushed");
            *root = old_root;
            return Err(err);
        }

        debug!("insert: root split, tree height increased (t={t})");
        *root = Box::new(new_root);
        Ok(())
    }

    /// Descends from `node` (known not to be full) inserting `key`,
    /// splitting any full child encountered on the way down so every
    /// descent step lands in a node with room to spare (§4.3.3 step 2).
    fn insert_non_full(node: &mut Node<K>, key: K, t: usize) -> Result<(), BTreeError> {
        let (found, mut idx) = node.search(&key);
        if found {
            return Err(BTreeError::DuplicateKey);
        }

        if node.is_leaf() {
            node.keys.insert(idx, key);
            return Ok(());
        }

        let child_full = node.children.as_ref().expect("internal node has children")[idx].size() == 2 * t - 1;
        if child_full {
            Node::split_child(node, idx, t)?;
            if key > node.keys[idx] {
                idx += 1;
            }
        }

        Self::insert_non_full(&mut node.children.as_mut().expect("internal node has children")[idx], key, t)
    }

    /// Removes `key` from the tree.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::NotFound`] if `key` is absent.
    pub fn delete(&mut self, key: &K) -> Result<(), BTreeError> {
        let t = self.min_degree;
        let mut root = self.root.take().expect("root is always present between public calls");

        let result = Self::delete_from(&mut root, key, t);

        if !root.is_leaf() && root.size() == 0 {
            let mut children = root.children.take().expect("internal node has children");
            root = children.remove(0);
            debug!("delete: root emptied by merge, tree height decreased");
        }

        self.root = Some(root);
        result?;
        self.len -= 1;
        Ok(())
    }

    /// Descends from `node` looking for `key`, repairing any child about to
    /// be descended into so it has more than `t - 1` keys before the
    /// recursive call touches it (§4.3.4 step 1), then applies one of the
    /// four deletion cases once `key` is located (§4.3.4 step 2).
    fn delete_from(node: &mut Node<K>, key: &K, t: usize) -> Result<(), BTreeError> {
        let (found, idx) = node.search(key);

        if found {
            if node.is_leaf() {
                node.keys.remove(idx);
                return Ok(());
            }

            let left_size = node.children.as_ref().expect("internal node has children")[idx].size();
            if left_size >= t {
                let pred = Node::max_key(&node.children.as_ref().expect("internal node has children")[idx]).clone();
                node.keys[idx] = pred;
                let Node { keys, children } = &mut *node;
                let child = &mut children.as_mut().expect("internal node has children")[idx];
                return Self::delete_from(child, &keys[idx], t);
            }

            let right_size = node.children.as_ref().expect("internal node has children")[idx + 1].size();
            if right_size >= t {
                let succ = Node::min_key(&node.children.as_ref().expect("internal node has children")[idx + 1]).clone();
                node.keys[idx] = succ;
                let Node { keys, children } = &mut *node;
                let child = &mut children.as_mut().expect("internal node has children")[idx + 1];
                return Self::delete_from(child, &keys[idx], t);
            }

            // Both children are thin: fold left child, the separator, and
            // right child into one node of size 2t-1, then recurse into it
            // — `key` is now the merged node's middle key.
            Node::merge_children(node, idx, t);
            return Self::delete_from(&mut node.children.as_mut().expect("internal node has children")[idx], key, t);
        }

        if node.is_leaf() {
            return Err(BTreeError::NotFound);
        }

        let descend_idx = Self::prepare_child_for_descent(node, idx, t);
        Self::delete_from(
            &mut node.children.as_mut().expect("internal node has children")[descend_idx],
            key,
            t,
        )
    }

    /// Ensures `node.children[idx]` has at least `t` keys before the caller
    /// descends into it, by rotating from a sibling with a spare key or, if
    /// neither sibling has one, merging (§4.3.4 step 1 / §4.3.7). Returns the
    /// index to actually descend into, which shifts to `idx - 1` when the
    /// merge had to be performed one slot to the left (the rightmost-child
    /// case).
    fn prepare_child_for_descent(node: &mut Node<K>, idx: usize, t: usize) -> usize {
        if node.children.as_ref().expect("internal node has children")[idx].size() >= t {
            return idx;
        }

        let num_children = node.children.as_ref().expect("internal node has children").len();

        if idx + 1 < num_children
            && node.children.as_ref().expect("internal node has children")[idx + 1].size() >= t
        {
            Node::move_right_to_left(node, idx);
            return idx;
        }

        if idx > 0 && node.children.as_ref().expect("internal node has children")[idx - 1].size() >= t {
            Node::move_left_to_right(node, idx - 1);
            return idx;
        }

        let merge_idx = if idx == num_children - 1 { idx - 1 } else { idx };
        Node::merge_children(node, merge_idx, t);
        merge_idx
    }
}
