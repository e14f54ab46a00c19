use std::cmp::Ordering;

use log::trace;

use crate::error::BTreeError;

/// Above this many live keys, node-local search switches from linear scan to
/// binary search. Below it, the branch-predictor and cache-line cost of a
/// linear scan beats the overhead of `binary_search`'s bookkeeping.
const BINARY_SEARCH_THRESHOLD: usize = 16;

/// A single B-tree node.
///
/// `keys` holds between `t-1` and `2t-1` live keys in strictly ascending
/// order. `children` is `None` for a leaf and, for an internal node, holds
/// exactly `keys.len() + 1` owned children. Leaf vs. internal is fixed at
/// allocation and never changes for the lifetime of the node.
pub(crate) struct Node<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) children: Option<Vec<Box<Node<K>>>>,
}

impl<K> Node<K> {
    /// A zero-capacity leaf. Cheap and infallible — used only as a
    /// throwaway placeholder while a node is briefly moved out of its slot.
    pub(crate) fn empty_leaf() -> Self {
        Node {
            keys: Vec::new(),
            children: None,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub(crate) fn size(&self) -> usize {
        self.keys.len()
    }

    /// Allocates a node with capacity for `2t-1` keys (and, unless `is_leaf`,
    /// `2t` children), reporting [`BTreeError::AllocationFailure`] instead of
    /// aborting the process if the allocator cannot satisfy the request.
    pub(crate) fn try_new(is_leaf: bool, t: usize) -> Result<Self, BTreeError> {
        let mut keys = Vec::new();
        keys.try_reserve_exact(2 * t - 1)
            .map_err(|_| BTreeError::AllocationFailure)?;

        let children = if is_leaf {
            None
        } else {
            let mut children = Vec::new();
            children
                .try_reserve_exact(2 * t)
                .map_err(|_| BTreeError::AllocationFailure)?;
            Some(children)
        };

        Ok(Node { keys, children })
    }

    /// Consumes the node, handing back its raw key and child buffers. Used
    /// by sibling merge, which folds a right sibling's contents into its
    /// left neighbor and then lets the now-empty shell drop.
    fn into_parts(self) -> (Vec<K>, Option<Vec<Box<Node<K>>>>) {
        (self.keys, self.children)
    }
}

impl<K: Ord> Node<K> {
    /// Adaptive node-local search (§4.2): binary search above
    /// [`BINARY_SEARCH_THRESHOLD`] keys, linear scan below it. Both branches
    /// agree on `(found, idx)`: `found` means `keys[idx] == key`; otherwise
    /// `idx` is the smallest position with `keys[idx] > key`, i.e. the child
    /// index to descend into.
    pub(crate) fn search_keys(keys: &[K], key: &K) -> (bool, usize) {
        if keys.len() > BINARY_SEARCH_THRESHOLD {
            match keys.binary_search(key) {
                Ok(idx) => (true, idx),
                Err(idx) => (false, idx),
            }
        } else {
            for (idx, candidate) in keys.iter().enumerate() {
                match candidate.cmp(key) {
                    Ordering::Less => continue,
                    Ordering::Equal => return (true, idx),
                    Ordering::Greater => return (false, idx),
                }
            }
            (false, keys.len())
        }
    }

    pub(crate) fn search(&self, key: &K) -> (bool, usize) {
        Self::search_keys(&self.keys, key)
    }

    /// Leftmost key of the subtree rooted at `node`. `node` must have at
    /// least one key (empty trees are handled by the caller before reaching
    /// here).
    pub(crate) fn min_key(mut node: &Node<K>) -> &K {
        loop {
            match &node.children {
                None => return node.keys.first().expect("node is non-empty"),
                Some(children) => node = children.first().expect("internal node has children").as_ref(),
            }
        }
    }

    /// Rightmost key of the subtree rooted at `node`. Mirror of
    /// [`Node::min_key`].
    pub(crate) fn max_key(mut node: &Node<K>) -> &K {
        loop {
            match &node.children {
                None => return node.keys.last().expect("node is non-empty"),
                Some(children) => node = children.last().expect("internal node has children").as_ref(),
            }
        }
    }

    /// Splits `parent.children[idx]`, which must be full (`size == 2t-1`),
    /// into two half-full nodes, promoting the middle key into `parent` at
    /// `idx` and the new sibling into `parent.children` at `idx+1` (§4.3.5).
    ///
    /// Allocates the new sibling before touching `parent` or the child being
    /// split, so a failed allocation leaves both untouched.
    pub(crate) fn split_child(parent: &mut Node<K>, idx: usize, t: usize) -> Result<(), BTreeError> {
        let is_leaf = parent.children.as_ref().expect("parent is internal")[idx].is_leaf();
        let mut sibling = Node::try_new(is_leaf, t)?;

        let child = &mut parent.children.as_mut().expect("parent is internal")[idx];
        debug_assert_eq!(child.size(), 2 * t - 1, "split_child precondition: child full");

        let right_keys = child.keys.split_off(t);
        let middle = child.keys.pop().expect("full child has a middle key");
        sibling.keys = right_keys;

        if !is_leaf {
            let right_children = child
                .children
                .as_mut()
                .expect("internal child has children")
                .split_off(t);
            sibling.children = Some(right_children);
        }

        trace!(
            "split_child: t={t} idx={idx} left_size={} right_size={}",
            child.size(),
            sibling.size()
        );

        parent.keys.insert(idx, middle);
        parent
            .children
            .as_mut()
            .expect("parent is internal")
            .insert(idx + 1, Box::new(sibling));

        Ok(())
    }

    /// Rotates one key through `parent` from `children[i+1]` to
    /// `children[i]` (§4.3.6): `children[i]` gains a key, `children[i+1]`
    /// loses one, the separator `parent.keys[i]` is replaced.
    pub(crate) fn move_right_to_left(parent: &mut Node<K>, i: usize) {
        let children = parent.children.as_mut().expect("parent is internal");
        let (left_part, right_part) = children.split_at_mut(i + 1);
        let left = &mut left_part[i];
        let right = &mut right_part[0];

        let promoted = right.keys.remove(0);
        let demoted = std::mem::replace(&mut parent.keys[i], promoted);
        left.keys.push(demoted);

        if let (Some(left_children), Some(right_children)) =
            (left.children.as_mut(), right.children.as_mut())
        {
            left_children.push(right_children.remove(0));
        }
    }

    /// Mirror of [`Node::move_right_to_left`]: rotates a key from
    /// `children[i]` through `parent` into `children[i+1]`.
    pub(crate) fn move_left_to_right(parent: &mut Node<K>, i: usize) {
        let children = parent.children.as_mut().expect("parent is internal");
        let (left_part, right_part) = children.split_at_mut(i + 1);
        let left = &mut left_part[i];
        let right = &mut right_part[0];

        let promoted = left.keys.pop().expect("rotation precondition: left has a spare key");
        let demoted = std::mem::replace(&mut parent.keys[i], promoted);
        right.keys.insert(0, demoted);

        if let (Some(left_children), Some(right_children)) =
            (left.children.as_mut(), right.children.as_mut())
        {
            right_children.insert(
                0,
                left_children
                    .pop()
                    .expect("rotation precondition: left has a spare child"),
            );
        }
    }

    /// Merges `parent.children[i]` and `parent.children[i+1]` plus the
    /// separating key `parent.keys[i]` into a single node at `i`, freeing
    /// the right sibling (§4.3.7). Both children must have `size == t-1`.
    pub(crate) fn merge_children(parent: &mut Node<K>, i: usize, t: usize) {
        {
            let children = parent.children.as_ref().expect("parent is internal");
            debug_assert_eq!(children[i].size(), t - 1, "merge_children precondition: left child thin");
            debug_assert_eq!(children[i + 1].size(), t - 1, "merge_children precondition: right child thin");
        }

        let separator = parent.keys.remove(i);
        let right = parent
            .children
            .as_mut()
            .expect("parent is internal")
            .remove(i + 1);
        let left = &mut parent.children.as_mut().expect("parent is internal")[i];

        left.keys.push(separator);
        let (mut right_keys, right_children) = right.into_parts();
        left.keys.append(&mut right_keys);

        if let (Some(left_children), Some(mut right_children)) =
            (left.children.as_mut(), right_children)
        {
            left_children.append(&mut right_children);
        }

        trace!("merge_children: idx={i} merged_size={}", left.size());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(keys: &[i32]) -> Node<i32> {
        Node {
            keys: keys.to_vec(),
            children: None,
        }
    }

    /// Reference implementation used only to cross-check `search_keys`'s
    /// binary-search branch: a plain linear scan over the same keys.
    fn linear_search(keys: &[i32], key: &i32) -> (bool, usize) {
        for (idx, candidate) in keys.iter().enumerate() {
            match candidate.cmp(key) {
                Ordering::Less => continue,
                Ordering::Equal => return (true, idx),
                Ordering::Greater => return (false, idx),
            }
        }
        (false, keys.len())
    }

    #[test]
    fn search_keys_linear_and_binary_agree() {
        // Past BINARY_SEARCH_THRESHOLD this exercises the binary branch;
        // linear_search always takes the linear path, so every probe below
        // cross-checks the two branches against each other rather than a
        // slice against itself.
        let keys: Vec<i32> = (0..40).map(|i| i * 2).collect();
        assert!(keys.len() > BINARY_SEARCH_THRESHOLD);

        for k in -1..=80 {
            assert_eq!(
                Node::search_keys(&keys, &k),
                linear_search(&keys, &k),
                "mismatch for probe {k}"
            );
        }
    }

    #[test]
    fn min_max_key_descend_to_the_edges() {
        let left = leaf(&[1, 2]);
        let right = leaf(&[8, 9, 10]);
        let root = Node {
            keys: vec![5],
            children: Some(vec![Box::new(left), Box::new(right)]),
        };

        assert_eq!(*Node::min_key(&root), 1);
        assert_eq!(*Node::max_key(&root), 10);
    }

    #[test]
    fn split_child_promotes_middle_key() {
        let t = 3;
        let full_child = leaf(&[1, 2, 3, 4, 5]);
        let mut parent = Node {
            keys: vec![],
            children: Some(vec![Box::new(full_child)]),
        };

        Node::split_child(&mut parent, 0, t).unwrap();

        assert_eq!(parent.keys, vec![3]);
        let children = parent.children.as_ref().unwrap();
        assert_eq!(children[0].keys, vec![1, 2]);
        assert_eq!(children[1].keys, vec![4, 5]);
    }

    #[test]
    fn rotations_move_exactly_one_key_through_parent() {
        let left = leaf(&[1, 2]);
        let right = leaf(&[8, 9, 10]);
        let mut parent = Node {
            keys: vec![5],
            children: Some(vec![Box::new(left), Box::new(right)]),
        };

        Node::move_right_to_left(&mut parent, 0);
        assert_eq!(parent.keys, vec![8]);
        let children = parent.children.as_ref().unwrap();
        assert_eq!(children[0].keys, vec![1, 2, 5]);
        assert_eq!(children[1].keys, vec![9, 10]);

        Node::move_left_to_right(&mut parent, 0);
        assert_eq!(parent.keys, vec![5]);
        let children = parent.children.as_ref().unwrap();
        assert_eq!(children[0].keys, vec![1, 2]);
        assert_eq!(children[1].keys, vec![8, 9, 10]);
    }

    #[test]
    fn merge_children_folds_separator_and_both_sides() {
        let left = leaf(&[1, 2]);
        let right = leaf(&[8, 9]);
        let mut parent = Node {
            keys: vec![5],
            children: Some(vec![Box::new(left), Box::new(right)]),
        };

        Node::merge_children(&mut parent, 0, 3);

        assert!(parent.keys.is_empty());
        let children = parent.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].keys, vec![1, 2, 5, 8, 9]);
    }
}
