//! An in-memory ordered-key set backed by a classical B-tree.
//!
//! [`BTree<K>`] stores a flat set of totally-ordered keys — no duplicates, no
//! attached payload — with `O(log n)` search, insertion, and deletion, exact
//! minimum/maximum, and bidirectional ordered iteration from an arbitrary
//! starting key via [`Cursor`]. Every non-root node holds between
//! `min_degree - 1` and `2 * min_degree - 1` keys; `min_degree` is fixed for
//! the lifetime of a tree and chosen at construction with [`BTree::new`].
//!
//! ```
//! use minbtree::BTree;
//!
//! let mut tree = BTree::new(3).unwrap();
//! tree.insert(7).unwrap();
//! tree.insert(3).unwrap();
//! tree.insert(11).unwrap();
//!
//! assert_eq!(tree.search(&7), Some(&7));
//! assert_eq!(tree.min(), Some(&3));
//!
//! let mut cursor = tree.first(&0);
//! assert_eq!(cursor.next(), Some(&3));
//! assert_eq!(cursor.next(), Some(&7));
//! ```

mod error;
mod iter;
mod node;
mod tree;

pub use error::BTreeError;
pub use iter::Cursor;
pub use tree::BTree;
