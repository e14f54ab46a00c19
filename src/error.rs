use thiserror::Error;

/// Errors reported by the fallible [`crate::BTree`] operations.
///
/// Every variant corresponds exactly to one of the failure modes in the
/// container's error taxonomy: a duplicate key on insert, a missing key on
/// delete, an out-of-range minimum degree at construction, or a node
/// allocation that the global allocator could not satisfy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BTreeError {
    /// `insert` was called with a key already present in the tree.
    #[error("key already present in the tree")]
    DuplicateKey,

    /// `delete` was called with a key that is not present in the tree.
    #[error("key not found in the tree")]
    NotFound,

    /// `BTree::new` was called with `min_degree < 2`.
    #[error("minimum degree must be at least 2, got {min_degree}")]
    InvalidDegree {
        /// The invalid degree the caller supplied.
        min_degree: usize,
    },

    /// A node allocation failed. The tree is left exactly as it was before
    /// the operation attempted the allocation that failed; the operation
    /// that triggered it reports this error without having performed any
    /// irrevocable mutation on the failing allocation's parent node.
    #[error("failed to allocate a node")]
    AllocationFailure,
}
