/// Identifier for a strand in a [`crate::field::StrandField`].
///
/// This is an index into `StrandField::strands`, and is only meaningful
/// within the lifetime of a given field.
pub type StrandId = usize;

/// Identifier for a node in a [`crate::kdtree::KdTree`].
pub type NodeId = usize;
