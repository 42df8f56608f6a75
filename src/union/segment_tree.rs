use slotmap::SlotMap;

use crate::error::{ConsistencyError, RangeError, Result};

slotmap::new_key_type! {
    /// Identifier of a node in a [`SegmentTree`].
    pub struct NodeId;
}

/// One node of a [`SegmentTree`], covering the integer interval `[low, high)`.
#[derive(Debug, Clone)]
pub struct SegmentNode<P> {
    low: usize,
    high: usize,
    children: Option<(NodeId, NodeId)>,
    payload: P,
}

impl<P> SegmentNode<P> {
    #[must_use]
    pub fn low(&self) -> usize {
        self.low
    }

    #[must_use]
    pub fn high(&self) -> usize {
        self.high
    }

    /// Returns `true` if the node covers a single elementary interval.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Left and right children, `None` for a leaf.
    #[must_use]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.children
    }

    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }
}

/// A static segment tree over the integer range `[low, high)`.
///
/// A node `[low, high)` has children `[low, middle)` and `[middle, high)`,
/// with `middle = (low + high) / 2`, as long as `high - low > 1`. The shape is
/// fixed at construction; only the per-node payloads change afterward.
///
/// Nodes live in a flat arena and are addressed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct SegmentTree<P> {
    nodes: SlotMap<NodeId, SegmentNode<P>>,
    root: NodeId,
}

impl<P: Default> SegmentTree<P> {
    /// Builds the tree over `[low, high)` with default payloads.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::EmptyInterval` if `low >= high`.
    pub fn new(low: usize, high: usize) -> Result<Self> {
        Self::with_payload(low, high, P::default)
    }
}

impl<P> SegmentTree<P> {
    /// Builds the tree over `[low, high)`, creating one payload per node.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::EmptyInterval` if `low >= high`.
    pub fn with_payload<F>(low: usize, high: usize, mut factory: F) -> Result<Self>
    where
        F: FnMut() -> P,
    {
        if low >= high {
            return Err(RangeError::EmptyInterval { low, high }.into());
        }

        let mut nodes = SlotMap::with_key();
        let root = Self::build(&mut nodes, low, high, &mut factory);
        Ok(Self { nodes, root })
    }

    fn build<F>(
        nodes: &mut SlotMap<NodeId, SegmentNode<P>>,
        low: usize,
        high: usize,
        factory: &mut F,
    ) -> NodeId
    where
        F: FnMut() -> P,
    {
        let children = if high - low > 1 {
            let middle = (low + high) / 2;
            let left = Self::build(nodes, low, middle, factory);
            let right = Self::build(nodes, middle, high, factory);
            Some((left, right))
        } else {
            None
        };

        nodes.insert(SegmentNode {
            low,
            high,
            children,
            payload: factory(),
        })
    }

    /// Returns the root node identifier.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// # Errors
    ///
    /// Returns `ConsistencyError::UnknownNode` if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> Result<&SegmentNode<P>> {
        self.nodes
            .get(id)
            .ok_or_else(|| ConsistencyError::UnknownNode.into())
    }

    /// # Errors
    ///
    /// Returns `ConsistencyError::UnknownNode` if `id` does not belong to this tree.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SegmentNode<P>> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| ConsistencyError::UnknownNode.into())
    }

    /// # Errors
    ///
    /// Returns `ConsistencyError::UnknownNode` if `id` does not belong to this tree.
    pub fn payload(&self, id: NodeId) -> Result<&P> {
        Ok(self.node(id)?.payload())
    }

    /// # Errors
    ///
    /// Returns `ConsistencyError::UnknownNode` if `id` does not belong to this tree.
    pub fn payload_mut(&mut self, id: NodeId) -> Result<&mut P> {
        Ok(self.node_mut(id)?.payload_mut())
    }

    /// Total number of nodes in the tree.
    #[must_use]
    pub fn count_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes in the subtree rooted at `id`.
    ///
    /// # Errors
    ///
    /// Returns `ConsistencyError::UnknownNode` if `id` does not belong to this tree.
    pub fn count_subtree_nodes(&self, id: NodeId) -> Result<usize> {
        match self.node(id)?.children {
            None => Ok(1),
            Some((left, right)) => {
                Ok(1 + self.count_subtree_nodes(left)? + self.count_subtree_nodes(right)?)
            }
        }
    }

    /// Finds the leaf `[low, low + 1)`.
    #[must_use]
    pub fn find_leaf(&self, low: usize) -> Option<NodeId> {
        self.find_node(low, low.checked_add(1)?)
    }

    /// Finds the node whose interval is exactly `[low, high)`.
    #[must_use]
    pub fn find_node(&self, low: usize, high: usize) -> Option<NodeId> {
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current)?;
            if node.low == low && node.high == high {
                return Some(current);
            }

            let (left, right) = node.children?;
            let middle = (node.low + node.high) / 2;
            if high <= middle {
                current = left;
            } else if low >= middle {
                current = right;
            } else {
                return None;
            }
        }
    }

    /// Visits the nodes of the canonical decomposition of `[low, high)`.
    ///
    /// Every node fully inside the interval is visited with `fully_inside =
    /// true` and its subtree is skipped. A node that only partially overlaps
    /// the interval is visited with `false` after its children, so that a
    /// visitor can derive the state of a node from the state of its children.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::EmptyInterval` if `low >= high`, or any error
    /// produced by the visitor.
    pub fn visit_segment<F>(&mut self, low: usize, high: usize, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&mut Self, NodeId, bool) -> Result<()>,
    {
        if low >= high {
            return Err(RangeError::EmptyInterval { low, high }.into());
        }
        self.visit_node(self.root, low, high, visitor)
    }

    fn visit_node<F>(&mut self, id: NodeId, b: usize, e: usize, visitor: &mut F) -> Result<()>
    where
        F: FnMut(&mut Self, NodeId, bool) -> Result<()>,
    {
        let node = self.node(id)?;
        let (bv, ev, children) = (node.low, node.high, node.children);

        if b <= bv && ev <= e {
            return visitor(self, id, true);
        }

        if let Some((left, right)) = children {
            let middle = (bv + ev) / 2;
            if b < middle {
                self.visit_node(left, b, e, visitor)?;
            }
            if middle < e {
                self.visit_node(right, b, e, visitor)?;
            }
            visitor(self, id, false)?;
        }

        Ok(())
    }
}
