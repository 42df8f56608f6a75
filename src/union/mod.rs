pub mod oriented_edge;
pub mod projection;
pub mod segment_tree;

pub use oriented_edge::{extract_chains, Chain, GridPoint, OrientedEdge};
pub use projection::{Axis, RectangleProjection};
pub use segment_tree::{NodeId, SegmentNode, SegmentTree};

use tracing::debug;

use crate::error::{ConsistencyError, Result};
use crate::geometry::Extent2D;
use crate::math::Point2;

/// Coverage state of a segment tree node during the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverageStatus {
    /// No rectangle covers any part of the node.
    #[default]
    Empty,
    /// Some, but not all, of the node is covered.
    Partial,
    /// The whole node is covered.
    Full,
}

/// Per-node payload of the sweep tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coverage {
    counter: usize,
    status: CoverageStatus,
}

impl Coverage {
    /// Number of active rectangles spanning the whole node.
    #[must_use]
    pub fn counter(&self) -> usize {
        self.counter
    }

    #[must_use]
    pub fn status(&self) -> CoverageStatus {
        self.status
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Insert,
    Delete,
}

fn update_coverage(
    tree: &mut SegmentTree<Coverage>,
    id: NodeId,
    fully_inside: bool,
    operation: Operation,
) -> Result<()> {
    let node = tree.node(id)?;
    let (low, high) = (node.low(), node.high());
    let children_status = match node.children() {
        Some((left, right)) => Some((tree.payload(left)?.status, tree.payload(right)?.status)),
        None => None,
    };

    let coverage = tree.payload_mut(id)?;
    if fully_inside {
        match operation {
            Operation::Insert => coverage.counter += 1,
            Operation::Delete => {
                coverage.counter = coverage
                    .counter
                    .checked_sub(1)
                    .ok_or(ConsistencyError::CounterUnderflow { low, high })?;
            }
        }
    }

    coverage.status = if coverage.counter > 0 {
        CoverageStatus::Full
    } else {
        match children_status {
            None | Some((CoverageStatus::Empty, CoverageStatus::Empty)) => CoverageStatus::Empty,
            Some(_) => CoverageStatus::Partial,
        }
    };

    Ok(())
}

/// Pushes onto `stack` the uncovered parts of `[low, high)` below node `id`.
///
/// The stack holds alternating begin/end bounds; an interval starting where
/// the previous one ended extends it instead of opening a new one.
fn intersect_complement(
    stack: &mut Vec<usize>,
    low: usize,
    high: usize,
    tree: &SegmentTree<Coverage>,
    id: NodeId,
) -> Result<()> {
    if low >= high {
        return Err(ConsistencyError::InvalidInterval { low, high }.into());
    }

    let node = tree.node(id)?;
    let status = node.payload().status;
    if status == CoverageStatus::Full {
        return Ok(());
    }

    let (b, e) = (low, high);
    let (bv, ev) = (node.low(), node.high());

    if b <= bv && ev <= e && status == CoverageStatus::Empty {
        if stack.last() == Some(&bv) {
            stack.pop();
        } else {
            stack.push(bv);
        }
        stack.push(ev);
    } else if let Some((left, right)) = node.children() {
        let middle = (bv + ev) / 2;
        if b < middle {
            intersect_complement(stack, b, e, tree, left)?;
        }
        if middle < e {
            intersect_complement(stack, b, e, tree, right)?;
        }
    }

    Ok(())
}

/// Drains `stack` into vertical edges at abscissa `x`.
///
/// Intervals pushed by several sides at the same abscissa may come in any
/// order; they are emitted from top to bottom with contiguous ones merged.
/// Left sides go toward increasing `y`, right sides toward decreasing `y`.
/// A new edge that exactly reverses the last emitted edge cancels it.
fn add_vertical_edges(
    edges: &mut Vec<OrientedEdge>,
    stack: &mut Vec<usize>,
    x: usize,
    is_left: bool,
) -> Result<()> {
    if stack.len() % 2 != 0 {
        return Err(ConsistencyError::OddEndpointStack(stack.len()).into());
    }

    let mut drained = Vec::with_capacity(stack.len() / 2);
    while let Some(high) = stack.pop() {
        let Some(low) = stack.pop() else {
            return Err(ConsistencyError::OddEndpointStack(1).into());
        };
        drained.push((low, high));
    }
    drained.sort_by(|a, b| b.0.cmp(&a.0));

    let mut intervals: Vec<(usize, usize)> = Vec::with_capacity(drained.len());
    for (low, high) in drained {
        match intervals.last_mut() {
            Some(last) if last.0 == high => last.0 = low,
            _ => intervals.push((low, high)),
        }
    }

    for (low, high) in intervals {
        if low >= high {
            return Err(ConsistencyError::InvalidInterval { low, high }.into());
        }

        let edge = if is_left {
            OrientedEdge::new(x, low, x, high)
        } else {
            OrientedEdge::new(x, high, x, low)
        };
        let reversed = OrientedEdge::new(edge.x2(), edge.y2(), edge.x1(), edge.y1());

        if edges.last() == Some(&reversed) {
            edges.pop();
        } else {
            edges.push(edge);
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct VerticalSide {
    x: usize,
    is_left: bool,
    y1: usize,
    y2: usize,
}

impl VerticalSide {
    fn same_group(&self, other: &Self) -> bool {
        self.x == other.x && self.is_left == other.is_left
    }
}

#[derive(Debug, Clone, Copy)]
struct HorizontalJunction {
    x: usize,
    y: usize,
    ybis: usize,
    downward: bool,
}

/// Boundary of the union of axis-aligned rectangles.
///
/// Sweeps the rectangles from left to right over a segment tree built on the
/// compressed `y` coordinates, collecting the vertical boundary edges, then
/// derives the horizontal edges and stitches everything into closed chains.
/// Outer boundaries and holes come out as separate chains; each chain repeats
/// its first point at the end.
///
/// Empty rectangles are ignored.
#[derive(Debug, Clone)]
pub struct RectangleUnion {
    rectangles: Vec<Extent2D>,
}

impl RectangleUnion {
    #[must_use]
    pub fn new(rectangles: Vec<Extent2D>) -> Self {
        Self { rectangles }
    }

    /// Computes the contours of the union.
    ///
    /// # Errors
    ///
    /// Returns a `ConsistencyError` if the sweep reaches an inconsistent state.
    pub fn execute(&self) -> Result<Vec<Vec<Point2>>> {
        let horizontal = RectangleProjection::new(&self.rectangles, Axis::Horizontal);
        let vertical = RectangleProjection::new(&self.rectangles, Axis::Vertical);

        if vertical.endpoints_count() == 0 {
            return Ok(Vec::new());
        }

        let vertical_edges = Self::sweep(&horizontal, &vertical)?;
        let horizontal_edges = Self::horizontal_edges(&vertical_edges)?;

        debug!(
            rectangles = horizontal.projected_rectangles_count(),
            vertical_edges = vertical_edges.len(),
            horizontal_edges = horizontal_edges.len(),
            "rectangle union swept"
        );

        let mut all_edges = horizontal_edges;
        all_edges.extend(vertical_edges);

        extract_chains(&all_edges)
            .into_iter()
            .map(|chain| {
                chain
                    .into_iter()
                    .map(|(x, y)| -> Result<Point2> {
                        Ok(Point2::new(
                            horizontal.endpoint_coordinate(x)?,
                            vertical.endpoint_coordinate(y)?,
                        ))
                    })
                    .collect()
            })
            .collect()
    }

    fn sweep(
        horizontal: &RectangleProjection,
        vertical: &RectangleProjection,
    ) -> Result<Vec<OrientedEdge>> {
        let mut tree = SegmentTree::<Coverage>::new(0, vertical.endpoints_count() - 1)?;
        let root = tree.root();

        let count = horizontal.projected_rectangles_count();
        let mut sides = Vec::with_capacity(2 * count);
        for i in 0..count {
            let y1 = vertical.projected_rectangle_low(i)?;
            let y2 = vertical.projected_rectangle_high(i)?;
            sides.push(VerticalSide {
                x: horizontal.projected_rectangle_low(i)?,
                is_left: true,
                y1,
                y2,
            });
            sides.push(VerticalSide {
                x: horizontal.projected_rectangle_high(i)?,
                is_left: false,
                y1,
                y2,
            });
        }

        // At equal x, opening sides are processed before closing sides so
        // that a boundary shared by two rectangles is never emitted.
        sides.sort_by(|a, b| a.x.cmp(&b.x).then(b.is_left.cmp(&a.is_left)));

        let mut edges = Vec::new();
        let mut stack = Vec::new();

        for (i, side) in sides.iter().enumerate() {
            if i > 0 && !side.same_group(&sides[i - 1]) {
                let previous = &sides[i - 1];
                add_vertical_edges(&mut edges, &mut stack, previous.x, previous.is_left)?;
            }

            if side.is_left {
                intersect_complement(&mut stack, side.y1, side.y2, &tree, root)?;
                tree.visit_segment(side.y1, side.y2, &mut |tree, id, inside| {
                    update_coverage(tree, id, inside, Operation::Insert)
                })?;
            } else {
                tree.visit_segment(side.y1, side.y2, &mut |tree, id, inside| {
                    update_coverage(tree, id, inside, Operation::Delete)
                })?;
                intersect_complement(&mut stack, side.y1, side.y2, &tree, root)?;
            }
        }

        if let Some(last) = sides.last() {
            if !stack.is_empty() {
                add_vertical_edges(&mut edges, &mut stack, last.x, last.is_left)?;
            }
        }

        Ok(edges)
    }

    fn horizontal_edges(vertical_edges: &[OrientedEdge]) -> Result<Vec<OrientedEdge>> {
        let mut junctions = Vec::with_capacity(2 * vertical_edges.len());
        for edge in vertical_edges {
            let downward = edge.is_downward();
            junctions.push(HorizontalJunction {
                x: edge.x1(),
                y: edge.y1(),
                ybis: edge.y2(),
                downward,
            });
            junctions.push(HorizontalJunction {
                x: edge.x1(),
                y: edge.y2(),
                ybis: edge.y1(),
                downward,
            });
        }

        junctions.sort_by(|a, b| b.y.cmp(&a.y).then(a.x.cmp(&b.x)));

        let mut edges = Vec::with_capacity(vertical_edges.len());
        for pair in junctions.chunks(2) {
            let [first, second] = pair else {
                return Err(ConsistencyError::UnpairedJunction(pair[0].y).into());
            };
            if first.y != second.y {
                return Err(ConsistencyError::UnpairedJunction(first.y).into());
            }

            let y = first.y;
            if (first.downward && y > first.ybis) || (!first.downward && y < first.ybis) {
                edges.push(OrientedEdge::new(first.x, y, second.x, y));
            } else {
                edges.push(OrientedEdge::new(second.x, y, first.x, y));
            }
        }

        Ok(edges)
    }
}
