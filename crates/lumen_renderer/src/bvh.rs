//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A strict binary tree over the scene triangles. Leaves hold a single
//! triangle (by index into the scene's triangle list); interior nodes own
//! both children and the union of their bounding boxes.
//!
//! Construction picks a split axis with a surface-area cost signal, but the
//! split itself is always the count midpoint of the sorted range. The cost
//! is evaluated at every sweep position and only the last value (the split
//! that peels off the final triangle) is compared across axes. This keeps
//! tree shape stable for golden-image comparisons; it is not a full SAH
//! split search.

use std::cmp::Ordering;

use lumen_core::{Triangle, TriangleHit};
use lumen_math::{axis, Aabb, Interval, Ray};
use thiserror::Error;

/// Errors that can occur while building a BVH.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    #[error("Cannot build a BVH from an empty triangle list")]
    EmptyTriangleList,
}

/// How a query walks the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Descend both children of every node whose box is hit, then keep the
    /// closer hit.
    #[default]
    Exhaustive,
    /// Search the left child first and search the right child only up to
    /// the left hit distance. Finds the same nearest hit.
    Pruned,
}

/// Nearest triangle hit found by a BVH query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhHit {
    /// Index into the triangle list the tree was built from
    pub triangle: usize,
    pub distance: f32,
    pub u: f32,
    pub v: f32,
}

impl BvhHit {
    fn new(triangle: usize, hit: TriangleHit) -> Self {
        Self {
            triangle,
            distance: hit.distance,
            u: hit.u,
            v: hit.v,
        }
    }
}

/// BVH node - either an interior node with two children or a single-triangle leaf.
#[derive(Debug)]
pub enum BvhNode {
    /// Leaf wrapping one triangle; the box is the triangle's own.
    Leaf { triangle: usize, bbox: Aabb },
    /// Internal node with two children.
    Interior {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
}

impl BvhNode {
    /// Build a BVH over `triangles`.
    ///
    /// An empty list is rejected up front; the recursive builder never sees
    /// an empty range.
    pub fn new(triangles: &[Triangle]) -> Result<Self, BvhError> {
        if triangles.is_empty() {
            return Err(BvhError::EmptyTriangleList);
        }

        let mut order: Vec<usize> = (0..triangles.len()).collect();
        let root = Self::build(triangles, &mut order, 0, triangles.len());

        log::debug!(
            "Built BVH: {} triangles, {} nodes, depth {}",
            triangles.len(),
            root.node_count(),
            root.depth()
        );

        Ok(root)
    }

    /// Recursive construction over the half-open range `[start, end)` of `order`.
    fn build(triangles: &[Triangle], order: &mut [usize], start: usize, end: usize) -> Self {
        debug_assert!(end > start, "BVH build over empty range {start}..{end}");

        let count = end - start;
        if count == 1 {
            return Self::leaf(triangles, order[start]);
        }

        let range = &mut order[start..end];
        let axis = best_axis(triangles, range);
        sort_by_min_corner(triangles, range, axis);

        let (left, right) = if count == 2 {
            (
                Self::leaf(triangles, order[start]),
                Self::leaf(triangles, order[start + 1]),
            )
        } else {
            // Left gets the smaller or equal half
            let mid = start + count / 2;
            (
                Self::build(triangles, order, start, mid),
                Self::build(triangles, order, mid, end),
            )
        };

        let bbox = Aabb::union(&left.bounding_box(), &right.bounding_box());
        BvhNode::Interior {
            left: Box::new(left),
            right: Box::new(right),
            bbox,
        }
    }

    fn leaf(triangles: &[Triangle], triangle: usize) -> Self {
        BvhNode::Leaf {
            triangle,
            bbox: triangles[triangle].bounding_box(),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Interior { bbox, .. } => *bbox,
        }
    }

    /// Nearest hit within `ray_t` using the chosen traversal.
    ///
    /// `triangles` must be the list the tree was built from.
    pub fn intersect_with(
        &self,
        traversal: Traversal,
        triangles: &[Triangle],
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<BvhHit> {
        match traversal {
            Traversal::Exhaustive => self.intersect(triangles, ray, ray_t),
            Traversal::Pruned => self.intersect_pruned(triangles, ray, ray_t),
        }
    }

    /// Nearest hit within `ray_t`, always descending both children.
    pub fn intersect(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> Option<BvhHit> {
        if !self.bounding_box().hit(ray, ray_t) {
            return None;
        }

        match self {
            BvhNode::Leaf { triangle, .. } => triangles[*triangle]
                .intersect(ray, ray_t)
                .map(|hit| BvhHit::new(*triangle, hit)),

            BvhNode::Interior { left, right, .. } => {
                let hit_left = left.intersect(triangles, ray, ray_t);
                let hit_right = right.intersect(triangles, ray, ray_t);
                closer(hit_left, hit_right)
            }
        }
    }

    /// Nearest hit within `ray_t`, shrinking the interval after the left child.
    pub fn intersect_pruned(
        &self,
        triangles: &[Triangle],
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<BvhHit> {
        if !self.bounding_box().hit(ray, ray_t) {
            return None;
        }

        match self {
            BvhNode::Leaf { triangle, .. } => triangles[*triangle]
                .intersect(ray, ray_t)
                .map(|hit| BvhHit::new(*triangle, hit)),

            BvhNode::Interior { left, right, .. } => {
                let hit_left = left.intersect_pruned(triangles, ray, ray_t);

                // Only check right up to closest hit
                let right_t = match hit_left {
                    Some(hit) => ray_t.with_max(hit.distance),
                    None => ray_t,
                };
                let hit_right = right.intersect_pruned(triangles, ray, right_t);
                closer(hit_left, hit_right)
            }
        }
    }

    /// Total number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Interior { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Interior { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Interior { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Pick the closer of two optional hits; the left one wins ties.
#[inline]
fn closer(left: Option<BvhHit>, right: Option<BvhHit>) -> Option<BvhHit> {
    match (left, right) {
        (Some(l), Some(r)) if r.distance < l.distance => Some(r),
        (Some(l), _) => Some(l),
        (None, r) => r,
    }
}

/// Stable sort of triangle indices by the minimum corner of their boxes.
fn sort_by_min_corner(triangles: &[Triangle], range: &mut [usize], axis_index: usize) {
    range.sort_by(|&a, &b| {
        let a_min = axis(triangles[a].bounding_box().min, axis_index);
        let b_min = axis(triangles[b].bounding_box().min, axis_index);
        a_min.partial_cmp(&b_min).unwrap_or(Ordering::Equal)
    });
}

/// Choose the split axis for `range` (which must hold at least two triangles).
///
/// For each axis the range is sorted by minimum corner and swept left to
/// right; at split position `i` the cost is
/// `area(left) * i + area(right) * (n - i)`. Only the cost at the last
/// position (`i = n - 1`, one triangle on the right) survives the sweep and
/// is compared across axes. Later axes replace the best only on strict
/// improvement, so axis 0 wins ties.
///
/// This is one reading of "compare the full-range cost": a cost over the
/// whole unsplit range would be the same on every axis, so the final sweep
/// position is used instead. Choosing a different position (or the sweep
/// minimum) changes which axis wins and therefore the tree shape.
///
/// Leaves `range` sorted by the last axis tried.
pub(crate) fn best_axis(triangles: &[Triangle], range: &mut [usize]) -> usize {
    let n = range.len();
    let mut best_axis = 0;
    let mut best_cost = f32::INFINITY;

    for axis_index in 0..3 {
        sort_by_min_corner(triangles, range, axis_index);

        // right_boxes[i] bounds range[i..]
        let mut right_boxes = vec![Aabb::EMPTY; n + 1];
        for i in (0..n).rev() {
            right_boxes[i] = Aabb::union(&right_boxes[i + 1], &triangles[range[i]].bounding_box());
        }

        let mut left = Aabb::EMPTY;
        let mut cost = f32::INFINITY;
        for split in 1..n {
            left = Aabb::union(&left, &triangles[range[split - 1]].bounding_box());
            cost = left.surface_area() * split as f32
                + right_boxes[split].surface_area() * (n - split) as f32;
        }

        if cost < best_cost {
            best_cost = cost;
            best_axis = axis_index;
        }
    }

    best_axis
}
