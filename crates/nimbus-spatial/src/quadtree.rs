//! Region quadtree over axis-aligned bounding boxes.
//!
//! Each stored object lives in exactly one node: the deepest node whose
//! quadrant fully contains its bounds. Objects that straddle a midline stay in
//! the node where they straddle and are never duplicated into children.

use nimbus_core::{Aabb, Vec2};
use serde::{Deserialize, Serialize};

use crate::SpatialError;

/// Construction parameters for a [`Quadtree`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadtreeConfig {
    /// Root rectangle covering the playable world.
    pub bounds: Aabb,
    /// A leaf splits once it holds more than this many objects.
    pub max_objects: usize,
    /// Nodes at this depth never split. The root is depth 0.
    pub max_depth: u32,
}

impl QuadtreeConfig {
    /// Default limits (10 objects per node, depth 6) over the given world.
    pub fn for_world(bounds: Aabb) -> Self {
        Self {
            bounds,
            max_objects: 10,
            max_depth: 6,
        }
    }

    /// Check the parameters without building a tree.
    pub fn validate(&self) -> Result<(), SpatialError> {
        let b = self.bounds;
        if !b.is_finite() || b.width <= 0.0 || b.height <= 0.0 {
            return Err(SpatialError::InvalidRoot(b));
        }
        if self.max_objects == 0 {
            return Err(SpatialError::InvalidNodeCapacity);
        }
        Ok(())
    }
}

/// An object stored in the tree together with the bounds it was inserted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadEntry<T> {
    /// Caller-supplied identifier.
    pub item: T,
    /// Bounds used for placement and queries.
    pub bounds: Aabb,
}

/// Returns the quadrant of `region` that fully contains `bounds`, if any.
///
/// Uses midpoint comparisons under the half-open convention, so an object
/// touching the midline from the min side still fits the min quadrant while a
/// zero-size object exactly on the midline belongs to the max quadrant only.
/// Quadrant order matches [`Aabb::quadrants`].
pub fn quadrant_index(bounds: &Aabb, region: &Aabb) -> Option<usize> {
    if !region.contains(bounds) {
        return None;
    }
    let mid = region.center();
    let fits_min = |lo: f32, hi: f32, m: f32| if hi > lo { hi <= m } else { lo < m };

    let west = fits_min(bounds.x, bounds.right(), mid.x);
    let east = bounds.x >= mid.x;
    let north = fits_min(bounds.y, bounds.bottom(), mid.y);
    let south = bounds.y >= mid.y;

    match (west, east, north, south) {
        (true, _, true, _) => Some(0),
        (_, true, true, _) => Some(1),
        (true, _, _, true) => Some(2),
        (_, true, _, true) => Some(3),
        _ => None,
    }
}

/// Square covering every point within `radius` of `center`, edges included.
///
/// The half-open square around the circle would drop centers lying exactly
/// on its max edges, so it is padded by a few ulps of the coordinate scale.
/// The exact distance filter runs afterwards.
fn radius_candidates(center: Vec2, radius: f32) -> Aabb {
    let scale = center.x.abs().max(center.y.abs()).max(radius);
    let pad = scale * f32::EPSILON * 4.0 + f32::MIN_POSITIVE;
    Aabb::around_circle(center, radius).expanded(pad)
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_objects: usize,
    max_depth: u32,
}

/// A node of the quadtree.
///
/// A leaf holds its objects directly. After a split the node has exactly four
/// children and keeps only the objects that straddle its midlines.
#[derive(Debug, Clone)]
pub struct QuadNode<T> {
    bounds: Aabb,
    depth: u32,
    objects: Vec<QuadEntry<T>>,
    children: Option<Box<[QuadNode<T>; 4]>>,
}

impl<T: Copy + PartialEq> QuadNode<T> {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            objects: Vec::new(),
            children: None,
        }
    }

    /// Region covered by this node.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Depth below the root.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Objects held directly by this node.
    pub fn objects(&self) -> &[QuadEntry<T>] {
        &self.objects
    }

    /// The four children, present only after a split.
    pub fn children(&self) -> Option<&[QuadNode<T>; 4]> {
        self.children.as_deref()
    }

    /// Returns true if this node has not been split.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn insert(&mut self, entry: QuadEntry<T>, limits: Limits) {
        if let Some(children) = self.children.as_mut() {
            match quadrant_index(&entry.bounds, &self.bounds) {
                Some(i) => children[i].insert(entry, limits),
                None => self.objects.push(entry),
            }
            return;
        }

        self.objects.push(entry);
        if self.objects.len() > limits.max_objects && self.depth < limits.max_depth {
            self.split(limits);
        }
    }

    fn split(&mut self, limits: Limits) {
        let depth = self.depth + 1;
        let quads = self.bounds.quadrants();
        self.children = Some(Box::new(quads.map(|b| QuadNode::new(b, depth))));

        tracing::debug!(
            "Quadtree split at depth {} ({} objects)",
            self.depth,
            self.objects.len()
        );

        for entry in std::mem::take(&mut self.objects) {
            self.insert(entry, limits);
        }
    }

    fn remove(&mut self, item: &T, bounds: &Aabb) -> bool {
        if let Some(children) = self.children.as_mut()
            && let Some(i) = quadrant_index(bounds, &self.bounds)
        {
            return children[i].remove(item, bounds);
        }
        match self.objects.iter().position(|e| e.item == *item) {
            Some(pos) => {
                self.objects.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    fn retrieve(&self, query: &Aabb, out: &mut Vec<QuadEntry<T>>) {
        out.extend(self.objects.iter().filter(|e| e.bounds.intersects(query)));
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if child.bounds.intersects(query) {
                    child.retrieve(query, out);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.objects.clear();
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.clear();
            }
        }
        self.children = None;
    }

    fn max_depth(&self) -> u32 {
        match self.children.as_ref() {
            Some(children) => children.iter().map(QuadNode::max_depth).max().unwrap_or(self.depth),
            None => self.depth,
        }
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(QuadNode::node_count).sum())
    }

    fn occurrences(&self, item: &T) -> usize {
        let here = self.objects.iter().filter(|e| e.item == *item).count();
        here + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(|n| n.occurrences(item)).sum())
    }
}

/// Quadtree answering rectangle, radius and nearest-neighbour queries.
#[derive(Debug, Clone)]
pub struct Quadtree<T> {
    root: QuadNode<T>,
    limits: Limits,
    len: usize,
}

impl<T: Copy + PartialEq> Quadtree<T> {
    /// Build an empty tree.
    pub fn new(config: QuadtreeConfig) -> Result<Self, SpatialError> {
        config.validate()?;
        Ok(Self {
            root: QuadNode::new(config.bounds, 0),
            limits: Limits {
                max_objects: config.max_objects,
                max_depth: config.max_depth,
            },
            len: 0,
        })
    }

    /// Insert `item` with the given bounds.
    ///
    /// Bounds outside the root are accepted and kept in the root's own list.
    pub fn insert(&mut self, item: T, bounds: Aabb) {
        if !self.root.bounds.contains(&bounds) {
            tracing::warn!("Quadtree insert outside root bounds: {:?}", bounds);
        }
        self.root.insert(QuadEntry { item, bounds }, self.limits);
        self.len += 1;
    }

    /// Remove `item`, locating it through the bounds it was inserted with.
    ///
    /// Returns `false` if it is not found there.
    pub fn remove(&mut self, item: &T, bounds: &Aabb) -> bool {
        let removed = self.root.remove(item, bounds);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Move `item` from `old_bounds` to `new_bounds` by removing and reinserting.
    ///
    /// Returns whether the old entry was found. The new entry is inserted either way.
    pub fn update(&mut self, item: T, old_bounds: &Aabb, new_bounds: Aabb) -> bool {
        let found = self.remove(&item, old_bounds);
        self.insert(item, new_bounds);
        found
    }

    /// All entries whose bounds intersect `query`.
    pub fn retrieve(&self, query: &Aabb) -> Vec<QuadEntry<T>> {
        let mut out = Vec::new();
        self.retrieve_into(query, &mut out);
        out
    }

    /// Append all entries intersecting `query` to `out`.
    pub fn retrieve_into(&self, query: &Aabb, out: &mut Vec<QuadEntry<T>>) {
        self.root.retrieve(query, out);
    }

    /// All entries whose bounds center lies within `radius` of `center` (inclusive).
    pub fn retrieve_in_radius(&self, center: Vec2, radius: f32) -> Vec<QuadEntry<T>> {
        if !(radius >= 0.0) {
            return Vec::new();
        }
        let r_sq = radius * radius;
        let mut out = self.retrieve(&radius_candidates(center, radius));
        out.retain(|e| e.bounds.center_distance_squared(center) <= r_sq);
        out
    }

    /// Closest entry to `center` within `max_distance`, skipping `exclude`.
    ///
    /// Distance is measured to the bounds center. Ties keep the first entry found.
    pub fn find_nearest(
        &self,
        center: Vec2,
        max_distance: f32,
        exclude: Option<&T>,
    ) -> Option<QuadEntry<T>> {
        let mut best: Option<(f32, QuadEntry<T>)> = None;
        for entry in self.retrieve_in_radius(center, max_distance) {
            if exclude.is_some_and(|x| *x == entry.item) {
                continue;
            }
            let d = entry.bounds.center_distance_squared(center);
            if best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, entry));
            }
        }
        best.map(|(_, entry)| entry)
    }

    /// Remove every entry and collapse the tree back to a single leaf.
    pub fn clear(&mut self) {
        self.root.clear();
        self.len = 0;
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Depth of the deepest existing node (0 for an unsplit root).
    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }

    /// Total number of nodes including the root.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Root rectangle.
    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }

    /// Root node, for inspection.
    pub fn root(&self) -> &QuadNode<T> {
        &self.root
    }

    /// Number of nodes holding `item`. Always 0 or 1 for a consistent tree.
    pub fn occurrences(&self, item: &T) -> usize {
        self.root.occurrences(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> Aabb {
        Aabb::new(0.0, 0.0, 1000.0, 1000.0)
    }

    fn tree(max_objects: usize) -> Quadtree<u32> {
        Quadtree::new(QuadtreeConfig {
            bounds: world(),
            max_objects,
            max_depth: 6,
        })
        .unwrap()
    }

    fn sorted(entries: Vec<QuadEntry<u32>>) -> Vec<u32> {
        let mut ids: Vec<u32> = entries.into_iter().map(|e| e.item).collect();
        ids.sort_unstable();
        ids
    }

    /// Twelve objects over a capacity of ten force a split; a full query still finds all.
    #[test]
    fn test_twelve_objects_split_and_full_query() {
        let mut t = tree(10);
        for i in 0..12u32 {
            let x = (i % 4) as f32 * 200.0 + 20.0;
            let y = (i / 4) as f32 * 200.0 + 20.0;
            t.insert(i, Aabb::new(x, y, 10.0, 10.0));
        }
        assert!(!t.root().is_leaf(), "root should have split");
        assert!(t.depth() >= 1);
        assert_eq!(sorted(t.retrieve(&world())), (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_tree_queries() {
        let t = tree(4);
        assert!(t.retrieve(&world()).is_empty());
        assert!(t.retrieve_in_radius(Vec2::new(500.0, 500.0), 100.0).is_empty());
        assert!(t.find_nearest(Vec2::ZERO, 1e6, None).is_none());
        assert_eq!(t.depth(), 0);
        assert_eq!(t.node_count(), 1);
    }

    /// An object crossing the vertical midline stays at the parent after a split.
    #[test]
    fn test_straddling_object_stays_at_parent() {
        let mut t = tree(1);
        t.insert(1, Aabb::new(490.0, 100.0, 20.0, 20.0));
        t.insert(2, Aabb::new(100.0, 100.0, 10.0, 10.0));
        let root = t.root();
        assert!(!root.is_leaf());
        assert_eq!(root.objects().len(), 1);
        assert_eq!(root.objects()[0].item, 1);
        assert_eq!(t.occurrences(&1), 1);
        assert_eq!(t.occurrences(&2), 1);
    }

    /// A query covering parts of all four quadrants finds objects in each of them.
    #[test]
    fn test_query_spanning_quadrants_descends_into_all() {
        let mut t = tree(1);
        let ids_and_boxes = [
            (1, Aabb::new(450.0, 450.0, 10.0, 10.0)),
            (2, Aabb::new(540.0, 450.0, 10.0, 10.0)),
            (3, Aabb::new(450.0, 540.0, 10.0, 10.0)),
            (4, Aabb::new(540.0, 540.0, 10.0, 10.0)),
            (5, Aabb::new(100.0, 100.0, 10.0, 10.0)),
        ];
        for (id, b) in ids_and_boxes {
            t.insert(id, b);
        }
        let found = sorted(t.retrieve(&Aabb::new(400.0, 400.0, 200.0, 200.0)));
        assert_eq!(found, vec![1, 2, 3, 4]);
    }

    /// Objects sitting exactly on a split boundary are stored once.
    #[test]
    fn test_boundary_object_not_duplicated() {
        let mut t = tree(1);
        t.insert(1, Aabb::point(Vec2::new(500.0, 500.0)));
        t.insert(2, Aabb::new(500.0, 0.0, 0.0, 1000.0));
        t.insert(3, Aabb::new(10.0, 10.0, 5.0, 5.0));
        for id in 1..=3 {
            assert_eq!(t.occurrences(&id), 1, "object {id} duplicated or lost");
        }
        assert_eq!(t.retrieve(&world()).len(), 3);
    }

    #[test]
    fn test_zero_size_box_is_queryable() {
        let mut t = tree(2);
        t.insert(7, Aabb::point(Vec2::new(250.0, 250.0)));
        assert_eq!(sorted(t.retrieve(&Aabb::new(200.0, 200.0, 100.0, 100.0))), vec![7]);
        assert!(t.retrieve(&Aabb::new(0.0, 0.0, 250.0, 250.0)).is_empty());
    }

    /// Shared edges do not produce hits.
    #[test]
    fn test_edge_touching_query_excluded() {
        let mut t = tree(4);
        t.insert(1, Aabb::new(100.0, 100.0, 50.0, 50.0));
        assert!(t.retrieve(&Aabb::new(150.0, 100.0, 50.0, 50.0)).is_empty());
        assert_eq!(t.retrieve(&Aabb::new(149.0, 100.0, 50.0, 50.0)).len(), 1);
    }

    /// Entities outside the root are kept in the root list and still found.
    #[test]
    fn test_out_of_root_object_kept_at_root() {
        let mut t = tree(1);
        t.insert(1, Aabb::new(-50.0, -50.0, 10.0, 10.0));
        t.insert(2, Aabb::new(10.0, 10.0, 10.0, 10.0));
        t.insert(3, Aabb::new(900.0, 900.0, 10.0, 10.0));
        assert!(t.root().objects().iter().any(|e| e.item == 1));
        assert_eq!(sorted(t.retrieve(&Aabb::new(-100.0, -100.0, 60.0, 60.0))), vec![1]);
        assert!(t.remove(&1, &Aabb::new(-50.0, -50.0, 10.0, 10.0)));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_remove_unknown_returns_false() {
        let mut t = tree(4);
        t.insert(1, Aabb::new(10.0, 10.0, 1.0, 1.0));
        assert!(!t.remove(&2, &Aabb::new(10.0, 10.0, 1.0, 1.0)));
        assert!(t.remove(&1, &Aabb::new(10.0, 10.0, 1.0, 1.0)));
        assert!(!t.remove(&1, &Aabb::new(10.0, 10.0, 1.0, 1.0)));
        assert!(t.is_empty());
    }

    /// Removing and reinserting with the same bounds leaves query results unchanged.
    #[test]
    fn test_remove_insert_roundtrip_preserves_queries() {
        let mut t = tree(2);
        for i in 0..20u32 {
            t.insert(i, Aabb::new(i as f32 * 47.0, i as f32 * 31.0, 15.0, 15.0));
        }
        let query = Aabb::new(100.0, 100.0, 500.0, 400.0);
        let before = sorted(t.retrieve(&query));
        let b = Aabb::new(5.0 * 47.0, 5.0 * 31.0, 15.0, 15.0);
        assert!(t.remove(&5, &b));
        t.insert(5, b);
        assert_eq!(sorted(t.retrieve(&query)), before);
    }

    #[test]
    fn test_update_moves_object() {
        let mut t = tree(2);
        let old = Aabb::new(10.0, 10.0, 5.0, 5.0);
        t.insert(1, old);
        assert!(t.update(1, &old, Aabb::new(800.0, 800.0, 5.0, 5.0)));
        assert!(t.retrieve(&Aabb::new(0.0, 0.0, 100.0, 100.0)).is_empty());
        assert_eq!(t.retrieve(&Aabb::new(790.0, 790.0, 30.0, 30.0)).len(), 1);
        assert_eq!(t.len(), 1);
    }

    /// The radius filter is inclusive at exactly `r`.
    #[test]
    fn test_radius_boundary_included() {
        let mut t = tree(4);
        t.insert(1, Aabb::from_center(Vec2::new(130.0, 140.0), 4.0, 4.0));
        t.insert(2, Aabb::from_center(Vec2::new(131.0, 140.0), 4.0, 4.0));
        let hits = sorted(t.retrieve_in_radius(Vec2::new(100.0, 100.0), 50.0));
        assert_eq!(hits, vec![1]);
    }

    /// Zero-size entities exactly `r` away on the max side are still found.
    #[test]
    fn test_radius_includes_points_on_max_edge() {
        let mut t = tree(4);
        t.insert(1, Aabb::point(Vec2::new(150.0, 100.0)));
        t.insert(2, Aabb::point(Vec2::new(50.0, 100.0)));
        t.insert(3, Aabb::point(Vec2::new(100.0, 150.0)));
        t.insert(4, Aabb::point(Vec2::new(100.0, 50.0)));
        t.insert(5, Aabb::point(Vec2::new(150.5, 100.0)));
        t.insert(6, Aabb::new(100.0, 150.0, 20.0, 0.0));
        let hits = sorted(t.retrieve_in_radius(Vec2::new(100.0, 100.0), 50.0));
        assert_eq!(hits, vec![1, 2, 3, 4]);
        assert_eq!(
            t.find_nearest(Vec2::new(125.0, 100.0), 25.0, None).map(|e| e.item),
            Some(1)
        );
    }

    /// A zero radius finds a point sitting exactly on the center.
    #[test]
    fn test_zero_radius_hits_coincident_point() {
        let mut t = tree(4);
        t.insert(1, Aabb::point(Vec2::new(0.0, 0.0)));
        t.insert(2, Aabb::point(Vec2::new(300.0, 300.0)));
        assert_eq!(sorted(t.retrieve_in_radius(Vec2::ZERO, 0.0)), vec![1]);
        assert_eq!(sorted(t.retrieve_in_radius(Vec2::new(300.0, 300.0), 0.0)), vec![2]);
    }

    /// Box corners may fall inside the circle while the center does not.
    #[test]
    fn test_radius_uses_center_not_corners() {
        let mut t = tree(4);
        t.insert(1, Aabb::new(105.0, 95.0, 40.0, 10.0));
        assert!(t.retrieve_in_radius(Vec2::new(100.0, 100.0), 10.0).is_empty());
        assert_eq!(t.retrieve_in_radius(Vec2::new(100.0, 100.0), 25.0).len(), 1);
    }

    #[test]
    fn test_find_nearest_with_exclusion() {
        let mut t = tree(2);
        t.insert(1, Aabb::from_center(Vec2::new(100.0, 100.0), 2.0, 2.0));
        t.insert(2, Aabb::from_center(Vec2::new(110.0, 100.0), 2.0, 2.0));
        t.insert(3, Aabb::from_center(Vec2::new(300.0, 100.0), 2.0, 2.0));

        let origin = Vec2::new(100.0, 100.0);
        assert_eq!(t.find_nearest(origin, 50.0, None).map(|e| e.item), Some(1));
        assert_eq!(t.find_nearest(origin, 50.0, Some(&1)).map(|e| e.item), Some(2));
        assert_eq!(t.find_nearest(origin, 5.0, Some(&1)), None);
    }

    #[test]
    fn test_clear_collapses_tree() {
        let mut t = tree(1);
        for i in 0..30u32 {
            t.insert(i, Aabb::new(i as f32 * 30.0, i as f32 * 30.0, 5.0, 5.0));
        }
        assert!(t.node_count() > 1);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 1);
        assert!(t.retrieve(&world()).is_empty());
    }

    /// Splitting stops at `max_depth` even when a node overflows.
    #[test]
    fn test_max_depth_caps_splitting() {
        let mut t = Quadtree::new(QuadtreeConfig {
            bounds: world(),
            max_objects: 1,
            max_depth: 2,
        })
        .unwrap();
        for i in 0..50u32 {
            t.insert(i, Aabb::new(1.0 + i as f32 * 0.1, 1.0, 0.05, 0.05));
        }
        assert_eq!(t.depth(), 2);
        assert_eq!(t.retrieve(&world()).len(), 50);
    }

    #[test]
    fn test_quadrant_index_midpoints() {
        let region = Aabb::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(quadrant_index(&Aabb::new(10.0, 10.0, 5.0, 5.0), &region), Some(0));
        assert_eq!(quadrant_index(&Aabb::new(60.0, 10.0, 5.0, 5.0), &region), Some(1));
        assert_eq!(quadrant_index(&Aabb::new(10.0, 60.0, 5.0, 5.0), &region), Some(2));
        assert_eq!(quadrant_index(&Aabb::new(60.0, 60.0, 5.0, 5.0), &region), Some(3));
        assert_eq!(quadrant_index(&Aabb::new(45.0, 10.0, 10.0, 5.0), &region), None);
        assert_eq!(quadrant_index(&Aabb::new(10.0, 45.0, 5.0, 10.0), &region), None);
        assert_eq!(quadrant_index(&Aabb::new(-5.0, 10.0, 5.0, 5.0), &region), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_root = QuadtreeConfig {
            bounds: Aabb::new(0.0, 0.0, 0.0, 10.0),
            max_objects: 4,
            max_depth: 4,
        };
        assert!(matches!(
            Quadtree::<u32>::new(bad_root),
            Err(SpatialError::InvalidRoot(_))
        ));

        let bad_cap = QuadtreeConfig {
            max_objects: 0,
            ..QuadtreeConfig::for_world(world())
        };
        assert_eq!(
            Quadtree::<u32>::new(bad_cap).unwrap_err(),
            SpatialError::InvalidNodeCapacity
        );
    }
}
