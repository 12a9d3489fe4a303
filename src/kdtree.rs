/*
 * KD-Tree Module
 *
 * A 2-D point index used to accelerate neighbour lookups. Nodes live in an
 * arena addressed by NodeId; removed nodes return their slot to a free list
 * that later insertions reuse.
 *
 * Every node stores the axis it splits on. Its left subtree holds points
 * strictly less than its own coordinate on that axis, its right subtree holds
 * the rest (ties go right). The root splits on X and each new leaf takes the
 * other axis of its parent. Value-equal points are stored once. There is no
 * rebalancing, so the shape depends on insertion order.
 */

use crate::vector::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

// Anything with 2-D coordinates can be indexed
pub trait Point {
    fn coord(&self, axis: Axis) -> f64;
}

impl Point for Vector2 {
    fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Node<P> {
    point: P,
    axis: Axis,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<P> Node<P> {
    fn leaf(point: P, axis: Axis) -> Self {
        Self {
            point,
            axis,
            left: None,
            right: None,
        }
    }

    fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KdTree<P> {
    nodes: Vec<Option<Node<P>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl<P> Default for KdTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> KdTree<P> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // Drop every point but keep the arena allocation for reuse
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    // Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|id| (id, 1)).into_iter().collect();
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = self.node(id);
            stack.extend(node.left.map(|child| (child, level + 1)));
            stack.extend(node.right.map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Lazily walks every stored point in pre-order.
    pub fn traverse(&self) -> Traverse<'_, P> {
        Traverse {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    fn node(&self, id: NodeId) -> &Node<P> {
        match &self.nodes[id.0] {
            Some(node) => node,
            None => unreachable!("kd-tree link points at a released slot {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<P> {
        match &mut self.nodes[id.0] {
            Some(node) => node,
            None => unreachable!("kd-tree link points at a released slot {id:?}"),
        }
    }

    fn alloc(&mut self, node: Node<P>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<P> {
        match self.nodes[id.0].take() {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => unreachable!("kd-tree slot {id:?} released twice"),
        }
    }
}

impl<P: Point + PartialEq> KdTree<P> {
    /// Inserts `point` as a new leaf. Returns `false`, leaving the tree
    /// untouched, if an equal point is already stored.
    pub fn insert(&mut self, point: P) -> bool {
        let Some(mut current) = self.root else {
            let id = self.alloc(Node::leaf(point, Axis::X));
            self.root = Some(id);
            self.len = 1;
            return true;
        };

        loop {
            let node = self.node(current);
            if node.point == point {
                return false;
            }

            let side = if point.coord(node.axis) < node.point.coord(node.axis) {
                Side::Left
            } else {
                Side::Right
            };

            match node.child(side) {
                Some(next) => current = next,
                None => {
                    let axis = node.axis.next();
                    let id = self.alloc(Node::leaf(point, axis));
                    self.node_mut(current).set_child(side, Some(id));
                    self.len += 1;
                    return true;
                }
            }
        }
    }

    pub fn contains(&self, point: &P) -> bool {
        self.find(point).is_some()
    }

    /// Every stored point strictly closer than `radius` to `center`.
    pub fn search(&self, center: Vector2, radius: f64) -> Vec<&P> {
        let mut found = Vec::new();
        let radius_sq = radius * radius;
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let node = self.node(id);
            let split = node.point.coord(node.axis);
            let query = center.coord(node.axis);

            if query - radius < split {
                stack.extend(node.left);
            }
            if query + radius > split {
                stack.extend(node.right);
            }

            let dx = center.x - node.point.coord(Axis::X);
            let dy = center.y - node.point.coord(Axis::Y);
            if dx * dx + dy * dy < radius_sq {
                found.push(&node.point);
            }
        }

        found
    }

    /// Removes the node holding a point equal to `point`. Absent points are
    /// ignored and `false` is returned.
    pub fn remove(&mut self, point: &P) -> bool {
        let Some((id, parent)) = self.find(point) else {
            return false;
        };

        let (replacement, _) = self.remove_at(id);
        match parent {
            Some((parent, side)) => self.node_mut(parent).set_child(side, replacement),
            None => self.root = replacement,
        }
        self.len -= 1;
        true
    }

    // Locate a point and the link that leads to it
    fn find(&self, point: &P) -> Option<(NodeId, Option<(NodeId, Side)>)> {
        let mut current = self.root?;
        let mut parent = None;

        loop {
            let node = self.node(current);
            if node.point == *point {
                return Some((current, parent));
            }
            let side = if point.coord(node.axis) < node.point.coord(node.axis) {
                Side::Left
            } else {
                Side::Right
            };
            parent = Some((current, side));
            current = node.child(side)?;
        }
    }

    // Remove the point held at `id`. Returns the node that now heads the
    // subtree `id` used to head, and the removed point.
    fn remove_at(&mut self, id: NodeId) -> (Option<NodeId>, P) {
        let node = self.node(id);
        let axis = node.axis;

        match (node.left, node.right) {
            (Some(_), Some(right)) => {
                let (successor, parent, side) = self.min_on_axis(right, axis, id);
                let (replacement, point) = self.remove_at(successor);
                self.node_mut(parent).set_child(side, replacement);
                let removed = std::mem::replace(&mut self.node_mut(id).point, point);
                (Some(id), removed)
            }
            (child, None) | (None, child) => {
                let node = self.release(id);
                (child, node.point)
            }
        }
    }

    // Node with the smallest coordinate on `axis` in the subtree at `start`,
    // with the link that leads to it. `parent` is the node above `start`,
    // which hangs off its right side.
    fn min_on_axis(&self, start: NodeId, axis: Axis, parent: NodeId) -> (NodeId, NodeId, Side) {
        let mut best = (start, parent, Side::Right);
        let mut best_value = self.node(start).point.coord(axis);
        let mut stack = vec![(start, parent, Side::Right)];

        while let Some((id, above, side)) = stack.pop() {
            let node = self.node(id);
            let value = node.point.coord(axis);
            if value < best_value {
                best = (id, above, side);
                best_value = value;
            }
            stack.extend(node.left.map(|child| (child, id, Side::Left)));
            // A right subtree split on the same axis cannot beat this node
            if node.axis != axis {
                stack.extend(node.right.map(|child| (child, id, Side::Right)));
            }
        }

        best
    }
}

impl<P: Point + PartialEq> FromIterator<P> for KdTree<P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut tree = KdTree::new();
        tree.extend(iter);
        tree
    }
}

impl<P: Point + PartialEq> Extend<P> for KdTree<P> {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for point in iter {
            self.insert(point);
        }
    }
}

// Pre-order walk over the stored points
pub struct Traverse<'a, P> {
    tree: &'a KdTree<P>,
    stack: Vec<NodeId>,
}

impl<'a, P> Iterator for Traverse<'a, P> {
    type Item = &'a P;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.right);
        self.stack.extend(node.left);
        Some(&node.point)
    }
}

impl<'a, P> IntoIterator for &'a KdTree<P> {
    type Item = &'a P;
    type IntoIter = Traverse<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.traverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y)
    }

    // Check the per-node partition invariant over the whole tree
    fn assert_partitioned(tree: &KdTree<Vector2>) {
        fn check(tree: &KdTree<Vector2>, id: NodeId, bounds: &mut Vec<(Axis, f64, Side)>) {
            let node = tree.node(id);
            for &(axis, split, side) in bounds.iter() {
                let value = node.point.coord(axis);
                match side {
                    Side::Left => assert!(value < split, "{} not left of {split}", node.point),
                    Side::Right => assert!(value >= split, "{} not right of {split}", node.point),
                }
            }
            let split = node.point.coord(node.axis);
            if let Some(left) = node.left {
                bounds.push((node.axis, split, Side::Left));
                check(tree, left, bounds);
                bounds.pop();
            }
            if let Some(right) = node.right {
                bounds.push((node.axis, split, Side::Right));
                check(tree, right, bounds);
                bounds.pop();
            }
        }
        if let Some(root) = tree.root {
            check(tree, root, &mut Vec::new());
        }
    }

    #[test]
    fn empty_tree() {
        let tree: KdTree<Vector2> = KdTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.search(v(0.5, 0.5), 1.0).is_empty());
        assert_eq!(tree.traverse().count(), 0);
    }

    #[test]
    fn axes_alternate_on_insert() {
        let mut tree = KdTree::new();
        tree.insert(v(0.5, 0.5));
        tree.insert(v(0.25, 0.75));
        tree.insert(v(0.3, 0.6));
        let root = tree.node(tree.root.unwrap());
        assert_eq!(root.axis, Axis::X);
        let left = tree.node(root.left.unwrap());
        assert_eq!(left.axis, Axis::Y);
        // 0.6 < 0.75 on Y
        let grandchild = tree.node(left.left.unwrap());
        assert_eq!(grandchild.axis, Axis::X);
        assert_eq!(grandchild.point, v(0.3, 0.6));
    }

    #[test]
    fn ties_go_right() {
        let mut tree = KdTree::new();
        tree.insert(v(0.5, 0.5));
        tree.insert(v(0.5, 0.1));
        let root = tree.node(tree.root.unwrap());
        assert!(root.left.is_none());
        assert!(root.right.is_some());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut tree = KdTree::new();
        assert!(tree.insert(v(0.1, 0.2)));
        assert!(tree.insert(v(0.3, 0.4)));
        assert!(!tree.insert(v(0.1, 0.2)));
        assert!(!tree.insert(v(0.3, 0.4)));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.traverse().count(), 2);
    }

    #[test]
    fn search_uses_strict_radius() {
        let tree: KdTree<Vector2> = [v(0.0, 0.0), v(0.5, 0.0), v(0.0, 0.25)].into_iter().collect();
        let found = tree.search(v(0.0, 0.0), 0.5);
        assert_eq!(found.len(), 2);
        assert!(!found.contains(&&v(0.5, 0.0)));
    }

    #[test]
    fn sorted_insertion_degenerates() {
        let tree: KdTree<Vector2> = (0..64).map(|i| v(i as f64, i as f64)).collect();
        assert_eq!(tree.len(), 64);
        assert_eq!(tree.depth(), 64);
    }

    #[test]
    fn remove_leaf_and_root() {
        let mut tree: KdTree<Vector2> = [v(0.5, 0.5), v(0.2, 0.2)].into_iter().collect();
        assert!(tree.remove(&v(0.2, 0.2)));
        assert_eq!(tree.len(), 1);
        assert!(tree.remove(&v(0.5, 0.5)));
        assert!(tree.is_empty());
        assert!(tree.root.is_none());
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut tree: KdTree<Vector2> = [v(0.5, 0.5), v(0.2, 0.2)].into_iter().collect();
        assert!(!tree.remove(&v(0.9, 0.9)));
        assert_eq!(tree.len(), 2);

        let mut empty: KdTree<Vector2> = KdTree::new();
        assert!(!empty.remove(&v(0.0, 0.0)));
    }

    #[test]
    fn remove_node_with_two_children() {
        let points = [
            v(0.5, 0.5),
            v(0.25, 0.4),
            v(0.75, 0.6),
            v(0.6, 0.3),
            v(0.9, 0.8),
            v(0.55, 0.9),
            v(0.65, 0.1),
        ];
        let mut tree: KdTree<Vector2> = points.into_iter().collect();
        assert!(tree.remove(&v(0.5, 0.5)));
        assert_partitioned(&tree);

        // Minimum X of the right subtree moved up to the root
        assert_eq!(tree.node(tree.root.unwrap()).point, v(0.55, 0.9));
        assert_eq!(tree.len(), points.len() - 1);
        for p in &points[1..] {
            assert!(tree.contains(p), "lost {p}");
        }
        assert!(!tree.contains(&v(0.5, 0.5)));
    }

    #[test]
    fn released_slots_are_reused() {
        let mut tree: KdTree<Vector2> = [v(0.5, 0.5), v(0.2, 0.2), v(0.8, 0.8)].into_iter().collect();
        tree.remove(&v(0.2, 0.2));
        tree.insert(v(0.1, 0.1));
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn traverse_is_preorder() {
        let tree: KdTree<Vector2> = [v(0.5, 0.5), v(0.2, 0.2), v(0.8, 0.8), v(0.1, 0.9)]
            .into_iter()
            .collect();
        let order: Vec<Vector2> = tree.traverse().copied().collect();
        assert_eq!(order, vec![v(0.5, 0.5), v(0.2, 0.2), v(0.1, 0.9), v(0.8, 0.8)]);
        assert_eq!((&tree).into_iter().count(), 4);
    }
}
