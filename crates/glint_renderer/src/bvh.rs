//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in a flat arena and refer to their children by index, either
//! another node or a primitive in the owning [`crate::World`]. Children are
//! always pushed before their parent, which lets [`Bvh::refit`] walk the
//! arena front to back.

use crate::{HitRecord, Primitive};
use glint_math::{Aabb, Interval, Ray};
use rand::{Rng, RngCore};

/// Handle to one side of a BVH node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhChild {
    /// Index into the primitive slice.
    Primitive(usize),
    /// Index into the node arena.
    Node(usize),
}

/// Internal node. Its box is always the merge of its children's boxes.
#[derive(Debug, Clone)]
struct BvhNode {
    left: BvhChild,
    right: BvhChild,
    bbox: Aabb,
}

/// Binary BVH over a primitive slice owned elsewhere.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<usize>,
}

impl Bvh {
    /// Build a BVH over every primitive in the slice.
    ///
    /// Each level picks a random axis, sorts by box minimum on that axis and
    /// splits at the median. A single primitive becomes a node with the same
    /// child on both sides.
    pub fn build(primitives: &[Primitive], rng: &mut dyn RngCore) -> Self {
        let mut bvh = Self::default();
        if primitives.is_empty() {
            return bvh;
        }

        let boxes: Vec<Aabb> = primitives.iter().map(|p| p.bounding_box()).collect();
        let mut indices: Vec<usize> = (0..primitives.len()).collect();
        let root = bvh.build_node(&boxes, &mut indices, rng);
        bvh.root = Some(root);

        log::debug!(
            "Built BVH: {} primitives, {} nodes",
            primitives.len(),
            bvh.nodes.len()
        );
        bvh
    }

    fn build_node(&mut self, boxes: &[Aabb], indices: &mut [usize], rng: &mut dyn RngCore) -> usize {
        let axis = rng.gen_range(0..3);
        indices.sort_by(|&a, &b| {
            let a_min = boxes[a].axis_interval(axis).min;
            let b_min = boxes[b].axis_interval(axis).min;
            a_min.partial_cmp(&b_min).unwrap_or(std::cmp::Ordering::Equal)
        });

        let (left, right) = match indices.len() {
            1 => (BvhChild::Primitive(indices[0]), BvhChild::Primitive(indices[0])),
            2 => (BvhChild::Primitive(indices[0]), BvhChild::Primitive(indices[1])),
            n => {
                let (lower, upper) = indices.split_at_mut(n / 2);
                let left = self.build_node(boxes, lower, rng);
                let right = self.build_node(boxes, upper, rng);
                (BvhChild::Node(left), BvhChild::Node(right))
            }
        };

        let bbox = Aabb::surrounding(&self.child_box(boxes, left), &self.child_box(boxes, right));
        self.push(left, right, bbox)
    }

    fn push(&mut self, left: BvhChild, right: BvhChild, bbox: Aabb) -> usize {
        self.nodes.push(BvhNode { left, right, bbox });
        self.nodes.len() - 1
    }

    fn child_box(&self, boxes: &[Aabb], child: BvhChild) -> Aabb {
        match child {
            BvhChild::Primitive(i) => boxes[i],
            BvhChild::Node(n) => self.nodes[n].bbox,
        }
    }

    /// Join a newly appended primitive to the tree under a new root.
    pub fn insert(&mut self, primitives: &[Primitive], index: usize) {
        let leaf = BvhChild::Primitive(index);
        let leaf_box = primitives[index].bounding_box();

        let root = match self.root {
            None => self.push(leaf, leaf, leaf_box),
            Some(old) => {
                let bbox = Aabb::surrounding(&self.nodes[old].bbox, &leaf_box);
                self.push(BvhChild::Node(old), leaf, bbox)
            }
        };
        self.root = Some(root);
    }

    /// Recompute every node box bottom-up after primitives moved.
    ///
    /// Topology is unchanged; only boxes grow or shrink.
    pub fn refit(&mut self, primitives: &[Primitive]) {
        for n in 0..self.nodes.len() {
            let BvhNode { left, right, .. } = self.nodes[n];
            let left_box = self.refit_box(primitives, left);
            let right_box = self.refit_box(primitives, right);
            self.nodes[n].bbox = Aabb::surrounding(&left_box, &right_box);
        }
    }

    fn refit_box(&self, primitives: &[Primitive], child: BvhChild) -> Aabb {
        match child {
            BvhChild::Primitive(i) => primitives[i].bounding_box(),
            BvhChild::Node(n) => self.nodes[n].bbox,
        }
    }

    /// Nearest hit in `ray_t`, or `None`.
    ///
    /// Skips whole subtrees whose box the ray misses. The right child is
    /// queried only up to the left hit's `t`; on a tie the right hit wins.
    pub fn hit<'a>(
        &self,
        primitives: &'a [Primitive],
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<HitRecord<'a>> {
        let root = self.root?;
        self.hit_child(primitives, BvhChild::Node(root), ray, ray_t)
    }

    fn hit_child<'a>(
        &self,
        primitives: &'a [Primitive],
        child: BvhChild,
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<HitRecord<'a>> {
        let node = match child {
            BvhChild::Primitive(i) => return primitives[i].hit(ray, ray_t),
            BvhChild::Node(n) => &self.nodes[n],
        };

        if !node.bbox.hit(ray, ray_t) {
            return None;
        }

        let left = self.hit_child(primitives, node.left, ray, ray_t);
        let right_max = left.as_ref().map_or(ray_t.max, |rec| rec.t);
        let right = self.hit_child(primitives, node.right, ray, Interval::new(ray_t.min, right_max));

        match (left, right) {
            (Some(l), Some(r)) => Some(if r.t <= l.t { r } else { l }),
            (l, None) => l,
            (None, r) => r,
        }
    }

    /// Box around everything in the tree.
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.root.map(|n| self.nodes[n].bbox)
    }

    /// Primitive indices in depth-first, left-to-right order.
    ///
    /// The duplicated child of a single-primitive node is reported once.
    pub fn primitive_order(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let Some(root) = self.root else {
            return order;
        };

        let mut stack = vec![BvhChild::Node(root)];
        while let Some(child) = stack.pop() {
            match child {
                BvhChild::Primitive(i) => order.push(i),
                BvhChild::Node(n) => {
                    let node = &self.nodes[n];
                    if node.right != node.left {
                        stack.push(node.right);
                    }
                    stack.push(node.left);
                }
            }
        }
        order
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}
