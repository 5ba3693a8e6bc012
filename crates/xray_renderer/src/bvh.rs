//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary tree over primitives, split at the median centroid on the longest
//! axis of the centroid bounds.

use crate::hittable::{HitRecord, Hittable};
use xray_math::{Aabb, Interval, Ray};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with primitives.
pub enum BvhNode<T> {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode<T>>,
        right: Box<BvhNode<T>>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of primitives.
    Leaf { objects: Vec<T>, bbox: Aabb },
    /// Empty node (for edge cases).
    Empty,
}

impl<T: Hittable> BvhNode<T> {
    /// Create a BVH from a list of primitives.
    pub fn new(objects: Vec<T>) -> Self {
        if objects.is_empty() {
            return BvhNode::Empty;
        }
        Self::build(objects)
    }

    fn build(mut objects: Vec<T>) -> Self {
        let n = objects.len();

        let bounds = objects.iter().fold(Aabb::EMPTY, |acc, o| {
            Aabb::surrounding(&acc, &o.bounding_box())
        });

        if n <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                objects,
                bbox: bounds,
            };
        }

        let mut centroid_bounds = Aabb::EMPTY;
        for obj in &objects {
            centroid_bounds.include(obj.bounding_box().centroid());
        }
        let axis = centroid_bounds.longest_axis();

        objects.sort_unstable_by(|a, b| {
            let a_val = a.bounding_box().centroid()[axis];
            let b_val = b.bounding_box().centroid()[axis];
            a_val
                .partial_cmp(&b_val)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = n / 2;
        let right_objects = objects.split_off(mid);
        let left_objects = objects;

        BvhNode::Branch {
            left: Box::new(Self::build(left_objects)),
            right: Box::new(Self::build(right_objects)),
            bbox: bounds,
        }
    }

    /// Number of primitives stored in the tree.
    pub fn len(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { objects, .. } => objects.len(),
            BvhNode::Branch { left, right, .. } => left.len() + right.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth of the tree; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl<T: Hittable> Hittable for BvhNode<T> {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        match self {
            BvhNode::Empty => false,

            BvhNode::Leaf { objects, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let mut hit_anything = false;
                let mut closest = ray_t.max;

                for obj in objects {
                    if obj.hit(ray, Interval::new(ray_t.min, closest), rec) {
                        hit_anything = true;
                        closest = rec.t;
                    }
                }
                hit_anything
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let hit_left = left.hit(ray, ray_t, rec);

                // Only check right up to closest hit
                let right_max = if hit_left { rec.t } else { ray_t.max };
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max), rec);

                hit_left || hit_right
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }
}
