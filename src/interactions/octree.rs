use std::collections::HashSet;
use bumpalo::Bump;
use log::debug;
use crate::interactions::{can_pair, CandidatePair};
use crate::models::{BodyHandle, BodySet, Vector3};
use crate::utils::OctreeConfig;

/// Axis aligned box used for octree regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3,
    pub max: Vector3,
}

impl Aabb {
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Whether the box around the sphere `center ± radius` touches this region.
    ///
    /// Boundaries are inclusive so a sphere sitting on a split plane lands in both halves.
    pub fn overlaps_sphere(&self, center: Vector3, radius: f64) -> bool {
        center.x - radius <= self.max.x && center.x + radius >= self.min.x
            && center.y - radius <= self.max.y && center.y + radius >= self.min.y
            && center.z - radius <= self.max.z && center.z + radius >= self.min.z
    }

    /// Smallest box enclosing this one and the sphere.
    pub fn enclose_sphere(&self, center: Vector3, radius: f64) -> Aabb {
        Aabb {
            min: self.min.min(center - Vector3::splat(radius)),
            max: self.max.max(center + Vector3::splat(radius)),
        }
    }

    /// The `i`th of the eight octants, bit 0 selecting the upper x half, bit 1 y, bit 2 z.
    pub fn octant(&self, i: usize) -> Aabb {
        let c = self.center();
        let pick = |bit: usize, lo: f64, mid: f64, hi: f64| if i & bit == 0 { (lo, mid) } else { (mid, hi) };
        let (x0, x1) = pick(1, self.min.x, c.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, c.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, c.z, self.max.z);
        Aabb::new(Vector3::new(x0, y0, z0), Vector3::new(x1, y1, z1))
    }
}

/// A body as seen by the octree: its handle and bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    handle: BodyHandle,
    center: Vector3,
    radius: f64,
}

/// Octree node, allocated in the tree's bump arena.
///
/// - `Leaf`: a region with the bodies whose bounding spheres touch it
/// - `Internal`: a subdivided region with exactly eight children
///
/// The lifetime parameter `'a` is tied to the arena the tree was built in.
#[derive(Debug)]
enum Octant<'a> {
    Leaf {
        region: Aabb,
        members: &'a [Entry],
    },
    Internal {
        children: &'a [Octant<'a>],
    },
}

/// Spatial index producing candidate pairs, rebuilt from scratch every tick.
///
/// Nodes live in a [`Bump`] arena that is reset at the start of each rebuild, so
/// steady-state rebuilding does not hit the global allocator for tree nodes.
///
/// # Examples
///
/// ```
/// use rs_rigid::interactions::Octree;
/// use rs_rigid::models::{BodySet, RigidBody, SphereShape, Vector3};
/// use rs_rigid::utils::OctreeConfig;
///
/// let mut bodies = BodySet::new();
/// for x in [0.0, 0.5, 8.0] {
///     bodies.insert(
///         RigidBody::new()
///             .with_position(Vector3::new(x, 0.0, 0.0))
///             .with_shape(Box::new(SphereShape::new(0.5)))
///             .unwrap(),
///     );
/// }
///
/// let mut octree = Octree::new();
/// let pairs = octree.candidate_pairs(&bodies, &OctreeConfig::default());
/// assert!(!pairs.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Octree {
    arena: Bump,
    leaf_regions: Vec<Aabb>,
    root_region: Option<Aabb>,
}

impl Octree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions of the non-empty leaves from the last build.
    pub fn leaf_regions(&self) -> &[Aabb] {
        &self.leaf_regions
    }

    /// Root region from the last build, grown beyond the configured box if needed.
    pub fn root_region(&self) -> Option<Aabb> {
        self.root_region
    }

    /// Rebuilds the tree from `bodies` and returns every deduplicated pair sharing a leaf.
    pub fn candidate_pairs(&mut self, bodies: &BodySet, config: &OctreeConfig) -> Vec<CandidatePair> {
        self.arena.reset();
        self.leaf_regions.clear();

        let entries: Vec<Entry> = bodies
            .iter()
            .filter(|(_, body)| body.has_shape())
            .map(|(handle, body)| Entry {
                handle,
                center: body.position(),
                radius: body.bounding_radius(),
            })
            .collect();

        let configured = Aabb::new(config.world_min, config.world_max);
        let region = entries
            .iter()
            .fold(configured, |region, e| region.enclose_sphere(e.center, e.radius));
        if region != configured {
            debug!("octree root grown to {:?} to enclose all bodies", region);
        }
        self.root_region = Some(region);

        let root = build(&self.arena, region, &entries, config);

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        collect_pairs(&root, bodies, &mut seen, &mut pairs, &mut self.leaf_regions);
        pairs
    }
}

fn build<'a>(arena: &'a Bump, region: Aabb, entries: &[Entry], config: &OctreeConfig) -> Octant<'a> {
    let size = region.size();
    let too_small = size.x < config.min_size && size.y < config.min_size && size.z < config.min_size;
    if entries.len() <= config.max_objects || too_small {
        return Octant::Leaf { region, members: arena.alloc_slice_copy(entries) };
    }

    let child_entries: Vec<(Aabb, Vec<Entry>)> = (0..8)
        .map(|i| {
            let child = region.octant(i);
            let inside = entries
                .iter()
                .filter(|e| child.overlaps_sphere(e.center, e.radius))
                .copied()
                .collect();
            (child, inside)
        })
        .collect();

    // Splitting is pointless when every body reaches into every child.
    if child_entries.iter().all(|(_, inside)| inside.len() == entries.len()) {
        return Octant::Leaf { region, members: arena.alloc_slice_copy(entries) };
    }

    let children: Vec<Octant<'a>> = child_entries
        .iter()
        .map(|(child, inside)| build(arena, *child, inside, config))
        .collect();
    Octant::Internal { children: arena.alloc_slice_fill_iter(children) }
}

fn collect_pairs(
    node: &Octant<'_>,
    bodies: &BodySet,
    seen: &mut HashSet<CandidatePair>,
    pairs: &mut Vec<CandidatePair>,
    leaf_regions: &mut Vec<Aabb>,
) {
    match node {
        Octant::Internal { children } => {
            for child in children.iter() {
                collect_pairs(child, bodies, seen, pairs, leaf_regions);
            }
        }
        Octant::Leaf { region, members } => {
            if members.is_empty() {
                return;
            }
            leaf_regions.push(*region);
            for (i, first) in members.iter().enumerate() {
                for second in &members[i + 1..] {
                    let (Some(a), Some(b)) = (bodies.get(first.handle), bodies.get(second.handle)) else {
                        continue;
                    };
                    if !can_pair(a, b) {
                        continue;
                    }
                    let pair = CandidatePair::new(first.handle, second.handle);
                    if seen.insert(pair) {
                        pairs.push(pair);
                    }
                }
            }
        }
    }
}
