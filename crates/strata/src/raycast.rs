//! # Voxel Picking
//!
//! Slab-method ray tests against every rendered voxel, and face resolution
//! for placing a block against the voxel that was hit.

use strata_procedural::{VoxelKey, VoxelWorldState, POSITION_STRIDE};

use crate::math::Vec3;

/// Hits closer than this to the origin are treated as behind it.
pub const RAY_EPSILON: f32 = 1e-6;

/// Tolerance when matching a hit point to a face plane.
pub const FACE_EPSILON: f32 = 1e-3;

const HALF_VOXEL: f32 = 0.5;

/// Closest voxel hit by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Slot in the render buffers.
    pub index: usize,
    /// Voxel that was hit.
    pub voxel: VoxelKey,
    /// Ray parameter at entry.
    pub t: f32,
}

impl RayHit {
    /// Entry point on the voxel's surface.
    #[must_use]
    pub fn point(&self, origin: Vec3, direction: Vec3) -> Vec3 {
        origin + direction * self.t
    }
}

/// Entry parameter of a ray into the unit voxel centered at `center`.
///
/// Axes with a zero direction component are skipped unless the origin lies
/// outside that slab, which is a miss.
#[must_use]
pub fn intersect_voxel(origin: Vec3, direction: Vec3, center: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = origin.axis(axis);
        let d = direction.axis(axis);
        let lo = center.axis(axis) - HALF_VOXEL;
        let hi = center.axis(axis) + HALF_VOXEL;

        if d == 0.0 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }

    if t_min > t_max || t_max < RAY_EPSILON {
        return None;
    }
    Some(t_min)
}

/// Nearest rendered voxel in front of the origin.
///
/// Scans the whole position buffer. Voxels the origin sits inside have a
/// negative entry parameter and are ignored.
#[must_use]
pub fn intersect_voxels(world: &VoxelWorldState, origin: Vec3, direction: Vec3) -> Option<RayHit> {
    let mut best: Option<RayHit> = None;

    for (index, slot) in world.positions().chunks_exact(POSITION_STRIDE).enumerate() {
        let center = Vec3::new(slot[0], slot[1], slot[2]);
        let Some(t) = intersect_voxel(origin, direction, center) else {
            continue;
        };
        if t <= 0.0 || best.is_some_and(|hit| hit.t <= t) {
            continue;
        }
        best = Some(RayHit {
            index,
            voxel: VoxelKey::new(slot[0] as i32, slot[1] as i32, slot[2] as i32),
            t,
        });
    }

    if let Some(hit) = best {
        tracing::trace!(index = hit.index, t = hit.t, "ray hit");
    }
    best
}

/// Outward unit offset of the face of `voxel` that `point` lies on.
///
/// Faces are checked in x, y, z order, min before max, so an edge or corner
/// hit resolves to the first matching face.
#[must_use]
pub fn placement_offset(voxel: VoxelKey, point: Vec3) -> Option<[i32; 3]> {
    let center = [voxel.x as f32, voxel.y as f32, voxel.z as f32];

    for (axis, &c) in center.iter().enumerate() {
        let p = point.axis(axis);
        for (plane, step) in [(c - HALF_VOXEL, -1), (c + HALF_VOXEL, 1)] {
            if (p - plane).abs() <= FACE_EPSILON {
                let mut offset = [0; 3];
                offset[axis] = step;
                return Some(offset);
            }
        }
    }
    None
}

/// Empty cell against the face of the hit voxel.
#[must_use]
pub fn placement_target(hit: &RayHit, origin: Vec3, direction: Vec3) -> Option<VoxelKey> {
    let [dx, dy, dz] = placement_offset(hit.voxel, hit.point(origin, direction))?;
    Some(hit.voxel.offset(dx, dy, dz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_procedural::{ChunkCoord, ColumnKey};

    /// Flat floor at height -10, far below the test rays.
    fn world_with(voxels: &[VoxelKey]) -> VoxelWorldState {
        let size = 192;
        let center = ChunkCoord::new(0, 0);
        let mut world = VoxelWorldState::from_heightmap(
            center,
            ColumnKey::new(-96, -96),
            size,
            &vec![-10; size * size],
            &vec![2.0; size * size],
            16,
        );
        for &voxel in voxels {
            assert!(world.add_cube(voxel));
        }
        world.rebuild_buffers();
        world
    }

    #[test]
    fn test_ray_hits_known_voxel() {
        let target = VoxelKey::new(5, 0, 5);
        let world = world_with(&[target]);
        let direction = Vec3::new(1.0, 0.0, 1.0).normalized().expect("non-zero");

        let hit = intersect_voxels(&world, Vec3::ZERO, direction).expect("ray hits");
        assert_eq!(hit.voxel, target);
        assert_eq!(world.voxel_at(hit.index), Some(target));

        // Enters through the x = 4.5 and z = 4.5 planes together.
        let expected = 4.5 * std::f32::consts::SQRT_2;
        println!("t = {}, analytic = {expected}", hit.t);
        assert!((hit.t - expected).abs() < 1e-4);
    }

    #[test]
    fn test_nearest_voxel_wins() {
        let near = VoxelKey::new(3, 0, 0);
        let far = VoxelKey::new(8, 0, 0);
        let world = world_with(&[far, near]);

        let hit = intersect_voxels(&world, Vec3::ZERO, Vec3::X).expect("ray hits");
        assert_eq!(hit.voxel, near);
        assert!((hit.t - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_ray_misses() {
        let world = world_with(&[VoxelKey::new(5, 0, 5)]);

        // Pointing away.
        let behind = Vec3::new(-1.0, 0.0, -1.0).normalized().expect("non-zero");
        assert_eq!(intersect_voxels(&world, Vec3::ZERO, behind), None);

        // Parallel to an axis, outside the slab.
        assert_eq!(intersect_voxel(Vec3::new(0.0, 2.0, 0.0), Vec3::X, Vec3::new(5.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_origin_inside_voxel_is_ignored() {
        let world = world_with(&[VoxelKey::new(0, 0, 0), VoxelKey::new(4, 0, 0)]);

        let hit = intersect_voxels(&world, Vec3::ZERO, Vec3::X).expect("ray hits");
        assert_eq!(hit.voxel, VoxelKey::new(4, 0, 0));
    }

    #[test]
    fn test_placement_offset_faces() {
        let voxel = VoxelKey::new(2, 3, 4);

        assert_eq!(placement_offset(voxel, Vec3::new(1.5, 3.1, 4.2)), Some([-1, 0, 0]));
        assert_eq!(placement_offset(voxel, Vec3::new(2.0, 3.5, 4.0)), Some([0, 1, 0]));
        assert_eq!(placement_offset(voxel, Vec3::new(2.3, 3.0, 4.5)), Some([0, 0, 1]));
        // Edge: x wins over y.
        assert_eq!(placement_offset(voxel, Vec3::new(2.5, 3.5, 4.0)), Some([1, 0, 0]));
        // Interior point matches no face.
        assert_eq!(placement_offset(voxel, Vec3::new(2.0, 3.0, 4.0)), None);
    }

    #[test]
    fn test_placement_target_from_above() {
        let world = world_with(&[]);
        let origin = Vec3::new(0.0, 5.0, 0.0);
        let down = Vec3::new(0.0, -1.0, 0.0);

        let hit = intersect_voxels(&world, origin, down).expect("floor below");
        assert_eq!(hit.voxel, VoxelKey::new(0, -10, 0));
        assert_eq!(placement_target(&hit, origin, down), Some(VoxelKey::new(0, -9, 0)));
    }
}
