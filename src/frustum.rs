//! Approximate block-in-frustum predicate.
//!
//! Tests only the block's center — callers that need safety margin on
//! glancing blocks must apply one themselves or multi-sample.

use glam::IVec3;

use crate::coord::block_center_world;
use crate::params::HashParams;
use crate::sensor::CameraModel;

pub fn is_block_in_frustum_approx(camera: &dyn CameraModel, block_pos: IVec3, params: &HashParams) -> bool {
    let center = block_center_world(block_pos, params);
    camera.is_point_in_frustum_approx(center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::PredicateCamera;

    #[test]
    fn delegates_to_camera_point_test() {
        let params = HashParams::default();
        let accept_all = PredicateCamera::new(|_| true);
        let reject_all = PredicateCamera::new(|_| false);
        assert!(is_block_in_frustum_approx(&accept_all, IVec3::new(3, 4, 5), &params));
        assert!(!is_block_in_frustum_approx(&reject_all, IVec3::new(3, 4, 5), &params));
    }
}
