//! Weighted SDF + color combine and the depth-dependent truncation policy.

use crate::entry::Voxel;
use crate::params::HashParams;

/// `truncation + trunc_scale * z`, the maximum `|sdf|` admitted at measured
/// depth `z`.
pub fn truncation_at_depth(params: &HashParams, z: f32) -> f32 {
    params.truncation + params.trunc_scale * z
}

/// Combines the currently-stored voxel `v0` with a new observation `v1`.
/// Callers must guarantee `v1.weight > 0`.
pub fn combine_voxel(v0: Voxel, v1: Voxel, weight_max: u32) -> Voxel {
    debug_assert!(v1.weight > 0, "combine_voxel requires a nonzero observation weight");

    let w0 = v0.weight as f32;
    let w1 = v1.weight as f32;
    let total = w0 + w1;

    let sdf = (v0.sdf * w0 + v1.sdf * w1) / total;

    let mut color = [0u8; 3];
    for c in 0..3 {
        let blended = (v0.color[c] as f32 * w0 + v1.color[c] as f32 * w1) / total;
        color[c] = (blended + 0.5).floor() as u8;
    }

    let weight = (v0.weight as u32 + v1.weight as u32).min(weight_max) as u8;

    Voxel { sdf, color, weight }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_integration_math() {
        let v0 = Voxel { sdf: 0.2, weight: 3, color: [60, 60, 60] };
        let v1 = Voxel { sdf: 0.5, weight: 2, color: [100, 100, 100] };
        let out = combine_voxel(v0, v1, 255);
        assert!((out.sdf - 0.32).abs() < 1e-5, "sdf = {}", out.sdf);
        assert_eq!(out.weight, 5);
        assert_eq!(out.color, [76, 76, 76]);
    }

    #[test]
    fn weight_saturates_at_max() {
        let v0 = Voxel { sdf: 0.0, weight: 250, color: [0, 0, 0] };
        let v1 = Voxel { sdf: 0.0, weight: 250, color: [0, 0, 0] };
        let out = combine_voxel(v0, v1, 255);
        assert_eq!(out.weight, 255);
    }

    #[test]
    fn truncation_grows_with_depth() {
        let params = HashParams { truncation: 0.02, trunc_scale: 0.01, ..HashParams::default() };
        assert!((truncation_at_depth(&params, 0.0) - 0.02).abs() < 1e-6);
        assert!((truncation_at_depth(&params, 2.0) - 0.04).abs() < 1e-6);
    }
}
