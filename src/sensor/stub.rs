//! Minimal in-memory collaborator implementations used by tests and benches.
//! Not a production sensor driver — real acquisition is out of scope.

use glam::{Mat4, Vec3};
use rand::Rng;

use super::{CameraModel, ColorMap, DepthMap};

pub struct StubDepthMap {
    width: u32,
    height: u32,
    depths: Vec<f32>,
}

impl StubDepthMap {
    pub fn new(width: u32, height: u32, depths: Vec<f32>) -> Self {
        assert_eq!(depths.len(), (width * height) as usize);
        Self { width, height, depths }
    }

    /// A flat depth plane at `z` meters, useful for deterministic tests.
    pub fn flat(width: u32, height: u32, z: f32) -> Self {
        Self::new(width, height, vec![z; (width * height) as usize])
    }

    /// Uniform random depths in `[near, far]`, with a fraction of pixels
    /// marked invalid (`0.0`).
    pub fn random(width: u32, height: u32, near: f32, far: f32, invalid_fraction: f32, rng: &mut impl Rng) -> Self {
        let depths = (0..width * height)
            .map(|_| {
                if rng.gen::<f32>() < invalid_fraction {
                    0.0
                } else {
                    rng.gen_range(near..far)
                }
            })
            .collect();
        Self::new(width, height, depths)
    }
}

impl DepthMap for StubDepthMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depths[(y * self.width + x) as usize]
    }
}

pub struct StubColorMap {
    width: u32,
    height: u32,
    colors: Vec<[u8; 3]>,
}

impl StubColorMap {
    pub fn new(width: u32, height: u32, colors: Vec<[u8; 3]>) -> Self {
        assert_eq!(colors.len(), (width * height) as usize);
        Self { width, height, colors }
    }

    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::new(width, height, vec![color; (width * height) as usize])
    }
}

impl ColorMap for StubColorMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_at(&self, x: u32, y: u32) -> [u8; 3] {
        self.colors[(y * self.width + x) as usize]
    }
}

/// A simple pinhole camera used for tests and benches. `is_point_in_frustum_approx`
/// checks the projected pixel against `[0, w) x [0, h)` and depth against
/// `[z_near, z_far]`.
pub struct PinholeCamera {
    pub view: Mat4,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub width: u32,
    pub height: u32,
    pub z_near: f32,
    pub z_far: f32,
}

impl PinholeCamera {
    pub fn looking_down_z(width: u32, height: u32, z_near: f32, z_far: f32) -> Self {
        Self {
            view: Mat4::IDENTITY,
            fx: width as f32,
            fy: width as f32,
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
            width,
            height,
            z_near,
            z_far,
        }
    }

}

impl CameraModel for PinholeCamera {
    fn project(&self, p_world: Vec3) -> Option<(f32, f32, f32)> {
        let p_cam = self.view.transform_point3(p_world);
        if p_cam.z <= 0.0 {
            return None;
        }
        let x = self.fx * (p_cam.x / p_cam.z) + self.cx;
        let y = self.fy * (p_cam.y / p_cam.z) + self.cy;
        Some((x, y, p_cam.z))
    }

    fn is_point_in_frustum_approx(&self, p_world: Vec3) -> bool {
        match self.project(p_world) {
            Some((x, y, z)) => {
                z >= self.z_near
                    && z <= self.z_far
                    && x >= 0.0
                    && x < self.width as f32
                    && y >= 0.0
                    && y < self.height as f32
            }
            None => false,
        }
    }

    fn inverse_pose(&self) -> Mat4 {
        self.view.inverse()
    }

    fn pixel_to_world(&self, x: u32, y: u32, depth: f32) -> Vec3 {
        let cam_x = (x as f32 - self.cx) * depth / self.fx;
        let cam_y = (y as f32 - self.cy) * depth / self.fy;
        let p_cam = Vec3::new(cam_x, cam_y, depth);
        self.inverse_pose().transform_point3(p_cam)
    }

    fn view_direction_world(&self) -> Vec3 {
        self.inverse_pose().transform_vector3(Vec3::Z).normalize()
    }
}

/// A camera whose frustum membership is decided by an arbitrary predicate
/// over the world-space point, for tests that need precise control over
/// which blocks are "visible" without modeling real projection.
pub struct PredicateCamera<F: Fn(Vec3) -> bool + Send + Sync> {
    predicate: F,
}

impl<F: Fn(Vec3) -> bool + Send + Sync> PredicateCamera<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F: Fn(Vec3) -> bool + Send + Sync> CameraModel for PredicateCamera<F> {
    fn project(&self, p_world: Vec3) -> Option<(f32, f32, f32)> {
        Some((0.0, 0.0, p_world.z.max(0.01)))
    }

    fn is_point_in_frustum_approx(&self, p_world: Vec3) -> bool {
        (self.predicate)(p_world)
    }

    fn inverse_pose(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    fn pixel_to_world(&self, _x: u32, _y: u32, depth: f32) -> Vec3 {
        Vec3::new(0.0, 0.0, depth)
    }

    fn view_direction_world(&self) -> Vec3 {
        Vec3::Z
    }
}
