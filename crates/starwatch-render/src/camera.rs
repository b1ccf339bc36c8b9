//! Perspective camera for view and projection matrix generation.

use glam::{Mat4, Quat, Vec3};

use crate::surface::SurfaceSize;

/// Vertical field of view of the starfield camera, in degrees.
pub const STARFIELD_FOV_DEGREES: f32 = 75.0;
/// Near clip plane of the starfield camera.
pub const STARFIELD_NEAR: f32 = 0.1;
/// Far clip plane of the starfield camera.
pub const STARFIELD_FAR: f32 = 1000.0;
/// Distance the starfield camera sits back along +Z.
pub const STARFIELD_DISTANCE: f32 = 5.0;

/// A perspective camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Camera {
    /// The starfield camera: 75° fov, 0.1/1000 clip planes, 5 units back.
    pub fn starfield(size: SurfaceSize) -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, STARFIELD_DISTANCE),
            rotation: Quat::IDENTITY,
            fov_y: STARFIELD_FOV_DEGREES.to_radians(),
            aspect_ratio: 1.0,
            near: STARFIELD_NEAR,
            far: STARFIELD_FAR,
        };
        camera.set_aspect_ratio(size.width as f32, size.height as f32);
        camera
    }

    /// World to camera space.
    pub fn view_matrix(&self) -> Mat4 {
        let rotation_matrix = Mat4::from_quat(self.rotation);
        let translation_matrix = Mat4::from_translation(self.position);
        (translation_matrix * rotation_matrix).inverse()
    }

    /// Right-handed perspective projection with a `[0, 1]` depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    /// Projection times view.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio from viewport dimensions.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::starfield(SurfaceSize::new(16, 9))
    }
}
