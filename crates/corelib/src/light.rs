use crate::{Vec3, Vec4};

/// Phong lighting parameters. Set once at startup, never mutated.
#[derive(Clone, Copy, Debug)]
pub struct PhongLight {
    /// World-space light position (`w` = 1.0, point light).
    pub position: Vec4,
    pub color: Vec3,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl Default for PhongLight {
    fn default() -> Self {
        Self {
            position: Vec4::new(0.0, 500.0, 0.0, 1.0),
            color: Vec3::ONE,
            ambient: 0.2,
            diffuse: 0.8,
            specular: 1.0,
            shininess: 30.0,
        }
    }
}
