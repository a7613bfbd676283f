//! CPU mirror of the uniform block in `shaders/model.wgsl`.

use bytemuck::{Pod, Zeroable};
use corelib::{light::PhongLight, shade::ShadeMode, spin};
use glam::{Mat3, Mat4, Vec4};

/// Scene uniform block, 224 bytes. Field order and padding mirror the WGSL
/// `SceneUniform` struct exactly: mat3x3 columns carry a 16-byte stride, and
/// the scalars pack into the tail padding after the vec3 light color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    pub mvp: [[f32; 4]; 4],
    pub mv: [[f32; 4]; 4],
    pub mv_rot: [[f32; 4]; 3],
    /// Light position already transformed into view space.
    pub light_pos: [f32; 4],
    pub light_color: [f32; 3],
    pub k_ambient: f32,
    pub k_diffuse: f32,
    pub k_specular: f32,
    pub shininess: f32,
    pub mode: u32,
}

impl SceneUniform {
    /// Assemble the block for one frame. The 3x3 rotation block is always
    /// derived from `mv`, never passed independently.
    pub fn new(
        mvp: Mat4,
        mv: Mat4,
        light_view_pos: Vec4,
        light: &PhongLight,
        mode: ShadeMode,
    ) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            mv: mv.to_cols_array_2d(),
            mv_rot: pad_mat3(spin::rotation_block(mv)),
            light_pos: light_view_pos.to_array(),
            light_color: light.color.to_array(),
            k_ambient: light.ambient,
            k_diffuse: light.diffuse,
            k_specular: light.specular,
            shininess: light.shininess,
            mode: mode.as_uniform(),
        }
    }
}

/// Pad mat3 columns to a vec4 stride, as the uniform address space requires.
fn pad_mat3(m: Mat3) -> [[f32; 4]; 3] {
    let c = m.to_cols_array_2d();
    [
        [c[0][0], c[0][1], c[0][2], 0.0],
        [c[1][0], c[1][1], c[1][2], 0.0],
        [c[2][0], c[2][1], c[2][2], 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;
    use glam::{Vec3, vec3};

    #[test]
    fn layout_matches_wgsl_block() {
        assert_eq!(size_of::<SceneUniform>(), 224);
        assert_eq!(offset_of!(SceneUniform, mvp), 0);
        assert_eq!(offset_of!(SceneUniform, mv), 64);
        assert_eq!(offset_of!(SceneUniform, mv_rot), 128);
        assert_eq!(offset_of!(SceneUniform, light_pos), 176);
        assert_eq!(offset_of!(SceneUniform, light_color), 192);
        assert_eq!(offset_of!(SceneUniform, k_ambient), 204);
        assert_eq!(offset_of!(SceneUniform, shininess), 216);
        assert_eq!(offset_of!(SceneUniform, mode), 220);
    }

    #[test]
    fn rotation_block_is_mv_top_left() {
        let mv = Mat4::look_at_rh(vec3(0.0, 400.0, 200.0), Vec3::ZERO, Vec3::Y)
            * spin::model_matrix(33.0);
        let u = SceneUniform::new(Mat4::IDENTITY, mv, Vec4::W, &PhongLight::default(), ShadeMode::Lit);
        let cols = mv.to_cols_array_2d();
        for c in 0..3 {
            assert_eq!(u.mv_rot[c][0], cols[c][0]);
            assert_eq!(u.mv_rot[c][1], cols[c][1]);
            assert_eq!(u.mv_rot[c][2], cols[c][2]);
            assert_eq!(u.mv_rot[c][3], 0.0);
        }
    }

    #[test]
    fn light_constants_land_in_block() {
        let light = PhongLight::default();
        let u = SceneUniform::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            light.position,
            &light,
            ShadeMode::NormalMapped,
        );
        assert_eq!(u.light_pos, [0.0, 500.0, 0.0, 1.0]);
        assert_eq!(u.light_color, [1.0, 1.0, 1.0]);
        assert_eq!(u.k_ambient, 0.2);
        assert_eq!(u.k_diffuse, 0.8);
        assert_eq!(u.k_specular, 1.0);
        assert_eq!(u.shininess, 30.0);
        assert_eq!(u.mode, 3);
    }
}
