//! Core scene types: math re-exports, camera, spin animation, lighting,
//! shading-mode selector.

pub use glam::{Mat3, Mat4, Vec3, Vec4, vec3};

pub mod camera;
pub mod light;
pub mod shade;
pub mod spin;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::new_perspective(
            vec3(0.0, 400.0, 200.0),
            vec3(0.0, 0.0, 0.0),
            Vec3::Y,
            30f32.to_radians(),
            1.0,
            5000.0,
            4.0 / 3.0,
        );
        let pv = cam.proj() * cam.view();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn rotation_block_matches_model_view() {
        let cam = camera::Camera::new_perspective(
            vec3(0.0, 400.0, 200.0),
            vec3(0.0, 0.0, 0.0),
            Vec3::Y,
            30f32.to_radians(),
            1.0,
            5000.0,
            1.0,
        );
        for angle in [0.0f32, 17.5, 90.0, 271.25] {
            let mv = cam.view() * spin::model_matrix(angle);
            let block = spin::rotation_block(mv);
            let cols = mv.to_cols_array_2d();
            for c in 0..3 {
                let col = block.col(c);
                assert_eq!(col.x, cols[c][0]);
                assert_eq!(col.y, cols[c][1]);
                assert_eq!(col.z, cols[c][2]);
            }
        }
    }
}
