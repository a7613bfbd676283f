use std::time::Duration;

use crate::{Mat3, Mat4};

/// Rotation-animation state for the spinning model.
///
/// The caller measures wall-clock time between frames and feeds the elapsed
/// duration to [`Spin::step`], so rotation speed is independent of frame
/// rate.
#[derive(Clone, Copy, Debug)]
pub struct Spin {
    /// Current angle in degrees, always kept in `[0, 360)`.
    pub angle_deg: f32,
    /// Rotation rate in degrees per second.
    pub rate_deg_per_sec: f32,
}

impl Spin {
    pub const DEFAULT_RATE_DEG_PER_SEC: f32 = 5.0;

    pub fn new(rate_deg_per_sec: f32) -> Self {
        Self {
            angle_deg: 0.0,
            rate_deg_per_sec,
        }
    }

    /// Advance by elapsed wall-clock time; returns the new angle.
    pub fn step(&mut self, elapsed: Duration) -> f32 {
        self.angle_deg = (self.angle_deg + self.rate_deg_per_sec * elapsed.as_secs_f32())
            .rem_euclid(360.0);
        self.angle_deg
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RATE_DEG_PER_SEC)
    }
}

/// Model matrix for the current angle: rotateX * rotateY * rotateZ.
#[inline]
pub fn model_matrix(angle_deg: f32) -> Mat4 {
    let a = angle_deg.to_radians();
    Mat4::from_rotation_x(a) * Mat4::from_rotation_y(a) * Mat4::from_rotation_z(a)
}

/// Upper-left 3x3 block of a model-view matrix, used to carry normals,
/// tangents and bitangents into view space. This is the raw block, not the
/// inverse-transpose normal matrix; it is only valid under uniform scale.
#[inline]
pub fn rotation_block(mv: Mat4) -> Mat3 {
    Mat3::from_mat4(mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_at_five_degrees() {
        let mut spin = Spin::new(5.0);
        let angle = spin.step(Duration::from_millis(1000));
        assert_eq!(angle, 5.0);
    }

    #[test]
    fn angle_wraps_into_range() {
        let mut spin = Spin::new(5.0);
        spin.angle_deg = 358.0;
        let angle = spin.step(Duration::from_secs(1));
        assert_eq!(angle, 3.0);
    }

    #[test]
    fn angle_stays_in_range_for_huge_elapsed() {
        let mut spin = Spin::new(5.0);
        for _ in 0..10 {
            let angle = spin.step(Duration::from_secs(123_456));
            assert!((0.0..360.0).contains(&angle), "angle {angle} out of range");
            // Reducing again must be a no-op once in range.
            assert_eq!(angle.rem_euclid(360.0), angle);
        }
    }

    #[test]
    fn zero_elapsed_keeps_angle() {
        let mut spin = Spin::default();
        spin.angle_deg = 42.0;
        assert_eq!(spin.step(Duration::ZERO), 42.0);
    }

    #[test]
    fn model_matrix_at_zero_is_identity() {
        assert_eq!(model_matrix(0.0), Mat4::IDENTITY);
    }

    #[test]
    fn model_matrix_composes_x_then_y_then_z() {
        let a = 30f32.to_radians();
        let expected =
            Mat4::from_rotation_x(a) * Mat4::from_rotation_y(a) * Mat4::from_rotation_z(a);
        assert_eq!(model_matrix(30.0), expected);
    }

    #[test]
    fn rotation_block_is_top_left_submatrix() {
        let m = model_matrix(77.0);
        let block = rotation_block(m);
        let cols = m.to_cols_array_2d();
        for c in 0..3 {
            assert_eq!(block.col(c).x, cols[c][0]);
            assert_eq!(block.col(c).y, cols[c][1]);
            assert_eq!(block.col(c).z, cols[c][2]);
        }
    }
}
