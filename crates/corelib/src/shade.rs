/// Shading mode selected by the user. Discriminants match the shader's
/// `mode` uniform.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadeMode {
    /// Base color texture only.
    Texture = 1,
    /// Phong lighting with the interpolated geometric normal.
    Lit = 2,
    /// Phong lighting with the normal map applied through the TBN frame.
    #[default]
    NormalMapped = 3,
}

impl ShadeMode {
    /// Map a UI control identifier to a mode. Unrecognized identifiers
    /// return `None`; callers keep the previous mode.
    pub fn from_control_id(id: &str) -> Option<Self> {
        match id {
            "texture" => Some(Self::Texture),
            "lighting" => Some(Self::Lit),
            "normal" => Some(Self::NormalMapped),
            _ => None,
        }
    }

    #[inline]
    pub fn as_uniform(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_ids_map_to_modes() {
        assert_eq!(ShadeMode::from_control_id("texture"), Some(ShadeMode::Texture));
        assert_eq!(ShadeMode::from_control_id("lighting"), Some(ShadeMode::Lit));
        assert_eq!(
            ShadeMode::from_control_id("normal"),
            Some(ShadeMode::NormalMapped)
        );
    }

    #[test]
    fn unknown_control_id_keeps_previous_mode() {
        let mut mode = ShadeMode::Lit;
        mode = ShadeMode::from_control_id("wireframe").unwrap_or(mode);
        assert_eq!(mode, ShadeMode::Lit);
        mode = ShadeMode::from_control_id("").unwrap_or(mode);
        assert_eq!(mode, ShadeMode::Lit);
    }

    #[test]
    fn uniform_values_are_one_two_three() {
        assert_eq!(ShadeMode::Texture.as_uniform(), 1);
        assert_eq!(ShadeMode::Lit.as_uniform(), 2);
        assert_eq!(ShadeMode::NormalMapped.as_uniform(), 3);
        assert_eq!(ShadeMode::default(), ShadeMode::NormalMapped);
    }
}
