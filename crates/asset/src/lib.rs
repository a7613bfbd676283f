//! Asset loading/parsers: OBJ meshes with tangent frames, RGBA8 textures.

pub mod mesh;
pub mod obj;
pub mod texture;
