//! Background asset loads: one detached worker per resource, each handing
//! its result to the frame loop through a write-once slot.

use std::path::PathBuf;
use std::thread;

use asset::{mesh::MeshData, obj, texture::TextureData};

use crate::handoff::Handoff;

/// Parse the OBJ file off-thread. A failed parse is logged and leaves the
/// slot empty; the viewer keeps running with nothing to draw.
pub fn spawn_mesh_load(path: PathBuf, scale: f32, reverse: bool, slot: Handoff<MeshData>) {
    thread::spawn(move || match obj::load_obj_from_path(&path, scale, reverse) {
        Ok(mesh) => {
            log::info!(
                "Parsed {}: {} vertices, {} triangles",
                path.display(),
                mesh.vertex_count(),
                mesh.triangle_count()
            );
            slot.publish(mesh);
        }
        Err(err) => log::error!("OBJ load failed for {}: {err:#}", path.display()),
    });
}

/// Decode an image off-thread; same error policy as the mesh load.
pub fn spawn_texture_load(kind: &'static str, path: PathBuf, slot: Handoff<TextureData>) {
    thread::spawn(move || match TextureData::load_from_path(&path) {
        Ok(tex) => slot.publish(tex),
        Err(err) => log::error!("{kind} map load failed for {}: {err:#}", path.display()),
    });
}
