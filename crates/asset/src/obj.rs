//! OBJ parser: positions, normals and texture coordinates, with the uniform
//! scale and winding-reversal knobs the viewer's loader contract asks for.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow};

use crate::mesh::{MeshData, MeshVertex, compute_tangent_frames};

/// Load an OBJ mesh from a file path. Positions are multiplied by `scale`;
/// `reverse` flips each triangle's winding and negates normals.
pub fn load_obj_from_path(path: impl AsRef<Path>, scale: f32, reverse: bool) -> Result<MeshData> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.as_ref().display()))?;
    load_obj_from_reader(BufReader::new(file), scale, reverse)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R, scale: f32, reverse: bool) -> Result<MeshData> {
    let mut acc = ObjAccumulator::new(scale);
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        acc.consume_line(line.trim(), line_no)?;
    }
    acc.finish(reverse)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, scale: f32, reverse: bool) -> Result<MeshData> {
    load_obj_from_reader(io::Cursor::new(contents), scale, reverse)
}

/// Position/uv/normal index triplet identifying a unique output vertex.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct VertexKey(usize, Option<usize>, Option<usize>);

struct ObjAccumulator {
    scale: f32,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    unique: HashMap<VertexKey, u32>,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl ObjAccumulator {
    fn new(scale: f32) -> Self {
        Self {
            scale,
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            unique: HashMap::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn consume_line(&mut self, line: &str, line_no: usize) -> Result<()> {
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let mut parts = line.split_whitespace();
        let tag = parts
            .next()
            .ok_or_else(|| anyhow!("Malformed OBJ line {}: '{}'", line_no + 1, line))?;

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                self.positions
                    .push([x * self.scale, y * self.scale, z * self.scale]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                self.texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                self.normals.push([nx, ny, nz]);
            }
            "f" => self.consume_face(parts, line_no)?,
            _ => {
                // Ignore other directives (o/g/s/mtllib/usemtl/etc.)
            }
        }
        Ok(())
    }

    fn consume_face<'a>(
        &mut self,
        tokens: impl Iterator<Item = &'a str>,
        line_no: usize,
    ) -> Result<()> {
        let mut face_indices: Vec<u32> = Vec::new();
        for token in tokens {
            face_indices.push(self.resolve_vertex(token, line_no)?);
        }

        if face_indices.len() < 3 {
            return Ok(());
        }
        // Triangulate fan
        for tri in 1..(face_indices.len() - 1) {
            self.indices.push(face_indices[0]);
            self.indices.push(face_indices[tri]);
            self.indices.push(face_indices[tri + 1]);
        }
        Ok(())
    }

    /// Dedup an `f` element to an output vertex index, materializing the
    /// vertex on first sight.
    fn resolve_vertex(&mut self, token: &str, line_no: usize) -> Result<u32> {
        let mut split = token.split('/');
        let pos = split
            .next()
            .ok_or_else(|| anyhow!("Malformed face element '{}' on line {}", token, line_no + 1))?;
        let pos_idx = resolve_index(pos, self.positions.len(), line_no)?;

        let tex_idx = match split.next() {
            Some(value) if !value.is_empty() => {
                Some(resolve_index(value, self.texcoords.len(), line_no)?)
            }
            _ => None,
        };
        let norm_idx = match split.next() {
            Some(value) if !value.is_empty() => {
                Some(resolve_index(value, self.normals.len(), line_no)?)
            }
            _ => None,
        };

        let key = VertexKey(pos_idx, tex_idx, norm_idx);
        if let Some(&idx) = self.unique.get(&key) {
            return Ok(idx);
        }

        let position = self.positions.get(pos_idx).copied().ok_or_else(|| {
            anyhow!("Position index out of bounds on line {}", line_no + 1)
        })?;
        let uv = tex_idx
            .and_then(|i| self.texcoords.get(i).copied())
            .unwrap_or([0.0, 0.0]);
        let normal = norm_idx
            .and_then(|i| self.normals.get(i).copied())
            .unwrap_or([0.0, 0.0, 1.0]);

        let idx = u32::try_from(self.vertices.len())
            .map_err(|_| anyhow!("Too many vertices in OBJ (>{})", u32::MAX))?;
        self.vertices.push(MeshVertex::new(position, normal, uv));
        self.unique.insert(key, idx);
        Ok(idx)
    }

    fn finish(mut self, reverse: bool) -> Result<MeshData> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            anyhow::bail!("OBJ contained no triangles");
        }

        if reverse {
            for tri in self.indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
            for v in &mut self.vertices {
                v.normal = [-v.normal[0], -v.normal[1], -v.normal[2]];
            }
        }

        compute_tangent_frames(&mut self.vertices, &self.indices);
        Ok(MeshData::from_vertices(&self.vertices, self.indices))
    }
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    let token = value.ok_or_else(|| anyhow!("Missing {} on line {}", what, line_no + 1))?;
    token
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} on line {}", what, line_no + 1))
}

/// Resolve a 1-based (or negative, relative) OBJ index against `len`.
fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw = token
        .parse::<i32>()
        .with_context(|| format!("Invalid index '{}' on line {}", token, line_no + 1))?;
    if raw == 0 {
        anyhow::bail!("OBJ indices are 1-based; found 0 on line {}", line_no + 1);
    }

    let idx = if raw > 0 {
        (raw - 1) as isize
    } else {
        (len as isize) + (raw as isize)
    };

    if idx < 0 || idx as usize >= len {
        anyhow::bail!(
            "OBJ index {} resolved out of bounds (len={}) on line {}",
            raw,
            len,
            line_no + 1
        );
    }

    Ok(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"
        v 0.0 0.0 0.0
        v 1.0 0.0 0.0
        v 0.0 1.0 0.0
        vn 0.0 0.0 1.0
        vt 0.0 0.0
        vt 1.0 0.0
        vt 0.0 1.0
        f 1/1/1 2/2/1 3/3/1
    "#;

    #[test]
    fn parse_simple_triangle() {
        let mesh = load_obj_from_str(TRIANGLE, 1.0, false).expect("parse triangle");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert!(mesh.is_valid());
    }

    #[test]
    fn scale_multiplies_positions() {
        let mesh = load_obj_from_str(TRIANGLE, 100.0, false).expect("parse triangle");
        assert_eq!(mesh.positions[1], [100.0, 0.0, 0.0]);
        assert_eq!(mesh.positions[2], [0.0, 100.0, 0.0]);
        // Texture coordinates are untouched by scale.
        assert_eq!(mesh.texcoords[1], [1.0, 0.0]);
    }

    #[test]
    fn reverse_flips_winding_and_negates_normals() {
        let mesh = load_obj_from_str(TRIANGLE, 1.0, true).expect("parse triangle");
        assert_eq!(mesh.indices, vec![0, 2, 1]);
        assert_eq!(mesh.normals[0], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn quad_triangulates_as_fan() {
        let src = r#"
            v 0 0 0
            v 1 0 0
            v 1 1 0
            v 0 1 0
            f 1 2 3 4
        "#;
        let mesh = load_obj_from_str(src, 1.0, false).expect("parse quad");
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn negative_indices_resolve_relative_to_end() {
        let src = r#"
            v 0 0 0
            v 1 0 0
            v 0 1 0
            f -3 -2 -1
        "#;
        let mesh = load_obj_from_str(src, 1.0, false).expect("parse triangle");
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn shared_corners_are_deduplicated() {
        let src = r#"
            v 0 0 0
            v 1 0 0
            v 1 1 0
            v 0 1 0
            f 1 2 3
            f 1 3 4
        "#;
        let mesh = load_obj_from_str(src, 1.0, false).expect("parse quad");
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn malformed_vertex_line_is_an_error() {
        let src = "v 0.0 banana 0.0\n";
        assert!(load_obj_from_str(src, 1.0, false).is_err());
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let src = "v 0 0 0\nf 1 2 3\n";
        assert!(load_obj_from_str(src, 1.0, false).is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(load_obj_from_str("# nothing here\n", 1.0, false).is_err());
    }

    #[test]
    fn tangent_frames_are_populated() {
        let mesh = load_obj_from_str(TRIANGLE, 1.0, false).expect("parse triangle");
        for t in &mesh.tangents {
            let len = (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
        assert_eq!(mesh.tangents.len(), mesh.vertex_count());
        assert_eq!(mesh.bitangents.len(), mesh.vertex_count());
    }
}
