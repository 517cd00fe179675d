//! Wavefront OBJ reader.
//!
//! Handles the `v`, `vt`, `vn`, `f`, `o` and `g` statements. Polygons are fan
//! triangulated, and each distinct `v/vt/vn` triple becomes one indexed vertex.
//! Only the first object or group that contains faces is kept. Everything after it
//! is skipped, although its vertex statements still count toward index numbering.

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::{FredError, Result};
use crate::geometry::RawGeometry;
use crate::mesh::Vertex3d;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

/// Resolves a 1-based or negative (relative) OBJ index against `len` entries.
fn resolve_index(raw: &str, len: usize, line_no: usize) -> Result<usize> {
    let idx: i64 = raw
        .parse()
        .map_err(|_| FredError::parse(format!("line {line_no}: bad index '{raw}'")))?;
    let resolved = if idx > 0 { idx - 1 } else { len as i64 + idx };
    if idx == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(FredError::parse(format!(
            "line {line_no}: index {idx} out of range ({len} entries)"
        )));
    }
    Ok(resolved as usize)
}

fn parse_floats<const N: usize>(
    tokens: std::str::SplitWhitespace<'_>,
    line_no: usize,
) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    let mut count = 0;
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token
            .parse()
            .map_err(|_| FredError::parse(format!("line {line_no}: bad number '{token}'")))?;
        count += 1;
    }
    // `vt` may carry an optional third coordinate, so only too few values is an error.
    if count < N {
        return Err(FredError::parse(format!(
            "line {line_no}: expected {N} values, found {count}"
        )));
    }
    Ok(out)
}

/// Parses OBJ text into triangle-list geometry.
///
/// Missing texture coordinates become `(0, 0)`. Corners without a normal get a
/// smooth normal computed from the surrounding faces; supplied normals are kept.
pub fn parse_obj<R: BufRead>(reader: R) -> Result<RawGeometry> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut vertices: Vec<Vertex3d> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut lookup: HashMap<VertexKey, u32> = HashMap::new();

    let mut missing_normals: Vec<bool> = Vec::new();
    let mut first_mesh_done = false;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| FredError::parse(format!("line {line_no}: {e}")))?;
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }

        let mut tokens = s.split_whitespace();
        let tag = tokens.next().unwrap_or("");
        match tag {
            "v" => positions.push(parse_floats::<3>(tokens, line_no)?),
            "vt" => uvs.push(parse_floats::<2>(tokens, line_no)?),
            "vn" => normals.push(parse_floats::<3>(tokens, line_no)?),
            "o" | "g" => {
                if !indices.is_empty() {
                    first_mesh_done = true;
                }
            }
            "f" if !first_mesh_done => {
                let mut polygon: Vec<u32> = Vec::new();
                for corner in tokens {
                    let mut parts = corner.split('/');
                    let position = match parts.next() {
                        Some(p) if !p.is_empty() => resolve_index(p, positions.len(), line_no)?,
                        _ => {
                            return Err(FredError::parse(format!(
                                "line {line_no}: face corner '{corner}' has no position"
                            )));
                        }
                    };
                    let uv = match parts.next() {
                        Some(t) if !t.is_empty() => Some(resolve_index(t, uvs.len(), line_no)?),
                        _ => None,
                    };
                    let normal = match parts.next() {
                        Some(n) if !n.is_empty() => {
                            Some(resolve_index(n, normals.len(), line_no)?)
                        }
                        _ => None,
                    };
                    let key = VertexKey {
                        position,
                        uv,
                        normal,
                    };
                    let index = *lookup.entry(key).or_insert_with(|| {
                        missing_normals.push(normal.is_none());
                        vertices.push(Vertex3d::new(
                            positions[position],
                            normal.map(|n| normals[n]).unwrap_or([0.0; 3]),
                            uv.map(|t| uvs[t]).unwrap_or([0.0; 2]),
                        ));
                        (vertices.len() - 1) as u32
                    });
                    polygon.push(index);
                }

                if polygon.len() < 3 {
                    return Err(FredError::parse(format!(
                        "line {line_no}: face needs at least 3 corners, found {}",
                        polygon.len()
                    )));
                }
                for k in 1..polygon.len() - 1 {
                    indices.extend_from_slice(&[polygon[0], polygon[k], polygon[k + 1]]);
                }
            }
            _ => {}
        }
    }

    if indices.is_empty() {
        return Err(FredError::parse("no faces found"));
    }

    let mut geometry = RawGeometry::new(vertices, indices);
    if missing_normals.contains(&true) {
        geometry.recalculate_normals_where(&missing_normals);
    }
    Ok(geometry)
}
