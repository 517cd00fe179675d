//! CPU-side geometry: loading model files and building procedural primitives.
//!
//! [`load_model`] picks a parser from the file extension:
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | OBJ    | `.obj`     | First object only, polygons fan-triangulated |
//! | STL    | `.stl`     | Binary and ASCII, no UV coordinates |
//!
//! The result is a [`RawGeometry`] that can be adjusted (recentred, normalised,
//! re-lit with smooth normals) before [`RawGeometry::upload`] turns it into a
//! GPU [`Model`].

use crate::error::{FredError, Result};
use crate::gpu::GpuContext;
use crate::mesh::{Model, Vertex3d};
use glam::{Quat, Vec3};
use std::f32::consts::{PI, TAU};
use std::path::Path;

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle-list indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Computes the axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    /// Scales all vertices uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) * factor).into();
        }
    }

    /// Rotates all vertices and normals by the given quaternion.
    pub fn rotate(&mut self, rotation: Quat) {
        for v in &mut self.vertices {
            v.position = (rotation * Vec3::from(v.position)).into();
            v.normal = (rotation * Vec3::from(v.normal)).into();
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Scales the geometry so its largest extent is 1.
    pub fn normalize(&mut self) {
        let size = self.size();
        let max_dim = size.x.max(size.y).max(size.z);
        if max_dim > 0.0 {
            self.scale(1.0 / max_dim);
        }
    }

    /// Recomputes smooth vertex normals by summing area-weighted face normals.
    pub fn recalculate_normals(&mut self) {
        let all = vec![true; self.vertices.len()];
        self.recalculate_normals_where(&all);
    }

    /// Like [`Self::recalculate_normals`], but only vertices flagged in `mask`
    /// are rewritten. Unflagged vertices keep their normal.
    pub fn recalculate_normals_where(&mut self, mask: &[bool]) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face_normal = (p1 - p0).cross(p2 - p0);

            for i in [i0, i1, i2] {
                accum[i] += face_normal;
            }
        }

        for ((v, n), &rewrite) in self.vertices.iter_mut().zip(accum).zip(mask) {
            if rewrite {
                v.normal = n.normalize_or_zero().into();
            }
        }
    }

    /// Uploads this geometry to the GPU.
    pub fn upload(&self, gpu: &GpuContext, label: &str) -> Model {
        Model::new(gpu, &self.vertices, &self.indices, label)
    }

    /// Unit cube centred at the origin, one quad per face.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal, u axis, v axis
            ([ 0.0,  0.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
            ([ 0.0,  0.0, -1.0], [-1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
            ([ 0.0,  1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0, -1.0]),
            ([ 0.0, -1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0,  1.0]),
            ([ 1.0,  0.0,  0.0], [ 0.0, 0.0, -1.0], [0.0, 1.0,  0.0]),
            ([-1.0,  0.0,  0.0], [ 0.0, 0.0,  1.0], [0.0, 1.0,  0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in faces {
            let n = Vec3::from(normal);
            let u = Vec3::from(u_axis);
            let v = Vec3::from(v_axis);
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv) * 0.5;
                vertices.push(Vertex3d::new(
                    p.into(),
                    normal,
                    [(su + 1.0) * 0.5, (sv + 1.0) * 0.5],
                ));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// UV sphere of diameter 1 centred at the origin.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = -ring_radius * theta.sin();

                vertices.push(Vertex3d::new(
                    [x * 0.5, y * 0.5, z * 0.5],
                    [x, y, z],
                    [
                        seg as f32 / segments as f32,
                        1.0 - ring as f32 / rings as f32,
                    ],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, next, current + 1]);
                indices.extend_from_slice(&[current + 1, next, next + 1]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Flat square in the XZ plane facing +Y.
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        let up = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex3d::new([-half, 0.0, half], up, [0.0, 0.0]),
            Vertex3d::new([half, 0.0, half], up, [1.0, 0.0]),
            Vertex3d::new([half, 0.0, -half], up, [1.0, 1.0]),
            Vertex3d::new([-half, 0.0, -half], up, [0.0, 1.0]),
        ];

        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }

    /// Cone of height 2 and base radius 1, apex on +Y, base centred at y = -1.
    pub fn cone(segments: u32) -> Self {
        let segments = segments.max(3);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let slope = 0.5f32;

        // Side: one apex vertex per segment so each slice gets its own normal.
        for seg in 0..segments {
            let a0 = TAU * seg as f32 / segments as f32;
            let a1 = TAU * (seg + 1) as f32 / segments as f32;
            let mid = (a0 + a1) * 0.5;
            let rim = |a: f32| Vec3::new(a.cos(), -1.0, -a.sin());
            let normal = |a: f32| Vec3::new(a.cos(), slope, -a.sin()).normalize();

            let base = vertices.len() as u32;
            let u0 = seg as f32 / segments as f32;
            let u1 = (seg + 1) as f32 / segments as f32;
            vertices.push(Vertex3d::new(rim(a0).into(), normal(a0).into(), [u0, 0.0]));
            vertices.push(Vertex3d::new(rim(a1).into(), normal(a1).into(), [u1, 0.0]));
            vertices.push(Vertex3d::new(
                [0.0, 1.0, 0.0],
                normal(mid).into(),
                [(u0 + u1) * 0.5, 1.0],
            ));
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        // Base cap facing -Y.
        let center = vertices.len() as u32;
        let down = [0.0, -1.0, 0.0];
        vertices.push(Vertex3d::new([0.0, -1.0, 0.0], down, [0.5, 0.5]));
        for seg in 0..segments {
            let a = TAU * seg as f32 / segments as f32;
            vertices.push(Vertex3d::new(
                [a.cos(), -1.0, -a.sin()],
                down,
                [0.5 + 0.5 * a.cos(), 0.5 - 0.5 * a.sin()],
            ));
        }
        for seg in 0..segments {
            let a = center + 1 + seg;
            let b = center + 1 + (seg + 1) % segments;
            indices.extend_from_slice(&[center, b, a]);
        }

        Self::new(vertices, indices)
    }
}

/// Loads a model file, choosing the parser from its extension.
pub fn load_model(path: impl AsRef<Path>) -> Result<RawGeometry> {
    let path = path.as_ref();
    log::debug!("Loading model: {}", path.display());

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let geometry = match ext.as_str() {
        "obj" => {
            let file = std::fs::File::open(path).map_err(|e| FredError::io(path, e))?;
            crate::obj::parse_obj(std::io::BufReader::new(file))?
        }
        "stl" => {
            let file = std::fs::File::open(path).map_err(|e| FredError::io(path, e))?;
            parse_stl(&mut std::io::BufReader::new(file))?
        }
        _ => return Err(FredError::UnknownFormat(ext)),
    };

    log::debug!(
        "loaded {}: {} vertices, {} triangles",
        path.display(),
        geometry.vertices.len(),
        geometry.triangle_count()
    );
    Ok(geometry)
}

/// Parses binary or ASCII STL. Every triangle gets its own three vertices.
pub fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<RawGeometry> {
    let stl = stl_io::read_stl(reader)
        .map_err(|e| FredError::parse(format!("STL parse error: {e}")))?;

    let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);

    for face in &stl.faces {
        let positions = face.vertices.map(|i| Vec3::from(<[f32; 3]>::from(stl.vertices[i])));

        // Many exporters write `facet normal 0 0 0`; fall back to the winding.
        let mut normal = Vec3::from(<[f32; 3]>::from(face.normal));
        if normal.length_squared() < 1e-12 {
            normal = (positions[1] - positions[0]).cross(positions[2] - positions[0]);
        }
        let normal: [f32; 3] = normal.normalize_or_zero().into();

        let base = vertices.len() as u32;
        for position in positions {
            vertices.push(Vertex3d::new(position.into(), normal, [0.0, 0.0]));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    Ok(RawGeometry::new(vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every triangle's winding must agree with its vertex normals (CCW front faces).
    fn assert_outward_winding(geom: &RawGeometry) {
        for tri in geom.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(geom.vertices[i as usize].position))
                .collect();
            let face = (p[1] - p[0]).cross(p[2] - p[0]);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let n: Vec3 = tri
                .iter()
                .map(|&i| Vec3::from(geom.vertices[i as usize].normal))
                .sum();
            assert!(face.dot(n) > 0.0, "triangle {tri:?} winds against its normal");
        }
    }

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn recenter_then_normalize() {
        let vertices = vec![
            Vertex3d::new([2.0, 2.0, 2.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([6.0, 4.0, 4.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let mut geom = RawGeometry::new(vertices, vec![0, 1, 0]);

        geom.recenter();
        assert!(geom.center().length() < 1e-5);

        geom.normalize();
        assert!((geom.size().x - 1.0).abs() < 1e-5);
        assert!((geom.size().y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn rotate_moves_normals_too() {
        let mut geom = RawGeometry::new(
            vec![Vertex3d::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0])],
            vec![],
        );
        geom.rotate(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let n = Vec3::from(geom.vertices[0].normal);
        assert!((n - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn primitives_wind_counter_clockwise() {
        assert_outward_winding(&RawGeometry::cube());
        assert_outward_winding(&RawGeometry::sphere(16, 8));
        assert_outward_winding(&RawGeometry::plane(2.0));
        assert_outward_winding(&RawGeometry::cone(12));
    }

    #[test]
    fn cube_has_six_quads() {
        let cube = RawGeometry::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.size(), Vec3::ONE);
    }

    #[test]
    fn cone_spans_two_units() {
        let cone = RawGeometry::cone(8);
        let (min, max) = cone.bounds();
        assert!((min.y + 1.0).abs() < 1e-6);
        assert!((max.y - 1.0).abs() < 1e-6);
        assert_eq!(cone.triangle_count(), 16);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_model("mesh.fbx").unwrap_err();
        assert!(matches!(err, FredError::UnknownFormat(ext) if ext == "fbx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_model("does/not/exist.obj").unwrap_err();
        assert!(matches!(err, FredError::Io { .. }));
    }

    #[test]
    fn ascii_stl_parses() {
        let text = "solid t\n\
            facet normal 0 0 1\n outer loop\n\
            vertex 0 0 0\n vertex 1 0 0\n vertex 0 1 0\n\
            endloop\nendfacet\nendsolid t\n";
        let geom = parse_stl(&mut std::io::Cursor::new(text.as_bytes())).unwrap();
        assert_eq!(geom.triangle_count(), 1);
        assert_eq!(geom.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(geom.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn stl_zero_facet_normal_comes_from_winding() {
        let text = "solid t\n\
            facet normal 0 0 0\n outer loop\n\
            vertex 0 0 0\n vertex 2 0 0\n vertex 0 2 0\n\
            endloop\nendfacet\nendsolid t\n";
        let geom = parse_stl(&mut std::io::Cursor::new(text.as_bytes())).unwrap();
        for v in &geom.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn partial_normal_recompute_keeps_supplied_normals() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 0.0, 0.0], [0.0; 3], [0.0, 0.0]),
            Vertex3d::new([0.0, 1.0, 0.0], [0.0; 3], [0.0, 0.0]),
        ];
        let mut geom = RawGeometry::new(vertices, vec![0, 1, 2]);
        geom.recalculate_normals_where(&[false, true, true]);

        assert_eq!(geom.vertices[0].normal, [1.0, 0.0, 0.0]);
        assert_eq!(geom.vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(geom.vertices[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn bundled_cone_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/models/cone.obj");
        let geom = load_model(path).unwrap();
        assert!(geom.triangle_count() > 0);
        assert_outward_winding(&geom);
    }
}
