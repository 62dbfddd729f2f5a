//! Brute-force heightfield tessellation.
//!
//! One vertex per height sample, two triangles per cell. Geometry is built in
//! the Z-up frame and converted when turned into a Bevy [`Mesh`].

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use terragen::Grid;

use crate::controls::z_up_to_y_up;

/// Vertex data of a tessellated heightfield, Z-up.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightfieldGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl HeightfieldGeometry {
    /// Tessellate `heights` (in `[0, 1]`), scaling them by `vertical_scale`.
    ///
    /// Sample `(col, row)` lands at `(col, rows - 1 - row, h · scale)` with UV
    /// `(col / (w - 1), row / (h - 1))`, so image row 0 is the +Y edge.
    #[must_use]
    pub fn from_heights(heights: &Grid<f32>, vertical_scale: f32) -> Self {
        let width = heights.width();
        let rows = heights.height();
        let at = |col: usize, row: usize| heights.get(col, row).copied().unwrap_or_default() * vertical_scale;
        let u_span = width.saturating_sub(1).max(1) as f32;
        let v_span = rows.saturating_sub(1).max(1) as f32;

        let mut positions = Vec::with_capacity(width * rows);
        let mut normals = Vec::with_capacity(width * rows);
        let mut uvs = Vec::with_capacity(width * rows);

        for row in 0..rows {
            for col in 0..width {
                positions.push(Vec3::new(col as f32, (rows - 1 - row) as f32, at(col, row)));
                uvs.push([col as f32 / u_span, row as f32 / v_span]);

                let left = col.saturating_sub(1);
                let right = (col + 1).min(width - 1);
                let up = row.saturating_sub(1);
                let down = (row + 1).min(rows - 1);
                let dx = (at(right, row) - at(left, row)) / (right - left).max(1) as f32;
                // +Y points towards row 0.
                let dy = (at(col, up) - at(col, down)) / (down - up).max(1) as f32;
                normals.push(Vec3::new(-dx, -dy, 1.0).normalize());
            }
        }

        let cells = width.saturating_sub(1) * rows.saturating_sub(1);
        let mut indices = Vec::with_capacity(cells * 6);
        for row in 0..rows.saturating_sub(1) {
            for col in 0..width.saturating_sub(1) {
                let a = (row * width + col) as u32;
                let b = a + 1;
                let c = a + width as u32;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, d, a, d, b]);
            }
        }

        Self {
            positions,
            normals,
            uvs,
            indices,
        }
    }

    /// Shift every vertex by `offset`.
    #[must_use]
    pub fn offset(mut self, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p += offset;
        }
        self
    }

    /// The same surface turned upside down about the vertical plane through
    /// the origin: x and z are negated.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let flip = |v: &Vec3| Vec3::new(-v.x, v.y, -v.z);
        Self {
            positions: self.positions.iter().map(flip).collect(),
            normals: self.normals.iter().map(flip).collect(),
            uvs: self.uvs.clone(),
            indices: self.indices.clone(),
        }
    }

    /// Bevy mesh in the Y-up frame.
    #[must_use]
    pub fn into_mesh(self) -> Mesh {
        let positions: Vec<[f32; 3]> = self
            .positions
            .into_iter()
            .map(|p| z_up_to_y_up(p).to_array())
            .collect();
        let normals: Vec<[f32; 3]> = self
            .normals
            .into_iter()
            .map(|n| z_up_to_y_up(n).to_array())
            .collect();

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_normal(geometry: &HeightfieldGeometry, first: usize) -> Vec3 {
        let [a, b, c] = [0, 1, 2].map(|k| geometry.positions[geometry.indices[first + k] as usize]);
        (b - a).cross(c - a)
    }

    #[test]
    fn test_counts_and_layout() {
        let heights = Grid::new(3, 2, 0.5_f32);
        let geometry = HeightfieldGeometry::from_heights(&heights, 10.0);
        assert_eq!(geometry.positions.len(), 6);
        assert_eq!(geometry.indices.len(), 2 * 6);
        // Row 0 is the far (+Y) edge.
        assert_eq!(geometry.positions[0], Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(geometry.positions[5], Vec3::new(2.0, 0.0, 5.0));
        assert_eq!(geometry.uvs[5], [1.0, 1.0]);
    }

    #[test]
    fn test_triangles_face_up() {
        let heights = Grid::from_fn(4, 4, |x, y| (x * y) as f32 / 9.0);
        let geometry = HeightfieldGeometry::from_heights(&heights, 1.0);
        for first in (0..geometry.indices.len()).step_by(3) {
            assert!(triangle_normal(&geometry, first).z > 0.0, "triangle {first}");
        }
    }

    #[test]
    fn test_flat_normals_point_up() {
        let geometry = HeightfieldGeometry::from_heights(&Grid::new(3, 3, 0.2_f32), 4.0);
        assert!(geometry.normals.iter().all(|n| (*n - Vec3::Z).length() < 1e-6));
    }

    #[test]
    fn test_ramp_normal_leans_downhill() {
        // Rising towards +X, so the normal leans towards -X.
        let heights = Grid::from_fn(3, 3, |x, _| x as f32);
        let geometry = HeightfieldGeometry::from_heights(&heights, 1.0);
        let n = geometry.normals[4];
        assert!(n.x < 0.0);
        assert!(n.y.abs() < 1e-6);
        assert!((n - Vec3::new(-1.0, 0.0, 1.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_offset_and_mirror() {
        let heights = Grid::new(3, 3, 1.0_f32);
        let geometry = HeightfieldGeometry::from_heights(&heights, 2.0).offset(Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(geometry.positions[0], Vec3::new(-1.0, 1.0, 2.0));

        let lower = geometry.mirrored();
        assert_eq!(lower.positions[0], Vec3::new(1.0, 1.0, -2.0));
        assert_eq!(lower.normals[0], Vec3::NEG_Z);
        // Mirroring is a rotation, so triangles now face down.
        assert!(triangle_normal(&lower, 0).z < 0.0);
    }

    #[test]
    fn test_into_mesh() {
        let geometry = HeightfieldGeometry::from_heights(&Grid::new(4, 3, 0.0_f32), 1.0);
        let mesh = geometry.into_mesh();
        assert_eq!(mesh.count_vertices(), 12);
        assert_eq!(mesh.indices().map(Indices::len), Some(3 * 2 * 6));
    }
}
