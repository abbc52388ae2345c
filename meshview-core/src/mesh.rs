//! Mesh data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Create a mesh from a triangle soup, three consecutive vertices per face
    pub fn from_triangle_soup(vertices: Vec<Point3f>) -> Self {
        let faces = (0..vertices.len() / 3)
            .map(|i| [i * 3, i * 3 + 1, i * 3 + 2])
            .collect();
        Self::from_vertices_and_faces(vertices, faces)
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Calculate face normals.
    ///
    /// Degenerate faces and faces referencing missing vertices get a zero normal.
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let (Some(v0), Some(v1), Some(v2)) = (
                    self.vertices.get(face[0]),
                    self.vertices.get(face[1]),
                    self.vertices.get(face[2]),
                ) else {
                    return Vector3f::zeros();
                };

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1.cross(&edge2).try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros)
            })
            .collect()
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_soup_faces() {
        let mesh = TriangleMesh::from_triangle_soup(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(1.0, 0.0, 1.0),
            Point3f::new(0.0, 1.0, 1.0),
        ]);

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.faces[1], [3, 4, 5]);
    }

    #[test]
    fn test_face_normals() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 0, 0], [0, 1, 7]],
        );

        let normals = mesh.calculate_face_normals();
        assert_eq!(normals[0], Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(normals[1], Vector3f::zeros());
        assert_eq!(normals[2], Vector3f::zeros());
    }
}
