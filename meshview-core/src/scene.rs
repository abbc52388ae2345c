//! Scene nodes and displayable content
//!
//! A loaded model is a small tree: mesh leaves carrying their own material,
//! grouped under one root. [`Content`] wraps that tree with the placement the
//! viewer applies to it (a translation and a spin about the Y axis).

use crate::{
    bounds::Aabb,
    material::Material,
    mesh::TriangleMesh,
    point::Vector3f,
    traits::Bounded,
    transform::Transform3D,
};

/// A drawable mesh with its material
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub name: Option<String>,
    pub mesh: TriangleMesh,
    pub material: Material,
}

impl MeshNode {
    pub fn new(mesh: TriangleMesh, material: Material) -> Self {
        Self {
            name: None,
            mesh,
            material,
        }
    }

    pub fn named(name: impl Into<String>, mesh: TriangleMesh, material: Material) -> Self {
        Self {
            name: Some(name.into()),
            mesh,
            material,
        }
    }
}

/// A node in the content tree
#[derive(Debug, Clone)]
pub enum SceneNode {
    Mesh(MeshNode),
    Group(Vec<SceneNode>),
}

impl SceneNode {
    /// Group the given nodes as siblings
    pub fn group(children: impl IntoIterator<Item = SceneNode>) -> Self {
        SceneNode::Group(children.into_iter().collect())
    }

    /// Direct children of a group, empty for a mesh leaf
    pub fn children(&self) -> &[SceneNode] {
        match self {
            SceneNode::Group(children) => children,
            SceneNode::Mesh(_) => &[],
        }
    }

    /// All mesh leaves in depth-first order
    pub fn mesh_nodes(&self) -> Vec<&MeshNode> {
        let mut out = Vec::new();
        self.collect_meshes(&mut out);
        out
    }

    fn collect_meshes<'a>(&'a self, out: &mut Vec<&'a MeshNode>) {
        match self {
            SceneNode::Mesh(node) => out.push(node),
            SceneNode::Group(children) => {
                for child in children {
                    child.collect_meshes(out);
                }
            }
        }
    }

    /// Total triangle count over all leaves
    pub fn face_count(&self) -> usize {
        self.mesh_nodes().iter().map(|n| n.mesh.face_count()).sum()
    }
}

impl Bounded for SceneNode {
    fn bounds(&self) -> Option<Aabb> {
        match self {
            SceneNode::Mesh(node) => node.mesh.bounds(),
            SceneNode::Group(children) => children
                .iter()
                .filter_map(|c| c.bounds())
                .reduce(|a, b| a.union(&b)),
        }
    }
}

/// The model currently shown by the viewer
#[derive(Debug, Clone)]
pub struct Content {
    root: SceneNode,
    bounds: Option<Aabb>,
    translate: Vector3f,
    rotation_y: f32,
}

impl Content {
    pub fn new(root: SceneNode) -> Self {
        let bounds = root.bounds();
        Self {
            root,
            bounds,
            translate: Vector3f::zeros(),
            rotation_y: 0.0,
        }
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn translate(&self) -> Vector3f {
        self.translate
    }

    pub fn set_translate(&mut self, translate: Vector3f) {
        self.translate = translate;
    }

    /// Spin about the Y axis in degrees
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn set_rotation_y(&mut self, degrees: f32) {
        self.rotation_y = degrees;
    }

    /// Local-to-scene transform.
    ///
    /// The spin pivots on the centre of the untransformed bounds, then the
    /// translation is applied.
    pub fn model_transform(&self) -> Transform3D {
        let pivot = self.bounds.map(|b| b.center().coords).unwrap_or_else(Vector3f::zeros);
        Transform3D::translation(self.translate)
            * Transform3D::translation(pivot)
            * Transform3D::rotation_y(self.rotation_y)
            * Transform3D::translation(-pivot)
    }
}

impl Bounded for Content {
    /// Bounds in the content's own space, ignoring its placement
    fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point3f;
    use approx::assert_relative_eq;

    fn unit_triangle(offset: f32) -> TriangleMesh {
        TriangleMesh::from_triangle_soup(vec![
            Point3f::new(offset, 0.0, 0.0),
            Point3f::new(offset + 1.0, 0.0, 0.0),
            Point3f::new(offset, 1.0, 0.0),
        ])
    }

    #[test]
    fn test_group_bounds_and_meshes() {
        let root = SceneNode::group([
            SceneNode::Mesh(MeshNode::new(unit_triangle(0.0), Material::gray())),
            SceneNode::group([SceneNode::Mesh(MeshNode::new(unit_triangle(4.0), Material::gray()))]),
            SceneNode::group([]),
        ]);

        assert_eq!(root.mesh_nodes().len(), 2);
        assert_eq!(root.face_count(), 2);
        let bounds = root.bounds().unwrap();
        assert_eq!(bounds.min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3f::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn test_empty_group_has_no_bounds() {
        assert!(SceneNode::group([]).bounds().is_none());
    }

    #[test]
    fn test_model_transform_spins_about_bounds_center() {
        let mut content = Content::new(SceneNode::Mesh(MeshNode::new(unit_triangle(2.0), Material::gray())));
        let center = content.center().unwrap();
        content.set_translate(-center.coords);
        content.set_rotation_y(180.0);

        let moved = content.model_transform().transform_point(&center);
        assert_relative_eq!(moved, Point3f::origin(), epsilon = 1e-5);
    }
}
