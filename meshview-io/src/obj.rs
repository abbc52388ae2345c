//! OBJ format support
//!
//! Decoding is delegated to the `obj` crate. Each object group becomes one
//! mesh node; polygons are fan-triangulated and the group's MTL diffuse colour
//! and dissolve become its material.

use crate::error::{ImportError, Result};
use crate::registry::NodeReader;
use log::{debug, warn};
use meshview_core::{Material, MeshNode, Point3f, SceneNode, TriangleMesh};
use obj::{Obj, ObjData, ObjError, ObjMaterial};
use std::collections::HashMap;
use std::path::Path;

const FORMAT: &str = "OBJ";

pub struct ObjReader;

impl NodeReader for ObjReader {
    fn read_nodes(&self, path: &Path) -> Result<Vec<SceneNode>> {
        let mut obj = Obj::load(path).map_err(|e| match e {
            ObjError::Io(io) => ImportError::from(io),
            other => ImportError::parse(FORMAT, other.to_string()),
        })?;

        // A broken or missing MTL library still leaves usable geometry
        if let Err(e) = obj.load_mtls() {
            warn!("Could not load materials for {}: {}", path.display(), e);
        }

        nodes_from_data(&obj.data)
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }
}

fn nodes_from_data(data: &ObjData) -> Result<Vec<SceneNode>> {
    let mut nodes = Vec::new();
    for object in &data.objects {
        for group in &object.groups {
            let mut vertices: Vec<Point3f> = Vec::new();
            let mut faces: Vec<[usize; 3]> = Vec::new();
            let mut remap: HashMap<usize, usize> = HashMap::new();

            for polygon in &group.polys {
                let mut corners = Vec::with_capacity(polygon.0.len());
                for tuple in &polygon.0 {
                    let position = *data.position.get(tuple.0).ok_or_else(|| {
                        ImportError::parse(FORMAT, format!("vertex index {} out of range", tuple.0 + 1))
                    })?;
                    let local = *remap.entry(tuple.0).or_insert_with(|| {
                        vertices.push(Point3f::from(position));
                        vertices.len() - 1
                    });
                    corners.push(local);
                }
                if corners.len() < 3 {
                    continue;
                }
                faces.try_reserve(corners.len() - 2)?;
                for i in 1..corners.len() - 1 {
                    faces.push([corners[0], corners[i], corners[i + 1]]);
                }
            }

            if faces.is_empty() {
                continue;
            }
            let material = group.material.as_ref().map(material_of).unwrap_or_else(Material::gray);
            let name = if group.name.is_empty() || group.name == "default" {
                object.name.clone()
            } else {
                format!("{}:{}", object.name, group.name)
            };
            debug!("OBJ group {} has {} triangles", name, faces.len());
            let mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
            nodes.push(SceneNode::Mesh(MeshNode::named(name, mesh, material)));
        }
    }
    Ok(nodes)
}

fn material_of(material: &ObjMaterial) -> Material {
    match material {
        ObjMaterial::Mtl(mtl) => Material::new(
            mtl.name.clone(),
            mtl.kd.unwrap_or(Material::DEFAULT_GRAY),
            mtl.d.unwrap_or(1.0).clamp(0.0, 1.0),
        ),
        // unresolved reference, the library did not load
        ObjMaterial::Ref(name) => Material {
            name: Some(name.clone()),
            ..Material::gray()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CUBE_FACE: &str = "mtllib part.mtl
o Panel
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 5 5 5
g back
f 1 3 2
g front
usemtl Red
f 1 2 3 4
";

    const MTL: &str = "newmtl Red
Kd 1.0 0.0 0.0
d 0.5
";

    #[test]
    fn test_groups_with_materials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("part.obj"), CUBE_FACE).unwrap();
        fs::write(dir.path().join("part.mtl"), MTL).unwrap();

        let nodes = ObjReader.read_nodes(&dir.path().join("part.obj")).unwrap();
        let meshes: Vec<_> = nodes.iter().flat_map(|n| n.mesh_nodes()).collect();

        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].material.diffuse, Material::DEFAULT_GRAY);
        assert_eq!(meshes[1].name.as_deref(), Some("Panel:front"));
        // quad fan-triangulated, unused vertex dropped
        assert_eq!(meshes[1].mesh.face_count(), 2);
        assert_eq!(meshes[1].mesh.vertex_count(), 4);
        assert_eq!(meshes[1].material.diffuse, [1.0, 0.0, 0.0]);
        assert!(!meshes[1].material.is_opaque());
    }

    #[test]
    fn test_missing_mtl_keeps_geometry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("part.obj"), CUBE_FACE).unwrap();

        let nodes = ObjReader.read_nodes(&dir.path().join("part.obj")).unwrap();
        let meshes: Vec<_> = nodes.iter().flat_map(|n| n.mesh_nodes()).collect();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[1].mesh.face_count(), 2);
        assert_eq!(meshes[1].material.diffuse, Material::DEFAULT_GRAY);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ObjReader.read_nodes(&dir.path().join("nope.obj")).unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
