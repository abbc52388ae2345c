//! 3DS (Autodesk 3D Studio) format support
//!
//! A 3DS file is a tree of chunks, each a little-endian `u16` id followed by a
//! `u32` length that includes the 6-byte header. Only the editor section is
//! read: materials (name, diffuse colour, transparency) and triangle objects
//! (vertices, faces and per-material face groups). Keyframer data, lights and
//! cameras are skipped.

use crate::error::{ImportError, Result};
use crate::registry::NodeReader;
use byteorder::{LittleEndian, ReadBytesExt};
use meshview_core::{Material, MeshNode, Point3f, SceneNode, TriangleMesh};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

const FORMAT: &str = "3DS";
const CHUNK_HEADER_LEN: u64 = 6;

mod chunk {
    pub const MAIN: u16 = 0x4D4D;
    pub const EDITOR: u16 = 0x3D3D;
    pub const OBJECT: u16 = 0x4000;
    pub const TRI_MESH: u16 = 0x4100;
    pub const VERTICES: u16 = 0x4110;
    pub const FACES: u16 = 0x4120;
    pub const FACE_MATERIAL: u16 = 0x4130;
    pub const MATERIAL: u16 = 0xAFFF;
    pub const MATERIAL_NAME: u16 = 0xA000;
    pub const DIFFUSE: u16 = 0xA020;
    pub const TRANSPARENCY: u16 = 0xA050;
    pub const COLOR_F: u16 = 0x0010;
    pub const COLOR_24: u16 = 0x0011;
    pub const LIN_COLOR_24: u16 = 0x0012;
    pub const LIN_COLOR_F: u16 = 0x0013;
    pub const PERCENT_I: u16 = 0x0030;
    pub const PERCENT_F: u16 = 0x0031;
}

pub struct TdsReader;

impl NodeReader for TdsReader {
    fn read_nodes(&self, path: &Path) -> Result<Vec<SceneNode>> {
        let data = std::fs::read(path)?;
        parse_3ds(&data)
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }
}

/// One triangle object before materials are resolved
#[derive(Debug, Default)]
struct TriObject {
    name: String,
    vertices: Vec<Point3f>,
    faces: Vec<[usize; 3]>,
    /// material name -> face indices
    face_groups: Vec<(String, Vec<usize>)>,
}

#[derive(Debug, Default)]
struct Scene {
    materials: HashMap<String, Material>,
    objects: Vec<TriObject>,
}

/// Parse an in-memory 3DS file into one mesh node per object and material
pub fn parse_3ds(data: &[u8]) -> Result<Vec<SceneNode>> {
    let mut cursor = Cursor::new(data);
    let (id, end) = read_header(&mut cursor, data.len() as u64)?;
    if id != chunk::MAIN {
        return Err(ImportError::parse(FORMAT, format!("not a 3DS file (main chunk id {:#06x})", id)));
    }

    let mut scene = Scene::default();
    walk(&mut cursor, end, |cursor, id, end| match id {
        chunk::EDITOR => read_editor(cursor, end, &mut scene),
        _ => Ok(()),
    })?;

    build_nodes(scene)
}

/// Read a chunk header and return its id and absolute end offset
fn read_header(cursor: &mut Cursor<&[u8]>, limit: u64) -> Result<(u16, u64)> {
    let start = cursor.position();
    let id = cursor.read_u16::<LittleEndian>()?;
    let len = cursor.read_u32::<LittleEndian>()? as u64;
    let end = start + len;
    if len < CHUNK_HEADER_LEN || end > limit {
        return Err(ImportError::parse(
            FORMAT,
            format!("chunk {:#06x} at offset {} has invalid length {}", id, start, len),
        ));
    }
    Ok((id, end))
}

/// Visit each child chunk until `end`, then leave the cursor at `end`
fn walk<'a, F>(cursor: &mut Cursor<&'a [u8]>, end: u64, mut visit: F) -> Result<()>
where
    F: FnMut(&mut Cursor<&'a [u8]>, u16, u64) -> Result<()>,
{
    while cursor.position() + CHUNK_HEADER_LEN <= end {
        let (id, child_end) = read_header(cursor, end)?;
        visit(cursor, id, child_end)?;
        cursor.set_position(child_end);
    }
    cursor.set_position(end);
    Ok(())
}

fn read_editor(cursor: &mut Cursor<&[u8]>, end: u64, scene: &mut Scene) -> Result<()> {
    walk(cursor, end, |cursor, id, end| match id {
        chunk::MATERIAL => {
            let material = read_material(cursor, end)?;
            if let Some(name) = material.name.clone() {
                scene.materials.insert(name, material);
            }
            Ok(())
        }
        chunk::OBJECT => {
            let name = read_cstr(cursor, end)?;
            walk(cursor, end, |cursor, id, end| match id {
                chunk::TRI_MESH => {
                    let mut object = read_tri_mesh(cursor, end)?;
                    object.name = name.clone();
                    scene.objects.push(object);
                    Ok(())
                }
                _ => Ok(()),
            })
        }
        _ => Ok(()),
    })
}

fn read_material(cursor: &mut Cursor<&[u8]>, end: u64) -> Result<Material> {
    let mut material = Material::gray();
    walk(cursor, end, |cursor, id, end| {
        match id {
            chunk::MATERIAL_NAME => material.name = Some(read_cstr(cursor, end)?),
            chunk::DIFFUSE => {
                if let Some(color) = read_color(cursor, end)? {
                    material.diffuse = color;
                }
            }
            chunk::TRANSPARENCY => {
                if let Some(transparency) = read_percentage(cursor, end)? {
                    material.opacity = (1.0 - transparency).clamp(0.0, 1.0);
                }
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(material)
}

fn read_color(cursor: &mut Cursor<&[u8]>, end: u64) -> Result<Option<[f32; 3]>> {
    let mut color = None;
    walk(cursor, end, |cursor, id, _| {
        match id {
            // the gamma-corrected variants win when both are present
            chunk::COLOR_F | chunk::LIN_COLOR_F if color.is_none() || id == chunk::COLOR_F => {
                color = Some([
                    cursor.read_f32::<LittleEndian>()?,
                    cursor.read_f32::<LittleEndian>()?,
                    cursor.read_f32::<LittleEndian>()?,
                ]);
            }
            chunk::COLOR_24 | chunk::LIN_COLOR_24 if color.is_none() || id == chunk::COLOR_24 => {
                let mut rgb = [0u8; 3];
                cursor.read_exact(&mut rgb)?;
                color = Some(rgb.map(|c| c as f32 / 255.0));
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(color)
}

fn read_percentage(cursor: &mut Cursor<&[u8]>, end: u64) -> Result<Option<f32>> {
    let mut value = None;
    walk(cursor, end, |cursor, id, _| {
        match id {
            chunk::PERCENT_I => value = Some(cursor.read_u16::<LittleEndian>()? as f32 / 100.0),
            chunk::PERCENT_F => value = Some(cursor.read_f32::<LittleEndian>()? / 100.0),
            _ => {}
        }
        Ok(())
    })?;
    Ok(value)
}

fn read_tri_mesh(cursor: &mut Cursor<&[u8]>, end: u64) -> Result<TriObject> {
    let mut object = TriObject::default();
    walk(cursor, end, |cursor, id, end| match id {
        chunk::VERTICES => {
            let count = cursor.read_u16::<LittleEndian>()? as usize;
            object.vertices.try_reserve_exact(count)?;
            for _ in 0..count {
                object.vertices.push(Point3f::new(
                    cursor.read_f32::<LittleEndian>()?,
                    cursor.read_f32::<LittleEndian>()?,
                    cursor.read_f32::<LittleEndian>()?,
                ));
            }
            Ok(())
        }
        chunk::FACES => {
            let count = cursor.read_u16::<LittleEndian>()? as usize;
            object.faces.try_reserve_exact(count)?;
            for _ in 0..count {
                let a = cursor.read_u16::<LittleEndian>()? as usize;
                let b = cursor.read_u16::<LittleEndian>()? as usize;
                let c = cursor.read_u16::<LittleEndian>()? as usize;
                // edge visibility flags
                cursor.read_u16::<LittleEndian>()?;
                object.faces.push([a, b, c]);
            }
            // material groups follow the face list inside the same chunk
            walk(cursor, end, |cursor, id, end| {
                if id == chunk::FACE_MATERIAL {
                    let name = read_cstr(cursor, end)?;
                    let count = cursor.read_u16::<LittleEndian>()? as usize;
                    let mut faces = Vec::new();
                    faces.try_reserve_exact(count)?;
                    for _ in 0..count {
                        faces.push(cursor.read_u16::<LittleEndian>()? as usize);
                    }
                    object.face_groups.push((name, faces));
                }
                Ok(())
            })
        }
        _ => Ok(()),
    })?;

    let vertex_count = object.vertices.len();
    if let Some(face) = object.faces.iter().find(|f| f.iter().any(|&i| i >= vertex_count)) {
        return Err(ImportError::parse(
            FORMAT,
            format!("face {:?} references a vertex beyond {}", face, vertex_count),
        ));
    }
    Ok(object)
}

/// Null-terminated string, bounded by the chunk end
fn read_cstr(cursor: &mut Cursor<&[u8]>, end: u64) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        if cursor.position() >= end {
            return Err(ImportError::parse(FORMAT, "unterminated string"));
        }
        match cursor.read_u8()? {
            0 => break,
            b => bytes.push(b),
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn build_nodes(scene: Scene) -> Result<Vec<SceneNode>> {
    let mut nodes = Vec::new();
    for object in scene.objects {
        let mut assigned = vec![false; object.faces.len()];
        for (material_name, face_indices) in &object.face_groups {
            let faces: Vec<[usize; 3]> = face_indices
                .iter()
                .filter_map(|&i| {
                    let face = object.faces.get(i)?;
                    assigned[i] = true;
                    Some(*face)
                })
                .collect();
            if faces.is_empty() {
                continue;
            }
            let material = scene
                .materials
                .get(material_name)
                .cloned()
                .unwrap_or_else(Material::gray);
            let mesh = TriangleMesh::from_vertices_and_faces(object.vertices.clone(), faces);
            nodes.push(SceneNode::Mesh(MeshNode::named(
                format!("{}:{}", object.name, material_name),
                mesh,
                material,
            )));
        }

        let loose: Vec<[usize; 3]> = object
            .faces
            .iter()
            .zip(&assigned)
            .filter(|(_, &done)| !done)
            .map(|(face, _)| *face)
            .collect();
        if !loose.is_empty() {
            let mesh = TriangleMesh::from_vertices_and_faces(object.vertices, loose);
            nodes.push(SceneNode::Mesh(MeshNode::named(object.name, mesh, Material::gray())));
        }
    }
    Ok(nodes)
}
