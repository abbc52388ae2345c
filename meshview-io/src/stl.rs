//! STL format support
//!
//! Both encodings are accepted. A file is treated as binary when its size
//! matches the triangle count in the 84-byte header exactly, otherwise it must
//! start with `solid` and is parsed as ASCII.

use crate::error::{ImportError, Result};
use crate::registry::MeshReader;
use byteorder::{LittleEndian, ReadBytesExt};
use meshview_core::{Point3f, TriangleMesh, Vector3f};
use std::io::Cursor;
use std::path::Path;

const FORMAT: &str = "STL";
const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

pub struct StlReader;

impl MeshReader for StlReader {
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh> {
        let data = std::fs::read(path)?;
        parse_stl(&data)
    }

    fn format_name(&self) -> &'static str {
        FORMAT
    }
}

/// Parse an in-memory STL file
pub fn parse_stl(data: &[u8]) -> Result<TriangleMesh> {
    if let Some(count) = binary_triangle_count(data) {
        return parse_binary(data, count);
    }
    if data.trim_ascii_start().starts_with(b"solid") {
        return parse_ascii(data);
    }
    if data.len() >= HEADER_LEN + 4 {
        return Err(ImportError::parse(
            FORMAT,
            format!("binary file size {} does not match its triangle count", data.len()),
        ));
    }
    Err(ImportError::parse(FORMAT, "file too small for an STL header"))
}

/// Triangle count when the size matches a binary STL exactly
fn binary_triangle_count(data: &[u8]) -> Option<usize> {
    let count_bytes = data.get(HEADER_LEN..HEADER_LEN + 4)?;
    let count = u32::from_le_bytes([count_bytes[0], count_bytes[1], count_bytes[2], count_bytes[3]]) as usize;
    let expected = count.checked_mul(TRIANGLE_LEN)?.checked_add(HEADER_LEN + 4)?;
    (expected == data.len()).then_some(count)
}

fn parse_binary(data: &[u8], count: usize) -> Result<TriangleMesh> {
    let mut vertices: Vec<Point3f> = Vec::new();
    let mut normals: Vec<Vector3f> = Vec::new();
    vertices.try_reserve_exact(count * 3)?;
    normals.try_reserve_exact(count * 3)?;

    let mut cursor = Cursor::new(&data[HEADER_LEN + 4..]);
    for _ in 0..count {
        let normal = read_vec3(&mut cursor)?;
        let a = Point3f::from(read_vec3(&mut cursor)?);
        let b = Point3f::from(read_vec3(&mut cursor)?);
        let c = Point3f::from(read_vec3(&mut cursor)?);
        // attribute byte count
        cursor.read_u16::<LittleEndian>()?;

        let normal = facet_normal(normal, &a, &b, &c);
        vertices.extend([a, b, c]);
        normals.extend([normal; 3]);
    }

    let mut mesh = TriangleMesh::from_triangle_soup(vertices);
    mesh.set_normals(normals);
    Ok(mesh)
}

fn read_vec3(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Vector3f> {
    Ok(Vector3f::new(
        cursor.read_f32::<LittleEndian>()?,
        cursor.read_f32::<LittleEndian>()?,
        cursor.read_f32::<LittleEndian>()?,
    ))
}

fn parse_ascii(data: &[u8]) -> Result<TriangleMesh> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ImportError::parse(FORMAT, format!("ASCII file is not valid UTF-8: {}", e)))?;

    let mut vertices: Vec<Point3f> = Vec::new();
    let mut normals: Vec<Vector3f> = Vec::new();
    let mut facet: Vec<Point3f> = Vec::with_capacity(3);
    let mut facet_declared = Vector3f::zeros();

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                facet.clear();
                facet_declared = match tokens.next() {
                    Some("normal") => parse_triplet(&mut tokens, line_no)?,
                    _ => Vector3f::zeros(),
                };
            }
            Some("vertex") => {
                facet.push(Point3f::from(parse_triplet(&mut tokens, line_no)?));
            }
            Some("endfacet") => {
                if facet.len() != 3 {
                    return Err(ImportError::parse(
                        FORMAT,
                        format!("line {}: facet has {} vertices, expected 3", line_no + 1, facet.len()),
                    ));
                }
                let normal = facet_normal(facet_declared, &facet[0], &facet[1], &facet[2]);
                vertices.try_reserve(3)?;
                normals.try_reserve(3)?;
                vertices.extend(facet.drain(..));
                normals.extend([normal; 3]);
            }
            _ => {}
        }
    }

    let mut mesh = TriangleMesh::from_triangle_soup(vertices);
    mesh.set_normals(normals);
    Ok(mesh)
}

fn parse_triplet<'a>(tokens: &mut impl Iterator<Item = &'a str>, line_no: usize) -> Result<Vector3f> {
    let mut values = [0.0f32; 3];
    for value in &mut values {
        let token = tokens.next().ok_or_else(|| {
            ImportError::parse(FORMAT, format!("line {}: expected three numbers", line_no + 1))
        })?;
        *value = token.parse().map_err(|_| {
            ImportError::parse(FORMAT, format!("line {}: invalid number '{}'", line_no + 1, token))
        })?;
    }
    Ok(Vector3f::new(values[0], values[1], values[2]))
}

/// Use the stored normal unless it is missing, otherwise derive it from the winding
fn facet_normal(stored: Vector3f, a: &Point3f, b: &Point3f, c: &Point3f) -> Vector3f {
    if let Some(n) = stored.try_normalize(f32::EPSILON) {
        return n;
    }
    (b - a).cross(&(c - a)).try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    const ASCII_TETRA_FACE: &str = "solid part
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 2 0 0
      vertex 0 2 0
    endloop
  endfacet
  facet normal 0 0 0
    outer loop
      vertex 0 0 1
      vertex 0 1 1
      vertex 1 0 1
    endloop
  endfacet
endsolid part
";

    fn binary_stl(triangles: &[[[f32; 3]; 4]]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.write_u32::<LittleEndian>(triangles.len() as u32).unwrap();
        for tri in triangles {
            for v in tri {
                for c in v {
                    data.write_f32::<LittleEndian>(*c).unwrap();
                }
            }
            data.write_u16::<LittleEndian>(0).unwrap();
        }
        data
    }

    #[test]
    fn test_ascii_parsing() {
        let mesh = parse_stl(ASCII_TETRA_FACE.as_bytes()).unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        let normals = mesh.normals.as_ref().unwrap();
        assert_eq!(normals[0], Vector3f::new(0.0, 0.0, 1.0));
        // missing normal is rebuilt from the winding
        assert_eq!(normals[3], Vector3f::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_binary_parsing() {
        let data = binary_stl(&[
            [[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [5.0, 5.0, 5.0], [6.0, 5.0, 5.0], [5.0, 6.0, 5.0]],
        ]);
        let mesh = parse_stl(&data).unwrap();

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertices[4], Point3f::new(6.0, 5.0, 5.0));
        assert_eq!(mesh.normals.as_ref().unwrap()[5], Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        let mut data = binary_stl(&[[[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        data[..5].copy_from_slice(b"solid");

        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary_stl(&[[[0.0; 3]; 4]]);
        data.truncate(data.len() - 10);

        assert!(matches!(parse_stl(&data), Err(ImportError::ParseError { .. })));
        assert!(parse_stl(b"abc").is_err());
    }

    #[test]
    fn test_malformed_ascii() {
        let broken = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0\nendloop\nendfacet\n";
        assert!(parse_stl(broken.as_bytes()).is_err());

        let short = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nendloop\nendfacet\n";
        assert!(parse_stl(short.as_bytes()).is_err());
    }

    #[test]
    fn test_reader_from_file() {
        let mut file = tempfile::Builder::new().suffix(".stl").tempfile().unwrap();
        file.write_all(ASCII_TETRA_FACE.as_bytes()).unwrap();
        file.flush().unwrap();

        let mesh = StlReader.read_mesh(file.path()).unwrap();
        assert_eq!(mesh.face_count(), 2);
    }
}
