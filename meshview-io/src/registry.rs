//! Extension-keyed importer registry
//!
//! Each supported extension maps to one reader. Readers come in two shapes:
//! [`MeshReader`]s produce bare triangle geometry (STL) that the registry
//! dresses in a default material, while [`NodeReader`]s produce ready mesh
//! nodes with their own materials (3DS, OBJ). Either way the caller gets a
//! single [`Content`] whose root is a group.

use crate::error::{ImportError, Result};
use log::debug;
use meshview_core::{Content, Material, MeshNode, SceneNode, TriangleMesh};
use std::collections::BTreeMap;
use std::path::Path;

/// Reader for formats that only carry triangle geometry
pub trait MeshReader: Send + Sync {
    /// Read the geometry from the given path
    fn read_mesh(&self, path: &Path) -> Result<TriangleMesh>;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;
}

/// Reader for formats that carry a node hierarchy with materials
pub trait NodeReader: Send + Sync {
    /// Read all top-level nodes from the given path
    fn read_nodes(&self, path: &Path) -> Result<Vec<SceneNode>>;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;
}

enum Entry {
    Mesh(Box<dyn MeshReader>),
    Nodes(Box<dyn NodeReader>),
    /// Recognised extension whose decoder was not built in
    Unavailable { dependency: &'static str },
}

/// Registry that dispatches a path to the reader for its extension
pub struct ImporterRegistry {
    entries: BTreeMap<String, Entry>,
}

impl ImporterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registry with every format this build can decode
    pub fn with_default_formats() -> Self {
        let mut registry = Self::new();
        registry.register_mesh_reader("stl", Box::new(crate::stl::StlReader));
        registry.register_node_reader("3ds", Box::new(crate::tds::TdsReader));

        #[cfg(feature = "obj")]
        registry.register_node_reader("obj", Box::new(crate::obj::ObjReader));
        #[cfg(not(feature = "obj"))]
        registry.register_unavailable("obj", "obj");

        registry
    }

    /// Register a geometry-only reader for an extension
    pub fn register_mesh_reader(&mut self, extension: &str, reader: Box<dyn MeshReader>) {
        self.entries.insert(extension.to_lowercase(), Entry::Mesh(reader));
    }

    /// Register a node reader for an extension
    pub fn register_node_reader(&mut self, extension: &str, reader: Box<dyn NodeReader>) {
        self.entries.insert(extension.to_lowercase(), Entry::Nodes(reader));
    }

    /// Recognise an extension without being able to decode it
    pub fn register_unavailable(&mut self, extension: &str, dependency: &'static str) {
        self.entries
            .insert(extension.to_lowercase(), Entry::Unavailable { dependency });
    }

    /// Lowercased extension of the file name, if it has one.
    ///
    /// The extension is whatever follows the last `.` of the file name; a name
    /// that only starts with a dot has none.
    pub fn extension_of(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_string_lossy();
        match name.rfind('.') {
            Some(dot) if dot > 0 && dot + 1 < name.len() => Some(name[dot + 1..].to_lowercase()),
            _ => None,
        }
    }

    /// Validate the path's extension without touching the file
    pub fn check(&self, path: &Path) -> Result<String> {
        let extension = Self::extension_of(path).ok_or_else(|| ImportError::MissingExtension {
            path: path.display().to_string(),
        })?;
        if self.entries.contains_key(&extension) {
            Ok(extension)
        } else {
            Err(ImportError::UnsupportedFormat { extension })
        }
    }

    /// Whether the file name has an extension this registry recognises
    pub fn supports(&self, path: &Path) -> bool {
        self.check(path).is_ok()
    }

    /// Load a model file into displayable content
    pub fn load(&self, path: &Path) -> Result<Content> {
        let extension = self.check(path)?;
        let root = match &self.entries[&extension] {
            Entry::Mesh(reader) => {
                debug!("Reading {} as {}", path.display(), reader.format_name());
                let mesh = reader.read_mesh(path)?;
                // Geometry-only formats carry no colour, shade them flat gray
                SceneNode::group([SceneNode::Mesh(MeshNode::new(mesh, Material::gray()))])
            }
            Entry::Nodes(reader) => {
                debug!("Reading {} as {}", path.display(), reader.format_name());
                SceneNode::group(reader.read_nodes(path)?)
            }
            Entry::Unavailable { dependency } => {
                return Err(ImportError::MissingDependency {
                    format: extension,
                    dependency: *dependency,
                })
            }
        };
        Ok(Content::new(root))
    }

    /// Recognised extensions, sorted
    pub fn supported_extensions(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Glob patterns for file dialogs, e.g. `*.stl`
    pub fn extension_filters(&self) -> Vec<String> {
        self.entries.keys().map(|ext| format!("*.{}", ext)).collect()
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::with_default_formats()
    }
}
