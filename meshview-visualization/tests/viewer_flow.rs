//! End-to-end tests of the viewer model
//!
//! These drive [`Viewer`] the way the window does: drops, opens, loader
//! polling and rotation, against real files in a temporary directory.

use approx::assert_relative_eq;
use meshview_core::{Material, SceneNode};
use meshview_visualization::{LoadError, LoadState, Viewer, ViewerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

const PART_STL: &str = "solid part
facet normal 0 0 1
outer loop
vertex -5 -5 0
vertex 20 -5 0
vertex -5 20 0
endloop
endfacet
facet normal 0 0 -1
outer loop
vertex -5 -5 -10
vertex -5 20 -10
vertex 20 -5 -10
endloop
endfacet
endsolid part
";

const TWO_PART_OBJ: &str = "mtllib parts.mtl
o bracket
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
usemtl Steel
f 1 2 3 4
o pin
v 0 0 1
v 1 0 1
v 0 1 1
usemtl Brass
f 5 6 7
";

const PARTS_MTL: &str = "newmtl Steel
Kd 0.5 0.5 0.6
d 1.0
newmtl Brass
Kd 0.8 0.6 0.2
d 0.5
";

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn viewer() -> Viewer {
    Viewer::new(&ViewerConfig::default()).unwrap()
}

fn drop_single(viewer: &mut Viewer, path: &Path) -> Option<Result<(), LoadError>> {
    viewer.drag_over(path.to_path_buf());
    viewer.drop_file(path.to_path_buf());
    viewer.finish_drop()
}

#[test]
fn test_drop_stl_loads_gray_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "PART.STL", PART_STL);
    let mut viewer = viewer();

    viewer.drag_over(path.clone());
    assert!(viewer.drag_accepted());
    viewer.drop_file(path.clone());
    assert!(matches!(viewer.finish_drop(), Some(Ok(()))));
    assert_eq!(viewer.load_state(), LoadState::Loading);
    assert!(viewer.content().is_none());

    assert!(viewer.wait_for_load(WAIT));
    assert_eq!(viewer.load_state(), LoadState::Idle);
    assert_eq!(viewer.status(), format!("Loaded file {}", path.display()));

    let content = viewer.content().expect("content installed");
    let meshes = content.root().mesh_nodes();
    assert_eq!(meshes.len(), 1);
    assert_eq!(meshes[0].material, Material::gray());
    assert!(meshes[0].material.is_opaque());
    assert_eq!(content.root().face_count(), 2);

    // bounds are 25 x 25 x 10, centred on the origin
    assert_relative_eq!(content.translate().x, -7.5);
    assert_relative_eq!(content.translate().y, -7.5);
    assert_relative_eq!(content.translate().z, 5.0);
    assert_relative_eq!(viewer.camera().scale_factor(), 1.0, epsilon = 1e-6);
    assert_relative_eq!(viewer.camera().offset(), -60.0, epsilon = 1e-4);
}

#[test]
fn test_scene_graph_keeps_materials() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "parts.mtl", PARTS_MTL);
    let path = write_file(&dir, "parts.obj", TWO_PART_OBJ);
    let mut viewer = viewer();

    viewer.open(&path).unwrap();
    assert!(viewer.wait_for_load(WAIT));
    let content = viewer.content().expect("content installed");
    let root = content.root();
    assert!(matches!(root, SceneNode::Group(_)));

    let meshes = root.mesh_nodes();
    assert_eq!(meshes.len(), 2);
    assert_eq!(meshes[0].material.name.as_deref(), Some("Steel"));
    assert_eq!(meshes[1].material.name.as_deref(), Some("Brass"));
    assert_relative_eq!(meshes[1].material.opacity, 0.5);
    // the quad is fanned into two triangles
    assert_eq!(root.face_count(), 3);
}

#[test]
fn test_unsupported_drop_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let notes = write_file(&dir, "notes.txt", "not a model");
    let mut viewer = viewer();

    viewer.drag_over(notes.clone());
    assert!(!viewer.drag_accepted());
    assert!(drop_single(&mut viewer, &notes).is_none());
    assert_eq!(viewer.load_state(), LoadState::Idle);
    assert_eq!(viewer.status(), "");
}

#[test]
fn test_unknown_extension_reported_immediately() {
    let mut viewer = viewer();
    match viewer.open("model.xyz") {
        Err(LoadError::Rejected(e)) => assert!(e.is_unsupported_format()),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(viewer.status(), "Unsupported 3D file format [xyz]");
    assert!(!viewer.is_loading());
}

#[test]
fn test_broken_file_fails_and_clears_content() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_file(&dir, "good.stl", PART_STL);
    let broken = write_file(&dir, "broken.stl", "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0\nendloop\nendfacet\n");
    let mut viewer = viewer();

    viewer.open(&good).unwrap();
    assert!(viewer.wait_for_load(WAIT));
    assert!(viewer.content().is_some());

    viewer.open(&broken).unwrap();
    assert!(viewer.content().is_none());
    assert!(viewer.wait_for_load(WAIT));
    assert_eq!(viewer.status(), format!("Failed to load file {}", broken.display()));
    assert!(viewer.content().is_none());
    assert!(viewer.controls_enabled());
}

#[test]
fn test_second_load_is_busy() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_file(&dir, "first.stl", PART_STL);
    let second = write_file(&dir, "second.stl", PART_STL);
    let mut viewer = viewer();

    viewer.open(&first).unwrap();
    assert!(matches!(viewer.open(&second), Err(LoadError::Busy { .. })));
    assert!(viewer.wait_for_load(WAIT));
    assert_eq!(viewer.status(), format!("Loaded file {}", first.display()));
    assert_eq!(viewer.last_path(), Some(first.as_path()));
}

#[test]
fn test_percent_encoded_drop_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let real = write_file(&dir, "my part.stl", PART_STL);
    let encoded = dir.path().join("my%20part.stl");
    let mut viewer = viewer();

    assert!(matches!(drop_single(&mut viewer, &encoded), Some(Ok(()))));
    assert!(viewer.wait_for_load(WAIT));
    assert_eq!(viewer.status(), format!("Loaded file {}", real.display()));
}

#[test]
fn test_rotation_follows_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "part.stl", PART_STL);
    let config = ViewerConfig {
        rotate: true,
        ..ViewerConfig::default()
    };
    let mut viewer = Viewer::new(&config).unwrap();
    assert!(!viewer.can_rotate());

    viewer.open(&path).unwrap();
    assert!(viewer.wait_for_load(WAIT));
    assert!(viewer.is_rotating());

    viewer.tick(Duration::from_millis(1254));
    assert_relative_eq!(viewer.content().unwrap().rotation_y(), 90.0, epsilon = 1e-3);

    // toggling twice restores playback
    assert!(!viewer.toggle_rotation());
    viewer.tick(Duration::from_secs(1));
    assert_relative_eq!(viewer.content().unwrap().rotation_y(), 90.0, epsilon = 1e-3);
    assert!(viewer.toggle_rotation());
    viewer.tick(Duration::from_millis(1250));
    assert_relative_eq!(viewer.content().unwrap().rotation_y(), 180.0, epsilon = 1e-3);
}

#[test]
fn test_scroll_never_passes_origin() {
    let mut viewer = viewer();
    for _ in 0..50 {
        viewer.camera_mut().scroll(-120.0);
        assert!(viewer.camera().offset() <= 0.0);
    }
    assert_eq!(viewer.camera().offset(), 0.0);
}
