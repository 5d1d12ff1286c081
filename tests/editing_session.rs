// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

use image::{Rgba, RgbaImage};
use pixelstack::editor::{History, Reorder};
use pixelstack::io::media::png_data_uri;
use pixelstack::io::serialization::{load_project, save_project};
use pixelstack::models::Point;
use pixelstack::render::{Compositor, DrawableKind, ExportConfig, ExportFormat, MAX_DIMENSION};
use pixelstack::{
    Canvas, Color, EditorError, Layer, LayerKind, LayerUpdate, Project, RasterBackend, Session,
};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn red_square() -> String {
    png_data_uri(&RgbaImage::from_pixel(10, 10, RED)).unwrap()
}

fn blank_session() -> Session<RasterBackend> {
    Session::new(Project::new("scenario", Canvas::default()), RasterBackend::new())
}

fn decode(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

#[test]
fn test_two_layer_scenario_undo_then_export() {
    let mut session = blank_session();
    assert_eq!(session.project().canvas.width, 800);
    assert_eq!(session.project().canvas.background_color, Color::WHITE);

    session
        .add_layer(Layer::image("img", red_square()).with_position(100.0, 100.0))
        .unwrap();
    session.add_layer(Layer::text("txt", "Hello")).unwrap();
    assert_eq!(session.project().layer("img").unwrap().z_index, 0);
    assert_eq!(session.project().layer("txt").unwrap().z_index, 1);

    assert!(session.undo());
    let layers = &session.project().layers;
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].id, "img");

    let plan = Compositor::<RasterBackend>::plan(session.project());
    assert_eq!(plan.len(), 1);
    assert!(matches!(plan[0].kind, DrawableKind::Image(_)));

    let png = session
        .export(&ExportConfig::with_format(ExportFormat::Png))
        .unwrap();
    assert_eq!((png.width, png.height), (800, 600));
    let raster = decode(&png.bytes);
    assert_eq!(raster.dimensions(), (800, 600));
    assert_eq!(*raster.get_pixel(105, 105), RED);
    assert_eq!(*raster.get_pixel(0, 0), WHITE);
    assert_eq!(*raster.get_pixel(120, 120), WHITE);
}

#[test]
fn test_export_scale_doubles_dimensions() {
    let mut session = blank_session();
    session
        .add_layer(Layer::image("img", red_square()).with_position(100.0, 100.0))
        .unwrap();

    let config = ExportConfig {
        scale: 2.0,
        ..ExportConfig::default()
    };
    let png = session.export(&config).unwrap();
    assert_eq!((png.width, png.height), (1600, 1200));
    assert_eq!(decode(&png.bytes).dimensions(), (1600, 1200));
}

#[test]
fn test_export_formats_and_custom_size() {
    let session = blank_session();

    let jpg = session
        .export(&ExportConfig {
            format: ExportFormat::Jpg,
            quality: 80,
            width: Some(400),
            ..ExportConfig::default()
        })
        .unwrap();
    assert_eq!((jpg.width, jpg.height), (400, 300));
    assert!(jpg.to_data_uri().starts_with("data:image/jpeg;base64,"));

    let webp = session
        .export(&ExportConfig::with_format(ExportFormat::Webp))
        .unwrap();
    assert_eq!(decode(&webp.bytes).dimensions(), (800, 600));

    assert!(matches!(
        session.export(&ExportConfig {
            scale: 0.0,
            ..ExportConfig::default()
        }),
        Err(EditorError::InvalidExportConfig(_))
    ));
}

#[test]
fn test_broken_layer_does_not_break_the_pass() {
    let mut session = blank_session();
    session.add_layer(Layer::image("broken", "/missing/file.png")).unwrap();
    session
        .add_layer(Layer::image("ok", red_square()).with_position(50.0, 50.0))
        .unwrap();

    assert_eq!(session.last_rebuild().skipped, 1);
    assert_eq!(session.last_rebuild().submitted, 1);
    let png = session.export(&ExportConfig::default()).unwrap();
    assert_eq!(*decode(&png.bytes).get_pixel(55, 55), RED);
}

#[test]
fn test_undo_redo_inverse() {
    let mut session = blank_session();
    session.add_layer(Layer::text("a", "one")).unwrap();
    session.update_layer("a", LayerUpdate::position(40.0, 40.0));
    session.add_layer(Layer::text("b", "two")).unwrap();
    session.reorder_layer("b", Reorder::ToBack);

    let before_undo = session.project().clone();
    assert!(session.undo());
    let after_undo = session.project().clone();
    assert_ne!(after_undo, before_undo);
    assert!(session.redo());
    assert_eq!(session.project(), &before_undo);

    // A new action after undo discards the redo branch.
    assert!(session.undo());
    session.delete_layer("a");
    assert!(!session.redo());
}

#[test]
fn test_opacity_and_deletion_properties() {
    let mut session = blank_session();
    session.add_layer(Layer::text("a", "one")).unwrap();
    session.update_layer("a", LayerUpdate::opacity(150));
    assert_eq!(session.project().layer("a").unwrap().opacity, 100);

    session.delete_layer("a");
    let once = session.project().clone();
    let recorded = session.history().len();
    session.delete_layer("a");
    assert_eq!(session.project(), &once);
    assert_eq!(session.history().len(), recorded);
}

#[test]
fn test_history_capacity_eviction() {
    let project = Project::new("cap", Canvas::default());
    let mut history = History::new();
    for i in 0..55 {
        history.record("step", format!("step {i}"), &project);
    }
    assert_eq!(history.len(), 50);
    assert_eq!(history.current_index(), Some(49));
    assert_eq!(history.current().unwrap().description, "step 54");
    assert!(matches!(
        history.restore(50),
        Err(EditorError::IndexOutOfRange { index: 50, len: 50 })
    ));
}

#[test]
fn test_z_order_drives_submission_order() {
    let mut project = Project::new("z", Canvas::default());
    for (id, z) in [("one", 3), ("two", 1), ("three", 2)] {
        let mut layer = Layer::text(id, id);
        layer.z_index = z;
        project.layers.push(layer);
    }
    let ids: Vec<_> = Compositor::<RasterBackend>::plan(&project)
        .into_iter()
        .map(|d| d.layer_id)
        .collect();
    assert_eq!(ids, ["two", "three", "one"]);
}

#[test]
fn test_sticker_and_drawing_survive_move_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = blank_session();
    session
        .add_layer(Layer::sticker("st", "s-1", red_square(), "basic", "Red").with_position(10.0, 10.0))
        .unwrap();
    let mut drawing = Layer::drawing("pen", Color::BLACK, 4.0);
    if let LayerKind::Drawing(d) = &mut drawing.kind {
        d.points = vec![Point::new(0.0, 10.0), Point::new(40.0, 10.0)];
    }
    session.add_layer(drawing).unwrap();

    session
        .apply_drawable_transform("st", Point::new(200.0, 200.0))
        .unwrap();
    session.update_layer("pen", LayerUpdate::position(300.0, 300.0));

    for name in ["scene.json", "scene.yaml"] {
        let path = dir.path().join(name);
        save_project(session.project(), &path).unwrap();
        let loaded = load_project(&path).unwrap();
        assert_eq!(&loaded, session.project(), "{name}");

        let mut reopened = blank_session();
        reopened.open_project(loaded);
        let png = reopened.export(&ExportConfig::default()).unwrap();
        let raster = decode(&png.bytes);
        assert_eq!(*raster.get_pixel(205, 205), RED);
        assert_eq!(*raster.get_pixel(15, 15), WHITE);
        assert_eq!(*raster.get_pixel(320, 310), BLACK);
        assert_eq!(*raster.get_pixel(20, 10), WHITE);
    }
}

#[test]
fn test_text_layer_is_part_of_the_export() {
    let mut session = blank_session();
    let blank = decode(&session.export(&ExportConfig::default()).unwrap().bytes);

    session
        .add_layer(Layer::text("txt", "Hello").with_position(100.0, 100.0))
        .unwrap();
    let with_text = decode(&session.export(&ExportConfig::default()).unwrap().bytes);
    assert_ne!(with_text, blank);

    let inked = with_text
        .enumerate_pixels()
        .filter(|(_, _, px)| **px != WHITE)
        .map(|(x, y, _)| (x, y))
        .collect::<Vec<_>>();
    assert!(!inked.is_empty());
    assert!(inked.iter().all(|&(x, y)| x >= 90 && y >= 90 && x < 400 && y < 200));
}

#[test]
fn test_oversized_export_is_an_error_not_an_abort() {
    let session = blank_session();
    for config in [
        ExportConfig {
            scale: 1e6,
            ..ExportConfig::default()
        },
        ExportConfig {
            width: Some(MAX_DIMENSION + 1),
            ..ExportConfig::default()
        },
    ] {
        assert!(matches!(
            session.export(&config),
            Err(EditorError::InvalidExportConfig(_))
        ));
    }
}
