use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::*;
use crate::{
    dna::DnaStrand,
    foundation::core::Canvas,
    metadata::RenderedImage,
    render::cpu::CpuBackend,
};

const CANVAS: Canvas = Canvas {
    width: 2,
    height: 2,
};

fn write_png(path: &Path, px: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(CANVAS.width, CANVAS.height, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

fn element(id: usize, path: PathBuf, name: &str) -> LayerElement {
    LayerElement {
        id,
        name: name.to_string(),
        filename: path.file_name().unwrap().to_string_lossy().into_owned(),
        path,
        weight: 1,
    }
}

fn two_layers(dir: &Path, top_opacity: f32) -> Vec<Layer> {
    let red = dir.join("Red#1.png");
    let blue = dir.join("Blue#1.png");
    write_png(&red, [255, 0, 0, 255]);
    write_png(&blue, [0, 0, 255, 255]);
    vec![
        Layer {
            id: 0,
            name: "Background".to_string(),
            opacity: 1.0,
            elements: vec![element(0, red, "Red")],
        },
        Layer {
            id: 1,
            name: "Shape".to_string(),
            opacity: top_opacity,
            elements: vec![element(0, blue, "Blue")],
        },
    ]
}

fn dna_for(layers: &[Layer]) -> Dna {
    Dna::new(
        layers
            .iter()
            .map(|l| DnaStrand {
                element_id: 0,
                filename: l.elements[0].filename.clone(),
            })
            .collect(),
    )
}

#[test]
fn selection_follows_layer_order() {
    let dir = tempfile::tempdir().unwrap();
    let layers = two_layers(dir.path(), 0.5);
    let sel = construct_layer_to_dna(&dna_for(&layers), &layers).unwrap();
    assert_eq!(sel.len(), 2);
    assert_eq!(sel[0].name, "Background");
    assert_eq!(sel[1].name, "Shape");
    assert_eq!(sel[1].opacity, 0.5);
    assert_eq!(sel[1].element.name, "Blue");
}

#[test]
fn selection_rejects_bad_dna() {
    let dir = tempfile::tempdir().unwrap();
    let layers = two_layers(dir.path(), 1.0);
    let short = Dna::new(vec![DnaStrand {
        element_id: 0,
        filename: "Red#1.png".to_string(),
    }]);
    assert!(construct_layer_to_dna(&short, &layers).is_err());

    let unknown = Dna::new(vec![
        DnaStrand {
            element_id: 0,
            filename: "Red#1.png".to_string(),
        },
        DnaStrand {
            element_id: 9,
            filename: "Nope.png".to_string(),
        },
    ]);
    assert!(construct_layer_to_dna(&unknown, &layers).is_err());
}

#[test]
fn compose_draws_in_layer_order_and_collects_traits() {
    let dir = tempfile::tempdir().unwrap();
    let layers = two_layers(dir.path(), 1.0);
    let sel = construct_layer_to_dna(&dna_for(&layers), &layers).unwrap();

    let mut backend = CpuBackend::new(CANVAS).unwrap();
    let compositor = Compositor::new(Some(2), false).unwrap();
    let composed = compositor.compose(&mut backend, &sel).unwrap();

    let traits: Vec<(String, serde_json::Value)> = composed
        .attributes
        .iter()
        .map(|a| (a.trait_type.clone(), a.value.clone()))
        .collect();
    assert_eq!(
        traits,
        vec![
            ("Background".to_string(), serde_json::json!("Red")),
            ("Shape".to_string(), serde_json::json!("Blue")),
        ]
    );

    let RenderedImage::Png(png) = composed.image else {
        panic!("expected png output");
    };
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
}

#[test]
fn compose_applies_layer_opacity() {
    let dir = tempfile::tempdir().unwrap();
    let layers = two_layers(dir.path(), 0.5);
    let sel = construct_layer_to_dna(&dna_for(&layers), &layers).unwrap();

    let mut backend = CpuBackend::new(CANVAS).unwrap();
    let compositor = Compositor::new(None, true).unwrap();
    let composed = compositor.compose(&mut backend, &sel).unwrap();
    let RenderedImage::Pixels(frame) = composed.image else {
        panic!("expected pixels in inline-vector mode");
    };
    let px = &frame.data[0..4];
    assert_eq!(px[3], 255);
    assert!(px[0] > 100 && px[0] < 160, "{px:?}");
    assert!(px[2] > 100 && px[2] < 160, "{px:?}");
}

#[test]
fn compose_clears_between_editions() {
    let dir = tempfile::tempdir().unwrap();
    let layers = two_layers(dir.path(), 1.0);
    let only_bg = &layers[..1];
    let sel_bg = construct_layer_to_dna(&dna_for(only_bg), only_bg).unwrap();

    let mut backend = CpuBackend::new(CANVAS).unwrap();
    let compositor = Compositor::new(Some(1), true).unwrap();
    let sel_all = construct_layer_to_dna(&dna_for(&layers), &layers).unwrap();
    compositor.compose(&mut backend, &sel_all).unwrap();
    let composed = compositor.compose(&mut backend, &sel_bg).unwrap();
    let RenderedImage::Pixels(frame) = composed.image else {
        panic!("expected pixels");
    };
    assert_eq!(&frame.data[0..4], &[255, 0, 0, 255]);
}

#[test]
fn missing_element_file_is_asset_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let layers = two_layers(dir.path(), 1.0);
    std::fs::remove_file(&layers[1].elements[0].path).unwrap();
    let sel = construct_layer_to_dna(&dna_for(&layers), &layers).unwrap();

    let mut backend = CpuBackend::new(CANVAS).unwrap();
    let compositor = Compositor::new(None, false).unwrap();
    let err = compositor.compose(&mut backend, &sel).unwrap_err();
    assert!(matches!(err, NftgenError::AssetLoad { .. }), "{err}");
}

#[test]
fn svg_elements_rasterize_to_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let svg = dir.path().join("Green#1.svg");
    std::fs::write(
        &svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#00ff00"/></svg>"##,
    )
    .unwrap();
    let layers = vec![Layer {
        id: 0,
        name: "Body".to_string(),
        opacity: 1.0,
        elements: vec![element(0, svg, "Green")],
    }];
    let sel = construct_layer_to_dna(&dna_for(&layers), &layers).unwrap();

    let mut backend = CpuBackend::new(CANVAS).unwrap();
    let compositor = Compositor::new(None, true).unwrap();
    let RenderedImage::Pixels(frame) = compositor.compose(&mut backend, &sel).unwrap().image
    else {
        panic!("expected pixels");
    };
    assert_eq!(&frame.data[0..4], &[0, 255, 0, 255]);
}

#[test]
fn zero_threads_rejected() {
    assert!(Compositor::new(Some(0), false).is_err());
}
