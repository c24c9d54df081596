use serde_json::json;

use super::*;
use crate::{
    config::Config,
    foundation::core::EditionIndex,
    metadata::{Attribute, EditionMetadata},
};

fn paths(base: &Path) -> OutputPaths {
    Config::default().paths(base)
}

fn edition(idx: u64, png: Option<Vec<u8>>) -> PreparedEdition {
    PreparedEdition {
        metadata: EditionMetadata {
            edition: EditionIndex(idx),
            name: format!("#{idx}"),
            description: "test".to_string(),
            attributes: vec![Attribute::new("Background", "Red")],
            tags: String::new(),
            image_href: format!("{idx}.png"),
            image_hash: format!("hash{idx}"),
            base64_svg_data_uri: None,
        },
        png,
    }
}

#[test]
fn build_setup_recreates_layout() {
    let dir = tempfile::tempdir().unwrap();
    let p = paths(dir.path());
    std::fs::create_dir_all(&p.json_dir).unwrap();
    std::fs::write(p.json_dir.join("stale.json"), "{}").unwrap();

    build_setup(&p, false).unwrap();
    assert!(p.json_dir.is_dir());
    assert!(p.images_dir.is_dir());
    assert!(!p.json_dir.join("stale.json").exists());
}

#[test]
fn build_setup_inline_skips_raster_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let p = paths(dir.path());
    build_setup(&p, true).unwrap();
    assert!(p.build_dir.is_dir());
    assert!(!p.json_dir.exists());
    assert!(!p.images_dir.exists());
}

#[test]
fn fs_sink_writes_edition_files_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let p = paths(dir.path());
    build_setup(&p, false).unwrap();
    let mut sink = FsSink::new(p.clone(), SchemaMapper::default(), ".json", false);

    let e7 = edition(7, Some(vec![1, 2, 3]));
    let e2 = edition(2, Some(vec![4, 5]));
    sink.push_edition(&e7).unwrap();
    sink.push_edition(&e2).unwrap();
    let manifest = CollectionManifest::assemble(vec![e7.metadata, e2.metadata]);
    sink.write_manifest(&manifest).unwrap();

    assert_eq!(std::fs::read(p.images_dir.join("7.png")).unwrap(), vec![1, 2, 3]);
    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(p.json_dir.join("2.json")).unwrap()).unwrap();
    assert_eq!(json["edition"], 2);
    assert_eq!(json["image"]["href"], "2.png");
    assert_eq!(json["attributes"][0]["trait_type"], "Background");

    let written = read_manifest(&p.manifest_path).unwrap();
    let editions = manifest_editions(&written).unwrap();
    assert_eq!(editions[0]["edition"], 2);
    assert_eq!(editions[1]["edition"], 7);
    assert_eq!(written["provenanceHash"], manifest.provenance_hash.as_str());
}

#[test]
fn fs_sink_honors_custom_extension() {
    let dir = tempfile::tempdir().unwrap();
    let p = paths(dir.path());
    build_setup(&p, false).unwrap();
    let mut sink = FsSink::new(p.clone(), SchemaMapper::default(), "", false);
    sink.push_edition(&edition(3, None)).unwrap();
    assert!(p.json_dir.join("3").is_file());
    assert!(!p.images_dir.join("3.png").exists());
}

#[test]
fn in_memory_sink_keeps_generation_order() {
    let mut sink = InMemorySink::new();
    sink.push_edition(&edition(5, None)).unwrap();
    sink.push_edition(&edition(1, None)).unwrap();
    let order: Vec<u64> = sink.editions.iter().map(|e| e.metadata.edition.0).collect();
    assert_eq!(order, vec![5, 1]);
    assert!(sink.manifest.is_none());
}

#[test]
fn check_generated_counts_editions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    std::fs::write(
        &path,
        json!({"editions": [{"edition": 1}, {"edition": 2}], "provenanceHash": "x"}).to_string(),
    )
    .unwrap();
    assert_eq!(check_generated(&path).unwrap(), 2);

    std::fs::write(&path, "{}").unwrap();
    assert!(matches!(check_generated(&path).unwrap_err(), NftgenError::Serde(_)));
    assert!(matches!(
        check_generated(&dir.path().join("missing.json")).unwrap_err(),
        NftgenError::Io { .. }
    ));
}

#[test]
fn update_img_paths_rewrites_hrefs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    std::fs::write(
        &path,
        json!({
            "editions": [
                {"edition": 3, "image": {"href": "3.png", "hash": "a"}},
                {"edition": 9, "image": {"href": "9.png", "hash": "b"}}
            ],
            "provenanceHash": "x"
        })
        .to_string(),
    )
    .unwrap();

    let n = update_img_paths(&path, &SchemaMapper::default(), "ipfs://cid/").unwrap();
    assert_eq!(n, 2);
    let manifest = read_manifest(&path).unwrap();
    assert_eq!(manifest["editions"][0]["image"]["href"], "ipfs://cid/3.png");
    assert_eq!(manifest["editions"][1]["image"]["href"], "ipfs://cid/9.png");
    assert_eq!(manifest["editions"][1]["image"]["hash"], "b");

    update_img_paths(&path, &SchemaMapper::default(), "").unwrap();
    let manifest = read_manifest(&path).unwrap();
    assert_eq!(manifest["editions"][0]["image"]["href"], "3.png");
}

#[test]
fn update_img_paths_follows_mapper() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    std::fs::write(
        &path,
        json!({"editions": [{"meta": {"id": 4}}], "provenanceHash": "x"}).to_string(),
    )
    .unwrap();
    let mapper = SchemaMapper {
        edition: "meta.id".to_string(),
        image_href: "uri".to_string(),
        ..SchemaMapper::default()
    };
    update_img_paths(&path, &mapper, "https://cdn").unwrap();
    let manifest = read_manifest(&path).unwrap();
    assert_eq!(manifest["editions"][0]["uri"], "https://cdn/4.png");
}
