//! Template manifests and the filesystem provider.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::flyer_template;
use fillpdf::{
    FsTemplateProvider, RegenConfig, RegenerationController, TemplateProvider, TemplateRegistry,
};

const MANIFEST: &str = r##"{
  "templates": [
    {
      "id": "grand-opening",
      "name": "Grand Opening Flyer",
      "path": "/templates/flyer.pdf",
      "description": "Single page flyer",
      "color": "#ff6600"
    },
    {
      "id": "menu",
      "name": "Menu",
      "path": "/templates/menu.pdf"
    }
  ]
}"##;

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("templates")).unwrap();
    fs::write(dir.path().join("templates/flyer.pdf"), flyer_template()).unwrap();
    fs::write(dir.path().join("manifest.json"), MANIFEST).unwrap();
    dir
}

#[test]
fn test_manifest_file_loads_in_order() {
    let dir = workspace();
    let registry = TemplateRegistry::from_manifest_file(dir.path().join("manifest.json")).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.default_template().unwrap().id, "grand-opening");
    let menu = registry.require("menu").unwrap();
    assert_eq!(menu.description, "");
    assert_eq!(menu.color, None);
}

#[tokio::test]
async fn test_fs_provider_resolves_manifest_paths() {
    let dir = workspace();
    let registry = TemplateRegistry::from_manifest_file(dir.path().join("manifest.json")).unwrap();
    let provider = FsTemplateProvider::new(dir.path());

    let flyer = registry.require("grand-opening").unwrap();
    assert_eq!(provider.fetch(flyer).await.unwrap(), flyer_template());

    let menu = registry.require("menu").unwrap();
    assert!(matches!(
        provider.fetch(menu).await,
        Err(fillpdf::Error::Fetch(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_controller_over_filesystem() {
    let dir = workspace();
    let registry = TemplateRegistry::from_manifest_file(dir.path().join("manifest.json")).unwrap();
    let provider = Arc::new(FsTemplateProvider::new(dir.path()));
    let mut controller = RegenerationController::new(provider, RegenConfig::default());

    let template = registry.default_template().unwrap().clone();
    let catalog = controller.select_template(template).await.unwrap();
    assert_eq!(catalog.len(), 4);

    controller.set_value("mainHeadline", Some("From disk".into()));
    let mut outputs = controller.subscribe_output();
    tokio::time::timeout(Duration::from_secs(5), outputs.wait_for(|o| o.is_some()))
        .await
        .expect("output within quiescence window")
        .unwrap();
    assert_eq!(
        controller.output().unwrap().template_id,
        "grand-opening"
    );
}
