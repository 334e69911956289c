//! End-to-end tests for the batch pipeline.
//!
//! Each test builds IPA fixtures in a temporary directory, runs the pipeline
//! over it, and inspects the repacked archives.

use ipapatch::{BatchPipeline, Error, MemoryReporter, PatchConfig, Stage};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const APP: &str = "Payload/Discord.app";
const PNPM: &str = "Payload/Discord.app/assets/_node_modules/.pnpm";

/// Build an IPA from `(name, contents)` pairs; names ending in `/` are
/// directory entries.
fn create_ipa(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Read every entry of an archive into a sorted map.
fn read_ipa(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).unwrap();
        entries.insert(entry.name().to_string(), contents);
    }
    entries
}

fn manifest_of(entries: &BTreeMap<String, Vec<u8>>) -> Value {
    serde_json::from_slice(&entries[&format!("{APP}/manifest.json")]).unwrap()
}

#[test]
fn test_cycle_without_targets_keeps_contents() {
    let temp_dir = TempDir::new().unwrap();
    let ipa = temp_dir.path().join("Clean.ipa");
    let manifest = serde_json::to_vec_pretty(&json!({
        "hashes": {
            "assets/_node_modules/.pnpm/react@18.2.0/index.js": "aaa",
            "main.jsbundle": "bbb",
        }
    }))
    .unwrap();
    create_ipa(
        &ipa,
        &[
            ("Payload/", b""),
            ("Payload/Discord.app/", b""),
            ("Payload/Discord.app/manifest.json", &manifest),
            ("Payload/Discord.app/main.jsbundle", b"bundle"),
            ("Payload/Discord.app/assets/", b""),
            ("Payload/Discord.app/assets/_node_modules/", b""),
            ("Payload/Discord.app/assets/_node_modules/.pnpm/", b""),
            ("Payload/Discord.app/assets/_node_modules/.pnpm/react@18.2.0/", b""),
        ],
    );
    let before = read_ipa(&ipa);

    let config = PatchConfig::default();
    let reporter = MemoryReporter::new();
    let count = BatchPipeline::new(&config, &reporter)
        .run(temp_dir.path())
        .unwrap();

    assert_eq!(count, 1);
    assert!(!reporter.has_errors());
    assert!(ipa.is_file());
    assert!(!temp_dir.path().join("Clean.zip").exists());
    assert!(!temp_dir.path().join("Clean").exists());

    let after = read_ipa(&ipa);
    assert_eq!(
        before.keys().collect::<Vec<_>>(),
        after.keys().collect::<Vec<_>>()
    );
    assert_eq!(after[&format!("{APP}/main.jsbundle")], b"bundle");
    assert_eq!(manifest_of(&before), manifest_of(&after));
}

#[test]
fn test_cycle_patches_manifest_and_module_cache() {
    let temp_dir = TempDir::new().unwrap();
    let ipa = temp_dir.path().join("Discord.ipa");
    let manifest = serde_json::to_vec(&json!({
        "bundleVersion": "250.0",
        "hashes": {
            "assets/_node_modules/.pnpm/@react-navigation+elements@1.3.21/node_modules/@react-navigation/elements/index.js": "h1",
            "assets/_node_modules/.pnpm/react@18.2.0/index.js": "h2",
        }
    }))
    .unwrap();
    create_ipa(
        &ipa,
        &[
            ("Payload/Discord.app/manifest.json", &manifest),
            (
                "Payload/Discord.app/assets/_node_modules/.pnpm/@react-navigation+elements@1.3.21/node_modules/@react-navigation/elements/index.js",
                b"module.exports = {};",
            ),
            (
                "Payload/Discord.app/assets/_node_modules/.pnpm/react@18.2.0/index.js",
                b"react",
            ),
        ],
    );

    let config = PatchConfig::default();
    let reporter = MemoryReporter::new();
    BatchPipeline::new(&config, &reporter)
        .run(temp_dir.path())
        .unwrap();

    let after = read_ipa(&ipa);
    assert_eq!(
        manifest_of(&after),
        json!({
            "bundleVersion": "250.0",
            "hashes": {
                "assets/_node_modules/.pnpm/@react-navigation+elements@patched/node_modules/@react-navigation/elements/index.js": "h1",
                "assets/_node_modules/.pnpm/react@18.2.0/index.js": "h2",
            }
        })
    );
    assert_eq!(
        after[&format!(
            "{PNPM}/@react-navigation+elements@patched/node_modules/@react-navigation/elements/index.js"
        )],
        b"module.exports = {};"
    );
    assert!(!after
        .keys()
        .any(|name| name.contains("@react-navigation+elements@1.3.21")));
    assert!(after.contains_key(&format!("{PNPM}/react@18.2.0/index.js")));
}

#[test]
fn test_cycle_with_invalid_manifest_still_repacks() {
    let temp_dir = TempDir::new().unwrap();
    let ipa = temp_dir.path().join("Bad.ipa");
    create_ipa(
        &ipa,
        &[
            ("Payload/Discord.app/manifest.json", b"{ broken"),
            (
                "Payload/Discord.app/assets/_node_modules/.pnpm/@react-navigation+elements@1.0.0/index.js",
                b"x",
            ),
        ],
    );

    let config = PatchConfig::default();
    let reporter = MemoryReporter::new();
    BatchPipeline::new(&config, &reporter)
        .run(temp_dir.path())
        .unwrap();

    assert!(reporter.has_errors());
    let after = read_ipa(&ipa);
    assert_eq!(after[&format!("{APP}/manifest.json")], b"{ broken");
    assert!(after.contains_key(&format!("{PNPM}/@react-navigation+elements@patched/index.js")));
}

#[test]
fn test_missing_manifest_is_not_created() {
    let temp_dir = TempDir::new().unwrap();
    let ipa = temp_dir.path().join("NoManifest.ipa");
    create_ipa(&ipa, &[("Payload/Discord.app/Info.plist", b"<plist/>")]);

    let config = PatchConfig::default();
    let reporter = MemoryReporter::new();
    BatchPipeline::new(&config, &reporter)
        .run(temp_dir.path())
        .unwrap();

    assert!(!reporter.has_errors());
    let after = read_ipa(&ipa);
    assert!(!after.contains_key(&format!("{APP}/manifest.json")));
    assert!(after.contains_key(&format!("{APP}/Info.plist")));
}

#[test]
fn test_fatal_error_halts_batch() {
    let temp_dir = TempDir::new().unwrap();
    let broken = temp_dir.path().join("a-broken.ipa");
    let good = temp_dir.path().join("b-good.ipa");
    fs::write(&broken, b"not an archive").unwrap();
    create_ipa(&good, &[("Payload/Discord.app/Info.plist", b"<plist/>")]);
    let good_before = fs::read(&good).unwrap();

    let config = PatchConfig::default();
    let reporter = MemoryReporter::new();
    let result = BatchPipeline::new(&config, &reporter).run(temp_dir.path());

    assert!(matches!(
        result,
        Err(Error::Stage {
            stage: Stage::Unpacked,
            ..
        })
    ));
    assert!(temp_dir.path().join("a-broken.zip").exists());
    assert_eq!(fs::read(&good).unwrap(), good_before);
}

#[test]
fn test_custom_app_name_and_token() {
    let temp_dir = TempDir::new().unwrap();
    let ipa = temp_dir.path().join("Other.ipa");
    create_ipa(
        &ipa,
        &[
            (
                "Payload/Other.app/manifest.json",
                br#"{"hashes":{"assets/_node_modules/.pnpm/left-pad@1.3.0/index.js":"h"}}"#,
            ),
            (
                "Payload/Other.app/assets/_node_modules/.pnpm/left-pad@1.3.0/index.js",
                b"pad",
            ),
        ],
    );

    let config = PatchConfig::new()
        .app_name("Other.app")
        .target_token("left-pad")
        .compression_level(0);
    let reporter = MemoryReporter::new();
    BatchPipeline::new(&config, &reporter)
        .run(temp_dir.path())
        .unwrap();

    let after = read_ipa(&ipa);
    assert!(after.contains_key(
        "Payload/Other.app/assets/_node_modules/.pnpm/left-pad@patched/index.js"
    ));
    let manifest: Value =
        serde_json::from_slice(&after["Payload/Other.app/manifest.json"]).unwrap();
    assert_eq!(
        manifest["hashes"]["assets/_node_modules/.pnpm/left-pad@patched/index.js"],
        json!("h")
    );
}
