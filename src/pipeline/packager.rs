//! APK artifact synthesis
//!
//! The artifact is a ZIP laid out like an Android package: manifest, a DEX
//! and resource table with valid headers, `META-INF` signing files whose
//! manifest carries real SHA-256 digests, launcher icons and a sample of the
//! project's own assets. It is not a signed, installable build output.

use super::config::PipelineConfig;
use super::error::PackagingError;
use crate::detection::frameworks::parent_dir;
use crate::detection::ProjectAnalysis;
use crate::fs::{list_files, WalkConfig};
use crate::stack::FrameworkId;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Artifact location inside a project's working directory.
pub const APK_RELATIVE_PATH: &str = "build/outputs/apk/release/app-release.apk";

const DEX_SIZE: usize = 8192;
const ARSC_SIZE: usize = 4096;
const DEX_MAGIC: &[u8; 8] = b"dex\n035\0";
const DEX_CHECKSUM: u32 = 0x1234_5678;
const ARSC_TABLE_TYPE: u32 = 0x080C_0003;
const SIGNATURE_BLOCK_SIZE: usize = 256;

const ICON_DENSITIES: &[&str] = &["mdpi", "hdpi", "xhdpi"];
const GENERIC_ASSETS: &[&str] = &["index.html", "app.js", "main.js", "package.json"];
const FALLBACK_FILES: &[&str] = &["package.json", "index.html", "app.js", "main.dart", "pubspec.yaml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    pub path: PathBuf,
    pub size: u64,
    pub entries: usize,
    /// Whether the reduced fallback archive was written instead
    pub fallback: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ApkPackager {
    config: PipelineConfig,
}

impl ApkPackager {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Writes the artifact for the project in `dir`. Runs on the blocking pool.
    pub async fn package(
        &self,
        dir: &Path,
        analysis: &ProjectAnalysis,
    ) -> Result<PackagedArtifact, PackagingError> {
        let dir = dir.to_path_buf();
        let analysis = analysis.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || package_blocking(&dir, &analysis, &config))
            .await
            .map_err(|e| PackagingError::Task(e.to_string()))?
    }
}

pub fn package_blocking(
    dir: &Path,
    analysis: &ProjectAnalysis,
    config: &PipelineConfig,
) -> Result<PackagedArtifact, PackagingError> {
    let output = dir.join(APK_RELATIVE_PATH);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| PackagingError::io(parent, e))?;
    }
    let root = dir.join(&analysis.root_dir);

    let (entries, fallback) = match write_apk(&output, &root, analysis, config) {
        Ok(entries) => (entries, false),
        Err(primary) => {
            warn!(error = %primary, path = %output.display(), "APK packaging failed, writing fallback archive");
            let entries = write_fallback(&output, &root).map_err(|e| PackagingError::FallbackFailed {
                primary: primary.to_string(),
                source: Box::new(e),
            })?;
            (entries, true)
        }
    };

    let size = fs::metadata(&output)
        .map_err(|e| PackagingError::io(&output, e))?
        .len();
    debug!(path = %output.display(), size, entries, fallback, "Artifact written");

    Ok(PackagedArtifact {
        path: output,
        size,
        entries,
        fallback,
    })
}

fn write_apk(
    output: &Path,
    root: &Path,
    analysis: &ProjectAnalysis,
    config: &PipelineConfig,
) -> Result<usize, PackagingError> {
    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();

    let manifest = android_manifest(analysis).into_bytes();
    let dex = classes_dex();
    let arsc = resources_arsc();

    let jar_manifest = jar_manifest(&[
        ("AndroidManifest.xml", &manifest),
        ("classes.dex", &dex),
        ("resources.arsc", &arsc),
    ]);
    let signature_file = signature_file(&jar_manifest);

    entries.push(("AndroidManifest.xml".to_string(), manifest));
    entries.push(("classes.dex".to_string(), dex));
    entries.push(("resources.arsc".to_string(), arsc));
    entries.push(("META-INF/MANIFEST.MF".to_string(), jar_manifest.into_bytes()));
    entries.push(("META-INF/CERT.SF".to_string(), signature_file.into_bytes()));
    entries.push((
        "META-INF/CERT.RSA".to_string(),
        vec![0x30; SIGNATURE_BLOCK_SIZE],
    ));

    entries.extend(framework_assets(root, analysis, config));

    let icon = launcher_icon();
    for density in ICON_DENSITIES {
        entries.push((format!("res/mipmap-{}/ic_launcher.png", density), icon.clone()));
    }

    write_zip(output, &entries)?;
    Ok(entries.len())
}

/// Reduced archive holding whichever well-known top-level files are readable.
pub fn write_fallback(output: &Path, root: &Path) -> Result<usize, PackagingError> {
    let entries: Vec<(String, Vec<u8>)> = FALLBACK_FILES
        .iter()
        .filter_map(|name| {
            fs::read(root.join(name))
                .ok()
                .map(|bytes| (name.to_string(), bytes))
        })
        .collect();
    write_zip(output, &entries)?;
    Ok(entries.len())
}

fn write_zip(output: &Path, entries: &[(String, Vec<u8>)]) -> Result<(), PackagingError> {
    let file = File::create(output).map_err(|e| PackagingError::io(output, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes).map_err(|e| PackagingError::io(output, e))?;
    }
    zip.finish()?;
    Ok(())
}

fn android_manifest(analysis: &ProjectAnalysis) -> String {
    let config = &analysis.build_config;
    let package = if !config.application_id.is_empty() {
        config.application_id.clone()
    } else if !analysis.package_name.is_empty() {
        analysis.package_name.clone()
    } else {
        format!("com.{}.app", analysis.framework.slug().replace('-', ""))
    };
    let label = if analysis.project_name.is_empty() {
        "Mobile App"
    } else {
        analysis.project_name.as_str()
    };

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="{package}"
    android:versionCode="{code}"
    android:versionName="{name}">

    <uses-sdk android:minSdkVersion="{min}"
              android:targetSdkVersion="{target}" />

    <uses-permission android:name="android.permission.INTERNET" />
    <uses-permission android:name="android.permission.ACCESS_NETWORK_STATE" />
    <uses-permission android:name="android.permission.WRITE_EXTERNAL_STORAGE" />

    <application
        android:allowBackup="true"
        android:icon="@mipmap/ic_launcher"
        android:label="{label}"
        android:theme="@style/AppTheme">

        <activity
            android:name=".MainActivity"
            android:exported="true"
            android:launchMode="singleTop">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#,
        package = package,
        code = config.version_code,
        name = escape_attr(&config.version_name),
        min = config.min_sdk,
        target = config.target_sdk,
        label = escape_attr(label),
    )
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

fn classes_dex() -> Vec<u8> {
    let mut dex = vec![0u8; DEX_SIZE];
    dex[..DEX_MAGIC.len()].copy_from_slice(DEX_MAGIC);
    dex[8..12].copy_from_slice(&DEX_CHECKSUM.to_le_bytes());
    dex
}

fn resources_arsc() -> Vec<u8> {
    let mut arsc = vec![0u8; ARSC_SIZE];
    arsc[0..4].copy_from_slice(&ARSC_TABLE_TYPE.to_le_bytes());
    arsc[4..8].copy_from_slice(&(ARSC_SIZE as u32).to_le_bytes());
    arsc
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn jar_manifest(files: &[(&str, &[u8])]) -> String {
    let mut manifest = format!(
        "Manifest-Version: 1.0\nCreated-By: {} {}\nBuilt-Date: {}\n",
        crate::NAME,
        crate::VERSION,
        Utc::now().to_rfc3339()
    );
    for (name, bytes) in files {
        manifest.push_str(&format!("\nName: {}\nSHA-256-Digest: {}\n", name, sha256_hex(bytes)));
    }
    manifest
}

fn signature_file(jar_manifest: &str) -> String {
    format!(
        "Signature-Version: 1.0\nCreated-By: {} {}\nSHA-256-Digest-Manifest: {}\n",
        crate::NAME,
        crate::VERSION,
        sha256_hex(jar_manifest.as_bytes())
    )
}

/// 48x48 RGB PNG: signature, IHDR, IDAT, IEND.
fn launcher_icon() -> Vec<u8> {
    let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x30, 0x00, 0x00,
        0x00, 0x30, 0x08, 0x02, 0x00, 0x00, 0x00, 0x91, 0x5D, 0x53, 0x8E,
    ]);
    png.extend_from_slice(&[
        0x00, 0x00, 0x00, 0x0B, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00,
        0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4,
    ]);
    png.extend_from_slice(&[
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]);
    png
}

fn framework_assets(
    root: &Path,
    analysis: &ProjectAnalysis,
    config: &PipelineConfig,
) -> Vec<(String, Vec<u8>)> {
    match analysis.framework {
        FrameworkId::Flutter => {
            let mut assets = sampled_tree(&root.join("assets"), "assets/flutter_assets", config);
            for (source, target) in [
                ("pubspec.yaml", "flutter_project/pubspec.yaml"),
                ("lib/main.dart", "flutter_project/lib/main.dart"),
            ] {
                if let Some(bytes) = read_asset(&root.join(source), config) {
                    assets.push((target.to_string(), bytes));
                }
            }
            assets
        }
        FrameworkId::ReactNative => read_asset(&root.join("index.js"), config)
            .map(|bytes| vec![("assets/index.android.bundle".to_string(), bytes)])
            .unwrap_or_default(),
        FrameworkId::Cordova => sampled_tree(&root.join("www"), "assets/www", config),
        _ => GENERIC_ASSETS
            .iter()
            .filter_map(|name| {
                read_asset(&root.join(name), config).map(|bytes| (format!("assets/{}", name), bytes))
            })
            .collect(),
    }
}

/// Up to `max_assets_per_dir` small files from each directory under `source`.
fn sampled_tree(source: &Path, prefix: &str, config: &PipelineConfig) -> Vec<(String, Vec<u8>)> {
    if !source.is_dir() {
        return Vec::new();
    }

    let mut by_dir: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for relative in list_files(source, &WalkConfig::default()) {
        by_dir
            .entry(parent_dir(&relative).to_string())
            .or_default()
            .push(relative);
    }

    let mut assets = Vec::new();
    for files in by_dir.values() {
        let sampled = files
            .iter()
            .filter_map(|relative| {
                read_asset(&source.join(relative), config)
                    .map(|bytes| (format!("{}/{}", prefix, relative), bytes))
            })
            .take(config.max_assets_per_dir);
        assets.extend(sampled);
    }
    assets
}

fn read_asset(path: &Path, config: &PipelineConfig) -> Option<Vec<u8>> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() || meta.len() >= config.max_asset_size {
        return None;
    }
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping unreadable asset");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{analyze_blocking, AnalyzerConfig};
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn write(dir: &Path, relative: &str, content: &[u8]) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn entry(archive: &mut ZipArchive<File>, name: &str) -> Vec<u8> {
        let mut bytes = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut bytes).unwrap();
        bytes
    }

    fn package(dir: &Path, config: &PipelineConfig) -> PackagedArtifact {
        let analysis = analyze_blocking(dir, &AnalyzerConfig::default()).unwrap();
        package_blocking(dir, &analysis, config).unwrap()
    }

    #[test]
    fn test_core_entries_have_expected_layout() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "config.xml", br#"<widget id="com.acme.todo" version="2.1.0"><name>Todo</name></widget>"#);
        write(dir.path(), "www/index.html", b"<html></html>");

        let artifact = package(dir.path(), &PipelineConfig::default());
        assert!(!artifact.fallback);
        assert!(artifact.size > 0);
        assert_eq!(artifact.path, dir.path().join(APK_RELATIVE_PATH));

        let mut archive = ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();

        let dex = entry(&mut archive, "classes.dex");
        assert_eq!(dex.len(), DEX_SIZE);
        assert_eq!(&dex[..8], b"dex\n035\0");
        assert_eq!(u32::from_le_bytes(dex[8..12].try_into().unwrap()), 0x1234_5678);

        let arsc = entry(&mut archive, "resources.arsc");
        assert_eq!(arsc.len(), ARSC_SIZE);
        assert_eq!(u32::from_le_bytes(arsc[4..8].try_into().unwrap()), 4096);

        let manifest = String::from_utf8(entry(&mut archive, "AndroidManifest.xml")).unwrap();
        assert!(manifest.contains(r#"package="com.acme.todo""#));
        assert!(manifest.contains(r#"android:minSdkVersion="22""#));
        assert!(manifest.contains("WRITE_EXTERNAL_STORAGE"));

        let rsa = entry(&mut archive, "META-INF/CERT.RSA");
        assert_eq!(rsa, vec![0x30; 256]);

        for density in ICON_DENSITIES {
            let icon = entry(&mut archive, &format!("res/mipmap-{}/ic_launcher.png", density));
            assert_eq!(&icon[1..4], b"PNG");
        }
        assert_eq!(entry(&mut archive, "assets/www/index.html"), b"<html></html>");
    }

    #[test]
    fn test_jar_manifest_digests_match_entries() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", b"<p>hi</p>");

        let artifact = package(dir.path(), &PipelineConfig::default());
        let mut archive = ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();

        let manifest = String::from_utf8(entry(&mut archive, "META-INF/MANIFEST.MF")).unwrap();
        let dex_digest = sha256_hex(&entry(&mut archive, "classes.dex"));
        assert!(manifest.contains(&format!("Name: classes.dex\nSHA-256-Digest: {}", dex_digest)));

        let sf = String::from_utf8(entry(&mut archive, "META-INF/CERT.SF")).unwrap();
        assert!(sf.contains(&sha256_hex(manifest.as_bytes())));

        assert_eq!(entry(&mut archive, "assets/index.html"), b"<p>hi</p>");
    }

    #[test]
    fn test_flutter_assets_are_sampled() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pubspec.yaml", b"name: demo\n");
        write(dir.path(), "lib/main.dart", b"void main() {}\n");
        for i in 0..4 {
            write(dir.path(), &format!("assets/images/{}.png", i), b"img");
        }
        write(dir.path(), "assets/images/huge.bin", &vec![0u8; 64]);

        let config = PipelineConfig::new().with_max_assets_per_dir(2).with_max_asset_size(32);
        let artifact = package(dir.path(), &config);
        let archive = ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();

        let sampled = names
            .iter()
            .filter(|n| n.starts_with("assets/flutter_assets/images/"))
            .count();
        assert_eq!(sampled, 2);
        assert!(!names.contains(&"assets/flutter_assets/images/huge.bin"));
        assert!(names.contains(&"flutter_project/pubspec.yaml"));
        assert!(names.contains(&"flutter_project/lib/main.dart"));
    }

    #[test]
    fn test_react_native_bundle() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", br#"{"name":"rn","dependencies":{"react-native":"0.72.0"}}"#);
        write(dir.path(), "index.js", b"AppRegistry.registerComponent();");

        let artifact = package(dir.path(), &PipelineConfig::default());
        let mut archive = ZipArchive::new(File::open(&artifact.path).unwrap()).unwrap();
        assert_eq!(
            entry(&mut archive, "assets/index.android.bundle"),
            b"AppRegistry.registerComponent();"
        );
    }

    #[test]
    fn test_fallback_keeps_readable_top_level_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", b"{}");
        write(dir.path(), "app.js", b"run()");
        let output = dir.path().join("fallback.apk");

        let entries = write_fallback(&output, dir.path()).unwrap();

        assert_eq!(entries, 2);
        let archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["app.js", "package.json"]);
    }

    #[test]
    fn test_unwritable_output_fails_after_fallback() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", b"x");
        fs::create_dir_all(dir.path().join(APK_RELATIVE_PATH)).unwrap();

        let analysis = analyze_blocking(dir.path(), &AnalyzerConfig::default()).unwrap();
        let err = package_blocking(dir.path(), &analysis, &PipelineConfig::default()).unwrap_err();

        assert!(matches!(err, PackagingError::FallbackFailed { .. }));
    }
}
