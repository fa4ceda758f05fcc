use super::FileStoreError;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Local file header magic shared by every ZIP archive.
pub const ZIP_MAGIC: [u8; 2] = [0x50, 0x4B];

pub fn has_zip_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[..2] == ZIP_MAGIC
}

/// Extracts `archive` into `dest`, overwriting existing files.
///
/// Entries whose names would escape `dest` are skipped. Returns the number
/// of files written.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<usize, FileStoreError> {
    let file = File::open(archive).map_err(|e| FileStoreError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| FileStoreError::CorruptArchive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;

    fs::create_dir_all(dest).map_err(|e| FileStoreError::io(dest, e))?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| FileStoreError::CorruptArchive {
                path: archive.to_path_buf(),
                reason: e.to_string(),
            })?;

        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "Skipping archive entry with unsafe path");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| FileStoreError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| FileStoreError::io(parent, e))?;
        }

        let mut out = File::create(&target).map_err(|e| FileStoreError::io(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                FileStoreError::CorruptArchive {
                    path: archive.to_path_buf(),
                    reason: e.to_string(),
                }
            }
            _ => FileStoreError::io(&target, e),
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // Keeps wrapper scripts such as gradlew executable.
            let _ = fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777));
        }

        written += 1;
    }

    debug!(
        archive = %archive.display(),
        dest = %dest.display(),
        files = written,
        "Archive extracted"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_magic_bytes() {
        assert!(has_zip_magic(b"PK\x03\x04"));
        assert!(!has_zip_magic(b"hello"));
        assert!(!has_zip_magic(b"P"));
        assert!(!has_zip_magic(b""));
    }

    #[test]
    fn test_extracts_nested_entries() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("app.zip");
        build_zip(
            &archive,
            &[("pubspec.yaml", "name: demo\n"), ("lib/main.dart", "void main() {}")],
        );

        let dest = dir.path().join("out");
        let count = extract_zip(&archive, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(dest.join("lib/main.dart")).unwrap(),
            "void main() {}"
        );
    }

    #[test]
    fn test_overwrites_existing_files() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("app.zip");
        build_zip(&archive, &[("README.md", "new")]);

        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("README.md"), "old contents").unwrap();

        extract_zip(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("README.md")).unwrap(), "new");
    }

    #[test]
    fn test_skips_escaping_entries() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        build_zip(&archive, &[("../escape.txt", "x"), ("ok.txt", "y")]);

        let dest = dir.path().join("out");
        let count = extract_zip(&archive, &dest).unwrap();

        assert_eq!(count, 1);
        assert!(!dir.path().join("escape.txt").exists());
        assert!(dest.join("ok.txt").exists());
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"PK\x03\x04not really a zip").unwrap();

        let err = extract_zip(&archive, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, FileStoreError::CorruptArchive { .. }));
    }
}
