//! Image archive packager

use super::pipeline::ExportEntry;
use super::PackageError;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a ZIP archive holding every captured image under its entry name
///
/// A name that is already taken gets a ` (n)` suffix before its extension.
pub fn build_archive(entries: &[ExportEntry]) -> Result<Vec<u8>, PackageError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    // Images are already compressed
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut used = HashSet::new();

    for entry in entries {
        let name = unique_name(&entry.name, &used);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&entry.image.bytes)?;
        used.insert(name);
    }

    Ok(zip.finish()?.into_inner())
}

fn unique_name(name: &str, used: &HashSet<String>) -> String {
    if !used.contains(name) {
        return name.to_string();
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) => (stem, format!(".{}", extension)),
        None => (name, String::new()),
    };
    let mut number = 2;
    loop {
        let candidate = format!("{} ({}){}", stem, number, extension);
        if !used.contains(&candidate) {
            return candidate;
        }
        number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::surface::CapturedImage;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_archive_contains_entries() {
        let entries = vec![
            ExportEntry {
                title: Some("Intro".to_string()),
                name: "1_1.jpeg".to_string(),
                image: CapturedImage {
                    bytes: vec![1, 2, 3],
                    extension: "jpeg".to_string(),
                },
            },
            ExportEntry {
                title: None,
                name: "1_2.jpeg".to_string(),
                image: CapturedImage {
                    bytes: vec![4, 5],
                    extension: "jpeg".to_string(),
                },
            },
        ];

        let bytes = build_archive(&entries).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = Vec::new();
        archive
            .by_name("1_2.jpeg")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, [4, 5]);
    }

    #[test]
    fn test_colliding_names_are_numbered() {
        let entry = |name: &str, byte: u8| ExportEntry {
            title: None,
            name: name.to_string(),
            image: CapturedImage {
                bytes: vec![byte],
                extension: "jpeg".to_string(),
            },
        };
        let entries = vec![
            entry("2_1.jpeg", 1),
            entry("2_1.jpeg", 2),
            entry("2_1.jpeg", 3),
            entry("notes", 4),
            entry("notes", 5),
        ];

        let bytes = build_archive(&entries).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 5);

        for (name, expected) in [
            ("2_1.jpeg", 1u8),
            ("2_1 (2).jpeg", 2),
            ("2_1 (3).jpeg", 3),
            ("notes", 4),
            ("notes (2)", 5),
        ] {
            let mut content = Vec::new();
            archive
                .by_name(name)
                .unwrap()
                .read_to_end(&mut content)
                .unwrap();
            assert_eq!(content, [expected], "{}", name);
        }
    }
}
