//! Delivery of finished export files

use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Receives the packaged file
pub trait Delivery {
    /// Hand the file over to the user
    fn offer_download(&mut self, bytes: Vec<u8>, filename: &str) -> std::io::Result<()>;
}

/// Delivery that writes files into a directory
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    directory: PathBuf,
    delivered: Vec<PathBuf>,
}

impl DirectoryDelivery {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            delivered: Vec::new(),
        }
    }

    /// Paths written so far
    pub fn delivered(&self) -> &[PathBuf] {
        &self.delivered
    }
}

impl Delivery for DirectoryDelivery {
    fn offer_download(&mut self, bytes: Vec<u8>, filename: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(filename);
        fs::write(&path, bytes)?;

        log::info!("Wrote {}", path.display());
        self.delivered.push(path);
        Ok(())
    }
}

/// `<prefix>-<millis>.<extension>`
pub fn export_filename(prefix: &str, extension: &str, timestamp_millis: u128) -> String {
    format!("{}-{}.{}", prefix, timestamp_millis, extension)
}

/// Milliseconds since the Unix epoch
pub fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or_default()
}

/// Replace characters that are unsafe in file names and lowercase the rest
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Option<Regex>> = OnceLock::new();

    let lowered = name.to_lowercase();
    match UNSAFE.get_or_init(|| Regex::new(r#"[/\\?%*:|"<>]"#).ok()) {
        Some(regex) => regex.replace_all(&lowered, "-").into_owned(),
        None => lowered,
    }
}
