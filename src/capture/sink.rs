//! Saves finalized recordings to a directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{EncodedMedia, MediaSink};

/// Writes recordings under a fixed output directory
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// First path for `filename` that does not exist yet
    async fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.directory.join(filename);
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (filename, None),
        };
        let mut n = 1;
        loop {
            let name = match ext {
                Some(ext) => format!("{}-{}.{}", stem, n, ext),
                None => format!("{}-{}", stem, n),
            };
            let path = self.directory.join(name);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return path;
            }
            n += 1;
        }
    }
}

impl MediaSink for FileSink {
    async fn save(&mut self, media: &EncodedMedia, suggested_filename: &str) -> Result<PathBuf> {
        // Never let a suggested name escape the output directory
        let filename = Path::new(suggested_filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .with_context(|| format!("Invalid recording filename: {:?}", suggested_filename))?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .with_context(|| format!("Failed to create output directory: {:?}", self.directory))?;

        let path = self.free_path(filename).await;
        tokio::fs::write(&path, &media.data)
            .await
            .with_context(|| format!("Failed to write recording: {:?}", path))?;

        info!("Saved recording to {:?} ({} bytes)", path, media.data.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(data: &[u8]) -> EncodedMedia {
        EncodedMedia {
            mime_type: "application/octet-stream".into(),
            extension: "bin".into(),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("recordings"));

        let path = sink.save(&media(b"abc"), "clip.bin").await.unwrap();
        assert_eq!(path, dir.path().join("recordings").join("clip.bin"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());

        let first = sink.save(&media(b"1"), "clip.bin").await.unwrap();
        let second = sink.save(&media(b"2"), "clip.bin").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "clip-1.bin");
        assert_eq!(std::fs::read(&first).unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_path_components_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path());

        let path = sink.save(&media(b"x"), "../../escape.bin").await.unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        assert!(sink.save(&media(b"x"), "..").await.is_err());
    }
}
