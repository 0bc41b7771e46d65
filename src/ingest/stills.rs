//! Finite image sources: single files and folders.
//!
//! A stills source enumerates its path list once at open time, filtered to
//! recognized image extensions and sorted, so the sequence is stable across
//! repeated enumerations. End-of-stream is signalled by exhausting the list,
//! not by a read failure.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use super::{SourceError, SourceKind, IMAGE_EXTENSIONS};
use crate::frame::Frame;

pub struct StillsSource {
    kind: SourceKind,
    paths: Vec<PathBuf>,
    cursor: usize,
    sequence: u64,
}

impl StillsSource {
    /// Singleton sequence for one image file.
    pub fn single(path: &Path) -> Result<Self> {
        Ok(Self {
            kind: SourceKind::Image,
            paths: vec![path.to_path_buf()],
            cursor: 0,
            sequence: 0,
        })
    }

    /// Ordered sequence of the recognized images directly inside `dir`.
    pub fn folder(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow!("failed to list image folder {}: {}", dir.display(), e))?;
        for entry in entries {
            let path = entry
                .map_err(|e| anyhow!("failed to list image folder {}: {}", dir.display(), e))?
                .path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("folder source: {} images under {}", paths.len(), dir.display());
        Ok(Self {
            kind: SourceKind::Folder,
            paths,
            cursor: 0,
            sequence: 0,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Enumerated paths, in read order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        let image = image::open(path)
            .map_err(|e| SourceError {
                kind: self.kind,
                reason: format!("failed to decode {}: {}", path.display(), e),
            })?
            .to_rgb8();
        self.cursor += 1;
        self.sequence += 1;
        Ok(Some(Frame::new(image, self.sequence)))
    }

    /// Rewind so the previously delivered image comes back next. The cursor
    /// already points one past the delivered image, hence the step of two.
    pub fn step_back(&mut self) {
        self.cursor = self.cursor.saturating_sub(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn step_back_redelivers_the_previous_image() {
        let dir = tempfile::tempdir().expect("temp image dir");
        for name in ["a.png", "b.png", "c.png"] {
            RgbImage::new(4, 4).save(dir.path().join(name)).expect("write image");
        }
        let mut source = StillsSource::folder(dir.path()).expect("open folder");

        source.next_frame().unwrap().expect("a");
        source.next_frame().unwrap().expect("b");
        source.step_back();
        // Cursor went from 2 back to 0, so "a" is delivered again.
        let frame = source.next_frame().unwrap().expect("a again");
        assert_eq!(frame.sequence, 3);
        assert_eq!(source.paths()[source.cursor - 1], dir.path().join("a.png"));
    }

    #[test]
    fn exhaustion_is_clean_not_an_error() {
        let dir = tempfile::tempdir().expect("temp image dir");
        RgbImage::new(4, 4).save(dir.path().join("only.png")).expect("write image");
        let file = dir.path().join("only.png");
        let mut source = StillsSource::single(&file).expect("open image");
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn undecodable_image_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp image dir");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").expect("write junk");
        let mut source = StillsSource::single(&path).expect("open image");
        assert!(source.next_frame().is_err());
    }
}
