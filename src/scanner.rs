use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};

/// Result of scanning a media directory.
///
/// The background image is an explicit field rather than shared state: one
/// image backs every track composed in a run.
#[derive(Debug, Clone)]
pub struct MediaSet {
    /// Audio tracks in directory-listing order
    pub tracks: Vec<PathBuf>,

    /// First image encountered in directory-listing order, if any
    pub background: Option<PathBuf>,
}

impl MediaSet {
    /// Check whether the set has everything a run needs
    pub fn is_complete(&self) -> bool {
        !self.tracks.is_empty() && self.background.is_some()
    }
}

/// Classifies the contents of a media directory by extension.
pub struct MediaScanner {
    audio_extensions: Vec<String>,
    image_extensions: Vec<String>,
}

impl MediaScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            audio_extensions: config.audio_extensions.clone(),
            image_extensions: config.image_extensions.clone(),
        }
    }

    /// Scan a directory and classify its files.
    ///
    /// Tracks are returned in directory-listing order, which is
    /// filesystem-defined. The first image encountered wins; later images
    /// are ignored with a warning.
    pub fn scan<P: AsRef<Path>>(&self, directory: P) -> Result<MediaSet> {
        let directory = directory.as_ref();

        if !directory.exists() || !directory.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: directory.display().to_string(),
            }
            .into());
        }

        let mut tracks = Vec::new();
        let mut background: Option<PathBuf> = None;

        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();

            if !path.is_file() || Self::is_hidden_file(&path) {
                continue;
            }

            if self.is_audio_file(&path) {
                debug!("Found audio track: {:?}", path);
                tracks.push(path);
            } else if self.is_image_file(&path) {
                match background {
                    None => {
                        debug!("Found background image: {:?}", path);
                        background = Some(path);
                    }
                    Some(ref chosen) => {
                        warn!("Ignoring extra image {:?}; already using {:?}", path, chosen);
                    }
                }
            }
        }

        Ok(MediaSet { tracks, background })
    }

    fn is_audio_file(&self, path: &Path) -> bool {
        Self::extension_matches(path, &self.audio_extensions)
    }

    fn is_image_file(&self, path: &Path) -> bool {
        Self::extension_matches(path, &self.image_extensions)
    }

    fn extension_matches(path: &Path, allowed: &[String]) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                allowed.iter().any(|a| a == &ext)
            }
            None => false,
        }
    }

    fn is_hidden_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"x").unwrap();
        path
    }

    fn scanner() -> MediaScanner {
        MediaScanner::new(&ScanConfig::default())
    }

    #[test]
    fn test_classifies_audio_and_image() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "song1.mp3");
        touch(dir.path(), "song2.mp3");
        touch(dir.path(), "cover.png");
        touch(dir.path(), "notes.txt");

        let set = scanner().scan(dir.path()).unwrap();

        assert_eq!(set.tracks.len(), 2);
        assert!(set.tracks.iter().all(|t| t.extension().unwrap() == "mp3"));
        assert_eq!(
            set.background.as_ref().unwrap().file_name().unwrap(),
            "cover.png"
        );
        assert!(set.is_complete());
    }

    #[test]
    fn test_extension_matching_is_case_insensitive() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "SONG.MP3");
        touch(dir.path(), "Cover.JPG");

        let set = scanner().scan(dir.path()).unwrap();

        assert_eq!(set.tracks.len(), 1);
        assert!(set.background.is_some());
    }

    #[test]
    fn test_exactly_one_background_selected() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.png");
        touch(dir.path(), "b.jpg");
        touch(dir.path(), "song.mp3");

        let set = scanner().scan(dir.path()).unwrap();

        // One of the two images, in listing order; never both.
        let chosen = set.background.unwrap();
        let name = chosen.file_name().unwrap().to_str().unwrap();
        assert!(name == "a.png" || name == "b.jpg");
    }

    #[test]
    fn test_hidden_files_skipped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".hidden.mp3");
        touch(dir.path(), ".cover.png");
        touch(dir.path(), "song.mp3");

        let set = scanner().scan(dir.path()).unwrap();

        assert_eq!(set.tracks.len(), 1);
        assert!(set.background.is_none());
    }

    #[test]
    fn test_empty_directory_yields_empty_set() {
        let dir = tempdir().unwrap();

        let set = scanner().scan(dir.path()).unwrap();

        assert!(set.tracks.is_empty());
        assert!(set.background.is_none());
        assert!(!set.is_complete());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = scanner().scan(&missing);
        assert!(result.is_err());
    }

    #[test]
    fn test_rescan_has_no_memory() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "song1.mp3");
        touch(dir.path(), "cover.png");

        let scanner = scanner();
        let first = scanner.scan(dir.path()).unwrap();
        let second = scanner.scan(dir.path()).unwrap();

        // Nothing records past runs: the same inputs are returned again,
        // which is what makes re-running duplicate work downstream.
        assert_eq!(first.tracks, second.tracks);
        assert_eq!(first.background, second.background);
    }

    #[test]
    fn test_subdirectories_are_ignored() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested.mp3")).unwrap();
        touch(dir.path(), "song.mp3");

        let set = scanner().scan(dir.path()).unwrap();
        assert_eq!(set.tracks.len(), 1);
    }
}
