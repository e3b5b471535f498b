//! Album discovery and the playback cursor.
//!
//! The library is scanned once at startup and immutable afterwards. Every
//! album holds at least one track; directories without playable files are
//! excluded at scan time, so cursor arithmetic never divides by zero.

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::log_debug;

/// Extensions the external decoder is expected to handle.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav"];

/// One directory's worth of tracks, sorted by file name.
#[derive(Debug, Clone)]
pub struct Album {
    pub dir: PathBuf,
    pub tracks: Vec<PathBuf>,
}

/// Ordered album collection.
#[derive(Debug, Clone)]
pub struct Library {
    albums: Vec<Album>,
}

impl Library {
    /// Walk `root` and group playable files by their parent directory.
    /// Unreadable entries are skipped with a log line, matching the rest of
    /// the controller's keep-running posture.
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            bail!("music directory {} does not exist", root.display());
        }
        let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log_debug(&format!("library: skipping unreadable entry: {err}"));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let playable = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !playable {
                continue;
            }
            let dir = path.parent().unwrap_or(root).to_path_buf();
            by_dir.entry(dir).or_default().push(path);
        }
        let albums = by_dir
            .into_iter()
            .map(|(dir, mut tracks)| {
                tracks.sort();
                Album { dir, tracks }
            })
            .collect();
        Self::from_albums(albums)
    }

    /// Build a library from pre-discovered albums, dropping empty ones.
    pub fn from_albums(albums: Vec<Album>) -> Result<Self> {
        let albums: Vec<Album> = albums
            .into_iter()
            .filter(|album| !album.tracks.is_empty())
            .collect();
        if albums.is_empty() {
            bail!("no playable tracks found");
        }
        Ok(Self { albums })
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn album(&self, index: usize) -> &Album {
        &self.albums[index]
    }

    pub fn track(&self, cursor: Cursor) -> &Path {
        &self.albums[cursor.album].tracks[cursor.track]
    }
}

/// Album/track position. All moves wrap, so a cursor produced by these
/// methods is always in range for the library that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub album: usize,
    pub track: usize,
}

impl Cursor {
    pub const START: Cursor = Cursor { album: 0, track: 0 };

    /// Advance one track; past the album end, roll to the next album's
    /// first track.
    pub fn next(self, library: &Library) -> Cursor {
        let album_len = library.album(self.album).tracks.len();
        if self.track + 1 < album_len {
            Cursor {
                album: self.album,
                track: self.track + 1,
            }
        } else {
            Cursor {
                album: (self.album + 1) % library.len(),
                track: 0,
            }
        }
    }

    /// Step back one track; below zero, roll to the previous album's last
    /// track.
    pub fn previous(self, library: &Library) -> Cursor {
        if self.track > 0 {
            Cursor {
                album: self.album,
                track: self.track - 1,
            }
        } else {
            let album = (self.album + library.len() - 1) % library.len();
            Cursor {
                album,
                track: library.album(album).tracks.len() - 1,
            }
        }
    }

    pub fn next_album(self, library: &Library) -> Cursor {
        Cursor {
            album: (self.album + 1) % library.len(),
            track: 0,
        }
    }

    pub fn previous_album(self, library: &Library) -> Cursor {
        Cursor {
            album: (self.album + library.len() - 1) % library.len(),
            track: 0,
        }
    }

    /// Invariant check used by tests after every mutation.
    pub fn in_range(self, library: &Library) -> bool {
        self.album < library.len() && self.track < library.album(self.album).tracks.len()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::library_with_shape;
    use super::*;
    use std::fs;

    #[test]
    fn next_rolls_over_album_boundaries() {
        // Library = [Album0: [a], Album1: [b, c]], cursor starts (0,0).
        let library = library_with_shape(&[1, 2]);
        let cursor = Cursor::START;
        let cursor = cursor.next(&library);
        assert_eq!(cursor, Cursor { album: 1, track: 0 });
        let cursor = cursor.next(&library);
        assert_eq!(cursor, Cursor { album: 1, track: 1 });
        let cursor = cursor.next(&library);
        assert_eq!(cursor, Cursor::START);
    }

    #[test]
    fn previous_rolls_back_to_last_track() {
        let library = library_with_shape(&[1, 2]);
        let cursor = Cursor::START.previous(&library);
        assert_eq!(cursor, Cursor { album: 1, track: 1 });
        let cursor = cursor.previous(&library);
        assert_eq!(cursor, Cursor { album: 1, track: 0 });
        let cursor = cursor.previous(&library);
        assert_eq!(cursor, Cursor::START);
    }

    #[test]
    fn album_moves_wrap_and_reset_track() {
        let library = library_with_shape(&[3, 2, 4]);
        let cursor = Cursor { album: 2, track: 3 };
        assert_eq!(cursor.next_album(&library), Cursor::START);
        assert_eq!(
            Cursor::START.previous_album(&library),
            Cursor { album: 2, track: 0 }
        );
    }

    #[test]
    fn cursor_stays_in_range_under_any_move_sequence() {
        let library = library_with_shape(&[1, 3, 2, 5]);
        let mut cursor = Cursor::START;
        for step in 0..500 {
            cursor = match step % 5 {
                0 | 3 => cursor.next(&library),
                1 => cursor.previous(&library),
                2 => cursor.next_album(&library),
                _ => cursor.previous_album(&library),
            };
            assert!(cursor.in_range(&library), "out of range at step {step}");
        }
    }

    #[test]
    fn empty_albums_are_excluded() {
        let albums = vec![
            Album {
                dir: PathBuf::from("empty"),
                tracks: vec![],
            },
            Album {
                dir: PathBuf::from("full"),
                tracks: vec![PathBuf::from("full/a.mp3")],
            },
        ];
        let library = Library::from_albums(albums).expect("one album survives");
        assert_eq!(library.len(), 1);
        assert_eq!(library.album(0).dir, PathBuf::from("full"));
    }

    #[test]
    fn all_empty_library_is_an_error() {
        assert!(Library::from_albums(vec![]).is_err());
    }

    #[test]
    fn scan_groups_by_directory_and_sorts() {
        let root = tempfile::tempdir().expect("tempdir");
        let a = root.path().join("a");
        let b = root.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::create_dir_all(root.path().join("artwork")).unwrap();
        fs::write(a.join("02.mp3"), b"x").unwrap();
        fs::write(a.join("01.mp3"), b"x").unwrap();
        fs::write(a.join("cover.jpg"), b"x").unwrap();
        fs::write(b.join("01.FLAC"), b"x").unwrap();
        fs::write(root.path().join("artwork").join("note.txt"), b"x").unwrap();

        let library = Library::scan(root.path()).expect("scan");
        assert_eq!(library.len(), 2);
        assert_eq!(library.album(0).tracks.len(), 2);
        assert!(library.album(0).tracks[0].ends_with("01.mp3"));
        assert!(library.album(1).tracks[0].ends_with("01.FLAC"));
    }

    #[test]
    fn scan_of_missing_directory_fails() {
        assert!(Library::scan(Path::new("/definitely/not/here")).is_err());
    }
}
