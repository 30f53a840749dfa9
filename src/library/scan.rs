use std::path::Path;
use std::time::Duration;

use lofty::{AudioFile, ItemKey, TaggedFileExt};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::LibrarySettings;

use super::model::{LibraryEntry, make_display};

/// Configured extensions, lower-cased and without the leading dot.
struct Extensions(Vec<String>);

impl Extensions {
    fn new(settings: &LibrarySettings) -> Self {
        Self(
            settings
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            return false;
        };
        self.0.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Default)]
struct Tags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration: Option<Duration>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Tags and length from the file header. Unreadable files get no tags.
fn read_tags(path: &Path) -> Tags {
    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags");
            return Tags::default();
        }
    };

    let mut tags = Tags {
        duration: Some(tagged.properties().duration()),
        ..Tags::default()
    };
    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        let get = |key: ItemKey| tag.get_string(&key).and_then(non_blank);
        tags.title = get(ItemKey::TrackTitle);
        tags.artist = get(ItemKey::TrackArtist);
        tags.album = get(ItemKey::AlbumTitle);
    }
    tags
}

fn library_entry(path: &Path) -> LibraryEntry {
    let tags = read_tags(path);
    let title = tags.title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string()
    });
    let display = make_display(&title, tags.artist.as_deref());

    LibraryEntry {
        path: path.to_path_buf(),
        title,
        artist: tags.artist,
        album: tags.album,
        duration: tags.duration,
        display,
    }
}

fn walker(dir: &Path, settings: &LibrarySettings) -> WalkDir {
    let walker = WalkDir::new(dir).follow_links(settings.follow_links);
    // Non-recursive = only the root directory.
    match (settings.recursive, settings.max_depth) {
        (false, _) => walker.max_depth(1),
        (true, Some(depth)) => walker.max_depth(depth),
        (true, None) => walker,
    }
}

/// Walk `dir` for audio files and read their tags. Files are not decoded here.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<LibraryEntry> {
    let extensions = Extensions::new(settings);

    let mut entries: Vec<LibraryEntry> = walker(dir, settings)
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(error = %err, "skipping unreadable path");
                None
            }
        })
        .filter(|e| e.path().is_file() && extensions.matches(e.path()))
        .map(|e| library_entry(e.path()))
        .collect();

    entries.sort_by_cached_key(|e| e.display.to_lowercase());
    debug!(dir = %dir.display(), found = entries.len(), "library scan finished");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn default_extensions_ignore_case() {
        let exts = Extensions::new(&LibrarySettings::default());
        for name in ["a.mp3", "a.MP3", "a.flac", "a.wav", "a.Ogg"] {
            assert!(exts.matches(Path::new(name)), "{name}");
        }
        assert!(!exts.matches(Path::new("a.txt")));
        assert!(!exts.matches(Path::new("a")));
    }

    #[test]
    fn configured_extensions_tolerate_dots_and_blanks() {
        let exts = Extensions::new(&LibrarySettings {
            extensions: vec![".WAV".into(), " ".into()],
            ..LibrarySettings::default()
        });
        assert!(exts.matches(Path::new("/tmp/a.wav")));
        assert!(!exts.matches(Path::new("/tmp/a.mp3")));
    }

    #[test]
    fn untagged_files_fall_back_to_the_file_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Night Drive.mp3");
        fs::write(&path, b"no header here").unwrap();

        let entry = library_entry(&path);
        assert_eq!(entry.title, "Night Drive");
        assert_eq!(entry.display, "Night Drive");
        assert!(entry.artist.is_none());
        assert!(entry.duration.is_none());
    }

    #[test]
    fn scan_filters_non_audio_and_sorts_by_display_case_insensitive() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
        fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
        fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

        let entries = scan(dir.path(), &LibrarySettings::default());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "A");
        assert_eq!(entries[0].display, "A");
        assert_eq!(entries[1].title, "b");
        assert_eq!(entries[1].display, "b");
    }

    #[test]
    fn scan_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let entries = scan(dir.path(), &settings);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display, "visible");
    }

    #[test]
    fn scan_respects_recursive_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("child.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            recursive: false,
            ..LibrarySettings::default()
        };
        let entries = scan(dir.path(), &settings);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display, "root");
    }

    #[test]
    fn scan_respects_max_depth() {
        let dir = tempdir().unwrap();
        let d1 = dir.path().join("d1");
        let d2 = d1.join("d2");
        fs::create_dir_all(&d2).unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        fs::write(d1.join("one.mp3"), b"not real").unwrap();
        fs::write(d2.join("two.mp3"), b"not real").unwrap();

        // WalkDir depth counts root as 0, children as 1, grandchildren as 2.
        let settings = LibrarySettings {
            max_depth: Some(2),
            ..LibrarySettings::default()
        };
        let entries = scan(dir.path(), &settings);

        let names: Vec<String> = entries.iter().map(|t| t.display.clone()).collect();
        assert!(names.contains(&"root".to_string()));
        assert!(names.contains(&"one".to_string()));
        assert!(!names.contains(&"two".to_string()));
    }
}
