use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};

/// One filesystem object surfaced by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: u64,
}

/// Result of listing a directory.
///
/// `path` is the directory actually listed. When the requested path turned
/// out to be a file, it is that file's parent and `files` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub path: PathBuf,
    pub files: Vec<Entry>,
}

/// Whole text content of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub content: String,
}

/// What to do with a child that cannot be stat'd (broken symlink,
/// permission denied, removed mid-listing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatFailurePolicy {
    /// Drop the child from the listing.
    #[default]
    Skip,
    /// Abort the whole listing with the stat error.
    Fail,
}

impl FromStr for StatFailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(StatFailurePolicy::Skip),
            "fail" => Ok(StatFailurePolicy::Fail),
            other => Err(AppError::Config(format!(
                "unknown stat error policy {other:?} (expected \"skip\" or \"fail\")"
            ))),
        }
    }
}

impl StatFailurePolicy {
    fn apply(self, path: &Path, err: std::io::Error) -> Result<()> {
        match self {
            StatFailurePolicy::Skip => {
                debug!(path = %path.display(), error = %err, "skipping entry that cannot be stat'd");
                Ok(())
            }
            StatFailurePolicy::Fail => Err(AppError::Io(err)),
        }
    }
}

/// Which children a listing keeps. Directories are never dropped by
/// extension.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    /// Lowercase extensions without the dot. Empty keeps every file.
    pub extensions: Vec<String>,
    pub show_hidden: bool,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            show_hidden: true,
        }
    }
}

impl EntryFilter {
    pub fn new(extensions: &[String], show_hidden: bool) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            show_hidden,
        }
    }

    pub fn allows(&self, name: &str, is_directory: bool) -> bool {
        if !self.show_hidden && name.starts_with('.') {
            return false;
        }
        if is_directory || self.extensions.is_empty() {
            return true;
        }
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match ext {
            Some(ext) => self.extensions.iter().any(|allowed| *allowed == ext),
            None => false,
        }
    }
}

/// Sort entries in place: directories first, then most recently modified
/// first. The sort is stable, so ties keep enumeration order.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| b.mtime.cmp(&a.mtime))
    });
}

/// The most recently modified non-directory entry of a sorted listing.
pub fn newest_file(entries: &[Entry]) -> Option<&Entry> {
    entries.iter().find(|e| !e.is_directory)
}

fn mtime_millis(metadata: &fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn stat(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(path.to_path_buf())
        } else {
            AppError::Io(e)
        }
    })
}

/// Directory listing and file reads rooted at a default directory.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    root: PathBuf,
    filter: EntryFilter,
    stat_policy: StatFailurePolicy,
    max_read_bytes: Option<u64>,
}

impl DirectoryService {
    /// Create a service whose default (and relative-path base) is `root`.
    pub fn new(root: &Path) -> Result<Self> {
        let root = root.canonicalize().map_err(|_| {
            AppError::InvalidPath(format!("{} does not exist", root.display()))
        })?;
        Ok(Self {
            root,
            filter: EntryFilter::default(),
            stat_policy: StatFailurePolicy::default(),
            max_read_bytes: None,
        })
    }

    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_stat_policy(mut self, policy: StatFailurePolicy) -> Self {
        self.stat_policy = policy;
        self
    }

    pub fn with_max_read_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_read_bytes = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path: absent means the root, relative paths are
    /// joined onto the root.
    pub fn resolve(&self, path: Option<&Path>) -> PathBuf {
        match path {
            None => self.root.clone(),
            Some(p) if p.as_os_str().is_empty() => self.root.clone(),
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => self.root.join(p),
        }
    }

    /// List the direct children of a directory.
    pub fn list(&self, path: Option<&Path>) -> Result<Listing> {
        let target = self.resolve(path);
        let metadata = stat(&target)?;
        let resolved = target.canonicalize()?;

        if !metadata.is_dir() {
            let parent = resolved
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| resolved.clone());
            return Ok(Listing {
                path: parent,
                files: Vec::new(),
            });
        }

        let mut files = Vec::new();
        for dirent in fs::read_dir(&resolved)? {
            let dirent = match dirent {
                Ok(d) => d,
                Err(e) => {
                    self.stat_policy.apply(&resolved, e)?;
                    continue;
                }
            };
            let child = dirent.path();
            let child_meta = match fs::metadata(&child) {
                Ok(m) => m,
                Err(e) => {
                    self.stat_policy.apply(&child, e)?;
                    continue;
                }
            };

            let name = dirent.file_name().to_string_lossy().into_owned();
            let is_directory = child_meta.is_dir();
            if !self.filter.allows(&name, is_directory) {
                continue;
            }

            files.push(Entry {
                name,
                path: child,
                is_directory,
                mtime: mtime_millis(&child_meta),
            });
        }

        sort_entries(&mut files);
        Ok(Listing {
            path: resolved,
            files,
        })
    }

    /// Read a file's whole content as text. Invalid UTF-8 is replaced.
    pub fn read(&self, path: &Path) -> Result<FileContent> {
        let target = self.resolve(Some(path));
        let metadata = stat(&target)?;
        if metadata.is_dir() {
            return Err(AppError::NotAFile(target));
        }
        if let Some(limit) = self.max_read_bytes {
            if metadata.len() > limit {
                return Err(AppError::TooLarge {
                    path: target,
                    size: metadata.len(),
                    limit,
                });
            }
        }

        let bytes = fs::read(&target)?;
        let content = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(FileContent { content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn touch(path: &Path, secs: u64) {
        if !path.exists() {
            File::create(path).unwrap();
        }
        File::open(path).unwrap().set_modified(at(secs)).unwrap();
    }

    fn names(listing: &Listing) -> Vec<&str> {
        listing.files.iter().map(|e| e.name.as_str()).collect()
    }

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("d1")).unwrap();
        touch(&dir.path().join("f1"), 10);
        touch(&dir.path().join("f2"), 20);
        dir
    }

    #[test]
    fn directories_first_then_newest_file() {
        let dir = setup_test_dir();
        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(None).unwrap();
        assert_eq!(names(&listing), vec!["d1", "f2", "f1"]);
    }

    #[test]
    fn directories_sorted_by_mtime_too() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("old")).unwrap();
        fs::create_dir(dir.path().join("new")).unwrap();
        touch(&dir.path().join("old"), 100);
        touch(&dir.path().join("new"), 200);
        touch(&dir.path().join("file"), 300);

        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(None).unwrap();
        assert_eq!(names(&listing), vec!["new", "old", "file"]);
    }

    #[test]
    fn entries_carry_absolute_paths_and_mtime() {
        let dir = setup_test_dir();
        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(None).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(listing.path, root);
        let f2 = &listing.files[1];
        assert_eq!(f2.path, root.join("f2"));
        assert!(!f2.is_directory);
        assert_eq!(f2.mtime, 20_000);
        assert!(listing.files[0].is_directory);
    }

    #[test]
    fn listing_is_not_recursive() {
        let dir = setup_test_dir();
        File::create(dir.path().join("d1").join("inner.txt")).unwrap();
        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(None).unwrap();
        assert_eq!(listing.files.len(), 3);
    }

    #[test]
    fn list_on_file_returns_parent_and_no_entries() {
        let dir = setup_test_dir();
        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(Some(&dir.path().join("f1"))).unwrap();
        assert_eq!(listing.path, dir.path().canonicalize().unwrap());
        assert!(listing.files.is_empty());
    }

    #[test]
    fn list_missing_path_is_not_found() {
        let dir = setup_test_dir();
        let service = DirectoryService::new(dir.path()).unwrap();
        let err = service.list(Some(Path::new("missing"))).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let dir = setup_test_dir();
        touch(&dir.path().join("d1").join("inner.json"), 5);
        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(Some(Path::new("d1"))).unwrap();
        assert_eq!(names(&listing), vec!["inner.json"]);
    }

    #[test]
    fn broken_symlink_is_skipped_by_default() {
        let dir = setup_test_dir();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("dangling"))
            .unwrap();
        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(None).unwrap();
        assert_eq!(names(&listing), vec!["d1", "f2", "f1"]);
    }

    #[test]
    fn broken_symlink_fails_listing_under_fail_policy() {
        let dir = setup_test_dir();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("dangling"))
            .unwrap();
        let service = DirectoryService::new(dir.path())
            .unwrap()
            .with_stat_policy(StatFailurePolicy::Fail);
        assert!(service.list(None).is_err());
    }

    #[test]
    fn extension_filter_keeps_directories() {
        let dir = setup_test_dir();
        touch(&dir.path().join("report_2024.json"), 30);
        touch(&dir.path().join("notes.TXT"), 40);
        let service = DirectoryService::new(dir.path())
            .unwrap()
            .with_filter(EntryFilter::new(&[".json".to_string()], true));
        let listing = service.list(None).unwrap();
        assert_eq!(names(&listing), vec!["d1", "report_2024.json"]);
    }

    #[test]
    fn hidden_entries_filtered_when_disabled() {
        let dir = setup_test_dir();
        touch(&dir.path().join(".hidden"), 50);
        let shown = DirectoryService::new(dir.path()).unwrap();
        assert_eq!(shown.list(None).unwrap().files.len(), 4);

        let hidden = DirectoryService::new(dir.path())
            .unwrap()
            .with_filter(EntryFilter::new(&[], false));
        assert_eq!(names(&hidden.list(None).unwrap()), vec!["d1", "f2", "f1"]);
    }

    #[test]
    fn sort_is_stable_on_equal_mtime() {
        let mut entries = vec![
            Entry {
                name: "b".into(),
                path: PathBuf::from("/b"),
                is_directory: false,
                mtime: 7,
            },
            Entry {
                name: "a".into(),
                path: PathBuf::from("/a"),
                is_directory: false,
                mtime: 7,
            },
            Entry {
                name: "dir".into(),
                path: PathBuf::from("/dir"),
                is_directory: true,
                mtime: 1,
            },
        ];
        sort_entries(&mut entries);
        let order: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["dir", "b", "a"]);
    }

    #[test]
    fn newest_file_skips_directories() {
        let dir = setup_test_dir();
        let service = DirectoryService::new(dir.path()).unwrap();
        let listing = service.list(None).unwrap();
        assert_eq!(newest_file(&listing.files).unwrap().name, "f2");
        assert!(newest_file(&listing.files[..1]).is_none());
    }

    #[test]
    fn read_returns_whole_content() {
        let dir = setup_test_dir();
        fs::write(dir.path().join("report_2024.json"), "{\"ok\":true}").unwrap();
        let service = DirectoryService::new(dir.path()).unwrap();
        let file = service.read(Path::new("report_2024.json")).unwrap();
        assert_eq!(file.content, "{\"ok\":true}");
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = setup_test_dir();
        let service = DirectoryService::new(dir.path()).unwrap();
        let err = service.read(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn read_directory_is_not_a_file() {
        let dir = setup_test_dir();
        let service = DirectoryService::new(dir.path()).unwrap();
        let err = service.read(Path::new("d1")).unwrap_err();
        assert!(matches!(err, AppError::NotAFile(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn read_replaces_invalid_utf8() {
        let dir = setup_test_dir();
        fs::write(dir.path().join("bin"), [b'o', b'k', 0xff]).unwrap();
        let service = DirectoryService::new(dir.path()).unwrap();
        let file = service.read(Path::new("bin")).unwrap();
        assert_eq!(file.content, "ok\u{fffd}");
    }

    #[test]
    fn read_respects_size_limit() {
        let dir = setup_test_dir();
        fs::write(dir.path().join("big"), "0123456789").unwrap();
        let service = DirectoryService::new(dir.path())
            .unwrap()
            .with_max_read_bytes(Some(4));
        let err = service.read(Path::new("big")).unwrap_err();
        assert!(matches!(err, AppError::TooLarge { size: 10, limit: 4, .. }));
    }

    #[test]
    fn entry_serializes_camel_case() {
        let entry = Entry {
            name: "a.json".into(),
            path: PathBuf::from("/x/a.json"),
            is_directory: false,
            mtime: 42,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "a.json",
                "path": "/x/a.json",
                "isDirectory": false,
                "mtime": 42
            })
        );
    }

    #[test]
    fn stat_policy_from_str() {
        assert_eq!("fail".parse::<StatFailurePolicy>().unwrap(), StatFailurePolicy::Fail);
        assert_eq!(" Skip ".parse::<StatFailurePolicy>().unwrap(), StatFailurePolicy::Skip);
        assert!(matches!(
            "fial".parse::<StatFailurePolicy>(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn new_rejects_missing_root() {
        let err = DirectoryService::new(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
    }
}
