use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A normalized, case-insensitive filename suffix such as `.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter(String);

impl ExtensionFilter {
    /// Normalizes a user-supplied extension: trims it, adds a leading dot and
    /// lowercases it. Returns `None` when nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut normalized = String::with_capacity(trimmed.len() + 1);
        if !trimmed.starts_with('.') {
            normalized.push('.');
        }
        normalized.push_str(trimmed);
        Some(Self(normalized.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against the end of the file name, so `.tar.gz` works too.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase().ends_with(&self.0))
            .unwrap_or(false)
    }
}

/// What the user asked to process.
#[derive(Debug, Clone)]
pub enum SourceDescriptor {
    File(PathBuf),
    Directory {
        root: PathBuf,
        extension: Option<ExtensionFilter>,
    },
}

impl SourceDescriptor {
    /// Picks a directory descriptor when `path` is a directory and a file
    /// descriptor otherwise.
    pub fn for_path(path: impl Into<PathBuf>, extension: Option<&str>) -> Self {
        let path = path.into();
        if path.is_dir() {
            SourceDescriptor::Directory {
                root: path,
                extension: extension.and_then(ExtensionFilter::new),
            }
        } else {
            SourceDescriptor::File(path)
        }
    }
}

/// How directories are walked.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Honour `.gitignore`/`.ignore` files and skip hidden entries.
    pub respect_ignore: bool,
}

/// Resolves a descriptor into the files to visit, in traversal order.
///
/// Traversal errors only cut off the affected subtree.
pub fn enumerate(descriptor: &SourceDescriptor, options: WalkOptions) -> Vec<PathBuf> {
    match descriptor {
        SourceDescriptor::File(path) => {
            if path.is_file() {
                vec![path.clone()]
            } else {
                Vec::new()
            }
        }
        SourceDescriptor::Directory { root, extension } => {
            let keep = |path: &Path| extension.as_ref().map(|ext| ext.matches(path)).unwrap_or(true);
            if options.respect_ignore {
                walk_ignore_aware(root, keep)
            } else {
                walk_all(root, keep)
            }
        }
    }
}

fn walk_all(root: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable part of the tree");
                continue;
            }
        };
        if entry.file_type().is_file() && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files
}

fn walk_ignore_aware(root: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut walker = WalkBuilder::new(root);
    walker.standard_filters(true).follow_links(false);

    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable part of the tree");
                continue;
            }
        };
        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
        if is_file && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files
}
