//! Copy specification models and top-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopySymlinkStrategy {
    /// Follow the link: copy target bytes, descend into target directories.
    #[default]
    Dereference,
    /// Recreate the symbolic link at destination (do not copy target bytes).
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// Pattern matching mode for exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// How a `copy_tree` run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyStatus {
    /// Whole source tree was walked and copied.
    #[default]
    Completed,
    /// Source root did not exist; nothing was touched.
    SourceMissing,
}

impl fmt::Display for EnumCopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::SourceMissing => write!(f, "source_missing"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `copy_tree`.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Exclude patterns applied to file basename.
    pub patterns_exclude_files: Option<Vec<String>>,
    /// Exclude patterns applied to directory basename.
    pub patterns_exclude_dirs: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumCopyPatternMode,
    /// Symlink handling behavior.
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Copy extended attributes along with times and permissions (Linux only).
    pub if_preserve_xattrs: bool,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            patterns_exclude_files: None,
            patterns_exclude_dirs: None,
            rule_pattern: EnumCopyPatternMode::Glob,
            rule_symlink: EnumCopySymlinkStrategy::Dereference,
            if_preserve_xattrs: true,
        }
    }
}

/// One copied file, in the order it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopiedFile {
    /// File read from the source tree.
    pub path_src: PathBuf,
    /// File written in the destination tree.
    pub path_dst: PathBuf,
}

impl fmt::Display for SpecCopiedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Copied {} -> {}",
            self.path_src.display(),
            self.path_dst.display()
        )
    }
}

/// Errors that stop a `copy_tree` run.
///
/// Validation variants are raised before anything is written. `CopyFailed`,
/// `Io` and a blocked mirrored subdirectory can be raised mid-walk, in which
/// case the destination is left partially updated.
#[derive(Debug)]
pub enum CopyTreeError {
    /// Invalid exclude pattern.
    InvalidPattern(String),
    /// Source path exists but is not a directory.
    SourceNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    SourceDestinationOverlap {
        /// Normalized source directory.
        source: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// Destination (root or mirrored subdirectory) exists but is not a directory.
    DestinationNotDirectory(PathBuf),
    /// File copy (bytes or metadata) failed.
    CopyFailed {
        /// File being read.
        path_src: PathBuf,
        /// File being written.
        path_dst: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Filesystem failure on one path.
    Io {
        /// Path the failing operation was applied to.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl CopyTreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for CopyTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(msg) => write!(f, "{msg}"),
            Self::SourceNotDirectory(path) => {
                write!(f, "Source is not a directory: {}", path.display())
            }
            Self::SourceDestinationOverlap {
                source,
                destination,
            } => write!(
                f,
                "Source and destination directories overlap: {} <-> {}",
                source.display(),
                destination.display()
            ),
            Self::DestinationNotDirectory(path) => {
                write!(
                    f,
                    "Destination exists but is not a directory: {}",
                    path.display()
                )
            }
            Self::CopyFailed {
                path_src,
                path_dst,
                source,
            } => write!(
                f,
                "Failed to copy {} -> {}: {source}",
                path_src.display(),
                path_dst.display()
            ),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for CopyTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CopyFailed { source, .. } | Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
