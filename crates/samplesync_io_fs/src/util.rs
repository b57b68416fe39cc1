use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{CopyTreeError, EnumCopyPatternMode};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeCopyPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeCopyPatternSeq {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecCopyPatterns {
    pub(crate) patterns_exclude_files: Option<TypeCopyPatternSeq>,
    pub(crate) patterns_exclude_dirs: Option<TypeCopyPatternSeq>,
}

impl SpecCopyPatterns {
    pub(crate) fn from_raw(
        patterns_exclude_files: Option<&[String]>,
        patterns_exclude_dirs: Option<&[String]>,
        rule_pattern: EnumCopyPatternMode,
    ) -> Result<Self, CopyTreeError> {
        Ok(Self {
            patterns_exclude_files: _compile(patterns_exclude_files, rule_pattern)?,
            patterns_exclude_dirs: _compile(patterns_exclude_dirs, rule_pattern)?,
        })
    }

    pub(crate) fn should_exclude_file(&self, name: &str) -> bool {
        _should_exclude(name, self.patterns_exclude_files.as_ref())
    }

    pub(crate) fn should_exclude_dir(&self, name: &str) -> bool {
        _should_exclude(name, self.patterns_exclude_dirs.as_ref())
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumCopyPatternMode,
) -> Result<Option<TypeCopyPatternSeq>, CopyTreeError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumCopyPatternMode::Literal => Ok(Some(TypeCopyPatternSeq::Literal(patterns.to_vec()))),
        EnumCopyPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| {
                        CopyTreeError::InvalidPattern(format!("Invalid exclude pattern: {e}"))
                    })?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypeCopyPatternSeq::Glob(l_glob)))
        }
        EnumCopyPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| {
                    CopyTreeError::InvalidPattern(format!("Invalid exclude pattern: {e}"))
                })?;
                l_regex.push(regex);
            }
            Ok(Some(TypeCopyPatternSeq::Regex(l_regex)))
        }
    }
}

fn _should_exclude(value: &str, patterns: Option<&TypeCopyPatternSeq>) -> bool {
    patterns.is_some_and(|p| p.is_match(value))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Canonicalize the longest existing ancestor, then re-append the missing tail.
fn _normalize_path(path: &Path) -> PathBuf {
    let path_abs = _absolutize_path(path);
    let mut path_existing = path_abs.as_path();
    let mut l_tail = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_existing) {
            let mut path_out = resolved;
            for part in l_tail.iter().rev() {
                path_out.push(part);
            }
            return path_out;
        }
        match (path_existing.parent(), path_existing.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_existing = parent;
            }
            _ => return path_abs,
        }
    }
}

pub(crate) fn normalize_pair(src: &Path, dst: &Path) -> (PathBuf, PathBuf) {
    (_normalize_path(src), _normalize_path(dst))
}

pub(crate) fn is_overlap(src_resolved: &Path, dst_resolved: &Path) -> bool {
    dst_resolved.starts_with(src_resolved) || src_resolved.starts_with(dst_resolved)
}

/// Map a directory under `path_dir_src_root` onto `path_dir_dst_root`.
///
/// The source root itself maps to the destination root, never to `dst/.`.
///
/// ```ignore
/// let path_dst = derive_destination_path(
///     Path::new("/work/BRT_Example/Scripts"),
///     Path::new("/work/BRT_Example"),
///     Path::new("/pkg/Samples~/BRT_Example"),
/// );
/// assert_eq!(path_dst, Path::new("/pkg/Samples~/BRT_Example/Scripts"));
/// ```
pub(crate) fn derive_destination_path(
    path_src: &Path,
    path_dir_src_root: &Path,
    path_dir_dst_root: &Path,
) -> PathBuf {
    match path_src.strip_prefix(path_dir_src_root) {
        Ok(path_rel) if path_rel.as_os_str().is_empty() => path_dir_dst_root.to_path_buf(),
        Ok(path_rel) => path_dir_dst_root.join(path_rel),
        Err(_) => path_dir_dst_root.join(path_src.file_name().unwrap_or_default()),
    }
}

/// Create `path_dir` if missing; return whether it was created.
pub(crate) fn ensure_directory(path_dir: &Path) -> Result<bool, CopyTreeError> {
    match fs::metadata(path_dir) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(CopyTreeError::DestinationNotDirectory(
            path_dir.to_path_buf(),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path_dir).map_err(|e| CopyTreeError::io(path_dir, e))?;
            Ok(true)
        }
        Err(e) => Err(CopyTreeError::io(path_dir, e)),
    }
}

/// Drop a symlink sitting where a destination file should go.
///
/// Writes never follow a link out of the destination tree.
fn _remove_destination_symlink(path_dst: &Path) -> Result<(), io::Error> {
    match fs::symlink_metadata(path_dst) {
        Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(path_dst),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    let target = fs::read_link(path_src)?;
    _remove_destination_symlink(path_dst)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MetadataCopy

/// Copy bytes, permission bits, access/modification times and (Linux) xattrs.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_xattrs: bool,
) -> Result<(), io::Error> {
    _remove_destination_symlink(path_file_dst)?;
    fs::copy(path_file_src, path_file_dst)?;
    apply_metadata(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        if if_preserve_xattrs {
            copy_xattrs_linux(path_file_src, path_file_dst);
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = if_preserve_xattrs;
    }
    Ok(())
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                "xattr {} not copied to {} ({e})",
                name.to_string_lossy(),
                path_file_dst.display()
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;

    use super::{SpecCopyPatterns, derive_destination_path, is_overlap, normalize_pair};
    use crate::spec::EnumCopyPatternMode;

    #[rstest]
    #[case(EnumCopyPatternMode::Glob, "*.meta", "Foo.cs.meta", true)]
    #[case(EnumCopyPatternMode::Glob, "*.meta", "Foo.cs", false)]
    #[case(EnumCopyPatternMode::Regex, r"^\.git", ".gitignore", true)]
    #[case(EnumCopyPatternMode::Regex, r"^\.git", "a.git", false)]
    #[case(EnumCopyPatternMode::Literal, "tmp", "scratch_tmp.txt", true)]
    #[case(EnumCopyPatternMode::Literal, "tmp", "readme.txt", false)]
    fn exclude_patterns_match_basename(
        #[case] rule_pattern: EnumCopyPatternMode,
        #[case] pattern: &str,
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        let l_patterns = vec![pattern.to_string()];
        let spec_pats = SpecCopyPatterns::from_raw(
            Some(l_patterns.as_slice()),
            Some(l_patterns.as_slice()),
            rule_pattern,
        )
        .expect("compile patterns");
        assert_eq!(spec_pats.should_exclude_file(name), expected);
        assert_eq!(spec_pats.should_exclude_dir(name), expected);
    }

    #[test]
    fn empty_pattern_list_excludes_nothing() {
        let spec_pats = SpecCopyPatterns::from_raw(Some(&[][..]), None, EnumCopyPatternMode::Glob)
            .expect("compile patterns");
        assert!(!spec_pats.should_exclude_file("anything"));
        assert!(!spec_pats.should_exclude_dir("anything"));
    }

    #[test]
    fn overlap_detects_nested_paths_that_do_not_exist_yet() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir src");

        let (src_n, dst_n) = normalize_pair(&src, &src.join("missing/nested"));
        assert!(is_overlap(&src_n, &dst_n));

        let (src_n, dst_n) = normalize_pair(&src, &tmp.path().join("dst"));
        assert!(!is_overlap(&src_n, &dst_n));
    }

    #[test]
    fn destination_path_maps_root_and_nested_dirs() {
        let root_src = Path::new("/work/BRT_Example");
        let root_dst = Path::new("/pkg/Samples~/BRT_Example");

        assert_eq!(derive_destination_path(root_src, root_src, root_dst), root_dst);
        assert_eq!(
            derive_destination_path(&root_src.join("Scripts/Editor"), root_src, root_dst),
            root_dst.join("Scripts/Editor")
        );
    }

    #[test]
    fn overlap_treats_sibling_prefix_names_as_distinct() {
        assert!(!is_overlap(Path::new("/a/sample"), Path::new("/a/sample_copy")));
        assert!(is_overlap(Path::new("/a/sample"), Path::new("/a/sample")));
    }
}
