//! Filesystem tree traversal and copy orchestration.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{CopyTreeError, EnumCopySymlinkStrategy, SpecCopiedFile, SpecCopyOptions};
use crate::util::{
    SpecCopyPatterns, copy_file_with_metadata, create_symbolic_link, derive_destination_path,
    ensure_directory, is_overlap, normalize_pair,
};

#[derive(Debug, Clone)]
struct SpecDirEntry {
    path_dir_src_sub: PathBuf,
    name_dir: OsString,
}

#[derive(Debug, Clone)]
struct SpecFileEntry {
    path_file_src: PathBuf,
    name_file: OsString,
    /// Recreate as a link instead of copying bytes.
    if_is_symlink: bool,
}

struct SpecCopyContext<'a> {
    path_dir_src: PathBuf,
    path_dir_dst: PathBuf,
    spec_cp_options: SpecCopyOptions,
    spec_cp_pats: SpecCopyPatterns,
    builder_cp_report: ReportCopyBuilder,
    /// `(dev, ino)` of the directories on the current walk path.
    set_ancestor_dirs: HashSet<(u64, u64)>,
    on_copied: &'a mut dyn FnMut(&SpecCopiedFile),
}

/// Copy a directory tree from `dir_source` to `dir_destination`.
///
/// Every file is copied unconditionally, overwriting the destination and
/// preserving permissions and timestamps. Destination-only entries are left
/// alone. See [`copy_tree_with`] for the traversal order.
pub fn copy_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    copy_tree_with(dir_source, dir_destination, spec_cp_options, |_| {})
}

/// Same as [`copy_tree`], calling `on_copied` right after each file is written.
///
/// This function performs:
/// 1. Source existence check. A missing source root is not an error: the
///    returned report has [`crate::EnumCopyStatus::SourceMissing`] and
///    nothing is touched.
/// 2. Validation (source is a directory, patterns compile, no overlap).
/// 3. Destination root creation.
/// 4. Top-down depth-first walk. Per directory: create missing
///    subdirectories, copy files, then descend. Entries are visited in
///    file-name order.
///
/// The first filesystem failure aborts the walk; already copied files stay.
pub fn copy_tree_with<P, Q, F>(
    dir_source: P,
    dir_destination: Q,
    spec_cp_options: SpecCopyOptions,
    mut on_copied: F,
) -> Result<ReportCopy, CopyTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: FnMut(&SpecCopiedFile),
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    let path_dir_dst = dir_destination.as_ref().to_path_buf();

    let meta_dir_src = match fs::metadata(&path_dir_src) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Source directory does not exist: {}", path_dir_src.display());
            return Ok(ReportCopy::source_missing());
        }
        Err(e) => return Err(CopyTreeError::io(path_dir_src, e)),
    };
    if !meta_dir_src.is_dir() {
        return Err(CopyTreeError::SourceNotDirectory(path_dir_src));
    }

    let spec_cp_pats = SpecCopyPatterns::from_raw(
        spec_cp_options.patterns_exclude_files.as_deref(),
        spec_cp_options.patterns_exclude_dirs.as_deref(),
        spec_cp_options.rule_pattern,
    )?;

    let (path_src_resolved, path_dst_resolved) = normalize_pair(&path_dir_src, &path_dir_dst);
    if is_overlap(&path_src_resolved, &path_dst_resolved) {
        return Err(CopyTreeError::SourceDestinationOverlap {
            source: path_src_resolved,
            destination: path_dst_resolved,
        });
    }

    let mut builder_cp_report = ReportCopyBuilder::default();
    if ensure_directory(&path_dir_dst)? {
        debug!("Created destination root {}", path_dir_dst.display());
        builder_cp_report.add_dir_created();
    }

    let mut spec_cp_ctx = SpecCopyContext {
        path_dir_src: path_dir_src.clone(),
        path_dir_dst,
        spec_cp_options,
        spec_cp_pats,
        builder_cp_report,
        set_ancestor_dirs: HashSet::new(),
        on_copied: &mut on_copied,
    };

    walk_directory(&path_dir_src, &mut spec_cp_ctx)?;
    Ok(spec_cp_ctx.builder_cp_report.build())
}

#[cfg(unix)]
fn directory_identity(path_dir: &Path) -> io::Result<Option<(u64, u64)>> {
    use std::os::unix::fs::MetadataExt;

    let stat_dir = fs::metadata(path_dir)?;
    Ok(Some((stat_dir.dev(), stat_dir.ino())))
}

#[cfg(not(unix))]
fn directory_identity(_path_dir: &Path) -> io::Result<Option<(u64, u64)>> {
    Ok(None)
}

fn walk_directory(
    path_root: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<(), CopyTreeError> {
    // Only directories on the current path count as a loop.
    let id_dir =
        if spec_cp_ctx.spec_cp_options.rule_symlink == EnumCopySymlinkStrategy::Dereference {
            directory_identity(path_root).map_err(|e| CopyTreeError::io(path_root, e))?
        } else {
            None
        };
    if let Some(id_dir) = id_dir
        && !spec_cp_ctx.set_ancestor_dirs.insert(id_dir)
    {
        spec_cp_ctx
            .builder_cp_report
            .add_warning(format!("Symlink loop detected: {}", path_root.display()));
        spec_cp_ctx.builder_cp_report.add_skipped();
        return Ok(());
    }

    let path_dir_dst = derive_destination_path(
        path_root,
        &spec_cp_ctx.path_dir_src,
        &spec_cp_ctx.path_dir_dst,
    );
    debug!(
        "Visiting {} -> {}",
        path_root.display(),
        path_dir_dst.display()
    );

    let (l_dirs, l_files) = list_directory(path_root, spec_cp_ctx)?;

    for spec_dir_entry in &l_dirs {
        let path_dir_dst_sub = path_dir_dst.join(&spec_dir_entry.name_dir);
        if ensure_directory(&path_dir_dst_sub)? {
            debug!("Created directory {}", path_dir_dst_sub.display());
            spec_cp_ctx.builder_cp_report.add_dir_created();
        }
    }

    for spec_file_entry in l_files {
        let path_file_dst = path_dir_dst.join(&spec_file_entry.name_file);
        let res_copy = if spec_file_entry.if_is_symlink {
            create_symbolic_link(&spec_file_entry.path_file_src, &path_file_dst)
        } else {
            copy_file_with_metadata(
                &spec_file_entry.path_file_src,
                &path_file_dst,
                spec_cp_ctx.spec_cp_options.if_preserve_xattrs,
            )
        };
        if let Err(e) = res_copy {
            return Err(CopyTreeError::CopyFailed {
                path_src: spec_file_entry.path_file_src,
                path_dst: path_file_dst,
                source: e,
            });
        }

        let spec_copied = SpecCopiedFile {
            path_src: spec_file_entry.path_file_src,
            path_dst: path_file_dst,
        };
        info!("{spec_copied}");
        (spec_cp_ctx.on_copied)(&spec_copied);
        spec_cp_ctx.builder_cp_report.add_copied(spec_copied);
    }

    for spec_dir_entry in l_dirs {
        walk_directory(&spec_dir_entry.path_dir_src_sub, spec_cp_ctx)?;
    }

    if let Some(id_dir) = id_dir {
        spec_cp_ctx.set_ancestor_dirs.remove(&id_dir);
    }
    Ok(())
}

/// Split one directory level into sorted subdirectories and files.
///
/// Applies exclusion patterns and the symlink policy; special files are
/// skipped with a warning.
fn list_directory(
    path_root: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> Result<(Vec<SpecDirEntry>, Vec<SpecFileEntry>), CopyTreeError> {
    let enum_rule_symlink = spec_cp_ctx.spec_cp_options.rule_symlink;
    let mut l_dirs: Vec<SpecDirEntry> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    let iter_entries = fs::read_dir(path_root).map_err(|e| CopyTreeError::io(path_root, e))?;
    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| CopyTreeError::io(path_root, e))?;
        let path_entry = entry.path();
        let name_entry = entry.file_name();
        let cfg_file_type = entry
            .file_type()
            .map_err(|e| CopyTreeError::io(&path_entry, e))?;

        let (b_is_dir, b_is_file, b_is_symlink) = if cfg_file_type.is_symlink() {
            match enum_rule_symlink {
                EnumCopySymlinkStrategy::SkipSymlinks => {
                    spec_cp_ctx
                        .builder_cp_report
                        .add_warning(format!("Symlink skipped: {}", path_entry.display()));
                    spec_cp_ctx.builder_cp_report.add_skipped();
                    continue;
                }
                EnumCopySymlinkStrategy::CopySymlinks => (false, true, true),
                EnumCopySymlinkStrategy::Dereference => {
                    let meta_target = fs::metadata(&path_entry).map_err(|e| {
                        CopyTreeError::io(
                            &path_entry,
                            io::Error::new(e.kind(), format!("broken symlink ({e})")),
                        )
                    })?;
                    (meta_target.is_dir(), meta_target.is_file(), false)
                }
            }
        } else {
            (cfg_file_type.is_dir(), cfg_file_type.is_file(), false)
        };

        let name_lossy = name_entry.to_string_lossy();
        if b_is_dir {
            if spec_cp_ctx.spec_cp_pats.should_exclude_dir(&name_lossy) {
                debug!("Excluded directory {}", path_entry.display());
                spec_cp_ctx.builder_cp_report.add_skipped();
                continue;
            }
            l_dirs.push(SpecDirEntry {
                path_dir_src_sub: path_entry,
                name_dir: name_entry,
            });
        } else if b_is_file {
            if spec_cp_ctx.spec_cp_pats.should_exclude_file(&name_lossy) {
                debug!("Excluded file {}", path_entry.display());
                spec_cp_ctx.builder_cp_report.add_skipped();
                continue;
            }
            l_files.push(SpecFileEntry {
                path_file_src: path_entry,
                name_file: name_entry,
                if_is_symlink: b_is_symlink,
            });
        } else {
            spec_cp_ctx
                .builder_cp_report
                .add_warning(format!("Special file skipped: {}", path_entry.display()));
            spec_cp_ctx.builder_cp_report.add_skipped();
        }
    }

    l_dirs.sort_by(|a, b| a.name_dir.cmp(&b.name_dir));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));
    Ok((l_dirs, l_files))
}
