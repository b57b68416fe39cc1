//! Unity sample layout: the editable project copy and the package's canonical copy.
//!
//! `push` moves edits from the project back into the package.
//! `import` seeds the project from the package, once.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::copy::copy_tree_with;
use crate::report::ReportCopy;
use crate::spec::{CopyTreeError, SpecCopiedFile, SpecCopyOptions};

/// Default sample folder name.
pub const C_SAMPLE_NAME_DEFAULT: &str = "BRT_Example";
/// Unity project directory under the repository root.
pub const C_DIR_PROJECT: &str = "BRT-Unity-DemoProject";
/// Package directory under the repository root.
pub const C_DIR_PACKAGE: &str = "brt-unity-package";

/// Paths of one sample on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSamplePaths {
    /// `<project>/Assets/Samples/<name>`, the working copy.
    pub path_project_sample: PathBuf,
    /// `<package>/Samples~/<name>`, the canonical copy.
    pub path_package_sample: PathBuf,
}

impl SpecSamplePaths {
    pub fn new(
        path_project_sample: impl Into<PathBuf>,
        path_package_sample: impl Into<PathBuf>,
    ) -> Self {
        Self {
            path_project_sample: path_project_sample.into(),
            path_package_sample: path_package_sample.into(),
        }
    }

    /// Derive both sides from a repository root laid out as
    /// `<root>/BRT-Unity-DemoProject` + `<root>/brt-unity-package`.
    pub fn from_repo_root(path_repo_root: impl AsRef<Path>, name_sample: &str) -> Self {
        let path_repo_root = path_repo_root.as_ref();
        Self {
            path_project_sample: path_repo_root
                .join(C_DIR_PROJECT)
                .join("Assets")
                .join("Samples")
                .join(name_sample),
            path_package_sample: path_repo_root
                .join(C_DIR_PACKAGE)
                .join("Samples~")
                .join(name_sample),
        }
    }
}

/// Why `import_sample` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumImportSkipReason {
    /// Package side has no sample to import.
    PackageSampleMissing,
    /// Project already holds the sample and `if_force` was not set.
    ProjectSampleExists,
}

impl fmt::Display for EnumImportSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageSampleMissing => write!(f, "package sample not found"),
            Self::ProjectSampleExists => write!(f, "sample already exists in project"),
        }
    }
}

/// Outcome of `import_sample`.
#[derive(Debug, Clone)]
pub enum ReportImport {
    Copied(ReportCopy),
    Skipped(EnumImportSkipReason),
}

/// Copy the project's sample back into the package (project -> package).
pub fn push_sample<F>(
    spec_paths: &SpecSamplePaths,
    spec_cp_options: SpecCopyOptions,
    on_copied: F,
) -> Result<ReportCopy, CopyTreeError>
where
    F: FnMut(&SpecCopiedFile),
{
    info!(
        "Pushing sample {} -> {}",
        spec_paths.path_project_sample.display(),
        spec_paths.path_package_sample.display()
    );
    copy_tree_with(
        &spec_paths.path_project_sample,
        &spec_paths.path_package_sample,
        spec_cp_options,
        on_copied,
    )
}

/// Copy the package's sample into the project (package -> project).
///
/// Runs only when the package sample directory exists and the project sample
/// directory does not, unless `if_force` is set. A plain file at the project
/// sample path does not count as a sample; the copy then fails with
/// [`CopyTreeError::DestinationNotDirectory`].
pub fn import_sample<F>(
    spec_paths: &SpecSamplePaths,
    spec_cp_options: SpecCopyOptions,
    if_force: bool,
    on_copied: F,
) -> Result<ReportImport, CopyTreeError>
where
    F: FnMut(&SpecCopiedFile),
{
    let path_src = &spec_paths.path_package_sample;
    let path_dst = &spec_paths.path_project_sample;
    if !path_src.is_dir() {
        info!("Package sample not found: {}", path_src.display());
        return Ok(ReportImport::Skipped(
            EnumImportSkipReason::PackageSampleMissing,
        ));
    }
    if path_dst.is_dir() && !if_force {
        info!("Sample already exists in project: {}", path_dst.display());
        return Ok(ReportImport::Skipped(EnumImportSkipReason::ProjectSampleExists));
    }

    if let Some(path_parent) = path_dst.parent()
        && !path_parent.as_os_str().is_empty()
    {
        fs::create_dir_all(path_parent).map_err(|e| CopyTreeError::io(path_parent, e))?;
    }

    info!(
        "Importing sample {} -> {}",
        path_src.display(),
        path_dst.display()
    );
    let report = copy_tree_with(path_src, path_dst, spec_cp_options, on_copied)?;
    Ok(ReportImport::Copied(report))
}
