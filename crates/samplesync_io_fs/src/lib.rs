//! `samplesync_io_fs`:
//! metadata-preserving tree copier for syncing Unity sample folders.
//!
//! Modules:
//! - `copy`   : traversal and copy orchestration
//! - `sample` : project/package sample layout, push and import
//! - `spec`   : enums/options/errors
//! - `report` : run-time report model
//! - `util`   : shared helper functions

pub mod copy;
pub mod report;
pub mod sample;
pub mod spec;
mod util;

pub use copy::{copy_tree, copy_tree_with};
pub use report::{ReportCopy, ReportCopyBuilder};
pub use sample::{
    C_SAMPLE_NAME_DEFAULT, EnumImportSkipReason, ReportImport, SpecSamplePaths, import_sample,
    push_sample,
};
pub use spec::{
    CopyTreeError, EnumCopyPatternMode, EnumCopyStatus, EnumCopySymlinkStrategy, SpecCopiedFile,
    SpecCopyOptions,
};
