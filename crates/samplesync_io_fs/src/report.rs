//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::{EnumCopyStatus, SpecCopiedFile};

/// Aggregate counters and diagnostics for one `copy_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// How the run ended.
    pub status: EnumCopyStatus,
    /// Destination directories created (root included).
    pub cnt_dirs_created: u64,
    /// Files written to destination.
    pub cnt_files_copied: u64,
    /// Entries skipped by exclusion, symlink policy or because they are special files.
    pub cnt_skipped: u64,
    /// Copied files in emission order.
    pub copied: Vec<SpecCopiedFile>,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
}

impl ReportCopy {
    /// Report for a run whose source root was absent.
    pub fn source_missing() -> Self {
        Self {
            status: EnumCopyStatus::SourceMissing,
            ..Self::default()
        }
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} status={} dirs_created={} copied={} skipped={} warnings={}",
            self.status,
            dict_counts["cnt_dirs_created"],
            dict_counts["cnt_files_copied"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    /// See [`ReportCopy::cnt_dirs_created`].
    pub cnt_dirs_created: u64,
    /// See [`ReportCopy::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportCopy::copied`].
    pub copied: Vec<SpecCopiedFile>,
    /// See [`ReportCopy::warnings`].
    pub warnings: Vec<String>,
}

impl ReportCopyBuilder {
    /// Increment created-directory count by one.
    pub fn add_dir_created(&mut self) {
        self.cnt_dirs_created += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Record one copied file.
    pub fn add_copied(&mut self, spec_copied: SpecCopiedFile) {
        self.copied.push(spec_copied);
    }

    /// Add warning message and log it.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        ReportCopy {
            status: EnumCopyStatus::Completed,
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_files_copied: self.copied.len() as u64,
            cnt_skipped: self.cnt_skipped,
            copied: self.copied,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportCopy, ReportCopyBuilder};
    use crate::spec::{EnumCopyStatus, SpecCopiedFile};

    #[test]
    fn report_copy_to_dict_and_format_are_consistent() {
        let report = ReportCopy {
            status: EnumCopyStatus::Completed,
            cnt_dirs_created: 2,
            cnt_files_copied: 3,
            cnt_skipped: 1,
            copied: vec![],
            warnings: vec!["w".to_string()],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_dirs_created"], 2);
        assert_eq!(dict_counts["cnt_files_copied"], 3);
        assert_eq!(dict_counts["cnt_skipped"], 1);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[COPY]");
        assert_eq!(
            txt,
            "[COPY] status=completed dirs_created=2 copied=3 skipped=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_counts_copied_entries() {
        let mut builder = ReportCopyBuilder::default();
        builder.add_dir_created();
        builder.add_copied(SpecCopiedFile {
            path_src: PathBuf::from("src/a.txt"),
            path_dst: PathBuf::from("dst/a.txt"),
        });
        builder.add_skipped();

        let report = builder.build();
        assert_eq!(report.status, EnumCopyStatus::Completed);
        assert_eq!(report.cnt_files_copied, 1);
        assert_eq!(report.cnt_dirs_created, 1);
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(report.copied[0].to_string(), "Copied src/a.txt -> dst/a.txt");
    }

    #[test]
    fn source_missing_report_is_empty() {
        let report = ReportCopy::source_missing();
        assert_eq!(report.status, EnumCopyStatus::SourceMissing);
        assert_eq!(report.cnt_files_copied, 0);
        assert!(report.copied.is_empty());
        assert_eq!(
            report.to_string(),
            "[COPY] status=source_missing dirs_created=0 copied=0 skipped=0 warnings=0"
        );
    }
}
