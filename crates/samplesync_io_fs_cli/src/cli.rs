use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use samplesync_io_fs::{
    C_SAMPLE_NAME_DEFAULT, EnumCopyPatternMode, EnumCopySymlinkStrategy, SpecCopyOptions,
    SpecSamplePaths,
};

use crate::log_level::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "samplesync",
    version,
    about = "Copy a sample directory tree, preserving file metadata"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    #[arg(long, short, global = true, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Copy SOURCE into DESTINATION, overwriting files and creating directories
    Copy(CopyCommandArgs),
    /// Copy the project's sample back into the package
    Push(SampleArgs),
    /// Copy the package's sample into the project if it is not there yet
    Import(ImportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CopyCommandArgs {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[command(flatten)]
    pub copy_args: CopyArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    /// Directory holding the Unity project and the package
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,
    /// Sample folder name on both sides
    #[arg(long, default_value = C_SAMPLE_NAME_DEFAULT)]
    pub sample: String,
    #[command(flatten)]
    pub copy_args: CopyArgs,
}

impl SampleArgs {
    pub fn sample_paths(&self) -> SpecSamplePaths {
        SpecSamplePaths::from_repo_root(&self.repo_root, &self.sample)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub sample_args: SampleArgs,
    /// Copy even if the project already has the sample
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CopyArgs {
    #[arg(long, default_value = "dereference", value_enum)]
    pub symlinks: SymlinkArg,
    /// Skip files whose name matches (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub patterns_exclude_files: Vec<String>,
    /// Skip directories whose name matches (repeatable)
    #[arg(long = "exclude-dir", value_name = "PATTERN")]
    pub patterns_exclude_dirs: Vec<String>,
    #[arg(long, default_value = "glob", value_enum)]
    pub pattern_mode: PatternModeArg,
    /// Do not copy extended attributes
    #[arg(long)]
    pub no_xattrs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SymlinkArg {
    Dereference,
    Copy,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternModeArg {
    Glob,
    Regex,
    Literal,
}

impl From<SymlinkArg> for EnumCopySymlinkStrategy {
    fn from(value: SymlinkArg) -> Self {
        match value {
            SymlinkArg::Dereference => EnumCopySymlinkStrategy::Dereference,
            SymlinkArg::Copy => EnumCopySymlinkStrategy::CopySymlinks,
            SymlinkArg::Skip => EnumCopySymlinkStrategy::SkipSymlinks,
        }
    }
}

impl From<PatternModeArg> for EnumCopyPatternMode {
    fn from(value: PatternModeArg) -> Self {
        match value {
            PatternModeArg::Glob => EnumCopyPatternMode::Glob,
            PatternModeArg::Regex => EnumCopyPatternMode::Regex,
            PatternModeArg::Literal => EnumCopyPatternMode::Literal,
        }
    }
}

fn non_empty(patterns: &[String]) -> Option<Vec<String>> {
    (!patterns.is_empty()).then(|| patterns.to_vec())
}

impl From<&CopyArgs> for SpecCopyOptions {
    fn from(args: &CopyArgs) -> Self {
        SpecCopyOptions {
            patterns_exclude_files: non_empty(&args.patterns_exclude_files),
            patterns_exclude_dirs: non_empty(&args.patterns_exclude_dirs),
            rule_pattern: args.pattern_mode.into(),
            rule_symlink: args.symlinks.into(),
            if_preserve_xattrs: !args.no_xattrs,
        }
    }
}
