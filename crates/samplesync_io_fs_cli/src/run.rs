use std::path::Path;

use samplesync_io_fs::{
    CopyTreeError, EnumCopyStatus, ReportCopy, ReportImport, SpecCopiedFile, SpecCopyOptions,
    copy_tree_with, import_sample, push_sample,
};

use crate::cli::{Cli, Commands};

fn print_copied(spec_copied: &SpecCopiedFile) {
    println!("{spec_copied}");
}

fn print_report(report: &ReportCopy, path_src: &Path) {
    if report.status == EnumCopyStatus::SourceMissing {
        println!("Source directory does not exist: {}", path_src.display());
        return;
    }
    println!("{report}");
}

pub fn run(cli_args: Cli) -> Result<(), CopyTreeError> {
    match cli_args.command {
        Commands::Copy(args) => {
            let report = copy_tree_with(
                &args.source,
                &args.destination,
                SpecCopyOptions::from(&args.copy_args),
                print_copied,
            )?;
            print_report(&report, &args.source);
        }
        Commands::Push(args) => {
            let spec_paths = args.sample_paths();
            let report = push_sample(
                &spec_paths,
                SpecCopyOptions::from(&args.copy_args),
                print_copied,
            )?;
            print_report(&report, &spec_paths.path_project_sample);
        }
        Commands::Import(args) => {
            let spec_paths = args.sample_args.sample_paths();
            let report = import_sample(
                &spec_paths,
                SpecCopyOptions::from(&args.sample_args.copy_args),
                args.force,
                print_copied,
            )?;
            match report {
                ReportImport::Copied(report_copy) => {
                    print_report(&report_copy, &spec_paths.path_package_sample)
                }
                ReportImport::Skipped(reason) => println!("Import skipped: {reason}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::io;
    use std::sync::{Arc, Mutex};

    use clap::Parser;
    use samplesync_io_fs::CopyTreeError;

    use super::run;
    use crate::cli::Cli;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `cli` under a subscriber like the binary's, returning what it logged.
    fn run_logged(cli: Cli, level: tracing::Level) -> (Result<(), CopyTreeError>, String) {
        let log_buffer = LogBuffer::default();
        let log_writer = log_buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(move || log_writer.clone())
            .without_time()
            .with_ansi(false)
            .compact()
            .finish();
        let res = tracing::subscriber::with_default(subscriber, || run(cli));
        let txt_log = String::from_utf8_lossy(&log_buffer.0.lock().expect("lock")).into_owned();
        (res, txt_log)
    }

    #[test]
    fn copy_command_mirrors_tree() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(src.join("Scripts")).expect("mkdir");
        std::fs::write(src.join("Scripts/Foo.cs"), "foo").expect("write");

        let cli = Cli::try_parse_from([
            OsStr::new("samplesync"),
            OsStr::new("copy"),
            src.as_os_str(),
            dst.as_os_str(),
        ])
        .expect("parse");
        run(cli).expect("run");

        assert_eq!(
            std::fs::read_to_string(dst.join("Scripts/Foo.cs")).expect("read"),
            "foo"
        );
    }

    #[test]
    fn copy_command_with_missing_source_succeeds_without_changes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("absent");
        let dst = tmp.path().join("dst");

        let cli = Cli::try_parse_from([
            OsStr::new("samplesync"),
            OsStr::new("copy"),
            src.as_os_str(),
            dst.as_os_str(),
        ])
        .expect("parse");
        run(cli).expect("missing source is not an error");
        assert!(!dst.exists());
    }

    #[test]
    fn missing_source_is_not_logged_at_default_level() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("absent");
        let dst = tmp.path().join("dst");
        let args = [
            OsStr::new("samplesync"),
            OsStr::new("copy"),
            src.as_os_str(),
            dst.as_os_str(),
        ];

        let cli = Cli::try_parse_from(args).expect("parse");
        let (res, txt_log) = run_logged(cli, tracing::Level::WARN);
        res.expect("missing source is not an error");
        assert!(txt_log.is_empty(), "unexpected log: {txt_log}");

        let cli = Cli::try_parse_from(args).expect("parse");
        let (res, txt_log) = run_logged(cli, tracing::Level::INFO);
        res.expect("missing source is not an error");
        assert!(txt_log.contains("Source directory does not exist"));
    }

    #[test]
    fn copy_command_surfaces_filesystem_errors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(&src).expect("mkdir");
        std::fs::write(src.join("a.txt"), "a").expect("write");
        std::fs::write(&dst, "file in the way").expect("write");

        let cli = Cli::try_parse_from([
            OsStr::new("samplesync"),
            OsStr::new("copy"),
            src.as_os_str(),
            dst.as_os_str(),
        ])
        .expect("parse");
        let err = run(cli).expect_err("must fail");
        assert!(matches!(err, CopyTreeError::DestinationNotDirectory(_)));
    }

    #[test]
    fn import_then_push_round_trips_sample() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_package_sample = tmp.path().join("brt-unity-package/Samples~/BRT_Example");
        std::fs::create_dir_all(&path_package_sample).expect("mkdir");
        std::fs::write(path_package_sample.join("SphereSpawner.cs"), "v1").expect("write");

        let cli = Cli::try_parse_from([
            OsStr::new("samplesync"),
            OsStr::new("import"),
            OsStr::new("--repo-root"),
            tmp.path().as_os_str(),
        ])
        .expect("parse");
        run(cli).expect("import");

        let path_project_sample = tmp
            .path()
            .join("BRT-Unity-DemoProject/Assets/Samples/BRT_Example");
        std::fs::write(path_project_sample.join("SphereSpawner.cs"), "v2").expect("edit");

        let cli = Cli::try_parse_from([
            OsStr::new("samplesync"),
            OsStr::new("push"),
            OsStr::new("--repo-root"),
            tmp.path().as_os_str(),
        ])
        .expect("parse");
        run(cli).expect("push");

        assert_eq!(
            std::fs::read_to_string(path_package_sample.join("SphereSpawner.cs")).expect("read"),
            "v2"
        );
    }
}
