mod support;

use clseval::config::{EvalSettings, SettingsLayer};
use clseval::logging::{self, LogLevel};
use clseval::runner;
use support::fixtures::write_ten_images;
use tempfile::tempdir;

#[test]
fn run_log_keeps_final_lines_once_guard_drops() {
    let dir = tempdir().unwrap();
    let fixture = write_ten_images(dir.path());
    let out = dir.path().join("out");
    let settings = EvalSettings::resolve(SettingsLayer {
        in_log: Some(fixture.in_log),
        out_path: Some(out.clone()),
        gt: Some(fixture.ground_truth),
        pos: Some(1),
        log_lv: Some(LogLevel::Info),
        ..Default::default()
    })
    .unwrap();

    let guard = logging::init(settings.log_level, Some(&out)).unwrap();
    assert!(guard.is_some());
    runner::run(&settings).unwrap();
    tracing::error!("last line of the run");
    drop(guard);

    let log_path = std::fs::read_dir(&out)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.extension().is_some_and(|ext| ext == "log")
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("clseval_"))
        })
        .expect("run log file");
    let text = std::fs::read_to_string(log_path).unwrap();
    assert!(text.contains("...done in"));
    let last = text.lines().last().unwrap();
    assert!(last.contains("last line of the run"), "last line: {last}");
}
