//! End-to-end checks through the JSON-lines loaders and the dispatcher,
//! the way the runner binary exercises them.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::NamedTempFile;
use wsal_core::{BehaviorWindow, EventTable, MatchResult};
use wsal_quality::dispatcher::{run_quality_checks, CheckContext};
use wsal_quality::{load_events, load_windows, match_window, BehaviorFamily, PatternCatalog};

const USER: &str = "SimUser001";
const PYTHON: &str = "C:\\\\Users\\\\SimUser001\\\\scoop\\\\apps\\\\python\\\\3.11.3\\\\python.exe";
const COPY_LABEL: &str = "copy_local_to_local_1_files_each_1GB_delete_files_after_copy_included";
const COPY_DEST: &str = "C:\\\\localstorage\\\\sim23_dest\\\\gross\\\\wenig";

fn ts(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 26, 20, 0, 0).unwrap() + Duration::seconds(secs.into())
}

fn event_line(secs: u32, process: &str, object: &str, access: &str, user: &str) -> String {
    format!(
        r#"{{"SYSTEM_TimeCreated":"{}","SYSTEM_EventID":"4663","EVENTDATA_ProcessName":"{process}","EVENTDATA_ObjectName":"{object}","EVENTDATA_AccessList":"{access}","EVENTDATA_SubjectUserName":"{user}"}}"#,
        ts(secs).to_rfc3339()
    )
}

fn window_line(start: u32, end: u32, label: &str) -> String {
    format!(
        r#"{{"start":"{}","end":"{}","label":"{label}"}}"#,
        ts(start).to_rfc3339(),
        ts(end).to_rfc3339()
    )
}

fn write_lines(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

fn load_iteration(events: &Path, windows: &Path) -> (EventTable, Vec<BehaviorWindow>) {
    let mut events = load_events(events).unwrap();
    events.retain_user(USER);
    (events, load_windows(windows).unwrap())
}

#[test]
fn copy_iteration_end_to_end() {
    let events_file = write_lines(&[
        event_line(10, PYTHON, &format!("{COPY_DEST}\\\\big.dat"), "%%4417", USER),
        event_line(20, PYTHON, &format!("{COPY_DEST}\\\\big.dat"), "%%1537", USER),
        // another user's rows must not leak into the check
        event_line(12, PYTHON, &format!("{COPY_DEST}\\\\big.dat"), "%%4417", "SimUser002"),
    ]);
    let windows_file = write_lines(&[
        window_line(0, 60, COPY_LABEL),
        // no check configured for browsing, routed around silently
        window_line(61, 90, "browsing_web"),
    ]);

    let (events, windows) = load_iteration(events_file.path(), windows_file.path());
    let catalog = PatternCatalog::builtin();
    let ctx = CheckContext {
        catalog: &catalog,
        sim_user: USER,
        timezone: "CET",
    };

    let performed = run_quality_checks(&windows, &events, &ctx).unwrap();
    assert_eq!(performed, 1);

    let spec = catalog
        .resolve(BehaviorFamily::Copy, COPY_LABEL, USER, "CET")
        .unwrap();
    assert_eq!(match_window(&events, &windows[0], &spec), MatchResult::PASS);
}

#[test]
fn failed_check_still_counts_as_performed() {
    // the delete row is missing: the check fails but the window was routed
    let events_file = write_lines(&[event_line(
        10,
        PYTHON,
        &format!("{COPY_DEST}\\\\big.dat"),
        "%%4417",
        USER,
    )]);
    let windows_file = write_lines(&[window_line(0, 60, COPY_LABEL)]);

    let (events, windows) = load_iteration(events_file.path(), windows_file.path());
    let catalog = PatternCatalog::builtin();
    let ctx = CheckContext {
        catalog: &catalog,
        sim_user: USER,
        timezone: "CET",
    };

    let performed = run_quality_checks(&windows, &events, &ctx).unwrap();
    assert_eq!(performed, 1);

    let spec = catalog
        .resolve(BehaviorFamily::Copy, COPY_LABEL, USER, "CET")
        .unwrap();
    assert_eq!(match_window(&events, &windows[0], &spec), MatchResult::FAIL);
}

#[test]
fn continuation_head_completes_the_final_window() {
    // the delete lands in the next iteration's first archived file
    let events_file = write_lines(&[event_line(
        10,
        PYTHON,
        &format!("{COPY_DEST}\\\\big.dat"),
        "%%4417",
        USER,
    )]);
    let next_file = write_lines(&[
        event_line(20, PYTHON, &format!("{COPY_DEST}\\\\big.dat"), "%%1537", USER),
        // already past the iteration bound, must be truncated away
        event_line(120, PYTHON, &format!("{COPY_DEST}\\\\big.dat"), "%%4417", USER),
    ]);
    let windows_file = write_lines(&[window_line(0, 60, COPY_LABEL)]);

    let (mut events, windows) = load_iteration(events_file.path(), windows_file.path());
    let next = load_events(next_file.path()).unwrap();
    let end = windows.iter().map(|w| w.end).max().unwrap();
    events.append_continuation(next, end);
    assert_eq!(events.len(), 2);

    let catalog = PatternCatalog::builtin();
    let spec = catalog
        .resolve(BehaviorFamily::Copy, COPY_LABEL, USER, "CET")
        .unwrap();
    assert_eq!(match_window(&events, &windows[0], &spec), MatchResult::PASS);
}

#[test]
fn encrypt_delete_requires_the_exact_destination_object() {
    let cmd = "C:\\\\Windows\\\\System32\\\\cmd.exe";
    let dest = "C:\\\\localstorage\\\\sim23_encrypt_dest";
    let windows_file = write_lines(&[window_line(0, 60, "encrypt_delete_all_files")]);
    let windows = load_windows(windows_file.path()).unwrap();
    let catalog = PatternCatalog::builtin();
    let spec = catalog
        .resolve(
            BehaviorFamily::EncryptDelete,
            "encrypt_delete_all_files",
            USER,
            "CET",
        )
        .unwrap();

    let exact = write_lines(&[event_line(5, cmd, dest, "%%1537", USER)]);
    let (events, _) = load_iteration(exact.path(), windows_file.path());
    assert_eq!(match_window(&events, &windows[0], &spec), MatchResult::PASS);

    // a per-file deletion inside the folder is not the folder deletion
    let inside = write_lines(&[event_line(
        5,
        cmd,
        &format!("{dest}\\\\a.dat"),
        "%%1537",
        USER,
    )]);
    let (events, _) = load_iteration(inside.path(), windows_file.path());
    assert_eq!(match_window(&events, &windows[0], &spec), MatchResult::FAIL);
}

#[test]
fn mailing_attachment_save_end_to_end() {
    let attachment = "C:\\\\localstorage\\\\attachment\\\\invoice_7.dat";
    let events_file = write_lines(&[event_line(5, PYTHON, attachment, "%%4417", USER)]);
    let windows_file = write_lines(&[window_line(0, 60, "mailing_with_attachment_and_save")]);

    let (events, windows) = load_iteration(events_file.path(), windows_file.path());
    let catalog = PatternCatalog::builtin();
    let ctx = CheckContext {
        catalog: &catalog,
        sim_user: USER,
        timezone: "CET",
    };

    let performed = run_quality_checks(&windows, &events, &ctx).unwrap();
    assert_eq!(performed, 1);
}
