use std::io::Write;

use cadence_core::{HabitModel, PatternKind, PatternRecognizer};
use cadence_ingest::{parse_activity_csv, parse_time_log};

#[test]
fn csv_file_feeds_the_models() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "title,category,start,end,score,completed").unwrap();
    for day in 2..=6 {
        writeln!(file, "Yoga,health,2026-03-0{day} 07:00,2026-03-0{day} 07:30,5,true").unwrap();
    }
    writeln!(file, "Report,work,2026-03-02 14:00,2026-03-02 15:30,2,true").unwrap();
    file.flush().unwrap();

    let report = parse_activity_csv(file.path()).unwrap();
    assert_eq!(report.activities.len(), 6);

    let habits = HabitModel::new();
    habits.analyze(&report.activities);
    assert_eq!(habits.most_productive_hour(), 7);
    assert_eq!(habits.learned_duration("Yoga"), Some(30.0));
    assert_eq!(habits.completions("Yoga"), 5);

    let patterns = PatternRecognizer::new();
    patterns.analyze(&report.activities);
    let best = patterns.best_pattern("Yoga").unwrap();
    assert_eq!(best.kind, PatternKind::Daily);
    assert_eq!(best.hour, 7);
    assert!(!patterns.has_recurring_pattern("Report"));
}

#[test]
fn missing_csv_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_activity_csv(dir.path().join("nope.csv")).unwrap_err();
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn time_log_and_csv_agree() {
    let log = parse_time_log("2026-03-02 07:00-07:30 Yoga [health] 5").unwrap();
    let csv = cadence_ingest::parse_activity_csv_str(
        "title,category,start,end,score,completed\nYoga,health,2026-03-02 07:00,2026-03-02 07:30,5,true\n",
    )
    .unwrap();
    assert_eq!(log.activities, csv.activities);
}

#[test]
fn csv_file_with_a_non_utf8_row_still_imports() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"title,category,start,end,score,completed\n").unwrap();
    file.write_all(b"Yoga,health,2026-03-02 07:00,2026-03-02 07:30,5,true\n").unwrap();
    file.write_all(b"Bad\xff\xfe,work,2026-03-02 09:00,2026-03-02 10:00,3,true\n").unwrap();
    file.write_all(b"Yoga,health,2026-03-03 07:00,2026-03-03 07:30,5,true\n").unwrap();
    file.flush().unwrap();

    let report = parse_activity_csv(file.path()).unwrap();
    assert_eq!(report.activities.len(), 2);
    assert_eq!(report.skipped, 1);
}
