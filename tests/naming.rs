use assert_matches::assert_matches;
use chrono::NaiveDate;
use datashelf::{FieldSpec, FileSpec, Naming, SessionSpec, ShelfError, parsing};

#[test]
fn session_names_round_trip() {
    let naming = Naming::default();
    for raw in [
        "session2015-11-12-001",
        "session2015-11-18-001",
        "session2015-12-11-002",
        "2p-imaging2015-12-31-003",
        "a-1-b2019-02-28-999",
    ] {
        let spec = SessionSpec::from_name(raw).unwrap();
        assert_eq!(spec.format(&naming).unwrap(), raw);
    }
}

#[test]
fn file_names_round_trip() {
    let naming = Naming::default();
    for raw in [
        "run00001.dat",
        "trial00042.json",
        "run00003_chanA-chanB.dat",
        "lfp-left.bin",
        ".csv",
    ] {
        let spec = FileSpec::from_name(raw).unwrap();
        let formatted = spec.format_token(&naming).unwrap();
        if raw.starts_with('.') {
            assert_eq!(formatted, raw);
        } else {
            assert_eq!(formatted, format!("_{raw}"));
        }
    }
}

#[test]
fn generated_session_names_round_trip() {
    let naming = Naming::default();
    for (index, day) in [(0u32, 1u32), (7, 9), (42, 17), (999, 28)] {
        let name = parsing::SessionName {
            kind: "awake-2p".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 6, day).unwrap(),
            index,
        };
        let formatted = parsing::format_session_name(&name, naming.session_index_width).unwrap();
        assert_eq!(parsing::session_name(&formatted).unwrap(), name);
    }
}

#[test]
fn session_kind_must_end_in_a_letter() {
    assert_matches!(
        SessionSpec::parse("task2"),
        Err(ShelfError::InvalidSessionType(_))
    );
    assert!(SessionSpec::parse("task-b").is_ok());
}

#[test]
fn session_index_must_be_non_negative() {
    assert_matches!(parsing::session_index("-1"), Err(ShelfError::InvalidIndex(_)));
    assert_eq!(parsing::session_index("12").unwrap(), 12);
}

#[test]
fn conflicting_block_keywords_are_rejected() {
    let err = FileSpec::builder().trial(1u32).run(2u32).build().unwrap_err();
    assert_matches!(err, ShelfError::InvalidSpecification(_));

    let err = FileSpec::builder()
        .kind(datashelf::BlockKind::Run)
        .trial(1u32)
        .build()
        .unwrap_err();
    assert_matches!(err, ShelfError::InvalidSpecification(_));
}

#[test]
fn suffix_normalization_and_status() {
    let spec = FileSpec::builder().suffix("csv").build().unwrap();
    assert_eq!(spec.suffix().single().map(String::as_str), Some(".csv"));

    let spec = FileSpec::builder()
        .run(FieldSpec::any_of([1u32, 3]))
        .build()
        .unwrap();
    assert_eq!(spec.write_status(), datashelf::SelectionStatus::Multiple);

    assert_eq!(
        FileSpec::run(1).format_token(&Naming::default()).unwrap(),
        "_run00001"
    );
}

#[test]
fn configured_widths_change_formatting() {
    let naming = Naming {
        session_index_width: 2,
        file_index_width: 3,
        ..Naming::default()
    };
    let spec = SessionSpec::from_name("session2015-11-12-001").unwrap();
    assert_eq!(spec.format(&naming).unwrap(), "session2015-11-12-01");
    assert_eq!(FileSpec::run(7).format_token(&naming).unwrap(), "_run007");
}
