//! End-to-end continuity checks over on-disk dataset fixtures.

use netcdf_parser::TimeAxis;
use test_utils::{fixed_series, monthly_axis, noleap_month_ends, DatasetFixture, DAYS_SINCE};
use timecheck::{ExpectedFrequency, IssueKind, TimeChecker, TimecheckError, Verdict};
use warehouse_common::CommonError;

fn sub_daily(start: f64, count: usize) -> TimeAxis {
    TimeAxis::new(fixed_series(start, 0.25, count)).with_units(DAYS_SINCE)
}

// ============================================================================
// Fixed-delta datasets
// ============================================================================

#[tokio::test]
async fn test_uniform_frequency_passes() {
    let fixture = DatasetFixture::fixed_step(10, 4, 0.25);
    let report = TimeChecker::new(fixture.reader.clone())
        .with_jobs(3)
        .check_dir(fixture.path())
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Pass);
    assert_eq!(report.files_checked, 10);
    assert_eq!(report.exit_code(), 0);
    assert!(matches!(
        report.frequency,
        ExpectedFrequency::FixedDelta { value, .. } if value == 0.25
    ));
}

#[tokio::test]
async fn test_single_gap_produces_one_issue() {
    let fixture = DatasetFixture::new();
    fixture.add("c.h1.0001-01-01.nc", sub_daily(0.0, 4));
    fixture.add("c.h1.0001-01-02.nc", sub_daily(1.0, 4));
    // Starts 1.5 days late
    let late = fixture.add("c.h1.0001-01-03.nc", sub_daily(3.5, 4));
    fixture.add("c.h1.0001-01-04.nc", sub_daily(4.5, 4));

    let report = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, IssueKind::StartMismatch);
    assert_eq!(issue.file, late);
    assert_eq!(issue.expected, Some(2.0));
    assert_eq!(issue.magnitude, Some(1.5));
}

#[tokio::test]
async fn test_empty_index_does_not_cascade() {
    let fixture = DatasetFixture::new();
    fixture.add("case.cam.h0.0001-01.nc", monthly_axis(vec![31.0]));
    let empty = fixture.add("case.cam.h0.0001-02.nc", monthly_axis(vec![]));
    // March resumes on schedule as though February had been there.
    fixture.add("case.cam.h0.0001-03.nc", monthly_axis(vec![90.0]));
    fixture.add("case.cam.h0.0001-04.nc", monthly_axis(vec![120.0]));

    let report = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap();

    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::EmptyTimeIndex);
    assert_eq!(report.issues[0].file, empty);
    assert_eq!(report.issues[0].expected, Some(59.0));
}

#[tokio::test]
async fn test_internal_gap_fails_the_dataset() {
    let fixture = DatasetFixture::new();
    fixture.add("c.h1.0001-01.nc", sub_daily(0.0, 4));
    fixture.add(
        "c.h1.0001-02.nc",
        TimeAxis::new(vec![1.0, 1.25, 1.75, 2.0]).with_units(DAYS_SINCE),
    );

    let report = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::InternalDelta);
    assert_eq!(report.issues[0].at, Some(1.75));
}

#[tokio::test]
async fn test_single_sample_first_file_is_a_config_error() {
    let fixture = DatasetFixture::new();
    fixture.add("c.h1.0001-01.nc", TimeAxis::new(vec![0.0]));
    fixture.add("c.h1.0001-02.nc", TimeAxis::new(vec![1.0]));

    let err = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap_err();
    assert!(matches!(err, TimecheckError::InsufficientSamples { found: 1, .. }));
}

// ============================================================================
// Monthly datasets
// ============================================================================

#[tokio::test]
async fn test_full_noleap_year_passes() {
    let fixture = DatasetFixture::monthly_noleap(1);
    let report = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap();

    assert!(report.passed(), "unexpected issues: {:?}", report.issues);
    assert!(report.frequency.is_monthly());
    assert_eq!(report.files_checked, 12);
}

#[tokio::test]
async fn test_multi_year_monthly_passes() {
    let fixture = DatasetFixture::monthly_noleap(3);
    let report = TimeChecker::new(fixture.reader.clone())
        .with_jobs(16)
        .check_dir(fixture.path())
        .await
        .unwrap();
    assert!(report.passed());
    assert_eq!(report.files_checked, 36);
}

#[tokio::test]
async fn test_missing_month_is_detected() {
    let fixture = DatasetFixture::new();
    let ends = noleap_month_ends(1);
    for month in 1..=12u32 {
        if month == 5 {
            continue;
        }
        fixture.add(
            &format!("case.cam.h0.0001-{:02}.nc", month),
            monthly_axis(vec![ends[month as usize - 1]]),
        );
    }

    let report = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap();

    // June is expected at April's end + 30 days, but actually starts 31 days later.
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert!(issue.file.ends_with("case.cam.h0.0001-06.nc"));
    assert_eq!(issue.magnitude, Some(31.0));
}

#[tokio::test]
async fn test_duplicate_monthly_timestamp_short_circuits() {
    let fixture = DatasetFixture::new();
    fixture.add("case.cam.h0.0001-01.nc", monthly_axis(vec![31.0]));
    fixture.add("case.cam.h0.0001-02.nc", monthly_axis(vec![59.0, 59.0, 1000.0]));
    fixture.add("case.cam.h0.0001-03.nc", monthly_axis(vec![90.0]));

    let report = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap();
    assert!(report.passed());
}

#[tokio::test]
async fn test_unsupported_calendar_fails_fast() {
    let fixture = DatasetFixture::new();
    fixture.add(
        "case.cam.h0.0001-01.nc",
        TimeAxis::new(vec![31.0]).monthly().with_calendar("gregorian"),
    );

    let err = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TimecheckError::Config(CommonError::UnsupportedCalendar(ref name)) if name == "gregorian"
    ));
    // Detection only; nothing was scanned.
    assert_eq!(fixture.reader.reads(), 1);
}

// ============================================================================
// Reporting and parallelism
// ============================================================================

#[tokio::test]
async fn test_pool_width_does_not_change_result() {
    let fixture = DatasetFixture::new();
    for i in 0..20 {
        let start = if i == 13 { i as f64 + 0.5 } else { i as f64 };
        fixture.add(&format!("c.h1.0001-01-{:02}.nc", i + 1), sub_daily(start, 4));
    }

    let serial = TimeChecker::new(fixture.reader.clone())
        .with_jobs(1)
        .check_dir(fixture.path())
        .await
        .unwrap();
    let parallel = TimeChecker::new(fixture.reader.clone())
        .with_jobs(8)
        .check_dir(fixture.path())
        .await
        .unwrap();

    assert_eq!(serial.issues, parallel.issues);
    // The late file and the one after it (which starts on time but after a late end).
    assert_eq!(serial.issues.len(), 2);
}

#[tokio::test]
async fn test_result_line_and_json() {
    let fixture = DatasetFixture::monthly_noleap(1);
    let report = TimeChecker::new(fixture.reader.clone())
        .check_dir(fixture.path())
        .await
        .unwrap();

    assert_eq!(
        report.result_line(),
        format!("Result=Pass:dataset={}", fixture.path().display())
    );
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["verdict"], "Pass");
    assert_eq!(json["frequency"]["kind"], "monthly");
    assert_eq!(json["frequency"]["calendar"], "noleap");
}
