//! Sequential stitching of scan results.
//!
//! This is the one stage that cannot run in parallel: the expected start of
//! every file depends on the actual end of the file before it. Results must
//! be supplied in filename order, never completion order.

use tracing::{debug, warn};
use warehouse_common::datestamp::month_from_path;

use crate::error::Result;
use crate::frequency::ExpectedFrequency;
use crate::issue::Issue;
use crate::scanner::ScanResult;

pub struct Reconciler<'a> {
    frequency: &'a ExpectedFrequency,
}

impl<'a> Reconciler<'a> {
    pub fn new(frequency: &'a ExpectedFrequency) -> Self {
        Self { frequency }
    }

    /// Walk `results` in order and collect every discontinuity.
    ///
    /// Internal-delta issues already found by the scanner are merged in at
    /// their file's position. Fails only on configuration errors, such as a
    /// file name without a usable date stamp in monthly mode.
    pub fn reconcile(&self, results: &[ScanResult]) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut prev: Option<f64> = None;

        for (position, result) in results.iter().enumerate() {
            debug_assert_eq!(result.index, position, "scan results out of filename order");
            issues.extend(result.issues.iter().cloned());

            let Some(prev_last) = prev else {
                // Nothing to compare against yet; seed from the first non-empty file.
                match result.span {
                    Some(span) => prev = Some(span.last),
                    None => {
                        warn!(file = %result.file.display(), "Empty time index");
                        issues.push(Issue::empty_index(&result.file, None));
                    }
                }
                continue;
            };

            let target = prev_last + self.step_into(result)?;

            match result.span {
                None => {
                    warn!(file = %result.file.display(), assumed_start = target, "Empty time index");
                    issues.push(Issue::empty_index(&result.file, Some(target)));
                    // Pretend the file was there so the next one is not blamed.
                    prev = Some(target);
                }
                Some(span) => {
                    if span.first != target {
                        warn!(
                            file = %result.file.display(),
                            first = span.first,
                            expected = target,
                            offset = span.first - target,
                            "Start index mismatch"
                        );
                        issues.push(Issue::start_mismatch(&result.file, target, span.first));
                    } else {
                        debug!(file = %result.file.display(), first = span.first, "Continuous");
                    }
                    prev = Some(span.last);
                }
            }
        }

        Ok(issues)
    }

    /// Expected distance from the previous file's end to this file's start.
    fn step_into(&self, result: &ScanResult) -> Result<f64> {
        match self.frequency {
            ExpectedFrequency::FixedDelta { value, .. } => Ok(*value),
            ExpectedFrequency::Monthly { calendar } => {
                let month = month_from_path(&result.file)?;
                Ok(f64::from(calendar.days_in_month(month)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;
    use crate::scanner::TimeSpan;
    use std::path::PathBuf;
    use warehouse_common::Calendar;

    fn result(index: usize, name: &str, span: Option<(f64, f64)>) -> ScanResult {
        ScanResult {
            index,
            file: PathBuf::from(name),
            span: span.map(|(first, last)| TimeSpan { first, last }),
            issues: Vec::new(),
        }
    }

    fn fixed(value: f64) -> ExpectedFrequency {
        ExpectedFrequency::FixedDelta { value, units: None }
    }

    #[test]
    fn test_contiguous_fixed_delta_passes() {
        let freq = fixed(1.0);
        let results = vec![
            result(0, "a.0001-01.nc", Some((0.0, 9.0))),
            result(1, "a.0001-02.nc", Some((10.0, 19.0))),
            result(2, "a.0001-03.nc", Some((20.0, 29.0))),
        ];
        assert!(Reconciler::new(&freq).reconcile(&results).unwrap().is_empty());
    }

    #[test]
    fn test_gap_reports_signed_offset() {
        let freq = fixed(1.0);
        let results = vec![
            result(0, "a.0001-01.nc", Some((0.0, 9.0))),
            result(1, "a.0001-02.nc", Some((13.0, 22.0))),
            result(2, "a.0001-03.nc", Some((23.0, 30.0))),
        ];
        let issues = Reconciler::new(&freq).reconcile(&results).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::StartMismatch);
        assert_eq!(issues[0].file, PathBuf::from("a.0001-02.nc"));
        assert_eq!(issues[0].magnitude, Some(3.0));
    }

    #[test]
    fn test_overlap_reports_negative_offset() {
        let freq = fixed(1.0);
        let results = vec![
            result(0, "a.0001-01.nc", Some((0.0, 9.0))),
            result(1, "a.0001-02.nc", Some((8.0, 17.0))),
        ];
        let issues = Reconciler::new(&freq).reconcile(&results).unwrap();
        assert_eq!(issues[0].magnitude, Some(-2.0));
    }

    #[test]
    fn test_empty_file_assumes_expected_span() {
        let freq = fixed(1.0);
        let results = vec![
            result(0, "a.0001-01.nc", Some((0.0, 0.0))),
            result(1, "a.0001-02.nc", None),
            result(2, "a.0001-03.nc", Some((2.0, 2.0))),
        ];
        let issues = Reconciler::new(&freq).reconcile(&results).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::EmptyTimeIndex);
        assert_eq!(issues[0].expected, Some(1.0));
    }

    #[test]
    fn test_leading_empty_file_seeds_from_next() {
        let freq = fixed(1.0);
        let results = vec![
            result(0, "a.0001-01.nc", None),
            result(1, "a.0001-02.nc", Some((5.0, 5.0))),
            result(2, "a.0001-03.nc", Some((6.0, 6.0))),
        ];
        let issues = Reconciler::new(&freq).reconcile(&results).unwrap();
        assert_eq!(issues, vec![Issue::empty_index("a.0001-01.nc", None)]);
    }

    #[test]
    fn test_zero_valued_first_sample_is_not_empty() {
        let freq = fixed(1.0);
        let results = vec![
            result(0, "a.0001-01.nc", Some((0.0, 0.0))),
            result(1, "a.0001-02.nc", Some((1.0, 1.0))),
        ];
        assert!(Reconciler::new(&freq).reconcile(&results).unwrap().is_empty());
    }

    #[test]
    fn test_noleap_year_is_continuous() {
        let freq = ExpectedFrequency::Monthly { calendar: Calendar::noleap() };
        let mut end = 0.0;
        let results: Vec<_> = (1..=12)
            .map(|month| {
                end += f64::from(Calendar::noleap().days_in_month(month).unwrap());
                result(month as usize - 1, &format!("c.h0.0001-{:02}.nc", month), Some((end, end)))
            })
            .collect();
        assert!(Reconciler::new(&freq).reconcile(&results).unwrap().is_empty());
    }

    #[test]
    fn test_monthly_requires_date_stamp() {
        let freq = ExpectedFrequency::Monthly { calendar: Calendar::noleap() };
        let results = vec![
            result(0, "c.h0.0001-01.nc", Some((31.0, 31.0))),
            result(1, "c.h0.nostamp.nc", Some((59.0, 59.0))),
        ];
        assert!(Reconciler::new(&freq).reconcile(&results).is_err());
    }

    #[test]
    fn test_internal_issues_are_kept_in_file_order() {
        let freq = fixed(1.0);
        let mut second = result(1, "a.0001-02.nc", Some((10.0, 19.0)));
        second.issues.push(Issue::internal_delta("a.0001-02.nc", 15.0, 1.0, 2.0));
        let results = vec![result(0, "a.0001-01.nc", Some((0.0, 9.0))), second];
        let issues = Reconciler::new(&freq).reconcile(&results).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InternalDelta);
    }
}
