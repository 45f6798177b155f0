//! Time series generators.
//!
//! Values are raw offsets in days, the way model history files store them.

use warehouse_common::Calendar;

/// Units string used on generated axes.
pub const DAYS_SINCE: &str = "days since 0001-01-01 00:00:00";

/// `count` values starting at `start`, `step` apart.
///
/// # Example
///
/// ```
/// use test_utils::fixed_series;
///
/// assert_eq!(fixed_series(10.0, 0.5, 3), vec![10.0, 10.5, 11.0]);
/// ```
pub fn fixed_series(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// End-of-month offsets for `years` no-leap years starting at year 1.
///
/// Monthly history files stamp each mean at the end of its month, so the
/// first value is 31 (end of January) and the twelfth is 365.
///
/// ```
/// use test_utils::noleap_month_ends;
///
/// let ends = noleap_month_ends(1);
/// assert_eq!(ends[0], 31.0);
/// assert_eq!(ends[1], 59.0);
/// assert_eq!(ends[11], 365.0);
/// ```
pub fn noleap_month_ends(years: u32) -> Vec<f64> {
    let calendar = Calendar::noleap();
    let mut end = 0.0;
    let mut values = Vec::with_capacity(years as usize * 12);
    for _ in 0..years {
        for month in 1..=12 {
            end += f64::from(calendar.days_in_month(month).unwrap_or_default());
            values.push(end);
        }
    }
    values
}

/// Monthly history file names `<case>.cam.h0.YYYY-MM.nc`, starting at year 1.
pub fn monthly_names(case: &str, years: u32) -> Vec<String> {
    (1..=years)
        .flat_map(|year| (1..=12).map(move |month| (year, month)))
        .map(|(year, month)| format!("{}.cam.h0.{:04}-{:02}.nc", case, year, month))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noleap_deltas() {
        let ends = noleap_month_ends(2);
        assert_eq!(ends.len(), 24);
        assert_eq!(ends[23], 730.0);
        let deltas: Vec<f64> = std::iter::once(ends[0])
            .chain(ends.windows(2).map(|w| w[1] - w[0]))
            .take(12)
            .collect();
        assert_eq!(
            deltas,
            vec![31.0, 28.0, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0]
        );
    }

    #[test]
    fn test_monthly_names() {
        let names = monthly_names("case", 2);
        assert_eq!(names.len(), 24);
        assert_eq!(names[0], "case.cam.h0.0001-01.nc");
        assert_eq!(names[23], "case.cam.h0.0002-12.nc");
    }
}
