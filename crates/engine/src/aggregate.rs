use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::model::Row;
use crate::period::{parse_year, YearRange};

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Field name -> required code. A row matches when every entry equals the
/// row's field exactly. The empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionFilter(BTreeMap<String, String>);

impl DimensionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, code: impl Into<String>) -> Self {
        self.0.insert(field.into(), code.into());
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.0
            .iter()
            .all(|(field, code)| row.field(field) == Some(code.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DimensionFilter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelValue {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub code: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

/// Rows matching `filter`, in input order.
pub fn filter_by_dimension<'a>(rows: &'a [Row], filter: &DimensionFilter) -> Vec<&'a Row> {
    rows.iter().filter(|row| filter.matches(row)).collect()
}

/// Distinct years of `time_dimension`, ascending. Unparseable periods are skipped.
pub fn collect_distinct_years(rows: &[Row], time_dimension: &str) -> Vec<i32> {
    rows.iter()
        .filter_map(|row| row.code(time_dimension).and_then(parse_year))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sum values of rows that match `filter` and fall inside `range`, grouped
/// by `key_of(row, year)`. Groups keep first-seen order; a `None` key skips
/// the row.
pub fn reduce_matching<K, F>(
    rows: &[Row],
    time_dimension: &str,
    filter: &DimensionFilter,
    range: YearRange,
    mut key_of: F,
) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&Row, i32) -> Option<K>,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut totals: Vec<(K, f64)> = Vec::new();

    for row in rows {
        if !filter.matches(row) {
            continue;
        }
        let Some(year) = row.code(time_dimension).and_then(parse_year) else {
            continue;
        };
        if !range.contains(year) {
            continue;
        }
        let Some(key) = key_of(row, year) else {
            continue;
        };

        match slots.get(&key) {
            Some(&slot) => totals[slot].1 += row.value,
            None => {
                slots.insert(key.clone(), totals.len());
                totals.push((key, row.value));
            }
        }
    }

    totals
}

/// Yearly totals of matching rows, ascending by year. Years without matches
/// are absent; see [`align_to_years`] for zero-filling.
pub fn sum_by_year(
    rows: &[Row],
    time_dimension: &str,
    filter: &DimensionFilter,
    range: YearRange,
) -> Vec<YearValue> {
    let mut totals = reduce_matching(rows, time_dimension, filter, range, |_, year| Some(year));
    totals.sort_by_key(|&(year, _)| year);
    totals
        .into_iter()
        .map(|(year, value)| YearValue { year, value })
        .collect()
}

/// Totals of matching rows per period label (months, quarters), in the order
/// labels are first seen.
pub fn sum_by_period_label(
    rows: &[Row],
    time_dimension: &str,
    filter: &DimensionFilter,
    range: YearRange,
) -> Vec<LabelValue> {
    reduce_matching(rows, time_dimension, filter, range, |row, _| {
        row.label(time_dimension).map(str::to_owned)
    })
    .into_iter()
    .map(|(label, value)| LabelValue { label, value })
    .collect()
}

/// Value of the last entry, or 0 for an empty series.
pub fn latest_value(series: &[YearValue]) -> f64 {
    series.last().map_or(0.0, |point| point.value)
}

/// Ascending union of the years present in several series.
pub fn union_years(series: &[&[YearValue]]) -> Vec<i32> {
    series
        .iter()
        .flat_map(|s| s.iter().map(|point| point.year))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One value per year of `years`, 0 where the series has no entry.
pub fn align_to_years(series: &[YearValue], years: &[i32]) -> Vec<f64> {
    let by_year: HashMap<i32, f64> = series.iter().map(|p| (p.year, p.value)).collect();
    years
        .iter()
        .map(|year| by_year.get(year).copied().unwrap_or(0.0))
        .collect()
}

/// Value of the first row in `year` that matches `filter`, or 0.
pub fn value_at_year(rows: &[Row], time_dimension: &str, year: i32, filter: &DimensionFilter) -> f64 {
    rows.iter()
        .find(|row| {
            row.code(time_dimension).and_then(parse_year) == Some(year) && filter.matches(row)
        })
        .map_or(0.0, |row| row.value)
}

/// Distinct categories of `dimension` among `rows`, sorted by label then code.
pub fn distinct_categories(rows: &[Row], dimension: &str) -> Vec<CategoryOption> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for row in rows {
        if let (Some(code), Some(label)) = (row.code(dimension), row.label(dimension)) {
            seen.insert(code, label);
        }
    }
    let mut options: Vec<CategoryOption> = seen
        .into_iter()
        .map(|(code, label)| CategoryOption {
            code: code.to_string(),
            label: label.to_string(),
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.code.cmp(&b.code)));
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIME: &str = "TLIST(A1)";

    fn row(stat: &str, period: &str, value: f64) -> Row {
        Row::new(value, [("STATISTIC", stat), (TIME, period)])
    }

    fn monthly(stat: &str, period: &str, label: &str, value: f64) -> Row {
        Row::new(value, [("STATISTIC", stat), (TIME, period)]).with_label(TIME, label)
    }

    fn stat(code: &str) -> DimensionFilter {
        DimensionFilter::new().with("STATISTIC", code)
    }

    #[test]
    fn filter_is_exact() {
        let rows = vec![row("A", "2020", 5.0), row("B", "2020", 7.0)];
        let series = sum_by_year(&rows, TIME, &stat("A"), YearRange::new(2020, 2020));
        assert_eq!(series, vec![YearValue { year: 2020, value: 5.0 }]);
    }

    #[test]
    fn filter_requires_every_entry() {
        let rows = vec![
            Row::new(1.0, [("STATISTIC", "A"), ("REGION", "-"), (TIME, "2020")]),
            Row::new(2.0, [("STATISTIC", "A"), ("REGION", "IE01"), (TIME, "2020")]),
        ];
        let filter = stat("A").with("REGION", "-");
        assert_eq!(filter_by_dimension(&rows, &filter).len(), 1);
        assert_eq!(filter_by_dimension(&rows, &DimensionFilter::new()).len(), 2);
        assert!(filter_by_dimension(&rows, &stat("A").with("MISSING", "x")).is_empty());
    }

    #[test]
    fn sums_group_by_year_and_sort() {
        let rows = vec![
            row("A", "2022", 1.0),
            row("A", "2020", 2.0),
            row("A", "2022", 3.0),
            row("A", "2021", 4.0),
        ];
        let series = sum_by_year(&rows, TIME, &stat("A"), YearRange::new(2000, 2100));
        let years: Vec<_> = series.iter().map(|p| (p.year, p.value)).collect();
        assert_eq!(years, vec![(2020, 2.0), (2021, 4.0), (2022, 4.0)]);
    }

    #[test]
    fn out_of_range_rows_contribute_nothing() {
        let rows = vec![row("A", "2019", 100.0), row("A", "2020", 1.0), row("A", "2024", 100.0)];
        let series = sum_by_year(&rows, TIME, &stat("A"), YearRange::new(2020, 2023));
        assert_eq!(series, vec![YearValue { year: 2020, value: 1.0 }]);
    }

    #[test]
    fn malformed_periods_are_skipped() {
        let rows = vec![row("A", "2020M01", 9.0), row("A", "2020", 1.0)];
        let series = sum_by_year(&rows, TIME, &stat("A"), YearRange::unbounded());
        assert_eq!(series, vec![YearValue { year: 2020, value: 1.0 }]);
        assert_eq!(collect_distinct_years(&rows, TIME), vec![2020]);
    }

    #[test]
    fn monthly_codes_bucket_into_year() {
        let rows = vec![row("A", "202001", 1.0), row("A", "202002", 2.0), row("A", "20213", 4.0)];
        let series = sum_by_year(&rows, TIME, &stat("A"), YearRange::unbounded());
        assert_eq!(
            series,
            vec![YearValue { year: 2020, value: 3.0 }, YearValue { year: 2021, value: 4.0 }]
        );
    }

    #[test]
    fn empty_inputs() {
        assert!(sum_by_year(&[], TIME, &stat("A"), YearRange::unbounded()).is_empty());
        assert!(sum_by_period_label(&[], TIME, &stat("A"), YearRange::unbounded()).is_empty());
        assert!(collect_distinct_years(&[], TIME).is_empty());
        assert_eq!(latest_value(&[]), 0.0);
    }

    #[test]
    fn period_labels_keep_first_seen_order() {
        let rows = vec![
            monthly("A", "202003", "2020 March", 3.0),
            monthly("A", "202001", "2020 January", 1.0),
            monthly("B", "202002", "2020 February", 50.0),
            monthly("A", "202003", "2020 March", 0.5),
            monthly("A", "201912", "2019 December", 99.0),
        ];
        let series = sum_by_period_label(&rows, TIME, &stat("A"), YearRange::new(2020, 2020));
        assert_eq!(
            series,
            vec![
                LabelValue { label: "2020 March".into(), value: 3.5 },
                LabelValue { label: "2020 January".into(), value: 1.0 },
            ]
        );
    }

    #[test]
    fn distinct_years_dedup_ascending() {
        let rows = vec![row("A", "2021", 1.0), row("B", "202001", 1.0), row("A", "2021", 1.0), row("A", "abc", 1.0)];
        assert_eq!(collect_distinct_years(&rows, TIME), vec![2020, 2021]);
        assert!(collect_distinct_years(&rows, "NOPE").is_empty());
    }

    #[test]
    fn latest_is_last_entry() {
        let series = [YearValue { year: 2020, value: 1.0 }, YearValue { year: 2021, value: 8.0 }];
        assert_eq!(latest_value(&series), 8.0);
    }

    #[test]
    fn align_zero_fills_against_axis() {
        let cattle = [YearValue { year: 2020, value: 1.0 }, YearValue { year: 2022, value: 3.0 }];
        let milk = [YearValue { year: 2021, value: 5.0 }];
        let years = union_years(&[&cattle[..], &milk[..]]);
        assert_eq!(years, vec![2020, 2021, 2022]);
        assert_eq!(align_to_years(&cattle, &years), vec![1.0, 0.0, 3.0]);
        assert_eq!(align_to_years(&milk, &years), vec![0.0, 5.0, 0.0]);
    }

    #[test]
    fn value_at_year_takes_first_match() {
        let rows = vec![row("C1", "2020", 1.0), row("C2", "2020", 2.0), row("C2", "2020", 3.0)];
        assert_eq!(value_at_year(&rows, TIME, 2020, &stat("C2")), 2.0);
        assert_eq!(value_at_year(&rows, TIME, 2021, &stat("C2")), 0.0);
    }

    #[test]
    fn categories_sorted_by_label() {
        let rows = vec![
            Row::new(1.0, [("REGION", "IE05")]).with_label("REGION", "South-West"),
            Row::new(1.0, [("REGION", "IE01")]).with_label("REGION", "Border"),
            Row::new(2.0, [("REGION", "IE05")]).with_label("REGION", "South-West"),
        ];
        let options = distinct_categories(&rows, "REGION");
        assert_eq!(
            options,
            vec![
                CategoryOption { code: "IE01".into(), label: "Border".into() },
                CategoryOption { code: "IE05".into(), label: "South-West".into() },
            ]
        );
    }

    #[test]
    fn custom_grouping_key() {
        let rows = vec![
            Row::new(1.0, [("REGION", "IE01"), (TIME, "2020")]),
            Row::new(2.0, [("REGION", "IE02"), (TIME, "2020")]),
            Row::new(3.0, [("REGION", "IE01"), (TIME, "2021")]),
        ];
        let by_region = reduce_matching(&rows, TIME, &DimensionFilter::new(), YearRange::unbounded(), |row, _| {
            row.code("REGION").map(str::to_owned)
        });
        assert_eq!(by_region, vec![("IE01".to_string(), 4.0), ("IE02".to_string(), 2.0)]);
    }
}
