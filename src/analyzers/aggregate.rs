use crate::analyzers::types::{Direction, Grouped, MissingValues, Ranked, Share, Summary};
use crate::analyzers::utility::{mean, pct};
use std::cmp::Ordering;
use std::hash::Hash;

/// Grouping, averaging, histogram and ranking over in-memory rows.
///
/// Every operation is pure: rows are borrowed, never modified, and empty or
/// malformed input produces empty or zero results rather than an error.
/// The only knob is how missing numeric values are treated, see
/// [`MissingValues`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    missing: MissingValues,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(missing: MissingValues) -> Self {
        Self { missing }
    }

    pub fn missing(&self) -> MissingValues {
        self.missing
    }

    fn resolve(&self, value: Option<f64>) -> Option<f64> {
        match (value, self.missing) {
            (Some(v), _) if v.is_finite() => Some(v),
            (_, MissingValues::AsZero) => Some(0.0),
            (_, MissingValues::Skip) => None,
        }
    }

    fn partition<R, K, FK, FV>(&self, records: &[R], key_fn: FK, value_fn: FV) -> Grouped<K, Vec<f64>>
    where
        K: Eq + Hash + Clone,
        FK: Fn(&R) -> K,
        FV: Fn(&R) -> Option<f64>,
    {
        let mut groups = Grouped::new();
        for record in records {
            let slot = groups.entry_or_insert_with(key_fn(record), Vec::new);
            if let Some(v) = self.resolve(value_fn(record)) {
                slot.push(v);
            }
        }
        groups
    }

    /// Mean of `value_fn` per `key_fn` partition. Partitions with no
    /// contributing values are left out.
    pub fn group_average<R, K, FK, FV>(&self, records: &[R], key_fn: FK, value_fn: FV) -> Grouped<K, f64>
    where
        K: Eq + Hash + Clone,
        FK: Fn(&R) -> K,
        FV: Fn(&R) -> Option<f64>,
    {
        self.partition(records, key_fn, value_fn)
            .filter_map_values(|_, values| (!values.is_empty()).then(|| mean(&values)))
    }

    /// Count, average, highest, lowest and stddev per partition. Partitions
    /// with no contributing values are left out.
    pub fn group_summary<R, K, FK, FV>(&self, records: &[R], key_fn: FK, value_fn: FV) -> Grouped<K, Summary>
    where
        K: Eq + Hash + Clone,
        FK: Fn(&R) -> K,
        FV: Fn(&R) -> Option<f64>,
    {
        self.partition(records, key_fn, value_fn)
            .filter_map_values(|_, values| (!values.is_empty()).then(|| Summary::of(&values)))
    }

    /// Summary of `value_fn` over all records.
    pub fn summarize<R, FV>(&self, records: &[R], value_fn: FV) -> Summary
    where
        FV: Fn(&R) -> Option<f64>,
    {
        let values: Vec<f64> = records
            .iter()
            .filter_map(|r| self.resolve(value_fn(r)))
            .collect();
        Summary::of(&values)
    }

    /// Records sorted by `value_fn` and truncated to `n`. The sort is stable,
    /// so ties keep their input order in both directions.
    pub fn top_n<'a, R, FV>(&self, records: &'a [R], value_fn: FV, n: usize, direction: Direction) -> Vec<&'a R>
    where
        FV: Fn(&R) -> Option<f64>,
    {
        self.sorted(records, value_fn, direction)
            .into_iter()
            .take(n)
            .map(|(_, r)| r)
            .collect()
    }

    /// [`Aggregator::top_n`] with 1-based ranks and the sort value attached.
    pub fn ranked<'a, R, FV>(&self, records: &'a [R], value_fn: FV, n: usize, direction: Direction) -> Vec<Ranked<&'a R>>
    where
        FV: Fn(&R) -> Option<f64>,
    {
        self.sorted(records, value_fn, direction)
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, (value, item))| Ranked {
                rank: i + 1,
                value,
                item,
            })
            .collect()
    }

    fn sorted<'a, R, FV>(&self, records: &'a [R], value_fn: FV, direction: Direction) -> Vec<(f64, &'a R)>
    where
        FV: Fn(&R) -> Option<f64>,
    {
        let mut keyed: Vec<(f64, &R)> = records
            .iter()
            .filter_map(|r| self.resolve(value_fn(r)).map(|v| (v, r)))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        keyed
    }
}

/// Partitions records by `key_fn`, keeping input order within each group.
pub fn group_by<'a, R, K, FK>(records: &'a [R], key_fn: FK) -> Grouped<K, Vec<&'a R>>
where
    K: Eq + Hash + Clone,
    FK: Fn(&R) -> K,
{
    let mut groups = Grouped::new();
    for record in records {
        groups.entry_or_insert_with(key_fn(record), Vec::new).push(record);
    }
    groups
}

/// Counts records per bucket. Buckets nobody falls into do not appear.
pub fn histogram<R, K, FB>(records: &[R], bucket_fn: FB) -> Grouped<K, usize>
where
    K: Eq + Hash + Clone,
    FB: Fn(&R) -> K,
{
    let mut counts = Grouped::new();
    for record in records {
        *counts.entry_or_insert_with(bucket_fn(record), || 0) += 1;
    }
    counts
}

/// Counts records per bucket over a caller-supplied bucket set. Every bucket
/// in `buckets` is present, in that order, even with a zero count; buckets
/// outside the set follow in first-seen order so no record is dropped.
pub fn histogram_over<R, K, FB>(records: &[R], bucket_fn: FB, buckets: &[K]) -> Grouped<K, usize>
where
    K: Eq + Hash + Clone,
    FB: Fn(&R) -> K,
{
    let mut counts = Grouped::new();
    for bucket in buckets {
        counts.entry_or_insert_with(bucket.clone(), || 0);
    }
    for record in records {
        *counts.entry_or_insert_with(bucket_fn(record), || 0) += 1;
    }
    counts
}

/// Turns a histogram into per-bucket shares of its total.
pub fn distribution<K: Clone>(histogram: &Grouped<K, usize>) -> Vec<Share<K>> {
    let total: usize = histogram.values().sum();
    histogram
        .iter()
        .map(|(bucket, &count)| Share {
            bucket: bucket.clone(),
            count,
            percentage: pct(count, total),
        })
        .collect()
}

pub fn filter_by<'a, R, P>(records: &'a [R], predicate: P) -> Vec<&'a R>
where
    P: Fn(&R) -> bool,
{
    records.iter().filter(|r| predicate(r)).collect()
}

/// Distinct keys in first-seen order.
pub fn distinct<R, K, FK>(records: &[R], key_fn: FK) -> Vec<K>
where
    K: Eq + Hash + Clone,
    FK: Fn(&R) -> K,
{
    histogram(records, key_fn).into_vec().into_iter().map(|(k, _)| k).collect()
}

/// [`Aggregator::group_average`] with missing values counted as zero.
pub fn group_average<R, K, FK, FV>(records: &[R], key_fn: FK, value_fn: FV) -> Grouped<K, f64>
where
    K: Eq + Hash + Clone,
    FK: Fn(&R) -> K,
    FV: Fn(&R) -> Option<f64>,
{
    Aggregator::new().group_average(records, key_fn, value_fn)
}

/// [`Aggregator::group_summary`] with missing values counted as zero.
pub fn group_summary<R, K, FK, FV>(records: &[R], key_fn: FK, value_fn: FV) -> Grouped<K, Summary>
where
    K: Eq + Hash + Clone,
    FK: Fn(&R) -> K,
    FV: Fn(&R) -> Option<f64>,
{
    Aggregator::new().group_summary(records, key_fn, value_fn)
}

/// [`Aggregator::top_n`] with missing values counted as zero.
pub fn top_n<'a, R, FV>(records: &'a [R], value_fn: FV, n: usize, direction: Direction) -> Vec<&'a R>
where
    FV: Fn(&R) -> Option<f64>,
{
    Aggregator::new().top_n(records, value_fn, n, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, Value};

    fn result(class: &str, percentage: f64) -> Record {
        Record::from_pairs([
            ("class", Value::from(class)),
            ("percentage", Value::from(percentage)),
        ])
    }

    fn class(r: &Record) -> String {
        r.display("class")
    }

    fn percentage(r: &Record) -> Option<f64> {
        r.number("percentage")
    }

    fn sample() -> Vec<Record> {
        vec![result("10A", 85.0), result("10A", 75.0), result("10B", 90.0)]
    }

    #[test]
    fn test_group_average_by_class() {
        let avg = group_average(&sample(), class, percentage);

        assert_eq!(avg.len(), 2);
        assert_eq!(avg.get("10A"), Some(&80.0));
        assert_eq!(avg.get("10B"), Some(&90.0));
    }

    #[test]
    fn test_group_average_only_uses_own_partition() {
        let records = vec![
            result("9A", 40.0),
            result("10A", 60.0),
            result("9A", 50.0),
            result("10A", 100.0),
            result("11C", 70.0),
        ];
        let avg = group_average(&records, class, percentage);

        for (key, value) in avg.iter() {
            let members: Vec<f64> = records
                .iter()
                .filter(|r| &class(r) == key)
                .filter_map(percentage)
                .collect();
            assert_eq!(*value, mean(&members), "group {key}");
        }
        assert_eq!(avg.keys().cloned().collect::<Vec<_>>(), vec!["9A", "10A", "11C"]);
    }

    #[test]
    fn test_empty_input_gives_empty_results() {
        let records: Vec<Record> = vec![];

        assert!(group_average(&records, class, percentage).is_empty());
        assert!(group_summary(&records, class, percentage).is_empty());
        assert!(top_n(&records, percentage, 5, Direction::Desc).is_empty());
        assert!(histogram(&records, class).is_empty());
        assert_eq!(Aggregator::new().summarize(&records, percentage), Summary::default());
    }

    #[test]
    fn test_missing_values_count_as_zero_by_default() {
        let records = vec![
            result("10A", 80.0),
            Record::from_pairs([("class", "10A"), ("percentage", "absent")]),
        ];
        let avg = group_average(&records, class, percentage);
        assert_eq!(avg.get("10A"), Some(&40.0));
    }

    #[test]
    fn test_missing_values_skipped() {
        let records = vec![
            result("10A", 80.0),
            Record::from_pairs([("class", "10A"), ("percentage", "")]),
            Record::from_pairs([("class", "10C")]),
        ];
        let agg = Aggregator::with_missing(MissingValues::Skip);
        let avg = agg.group_average(&records, class, percentage);

        assert_eq!(avg.get("10A"), Some(&80.0));
        // no contributing values, so no group rather than a division by zero
        assert_eq!(avg.get("10C"), None);
        assert_eq!(agg.top_n(&records, percentage, 10, Direction::Desc).len(), 1);
    }

    #[test]
    fn test_group_summary() {
        let summary = group_summary(&sample(), class, percentage);
        let a = summary.get("10A").unwrap();

        assert_eq!(a.count, 2);
        assert_eq!(a.average, 80.0);
        assert_eq!(a.highest, 85.0);
        assert_eq!(a.lowest, 75.0);
        assert_eq!(a.stddev, 5.0);
    }

    #[test]
    fn test_top_n_desc_and_asc() {
        let records = sample();
        let top = top_n(&records, percentage, 2, Direction::Desc);
        let bottom = top_n(&records, percentage, 2, Direction::Asc);

        assert_eq!(top.iter().map(|r| percentage(r).unwrap()).collect::<Vec<_>>(), vec![90.0, 85.0]);
        assert_eq!(bottom.iter().map(|r| percentage(r).unwrap()).collect::<Vec<_>>(), vec![75.0, 85.0]);
    }

    #[test]
    fn test_top_n_is_stable_for_ties() {
        let records = vec![
            Record::from_pairs([("id", Value::from("a")), ("score", Value::from(70.0))]),
            Record::from_pairs([("id", Value::from("b")), ("score", Value::from(90.0))]),
            Record::from_pairs([("id", Value::from("c")), ("score", Value::from(70.0))]),
            Record::from_pairs([("id", Value::from("d")), ("score", Value::from(90.0))]),
        ];
        let score = |r: &Record| r.number("score");
        let ids = |v: Vec<&Record>| v.iter().map(|r| r.display("id")).collect::<Vec<_>>();

        assert_eq!(ids(top_n(&records, score, 4, Direction::Desc)), vec!["b", "d", "a", "c"]);
        assert_eq!(ids(top_n(&records, score, 4, Direction::Asc)), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_top_n_full_length_desc_is_reverse_of_asc() {
        let records = vec![
            result("x", 55.0),
            result("y", 91.0),
            result("z", 67.5),
            result("w", 12.0),
        ];
        let n = records.len();
        let desc = top_n(&records, percentage, n, Direction::Desc);
        let mut asc = top_n(&records, percentage, n, Direction::Asc);
        asc.reverse();

        assert_eq!(desc, asc);
    }

    #[test]
    fn test_ranked_attaches_ranks() {
        let records = sample();
        let ranked = Aggregator::new().ranked(&records, percentage, 3, Direction::Desc);

        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ranked[0].value, 90.0);
        assert_eq!(class(ranked[0].item), "10B");
    }

    #[test]
    fn test_histogram_counts_sum_to_total() {
        let records = vec![
            Record::from_pairs([("grade", "A")]),
            Record::from_pairs([("grade", "B+")]),
            Record::from_pairs([("grade", "A")]),
            Record::from_pairs([("grade", "F")]),
        ];
        let h = histogram(&records, |r| r.display("grade"));

        assert_eq!(h.get("A"), Some(&2));
        assert_eq!(h.get("C"), None);
        assert_eq!(h.values().sum::<usize>(), records.len());
    }

    #[test]
    fn test_histogram_over_keeps_zero_buckets() {
        let records = vec![
            Record::from_pairs([("grade", "B")]),
            Record::from_pairs([("grade", "N/A")]),
        ];
        let buckets = ["A".to_string(), "B".to_string(), "C".to_string()];
        let h = histogram_over(&records, |r| r.display("grade"), &buckets);

        assert_eq!(h.keys().cloned().collect::<Vec<_>>(), vec!["A", "B", "C", "N/A"]);
        assert_eq!(h.get("A"), Some(&0));
        assert_eq!(h.values().sum::<usize>(), records.len());
    }

    #[test]
    fn test_distribution_percentages() {
        let records = vec![
            Record::from_pairs([("grade", "A")]),
            Record::from_pairs([("grade", "A")]),
            Record::from_pairs([("grade", "B")]),
            Record::from_pairs([("grade", "C")]),
        ];
        let shares = distribution(&histogram(&records, |r| r.display("grade")));

        assert_eq!(shares[0].bucket, "A");
        assert_eq!(shares[0].percentage, 50.0);
        assert_eq!(shares[2].percentage, 25.0);
    }

    #[test]
    fn test_filter_by_and_distinct() {
        let records = sample();
        let only_a = filter_by(&records, |r| class(r) == "10A");

        assert_eq!(only_a.len(), 2);
        assert_eq!(distinct(&records, class), vec!["10A", "10B"]);
    }

    #[test]
    fn test_group_by_keeps_input_order() {
        let records = vec![result("10B", 1.0), result("10A", 2.0), result("10B", 3.0)];
        let groups = group_by(&records, class);

        let b: Vec<f64> = groups.get("10B").unwrap().iter().filter_map(|r| percentage(r)).collect();
        assert_eq!(b, vec![1.0, 3.0]);
        assert_eq!(groups.keys().cloned().collect::<Vec<_>>(), vec!["10B", "10A"]);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = sample();
        let before = records.clone();

        let first = group_summary(&records, class, percentage);
        let second = group_summary(&records, class, percentage);

        assert_eq!(first, second);
        assert_eq!(records, before);
    }
}
