use crate::types::{DimValue, Dimension, Record};
use crate::util::mean;
use std::collections::{HashMap, HashSet};

/// Which dimensions a grouping uses. Pairs are stored in canonical
/// (country, station, year) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    One(Dimension),
    Two(Dimension, Dimension),
}

impl GroupBy {
    pub fn pair(a: Dimension, b: Dimension) -> Self {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => GroupBy::Two(a, b),
            std::cmp::Ordering::Greater => GroupBy::Two(b, a),
            std::cmp::Ordering::Equal => GroupBy::One(a),
        }
    }

    pub fn dims(&self) -> Vec<Dimension> {
        match *self {
            GroupBy::One(d) => vec![d],
            GroupBy::Two(a, b) => vec![a, b],
        }
    }

    pub fn contains(&self, dim: Dimension) -> bool {
        self.dims().contains(&dim)
    }

    fn key_of(&self, r: &Record) -> GroupKey {
        match *self {
            GroupBy::One(d) => GroupKey::Single(r.value(d)),
            GroupBy::Two(a, b) => GroupKey::Pair(r.value(a), r.value(b)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Single(DimValue),
    Pair(DimValue, DimValue),
}

impl GroupKey {
    /// Compose a key from `(dimension, value)` parts in any order.
    pub fn compose(parts: &[(Dimension, DimValue)]) -> Option<GroupKey> {
        let mut parts = parts.to_vec();
        parts.sort_by_key(|(d, _)| *d);
        let mut it = parts.into_iter().map(|(_, v)| v);
        match (it.next(), it.next(), it.next()) {
            (Some(a), None, None) => Some(GroupKey::Single(a)),
            (Some(a), Some(b), None) => Some(GroupKey::Pair(a, b)),
            _ => None,
        }
    }

    /// Value of `dim` inside this key, given the grouping that produced it.
    pub fn value(&self, group_by: GroupBy, dim: Dimension) -> Option<&DimValue> {
        match (self, group_by) {
            (GroupKey::Single(v), GroupBy::One(d)) if d == dim => Some(v),
            (GroupKey::Pair(va, _), GroupBy::Two(a, _)) if a == dim => Some(va),
            (GroupKey::Pair(_, vb), GroupBy::Two(_, b)) if b == dim => Some(vb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Mean of the present KPI values.
    MeanKpi,
    /// Number of rows, including rows without a KPI value.
    Count,
    /// Number of rows that carry a KPI value.
    SampleSize,
    /// Number of distinct stage ids.
    DistinctProjects,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggValue {
    Mean(Option<f64>),
    Count(usize),
}

impl AggValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AggValue::Mean(m) => m,
            AggValue::Count(n) => Some(n as f64),
        }
    }
}

/// Evaluate `metric` over one bucket. An empty bucket yields no mean and
/// zero counts.
pub fn aggregate_group<'a, I>(records: I, metric: Metric) -> AggValue
where
    I: IntoIterator<Item = &'a Record>,
{
    let records = records.into_iter();
    match metric {
        Metric::MeanKpi => AggValue::Mean(mean(records.filter_map(|r| r.kpi))),
        Metric::Count => AggValue::Count(records.count()),
        Metric::SampleSize => AggValue::Count(records.filter(|r| r.kpi.is_some()).count()),
        Metric::DistinctProjects => {
            let ids: HashSet<&str> = records.filter_map(|r| r.stage_id.as_deref()).collect();
            AggValue::Count(ids.len())
        }
    }
}

/// Grouped results in first-seen key order.
#[derive(Debug, Clone)]
pub struct GroupedAggregate {
    pub group_by: GroupBy,
    pub metric: Metric,
    entries: Vec<(GroupKey, AggValue)>,
    index: HashMap<GroupKey, usize>,
}

impl GroupedAggregate {
    pub fn entries(&self) -> &[(GroupKey, AggValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &GroupKey) -> Option<AggValue> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    /// Lookup by `(dimension, value)` parts in any order.
    pub fn lookup(&self, parts: &[(Dimension, DimValue)]) -> Option<AggValue> {
        GroupKey::compose(parts).and_then(|k| self.get(&k))
    }
}

pub fn aggregate(records: &[Record], group_by: GroupBy, metric: Metric) -> GroupedAggregate {
    let mut buckets: Vec<(GroupKey, Vec<&Record>)> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    for r in records {
        let key = group_by.key_of(r);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            buckets.push((key, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(r);
    }
    let entries = buckets
        .into_iter()
        .map(|(k, rs)| (k, aggregate_group(rs, metric)))
        .collect();
    GroupedAggregate { group_by, metric, entries, index }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(country: &str, year: i32, station: &str, kpi: Option<f64>, id: &str) -> Record {
        Record {
            country: country.to_string(),
            year,
            station: station.to_string(),
            kpi,
            productivity: None,
            stage_id: Some(id.to_string()),
        }
    }

    fn text(s: &str) -> DimValue {
        DimValue::Text(s.to_string())
    }

    #[test]
    fn mean_skips_missing_values() {
        let rs = vec![
            rec("Paraguay", 2020, "Vigencia", Some(2.0), "P1"),
            rec("Paraguay", 2020, "Vigencia", None, "P1"),
            rec("Paraguay", 2020, "Vigencia", Some(4.0), "P2"),
        ];
        let g = GroupBy::One(Dimension::Country);
        let key = GroupKey::Single(text("Paraguay"));
        assert_eq!(aggregate(&rs, g, Metric::MeanKpi).get(&key), Some(AggValue::Mean(Some(3.0))));
        assert_eq!(aggregate(&rs, g, Metric::Count).get(&key), Some(AggValue::Count(3)));
        assert_eq!(aggregate(&rs, g, Metric::SampleSize).get(&key), Some(AggValue::Count(2)));
        assert_eq!(aggregate(&rs, g, Metric::DistinctProjects).get(&key), Some(AggValue::Count(2)));
    }

    #[test]
    fn group_without_values_has_no_mean() {
        let rs = vec![rec("Brasil", 2021, "Aprobación", None, "B1")];
        let agg = aggregate(&rs, GroupBy::One(Dimension::Country), Metric::MeanKpi);
        assert_eq!(agg.get(&GroupKey::Single(text("Brasil"))), Some(AggValue::Mean(None)));
    }

    #[test]
    fn empty_group_yields_no_value_and_zero_counts() {
        let none: Vec<Record> = Vec::new();
        assert_eq!(aggregate_group(&none, Metric::MeanKpi), AggValue::Mean(None));
        assert_eq!(aggregate_group(&none, Metric::Count), AggValue::Count(0));
        assert_eq!(aggregate_group(&none, Metric::DistinctProjects), AggValue::Count(0));
        assert!(aggregate(&none, GroupBy::One(Dimension::Year), Metric::Count).is_empty());
    }

    #[test]
    fn pair_keys_are_order_independent() {
        let rs = vec![
            rec("Argentina", 2020, "Vigencia", Some(1.0), "A"),
            rec("Argentina", 2021, "Vigencia", Some(5.0), "B"),
        ];
        let by = GroupBy::pair(Dimension::Year, Dimension::Country);
        let agg = aggregate(&rs, by, Metric::MeanKpi);
        assert_eq!(agg.group_by, GroupBy::Two(Dimension::Country, Dimension::Year));
        let year = (Dimension::Year, DimValue::Year(2021));
        let country = (Dimension::Country, text("Argentina"));
        let a = agg.lookup(&[year.clone(), country.clone()]);
        let b = agg.lookup(&[country, year]);
        assert_eq!(a, Some(AggValue::Mean(Some(5.0))));
        assert_eq!(a, b);
    }

    #[test]
    fn keys_keep_first_seen_order_and_unknown_values() {
        let rs = vec![
            rec("Uruguay", 2020, "Vigencia", Some(1.0), "U"),
            rec("Atlantis", 2020, "Vigencia", Some(2.0), "X"),
            rec("Uruguay", 2021, "Vigencia", Some(3.0), "U"),
        ];
        let agg = aggregate(&rs, GroupBy::One(Dimension::Country), Metric::Count);
        let keys: Vec<_> = agg.entries().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![GroupKey::Single(text("Uruguay")), GroupKey::Single(text("Atlantis"))]
        );
    }

    #[test]
    fn key_value_extraction() {
        let g = GroupBy::pair(Dimension::Station, Dimension::Country);
        let k = GroupKey::Pair(text("Bolivia"), text("Vigencia"));
        assert_eq!(k.value(g, Dimension::Station), Some(&text("Vigencia")));
        assert_eq!(k.value(g, Dimension::Year), None);
    }
}
