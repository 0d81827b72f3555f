// Filter engine: turns the UI selection into a typed `FilterSpec` and applies
// it to the session dataset.
use crate::error::ReportError;
use crate::types::Record;
use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;

/// Sentinel offered by the station dropdown.
pub const ALL_STATIONS: &str = "Todas";
/// Sentinel offered by the country multi-select.
pub const ALL_COUNTRIES: &str = "Todos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationFilter {
    All,
    Only(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryFilter {
    All,
    /// An empty set is a valid selection and matches nothing.
    Only(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub years: RangeInclusive<i32>,
    pub station: StationFilter,
    pub countries: CountryFilter,
}

impl FilterSpec {
    /// Build a filter from raw widget values. The station choice and country
    /// selection may contain the `Todas`/`Todos` sentinels.
    pub fn from_selection<S: AsRef<str>>(
        years: (i32, i32),
        station: &str,
        countries: &[S],
    ) -> Result<Self, ReportError> {
        if years.0 > years.1 {
            return Err(ReportError::InvalidFilter(format!(
                "year range {}..={} is empty",
                years.0, years.1
            )));
        }
        let station = if station == ALL_STATIONS {
            StationFilter::All
        } else {
            StationFilter::Only(station.to_string())
        };
        let countries = if countries.iter().any(|c| c.as_ref() == ALL_COUNTRIES) {
            CountryFilter::All
        } else {
            CountryFilter::Only(countries.iter().map(|c| c.as_ref().to_string()).collect())
        };
        Ok(FilterSpec { years: years.0..=years.1, station, countries })
    }

    pub fn matches(&self, r: &Record) -> bool {
        self.years.contains(&r.year)
            && match &self.station {
                StationFilter::All => true,
                StationFilter::Only(s) => r.station == *s,
            }
            && match &self.countries {
                CountryFilter::All => true,
                CountryFilter::Only(set) => set.contains(&r.country),
            }
    }
}

pub fn filter_records(records: &[Record], spec: &FilterSpec) -> Vec<Record> {
    records.iter().filter(|r| spec.matches(r)).cloned().collect()
}

/// The choices the UI layer offers for the current dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    /// `None` when the dataset is empty.
    pub year_bounds: Option<(i32, i32)>,
    /// `Todas` followed by stations in first-seen order.
    pub stations: Vec<String>,
    /// `Todos` followed by countries in first-seen order.
    pub countries: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[Record]) -> Self {
        let year_bounds = records.iter().fold(None, |acc: Option<(i32, i32)>, r| match acc {
            None => Some((r.year, r.year)),
            Some((lo, hi)) => Some((lo.min(r.year), hi.max(r.year))),
        });
        FilterOptions {
            year_bounds,
            stations: with_sentinel(ALL_STATIONS, records.iter().map(|r| r.station.as_str())),
            countries: with_sentinel(ALL_COUNTRIES, records.iter().map(|r| r.country.as_str())),
        }
    }

    /// Full year range, every station, every country.
    pub fn default_spec(&self) -> FilterSpec {
        let (lo, hi) = self.year_bounds.unwrap_or((0, 0));
        FilterSpec {
            years: lo..=hi,
            station: StationFilter::All,
            countries: CountryFilter::All,
        }
    }
}

fn with_sentinel<'a>(sentinel: &str, values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = vec![sentinel.to_string()];
    for v in values {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}
