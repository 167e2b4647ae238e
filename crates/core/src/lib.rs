//! Core types shared across the analytics gateway.

pub mod error;
pub mod events;
pub mod limits;
pub mod query;

pub use error::{Error, Result};
pub use events::Event;
pub use query::{
    AggregationKind, AnalyticsQuery, AnalyticsResult, AnalyticsRow, CompareQuery, CompareResult,
    DataKeysResult, DataPoint, GaugeQuery, GaugeResult, IntervalKind, LabelValuesResult,
    QueryFilter, SearchParams, SearchResult, TimeSeries, TimeSeriesQuery, TimeSeriesResult,
    TopNQuery, TopNResult, TopNRow,
};
