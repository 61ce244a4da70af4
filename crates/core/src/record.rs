//! Archive records as handed over by the host engine.
//!
//! A [`Record`] maps observation names (`outTemp`, `windSpeed`, ...) to
//! numeric readings. Sensors that reported nothing for the archive period
//! are present with no value, mirroring weewx's `None` readings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::EpochSeconds;

/// Name of the field carrying the record's epoch timestamp.
pub const DATE_TIME_FIELD: &str = "dateTime";

/// One archive record: field name to optional numeric reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Option<f64>>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that sets a reading.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fields.insert(name.into(), Some(value));
        self
    }

    /// Builder-style helper that records a field with no reading.
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// Set (or replace) a reading.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.fields.insert(name.into(), value);
    }

    /// Look up a field.
    ///
    /// The outer `Option` is field presence, the inner one is whether the
    /// sensor produced a value.
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.fields.get(name).copied()
    }

    /// The record's `dateTime`, truncated to whole seconds.
    pub fn date_time(&self) -> Option<EpochSeconds> {
        self.get(DATE_TIME_FIELD).flatten().map(|ts| ts as EpochSeconds)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, f64)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k, Some(v))).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
