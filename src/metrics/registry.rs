// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Process-wide set of named gauges.
//!
//! The registry is constructed and populated at startup, then shared by
//! reference with the scrape loop (the only writer) and the HTTP handler
//! (read-only). All storage sits behind one `RwLock` that is held for a
//! single write batch or a single render, never across a sensor query.
//!
//! A gauge that has never been written is left out of the rendered output
//! entirely. Once written, a value is only ever overwritten, never cleared.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::metrics::MetricBuilder;

/// One pending value for [`MetricRegistry::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricWrite<'a> {
    pub name: &'a str,
    pub labels: Vec<String>,
    pub value: f64,
}

impl<'a> MetricWrite<'a> {
    pub fn scalar(name: &'a str, value: f64) -> Self {
        Self {
            name,
            labels: Vec::new(),
            value,
        }
    }

    pub fn vector(name: &'a str, labels: Vec<String>, value: f64) -> Self {
        Self {
            name,
            labels,
            value,
        }
    }
}

/// One label value as stored in a series key. Purely numeric values (device
/// indices) sort numerically, so `gpu="2"` renders before `gpu="10"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LabelValue {
    numeric: Option<u64>,
    text: String,
}

impl LabelValue {
    fn new(text: &str) -> Self {
        Self {
            numeric: text.parse().ok(),
            text: text.to_string(),
        }
    }
}

fn series_key<S: AsRef<str>>(label_values: &[S]) -> Vec<LabelValue> {
    label_values
        .iter()
        .map(|v| LabelValue::new(v.as_ref()))
        .collect()
}

#[derive(Debug)]
enum Series {
    Scalar(Option<f64>),
    Vector {
        label_keys: Vec<String>,
        values: BTreeMap<Vec<LabelValue>, f64>,
    },
}

impl Series {
    fn label_arity(&self) -> usize {
        match self {
            Series::Scalar(_) => 0,
            Series::Vector { label_keys, .. } => label_keys.len(),
        }
    }
}

#[derive(Debug)]
struct MetricEntry {
    name: String,
    help: String,
    series: Series,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<MetricEntry>,
    by_name: HashMap<String, usize>,
}

impl Inner {
    fn register(&mut self, name: &str, help: &str, series: Series) -> Result<()> {
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateMetric(name.to_string()));
        }
        self.by_name.insert(name.to_string(), self.entries.len());
        self.entries.push(MetricEntry {
            name: name.to_string(),
            help: help.to_string(),
            series,
        });
        Ok(())
    }

    fn position(&self, write: &MetricWrite<'_>) -> Result<usize> {
        let position = *self
            .by_name
            .get(write.name)
            .ok_or_else(|| Error::UnknownMetric(write.name.to_string()))?;
        let expected = self.entries[position].series.label_arity();
        if expected != write.labels.len() {
            return Err(Error::LabelMismatch {
                name: write.name.to_string(),
                expected,
                actual: write.labels.len(),
            });
        }
        Ok(position)
    }
}

#[derive(Debug, Default)]
pub struct MetricRegistry {
    inner: RwLock<Inner>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unlabeled gauge. Registering a name twice is an error.
    pub fn register_scalar(&self, name: &str, help: &str) -> Result<()> {
        self.write().register(name, help, Series::Scalar(None))
    }

    /// Register a gauge with one value per combination of `label_keys`.
    pub fn register_vector(&self, name: &str, help: &str, label_keys: &[&str]) -> Result<()> {
        let series = Series::Vector {
            label_keys: label_keys.iter().map(|k| k.to_string()).collect(),
            values: BTreeMap::new(),
        };
        self.write().register(name, help, series)
    }

    pub fn set_scalar(&self, name: &str, value: f64) -> Result<()> {
        self.apply(&[MetricWrite::scalar(name, value)])
    }

    pub fn set_vector(&self, name: &str, label_values: &[&str], value: f64) -> Result<()> {
        let labels = label_values.iter().map(|v| v.to_string()).collect();
        self.apply(&[MetricWrite::vector(name, labels, value)])
    }

    /// Apply a batch of writes atomically with respect to [`render`].
    ///
    /// The whole batch is validated before anything is written; if any write
    /// is invalid, nothing changes.
    ///
    /// [`render`]: MetricRegistry::render
    pub fn apply(&self, writes: &[MetricWrite<'_>]) -> Result<()> {
        let mut inner = self.write();
        let positions = writes
            .iter()
            .map(|write| inner.position(write))
            .collect::<Result<Vec<_>>>()?;

        for (write, position) in writes.iter().zip(positions) {
            match &mut inner.entries[position].series {
                Series::Scalar(value) => *value = Some(write.value),
                Series::Vector { values, .. } => {
                    values.insert(series_key(&write.labels), write.value);
                }
            }
        }
        Ok(())
    }

    /// Current value of a gauge, if it has been written. Pass no labels for
    /// scalar gauges.
    pub fn value(&self, name: &str, label_values: &[&str]) -> Option<f64> {
        let inner = self.read();
        let entry = &inner.entries[*inner.by_name.get(name)?];
        match &entry.series {
            Series::Scalar(value) if label_values.is_empty() => *value,
            Series::Scalar(_) => None,
            Series::Vector { values, .. } => values.get(&series_key(label_values)).copied(),
        }
    }

    /// Render every written gauge in Prometheus text exposition format.
    ///
    /// Families appear in registration order and vector series in label
    /// order (numeric label values compared as numbers), so output only
    /// changes when a value does.
    pub fn render(&self) -> String {
        let inner = self.read();
        let mut builder = MetricBuilder::new();

        for entry in &inner.entries {
            match &entry.series {
                Series::Scalar(None) => {}
                Series::Scalar(Some(value)) => {
                    builder
                        .help(&entry.name, &entry.help)
                        .type_(&entry.name, "gauge")
                        .metric(&entry.name, &[], *value);
                }
                Series::Vector { values, .. } if values.is_empty() => {}
                Series::Vector { label_keys, values } => {
                    builder
                        .help(&entry.name, &entry.help)
                        .type_(&entry.name, "gauge");
                    for (label_values, value) in values {
                        let labels: Vec<(&str, &str)> = label_keys
                            .iter()
                            .map(String::as_str)
                            .zip(label_values.iter().map(|v| v.text.as_str()))
                            .collect();
                        builder.metric(&entry.name, &labels, *value);
                    }
                }
            }
        }

        builder.build()
    }

    // Writers validate before mutating, so a poisoned lock still guards
    // consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
