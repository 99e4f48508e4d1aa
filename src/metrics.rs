//! Run metrics.
//!
//! [`MetricsCollector`] keeps named metrics for one run: statement and row
//! counts per dataset, unit counts, failures and timings. At the end of a run
//! the collector can be printed or saved as JSON.
//!
//! ```
//! use trig_export::metrics::{GaugeMetric, MetricsCollector};
//!
//! let mut metrics = MetricsCollector::new();
//! metrics.increment_counter("artists.statements", 2);
//! metrics.increment_counter("artists.statements", 3);
//! metrics.register(Box::new(GaugeMetric::new("artists.seconds", 0.25)));
//!
//! let json = metrics.to_json();
//! assert_eq!(json["artists.statements"]["value"], 5);
//! ```

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// A named value reported at the end of a run.
pub trait Metric: Any {
    fn name(&self) -> &str;

    fn value(&self) -> Value;

    fn description(&self) -> Option<&str> {
        None
    }

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Metrics of one run, ordered by name.
#[derive(Default)]
pub struct MetricsCollector {
    metrics: BTreeMap<String, Box<dyn Metric>>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric, replacing any metric with the same name.
    pub fn register(&mut self, metric: Box<dyn Metric>) {
        self.metrics.insert(metric.name().to_string(), metric);
    }

    pub fn record_start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn record_end(&mut self) {
        self.end_time = Some(Instant::now());
    }

    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Add `value` to the counter `name`, creating it at zero if needed.
    ///
    /// A non-counter metric with the same name is replaced.
    pub fn increment_counter(&mut self, name: &str, value: u64) {
        if let Some(counter) = self
            .metrics
            .get_mut(name)
            .and_then(|m| m.as_any_mut().downcast_mut::<CounterMetric>())
        {
            counter.count += value;
            return;
        }
        self.register(Box::new(CounterMetric::with_value(name, value)));
    }

    /// Current value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.metrics.get(name).map(|m| m.value())
    }

    /// Every metric as `{ name: { value, description? } }`, plus
    /// `execution_time_ms` once the run has ended.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        for (name, metric) in &self.metrics {
            let mut entry = serde_json::Map::new();
            entry.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                entry.insert("description".to_string(), json!(desc));
            }
            out.insert(name.clone(), Value::Object(entry));
        }
        if let Some(elapsed) = self.elapsed() {
            out.insert(
                "execution_time_ms".to_string(),
                json!({
                    "value": elapsed.as_millis() as u64,
                    "description": "Total run time in milliseconds",
                }),
            );
        }
        Value::Object(out)
    }

    /// Print every metric to stdout.
    pub fn print(&self) {
        println!("\n=========== Export Metrics ===========");
        if let Some(elapsed) = self.elapsed() {
            println!(
                "Execution Time: {:.3}s ({} ms)",
                elapsed.as_secs_f64(),
                elapsed.as_millis()
            );
            println!("--------------------------------------");
        }
        for (name, metric) in &self.metrics {
            match metric.description() {
                Some(desc) => println!("{name}: {} ({desc})", metric.value()),
                None => println!("{name}: {}", metric.value()),
            }
        }
        println!("======================================\n");
    }

    /// Save [`to_json`](Self::to_json) as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, text).with_context(|| format!("write metrics to {}", path.display()))
    }
}

/// A monotonically increasing count.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A single numeric reading.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_replaces_a_gauge_of_the_same_name() {
        let mut m = MetricsCollector::new();
        m.register(Box::new(GaugeMetric::new("x", 1.5)));
        m.increment_counter("x", 4);
        assert_eq!(m.get("x"), Some(json!(4)));
    }

    #[test]
    fn elapsed_needs_start_and_end() {
        let mut m = MetricsCollector::new();
        assert!(m.elapsed().is_none());
        m.record_start();
        assert!(m.to_json().get("execution_time_ms").is_none());
        m.record_end();
        assert!(m.elapsed().is_some());
        assert!(m.to_json().get("execution_time_ms").is_some());
    }

    #[test]
    fn saves_pretty_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("metrics.json");
        let mut m = MetricsCollector::new();
        m.register(Box::new(
            GaugeMetric::new("rate", 2.0).with_description("statements per second"),
        ));
        m.save_to_file(&path)?;
        let back: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(back["rate"]["description"], "statements per second");
        Ok(())
    }
}
