// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::{self, Write};
use std::ops::Neg;
use std::time::Duration;

/// Type of metric that knows how to display itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Timer,
    Gauge,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricType::Counter => "c".fmt(f),
            MetricType::Timer => "ms".fmt(f),
            MetricType::Gauge => "g".fmt(f),
        }
    }
}

/// Holder for primitive metric values that knows how to display itself
///
/// Values are converted from the common numeric types (and `Duration`,
/// as a number of milliseconds) via `From`, so most callers never need
/// to name this type directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl MetricValue {
    /// Render this value as a whole number, truncating any fractional part
    /// toward zero. Used for timings which are always integer milliseconds.
    fn write_integer(&self, out: &mut String) {
        let _ = match *self {
            MetricValue::Signed(v) => write!(out, "{}", v),
            MetricValue::Unsigned(v) => write!(out, "{}", v),
            MetricValue::Float(v) => write!(out, "{}", v.trunc() as i64),
        };
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Signed(v) => v.fmt(f),
            MetricValue::Unsigned(v) => v.fmt(f),
            MetricValue::Float(v) => v.fmt(f),
        }
    }
}

impl Neg for MetricValue {
    type Output = MetricValue;

    fn neg(self) -> MetricValue {
        match self {
            MetricValue::Signed(v) => MetricValue::Signed(v.saturating_neg()),
            MetricValue::Unsigned(v) if v > i64::MAX as u64 => MetricValue::Signed(i64::MIN),
            MetricValue::Unsigned(v) => MetricValue::Signed(-(v as i64)),
            MetricValue::Float(v) => MetricValue::Float(-v),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Signed(v)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Signed(i64::from(v))
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Unsigned(v)
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Unsigned(u64::from(v))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Float(f64::from(v))
    }
}

impl From<Duration> for MetricValue {
    fn from(v: Duration) -> Self {
        let as_millis = v.as_millis();
        if as_millis > u64::MAX as u128 {
            MetricValue::Unsigned(u64::MAX)
        } else {
            MetricValue::Unsigned(as_millis as u64)
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    key: &'a str,
    val: MetricValue,
    type_: MetricType,
    sample_rate: Option<f64>,
    base_size: usize,
}

impl<'a> MetricFormatter<'a> {
    const SAMPLE_RATE_PREFIX: &'static str = "|@";

    #[cfg(test)]
    fn counter(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Counter)
    }

    #[cfg(test)]
    fn timer(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Timer)
    }

    #[cfg(test)]
    fn gauge(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Gauge)
    }

    #[rustfmt::skip]
    pub(crate) fn from_val(prefix: &'a str, key: &'a str, val: MetricValue, type_: MetricType) -> Self {
        MetricFormatter {
            prefix,
            key,
            val,
            type_,
            sample_rate: None,
            base_size: prefix.len() + key.len() + 1 /* : */ + 10 /* value */ + 1 /* | */ + 2, /* type */
        }
    }

    /// Record the rate the metric was sampled at. Only counters carry the
    /// rate on the wire and only when it is below one.
    pub(crate) fn with_sample_rate(&mut self, rate: f64) {
        self.sample_rate = Some(rate);
    }

    fn sample_rate_suffix(&self) -> Option<f64> {
        match (self.type_, self.sample_rate) {
            (MetricType::Counter, Some(rate)) if rate < 1.0 => Some(rate),
            _ => None,
        }
    }

    fn write_base_metric(&self, out: &mut String) {
        out.push_str(self.prefix);
        out.push_str(self.key);
        out.push(':');
        match self.type_ {
            MetricType::Timer => self.val.write_integer(out),
            _ => {
                let _ = write!(out, "{}", self.val);
            }
        }
        let _ = write!(out, "|{}", self.type_);
    }

    fn write_sample_rate(&self, out: &mut String) {
        if let Some(rate) = self.sample_rate_suffix() {
            out.push_str(Self::SAMPLE_RATE_PREFIX);
            let _ = write!(out, "{}", rate);
        }
    }

    pub(crate) fn format(&self) -> String {
        let mut metric_string = String::with_capacity(self.base_size + 12);
        self.write_base_metric(&mut metric_string);
        self.write_sample_rate(&mut metric_string);
        metric_string
    }
}
