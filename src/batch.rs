// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::slice;

/// Caller owned buffer of fully formatted metric lines.
///
/// Metrics can be collected into a `Batch` instead of being sent one by
/// one, then written in a single packet with `MetricClient::send_batch`.
/// The lines are joined with a newline when sent. Sending a batch does not
/// clear it; call `.clear()` to reuse the buffer.
///
/// # Example
///
/// ```
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::{Batch, EmitOptions, StatsdClient, NopMetricSink};
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink);
/// let mut batch = Batch::new();
///
/// client.incr_with("requests", 1i64.into(), EmitOptions::new().buffer(&mut batch));
/// client.timing_with("request.time", 42u64.into(), EmitOptions::new().buffer(&mut batch));
///
/// assert_eq!(
///     "my.prefix.requests:1|c\nmy.prefix.request.time:42|ms",
///     batch.to_payload()
/// );
///
/// client.send_batch(&batch);
/// batch.clear();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    lines: Vec<String>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Batch {
            lines: Vec::with_capacity(cap),
        }
    }

    /// Append an already formatted metric line.
    pub fn push<S>(&mut self, line: S)
    where
        S: Into<String>,
    {
        self.lines.push(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.lines.iter()
    }

    /// The packet this batch is sent as: every line, in order, separated
    /// by a single newline with no trailing newline.
    pub fn to_payload(&self) -> String {
        self.lines.join("\n")
    }
}

impl From<Vec<String>> for Batch {
    fn from(lines: Vec<String>) -> Self {
        Batch { lines }
    }
}

impl<'a> From<&'a [&'a str]> for Batch {
    fn from(lines: &'a [&'a str]) -> Self {
        Batch {
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Extend<String> for Batch {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.lines.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Batch;

    #[test]
    fn test_batch_payload_joins_with_newline() {
        let batch = Batch::from(&["a:1|c", "b:2|g"][..]);
        assert_eq!("a:1|c\nb:2|g", batch.to_payload());
    }

    #[test]
    fn test_batch_payload_single_line() {
        let mut batch = Batch::new();
        batch.push("a:1|c");

        assert_eq!("a:1|c", batch.to_payload());
        assert_eq!(1, batch.len());
    }

    #[test]
    fn test_batch_empty() {
        let batch = Batch::with_capacity(8);

        assert!(batch.is_empty());
        assert_eq!("", batch.to_payload());
    }

    #[test]
    fn test_batch_clear_and_reuse() {
        let mut batch = Batch::new();
        batch.extend(vec!["x:1|c".to_string(), "y:2|c".to_string()]);
        batch.clear();
        batch.push("z:3|c".to_string());

        let lines: Vec<&String> = (&batch).into_iter().collect();
        assert_eq!(vec!["z:3|c"], lines);
    }
}
