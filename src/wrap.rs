// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::batch::Batch;
use crate::client::{EmitOptions, MetricClient};
use crate::format::MetricValue;
use crate::types::{ErrorKind, MetricError, MetricResult};

const PLACEHOLDER: &str = "%s";

/// `MetricClient` that rewrites every metric name through a template before
/// delegating to another client.
///
/// The template contains a `%s` placeholder that is replaced by the name
/// given by the caller. Only the first `%s` is a placeholder, any after it
/// are kept as written. Everything else (values, sample rates, buffers) is
/// passed through untouched.
///
/// # Example
///
/// ```
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::{PrefixingClient, StatsdClient, SpyMetricSink};
///
/// let (rx, sink) = SpyMetricSink::new();
/// let client = StatsdClient::from_sink("", sink);
/// let wrapped = PrefixingClient::new(client, "svc.%s").unwrap();
///
/// wrapped.incr("hits");
///
/// assert_eq!(b"svc.hits:1|c".to_vec(), rx.recv().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct PrefixingClient<C> {
    wrapped: C,
    head: String,
    tail: String,
}

impl<C> PrefixingClient<C>
where
    C: MetricClient,
{
    /// Wrap a client with a name template.
    ///
    /// # Failures
    ///
    /// This method fails with `ErrorKind::InvalidInput` when the template
    /// has no `%s` placeholder.
    pub fn new(wrapped: C, template: &str) -> MetricResult<Self> {
        let (head, tail) = template
            .split_once(PLACEHOLDER)
            .ok_or_else(|| MetricError::from((ErrorKind::InvalidInput, "Template has no %s placeholder")))?;

        Ok(PrefixingClient {
            wrapped,
            head: head.to_string(),
            tail: tail.to_string(),
        })
    }

    pub fn get_ref(&self) -> &C {
        &self.wrapped
    }

    pub fn into_inner(self) -> C {
        self.wrapped
    }

    fn name(&self, key: &str) -> String {
        let mut out = String::with_capacity(self.head.len() + key.len() + self.tail.len());
        out.push_str(&self.head);
        out.push_str(key);
        out.push_str(&self.tail);
        out
    }
}

impl<C> MetricClient for PrefixingClient<C>
where
    C: MetricClient,
{
    fn timing_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        self.wrapped.timing_with(&self.name(key), value, opts)
    }

    fn gauge_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        self.wrapped.gauge_with(&self.name(key), value, opts)
    }

    fn incr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        self.wrapped.incr_with(&self.name(key), count, opts)
    }

    fn decr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        self.wrapped.decr_with(&self.name(key), count, opts)
    }

    fn send_batch(&self, batch: &Batch) {
        self.wrapped.send_batch(batch)
    }
}

/// `MetricClient` that accepts every operation and does nothing.
///
/// Useful for disabling metrics in code that expects a client, without
/// creating a socket or resolving a host.
///
/// # Example
///
/// ```
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::NopMetricClient;
///
/// let client = NopMetricClient;
/// client.incr("ignored");
/// client.timing("also.ignored", 12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NopMetricClient;

impl MetricClient for NopMetricClient {
    fn timing_with(&self, _key: &str, _value: MetricValue, _opts: EmitOptions<'_>) {}

    fn gauge_with(&self, _key: &str, _value: MetricValue, _opts: EmitOptions<'_>) {}

    fn incr_with(&self, _key: &str, _count: MetricValue, _opts: EmitOptions<'_>) {}

    fn send_batch(&self, _batch: &Batch) {}
}
