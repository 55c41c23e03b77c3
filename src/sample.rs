// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::format::MetricType;
use rand::{Rng, RngCore};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Source of uniformly distributed random numbers used to decide whether
/// a sampled metric is sent.
///
/// Implementations must return a value in the range `[0, 1)`. Any
/// `Fn() -> f64` closure is a `Sampler`, which makes it easy to pin
/// sampling decisions in tests.
///
/// # Example
///
/// ```
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::{EmitOptions, StatsdClient, NopMetricSink};
///
/// // A draw of 0.99 fails every sample rate below 0.99
/// let client = StatsdClient::builder("", NopMetricSink)
///     .with_sampler(|| 0.99)
///     .build();
///
/// client.count_sampled("dropped.counter", 1, 0.5);
/// ```
pub trait Sampler {
    fn draw(&self) -> f64;
}

impl<F> Sampler for F
where
    F: Fn() -> f64,
{
    fn draw(&self) -> f64 {
        (self)()
    }
}

/// Default `Sampler` backed by the thread local RNG from `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// `Sampler` that draws from a caller supplied RNG, useful for making
/// sampling reproducible with a seeded generator.
pub struct RngSampler<R> {
    rng: Mutex<R>,
}

impl<R> RngSampler<R>
where
    R: RngCore,
{
    pub fn new(rng: R) -> Self {
        RngSampler { rng: Mutex::new(rng) }
    }
}

impl<R> Sampler for RngSampler<R>
where
    R: RngCore,
{
    fn draw(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen::<f64>()
    }
}

impl<R> fmt::Debug for RngSampler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RngSampler {{ rng: ... }}")
    }
}

/// Outcome of deciding whether a metric observation should be sent. Skipped
/// metrics are dropped silently, `SendSampled` attaches the rate to the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Decision {
    Skip,
    Send,
    SendSampled(f64),
}

/// Decide if a metric of the given type should be sent.
///
/// Timings and gauges never carry the rate on the wire: once they pass the
/// check they are sent as-is. Counters that pass a check at a rate below one
/// are sent with the rate so the server can scale them back up. The random
/// source is consulted only when the rate and the `rate_applied` flag don't
/// already decide the outcome.
pub(crate) fn decide<S>(type_: MetricType, rate: f64, rate_applied: bool, sampler: &S) -> Decision
where
    S: Sampler + ?Sized,
{
    match type_ {
        MetricType::Counter => {
            if rate >= 1.0 {
                Decision::Send
            } else if rate_applied || sampler.draw() < rate {
                Decision::SendSampled(rate)
            } else {
                Decision::Skip
            }
        }
        MetricType::Timer | MetricType::Gauge => {
            if rate >= 1.0 || rate_applied || sampler.draw() < rate {
                Decision::Send
            } else {
                Decision::Skip
            }
        }
    }
}
