// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::batch::Batch;
use crate::format::{MetricFormatter, MetricType, MetricValue};
use crate::sample::{self, Decision, Sampler, ThreadRngSampler};
use crate::sinks::{MetricSink, SinkStats, UdpMetricSink};
use crate::types::{MetricError, MetricResult};
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use log::error;
use std::fmt;
use std::io;
use std::net::ToSocketAddrs;
use std::panic::RefUnwindSafe;
use std::sync::Arc;

/// Per-call options for emitting a metric.
///
/// * `rate`: the sample rate, between 0 and 1. Metrics sent with a rate
///   below one are only sent some of the time. Defaults to 1, always send.
/// * `rate_applied`: the caller already made the sampling decision, so the
///   metric is sent (with the rate attached, for counters) without drawing
///   a random number. Defaults to `false`.
/// * `buffer`: a `Batch` to append the formatted metric to instead of sending
///   it immediately. Defaults to none.
///
/// # Example
///
/// ```
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::{Batch, EmitOptions, MetricValue, StatsdClient, NopMetricSink};
///
/// let client = StatsdClient::from_sink("my.prefix", NopMetricSink);
/// let mut batch = Batch::new();
///
/// client.incr_with(
///     "cache.miss",
///     MetricValue::from(1i64),
///     EmitOptions::new().rate(0.1).rate_applied(true).buffer(&mut batch),
/// );
///
/// assert_eq!("my.prefix.cache.miss:1|c|@0.1", batch.to_payload());
/// ```
#[derive(Debug)]
pub struct EmitOptions<'b> {
    rate: f64,
    rate_applied: bool,
    buffer: Option<&'b mut Batch>,
}

impl<'b> EmitOptions<'b> {
    pub fn new() -> Self {
        EmitOptions {
            rate: 1.0,
            rate_applied: false,
            buffer: None,
        }
    }

    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn rate_applied(mut self, applied: bool) -> Self {
        self.rate_applied = applied;
        self
    }

    pub fn buffer(mut self, buffer: &'b mut Batch) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.rate
    }

    pub fn is_rate_applied(&self) -> bool {
        self.rate_applied
    }

    pub fn is_buffered(&self) -> bool {
        self.buffer.is_some()
    }
}

impl Default for EmitOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for all clients that emit metrics.
///
/// This is the set of operations shared by `StatsdClient` and the clients
/// that wrap or stand in for it (`PrefixingClient`, `NopMetricClient`), so
/// that code emitting metrics can be handed any of them. The trait is object
/// safe: the `_with` methods and `send_batch` can be called through a
/// `&dyn MetricClient`, and `Box<dyn MetricClient>` or `Arc<dyn MetricClient>`
/// get the shorthand methods as well.
///
/// Emitting a metric never fails from the point of view of the caller.
/// Metrics are best-effort: problems sending them are handled (logged,
/// reported to an error handler) by the client.
///
/// # Example
///
/// ```
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::{NopMetricClient, StatsdClient, NopMetricSink};
///
/// pub struct UserDao {
///     metrics: Box<dyn MetricClient>,
/// }
///
/// impl UserDao {
///     pub fn new<T: MetricClient + 'static>(metrics: T) -> UserDao {
///         UserDao { metrics: Box::new(metrics) }
///     }
///
///     pub fn get_user_by_id(&self, _id: u64) -> Option<String> {
///         self.metrics.incr("getUserById");
///         None
///     }
/// }
///
/// let real = UserDao::new(StatsdClient::from_sink("users", NopMetricSink));
/// let disabled = UserDao::new(NopMetricClient);
///
/// real.get_user_by_id(123);
/// disabled.get_user_by_id(123);
/// ```
pub trait MetricClient {
    /// Record a timing in milliseconds. Fractional values are truncated.
    fn timing_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>);

    /// Record a gauge value.
    fn gauge_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>);

    /// Increment (or, for a negative count, decrement) a counter.
    fn incr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>);

    /// Decrement a counter. This is exactly `incr_with` with the count
    /// negated, using the same sampling and formatting.
    fn decr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        self.incr_with(key, -count, opts)
    }

    /// Send the metrics collected in a batch as a single packet. An empty
    /// batch sends nothing.
    fn send_batch(&self, batch: &Batch);

    /// Record a timing in milliseconds with the given key
    fn timing<T>(&self, key: &str, value: T)
    where
        T: Into<MetricValue>,
        Self: Sized,
    {
        self.timing_with(key, value.into(), EmitOptions::new())
    }

    /// Record a timing in milliseconds with the given key, sampled at `rate`
    fn timing_sampled<T>(&self, key: &str, value: T, rate: f64)
    where
        T: Into<MetricValue>,
        Self: Sized,
    {
        self.timing_with(key, value.into(), EmitOptions::new().rate(rate))
    }

    /// Record a gauge value with the given key
    fn gauge<T>(&self, key: &str, value: T)
    where
        T: Into<MetricValue>,
        Self: Sized,
    {
        self.gauge_with(key, value.into(), EmitOptions::new())
    }

    /// Record a gauge value with the given key, sampled at `rate`
    fn gauge_sampled<T>(&self, key: &str, value: T, rate: f64)
    where
        T: Into<MetricValue>,
        Self: Sized,
    {
        self.gauge_with(key, value.into(), EmitOptions::new().rate(rate))
    }

    /// Increment or decrement the counter by the given amount
    fn count<T>(&self, key: &str, count: T)
    where
        T: Into<MetricValue>,
        Self: Sized,
    {
        self.incr_with(key, count.into(), EmitOptions::new())
    }

    /// Increment or decrement the counter by the given amount, sampled at `rate`
    fn count_sampled<T>(&self, key: &str, count: T, rate: f64)
    where
        T: Into<MetricValue>,
        Self: Sized,
    {
        self.incr_with(key, count.into(), EmitOptions::new().rate(rate))
    }

    /// Increment the counter by 1
    fn incr(&self, key: &str) {
        self.incr_with(key, MetricValue::Signed(1), EmitOptions::new())
    }

    /// Decrement the counter by 1
    fn decr(&self, key: &str) {
        self.decr_with(key, MetricValue::Signed(1), EmitOptions::new())
    }
}

impl<T> MetricClient for &T
where
    T: MetricClient + ?Sized,
{
    fn timing_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        (**self).timing_with(key, value, opts)
    }

    fn gauge_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        (**self).gauge_with(key, value, opts)
    }

    fn incr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        (**self).incr_with(key, count, opts)
    }

    fn decr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        (**self).decr_with(key, count, opts)
    }

    fn send_batch(&self, batch: &Batch) {
        (**self).send_batch(batch)
    }
}

impl<T> MetricClient for Box<T>
where
    T: MetricClient + ?Sized,
{
    fn timing_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        (**self).timing_with(key, value, opts)
    }

    fn gauge_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        (**self).gauge_with(key, value, opts)
    }

    fn incr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        (**self).incr_with(key, count, opts)
    }

    fn decr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        (**self).decr_with(key, count, opts)
    }

    fn send_batch(&self, batch: &Batch) {
        (**self).send_batch(batch)
    }
}

impl<T> MetricClient for Arc<T>
where
    T: MetricClient + ?Sized,
{
    fn timing_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        (**self).timing_with(key, value, opts)
    }

    fn gauge_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        (**self).gauge_with(key, value, opts)
    }

    fn incr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        (**self).incr_with(key, count, opts)
    }

    fn decr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        (**self).decr_with(key, count, opts)
    }

    fn send_batch(&self, batch: &Batch) {
        (**self).send_batch(batch)
    }
}

/// Settings for creating a `StatsdClient` that sends metrics over UDP.
///
/// # Example
///
/// ```no_run
/// use statsd_emitter::{ClientConfig, StatsdClient};
///
/// let config = ClientConfig {
///     host: "metrics.example.com".to_string(),
///     prefix: "my.app".to_string(),
///     ..ClientConfig::default()
/// };
///
/// let client = StatsdClient::from_config(&config).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or address of the Statsd server, `"localhost"` by default
    pub host: String,
    /// UDP port of the Statsd server, `8125` by default
    pub port: u16,
    /// Prefix for every metric name, empty by default
    pub prefix: String,
    /// Prefix every datagram with a random unique token, `false` by default
    pub unique: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            prefix: String::new(),
            unique: false,
        }
    }
}

/// Builder for creating and customizing `StatsdClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `StatsdClient` struct.
///
/// # Example
///
/// ```
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::{MetricError, StatsdClient, NopMetricSink};
///
/// fn my_error_handler(err: MetricError) {
///     println!("Metric error! {}", err);
/// }
///
/// let client = StatsdClient::builder("prefix", NopMetricSink)
///     .with_error_handler(my_error_handler)
///     .with_sampler(|| 0.5)
///     .build();
///
/// client.count("something", 123);
/// ```
pub struct StatsdClientBuilder {
    prefix: String,
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    sampler: Box<dyn Sampler + Sync + Send + RefUnwindSafe>,
    errors: Box<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>,
}

impl StatsdClientBuilder {
    // Set the required fields and defaults for optional fields
    fn new<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        StatsdClientBuilder {
            // required
            prefix: Self::formatted_prefix(prefix),
            sink: Box::new(sink),

            // optional with defaults
            sampler: Box::new(ThreadRngSampler),
            errors: Box::new(nop_error_handler),
        }
    }

    /// Set an error handler to use when metrics can't be sent.
    ///
    /// The error handler is invoked after a metric could not be written
    /// by the `MetricSink`, after any retry the sink itself makes. The
    /// failure has already been logged at the `error` level by then.
    ///
    /// The error handler should consume the error without panicking. The error
    /// may be logged, printed to stderr, discarded, etc. - this is up to the
    /// implementation.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.errors = Box::new(errors);
        self
    }

    /// Set the source of random numbers used to decide whether metrics
    /// with a sample rate below one are sent.
    ///
    /// By default the thread local RNG from the `rand` crate is used.
    pub fn with_sampler<S>(mut self, sampler: S) -> Self
    where
        S: Sampler + Sync + Send + RefUnwindSafe + 'static,
    {
        self.sampler = Box::new(sampler);
        self
    }

    /// Construct a new `StatsdClient` instance based on current settings.
    pub fn build(self) -> StatsdClient {
        StatsdClient::from_builder(self)
    }

    fn formatted_prefix(prefix: &str) -> String {
        if prefix.is_empty() {
            String::new()
        } else {
            format!("{}.", prefix.trim_end_matches('.'))
        }
    }
}

impl fmt::Debug for StatsdClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdClientBuilder {{ prefix: {:?}, sink: ..., sampler: ..., errors: ... }}",
            self.prefix,
        )
    }
}

/// Client for Statsd that emits counters, timings, and gauges.
///
/// # Sinks
///
/// The client uses some implementation of a `MetricSink` to emit the metrics.
/// For sending metrics to a Statsd server this is a `UdpMetricSink`, which
/// can be created for you with `from_udp_host` or `from_config`.
///
/// # Sampling
///
/// Each metric may be sent with a sample rate below one, in which case it is
/// only sent some of the time. Sampled counters carry the rate (`|@0.1`) so
/// that the server can scale them back up. Sampled timings and gauges never
/// carry the rate.
///
/// # Errors
///
/// Sending metrics never returns an error. Metrics that couldn't be sent are
/// logged and handed to the error handler set with
/// `StatsdClientBuilder::with_error_handler`. The only failure callers see is
/// from constructing a client for a host that can't be resolved.
///
/// # Threading
///
/// The client can be shared between threads (it is `Send` and `Sync`), for
/// example by wrapping it in an `Arc`.
///
/// # Example
///
/// ```no_run
/// use statsd_emitter::prelude::*;
/// use statsd_emitter::{StatsdClient, DEFAULT_PORT};
///
/// let client = StatsdClient::from_udp_host("my.app", ("localhost", DEFAULT_PORT)).unwrap();
///
/// client.incr("some.counter");
/// client.timing("some.method", 42);
/// client.gauge("some.thing", 7);
/// client.count_sampled("some.hot.path", 1, 0.1);
/// ```
pub struct StatsdClient {
    prefix: String,
    sink: Box<dyn MetricSink + Sync + Send + RefUnwindSafe>,
    sampler: Box<dyn Sampler + Sync + Send + RefUnwindSafe>,
    errors: Box<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>,
}

impl StatsdClient {
    /// Create a new client instance that will use the given prefix for
    /// all metrics emitted to the given `MetricSink` implementation.
    ///
    /// Note that this client will discard errors encountered when
    /// sending metrics (after logging them).
    ///
    /// # No-op Example
    ///
    /// ```
    /// use statsd_emitter::{StatsdClient, NopMetricSink};
    ///
    /// let prefix = "my.stats";
    /// let client = StatsdClient::from_sink(prefix, NopMetricSink);
    /// ```
    ///
    /// # UDP Socket Example
    ///
    /// ```
    /// use std::net::UdpSocket;
    /// use statsd_emitter::{StatsdClient, UdpMetricSink, DEFAULT_PORT};
    ///
    /// let prefix = "my.stats";
    /// let host = ("127.0.0.1", DEFAULT_PORT);
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// socket.set_nonblocking(true).unwrap();
    ///
    /// let sink = UdpMetricSink::from(host, socket).unwrap();
    /// let client = StatsdClient::from_sink(prefix, sink);
    /// ```
    pub fn from_sink<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder(prefix, sink).build()
    }

    /// Create a new builder with the provided prefix and metric sink.
    ///
    /// A prefix and a metric sink are required to create a new client
    /// instance. All other optional customizations can be set by calling
    /// methods on the returned builder. Any customizations that aren't
    /// set by the caller will use defaults.
    ///
    /// Note, though a metric prefix is required, you may pass an empty
    /// string as a prefix. In this case, the metrics emitted will use only
    /// the bare keys supplied when you call the various methods to emit
    /// metrics. A non-empty prefix is always separated from keys by a single
    /// `.`, whether or not it already ends with one.
    ///
    /// General defaults:
    ///
    /// * A no-op error handler will be used by default.
    /// * Sampling uses the thread local RNG from `rand`.
    ///
    /// # Example
    ///
    /// ```
    /// use statsd_emitter::prelude::*;
    /// use statsd_emitter::{StatsdClient, MetricError, NopMetricSink};
    ///
    /// fn my_handler(err: MetricError) {
    ///     println!("Metric error: {}", err);
    /// }
    ///
    /// let client = StatsdClient::builder("some.prefix", NopMetricSink)
    ///     .with_error_handler(my_handler)
    ///     .build();
    ///
    /// client.gauge("some.key", 7);
    /// ```
    pub fn builder<T>(prefix: &str, sink: T) -> StatsdClientBuilder
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        StatsdClientBuilder::new(prefix, sink)
    }

    /// Create a new client that sends metrics over UDP to the given host,
    /// using a `UdpMetricSink` with default settings.
    ///
    /// The host is resolved immediately, once, so a host that doesn't
    /// resolve is reported here rather than each time a metric is sent.
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn from_udp_host<A>(prefix: &str, host: A) -> MetricResult<Self>
    where
        A: ToSocketAddrs,
    {
        let sink = UdpMetricSink::new(host)?;
        Ok(Self::from_sink(prefix, sink))
    }

    /// Create a new client from a `ClientConfig`.
    ///
    /// # Failures
    ///
    /// This method fails if the configured host can't be resolved.
    pub fn from_config(config: &ClientConfig) -> MetricResult<Self> {
        Ok(Self::config_builder(config)?.build())
    }

    /// Create a builder from a `ClientConfig` that can be customized further,
    /// for example with an error handler.
    ///
    /// # Failures
    ///
    /// This method fails if the configured host can't be resolved.
    pub fn config_builder(config: &ClientConfig) -> MetricResult<StatsdClientBuilder> {
        let sink = UdpMetricSink::builder((config.host.as_str(), config.port))?
            .unique(config.unique)
            .build();
        Ok(Self::builder(&config.prefix, sink))
    }

    /// Flush the underlying metric sink.
    pub fn flush(&self) -> MetricResult<()> {
        Ok(self.sink.flush()?)
    }

    /// Return I/O telemetry of the underlying metric sink.
    pub fn stats(&self) -> SinkStats {
        self.sink.stats()
    }

    /// The prefix applied to every metric name, including its trailing `.`
    /// when not empty.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // Create a new StatsdClient by consuming the builder
    fn from_builder(builder: StatsdClientBuilder) -> Self {
        StatsdClient {
            prefix: builder.prefix,
            sink: builder.sink,
            sampler: builder.sampler,
            errors: builder.errors,
        }
    }

    fn emit(&self, type_: MetricType, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        let mut formatter = MetricFormatter::from_val(&self.prefix, key, value, type_);

        match sample::decide(type_, opts.rate, opts.rate_applied, &*self.sampler) {
            Decision::Skip => return,
            Decision::Send => {}
            Decision::SendSampled(rate) => formatter.with_sample_rate(rate),
        }

        let metric = formatter.format();
        match opts.buffer {
            Some(buffer) => buffer.push(metric),
            None => {
                let res = self.sink.emit(&metric);
                self.handle_result(res, &metric);
            }
        }
    }

    fn handle_result(&self, res: io::Result<usize>, data: &str) {
        if let Err(e) = res {
            error!("Could not send {:?}: {}", data, e);
            self.consume_error(MetricError::from(e));
        }
    }

    fn consume_error(&self, err: MetricError) {
        (self.errors)(err);
    }
}

impl MetricClient for StatsdClient {
    fn timing_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        self.emit(MetricType::Timer, key, value, opts)
    }

    fn gauge_with(&self, key: &str, value: MetricValue, opts: EmitOptions<'_>) {
        self.emit(MetricType::Gauge, key, value, opts)
    }

    fn incr_with(&self, key: &str, count: MetricValue, opts: EmitOptions<'_>) {
        self.emit(MetricType::Counter, key, count, opts)
    }

    fn send_batch(&self, batch: &Batch) {
        if batch.is_empty() {
            return;
        }

        let res = self.sink.emit_batch(batch.lines());
        if res.is_err() {
            self.handle_result(res, &batch.to_payload());
        }
    }
}

impl fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdClient {{ prefix: {:?}, sink: ..., sampler: ..., errors: ... }}",
            self.prefix,
        )
    }
}

#[allow(clippy::needless_pass_by_value)]
fn nop_error_handler(_err: MetricError) {
    // nothing
}

#[cfg(test)]
mod tests {
    use super::{ClientConfig, EmitOptions, MetricClient, StatsdClient, StatsdClientBuilder};
    use crate::batch::Batch;
    use crate::format::MetricValue;
    use crate::sinks::{NopMetricSink, SpyMetricSink};
    use crate::test::ErrorMetricSink;
    use crate::types::ErrorKind;
    use crossbeam_channel::Receiver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn never() -> f64 {
        panic!("sampler should not be consulted");
    }

    fn spy_client(prefix: &str) -> (Receiver<Vec<u8>>, StatsdClient) {
        let (rx, sink) = SpyMetricSink::new();
        (rx, StatsdClient::from_sink(prefix, sink))
    }

    fn spy_client_with_draw(prefix: &str, draw: f64) -> (Receiver<Vec<u8>>, StatsdClient) {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder(prefix, sink)
            .with_sampler(move || draw)
            .build();
        (rx, client)
    }

    fn received(rx: &Receiver<Vec<u8>>) -> Vec<String> {
        rx.try_iter()
            .map(|v| String::from_utf8(v).unwrap())
            .collect()
    }

    #[test]
    fn test_statsd_client_wire_format() {
        let (rx, client) = spy_client("");

        client.count("x", 3);
        client.gauge("y", 5);
        client.timing("z", 500);

        assert_eq!(vec!["x:3|c", "y:5|g", "z:500|ms"], received(&rx));
    }

    #[test]
    fn test_statsd_client_incr_decr() {
        let (rx, client) = spy_client("prefix");

        client.incr("some.counter");
        client.decr("some.counter");

        assert_eq!(
            vec!["prefix.some.counter:1|c", "prefix.some.counter:-1|c"],
            received(&rx)
        );
    }

    #[test]
    fn test_statsd_client_empty_prefix() {
        let (rx, client) = spy_client("");
        client.count("some.method", 1);

        assert_eq!(vec!["some.method:1|c"], received(&rx));
    }

    #[test]
    fn test_statsd_client_prefix_single_delimiter() {
        for prefix in ["app", "app.", "app.."] {
            let (rx, client) = spy_client(prefix);
            client.incr("stat");

            assert_eq!(vec!["app.stat:1|c"], received(&rx), "prefix: {:?}", prefix);
            assert_eq!("app.", client.prefix());
        }
    }

    #[test]
    fn test_statsd_client_full_rate_never_draws() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder("", sink).with_sampler(never).build();

        client.count_sampled("a", 1, 1.0);
        client.decr_with("b", MetricValue::from(2i64), EmitOptions::new().rate(1.0));
        client.timing_sampled("c", 3, 1.0);
        client.gauge_sampled("d", 4, 1.5);

        assert_eq!(vec!["a:1|c", "b:-2|c", "c:3|ms", "d:4|g"], received(&rx));
    }

    #[test]
    fn test_statsd_client_failed_draw_drops_every_kind() {
        for rate in [0.1, 0.5, 0.9] {
            let (rx, client) = spy_client_with_draw("", 0.99);

            client.count_sampled("counter", 1, rate);
            client.decr_with("counter", MetricValue::from(1i64), EmitOptions::new().rate(rate));
            client.timing_sampled("timer", 10, rate);
            client.gauge_sampled("gauge", 2, rate);

            assert!(received(&rx).is_empty(), "rate: {}", rate);
        }
    }

    #[test]
    fn test_statsd_client_draw_equal_to_rate_drops() {
        let (rx, client) = spy_client_with_draw("", 0.5);

        client.count_sampled("counter", 1, 0.5);
        client.timing_sampled("timer", 10, 0.5);
        client.gauge_sampled("gauge", 2, 0.5);

        assert!(received(&rx).is_empty());
    }

    #[test]
    fn test_statsd_client_successful_draw_attaches_rate_to_counters() {
        let (rx, client) = spy_client_with_draw("", 0.01);

        client.count_sampled("counter", 4, 0.5);
        client.timing_sampled("timer", 10, 0.5);
        client.gauge_sampled("gauge", 2, 0.5);

        assert_eq!(vec!["counter:4|c|@0.5", "timer:10|ms", "gauge:2|g"], received(&rx));
    }

    #[test]
    fn test_statsd_client_rate_applied() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder("", sink).with_sampler(never).build();
        let opts = || EmitOptions::new().rate(0.25).rate_applied(true);

        client.incr_with("counter", MetricValue::from(1i64), opts());
        client.timing_with("timer", MetricValue::from(5u64), opts());
        client.gauge_with("gauge", MetricValue::from(6u64), opts());

        assert_eq!(vec!["counter:1|c|@0.25", "timer:5|ms", "gauge:6|g"], received(&rx));
    }

    #[test]
    fn test_statsd_client_decr_is_negated_incr() {
        let (rx, client) = spy_client_with_draw("p", 0.1);

        for n in [0i64, 1, 7, -3] {
            for rate in [1.0, 0.5] {
                let mut via_decr = Batch::new();
                let mut via_incr = Batch::new();

                client.decr_with(
                    "k",
                    MetricValue::from(n),
                    EmitOptions::new().rate(rate).buffer(&mut via_decr),
                );
                client.incr_with(
                    "k",
                    MetricValue::from(-n),
                    EmitOptions::new().rate(rate).buffer(&mut via_incr),
                );

                assert_eq!(via_incr, via_decr);
            }
        }

        assert!(received(&rx).is_empty());
    }

    #[test]
    fn test_statsd_client_buffer_then_send_batch() {
        let (rx, client) = spy_client("");
        let mut batch = Batch::new();

        client.incr_with("a", MetricValue::from(1i64), EmitOptions::new().buffer(&mut batch));
        client.gauge_with("b", MetricValue::from(2u64), EmitOptions::new().buffer(&mut batch));

        // nothing is sent until the batch is
        assert!(received(&rx).is_empty());
        assert_eq!(vec!["a:1|c", "b:2|g"], batch.lines());

        client.send_batch(&batch);
        assert_eq!(vec!["a:1|c\nb:2|g"], received(&rx));
    }

    #[test]
    fn test_statsd_client_empty_batch_no_io() {
        let sink = Arc::new(ErrorMetricSink::always());
        let client = StatsdClient::from_sink("", Arc::clone(&sink));

        client.send_batch(&Batch::new());
        assert_eq!(0, sink.calls());
    }

    #[test]
    fn test_statsd_client_send_error_is_swallowed() {
        let errors = Arc::new(AtomicUsize::new(0));
        let errors_ref = Arc::clone(&errors);

        let client = StatsdClient::builder("prefix", ErrorMetricSink::always())
            .with_error_handler(move |e| {
                assert_eq!(ErrorKind::IoError, e.kind());
                errors_ref.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        client.incr("some.counter");
        client.timing("some.timer", 3);
        client.send_batch(&Batch::from(vec!["a:1|c".to_string()]));

        assert_eq!(3, errors.load(Ordering::SeqCst));
    }

    #[test]
    fn test_statsd_client_float_values() {
        let (rx, client) = spy_client("");

        client.count("some.float", 0.5);
        client.gauge("load", 1.25);
        client.timing("t", 12.9);

        assert_eq!(vec!["some.float:0.5|c", "load:1.25|g", "t:12|ms"], received(&rx));
    }

    #[test]
    fn test_statsd_client_duration_timing() {
        let (rx, client) = spy_client("");
        client.timing("key", std::time::Duration::from_millis(157));

        assert_eq!(vec!["key:157|ms"], received(&rx));
    }

    #[test]
    fn test_statsd_client_as_trait_object() {
        let (rx, sink) = SpyMetricSink::new();
        let client: Box<dyn MetricClient> = Box::new(StatsdClient::from_sink("prefix", sink));

        client.count("some.counter", 1);
        client.timing("some.timer", 42);
        client.gauge("some.gauge", 8);
        client.incr("some.other");

        assert_eq!(4, received(&rx).len());
    }

    #[test]
    fn test_statsd_client_from_udp_host_bad_host() {
        let res = StatsdClient::from_udp_host("prefix", "asdf");
        assert!(res.is_err());
    }

    #[test]
    fn test_statsd_client_from_config() {
        let config = ClientConfig {
            host: "127.0.0.1".to_string(),
            prefix: "svc".to_string(),
            ..ClientConfig::default()
        };

        let client = StatsdClient::from_config(&config).unwrap();
        assert_eq!("svc.", client.prefix());
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();

        assert_eq!("localhost", config.host);
        assert_eq!(8125, config.port);
        assert_eq!("", config.prefix);
        assert!(!config.unique);
    }

    #[test]
    fn test_statsd_client_flush_and_stats() {
        let client = StatsdClientBuilder::new("prefix", NopMetricSink).build();

        assert!(client.flush().is_ok());
        assert_eq!(0, client.stats().packets_sent);
    }
}
