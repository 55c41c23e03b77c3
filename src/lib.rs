// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A best-effort Statsd client for Rust.
//!
//! Metrics are fire-and-forget: sending one never returns an error to the
//! caller and never blocks the application for long. Problems sending
//! metrics are logged via the `log` crate and handed to an optional error
//! handler instead.
//!
//! ## Features
//!
//! * Counters, timers and gauges sent to Statsd over UDP.
//! * Client-side sampling, with the sample rate attached to counters so the
//!   server can scale them back up.
//! * Batching several metrics into a single packet.
//! * Recovery from broken sockets by recreating the socket and resending once.
//! * Optional random unique token prepended to each packet.
//! * Wrappers that rewrite metric names or turn metrics off entirely.
//!
//! ## Usage
//!
//! ### Simple Use
//!
//! Create a client that sends to a Statsd server and emit a few metrics.
//!
//! ```rust,no_run
//! use statsd_emitter::prelude::*;
//! use statsd_emitter::{StatsdClient, DEFAULT_PORT};
//!
//! // Note that you'll probably want to actually handle any errors creating
//! // the client when you use it for real in your application.
//! let client = StatsdClient::from_udp_host("my.metrics", ("metrics.example.com", DEFAULT_PORT)).unwrap();
//!
//! client.incr("some.counter");
//! client.timing("some.methodCall", 42);
//! client.gauge("some.thing", 7);
//! ```
//!
//! ### Configuration
//!
//! A client can also be created from a `ClientConfig`, which has sensible
//! defaults for everything (`localhost`, port 8125, no prefix).
//!
//! ```rust,no_run
//! use statsd_emitter::prelude::*;
//! use statsd_emitter::{ClientConfig, MetricError, StatsdClient};
//!
//! fn handler(err: MetricError) {
//!     eprintln!("metric error: {}", err);
//! }
//!
//! let config = ClientConfig {
//!     prefix: "my.app".to_string(),
//!     unique: true,
//!     ..ClientConfig::default()
//! };
//!
//! let client = StatsdClient::config_builder(&config)
//!     .unwrap()
//!     .with_error_handler(handler)
//!     .build();
//!
//! client.count("jobs.done", 3);
//! ```
//!
//! ### Sampling
//!
//! Metrics sent with a sample rate below one are only sent some of the time.
//! Sampled counters carry the rate on the wire, timings and gauges never do.
//!
//! ```rust,no_run
//! use statsd_emitter::prelude::*;
//! use statsd_emitter::{StatsdClient, DEFAULT_PORT};
//!
//! let client = StatsdClient::from_udp_host("my.metrics", ("localhost", DEFAULT_PORT)).unwrap();
//!
//! // sent about one time in ten as "my.metrics.hot.path:1|c|@0.1"
//! client.count_sampled("hot.path", 1, 0.1);
//! ```
//!
//! ### Batching
//!
//! Metrics can be collected in a `Batch` and sent together as a single,
//! newline separated packet.
//!
//! ```rust
//! use statsd_emitter::prelude::*;
//! use statsd_emitter::{Batch, EmitOptions, MetricValue, StatsdClient, SpyMetricSink};
//!
//! let (rx, sink) = SpyMetricSink::new();
//! let client = StatsdClient::from_sink("my.metrics", sink);
//! let mut batch = Batch::new();
//!
//! client.incr_with("a", MetricValue::from(1i64), EmitOptions::new().buffer(&mut batch));
//! client.gauge_with("b", MetricValue::from(2u64), EmitOptions::new().buffer(&mut batch));
//! client.send_batch(&batch);
//!
//! assert_eq!(b"my.metrics.a:1|c\nmy.metrics.b:2|g".to_vec(), rx.recv().unwrap());
//! ```
//!
//! ### Disabling Metrics
//!
//! Code that takes a `MetricClient` can be given a `NopMetricClient` to turn
//! metrics off without creating any sockets.
//!
//! ```rust
//! use statsd_emitter::prelude::*;
//! use statsd_emitter::NopMetricClient;
//!
//! fn handle_request<C: MetricClient>(metrics: &C) {
//!     metrics.incr("requests");
//! }
//!
//! handle_request(&NopMetricClient);
//! ```

#![forbid(unsafe_code)]

/// Default port of Statsd servers
pub const DEFAULT_PORT: u16 = 8125;

/// Default host of Statsd servers
pub const DEFAULT_HOST: &str = "localhost";

pub use self::batch::Batch;

pub use self::client::{ClientConfig, EmitOptions, MetricClient, StatsdClient, StatsdClientBuilder};

pub use self::format::{MetricType, MetricValue};

pub use self::sample::{RngSampler, Sampler, ThreadRngSampler};

pub use self::sinks::{
    is_broken_socket, BoxedSocket, DatagramSocket, MetricSink, NopMetricSink, SinkStats, SpyMetricSink, UdpMetricSink,
    UdpMetricSinkBuilder,
};

pub use self::types::{ErrorKind, MetricError, MetricResult};

pub use self::wrap::{NopMetricClient, PrefixingClient};

mod batch;
mod client;
mod format;
pub mod prelude;
mod sample;
mod sinks;
mod types;
mod wrap;
