// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Export commonly used parts of statsd-emitter for easy glob imports
//!
//! # Example
//!
//! ```
//! use statsd_emitter::prelude::*;
//! use statsd_emitter::{StatsdClient, NopMetricSink};
//!
//! let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
//!
//! client.count("some.counter", 1);
//! client.timing("some.timer", 23);
//! client.gauge("some.gauge", 45);
//! client.incr("some.other.counter");
//! ```

pub use crate::client::MetricClient;
pub use crate::sinks::MetricSink;
