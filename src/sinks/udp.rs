// statsd-emitter - A best-effort Statsd client for Rust
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::panic::RefUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::sinks::core::{MetricSink, SinkStats, SocketStats};
use crate::types::{ErrorKind, MetricError, MetricResult};

// Number of hex digits in the token prepended to each datagram when
// uniqueness is enabled.
const TOKEN_LEN: usize = 32;

const TOKEN_DELIMITER: u8 = b'#';

// Linux include/uapi/asm-generic/errno-base.h; FreeBSD and macOS
// sys/errno.h use the same numbers.
#[cfg(unix)]
const EBADF: i32 = 9;
#[cfg(unix)]
const EPIPE: i32 = 32;

/// A socket that can send datagrams to an address.
///
/// Implemented for `std::net::UdpSocket`. Other implementations are mostly
/// useful for exercising the failure handling of `UdpMetricSink` in tests.
pub trait DatagramSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
}

impl DatagramSocket for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }
}

pub type BoxedSocket = Box<dyn DatagramSocket + Send + Sync + RefUnwindSafe>;

type SocketFactory = Box<dyn Fn(SocketAddr) -> io::Result<BoxedSocket> + Send + Sync + RefUnwindSafe>;

type BrokenSocketPredicate = Box<dyn Fn(&io::Error) -> bool + Send + Sync + RefUnwindSafe>;

/// Attempt to convert anything implementing the `ToSocketAddrs` trait
/// into a concrete `SocketAddr` instance, returning an `InvalidInput`
/// error if the address could not be parsed.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn get_addr<A: ToSocketAddrs>(addr: A) -> MetricResult<SocketAddr> {
    match addr.to_socket_addrs()?.next() {
        Some(addr) => Ok(addr),
        None => Err(MetricError::from((
            ErrorKind::InvalidInput,
            "No socket addresses yielded",
        ))),
    }
}

/// Default test for whether a send failed because the socket itself is
/// no longer usable (as opposed to the packet being rejected).
///
/// Matches broken pipes and bad file descriptors, either by error kind,
/// by raw OS error code, or by an error message mentioning "broken".
pub fn is_broken_socket(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::BrokenPipe {
        return true;
    }

    #[cfg(unix)]
    {
        if let Some(code) = err.raw_os_error() {
            if code == EPIPE || code == EBADF {
                return true;
            }
        }
    }

    err.to_string().to_ascii_lowercase().contains("broken")
}

/// Encode a metric payload as ASCII, replacing anything outside of the
/// ASCII range with `?` rather than failing.
pub(crate) fn encode_ascii(payload: &str) -> Cow<'_, [u8]> {
    if payload.is_ascii() {
        Cow::Borrowed(payload.as_bytes())
    } else {
        Cow::Owned(
            payload
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        )
    }
}

fn unique_token() -> String {
    format!("{:0width$x}", rand::random::<u128>(), width = TOKEN_LEN)
}

/// Bind a non-blocking UDP socket on an unspecified local address of the
/// same family as the destination.
fn bind_socket(addr: SocketAddr) -> io::Result<BoxedSocket> {
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local)?;
    socket.set_nonblocking(true)?;
    Ok(Box::new(socket))
}

/// Implementation of a `MetricSink` that emits metrics over UDP.
///
/// The sink sends each metric (or batch of metrics) to the Statsd server
/// as a single datagram, in the thread of the caller. The address of the
/// server is resolved once when the sink is created.
///
/// # Socket recovery
///
/// The socket used to send metrics is created lazily, the first time
/// something is sent, unless one is supplied up front. If a send fails
/// because the socket is broken (a broken pipe or a bad file descriptor,
/// see `is_broken_socket`) the socket is discarded and the send is retried
/// exactly once with a freshly created socket. If that also fails the
/// error is returned. Errors of any other kind are returned without
/// retrying.
///
/// # Uniqueness
///
/// When built with `.unique(true)` every datagram is prefixed with a random
/// 32 hex digit token and a `#` so that a downstream relay can discard
/// duplicates. A resend after a broken socket reuses the token of the
/// original attempt since it carries the same payload.
pub struct UdpMetricSink {
    addr: SocketAddr,
    socket: Mutex<Option<BoxedSocket>>,
    factory: SocketFactory,
    is_broken: BrokenSocketPredicate,
    unique: bool,
    stats: SocketStats,
}

impl UdpMetricSink {
    /// Construct a new `UdpMetricSink` instance that creates its socket the
    /// first time a metric is sent.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use statsd_emitter::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = UdpMetricSink::new(host);
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn new<A>(to_addr: A) -> MetricResult<UdpMetricSink>
    where
        A: ToSocketAddrs,
    {
        Ok(Self::builder(to_addr)?.build())
    }

    /// Construct a new `UdpMetricSink` instance using an existing socket.
    ///
    /// The socket should already be bound to a local address with any desired
    /// configuration applied (blocking vs non-blocking, timeouts, etc.). If
    /// the socket breaks it is replaced with one created by the default
    /// socket factory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use statsd_emitter::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// socket.set_nonblocking(true).unwrap();
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let sink = UdpMetricSink::from(host, socket);
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn from<A>(to_addr: A, socket: UdpSocket) -> MetricResult<UdpMetricSink>
    where
        A: ToSocketAddrs,
    {
        Ok(Self::builder(to_addr)?.socket(socket).build())
    }

    /// Create a `UdpMetricSinkBuilder` for the given address to customize
    /// how the sink creates sockets, detects broken sockets, or to enable
    /// per-datagram unique tokens.
    ///
    /// The address is resolved immediately.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use statsd_emitter::{UdpMetricSink, DEFAULT_PORT};
    ///
    /// let sink = UdpMetricSink::builder(("localhost", DEFAULT_PORT))
    ///     .unwrap()
    ///     .unique(true)
    ///     .build();
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn builder<A>(to_addr: A) -> MetricResult<UdpMetricSinkBuilder>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        Ok(UdpMetricSinkBuilder::new(addr))
    }

    /// Resolved address of the Statsd server metrics are sent to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Does this sink currently hold a socket?
    ///
    /// This is `false` before the first send and after a send failed
    /// because of a broken socket that could not be replaced.
    pub fn is_connected(&self) -> bool {
        self.lock_socket().is_some()
    }

    fn lock_socket(&self) -> MutexGuard<'_, Option<BoxedSocket>> {
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn encode<'a>(&self, payload: &'a str) -> Cow<'a, [u8]> {
        let encoded = encode_ascii(payload);
        if !self.unique {
            return encoded;
        }

        let mut out = Vec::with_capacity(TOKEN_LEN + 1 + encoded.len());
        out.extend_from_slice(unique_token().as_bytes());
        out.push(TOKEN_DELIMITER);
        out.extend_from_slice(&encoded);
        Cow::Owned(out)
    }

    fn send_payload(&self, payload: &str) -> io::Result<usize> {
        let data = self.encode(payload);
        let mut slot = self.lock_socket();

        let res = match self.send_with(&mut slot, &data) {
            Err(e) if (self.is_broken)(&e) => {
                *slot = None;
                self.stats.incr_reconnects();
                warn!(
                    "Failed to send UDP packet to {}, restarting socket and resending {:?}: {}",
                    self.addr, payload, e
                );

                let retry = self.send_with(&mut slot, &data);
                if let Err(ref e) = retry {
                    if (self.is_broken)(e) {
                        *slot = None;
                    }
                }
                retry
            }
            other => other,
        };

        self.stats.update(res, data.len())
    }

    fn send_with(&self, slot: &mut Option<BoxedSocket>, data: &[u8]) -> io::Result<usize> {
        let socket = match slot.take() {
            Some(socket) => socket,
            None => {
                let socket = (self.factory)(self.addr)?;
                debug!("Created new socket for sending metrics to {}", self.addr);
                socket
            }
        };

        let res = socket.send_to(data, self.addr);
        *slot = Some(socket);
        res
    }
}

impl MetricSink for UdpMetricSink {
    fn emit(&self, metric: &str) -> io::Result<usize> {
        self.send_payload(metric)
    }

    fn emit_batch(&self, metrics: &[String]) -> io::Result<usize> {
        if metrics.is_empty() {
            return Ok(0);
        }

        self.send_payload(&metrics.join("\n"))
    }

    fn stats(&self) -> SinkStats {
        (&self.stats).into()
    }
}

impl fmt::Debug for UdpMetricSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdpMetricSink")
            .field("addr", &self.addr)
            .field("connected", &self.is_connected())
            .field("unique", &self.unique)
            .field("stats", &self.stats)
            .finish()
    }
}

/// A `UdpMetricSinkBuilder` can be used to create a `UdpMetricSink` with
/// custom configuration.
#[must_use]
pub struct UdpMetricSinkBuilder {
    addr: SocketAddr,
    socket: Option<BoxedSocket>,
    factory: SocketFactory,
    is_broken: BrokenSocketPredicate,
    unique: bool,
}

impl UdpMetricSinkBuilder {
    fn new(addr: SocketAddr) -> Self {
        UdpMetricSinkBuilder {
            addr,
            socket: None,
            factory: Box::new(bind_socket),
            is_broken: Box::new(is_broken_socket),
            unique: false,
        }
    }

    /// Use an existing socket for the first sends instead of creating one
    /// lazily. The socket factory is still used if it ever breaks.
    pub fn socket<S>(mut self, socket: S) -> Self
    where
        S: DatagramSocket + Send + Sync + RefUnwindSafe + 'static,
    {
        self.socket = Some(Box::new(socket));
        self
    }

    /// Prefix each datagram with a random unique token followed by `#`.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set the function used to create a socket when there is none, either
    /// on first use or after a broken socket was discarded. It is given the
    /// resolved address of the Statsd server.
    pub fn socket_factory<F, S>(mut self, factory: F) -> Self
    where
        F: Fn(SocketAddr) -> io::Result<S> + Send + Sync + RefUnwindSafe + 'static,
        S: DatagramSocket + Send + Sync + RefUnwindSafe + 'static,
    {
        self.factory = Box::new(move |addr| factory(addr).map(|s| Box::new(s) as BoxedSocket));
        self
    }

    /// Set the test used to decide if a failed send means the socket must be
    /// replaced (and the send retried once). Defaults to `is_broken_socket`.
    pub fn broken_socket_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&io::Error) -> bool + Send + Sync + RefUnwindSafe + 'static,
    {
        self.is_broken = Box::new(predicate);
        self
    }

    /// Returns a `UdpMetricSink` that uses this configuration.
    pub fn build(self) -> UdpMetricSink {
        UdpMetricSink {
            addr: self.addr,
            socket: Mutex::new(self.socket),
            factory: self.factory,
            is_broken: self.is_broken,
            unique: self.unique,
            stats: SocketStats::default(),
        }
    }
}

impl fmt::Debug for UdpMetricSinkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdpMetricSinkBuilder")
            .field("addr", &self.addr)
            .field("socket", &self.socket.is_some())
            .field("unique", &self.unique)
            .finish()
    }
}
