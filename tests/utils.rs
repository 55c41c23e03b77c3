use statsd_emitter::prelude::*;
use statsd_emitter::StatsdClient;
use std::net::UdpSocket;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
pub const NUM_THREADS: u64 = 100;
#[allow(dead_code)]
pub const NUM_ITERATIONS: u64 = 1_000;

#[allow(dead_code)]
pub fn run_arc_threaded_test(client: StatsdClient, num_threads: u64, iterations: u64) {
    let shared_client = Arc::new(client);

    let threads: Vec<_> = (0..num_threads)
        .map(|_| {
            let local_client = Arc::clone(&shared_client);

            thread::spawn(move || {
                for i in 0..iterations {
                    local_client.count("some.counter", i as i64);
                    local_client.incr("some.counter");
                    local_client.decr("some.counter");
                    local_client.timing("some.timer", i);
                    local_client.gauge("some.gauge", i);
                    local_client.gauge("some.gauge", i as f64);
                    local_client.count_sampled("some.sampled", 1, 0.5);
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }
}

/// Local UDP socket standing in for a Statsd server.
#[allow(dead_code)]
pub struct StatsdServer {
    socket: UdpSocket,
}

#[allow(dead_code)]
impl StatsdServer {
    pub fn new() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        StatsdServer { socket }
    }

    pub fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }

    pub fn recv(&self) -> String {
        let mut buf = [0u8; 2048];
        let n = self.socket.recv(&mut buf).unwrap();
        String::from_utf8(buf[..n].to_vec()).unwrap()
    }
}
