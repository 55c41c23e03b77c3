use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use statsd_emitter::prelude::*;
use statsd_emitter::{
    Batch, EmitOptions, MetricValue, NopMetricClient, NopMetricSink, PrefixingClient, RngSampler, SpyMetricSink,
    StatsdClient,
};
use std::sync::Arc;
use std::time::Duration;
use utils::run_arc_threaded_test;

mod utils;

fn new_spy_client(prefix: &str) -> (crossbeam_channel::Receiver<Vec<u8>>, StatsdClient) {
    let (rx, sink) = SpyMetricSink::new();
    (rx, StatsdClient::from_sink(prefix, sink))
}

fn drain(rx: &crossbeam_channel::Receiver<Vec<u8>>) -> Vec<String> {
    rx.try_iter().map(|v| String::from_utf8(v).unwrap()).collect()
}

#[test]
fn test_statsd_client_count() {
    let (rx, client) = new_spy_client("client.test");
    client.count("counter.key", 42);
    assert_eq!(vec!["client.test.counter.key:42|c"], drain(&rx));
}

#[test]
fn test_statsd_client_timing_duration() {
    let (rx, client) = new_spy_client("client.test");
    client.timing("timer.key", Duration::from_millis(35));
    assert_eq!(vec!["client.test.timer.key:35|ms"], drain(&rx));
}

#[test]
fn test_statsd_client_gauge_f64() {
    let (rx, client) = new_spy_client("client.test");
    client.gauge("gauge.key", 5.5);
    assert_eq!(vec!["client.test.gauge.key:5.5|g"], drain(&rx));
}

#[test]
fn test_statsd_client_sampling_is_reproducible() {
    let run = || {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder("", sink)
            .with_sampler(RngSampler::new(ChaCha8Rng::seed_from_u64(17)))
            .build();

        for _ in 0..200 {
            client.count_sampled("c", 1, 0.25);
        }
        drain(&rx)
    };

    let first = run();
    let second = run();

    assert_eq!(first, second);
    assert!(!first.is_empty());
    assert!(first.len() < 200);
    assert!(first.iter().all(|m| m == "c:1|c|@0.25"));
}

#[test]
fn test_statsd_client_counter_sampled_rate_on_wire() {
    let (rx, sink) = SpyMetricSink::new();
    let client = StatsdClient::builder("", sink).with_sampler(|| 0.0).build();

    client.count_sampled("c", 2, 0.5);
    client.timing_sampled("t", 2, 0.5);
    client.gauge_sampled("g", 2, 0.5);

    assert_eq!(vec!["c:2|c|@0.5", "t:2|ms", "g:2|g"], drain(&rx));
}

#[test]
fn test_statsd_client_buffered_metrics_not_sent() {
    let (rx, client) = new_spy_client("");
    let mut batch = Batch::new();

    client.decr_with("a", MetricValue::from(3i64), EmitOptions::new().buffer(&mut batch));
    assert!(drain(&rx).is_empty());
    assert_eq!(vec!["a:-3|c"], batch.lines());

    client.send_batch(&Batch::new());
    assert!(drain(&rx).is_empty());
}

#[test]
fn test_prefixing_client_as_trait_object() {
    let (rx, client) = new_spy_client("");
    let wrapped: Arc<dyn MetricClient + Send + Sync> = Arc::new(PrefixingClient::new(client, "svc.%s.total").unwrap());

    wrapped.count("hits", 2);
    assert_eq!(vec!["svc.hits.total:2|c"], drain(&rx));
}

#[test]
fn test_nop_metric_client_through_box() {
    let client: Box<dyn MetricClient> = Box::new(NopMetricClient);

    client.incr("a");
    client.timing("b", 10);
    client.send_batch(&Batch::from(vec!["a:1|c".to_string()]));
}

#[test]
fn test_statsd_client_nop_sink_single_threaded() {
    let client = StatsdClient::from_sink("statsd", NopMetricSink);
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_statsd_client_spy_sink_many_threaded() {
    let (_rx, sink) = SpyMetricSink::new();
    let client = StatsdClient::from_sink("statsd", sink);
    run_arc_threaded_test(client, 4, 10);
}
