//! Farm check integration tests
//!
//! These tests run the full check pipeline against scripted servers.

mod common;

use common::*;
use memcache_checker::{
    BackendUrl, CheckConfig, FailureReason, FarmAggregator, FarmError, HostOutcome, Severity,
    StaticEndpoints,
};
use std::sync::Arc;
use std::time::Duration;

/// Test that an empty farm is a warning, not success
#[tokio::test]
async fn test_no_endpoints_is_warning() {
    let farm = farm(ScriptedConnector::new());

    let result = farm.run_farm(&[]).await;

    assert_eq!(result.overall_severity, Severity::Warning);
    assert!(result.outcomes.is_empty());
    assert_eq!(result.error, Some(FarmError::NoEndpoints));
    assert_eq!(result.exit_code(), 1);
}

/// Test that one unreachable host makes the farm critical without hiding the others
#[tokio::test]
async fn test_partial_failure_is_critical_and_ordered() {
    let a = endpoint("cache-a");
    let b = endpoint("cache-b");
    let connector = ScriptedConnector::new().with(&a, Behavior::Serve(vec![documented_stats()]));
    let farm = farm(connector);

    let result = farm.run_farm(&[a.clone(), b.clone()]).await;

    assert_eq!(result.overall_severity, Severity::Critical);
    assert_eq!(result.outcomes.len(), 2);
    assert!(matches!(&result.outcomes[0], HostOutcome::Success { endpoint, .. } if *endpoint == a));
    assert!(matches!(
        &result.outcomes[1],
        HostOutcome::Failure { endpoint, reason: FailureReason::ConnectFailed, .. } if *endpoint == b
    ));
}

/// Test that healthy hosts each get their own metrics
#[tokio::test]
async fn test_all_healthy_is_ok_with_independent_metrics() {
    let a = endpoint("cache-a");
    let b = endpoint("cache-b");
    let connector = ScriptedConnector::new()
        .with(&a, Behavior::Serve(vec![documented_stats()]))
        .with(&b, Behavior::Serve(vec![server_stats(512, 1024, 30, 10, 0, 0)]));
    let farm = farm(connector);

    let result = farm.run_farm(&[a, b]).await;

    assert_eq!(result.overall_severity, Severity::Ok);
    assert!(result.error.is_none());

    let first = result.outcomes[0].derived().expect("first host succeeded");
    assert!((first.fill_percent - 3.1765).abs() < 0.001);
    assert_eq!(first.get_rate_percent, Some(100.0));
    assert_eq!(first.hit_rate_percent.map(|r| (r * 10.0).round()), Some(755.0));

    let second = result.outcomes[1].derived().expect("second host succeeded");
    assert!((second.fill_percent - 50.0).abs() < 1e-9);
    assert_eq!(second.get_rate_percent, Some(75.0));
    assert_eq!(second.hit_rate_percent, None);
}

/// Test that running twice against unchanged servers gives equal results
#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let a = endpoint("cache-a");
    let b = endpoint("cache-b");
    let connector = ScriptedConnector::new()
        .with(&a, Behavior::Serve(vec![documented_stats()]))
        .with(&b, Behavior::FailStats);
    let farm = farm(connector);
    let endpoints = [a, b];

    let first = farm.run_farm(&endpoints).await;
    let second = farm.run_farm(&endpoints).await;

    assert_eq!(first, second);
}

/// Test that outcomes follow input order even when earlier hosts answer last
#[tokio::test]
async fn test_order_preserved_under_concurrency() {
    let slow = endpoint("slow");
    let fast = endpoint("fast");
    let connector = ScriptedConnector::new()
        .with(&slow, Behavior::Slow(Duration::from_millis(30), vec![documented_stats()]))
        .with(&fast, Behavior::Serve(vec![server_stats(1, 2, 0, 0, 0, 0)]));
    let farm = FarmAggregator::with_config(
        Arc::new(connector),
        CheckConfig {
            timeout: Duration::from_secs(1),
            max_concurrency: 4,
        },
    );

    let result = farm.run_farm(&[slow.clone(), fast.clone()]).await;

    let order: Vec<_> = result.outcomes.iter().map(|o| o.endpoint().clone()).collect();
    assert_eq!(order, vec![slow, fast]);
    assert_eq!(result.overall_severity, Severity::Ok);
}

/// Test that a hanging connect is bounded by the timeout and reported as ConnectFailed
#[tokio::test]
async fn test_connect_timeout_is_connect_failed() {
    let hung = endpoint("hung");
    let ok = endpoint("ok");
    let connector = ScriptedConnector::new()
        .with(&hung, Behavior::HangOnConnect)
        .with(&ok, Behavior::Serve(vec![documented_stats()]));
    let farm = farm(connector);

    let result = farm.run_farm(&[hung, ok]).await;

    assert_eq!(result.outcomes[0].failure_reason(), Some(FailureReason::ConnectFailed));
    assert!(result.outcomes[1].is_success());
    assert_eq!(result.overall_severity, Severity::Critical);
}

/// Test that a hanging stats call is bounded and the connection still released
#[tokio::test]
async fn test_stats_timeout_releases_connection() {
    let hung = endpoint("hung");
    let connector = ScriptedConnector::new().with(&hung, Behavior::HangOnStats);
    let counters = connector.counters();
    let farm = farm(connector);

    let result = farm.run_farm(&[hung]).await;

    assert_eq!(result.outcomes[0].failure_reason(), Some(FailureReason::StatsUnavailable));
    assert_eq!(counters.connects(), 1);
    assert_eq!(counters.releases(), 1);
}

/// Test that every opened connection is released, whatever happened on it
#[tokio::test]
async fn test_every_connection_released() {
    let mut malformed = documented_stats();
    malformed.insert("limit_maxbytes", "0");

    let healthy = endpoint("healthy");
    let broken = endpoint("broken");
    let bad_stats = endpoint("bad-stats");
    let empty = endpoint("empty");
    let refused = endpoint("refused");
    let connector = ScriptedConnector::new()
        .with(&healthy, Behavior::Serve(vec![documented_stats()]))
        .with(&broken, Behavior::FailStats)
        .with(&bad_stats, Behavior::Serve(vec![malformed]))
        .with(&empty, Behavior::Serve(Vec::new()));
    let counters = connector.counters();
    let farm = farm(connector);

    let result = farm
        .run_farm(&[healthy, broken, bad_stats, empty, refused])
        .await;

    let reasons: Vec<_> = result.outcomes.iter().map(HostOutcome::failure_reason).collect();
    assert_eq!(
        reasons,
        vec![
            None,
            Some(FailureReason::StatsUnavailable),
            Some(FailureReason::MalformedStats),
            Some(FailureReason::StatsUnavailable),
            Some(FailureReason::ConnectFailed),
        ]
    );
    assert_eq!(counters.connects(), 4);
    assert_eq!(counters.releases(), 4);
    assert_eq!(result.failed_hosts().count(), 4);
}

/// Test that missing or non-numeric required stats fail only their own host
#[tokio::test]
async fn test_incomplete_stats_are_malformed_per_host() {
    let missing: memcache_checker::RawStats = documented_stats()
        .iter()
        .filter(|(key, _)| *key != "get_misses")
        .collect();
    let mut garbled = documented_stats();
    garbled.insert("bytes", "2.1M");

    let healthy = endpoint("healthy");
    let no_misses = endpoint("no-misses");
    let bad_bytes = endpoint("bad-bytes");
    let connector = ScriptedConnector::new()
        .with(&healthy, Behavior::Serve(vec![documented_stats()]))
        .with(&no_misses, Behavior::Serve(vec![missing]))
        .with(&bad_bytes, Behavior::Serve(vec![garbled]));
    let counters = connector.counters();
    let farm = farm(connector);

    let result = farm.run_farm(&[healthy, no_misses, bad_bytes]).await;

    assert_eq!(result.overall_severity, Severity::Critical);
    assert!(result.outcomes[0].is_success());
    assert!(matches!(
        &result.outcomes[1],
        HostOutcome::Failure { reason: FailureReason::MalformedStats, detail, .. }
            if detail.contains("get_misses")
    ));
    assert!(matches!(
        &result.outcomes[2],
        HostOutcome::Failure { reason: FailureReason::MalformedStats, detail, .. }
            if detail.contains("bytes") && detail.contains("2.1M")
    ));
    assert_eq!(counters.releases(), 3);
}

/// Test that a serial run gives the same answer as a concurrent one
#[tokio::test]
async fn test_serial_run_matches_concurrent_run() {
    let endpoints = [endpoint("a"), endpoint("b"), endpoint("c")];
    let build = |max_concurrency| {
        let connector = ScriptedConnector::new()
            .with(&endpoints[0], Behavior::Serve(vec![documented_stats()]))
            .with(&endpoints[2], Behavior::Slow(Duration::from_millis(5), vec![documented_stats()]));
        FarmAggregator::with_config(
            Arc::new(connector),
            CheckConfig {
                timeout: Duration::from_secs(1),
                max_concurrency,
            },
        )
    };

    let serial = build(1).run_farm(&endpoints).await;
    let concurrent = build(8).run_farm(&endpoints).await;

    assert_eq!(serial, concurrent);
}

/// Test resolving endpoints through a provider
#[tokio::test]
async fn test_run_with_backend_url_provider() {
    let a = endpoint("cache-a");
    let connector = ScriptedConnector::new().with(&a, Behavior::Serve(vec![documented_stats()]));
    let farm = farm(connector);

    let result = farm
        .run(&BackendUrl::new("memcached://cache-a:11211;cache-b:11211/"))
        .await;

    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.overall_severity, Severity::Critical);
}

/// Test that unusable endpoint configuration is a warning with nothing checked
#[tokio::test]
async fn test_invalid_provider_is_warning() {
    let farm = farm(ScriptedConnector::new());

    let result = farm.run(&BackendUrl::new("memcached://cache-a:port/")).await;

    assert_eq!(result.overall_severity, Severity::Warning);
    assert!(result.outcomes.is_empty());
    assert!(matches!(result.error, Some(FarmError::Endpoints(_))));
}

/// Test that an explicitly empty static list behaves like no endpoints
#[tokio::test]
async fn test_empty_static_provider() {
    let farm = farm(ScriptedConnector::new());

    let result = farm.run(&StaticEndpoints::default()).await;

    assert_eq!(result.overall_severity, Severity::Warning);
    assert_eq!(result.error, Some(FarmError::NoEndpoints));
}
