// ABOUTME: Integration tests for the scan orchestrator.
// ABOUTME: Covers the concurrency cap, completion of every worker, and fault isolation.

mod common;

use common::*;
use hostca_core::IssuerOptions;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn many_projects(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("proj-{i}")).collect()
}

#[tokio::test]
async fn test_pass_respects_parallelism_and_waits_for_all() {
    let projects = many_projects(10);
    let project_refs: Vec<&str> = projects.iter().map(String::as_str).collect();
    let compute = Arc::new(FakeCompute::new().with_listing_delay(Duration::from_millis(20)));
    let options = IssuerOptions {
        parallelism: 3,
        ..IssuerOptions::default()
    };
    let issuer = issuer(
        compute.clone(),
        Arc::new(FakeDirectory::new()),
        targets(&project_refs, &[]),
        options,
    );

    issuer.run_pass().await;

    let mut listed = compute.listed_projects();
    listed.sort();
    let mut expected = projects.clone();
    expected.sort();
    assert_eq!(listed, expected, "every project should be processed exactly once");

    let max = compute.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "observed {max} concurrent workers, limit is 3");
    assert!(max >= 2, "workers should actually overlap, saw {max}");
}

#[tokio::test]
async fn test_parallelism_of_one_is_sequential() {
    let projects = many_projects(4);
    let project_refs: Vec<&str> = projects.iter().map(String::as_str).collect();
    let compute = Arc::new(FakeCompute::new().with_listing_delay(Duration::from_millis(5)));
    let options = IssuerOptions {
        parallelism: 1,
        ..IssuerOptions::default()
    };
    let issuer = issuer(
        compute.clone(),
        Arc::new(FakeDirectory::new()),
        targets(&project_refs, &[]),
        options,
    );

    issuer.run_pass().await;

    assert_eq!(compute.listed_projects().len(), 4);
    assert_eq!(compute.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_projects_do_not_affect_others() {
    let host = generate_key();
    let compute = Arc::new(
        FakeCompute::new()
            .failing_listing("broken")
            .with_instance("quota", instance(1, "q-1", "10.0.0.1", &[]))
            .with_host_key("quota", "q-1", &published_key(&generate_key()))
            .failing_writes("quota")
            .with_instance("healthy", instance(2, "h-1", "10.0.0.2", &[]))
            .with_host_key("healthy", "h-1", &published_key(&host)),
    );
    let issuer = issuer(
        compute.clone(),
        Arc::new(FakeDirectory::new()),
        targets(&["broken", "quota", "healthy"], &[]),
        IssuerOptions::default(),
    );

    issuer.run_pass().await;

    let writes = compute.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].project, "healthy");
}

#[tokio::test]
async fn test_panicking_worker_releases_its_slot() {
    let compute = Arc::new(
        FakeCompute::new()
            .panicking("boom")
            .with_instance("after", instance(1, "a-1", "10.0.0.1", &[]))
            .with_host_key("after", "a-1", &published_key(&generate_key())),
    );
    let options = IssuerOptions {
        parallelism: 1,
        ..IssuerOptions::default()
    };
    let issuer = issuer(
        compute.clone(),
        Arc::new(FakeDirectory::new()),
        targets(&["boom", "after"], &[]),
        options,
    );

    // With a single permit, "after" can only run if "boom" gave its permit back
    tokio::time::timeout(Duration::from_secs(5), issuer.run_pass())
        .await
        .expect("pass should complete despite a panicking worker");

    assert_eq!(compute.write_count(), 1);
}

#[tokio::test]
async fn test_folder_projects_are_scanned() {
    let compute = Arc::new(FakeCompute::new());
    let directory = Arc::new(FakeDirectory::new().with_projects("f1", &["p2", "p1"]));
    let issuer = issuer(
        compute.clone(),
        directory,
        targets(&["p1"], &["f1"]),
        IssuerOptions::default(),
    );

    issuer.run_pass().await;

    let mut listed = compute.listed_projects();
    listed.sort();
    assert_eq!(listed, vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_second_pass_within_cooldown_is_idempotent() {
    let compute = Arc::new(
        FakeCompute::new()
            .with_instance("p1", instance(1, "web-1", "10.0.0.5", &["34.1.2.3"]))
            .with_host_key("p1", "web-1", &published_key(&generate_key())),
    );
    let issuer = issuer(
        compute.clone(),
        Arc::new(FakeDirectory::new()),
        targets(&["p1"], &[]),
        IssuerOptions::default(),
    );

    issuer.run_pass().await;
    issuer.run_pass().await;

    assert_eq!(compute.write_count(), 1);
}
