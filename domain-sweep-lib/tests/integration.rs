// domain-sweep-lib/tests/integration.rs

//! Integration tests for domain-sweep-lib: full sweeps through the public API

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use domain_sweep_lib::{
    DomainSweepError, LiteralMode, OutputSink, OutputTarget, Progress, RegistrationLookup,
    RegistrationRecord, SweepConfig, Sweeper,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// In-memory registry: names in `registered` are taken, names in `broken`
/// fail with a provider error, everything else is free.
struct MemoryRegistry {
    registered: HashSet<String>,
    broken: HashSet<String>,
    calls: AtomicUsize,
}

impl MemoryRegistry {
    fn new(registered: &[&str], broken: &[&str]) -> Self {
        Self {
            registered: registered.iter().map(|s| s.to_string()).collect(),
            broken: broken.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RegistrationLookup for MemoryRegistry {
    async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DomainSweepError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(domain) {
            return Err(DomainSweepError::provider(domain, "no whois server is known"));
        }
        if self.registered.contains(domain) {
            return Ok(RegistrationRecord {
                expiration_dates: vec![Utc::now() + ChronoDuration::days(90)],
                registrant: None,
                registrar: Some("Example Registrar".to_string()),
            });
        }
        Ok(RegistrationRecord::default())
    }
}

fn quick_config() -> SweepConfig {
    SweepConfig::default()
        .with_batch_size(3)
        .with_backoff_unit(Duration::from_millis(1))
}

#[tokio::test]
async fn test_pattern_sweep_writes_free_domains_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("free.csv");
    std::fs::write(&path, "left.over;from.before").unwrap();

    let registry = Arc::new(MemoryRegistry::new(&["a1.com", "b2.com"], &["b1.com"]));
    let sink = Arc::new(OutputSink::new(OutputTarget::File(path.clone())));
    sink.reset().await.unwrap();

    let sweeper = Sweeper::new(registry.clone(), sink, quick_config());
    let mut progress: Vec<Progress> = Vec::new();
    let summary = sweeper
        .run_pattern("(a,b)(1,2).com", |p| progress.push(p))
        .await
        .unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.free, 1);
    assert_eq!(summary.taken, 2);
    assert_eq!(summary.unknown, 1);
    assert_eq!(summary.abandoned, 0);
    assert_eq!(registry.calls.load(Ordering::SeqCst), 4);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a2.com");
    assert_eq!(
        progress.iter().map(|p| p.dispatched).collect::<Vec<_>>(),
        vec![3, 4]
    );
}

#[tokio::test]
async fn test_many_free_domains_are_semicolon_joined() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("free.csv");

    let registry = Arc::new(MemoryRegistry::new(&[], &[]));
    let sink = Arc::new(OutputSink::new(OutputTarget::File(path.clone())));
    let sweeper = Sweeper::new(registry, sink, quick_config());

    let summary = sweeper
        .run_pattern("(x,y,z)(0,1,2,3).net", |_| {})
        .await
        .unwrap();
    assert_eq!(summary.free, 12);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.starts_with(';'));
    assert!(!content.ends_with(';'));
    assert!(!content.contains('\n'));

    let written: HashSet<&str> = content.split(';').collect();
    assert_eq!(written.len(), 12);
    assert!(written.contains("x0.net"));
    assert!(written.contains("z3.net"));
}

#[tokio::test]
async fn test_legacy_literal_mode_through_sweeper() {
    let registry = Arc::new(MemoryRegistry::new(&[], &[]));
    let seen = Arc::new(Mutex::new(Vec::new()));

    struct Recording {
        inner: Arc<MemoryRegistry>,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl RegistrationLookup for Recording {
        async fn lookup(&self, domain: &str) -> Result<RegistrationRecord, DomainSweepError> {
            self.seen.lock().unwrap().push(domain.to_string());
            self.inner.lookup(domain).await
        }
    }

    let dir = tempdir().unwrap();
    let sink = Arc::new(OutputSink::new(OutputTarget::File(dir.path().join("out"))));
    let lookup = Arc::new(Recording {
        inner: registry,
        seen: Arc::clone(&seen),
    });
    let sweeper = Sweeper::new(
        lookup,
        sink,
        quick_config().with_literal_mode(LiteralMode::Discard),
    );

    sweeper.run_pattern("(a,b).com", |_| {}).await.unwrap();

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec!["a", "b"]);
}

#[tokio::test]
async fn test_bad_pattern_performs_no_lookups() {
    let registry = Arc::new(MemoryRegistry::new(&[], &[]));
    let sweeper = Sweeper::new(
        registry.clone(),
        Arc::new(OutputSink::stdout()),
        quick_config(),
    );

    let mut progress_calls = 0;
    let err = sweeper
        .run_pattern("(a,b", |_| progress_calls += 1)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainSweepError::PatternSyntax { .. }));
    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    assert_eq!(progress_calls, 0);
}

#[tokio::test]
async fn test_plain_domain_is_checked_as_is() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("free.csv");
    let registry = Arc::new(MemoryRegistry::new(&[], &[]));
    let sink = Arc::new(OutputSink::new(OutputTarget::File(path.clone())));
    let sweeper = Sweeper::new(registry, sink, SweepConfig::default());

    let summary = sweeper.run_pattern("example.com", |_| {}).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.batches, 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "example.com");
}
