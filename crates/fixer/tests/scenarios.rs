use ctfix_fixer::{Coordinator, ExtensionGuesser, FixOptions, Outcome, Reporter, RunConfig};
use ctfix_storage::ObjectMetadata;
use ctfix_storage::backend::MockBackend;
use rstest::rstest;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorder(Mutex<Vec<(String, Outcome)>>);

impl Reporter for Recorder {
    fn report(&self, key: &str, outcome: &Outcome) {
        self.0.lock().unwrap().push((key.to_string(), outcome.clone()));
    }
}

impl Recorder {
    /// Rendered report lines, sorted so runs with different schedules compare.
    fn lines(&self) -> Vec<String> {
        let mut lines: Vec<_> =
            self.0.lock().unwrap().iter().map(|(key, outcome)| format!("{key}: {outcome}")).collect();
        lines.sort();
        lines
    }

    fn by_key(&self) -> HashMap<String, Vec<Outcome>> {
        let mut map: HashMap<String, Vec<Outcome>> = HashMap::new();
        for (key, outcome) in self.0.lock().unwrap().iter() {
            map.entry(key.clone()).or_default().push(outcome.clone());
        }
        map
    }
}

fn mismatch(current: &str, expected: &str) -> Outcome {
    Outcome::Mismatch { current: Some(current.to_string()), expected: expected.to_string() }
}

fn bucket() -> Arc<MockBackend> {
    Arc::new(MockBackend::with_objects([
        ("a.png", ObjectMetadata::new("text/plain")),
        ("b.css", ObjectMetadata::new("text/css")),
        ("dir/", ObjectMetadata::default()),
    ]))
}

fn config(workers: usize, verbose: bool, dry_run: bool) -> RunConfig {
    RunConfig {
        prefixes: vec![String::new()],
        workers,
        options: FixOptions { verbose, dry_run, ..FixOptions::default() },
        ..RunConfig::default()
    }
}

async fn run(store: Arc<MockBackend>, config: &RunConfig) -> (ctfix_fixer::RunSummary, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let coordinator = Coordinator::new(store, Arc::new(ExtensionGuesser), recorder.clone());
    let summary = coordinator.run(config).await.unwrap();
    (summary, recorder)
}

#[tokio::test]
async fn test_mixed_bucket_is_fixed() {
    let store = bucket();
    let (summary, recorder) = run(store.clone(), &config(1, false, false)).await;

    let reports = recorder.by_key();
    assert_eq!(reports.len(), 1, "only the mismatch is reported without --verbose");
    assert_eq!(reports["a.png"], vec![mismatch("text/plain", "image/png")]);
    assert_eq!(store.object("a.png").await.unwrap().content_type.as_deref(), Some("image/png"));
    assert_eq!(store.object("b.css").await.unwrap(), ObjectMetadata::new("text/css"));

    // `dir/` costs no store call at all
    assert_eq!(store.head_calls(), 2);
    assert_eq!(store.rewrite_calls(), 1);
    assert_eq!(summary.directories, 1);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.fixed, 1);
}

#[tokio::test]
async fn test_mixed_bucket_verbose_reports_matches() {
    let (_, recorder) = run(bucket(), &config(1, true, false)).await;
    let reports = recorder.by_key();
    assert_eq!(reports["b.css"], vec![Outcome::Matched]);
    assert!(!reports.contains_key("dir/"));
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn test_mixed_bucket_dry_run(#[case] verbose: bool) {
    let (live, live_recorder) = run(bucket(), &config(1, verbose, false)).await;

    let store = bucket();
    let before = store.snapshot().await;
    let (dry, dry_recorder) = run(store.clone(), &config(1, verbose, true)).await;

    // Same lines as the live run, without a single rewrite
    assert_eq!(dry_recorder.lines(), live_recorder.lines());
    assert_eq!(store.rewrite_calls(), 0);
    assert_eq!(store.snapshot().await, before);
    assert_eq!(dry.would_fix, 1);
    assert_eq!(dry.fixed, 0);
    assert_eq!(live.fixed, 1);
}

#[tokio::test]
async fn test_unknown_extension_completes() {
    let store = Arc::new(MockBackend::with_objects([("weird.unknownext", ObjectMetadata::new("text/plain"))]));
    let (summary, recorder) = run(store.clone(), &config(4, false, false)).await;

    assert_eq!(recorder.by_key()["weird.unknownext"], vec![Outcome::UnknownType]);
    assert_eq!(store.rewrite_calls(), 0);
    assert_eq!(summary.unknown_type, 1);
    assert_eq!(summary.workers_stopped, 4);
}

#[tokio::test]
async fn test_key_under_two_prefixes_processed_once() {
    let store = Arc::new(MockBackend::with_objects([
        ("img/a.png", ObjectMetadata::new("text/plain")),
        ("img/b.png", ObjectMetadata::new("image/png")),
    ]));
    let config = RunConfig {
        prefixes: vec!["img/".to_string(), "img/a".to_string(), "img/".to_string()],
        ..config(2, true, false)
    };
    let (summary, recorder) = run(store.clone(), &config).await;

    assert_eq!(summary.candidates, 2);
    assert_eq!(store.head_calls(), 2);
    assert_eq!(store.rewrite_calls(), 1);
    let reports = recorder.by_key();
    assert_eq!(reports["img/a.png"].len(), 1);
    assert_eq!(reports["img/b.png"].len(), 1);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_run() {
    let store = Arc::new(
        MockBackend::with_objects([
            ("a.png", ObjectMetadata::new("text/plain")),
            ("b.png", ObjectMetadata::new("text/plain")),
            ("c.png", ObjectMetadata::new("text/plain")),
        ])
        .with_failing_head("a.png")
        .with_failing_rewrite("b.png"),
    );
    let (summary, recorder) = run(store.clone(), &config(2, false, false)).await;

    let reports = recorder.by_key();
    assert!(matches!(reports["a.png"][..], [Outcome::LookupFailed(_)]));
    assert!(matches!(reports["b.png"][..], [Outcome::Mismatch { .. }, Outcome::RewriteFailed { .. }]));
    assert_eq!(reports["c.png"], vec![mismatch("text/plain", "image/png")]);
    assert_eq!(summary.failures(), 2);
    assert_eq!(summary.fixed, 1);
    assert_eq!(summary.workers_stopped, 2);
}

#[rstest]
#[case(1, 0)]
#[case(1, 37)]
#[case(3, 1)]
#[case(4, 100)]
#[case(16, 5)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_key_dequeued_exactly_once(#[case] workers: usize, #[case] keys: usize) {
    let objects: Vec<_> = (0..keys).map(|i| (format!("files/{i:04}.css"), ObjectMetadata::new("text/plain"))).collect();
    let store = Arc::new(MockBackend::with_objects(objects));
    let (summary, recorder) = run(store.clone(), &config(workers, true, false)).await;

    let reports = recorder.by_key();
    assert_eq!(reports.len(), keys);
    assert!(reports.values().all(|outcomes| outcomes.len() == 1));
    assert_eq!(summary.processed(), keys);
    assert_eq!(summary.fixed, keys);
    assert_eq!(store.head_calls(), keys);
    assert_eq!(summary.workers_stopped, workers);
    assert_eq!(summary.workers_timed_out + summary.workers_closed + summary.workers_aborted, 0);
}
