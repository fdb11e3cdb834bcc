//! End-to-end pipeline tests against in-memory fakes.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use broll_models::{EditPlan, JobRecord, JobStatus};
use broll_queue::ProcessVideoJob;
use broll_store::{JobStore, MemoryJobStore};
use broll_storage::{ObjectStore, StorageResult};
use broll_worker::services::{
    ClipFetcher, Completion, Composer, FootageSearch, StockFile, StockHit, Transcriber,
};
use broll_worker::{process_video, PipelineContext, PipelineError, PipelineResult, WorkerConfig};

struct FakeTranscriber;

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _video: &Path) -> PipelineResult<String> {
        Ok("We climbed a mountain and crossed a river".to_string())
    }
}

struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _video: &Path) -> PipelineResult<String> {
        Err(PipelineError::upstream("transcription service down"))
    }
}

/// Replays canned replies in call order: keywords first, then the plan.
struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedCompletion {
    fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn complete(&self, _system: &str, _user: &str) -> PipelineResult<String> {
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "no reply scripted".to_string()))
    }
}

struct FakeSearch {
    hits: HashMap<String, StockHit>,
}

impl FakeSearch {
    fn with_keywords(keywords: &[&str]) -> Self {
        let hits = keywords
            .iter()
            .map(|k| {
                (
                    k.to_string(),
                    StockHit {
                        duration: 8.0,
                        files: vec![StockFile {
                            quality: Some("md".to_string()),
                            height: Some(720),
                            url: format!("https://stock.test/{}.mp4", k),
                        }],
                    },
                )
            })
            .collect();
        Self { hits }
    }

    fn empty() -> Self {
        Self {
            hits: HashMap::new(),
        }
    }
}

#[async_trait]
impl FootageSearch for FakeSearch {
    async fn search(&self, query: &str) -> PipelineResult<Option<StockHit>> {
        Ok(self.hits.get(query).cloned())
    }
}

/// Records every fetched URL and writes a marker file at the destination.
#[derive(Default)]
struct FakeFetcher {
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl ClipFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> PipelineResult<()> {
        self.fetched.lock().unwrap().push(url.to_string());
        tokio::fs::write(dest, b"video bytes").await?;
        Ok(())
    }
}

/// Records the plan and clip set it was asked to assemble.
#[derive(Default)]
struct FakeComposer {
    assembled: Mutex<Vec<(usize, Vec<String>)>>,
}

#[async_trait]
impl Composer for FakeComposer {
    async fn assemble(
        &self,
        _main: &Path,
        broll: &HashMap<String, PathBuf>,
        plan: &EditPlan,
        output: &Path,
    ) -> PipelineResult<()> {
        let mut keys: Vec<String> = broll.keys().cloned().collect();
        keys.sort();
        self.assembled.lock().unwrap().push((plan.len(), keys));
        tokio::fs::write(output, b"assembled").await?;
        Ok(())
    }
}

#[derive(Default)]
struct FakeStorage {
    uploaded: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStore for FakeStorage {
    async fn put_file(&self, key: &str, _path: &Path) -> StorageResult<()> {
        self.uploaded.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.test/{}", key)
    }
}

struct Harness {
    work_dir: tempfile::TempDir,
    store: Arc<MemoryJobStore>,
    storage: Arc<FakeStorage>,
    fetcher: Arc<FakeFetcher>,
    composer: Arc<FakeComposer>,
}

impl Harness {
    fn context(
        &self,
        transcriber: Arc<dyn Transcriber>,
        completion: Arc<dyn Completion>,
        search: Arc<dyn FootageSearch>,
    ) -> PipelineContext {
        let config = WorkerConfig {
            work_dir: self.work_dir.path().to_string_lossy().into_owned(),
            ..WorkerConfig::default()
        };
        PipelineContext {
            config,
            store: self.store.clone(),
            storage: self.storage.clone(),
            transcriber,
            completion,
            search,
            fetcher: self.fetcher.clone(),
            composer: self.composer.clone(),
        }
    }

    fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(self.work_dir.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
    }
}

fn harness() -> Harness {
    Harness {
        work_dir: tempfile::tempdir().unwrap(),
        store: Arc::new(MemoryJobStore::new()),
        storage: Arc::new(FakeStorage::default()),
        fetcher: Arc::new(FakeFetcher::default()),
        composer: Arc::new(FakeComposer::default()),
    }
}

async fn seed_job(store: &MemoryJobStore) -> ProcessVideoJob {
    let record = JobRecord::new("user123", "B-roll generation", "https://example.com/v.mp4");
    store.put(&record).await.unwrap();
    ProcessVideoJob::new(
        record.id,
        "user123",
        "https://example.com/v.mp4",
        "B-roll generation",
    )
}

const KEYWORD_REPLY: &str =
    r#"[{"keyword": "mountain", "timestamp": 10}, {"keyword": "river", "timestamp": 25}]"#;
const PLAN_REPLY: &str = r#"[
    {"action": "insert_broll", "timestamp": 12, "duration": 4, "clip_id": "mountain"},
    {"action": "insert_broll", "timestamp": 26, "duration": 3, "clip_id": "river"}
]"#;

#[tokio::test]
async fn happy_path_completes_with_output_url() {
    let h = harness();
    let ctx = h.context(
        Arc::new(FakeTranscriber),
        Arc::new(ScriptedCompletion::new(vec![KEYWORD_REPLY, PLAN_REPLY])),
        Arc::new(FakeSearch::with_keywords(&["mountain", "river"])),
    );
    let job = seed_job(&h.store).await;

    let url = process_video(&ctx, &job).await.unwrap();
    assert_eq!(url, format!("https://cdn.test/output/{}.mp4", job.job_id));

    let record = h.store.get(&job.job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.output_url.as_deref(), Some(url.as_str()));
    assert!(record.error.is_none());
    assert_eq!(
        h.store.status_history(&job.job_id),
        vec![
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed
        ]
    );

    // Source plus both plan-referenced clips were fetched.
    let fetched = h.fetcher.fetched.lock().unwrap().clone();
    assert_eq!(fetched.len(), 3);
    assert!(fetched.contains(&"https://stock.test/mountain.mp4".to_string()));

    let assembled = h.composer.assembled.lock().unwrap().clone();
    assert_eq!(assembled, vec![(2, vec!["mountain".into(), "river".into()])]);

    assert_eq!(
        h.storage.uploaded.lock().unwrap().clone(),
        vec![format!("output/{}.mp4", job.job_id)]
    );
    assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn stage_failure_marks_job_failed() {
    let h = harness();
    let ctx = h.context(
        Arc::new(FailingTranscriber),
        Arc::new(ScriptedCompletion::new(vec![])),
        Arc::new(FakeSearch::empty()),
    );
    let job = seed_job(&h.store).await;

    let err = process_video(&ctx, &job).await.unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(_)));

    let record = h.store.get(&job.job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.output_url.is_none());
    assert!(record
        .error
        .as_deref()
        .unwrap()
        .contains("transcription service down"));
    assert!(h.storage.uploaded.lock().unwrap().is_empty());
    assert!(h.scratch_is_empty());
}

#[tokio::test]
async fn scratch_setup_failure_marks_job_failed() {
    let h = harness();
    // Point the work dir at a regular file so scratch creation fails
    // before any stage runs.
    let occupied = h.work_dir.path().join("occupied");
    std::fs::write(&occupied, b"not a directory").unwrap();

    let mut ctx = h.context(
        Arc::new(FakeTranscriber),
        Arc::new(ScriptedCompletion::new(vec![])),
        Arc::new(FakeSearch::empty()),
    );
    ctx.config.work_dir = occupied.to_string_lossy().into_owned();
    let job = seed_job(&h.store).await;

    let err = process_video(&ctx, &job).await.unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));

    // The abort still lands in a terminal status, not a stuck Processing.
    let record = h.store.get(&job.job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.output_url.is_none());
    assert!(record.error.is_some());
}

#[tokio::test]
async fn malformed_model_replies_still_complete_via_fallbacks() {
    let h = harness();
    // Both model calls return prose: keywords fall back to "general",
    // the plan falls back to one instruction per resolved clip.
    let ctx = h.context(
        Arc::new(FakeTranscriber),
        Arc::new(ScriptedCompletion::new(vec![
            "Sure! Some keywords for you.",
            "I would insert the clip near the start.",
        ])),
        Arc::new(FakeSearch::with_keywords(&["general"])),
    );
    let job = seed_job(&h.store).await;

    process_video(&ctx, &job).await.unwrap();

    let record = h.store.get(&job.job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Completed);

    let assembled = h.composer.assembled.lock().unwrap().clone();
    assert_eq!(assembled, vec![(1, vec!["general".into()])]);
}

#[tokio::test]
async fn zero_resolved_clips_completes_with_empty_plan() {
    let h = harness();
    let ctx = h.context(
        Arc::new(FakeTranscriber),
        Arc::new(ScriptedCompletion::new(vec![KEYWORD_REPLY])),
        Arc::new(FakeSearch::empty()),
    );
    let job = seed_job(&h.store).await;

    process_video(&ctx, &job).await.unwrap();

    let record = h.store.get(&job.job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Completed);

    // No b-roll was fetched, only the source video.
    assert_eq!(h.fetcher.fetched.lock().unwrap().len(), 1);
    let assembled = h.composer.assembled.lock().unwrap().clone();
    assert_eq!(assembled, vec![(0, vec![])]);
}

#[tokio::test]
async fn redelivered_job_is_fully_replaced() {
    let h = harness();
    let search = Arc::new(FakeSearch::with_keywords(&["mountain", "river"]));
    let job = seed_job(&h.store).await;

    let first = h.context(
        Arc::new(FakeTranscriber),
        Arc::new(ScriptedCompletion::new(vec![KEYWORD_REPLY, PLAN_REPLY])),
        search.clone(),
    );
    let url_one = process_video(&first, &job).await.unwrap();

    let second = h.context(
        Arc::new(FakeTranscriber),
        Arc::new(ScriptedCompletion::new(vec![KEYWORD_REPLY, PLAN_REPLY])),
        search,
    );
    let url_two = process_video(&second, &job).await.unwrap();

    assert_eq!(url_one, url_two);
    let record = h.store.get(&job.job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(
        h.store.status_history(&job.job_id),
        vec![
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Processing,
            JobStatus::Completed
        ]
    );
    assert!(h.scratch_is_empty());
}
