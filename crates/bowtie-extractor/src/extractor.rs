//! Core Extractor implementation

use crate::config::{ExtractorConfig, RetryPolicy};
use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::types::{summarize_violations, Outcome, RunFailure, RunOptions, RunSummary};
use bowtie_domain::{
    incident_id_from_path, ExtractionProvider, ManifestEntry, ManifestStatus, PromptAssembler,
    ProviderError, ProviderErrorKind,
};
use bowtie_gatekeeper::Gatekeeper;
use bowtie_store::{atomic_write, ManifestStore};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};

/// The Extractor turns incident narratives into validated Bowtie records
///
/// Workers read, prompt, call the provider, parse and validate. Every
/// manifest update and every file write happens in the run loop, one
/// outcome at a time.
pub struct Extractor {
    provider: Arc<dyn ExtractionProvider>,
    assembler: Arc<dyn PromptAssembler>,
    gatekeeper: Gatekeeper,
    config: ExtractorConfig,
}

/// One input claimed for processing
#[derive(Debug, Clone)]
struct Job {
    source_path: String,
    path: PathBuf,
    incident_id: String,
}

/// A worker's result, handed to the run loop for persistence
struct Finished {
    job: Job,
    attempts: u32,
    outcome: Outcome,
    raw: Option<String>,
}

impl Finished {
    fn error(job: Job, attempts: u32, message: impl Into<String>) -> Self {
        Self {
            job,
            attempts,
            outcome: Outcome::Error(message.into()),
            raw: None,
        }
    }
}

/// Everything a worker needs, shared across spawned tasks
struct Worker {
    provider: Arc<dyn ExtractionProvider>,
    assembler: Arc<dyn PromptAssembler>,
    gatekeeper: Gatekeeper,
    retry: RetryPolicy,
    max_text_length: usize,
    timeout: Duration,
}

/// Where files for one provider go
struct Destinations {
    records: PathBuf,
    raw: PathBuf,
}

impl Extractor {
    /// Create a new Extractor
    pub fn new<P, A>(provider: P, assembler: A, gatekeeper: Gatekeeper, config: ExtractorConfig) -> Self
    where
        P: ExtractionProvider + 'static,
        A: PromptAssembler + 'static,
    {
        Self {
            provider: Arc::new(provider),
            assembler: Arc::new(assembler),
            gatekeeper,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Process every `*.txt` file in `text_dir`
    ///
    /// Valid records land in `out_dir/<provider>/<incident_id>.json`.
    ///
    /// # Errors
    ///
    /// Only run-level failures: invalid configuration, an unreadable input
    /// directory, or a manifest that cannot be saved. Per-input failures are
    /// recorded in the manifest and in the returned summary.
    pub async fn run(
        &self,
        text_dir: &Path,
        out_dir: &Path,
        manifest: &mut ManifestStore,
        options: RunOptions,
    ) -> Result<RunSummary, ExtractorError> {
        self.run_until(text_dir, out_dir, manifest, options, std::future::pending())
            .await
    }

    /// Like [`run`](Self::run), stopping early when `shutdown` completes
    ///
    /// On shutdown no new input is dispatched, in-flight inputs are
    /// abandoned and their manifest rows reverted, and the manifest is saved.
    pub async fn run_until<F>(
        &self,
        text_dir: &Path,
        out_dir: &Path,
        manifest: &mut ManifestStore,
        options: RunOptions,
        shutdown: F,
    ) -> Result<RunSummary, ExtractorError>
    where
        F: Future<Output = ()>,
    {
        self.config.validate().map_err(ExtractorError::Config)?;

        let started = Instant::now();
        let provider_name = self.provider.name().to_string();
        let model = self.provider.model().map(str::to_string);
        let destinations = Destinations {
            records: out_dir.join(&provider_name),
            raw: raw_dir_for(out_dir, &provider_name),
        };

        let mut summary = RunSummary::default();
        let jobs = self.plan(text_dir, manifest, &options, &mut summary)?;

        info!(
            provider = %provider_name,
            inputs = jobs.len(),
            skipped = summary.skipped,
            workers = self.config.workers,
            "Starting extraction run"
        );

        let worker = Arc::new(Worker {
            provider: Arc::clone(&self.provider),
            assembler: Arc::clone(&self.assembler),
            gatekeeper: self.gatekeeper.clone(),
            retry: self.config.retry.clone(),
            max_text_length: self.config.max_text_length,
            timeout: self.config.provider_timeout(),
        });

        let mut queue = jobs.into_iter();
        let mut in_flight: JoinSet<Finished> = JoinSet::new();
        let mut claimed: HashMap<Id, Job> = HashMap::new();
        tokio::pin!(shutdown);

        loop {
            while in_flight.len() < self.config.workers {
                let Some(job) = queue.next() else { break };
                claim(manifest, &job, &provider_name, model.as_deref())?;

                let task_worker = Arc::clone(&worker);
                let task_job = job.clone();
                let handle = in_flight.spawn(async move { task_worker.process(task_job).await });
                claimed.insert(handle.id(), job);
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    summary.interrupted = true;
                    break;
                }
                Some(joined) = in_flight.join_next_with_id() => {
                    if let Some(finished) = settle(joined, &mut claimed) {
                        self.record(manifest, finished, &destinations, &mut summary)?;
                    }
                }
                else => break,
            }
        }

        if summary.interrupted {
            in_flight.abort_all();
            while let Some(joined) = in_flight.join_next_with_id().await {
                // Inputs that completed before the abort are kept
                if let Ok(result) = joined {
                    if let Some(finished) = settle(Ok(result), &mut claimed) {
                        self.record(manifest, finished, &destinations, &mut summary)?;
                    }
                }
            }
            for job in claimed.values() {
                if let Some(mut entry) = manifest.get(&job.source_path).cloned() {
                    entry.revert_attempt();
                    manifest.upsert(entry);
                }
            }
            manifest.save()?;
            warn!(abandoned = claimed.len(), "Extraction run interrupted");
        }

        summary.elapsed = started.elapsed();
        info!(
            valid = summary.valid,
            invalid = summary.invalid,
            error = summary.error,
            skipped = summary.skipped,
            attempts = summary.attempts,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Extraction run complete"
        );
        Ok(summary)
    }

    /// Decide which inputs this run processes, in sorted path order
    fn plan(
        &self,
        text_dir: &Path,
        manifest: &ManifestStore,
        options: &RunOptions,
        summary: &mut RunSummary,
    ) -> Result<Vec<Job>, ExtractorError> {
        let mut jobs = Vec::new();
        for path in discover_inputs(text_dir)? {
            let Some(incident_id) = incident_id_from_path(&path) else {
                warn!(path = %path.display(), "Skipping input without a usable file name");
                continue;
            };
            let source_path = path.to_string_lossy().into_owned();

            if options.resume && already_extracted(manifest.get(&source_path)) {
                debug!(incident_id = %incident_id, "Already extracted, skipping (resume)");
                summary.skipped += 1;
                continue;
            }

            if options.limit.is_some_and(|limit| jobs.len() >= limit) {
                info!(limit = jobs.len(), "Reached input limit, stopping");
                break;
            }

            jobs.push(Job {
                source_path,
                path,
                incident_id,
            });
        }
        Ok(jobs)
    }

    /// Persist one outcome: raw archive, record file, manifest row
    fn record(
        &self,
        manifest: &mut ManifestStore,
        finished: Finished,
        destinations: &Destinations,
        summary: &mut RunSummary,
    ) -> Result<(), ExtractorError> {
        let Finished {
            job,
            attempts,
            outcome,
            raw,
        } = finished;

        if self.config.save_raw_responses {
            if let Some(raw) = &raw {
                let raw_path = destinations.raw.join(format!("{}.txt", job.incident_id));
                if let Err(e) = atomic_write(&raw_path, raw.as_bytes()) {
                    warn!(incident_id = %job.incident_id, error = %e, "Cannot archive raw response");
                }
            }
        }

        let mut entry = manifest.get(&job.source_path).cloned().unwrap_or_else(|| {
            ManifestEntry::pending(&job.source_path, &job.incident_id, self.provider.name())
        });

        let record_path = destinations.records.join(format!("{}.json", job.incident_id));
        entry.output_path = None;
        let outcome = match outcome {
            Outcome::Valid(record) => match write_record(&record_path, &record) {
                Ok(()) => {
                    entry.output_path = Some(record_path.to_string_lossy().into_owned());
                    Outcome::Valid(record)
                }
                Err(e) => Outcome::Error(format!("cannot write output {}: {}", record_path.display(), e)),
            },
            other => other,
        };
        if entry.output_path.is_none() {
            discard_stale_record(&record_path, &job.incident_id);
        }

        entry.status = outcome.status();
        entry.error_message = match &outcome {
            Outcome::Valid(_) => None,
            Outcome::Invalid(violations) => Some(summarize_violations(violations)),
            Outcome::Error(message) => Some(message.clone()),
        };
        entry.attempt_count = entry.attempt_count.saturating_add(attempts);
        entry.last_attempt_at = Some(Utc::now());
        entry.prior_status = None;

        summary.attempts = summary.attempts.saturating_add(attempts);
        match entry.status {
            ManifestStatus::Valid => {
                summary.valid += 1;
                info!(incident_id = %job.incident_id, attempts, "Extracted valid record");
            }
            status => {
                let message = entry.error_message.clone().unwrap_or_default();
                if status == ManifestStatus::Invalid {
                    summary.invalid += 1;
                } else {
                    summary.error += 1;
                }
                warn!(incident_id = %job.incident_id, status = %status, attempts, error = %message, "Extraction failed");
                summary.failures.push(RunFailure {
                    source_path: job.source_path.clone(),
                    incident_id: job.incident_id.clone(),
                    status,
                    message,
                });
            }
        }

        manifest.upsert(entry);
        manifest.save()?;
        Ok(())
    }
}

impl Worker {
    /// Read, prompt, call (with retries), parse and validate one input
    async fn process(&self, job: Job) -> Finished {
        let text = match tokio::fs::read_to_string(&job.path).await {
            Ok(text) => text,
            Err(e) => return Finished::error(job, 1, format!("cannot read input: {}", e)),
        };
        if text.trim().is_empty() {
            return Finished::error(job, 1, "empty text file");
        }
        let length = text.chars().count();
        if length > self.max_text_length {
            return Finished::error(
                job,
                1,
                format!("text too long: {} chars (max {})", length, self.max_text_length),
            );
        }

        let prompt = self.assembler.assemble(&text);
        debug!(incident_id = %job.incident_id, prompt_len = prompt.len(), "Prompt assembled");

        let mut attempt = 0u32;
        let raw = loop {
            attempt += 1;
            match self.call_provider(&prompt).await {
                Ok(raw) => break raw,
                Err(e) => match self.retry.delay_for(attempt, &e) {
                    Some(delay) => {
                        warn!(
                            incident_id = %job.incident_id,
                            attempt,
                            error = %e,
                            delay_ms = delay.as_millis() as u64,
                            "Retryable provider failure"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Finished::error(job, attempt, e.to_string()),
                },
            }
        };

        let outcome = self.check(&job.incident_id, &raw);
        Finished {
            job,
            attempts: attempt,
            outcome,
            raw: Some(raw),
        }
    }

    /// Parse and validate a raw response; the file-derived id wins
    fn check(&self, incident_id: &str, raw: &str) -> Outcome {
        let mut value = match parse_response(raw) {
            Ok(value) => value,
            Err(e) => return Outcome::Invalid(vec![e.to_string()]),
        };
        if let Some(object) = value.as_object_mut() {
            object.insert("incident_id".to_string(), Value::String(incident_id.to_string()));
        }

        let result = self.gatekeeper.validate(&value);
        if result.is_valid() {
            Outcome::Valid(value)
        } else {
            Outcome::Invalid(result.messages())
        }
    }

    /// Call the provider in a blocking context since ExtractionProvider is not async
    async fn call_provider(&self, prompt: &str) -> Result<String, ProviderError> {
        let provider = Arc::clone(&self.provider);
        let name = provider.name().to_string();
        let prompt = prompt.to_string();
        let call = tokio::task::spawn_blocking(move || provider.extract(&prompt));

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ProviderError::new(
                name,
                ProviderErrorKind::InvalidResponse,
                format!("provider task failed: {}", join_error),
            )),
            Err(_) => Err(ProviderError::new(
                name,
                ProviderErrorKind::Timeout,
                format!("no response within {}s", self.timeout.as_secs()),
            )),
        }
    }
}

/// Mark a job's row `in_progress` and persist it before work starts
fn claim(
    manifest: &mut ManifestStore,
    job: &Job,
    provider: &str,
    model: Option<&str>,
) -> Result<(), ExtractorError> {
    let mut entry = manifest
        .get(&job.source_path)
        .cloned()
        .unwrap_or_else(|| ManifestEntry::pending(&job.source_path, &job.incident_id, provider));
    entry.incident_id = job.incident_id.clone();
    entry.provider = provider.to_string();
    entry.model = model.map(str::to_string);
    entry.begin_attempt(Utc::now());
    manifest.upsert(entry);
    manifest.save()?;
    Ok(())
}

/// Turn a joined task into a result to record; a panicked worker is an `error`
fn settle(
    joined: Result<(Id, Finished), tokio::task::JoinError>,
    claimed: &mut HashMap<Id, Job>,
) -> Option<Finished> {
    match joined {
        Ok((id, finished)) => {
            claimed.remove(&id);
            Some(finished)
        }
        Err(join_error) => {
            let job = claimed.remove(&join_error.id())?;
            Some(Finished::error(job, 1, format!("worker failed: {}", join_error)))
        }
    }
}

fn already_extracted(entry: Option<&ManifestEntry>) -> bool {
    entry.is_some_and(|entry| {
        entry.status == ManifestStatus::Valid
            && entry
                .output_path
                .as_deref()
                .is_some_and(|path| Path::new(path).is_file())
    })
}

/// Sorted `*.txt` files directly inside `text_dir`
fn discover_inputs(text_dir: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
    let input_error = |source| ExtractorError::InputDir {
        path: text_dir.to_path_buf(),
        source,
    };

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(text_dir).map_err(input_error)? {
        let path = entry.map_err(input_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            inputs.push(path);
        }
    }
    inputs.sort();

    if inputs.is_empty() {
        warn!(text_dir = %text_dir.display(), "No .txt files found");
    }
    Ok(inputs)
}

/// Raw responses live beside the incidents directory: `<out_dir>/../raw/<provider>`
fn raw_dir_for(out_dir: &Path, provider: &str) -> PathBuf {
    let root = out_dir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(out_dir);
    root.join("raw").join(provider)
}

fn write_record(path: &Path, record: &Value) -> io::Result<()> {
    let mut bytes = serde_json::to_vec_pretty(record).map_err(io::Error::other)?;
    bytes.push(b'\n');
    atomic_write(path, &bytes)
}

/// Remove a record left by an earlier valid run; the corpus holds valid records only
fn discard_stale_record(path: &Path, incident_id: &str) {
    match std::fs::remove_file(path) {
        Ok(()) => info!(incident_id = %incident_id, path = %path.display(), "Removed stale record"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(incident_id = %incident_id, error = %e, "Cannot remove stale record"),
    }
}
