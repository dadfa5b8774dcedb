use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bridge_solver::api::{
    run_analysis, AnalysisFailure, AnalysisRequest, AnalysisResult, AnalysisStatus, DetailedResult, ExecutionTier,
    TierLimits,
};
use bridge_solver::catalog::Catalog;
use bridge_solver::control::{AnalysisContext, CancellationToken, ProgressEvent};
use bridge_solver::error::BridgeError;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::models::{JobHandle, JobView, ProgressPage};

struct Job {
    status: AnalysisStatus,
    submitted_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    cancel: CancellationToken,
    events: Vec<ProgressEvent>,
    result: AnalysisResult,
    detail: Option<DetailedResult>,
}

impl Job {
    fn new(submitted_at: DateTime<Utc>, cancel: CancellationToken) -> Self {
        Self {
            status: AnalysisStatus::Pending,
            submitted_at,
            started_at: None,
            finished_at: None,
            cancel,
            events: Vec::new(),
            result: AnalysisResult::pending(),
            detail: None,
        }
    }

    fn view(&self, job_id: Uuid) -> JobView {
        JobView {
            job_id,
            status: self.status,
            cancel_requested: self.cancel.is_cancelled(),
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            progress: self.events.last().cloned(),
            result: self.result.clone(),
        }
    }

    /// Close a job the core never ran, keeping the one-terminal-event rule
    fn close(&mut self, status: AnalysisStatus, phase: &str, error: AnalysisFailure) {
        if !self.events.iter().any(|e| e.terminal) {
            self.events.push(ProgressEvent {
                sequence: self.events.len() as u64,
                phase: phase.to_string(),
                percent: 100.0,
                message: Some(error.message.clone()),
                terminal: true,
            });
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.result = AnalysisResult {
            status,
            error: Some(error),
            ..AnalysisResult::pending()
        };
    }
}

/// Queued, running and finished analyses
///
/// Work runs on the blocking pool, at most `workers` analyses at a time.
/// Detailed payloads are kept apart from the job record and only returned
/// by [`JobStore::detail`]. Finished jobs are dropped once they are older
/// than the configured retention.
pub struct JobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
    catalog: Arc<Catalog>,
    workers: Arc<Semaphore>,
    plan: ExecutionTier,
    tier_limits: TierLimits,
    retention: Duration,
}

impl JobStore {
    pub fn new(catalog: Catalog, config: &ServiceConfig) -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(HashMap::new()),
            catalog: Arc::new(catalog),
            workers: Arc::new(Semaphore::new(config.workers)),
            plan: config.plan,
            tier_limits: config.tier_limits,
            retention: config.retention,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn plan(&self) -> ExecutionTier {
        self.plan
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<Uuid, Job>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of jobs by state: (pending, running, finished)
    pub fn counts(&self) -> (usize, usize, usize) {
        let jobs = self.jobs();
        let count = |status: AnalysisStatus| jobs.values().filter(|j| j.status == status).count();
        let pending = count(AnalysisStatus::Pending);
        let running = count(AnalysisStatus::Running);
        (pending, running, jobs.len() - pending - running)
    }

    /// Drop finished jobs whose retention has lapsed at `now`. Returns the
    /// number removed. Pending and running jobs are never dropped.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let retention = self.retention;
        let mut jobs = self.jobs();
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at {
            Some(finished) if job.status.is_terminal() => {
                !(now - finished).to_std().is_ok_and(|age| age >= retention)
            }
            _ => true,
        });
        let purged = before - jobs.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = jobs.len(), "Expired jobs dropped");
        }
        purged
    }

    /// Queue an analysis. Plan limits are enforced here, before anything runs.
    pub fn submit(self: &Arc<Self>, mut request: AnalysisRequest) -> Result<JobHandle, ExecutorError> {
        request.options.tier_limits = self.tier_limits;
        request.plan = request.plan.min(self.plan);
        let tier = ExecutionTier::check(&request, &self.tier_limits, request.plan)?;

        let job_id = Uuid::new_v4();
        let submitted_at = Utc::now();
        self.purge_expired(submitted_at);
        let cancel = CancellationToken::new();
        self.jobs().insert(job_id, Job::new(submitted_at, cancel.clone()));

        tracing::info!(
            %job_id,
            ?tier,
            kind = ?request.kind,
            spans = request.girder.spans.len(),
            vehicles = request.vehicles.len(),
            "Analysis queued"
        );

        let store = Arc::clone(self);
        tokio::spawn(async move { store.run(job_id, request, cancel).await });

        Ok(JobHandle::new(job_id, tier, submitted_at))
    }

    async fn run(self: Arc<Self>, job_id: Uuid, request: AnalysisRequest, cancel: CancellationToken) {
        let permit = match Arc::clone(&self.workers).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                self.abort(job_id, &e.to_string());
                return;
            }
        };

        if cancel.is_cancelled() {
            tracing::info!(%job_id, "Analysis cancelled before start");
            let err = BridgeError::Cancelled {
                phase: "queued".to_string(),
            };
            self.update(job_id, |job| {
                job.close(AnalysisStatus::Cancelled, "cancelled", AnalysisFailure::from(&err))
            });
            return;
        }

        self.update(job_id, |job| {
            job.status = AnalysisStatus::Running;
            job.result.status = AnalysisStatus::Running;
            job.started_at = Some(Utc::now());
        });
        tracing::info!(%job_id, "Analysis started");

        let store = Arc::clone(&self);
        let outcome = tokio::task::spawn_blocking(move || {
            let sink_store = Arc::clone(&store);
            let sink = move |event: ProgressEvent| sink_store.record(job_id, event);
            let ctx = AnalysisContext::new(&sink, cancel);
            run_analysis(&request, &store.catalog, &ctx)
        })
        .await;
        drop(permit);

        match outcome {
            Ok(result) => self.complete(job_id, result),
            Err(e) => self.abort(job_id, &format!("worker failed: {e}")),
        }
    }

    fn update(&self, job_id: Uuid, f: impl FnOnce(&mut Job)) {
        if let Some(job) = self.jobs().get_mut(&job_id) {
            f(job);
        }
    }

    fn record(&self, job_id: Uuid, event: ProgressEvent) {
        tracing::debug!(
            %job_id,
            seq = event.sequence,
            phase = %event.phase,
            percent = event.percent,
            terminal = event.terminal,
            "Progress"
        );
        self.update(job_id, |job| job.events.push(event));
    }

    fn complete(&self, job_id: Uuid, mut result: AnalysisResult) {
        let detail = result.detach_detail(&format!("/api/v1/analyses/{job_id}/detail"));
        match (&result.status, &result.summary) {
            (AnalysisStatus::Completed, Some(summary)) => tracing::info!(
                %job_id,
                min_rf = ?summary.min_rating_factor,
                critical_vehicle = ?summary.critical_vehicle,
                warnings = summary.warning_count,
                "Analysis completed"
            ),
            (status, _) => tracing::warn!(
                %job_id,
                ?status,
                error = ?result.error.as_ref().map(|e| &e.message),
                "Analysis did not complete"
            ),
        }
        self.update(job_id, |job| {
            job.status = result.status;
            job.finished_at = Some(Utc::now());
            job.detail = detail;
            job.result = result;
        });
    }

    fn abort(&self, job_id: Uuid, message: &str) {
        tracing::error!(%job_id, "Analysis aborted: {}", message);
        let err = BridgeError::InvalidInput(message.to_string());
        self.update(job_id, |job| job.close(AnalysisStatus::Failed, "failed", AnalysisFailure::from(&err)));
    }

    pub fn view(&self, job_id: Uuid) -> Result<JobView, ExecutorError> {
        self.jobs()
            .get(&job_id)
            .map(|job| job.view(job_id))
            .ok_or(ExecutorError::NotFound(job_id))
    }

    pub fn progress(&self, job_id: Uuid, since: u64) -> Result<ProgressPage, ExecutorError> {
        let jobs = self.jobs();
        let job = jobs.get(&job_id).ok_or(ExecutorError::NotFound(job_id))?;
        let events: Vec<ProgressEvent> = job.events.iter().filter(|e| e.sequence >= since).cloned().collect();
        let next = events.last().map_or(since, |e| e.sequence + 1);
        Ok(ProgressPage {
            job_id,
            next,
            terminal: job.events.iter().any(|e| e.terminal),
            events,
        })
    }

    pub fn detail(&self, job_id: Uuid) -> Result<DetailedResult, ExecutorError> {
        let jobs = self.jobs();
        let job = jobs.get(&job_id).ok_or(ExecutorError::NotFound(job_id))?;
        match (&job.status, &job.detail) {
            (AnalysisStatus::Completed, Some(detail)) => Ok(detail.clone()),
            (status, _) => Err(ExecutorError::Conflict(format!(
                "analysis {job_id} is {status:?}; detail is only available once completed"
            ))),
        }
    }

    /// Request cooperative cancellation. The job stops at its next checkpoint.
    pub fn cancel(&self, job_id: Uuid) -> Result<JobView, ExecutorError> {
        let jobs = self.jobs();
        let job = jobs.get(&job_id).ok_or(ExecutorError::NotFound(job_id))?;
        if job.status.is_terminal() {
            return Err(ExecutorError::Conflict(format!(
                "analysis {job_id} already finished ({:?})",
                job.status
            )));
        }
        job.cancel.cancel();
        tracing::info!(%job_id, status = ?job.status, "Cancellation requested");
        Ok(job.view(job_id))
    }
}

/// Executor errors
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("analysis {0} not found")]
    NotFound(Uuid),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Rejected(#[from] BridgeError),
}
