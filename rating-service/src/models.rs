use bridge_solver::api::{AnalysisResult, AnalysisStatus, ExecutionTier};
use bridge_solver::control::ProgressEvent;
use bridge_solver::vehicle::Vehicle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned when an analysis is queued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: Uuid,
    pub status: AnalysisStatus,
    /// Tier the request needs; the service only queues what it may run
    pub tier: ExecutionTier,
    pub submitted_at: DateTime<Utc>,
    pub status_url: String,
    pub progress_url: String,
}

impl JobHandle {
    pub fn new(job_id: Uuid, tier: ExecutionTier, submitted_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            status: AnalysisStatus::Pending,
            tier,
            submitted_at,
            status_url: format!("/api/v1/analyses/{job_id}"),
            progress_url: format!("/api/v1/analyses/{job_id}/progress"),
        }
    }
}

/// Status and summary of one job. The detailed payload is fetched separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: Uuid,
    pub status: AnalysisStatus,
    pub cancel_requested: bool,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Last progress event seen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressEvent>,
    pub result: AnalysisResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressQuery {
    /// First sequence number to return
    #[serde(default)]
    pub since: u64,
}

/// Progress events from `since` onwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressPage {
    pub job_id: Uuid,
    pub events: Vec<ProgressEvent>,
    /// Value of `since` for the next poll
    pub next: u64,
    pub terminal: bool,
}

/// Catalog entry as listed to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub id: String,
    pub name: String,
    /// Gross axle weight (kip)
    pub weight: f64,
    pub axles: usize,
    pub variable_spacing: bool,
    pub lane_load: Option<f64>,
}

impl From<&Vehicle> for VehicleSummary {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id.clone(),
            name: vehicle.name.clone(),
            weight: vehicle.weight(),
            axles: vehicle.axles.len(),
            variable_spacing: vehicle.spacings.iter().any(|s| s.is_variable()),
            lane_load: vehicle.lane.as_ref().map(|l| l.intensity),
        }
    }
}
