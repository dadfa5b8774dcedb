//! Bridge Solver - girder-line analysis and load rating in native Rust
//!
//! This library provides the numeric core of a bridge rating engine:
//! - Linear static beam analysis (penalty supports, skyline Cholesky)
//! - Composite section and prestress calculations for precast girders
//! - Time-dependent prestress losses (approximate and refined)
//! - Construction stage sequencing from transfer to long-term service
//! - Influence lines by unit dislocation
//! - Moving-load optimization over position, direction and axle spacing
//! - Load rating at inventory and operating levels
//!
//! Everything here is a pure function of its inputs. Progress reporting and
//! cancellation go through an [`AnalysisContext`](control::AnalysisContext)
//! supplied by the caller; job queues and transports live outside the crate.
//!
//! ## Example
//! ```rust
//! use bridge_solver::prelude::*;
//!
//! let catalog = Catalog::standard();
//! let girder = GirderDefinition {
//!     spans: vec![80.0, 80.0],
//!     prestress: Some(PrestressLayout::from_rows(&[(12, 2.0), (12, 4.0)])),
//!     ..GirderDefinition::default()
//! };
//! let request = AnalysisRequest::new(girder, AnalysisKind::LoadRating)
//!     .with_vehicles(&["HL93", "TYPE3"]);
//!
//! let result = run_analysis(&request, &catalog, &AnalysisContext::detached());
//! assert_eq!(result.status, AnalysisStatus::Completed);
//! let summary = result.summary.unwrap();
//! println!("governing RF = {:?}", summary.min_rating_factor);
//! ```

pub mod analysis;
pub mod api;
pub mod builder;
pub mod catalog;
pub mod control;
pub mod elements;
pub mod error;
pub mod girder;
pub mod influence;
pub mod loads;
pub mod losses;
pub mod math;
pub mod model;
pub mod moving_load;
pub mod rating;
pub mod results;
pub mod stages;
pub mod units;
pub mod vehicle;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{LinearSystem, SolverOptions};
    pub use crate::api::{
        run_analysis, run_bounded, AnalysisKind, AnalysisRequest, AnalysisResult, AnalysisStatus,
        AnalysisSummary, DetailedResult, ExecutionTier, TierLimits,
    };
    pub use crate::builder::GirderLineBuilder;
    pub use crate::catalog::Catalog;
    pub use crate::control::{AnalysisContext, CancellationToken, ProgressEvent, ProgressSink};
    pub use crate::elements::{ElementKind, Material, Member, Node, Section, Support};
    pub use crate::error::{BridgeError, BridgeResult, LimitKind, LimitWarning};
    pub use crate::girder::{GirderDefinition, GirderShape, GirderSystem, PrestressLayout};
    pub use crate::influence::{InfluenceGenerator, InfluenceLine, InfluenceOptions, InfluenceQuantity};
    pub use crate::loads::{DistributedLoad, LoadSet, NodeLoad};
    pub use crate::losses::{Environment, LossBreakdown, LossMethod};
    pub use crate::model::{BridgeModel, GirderLayout};
    pub use crate::moving_load::{optimize, MovingLoadResult, OptimizerOptions, Placement};
    pub use crate::rating::{ForceEffect, RatingEngine, RatingFactors, RatingResult, LoadRestriction};
    pub use crate::results::{NodeDisplacement, Reactions, Solution};
    pub use crate::stages::{ConstructionStage, StageHistory, StageKind, StageManager};
    pub use crate::vehicle::{AxleSpacing, LaneLoadMode, Vehicle};
}

#[cfg(feature = "wasm")]
pub mod wasm;
