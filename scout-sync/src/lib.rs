//! # Scout Sync
//!
//! Offline-first core for scouting observations:
//! - Field transformer turning positional form values into label-keyed records
//! - Submission coordinator routing each record to the backend or the local queue
//! - Data fusion view over the remote mirror plus the local queue
//! - Assignment reconciler computing outstanding work from schedule rosters
//! - Reupload coordinator draining the local queue when connectivity returns
//!
//! Everything persists through the `kv_store` table from `scout_common::db`
//! and talks to the backend through the [`remote::RemoteStore`] trait.

pub mod connectivity;
pub mod fusion;
pub mod model;
pub mod reconciler;
pub mod remote;
pub mod reupload;
pub mod schema;
pub mod service;
pub mod storage;
pub mod submission;
pub mod teams;
pub mod transform;

pub use connectivity::Connectivity;
pub use fusion::DataFusionView;
pub use reconciler::AssignmentReconciler;
pub use remote::{RemoteError, RemoteStore, RestRemote};
pub use reupload::{ReuploadCoordinator, ReuploadReport};
pub use service::{ScoutSync, SyncConfig};
pub use submission::{SubmissionCoordinator, SubmissionOutcome, SubmissionState};
