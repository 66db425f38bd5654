//! # rehome Host Service
//!
//! Abstraction layer over the hypervisor host's virtualization management
//! service, scoped to what a configuration-only import needs: reading
//! host-wide storage defaults, discovering configured virtual switches,
//! parsing an export bundle's import settings, submitting an import, and
//! polling the resulting asynchronous job.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            HostService Trait            │
//! │ (defaults, switches, settings, import,  │
//! │  job status)                            │
//! └─────────────────────┬───────────────────┘
//!                       │
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────────┐     ┌───────────────────┐
//! │  PowerShellHost   │     │     MockHost      │
//! │ (management shell)│     │ (tests, --dev)    │
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! The management service is the sole writer of job state; callers only
//! poll it. A `JobId` is an opaque reference and every poll re-fetches the
//! status from the host rather than caching a live object.

pub mod error;
pub mod mock;
pub mod powershell;
pub mod traits;
pub mod types;

pub use error::{HostError, Result};
pub use mock::MockHost;
pub use powershell::PowerShellHost;
pub use traits::HostService;
pub use types::{
    HostStorageDefaults, ImportSettings, JobId, JobState, JobStatus, SubmitResponse,
    RETURN_COMPLETED, RETURN_JOB_STARTED,
};
