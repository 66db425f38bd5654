//! # rehome Import Pipeline
//!
//! Core of the rehome tool: restores configuration-only VM export bundles
//! (metadata and disk-reference pointers, no disk images) into a hypervisor
//! host's inventory.
//!
//! Per bundle, strictly in order:
//! 1. **Eligibility** - the bundle must carry its settings descriptor and
//!    configuration subdirectory ([`bundle`]).
//! 2. **Staging** - copy the bundle under the host's canonical VM data
//!    tree, refusing to touch a pre-existing destination ([`staging`]).
//! 3. **Reconciliation** - override the export's recorded settings with
//!    host-current storage paths and validate referenced resources
//!    ([`reconcile`]).
//! 4. **Submission and job polling** - submit to the host management
//!    service and drive the asynchronous job to a terminal state
//!    ([`job`]).
//!
//! The batch runner ([`batch`]) applies the pipeline to each bundle
//! independently; one bundle's failure never aborts the others.

pub mod batch;
pub mod bundle;
pub mod error;
pub mod job;
pub mod reconcile;
pub mod report;
pub mod staging;

pub use batch::{run_batch, BatchOptions};
pub use bundle::ExportBundle;
pub use error::ImportError;
pub use job::{PollOptions, DEFAULT_POLL_INTERVAL};
pub use report::{ImportOutcome, ImportReport, ResourceCheck};
pub use staging::{stage_bundle, StagingResult};
