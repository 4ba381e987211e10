//! Crawler module for fetching and extraction runs
//!
//! This module contains the run logic, including:
//! - HTTP fetching with outcome classification
//! - The fixed-capacity worker pool
//! - The download coordinator (resume, scan, dispatch, drain)
//! - Sequential batch extraction over downloaded files

mod batch;
mod coordinator;
mod fetcher;
mod pool;

pub use batch::{run_batch_extract, FileOutcome};
pub use coordinator::{run_download, Coordinator};
pub use fetcher::{build_http_client, Fetcher, VisitOutcome};
pub use pool::{PoolToken, WorkerPool};
