//! Download pipeline for extmirror.
//!
//! # Structure
//!
//! - `transport` - artifact transport port and the reqwest implementation
//! - `writer` - atomic temp-then-rename artifact writes with retry
//! - `lock` - per-token async locks with re-entrancy and cleanup
//! - `selector` - version selection per platform bucket
//! - `sidecar` - metadata sidecar merge engine
//! - `layout` - on-disk layout of a download directory
//! - `inventory` - consistency report over a download directory
//! - `orchestrator` - bounded fan-out of a whole batch
//!
//! # Usage
//!
//! ```ignore
//! use extmirror_download::{Orchestrator, OrchestratorConfig, ReqwestTransport};
//!
//! let orchestrator = Orchestrator::new(source, Arc::new(transport), OrchestratorConfig::new(dir));
//! let summary = orchestrator.run(&queries).await?;
//! ```

#![deny(unused_crate_dependencies)]

pub mod inventory;
pub mod layout;
pub mod lock;
pub mod orchestrator;
pub mod selector;
pub mod sidecar;
pub mod transport;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use inventory::{ExtensionInventory, InventoryReport, scan as scan_inventory};
pub use layout::ExtensionLayout;
pub use lock::{LockOwner, NamedLock, NamedLockGuard};
pub use orchestrator::{
    BatchSummary, CompletedDownload, DEFAULT_CONCURRENCY, DEFAULT_TEMP_DIR_NAME, FailedDownload,
    Orchestrator, OrchestratorConfig, read_task_spec, write_task_spec,
};
pub use selector::select;
pub use sidecar::{MetadataStore, read_sidecar};
pub use transport::{ArtifactResponse, ArtifactTransport, ByteStream, ReqwestTransport};
pub use writer::{AtomicFileWriter, RetryPolicy, WriteOutcome, WriteRequest};

// Used by the integration tests only
#[cfg(test)]
use tokio_test as _;
