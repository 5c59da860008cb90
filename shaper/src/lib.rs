//! A control plane for hierarchical traffic shaping on network devices.
//!
//! Callers attach bandwidth limits and fair-share weights to shaper nodes organized in a strict
//! scope hierarchy (port → netdev → detached group → queue), query them one by one or as a full
//! dump, and remove them. The engine validates every mutation against the hierarchy rules and
//! against what the device's data path declares it can enforce, then commits it atomically.
//!
//! ```text
//!   set / delete ──► Validator ──► ShaperOps::apply / remove ──► ShaperStore (commit)
//!                       │ ▲
//!                       ▼ │
//!              CapabilityTable, Scope rules
//!
//!   get / dump ──────────────────────────────────────────────► ShaperStore (read)
//! ```
//!
//! Enforcing the configuration (token buckets, round robin, ...) is the job of the driver behind
//! [`ShaperOps`]; this crate only owns the configuration state.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod caps;
mod delete;
mod device;
pub mod driver;
mod engine;
mod error;
pub mod handle;
mod node;
mod options;
mod query;
pub mod request;
mod stats;
pub mod store;
mod validate;

pub use caps::{Capability, CapabilitySet, CapabilityTable};
pub use driver::{ShaperOps, StaticDriver};
pub use engine::ShaperEngine;
pub use error::{Error, Result};
pub use handle::{Handle, Scope};
pub use node::{Metric, ShaperNode};
pub use options::EngineOptions;
pub use request::{CapGetRequest, DeleteRequest, GetRequest, Request, Response, SetRequest};
pub use stats::DeviceStats;
