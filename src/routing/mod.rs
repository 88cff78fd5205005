//! # Stage: Model Routing
//!
//! ## Responsibility
//! Map a [`Classification`](crate::classifier::Classification) onto one model
//! of the static registry. The score selects a tier (LOW 1–3, MEDIUM 4–6,
//! HIGH 7–10); the tier and the task type select a cell of the routing table.
//! Every decision carries a five-step human-readable explanation plus cost
//! and latency estimates.
//!
//! ## Guarantees
//! - Total: every (tier, task type) pair maps to a registered model. The
//!   table has one field per task type and is validated against the registry
//!   at construction.
//! - Deterministic: identical classifications produce byte-identical
//!   decisions, reasoning text included.
//! - Non-blocking: `route()` does no I/O and takes `&self`.
//!
//! ## NOT Responsible For
//! - Calling the backends (that belongs to `worker`)
//! - Aggregating spend across requests (that belongs to `request_log`)

pub mod config;
pub mod cost;
pub mod registry;
pub mod router;

// Re-exports for convenience
pub use config::{RoutingConfig, RoutingTable, TierRoutes};
pub use cost::{generation_cost, CostComparison};
pub use registry::{ModelDescriptor, ModelRegistry, Provider};
pub use router::{ModelRouter, ReasoningStep, RoutingDecision, Tier};
