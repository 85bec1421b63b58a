//! Actor-based probing pipeline
//!
//! Each actor runs as an independent async task communicating via Tokio channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!     ┌──────────────┐     ┌──────────────┐
//!     │  Prober-1    │ ... │  Prober-N    │   one per endpoint, own ticker
//!     └──────┬───────┘     └──────┬───────┘
//!            │ Report             │ Report
//!     ┌──────▼───────┐     ┌──────▼───────┐
//!     │ report chan  │     │ report chan  │   bounded, oldest dropped first
//!     └──────┬───────┘     └──────┬───────┘
//!            └─────────┬──────────┘
//!                      │ drained on refresh
//!            ┌─────────▼──────────┐
//!            │  CoordinatorActor  │   owns Fleet + EndpointStats
//!            └─────────▲──────────┘
//!                      │ Refresh / Snapshot
//!            ┌─────────┴──────────┐
//!            │ Dashboard/headless │
//!            └────────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel for control messages
//! 2. **Reports**: Probers publish to a per-endpoint broadcast channel
//! 3. **Request/Response**: oneshot channels for refresh and snapshot queries

pub mod coordinator;
pub mod messages;
pub mod prober;
