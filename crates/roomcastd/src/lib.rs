//! roomcast daemon - room registry, broadcast actors and SSE server
//!
//! This crate provides the core infrastructure of the hub:
//! - `room` - One actor per room serializing attach, detach and broadcast
//! - `registry` - Lazily creates exactly one room per identifier
//! - `hub` - Attach/publish boundary with decrypting subscriptions
//! - `server` - axum HTTP surface (SSE push stream and publish endpoint)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      roomcastd                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │   HubServer     │────▶│     Hub / RoomRegistry      │   │
//! │  │  (axum, SSE)    │     │   (room_id → RoomHandle)    │   │
//! │  └────────┬────────┘     └──────────────┬──────────────┘   │
//! │           │                             │                   │
//! │           │ subscriptions               │ commands          │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │  Subscription   │◀────│   RoomActor (per room)      │   │
//! │  │  (per client)   │     │   (client set owner)        │   │
//! │  └─────────────────┘     └─────────────────────────────┘   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod hub;
pub mod registry;
pub mod room;
pub mod server;

pub use config::HubConfig;
pub use hub::{Hub, HubError, Subscription};
pub use registry::{spawn_eviction_task, RoomRegistry};
pub use server::{HubServer, ServerError};
