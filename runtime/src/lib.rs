//! # Mingle Runtime
//!
//! The engine runtime for the Mingle multi-view synchronization engine.
//!
//! This crate wires the pure core (store, mutations, projections) into a
//! running system:
//!
//! - **Engine**: the serialized reconciliation choke point; owns the
//!   canonical store, re-projects views on every applied mutation, and
//!   publishes snapshots over a `watch` channel.
//! - **Gateway**: direct user actions against the remote data service,
//!   echoed into the engine optimistically on success.
//! - **Search dispatcher**: debounced, generation-guarded search into
//!   the transient search view.
//! - **Feed subscriber + room lifecycle**: broadcast notifications
//!   translated into mutations, with reference-counted per-event topic
//!   membership and loss/recovery handling.
//! - **REST data service**: the HTTP implementation of the data-service
//!   trait.
//!
//! Both delivery routes — request results and broadcast echoes — converge
//! on [`Engine::apply`], so they cannot diverge.
//!
//! ## Example
//!
//! ```ignore
//! use mingle_runtime::{Engine, EngineConfig, Gateway, RestDataService};
//! use mingle_core::SystemClock;
//! use std::sync::Arc;
//!
//! let engine = Engine::new(Arc::new(SystemClock), EngineConfig::default());
//! let service = Arc::new(RestDataService::new("https://api.example.com")?);
//! let gateway = Gateway::new(service, engine.clone());
//!
//! gateway.load_all().await?;
//! let tick = engine.spawn_reprojection_tick();
//! ```

/// The serialized reconciliation engine
pub mod engine;
/// Change-feed subscriber and push-channel contract
pub mod feed;
/// Request mutation gateway and data-service contract
pub mod gateway;
/// HTTP data-service client
pub mod rest;
/// Reference-counted room membership
pub mod rooms;
/// Debounced search dispatch
pub mod search;

pub use engine::{ConnectionStatus, Engine, EngineConfig};
pub use feed::{FeedItem, FeedStream, FeedSubscriber, Notification, PushChannel};
pub use gateway::{DataService, Gateway, SearchPage, ServiceFuture};
pub use rest::RestDataService;
pub use rooms::RoomLifecycle;
pub use search::SearchDispatcher;
