//! Library crate for lyrics-sync-back, exposing modules for the binary and tests.

/// Runtime configuration: avatar catalog and room defaults.
pub mod config;
/// Data transfer objects for the wire protocol.
pub mod dto;
/// Service-level error taxonomy.
pub mod error;
/// Quiz source seam and in-memory song library.
pub mod quiz;
/// HTTP and WebSocket routes.
pub mod routes;
/// Membership control, round engine, socket handling.
pub mod services;
/// Shared state: room registry, room model, round machine.
pub mod state;
