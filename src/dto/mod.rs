//! Data transfer objects for the WebSocket protocol and HTTP surface.

/// Health check payloads.
pub mod health;
/// Room and player snapshots plus the settings patch.
pub mod room;
/// Validation helpers for DTOs.
pub mod validation;
/// Inbound and outbound WebSocket messages.
pub mod ws;
