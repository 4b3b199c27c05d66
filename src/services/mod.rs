//! Service layer: membership control, round engine, and socket handling.

/// Health check service.
pub mod health_service;
/// Membership and lifecycle controller.
pub mod room_service;
/// Game round engine and answer grading.
pub mod round_service;
/// WebSocket connection and message dispatch.
pub mod websocket_service;
/// Outbound event building and broadcasting.
pub mod ws_events;

#[cfg(test)]
pub(crate) mod test_util;

#[cfg(test)]
mod scenario_tests;
