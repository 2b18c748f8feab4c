//! Wire messages exchanged with the background worker.
//!
//! The worker lives behind a message-only boundary: the caller and the
//! worker share no memory, only these tagged messages. The JSON shape is
//! a flat object with a `type` discriminant and sibling payload fields,
//! e.g.:
//!
//! ```json
//! { "type": "craft", "request_id": 1, "pickups": ["penny", ...] }
//! ```
//!
//! Messages are constructed through the builder functions so a tag can
//! never disagree with its payload, and consumed through the visitor
//! dispatch functions so the compiler proves every variant is handled.
//! An unrecognized discriminant cannot be represented in safe Rust; it is
//! rejected at decode time, which is a contract violation between the two
//! sides of the boundary, not a recoverable runtime condition.

use serde::{Deserialize, Serialize};

use crate::engine::{ItemId, Pickup};

/// Correlation id for a request, unique per correlator instance.
///
/// Strictly monotonically increasing; never reused within a correlator's
/// lifetime.
pub type RequestId = u64;

// =============================================================================
// Requests
// =============================================================================

/// Request sent from the caller to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    /// Craft the given pickups and answer with the matching request id.
    Craft {
        request_id: RequestId,
        pickups: Vec<Pickup>,
    },
    /// Release the cache and terminate the worker. Messages sent after
    /// this one are silently lost.
    Shutdown,
}

impl WorkerRequest {
    /// Builds a craft request.
    pub fn craft(request_id: RequestId, pickups: Vec<Pickup>) -> Self {
        WorkerRequest::Craft {
            request_id,
            pickups,
        }
    }

    /// Builds a shutdown request.
    pub fn shutdown() -> Self {
        WorkerRequest::Shutdown
    }
}

/// Visitor over every [`WorkerRequest`] variant.
pub trait RequestVisitor<T> {
    fn visit_craft(&mut self, request_id: RequestId, pickups: Vec<Pickup>) -> T;
    fn visit_shutdown(&mut self) -> T;
}

/// Dispatches a request to exactly one visitor method.
///
/// The match is exhaustive; adding a variant to [`WorkerRequest`] fails
/// compilation until every visitor grows a matching method.
pub fn visit_request<T, V: RequestVisitor<T>>(request: WorkerRequest, visitor: &mut V) -> T {
    match request {
        WorkerRequest::Craft {
            request_id,
            pickups,
        } => visitor.visit_craft(request_id, pickups),
        WorkerRequest::Shutdown => visitor.visit_shutdown(),
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Response sent from the worker back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerResponse {
    /// The worker finished bootstrapping and will now serve requests.
    /// Sent exactly once per worker lifetime, before any craft response.
    Ready,
    /// Result for the craft request with the same id.
    Craft {
        request_id: RequestId,
        item_id: ItemId,
    },
    /// The craft request with this id could not be served by the engine.
    CraftFailed {
        request_id: RequestId,
        reason: String,
    },
}

impl WorkerResponse {
    /// Builds a ready response.
    pub fn ready() -> Self {
        WorkerResponse::Ready
    }

    /// Builds a craft response.
    pub fn craft(request_id: RequestId, item_id: ItemId) -> Self {
        WorkerResponse::Craft {
            request_id,
            item_id,
        }
    }

    /// Builds a craft failure response.
    pub fn craft_failed(request_id: RequestId, reason: impl Into<String>) -> Self {
        WorkerResponse::CraftFailed {
            request_id,
            reason: reason.into(),
        }
    }
}

/// Visitor over every [`WorkerResponse`] variant.
pub trait ResponseVisitor<T> {
    fn visit_ready(&mut self) -> T;
    fn visit_craft(&mut self, request_id: RequestId, item_id: ItemId) -> T;
    fn visit_craft_failed(&mut self, request_id: RequestId, reason: String) -> T;
}

/// Dispatches a response to exactly one visitor method.
pub fn visit_response<T, V: ResponseVisitor<T>>(response: WorkerResponse, visitor: &mut V) -> T {
    match response {
        WorkerResponse::Ready => visitor.visit_ready(),
        WorkerResponse::Craft {
            request_id,
            item_id,
        } => visitor.visit_craft(request_id, item_id),
        WorkerResponse::CraftFailed { request_id, reason } => {
            visitor.visit_craft_failed(request_id, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_craft_request_wire_shape() {
        let request = WorkerRequest::craft(7, vec![Pickup::Penny, Pickup::Key]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({ "type": "craft", "request_id": 7, "pickups": ["penny", "key"] })
        );
    }

    #[test]
    fn test_shutdown_request_wire_shape() {
        let value = serde_json::to_value(WorkerRequest::shutdown()).unwrap();
        assert_eq!(value, json!({ "type": "shutdown" }));
    }

    #[test]
    fn test_response_wire_shapes() {
        assert_eq!(
            serde_json::to_value(WorkerResponse::ready()).unwrap(),
            json!({ "type": "ready" })
        );
        assert_eq!(
            serde_json::to_value(WorkerResponse::craft(3, ItemId(114))).unwrap(),
            json!({ "type": "craft", "request_id": 3, "item_id": 114 })
        );
    }

    #[test]
    fn test_unknown_discriminant_is_rejected_at_decode() {
        let result: Result<WorkerRequest, _> =
            serde_json::from_str(r#"{ "type": "recipes" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_round_trip() {
        let request = WorkerRequest::craft(1, vec![Pickup::Rune; 8]);
        let bytes = serde_json::to_vec(&request).unwrap();
        let decoded: WorkerRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, request);
    }

    struct Recorder {
        seen: Vec<String>,
    }

    impl ResponseVisitor<()> for Recorder {
        fn visit_ready(&mut self) {
            self.seen.push("ready".into());
        }
        fn visit_craft(&mut self, request_id: RequestId, item_id: ItemId) {
            self.seen.push(format!("craft:{request_id}:{item_id}"));
        }
        fn visit_craft_failed(&mut self, request_id: RequestId, _reason: String) {
            self.seen.push(format!("failed:{request_id}"));
        }
    }

    #[test]
    fn test_visit_response_dispatches_exactly_one_method() {
        let mut recorder = Recorder { seen: Vec::new() };
        visit_response(WorkerResponse::ready(), &mut recorder);
        visit_response(WorkerResponse::craft(2, ItemId(9)), &mut recorder);
        visit_response(WorkerResponse::craft_failed(4, "bad bag"), &mut recorder);
        assert_eq!(recorder.seen, vec!["ready", "craft:2:item-9", "failed:4"]);
    }
}
