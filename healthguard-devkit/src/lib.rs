/*!
# HealthGuard DevKit - Mock backend and test utilities

Lets client code run end-to-end without the real backend:
- In-process mock of every backend endpoint (axum on an ephemeral port)
- Call counters, request capture, injected failures and delays
- Builders for backend payloads
*/

pub mod fixtures;
pub mod mock_backend;
pub mod test_utils;

pub use fixtures::{BackendMessageBuilder, Payload};
pub use mock_backend::{CheckinShape, MockBackend};
pub use test_utils::TestHarness;
