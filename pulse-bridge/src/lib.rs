//! Dashboard bridge: the constraint layer between the front end and the
//! aggregation pipeline.
//!
//! The front end sends JSON. This bridge parses it into exactly one of N
//! valid operations, executes it against the dashboard session, and
//! returns a structured result with a status the front end can branch on.
//!
//! - Every operation is an enum variant with validated parameters
//! - Every response is a structured type, not free-form text
//! - Invalid operations are rejected at parse time, not at runtime

pub mod error;
pub mod ops;
pub mod protocol;

pub use error::{BridgeError, BridgeResult};
pub use ops::DashboardOperation;
pub use protocol::{AuditEntry, Bridge, BridgeRequest, BridgeResponse, OperationResult, ResponseStatus};
