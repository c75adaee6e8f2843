//! Bridge protocol: request parsing, execution, and response formatting.
//!
//! 1. JSON -> parse into DashboardOperation (reject if invalid)
//! 2. Validate parameters (reject if out of bounds)
//! 3. Execute against the session
//! 4. Wrap the result with a status the front end can branch on
//! 5. Log the operation for the audit trail

use pulse_pipeline::thresholds::{MAX_FORECAST_HORIZON, MAX_PAGE_SIZE, MAX_TOP_N};
use pulse_pipeline::{Aggregate, DashboardSession, DashboardView, Dimension, FilterSelection, RowPage};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::ops::DashboardOperation;

/// Most dimensions a single grouped request may use.
pub const MAX_GROUP_DIMENSIONS: usize = 2;

/// A request from the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// The operation to perform.
    pub operation: DashboardOperation,

    /// Request ID for tracking.
    pub request_id: String,

    /// Optional free-form context, e.g. which widget fired.
    #[serde(default)]
    pub context: Option<String>,
}

/// Outcome class of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    NoData,
    InsufficientData { required: usize, available: usize },
    Rejected { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionList {
    pub dimension: Dimension,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Aggregate(Aggregate),
    Options(OptionList),
    Rows(RowPage),
}

/// A response to the front end.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeResponse {
    /// Request ID (echoed back).
    pub request_id: String,

    #[serde(flatten)]
    pub status: ResponseStatus,

    /// Absent when there was nothing to compute.
    pub result: Option<OperationResult>,

    /// Selection in effect after the operation.
    pub selection: FilterSelection,

    /// Rows matching `selection`.
    pub rows: usize,

    /// Was this operation read-only?
    pub read_only: bool,
}

/// Audit log entry, one per processed request.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub step: u64,
    pub request_id: String,
    pub operation: String,
    pub was_read_only: bool,
    pub status: String,
    pub error: Option<String>,
    pub selection_after: String,
}

/// Orchestrates requests against one dashboard session.
pub struct Bridge {
    session: DashboardSession,

    /// Audit log of all processed requests.
    pub audit_log: Vec<AuditEntry>,

    /// Maximum forecast horizon.
    pub max_horizon: usize,

    /// Maximum top-N.
    pub max_top_n: usize,

    /// Maximum rows per `Rows` page.
    pub max_page_size: usize,

    step: u64,
}

impl Bridge {
    pub fn new(session: DashboardSession) -> Self {
        Bridge {
            session,
            audit_log: Vec::new(),
            max_horizon: MAX_FORECAST_HORIZON,
            max_top_n: MAX_TOP_N,
            max_page_size: MAX_PAGE_SIZE,
            step: 0,
        }
    }

    pub fn session(&self) -> &DashboardSession {
        &self.session
    }

    /// Parse raw JSON into a BridgeRequest. Parameter bounds are checked
    /// by `process`, so a rejection can still echo the request id.
    pub fn parse_request(&self, raw_json: &str) -> BridgeResult<BridgeRequest> {
        serde_json::from_str(raw_json)
            .map_err(|e| BridgeError::UnknownOperation(format!("Failed to parse request: {}", e)))
    }

    /// Validate operation parameters.
    pub fn validate_operation(&self, op: &DashboardOperation) -> BridgeResult<()> {
        match op {
            DashboardOperation::AggregateBy { dimensions, .. } => {
                self.check_dimensions(op, dimensions)?;
            }
            DashboardOperation::TopInsight { dimensions, n, .. } => {
                self.check_dimensions(op, dimensions)?;
                if *n == 0 || *n > self.max_top_n {
                    return Err(invalid(op, format!("n={} out of range [1, {}]", n, self.max_top_n)));
                }
            }
            DashboardOperation::Forecast { horizon, .. } => {
                if *horizon == 0 || *horizon > self.max_horizon {
                    return Err(invalid(
                        op,
                        format!("horizon={} out of range [1, {}]", horizon, self.max_horizon),
                    ));
                }
            }
            DashboardOperation::Rows { limit, .. } => {
                if *limit == 0 || *limit > self.max_page_size {
                    return Err(invalid(
                        op,
                        format!("limit={} out of range [1, {}]", limit, self.max_page_size),
                    ));
                }
            }
            DashboardOperation::ClickState { state } => {
                if state.trim().is_empty() {
                    return Err(invalid(op, "state must not be empty".into()));
                }
            }
            _ => {} // Other operations have no parameter constraints
        }
        Ok(())
    }

    fn check_dimensions(&self, op: &DashboardOperation, dimensions: &[Dimension]) -> BridgeResult<()> {
        if dimensions.is_empty() || dimensions.len() > MAX_GROUP_DIMENSIONS {
            return Err(invalid(
                op,
                format!(
                    "{} dimensions given, expected 1 to {}",
                    dimensions.len(),
                    MAX_GROUP_DIMENSIONS
                ),
            ));
        }
        Ok(())
    }

    /// Validate and execute a parsed request.
    ///
    /// Empty subsets and short histories are expected outcomes and come
    /// back as `Ok` with a `no_data` / `insufficient_data` status. Only
    /// rejected parameters return `Err`.
    pub fn process(&mut self, request: &BridgeRequest) -> BridgeResult<BridgeResponse> {
        self.step += 1;
        let op = &request.operation;

        let outcome = match self.validate_operation(op) {
            Ok(()) => self.execute(op),
            Err(e) => Err(e),
        };
        let (status, result) = match outcome {
            Ok(result) => {
                let status = match &result {
                    OperationResult::Aggregate(Aggregate::Dashboard(DashboardView::NoData { .. })) => {
                        ResponseStatus::NoData
                    }
                    OperationResult::Rows(page) if page.total == 0 => ResponseStatus::NoData,
                    _ => ResponseStatus::Ok,
                };
                (status, Some(result))
            }
            Err(BridgeError::NoData) => (ResponseStatus::NoData, None),
            Err(BridgeError::InsufficientData { required, available, .. }) => {
                (ResponseStatus::InsufficientData { required, available }, None)
            }
            Err(e) => {
                log::warn!("request_id={} rejected: {}", request.request_id, e);
                self.record(request, "rejected", Some(e.to_string()));
                return Err(e);
            }
        };

        self.record(request, status_label(&status), None);
        log::debug!(
            "request_id={} op={} status={}",
            request.request_id,
            op.name(),
            status_label(&status)
        );

        Ok(BridgeResponse {
            request_id: request.request_id.clone(),
            status,
            result,
            selection: self.session.selection().clone(),
            rows: self.session.subset_len(),
            read_only: op.is_read_only(),
        })
    }

    /// Handle one line of input and return one line of JSON output.
    ///
    /// Unparseable or invalid requests become a `rejected` response rather
    /// than an error, so a stdio loop can keep going.
    pub fn handle_line(&mut self, line: &str) -> BridgeResult<String> {
        let response = match self.parse_request(line) {
            Ok(request) => match self.process(&request) {
                Ok(response) => response,
                Err(e) => self.rejection(request.request_id.clone(), &e),
            },
            Err(err) => {
                log::warn!("unparseable request: {}", err);
                self.rejection(String::new(), &err)
            }
        };
        Ok(serde_json::to_string(&response)?)
    }

    fn rejection(&self, request_id: String, err: &BridgeError) -> BridgeResponse {
        BridgeResponse {
            request_id,
            status: ResponseStatus::Rejected {
                message: err.to_string(),
            },
            result: None,
            selection: self.session.selection().clone(),
            rows: self.session.subset_len(),
            read_only: true,
        }
    }

    fn execute(&mut self, op: &DashboardOperation) -> BridgeResult<OperationResult> {
        let view = match op {
            DashboardOperation::Select(selection) => self.session.select(selection.clone()),
            DashboardOperation::ClickState { state } => self.session.click_state(state.trim()),
            DashboardOperation::ClearSelection => self.session.clear(),
            DashboardOperation::Rows { offset, limit } => {
                return Ok(OperationResult::Rows(self.session.rows(*offset, *limit)));
            }
            DashboardOperation::Options { dimension } => {
                return Ok(OperationResult::Options(OptionList {
                    dimension: *dimension,
                    values: self.session.store().options(*dimension),
                }));
            }
            _ => {
                let request = op
                    .aggregate_request()
                    .ok_or_else(|| BridgeError::UnknownOperation(op.name().to_string()))?;
                return Ok(OperationResult::Aggregate(self.session.compute(&request)?));
            }
        };
        Ok(OperationResult::Aggregate(Aggregate::Dashboard(view)))
    }

    fn record(&mut self, request: &BridgeRequest, status: &str, error: Option<String>) {
        self.audit_log.push(AuditEntry {
            step: self.step,
            request_id: request.request_id.clone(),
            operation: request.operation.describe(),
            was_read_only: request.operation.is_read_only(),
            status: status.to_string(),
            error,
            selection_after: self.session.selection().to_string(),
        });
    }
}

fn invalid(op: &DashboardOperation, reason: String) -> BridgeError {
    BridgeError::InvalidParameter {
        op: op.name().into(),
        reason,
    }
}

fn status_label(status: &ResponseStatus) -> &'static str {
    match status {
        ResponseStatus::Ok => "ok",
        ResponseStatus::NoData => "no_data",
        ResponseStatus::InsufficientData { .. } => "insufficient_data",
        ResponseStatus::Rejected { .. } => "rejected",
    }
}
