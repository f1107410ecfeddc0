use campus_application::CapabilityCheck;
use campus_domain::DenialBody;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One route to probe.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-probe-request.ts"
)]
pub struct AccessProbeRequest {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    pub path: String,
}

/// Incoming payload for a batch capability probe.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-check-request.ts"
)]
pub struct AccessCheckRequest {
    pub routes: Vec<AccessProbeRequest>,
}

/// Probe outcome for one route.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-probe-response.ts"
)]
pub struct AccessProbeResponse {
    pub method: String,
    pub path: String,
    pub allowed: bool,
}

impl From<CapabilityCheck> for AccessProbeResponse {
    fn from(value: CapabilityCheck) -> Self {
        Self {
            method: value.method.to_string(),
            path: value.path,
            allowed: value.allowed,
        }
    }
}

/// Batch capability probe result, in request order.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-check-response.ts"
)]
pub struct AccessCheckResponse {
    pub results: Vec<AccessProbeResponse>,
}

/// Body returned with 401/403 access denials.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-denied-response.ts"
)]
pub struct AccessDeniedResponse {
    pub success: bool,
    pub error: String,
}

impl From<DenialBody> for AccessDeniedResponse {
    fn from(value: DenialBody) -> Self {
        Self {
            success: value.success,
            error: value.error,
        }
    }
}
