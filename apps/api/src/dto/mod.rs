mod access;
mod common;

pub use access::{
    AccessCheckRequest, AccessCheckResponse, AccessDeniedResponse, AccessProbeRequest,
    AccessProbeResponse,
};
pub use common::{HealthDependencyStatus, HealthResponse, UserIdentityResponse};
