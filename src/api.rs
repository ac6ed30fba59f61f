/*!
 * Request Wrapper
 * JSON request/response handling in front of `run_simulation`
 *
 * Validation of missing fields lives here, not in the simulation core. The
 * body shape is `{processes, algorithm, timeQuantum?, powerProfile?}`.
 */

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::{DEFAULT_TIME_QUANTUM, PowerProfile, SimConfig},
    error::SimError,
    sim::{Process, SimulationResult, run_simulation},
};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Request wrapper errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error(transparent)]
    Simulation(#[from] SimError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingParameters | Self::InvalidBody(_) | Self::Simulation(_) => {
                STATUS_BAD_REQUEST
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub processes: Option<Vec<Process>>,
    pub algorithm: Option<String>,
    pub time_quantum: Option<u64>,
    pub power_profile: Option<PowerProfile>,
}

impl SimulationRequest {
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Missing or zero quantum falls back to the default; a missing power
    /// profile falls back to the default profile.
    pub fn config(&self) -> SimConfig {
        let quantum = match self.time_quantum {
            Some(0) | None => DEFAULT_TIME_QUANTUM,
            Some(ticks) => ticks,
        };

        SimConfig::default()
            .with_time_quantum(quantum)
            .with_power_profile(self.power_profile.unwrap_or_default())
    }

    pub fn execute(&self) -> Result<SimulationResult, ApiError> {
        let (Some(processes), Some(algorithm)) = (&self.processes, &self.algorithm) else {
            return Err(ApiError::MissingParameters);
        };

        Ok(run_simulation(processes, algorithm, &self.config())?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn error(err: &ApiError) -> Self {
        Self {
            status: err.status(),
            body: json!({ "error": err.to_string() }),
        }
    }
}

/// Handle one `POST` body and produce the status and JSON reply.
pub fn handle_simulate(body: &str) -> ApiResponse {
    let result = SimulationRequest::from_json(body).and_then(|request| request.execute());

    match result {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(body) => {
                debug!(algorithm = %result.algorithm, "request served");
                ApiResponse {
                    status: STATUS_OK,
                    body,
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to encode simulation result");
                ApiResponse {
                    status: STATUS_INTERNAL_ERROR,
                    body: json!({ "error": "Simulation failed" }),
                }
            }
        },
        Err(err) => {
            warn!(error = %err, "simulation request rejected");
            ApiResponse::error(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_algorithm() {
        let response = handle_simulate(r#"{"processes": []}"#);
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert_eq!(response.body["error"], "Missing required parameters");
    }

    #[test]
    fn test_malformed_body() {
        let response = handle_simulate("{not json");
        assert_eq!(response.status, STATUS_BAD_REQUEST);
    }

    #[test]
    fn test_defaults_applied() {
        let request = SimulationRequest {
            time_quantum: Some(0),
            ..Default::default()
        };
        let config = request.config();
        assert_eq!(config.time_quantum.ticks(), DEFAULT_TIME_QUANTUM);
        assert_eq!(config.power_profile, PowerProfile::default());
    }
}
