/*!
 * Request Wrapper Tests
 * JSON in, status + JSON out
 */

use pretty_assertions::assert_eq;
use sched_model::api::{STATUS_BAD_REQUEST, STATUS_OK, SimulationRequest, handle_simulate};
use serde_json::json;

#[test]
fn test_round_robin_request() {
    let body = json!({
        "processes": [
            {"id": "1", "name": "Process 1", "arrivalTime": 0, "burstTime": 5, "priority": 1},
            {"id": "2", "name": "Process 2", "arrivalTime": 0, "burstTime": 3, "priority": 1}
        ],
        "algorithm": "Round Robin",
        "timeQuantum": 2
    });

    let response = handle_simulate(&body.to_string());
    assert_eq!(response.status, STATUS_OK);

    let result = &response.body;
    assert_eq!(result["algorithm"], json!("Round Robin"));
    assert_eq!(result["totalExecutionTime"], json!(8));
    assert_eq!(
        result["timeline"][0],
        json!({"processId": 1, "startTime": 0, "endTime": 2})
    );
    assert_eq!(result["timeline"].as_array().map(Vec::len), Some(5));
    assert_eq!(result["completedProcesses"][1]["completionTime"], json!(7));
    assert_eq!(result["metrics"]["cpuUtilization"], json!(100.0));
    // Defaults: 100 W active for 8 ticks
    assert_eq!(result["energy"]["totalEnergy"], json!(800.0));
}

#[test]
fn test_missing_processes() {
    let response = handle_simulate(r#"{"algorithm": "FCFS"}"#);
    assert_eq!(response.status, STATUS_BAD_REQUEST);
    assert_eq!(response.body, json!({"error": "Missing required parameters"}));
}

#[test]
fn test_unsupported_algorithm() {
    let response = handle_simulate(r#"{"processes": [], "algorithm": "MLFQ"}"#);
    assert_eq!(response.status, STATUS_BAD_REQUEST);
    assert_eq!(response.body, json!({"error": "Unsupported algorithm: MLFQ"}));
}

#[test]
fn test_empty_process_list_is_not_an_error() {
    let response = handle_simulate(r#"{"processes": [], "algorithm": "SRTF"}"#);
    assert_eq!(response.status, STATUS_OK);
    assert_eq!(response.body["totalExecutionTime"], json!(0));
    assert_eq!(response.body["energy"]["energyEfficiency"], json!(0.0));
    assert_eq!(response.body["metrics"]["throughput"], json!(0.0));
}

#[test]
fn test_custom_power_profile() {
    let request = SimulationRequest::from_json(
        r#"{
            "processes": [{"id": 1, "arrivalTime": 0, "burstTime": 2}],
            "algorithm": "fcfs",
            "powerProfile": {"active": 10, "idle": 2, "sleep": 1}
        }"#,
    )
    .unwrap();

    let result = request.execute().unwrap();
    assert_eq!(result.energy.total_energy, 20.0);
    assert_eq!(result.energy.average_power, 10.0);
}
