//! End-to-End Integration Tests for the heap agent
//!
//! These tests drive the agent through raw protocol messages against a
//! simulated heap and verify the whole stack works together.

use heap_agent::{AgentConfig, HeapAgent};
use heap_graph::{EdgeType, NodeType, ObjectId, SimulatedHeap};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::Duration;

fn agent_with_interval(interval: Duration) -> (Arc<SimulatedHeap>, HeapAgent<Arc<SimulatedHeap>>) {
    let heap = Arc::new(SimulatedHeap::new());
    let config = AgentConfig::builder().monitor_interval(interval).build();
    let agent = HeapAgent::new(Arc::clone(&heap), config).expect("Failed to create HeapAgent");
    (heap, agent)
}

async fn call(agent: &HeapAgent<Arc<SimulatedHeap>>, id: u64, method: &str, params: Value) -> Value {
    let request = json!({ "id": id, "method": method, "params": params });
    let response = agent.handle_message(&request.to_string()).await;
    serde_json::from_str(&response).expect("Response is not JSON")
}

/// Test 1: Widget lifecycle across two diffs
#[tokio::test]
async fn test_widget_lifecycle() {
    let (heap, agent) = agent_with_interval(Duration::from_secs(3600));

    call(&agent, 1, "HeapDiff.startHeapDiff", json!({})).await;
    let widgets: Vec<ObjectId> = (0..3).map(|_| heap.allocate_rooted("Widget", 16)).collect();
    let response = call(&agent, 2, "HeapDiff.stopHeapDiff", json!({ "wantReport": true })).await;
    assert_eq!(
        response["result"]["report"],
        json!([{ "type": "Widget", "total": 3, "size": 48 }])
    );

    call(&agent, 3, "HeapDiff.startHeapDiff", json!({})).await;
    heap.free(widgets[0]);
    heap.free(widgets[1]);
    let response = call(&agent, 4, "HeapDiff.stopHeapDiff", json!({ "wantReport": true })).await;
    assert_eq!(
        response["result"]["report"],
        json!([{ "type": "Widget", "total": -2, "size": -32 }])
    );

    assert_eq!(heap.live_snapshots(), 0);
}

/// Test 2: Unchanged heap produces an empty report
#[tokio::test]
async fn test_unchanged_heap() {
    let (heap, agent) = agent_with_interval(Duration::from_secs(3600));
    for _ in 0..10 {
        heap.allocate_rooted("Stable", 24);
    }

    call(&agent, 1, "HeapDiff.startHeapDiff", json!({})).await;
    let response = call(&agent, 2, "HeapDiff.stopHeapDiff", json!({ "wantReport": true })).await;

    assert_eq!(response["result"]["report"], json!([]));
}

/// Test 3: Stop without a start yields no report
#[tokio::test]
async fn test_stop_without_start() {
    let (heap, agent) = agent_with_interval(Duration::from_secs(3600));

    let response = call(&agent, 1, "HeapDiff.stopHeapDiff", json!({ "wantReport": true })).await;

    assert!(response["result"]["report"].is_null());
    assert!(response["error"].is_null());
    assert_eq!(heap.live_snapshots(), 0);
}

/// Test 4: Objects hidden behind weak or internal edges do not count
#[tokio::test]
async fn test_filtered_edges() {
    let (heap, agent) = agent_with_interval(Duration::from_secs(3600));
    let holder = heap.allocate_rooted("Holder", 8);

    call(&agent, 1, "HeapDiff.startHeapDiff", json!({})).await;
    let cached = heap.allocate(NodeType::Object, "Cached", 64);
    heap.link(holder, EdgeType::Weak, cached);
    let hidden = heap.allocate(NodeType::Object, "Hidden", 64);
    heap.link(holder, EdgeType::Internal, hidden);
    let kept = heap.allocate(NodeType::Object, "Kept", 32);
    heap.link(holder, EdgeType::Element, kept);
    let response = call(&agent, 2, "HeapDiff.stopHeapDiff", json!({ "wantReport": true })).await;

    assert_eq!(
        response["result"]["report"],
        json!([{ "type": "Kept", "total": 1, "size": 32 }])
    );
}

/// Test 5: Direct API and protocol share one diff session
#[tokio::test]
async fn test_api_and_protocol_share_session() {
    let (heap, agent) = agent_with_interval(Duration::from_secs(3600));

    agent.start_diff();
    heap.allocate_rooted("Shared", 12);
    let response = call(&agent, 1, "HeapDiff.stopHeapDiff", json!({ "wantReport": true })).await;

    assert_eq!(response["result"]["report"][0]["type"], "Shared");
    assert!(!agent.is_diffing());
}

/// Test 6: Instance monitoring emits periodic events
#[tokio::test(start_paused = true)]
async fn test_instance_monitoring() {
    let (heap, agent) = agent_with_interval(Duration::from_secs(15));
    let mut events = agent.subscribe_instances();

    let response = call(&agent, 1, "HeapDiff.startInstanceMonitoring", json!({})).await;
    assert_eq!(response["result"]["started"], true);

    let first = events.recv().await.expect("No initial event");
    assert_eq!(first.event_type, "Instances");

    heap.allocate_rooted("Timeout", 136);
    tokio::time::sleep(Duration::from_secs(16)).await;

    let second = events.recv().await.expect("No timer event");
    let state = second.state.expect("Step produced no report");
    assert_eq!(state.get("Timeout").expect("Timeout missing").total, 1);

    call(&agent, 2, "HeapDiff.stopInstanceMonitoring", json!({})).await;
    assert!(!agent.is_monitoring());
    assert_eq!(heap.live_snapshots(), 0);
}

/// Test 7: Malformed and unknown requests
#[tokio::test]
async fn test_error_responses() {
    let (_, agent) = agent_with_interval(Duration::from_secs(3600));

    let response = agent.handle_message("not json").await;
    let response: Value = serde_json::from_str(&response).expect("Response is not JSON");
    assert_eq!(response["error"]["code"], -32700);

    let response = call(&agent, 2, "Profiler.enable", json!({})).await;
    assert_eq!(response["error"]["code"], -32601);

    let response = call(&agent, 3, "HeapDiff.stopHeapDiff", json!({ "wantReport": 1 })).await;
    assert_eq!(response["error"]["code"], -32602);
}
