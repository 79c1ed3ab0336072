//! Session behaviour over an in-memory gateway
//!
//! Each test plays the gateway side of one session by hand and checks the
//! single outcome the session reports.

use serde_json::json;
use switchsim_core::messages;
use switchsim_runtime::transport::memory::{self, MemoryPeer};
use switchsim_runtime::{
    Command, ConfigMessageStore, FaultReason, OutboundMessage, OutcomeReceiver, Session,
    SessionConfig, SessionHandle, SessionResult, SwitchIdentity,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

const SWITCH: &str = "scenarioSwitch0";

struct Scenario {
    peer: MemoryPeer,
    handle: SessionHandle,
    outcomes: OutcomeReceiver,
    store: ConfigMessageStore,
    _dir: TempDir,
}

async fn start_session(script: Vec<OutboundMessage>, complete_after_script: bool) -> Scenario {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigMessageStore::new(dir.path());
    let (outcome_tx, outcomes) = mpsc::unbounded_channel();
    let (writer, reader, peer) = memory::pair(32);

    let config = SessionConfig {
        complete_after_script,
        ..SessionConfig::default()
    };
    let handle = Session::new(SwitchIdentity::new(SWITCH), config, store.clone(), outcome_tx)
        .with_script(script)
        .start(writer, reader)
        .await;

    Scenario {
        peer,
        handle,
        outcomes,
        store,
        _dir: dir,
    }
}

fn identity() -> SwitchIdentity {
    SwitchIdentity::new(SWITCH)
}

fn ack(command: Command) -> serde_json::Value {
    json!({"responseCode": 200, "cmd": command.as_str()})
}

#[tokio::test(start_paused = true)]
async fn test_check_in_ack_in_two_seconds_continues_session() {
    let script = vec![messages::check_in(&identity()), messages::config_request(&identity())];
    let mut scenario = start_session(script, true).await;

    assert_eq!(scenario.peer.recv_json().await.unwrap()["cmd"], "switch/check_in");
    time::sleep(Duration::from_secs(2)).await;
    scenario.peer.send_json(ack(Command::CheckIn)).await;

    // The session moved on to the next request without faulting
    assert_eq!(scenario.peer.recv_json().await.unwrap()["cmd"], "switch/config_msg");
    assert!(scenario.outcomes.try_recv().is_err());

    scenario.peer.send_json(ack(Command::ConfigMsg)).await;
    let outcome = scenario.outcomes.recv().await.unwrap();
    assert_eq!(outcome.switch_name, SWITCH);
    assert_eq!(outcome.result, SessionResult::Success);

    scenario.handle.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_missing_ack_times_out_after_window() {
    let started = Instant::now();
    let mut scenario = start_session(vec![messages::check_in(&identity())], true).await;

    assert_eq!(scenario.peer.recv_json().await.unwrap()["cmd"], "switch/check_in");

    let outcome = scenario.outcomes.recv().await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(30));
    assert_eq!(
        outcome.result,
        SessionResult::Fault(FaultReason::Timeout {
            command: Command::CheckIn,
            waited: Duration::from_secs(30),
        })
    );

    scenario.handle.join().await;
    assert!(scenario.outcomes.recv().await.is_none());
}

#[tokio::test]
async fn test_add_mapping_answered_with_config_msg_is_mismatch() {
    let script = vec![messages::add_mapping(
        &identity(),
        messages::MappingType::PortToVrf,
    )];
    let mut scenario = start_session(script, true).await;

    assert_eq!(scenario.peer.recv_json().await.unwrap()["cmd"], "switch/add_mapping");
    scenario.peer.send_json(ack(Command::ConfigMsg)).await;

    let outcome = scenario.outcomes.recv().await.unwrap();
    assert_eq!(
        outcome.result,
        SessionResult::Fault(FaultReason::Mismatch {
            expected: Command::AddMapping,
            received: Command::ConfigMsg,
        })
    );

    scenario.handle.join().await;
}

#[tokio::test]
async fn test_reordered_acks_fail_against_first_request() {
    let script = vec![
        messages::check_in(&identity()),
        messages::add_mapping(&identity(), messages::MappingType::Vrf),
    ];
    let mut scenario = start_session(script, true).await;

    scenario.peer.recv_json().await.unwrap();
    scenario.peer.recv_json().await.unwrap();
    scenario.peer.send_json(ack(Command::AddMapping)).await;
    scenario.peer.send_json(ack(Command::CheckIn)).await;

    let outcome = scenario.outcomes.recv().await.unwrap();
    assert_eq!(
        outcome.result,
        SessionResult::Fault(FaultReason::Mismatch {
            expected: Command::CheckIn,
            received: Command::AddMapping,
        })
    );

    scenario.handle.join().await;
}

#[tokio::test]
async fn test_peer_close_mid_session_is_graceful() {
    let mut scenario = start_session(messages::session_script(&identity()), true).await;

    assert_eq!(scenario.peer.recv_json().await.unwrap()["cmd"], "switch/check_in");
    scenario.peer.send_json(ack(Command::CheckIn)).await;
    scenario.peer.send_close().await;

    let outcome = scenario.outcomes.recv().await.unwrap();
    assert_eq!(outcome.result, SessionResult::GracefulClose);

    scenario.handle.join().await;
    assert!(scenario.outcomes.recv().await.is_none());
}

#[tokio::test]
async fn test_second_config_push_replaces_first() {
    let mut scenario = start_session(Vec::new(), false).await;

    let first = json!({
        "responseCode": 200,
        "cmd": "switch/config_msg",
        "data": {"buckets": [{"lo": 0, "hi": 63, "primary": "c1", "secondary": "c2"}]}
    });
    let second = json!({
        "responseCode": 200,
        "cmd": "switch/config_msg",
        "data": {"buckets": [], "dataPathDisable": true}
    });

    scenario.peer.send_json(first).await;
    scenario.peer.send_json(second.clone()).await;
    scenario.peer.send_close().await;

    // Frames are handled in order, so both writes are done once the close lands
    assert_eq!(
        scenario.outcomes.recv().await.unwrap().result,
        SessionResult::GracefulClose
    );

    let stored = tokio::fs::read(scenario.store.path_for(SWITCH)).await.unwrap();
    assert_eq!(stored, second.to_string().into_bytes());

    scenario.handle.join().await;
}

#[tokio::test]
async fn test_long_open_session_keeps_reading_past_queue_capacity() {
    let mut scenario = start_session(Vec::new(), false).await;
    let pushes = SessionConfig::default().queue_capacity + 2;

    for n in 0..pushes {
        scenario
            .peer
            .send_json(json!({"responseCode": 200, "cmd": "switch/config_msg", "data": {"n": n}}))
            .await;
    }
    scenario.peer.send_close().await;

    let outcome = time::timeout(Duration::from_secs(5), scenario.outcomes.recv())
        .await
        .expect("close was never observed")
        .unwrap();
    assert_eq!(outcome.result, SessionResult::GracefulClose);

    let last = json!({"responseCode": 200, "cmd": "switch/config_msg", "data": {"n": pushes - 1}});
    let stored = tokio::fs::read(scenario.store.path_for(SWITCH)).await.unwrap();
    assert_eq!(stored, last.to_string().into_bytes());

    scenario.handle.join().await;
}

#[tokio::test]
async fn test_only_first_terminal_condition_is_reported() {
    let mut scenario = start_session(vec![messages::check_in(&identity())], true).await;

    scenario.peer.recv_json().await.unwrap();
    // Decode fault, then a close and a mismatched ack that must all be ignored
    scenario.peer.send(b"{broken".to_vec()).await;
    scenario.peer.send_json(ack(Command::AddMapping)).await;
    scenario.peer.send_close().await;

    let outcome = scenario.outcomes.recv().await.unwrap();
    assert!(matches!(outcome.result, SessionResult::Fault(FaultReason::Decode(_))));

    scenario.handle.join().await;
    assert!(scenario.outcomes.recv().await.is_none());
}

#[tokio::test]
async fn test_full_script_answered_in_order_succeeds() {
    let mut scenario = start_session(messages::session_script(&identity()), true).await;

    for _ in 0..5 {
        let request = scenario.peer.recv_json().await.unwrap();
        let cmd = request["cmd"].as_str().unwrap().to_string();
        assert_eq!(request["switchId"], SWITCH);
        scenario
            .peer
            .send_json(json!({"responseCode": 200, "cmd": cmd}))
            .await;
    }

    assert_eq!(
        scenario.outcomes.recv().await.unwrap().result,
        SessionResult::Success
    );

    // The config answer was persisted along the way
    assert!(scenario.store.path_for(SWITCH).exists());
    scenario.handle.join().await;
}
