//! Config file to running engine

use fluidpendant::{
    engine_config, Config, EngineEvent, MachineMode, MemoryTransport, PendantEngine, SendPolicy,
};
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[test]
fn test_config_file_drives_engine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[link]\nstatus_poll_ms = 0\nqueue_lines = true\ndisconnect_threshold_ms = 500\n",
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    let engine_config = engine_config(&config);
    assert_eq!(engine_config.default_policy, SendPolicy::Queue);
    assert_eq!(engine_config.disconnect_threshold, Duration::from_millis(500));

    let t0 = Instant::now();
    let mut engine = PendantEngine::with_start(MemoryTransport::new(), engine_config, t0);
    engine.transport_mut().push_line("<Idle|MPos:1.000,2.000,3.000>");
    engine.poll(t0);
    assert_eq!(engine.model().mode(), MachineMode::Idle);

    // Queue policy from the file lets a second line wait instead of failing
    engine.send_line("G0X1", t0).unwrap();
    engine.send_line("G0X2", t0).unwrap();
    assert_eq!(engine.queued_lines(), 1);

    engine.poll(t0 + Duration::from_millis(501));
    assert!(!engine.is_connected());
    assert!(engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, EngineEvent::LinkLost)));
}

#[test]
fn test_snapshot_json_for_host_output() {
    let t0 = Instant::now();
    let mut engine = PendantEngine::with_start(
        MemoryTransport::new(),
        engine_config(&Config::default()),
        t0,
    );
    engine.transport_mut().push_line("<Run|WPos:0.500,0.000,-1.000|FS:500,12000>");
    engine.poll(t0);

    let json = serde_json::to_value(engine.snapshot(t0)).unwrap();
    assert_eq!(json["connected"], true);
    assert_eq!(json["axes"][0], 0.5);
}
