//! Loads the fixture engine that exports neither `setup` nor `release`.

mod common;

use common::fixture_library;
use orange_bridge::{
    Bridge, EngineConfig, EngineHandle, EngineState, EntryPointProvider, StringOwnership,
};
use std::sync::Arc;

#[test]
fn test_engine_without_setup_or_release() {
    let path = fixture_library("orange-fixture-engine-minimal");
    let config = EngineConfig::default().with_library_path(&path);

    let engine = Arc::new(EngineHandle::load(&config).unwrap());
    engine.setup().unwrap();
    assert_eq!(engine.state(), EngineState::Initialized);

    let (has_setup, ownership) = engine
        .with_provider(|p: &dyn EntryPointProvider| (p.has_setup(), p.ownership()))
        .unwrap();
    assert!(!has_setup);
    assert_eq!(ownership, StringOwnership::Borrowed);

    // Each result is copied before the engine's buffer is overwritten.
    let bridge = Bridge::new(engine.clone(), true);
    let first = bridge.run_query("select 1").unwrap();
    let second = bridge.run_query("select '橙子'").unwrap();
    assert_eq!(first.result_text, "ok: select 1");
    assert_eq!(second.result_text, "ok: select '橙子'");
    assert_eq!(
        bridge.fetch_info().unwrap().info_text,
        "Orange minimal fixture engine"
    );

    engine.release();
    assert_eq!(engine.state(), EngineState::Released);
}
