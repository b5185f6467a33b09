//! Kill-switch sentinel behavior through the full install path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tether::{Agent, AgentConfig, InstallBarrier, Interest, Operation};

#[test]
fn sentinel_file_disables_all_interception() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let sentinel = dir.path().join("agent.kill");
    std::fs::write(&sentinel, b"")?;

    let config = AgentConfig {
        kill_switch_path: Some(sentinel),
        ..AgentConfig::default()
    };
    let barrier = InstallBarrier::new();
    let agent = Agent::install(config, &barrier, tether::install::default_installables())?
        .agent()
        .expect("first install should win");

    for operation in Operation::ALL {
        assert!(!agent.registry().should_intercept(operation));
    }

    // Wrapped work still runs, but passes through without propagation or
    // events.
    let events = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&events);
    agent.bus().subscribe_fn(Interest::All, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    agent.store().create();
    agent.store().put("tid", "42");
    let observed_events_before = events.load(Ordering::SeqCst);

    let store = agent.store().clone();
    let task = agent.instrumentation().wrap_task(move || store.get("tid"));
    let observed = std::thread::spawn(task).join().unwrap();
    assert_eq!(observed, None, "kill-switched handoff must not propagate");
    assert_eq!(events.load(Ordering::SeqCst), observed_events_before);

    agent.store().destroy();
    Ok(())
}

#[test]
fn absent_sentinel_leaves_interception_enabled() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let config = AgentConfig {
        kill_switch_path: Some(dir.path().join("agent.kill")),
        ..AgentConfig::default()
    };
    let barrier = InstallBarrier::new();
    let agent = Agent::install(config, &barrier, tether::install::default_installables())?
        .agent()
        .expect("first install should win");

    for operation in Operation::ALL {
        assert!(agent.registry().should_intercept(operation));
    }
    Ok(())
}
