//! Duplicate installation attempts must not double-instrument.

use tether::{Agent, AgentConfig, EventKind, InstallBarrier, InstallOutcome};

use super::test_utils::collect_kinds;

#[test]
fn second_install_yields_exactly_one_event_set_per_handoff() {
    let barrier = InstallBarrier::new();
    let agent = Agent::install(
        AgentConfig::default(),
        &barrier,
        tether::install::default_installables(),
    )
    .unwrap()
    .agent()
    .expect("first install should win");

    let second = Agent::install(
        AgentConfig::default(),
        &barrier,
        tether::install::default_installables(),
    )
    .unwrap();
    assert!(matches!(second, InstallOutcome::AlreadyInstalled));
    assert!(second.agent().is_none());

    let kinds = collect_kinds(agent.bus());

    agent.store().create();
    let store = agent.store().clone();
    let task = agent.instrumentation().wrap_task(move || store.get("tid"));
    agent.store().destroy();
    std::thread::spawn(task).join().unwrap();

    // One logical handoff, one event apiece: no duplicated Submitted or
    // Completed from the refused second installation.
    assert_eq!(
        *kinds.lock(),
        vec![
            EventKind::ContextBegin,
            EventKind::HandoffCaptured,
            EventKind::TaskSubmitted,
            EventKind::ContextEnd,
            EventKind::HandoffEnter,
            EventKind::TaskCompleted,
            EventKind::HandoffExit,
        ]
    );
}
