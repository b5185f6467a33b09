//! Install-time coordination tying the subsystems together.
//!
//! `Agent::install` is what an embedding process calls exactly once at
//! startup. It wires the context store, event bus and installation registry,
//! applies the kill switch and install modes, runs the installable set, and
//! refuses duplicate installation attempts so one logical handoff never
//! produces two sets of events.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::boundary::Instrumentation;
use crate::config::AgentConfig;
use crate::context::ContextStore;
use crate::error::{AgentError, InstallError};
use crate::event::{EventBus, Interest, Listener, SubscriptionId};
use crate::hook::HookDispatch;
use crate::install::{
    log_install_summary, InstallBarrier, InstallationRegistry, Installable, Operation,
};
use crate::logging::init_logging;

/// A live agent installation.
pub struct Agent {
    config: AgentConfig,
    instrumentation: Instrumentation,
}

/// Result of an installation attempt.
pub enum InstallOutcome {
    Installed(Agent),
    /// Another agent already installed in this process; this attempt was a
    /// pure pass-through with no side effects.
    AlreadyInstalled,
}

impl InstallOutcome {
    pub fn agent(self) -> Option<Agent> {
        match self {
            InstallOutcome::Installed(agent) => Some(agent),
            InstallOutcome::AlreadyInstalled => None,
        }
    }
}

impl Agent {
    /// Install against the process-wide barrier with the built-in
    /// installable set.
    pub fn install_default(config: AgentConfig) -> Result<InstallOutcome, AgentError> {
        Self::install(
            config,
            crate::install::process_barrier(),
            crate::install::default_installables(),
        )
    }

    /// Install the agent. A mandatory installable failing aborts the whole
    /// installation; the embedder must treat that error as fatal at process
    /// startup, because running half-instrumented silently corrupts
    /// correlation data.
    pub fn install(
        config: AgentConfig,
        barrier: &InstallBarrier,
        installables: Vec<Box<dyn Installable>>,
    ) -> Result<InstallOutcome, AgentError> {
        config.validate()?;
        if let Err(e) = init_logging(Some(&config.logging)) {
            // A subscriber installed by the host is fine; keep using it.
            warn!("logging already initialized, reusing host subscriber: {e}");
        }

        if !barrier.try_acquire() {
            warn!(
                "agent already installed in this process; refusing to install again \
                 to prevent repeated instrumentation. This attempt has no side effects."
            );
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let registry = InstallationRegistry::new();

        if let Some(sentinel) = &config.kill_switch_path {
            if registry.poll_kill_switch(sentinel) {
                info!(sentinel = %sentinel.display(), "kill-switch sentinel present at install");
            }
        }

        if config.dependency_provider_only {
            info!("dependency-provider-only mode: supporting state loads, hooks are no-ops");
            for operation in Operation::ALL {
                registry.set_dependency_provider_only(operation, true);
            }
        }

        let bus = EventBus::new();
        let store = ContextStore::new(bus.clone());
        let instrumentation = Instrumentation::new(store, bus, registry.clone());

        for installable in &installables {
            let operation = installable.operation();
            info!(operation = %operation, "installing interception point");
            if let Err(e) = installable.install(&registry) {
                if installable.is_mandatory() {
                    error!(operation = %operation, "mandatory interception point failed: {e}");
                    return Err(InstallError::MandatoryHookFailed {
                        operation: operation.name(),
                        reason: e.to_string(),
                    }
                    .into());
                }
                warn!(operation = %operation, "optional interception point failed, skipping: {e}");
            }
        }

        log_install_summary(&registry);
        info!("agent installation complete");
        Ok(InstallOutcome::Installed(Agent {
            config,
            instrumentation,
        }))
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn instrumentation(&self) -> &Instrumentation {
        &self.instrumentation
    }

    pub fn store(&self) -> &ContextStore {
        self.instrumentation.store()
    }

    pub fn bus(&self) -> &EventBus {
        self.instrumentation.bus()
    }

    pub fn registry(&self) -> &InstallationRegistry {
        self.instrumentation.registry()
    }

    /// The untyped hook surface handed to external instrumentation.
    pub fn hooks(&self) -> HookDispatch {
        HookDispatch::new(self.instrumentation.clone())
    }

    /// Register a listener for interception events.
    pub fn subscribe(&self, interest: Interest, listener: Arc<dyn Listener>) -> SubscriptionId {
        self.instrumentation.bus().subscribe(interest, listener)
    }
}
