//! Installation coordination: which interception sites actually run.
//!
//! Every interception site asks [`InstallationRegistry::should_intercept`]
//! before doing any propagation or event work, so the check is a single
//! atomic load. The registry also carries the one-way kill switch and the
//! dependency-provider-only install mode, and [`InstallBarrier`] arbitrates
//! between concurrent installation attempts in one process.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::InstallError;

/// The fixed set of interceptable operations. New concurrency primitives are
/// added as new variants, not as open-ended subscriber types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ThreadHandoff,
    ExecutorSubmit,
    FutureComposition,
    ScopedBlock,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::ThreadHandoff,
        Operation::ExecutorSubmit,
        Operation::FutureComposition,
        Operation::ScopedBlock,
    ];

    /// Stable display name identifying the operation in logs and install
    /// failures.
    pub fn name(self) -> &'static str {
        match self {
            Operation::ThreadHandoff => "Thread handoff",
            Operation::ExecutorSubmit => "ExecutorService submit",
            Operation::FutureComposition => "Future composition",
            Operation::ScopedBlock => "Scoped block",
        }
    }

    fn index(self) -> usize {
        match self {
            Operation::ThreadHandoff => 0,
            Operation::ExecutorSubmit => 1,
            Operation::FutureComposition => 2,
            Operation::ScopedBlock => 3,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Install-time state of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Enabled,
    DisabledByKillSwitch,
    DependencyProviderOnly,
}

const MODE_ENABLED: u8 = 0;
const MODE_KILL_SWITCHED: u8 = 1;
const MODE_DEPENDENCY_PROVIDER_ONLY: u8 = 2;

struct RegistryInner {
    modes: [AtomicU8; 4],
}

/// Process-wide record of which operations may execute interception logic.
///
/// Reads are single relaxed atomic loads; writes use compare-and-set so the
/// kill switch can never be un-tripped by a concurrent mode change.
#[derive(Clone)]
pub struct InstallationRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for InstallationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallationRegistry {
    /// All operations enabled.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                modes: [
                    AtomicU8::new(MODE_ENABLED),
                    AtomicU8::new(MODE_ENABLED),
                    AtomicU8::new(MODE_ENABLED),
                    AtomicU8::new(MODE_ENABLED),
                ],
            }),
        }
    }

    pub fn mode(&self, operation: Operation) -> InstallMode {
        match self.inner.modes[operation.index()].load(Ordering::Relaxed) {
            MODE_KILL_SWITCHED => InstallMode::DisabledByKillSwitch,
            MODE_DEPENDENCY_PROVIDER_ONLY => InstallMode::DependencyProviderOnly,
            _ => InstallMode::Enabled,
        }
    }

    /// The single hot-path check made by every interception site.
    #[inline]
    pub fn should_intercept(&self, operation: Operation) -> bool {
        self.inner.modes[operation.index()].load(Ordering::Relaxed) == MODE_ENABLED
    }

    /// Toggle dependency-provider-only mode for one operation. Supporting
    /// state still loads, but the operation's hook logic becomes a no-op.
    /// Has no effect on an operation disabled by the kill switch.
    pub fn set_dependency_provider_only(&self, operation: Operation, enabled: bool) {
        let (from, to) = if enabled {
            (MODE_ENABLED, MODE_DEPENDENCY_PROVIDER_ONLY)
        } else {
            (MODE_DEPENDENCY_PROVIDER_ONLY, MODE_ENABLED)
        };
        let _ = self.inner.modes[operation.index()].compare_exchange(
            from,
            to,
            Ordering::AcqRel,
            Ordering::Relaxed,
        );
    }

    /// Disable every operation for the rest of the process lifetime.
    /// One-way: nothing in this crate re-enables a kill-switched operation.
    pub fn trip_kill_switch(&self) {
        for mode in &self.inner.modes {
            mode.store(MODE_KILL_SWITCHED, Ordering::Release);
        }
        warn!("kill switch tripped, all interception disabled until restart");
    }

    /// Check the kill-switch sentinel. The file's existence is the signal;
    /// its content is ignored. Returns true when the switch is (now) tripped.
    pub fn poll_kill_switch(&self, sentinel: &Path) -> bool {
        if sentinel.exists() {
            self.trip_kill_switch();
            true
        } else {
            false
        }
    }
}

/// Process-wide install-once marker. The first successful `try_acquire` wins;
/// later installation attempts must become pure pass-throughs so that one
/// logical handoff never produces two sets of events.
#[derive(Debug, Default)]
pub struct InstallBarrier {
    installed: AtomicBool,
}

impl InstallBarrier {
    pub const fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
        }
    }

    /// Claim the install slot. Returns true exactly once per barrier, even
    /// under concurrent attempts.
    pub fn try_acquire(&self) -> bool {
        self.installed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }
}

static PROCESS_BARRIER: InstallBarrier = InstallBarrier::new();

/// The barrier shared by all agent installations in this process.
pub fn process_barrier() -> &'static InstallBarrier {
    &PROCESS_BARRIER
}

/// One installable interception point. Implementations establish whatever
/// per-operation state the external instrumentation needs; a mandatory
/// installable failing aborts the whole installation, since running
/// half-instrumented corrupts correlation data silently.
pub trait Installable: Send {
    fn operation(&self) -> Operation;

    fn is_mandatory(&self) -> bool {
        true
    }

    fn install(&self, registry: &InstallationRegistry) -> Result<(), InstallError>;
}

/// Default installable for a core boundary operation. There is no external
/// state to establish for the built-in sites, so installing is a log line;
/// the type exists so embedders can replace or extend the set.
pub struct BoundaryInstallable {
    operation: Operation,
}

impl BoundaryInstallable {
    pub fn new(operation: Operation) -> Self {
        Self { operation }
    }
}

impl Installable for BoundaryInstallable {
    fn operation(&self) -> Operation {
        self.operation
    }

    fn install(&self, registry: &InstallationRegistry) -> Result<(), InstallError> {
        debug!(operation = %self.operation, mode = ?registry.mode(self.operation), "installed boundary interception");
        Ok(())
    }
}

/// The built-in installable set, one per core operation.
pub fn default_installables() -> Vec<Box<dyn Installable>> {
    Operation::ALL
        .iter()
        .map(|operation| Box::new(BoundaryInstallable::new(*operation)) as Box<dyn Installable>)
        .collect()
}

pub(crate) fn log_install_summary(registry: &InstallationRegistry) {
    for operation in Operation::ALL {
        info!(operation = %operation, mode = ?registry.mode(operation), "interception state");
    }
}
