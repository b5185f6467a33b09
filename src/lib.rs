//! Tether: request context propagation for instrumented programs
//!
//! Propagates a logical request identity across every concurrency boundary a
//! program crosses (thread handoff, executor submission, future composition,
//! scoped blocks) so that loggers, tracers and samplers can correlate work
//! belonging to the same originating call regardless of which physical
//! thread runs it.

pub mod agent;
pub mod boundary;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod hook;
pub mod install;
pub mod logging;

pub use agent::{Agent, InstallOutcome};
pub use boundary::Instrumentation;
pub use config::AgentConfig;
pub use context::{Context, ContextId, ContextStore, Handoff, UnitId};
pub use error::{AgentError, InstallError};
pub use event::{Event, EventBus, EventKind, EventPayload, Interest, Listener, SubscriptionId};
pub use hook::HookDispatch;
pub use install::{InstallBarrier, InstallMode, InstallationRegistry, Installable, Operation};
pub use logging::LoggingConfig;
