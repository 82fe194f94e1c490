//! Observable events
//!
//! Every log line names exactly one of these.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    ConfigLoaded,
    Serving,
    ShutdownStart,
    ShutdownComplete,

    // Durable store
    SnapshotLoaded,
    SnapshotCorrupt,
    SnapshotCorruptIgnored,
    SnapshotSaved,
    SnapshotSaveFailed,

    // Registry
    RoleCommit,
    RoleCommitFailed,
    RoleNoop,

    // Replication
    ReplicationDisabled,
    Replicated,
    ReplicationSkipped,
    ReplicationFailed,
    ReplicationWorkerStopped,
    RemotePulled,

    // Command facade
    CommandReceived,
    CommandDenied,
    CommandFailed,
    RequestRejected,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "ROLECALL_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "ROLECALL_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::SnapshotLoaded => "SNAPSHOT_LOADED",
            Event::SnapshotCorrupt => "SNAPSHOT_CORRUPT",
            Event::SnapshotCorruptIgnored => "SNAPSHOT_CORRUPT_IGNORED",
            Event::SnapshotSaved => "SNAPSHOT_SAVED",
            Event::SnapshotSaveFailed => "SNAPSHOT_SAVE_FAILED",

            Event::RoleCommit => "ROLE_COMMIT",
            Event::RoleCommitFailed => "ROLE_COMMIT_FAILED",
            Event::RoleNoop => "ROLE_NOOP",

            Event::ReplicationDisabled => "REPLICATION_DISABLED",
            Event::Replicated => "REPLICATION_COMPLETE",
            Event::ReplicationSkipped => "REPLICATION_SKIPPED",
            Event::ReplicationFailed => "REPLICATION_FAILED",
            Event::ReplicationWorkerStopped => "REPLICATION_WORKER_STOPPED",
            Event::RemotePulled => "REMOTE_PULLED",

            Event::CommandReceived => "COMMAND_RECEIVED",
            Event::CommandDenied => "COMMAND_DENIED",
            Event::CommandFailed => "COMMAND_FAILED",
            Event::RequestRejected => "REQUEST_REJECTED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
