//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use kameo_macros::Reply;
use uuid::Uuid;

// ============================================================================
// AddHostSessionActor Messages
// ============================================================================

/// Open a new add-host session
#[derive(Debug)]
pub struct CreateSession;

/// Identifier of a newly opened session
#[derive(Debug, Clone, Copy, Reply)]
pub struct NewSession {
    pub id: Uuid,
}

/// Append a progress message to a session
#[derive(Debug)]
pub struct UpdateStatus {
    pub session: Uuid,
    pub message: String,
}

/// Read a session's progress
#[derive(Debug)]
pub struct GetStatus {
    pub session: Uuid,
    /// Index of the first message to return
    pub start_message: usize,
}

/// Set a session's running flag
#[derive(Debug)]
pub struct UpdateSession {
    pub session: Uuid,
    pub running: bool,
}

/// Forget sessions; unknown ids are ignored
#[derive(Debug)]
pub struct DeleteSessions {
    pub sessions: Vec<Uuid>,
}
