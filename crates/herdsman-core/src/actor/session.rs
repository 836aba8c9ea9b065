//! `AddHostSessionActor`: Add-host session store
//!
//! Owns the progress of every add-host session. Each message is handled
//! to completion before the next, so session updates never interleave.

use std::collections::HashMap;

use herdsman_api::AddHostStatus;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::message::{
    CreateSession, DeleteSessions, GetStatus, NewSession, UpdateSession, UpdateStatus,
};

#[derive(Debug, Default)]
struct SessionStatus {
    running: bool,
    messages: Vec<String>,
}

/// Registry of add-host sessions
pub struct AddHostSessionActor {
    sessions: HashMap<Uuid, SessionStatus>,
}

impl AddHostSessionActor {
    fn status_mut(&mut self, id: Uuid) -> Result<&mut SessionStatus, CoreError> {
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| CoreError::InvalidArgument(format!("unknown add host session [{id}]")))
    }
}

impl Actor for AddHostSessionActor {
    type Args = ();
    type Error = CoreError;

    async fn on_start(_args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(id = %actor_ref.id(), "AddHostSessionActor starting");

        Ok(Self {
            sessions: HashMap::new(),
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, sessions = self.sessions.len(), "AddHostSessionActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<CreateSession> for AddHostSessionActor {
    type Reply = NewSession;

    async fn handle(
        &mut self,
        _msg: CreateSession,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let mut id = Uuid::new_v4();
        while self.sessions.contains_key(&id) {
            id = Uuid::new_v4();
        }

        self.sessions.insert(id, SessionStatus::default());
        debug!(session = %id, "created add host session");

        NewSession { id }
    }
}

impl Message<UpdateStatus> for AddHostSessionActor {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: UpdateStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        match self.sessions.get_mut(&msg.session) {
            Some(status) => status.messages.push(msg.message),
            None => warn!(session = %msg.session, "status update for unknown add host session"),
        }
    }
}

impl Message<GetStatus> for AddHostSessionActor {
    type Reply = Result<AddHostStatus, CoreError>;

    async fn handle(
        &mut self,
        msg: GetStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let status = self.status_mut(msg.session)?;

        Ok(AddHostStatus {
            running: status.running,
            messages: status
                .messages
                .get(msg.start_message..)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            nodes: Vec::new(),
        })
    }
}

impl Message<UpdateSession> for AddHostSessionActor {
    type Reply = Result<(), CoreError>;

    async fn handle(
        &mut self,
        msg: UpdateSession,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.status_mut(msg.session)?.running = msg.running;
        Ok(())
    }
}

impl Message<DeleteSessions> for AddHostSessionActor {
    type Reply = Vec<Uuid>;

    async fn handle(
        &mut self,
        msg: DeleteSessions,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let deleted: Vec<Uuid> = msg
            .sessions
            .into_iter()
            .filter(|id| self.sessions.remove(id).is_some())
            .collect();

        if !deleted.is_empty() {
            debug!(count = deleted.len(), "deleted add host sessions");
        }

        deleted
    }
}
