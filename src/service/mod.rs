//! Application services.
//!
//! Each service owns the business rules for one resource and talks to
//! persistence only through [`Storage`]. The two services that call the
//! LLM share one [`AgentStages`].
//!
//! ```text
//! Services
//!   ├── ArticleService        → Storage + AgentStages (pipeline, validation)
//!   ├── UserOutputService     → Storage + AgentStages (feedback)
//!   ├── MemoryItemService     → Storage
//!   └── ReadingSessionService → Storage + MemoryItemService
//! ```

pub mod articles;
pub mod memory_items;
pub mod reading_sessions;
#[cfg(test)]
pub(crate) mod testing;
pub mod user_outputs;

use std::sync::Arc;

pub use articles::{ArticleService, ScheduleRequest};
pub use memory_items::MemoryItemService;
pub use reading_sessions::{
    CompleteSessionRequest, CreateSessionRequest, ReadingSessionService, SubmitUnderstandingRequest,
};
pub use user_outputs::{SubmittedOutput, UserOutputService};

use crate::agent::AgentStages;
use crate::error::ServiceError;
use crate::storage::Storage;

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// All services over one store and one set of agents.
#[derive(Clone)]
pub struct Services {
    /// Articles and the AI pipeline.
    pub articles: ArticleService,
    /// Written responses and their feedback.
    pub outputs: UserOutputService,
    /// The memory bank.
    pub memory: MemoryItemService,
    /// Reading sessions.
    pub sessions: ReadingSessionService,
}

impl Services {
    /// Wires every service to `storage` and `agents`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, agents: Arc<AgentStages>) -> Self {
        let memory = MemoryItemService::new(Arc::clone(&storage));
        Self {
            articles: ArticleService::new(Arc::clone(&storage), Arc::clone(&agents)),
            outputs: UserOutputService::new(Arc::clone(&storage), agents),
            sessions: ReadingSessionService::new(storage, memory.clone()),
            memory,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// A fresh record identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
