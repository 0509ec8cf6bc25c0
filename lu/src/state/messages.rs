//! State manager messages
//!
//! Commands and responses for the actor pattern.

use tokio::sync::oneshot;

use crate::domain::LevelData;
use crate::store::StoreError;

/// Response from state operations
pub type StateResponse<T> = Result<T, StoreError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    Get {
        account_id: String,
        reply: oneshot::Sender<StateResponse<Option<LevelData>>>,
    },
    Put {
        data: Box<LevelData>,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    ListAccounts {
        reply: oneshot::Sender<StateResponse<Vec<String>>>,
    },

    // Maintenance
    Sync {
        reply: oneshot::Sender<StateResponse<usize>>,
    },
    Compact {
        reply: oneshot::Sender<StateResponse<usize>>,
    },

    Shutdown,
}
