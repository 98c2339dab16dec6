//! API request and response types

use crate::db::Activity;
use crate::runtime::Reply;
use crate::state_machine::ConvState;
use serde::{Deserialize, Serialize};

/// An inbound chat message relayed by a platform adapter
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub user_id: i64,
    pub user_display_name: String,
    pub text: String,
}

/// What the bot says back, in order
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub replies: Vec<Reply>,
}

#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity: Activity,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation: ConvState,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
