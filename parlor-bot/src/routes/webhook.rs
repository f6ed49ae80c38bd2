use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use parlor_shared::errors::{AppError, ErrorCode};
use parlor_shared::types::chat::{InboundUpdate, OutboundMessage};

use crate::dispatch;
use crate::AppState;

/// Single ingress for chat updates. Always acknowledges with 200 so the
/// platform never redelivers; failures surface to the user as messages.
pub async fn receive_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<InboundUpdate>,
) -> StatusCode {
    let user_id = update.user_id;
    let replies = match dispatch::handle_update(&state, update).await {
        Ok(replies) => replies,
        Err(err) => vec![error_reply(user_id, &err)],
    };
    for reply in &replies {
        if let Err(err) = state.chat.send(user_id, reply).await {
            tracing::warn!(user_id, error = %err, "reply dropped");
        }
    }
    StatusCode::OK
}

/// Maps a handler error onto the message the user sees. Validation-class
/// errors echo their own text; everything unexpected gets a generic
/// apology and a log line.
fn error_reply(user_id: i64, err: &AppError) -> OutboundMessage {
    let text = match err {
        AppError::Known { code, message } => match code {
            ErrorCode::InsufficientFunds => "Not enough points for that.".to_string(),
            ErrorCode::ProfileNotFound => "Create a profile first with /profile.".to_string(),
            ErrorCode::RoundAlreadyActive => "Finish the current round first.".to_string(),
            ErrorCode::NoActiveRound => {
                "No round in progress. Use /game to start one.".to_string()
            }
            ErrorCode::FeatureDisabled => "That section is switched off right now.".to_string(),
            ErrorCode::Forbidden => "That command is for admins.".to_string(),
            ErrorCode::ItemNotFound => "That item is gone from the shop.".to_string(),
            ErrorCode::PurchaseNotFound => "That gift link has expired.".to_string(),
            ErrorCode::NotGiftRecipient => "This gift is addressed to someone else.".to_string(),
            ErrorCode::DrawClosed => "The gift draw is closed.".to_string(),
            ErrorCode::ValidationError
            | ErrorCode::BadRequest
            | ErrorCode::InvalidBet
            | ErrorCode::DoubleNotAllowed => message.clone(),
            _ => {
                tracing::error!(user_id, code = code.code(), message, "update failed");
                "Something went wrong. Please try again.".to_string()
            }
        },
        AppError::Validation(message) => message.clone(),
        other => {
            tracing::error!(user_id, error = %other, "update failed");
            "Something went wrong. Please try again.".to_string()
        }
    };
    OutboundMessage::text(text)
}
