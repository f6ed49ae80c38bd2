//! Gift-draw registration: a name, a photo of the wrapped gift, and a
//! sequential gift number that stays stable across re-registration.

use parlor_shared::errors::AppResult;
use parlor_shared::types::chat::OutboundMessage;

use crate::flows::engine::{FlowEngine, FlowEvent, Step, Transition};
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct SantaDraft {
    pub name: Option<String>,
    pub gift_photo_id: Option<String>,
}

static STEPS: [Step<SantaDraft>; 2] = [
    Step {
        name: "name",
        prompt: |_| OutboundMessage::text("What name should be on your gift tag?"),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send a name".to_string());
            };
            let name = text.trim();
            if name.is_empty() || name.chars().count() > 64 {
                return Err("send a name up to 64 characters".to_string());
            }
            draft.name = Some(name.to_string());
            Ok(())
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "gift_photo",
        prompt: |_| OutboundMessage::text("Send a photo of your wrapped gift."),
        apply: |draft, event| {
            let FlowEvent::Photo(file_id) = event else {
                return Err("a photo is required".to_string());
            };
            draft.gift_photo_id = Some(file_id.clone());
            Ok(())
        },
        next: |_| Transition::Complete,
    },
];

pub static ENGINE: FlowEngine<SantaDraft> = FlowEngine::new(&STEPS);

/// Persists the registration and returns the participant's gift number.
pub fn finalize(store: &dyn Store, user_id: i64, draft: &SantaDraft) -> AppResult<i32> {
    let number = store.assign_santa_number(user_id)?;
    store.update_santa_details(
        user_id,
        draft.name.as_deref().unwrap_or(""),
        draft.gift_photo_id.as_deref().unwrap_or(""),
    )?;
    tracing::info!(user_id, number, "gift draw registration saved");
    Ok(number)
}
