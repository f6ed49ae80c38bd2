//! Contest-submission flow: full name, age, gender, optional Instagram
//! handle, photo. Entries land unapproved and wait for moderation.

use parlor_shared::errors::AppResult;
use parlor_shared::types::chat::{InlineButton, Keyboard, OutboundMessage};

use crate::flows::engine::{FlowEngine, FlowEvent, Step, Transition};
use crate::models::{Gender, NewCandidate, UserStat};
use crate::store::Store;

pub const MIN_AGE: i32 = 5;
pub const MAX_AGE: i32 = 120;

#[derive(Debug, Clone, Default)]
pub struct ContestDraft {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub instagram: Option<String>,
    pub photo_file_id: Option<String>,
}

static STEPS: [Step<ContestDraft>; 5] = [
    Step {
        name: "name",
        prompt: |_| OutboundMessage::text("First and last name of the contestant?"),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send the name as text".to_string());
            };
            let name = text.trim();
            if name.split_whitespace().count() < 2 {
                return Err("send both first and last name".to_string());
            }
            if name.chars().count() > 80 {
                return Err("keep the name under 80 characters".to_string());
            }
            draft.name = Some(name.to_string());
            Ok(())
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "age",
        prompt: |_| OutboundMessage::text("Age?"),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send the age as a number".to_string());
            };
            let age: i32 = text
                .trim()
                .parse()
                .map_err(|_| "send the age as a number".to_string())?;
            if !(MIN_AGE..=MAX_AGE).contains(&age) {
                return Err(format!("age must be between {MIN_AGE} and {MAX_AGE}"));
            }
            draft.age = Some(age);
            Ok(())
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "gender",
        prompt: |_| {
            OutboundMessage::text("Gender?").with_keyboard(Keyboard::Inline {
                rows: vec![vec![
                    InlineButton::new("Male", "flow:Male"),
                    InlineButton::new("Female", "flow:Female"),
                ]],
            })
        },
        apply: |draft, event| {
            let FlowEvent::Choice(choice) = event else {
                return Err("use the buttons".to_string());
            };
            draft.gender = Some(Gender::parse(choice).ok_or("use the buttons")?);
            Ok(())
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "instagram",
        prompt: |_| {
            OutboundMessage::text("Instagram handle? (optional)").with_keyboard(Keyboard::Inline {
                rows: vec![vec![InlineButton::new("Skip", "flow:skip")]],
            })
        },
        apply: |draft, event| match event {
            FlowEvent::Choice(choice) if choice == "skip" => {
                draft.instagram = None;
                Ok(())
            }
            FlowEvent::Text(text) => {
                let handle = text.trim().trim_start_matches('@');
                if handle.is_empty() || handle.chars().count() > 32 {
                    return Err("send a handle up to 32 characters or skip".to_string());
                }
                draft.instagram = Some(handle.to_string());
                Ok(())
            }
            _ => Err("send a handle or skip".to_string()),
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "photo",
        prompt: |_| OutboundMessage::text("Send one photo of the contestant."),
        apply: |draft, event| {
            let FlowEvent::Photo(file_id) = event else {
                return Err("a photo is required".to_string());
            };
            draft.photo_file_id = Some(file_id.clone());
            Ok(())
        },
        next: |_| Transition::Complete,
    },
];

pub static ENGINE: FlowEngine<ContestDraft> = FlowEngine::new(&STEPS);

/// Persists the entry. A re-submission replaces the previous entry and
/// drops it back to unapproved; the stats counter only moves for a brand
/// new entry.
pub fn finalize(store: &dyn Store, user_id: i64, draft: &ContestDraft) -> AppResult<bool> {
    let created = store.upsert_candidate(&NewCandidate {
        user_id,
        name: draft.name.clone().unwrap_or_default(),
        age: draft.age.unwrap_or(0),
        gender: draft.gender.map(|g| g.as_str()).unwrap_or("").to_string(),
        instagram: draft.instagram.clone(),
        photo_file_id: draft.photo_file_id.clone().unwrap_or_default(),
        approved: false,
    })?;
    if created {
        store.increment_stat(user_id, UserStat::CandidatesSubmitted, 1)?;
    }
    tracing::info!(user_id, created, "contest entry submitted");
    Ok(created)
}
