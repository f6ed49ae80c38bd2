//! Profile-builder flow: age, gender, interest, city (typed, coordinates
//! or shared location), display name, bio, up to three media attachments,
//! then a summary step with per-field edit re-entry.

use chrono::Utc;

use parlor_shared::errors::AppResult;
use parlor_shared::types::chat::{InlineButton, Keyboard, OutboundMessage};

use crate::flows::engine::{FlowEngine, FlowEvent, Step, Transition};
use crate::matching::locality::normalize_city;
use crate::models::{Gender, Interest, MediaKind, ProfileRecord};
use crate::store::Store;

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 120;
pub const MAX_MEDIA: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub interest: Option<Interest>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub media: Vec<(String, MediaKind)>,
    /// City carried over from the user's previous profile, offered as a
    /// one-tap shortcut on the city step.
    pub last_city: Option<String>,
    media_done: bool,
    pending_edit: Option<&'static str>,
}

impl ProfileDraft {
    /// Fresh draft carrying the previous profile's city so the city step
    /// can offer it as a one-tap shortcut.
    pub fn with_last_city(last_city: Option<String>) -> Self {
        Self {
            last_city,
            ..Self::default()
        }
    }
}

fn choice_keyboard(options: &[(&str, &str)]) -> Keyboard {
    Keyboard::Inline {
        rows: vec![options
            .iter()
            .map(|(label, action)| InlineButton::new(*label, *action))
            .collect()],
    }
}

fn summary_text(draft: &ProfileDraft) -> String {
    format!(
        "{}, {} — {}\n{}\n{} attachment(s)",
        draft.name.as_deref().unwrap_or("?"),
        draft.age.unwrap_or(0),
        draft.city.as_deref().unwrap_or("?"),
        draft.bio.as_deref().unwrap_or(""),
        draft.media.len(),
    )
}

static STEPS: [Step<ProfileDraft>; 8] = [
    Step {
        name: "age",
        prompt: |_| OutboundMessage::text("How old are you?"),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send your age as a number".to_string());
            };
            let age: i32 = text
                .trim()
                .parse()
                .map_err(|_| "send your age as a number".to_string())?;
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
            OutboundMessage::text("Your gender?").with_keyboard(choice_keyboard(&[
                ("Male", "flow:Male"),
                ("Female", "flow:Female"),
            ]))
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
        name: "interest",
        prompt: |_| {
            OutboundMessage::text("Who are you looking for?").with_keyboard(choice_keyboard(&[
                ("Men", "flow:Male"),
                ("Women", "flow:Female"),
                ("Anyone", "flow:Any"),
            ]))
        },
        apply: |draft, event| {
            let FlowEvent::Choice(choice) = event else {
                return Err("use the buttons".to_string());
            };
            draft.interest = Some(Interest::parse(choice).ok_or("use the buttons")?);
            Ok(())
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "city",
        prompt: |draft| {
            let msg =
                OutboundMessage::text("Which city are you in? Type it or share a location.");
            match draft.last_city.as_deref() {
                Some(city) => {
                    let label = format!("Keep {city}");
                    msg.with_keyboard(choice_keyboard(&[(label.as_str(), "flow:keep_city")]))
                }
                None => msg,
            }
        },
        apply: |draft, event| match event {
            FlowEvent::Choice(choice) if choice == "keep_city" => {
                let city = draft
                    .last_city
                    .clone()
                    .ok_or("send a city name or a location")?;
                draft.city = Some(city);
                draft.lat = None;
                draft.lon = None;
                Ok(())
            }
            FlowEvent::Text(text) => {
                let city = text.trim();
                if city.is_empty() || city.chars().count() > 64 {
                    return Err("send a city name up to 64 characters".to_string());
                }
                draft.city = Some(city.to_string());
                draft.lat = None;
                draft.lon = None;
                Ok(())
            }
            FlowEvent::Place { label, lat, lon } => {
                draft.city = Some(label.clone());
                draft.lat = *lat;
                draft.lon = *lon;
                Ok(())
            }
            _ => Err("send a city name or a location".to_string()),
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "name",
        prompt: |_| OutboundMessage::text("What name should we show on your profile?"),
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
        name: "bio",
        prompt: |_| {
            OutboundMessage::text("A few words about yourself?")
                .with_keyboard(choice_keyboard(&[("Skip", "flow:skip")]))
        },
        apply: |draft, event| match event {
            FlowEvent::Choice(choice) if choice == "skip" => {
                draft.bio = Some(String::new());
                Ok(())
            }
            FlowEvent::Text(text) => {
                if text.chars().count() > 300 {
                    return Err("keep it under 300 characters".to_string());
                }
                draft.bio = Some(text.trim().to_string());
                Ok(())
            }
            _ => Err("send a short text or skip".to_string()),
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "media",
        prompt: |draft| {
            let text = format!(
                "Send a photo or a short video ({}/{MAX_MEDIA}).",
                draft.media.len()
            );
            if draft.media.is_empty() {
                OutboundMessage::text(text)
            } else {
                OutboundMessage::text(text)
                    .with_keyboard(choice_keyboard(&[("That's enough", "flow:done")]))
            }
        },
        apply: |draft, event| match event {
            FlowEvent::Photo(file_id) => {
                if draft.media.len() >= MAX_MEDIA {
                    return Err(format!("{MAX_MEDIA} attachments is the limit"));
                }
                draft.media.push((file_id.clone(), MediaKind::Photo));
                Ok(())
            }
            FlowEvent::Video(file_id) => {
                if draft.media.len() >= MAX_MEDIA {
                    return Err(format!("{MAX_MEDIA} attachments is the limit"));
                }
                draft.media.push((file_id.clone(), MediaKind::Video));
                Ok(())
            }
            FlowEvent::Choice(choice) if choice == "done" => {
                if draft.media.is_empty() {
                    return Err("send at least one photo or video".to_string());
                }
                draft.media_done = true;
                Ok(())
            }
            _ => Err("send a photo or a video".to_string()),
        },
        next: |draft| {
            if draft.media_done || draft.media.len() >= MAX_MEDIA {
                Transition::Advance
            } else {
                Transition::Jump("media")
            }
        },
    },
    Step {
        name: "confirm",
        prompt: |draft| {
            OutboundMessage::text(summary_text(draft)).with_keyboard(Keyboard::Inline {
                rows: vec![
                    vec![InlineButton::new("Save", "flow:save")],
                    vec![
                        InlineButton::new("Age", "flow:edit:age"),
                        InlineButton::new("City", "flow:edit:city"),
                        InlineButton::new("Name", "flow:edit:name"),
                    ],
                    vec![
                        InlineButton::new("Bio", "flow:edit:bio"),
                        InlineButton::new("Media", "flow:edit:media"),
                        InlineButton::new("Cancel", "cancel"),
                    ],
                ],
            })
        },
        apply: |draft, event| {
            let FlowEvent::Choice(choice) = event else {
                return Err("use the buttons".to_string());
            };
            match choice.as_str() {
                "save" => {
                    draft.pending_edit = None;
                    Ok(())
                }
                "edit:age" => set_edit(draft, "age"),
                "edit:city" => set_edit(draft, "city"),
                "edit:name" => set_edit(draft, "name"),
                "edit:bio" => set_edit(draft, "bio"),
                "edit:media" => {
                    draft.media.clear();
                    draft.media_done = false;
                    set_edit(draft, "media")
                }
                _ => Err("use the buttons".to_string()),
            }
        },
        next: |draft| match draft.pending_edit {
            Some(step) => Transition::Edit {
                step,
                return_to: "confirm",
            },
            None => Transition::Complete,
        },
    },
];

fn set_edit(draft: &mut ProfileDraft, step: &'static str) -> Result<(), String> {
    draft.pending_edit = Some(step);
    Ok(())
}

pub static ENGINE: FlowEngine<ProfileDraft> = FlowEngine::new(&STEPS);

/// Writes the finished draft as the user's profile. The normalized city
/// key is always recomputed here, so an edited city can never leave a
/// stale locality bucket behind.
pub fn finalize(store: &dyn Store, user_id: i64, draft: &ProfileDraft) -> AppResult<()> {
    let city = draft.city.clone().unwrap_or_default();
    let record = ProfileRecord {
        user_id,
        age: draft.age.unwrap_or(0),
        gender: draft.gender.map(|g| g.as_str()).unwrap_or("").to_string(),
        interest: draft.interest.map(|i| i.as_str()).unwrap_or("").to_string(),
        normalized_city: normalize_city(&city),
        city,
        lat: draft.lat,
        lon: draft.lon,
        name: draft.name.clone().unwrap_or_default(),
        bio: draft.bio.clone().unwrap_or_default(),
        active: true,
        updated_at: Utc::now(),
    };
    store.upsert_profile(&record)?;
    store.replace_profile_media(user_id, &draft.media)?;
    if let Some(gender) = draft.gender {
        store.set_user_gender(user_id, gender)?;
    }
    tracing::info!(user_id, "profile saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::engine::{Advance, FlowState};
    use crate::store::memory::MemoryStore;

    fn drive(state: &mut FlowState<ProfileDraft>, event: FlowEvent) -> Advance {
        ENGINE.handle(state, &event).unwrap()
    }

    fn filled_state() -> FlowState<ProfileDraft> {
        let (mut state, _) = ENGINE.start(ProfileDraft::default());
        drive(&mut state, FlowEvent::Text("30".into()));
        drive(&mut state, FlowEvent::Choice("Male".into()));
        drive(&mut state, FlowEvent::Choice("Female".into()));
        drive(&mut state, FlowEvent::Text("Москва".into()));
        drive(&mut state, FlowEvent::Text("Ivan".into()));
        drive(&mut state, FlowEvent::Choice("skip".into()));
        drive(&mut state, FlowEvent::Photo("file1".into()));
        drive(&mut state, FlowEvent::Choice("done".into()));
        assert_eq!(state.current_step(&ENGINE), "confirm");
        state
    }

    #[test]
    fn invalid_age_commits_nothing_and_stays_on_the_age_step() {
        let store = MemoryStore::new(0);
        let (mut state, _) = ENGINE.start(ProfileDraft::default());

        let outcome = drive(&mut state, FlowEvent::Text("abc".into()));
        assert!(matches!(outcome, Advance::Rejected { .. }));
        assert_eq!(state.current_step(&ENGINE), "age");
        assert!(state.draft.age.is_none());
        assert!(store.get_profile(1).unwrap().is_none());
    }

    #[test]
    fn out_of_range_age_is_rejected() {
        let (mut state, _) = ENGINE.start(ProfileDraft::default());
        assert!(matches!(
            drive(&mut state, FlowEvent::Text("17".into())),
            Advance::Rejected { .. }
        ));
        assert!(matches!(
            drive(&mut state, FlowEvent::Text("121".into())),
            Advance::Rejected { .. }
        ));
        assert!(matches!(
            drive(&mut state, FlowEvent::Text("18".into())),
            Advance::Prompt(_)
        ));
    }

    #[test]
    fn full_run_persists_a_profile_with_a_normalized_city() {
        let store = MemoryStore::new(0);
        let mut state = filled_state();
        let outcome = drive(&mut state, FlowEvent::Choice("save".into()));
        assert!(matches!(outcome, Advance::Complete));

        finalize(&store, 1, &state.draft).unwrap();
        let profile = store.get_profile(1).unwrap().unwrap();
        assert_eq!(profile.city, "Москва");
        assert_eq!(profile.normalized_city, "moskva");
        assert!(profile.active);
        assert_eq!(store.list_profile_media(1).unwrap().len(), 1);
    }

    #[test]
    fn editing_the_city_returns_to_the_summary_and_renormalizes() {
        let store = MemoryStore::new(0);
        let mut state = filled_state();

        drive(&mut state, FlowEvent::Choice("edit:city".into()));
        assert_eq!(state.current_step(&ENGINE), "city");
        let outcome = drive(&mut state, FlowEvent::Text("Kazan".into()));
        assert!(matches!(outcome, Advance::Prompt(_)));
        assert_eq!(state.current_step(&ENGINE), "confirm");

        let outcome = drive(&mut state, FlowEvent::Choice("save".into()));
        assert!(matches!(outcome, Advance::Complete));
        finalize(&store, 1, &state.draft).unwrap();
        assert_eq!(store.get_profile(1).unwrap().unwrap().normalized_city, "kazan");
    }

    #[test]
    fn keep_city_shortcut_reuses_the_previous_city() {
        let (mut state, _) = ENGINE.start(ProfileDraft::with_last_city(Some("Kazan".into())));
        drive(&mut state, FlowEvent::Text("30".into()));
        drive(&mut state, FlowEvent::Choice("Male".into()));
        drive(&mut state, FlowEvent::Choice("Female".into()));

        let outcome = drive(&mut state, FlowEvent::Choice("keep_city".into()));
        assert!(matches!(outcome, Advance::Prompt(_)));
        assert_eq!(state.draft.city.as_deref(), Some("Kazan"));
        assert_eq!(state.current_step(&ENGINE), "name");
    }

    #[test]
    fn keep_city_is_rejected_without_a_previous_city() {
        let (mut state, _) = ENGINE.start(ProfileDraft::default());
        drive(&mut state, FlowEvent::Text("30".into()));
        drive(&mut state, FlowEvent::Choice("Male".into()));
        drive(&mut state, FlowEvent::Choice("Female".into()));

        let outcome = drive(&mut state, FlowEvent::Choice("keep_city".into()));
        assert!(matches!(outcome, Advance::Rejected { .. }));
        assert_eq!(state.current_step(&ENGINE), "city");
    }

    #[test]
    fn shared_location_keeps_coordinates() {
        let (mut state, _) = ENGINE.start(ProfileDraft::default());
        drive(&mut state, FlowEvent::Text("30".into()));
        drive(&mut state, FlowEvent::Choice("Male".into()));
        drive(&mut state, FlowEvent::Choice("Any".into()));
        drive(
            &mut state,
            FlowEvent::Place {
                label: "Kazan".into(),
                lat: Some(55.79),
                lon: Some(49.12),
            },
        );
        assert_eq!(state.draft.city.as_deref(), Some("Kazan"));
        assert_eq!(state.draft.lat, Some(55.79));
    }

    #[test]
    fn media_caps_at_three_and_advances_automatically() {
        let (mut state, _) = ENGINE.start(ProfileDraft::default());
        drive(&mut state, FlowEvent::Text("30".into()));
        drive(&mut state, FlowEvent::Choice("Male".into()));
        drive(&mut state, FlowEvent::Choice("Female".into()));
        drive(&mut state, FlowEvent::Text("Kazan".into()));
        drive(&mut state, FlowEvent::Text("Ivan".into()));
        drive(&mut state, FlowEvent::Choice("skip".into()));

        drive(&mut state, FlowEvent::Photo("a".into()));
        drive(&mut state, FlowEvent::Video("b".into()));
        assert_eq!(state.current_step(&ENGINE), "media");
        drive(&mut state, FlowEvent::Photo("c".into()));
        assert_eq!(state.current_step(&ENGINE), "confirm");
        assert_eq!(state.draft.media.len(), 3);
    }

    #[test]
    fn edit_media_re_collects_the_full_attachment_loop() {
        let mut state = filled_state();

        drive(&mut state, FlowEvent::Choice("edit:media".into()));
        assert_eq!(state.current_step(&ENGINE), "media");
        assert!(state.draft.media.is_empty());

        // Re-adding stays on the media step until the user is done.
        drive(&mut state, FlowEvent::Photo("a".into()));
        assert_eq!(state.current_step(&ENGINE), "media");
        drive(&mut state, FlowEvent::Video("b".into()));
        assert_eq!(state.current_step(&ENGINE), "media");

        let outcome = drive(&mut state, FlowEvent::Choice("done".into()));
        assert!(matches!(outcome, Advance::Prompt(_)));
        assert_eq!(state.current_step(&ENGINE), "confirm");
        assert_eq!(state.draft.media.len(), 2);
    }

    #[test]
    fn edit_media_returns_to_the_summary_when_full() {
        let mut state = filled_state();

        drive(&mut state, FlowEvent::Choice("edit:media".into()));
        drive(&mut state, FlowEvent::Photo("a".into()));
        drive(&mut state, FlowEvent::Photo("b".into()));
        drive(&mut state, FlowEvent::Photo("c".into()));
        assert_eq!(state.current_step(&ENGINE), "confirm");
        assert_eq!(state.draft.media.len(), 3);
    }

    #[test]
    fn finishing_media_requires_at_least_one_attachment() {
        let (mut state, _) = ENGINE.start(ProfileDraft::default());
        drive(&mut state, FlowEvent::Text("30".into()));
        drive(&mut state, FlowEvent::Choice("Male".into()));
        drive(&mut state, FlowEvent::Choice("Female".into()));
        drive(&mut state, FlowEvent::Text("Kazan".into()));
        drive(&mut state, FlowEvent::Text("Ivan".into()));
        drive(&mut state, FlowEvent::Choice("skip".into()));

        let outcome = drive(&mut state, FlowEvent::Choice("done".into()));
        assert!(matches!(outcome, Advance::Rejected { .. }));
        assert_eq!(state.current_step(&ENGINE), "media");
    }
}
