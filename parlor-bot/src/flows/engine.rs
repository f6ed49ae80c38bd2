//! Generic multi-step data-collection state machine. A flow is a static
//! list of [`Step`]s over a draft type; the engine owns the cursor, the
//! validate-then-commit contract and edit re-entry. Persistence of a
//! finished draft is the instantiating module's job.

use parlor_shared::errors::{AppError, AppResult};
use parlor_shared::types::chat::OutboundMessage;

/// One inbound user action, already stripped of transport details.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    Text(String),
    Photo(String),
    Video(String),
    /// A resolved location: human label plus the raw coordinates when the
    /// lookup produced them.
    Place {
        label: String,
        lat: Option<f64>,
        lon: Option<f64>,
    },
    /// An inline-button payload scoped to the active flow.
    Choice(String),
}

/// Where to go after a step accepted its input.
pub enum Transition {
    /// The next step in declared order; past the last step this completes
    /// the flow.
    Advance,
    Jump(&'static str),
    /// Enter a single step in edit mode; on acceptance the cursor returns
    /// to `return_to` instead of following that step's own transition.
    Edit {
        step: &'static str,
        return_to: &'static str,
    },
    Complete,
}

pub struct Step<D: 'static> {
    pub name: &'static str,
    pub prompt: fn(&D) -> OutboundMessage,
    /// Validator and setter in one: mutate the draft only on acceptance,
    /// return the re-prompt hint on rejection. The engine restores the
    /// draft on rejection regardless.
    pub apply: fn(&mut D, &FlowEvent) -> Result<(), String>,
    pub next: fn(&D) -> Transition,
}

/// Per-user working state of one active flow.
#[derive(Debug, Clone)]
pub struct FlowState<D> {
    pub draft: D,
    cursor: usize,
    edit_return: Option<&'static str>,
}

impl<D> FlowState<D> {
    pub fn current_step(&self, engine: &FlowEngine<D>) -> &'static str
    where
        D: Clone,
    {
        engine.steps[self.cursor].name
    }
}

pub enum Advance {
    /// Input rejected; cursor and draft are untouched.
    Rejected { hint: String, prompt: OutboundMessage },
    /// Moved to another step; emit its prompt.
    Prompt(OutboundMessage),
    /// Terminal step accepted; caller persists the draft and clears the
    /// registry entry.
    Complete,
}

pub struct FlowEngine<D: Clone + 'static> {
    steps: &'static [Step<D>],
}

impl<D: Clone> FlowEngine<D> {
    pub const fn new(steps: &'static [Step<D>]) -> Self {
        Self { steps }
    }

    fn index_of(&self, name: &str) -> AppResult<usize> {
        self.steps
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| AppError::internal(format!("unknown flow step: {name}")))
    }

    /// Fresh flow at the first step.
    pub fn start(&self, draft: D) -> (FlowState<D>, OutboundMessage) {
        let state = FlowState {
            draft,
            cursor: 0,
            edit_return: None,
        };
        let prompt = (self.steps[0].prompt)(&state.draft);
        (state, prompt)
    }

    /// Fresh flow entered at a named step, following that step's own
    /// transitions from there on.
    pub fn start_at(&self, draft: D, step: &str) -> AppResult<(FlowState<D>, OutboundMessage)> {
        let cursor = self.index_of(step)?;
        let state = FlowState {
            draft,
            cursor,
            edit_return: None,
        };
        let prompt = (self.steps[cursor].prompt)(&state.draft);
        Ok((state, prompt))
    }

    /// Enter at a single step in edit mode; completing it returns to
    /// `return_to` (normally a summary step) instead of advancing.
    pub fn start_edit(
        &self,
        draft: D,
        step: &str,
        return_to: &'static str,
    ) -> AppResult<(FlowState<D>, OutboundMessage)> {
        let cursor = self.index_of(step)?;
        self.index_of(return_to)?;
        let state = FlowState {
            draft,
            cursor,
            edit_return: Some(return_to),
        };
        let prompt = (self.steps[cursor].prompt)(&state.draft);
        Ok((state, prompt))
    }

    pub fn prompt(&self, state: &FlowState<D>) -> OutboundMessage {
        (self.steps[state.cursor].prompt)(&state.draft)
    }

    pub fn handle(&self, state: &mut FlowState<D>, event: &FlowEvent) -> AppResult<Advance> {
        let step = &self.steps[state.cursor];
        let before = state.draft.clone();
        if let Err(hint) = (step.apply)(&mut state.draft, event) {
            // No partial field is ever committed on a failed validation.
            state.draft = before;
            return Ok(Advance::Rejected {
                hint,
                prompt: (step.prompt)(&state.draft),
            });
        }

        let next = (step.next)(&state.draft);
        // A jump keeps a pending edit-return alive: a self-looping step
        // (media collection) finishes on its own terms before the cursor
        // goes back to the summary.
        if !matches!(next, Transition::Jump(_)) {
            if let Some(return_to) = state.edit_return.take() {
                state.cursor = self.index_of(return_to)?;
                return Ok(Advance::Prompt(self.prompt(state)));
            }
        }

        match next {
            Transition::Advance => {
                if state.cursor + 1 >= self.steps.len() {
                    return Ok(Advance::Complete);
                }
                state.cursor += 1;
                Ok(Advance::Prompt(self.prompt(state)))
            }
            Transition::Jump(name) => {
                state.cursor = self.index_of(name)?;
                Ok(Advance::Prompt(self.prompt(state)))
            }
            Transition::Edit { step, return_to } => {
                state.cursor = self.index_of(step)?;
                state.edit_return = Some(return_to);
                Ok(Advance::Prompt(self.prompt(state)))
            }
            Transition::Complete => Ok(Advance::Complete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Draft {
        name: Option<String>,
        age: Option<u32>,
        edit: Option<&'static str>,
    }

    static STEPS: [Step<Draft>; 3] = [
        Step {
            name: "name",
            prompt: |_| OutboundMessage::text("name?"),
            apply: |draft, event| match event {
                FlowEvent::Text(t) if !t.trim().is_empty() => {
                    draft.name = Some(t.trim().to_string());
                    Ok(())
                }
                _ => Err("send a name".to_string()),
            },
            next: |_| Transition::Advance,
        },
        Step {
            name: "age",
            prompt: |_| OutboundMessage::text("age?"),
            apply: |draft, event| match event {
                FlowEvent::Text(t) => {
                    let age: u32 = t.trim().parse().map_err(|_| "numbers only".to_string())?;
                    draft.age = Some(age);
                    Ok(())
                }
                _ => Err("numbers only".to_string()),
            },
            next: |_| Transition::Advance,
        },
        Step {
            name: "confirm",
            prompt: |_| OutboundMessage::text("confirm?"),
            apply: |draft, event| match event {
                FlowEvent::Choice(c) if c == "save" => Ok(()),
                FlowEvent::Choice(c) if c == "edit:age" => {
                    draft.edit = Some("age");
                    Ok(())
                }
                _ => Err("pick a button".to_string()),
            },
            next: |draft| match draft.edit {
                Some(step) => Transition::Edit {
                    step,
                    return_to: "confirm",
                },
                None => Transition::Complete,
            },
        },
    ];

    static ENGINE: FlowEngine<Draft> = FlowEngine::new(&STEPS);

    #[test]
    fn rejection_leaves_cursor_and_draft_untouched() {
        let (mut state, _) = ENGINE.start(Draft::default());
        ENGINE
            .handle(&mut state, &FlowEvent::Text("ann".into()))
            .unwrap();

        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Text("abc".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Rejected { .. }));
        assert_eq!(state.current_step(&ENGINE), "age");
        assert_eq!(state.draft.age, None);
        assert_eq!(state.draft.name.as_deref(), Some("ann"));
    }

    #[test]
    fn linear_run_reaches_completion() {
        let (mut state, _) = ENGINE.start(Draft::default());
        ENGINE
            .handle(&mut state, &FlowEvent::Text("ann".into()))
            .unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("30".into()))
            .unwrap();
        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Choice("save".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Complete));
        assert_eq!(state.draft.age, Some(30));
    }

    #[test]
    fn edit_returns_to_the_summary_step() {
        let (mut state, _) = ENGINE.start(Draft::default());
        ENGINE
            .handle(&mut state, &FlowEvent::Text("ann".into()))
            .unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("30".into()))
            .unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Choice("edit:age".into()))
            .unwrap();
        assert_eq!(state.current_step(&ENGINE), "age");

        // Completing the edited step jumps back to confirm, not onward.
        state.draft.edit = None;
        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Text("31".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Prompt(_)));
        assert_eq!(state.current_step(&ENGINE), "confirm");
        assert_eq!(state.draft.age, Some(31));
    }

    #[test]
    fn rejection_inside_edit_mode_keeps_the_edit_pending() {
        let draft = Draft {
            name: Some("ann".into()),
            age: Some(30),
            edit: None,
        };
        let (mut state, _) = ENGINE.start_edit(draft, "age", "confirm").unwrap();
        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Text("abc".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Rejected { .. }));
        assert_eq!(state.current_step(&ENGINE), "age");

        ENGINE
            .handle(&mut state, &FlowEvent::Text("31".into()))
            .unwrap();
        assert_eq!(state.current_step(&ENGINE), "confirm");
    }
}
