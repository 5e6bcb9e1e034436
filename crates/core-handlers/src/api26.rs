//! Handlers for input methods that cannot cancel Enter or deletes.
//!
//! The platform has already mutated the surface by the time any notification
//! arrives, so most handlers either revert to the setup snapshot and replay
//! the action against the model, or pull the final surface text into the model.
//!
//! Order:
//! 1. `snapshot`
//! 2. `composition-updates`
//! 3. `enter-word-edge`
//! 4. `enter-middle-of-word`
//! 5. `composition-end-space`
//! 6. `edit-suggestion`
//! 7. `insert-suggestion-or-space-or-punctuation`
//! 8. `continuous-backspace`
//! 9. `default-composition-end`
//!
//! `edit-suggestion` must stay ahead of `continuous-backspace`: both see the
//! deletes an accepted suggestion produces, only the former also requires the
//! replacement text.

use crate::common::{self, reconcile, revert_and_split, revert_to_setup};
use crate::host::{Composition, ImeHandler, ImeMatch};
use core_events::{Burst, InputType, NotificationKind};
use core_model::DocumentModel;
use core_surface::Surface;
use tracing::debug;

pub fn handlers<M, S>() -> Vec<ImeHandler<M, S>>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    vec![
        common::snapshot(),
        common::composition_updates(false),
        enter_word_edge(),
        enter_middle_of_word(),
        composition_end_space(),
        edit_suggestion(),
        insert_suggestion_or_space_or_punctuation(),
        continuous_backspace(),
        default_composition_end(),
    ]
}

/// Finisher shared by both Enter signatures: whatever arrives next (or the
/// timeout), revert and split.
fn split_on_next<M, S>(from: &'static str) -> ImeMatch<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeMatch::<M, S>::continue_with(move |_, ctx| {
        revert_and_split(ctx, from)?;
        Ok(ImeMatch::<M, S>::matched())
    })
}

/// keydown Enter at a word edge.
fn enter_word_edge<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("enter-word-edge").on_trigger(|notification, _| {
        if !notification.is_enter() {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        Ok(split_on_next("enter-word-edge"))
    })
}

/// Enter inside a word arrives as a text input carrying the word prefix and a
/// line break (`"mid\n"`).
fn enter_middle_of_word<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("enter-middle-of-word").on_trigger(|notification, _| {
        if !notification.is(NotificationKind::TextInput) || !notification.data_has_newline() {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        Ok(split_on_next("enter-middle-of-word"))
    })
}

/// An explicit space after a composition. Needs the whole burst: the
/// composition end is what separates it from the implicit space between two
/// accepted suggestions.
fn composition_end_space<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("composition-end-space").on_finish(|ctx| {
        let ended = ctx.burst().contains_kind(NotificationKind::CompositionEnd);
        let space = ctx
            .burst()
            .find(|n| n.is(NotificationKind::TextInput) && n.data().is_some_and(|d| d.ends_with(' ')))
            .is_some();
        if !(ended && space) {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        ctx.host.track_anchor();
        let selection = revert_to_setup(ctx);
        reconcile(ctx, selection, "composition-end-space")?;
        ctx.host.model.insert_text(" ")?;
        Ok(ImeMatch::<M, S>::matched())
    })
}

/// Accepting a suggestion: deletes followed by the replacement text. The
/// deletes are absorbed into the text diff.
fn edit_suggestion<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("edit-suggestion").on_finish(|ctx| {
        let deleted = ctx.burst().find(|n| n.is_delete_backward()).is_some();
        let replaced = ctx.burst().contains_kind(NotificationKind::TextInput);
        if !(deleted && replaced) {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        ctx.host.track_anchor();
        reconcile(ctx, None, "edit-suggestion")?;
        Ok(ImeMatch::<M, S>::matched())
    })
}

/// Text input during a composition (suggestion, space, punctuation): reconcile
/// once the platform's own input notification has landed.
fn insert_suggestion_or_space_or_punctuation<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("insert-suggestion-or-space-or-punctuation").on_trigger(
        |notification, ctx| {
            if !notification.is(NotificationKind::TextInput) || !ctx.host.is_composing() {
                return Ok(ImeMatch::<M, S>::unmatched());
            }
            ctx.host.track_anchor();
            Ok(ImeMatch::<M, S>::continue_with(|_, ctx| {
                reconcile(ctx, None, "insert-suggestion-or-space-or-punctuation")?;
                Ok(ImeMatch::<M, S>::matched())
            }))
        },
    )
}

/// Held or repeated backspace. Deletes that start at a word end arrive as
/// composition updates carrying the shortened word, so those count too.
fn continuous_backspace<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("continuous-backspace").on_finish(|ctx| {
        let deletes = ctx.burst().count_where(|n| n.is_delete_backward());
        if deletes == 0 {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        if let Some(selection) = revert_to_setup(ctx) {
            ctx.host.model.set_selection(selection)?;
        }
        let shortened = shortened_compositions(ctx.burst(), word_before_caret(&ctx.host.model));
        let count = deletes + shortened;
        debug!(target: "ime.handlers", deletes, shortened, "continuous_backspace");
        ctx.host.model.delete_backward(count)?;
        Ok(ImeMatch::<M, S>::matched())
    })
}

/// Composition updates that each drop the tail of the word shown before them,
/// starting from `word`. Other updates (suggestions, retyping) are not deletes.
fn shortened_compositions(burst: &Burst, word: String) -> usize {
    let mut previous = word;
    let mut count = 0;
    for data in burst
        .iter()
        .filter(|n| n.is_input_of(&InputType::InsertCompositionText))
        .filter_map(|n| n.data())
    {
        if data.len() < previous.len() && previous.starts_with(data) {
            count += 1;
        }
        previous = data.to_string();
    }
    count
}

/// Word ending at the model caret.
fn word_before_caret<M: DocumentModel + ?Sized>(model: &M) -> String {
    let Some(caret) = model.selection().map(|s| s.focus) else {
        return String::new();
    };
    let before: Vec<char> = model
        .leaves(caret.key)
        .unwrap_or_default()
        .iter()
        .flat_map(|l| l.text.chars())
        .take(caret.offset)
        .collect();
    let start = before
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(0, |i| i + 1);
    before[start..].iter().collect()
}

fn default_composition_end<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("default-composition-end").on_finish(|ctx| {
        if !ctx.burst().contains_kind(NotificationKind::CompositionEnd) {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        ctx.host.composition = Composition::None;
        ctx.host.track_anchor();
        reconcile(ctx, None, "default-composition-end")?;
        Ok(ImeMatch::<M, S>::matched())
    })
}
