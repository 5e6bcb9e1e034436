//! Handlers for input methods that let the entry layer cancel Enter.
//!
//! Most disambiguation waits for the synthesized timeout, which reaches the
//! trigger hooks before any finish hook, so these handlers match on
//! `timeout` plus what the burst already holds.
//!
//! Order:
//! 1. `snapshot`
//! 2. `composition-updates` (also snapshots the surface at composition end)
//! 3. `enter`
//! 4. `composition-less-backspace`
//! 5. `composition-end-with-backspace`
//! 6. `default-composition-end`
//! 7. `insert-period-at-end-of-line`

use crate::common::{self, reconcile, revert_to_setup};
use crate::host::{Composition, ImeHandler, ImeMatch};
use core_events::NotificationKind;
use core_model::DocumentModel;
use core_surface::Surface;
use std::time::Duration;
use tracing::debug;

pub fn handlers<M, S>(settle_delay: Duration) -> Vec<ImeHandler<M, S>>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    vec![
        common::snapshot(),
        common::composition_updates(true),
        enter(),
        composition_less_backspace(),
        composition_end_with_backspace(),
        default_composition_end(),
        insert_period_at_end_of_line(settle_delay),
    ]
}

/// keydown Enter. The entry layer cancels the native Enter, so the surface is
/// untouched apart from composed text: reconcile it, then split.
fn enter<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("enter").on_trigger(|notification, ctx| {
        if !notification.is_enter() {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        ctx.host.track_anchor();
        reconcile(ctx, None, "enter")?;
        ctx.host.model.split_block_at_selection()?;
        Ok(ImeMatch::<M, S>::matched())
    })
}

/// A backspace outside any composition.
fn composition_less_backspace<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("composition-less-backspace").on_trigger(|notification, ctx| {
        if !notification.is_timeout() || ctx.host.is_composing() {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        if ctx.burst().find(|n| n.is_delete_backward()).is_none() {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        if let Some(selection) = revert_to_setup(ctx) {
            ctx.host.model.set_selection(selection)?;
        }
        ctx.host.model.delete_backward(1)?;
        Ok(ImeMatch::<M, S>::matched())
    })
}

/// A backspace right after a composition ended. The platform collapses the
/// selection before notifying, so the model selection comes from the snapshot
/// first, then the surface is reverted.
fn composition_end_with_backspace<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("composition-end-with-backspace").on_trigger(|notification, ctx| {
        if !notification.is_timeout() {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        let ended = ctx.burst().contains_kind(NotificationKind::CompositionEnd);
        let deleted = ctx.burst().find(|n| n.is_delete_backward()).is_some();
        if !(ended && deleted) {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        let setup_usable = ctx
            .scratch
            .snapshot
            .as_ref()
            .is_some_and(|s| s.fragment_count() > 0 && s.model_selection().is_some());
        let fallback = if setup_usable {
            None
        } else {
            ctx.host.composition_end.take()
        };
        let Some(snapshot) = fallback.as_ref().or(ctx.scratch.snapshot.as_ref()) else {
            debug!(target: "ime.handlers", "composition_end_snapshot_missing");
            return Ok(ImeMatch::<M, S>::unmatched());
        };
        snapshot.apply_to_model(&mut ctx.host.model)?;
        snapshot.apply_content(&mut ctx.host.surface);
        snapshot.apply_selection(&mut ctx.host.surface);
        ctx.host.model.delete_backward(1)?;
        Ok(ImeMatch::<M, S>::matched())
    })
}

fn default_composition_end<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("default-composition-end").on_trigger(|notification, ctx| {
        if !notification.is_timeout()
            || !ctx.burst().contains_kind(NotificationKind::CompositionEnd)
        {
            return Ok(ImeMatch::<M, S>::unmatched());
        }
        ctx.host.track_anchor();
        reconcile(ctx, None, "default-composition-end")?;
        ctx.host.composition = Composition::None;
        Ok(ImeMatch::<M, S>::matched())
    })
}

/// A period typed at the end of a line disappears if the surface is read too
/// early. Wait out two quiet periods of `settle_delay` before reconciling.
fn insert_period_at_end_of_line<M, S>(settle_delay: Duration) -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("insert-period-at-end-of-line").on_trigger(
        move |notification, ctx| {
            if !notification.is(NotificationKind::BeforeInput) || notification.data() != Some(".") {
                return Ok(ImeMatch::<M, S>::unmatched());
            }
            ctx.set_delay(settle_delay);
            Ok(ImeMatch::<M, S>::continue_with(|_, _| {
                Ok(ImeMatch::<M, S>::continue_with(|_, ctx| {
                    ctx.host.track_anchor();
                    reconcile(ctx, None, "insert-period-at-end-of-line")?;
                    Ok(ImeMatch::<M, S>::matched())
                }))
            }))
        },
    )
}
