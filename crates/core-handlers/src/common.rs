//! Handlers and resolution steps shared by both quirk profiles.

use crate::host::{ImeContext, ImeHandler, ImeMatch};
use core_events::NotificationKind;
use core_model::{DocumentModel, Range};
use core_reconcile::Reconciled;
use core_session::{Handler, MatchResult};
use core_surface::{SnapshotOptions, Surface};
use tracing::{debug, trace};

/// Logs every burst phase under `ime.handlers`; never claims a burst.
pub fn burst_logger<H: 'static, S: 'static>() -> Handler<H, S> {
    Handler::<H, S>::new("logger")
        .on_setup(|_| {
            debug!(target: "ime.handlers", "burst_setup");
            Ok(())
        })
        .on_trigger(|notification, ctx| {
            trace!(
                target: "ime.handlers",
                notification = %notification,
                burst_len = ctx.notification_count(),
                "burst_notification"
            );
            Ok(MatchResult::unmatched())
        })
        .on_finish(|ctx| {
            debug!(target: "ime.handlers", kinds = ?ctx.burst().kinds(), "burst_finish");
            Ok(MatchResult::unmatched())
        })
        .on_teardown(|ctx| {
            debug!(target: "ime.handlers", burst_len = ctx.notification_count(), "burst_teardown");
            Ok(())
        })
}

/// Capture the surface (caret block and the block before it) before any hook
/// sees the first notification of a burst.
pub(crate) fn snapshot<M, S>() -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("snapshot").on_setup(|ctx| {
        let snapshot = ctx.host.snapshot(SnapshotOptions {
            include_previous: true,
        });
        ctx.scratch.snapshot = Some(snapshot);
        Ok(())
    })
}

/// Track composition status and the nodes a composition touches. With
/// `capture_end`, a composition end also snapshots the surface and clears the
/// status; otherwise the status is cleared by whichever handler resolves it.
pub(crate) fn composition_updates<M, S>(capture_end: bool) -> ImeHandler<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    ImeHandler::<M, S>::new("composition-updates").on_trigger(move |notification, ctx| {
        match notification.kind {
            NotificationKind::CompositionStart => ctx.host.start_composition(),
            NotificationKind::CompositionUpdate => {
                ctx.host.track_anchor();
            }
            NotificationKind::Input if ctx.host.is_composing() => {
                ctx.host.track_anchor();
            }
            NotificationKind::CompositionEnd if capture_end => ctx.host.end_composition(),
            _ => {}
        }
        Ok(ImeMatch::<M, S>::unmatched())
    })
}

/// Revert the surface to the burst's setup snapshot. Returns the captured
/// selection in model coordinates.
pub(crate) fn revert_to_setup<M, S>(ctx: &mut ImeContext<'_, M, S>) -> Option<Range>
where
    M: DocumentModel,
    S: Surface,
{
    match ctx.scratch.snapshot.as_ref() {
        Some(snapshot) => ctx.host.revert(snapshot),
        None => {
            debug!(target: "ime.handlers", "setup_snapshot_missing");
            None
        }
    }
}

/// Reconcile the pending nodes on behalf of handler `from`.
pub(crate) fn reconcile<M, S>(
    ctx: &mut ImeContext<'_, M, S>,
    selection: Option<Range>,
    from: &'static str,
) -> anyhow::Result<()>
where
    M: DocumentModel,
    S: Surface,
{
    let outcomes = ctx.host.reconcile_pending(selection)?;
    debug!(
        target: "ime.handlers",
        handler = from,
        nodes = outcomes.len(),
        edits = outcomes.iter().filter(|o| o.is_structural()).count(),
        unmapped = outcomes.iter().filter(|o| **o == Reconciled::Unmapped).count(),
        "pending_reconciled"
    );
    Ok(())
}

/// Undo the platform's Enter: revert, pull composed text into the model at the
/// pre-Enter selection, then split the block there.
pub(crate) fn revert_and_split<M, S>(
    ctx: &mut ImeContext<'_, M, S>,
    from: &'static str,
) -> anyhow::Result<()>
where
    M: DocumentModel,
    S: Surface,
{
    let selection = revert_to_setup(ctx);
    reconcile(ctx, selection, from)?;
    ctx.host.model.split_block_at_selection()?;
    debug!(target: "ime.handlers", handler = from, "block_split");
    Ok(())
}
