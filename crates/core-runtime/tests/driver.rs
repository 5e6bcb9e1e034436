use core_config::QuirkProfile;
use core_events::{KeyName, Notification};
use core_handlers::{ImeHost, ImeSession, handlers_for};
use core_model::{MemoryDocument, ModelCommand, NodeKey, Point, Range};
use core_runtime::{DriverCommand, DriverReport, SessionDriver};
use core_session::{ActionSession, IdleInterval, Resolution, ResolvedBy, SessionSettings};
use core_surface::SurfaceTree;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::Instant;

const QUIET: Duration = Duration::from_millis(20);

fn settings() -> SessionSettings {
    SessionSettings {
        idle: IdleInterval::After(QUIET),
        ..SessionSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn idle_deadline_closes_a_backspace_burst() {
    let doc = MemoryDocument::from_paragraphs(&["hello"])
        .with_selection(Range::collapsed(Point::new(NodeKey(2), 5)));
    let surface = SurfaceTree::render(&doc);
    let session: ImeSession<MemoryDocument, SurfaceTree> = ActionSession::new(
        handlers_for(QuirkProfile::Api26, Duration::from_millis(100)),
        settings(),
    );
    let (driver, commands, mut reports) = SessionDriver::channel(session, ImeHost::new(doc, surface));

    let client = async move {
        for _ in 0..4 {
            commands
                .send(DriverCommand::Trigger(Notification::delete_backward()))
                .await
                .unwrap();
        }
        let report = reports.recv().await.unwrap();
        drop(commands);
        report
    };

    let (host, report) = tokio::join!(driver.run(), client);
    assert_eq!(
        report,
        DriverReport::Outcome(Resolution::Resolved(ResolvedBy::Finish(
            "continuous-backspace".to_string()
        )))
    );
    let deletes: Vec<_> = host
        .model
        .journal()
        .iter()
        .filter(|c| matches!(c, ModelCommand::DeleteBackward(_)))
        .cloned()
        .collect();
    assert_eq!(deletes, vec![ModelCommand::DeleteBackward(4)]);
    assert_eq!(host.model.text(NodeKey(2)).as_deref(), Some("h"));
}

#[tokio::test(start_paused = true)]
async fn refresh_pushes_the_deadline_back() {
    let session = ActionSession::<(), ()>::new(Vec::new(), settings());
    let (driver, commands, mut reports) = SessionDriver::channel(session, ());

    let client = async move {
        let start = Instant::now();
        commands
            .send(DriverCommand::Trigger(Notification::key_down(
                KeyName::Unidentified,
            )))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(15)).await;
        commands
            .send(DriverCommand::Refresh(Notification::selection_change()))
            .await
            .unwrap();
        let report = reports.recv().await.unwrap();
        let elapsed = start.elapsed();
        drop(commands);
        (report, elapsed)
    };

    let (_, (report, elapsed)) = tokio::join!(driver.run(), client);
    assert_eq!(report, DriverReport::Outcome(Resolution::Discarded));
    assert_eq!(elapsed, Duration::from_millis(35));
}

#[tokio::test(start_paused = true)]
async fn set_delay_while_idle_is_reported() {
    let session = ActionSession::<(), ()>::new(Vec::new(), settings());
    let (driver, commands, mut reports) = SessionDriver::channel(session, ());

    let client = async move {
        commands
            .send(DriverCommand::SetDelay(Duration::from_millis(50)))
            .await
            .unwrap();
        let report = reports.recv().await.unwrap();
        drop(commands);
        report
    };

    let (_, report) = tokio::join!(driver.run(), client);
    assert_eq!(
        report,
        DriverReport::Failed {
            handler: None,
            message: "no burst is active".to_string(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn driver_returns_host_when_senders_drop() {
    let session = ActionSession::<u32, ()>::new(Vec::new(), settings());
    let (driver, commands, _reports) = SessionDriver::channel(session, 7u32);
    drop(commands);
    assert_eq!(driver.run().await, 7);
}
