use std::time::Duration;

use tracing::warn;

use ember_gateway::Dispatcher;
use ember_rooms::Rooms;

/// Background task that retires rooms.
///
/// Runs on an interval: marks rooms past their deadline as expired,
/// purges rooms whose retention window has also elapsed, and closes the
/// live event channel of every room it retired so subscribers see
/// `RoomClosed` instead of silence.
pub async fn run_sweep_loop(rooms: Rooms, dispatcher: Dispatcher, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        if let Err(err) = sweep_once(&rooms, &dispatcher).await {
            warn!(error = %err, "sweep pass failed");
        }
    }
}

async fn sweep_once(rooms: &Rooms, dispatcher: &Dispatcher) -> anyhow::Result<()> {
    let rooms = rooms.clone();
    let report = tokio::task::spawn_blocking(move || rooms.sweep()).await??;

    // A room can appear in both lists; the second close is a no-op
    for id in report.expired.iter().chain(&report.purged) {
        dispatcher.close_room(*id).await;
    }
    Ok(())
}
