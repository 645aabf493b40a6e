use std::sync::Arc;

use super::*;
use crate::{dispatcher::DispatchPolicy, test_support::RecordingTransport};

const CHECK_INTERVAL: Duration = Duration::from_millis(100);

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn spawn_panel(
    transport: &Arc<RecordingTransport>,
) -> (
    mpsc::Sender<Intent>,
    watch::Receiver<MotorState>,
    tokio::task::JoinHandle<PanelSummary>,
) {
    let dispatcher = Dispatcher::new(transport.clone(), DispatchPolicy::default());
    let panel = Panel::new(dispatcher, CHECK_INTERVAL);
    let state_rx = panel.subscribe();
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(panel.run(rx));
    (tx, state_rx, handle)
}

#[tokio::test(start_paused = true)]
async fn slider_value_goes_out_after_quiet_period() {
    let transport = Arc::new(RecordingTransport::default());
    let (tx, _state_rx, handle) = spawn_panel(&transport);

    tx.send(Intent::SliderMoved(55)).await.expect("send intent");
    time::sleep(ms(950)).await;
    assert!(transport.sent().is_empty());

    time::sleep(ms(100)).await;
    assert_eq!(transport.sent(), vec!["55,fwd".to_string()]);

    time::sleep(ms(5_000)).await;
    assert_eq!(transport.attempts(), 1);

    drop(tx);
    let summary = handle.await.expect("panel task");
    assert_eq!(
        summary,
        PanelSummary {
            intents: 1,
            rejected: 0,
            dispatches: 1,
            dropped: 0,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn burst_of_slider_moves_sends_only_last_value() {
    let transport = Arc::new(RecordingTransport::default());
    let (tx, state_rx, handle) = spawn_panel(&transport);

    for (delay, value) in [(0, 10), (200, 25), (300, 60), (400, 72)] {
        time::sleep(ms(delay)).await;
        tx.send(Intent::SliderMoved(value)).await.expect("send intent");
    }

    // Last move landed at +900ms.
    time::sleep(ms(950)).await;
    assert!(transport.sent().is_empty());
    assert_eq!(state_rx.borrow().speed.percent(), 72);

    time::sleep(ms(100)).await;
    assert_eq!(transport.sent(), vec!["72,fwd".to_string()]);

    drop(tx);
    let summary = handle.await.expect("panel task");
    assert_eq!(summary.intents, 4);
    assert_eq!(summary.dispatches, 1);
}

#[tokio::test(start_paused = true)]
async fn buttons_dispatch_immediately_and_cancel_pending_send() {
    let transport = Arc::new(RecordingTransport::default());
    let (tx, state_rx, handle) = spawn_panel(&transport);

    tx.send(Intent::Start).await.expect("send intent");
    time::sleep(ms(10)).await;
    assert_eq!(transport.sent(), vec!["40,fwd".to_string()]);

    tx.send(Intent::Increment).await.expect("send intent");
    time::sleep(ms(90)).await;
    tx.send(Intent::SetReverse).await.expect("send intent");
    time::sleep(ms(3_000)).await;

    assert_eq!(
        transport.sent(),
        vec!["40,fwd".to_string(), "41,rev".to_string()]
    );
    assert_eq!(state_rx.borrow().direction, shared::domain::Direction::Reverse);

    drop(tx);
    assert_eq!(handle.await.expect("panel task").dispatches, 2);
}

#[tokio::test(start_paused = true)]
async fn rejected_and_failed_intents_keep_loop_running() {
    let transport = Arc::new(RecordingTransport::failing());
    let (tx, _state_rx, handle) = spawn_panel(&transport);

    tx.send(Intent::SliderMoved(250)).await.expect("send intent");
    tx.send(Intent::Stop).await.expect("send intent");
    time::sleep(ms(10)).await;

    transport.set_failing(false);
    tx.send(Intent::SetReverse).await.expect("send intent");
    time::sleep(ms(10)).await;
    assert_eq!(transport.sent(), vec!["0,rev".to_string()]);

    drop(tx);
    let summary = handle.await.expect("panel task");
    assert_eq!(
        summary,
        PanelSummary {
            intents: 3,
            rejected: 1,
            dispatches: 2,
            dropped: 1,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn closing_intents_discards_pending_auto_send() {
    let transport = Arc::new(RecordingTransport::default());
    let (tx, _state_rx, handle) = spawn_panel(&transport);

    tx.send(Intent::SliderMoved(30)).await.expect("send intent");
    time::sleep(ms(200)).await;
    drop(tx);

    let summary = handle.await.expect("panel task");
    assert_eq!(summary.dispatches, 0);
    assert!(transport.sent().is_empty());
}
