//! Integration tests for the input dispatcher driven by mock inputs.

use std::time::Duration;

use autophon_hardware::mock::MockInputs;
use autophon_hardware::{AnyEdgeSource, HardwareError, InputDispatcher, InputLine, SignalBoard};
use tokio_util::sync::CancellationToken;

fn spawn_dispatcher() -> (
    SignalBoard,
    autophon_hardware::mock::MockInputsHandle,
    CancellationToken,
    tokio::task::JoinHandle<autophon_hardware::Result<()>>,
) {
    let (inputs, handle) = MockInputs::new();
    let board = SignalBoard::new();
    let cancel = CancellationToken::new();
    let dispatcher = InputDispatcher::new(AnyEdgeSource::Mock(inputs), board.clone());
    let task = tokio::spawn(dispatcher.run(cancel.clone()));
    (board, handle, cancel, task)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test(start_paused = true)]
async fn test_dialed_number_reaches_board() {
    let (board, handle, cancel, task) = spawn_dispatcher();

    handle.dial(&[4, 2]).await.unwrap();
    settle().await;

    assert_eq!(board.dialer.raise_count(), 2);
    assert_eq!(board.pulse.raise_count(), 6);
    assert_eq!(board.pusher.raise_count(), 0);

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_contact_bounce_is_filtered() {
    let (board, handle, cancel, task) = spawn_dispatcher();

    handle.press(InputLine::Pusher).await.unwrap();
    handle.press(InputLine::Pusher).await.unwrap();
    handle.press(InputLine::Hanger).await.unwrap();
    settle().await;

    assert_eq!(board.pusher.raise_count(), 1);
    assert_eq!(board.hanger.raise_count(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    handle.press(InputLine::Pusher).await.unwrap();
    settle().await;

    assert_eq!(board.pusher.raise_count(), 2);

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_wakes_on_press() {
    let (board, handle, cancel, task) = spawn_dispatcher();
    let mut hanger = board.hanger.subscribe();

    handle.press(InputLine::Hanger).await.unwrap();

    assert!(hanger.wait_timeout(Duration::from_secs(1)).await);

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_closed_source_stops_dispatcher() {
    let (_board, handle, _cancel, task) = spawn_dispatcher();

    drop(handle);

    let result = task.await.unwrap();
    assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
}
