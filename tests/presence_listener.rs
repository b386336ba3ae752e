mod common;

use std::time::Duration;

use common::{registered, ticks, RecordingBackend};
use focuspeer_lib::{
    presence::{ChannelPresenceSource, PresenceExit, PresenceListener},
    session::SessionState,
};
use pretty_assertions::assert_eq;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn pointer_movement_marks_phone_usage() {
    let backend = RecordingBackend::new();
    let coordinator = registered(&backend).await;
    let mut source = ChannelPresenceSource::new();
    let presence = source.handle();
    let mut listener = PresenceListener::new();
    listener.register(&mut source, coordinator.clone()).unwrap();

    assert!(!coordinator.get_state().await.phone_usage);
    assert!(presence.pointer_moved());
    settle().await;
    assert!(coordinator.get_state().await.phone_usage);

    coordinator.start_session().await.unwrap();
    ticks(1).await;
    assert_eq!(backend.adjust_calls(), vec![true]);

    assert!(matches!(
        listener.unregister().await.unwrap(),
        Some(PresenceExit::Unregistered)
    ));
}

#[tokio::test(start_paused = true)]
async fn teardown_event_flushes_and_ends_listener() {
    let backend = RecordingBackend::new();
    let coordinator = registered(&backend).await;
    let mut source = ChannelPresenceSource::new();
    let presence = source.handle();
    let mut listener = PresenceListener::new();
    listener.register(&mut source, coordinator.clone()).unwrap();

    coordinator.start_session().await.unwrap();
    presence.pointer_moved();
    presence.teardown();

    let Some(PresenceExit::Teardown(Some(flush))) = listener.join().await.unwrap() else {
        panic!("expected a teardown exit with a flush");
    };
    assert_eq!(flush.await.unwrap(), Ok(10));

    assert_eq!(backend.adjust_calls(), vec![false]);
    assert_eq!(coordinator.get_state().await.session, SessionState::Inactive);
    assert!(!listener.is_registered());

    // Handlers are gone once the loop has ended.
    assert!(!presence.pointer_moved());
    assert!(!presence.teardown());
}

#[tokio::test(start_paused = true)]
async fn unregister_stops_routing_events() {
    let backend = RecordingBackend::new();
    let coordinator = registered(&backend).await;
    let mut source = ChannelPresenceSource::new();
    let presence = source.handle();
    let mut listener = PresenceListener::new();
    listener.register(&mut source, coordinator.clone()).unwrap();

    assert!(matches!(
        listener.unregister().await.unwrap(),
        Some(PresenceExit::Unregistered)
    ));
    assert!(listener.unregister().await.unwrap().is_none());

    assert!(!presence.pointer_moved());
    settle().await;
    assert!(!coordinator.get_state().await.phone_usage);
    assert!(backend.adjust_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn registration_is_exclusive() {
    let backend = RecordingBackend::new();
    let coordinator = registered(&backend).await;
    let mut source = ChannelPresenceSource::new();
    let mut listener = PresenceListener::new();
    listener.register(&mut source, coordinator.clone()).unwrap();

    assert!(listener.register(&mut source, coordinator.clone()).is_err());

    let mut second = PresenceListener::new();
    assert!(second.register(&mut source, coordinator.clone()).is_err());
    assert!(!second.is_registered());

    listener.unregister().await.unwrap();
}
