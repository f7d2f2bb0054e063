//! Consumer attach/detach behaviour of the event dispatcher

use bridge_traits::EnginePlaybackState;
use core_runtime::events::{ControlEvent, EventDispatcher, SourceKind};
use futures::StreamExt;

#[core_async::test]
async fn test_late_consumer_only_sees_events_after_attach() {
    let dispatcher = EventDispatcher::new();

    dispatcher.emit(ControlEvent::SourceSet {
        url: "http://host/track.flac".to_string(),
        source_type: SourceKind::Progressive,
    });
    dispatcher.emit(ControlEvent::PlaybackStateChanged {
        state: EnginePlaybackState::Buffering,
    });

    let mut stream = dispatcher.attach();
    dispatcher.emit(ControlEvent::PlaybackStateChanged {
        state: EnginePlaybackState::Ready,
    });
    dispatcher.detach();

    let received: Vec<ControlEvent> = stream.by_ref().collect().await;
    assert_eq!(
        received,
        vec![ControlEvent::PlaybackStateChanged {
            state: EnginePlaybackState::Ready
        }]
    );
}

#[core_async::test]
async fn test_dispatcher_clones_share_consumer() {
    let dispatcher = EventDispatcher::new();
    let emitter = dispatcher.clone();
    let mut stream = dispatcher.attach();

    let handle = core_async::spawn(async move {
        for is_playing in [true, false, true] {
            emitter.emit(ControlEvent::IsPlayingChanged { is_playing });
        }
    });
    handle.await.unwrap();

    let mut flips = Vec::new();
    while let Some(ControlEvent::IsPlayingChanged { is_playing }) = stream.try_recv() {
        flips.push(is_playing);
    }
    assert_eq!(flips, vec![true, false, true]);
}
