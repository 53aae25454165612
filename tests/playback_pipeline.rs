//! 播放流水线集成测试
//!
//! 使用真实的 WAV 产物存储、无声卡播放器和可控的合成引擎

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use tingwen::application::{
    AudioOutputPort, PlaybackDeps, PlaybackHandle, PlaybackMachineConfig, PlaybackPreferences,
    SettingsStorePort, SpeechSynthesizerPort, SynthesisError, SynthesisRequest, WatchdogSettings,
};
use tingwen::application::ports::ArtifactStorePort;
use tingwen::domain::playback::{AudioBuffer, PlaybackState, SessionId, StartRequest};
use tingwen::domain::voice::VoiceDescriptor;
use tingwen::infrastructure::{
    EventPublisher, ExclusiveAudioOutput, FakeSpeechSynthesizer, FakeSynthesizerConfig,
    HeadlessPlayerFactory, InMemorySettingsStore, JsonSettingsStore, PlaybackEvent,
    WavArtifactStore,
};

/// 记录收到的合成请求
struct RecordingSynthesizer {
    inner: FakeSpeechSynthesizer,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl RecordingSynthesizer {
    fn new(config: FakeSynthesizerConfig) -> Self {
        Self {
            inner: FakeSpeechSynthesizer::new(config),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizerPort for RecordingSynthesizer {
    async fn available_voices(&self) -> Vec<VoiceDescriptor> {
        self.inner.available_voices().await
    }

    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<mpsc::Receiver<AudioBuffer>, SynthesisError> {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.synthesize(request).await
    }
}

struct Harness {
    handle: PlaybackHandle,
    store: Arc<WavArtifactStore>,
    output: Arc<ExclusiveAudioOutput>,
    synthesizer: Arc<RecordingSynthesizer>,
    _dir: tempfile::TempDir,
}

fn harness_with(
    synth: FakeSynthesizerConfig,
    settings: Arc<dyn SettingsStorePort>,
    dir: tempfile::TempDir,
) -> Harness {
    let store = Arc::new(WavArtifactStore::new(dir.path().join("artifacts")));
    let output = Arc::new(ExclusiveAudioOutput::new());
    let synthesizer = Arc::new(RecordingSynthesizer::new(synth));
    let deps = PlaybackDeps {
        synthesizer: synthesizer.clone(),
        artifacts: store.clone(),
        players: Arc::new(HeadlessPlayerFactory::new()),
        output: output.clone(),
        settings,
        events: EventPublisher::new().arc(),
    };
    let config = PlaybackMachineConfig {
        watchdog: WatchdogSettings {
            timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(50),
        },
        ..Default::default()
    };
    Harness {
        handle: PlaybackHandle::spawn(deps, config),
        store,
        output,
        synthesizer,
        _dir: dir,
    }
}

fn harness(synth: FakeSynthesizerConfig, auto_advance: bool) -> Harness {
    let settings = Arc::new(InMemorySettingsStore::with_preferences(PlaybackPreferences {
        auto_advance_enabled: auto_advance,
        playback_rate: 1.0,
    }));
    harness_with(synth, settings, tempfile::tempdir().unwrap())
}

/// 两秒音频
fn long_clip() -> FakeSynthesizerConfig {
    FakeSynthesizerConfig {
        sample_rate: 8000,
        chunk_frames: 8000,
        chunk_count: Some(2),
        chunk_delay: Duration::from_millis(5),
        ..Default::default()
    }
}

/// 0.2 秒音频
fn short_clip() -> FakeSynthesizerConfig {
    FakeSynthesizerConfig {
        sample_rate: 8000,
        chunk_frames: 800,
        chunk_count: Some(2),
        chunk_delay: Duration::from_millis(5),
        ..Default::default()
    }
}

async fn wait_for_state(handle: &PlaybackHandle, session_id: SessionId, state: PlaybackState) {
    let mut rx = handle.watch();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.session_id == Some(session_id) && s.state == state),
    )
    .await
    .expect("timed out waiting for state")
    .unwrap();
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

async fn next_event(rx: &mut broadcast::Receiver<PlaybackEvent>) -> PlaybackEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// 跳过状态变更事件，返回下一个其他事件
async fn next_non_state_event(rx: &mut broadcast::Receiver<PlaybackEvent>) -> PlaybackEvent {
    loop {
        match next_event(rx).await {
            PlaybackEvent::StateChanged { .. } => continue,
            other => return other,
        }
    }
}

fn drain(rx: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn exists(path: &Path) -> bool {
    path.exists()
}

#[tokio::test]
async fn test_second_start_replaces_playing_session_and_deletes_artifact() {
    let h = harness(long_clip(), false);

    let first = h.handle.start(StartRequest::new("第一篇文章")).await.unwrap();
    wait_for_state(&h.handle, first, PlaybackState::Playing).await;
    let first_path = h.store.artifact_path(first);
    assert!(exists(&first_path));

    let second = h.handle.start(StartRequest::new("第二篇文章")).await.unwrap();
    assert_ne!(first, second);
    wait_for_state(&h.handle, second, PlaybackState::Playing).await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.session_id, Some(second));
    assert!(!exists(&first_path));
    assert!(exists(&h.store.artifact_path(second)));
    assert!(h.output.is_active());
}

#[tokio::test]
async fn test_second_start_cancels_in_flight_synthesis() {
    let slow = FakeSynthesizerConfig {
        sample_rate: 8000,
        chunk_frames: 800,
        chunk_count: Some(40),
        chunk_delay: Duration::from_millis(30),
        ..Default::default()
    };
    let h = harness(slow, false);

    let first = h.handle.start(StartRequest::new("很长的文章")).await.unwrap();
    let first_path = h.store.artifact_path(first);
    assert!(wait_until(|| exists(&first_path)).await);

    let second = h.handle.start(StartRequest::new("另一篇")).await.unwrap();
    assert!(wait_until(|| !exists(&first_path)).await);

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.session_id, Some(second));
    assert_eq!(snapshot.state, PlaybackState::Synthesizing);
}

#[tokio::test]
async fn test_stall_fails_session_exactly_once() {
    let stalling = FakeSynthesizerConfig {
        sample_rate: 8000,
        chunk_frames: 800,
        chunk_count: Some(5),
        chunk_delay: Duration::from_millis(5),
        stall_after: Some(1),
        ..Default::default()
    };
    let h = harness(stalling, false);
    let mut events = h.handle.subscribe();

    let id = h.handle.start(StartRequest::new("卡住的合成")).await.unwrap();
    wait_for_state(&h.handle, id, PlaybackState::Failed).await;

    // 给看门狗留出再次触发的机会
    tokio::time::sleep(Duration::from_millis(500)).await;

    let failures: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::Failed { .. }))
        .collect();
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        PlaybackEvent::Failed { code, session_id, .. } => {
            assert_eq!(code, "stall_timeout");
            assert_eq!(*session_id, id);
        }
        _ => unreachable!(),
    }

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Failed);
    assert_eq!(snapshot.last_error_code, Some("stall_timeout"));
    assert!(wait_until(|| !exists(&h.store.artifact_path(id))).await);
    assert!(!h.output.is_active());
}

#[tokio::test]
async fn test_finish_without_auto_advance_never_requests_next() {
    let h = harness(short_clip(), false);
    let mut events = h.handle.subscribe();

    let id = h.handle.start(StartRequest::new("短文")).await.unwrap();
    assert_eq!(
        next_non_state_event(&mut events).await,
        PlaybackEvent::Finished { session_id: id }
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!drain(&mut events)
        .iter()
        .any(|e| matches!(e, PlaybackEvent::NextRequested { .. })));

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Finished);
    assert!(!exists(&h.store.artifact_path(id)));
    assert!(!h.output.is_active());
}

#[tokio::test]
async fn test_finish_with_auto_advance_emits_finished_then_next() {
    let h = harness(short_clip(), true);
    let mut events = h.handle.subscribe();

    let id = h.handle.start(StartRequest::new("短文")).await.unwrap();
    assert_eq!(
        next_non_state_event(&mut events).await,
        PlaybackEvent::Finished { session_id: id }
    );
    assert_eq!(
        next_non_state_event(&mut events).await,
        PlaybackEvent::NextRequested {
            session_id: Some(id)
        }
    );

    // 马上要开始下一篇，输出通道保持占用
    assert!(h.output.is_active());
}

#[tokio::test]
async fn test_state_events_follow_lifecycle() {
    let h = harness(short_clip(), false);
    let mut events = h.handle.subscribe();

    let id = h.handle.start(StartRequest::new("事件顺序")).await.unwrap();

    let mut transitions = Vec::new();
    loop {
        match next_event(&mut events).await {
            PlaybackEvent::StateChanged { session_id, to, .. } => {
                assert_eq!(session_id, id);
                transitions.push(to);
            }
            PlaybackEvent::Finished { .. } => break,
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(
        transitions,
        vec![
            PlaybackState::Synthesizing,
            PlaybackState::Playing,
            PlaybackState::Finished
        ]
    );
}

#[tokio::test]
async fn test_stop_during_synthesis_returns_to_idle() {
    let slow = FakeSynthesizerConfig {
        sample_rate: 8000,
        chunk_frames: 800,
        chunk_count: Some(40),
        chunk_delay: Duration::from_millis(30),
        ..Default::default()
    };
    let h = harness(slow, false);

    let id = h.handle.start(StartRequest::new("停止")).await.unwrap();
    let path = h.store.artifact_path(id);
    assert!(wait_until(|| exists(&path)).await);

    h.handle.stop().await.unwrap();
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Idle);
    assert_eq!(snapshot.session_id, None);
    assert!(!h.output.is_active());
    assert!(wait_until(|| !exists(&path)).await);

    // 取消后不会再进入播放
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.handle.snapshot().await.unwrap().state, PlaybackState::Idle);
}

#[tokio::test]
async fn test_engine_receives_normalized_text_and_best_voice() {
    let h = harness(long_clip(), false);

    let id = h
        .handle
        .start(StartRequest::new("“增长”20-25%"))
        .await
        .unwrap();
    wait_for_state(&h.handle, id, PlaybackState::Playing).await;

    let requests = h.synthesizer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].text, "增长百分之二十到二十五");
    assert_eq!(requests[0].locale, "zh-CN");
    assert_eq!(
        requests[0].voice.as_ref().map(|v| v.id.as_str()),
        Some("fake.zh-CN.premium")
    );
}

#[tokio::test]
async fn test_language_hint_forces_locale() {
    let h = harness(long_clip(), false);

    let id = h
        .handle
        .start(StartRequest::new("Read more at https://example.com/post").with_language("en-US"))
        .await
        .unwrap();
    wait_for_state(&h.handle, id, PlaybackState::Playing).await;

    let requests = h.synthesizer.requests();
    assert_eq!(requests[0].text, "Read more at link");
    assert_eq!(requests[0].locale, "en-US");
    assert_eq!(
        requests[0].voice.as_ref().map(|v| v.id.as_str()),
        Some("fake.en-US.enhanced")
    );
}

#[tokio::test]
async fn test_preferences_persist_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    let settings = Arc::new(JsonSettingsStore::new(&path, PlaybackPreferences::default()));
    let h = harness_with(long_clip(), settings.clone(), dir);

    h.handle.set_auto_advance(true).await.unwrap();
    h.handle.set_rate(1.5).await.unwrap();

    let saved = settings.load().unwrap();
    assert!(saved.auto_advance_enabled);
    assert_eq!(saved.playback_rate, 1.5);

    let snapshot = h.handle.snapshot().await.unwrap();
    assert!(snapshot.auto_advance_enabled);
    assert_eq!(snapshot.rate, 1.5);
}

#[tokio::test]
async fn test_seek_is_clamped_to_duration() {
    let h = harness(long_clip(), false);
    let id = h.handle.start(StartRequest::new("定位")).await.unwrap();
    wait_for_state(&h.handle, id, PlaybackState::Playing).await;

    h.handle.pause().await.unwrap();
    h.handle.seek(Duration::from_secs(1)).await.unwrap();
    assert_eq!(
        h.handle.snapshot().await.unwrap().elapsed,
        Duration::from_secs(1)
    );

    h.handle.seek(Duration::from_secs(30)).await.unwrap();
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.elapsed, Duration::from_secs(2));
    assert_eq!(snapshot.duration, Duration::from_secs(2));
    assert_eq!(snapshot.state, PlaybackState::Paused);
}
