//! Playback State Machine - 播放状态机
//!
//! 单个任务串行处理所有状态变更：外部命令经 `PlaybackHandle` 进入命令通道，
//! 合成完成、合成失败、看门狗超时、播放结束等内部消息经内部通道进入。
//! 内部消息都带会话 id，不属于当前会话的消息直接丢弃。
//!
//! 状态处理本身是同步的，合成、建文件、开播放器都在派生任务里完成。

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::controller::PlaybackController;
use super::coordinator::{SynthesisCoordinator, SynthesisJob, SynthesisOutcome};
use super::watchdog::{ProgressTracker, StallWatchdog, WatchdogSettings};
use crate::application::ports::{
    ArtifactStorePort, AudioOutputPort, AudioPlayerFactory, PlaybackPreferences,
    SettingsStorePort, SpeechSynthesizerPort,
};
use crate::domain::normalization::NormalizationRuleSet;
use crate::domain::playback::{
    PlaybackError, PlaybackRate, PlaybackSession, PlaybackState, SessionId, StartRequest,
};
use crate::domain::voice::{LanguageHint, VoiceSelector};
use crate::infrastructure::events::{EventPublisher, PlaybackEvent};

/// 状态机依赖的端口
#[derive(Clone)]
pub struct PlaybackDeps {
    pub synthesizer: Arc<dyn SpeechSynthesizerPort>,
    pub artifacts: Arc<dyn ArtifactStorePort>,
    pub players: Arc<dyn AudioPlayerFactory>,
    pub output: Arc<dyn AudioOutputPort>,
    pub settings: Arc<dyn SettingsStorePort>,
    pub events: Arc<EventPublisher>,
}

/// 状态机参数
#[derive(Debug, Clone)]
pub struct PlaybackMachineConfig {
    pub watchdog: WatchdogSettings,
    pub voices: VoiceSelector,
    /// 设置存储读不出来时使用的偏好
    pub fallback_preferences: PlaybackPreferences,
    pub command_capacity: usize,
}

impl Default for PlaybackMachineConfig {
    fn default() -> Self {
        Self {
            watchdog: WatchdogSettings::default(),
            voices: VoiceSelector::default(),
            fallback_preferences: PlaybackPreferences::default(),
            command_capacity: 32,
        }
    }
}

/// 对外可见的播放状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub session_id: Option<SessionId>,
    pub title: Option<String>,
    pub state: PlaybackState,
    pub elapsed: Duration,
    pub duration: Duration,
    /// 设定的播放速率
    pub rate: f32,
    pub auto_advance_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_code: Option<&'static str>,
}

impl PlaybackSnapshot {
    fn idle(preferences: &PlaybackPreferences) -> Self {
        Self {
            session_id: None,
            title: None,
            state: PlaybackState::Idle,
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
            rate: preferences.rate().value(),
            auto_advance_enabled: preferences.auto_advance_enabled,
            last_error: None,
            last_error_code: None,
        }
    }
}

/// 除 start 以外的控制命令
#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Play,
    Pause,
    Toggle,
    Stop,
    AdvanceToNext,
    RequestNext,
    Seek(Duration),
    SetRate(f32),
    SetAutoAdvance(bool),
    InterruptionBegan,
    InterruptionEnded { should_resume: bool },
}

enum Command {
    Start {
        request: StartRequest,
        reply: oneshot::Sender<Result<SessionId, PlaybackError>>,
    },
    Control {
        control: Control,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<PlaybackSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// 派生任务回报给状态机的消息
enum Internal {
    Ready {
        session_id: SessionId,
        controller: PlaybackController,
        ended: oneshot::Receiver<()>,
    },
    SynthesisFailed {
        session_id: SessionId,
        error: PlaybackError,
    },
    Stalled {
        session_id: SessionId,
        silent_for: Duration,
    },
    PlaybackEnded {
        session_id: SessionId,
    },
    PlayerDied {
        session_id: SessionId,
    },
}

/// 当前会话占用的资源
struct SessionResources {
    cancel: CancellationToken,
    watchdog_cancel: CancellationToken,
    controller: Option<PlaybackController>,
    ended_forwarder: Option<JoinHandle<()>>,
}

impl SessionResources {
    fn release(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.ended_forwarder.take() {
            handle.abort();
        }
        // controller 析构时停止播放器并删除产物
        drop(self.controller.take());
    }
}

struct PlaybackStateMachine {
    deps: PlaybackDeps,
    config: PlaybackMachineConfig,
    normalizer: NormalizationRuleSet,
    preferences: PlaybackPreferences,
    session: Option<PlaybackSession>,
    resources: Option<SessionResources>,
    last_error: Option<PlaybackError>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackStateMachine {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        tracing::info!("Playback state machine started");

        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.teardown(true);
                        self.refresh_snapshot();
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        self.teardown(true);
                        self.refresh_snapshot();
                        break;
                    }
                },
                Some(message) = internal.recv() => self.handle_internal(message),
            }
            self.refresh_snapshot();
        }

        tracing::info!("Playback state machine stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { request, reply } => {
                let result = self.start(request);
                let _ = reply.send(result);
            }
            Command::Control { control, reply } => {
                self.control(control);
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.build_snapshot());
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn current_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    fn current_state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(PlaybackState::Idle)
    }

    fn is_current(&self, session_id: SessionId, state: PlaybackState) -> bool {
        self.current_id() == Some(session_id) && self.current_state() == state
    }

    /// 切换当前会话状态并发布事件；不允许的切换被忽略
    fn set_state(&mut self, next: PlaybackState) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match session.transition_to(next) {
            Some(previous) => {
                tracing::debug!(
                    session_id = %session.id,
                    from = ?previous,
                    to = ?next,
                    "State transition"
                );
                self.deps
                    .events
                    .publish_state_changed(session.id, previous, next);
                true
            }
            None => {
                tracing::warn!(
                    session_id = %session.id,
                    from = ?session.state,
                    to = ?next,
                    "Ignored invalid state transition"
                );
                false
            }
        }
    }

    fn start(&mut self, request: StartRequest) -> Result<SessionId, PlaybackError> {
        if request.text.trim().is_empty() {
            tracing::warn!("Start rejected: empty input");
            return Err(PlaybackError::EmptyInput);
        }

        let hint = LanguageHint::parse(&request.language_hint);
        let normalized = self.normalizer.normalize_for(&request.text, &hint);
        if normalized.trim().is_empty() {
            tracing::warn!("Start rejected: nothing left after normalization");
            return Err(PlaybackError::EmptyInput);
        }

        // 新会话马上要用输出通道，取代旧会话时不释放
        self.teardown(false);

        if let Err(e) = self.deps.output.activate() {
            let error = PlaybackError::ResourceActivationFailure(e.to_string());
            tracing::error!(error = %error, "Audio output activation failed");
            self.deps.output.deactivate();
            self.last_error = Some(error.clone());
            return Err(error);
        }

        let session = PlaybackSession::new(
            request,
            hint,
            normalized,
            self.preferences.rate(),
            self.preferences.auto_advance_enabled,
        );
        let session_id = session.id;

        let cancel = CancellationToken::new();
        let watchdog_cancel = cancel.child_token();
        let progress = ProgressTracker::new();

        self.spawn_watchdog(session_id, progress.clone(), watchdog_cancel.clone());
        self.spawn_synthesis(&session, progress, cancel.clone());

        tracing::info!(
            session_id = %session_id,
            title = %session.display_title(),
            language = %session.language_hint,
            rate = session.playback_rate.value(),
            auto_advance = session.auto_advance_enabled,
            "Playback session started"
        );

        self.last_error = None;
        self.session = Some(session);
        self.resources = Some(SessionResources {
            cancel,
            watchdog_cancel,
            controller: None,
            ended_forwarder: None,
        });
        self.set_state(PlaybackState::Synthesizing);

        Ok(session_id)
    }

    fn spawn_watchdog(
        &self,
        session_id: SessionId,
        progress: ProgressTracker,
        cancel: CancellationToken,
    ) {
        let watchdog = StallWatchdog::new(self.config.watchdog, progress, cancel);
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            if let Some(silent_for) = watchdog.run().await {
                let _ = tx.send(Internal::Stalled {
                    session_id,
                    silent_for,
                });
            }
        });
    }

    fn spawn_synthesis(
        &self,
        session: &PlaybackSession,
        progress: ProgressTracker,
        cancel: CancellationToken,
    ) {
        let session_id = session.id;
        let job = SynthesisJob {
            session_id,
            source_text: session.source_text.clone(),
            normalized_text: session.normalized_text.clone(),
            language_hint: session.language_hint.clone(),
        };
        let coordinator = SynthesisCoordinator::new(
            self.deps.synthesizer.clone(),
            self.deps.artifacts.clone(),
            self.config.voices.clone(),
            progress,
            cancel.clone(),
        );
        let players = self.deps.players.clone();
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            let artifact = match coordinator.run(job).await {
                Ok(SynthesisOutcome::Completed(artifact)) => artifact,
                Ok(SynthesisOutcome::Cancelled) => return,
                Err(error) => {
                    let _ = tx.send(Internal::SynthesisFailed { session_id, error });
                    return;
                }
            };

            if cancel.is_cancelled() {
                return;
            }

            let message = match PlaybackController::load(players.as_ref(), artifact).await {
                Ok((controller, ended)) => Internal::Ready {
                    session_id,
                    controller,
                    ended,
                },
                Err(error) => Internal::SynthesisFailed { session_id, error },
            };
            let _ = tx.send(message);
        });
    }

    fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::Ready {
                session_id,
                controller,
                ended,
            } => {
                if !self.is_current(session_id, PlaybackState::Synthesizing) {
                    tracing::debug!(session_id = %session_id, "Dropping stale player");
                    return;
                }
                self.begin_playback(session_id, controller, ended);
            }
            Internal::SynthesisFailed { session_id, error } => {
                if !self.is_current(session_id, PlaybackState::Synthesizing) {
                    tracing::debug!(session_id = %session_id, error = %error, "Ignoring stale synthesis failure");
                    return;
                }
                self.fail(error);
            }
            Internal::Stalled {
                session_id,
                silent_for,
            } => {
                if !self.is_current(session_id, PlaybackState::Synthesizing) {
                    tracing::debug!(session_id = %session_id, "Ignoring stale stall report");
                    return;
                }
                tracing::warn!(
                    session_id = %session_id,
                    silent_ms = silent_for.as_millis() as u64,
                    "Synthesis stall detected"
                );
                self.fail(PlaybackError::StallTimeout(self.config.watchdog.timeout));
            }
            Internal::PlaybackEnded { session_id } => {
                if !self.is_current(session_id, PlaybackState::Playing) {
                    return;
                }
                self.finish();
            }
            Internal::PlayerDied { session_id } => {
                let state = self.current_state();
                if self.current_id() != Some(session_id)
                    || !matches!(state, PlaybackState::Playing | PlaybackState::Paused)
                {
                    return;
                }
                self.fail(PlaybackError::PlayerFailure(
                    "播放结束信号在播放中断开".to_string(),
                ));
            }
        }
    }

    fn begin_playback(
        &mut self,
        session_id: SessionId,
        mut controller: PlaybackController,
        ended: oneshot::Receiver<()>,
    ) {
        let rate = self
            .session
            .as_ref()
            .map(|s| s.playback_rate)
            .unwrap_or_default();
        controller.set_rate(rate);
        controller.play();

        let tx = self.internal_tx.clone();
        // 主动拆除时先 abort 转发任务再丢弃播放器，这里收到断开只可能是播放器自己退出
        let forwarder = tokio::spawn(async move {
            let message = match ended.await {
                Ok(()) => Internal::PlaybackEnded { session_id },
                Err(_) => Internal::PlayerDied { session_id },
            };
            let _ = tx.send(message);
        });

        if let Some(resources) = self.resources.as_mut() {
            resources.watchdog_cancel.cancel();
            resources.controller = Some(controller);
            resources.ended_forwarder = Some(forwarder);
        }
        self.set_state(PlaybackState::Playing);
        tracing::info!(session_id = %session_id, "Playback started");
    }

    fn release_resources(&mut self) {
        if let Some(resources) = self.resources.take() {
            resources.release();
        }
    }

    /// 完整拆除当前会话，回到 Idle；可重复调用
    fn teardown(&mut self, deactivate_output: bool) {
        self.release_resources();
        if let Some(id) = self.current_id() {
            self.set_state(PlaybackState::Idle);
            self.session = None;
            tracing::info!(session_id = %id, deactivate_output, "Playback session torn down");
        }
        if deactivate_output {
            self.deps.output.deactivate();
        }
    }

    fn fail(&mut self, error: PlaybackError) {
        let Some(session_id) = self.current_id() else {
            return;
        };
        self.release_resources();
        self.deps.output.deactivate();
        if self.set_state(PlaybackState::Failed) {
            tracing::error!(
                session_id = %session_id,
                code = error.code(),
                error = %error,
                "Playback session failed"
            );
            self.deps.events.publish_failed(session_id, &error);
        }
        self.last_error = Some(error);
    }

    fn finish(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let session_id = session.id;
        let auto_advance = session.auto_advance_enabled;

        self.release_resources();
        self.set_state(PlaybackState::Finished);
        if !auto_advance {
            self.deps.output.deactivate();
        }

        tracing::info!(session_id = %session_id, auto_advance, "Playback finished");
        self.deps.events.publish_finished(session_id);
        if auto_advance {
            self.deps.events.publish_next_requested(Some(session_id));
        }
    }

    fn controller_mut(&mut self) -> Option<&mut PlaybackController> {
        self.resources.as_mut().and_then(|r| r.controller.as_mut())
    }

    fn resume(&mut self) {
        if self.current_state() != PlaybackState::Paused {
            return;
        }
        if let Some(controller) = self.controller_mut() {
            controller.play();
        }
        self.set_state(PlaybackState::Playing);
    }

    fn suspend(&mut self) {
        if self.current_state() != PlaybackState::Playing {
            return;
        }
        if let Some(controller) = self.controller_mut() {
            controller.pause();
        }
        self.set_state(PlaybackState::Paused);
    }

    fn control(&mut self, control: Control) {
        tracing::debug!(control = ?control, state = ?self.current_state(), "Control received");

        match control {
            Control::Play => self.resume(),
            Control::Pause => self.suspend(),
            Control::Toggle => match self.current_state() {
                PlaybackState::Playing => self.suspend(),
                PlaybackState::Paused => self.resume(),
                _ => {}
            },
            Control::Stop => {
                if self.session.is_none() {
                    // 轻量切换之后没有新会话接上，输出通道仍被占着
                    if self.deps.output.is_active() {
                        tracing::info!("Releasing audio output held after advance");
                        self.deps.output.deactivate();
                    }
                    return;
                }
                self.teardown(true);
            }
            Control::AdvanceToNext => {
                if self.session.is_none() {
                    return;
                }
                self.teardown(false);
            }
            Control::RequestNext => {
                let session_id = self.current_id();
                self.deps.events.publish_next_requested(session_id);
            }
            Control::Seek(position) => {
                if !matches!(
                    self.current_state(),
                    PlaybackState::Playing | PlaybackState::Paused
                ) {
                    return;
                }
                if let Some(controller) = self.controller_mut() {
                    controller.seek(position);
                }
            }
            Control::SetRate(value) => {
                if !value.is_finite() {
                    tracing::warn!(rate = value, "Ignoring non-finite playback rate");
                    return;
                }
                let rate = PlaybackRate::new(value);
                self.preferences.playback_rate = rate.value();
                if let Some(session) = self.session.as_mut() {
                    session.playback_rate = rate;
                }
                if let Some(controller) = self.controller_mut() {
                    controller.set_rate(rate);
                }
                self.persist_preferences();
            }
            Control::SetAutoAdvance(enabled) => {
                self.preferences.auto_advance_enabled = enabled;
                if let Some(session) = self.session.as_mut() {
                    session.auto_advance_enabled = enabled;
                }
                self.persist_preferences();
            }
            Control::InterruptionBegan => {
                if self.current_state() == PlaybackState::Playing {
                    tracing::info!("Audio interruption began, pausing");
                    self.suspend();
                }
            }
            Control::InterruptionEnded { should_resume } => {
                if should_resume && self.current_state() == PlaybackState::Paused {
                    tracing::info!("Audio interruption ended, resuming");
                    self.resume();
                }
            }
        }
    }

    fn persist_preferences(&self) {
        if let Err(e) = self.deps.settings.save(&self.preferences) {
            tracing::warn!(error = %e, "Failed to persist playback preferences");
        }
    }

    fn build_snapshot(&self) -> PlaybackSnapshot {
        let mut snapshot = PlaybackSnapshot::idle(&self.preferences);
        if let Some(session) = self.session.as_ref() {
            snapshot.session_id = Some(session.id);
            snapshot.title = Some(session.display_title());
            snapshot.state = session.state;
            snapshot.rate = session.playback_rate.value();
            snapshot.auto_advance_enabled = session.auto_advance_enabled;
        }
        if let Some(controller) = self.resources.as_ref().and_then(|r| r.controller.as_ref()) {
            snapshot.elapsed = controller.elapsed();
            snapshot.duration = controller.duration();
        }
        if let Some(error) = self.last_error.as_ref() {
            snapshot.last_error = Some(error.to_string());
            snapshot.last_error_code = Some(error.code());
        }
        snapshot
    }

    fn refresh_snapshot(&self) {
        let snapshot = self.build_snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// 状态机句柄，可克隆
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
    events: Arc<EventPublisher>,
}

impl PlaybackHandle {
    /// 启动状态机任务
    ///
    /// 偏好从设置存储读取，读取失败时使用配置里的默认值。
    pub fn spawn(deps: PlaybackDeps, config: PlaybackMachineConfig) -> Self {
        let preferences = match deps.settings.load() {
            Ok(preferences) => preferences,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load playback preferences, using defaults");
                config.fallback_preferences
            }
        };

        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::idle(&preferences));
        let events = deps.events.clone();

        let machine = PlaybackStateMachine {
            deps,
            config,
            normalizer: NormalizationRuleSet::new(),
            preferences,
            session: None,
            resources: None,
            last_error: None,
            internal_tx,
            snapshot_tx,
        };
        tokio::spawn(machine.run(command_rx, internal_rx));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            events,
        }
    }

    /// 开始新的播放会话，取代当前会话
    pub async fn start(&self, request: StartRequest) -> Result<SessionId, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Start { request, reply })
            .await
            .map_err(|_| PlaybackError::ControllerClosed)?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)?
    }

    async fn control(&self, control: Control) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Control { control, reply })
            .await
            .map_err(|_| PlaybackError::ControllerClosed)?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)
    }

    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.control(Control::Play).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.control(Control::Pause).await
    }

    pub async fn toggle(&self) -> Result<(), PlaybackError> {
        self.control(Control::Toggle).await
    }

    /// 完整停止，释放音频输出
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.control(Control::Stop).await
    }

    /// 轻量切换：停止当前会话但保持音频输出占用，紧接着会开始下一篇
    pub async fn advance_to_next(&self) -> Result<(), PlaybackError> {
        self.control(Control::AdvanceToNext).await
    }

    /// 只发出 NextRequested 事件，不改变状态
    pub async fn request_next(&self) -> Result<(), PlaybackError> {
        self.control(Control::RequestNext).await
    }

    pub async fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
        self.control(Control::Seek(position)).await
    }

    pub async fn set_rate(&self, rate: f32) -> Result<(), PlaybackError> {
        self.control(Control::SetRate(rate)).await
    }

    pub async fn set_auto_advance(&self, enabled: bool) -> Result<(), PlaybackError> {
        self.control(Control::SetAutoAdvance(enabled)).await
    }

    pub async fn interruption_began(&self) -> Result<(), PlaybackError> {
        self.control(Control::InterruptionBegan).await
    }

    pub async fn interruption_ended(&self, should_resume: bool) -> Result<(), PlaybackError> {
        self.control(Control::InterruptionEnded { should_resume })
            .await
    }

    /// 带实时播放进度的快照
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| PlaybackError::ControllerClosed)?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)
    }

    /// 状态变化时更新的快照
    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// 拆除当前会话并结束状态机任务
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown { reply })
            .await
            .map_err(|_| PlaybackError::ControllerClosed)?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{AudioPlayer, OpenedPlayer, PlayerError};
    use crate::domain::playback::AudioArtifact;
    use crate::infrastructure::{
        ExclusiveAudioOutput, FakeSpeechSynthesizer, FakeSynthesizerConfig, HeadlessPlayerFactory,
        InMemorySettingsStore, WavArtifactStore,
    };
    use async_trait::async_trait;

    struct Fixture {
        handle: PlaybackHandle,
        output: Arc<ExclusiveAudioOutput>,
        settings: Arc<InMemorySettingsStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture(synth: FakeSynthesizerConfig, preferences: PlaybackPreferences) -> Fixture {
        fixture_with_players(synth, preferences, Arc::new(HeadlessPlayerFactory::new()))
    }

    fn fixture_with_players(
        synth: FakeSynthesizerConfig,
        preferences: PlaybackPreferences,
        players: Arc<dyn AudioPlayerFactory>,
    ) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let output = Arc::new(ExclusiveAudioOutput::new());
        let settings = Arc::new(InMemorySettingsStore::with_preferences(preferences));
        let deps = PlaybackDeps {
            synthesizer: Arc::new(FakeSpeechSynthesizer::new(synth)),
            artifacts: Arc::new(WavArtifactStore::new(dir.path())),
            players,
            output: output.clone(),
            settings: settings.clone(),
            events: EventPublisher::new().arc(),
        };
        let config = PlaybackMachineConfig {
            watchdog: WatchdogSettings {
                timeout: Duration::from_millis(200),
                poll_interval: Duration::from_millis(50),
            },
            ..Default::default()
        };
        Fixture {
            handle: PlaybackHandle::spawn(deps, config),
            output,
            settings,
            _dir: dir,
        }
    }

    /// 两秒音频，足够在播放结束前完成控制操作
    fn clip() -> FakeSynthesizerConfig {
        FakeSynthesizerConfig {
            sample_rate: 8000,
            chunk_frames: 8000,
            chunk_count: Some(2),
            chunk_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    /// 打开后立刻丢掉结束信号发送端的播放器，模拟后端崩溃
    struct CrashingPlayerFactory;

    struct FrozenPlayer {
        duration: Duration,
        playing: bool,
    }

    impl AudioPlayer for FrozenPlayer {
        fn play(&mut self) {
            self.playing = true;
        }
        fn pause(&mut self) {
            self.playing = false;
        }
        fn stop(&mut self) {
            self.playing = false;
        }
        fn seek(&mut self, _position: Duration) {}
        fn set_rate(&mut self, _rate: f32) {}
        fn elapsed(&self) -> Duration {
            Duration::ZERO
        }
        fn duration(&self) -> Duration {
            self.duration
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    #[async_trait]
    impl AudioPlayerFactory for CrashingPlayerFactory {
        async fn open(&self, artifact: &AudioArtifact) -> Result<OpenedPlayer, PlayerError> {
            let (tx, ended) = oneshot::channel();
            drop(tx);
            Ok(OpenedPlayer {
                player: Box::new(FrozenPlayer {
                    duration: artifact.duration(),
                    playing: false,
                }),
                ended,
            })
        }
    }

    async fn wait_for_state(handle: &PlaybackHandle, state: PlaybackState) {
        let mut rx = handle.watch();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.state == state))
            .await
            .expect("timed out waiting for state")
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_input_rejected_without_side_effects() {
        let f = fixture(clip(), PlaybackPreferences::default());
        let mut events = f.handle.subscribe();

        let result = f.handle.start(StartRequest::new("   ")).await;
        assert_eq!(result, Err(PlaybackError::EmptyInput));

        let snapshot = f.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert!(!f.output.is_active());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_and_pause_from_idle_are_noops() {
        let f = fixture(clip(), PlaybackPreferences::default());
        let mut events = f.handle.subscribe();

        f.handle.stop().await.unwrap();
        f.handle.pause().await.unwrap();
        f.handle.play().await.unwrap();

        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Idle);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pause_resume_and_stop() {
        let f = fixture(clip(), PlaybackPreferences::default());
        f.handle.start(StartRequest::new("第一段")).await.unwrap();
        wait_for_state(&f.handle, PlaybackState::Playing).await;
        assert!(f.output.is_active());

        f.handle.pause().await.unwrap();
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Paused);

        f.handle.toggle().await.unwrap();
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Playing);

        f.handle.stop().await.unwrap();
        let snapshot = f.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.session_id, None);
        assert!(!f.output.is_active());
    }

    #[tokio::test]
    async fn test_interruption_pauses_and_resumes() {
        let f = fixture(clip(), PlaybackPreferences::default());
        f.handle.start(StartRequest::new("中断测试")).await.unwrap();
        wait_for_state(&f.handle, PlaybackState::Playing).await;

        f.handle.interruption_began().await.unwrap();
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Paused);

        f.handle.interruption_ended(false).await.unwrap();
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Paused);

        f.handle.interruption_ended(true).await.unwrap();
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_rate_is_clamped_and_persisted_without_state_change() {
        let f = fixture(clip(), PlaybackPreferences::default());
        f.handle.start(StartRequest::new("速率")).await.unwrap();
        wait_for_state(&f.handle, PlaybackState::Playing).await;

        f.handle.set_rate(5.0).await.unwrap();
        let snapshot = f.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.rate, 2.0);
        assert_eq!(snapshot.state, PlaybackState::Playing);
        assert_eq!(f.settings.load().unwrap().playback_rate, 2.0);

        f.handle.set_rate(f32::NAN).await.unwrap();
        assert_eq!(f.handle.snapshot().await.unwrap().rate, 2.0);
    }

    #[tokio::test]
    async fn test_advance_to_next_keeps_output_claimed() {
        let f = fixture(clip(), PlaybackPreferences::default());
        f.handle.start(StartRequest::new("下一篇")).await.unwrap();
        wait_for_state(&f.handle, PlaybackState::Playing).await;

        f.handle.advance_to_next().await.unwrap();
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Idle);
        assert!(f.output.is_active());
    }

    #[tokio::test]
    async fn test_stop_after_advance_releases_output() {
        let f = fixture(clip(), PlaybackPreferences::default());
        let mut events = f.handle.subscribe();
        f.handle.start(StartRequest::new("最后一篇")).await.unwrap();
        wait_for_state(&f.handle, PlaybackState::Playing).await;

        f.handle.advance_to_next().await.unwrap();
        assert!(f.output.is_active());
        while events.try_recv().is_ok() {}

        // 列表到头，没有新的 start
        f.handle.stop().await.unwrap();
        assert!(!f.output.is_active());
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Idle);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_player_crash_fails_session() {
        let f = fixture_with_players(
            clip(),
            PlaybackPreferences::default(),
            Arc::new(CrashingPlayerFactory),
        );
        let mut events = f.handle.subscribe();
        let id = f.handle.start(StartRequest::new("播放器崩溃")).await.unwrap();
        wait_for_state(&f.handle, PlaybackState::Failed).await;

        let snapshot = f.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.session_id, Some(id));
        assert_eq!(snapshot.last_error_code, Some("player_failure"));
        assert!(!f.output.is_active());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let failures = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|e| matches!(e, PlaybackEvent::Failed { .. }))
            .count();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_request_next_does_not_change_state() {
        let f = fixture(clip(), PlaybackPreferences::default());
        let mut events = f.handle.subscribe();

        f.handle.request_next().await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            PlaybackEvent::NextRequested { session_id: None }
        );
        assert_eq!(f.handle.snapshot().await.unwrap().state, PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_activation_failure_reported() {
        let f = fixture(clip(), PlaybackPreferences::default());
        f.output.set_available(false);

        let result = f.handle.start(StartRequest::new("无法播放")).await;
        assert!(matches!(
            result,
            Err(PlaybackError::ResourceActivationFailure(_))
        ));
        let snapshot = f.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.last_error_code, Some("resource_activation_failure"));
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let f = fixture(clip(), PlaybackPreferences::default());
        f.handle.shutdown().await.unwrap();
        assert_eq!(f.handle.play().await, Err(PlaybackError::ControllerClosed));
    }
}
