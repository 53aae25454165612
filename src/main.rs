//! Tingwen - 文章朗读演示程序
//!
//! 用法: tingwen <文章路径> [语言提示]
//!
//! 使用 Fake 合成引擎和无声卡播放器跑完整条播放流水线，打印生命周期事件。

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use tingwen::application::{
    MediaControlBridge, PlaybackDeps, PlaybackHandle, PlaybackMachineConfig,
};
use tingwen::config::{load_config, print_config, AppConfig};
use tingwen::domain::playback::StartRequest;
use tingwen::infrastructure::{
    EventPublisher, ExclusiveAudioOutput, FakeSpeechSynthesizer, HeadlessPlayerFactory,
    InMemoryNowPlayingCenter, JsonSettingsStore, PlaybackEvent, WavArtifactStore,
};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},tingwen={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    init_tracing(&config);

    tracing::info!("Tingwen - 文章朗读");
    print_config(&config);

    let mut args = std::env::args().skip(1);
    let article_path = args
        .next()
        .context("usage: tingwen <article-path> [language-hint]")?;
    let language_hint = args.next().unwrap_or_default();

    let text = tokio::fs::read_to_string(&article_path)
        .await
        .with_context(|| format!("Failed to read article {}", article_path))?;
    let title = std::path::Path::new(&article_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());

    tokio::fs::create_dir_all(&config.synthesis.artifact_dir).await?;

    // 组装端口实现
    let events = EventPublisher::new().arc();
    let deps = PlaybackDeps {
        synthesizer: Arc::new(FakeSpeechSynthesizer::with_defaults()),
        artifacts: Arc::new(WavArtifactStore::new(&config.synthesis.artifact_dir)),
        players: Arc::new(HeadlessPlayerFactory::new()),
        output: ExclusiveAudioOutput::new().arc(),
        settings: Arc::new(JsonSettingsStore::new(
            &config.settings.path,
            config.playback.default_preferences(),
        )),
        events,
    };
    let machine_config = PlaybackMachineConfig {
        watchdog: config.watchdog.settings(),
        voices: config.voices.selector(),
        fallback_preferences: config.playback.default_preferences(),
        command_capacity: config.synthesis.command_capacity,
    };

    let handle = PlaybackHandle::spawn(deps, machine_config);
    let mut events = handle.subscribe();

    // 媒体控制面板
    let bridge_cancel = CancellationToken::new();
    let bridge = MediaControlBridge::new(
        handle.clone(),
        InMemoryNowPlayingCenter::new().arc(),
        config.playback.now_playing_refresh(),
    );
    let bridge_task = tokio::spawn(bridge.run(bridge_cancel.clone()));

    let mut request = StartRequest::new(text).with_language(language_hint);
    if let Some(title) = title {
        request = request.with_title(title);
    }
    let session_id = handle
        .start(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start playback: {}", e))?;
    tracing::info!(session_id = %session_id, "Reading article");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
            event = events.recv() => match event {
                Ok(PlaybackEvent::StateChanged { from, to, .. }) => {
                    tracing::info!(from = %from, to = %to, "State changed");
                }
                Ok(PlaybackEvent::Finished { .. }) => {
                    tracing::info!("Article finished");
                    break;
                }
                Ok(PlaybackEvent::NextRequested { .. }) => {
                    tracing::info!("Next article requested");
                }
                Ok(PlaybackEvent::Failed { code, message, .. }) => {
                    tracing::error!(code = %code, "Playback failed: {}", message);
                    break;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event receiver lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    handle
        .shutdown()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to shut down playback: {}", e))?;
    bridge_cancel.cancel();
    let _ = bridge_task.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
