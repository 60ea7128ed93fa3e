//! # 内存音频
//!
//! 只记录播放状态的语音实现；语音在其时长结束后自动视为播放完毕。

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::audio::AudioManager;
use crate::error::AudioError;
use crate::token::AsyncToken;

#[derive(Debug, Default)]
struct VoiceState {
    /// 正在播放的语音与结束时间
    played: Option<(String, Instant)>,
    loaded: HashSet<String>,
    play_log: Vec<(String, Option<String>)>,
    stop_count: usize,
}

/// 内存音频管理器
#[derive(Debug, Default)]
pub struct MemoryAudio {
    /// 可用语音及其时长
    clips: HashMap<String, Duration>,
    state: Mutex<VoiceState>,
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一段语音
    pub fn with_clip(mut self, path: impl Into<String>, length: Duration) -> Self {
        self.clips.insert(path.into(), length);
        self
    }

    /// 播放记录：(语音路径, 作者)
    pub fn play_log(&self) -> Vec<(String, Option<String>)> {
        self.lock().play_log.clone()
    }

    /// `stop_voice` 被调用的次数
    pub fn stop_count(&self) -> usize {
        self.lock().stop_count
    }

    fn lock(&self) -> MutexGuard<'_, VoiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AudioManager for MemoryAudio {
    async fn voice_exists(&self, path: &str) -> bool {
        self.clips.contains_key(path)
    }

    fn is_voice_loaded(&self, path: &str) -> bool {
        self.lock().loaded.contains(path)
    }

    fn played_voice_path(&self) -> Option<String> {
        let state = self.lock();
        match &state.played {
            Some((path, ends_at)) if Instant::now() < *ends_at => Some(path.clone()),
            _ => None,
        }
    }

    fn stop_voice(&self) {
        let mut state = self.lock();
        state.played = None;
        state.stop_count += 1;
    }

    async fn play_voice(
        &self,
        path: &str,
        author_id: Option<&str>,
        _token: AsyncToken,
    ) -> Result<(), AudioError> {
        let length = self
            .clips
            .get(path)
            .copied()
            .ok_or_else(|| AudioError::LoadFailed {
                path: path.to_string(),
                message: "资源不存在".to_string(),
            })?;

        let mut state = self.lock();
        state.loaded.insert(path.to_string());
        state.played = Some((path.to_string(), Instant::now() + length));
        state
            .play_log
            .push((path.to_string(), author_id.map(str::to_string)));
        debug!(path = %path, author = ?author_id, "播放语音");
        Ok(())
    }
}
