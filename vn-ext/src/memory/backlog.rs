//! # 内存回看

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::backlog::{BacklogMessage, BacklogUi};
use crate::state::PlaybackSpot;
use crate::text::LocalizableText;

/// 内存回看界面
#[derive(Debug, Default)]
pub struct MemoryBacklog {
    messages: Mutex<Vec<BacklogMessage>>,
}

impl MemoryBacklog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有消息
    pub fn messages(&self) -> Vec<BacklogMessage> {
        self.lock().clone()
    }

    /// 恢复消息（读档）
    pub fn restore(&self, messages: Vec<BacklogMessage>) {
        *self.lock() = messages;
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BacklogMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BacklogUi for MemoryBacklog {
    fn add_message(
        &self,
        text: LocalizableText,
        author_id: Option<&str>,
        spot: Option<&PlaybackSpot>,
        voice_path: Option<&str>,
    ) {
        self.lock().push(BacklogMessage {
            text,
            author_id: author_id.map(str::to_string),
            spot: spot.cloned(),
            voice_paths: voice_path.map(str::to_string).into_iter().collect(),
        });
    }

    fn append_message(&self, text: LocalizableText, voice_path: Option<&str>) {
        if let Some(last) = self.lock().last_mut() {
            last.append(text, voice_path);
        }
    }
}
