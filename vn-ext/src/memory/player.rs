//! # 内存脚本播放器
//!
//! 通过 [`MemoryScriptPlayer::advance`] 模拟玩家推进。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::player::{RollbackStack, ScriptPlayer};
use crate::token::AsyncToken;

/// 内存脚本播放器
#[derive(Debug, Default)]
pub struct MemoryScriptPlayer {
    skip: AtomicBool,
    auto_play: AtomicBool,
    waiting: AtomicBool,
    input_waits: AtomicUsize,
    advance: Notify,
}

impl MemoryScriptPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_skip(&self, active: bool) {
        self.skip.store(active, Ordering::SeqCst);
    }

    pub fn set_auto_play(&self, active: bool) {
        self.auto_play.store(active, Ordering::SeqCst);
    }

    /// 玩家推进
    ///
    /// 没有等待者时保留一次推进，下一次等待立即返回。
    pub fn advance(&self) {
        self.advance.notify_one();
    }

    /// 是否正在等待输入
    pub fn is_waiting_for_input(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }

    /// 进入等待输入状态的次数
    pub fn input_waits(&self) -> usize {
        self.input_waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptPlayer for MemoryScriptPlayer {
    fn skip_active(&self) -> bool {
        self.skip.load(Ordering::SeqCst)
    }

    fn auto_play_active(&self) -> bool {
        self.auto_play.load(Ordering::SeqCst)
    }

    async fn wait_for_input(&self, token: AsyncToken) {
        self.input_waits.fetch_add(1, Ordering::SeqCst);
        // 自动播放与快进模式下由播放器自行推进
        if self.auto_play_active() || self.skip_active() {
            return;
        }

        self.waiting.store(true, Ordering::SeqCst);
        tokio::select! {
            _ = self.advance.notified() => {}
            _ = token.canceled() => {}
        }
        self.waiting.store(false, Ordering::SeqCst);
    }
}

/// 记录回档许可次数的回档栈
#[derive(Debug, Default)]
pub struct MemoryRollback {
    allowed: AtomicUsize,
}

impl MemoryRollback {
    pub fn new() -> Self {
        Self::default()
    }

    /// 回档许可次数
    pub fn allowed_count(&self) -> usize {
        self.allowed.load(Ordering::SeqCst)
    }
}

impl RollbackStack for MemoryRollback {
    fn allow_player_rollback(&self) {
        self.allowed.fetch_add(1, Ordering::SeqCst);
    }
}
