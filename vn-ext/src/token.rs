//! # Token 模块
//!
//! 异步等待点共享的取消/完成令牌。
//!
//! ## 状态
//!
//! ```text
//! Active ──cancel()──► Canceled
//!    │
//!    └──complete()───► Completed   （玩家跳过了文本显示）
//! ```
//!
//! 两个终态互斥且不可逆。等待循环在令牌离开 `Active` 后应立即退出，不产生错误。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// 令牌状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenState {
    /// 正常执行
    #[default]
    Active,
    /// 已取消
    Canceled,
    /// 已完成（显示被跳过）
    Completed,
}

/// 异步令牌
///
/// 克隆得到的令牌共享同一状态。
#[derive(Debug, Clone)]
pub struct AsyncToken {
    state: Arc<watch::Sender<TokenState>>,
}

impl AsyncToken {
    /// 创建处于 `Active` 状态的令牌
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TokenState::Active);
        Self {
            state: Arc::new(tx),
        }
    }

    /// 取消
    pub fn cancel(&self) {
        self.signal(TokenState::Canceled);
    }

    /// 标记为完成
    pub fn complete(&self) {
        self.signal(TokenState::Completed);
    }

    fn signal(&self, to: TokenState) {
        self.state.send_if_modified(|state| {
            if *state == TokenState::Active {
                *state = to;
                true
            } else {
                false
            }
        });
    }

    /// 当前状态
    pub fn state(&self) -> TokenState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == TokenState::Active
    }

    pub fn is_canceled(&self) -> bool {
        self.state() == TokenState::Canceled
    }

    pub fn is_completed(&self) -> bool {
        self.state() == TokenState::Completed
    }

    /// 等待令牌离开 `Active`（取消或完成）
    pub async fn signaled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state != TokenState::Active).await;
    }

    /// 等待令牌被取消
    ///
    /// 令牌已完成时永远不会返回，只适合放在 `select!` 分支里。
    pub async fn canceled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == TokenState::Canceled).await;
    }
}

impl Default for AsyncToken {
    fn default() -> Self {
        Self::new()
    }
}

/// 等待一帧；令牌取消时立即返回
pub async fn wait_frame(frame: Duration, token: &AsyncToken) {
    tokio::select! {
        _ = tokio::time::sleep(frame) => {}
        _ = token.canceled() => {}
    }
}

/// 等待指定帧数；令牌取消时立即返回
pub async fn wait_frames(count: u32, frame: Duration, token: &AsyncToken) {
    for _ in 0..count {
        if token.is_canceled() {
            return;
        }
        wait_frame(frame, token).await;
    }
}
