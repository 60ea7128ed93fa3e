//! # Player 模块
//!
//! 脚本播放器与回看（回档）检查点接口。

use async_trait::async_trait;

use crate::token::AsyncToken;

/// 脚本播放器
///
/// 打印指令只读取播放模式，并通过它等待玩家推进。
#[async_trait]
pub trait ScriptPlayer: Send + Sync {
    /// 是否处于快进模式
    fn skip_active(&self) -> bool;

    /// 是否处于自动播放模式
    fn auto_play_active(&self) -> bool;

    /// 进入“等待输入”状态，直到玩家推进或令牌取消
    async fn wait_for_input(&self, token: AsyncToken);
}

/// 回档栈
pub trait RollbackStack: Send + Sync {
    /// 允许玩家回档到栈顶检查点
    fn allow_player_rollback(&self);
}
