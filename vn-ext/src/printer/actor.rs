//! # Actor 模块
//!
//! 文本打印机 actor 与打印机注册表的接口。
//!
//! 渲染、过渡动画与逐字显示都由宿主实现；这里只约定编排逻辑需要的最小能力。
//! 方法都接收 `&self`，实现方自行管理内部可变性，以便 actor 可以在后台任务之间共享。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ActorError;
use crate::text::LocalizableText;
use crate::token::AsyncToken;

/// 文本打印机 actor
///
/// 屏幕上的一个文本显示面板，拥有 ID、可见性、当前文本和显示进度。
#[async_trait]
pub trait PrinterActor: Send + Sync {
    /// 打印机 ID
    fn id(&self) -> &str;

    /// 是否可见
    fn is_visible(&self) -> bool;

    /// 当前文本
    fn text(&self) -> LocalizableText;

    /// 替换当前文本
    fn set_text(&self, text: LocalizableText);

    /// 最近一次打印的作者
    fn author_id(&self) -> Option<String>;

    /// 显示进度 (0.0 - 1.0)
    fn reveal_progress(&self) -> f32;

    /// 设置显示进度
    fn set_reveal_progress(&self, progress: f32);

    /// 显示/隐藏过渡
    ///
    /// 可见性在过渡开始时即更新；返回时过渡结束或令牌已取消。
    async fn change_visibility(
        &self,
        visible: bool,
        duration: Duration,
        token: AsyncToken,
    ) -> Result<(), ActorError>;
}

/// 打印机注册表
#[async_trait]
pub trait PrinterManager: Send + Sync {
    /// 当前默认打印机 ID
    fn default_printer_id(&self) -> String;

    /// 设置默认打印机
    fn set_default_printer_id(&self, printer_id: &str);

    /// 按 ID 获取已存在的打印机
    fn actor(&self, printer_id: &str) -> Option<Arc<dyn PrinterActor>>;

    /// 所有已存在的打印机
    fn all_actors(&self) -> Vec<Arc<dyn PrinterActor>>;

    /// 获取打印机，不存在时创建
    async fn get_or_add_actor(&self, printer_id: &str) -> Result<Arc<dyn PrinterActor>, ActorError>;

    /// 在打印机上逐字显示文本
    ///
    /// 文本追加到打印机现有文本之后，并把打印机作者更新为 `author_id`。
    /// 令牌被 `complete()` 表示玩家跳过显示，实现方应立即显示剩余文本并返回。
    async fn print_text(
        &self,
        printer_id: &str,
        text: LocalizableText,
        author_id: Option<&str>,
        speed: f32,
        token: AsyncToken,
    ) -> Result<(), ActorError>;
}

/// 角色信息
pub trait CharacterManager: Send + Sync {
    /// 角色显示名
    fn display_name(&self, author_id: &str) -> Option<String>;
}
