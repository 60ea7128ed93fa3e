//! # Error 模块
//!
//! 定义 vn-ext 中使用的错误类型。
//!
//! 正常的控制流不走错误：任务不存在、回看界面缺失、语音缺失等情况都会退化为无操作。
//! 这里的错误只覆盖脚本解析、配置、存档以及宿主协作者的真实失败。

use thiserror::Error;

/// 脚本解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 无效的行格式
    #[error("第 {line} 行：无效的格式 - {message}")]
    InvalidLine { line: usize, message: String },

    /// 未知指令
    #[error("第 {line} 行：未知指令 '@{command}'")]
    UnknownCommand { line: usize, command: String },

    /// 缺少必需参数
    #[error("第 {line} 行：指令 '@{command}' 缺少参数 '{param}'")]
    MissingParameter {
        line: usize,
        command: String,
        param: String,
    },

    /// 无效的参数值
    #[error("第 {line} 行：参数 '{param}' 的值无效 - {message}")]
    InvalidParameter {
        line: usize,
        param: String,
        message: String,
    },

    /// 未闭合的引号
    #[error("第 {line} 行：引号未闭合")]
    UnterminatedQuote { line: usize },
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

/// 文本打印机 actor 错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActorError {
    /// 打印机不存在且无法创建
    #[error("无法获取打印机 '{id}': {message}")]
    Unavailable { id: String, message: String },

    /// 显示/隐藏过渡失败
    #[error("打印机 '{id}' 显隐过渡失败: {message}")]
    Transition { id: String, message: String },

    /// 文本显示失败
    #[error("打印机 '{id}' 文本显示失败: {message}")]
    Reveal { id: String, message: String },
}

/// 音频错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// 语音资源加载失败
    #[error("无法加载语音 '{path}': {message}")]
    LoadFailed { path: String, message: String },
}

/// 存档错误
#[derive(Error, Debug)]
pub enum SaveError {
    /// 序列化失败
    #[error("存档序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 版本不兼容
    #[error("存档版本不兼容: 存档版本 {found}，当前版本 {current}")]
    IncompatibleVersion { found: String, current: String },
}

/// 打印指令执行错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrintError {
    /// 打印机 actor 失败（只包括被等待的步骤）
    #[error(transparent)]
    Actor(#[from] ActorError),
}

/// vn-ext 统一错误类型
#[derive(Error, Debug)]
pub enum ExtError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 打印错误
    #[error("打印错误: {0}")]
    Print(#[from] PrintError),

    /// 存档错误
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Result 类型别名
pub type ExtResult<T> = Result<T, ExtError>;
