//! # Save 模块
//!
//! 游戏状态容器：各个系统把自己的状态序列化为独立的键值块。
//!
//! - 所有存档数据必须可序列化（JSON）
//! - 必须有版本号，读档时检查兼容性
//! - 缺失的键不是错误，读档方使用默认状态

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SaveError;

/// 存档格式版本
///
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const SAVE_VERSION_MAJOR: u32 = 1;
pub const SAVE_VERSION_MINOR: u32 = 0;

/// 各系统使用的存档键
pub mod keys {
    pub const QUEST_LOG: &str = "quest_log";
    pub const QUEST_PANEL: &str = "quest_log_panel";
    pub const SCROLL_LOG: &str = "quest_scroll_log";
    pub const BACKLOG: &str = "backlog";
    pub const SCRIPT_POSITION: &str = "script_position";
}

/// 存档版本信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveVersion {
    pub major: u32,
    pub minor: u32,
}

impl SaveVersion {
    pub fn current() -> Self {
        Self {
            major: SAVE_VERSION_MAJOR,
            minor: SAVE_VERSION_MINOR,
        }
    }

    /// major 相同即兼容
    pub fn is_compatible(&self) -> bool {
        self.major == SAVE_VERSION_MAJOR
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// 游戏状态容器
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateMap {
    pub version: SaveVersion,
    #[serde(default)]
    states: BTreeMap<String, serde_json::Value>,
}

impl GameStateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个系统的状态（覆盖同名键）
    pub fn set_state<T: Serialize>(&mut self, key: &str, state: &T) -> Result<(), SaveError> {
        let value = serde_json::to_value(state)?;
        self.states.insert(key.to_string(), value);
        Ok(())
    }

    /// 读取一个系统的状态；键不存在时返回 `Ok(None)`
    pub fn get_state<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SaveError> {
        match self.states.get(key) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => {
                debug!(key, "存档中没有该状态");
                Ok(None)
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    /// 所有键（有序）
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 从 JSON 读取并检查版本
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let map: GameStateMap = serde_json::from_str(json)?;
        if !map.version.is_compatible() {
            return Err(SaveError::IncompatibleVersion {
                found: map.version.to_string(),
                current: SaveVersion::current().to_string(),
            });
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::{QuestLogManager, QuestLogState};

    #[test]
    fn test_save_version_compatibility() {
        assert!(SaveVersion::current().is_compatible());
        assert!(SaveVersion { major: 1, minor: 7 }.is_compatible());
        assert!(!SaveVersion { major: 2, minor: 0 }.is_compatible());
        assert_eq!(SaveVersion { major: 1, minor: 2 }.to_string(), "1.2");
    }

    #[test]
    fn test_state_round_trip() {
        let mut manager = QuestLogManager::new();
        manager.start_quest("q1", "寻找钥匙");
        manager.update_quest("q1", "去了北边");

        let mut map = GameStateMap::new();
        map.set_state(keys::QUEST_LOG, &manager.snapshot()).unwrap();

        let json = map.to_json().unwrap();
        assert!(json.contains("寻找钥匙"));

        let loaded = GameStateMap::from_json(&json).unwrap();
        let state: QuestLogState = loaded.get_state(keys::QUEST_LOG).unwrap().unwrap();
        assert_eq!(state, manager.snapshot());
    }

    #[test]
    fn test_missing_key_is_none() {
        let map = GameStateMap::new();
        let state: Option<QuestLogState> = map.get_state(keys::QUEST_LOG).unwrap();
        assert!(state.is_none());
        assert!(!map.contains(keys::QUEST_LOG));
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let mut map = GameStateMap::new();
        map.set_state("count", &3u32).unwrap();
        let result: Result<Option<QuestLogState>, _> = map.get_state("count");
        assert!(matches!(result, Err(SaveError::Serialization(_))));
    }

    #[test]
    fn test_incompatible_version_error() {
        let json = r#"{ "version": { "major": 99, "minor": 0 }, "states": {} }"#;
        let result = GameStateMap::from_json(json);
        assert!(matches!(result, Err(SaveError::IncompatibleVersion { .. })));
    }
}
