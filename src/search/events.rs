use serde::{Deserialize, Serialize};

use crate::models::SelectOption;

/// Controller lifecycle phase / 控制器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Nothing to search for / 无可搜索输入
    Idle,
    /// Debounce timer running / 防抖计时中
    Pending,
    /// Request in flight / 请求进行中
    Fetching,
    /// Results from the latest completed fetch / 已得到最新结果
    Settled,
}

/// Controller events (for the presentation layer) / 控制器事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    FetchStarted { controller: String, keyword: String, dependency: Option<String>, seq: u64 },
    ResultsChanged { controller: String, options: Vec<SelectOption> },
    FetchFailed { controller: String, error: String },
    SelectionChanged { controller: String, value: Option<SelectOption> },
    /// Keyword and selection cleared because the parent selection changed / 上级选择变化导致重置
    Reset { controller: String, dependency: Option<String> },
}
