//! Search capability consumed by the controllers / 控制器使用的搜索能力
//!
//! A source only answers "what matches this keyword (within this
//! dependency)". When to ask, how often, and what to do with late answers is
//! decided by the controller.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Entity;

/// When a controller is allowed to fetch / 允许发起请求的条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchGate {
    /// Keyword must be non-empty / 关键词非空
    NonEmptyKeyword,
    /// Parent selection must be present; keyword may be empty ("list all") / 需要上级选择
    Dependency,
}

impl FetchGate {
    pub fn is_open(&self, keyword: &str, dependency: Option<&str>) -> bool {
        match self {
            FetchGate::NonEmptyKeyword => !keyword.is_empty(),
            FetchGate::Dependency => dependency.is_some(),
        }
    }
}

#[async_trait]
pub trait SearchSource: Send + Sync + 'static {
    /// Short name used in logs and events / 日志名称
    fn name(&self) -> &str;

    fn gate(&self) -> FetchGate;

    /// Ranked matches, in source order / 按来源顺序返回结果
    async fn fetch(&self, keyword: &str, dependency: Option<&str>) -> Result<Vec<Entity>>;
}
