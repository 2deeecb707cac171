//! Scripted search source for controller tests / 测试用脚本化搜索源

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::source::{FetchGate, SearchSource};
use crate::error::{Result, SearchError};
use crate::models::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub keyword: String,
    pub dependency: Option<String>,
}

impl Call {
    pub fn new(keyword: &str, dependency: Option<&str>) -> Self {
        Self {
            keyword: keyword.to_string(),
            dependency: dependency.map(str::to_string),
        }
    }
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    manual: bool,
    size: usize,
    failing: HashSet<String>,
    waiting: HashMap<usize, oneshot::Sender<Result<Vec<Entity>>>>,
}

/// Records every fetch. `auto` answers at once, `manual` waits for `resolve`.
#[derive(Clone)]
pub struct ScriptedSource {
    name: &'static str,
    gate: FetchGate,
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn auto(name: &'static str, gate: FetchGate) -> Self {
        Self {
            name,
            gate,
            script: Arc::new(Mutex::new(Script { size: 3, ..Default::default() })),
        }
    }

    pub fn manual(name: &'static str, gate: FetchGate) -> Self {
        let source = Self::auto(name, gate);
        source.script.lock().manual = true;
        source
    }

    pub fn with_size(self, size: usize) -> Self {
        self.script.lock().size = size;
        self
    }

    pub fn failing(self, keyword: &str) -> Self {
        self.script.lock().failing.insert(keyword.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    /// Answer the `index`-th call (manual mode) / 回应第 index 次调用
    pub fn resolve(&self, index: usize, result: Result<Vec<Entity>>) {
        let sender = self.script.lock().waiting.remove(&index);
        if let Some(sender) = sender {
            let _ = sender.send(result);
        }
    }
}

#[async_trait]
impl SearchSource for ScriptedSource {
    fn name(&self) -> &str {
        self.name
    }

    fn gate(&self) -> FetchGate {
        self.gate
    }

    async fn fetch(&self, keyword: &str, dependency: Option<&str>) -> Result<Vec<Entity>> {
        let rx = {
            let mut script = self.script.lock();
            let index = script.calls.len();
            script.calls.push(Call::new(keyword, dependency));

            if !script.manual {
                if script.failing.contains(keyword) {
                    return Err(SearchError::Status(500));
                }
                return Ok(entities(keyword, script.size));
            }
            let (tx, rx) = oneshot::channel();
            script.waiting.insert(index, tx);
            rx
        };

        rx.await.unwrap_or(Err(SearchError::Status(499)))
    }
}

pub fn entities(prefix: &str, count: usize) -> Vec<Entity> {
    (0..count)
        .map(|i| Entity::new(format!("{}-{}", prefix, i), format!("{} #{}", prefix, i)))
        .collect()
}

/// Let woken tasks run without reaching any debounce deadline / 让已唤醒任务执行
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
