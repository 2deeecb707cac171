//! Dependent search controller / 依赖搜索控制器
//!
//! One controller backs one search field: keyword → debounce → fetch →
//! result set, plus the field's selection. Controllers can be chained: a
//! parent's selection id becomes the child's dependency, and a change of
//! that id resets the child's keyword and selection.
//!
//! Every fetch gets a sequence number when it is issued. A completion is
//! applied only if its number is still the newest one issued by the
//! controller, so a slow old response never overwrites a newer result set.
//! Resets and teardown consume a number to orphan whatever is in flight.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::debounce::Debouncer;
use super::events::{ControllerEvent, SearchPhase};
use super::source::SearchSource;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::models::{Entity, SelectOption};

/// Tunables for one controller / 控制器参数
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub debounce: Duration,
    pub max_results: usize,
    pub fetch_timeout: Duration,
    pub clear_stale_results: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for ControllerOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            debounce: config.debounce(),
            max_results: config.max_results,
            fetch_timeout: config.fetch_timeout(),
            clear_stale_results: config.clear_stale_results,
        }
    }
}

/// Why the input text changed (mirrors select widgets) / 输入变化原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    SetValue,
    InputChange,
    /// Field lost focus; the widget reports an empty input that must not clear the keyword
    InputBlur,
    MenuClose,
}

/// Serializable view of one controller / 控制器快照
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub name: String,
    pub keyword: String,
    pub dependency: Option<String>,
    pub phase: SearchPhase,
    pub options: Vec<SelectOption>,
    pub value: Option<SelectOption>,
    pub last_error: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
}

struct ControllerState {
    keyword: String,
    dependency: Option<String>,
    results: Vec<Entity>,
    selection: Option<Entity>,
    phase: SearchPhase,
    last_error: Option<String>,
    settled_at: Option<DateTime<Utc>>,
    /// Last Idle/Settled phase, restored when a fetch fails / 请求失败时恢复的阶段
    resting: SearchPhase,
    /// Highest sequence number handed out so far / 已发出的最大序号
    issued: u64,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            keyword: String::new(),
            dependency: None,
            results: Vec::new(),
            selection: None,
            phase: SearchPhase::Idle,
            last_error: None,
            settled_at: None,
            resting: SearchPhase::Idle,
            issued: 0,
        }
    }

    fn rest(&mut self, phase: SearchPhase) {
        self.phase = phase;
        self.resting = phase;
    }

    /// Orphan every in-flight fetch / 使进行中的请求全部过期
    fn invalidate(&mut self) {
        self.issued += 1;
        if self.phase == SearchPhase::Fetching {
            self.phase = self.resting;
        }
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.settled_at = None;
        self.resting = SearchPhase::Idle;
    }
}

/// Receives a parent's selection id / 接收上级选择变化
trait DependencyListener: Send + Sync {
    fn on_dependency_change(self: Arc<Self>, dependency: Option<String>);
}

struct Shared<S: SearchSource> {
    source: Arc<S>,
    options: ControllerOptions,
    state: Mutex<ControllerState>,
    debouncer: Debouncer,
    events: broadcast::Sender<ControllerEvent>,
    children: Mutex<Vec<Weak<dyn DependencyListener>>>,
}

impl<S: SearchSource> Shared<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn options_of(results: &[Entity]) -> Vec<SelectOption> {
        results.iter().map(SelectOption::from).collect()
    }

    fn set_keyword(self: &Arc<Self>, keyword: String) {
        {
            let mut state = self.state.lock();
            if state.keyword == keyword {
                return;
            }
            state.keyword = keyword;
        }
        self.keyword_changed();
    }

    /// (Re)start the debounce window / 重新开始防抖计时
    fn keyword_changed(self: &Arc<Self>) {
        self.state.lock().phase = SearchPhase::Pending;

        let weak = Arc::downgrade(self);
        self.debouncer.schedule(move || {
            if let Some(shared) = weak.upgrade() {
                shared.fire();
            }
        });
    }

    /// Debounce window elapsed / 防抖计时结束
    fn fire(self: &Arc<Self>) {
        let gate = self.source.gate();
        let (keyword, dependency, seq) = {
            let mut state = self.state.lock();
            if !gate.is_open(&state.keyword, state.dependency.as_deref()) {
                // Latest intent is "no search": late answers for older input are stale too
                state.invalidate();
                state.rest(SearchPhase::Idle);
                let cleared = self.options.clear_stale_results && !state.results.is_empty();
                if cleared {
                    state.clear_results();
                }
                drop(state);
                debug!("{}: search skipped, inputs not ready ({:?})", self.name(), gate);
                if cleared {
                    self.emit(ControllerEvent::ResultsChanged {
                        controller: self.name().to_string(),
                        options: Vec::new(),
                    });
                }
                return;
            }

            state.issued += 1;
            state.phase = SearchPhase::Fetching;
            (state.keyword.clone(), state.dependency.clone(), state.issued)
        };

        info!(
            "{}: fetching keyword={:?} dependency={:?} seq={}",
            self.name(), keyword, dependency, seq
        );
        self.emit(ControllerEvent::FetchStarted {
            controller: self.name().to_string(),
            keyword: keyword.clone(),
            dependency: dependency.clone(),
            seq,
        });

        let source = self.source.clone();
        let weak = Arc::downgrade(self);
        let timeout = self.options.fetch_timeout;
        tokio::spawn(async move {
            let fetch = source.fetch(&keyword, dependency.as_deref());
            let outcome = match tokio::time::timeout(timeout, fetch).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SearchError::Timeout(timeout.as_millis() as u64)),
            };
            match weak.upgrade() {
                Some(shared) => shared.complete(seq, outcome),
                None => debug!("{}: controller gone, dropping response seq={}", source.name(), seq),
            }
        });
    }

    fn complete(&self, seq: u64, outcome: Result<Vec<Entity>, SearchError>) {
        let mut state = self.state.lock();
        if seq != state.issued {
            debug!(
                "{}: discarding stale response seq={} (latest={})",
                self.name(), seq, state.issued
            );
            return;
        }
        let waiting = self.debouncer.is_pending();

        match outcome {
            Ok(mut results) => {
                results.truncate(self.options.max_results);
                state.results = results;
                state.last_error = None;
                state.settled_at = Some(Utc::now());
                state.rest(SearchPhase::Settled);
                if waiting {
                    state.phase = SearchPhase::Pending;
                }
                let options = Self::options_of(&state.results);
                drop(state);

                debug!("{}: settled seq={} with {} results", self.name(), seq, options.len());
                self.emit(ControllerEvent::ResultsChanged {
                    controller: self.name().to_string(),
                    options,
                });
            }
            Err(e) => {
                // Result set stays as it was; next keyword change retries
                state.last_error = Some(e.to_string());
                state.phase = if waiting { SearchPhase::Pending } else { state.resting };
                drop(state);

                warn!(
                    "{}: search failed seq={} (transient={}): {}",
                    self.name(), seq, e.is_transient(), e
                );
                self.emit(ControllerEvent::FetchFailed {
                    controller: self.name().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn select(&self, selected: Option<Entity>) {
        let id = selected.as_ref().map(|entity| entity.id.clone());
        let value = selected.as_ref().map(SelectOption::from);
        self.state.lock().selection = selected;

        info!("{}: selection {:?}", self.name(), id);
        self.emit(ControllerEvent::SelectionChanged {
            controller: self.name().to_string(),
            value,
        });
        self.notify_children(id);
    }

    fn notify_children(&self, id: Option<String>) {
        let children: Vec<Arc<dyn DependencyListener>> = {
            let mut children = self.children.lock();
            children.retain(|child| child.strong_count() > 0);
            children.iter().filter_map(Weak::upgrade).collect()
        };
        for child in children {
            child.on_dependency_change(id.clone());
        }
    }

    fn shutdown(&self) {
        self.debouncer.cancel();
        self.state.lock().invalidate();
    }
}

impl<S: SearchSource> DependencyListener for Shared<S> {
    fn on_dependency_change(self: Arc<Self>, dependency: Option<String>) {
        let (had_selection, cleared) = {
            let mut state = self.state.lock();
            if state.dependency == dependency {
                return;
            }
            state.dependency = dependency.clone();
            state.keyword.clear();
            let had_selection = state.selection.take().is_some();
            state.invalidate();
            let cleared = self.options.clear_stale_results && !state.results.is_empty();
            if cleared {
                state.clear_results();
                state.phase = SearchPhase::Idle;
            }
            (had_selection, cleared)
        };

        info!("{}: dependency changed to {:?}, resetting", self.name(), dependency);
        self.emit(ControllerEvent::Reset {
            controller: self.name().to_string(),
            dependency,
        });
        if cleared {
            self.emit(ControllerEvent::ResultsChanged {
                controller: self.name().to_string(),
                options: Vec::new(),
            });
        }
        if had_selection {
            self.notify_children(None);
        }
        self.keyword_changed();
    }
}

/// Search controller handle; dropping it tears the controller down / 控制器句柄
pub struct SearchController<S: SearchSource> {
    shared: Arc<Shared<S>>,
}

impl<S: SearchSource> SearchController<S> {
    pub fn new(source: S, options: ControllerOptions) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(Shared {
                source: Arc::new(source),
                debouncer: Debouncer::new(options.debounce),
                options,
                state: Mutex::new(ControllerState::new()),
                events,
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// `onInputChange` / 输入框内容变化
    pub fn on_input_change(&self, text: &str, action: InputAction) {
        if action == InputAction::InputBlur {
            return;
        }
        self.set_keyword(text);
    }

    pub fn set_keyword(&self, keyword: impl Into<String>) {
        self.shared.set_keyword(keyword.into());
    }

    /// `onChange`; `None` clears the selection / 选择变化
    pub fn on_change(&self, selected: Option<Entity>) {
        self.shared.select(selected);
    }

    /// Make `child` depend on this controller's selection / 建立依赖关系
    pub fn attach_child<T: SearchSource>(&self, child: &SearchController<T>) {
        let listener: Arc<dyn DependencyListener> = child.shared.clone();
        self.shared.children.lock().push(Arc::downgrade(&listener));

        let current = self.shared.state.lock().selection.as_ref().map(|e| e.id.clone());
        listener.on_dependency_change(current);
    }

    pub fn options(&self) -> Vec<SelectOption> {
        Shared::<S>::options_of(&self.shared.state.lock().results)
    }

    pub fn value(&self) -> Option<SelectOption> {
        self.shared.state.lock().selection.as_ref().map(SelectOption::from)
    }

    pub fn keyword(&self) -> String {
        self.shared.state.lock().keyword.clone()
    }

    pub fn dependency(&self) -> Option<String> {
        self.shared.state.lock().dependency.clone()
    }

    pub fn selection(&self) -> Option<Entity> {
        self.shared.state.lock().selection.clone()
    }

    pub fn results(&self) -> Vec<Entity> {
        self.shared.state.lock().results.clone()
    }

    pub fn phase(&self) -> SearchPhase {
        self.shared.state.lock().phase
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().last_error.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.shared.events.subscribe()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.shared.state.lock();
        ControllerSnapshot {
            name: self.name().to_string(),
            keyword: state.keyword.clone(),
            dependency: state.dependency.clone(),
            phase: state.phase,
            options: Shared::<S>::options_of(&state.results),
            value: state.selection.as_ref().map(SelectOption::from),
            last_error: state.last_error.clone(),
            settled_at: state.settled_at,
        }
    }

    /// Cancel the pending search and orphan in-flight ones / 取消待执行与进行中的搜索
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl<S: SearchSource> Drop for SearchController<S> {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}
