//! Search module - coordinates search fields, does not know where results come from / 搜索协调模块
//!
//! Architecture principles / 架构原则：
//! - Sources (`SearchSource`) only answer queries: fetch(keyword, dependency)
//! - Controllers own the flow: debounce, fetch gating, stale-response suppression, selection
//! - Call direction: Controller → Source (unidirectional) / 调用方向
//!
//! Controller features / 控制器特性：
//! - One pending debounce timer per controller, replaced on every keystroke
//! - Per-controller request sequence numbers; late answers never overwrite newer ones
//! - Parent → child cascade reset when the parent selection changes

pub mod controller;
pub mod debounce;
pub mod events;
pub mod finder;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{ControllerOptions, ControllerSnapshot, InputAction, SearchController};
pub use debounce::Debouncer;
pub use events::{ControllerEvent, SearchPhase};
pub use finder::{FinderSnapshot, SchoolFinder};
pub use source::{FetchGate, SearchSource};
