//! Watcher core: pure data model, change detection and the run state machine.
mod detect;
mod effect;
mod item;
mod msg;
mod report;
mod state;
mod summary;
pub mod text;
mod update;

pub use detect::is_new;
pub use effect::Effect;
pub use item::{Item, ItemError};
pub use msg::Msg;
pub use report::{DeliveryOutcome, NotificationResult, RunOutcome, RunReport};
pub use state::{ProcessState, RunState, Stage};
pub use summary::{LengthBound, Summary, SummarySource};
pub use update::update;
