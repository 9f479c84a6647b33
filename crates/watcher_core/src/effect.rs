use url::Url;

use crate::{Item, LengthBound, Summary};

/// Side effects requested by `update`; the engine executes them and feeds the
/// outcome back as a `Msg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchListing,
    CommitState { title: String },
    FetchDetail { link: Url },
    Summarize { text: String, bound: LengthBound },
    Dispatch { item: Item, summary: Summary },
}
