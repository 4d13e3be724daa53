//! View coordination: side panels, stream panel, scrolling and search

mod coordinator;
mod mode;
mod scroll;
mod search;
mod state;

pub use coordinator::ViewCoordinator;
pub use mode::SidePanelMode;
pub use scroll::{ScrollPosition, ScrollRegion, ScrollRegions, ScrollState};
pub use search::{
    PageTextSearcher, SearchError, SearchMatch, SearchState, TextSearcher, find_matches_in_pages,
};
pub use state::{Command, Effect, ViewState};
