//! View state machine

use log::debug;

use super::mode::SidePanelMode;
use super::scroll::{ScrollPosition, ScrollRegion, ScrollRegions};
use super::search::{SearchMatch, SearchState};
use crate::decode::StreamContent;
use crate::graph::ObjectRef;

/// State of one document view.
///
/// Side panel, stream panel, scroll regions and search are independent axes;
/// every mutation goes through [`ViewState::apply`].
#[derive(Clone, Debug)]
pub struct ViewState {
    /// Active side panel, at most one
    pub side_panel: Option<SidePanelMode>,

    pub stream_panel_visible: bool,

    /// Stream shown in the stream panel
    pub stream_target: Option<ObjectRef>,

    pub scroll: ScrollRegions,

    pub search: SearchState,

    /// Page zoom factor
    pub scale: f32,

    /// Total page count
    pub page_count: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            side_panel: None,
            stream_panel_visible: false,
            stream_target: None,
            scroll: ScrollRegions::default(),
            search: SearchState::default(),
            scale: 1.0,
            page_count: 0,
        }
    }
}

impl ViewState {
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            ..Self::default()
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SelectSidePanel(mode) => {
                self.side_panel = if self.side_panel == Some(mode) {
                    None
                } else {
                    Some(mode)
                };
                vec![]
            }

            Command::OpenStream { target, content } => self.show_stream(target, content),

            Command::CloseStreamPanel => {
                self.stream_panel_visible = false;
                vec![]
            }

            Command::RequestScroll { region, position } => self.request_scroll(region, position),

            Command::ScrollFinished(region) => {
                self.scroll.get_mut(region).finish();
                vec![]
            }

            Command::ScrollObserved { region, position } => {
                if !self.scroll.get_mut(region).observe(position) {
                    debug!("Ignoring observed {region:?} scroll while a scroll is pending");
                }
                vec![]
            }

            Command::SetSearchQuery(query) => {
                if query.is_empty() {
                    self.search.clear();
                    return vec![];
                }
                self.search.query.clone_from(&query);
                self.search.set_matches(Vec::new());
                vec![Effect::RunSearch(query)]
            }

            Command::SearchCompleted { query, matches } => {
                if query != self.search.query {
                    debug!("Dropping stale results for {query:?}");
                    return vec![];
                }
                self.search.set_matches(matches);
                self.scroll_to_current_match()
            }

            Command::NextMatch => {
                if self.search.next_match().is_none() {
                    return vec![];
                }
                self.scroll_to_current_match()
            }

            Command::PreviousMatch => {
                if self.search.previous_match().is_none() {
                    return vec![];
                }
                self.scroll_to_current_match()
            }

            Command::ClearSearch => self.apply(Command::SetSearchQuery(String::new())),

            Command::SetScale(scale) => {
                self.scale = scale.max(0.1);
                vec![]
            }
        }
    }

    fn show_stream(&mut self, target: ObjectRef, content: StreamContent) -> Vec<Effect> {
        if self.stream_target != Some(target) {
            self.scroll.get_mut(ScrollRegion::StreamPanel).reset();
        }
        self.stream_target = Some(target);
        self.stream_panel_visible = true;
        vec![Effect::DecodeStream { target, content }]
    }

    fn request_scroll(&mut self, region: ScrollRegion, position: ScrollPosition) -> Vec<Effect> {
        self.scroll.get_mut(region).request(position);
        vec![Effect::ScrollRequested { region, position }]
    }

    fn scroll_to_current_match(&mut self) -> Vec<Effect> {
        let Some(page) = self.search.current_match().map(|m| m.page) else {
            return vec![];
        };
        self.request_scroll(ScrollRegion::PageList, ScrollPosition::new(page, 0))
    }

    /// `"{first visible page} / {page count}"`
    #[must_use]
    pub fn page_indicator(&self) -> String {
        if self.page_count == 0 {
            return "0 / 0".to_string();
        }
        let index = self
            .scroll
            .get(ScrollRegion::PageList)
            .resting
            .index
            .min(self.page_count - 1);
        format!("{} / {}", index + 1, self.page_count)
    }
}

/// Commands that modify view state
#[derive(Clone, Debug)]
pub enum Command {
    /// Activate a side panel, or deactivate it if already active
    SelectSidePanel(SidePanelMode),
    /// Show a stream in the stream panel; only `CloseStreamPanel` hides it
    OpenStream {
        target: ObjectRef,
        content: StreamContent,
    },
    CloseStreamPanel,
    /// Ask the presentation layer to scroll a region
    RequestScroll {
        region: ScrollRegion,
        position: ScrollPosition,
    },
    /// The presentation layer performed the requested scroll
    ScrollFinished(ScrollRegion),
    /// Live position reported by the presentation layer
    ScrollObserved {
        region: ScrollRegion,
        position: ScrollPosition,
    },
    /// Start a search; an empty query clears the search
    SetSearchQuery(String),
    /// Results from the searcher for `query`
    SearchCompleted {
        query: String,
        matches: Vec<SearchMatch>,
    },
    NextMatch,
    PreviousMatch,
    ClearSearch,
    SetScale(f32),
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Obtain the decoded stream for the stream panel
    DecodeStream {
        target: ObjectRef,
        content: StreamContent,
    },
    /// Run the searcher
    RunSearch(String),
    /// A programmatic scroll is now pending for `region`
    ScrollRequested {
        region: ScrollRegion,
        position: ScrollPosition,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: ObjectRef = ObjectRef::new(10, 0);
    const T: ObjectRef = ObjectRef::new(11, 0);

    fn open(target: ObjectRef) -> Command {
        Command::OpenStream {
            target,
            content: StreamContent::Content,
        }
    }

    #[test]
    fn side_panel_toggles_and_replaces() {
        let mut state = ViewState::new(3);
        let _ = state.apply(Command::SelectSidePanel(SidePanelMode::Structure));
        assert_eq!(state.side_panel, Some(SidePanelMode::Structure));
        let _ = state.apply(Command::SelectSidePanel(SidePanelMode::Structure));
        assert_eq!(state.side_panel, None);

        let _ = state.apply(Command::SelectSidePanel(SidePanelMode::Info));
        let _ = state.apply(Command::SelectSidePanel(SidePanelMode::Outlines));
        assert_eq!(state.side_panel, Some(SidePanelMode::Outlines));
    }

    #[test]
    fn stream_panel_is_independent_of_side_panel() {
        let mut state = ViewState::new(3);
        let _ = state.apply(Command::SelectSidePanel(SidePanelMode::Structure));
        let effects = state.apply(open(S));
        assert_eq!(
            effects,
            vec![Effect::DecodeStream {
                target: S,
                content: StreamContent::Content
            }]
        );
        assert!(state.stream_panel_visible);
        assert_eq!(state.side_panel, Some(SidePanelMode::Structure));
    }

    #[test]
    fn reopening_same_stream_keeps_panel_visible() {
        let mut state = ViewState::new(1);
        assert_eq!(state.apply(open(S)).len(), 1);
        assert_eq!(state.apply(open(S)).len(), 1);
        assert!(state.stream_panel_visible);
        assert_eq!(state.stream_target, Some(S));

        assert!(state.apply(Command::CloseStreamPanel).is_empty());
        assert!(!state.stream_panel_visible);
        assert_eq!(state.apply(open(S)).len(), 1);
        assert!(state.stream_panel_visible);
    }

    #[test]
    fn retarget_resets_stream_scroll() {
        let mut state = ViewState::new(1);
        let _ = state.apply(open(S));
        let _ = state.apply(Command::ScrollObserved {
            region: ScrollRegion::StreamPanel,
            position: ScrollPosition::new(40, 3),
        });
        let _ = state.apply(open(S));
        assert_eq!(
            state.scroll.get(ScrollRegion::StreamPanel).resting,
            ScrollPosition::new(40, 3)
        );
        let _ = state.apply(open(T));
        assert_eq!(
            state.scroll.get(ScrollRegion::StreamPanel).resting,
            ScrollPosition::default()
        );
    }

    #[test]
    fn search_results_scroll_to_first_match() {
        let mut state = ViewState::new(6);
        let effects = state.apply(Command::SetSearchQuery("fee".into()));
        assert_eq!(effects, vec![Effect::RunSearch("fee".into())]);

        let effects = state.apply(Command::SearchCompleted {
            query: "fee".into(),
            matches: vec![SearchMatch::new(3, 0..3)],
        });
        assert_eq!(
            effects,
            vec![Effect::ScrollRequested {
                region: ScrollRegion::PageList,
                position: ScrollPosition::new(3, 0),
            }]
        );
        assert_eq!(state.search.current_match_index, Some(0));
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut state = ViewState::new(6);
        let _ = state.apply(Command::SetSearchQuery("old".into()));
        let _ = state.apply(Command::SetSearchQuery("new".into()));
        let effects = state.apply(Command::SearchCompleted {
            query: "old".into(),
            matches: vec![SearchMatch::new(1, 0..3)],
        });
        assert!(effects.is_empty());
        assert!(state.search.matches.is_empty());
    }

    #[test]
    fn clear_search_empties_everything() {
        let mut state = ViewState::new(6);
        let _ = state.apply(Command::SetSearchQuery("x".into()));
        let _ = state.apply(Command::SearchCompleted {
            query: "x".into(),
            matches: vec![SearchMatch::new(1, 0..1)],
        });
        let _ = state.apply(Command::ClearSearch);
        assert_eq!(state.search, SearchState::default());
        assert!(state.apply(Command::NextMatch).is_empty());
    }

    #[test]
    fn scale_is_clamped() {
        let mut state = ViewState::new(1);
        let _ = state.apply(Command::SetScale(0.01));
        assert!((state.scale - 0.1).abs() < f32::EPSILON);
        let _ = state.apply(Command::SetScale(2.5));
        assert!((state.scale - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn page_indicator_uses_resting_position() {
        let mut state = ViewState::new(12);
        assert_eq!(state.page_indicator(), "1 / 12");
        let _ = state.apply(Command::ScrollObserved {
            region: ScrollRegion::PageList,
            position: ScrollPosition::new(4, 20),
        });
        assert_eq!(state.page_indicator(), "5 / 12");
        let _ = state.apply(Command::ScrollObserved {
            region: ScrollRegion::PageList,
            position: ScrollPosition::new(40, 0),
        });
        assert_eq!(state.page_indicator(), "12 / 12");
        assert_eq!(ViewState::new(0).page_indicator(), "0 / 0");
    }
}
