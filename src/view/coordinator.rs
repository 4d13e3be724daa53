//! View coordinator - applies commands and executes their effects

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use super::mode::SidePanelMode;
use super::scroll::{ScrollPosition, ScrollRegion, ScrollState};
use super::search::{SearchState, TextSearcher};
use super::state::{Command, Effect, ViewState};
use crate::decode::{DecodeEvent, DecodeService, DecodedStream, StreamContent};
use crate::graph::ObjectRef;
use crate::structure::StructureNode;

/// Owns the view state of one document together with its decode service
/// and searcher.
pub struct ViewCoordinator {
    state: ViewState,
    decoder: DecodeService,
    searcher: Arc<dyn TextSearcher>,
    /// Latest snapshot of the stream panel's target
    displayed: Option<Arc<DecodedStream>>,
}

impl ViewCoordinator {
    #[must_use]
    pub fn new(decoder: DecodeService, searcher: Arc<dyn TextSearcher>, page_count: usize) -> Self {
        Self {
            state: ViewState::new(page_count),
            decoder,
            searcher,
            displayed: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn decode_service(&self) -> &DecodeService {
        &self.decoder
    }

    /// Apply a command, execute its effects and return them
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        let mut queue: VecDeque<Effect> = self.state.apply(cmd).into();
        let mut executed = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match &effect {
                Effect::DecodeStream { target, content } => {
                    let snapshot = self.decoder.open(*target, *content);
                    if self.state.stream_target == Some(*target) {
                        self.displayed = Some(snapshot);
                    }
                }

                Effect::RunSearch(query) => {
                    let matches = match self.searcher.search(query) {
                        Ok(matches) => matches,
                        Err(e) => {
                            warn!("Search for {query:?} failed: {e}");
                            Vec::new()
                        }
                    };
                    queue.extend(self.state.apply(Command::SearchCompleted {
                        query: query.clone(),
                        matches,
                    }));
                }

                Effect::ScrollRequested { region, position } => {
                    debug!("Scroll requested for {region:?} to {position:?}");
                }
            }
            executed.push(effect);
        }

        executed
    }

    pub fn select_side_panel(&mut self, mode: SidePanelMode) {
        self.apply(Command::SelectSidePanel(mode));
    }

    #[must_use]
    pub fn side_panel(&self) -> Option<SidePanelMode> {
        self.state.side_panel
    }

    /// Show `node`'s stream in the stream panel, making the panel visible.
    ///
    /// Nodes without a decodable stream are ignored; returns whether the
    /// node was accepted.
    pub fn open_stream(&mut self, node: &StructureNode) -> bool {
        let Some((target, content)) = stream_of(node) else {
            return false;
        };
        self.apply(Command::OpenStream { target, content });
        true
    }

    pub fn close_stream_panel(&mut self) {
        self.apply(Command::CloseStreamPanel);
    }

    #[must_use]
    pub fn stream_panel_visible(&self) -> bool {
        self.state.stream_panel_visible
    }

    /// Stream shown in the panel; a pending snapshot until its decode lands
    #[must_use]
    pub fn displayed_stream(&self) -> Option<&Arc<DecodedStream>> {
        if self.state.stream_panel_visible {
            self.displayed.as_ref()
        } else {
            None
        }
    }

    pub fn request_scroll(&mut self, region: ScrollRegion, index: usize, offset: usize) {
        self.apply(Command::RequestScroll {
            region,
            position: ScrollPosition::new(index, offset),
        });
    }

    /// Acknowledge that the presentation layer performed a requested scroll
    pub fn scroll_finish(&mut self, region: ScrollRegion) {
        self.apply(Command::ScrollFinished(region));
    }

    /// Record the live scroll position of `region`
    pub fn observe_scroll(&mut self, region: ScrollRegion, index: usize, offset: usize) {
        self.apply(Command::ScrollObserved {
            region,
            position: ScrollPosition::new(index, offset),
        });
    }

    #[must_use]
    pub fn scroll(&self, region: ScrollRegion) -> &ScrollState {
        self.state.scroll.get(region)
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.apply(Command::SetSearchQuery(query.to_string()));
    }

    pub fn next_match(&mut self) {
        self.apply(Command::NextMatch);
    }

    pub fn previous_match(&mut self) {
        self.apply(Command::PreviousMatch);
    }

    pub fn clear_search(&mut self) {
        self.apply(Command::ClearSearch);
    }

    #[must_use]
    pub fn search(&self) -> &SearchState {
        &self.state.search
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.apply(Command::SetScale(scale));
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    #[must_use]
    pub fn page_indicator(&self) -> String {
        self.state.page_indicator()
    }

    /// Drain finished decodes. Returns true if the displayed stream changed.
    pub fn poll(&mut self) -> bool {
        let events = self.decoder.poll();
        self.absorb(events)
    }

    /// Block until no decode is in flight or `timeout` passes.
    /// Returns true if the displayed stream changed.
    pub fn wait_for_decodes(&mut self, timeout: Duration) -> bool {
        let events = self.decoder.wait_idle(timeout);
        self.absorb(events)
    }

    fn absorb(&mut self, events: Vec<DecodeEvent>) -> bool {
        let mut changed = false;
        for event in events {
            if self.state.stream_target == Some(event.target) {
                self.displayed = Some(event.stream);
                changed = true;
            } else {
                debug!("Decode of {} finished off-screen", event.target);
            }
        }
        changed
    }

    #[must_use]
    pub fn is_cached(&self, target: ObjectRef) -> bool {
        self.decoder.cached(target).is_some()
    }

    /// Abandon pending decodes; the view itself stays usable
    pub fn close(&mut self) {
        self.decoder.close();
        self.state.stream_panel_visible = false;
        self.displayed = None;
    }
}

fn stream_of(node: &StructureNode) -> Option<(ObjectRef, StreamContent)> {
    if !node.is_parseable() {
        return None;
    }
    Some((node.reference()?, node.stream_content()?))
}
