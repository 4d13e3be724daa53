//! Scroll state of the independently scrollable regions

/// Scrollable regions of a document view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollRegion {
    /// Vertical list of pages
    PageList,
    /// Horizontal offset of the page list
    PageHorizontal,
    /// Content of the stream panel
    StreamPanel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollPosition {
    /// First visible item
    pub index: usize,
    /// Offset into that item
    pub offset: usize,
}

impl ScrollPosition {
    #[must_use]
    pub const fn new(index: usize, offset: usize) -> Self {
        Self { index, offset }
    }
}

/// Resting position plus an optional programmatic scroll the presentation
/// layer has not performed yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub resting: ScrollPosition,
    pub target: Option<ScrollPosition>,
}

impl ScrollState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.target.is_some()
    }

    pub fn request(&mut self, position: ScrollPosition) {
        self.target = Some(position);
    }

    /// Acknowledge a performed scroll; the target becomes the resting position
    pub fn finish(&mut self) -> Option<ScrollPosition> {
        let target = self.target.take()?;
        self.resting = target;
        Some(target)
    }

    /// Record the live position. Ignored while a programmatic scroll is
    /// pending so the request is not overwritten by the pre-scroll position.
    pub fn observe(&mut self, position: ScrollPosition) -> bool {
        if self.is_pending() {
            return false;
        }
        self.resting = position;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollRegions {
    page_list: ScrollState,
    page_horizontal: ScrollState,
    stream_panel: ScrollState,
}

impl ScrollRegions {
    #[must_use]
    pub fn get(&self, region: ScrollRegion) -> &ScrollState {
        match region {
            ScrollRegion::PageList => &self.page_list,
            ScrollRegion::PageHorizontal => &self.page_horizontal,
            ScrollRegion::StreamPanel => &self.stream_panel,
        }
    }

    pub fn get_mut(&mut self, region: ScrollRegion) -> &mut ScrollState {
        match region {
            ScrollRegion::PageList => &mut self.page_list,
            ScrollRegion::PageHorizontal => &mut self.page_horizontal,
            ScrollRegion::StreamPanel => &mut self.stream_panel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_persists_target() {
        let mut state = ScrollState::default();
        state.request(ScrollPosition::new(4, 12));
        assert!(state.is_pending());
        assert_eq!(state.finish(), Some(ScrollPosition::new(4, 12)));
        assert!(!state.is_pending());
        assert_eq!(state.resting, ScrollPosition::new(4, 12));
        assert_eq!(state.finish(), None);
    }

    #[test]
    fn observation_ignored_while_pending() {
        let mut state = ScrollState::default();
        assert!(state.observe(ScrollPosition::new(2, 0)));
        state.request(ScrollPosition::new(9, 0));
        assert!(!state.observe(ScrollPosition::new(3, 0)));
        assert_eq!(state.resting, ScrollPosition::new(2, 0));
    }

    #[test]
    fn regions_are_independent() {
        let mut regions = ScrollRegions::default();
        regions
            .get_mut(ScrollRegion::StreamPanel)
            .request(ScrollPosition::new(1, 1));
        assert!(regions.get(ScrollRegion::StreamPanel).is_pending());
        assert!(!regions.get(ScrollRegion::PageList).is_pending());
    }
}
