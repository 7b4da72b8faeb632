use serde::Serialize;

use crate::classify::HeadingKind;

/// Current position in the chapter / topic / subtopic hierarchy.
///
/// Indices count headings seen at each level within the enclosing scope and
/// reset to zero when an ancestor advances. Titles of deeper levels are
/// cleared whenever a shallower level advances. The state only changes
/// through [`HierarchyState::advance`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyState {
    pub chapter_index: u32,
    pub chapter_title: Option<String>,
    pub topic_index: u32,
    pub topic_title: Option<String>,
    pub subtopic_index: u32,
    pub subtopic_title: Option<String>,
}

impl HierarchyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a heading transition. Returns `false` (and changes nothing) for
    /// [`HeadingKind::None`].
    pub fn advance(&mut self, kind: HeadingKind, title: &str) -> bool {
        match kind {
            HeadingKind::Chapter => {
                self.chapter_index += 1;
                self.chapter_title = Some(title.to_string());
                self.topic_index = 0;
                self.topic_title = None;
                self.subtopic_index = 0;
                self.subtopic_title = None;
            }
            HeadingKind::Topic => {
                self.topic_index += 1;
                self.topic_title = Some(title.to_string());
                self.subtopic_index = 0;
                self.subtopic_title = None;
            }
            HeadingKind::Subtopic => {
                self.subtopic_index += 1;
                self.subtopic_title = Some(title.to_string());
            }
            HeadingKind::None => return false,
        }
        true
    }
}
