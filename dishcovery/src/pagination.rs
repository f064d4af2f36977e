use serde::Serialize;

use crate::model::SearchCriteria;

/// The slice of the matching set a response covers
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    #[serde(rename = "from")]
    pub offset: u32,
    pub size: u32,
}

impl Window {
    /// Offset of the page after this one, if anything is left
    pub fn next_offset(&self, total: u64) -> Option<u32> {
        let end = self.offset.checked_add(self.size)?;
        if self.size > 0 && u64::from(end) < total {
            Some(end)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// First page of a filter set: hits, facets and window
    Full,
    /// Further scrolling over the same filter set: hits and window only
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub window: Window,
    pub shape: ResponseShape,
}

pub fn paginate(criteria: &SearchCriteria) -> Page {
    Page {
        window: Window {
            offset: criteria.offset,
            size: criteria.size,
        },
        shape: if criteria.is_append() {
            ResponseShape::Append
        } else {
            ResponseShape::Full
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_follows_append_mode() {
        let criteria = SearchCriteria {
            offset: 20,
            size: 10,
            ..SearchCriteria::default()
        };

        assert_eq!(
            Page {
                window: Window {
                    offset: 20,
                    size: 10
                },
                shape: ResponseShape::Full,
            },
            paginate(&criteria)
        );
        assert_eq!(
            ResponseShape::Append,
            paginate(&criteria.appending(true)).shape
        );
    }

    #[test]
    fn next_offset() {
        let window = Window {
            offset: 20,
            size: 10,
        };

        assert_eq!(Some(30), window.next_offset(31));
        assert_eq!(None, window.next_offset(30));
        assert_eq!(None, window.next_offset(0));
        assert_eq!(
            None,
            Window {
                offset: 0,
                size: 0
            }
            .next_offset(100)
        );
        assert_eq!(
            None,
            Window {
                offset: u32::MAX,
                size: 1
            }
            .next_offset(u64::MAX)
        );
    }
}
