use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Events a map emits, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    /// Style and initial sources are ready
    Load,
    /// A source finished (or progressed) loading
    SourceData {
        source_id: String,
        is_source_loaded: bool,
    },
    /// Rendering settled after a change
    Idle,
    /// Click at a container pixel
    Click { point: Point },
    /// Pointer moved over the canvas
    PointerMove { point: Point },
    /// Pointer left the canvas
    PointerLeave,
    /// Container resized
    Resize { size: Point },
}

impl MapEvent {
    /// Container pixel of pointer events
    pub fn point(&self) -> Option<Point> {
        match self {
            MapEvent::Click { point } | MapEvent::PointerMove { point } => Some(*point),
            _ => None,
        }
    }

    /// Events after which the style may differ from what the legend last saw.
    /// Partial source loads do not count.
    pub fn signals_style_change(&self) -> bool {
        match self {
            MapEvent::Load | MapEvent::Idle => true,
            MapEvent::SourceData {
                is_source_loaded, ..
            } => *is_source_loaded,
            _ => false,
        }
    }

    pub fn is_pointer_event(&self) -> bool {
        matches!(
            self,
            MapEvent::Click { .. } | MapEvent::PointerMove { .. } | MapEvent::PointerLeave
        )
    }
}
