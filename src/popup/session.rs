use crate::map::engine::{MapEngine, PopupHandle, PopupSpec};

/// Generation number handed out per click
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClickTicket(u64);

/// Owner of the one popup the map may show.
///
/// Clicks take a ticket before any await; only the holder of the newest
/// ticket may open a popup, and opening always removes the previous handle
/// first.
#[derive(Debug, Default)]
pub struct PopupSession {
    handle: Option<PopupHandle>,
    generation: u64,
}

impl PopupSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a click, superseding every earlier one
    pub fn begin_click(&mut self) -> ClickTicket {
        self.generation += 1;
        ClickTicket(self.generation)
    }

    pub fn is_current(&self, ticket: ClickTicket) -> bool {
        ticket.0 == self.generation
    }

    pub fn open<M: MapEngine + ?Sized>(&mut self, map: &mut M, spec: PopupSpec) -> PopupHandle {
        self.close(map);
        let handle = map.add_popup(spec);
        self.handle = Some(handle);
        handle
    }

    pub fn close<M: MapEngine + ?Sized>(&mut self, map: &mut M) {
        if let Some(handle) = self.handle.take() {
            map.remove_popup(handle);
        }
    }

    pub fn handle(&self) -> Option<PopupHandle> {
        self.handle
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::{LatLng, Point};
    use crate::map::headless::HeadlessMap;
    use crate::popup::PopupViewModel;

    fn spec(title: &str) -> PopupSpec {
        PopupSpec {
            position: LatLng::new(42.0, -93.5),
            anchor: "bottom".into(),
            offset: Point::new(0.0, -15.0),
            content: PopupViewModel {
                title: title.into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_open_replaces_previous_popup() {
        let mut map = HeadlessMap::default();
        let mut session = PopupSession::new();

        session.open(&mut map, spec("A"));
        session.open(&mut map, spec("B"));
        assert_eq!(map.popup_count(), 1);
        assert_eq!(map.open_popup().unwrap().content.title, "B");

        session.close(&mut map);
        session.close(&mut map);
        assert_eq!(map.popup_count(), 0);
        assert!(!session.is_open());
    }

    #[test]
    fn test_only_newest_ticket_is_current() {
        let mut session = PopupSession::new();
        let first = session.begin_click();
        assert!(session.is_current(first));
        let second = session.begin_click();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }
}
