#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        pointer_id: u32,
        button: PointerButton,
        x: f32,
    },
    Move {
        pointer_id: u32,
        x: f32,
    },
    Up {
        pointer_id: u32,
    },
    Cancel {
        pointer_id: u32,
    },
    Leave {
        pointer_id: u32,
    },
}

/// The scrollable element the diagram lives in.
pub trait Viewport {
    fn scroll_left(&self) -> f32;
    fn set_scroll_left(&mut self, value: f32);
    fn capture_pointer(&mut self, pointer_id: u32);
    fn release_pointer(&mut self, pointer_id: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanState {
    #[default]
    Idle,
    Panning {
        pointer_id: u32,
        start_x: f32,
        start_scroll_left: f32,
    },
}

/// Drag-to-pan over the horizontal scroll position. Hosts forward a changed
/// scroll as [`crate::scheduler::Trigger::Scroll`].
#[derive(Debug, Clone, Default)]
pub struct PanController {
    state: PanState,
}

impl PanController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanState {
        self.state
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, PanState::Panning { .. })
    }

    /// Feeds one pointer event. Returns `true` when the viewport scrolled.
    pub fn handle<V: Viewport + ?Sized>(&mut self, event: PointerEvent, viewport: &mut V) -> bool {
        match (self.state, event) {
            (
                PanState::Idle,
                PointerEvent::Down {
                    pointer_id,
                    button: PointerButton::Primary,
                    x,
                },
            ) => {
                self.state = PanState::Panning {
                    pointer_id,
                    start_x: x,
                    start_scroll_left: viewport.scroll_left(),
                };
                viewport.capture_pointer(pointer_id);
                false
            }
            (
                PanState::Panning {
                    pointer_id,
                    start_x,
                    start_scroll_left,
                },
                PointerEvent::Move { pointer_id: moved, x },
            ) if moved == pointer_id => {
                let next = start_scroll_left - (x - start_x);
                if next == viewport.scroll_left() {
                    return false;
                }
                viewport.set_scroll_left(next);
                true
            }
            (
                PanState::Panning { pointer_id, .. },
                PointerEvent::Up { pointer_id: ended }
                | PointerEvent::Cancel { pointer_id: ended }
                | PointerEvent::Leave { pointer_id: ended },
            ) if ended == pointer_id => {
                self.state = PanState::Idle;
                viewport.release_pointer(pointer_id);
                false
            }
            _ => false,
        }
    }
}
