// gesture.rs: mouse / touch input normalised into drag deltas

use glam::{IVec2, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Raw pointer input from the host surface, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerInput {
    MouseDown { x: i32, y: i32 },
    MouseMove { x: i32, y: i32 },
    MouseUp,
    /// Pointer left the interactive surface.
    Leave,
    Touch {
        id: u64,
        phase: TouchPhase,
        x: i32,
        y: i32,
    },
}

/// What a pointer input meant for the drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Began,
    Moved(Vec2),
    Ended,
    /// Out-of-order or secondary input; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch(u64),
}

/// A drag in progress. Exists only between press and release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub source: PointerSource,
    pub last_pointer: IVec2,
}

#[derive(Debug, Default)]
pub struct GestureMapper {
    session: Option<DragSession>,
}

impl GestureMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Starts a mouse drag at `(x, y)`.
    pub fn begin(&mut self, x: i32, y: i32) {
        self.begin_from(PointerSource::Mouse, IVec2::new(x, y));
    }

    /// Returns the movement since the last pointer position, or `None`
    /// when no drag is active.
    pub fn update(&mut self, x: i32, y: i32) -> Option<Vec2> {
        let session = self.session.as_mut()?;
        let pos = IVec2::new(x, y);
        let delta = (pos - session.last_pointer).as_vec2();
        session.last_pointer = pos;
        Some(delta)
    }

    pub fn end(&mut self) {
        self.session = None;
    }

    /// Routes one raw input through the drag lifecycle.
    ///
    /// Only the first touch point drives the drag; additional fingers are
    /// ignored so a pinch never turns into a rotation.
    pub fn handle(&mut self, input: PointerInput) -> Gesture {
        match input {
            PointerInput::MouseDown { x, y } => match self.source() {
                Some(PointerSource::Touch(_)) => Gesture::Ignored,
                _ => {
                    self.begin(x, y);
                    Gesture::Began
                }
            },
            PointerInput::MouseMove { x, y } => {
                if self.source() != Some(PointerSource::Mouse) {
                    return Gesture::Ignored;
                }
                self.moved(x, y)
            }
            PointerInput::MouseUp => {
                if self.source() != Some(PointerSource::Mouse) {
                    return Gesture::Ignored;
                }
                self.end();
                Gesture::Ended
            }
            PointerInput::Leave => {
                if self.session.is_none() {
                    return Gesture::Ignored;
                }
                self.end();
                Gesture::Ended
            }
            PointerInput::Touch { id, phase, x, y } => self.touch(id, phase, x, y),
        }
    }

    fn touch(&mut self, id: u64, phase: TouchPhase, x: i32, y: i32) -> Gesture {
        let tracked = self.source() == Some(PointerSource::Touch(id));
        match phase {
            TouchPhase::Started if self.session.is_none() => {
                self.begin_from(PointerSource::Touch(id), IVec2::new(x, y));
                Gesture::Began
            }
            TouchPhase::Moved if tracked => self.moved(x, y),
            TouchPhase::Ended | TouchPhase::Cancelled if tracked => {
                self.end();
                Gesture::Ended
            }
            _ => Gesture::Ignored,
        }
    }

    fn moved(&mut self, x: i32, y: i32) -> Gesture {
        match self.update(x, y) {
            Some(delta) => Gesture::Moved(delta),
            None => Gesture::Ignored,
        }
    }

    fn begin_from(&mut self, source: PointerSource, pos: IVec2) {
        self.session = Some(DragSession {
            source,
            last_pointer: pos,
        });
    }

    fn source(&self) -> Option<PointerSource> {
        self.session.map(|s| s.source)
    }
}
