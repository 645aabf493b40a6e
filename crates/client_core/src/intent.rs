/// Discrete operator actions coming from the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Continuous control; coalesced by the debounce window.
    SliderMoved(i64),
    Increment,
    Decrement,
    Start,
    Stop,
    SetForward,
    SetReverse,
}

impl Intent {
    /// Whether the intent bypasses the debounce window and sends right away.
    pub fn is_immediate(self) -> bool {
        matches!(
            self,
            Intent::Start | Intent::Stop | Intent::SetForward | Intent::SetReverse
        )
    }
}
