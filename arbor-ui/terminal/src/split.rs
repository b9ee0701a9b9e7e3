use arbor_engine::action::{GotoSplit, ResizeDirection, SplitDirection};

/// Direction a new split opens towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewSplitDirection {
    Left,
    Right,
    Top,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    Previous,
    Next,
    Left,
    Right,
    Top,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeSplitDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Split request decoded from the engine's raw direction codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAction {
    NewSplit(NewSplitDirection),
    GotoSplit(FocusDirection),
    ResizeSplit {
        direction: ResizeSplitDirection,
        amount: u16,
    },
    EqualizeSplits,
    ToggleSplitZoom,
}

impl SplitAction {
    pub(crate) fn new_split(direction: SplitDirection) -> Option<Self> {
        let direction = match direction {
            SplitDirection::RIGHT => NewSplitDirection::Right,
            SplitDirection::DOWN => NewSplitDirection::Down,
            SplitDirection::LEFT => NewSplitDirection::Left,
            SplitDirection::UP => NewSplitDirection::Top,
            _ => return None,
        };
        Some(Self::NewSplit(direction))
    }

    pub(crate) fn goto_split(direction: GotoSplit) -> Option<Self> {
        let direction = match direction {
            GotoSplit::PREVIOUS => FocusDirection::Previous,
            GotoSplit::NEXT => FocusDirection::Next,
            GotoSplit::UP => FocusDirection::Top,
            GotoSplit::LEFT => FocusDirection::Left,
            GotoSplit::DOWN => FocusDirection::Down,
            GotoSplit::RIGHT => FocusDirection::Right,
            _ => return None,
        };
        Some(Self::GotoSplit(direction))
    }

    pub(crate) fn resize_split(
        direction: ResizeDirection,
        amount: u16,
    ) -> Option<Self> {
        let direction = match direction {
            ResizeDirection::UP => ResizeSplitDirection::Up,
            ResizeDirection::DOWN => ResizeSplitDirection::Down,
            ResizeDirection::LEFT => ResizeSplitDirection::Left,
            ResizeDirection::RIGHT => ResizeSplitDirection::Right,
            _ => return None,
        };
        Some(Self::ResizeSplit { direction, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_known_codes_when_decoding_then_directions_match() {
        assert_eq!(
            SplitAction::new_split(SplitDirection::UP),
            Some(SplitAction::NewSplit(NewSplitDirection::Top))
        );
        assert_eq!(
            SplitAction::goto_split(GotoSplit::PREVIOUS),
            Some(SplitAction::GotoSplit(FocusDirection::Previous))
        );
        assert_eq!(
            SplitAction::resize_split(ResizeDirection::LEFT, 10),
            Some(SplitAction::ResizeSplit {
                direction: ResizeSplitDirection::Left,
                amount: 10,
            })
        );
    }

    #[test]
    fn given_unknown_codes_when_decoding_then_nothing_is_produced() {
        assert_eq!(SplitAction::new_split(SplitDirection(9)), None);
        assert_eq!(SplitAction::goto_split(GotoSplit(6)), None);
        assert_eq!(SplitAction::resize_split(ResizeDirection(4), 1), None);
    }
}
