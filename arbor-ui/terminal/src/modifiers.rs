use arbor_engine::Mods;
use bitflags::bitflags;

bitflags! {
    /// Modifier mask as reported by the OS keyboard event.
    ///
    /// The low bits are device dependent and tell left and right keys
    /// apart; the high bits are the generic modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NativeModifiers: u32 {
        const LEFT_CONTROL = 0x0000_0001;
        const LEFT_SHIFT = 0x0000_0002;
        const RIGHT_SHIFT = 0x0000_0004;
        const LEFT_COMMAND = 0x0000_0008;
        const RIGHT_COMMAND = 0x0000_0010;
        const LEFT_OPTION = 0x0000_0020;
        const RIGHT_OPTION = 0x0000_0040;
        const RIGHT_CONTROL = 0x0000_2000;

        const CAPS_LOCK = 1 << 16;
        const SHIFT = 1 << 17;
        const CONTROL = 1 << 18;
        const OPTION = 1 << 19;
        const COMMAND = 1 << 20;
        const NUMERIC_PAD = 1 << 21;
        const FUNCTION = 1 << 23;
    }
}

impl NativeModifiers {
    /// Only the generic modifier bits.
    pub fn generic(self) -> Self {
        self & (Self::CAPS_LOCK
            | Self::SHIFT
            | Self::CONTROL
            | Self::OPTION
            | Self::COMMAND
            | Self::NUMERIC_PAD
            | Self::FUNCTION)
    }
}

const SIDES: [(NativeModifiers, NativeModifiers, Mods, Mods); 4] = [
    (
        NativeModifiers::SHIFT,
        NativeModifiers::RIGHT_SHIFT,
        Mods::SHIFT,
        Mods::SHIFT_RIGHT,
    ),
    (
        NativeModifiers::CONTROL,
        NativeModifiers::RIGHT_CONTROL,
        Mods::CTRL,
        Mods::CTRL_RIGHT,
    ),
    (
        NativeModifiers::OPTION,
        NativeModifiers::RIGHT_OPTION,
        Mods::ALT,
        Mods::ALT_RIGHT,
    ),
    (
        NativeModifiers::COMMAND,
        NativeModifiers::RIGHT_COMMAND,
        Mods::SUPER,
        Mods::SUPER_RIGHT,
    ),
];

/// Engine modifiers for an OS mask, keeping the right side bits.
pub fn to_engine_mods(native: NativeModifiers) -> Mods {
    let mut mods = Mods::empty();
    for (generic, right, mod_bit, right_bit) in SIDES {
        if native.contains(generic) {
            mods |= mod_bit;
        }
        if native.contains(right) {
            mods |= right_bit;
        }
    }
    if native.contains(NativeModifiers::CAPS_LOCK) {
        mods |= Mods::CAPS;
    }
    mods
}

/// OS mask for engine modifiers. The inverse of [`to_engine_mods`].
pub fn from_engine_mods(mods: Mods) -> NativeModifiers {
    let mut native = NativeModifiers::empty();
    for (generic, right, mod_bit, right_bit) in SIDES {
        if mods.contains(mod_bit) {
            native |= generic;
        }
        if mods.contains(right_bit) {
            native |= right;
        }
    }
    if mods.contains(Mods::CAPS) {
        native |= NativeModifiers::CAPS_LOCK;
    }
    native
}

/// Engine modifier a modifier key toggles, and the device bit that marks
/// a right side press.
pub(crate) fn modifier_key(
    keycode: u16,
) -> Option<(Mods, Option<NativeModifiers>)> {
    let key = match keycode {
        0x39 => (Mods::CAPS, None),
        0x38 => (Mods::SHIFT, None),
        0x3C => (Mods::SHIFT, Some(NativeModifiers::RIGHT_SHIFT)),
        0x3B => (Mods::CTRL, None),
        0x3E => (Mods::CTRL, Some(NativeModifiers::RIGHT_CONTROL)),
        0x3A => (Mods::ALT, None),
        0x3D => (Mods::ALT, Some(NativeModifiers::RIGHT_OPTION)),
        0x37 => (Mods::SUPER, None),
        0x36 => (Mods::SUPER, Some(NativeModifiers::RIGHT_COMMAND)),
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_right_command_when_translating_then_side_is_kept() {
        let native = NativeModifiers::COMMAND
            | NativeModifiers::RIGHT_COMMAND
            | NativeModifiers::SHIFT
            | NativeModifiers::LEFT_SHIFT;

        let mods = to_engine_mods(native);

        assert_eq!(mods, Mods::SUPER | Mods::SUPER_RIGHT | Mods::SHIFT);
        assert_eq!(mods.generic(), Mods::SUPER | Mods::SHIFT);
    }

    #[test]
    fn given_engine_mods_when_converting_back_then_generic_and_side_bits_match()
    {
        let mods = Mods::CTRL | Mods::CTRL_RIGHT | Mods::ALT | Mods::CAPS;

        let native = from_engine_mods(mods);

        assert_eq!(
            native,
            NativeModifiers::CONTROL
                | NativeModifiers::RIGHT_CONTROL
                | NativeModifiers::OPTION
                | NativeModifiers::CAPS_LOCK
        );
        assert_eq!(to_engine_mods(native), mods);
    }

    #[test]
    fn given_non_modifier_keycode_when_looking_up_then_none() {
        assert_eq!(modifier_key(0x00), None);
        assert_eq!(
            modifier_key(0x36),
            Some((Mods::SUPER, Some(NativeModifiers::RIGHT_COMMAND)))
        );
    }
}
