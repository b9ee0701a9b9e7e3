use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::input::Mods;

/// Error returned when a `keybind` trigger cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trigger `{0}`")]
pub struct TriggerParseError(pub String);

/// Non-printable keys a trigger can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Delete,
    PageUp,
    PageDown,
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,
    Function(u8),
}

impl NamedKey {
    fn parse(name: &str) -> Option<Self> {
        let key = match name {
            "arrow_up" | "up" => Self::ArrowUp,
            "arrow_down" | "down" => Self::ArrowDown,
            "arrow_left" | "left" => Self::ArrowLeft,
            "arrow_right" | "right" => Self::ArrowRight,
            "home" => Self::Home,
            "end" => Self::End,
            "delete" => Self::Delete,
            "page_up" => Self::PageUp,
            "page_down" => Self::PageDown,
            "escape" => Self::Escape,
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "backspace" => Self::Backspace,
            "space" => Self::Space,
            other => {
                let number = other.strip_prefix('f')?.parse::<u8>().ok()?;
                if !(1..=25).contains(&number) {
                    return None;
                }
                Self::Function(number)
            },
        };
        Some(key)
    }

    fn glyph(self) -> String {
        match self {
            Self::ArrowUp => "↑".into(),
            Self::ArrowDown => "↓".into(),
            Self::ArrowLeft => "←".into(),
            Self::ArrowRight => "→".into(),
            Self::Home => "↖".into(),
            Self::End => "↘".into(),
            Self::Delete => "⌦".into(),
            Self::PageUp => "⇞".into(),
            Self::PageDown => "⇟".into(),
            Self::Escape => "⎋".into(),
            Self::Enter => "↩".into(),
            Self::Tab => "⇥".into(),
            Self::Backspace => "⌫".into(),
            Self::Space => "␠".into(),
            Self::Function(number) => format!("F{number}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKey {
    Physical(NamedKey),
    Unicode(char),
    CatchAll,
}

/// Key chord a binding fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trigger {
    pub key: TriggerKey,
    pub mods: Mods,
}

impl Trigger {
    /// Menu-style rendering, e.g. `⌘⇧T`. Catch-all triggers have none.
    pub fn display(&self) -> Option<String> {
        let key = match self.key {
            TriggerKey::Physical(named) => named.glyph(),
            TriggerKey::Unicode(ch) => ch.to_uppercase().collect(),
            TriggerKey::CatchAll => return None,
        };

        let mut out = String::new();
        for (flag, glyph) in [
            (Mods::SUPER, '⌘'),
            (Mods::SHIFT, '⇧'),
            (Mods::ALT, '⌥'),
            (Mods::CTRL, '⌃'),
        ] {
            if self.mods.contains(flag) {
                out.push(glyph);
            }
        }
        out.push_str(&key);
        Some(out)
    }
}

impl FromStr for Trigger {
    type Err = TriggerParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = || TriggerParseError(raw.to_string());
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains('>') {
            return Err(err());
        }

        let mut mods = Mods::empty();
        let mut key = None;
        let mut rest = trimmed;
        while !rest.is_empty() {
            // A literal `+` key is written as a trailing `+`.
            let (part, tail) = match rest.find('+') {
                Some(0) => (&rest[..1], &rest[1..]),
                Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                None => (rest, ""),
            };
            rest = tail;

            let lower = part.to_ascii_lowercase();
            let lower = lower.strip_prefix("physical:").unwrap_or(&lower);
            match lower {
                "shift" => mods |= Mods::SHIFT,
                "ctrl" | "control" => mods |= Mods::CTRL,
                "alt" | "opt" | "option" => mods |= Mods::ALT,
                "super" | "cmd" | "command" => mods |= Mods::SUPER,
                _ if key.is_some() => return Err(err()),
                "catch_all" => key = Some(TriggerKey::CatchAll),
                name => {
                    let mut chars = name.chars();
                    key = match (chars.next(), chars.next()) {
                        (Some(ch), None) => Some(TriggerKey::Unicode(ch)),
                        _ => Some(TriggerKey::Physical(
                            NamedKey::parse(name).ok_or_else(err)?,
                        )),
                    };
                },
            }
        }

        let key = key.ok_or_else(err)?;
        Ok(Self { key, mods })
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (Mods::CTRL, "ctrl"),
            (Mods::ALT, "alt"),
            (Mods::SHIFT, "shift"),
            (Mods::SUPER, "super"),
        ] {
            if self.mods.contains(flag) {
                write!(f, "{name}+")?;
            }
        }
        match self.key {
            TriggerKey::Unicode(ch) => write!(f, "{ch}"),
            TriggerKey::CatchAll => f.write_str("catch_all"),
            TriggerKey::Physical(named) => match named {
                NamedKey::Function(n) => write!(f, "f{n}"),
                other => {
                    let name = format!("{other:?}");
                    let mut snake = String::new();
                    for (idx, ch) in name.chars().enumerate() {
                        if ch.is_ascii_uppercase() && idx > 0 {
                            snake.push('_');
                        }
                        snake.push(ch.to_ascii_lowercase());
                    }
                    f.write_str(&snake)
                },
            },
        }
    }
}

/// Split `trigger=action` taking into account that `=` may be the key.
pub(crate) fn split_keybind(value: &str) -> Option<(&str, &str)> {
    let mut prev = None;
    for (idx, ch) in value.char_indices() {
        if ch == '=' && prev.is_some_and(|p| p != '+') {
            return Some((&value[..idx], &value[idx + 1..]));
        }
        prev = Some(ch);
    }
    None
}
