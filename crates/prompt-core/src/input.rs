use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Escape,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.meta)
    }

    /// Modifiers that turn a keystroke into a shortcut rather than typing.
    pub fn has_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    /// An IME composition is in progress.
    pub composing: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            composing: false,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c))
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn composing(mut self) -> Self {
        self.composing = true;
        self
    }

    /// The typed char for a plain printable keystroke.
    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(c) if !self.modifiers.has_command() && !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// What the host should do with the platform's default handling of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key was consumed; skip the default.
    Handled,
    /// Let the platform apply its default editing.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty keystroke")]
    Empty,
    #[error("unknown key: {0}")]
    UnknownKey(String),
    #[error("unknown modifier: {0}")]
    UnknownModifier(String),
}

/// Parses keystrokes written like `"shift-enter"`, `"ctrl-a"`, `"up"` or `"@"`.
impl FromStr for KeyInput {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(KeyParseError::Empty);
        }
        // A lone "-" is the minus key, not a separator.
        let (mods, key) = match s.rfind('-') {
            Some(ix) if ix + 1 < s.len() => (&s[..ix], &s[ix + 1..]),
            _ => ("", s),
        };

        let key = match key {
            "enter" => Key::Enter,
            "backspace" => Key::Backspace,
            "escape" => Key::Escape,
            "tab" => Key::Tab,
            "up" => Key::ArrowUp,
            "down" => Key::ArrowDown,
            "left" => Key::ArrowLeft,
            "right" => Key::ArrowRight,
            "space" => Key::Char(' '),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(KeyParseError::UnknownKey(other.to_string())),
                }
            }
        };

        let mut input = KeyInput::new(key);
        for modifier in mods.split('-').filter(|m| !m.is_empty()) {
            match modifier {
                "shift" => input.modifiers.shift = true,
                "ctrl" => input.modifiers.ctrl = true,
                "alt" => input.modifiers.alt = true,
                "cmd" | "meta" => input.modifiers.meta = true,
                other => return Err(KeyParseError::UnknownModifier(other.to_string())),
            }
        }
        Ok(input)
    }
}
