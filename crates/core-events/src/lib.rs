//! Core notification types for the input-method action engine.
//!
//! A `Notification` is one low-level platform input event (key press,
//! composition boundary, before-input/input/text-input, selection change) or
//! the synthetic `Timeout` produced when the idle timer expires. Notifications
//! are owned values: the entry layer copies whatever it needs out of the
//! platform event before handing it over, so a buffered notification never
//! observes a recycled platform object.
//!
//! A `Burst` is the ordered run of notifications that belong to one undecided
//! user action. It is append-only until the session resolves the action.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Relaxed atomic counters shared by every session in the process. Sessions also keep per-instance
// metrics; these globals exist so an embedder can log totals without holding a session reference.
// -------------------------------------------------------------------------------------------------
pub static BURSTS_STARTED: AtomicU64 = AtomicU64::new(0);
pub static BURSTS_RESOLVED: AtomicU64 = AtomicU64::new(0);
pub static BURSTS_DISCARDED: AtomicU64 = AtomicU64::new(0);
pub static NOTIFICATIONS_BUFFERED: AtomicU64 = AtomicU64::new(0);

/// Discriminant of a platform notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    KeyDown,
    KeyUp,
    CompositionStart,
    CompositionUpdate,
    CompositionEnd,
    /// Cancelable notice that the platform is about to mutate the surface.
    BeforeInput,
    /// The platform has mutated the surface.
    Input,
    /// Legacy text insertion notice carrying the inserted string.
    TextInput,
    SelectionChange,
    /// Synthesized by the session when the idle timer expires.
    Timeout,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::KeyDown => "keydown",
            NotificationKind::KeyUp => "keyup",
            NotificationKind::CompositionStart => "compositionstart",
            NotificationKind::CompositionUpdate => "compositionupdate",
            NotificationKind::CompositionEnd => "compositionend",
            NotificationKind::BeforeInput => "beforeinput",
            NotificationKind::Input => "input",
            NotificationKind::TextInput => "textinput",
            NotificationKind::SelectionChange => "selectionchange",
            NotificationKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native input type attached to `BeforeInput` / `Input` notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputType {
    InsertText,
    InsertCompositionText,
    InsertLineBreak,
    InsertParagraph,
    DeleteContentBackward,
    DeleteContentForward,
    Other(String),
}

impl InputType {
    /// Map a platform input type name (`"deleteContentBackward"` etc.) to a variant.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "insertText" => InputType::InsertText,
            "insertCompositionText" => InputType::InsertCompositionText,
            "insertLineBreak" => InputType::InsertLineBreak,
            "insertParagraph" => InputType::InsertParagraph,
            "deleteContentBackward" => InputType::DeleteContentBackward,
            "deleteContentForward" => InputType::DeleteContentForward,
            other => InputType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InputType::InsertText => "insertText",
            InputType::InsertCompositionText => "insertCompositionText",
            InputType::InsertLineBreak => "insertLineBreak",
            InputType::InsertParagraph => "insertParagraph",
            InputType::DeleteContentBackward => "deleteContentBackward",
            InputType::DeleteContentForward => "deleteContentForward",
            InputType::Other(raw) => raw.as_str(),
        }
    }
}

/// Logical key identity for `KeyDown` / `KeyUp`. Mobile input methods report most
/// soft-keyboard presses as `Unidentified`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyName {
    Enter,
    Backspace,
    Delete,
    Unidentified,
    Char(char),
    Other(String),
}

impl KeyName {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Enter" => KeyName::Enter,
            "Backspace" => KeyName::Backspace,
            "Delete" => KeyName::Delete,
            "Unidentified" => KeyName::Unidentified,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyName::Char(c),
                    _ => KeyName::Other(other.to_string()),
                }
            }
        }
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 { const CTRL=1; const ALT=2; const SHIFT=4; const META=8; }
}

/// One low-level platform notification.
///
/// Invariants:
/// * `native` is only populated for `BeforeInput` and `Input`.
/// * `key` is only populated for `KeyDown` and `KeyUp`.
/// * `timestamp` is the instant the entry layer observed the event; the session
///   arms the idle timer relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub native: Option<InputType>,
    pub key: Option<KeyName>,
    pub mods: ModMask,
    pub data: Option<String>,
    pub timestamp: Instant,
}

impl Notification {
    /// Bare notification of `kind` stamped with the current instant.
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            native: None,
            key: None,
            mods: ModMask::empty(),
            data: None,
            timestamp: Instant::now(),
        }
    }

    pub fn key_down(key: KeyName) -> Self {
        Self {
            key: Some(key),
            ..Self::new(NotificationKind::KeyDown)
        }
    }

    pub fn key_up(key: KeyName) -> Self {
        Self {
            key: Some(key),
            ..Self::new(NotificationKind::KeyUp)
        }
    }

    pub fn composition_start() -> Self {
        Self::new(NotificationKind::CompositionStart)
    }

    pub fn composition_update(data: impl Into<String>) -> Self {
        Self::new(NotificationKind::CompositionUpdate).with_data(data)
    }

    pub fn composition_end(data: impl Into<String>) -> Self {
        Self::new(NotificationKind::CompositionEnd).with_data(data)
    }

    pub fn before_input(native: InputType, data: Option<&str>) -> Self {
        Self {
            native: Some(native),
            data: data.map(str::to_string),
            ..Self::new(NotificationKind::BeforeInput)
        }
    }

    pub fn input(native: InputType, data: Option<&str>) -> Self {
        Self {
            native: Some(native),
            data: data.map(str::to_string),
            ..Self::new(NotificationKind::Input)
        }
    }

    /// Shorthand for the `input:deleteContentBackward` notification.
    pub fn delete_backward() -> Self {
        Self::input(InputType::DeleteContentBackward, None)
    }

    pub fn text_input(data: impl Into<String>) -> Self {
        Self::new(NotificationKind::TextInput).with_data(data)
    }

    pub fn selection_change() -> Self {
        Self::new(NotificationKind::SelectionChange)
    }

    pub fn timeout() -> Self {
        Self::new(NotificationKind::Timeout)
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_mods(mut self, mods: ModMask) -> Self {
        self.mods = mods;
        self
    }

    /// Replace the observation instant (tests and drivers with their own clock).
    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is(&self, kind: NotificationKind) -> bool {
        self.kind == kind
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == NotificationKind::Timeout
    }

    /// `input` notification with the given native type.
    pub fn is_input_of(&self, native: &InputType) -> bool {
        self.kind == NotificationKind::Input && self.native.as_ref() == Some(native)
    }

    pub fn is_delete_backward(&self) -> bool {
        self.is_input_of(&InputType::DeleteContentBackward)
    }

    /// Key-down of the Enter key.
    pub fn is_enter(&self) -> bool {
        self.kind == NotificationKind::KeyDown && self.key == Some(KeyName::Enter)
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Length of the payload in chars (what logs record instead of the payload).
    pub fn data_len(&self) -> usize {
        self.data.as_deref().map_or(0, |d| d.chars().count())
    }

    /// True when the payload carries a line break, as input methods report Enter
    /// inside a `textinput` on some platform versions (`"mid\n"`).
    pub fn data_has_newline(&self) -> bool {
        self.data
            .as_deref()
            .is_some_and(|d| d.contains('\n') || d.contains('\r'))
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(native) = &self.native {
            write!(f, ":{}", native.as_str())?;
        }
        if let Some(key) = &self.key {
            write!(f, " {:?}", key)?;
        }
        if self.data.is_some() {
            write!(f, " [{} chars]", self.data_len())?;
        }
        Ok(())
    }
}

/// Ordered notifications for one in-progress action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Burst {
    notifications: Vec<Notification>,
}

impl Burst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        tracing::trace!(target: "ime.events", kind = notification.kind.as_str(), len = self.notifications.len() + 1, "burst_push");
        self.notifications.push(notification);
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.notifications.iter()
    }

    pub fn as_slice(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn first(&self) -> Option<&Notification> {
        self.notifications.first()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    pub fn find<P>(&self, mut pred: P) -> Option<&Notification>
    where
        P: FnMut(&Notification) -> bool,
    {
        self.notifications.iter().find(|n| pred(n))
    }

    pub fn count_where<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&Notification) -> bool,
    {
        self.notifications.iter().filter(|n| pred(n)).count()
    }

    pub fn contains_kind(&self, kind: NotificationKind) -> bool {
        self.notifications.iter().any(|n| n.kind == kind)
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notifications.iter().map(|n| n.kind).collect()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl<'a> IntoIterator for &'a Burst {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.notifications.iter()
    }
}
