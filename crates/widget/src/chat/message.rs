use chrono::{DateTime, Local};

/// Stable identifier for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifier for one user/bot exchange.
///
/// Changes on every submission so a late reply for a cancelled exchange can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(pub u64);

impl ExchangeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    User,
    Bot,
}

/// Immutable log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn new(
        id: MessageId,
        sender: Sender,
        text: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            timestamp,
        }
    }

    pub fn user(id: MessageId, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self::new(id, Sender::User, text, timestamp)
    }

    pub fn bot(id: MessageId, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self::new(id, Sender::Bot, text, timestamp)
    }

    /// Display time in `HH:MM`.
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowState {
    #[default]
    Closed,
    Open,
    Minimized,
}

impl WindowState {
    /// Input, log and quick replies are only rendered while fully open.
    pub fn shows_body(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypingState {
    #[default]
    Idle,
    AwaitingReply(ExchangeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// First open of the session; the greeting was appended.
    Seeded,
    Reopened,
    Restored,
    AlreadyOpen,
}

/// Rejection reason for illegal conversation transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRejection {
    BlankInput,
    InputHidden(WindowState),
    WindowClosed,
    AlreadyTyping {
        active: ExchangeId,
    },
    NoPendingReply,
    ExchangeMismatch {
        active: ExchangeId,
        attempted: ExchangeId,
    },
    QuickReplyUnavailable {
        index: usize,
    },
    WrongSender {
        expected: Sender,
    },
}

pub type TransitionResult<T> = Result<T, TransitionRejection>;

/// Conversation aggregate driven by pure transition functions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    typing: TypingState,
    window: WindowState,
    greeted: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn typing(&self) -> TypingState {
        self.typing
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.typing, TypingState::AwaitingReply(_))
    }

    pub fn window(&self) -> WindowState {
        self.window
    }

    pub fn is_greeted(&self) -> bool {
        self.greeted
    }

    pub fn has_user_messages(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.sender == Sender::User)
    }

    /// Shows the window; the greeting is built and appended only on the very first open.
    pub fn apply_open<F>(&mut self, greeting: F) -> OpenOutcome
    where
        F: FnOnce() -> Message,
    {
        let outcome = match self.window {
            WindowState::Open => return OpenOutcome::AlreadyOpen,
            WindowState::Minimized => OpenOutcome::Restored,
            WindowState::Closed if self.greeted => OpenOutcome::Reopened,
            WindowState::Closed => {
                self.messages.push(greeting());
                self.greeted = true;
                OpenOutcome::Seeded
            }
        };

        self.window = WindowState::Open;
        outcome
    }

    /// Appends a user message and starts awaiting the reply for `exchange`.
    pub fn apply_submit(&mut self, exchange: ExchangeId, message: Message) -> TransitionResult<()> {
        if message.sender != Sender::User {
            return Err(TransitionRejection::WrongSender {
                expected: Sender::User,
            });
        }
        if message.text.trim().is_empty() {
            return Err(TransitionRejection::BlankInput);
        }
        if self.window == WindowState::Closed {
            return Err(TransitionRejection::WindowClosed);
        }
        if let TypingState::AwaitingReply(active) = self.typing {
            return Err(TransitionRejection::AlreadyTyping { active });
        }

        self.messages.push(message);
        self.typing = TypingState::AwaitingReply(exchange);
        Ok(())
    }

    /// Appends the bot reply for the active exchange and returns to idle.
    pub fn apply_reply_resolved(
        &mut self,
        exchange: ExchangeId,
        message: Message,
    ) -> TransitionResult<()> {
        if message.sender != Sender::Bot {
            return Err(TransitionRejection::WrongSender {
                expected: Sender::Bot,
            });
        }

        match self.typing {
            TypingState::Idle => Err(TransitionRejection::NoPendingReply),
            TypingState::AwaitingReply(active) if active != exchange => {
                Err(TransitionRejection::ExchangeMismatch {
                    active,
                    attempted: exchange,
                })
            }
            TypingState::AwaitingReply(_) => {
                self.messages.push(message);
                self.typing = TypingState::Idle;
                Ok(())
            }
        }
    }

    /// Hides the window and drops the pending exchange, returning it if there was one.
    pub fn apply_close(&mut self) -> Option<ExchangeId> {
        self.window = WindowState::Closed;
        match std::mem::take(&mut self.typing) {
            TypingState::AwaitingReply(exchange) => Some(exchange),
            TypingState::Idle => None,
        }
    }

    pub fn apply_toggle_minimized(&mut self) -> TransitionResult<WindowState> {
        self.window = match self.window {
            WindowState::Closed => return Err(TransitionRejection::WindowClosed),
            WindowState::Open => WindowState::Minimized,
            WindowState::Minimized => WindowState::Open,
        };
        Ok(self.window)
    }
}
