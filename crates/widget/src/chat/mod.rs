pub mod controller;
/// Change notifications and operation outcomes.
pub mod events;
/// Domain entities and pure conversation transitions.
pub mod message;
pub mod presentation;
pub mod scheduler;

pub use controller::ChatWidget;
pub use events::{SubmitOutcome, TimerOutcome, WidgetEvent};
pub use message::{
    ConversationState, ExchangeId, Message, MessageId, OpenOutcome, Sender, TransitionRejection,
    TransitionResult, TypingState, WindowState,
};
pub use presentation::{
    INPUT_PLACEHOLDER, Presentation, QUICK_REPLIES, QUICK_REPLIES_TITLE, TYPING_LABEL,
};
pub use scheduler::{ManualScheduler, ReplyScheduler, TimerToken, TokioScheduler};
