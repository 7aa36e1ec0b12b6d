use crate::chat::message::{ExchangeId, MessageId, WindowState};

/// Change notification drained by the host to re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    MessageAppended(MessageId),
    TypingChanged(bool),
    WindowChanged(WindowState),
    /// A pending reply was dropped by close or unmount.
    ReplyCancelled(ExchangeId),
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// User message appended; the reply is on its way.
    Sent {
        message_id: MessageId,
        exchange: ExchangeId,
    },
    /// Waiting behind the pending reply; `position` is 1-based.
    Queued { position: usize },
    Rejected(crate::chat::message::TransitionRejection),
}

impl SubmitOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Result of delivering a fired timer to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    ReplyAppended {
        message_id: MessageId,
        intent: solva_bot::Intent,
    },
    /// Token did not belong to the pending exchange.
    Stale,
}
