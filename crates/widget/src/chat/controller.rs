use std::collections::VecDeque;
use std::time::Duration;

use chrono::Local;
use solva_bot::ReplyProvider;

use crate::chat::events::{SubmitOutcome, TimerOutcome, WidgetEvent};
use crate::chat::message::{
    ConversationState, ExchangeId, Message, MessageId, OpenOutcome, TransitionRejection,
    TransitionResult, WindowState,
};
use crate::chat::presentation::{Presentation, QUICK_REPLIES};
use crate::chat::scheduler::{ReplyScheduler, TimerToken};
use crate::settings::{BusyPolicy, WidgetSettings};

/// Coordinator-level metadata for the exchange awaiting its reply.
#[derive(Debug, Clone)]
struct PendingReply {
    exchange: ExchangeId,
    token: TimerToken,
    utterance: String,
}

/// Chat widget instance: conversation state plus the reply pipeline.
///
/// Owned by exactly one host; mounting is `new`, unmounting is `unmount` or drop,
/// both of which cancel the pending reply timer.
pub struct ChatWidget<S: ReplyScheduler> {
    state: ConversationState,
    provider: Box<dyn ReplyProvider>,
    scheduler: S,
    settings: WidgetSettings,
    pending: Option<PendingReply>,
    queued: VecDeque<String>,
    events: Vec<WidgetEvent>,
    next_message_id: u64,
    next_exchange_id: u64,
}

impl<S: ReplyScheduler> ChatWidget<S> {
    pub fn new(provider: Box<dyn ReplyProvider>, scheduler: S, settings: WidgetSettings) -> Self {
        tracing::debug!(provider = provider.id(), "mounted chat widget");
        Self {
            state: ConversationState::new(),
            provider,
            scheduler,
            settings: settings.normalized(),
            pending: None,
            queued: VecDeque::new(),
            events: Vec::new(),
            next_message_id: 0,
            next_exchange_id: 0,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn is_typing(&self) -> bool {
        self.state.is_typing()
    }

    pub fn window(&self) -> WindowState {
        self.state.window()
    }

    pub fn settings(&self) -> &WidgetSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Applies new settings; a pending reply keeps the delay it was scheduled with.
    pub fn apply_settings(&mut self, settings: WidgetSettings) {
        self.settings = settings.normalized();
        if self.settings.busy_policy == BusyPolicy::Reject && !self.queued.is_empty() {
            tracing::debug!(dropped = self.queued.len(), "dropping queued submissions");
            self.queued.clear();
        }
    }

    pub fn drain_events(&mut self) -> Vec<WidgetEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn presentation(&self) -> Presentation<'_> {
        Presentation::build(
            self.state.window(),
            &self.settings.assistant_name,
            self.state.messages(),
            self.state.is_typing(),
            self.offers_quick_replies(),
        )
    }

    pub fn offers_quick_replies(&self) -> bool {
        self.state.window().shows_body() && !self.state.has_user_messages()
    }

    pub fn open(&mut self) -> OpenOutcome {
        let greeting_id = MessageId::new(self.next_message_id + 1);
        let greeting_text = self.settings.greeting.clone();
        let outcome = self
            .state
            .apply_open(|| Message::bot(greeting_id, greeting_text, Local::now()));

        match outcome {
            OpenOutcome::AlreadyOpen => return outcome,
            OpenOutcome::Seeded => {
                self.next_message_id = greeting_id.0;
                self.events.push(WidgetEvent::MessageAppended(greeting_id));
            }
            OpenOutcome::Reopened | OpenOutcome::Restored => {}
        }

        tracing::info!(?outcome, "chat window opened");
        self.events
            .push(WidgetEvent::WindowChanged(self.state.window()));
        outcome
    }

    pub fn close(&mut self) {
        if self.state.window() == WindowState::Closed {
            return;
        }

        let cancelled = self.state.apply_close();
        self.cancel_pending(cancelled);
        tracing::info!("chat window closed");
        self.events.push(WidgetEvent::WindowChanged(WindowState::Closed));
    }

    /// Launcher button behaviour: open when closed, close otherwise.
    pub fn toggle_open(&mut self) {
        if self.state.window() == WindowState::Closed {
            self.open();
        } else {
            self.close();
        }
    }

    pub fn toggle_minimized(&mut self) -> TransitionResult<WindowState> {
        let window = self.state.apply_toggle_minimized()?;
        tracing::debug!(?window, "chat window minimize toggled");
        self.events.push(WidgetEvent::WindowChanged(window));
        Ok(window)
    }

    /// Submits user text through the same path typed input and quick replies share.
    pub fn submit_user_message(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            tracing::trace!("ignoring blank submission");
            return SubmitOutcome::Rejected(TransitionRejection::BlankInput);
        }

        let window = self.state.window();
        if !window.shows_body() {
            return SubmitOutcome::Rejected(TransitionRejection::InputHidden(window));
        }

        if let Some(pending) = &self.pending {
            return match self.settings.busy_policy {
                BusyPolicy::Reject => {
                    tracing::debug!("rejecting submission while a reply is pending");
                    SubmitOutcome::Rejected(TransitionRejection::AlreadyTyping {
                        active: pending.exchange,
                    })
                }
                BusyPolicy::Queue => {
                    self.queued.push_back(text.to_string());
                    tracing::debug!(position = self.queued.len(), "queued submission");
                    SubmitOutcome::Queued {
                        position: self.queued.len(),
                    }
                }
            };
        }

        self.start_exchange(text.to_string())
    }

    /// Clicks one of the shortcut labels.
    pub fn quick_reply(&mut self, index: usize) -> SubmitOutcome {
        match QUICK_REPLIES.get(index) {
            Some(label) if self.offers_quick_replies() => self.submit_user_message(label),
            _ => SubmitOutcome::Rejected(TransitionRejection::QuickReplyUnavailable { index }),
        }
    }

    /// Delivers a fired timer; only the pending exchange's token produces a reply.
    pub fn on_timer_fired(&mut self, token: TimerToken) -> TimerOutcome {
        let pending = match self.pending.take() {
            Some(pending) if pending.token == token => pending,
            other => {
                self.pending = other;
                tracing::debug!(?token, "ignoring stale reply timer");
                return TimerOutcome::Stale;
            }
        };

        let reply = self.provider.respond(&pending.utterance);
        let message_id = self.allocate_message_id();
        let message = Message::bot(message_id, reply.text, Local::now());

        if let Err(rejection) = self.state.apply_reply_resolved(pending.exchange, message) {
            tracing::debug!(?rejection, "reply no longer applicable");
            return TimerOutcome::Stale;
        }

        tracing::debug!(intent = %reply.intent, "bot reply appended");
        self.events.push(WidgetEvent::MessageAppended(message_id));
        self.events.push(WidgetEvent::TypingChanged(false));

        if let Some(next) = self.queued.pop_front() {
            self.start_exchange(next);
        }

        TimerOutcome::ReplyAppended {
            message_id,
            intent: reply.intent,
        }
    }

    /// Tears the widget down, cancelling any pending reply.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn start_exchange(&mut self, text: String) -> SubmitOutcome {
        self.next_exchange_id += 1;
        let exchange = ExchangeId::new(self.next_exchange_id);
        let message_id = MessageId::new(self.next_message_id + 1);
        let message = Message::user(message_id, text.clone(), Local::now());

        if let Err(rejection) = self.state.apply_submit(exchange, message) {
            return SubmitOutcome::Rejected(rejection);
        }
        self.next_message_id = message_id.0;

        let token = self.scheduler.schedule(self.reply_delay());
        self.pending = Some(PendingReply {
            exchange,
            token,
            utterance: text,
        });

        tracing::debug!(?exchange, ?token, "user message appended, awaiting reply");
        self.events.push(WidgetEvent::MessageAppended(message_id));
        self.events.push(WidgetEvent::TypingChanged(true));
        SubmitOutcome::Sent {
            message_id,
            exchange,
        }
    }

    fn cancel_pending(&mut self, cancelled: Option<ExchangeId>) {
        if let Some(pending) = self.pending.take() {
            self.scheduler.cancel(pending.token);
            tracing::debug!(exchange = ?pending.exchange, "pending reply cancelled");
            self.events.push(WidgetEvent::ReplyCancelled(pending.exchange));
            self.events.push(WidgetEvent::TypingChanged(false));
        } else if let Some(exchange) = cancelled {
            self.events.push(WidgetEvent::ReplyCancelled(exchange));
        }
        self.queued.clear();
    }

    fn teardown(&mut self) {
        self.cancel_pending(None);
    }

    fn reply_delay(&self) -> Duration {
        self.settings.reply_delay()
    }

    fn allocate_message_id(&mut self) -> MessageId {
        self.next_message_id += 1;
        MessageId::new(self.next_message_id)
    }
}

impl<S: ReplyScheduler> Drop for ChatWidget<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
