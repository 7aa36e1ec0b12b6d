use snafu::{ResultExt, Snafu};
use solva_bot::{ProviderConfig, create_provider};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::chat::{
    ChatWidget, Message, Presentation, QUICK_REPLIES_TITLE, ReplyScheduler, Sender,
    SubmitOutcome, TYPING_LABEL, TokioScheduler, TransitionRejection, WidgetEvent, WindowState,
};
use crate::settings::{BusyPolicy, SettingsStore, WidgetSettings};

pub const USER_LABEL: &str = "Vous";

pub const HELP_TEXT: &str = "\
Commandes :
  /open            ouvrir la fenêtre de discussion
  /close           fermer la fenêtre
  /toggle          bouton de discussion (ouvrir/fermer)
  /min             réduire ou restaurer la fenêtre
  /quick N         question rapide N (1-4)
  /delay MS        délai de réponse simulé en millisecondes
  /policy P        reject ou queue pendant qu'une réponse est en cours
  /contact         lien WhatsApp
  /help            cette aide
  /quit            quitter
Tout autre texte est envoyé à l'assistant.
";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum HostError {
    #[snafu(display("failed to read from stdin on `{stage}`: {source}"))]
    ReadStdin {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to write to stdout on `{stage}`: {source}"))]
    WriteStdout {
        stage: &'static str,
        source: std::io::Error,
    },
}

pub type HostResult<T> = Result<T, HostError>;

/// One parsed line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Open,
    Close,
    Toggle,
    Minimize,
    /// Zero-based quick reply index.
    Quick(usize),
    Delay(u64),
    Policy(BusyPolicy),
    Contact,
    Help,
    Quit,
    Say(String),
    Invalid(String),
}

impl HostCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (command, ""),
        };

        match (name, argument) {
            ("open", "") => Self::Open,
            ("close", "") => Self::Close,
            ("toggle", "") => Self::Toggle,
            ("min", "") => Self::Minimize,
            ("contact", "") => Self::Contact,
            ("help", "") => Self::Help,
            ("quit", "") => Self::Quit,
            ("quick", raw) => match raw.parse::<usize>() {
                Ok(number) if number >= 1 => Self::Quick(number - 1),
                _ => Self::Invalid(trimmed.to_string()),
            },
            ("delay", raw) => raw
                .parse::<u64>()
                .map(Self::Delay)
                .unwrap_or_else(|_| Self::Invalid(trimmed.to_string())),
            ("policy", raw) => BusyPolicy::parse(raw)
                .map(Self::Policy)
                .unwrap_or_else(|| Self::Invalid(trimmed.to_string())),
            _ => Self::Invalid(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn format_message(message: &Message, assistant_name: &str) -> String {
    let author = match message.sender {
        Sender::User => USER_LABEL,
        Sender::Bot => assistant_name,
    };
    format!("[{}] {}: {}", message.display_time(), author, message.text)
}

/// Full redraw of the visible widget.
pub fn render_presentation(view: &Presentation<'_>) -> String {
    let Some(header) = view.header else {
        return "(discussion fermée)\n".to_string();
    };

    let mut out = format!("== {header} ==\n");
    if view.window == WindowState::Minimized {
        out.push_str("(réduit)\n");
        return out;
    }

    for message in view.messages {
        out.push_str(&format_message(message, header));
        out.push('\n');
    }
    if view.typing_indicator {
        out.push_str(&format!("... {TYPING_LABEL}\n"));
    }
    if !view.quick_replies.is_empty() {
        out.push_str(QUICK_REPLIES_TITLE);
        out.push('\n');
        for (index, label) in view.quick_replies.iter().enumerate() {
            out.push_str(&format!("  /quick {} -> {}\n", index + 1, label));
        }
    }
    if let Some(placeholder) = view.input_placeholder {
        out.push_str(&format!("> {placeholder}\n"));
    }
    out
}

/// Incremental rendering for a batch of widget events.
pub fn render_events<S: ReplyScheduler>(widget: &ChatWidget<S>, events: &[WidgetEvent]) -> String {
    if events
        .iter()
        .any(|event| matches!(event, WidgetEvent::WindowChanged(_)))
    {
        return render_presentation(&widget.presentation());
    }

    let view = widget.presentation();
    let Some(header) = view.header else {
        return String::new();
    };
    if view.input_placeholder.is_none() {
        return String::new();
    }

    let mut out = String::new();
    for event in events {
        match event {
            WidgetEvent::MessageAppended(id) => {
                if let Some(message) = view.messages.iter().find(|message| message.id == *id) {
                    out.push_str(&format_message(message, header));
                    out.push('\n');
                }
            }
            WidgetEvent::TypingChanged(true) => {
                out.push_str(&format!("... {TYPING_LABEL}\n"));
            }
            WidgetEvent::TypingChanged(false)
            | WidgetEvent::WindowChanged(_)
            | WidgetEvent::ReplyCancelled(_) => {}
        }
    }
    out
}

fn describe_outcome(outcome: &SubmitOutcome) -> Option<String> {
    match outcome {
        SubmitOutcome::Sent { .. } | SubmitOutcome::Rejected(TransitionRejection::BlankInput) => {
            None
        }
        SubmitOutcome::Queued { position } => Some(format!("(message en attente : {position})")),
        SubmitOutcome::Rejected(TransitionRejection::AlreadyTyping { .. }) => {
            Some("(une réponse est en cours, message ignoré)".to_string())
        }
        SubmitOutcome::Rejected(TransitionRejection::InputHidden(WindowState::Closed)) => {
            Some("(la discussion est fermée, tapez /open)".to_string())
        }
        SubmitOutcome::Rejected(TransitionRejection::InputHidden(_)) => {
            Some("(la discussion est réduite, tapez /min)".to_string())
        }
        SubmitOutcome::Rejected(TransitionRejection::QuickReplyUnavailable { index }) => {
            Some(format!("(question rapide {} indisponible)", index + 1))
        }
        SubmitOutcome::Rejected(rejection) => Some(format!("({rejection:?})")),
    }
}

/// Host page stand-in: routes terminal lines to the widget and prints its changes.
pub struct TerminalHost<W> {
    store: SettingsStore,
    out: W,
}

impl<W> TerminalHost<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(store: SettingsStore, out: W) -> Self {
        Self { store, out }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub async fn write(&mut self, text: &str) -> HostResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.out
            .write_all(text.as_bytes())
            .await
            .context(WriteStdoutSnafu {
                stage: "write-output",
            })?;
        self.out.flush().await.context(WriteStdoutSnafu {
            stage: "flush-output",
        })
    }

    pub async fn handle_line<S: ReplyScheduler>(
        &mut self,
        widget: &mut ChatWidget<S>,
        line: &str,
    ) -> HostResult<Flow> {
        let notice = match HostCommand::parse(line) {
            HostCommand::Open => {
                widget.open();
                None
            }
            HostCommand::Close => {
                widget.close();
                None
            }
            HostCommand::Toggle => {
                widget.toggle_open();
                None
            }
            HostCommand::Minimize => widget
                .toggle_minimized()
                .err()
                .map(|_| "(la discussion est fermée, tapez /open)".to_string()),
            HostCommand::Quick(index) => describe_outcome(&widget.quick_reply(index)),
            HostCommand::Say(text) => describe_outcome(&widget.submit_user_message(&text)),
            HostCommand::Delay(delay_ms) => {
                let mut settings = (*self.store.settings()).clone();
                settings.reply_delay_ms = delay_ms;
                Some(self.update_settings(widget, settings))
            }
            HostCommand::Policy(policy) => {
                let mut settings = (*self.store.settings()).clone();
                settings.busy_policy = policy;
                Some(self.update_settings(widget, settings))
            }
            HostCommand::Contact => Some(format!(
                "WhatsApp : {}",
                widget.settings().contact_link()
            )),
            HostCommand::Help => Some(HELP_TEXT.trim_end().to_string()),
            HostCommand::Quit => return Ok(Flow::Quit),
            HostCommand::Invalid(raw) => Some(format!("commande inconnue : {raw} (voir /help)")),
        };

        if let Some(notice) = notice {
            self.write(&format!("{notice}\n")).await?;
        }
        Ok(Flow::Continue)
    }

    pub async fn flush_events<S: ReplyScheduler>(
        &mut self,
        widget: &mut ChatWidget<S>,
    ) -> HostResult<()> {
        let events = widget.drain_events();
        if events.is_empty() {
            return Ok(());
        }
        let rendered = render_events(widget, &events);
        self.write(&rendered).await
    }

    fn update_settings<S: ReplyScheduler>(
        &mut self,
        widget: &mut ChatWidget<S>,
        settings: WidgetSettings,
    ) -> String {
        let (applied, saved) = match self.store.update(settings.clone()) {
            Ok(updated) => ((*updated).clone(), true),
            Err(error) => {
                tracing::warn!("keeping unsaved settings for this session: {}", error);
                (settings.normalized(), false)
            }
        };

        let notice = format!(
            "(délai {} ms, politique {}{})",
            applied.reply_delay_ms,
            applied.busy_policy.name(),
            if saved { "" } else { ", non enregistré" }
        );
        widget.apply_settings(applied);
        notice
    }
}

/// Runs the interactive session until `/quit` or end of input.
pub async fn run(store: SettingsStore) -> HostResult<()> {
    let settings = store.settings();
    let provider = create_provider(ProviderConfig::new(settings.rng_seed));
    let (scheduler, mut fired) = TokioScheduler::new();
    let mut widget = ChatWidget::new(provider, scheduler, (*settings).clone());
    let mut host = TerminalHost::new(store, tokio::io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!(path = ?host.store().config_path(), "chat host started");
    host.write("Tapez /open pour discuter avec l'assistant, /help pour l'aide.\n")
        .await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.context(ReadStdinSnafu { stage: "read-stdin-line" })?;
                let Some(line) = line else {
                    break;
                };
                if host.handle_line(&mut widget, &line).await? == Flow::Quit {
                    break;
                }
            }
            Some(token) = fired.recv() => {
                widget.on_timer_fired(token);
            }
        }
        host.flush_events(&mut widget).await?;
    }

    widget.unmount();
    tracing::info!("chat host stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_free_text() {
        assert_eq!(HostCommand::parse("/open"), HostCommand::Open);
        assert_eq!(HostCommand::parse("  /min "), HostCommand::Minimize);
        assert_eq!(HostCommand::parse("/quick 2"), HostCommand::Quick(1));
        assert_eq!(HostCommand::parse("/delay 250"), HostCommand::Delay(250));
        assert_eq!(
            HostCommand::parse("/policy QUEUE"),
            HostCommand::Policy(BusyPolicy::Queue)
        );
        assert_eq!(
            HostCommand::parse("Quels sont vos tarifs ?"),
            HostCommand::Say("Quels sont vos tarifs ?".to_string())
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        for line in ["/quick 0", "/quick x", "/delay -3", "/policy later", "/dance", "/open now"] {
            assert!(
                matches!(HostCommand::parse(line), HostCommand::Invalid(_)),
                "{line}"
            );
        }
    }

    #[test]
    fn closed_presentation_renders_a_placeholder_line() {
        let view = Presentation {
            window: WindowState::Closed,
            header: None,
            messages: &[],
            typing_indicator: false,
            quick_replies: &[],
            input_placeholder: None,
        };
        assert_eq!(render_presentation(&view), "(discussion fermée)\n");
    }
}
