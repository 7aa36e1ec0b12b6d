use crate::chat::message::{Message, WindowState};

/// Shortcut labels offered before the first user-authored message.
pub const QUICK_REPLIES: [&str; 4] = [
    "Vos services",
    "Nous contacter",
    "Voir nos projets",
    "Demander un devis",
];
pub const QUICK_REPLIES_TITLE: &str = "Questions rapides :";
pub const TYPING_LABEL: &str = "En train d'écrire...";
pub const INPUT_PLACEHOLDER: &str = "Tapez votre message...";

/// What the host should draw right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation<'a> {
    pub window: WindowState,
    /// Header title; present whenever the window is visible, minimized included.
    pub header: Option<&'a str>,
    pub messages: &'a [Message],
    pub typing_indicator: bool,
    pub quick_replies: &'a [&'static str],
    pub input_placeholder: Option<&'static str>,
}

impl<'a> Presentation<'a> {
    pub(crate) fn build(
        window: WindowState,
        assistant_name: &'a str,
        messages: &'a [Message],
        is_typing: bool,
        offers_quick_replies: bool,
    ) -> Self {
        let body = window.shows_body();
        Self {
            window,
            header: window.is_visible().then_some(assistant_name),
            messages: if body { messages } else { &[] },
            typing_indicator: body && is_typing,
            quick_replies: if body && offers_quick_replies {
                &QUICK_REPLIES
            } else {
                &[]
            },
            input_placeholder: body.then_some(INPUT_PLACEHOLDER),
        }
    }
}
