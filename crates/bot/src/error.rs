use snafu::Snafu;

use crate::intent::Intent;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BotError {
    #[snafu(display("keyword rule for '{intent}' has no keywords"))]
    EmptyKeywordSet { stage: &'static str, intent: Intent },
    #[snafu(display("keyword rule for '{intent}' contains a blank keyword"))]
    BlankKeyword { stage: &'static str, intent: Intent },
    #[snafu(display("keyword rule for '{intent}' is declared more than once"))]
    DuplicateRule { stage: &'static str, intent: Intent },
    #[snafu(display("the fallback bucket cannot own keywords, it is the default on `{stage}`"))]
    FallbackRule { stage: &'static str },
    #[snafu(display("reply pool for '{intent}' is missing"))]
    MissingReplyPool { stage: &'static str, intent: Intent },
    #[snafu(display("reply pool for '{intent}' has no candidates"))]
    EmptyReplyPool { stage: &'static str, intent: Intent },
}

pub type BotResult<T> = Result<T, BotError>;
