#![deny(unsafe_code)]

//! Rule-based reply engine for the SolvaticaTech chat assistant.
//!
//! Utterances are mapped to a topic bucket by keyword containment, then answered
//! with one of the bucket's canned replies.

pub mod error;
pub mod intent;
pub mod provider;
pub mod replies;

pub use error::{BotError, BotResult};
pub use intent::{Intent, IntentClassifier, KeywordRule, builtin_classifier, classify};
pub use provider::{
    ProviderConfig, RULE_BASED_PROVIDER_ID, Reply, ReplyProvider, RuleBasedProvider,
    create_provider,
};
pub use replies::ReplyBook;
