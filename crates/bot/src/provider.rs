use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::intent::{Intent, IntentClassifier};
use crate::replies::ReplyBook;

pub const RULE_BASED_PROVIDER_ID: &str = "rule-based";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Fixed seed for reproducible reply selection; entropy when unset.
    pub rng_seed: Option<u64>,
}

impl ProviderConfig {
    pub fn new(rng_seed: Option<u64>) -> Self {
        Self { rng_seed }
    }
}

/// Reply produced for one user utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub intent: Intent,
    pub text: String,
}

/// Source of bot replies.
///
/// Stands where a backend request would sit; the rule-based implementation
/// answers synchronously and the caller simulates the latency.
pub trait ReplyProvider: Send {
    fn id(&self) -> &str;
    fn respond(&mut self, utterance: &str) -> Reply;
}

pub struct RuleBasedProvider<R = StdRng> {
    classifier: IntentClassifier,
    book: ReplyBook,
    rng: R,
}

impl RuleBasedProvider<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R> RuleBasedProvider<R>
where
    R: Rng + Send,
{
    pub fn with_rng(rng: R) -> Self {
        Self::with_tables(IntentClassifier::builtin(), ReplyBook::builtin(), rng)
    }

    pub fn with_tables(classifier: IntentClassifier, book: ReplyBook, rng: R) -> Self {
        Self {
            classifier,
            book,
            rng,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn book(&self) -> &ReplyBook {
        &self.book
    }
}

impl<R> ReplyProvider for RuleBasedProvider<R>
where
    R: Rng + Send,
{
    fn id(&self) -> &str {
        RULE_BASED_PROVIDER_ID
    }

    fn respond(&mut self, utterance: &str) -> Reply {
        let intent = self.classifier.classify(utterance);
        let text = self.book.select_reply(intent, &mut self.rng).to_string();
        tracing::debug!(%intent, "selected canned reply");
        Reply { intent, text }
    }
}

pub fn create_provider(config: ProviderConfig) -> Box<dyn ReplyProvider> {
    match config.rng_seed {
        Some(seed) => Box::new(RuleBasedProvider::seeded(seed)),
        None => Box::new(RuleBasedProvider::from_entropy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::KeywordRule;

    #[test]
    fn pricing_question_gets_a_pricing_reply() {
        let mut provider = RuleBasedProvider::seeded(1);
        let reply = provider.respond("Quels sont vos tarifs ?");

        assert_eq!(reply.intent, Intent::Pricing);
        assert!(
            provider
                .book()
                .candidates(Intent::Pricing)
                .contains(&reply.text)
        );
    }

    #[test]
    fn seeded_providers_answer_identically() {
        let mut left = create_provider(ProviderConfig::new(Some(99)));
        let mut right = create_provider(ProviderConfig::new(Some(99)));

        for utterance in ["bonjour", "rien", "devis", "projet", "rien", "email"] {
            assert_eq!(left.respond(utterance), right.respond(utterance));
        }
        assert_eq!(left.id(), RULE_BASED_PROVIDER_ID);
    }

    #[test]
    fn custom_tables_are_used() {
        let classifier =
            IntentClassifier::from_rules(vec![KeywordRule::new(Intent::Contact, ["appel"])])
                .expect("valid rules");
        let book = ReplyBook::from_entries(
            Intent::ALL
                .into_iter()
                .map(|intent| (intent, vec![format!("{intent}!")])),
        )
        .expect("valid book");
        let mut provider = RuleBasedProvider::with_tables(classifier, book, StdRng::seed_from_u64(0));

        let reply = provider.respond("un appel ?");
        assert_eq!(reply.intent, Intent::Contact);
        assert_eq!(reply.text, "contact!");
        assert_eq!(provider.respond("bonjour").text, "fallback!");
    }
}
