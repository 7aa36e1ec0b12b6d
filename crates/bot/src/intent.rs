use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use snafu::ensure;

use crate::error::{
    BlankKeywordSnafu, BotResult, DuplicateRuleSnafu, EmptyKeywordSetSnafu, FallbackRuleSnafu,
};

/// Topic bucket a user utterance resolves to.
///
/// Declaration order is the matching precedence; `Fallback` is never matched by
/// keywords and only catches utterances no other bucket claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intent {
    Greeting,
    Services,
    Contact,
    Pricing,
    Portfolio,
    Fallback,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::Greeting,
        Intent::Services,
        Intent::Contact,
        Intent::Pricing,
        Intent::Portfolio,
        Intent::Fallback,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Services => "services",
            Self::Contact => "contact",
            Self::Pricing => "pricing",
            Self::Portfolio => "portfolio",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Keywords owned by one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new<I, S>(intent: Intent, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            intent,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, folded_utterance: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| folded_utterance.contains(keyword.as_str()))
    }
}

const BUILTIN_RULES: [(Intent, &[&str]); 5] = [
    (Intent::Greeting, &["bonjour", "salut", "hello"]),
    (Intent::Services, &["service", "offre", "propose"]),
    (
        Intent::Contact,
        &["contact", "contacter", "email", "téléphone"],
    ),
    (Intent::Pricing, &["prix", "tarif", "devis", "coût"]),
    (Intent::Portfolio, &["portfolio", "projet", "réalisation"]),
];

/// Ordered keyword table mapping utterances to buckets.
///
/// Matching is raw substring containment on the lower-cased utterance, so a
/// keyword also fires inside longer words ("hello" inside "Othello").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentClassifier {
    rules: Vec<KeywordRule>,
}

impl IntentClassifier {
    /// Builds a classifier from rules given in precedence order.
    pub fn from_rules(rules: Vec<KeywordRule>) -> BotResult<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(rules.len());

        for rule in rules {
            ensure!(
                rule.intent != Intent::Fallback,
                FallbackRuleSnafu {
                    stage: "classifier-from-rules",
                }
            );
            ensure!(
                seen.insert(rule.intent),
                DuplicateRuleSnafu {
                    stage: "classifier-from-rules",
                    intent: rule.intent,
                }
            );
            ensure!(
                !rule.keywords.is_empty(),
                EmptyKeywordSetSnafu {
                    stage: "classifier-from-rules",
                    intent: rule.intent,
                }
            );
            ensure!(
                rule.keywords.iter().all(|keyword| !keyword.trim().is_empty()),
                BlankKeywordSnafu {
                    stage: "classifier-from-rules",
                    intent: rule.intent,
                }
            );

            // Keywords are stored folded so matching only folds the utterance.
            normalized.push(KeywordRule::new(
                rule.intent,
                rule.keywords.iter().map(|keyword| keyword.to_lowercase()),
            ));
        }

        Ok(Self { rules: normalized })
    }

    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_RULES
                .iter()
                .map(|(intent, keywords)| KeywordRule::new(*intent, keywords.iter().copied()))
                .collect(),
        }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Resolves an utterance to the first bucket with a matching keyword.
    pub fn classify(&self, utterance: &str) -> Intent {
        let folded = utterance.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&folded))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::Fallback)
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN_CLASSIFIER: OnceLock<Arc<IntentClassifier>> = OnceLock::new();

pub fn builtin_classifier() -> Arc<IntentClassifier> {
    BUILTIN_CLASSIFIER
        .get_or_init(|| Arc::new(IntentClassifier::builtin()))
        .clone()
}

/// Classifies against the built-in keyword table.
pub fn classify(utterance: &str) -> Intent {
    builtin_classifier().classify(utterance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;

    #[test]
    fn classify_is_total_over_odd_inputs() {
        for utterance in ["", "   ", "\n\t", "zzz", "🙂🙂", "1234", "ÀÉÎÕÜ"] {
            let intent = classify(utterance);
            assert!(Intent::ALL.contains(&intent));
        }
        assert_eq!(classify(""), Intent::Fallback);
        assert_eq!(classify("quelle heure est-il"), Intent::Fallback);
    }

    #[test]
    fn each_bucket_matches_its_keywords() {
        assert_eq!(classify("Bonjour"), Intent::Greeting);
        assert_eq!(classify("HELLO there"), Intent::Greeting);
        assert_eq!(classify("Que proposez-vous ?"), Intent::Services);
        assert_eq!(classify("votre adresse email"), Intent::Contact);
        assert_eq!(classify("Quel est votre numéro de TÉLÉPHONE"), Intent::Contact);
        assert_eq!(classify("Quels sont vos tarifs ?"), Intent::Pricing);
        assert_eq!(classify("le coût d'une application"), Intent::Pricing);
        assert_eq!(classify("vos réalisations"), Intent::Portfolio);
    }

    #[test]
    fn earlier_bucket_wins_when_several_match() {
        assert_eq!(classify("Bonjour, quels services ?"), Intent::Greeting);
        assert_eq!(classify("un devis pour un service web"), Intent::Services);
        assert_eq!(classify("contacter pour un devis"), Intent::Contact);
        assert_eq!(classify("prix de ce projet"), Intent::Pricing);
    }

    #[test]
    fn substring_matching_fires_inside_longer_words() {
        // Known imprecision of substring containment.
        assert_eq!(classify("J'ai relu Othello hier"), Intent::Greeting);
        assert_eq!(classify("le Prix Goncourt"), Intent::Pricing);
    }

    #[test]
    fn custom_rules_follow_their_declared_order() {
        let classifier = IntentClassifier::from_rules(vec![
            KeywordRule::new(Intent::Pricing, ["Budget"]),
            KeywordRule::new(Intent::Greeting, ["hey"]),
        ])
        .expect("valid rules");

        assert_eq!(classifier.classify("hey, quel budget ?"), Intent::Pricing);
        assert_eq!(classifier.classify("hey"), Intent::Greeting);
        assert_eq!(classifier.classify("bonjour"), Intent::Fallback);
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let fallback = IntentClassifier::from_rules(vec![KeywordRule::new(
            Intent::Fallback,
            ["x"],
        )]);
        assert!(matches!(fallback, Err(BotError::FallbackRule { .. })));

        let empty = IntentClassifier::from_rules(vec![KeywordRule::new(
            Intent::Contact,
            Vec::<String>::new(),
        )]);
        assert!(matches!(
            empty,
            Err(BotError::EmptyKeywordSet {
                intent: Intent::Contact,
                ..
            })
        ));

        let blank = IntentClassifier::from_rules(vec![KeywordRule::new(
            Intent::Services,
            ["web", "  "],
        )]);
        assert!(matches!(blank, Err(BotError::BlankKeyword { .. })));

        let duplicate = IntentClassifier::from_rules(vec![
            KeywordRule::new(Intent::Pricing, ["prix"]),
            KeywordRule::new(Intent::Pricing, ["tarif"]),
        ]);
        assert!(matches!(duplicate, Err(BotError::DuplicateRule { .. })));
    }
}
