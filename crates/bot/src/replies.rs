use std::collections::BTreeMap;

use rand::Rng;
use snafu::{OptionExt, ensure};

use crate::error::{BotResult, EmptyReplyPoolSnafu, MissingReplyPoolSnafu};
use crate::intent::Intent;

const GREETING_REPLIES: &[&str] = &[
    "Bonjour ! Je suis l'assistant virtuel de SolvaticaTech. Comment puis-je vous aider aujourd'hui ?",
    "Salut ! Bienvenue sur SolvaticaTech. Que puis-je faire pour vous ?",
    "Bonjour ! Je suis là pour répondre à vos questions sur nos services.",
];

const SERVICES_REPLIES: &[&str] = &[
    "Nous proposons plusieurs services : développement web, applications mobiles, solutions cloud, et analyse de données. Quel service vous intéresse ?",
    "Nos services incluent le développement web moderne, les applications mobiles, les solutions cloud sécurisées, et l'analyse de données. Que souhaitez-vous savoir ?",
];

const CONTACT_REPLIES: &[&str] = &[
    "Vous pouvez nous contacter via notre page contact, par email à contact@solvaticatech.com, ou par WhatsApp au +22247776444.",
    "Pour nous contacter, visitez notre page contact, envoyez-nous un email à contact@solvaticatech.com, ou contactez-nous directement sur WhatsApp au +22247776444.",
];

const PRICING_REPLIES: &[&str] = &[
    "Nos tarifs varient selon la complexité du projet. Contactez-nous pour un devis personnalisé gratuit.",
    "Chaque projet est unique, c'est pourquoi nous proposons des devis sur mesure. Contactez-nous pour en discuter.",
];

const PORTFOLIO_REPLIES: &[&str] = &[
    "Vous pouvez voir nos réalisations dans notre section portfolio. Nous avons travaillé sur des projets e-commerce, applications bancaires, et tableaux de bord analytiques.",
    "Découvrez nos projets dans la section portfolio. Nous sommes fiers de nos réalisations variées.",
];

const FALLBACK_REPLIES: &[&str] = &[
    "Je ne suis pas sûr de comprendre. Pouvez-vous reformuler votre question ?",
    "Je n'ai pas la réponse à cette question. Contactez-nous directement pour plus d'informations.",
    "Pour cette question spécifique, je vous recommande de nous contacter directement.",
];

fn builtin_pool(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Greeting => GREETING_REPLIES,
        Intent::Services => SERVICES_REPLIES,
        Intent::Contact => CONTACT_REPLIES,
        Intent::Pricing => PRICING_REPLIES,
        Intent::Portfolio => PORTFOLIO_REPLIES,
        Intent::Fallback => FALLBACK_REPLIES,
    }
}

/// Canned reply pools, one non-empty pool per bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyBook {
    pools: BTreeMap<Intent, Vec<String>>,
}

impl ReplyBook {
    /// Builds a reply book; every bucket, fallback included, needs candidates.
    pub fn from_entries<I>(entries: I) -> BotResult<Self>
    where
        I: IntoIterator<Item = (Intent, Vec<String>)>,
    {
        let pools = entries.into_iter().collect::<BTreeMap<_, _>>();

        for intent in Intent::ALL {
            let pool = pools.get(&intent).context(MissingReplyPoolSnafu {
                stage: "reply-book-from-entries",
                intent,
            })?;
            ensure!(
                !pool.is_empty(),
                EmptyReplyPoolSnafu {
                    stage: "reply-book-from-entries",
                    intent,
                }
            );
        }

        Ok(Self { pools })
    }

    pub fn builtin() -> Self {
        Self {
            pools: Intent::ALL
                .into_iter()
                .map(|intent| {
                    let pool = builtin_pool(intent)
                        .iter()
                        .map(|reply| reply.to_string())
                        .collect();
                    (intent, pool)
                })
                .collect(),
        }
    }

    pub fn candidates(&self, intent: Intent) -> &[String] {
        self.pools
            .get(&intent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Picks one candidate uniformly at random from the bucket's pool.
    pub fn select_reply<R>(&self, intent: Intent, rng: &mut R) -> &str
    where
        R: Rng + ?Sized,
    {
        let candidates = self.candidates(intent);
        if candidates.is_empty() {
            // Unreachable through the constructors; keep the selector total anyway.
            return "";
        }

        let index = rng.gen_range(0..candidates.len());
        candidates[index].as_str()
    }
}

impl Default for ReplyBook {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::error::BotError;

    #[test]
    fn builtin_pools_match_expected_sizes() {
        let book = ReplyBook::builtin();
        assert_eq!(book.candidates(Intent::Greeting).len(), 3);
        assert_eq!(book.candidates(Intent::Services).len(), 2);
        assert_eq!(book.candidates(Intent::Contact).len(), 2);
        assert_eq!(book.candidates(Intent::Pricing).len(), 2);
        assert_eq!(book.candidates(Intent::Portfolio).len(), 2);
        assert_eq!(book.candidates(Intent::Fallback).len(), 3);
    }

    #[test]
    fn selected_reply_always_belongs_to_the_bucket() {
        let book = ReplyBook::builtin();
        let mut rng = StdRng::seed_from_u64(7);

        for intent in Intent::ALL {
            for _ in 0..64 {
                let reply = book.select_reply(intent, &mut rng);
                assert!(book.candidates(intent).iter().any(|c| c == reply));
            }
        }
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let book = ReplyBook::builtin();
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);

        let left = (0..16)
            .map(|_| book.select_reply(Intent::Fallback, &mut first).to_string())
            .collect::<Vec<_>>();
        let right = (0..16)
            .map(|_| book.select_reply(Intent::Fallback, &mut second).to_string())
            .collect::<Vec<_>>();
        assert_eq!(left, right);
    }

    #[test]
    fn every_candidate_is_reachable() {
        let book = ReplyBook::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(book.select_reply(Intent::Greeting, &mut rng).to_string());
        }
        assert_eq!(seen.len(), book.candidates(Intent::Greeting).len());
    }

    #[test]
    fn from_entries_requires_every_bucket() {
        let partial = ReplyBook::from_entries([(Intent::Greeting, vec!["hi".to_string()])]);
        assert!(matches!(partial, Err(BotError::MissingReplyPool { .. })));

        let entries = Intent::ALL.into_iter().map(|intent| {
            let pool = if intent == Intent::Portfolio {
                Vec::new()
            } else {
                vec![format!("{intent} reply")]
            };
            (intent, pool)
        });
        let empty = ReplyBook::from_entries(entries);
        assert!(matches!(
            empty,
            Err(BotError::EmptyReplyPool {
                intent: Intent::Portfolio,
                ..
            })
        ));
    }
}
