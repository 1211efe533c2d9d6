use serde::{Deserialize, Serialize};

use crate::{
    envelope::Entry,
    resolve::{Image, Resolver, field},
};

use super::{Article, FromEntry, ResearchTopic};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Hero {
    pub heading: String,
    pub tagline: String,
    pub image: Image,
    pub call_to_action: Option<String>,
    pub link: Option<String>,
}

impl Hero {
    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            heading: field::text(entry, "heading"),
            tagline: field::text(entry, "tagline"),
            image: resolver.image(entry, "image"),
            call_to_action: field::opt_text(entry, "callToAction"),
            link: field::opt_text(entry, "link"),
        }
    }
}

/// Front page. Its entry only links other entries; each part is resolved on
/// its own and a part that cannot be resolved is left out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Home {
    pub id: String,
    pub hero: Option<Hero>,
    pub news: Vec<Article>,
    pub research: Vec<ResearchTopic>,
}

impl FromEntry for Home {
    const CONTENT_TYPE: &'static str = "homeSection";
    const CACHE_KEY: &'static str = "labsite:home";
    // home -> article -> contributor -> person -> photo
    const INCLUDE: u8 = 4;

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            hero: resolver
                .resolve_one(entry, "hero")
                .map(|hero| Hero::from_entry(hero, resolver)),
            news: resolver
                .resolve_many(entry, "news")
                .into_iter()
                .map(|article| Article::from_entry(article, resolver))
                .collect(),
            research: resolver
                .resolve_many(entry, "research")
                .into_iter()
                .map(|topic| ResearchTopic::from_entry(topic, resolver))
                .collect(),
        }
    }
}
