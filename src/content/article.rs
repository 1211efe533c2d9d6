use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    envelope::Entry,
    resolve::{Image, Resolver, field},
    rich_text,
};

use super::{Contributor, FromEntry};

const EXCERPT_CHARS: usize = 200;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub date: Option<NaiveDate>,
    pub display_date: String,
    pub summary: String,
    pub body_html: String,
    pub image: Image,
    pub tags: Vec<String>,
    pub contributors: Vec<Contributor>,
    pub link: Option<String>,
    pub published: bool,
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        None => text.to_owned(),
        Some((end, _)) => {
            let cut = text[..end].rsplit_once(' ').map_or(&text[..end], |(head, _)| head);
            format!("{}…", cut.trim_end())
        }
    }
}

impl FromEntry for Article {
    const CONTENT_TYPE: &'static str = "article";
    const CACHE_KEY: &'static str = "labsite:articles";
    // article -> contributor -> person -> photo
    const INCLUDE: u8 = 3;

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        let body = field::document(entry, "body");
        let date = field::date(entry, "publishDate");
        let summary = field::opt_text(entry, "summary")
            .unwrap_or_else(|| excerpt(&rich_text::plain_text(body.as_ref())));
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            slug: field::text(entry, "slug"),
            date,
            display_date: field::display_date(date),
            summary,
            body_html: rich_text::render(body.as_ref()),
            image: resolver.image(entry, "image"),
            tags: field::texts(entry, "tags"),
            contributors: Contributor::many(entry, "contributors", resolver),
            link: field::opt_text(entry, "externalLink"),
            published: field::flag(entry, "published"),
        }
    }

    /// Newest first; undated articles last.
    fn arrange(items: &mut [Self]) {
        items.sort_by(|lhs, rhs| {
            rhs.date
                .cmp(&lhs.date)
                .then_with(|| lhs.title.cmp(&rhs.title))
        });
    }
}
