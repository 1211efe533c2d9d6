use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    envelope::Entry,
    resolve::{Resolver, field},
};

use super::{Contributor, FromEntry};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub id: String,
    pub title: String,
    pub authors: Vec<Contributor>,
    /// Author names as printed in a citation.
    pub author_line: String,
    pub venue: String,
    pub kind: String,
    pub year: Option<i32>,
    pub date: Option<NaiveDate>,
    pub doi: Option<String>,
    pub link: Option<String>,
    pub pdf_url: Option<String>,
    pub abstract_html: String,
}

impl FromEntry for Publication {
    const CONTENT_TYPE: &'static str = "publication";
    const CACHE_KEY: &'static str = "labsite:publications";
    // publication -> contributor -> person -> photo
    const INCLUDE: u8 = 3;

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        let authors = Contributor::many(entry, "authors", resolver);
        let author_line = if authors.is_empty() {
            field::text(entry, "authorsText")
        } else {
            authors.iter().map(|author| author.name.as_str()).join(", ")
        };
        let date = field::date(entry, "date");
        let year = field::integer(entry, "year")
            .and_then(|year| i32::try_from(year).ok())
            .or_else(|| date.map(|date| date.year()));
        let doi = field::opt_text(entry, "doi");
        let link = field::opt_text(entry, "url")
            .or_else(|| doi.as_ref().map(|doi| format!("https://doi.org/{doi}")));
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            authors,
            author_line,
            venue: field::text(entry, "venue"),
            kind: field::text(entry, "type"),
            year,
            date,
            doi,
            link,
            pdf_url: resolver.resolve_asset(entry, "pdf").map(|file| file.url),
            abstract_html: field::rich_text(entry, "abstract"),
        }
    }

    /// Most recent year first; undated publications last.
    fn arrange(items: &mut [Self]) {
        items.sort_by(|lhs, rhs| {
            rhs.year
                .cmp(&lhs.year)
                .then_with(|| rhs.date.cmp(&lhs.date))
                .then_with(|| lhs.title.cmp(&rhs.title))
        });
    }
}
