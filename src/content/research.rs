use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    envelope::Entry,
    resolve::{Image, Resolver, field},
};

use super::{FromEntry, PersonSummary};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResearchTopic {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub description_html: String,
    pub image: Image,
    pub members: Vec<PersonSummary>,
    pub projects: Vec<ProjectSummary>,
    pub order: Option<i64>,
}

impl FromEntry for ResearchTopic {
    const CONTENT_TYPE: &'static str = "researchTopic";
    const CACHE_KEY: &'static str = "labsite:research";
    // topic -> project -> image
    const INCLUDE: u8 = 2;

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            slug: field::text(entry, "slug"),
            summary: field::text(entry, "summary"),
            description_html: field::rich_text(entry, "description"),
            image: resolver.image(entry, "image"),
            members: PersonSummary::many(entry, "members", resolver),
            projects: resolver
                .resolve_many(entry, "projects")
                .into_iter()
                .map(|project| ProjectSummary::from_entry(project, resolver))
                .collect(),
            order: field::integer(entry, "order"),
        }
    }

    fn arrange(items: &mut [Self]) {
        items.sort_by(|lhs, rhs| {
            lhs.order
                .unwrap_or(i64::MAX)
                .cmp(&rhs.order.unwrap_or(i64::MAX))
                .then_with(|| lhs.title.cmp(&rhs.title))
        });
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub image_url: String,
}

impl ProjectSummary {
    pub fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            slug: field::text(entry, "slug"),
            image_url: resolver.image_url(entry, "image"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub description_html: String,
    pub image: Image,
    pub status: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub funding: Option<String>,
    pub link: Option<String>,
    pub members: Vec<PersonSummary>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

impl FromEntry for Project {
    const CONTENT_TYPE: &'static str = "project";
    const CACHE_KEY: &'static str = "labsite:projects";

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            slug: field::text(entry, "slug"),
            summary: field::text(entry, "summary"),
            description_html: field::rich_text(entry, "description"),
            image: resolver.image(entry, "image"),
            status: field::opt_text(entry, "status").unwrap_or_else(|| "active".into()),
            start: field::date(entry, "startDate"),
            end: field::date(entry, "endDate"),
            funding: field::opt_text(entry, "funding"),
            link: field::opt_text(entry, "link"),
            members: PersonSummary::many(entry, "members", resolver),
        }
    }

    /// Active projects first, then most recently started.
    fn arrange(items: &mut [Self]) {
        items.sort_by(|lhs, rhs| {
            rhs.is_active()
                .cmp(&lhs.is_active())
                .then_with(|| rhs.start.cmp(&lhs.start))
                .then_with(|| lhs.title.cmp(&rhs.title))
        });
    }
}
