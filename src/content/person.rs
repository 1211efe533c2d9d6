use serde::{Deserialize, Serialize};

use crate::{
    envelope::Entry,
    resolve::{Image, Resolver, field},
};

use super::FromEntry;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Group the person belongs to on the people page, e.g. `PhD Student`.
    pub role: String,
    pub position: String,
    pub bio_html: String,
    pub photo: Image,
    pub email: Option<String>,
    pub website: Option<String>,
    pub research_interests: Vec<String>,
    pub order: Option<i64>,
    pub principal_investigator: bool,
    pub alumni: bool,
}

impl FromEntry for Person {
    const CONTENT_TYPE: &'static str = "person";
    const CACHE_KEY: &'static str = "labsite:people";

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            name: field::text(entry, "name"),
            slug: field::text(entry, "slug"),
            role: field::text(entry, "role"),
            position: field::text(entry, "position"),
            bio_html: field::rich_text(entry, "bio"),
            photo: resolver.image(entry, "photo"),
            email: field::opt_text(entry, "email"),
            website: field::opt_text(entry, "website"),
            research_interests: field::texts(entry, "researchInterests"),
            order: field::integer(entry, "order"),
            principal_investigator: field::flag(entry, "isPrincipalInvestigator"),
            alumni: field::flag(entry, "alumni"),
        }
    }

    fn arrange(items: &mut [Self]) {
        items.sort_by(|lhs, rhs| {
            lhs.order
                .unwrap_or(i64::MAX)
                .cmp(&rhs.order.unwrap_or(i64::MAX))
                .then_with(|| lhs.name.cmp(&rhs.name))
        });
    }
}

/// The part of a person shown next to the content they are linked from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PersonSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub role: String,
    pub photo_url: String,
}

impl PersonSummary {
    pub fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            name: field::text(entry, "name"),
            slug: field::text(entry, "slug"),
            role: field::text(entry, "role"),
            photo_url: resolver.image_url(entry, "photo"),
        }
    }

    pub fn many(entry: &Entry, link_field: &str, resolver: &Resolver<'_>) -> Vec<Self> {
        resolver
            .resolve_many(entry, link_field)
            .into_iter()
            .map(|person| Self::from_entry(person, resolver))
            .collect()
    }
}

/// Credit on an article or publication. It either links a lab member or
/// names an outside contributor directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub name: String,
    pub credit: Option<String>,
    pub person: Option<PersonSummary>,
}

impl Contributor {
    pub fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Option<Self> {
        let person = resolver
            .resolve_one(entry, "person")
            .map(|person| PersonSummary::from_entry(person, resolver));
        let name = person
            .as_ref()
            .map(|person| person.name.clone())
            .filter(|name| !name.is_empty())
            .or_else(|| field::opt_text(entry, "name"))?;
        Some(Self {
            name,
            credit: field::opt_text(entry, "credit"),
            person,
        })
    }

    /// Resolves the contributor links in `link_field`, skipping contributors
    /// that neither link a person nor carry a name.
    pub fn many(entry: &Entry, link_field: &str, resolver: &Resolver<'_>) -> Vec<Self> {
        resolver
            .resolve_many(entry, link_field)
            .into_iter()
            .filter_map(|contributor| Self::from_entry(contributor, resolver))
            .collect()
    }
}
