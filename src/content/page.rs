use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    envelope::Entry,
    resolve::{Image, Resolver, field},
};

use super::FromEntry;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub description_html: String,
    pub deadline: Option<NaiveDate>,
    pub display_deadline: String,
    pub open: bool,
    pub contact_email: Option<String>,
    pub link: Option<String>,
}

impl Opportunity {
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.open && self.deadline.is_none_or(|deadline| deadline >= today)
    }
}

impl FromEntry for Opportunity {
    const CONTENT_TYPE: &'static str = "opportunity";
    const CACHE_KEY: &'static str = "labsite:opportunities";
    const INCLUDE: u8 = 0;

    fn from_entry(entry: &Entry, _resolver: &Resolver<'_>) -> Self {
        let deadline = field::date(entry, "deadline");
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            kind: field::text(entry, "type"),
            description_html: field::rich_text(entry, "description"),
            deadline,
            display_deadline: field::display_date(deadline),
            // opportunities are open unless explicitly closed
            open: entry
                .field("isOpen")
                .and_then(|value| value.as_bool())
                .unwrap_or(true),
            contact_email: field::opt_text(entry, "contactEmail"),
            link: field::opt_text(entry, "applicationLink"),
        }
    }

    /// Open first, then by closest deadline; open-ended ones after dated ones.
    fn arrange(items: &mut [Self]) {
        items.sort_by(|lhs, rhs| {
            rhs.open
                .cmp(&lhs.open)
                .then_with(|| match (lhs.deadline, rhs.deadline) {
                    (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
                    (lhs, rhs) => lhs.is_none().cmp(&rhs.is_none()),
                })
                .then_with(|| lhs.title.cmp(&rhs.title))
        });
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub outlet: String,
    pub kind: String,
    pub date: Option<NaiveDate>,
    pub display_date: String,
    pub summary: String,
    pub link: Option<String>,
    pub image: Image,
}

impl FromEntry for MediaItem {
    const CONTENT_TYPE: &'static str = "mediaItem";
    const CACHE_KEY: &'static str = "labsite:media";

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        let date = field::date(entry, "date");
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            outlet: field::text(entry, "outlet"),
            kind: field::text(entry, "type"),
            date,
            display_date: field::display_date(date),
            summary: field::text(entry, "summary"),
            link: field::opt_text(entry, "link"),
            image: resolver.image(entry, "image"),
        }
    }

    fn arrange(items: &mut [Self]) {
        items.sort_by(|lhs, rhs| rhs.date.cmp(&lhs.date));
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AboutPage {
    pub id: String,
    pub title: String,
    pub mission: String,
    pub body_html: String,
    pub image: Image,
    pub gallery: Vec<Image>,
}

impl FromEntry for AboutPage {
    const CONTENT_TYPE: &'static str = "aboutPage";
    const CACHE_KEY: &'static str = "labsite:about";

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            title: field::text(entry, "title"),
            mission: field::text(entry, "mission"),
            body_html: field::rich_text(entry, "body"),
            image: resolver.image(entry, "image"),
            gallery: resolver.resolve_assets(entry, "gallery"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub id: String,
    pub address_html: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub map_url: Option<String>,
    pub office_hours: Option<String>,
}

impl FromEntry for ContactInfo {
    const CONTENT_TYPE: &'static str = "contactInfo";
    const CACHE_KEY: &'static str = "labsite:contact";
    const INCLUDE: u8 = 0;

    fn from_entry(entry: &Entry, _resolver: &Resolver<'_>) -> Self {
        Self {
            id: entry.id().to_owned(),
            address_html: field::rich_text(entry, "address"),
            email: field::opt_text(entry, "email"),
            phone: field::opt_text(entry, "phone"),
            map_url: field::opt_text(entry, "mapUrl"),
            office_hours: field::opt_text(entry, "officeHours"),
        }
    }
}
