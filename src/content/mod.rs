//! Typed accessors over the content of the laboratory site.
//!
//! Every collection is fetched once per TTL window: the accessor consults the
//! cache, and on a miss fetches the content type with enough link depth,
//! resolves links and rich text into a normalized model, caches the result and
//! returns it. Lookups by id or slug filter the cached collection.

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    cache::{Cache, Clock, SqliteStore, Store, SystemClock},
    config::Config,
    envelope::Entry,
    fetch::{ContentSource, FetchError, HttpFetcher, Query},
    resolve::Resolver,
};

mod article;
mod home;
mod page;
mod person;
mod publication;
mod research;

pub use article::Article;
pub use home::{Hero, Home};
pub use page::{AboutPage, ContactInfo, MediaItem, Opportunity};
pub use person::{Contributor, Person, PersonSummary};
pub use publication::Publication;
pub use research::{Project, ProjectSummary, ResearchTopic};

#[cfg(test)]
mod tests;

/// A model built from the entries of one content type.
pub trait FromEntry: Serialize + DeserializeOwned {
    const CONTENT_TYPE: &'static str;
    const CACHE_KEY: &'static str;
    /// Link depth needed to reach every entry the model reads.
    const INCLUDE: u8 = 1;

    fn from_entry(entry: &Entry, resolver: &Resolver<'_>) -> Self;

    /// Orders a freshly built collection before it is cached.
    fn arrange(_items: &mut [Self]) {}

    fn query() -> Query {
        Query::new(Self::CONTENT_TYPE).include(Self::INCLUDE)
    }
}

pub struct Content<F, S, C = SystemClock> {
    source: F,
    cache: Cache<S, C>,
    placeholder: String,
}

impl Content<HttpFetcher, SqliteStore> {
    pub async fn open(config: &Config) -> Result<Self, crate::Error> {
        let source = HttpFetcher::from_config(config).map_err(crate::Error::Client)?;
        let store = SqliteStore::open(&config.cache_database)
            .await
            .map_err(crate::Error::CacheStore)?;
        Ok(Self::new(source, Cache::new(store), config.placeholder_image()))
    }

    /// Opens the content layer from `LABSITE_*` environment variables.
    pub async fn open_from_env() -> Result<Self, crate::Error> {
        let config = Config::from_env().map_err(crate::Error::Config)?;
        Self::open(&config).await
    }
}

impl<F: ContentSource, S: Store, C: Clock> Content<F, S, C> {
    pub fn new(source: F, cache: Cache<S, C>, placeholder: impl Into<String>) -> Self {
        Self {
            source,
            cache,
            placeholder: placeholder.into(),
        }
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn cache(&self) -> &Cache<S, C> {
        &self.cache
    }

    fn today(&self) -> NaiveDate {
        self.cache.clock().now().date_naive()
    }

    /// Cache-first fetch of every entry of `T`'s content type. Only a failed
    /// fetch is an error, and it leaves the cache untouched.
    pub async fn collection<T: FromEntry>(&self) -> Result<Vec<T>, FetchError> {
        if let Some(items) = self.cache.fresh::<Vec<T>>(T::CACHE_KEY).await {
            return Ok(items);
        }
        let envelope = self.source.fetch(&T::query()).await?;
        let resolver = Resolver::new(&envelope, self.placeholder.as_str());
        let mut items = envelope
            .items
            .iter()
            .map(|entry| T::from_entry(entry, &resolver))
            .collect::<Vec<_>>();
        T::arrange(&mut items);
        debug!(
            content_type = T::CONTENT_TYPE,
            count = items.len(),
            "normalized collection"
        );
        self.cache.put(T::CACHE_KEY, &items).await;
        Ok(items)
    }

    async fn first<T: FromEntry>(&self) -> Result<Option<T>, FetchError> {
        Ok(self.collection::<T>().await?.into_iter().next())
    }

    pub async fn articles(&self) -> Result<Vec<Article>, FetchError> {
        self.collection().await
    }

    pub async fn published_articles(&self) -> Result<Vec<Article>, FetchError> {
        Ok(self
            .articles()
            .await?
            .into_iter()
            .filter(|article| article.published)
            .collect())
    }

    pub async fn article_by_id(&self, id: &str) -> Result<Option<Article>, FetchError> {
        Ok(self.articles().await?.into_iter().find(|a| a.id == id))
    }

    pub async fn article_by_slug(&self, slug: &str) -> Result<Option<Article>, FetchError> {
        Ok(self.articles().await?.into_iter().find(|a| a.slug == slug))
    }

    pub async fn people(&self) -> Result<Vec<Person>, FetchError> {
        self.collection().await
    }

    pub async fn people_by_role(&self, role: &str) -> Result<Vec<Person>, FetchError> {
        Ok(self
            .people()
            .await?
            .into_iter()
            .filter(|person| person.role.eq_ignore_ascii_case(role))
            .collect())
    }

    pub async fn principal_investigator(&self) -> Result<Option<Person>, FetchError> {
        Ok(self
            .people()
            .await?
            .into_iter()
            .find(|person| person.principal_investigator))
    }

    pub async fn research_topics(&self) -> Result<Vec<ResearchTopic>, FetchError> {
        self.collection().await
    }

    pub async fn research_topic_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ResearchTopic>, FetchError> {
        Ok(self
            .research_topics()
            .await?
            .into_iter()
            .find(|topic| topic.slug == slug))
    }

    pub async fn projects(&self) -> Result<Vec<Project>, FetchError> {
        self.collection().await
    }

    pub async fn publications(&self) -> Result<Vec<Publication>, FetchError> {
        self.collection().await
    }

    /// Publications grouped by year, most recent first. Undated ones come last.
    pub async fn publications_by_year(
        &self,
    ) -> Result<Vec<(Option<i32>, Vec<Publication>)>, FetchError> {
        let publications = self.publications().await?;
        Ok(publications
            .into_iter()
            .chunk_by(|publication| publication.year)
            .into_iter()
            .map(|(year, group)| (year, group.collect()))
            .collect())
    }

    pub async fn opportunities(&self) -> Result<Vec<Opportunity>, FetchError> {
        self.collection().await
    }

    /// Opportunities still accepting applications today.
    pub async fn open_opportunities(&self) -> Result<Vec<Opportunity>, FetchError> {
        let today = self.today();
        Ok(self
            .opportunities()
            .await?
            .into_iter()
            .filter(|opportunity| opportunity.is_open_on(today))
            .collect())
    }

    pub async fn media(&self) -> Result<Vec<MediaItem>, FetchError> {
        self.collection().await
    }

    pub async fn home(&self) -> Result<Option<Home>, FetchError> {
        self.first().await
    }

    pub async fn about(&self) -> Result<Option<AboutPage>, FetchError> {
        self.first().await
    }

    pub async fn contact(&self) -> Result<Option<ContactInfo>, FetchError> {
        self.first().await
    }
}
