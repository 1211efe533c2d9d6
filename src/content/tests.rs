use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use chrono::{TimeZone, Utc};
use serde_json::json;

use super::*;
use crate::{
    cache::{CacheEntry, ManualClock, MemoryStore, TTL},
    envelope::Envelope,
};

const PLACEHOLDER: &str = "/lab/images/placeholder.png";

/// Serves canned envelopes, trimming `includes` to what the requested link
/// depth would reach.
#[derive(Default)]
struct FakeSource {
    envelopes: HashMap<String, serde_json::Value>,
    failing: bool,
    calls: AtomicUsize,
    queries: std::sync::Mutex<Vec<Query>>,
}

impl FakeSource {
    fn with(mut self, content_type: &str, envelope: serde_json::Value) -> Self {
        self.envelopes.insert(content_type.into(), envelope);
        self
    }

    fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentSource for FakeSource {
    async fn fetch(&self, query: &Query) -> Result<Envelope, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        tokio::task::yield_now().await;
        if self.failing {
            return Err(FetchError::status(
                query.content_type.clone(),
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Ok(match self.envelopes.get(&query.content_type) {
            Some(envelope) => serde_json::from_value(within_depth(envelope, query.include)).unwrap(),
            None => Envelope::default(),
        })
    }
}

fn linked_ids(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            let sys = &value["sys"];
            if sys["type"] == "Link" {
                out.extend(sys["id"].as_str().map(str::to_owned));
                return;
            }
            map.values().for_each(|value| linked_ids(value, out));
        }
        serde_json::Value::Array(values) => values.iter().for_each(|value| linked_ids(value, out)),
        _ => {}
    }
}

fn within_depth(envelope: &serde_json::Value, depth: u8) -> serde_json::Value {
    let included = |kind: &str| {
        envelope["includes"][kind]
            .as_array()
            .cloned()
            .unwrap_or_default()
    };
    let (entries, assets) = (included("Entry"), included("Asset"));
    let id_of = |value: &serde_json::Value| value["sys"]["id"].as_str().unwrap_or_default().to_owned();

    let mut frontier = Vec::new();
    linked_ids(&envelope["items"], &mut frontier);
    let mut reached = HashSet::new();
    for _ in 0..depth {
        let mut next = Vec::new();
        for id in frontier.drain(..) {
            if !reached.insert(id.clone()) {
                continue;
            }
            if let Some(entry) = entries.iter().find(|entry| id_of(entry) == id) {
                linked_ids(&entry["fields"], &mut next);
            }
        }
        frontier = next;
    }
    let keep = |values: Vec<serde_json::Value>| {
        values
            .into_iter()
            .filter(|value| reached.contains(&id_of(value)))
            .collect::<Vec<_>>()
    };
    let mut trimmed = envelope.clone();
    trimmed["includes"] = json!({ "Entry": keep(entries), "Asset": keep(assets) });
    trimmed
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
}

type TestContent = Content<FakeSource, MemoryStore, Arc<ManualClock>>;

fn content(source: FakeSource) -> (TestContent, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at(now()));
    let cache = Cache::with_clock(MemoryStore::default(), clock.clone());
    (Content::new(source, cache, PLACEHOLDER), clock)
}

fn link(id: &str) -> serde_json::Value {
    json!({ "sys": { "type": "Link", "linkType": "Entry", "id": id } })
}

fn asset_link(id: &str) -> serde_json::Value {
    json!({ "sys": { "type": "Link", "linkType": "Asset", "id": id } })
}

fn articles() -> serde_json::Value {
    json!({
        "items": [
            {
                "sys": { "id": "a-old" },
                "fields": {
                    "title": "Lab founded",
                    "slug": "lab-founded",
                    "publishDate": "2019-09-01",
                    "published": true,
                    "body": {
                        "nodeType": "document",
                        "content": [{
                            "nodeType": "paragraph",
                            "content": [{ "nodeType": "text", "value": "We opened our doors.", "marks": [] }]
                        }]
                    }
                }
            },
            {
                "sys": { "id": "a-new" },
                "fields": {
                    "title": "Best paper award",
                    "slug": "best-paper",
                    "publishDate": "2024-05-02T10:00:00.000Z",
                    "summary": "Our paper won.",
                    "published": true,
                    "image": asset_link("cover"),
                    "contributors": [link("c-ada"), link("c-missing"), link("c-guest")]
                }
            },
            {
                "sys": { "id": "a-draft" },
                "fields": { "title": "Draft", "slug": "draft", "published": false }
            }
        ],
        "includes": {
            "Entry": [
                {
                    "sys": { "id": "c-ada" },
                    "fields": { "person": link("p-ada"), "credit": "Writer" }
                },
                { "sys": { "id": "c-guest" }, "fields": { "name": "Guest Author" } },
                {
                    "sys": { "id": "p-ada" },
                    "fields": {
                        "name": "Ada Lovelace",
                        "slug": "ada",
                        "role": "Principal Investigator",
                        "photo": asset_link("ada-photo")
                    }
                }
            ],
            "Asset": [
                {
                    "sys": { "id": "cover" },
                    "fields": { "title": "Award", "file": { "url": "//images.example.test/award.jpg" } }
                },
                {
                    "sys": { "id": "ada-photo" },
                    "fields": { "title": "Ada", "file": { "url": "//images.example.test/ada.jpg" } }
                }
            ]
        }
    })
}

#[tokio::test]
async fn test_second_call_within_ttl_is_served_from_cache() {
    let (content, clock) = content(FakeSource::default().with("article", articles()));
    let first = content.articles().await.unwrap();
    clock.advance(TTL / 2);
    let second = content.articles().await.unwrap();
    assert_eq!(content.source().calls(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let (content, clock) = content(FakeSource::default().with("article", articles()));
    content.articles().await.unwrap();
    clock.advance(TTL + std::time::Duration::from_millis(1));
    content.articles().await.unwrap();
    assert_eq!(content.source().calls(), 2);

    let entry = content.cache().get(Article::CACHE_KEY).await.unwrap();
    assert_eq!(entry.timestamp, clock.now());
}

#[tokio::test]
async fn test_stale_seeded_entry_is_ignored() {
    let (content, _) = content(FakeSource::default().with("article", articles()));
    let stale = CacheEntry {
        data: json!([]),
        timestamp: now()
            - chrono::Duration::from_std(TTL).unwrap()
            - chrono::Duration::milliseconds(1),
    };
    assert!(!content.cache().is_valid(&stale));
    content
        .cache()
        .store()
        .save(Article::CACHE_KEY, &stale)
        .await
        .unwrap();
    let articles = content.articles().await.unwrap();
    assert_eq!(content.source().calls(), 1);
    assert_eq!(articles.len(), 3);
}

#[tokio::test]
async fn test_fetch_failure_leaves_cache_untouched() {
    let (content, _) = content(FakeSource::failing());
    let error = content.publications().await.unwrap_err();
    assert_eq!(error.content_type, "publication");
    assert!(content.cache().store().is_empty().await);

    let stale = CacheEntry {
        data: json!([{ "id": "kept" }]),
        timestamp: now() - chrono::Duration::hours(2),
    };
    let store = content.cache().store();
    store.save(Publication::CACHE_KEY, &stale).await.unwrap();
    content.publications().await.unwrap_err();
    assert_eq!(content.source().calls(), 2);
    assert_eq!(
        store.load(Publication::CACHE_KEY).await.unwrap(),
        Some(stale)
    );
}

#[tokio::test]
async fn test_concurrent_misses_each_fetch() {
    let (content, _) = content(FakeSource::default().with("person", json!({ "items": [] })));
    let (lhs, rhs) = futures::join!(content.people(), content.people());
    assert_eq!(lhs.unwrap(), rhs.unwrap());
    assert_eq!(content.source().calls(), 2);
}

#[tokio::test]
async fn test_articles_are_normalized() {
    let (content, _) = content(FakeSource::default().with("article", articles()));
    let articles = content.articles().await.unwrap();
    let ids = articles.iter().map(|a| a.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["a-new", "a-old", "a-draft"]);

    let award = &articles[0];
    assert_eq!(award.display_date, "May 2, 2024");
    assert_eq!(award.image.url, "https://images.example.test/award.jpg");
    assert_eq!(
        award
            .contributors
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Ada Lovelace", "Guest Author"]
    );
    assert_eq!(award.contributors[0].credit.as_deref(), Some("Writer"));
    assert_eq!(
        award.contributors[0].person.as_ref().map(|p| p.slug.as_str()),
        Some("ada")
    );
    assert!(award.contributors[1].person.is_none());

    let founded = &articles[1];
    assert_eq!(founded.summary, "We opened our doors.");
    assert_eq!(founded.body_html, "<p>We opened our doors.</p>");
    assert_eq!(founded.image.url, PLACEHOLDER);

    let queries = content.source().queries.lock().unwrap().clone();
    assert_eq!(queries, vec![Query::new("article").include(3)]);
}

#[tokio::test]
async fn test_contributor_photos_are_within_link_depth() {
    let (news, _) = content(FakeSource::default().with("article", articles()));
    let listed = news.articles().await.unwrap();
    let ada = listed[0].contributors[0].person.as_ref().unwrap();
    assert_eq!(ada.photo_url, "https://images.example.test/ada.jpg");

    let mut envelope = home();
    envelope["items"][0]["fields"]["news"] = json!([link("a-new")]);
    let article_envelope = articles();
    let includes = envelope["includes"]["Entry"].as_array_mut().unwrap();
    includes.extend(article_envelope["items"].as_array().unwrap().iter().cloned());
    includes.extend(article_envelope["includes"]["Entry"].as_array().unwrap().iter().cloned());
    envelope["includes"]["Asset"] = article_envelope["includes"]["Asset"].clone();
    let (site, _) = content(FakeSource::default().with("homeSection", envelope));
    let home = site.home().await.unwrap().unwrap();
    let ada = home.news[0].contributors[0].person.as_ref().unwrap();
    assert_eq!(ada.photo_url, "https://images.example.test/ada.jpg");
}

#[test]
fn test_fake_source_trims_includes_by_depth() {
    let shallow = within_depth(&articles(), 2);
    let assets = shallow["includes"]["Asset"].as_array().unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["sys"]["id"], "cover");
    assert_eq!(shallow["includes"]["Entry"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_derived_article_lookups_share_one_fetch() {
    let (content, _) = content(FakeSource::default().with("article", articles()));
    let published = content.published_articles().await.unwrap();
    assert_eq!(published.len(), 2);
    let by_id = content.article_by_id("a-old").await.unwrap();
    assert_eq!(by_id.map(|a| a.slug), Some("lab-founded".to_string()));
    assert!(content.article_by_slug("nope").await.unwrap().is_none());
    assert_eq!(content.source().calls(), 1);
}

#[tokio::test]
async fn test_people_and_principal_investigator() {
    let source = FakeSource::default().with(
        "person",
        json!({
            "items": [
                { "sys": { "id": "p2" }, "fields": { "name": "Zed", "role": "PhD Student" } },
                {
                    "sys": { "id": "p1" },
                    "fields": {
                        "name": "Ada",
                        "role": "Faculty",
                        "order": 1,
                        "isPrincipalInvestigator": true,
                        "photo": asset_link("gone"),
                        "bio": "Builds engines."
                    }
                },
                { "sys": { "id": "p3" }, "fields": { "name": "Bo", "role": "phd student" } }
            ]
        }),
    );
    let (content, _) = content(source);
    let people = content.people().await.unwrap();
    let names = people.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Ada", "Bo", "Zed"]);

    let pi = content.principal_investigator().await.unwrap().unwrap();
    assert_eq!(pi.id, "p1");
    assert_eq!(pi.photo.url, PLACEHOLDER);
    assert_eq!(pi.bio_html, "<p>Builds engines.</p>");

    let students = content.people_by_role("PhD Student").await.unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(content.source().calls(), 1);
}

#[tokio::test]
async fn test_publications_grouped_by_year() {
    let source = FakeSource::default().with(
        "publication",
        json!({
            "items": [
                { "sys": { "id": "old" }, "fields": { "title": "Old", "year": 2020, "authorsText": "A. Person" } },
                { "sys": { "id": "undated" }, "fields": { "title": "Undated" } },
                {
                    "sys": { "id": "new" },
                    "fields": {
                        "title": "New",
                        "date": "2023-04-01",
                        "doi": "10.1000/xyz",
                        "authors": [link("c1"), link("c2")]
                    }
                },
                { "sys": { "id": "new2" }, "fields": { "title": "Another", "year": 2023 } }
            ],
            "includes": {
                "Entry": [
                    { "sys": { "id": "c1" }, "fields": { "person": link("p1") } },
                    { "sys": { "id": "c2" }, "fields": { "name": "B. External" } },
                    { "sys": { "id": "p1" }, "fields": { "name": "A. Member" } }
                ]
            }
        }),
    );
    let (content, _) = content(source);
    let groups = content.publications_by_year().await.unwrap();
    let shape = groups
        .iter()
        .map(|(year, items)| (*year, items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>()))
        .collect::<Vec<_>>();
    assert_eq!(
        shape,
        vec![
            (Some(2023), vec!["new", "new2"]),
            (Some(2020), vec!["old"]),
            (None, vec!["undated"]),
        ]
    );
    let new = &groups[0].1[0];
    assert_eq!(new.author_line, "A. Member, B. External");
    assert_eq!(new.link.as_deref(), Some("https://doi.org/10.1000/xyz"));
    assert_eq!(groups[1].1[0].author_line, "A. Person");
}

fn home() -> serde_json::Value {
    json!({
        "items": [{
            "sys": { "id": "home" },
            "fields": {
                "hero": link("hero"),
                "news": [link("n1"), link("n-missing"), link("n2")],
                "research": [link("r1")]
            }
        }],
        "includes": {
            "Entry": [
                {
                    "sys": { "id": "hero" },
                    "fields": { "heading": "Systems Lab", "tagline": "We build things", "image": asset_link("missing") }
                },
                { "sys": { "id": "n1" }, "fields": { "title": "First", "published": true } },
                { "sys": { "id": "n2" }, "fields": { "title": "Second", "published": true } },
                {
                    "sys": { "id": "r1" },
                    "fields": { "title": "Networks", "members": [link("p-missing")], "projects": [link("pr1")] }
                },
                { "sys": { "id": "pr1" }, "fields": { "title": "Mesh", "slug": "mesh" } }
            ]
        }
    })
}

#[tokio::test]
async fn test_home_tolerates_unresolved_parts() {
    let (content, _) = content(FakeSource::default().with("homeSection", home()));
    let home = content.home().await.unwrap().unwrap();
    let news = home.news.iter().map(|a| a.title.as_str()).collect::<Vec<_>>();
    assert_eq!(news, vec!["First", "Second"]);
    let hero = home.hero.unwrap();
    assert_eq!(hero.heading, "Systems Lab");
    assert_eq!(hero.image.url, PLACEHOLDER);
    assert_eq!(home.research.len(), 1);
    assert!(home.research[0].members.is_empty());
    assert_eq!(home.research[0].projects[0].slug, "mesh");
}

#[tokio::test]
async fn test_home_without_hero() {
    let mut envelope = home();
    envelope["items"][0]["fields"]["hero"] = link("gone");
    let (content, _) = content(FakeSource::default().with("homeSection", envelope));
    let home = content.home().await.unwrap().unwrap();
    assert!(home.hero.is_none());
    assert_eq!(home.news.len(), 2);
    assert_eq!(home.research.len(), 1);
}

#[tokio::test]
async fn test_single_entry_pages_absent() {
    let (content, _) = content(FakeSource::default());
    assert!(content.about().await.unwrap().is_none());
    assert!(content.contact().await.unwrap().is_none());
    assert!(content.home().await.unwrap().is_none());
}

#[tokio::test]
async fn test_open_opportunities_use_clock() {
    let source = FakeSource::default().with(
        "opportunity",
        json!({
            "items": [
                { "sys": { "id": "o1" }, "fields": { "title": "Postdoc", "deadline": "2024-06-01" } },
                { "sys": { "id": "o2" }, "fields": { "title": "Intern", "deadline": "2024-07-01" } },
                { "sys": { "id": "o3" }, "fields": { "title": "Closed", "isOpen": false } }
            ]
        }),
    );
    let (content, _) = content(source);
    let open = content.open_opportunities().await.unwrap();
    let titles = open.iter().map(|o| o.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Intern"]);
}

#[tokio::test]
async fn test_http_round_trip_is_cached() {
    let server = httpmock::MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/entries")
            .query_param("content_type", "mediaItem")
            .header("authorization", "Bearer token");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                json!({
                    "items": [{ "sys": { "id": "m1" }, "fields": { "title": "Interview", "date": "2024-01-10" } }]
                })
                .to_string(),
            );
    });
    let fetcher = crate::fetch::HttpFetcher::new(
        url::Url::parse(&server.url("/entries")).unwrap(),
        "token",
    );
    let content = Content::new(fetcher, Cache::new(MemoryStore::default()), PLACEHOLDER);
    let first = content.media().await.unwrap();
    let second = content.media().await.unwrap();
    mock.assert();
    assert_eq!(first, second);
    assert_eq!(first[0].display_date, "January 10, 2024");
}
