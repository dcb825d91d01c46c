//! Indexes a handful of tweets in the in-memory store and searches for the ones posted by `dog`.
//!
//! Run with `RUST_LOG=searchlayer_core=debug` to see the repository traffic.

use chrono::{DateTime, TimeDelta, Utc};
use searchlayer::{memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize, Searchable)]
#[search(index = "twitter", document_type = "tweet")]
#[serde(rename_all = "camelCase")]
struct Tweet {
    #[search(id, auto_generate)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[search(kind = "string")]
    user: String,
    #[search(kind = "date")]
    post_date: DateTime<Utc>,
    #[search(kind = "string", filterable = false, free_text_searchable = true)]
    message: String,
}

impl Tweet {
    fn new(user: &str, post_date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user: user.to_string(),
            post_date,
            message: format!("herro, this is {user}?"),
        }
    }
}

fn tweets() -> Vec<Tweet> {
    let today = Utc::now();
    let days = [today, today - TimeDelta::days(1), today - TimeDelta::days(3)];

    days.into_iter()
        .flat_map(|day| ["dog", "cat", "derpina"].map(|user| Tweet::new(user, day)))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), RepositoryError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::builder(&store).bulk_size(4).build()?;

    let settings = IndexSettings::from([("index.storage.type".to_string(), "memory".to_string())]);

    repository.delete_index().await?;
    repository.create_index_with_settings(settings).await?;
    repository.create_mapping().await?;
    repository.index_objects(&tweets()).await?;

    let query = ComplexQuery::builder()
        .filter(Filter::eq("user", "dog"))
        .sort("postDate", SortDirection::Desc)
        .build();

    let results = repository.execute_search(&query).await?;
    info!(total_hits = results.total_hits, "found dog tweets");

    for result in results {
        println!("dog tweet: {} ({})", result.document.message, result.document.post_date);
    }

    repository.delete_index().await?;

    Ok(())
}
