use async_trait::async_trait;
use searchlayer::{
    client::{
        BulkItemResponse, BulkRequest, DocumentStoreClient, GetResponse, IndexSettings, SearchHit,
        SearchRequest, SearchResponse,
    },
    memory::InMemoryStore,
    prelude::*,
};
use serde::{Deserialize, Serialize, Serializer, ser::Error as _};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
#[search(index = "twitter", document_type = "tweet")]
#[serde(rename_all = "camelCase")]
struct Tweet {
    #[search(id)]
    id: String,
    #[search(kind = "string")]
    user: String,
    #[search(kind = "string", filterable = false, free_text_searchable = true)]
    message: String,
    #[search(kind = "integer")]
    likes: u32,
}

fn tweet(id: &str, user: &str, message: &str, likes: u32) -> Tweet {
    Tweet {
        id: id.to_string(),
        user: user.to_string(),
        message: message.to_string(),
        likes,
    }
}

fn tweets(count: usize) -> Vec<Tweet> {
    (0..count)
        .map(|i| tweet(&format!("t{i}"), "kimchy", &format!("tweet number {i}"), i as u32))
        .collect()
}

/// A field that refuses to serialize when poisoned.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Poison(bool);

impl Serialize for Poison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            true => Err(S::Error::custom("poisoned value")),
            false => serializer.serialize_bool(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
#[search(index = "notes", document_type = "note")]
struct Note {
    #[search(id)]
    id: String,
    poison: Poison,
}

#[derive(Debug, Clone, Serialize, Deserialize, Searchable)]
#[search(index = "events", document_type = "event")]
struct Event {
    #[search(id, auto_generate)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[search(kind = "string")]
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Searchable)]
struct Unbound {
    name: String,
}

/// Records the bulk traffic of an in-memory store and optionally injects a foreign search hit.
#[derive(Debug, Default)]
struct RecordingClient {
    inner: InMemoryStore,
    bulks: Mutex<Vec<(usize, bool)>>,
    bulk_ids: Mutex<Vec<Vec<String>>>,
    foreign_hit: Option<SearchHit>,
}

impl RecordingClient {
    fn bulks(&self) -> Vec<(usize, bool)> {
        self.bulks.lock().unwrap().clone()
    }

    /// The document ids of each bulk call, in the order they were sent.
    fn bulk_ids(&self) -> Vec<Vec<String>> {
        self.bulk_ids.lock().unwrap().clone()
    }
}

fn ids_of(batch: &[Tweet]) -> Vec<String> {
    batch.iter().map(|t| t.id.clone()).collect()
}

#[async_trait]
impl DocumentStoreClient for RecordingClient {
    async fn put_document(
        &self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        body: String,
        refresh: bool,
    ) -> SearchLayerResult<String> {
        self.inner.put_document(index, doc_type, id, body, refresh).await
    }

    async fn bulk(
        &self,
        requests: Vec<BulkRequest>,
        refresh: bool,
    ) -> SearchLayerResult<Vec<BulkItemResponse>> {
        self.bulks.lock().unwrap().push((requests.len(), refresh));
        self.bulk_ids.lock().unwrap().push(
            requests
                .iter()
                .filter_map(|request| request.id().map(str::to_string))
                .collect(),
        );
        self.inner.bulk(requests, refresh).await
    }

    async fn get_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<GetResponse> {
        self.inner.get_document(index, doc_type, id).await
    }

    async fn multi_get_documents(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> SearchLayerResult<Vec<GetResponse>> {
        self.inner.multi_get_documents(index, doc_type, ids).await
    }

    async fn delete_document(&self, index: &str, doc_type: &str, id: &str) -> SearchLayerResult<()> {
        self.inner.delete_document(index, doc_type, id).await
    }

    async fn delete_by_query(&self, index: &str, query: &Expr) -> SearchLayerResult<()> {
        self.inner.delete_by_query(index, query).await
    }

    async fn search(&self, request: SearchRequest) -> SearchLayerResult<SearchResponse> {
        let mut response = self.inner.search(request).await?;

        if let Some(hit) = &self.foreign_hit {
            response.hits.push(hit.clone());
            response.total_hits += 1;
        }

        Ok(response)
    }

    async fn create_index(&self, name: &str, settings: Option<IndexSettings>) -> SearchLayerResult<()> {
        self.inner.create_index(name, settings).await
    }

    async fn delete_index(&self, name: &str) -> SearchLayerResult<()> {
        self.inner.delete_index(name).await
    }

    async fn index_exists(&self, name: &str) -> SearchLayerResult<bool> {
        self.inner.index_exists(name).await
    }

    async fn put_mapping(&self, index: &str, doc_type: &str, mapping: String) -> SearchLayerResult<()> {
        self.inner.put_mapping(index, doc_type, mapping).await
    }
}

#[tokio::test]
async fn binds_index_and_document_type() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();

    assert_eq!(repository.index(), "twitter");
    assert_eq!(repository.document_type(), "tweet");
    assert_eq!(repository.bulk_size(), 50);
}

#[tokio::test]
async fn binding_without_index_configuration_fails() {
    let store = InMemoryStore::new();
    let err = Repository::<Unbound, _>::new(&store).unwrap_err();

    assert_eq!(err.operation, Operation::Bind);
    assert!(matches!(err.cause(), SearchLayerError::Configuration(_)));
}

#[tokio::test]
async fn zero_bulk_size_is_rejected() {
    let store = InMemoryStore::new();
    let err = Repository::<Tweet, _>::builder(&store)
        .settings(RepositorySettings::new(0))
        .build()
        .unwrap_err();

    assert!(matches!(err.cause(), SearchLayerError::Validation(_)));
}

#[tokio::test]
async fn index_and_get_round_trip() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();
    let original = tweet("1", "kimchy", "trying out search", 3);

    let id = repository.index_object(&original).await.unwrap();

    assert_eq!(id, "1");
    assert_eq!(repository.get_object("1").await.unwrap(), Some(original));
    assert_eq!(repository.get_object("2").await.unwrap(), None);
}

#[tokio::test]
async fn get_objects_skips_missing_ids() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();
    repository.index_objects(&tweets(3)).await.unwrap();

    let found = repository.get_objects(["t2", "missing", "t0"]).await.unwrap();
    let ids: Vec<_> = found.iter().map(|t| t.id.as_str()).collect();

    assert_eq!(ids, ["t2", "t0"]);
    assert!(repository.get_objects(Vec::<String>::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn index_objects_sends_one_bulk_per_chunk() {
    let client = RecordingClient::default();
    let repository = Repository::<Tweet, _>::builder(&client)
        .bulk_size(3)
        .build()
        .unwrap();

    let batch = tweets(7);

    repository.index_objects(&batch).await.unwrap();

    assert_eq!(client.bulks(), [(3, true), (3, true), (1, true)]);
    assert_eq!(client.bulk_ids().concat(), ids_of(&batch));
    assert_eq!(client.inner.document_count("twitter").await, 7);
}

#[tokio::test]
async fn empty_batches_send_nothing() {
    let client = RecordingClient::default();
    let repository = Repository::<Tweet, _>::new(&client).unwrap();

    repository.index_objects(&[]).await.unwrap();
    repository.delete_objects(&[]).await.unwrap();

    assert!(client.bulks().is_empty());
}

#[tokio::test]
async fn serialization_failure_keeps_earlier_chunks() {
    let client = RecordingClient::default();
    let repository = Repository::<Note, _>::builder(&client)
        .bulk_size(2)
        .build()
        .unwrap();

    let notes: Vec<_> = (0..5)
        .map(|i| Note {
            id: format!("n{i}"),
            poison: Poison(i == 3),
        })
        .collect();

    let err = repository.index_objects(&notes).await.unwrap_err();

    assert_eq!(err.operation, Operation::IndexObjects);
    assert!(matches!(err.cause(), SearchLayerError::Serialization(_)));
    assert!(err.context.contains("n3"));
    assert_eq!(client.bulks(), [(2, true)]);
    assert_eq!(client.inner.document_count("notes").await, 2);
}

#[tokio::test]
async fn delete_objects_is_chunked_without_refresh() {
    let client = RecordingClient::default();
    let repository = Repository::<Tweet, _>::builder(&client)
        .bulk_size(3)
        .build()
        .unwrap();
    let batch = tweets(7);

    repository.index_objects(&batch).await.unwrap();
    repository.delete_objects(&batch).await.unwrap();

    assert_eq!(
        client.bulks(),
        [(3, true), (3, true), (1, true), (3, false), (3, false), (1, false)]
    );

    let sent = client.bulk_ids();
    assert_eq!(sent[..3].concat(), ids_of(&batch));
    assert_eq!(sent[3..].concat(), ids_of(&batch));
    assert_eq!(client.inner.document_count("twitter").await, 0);
}

#[tokio::test]
async fn delete_object_removes_the_document() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();
    let original = tweet("1", "kimchy", "soon gone", 0);

    repository.index_object(&original).await.unwrap();
    repository.delete_object(&original).await.unwrap();

    assert_eq!(repository.get_object("1").await.unwrap(), None);
}

#[tokio::test]
async fn auto_generated_ids_come_from_the_store() {
    let store = InMemoryStore::new();
    let repository = Repository::<Event, _>::new(&store).unwrap();

    let id = repository
        .index_object(&Event {
            id: None,
            name: "launch".to_string(),
        })
        .await
        .unwrap();

    let stored = repository.get_object(&id).await.unwrap().unwrap();
    assert_eq!(stored.name, "launch");
}

#[tokio::test]
async fn deleting_without_an_id_is_a_validation_error() {
    let store = InMemoryStore::new();
    let repository = Repository::<Event, _>::new(&store).unwrap();

    let err = repository
        .delete_object(&Event {
            id: None,
            name: "orphan".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.operation, Operation::DeleteObject);
    assert!(matches!(err.cause(), SearchLayerError::Validation(_)));
}

#[tokio::test]
async fn index_lifecycle_no_ops_return_false() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();

    assert!(!repository.delete_index().await.unwrap());
    assert!(!repository.index_exists().await.unwrap());

    let settings = IndexSettings::from([("number_of_shards".to_string(), "1".to_string())]);
    assert!(repository.create_index_with_settings(settings.clone()).await.unwrap());
    assert!(!repository.create_index().await.unwrap());
    assert!(repository.index_exists().await.unwrap());
    assert_eq!(store.settings("twitter").await, Some(settings));

    assert!(repository.delete_index().await.unwrap());
    assert!(!repository.index_exists().await.unwrap());
}

#[tokio::test]
async fn create_mapping_installs_the_derived_mapping() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();

    repository.create_index().await.unwrap();
    repository.create_mapping().await.unwrap();

    assert_eq!(
        store.mapping("twitter", "tweet").await,
        Some(MappingSerializer.to_value(&repository.mapping()).unwrap())
    );
}

#[tokio::test]
async fn create_mapping_requires_the_index() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();

    let err = repository.create_mapping().await.unwrap_err();

    assert_eq!(err.operation, Operation::CreateMapping);
    assert!(matches!(err.cause(), SearchLayerError::StoreOperation(_)));
}

#[tokio::test]
async fn search_scores_and_counts_before_paging() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();
    repository
        .index_objects(&[
            tweet("1", "kimchy", "the lazy dog sleeps", 1),
            tweet("2", "shay", "a cat and a dog", 2),
            tweet("3", "clint", "no animals here", 3),
            tweet("4", "kimchy", "lazy dog, lazy day", 4),
        ])
        .await
        .unwrap();

    let query = ComplexQuery::builder()
        .query(Filter::matches("message", "lazy dog"))
        .build();
    let results = repository.execute_search(&query).await.unwrap();

    assert_eq!(results.total_hits, 3);
    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["1", "4", "2"]);
    assert_eq!(results.iter().next().unwrap().score, Some(2.0));

    let page = repository
        .execute_search(
            &ComplexQuery::builder()
                .query(Filter::matches("message", "lazy dog"))
                .offset(1)
                .limit(1)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(page.total_hits, 3);
    assert_eq!(page.into_documents(), [tweet("4", "kimchy", "lazy dog, lazy day", 4)]);
}

#[tokio::test]
async fn search_filters_and_sorts() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();
    repository.index_objects(&tweets(5)).await.unwrap();
    repository
        .index_object(&tweet("x", "shay", "elsewhere", 100))
        .await
        .unwrap();

    let query = ComplexQuery::builder()
        .filter(Filter::eq("user", "kimchy").and(Filter::gte("likes", 2)))
        .sort("likes", SortDirection::Desc)
        .build();
    let results = repository.execute_search(&query).await.unwrap();

    let likes: Vec<_> = results.into_documents().into_iter().map(|t| t.likes).collect();
    assert_eq!(likes, [4, 3, 2]);
}

#[tokio::test]
async fn search_results_page_through_pagination_params() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();
    repository.index_objects(&tweets(5)).await.unwrap();

    let params = PaginationParams::new(2, 2);
    let query = ComplexQuery::builder()
        .sort("likes", SortDirection::Asc)
        .paginate(&params)
        .build();
    let page = repository.execute_search(&query).await.unwrap().into_page(&params);

    let likes: Vec<_> = page.items.iter().map(|r| r.document.likes).collect();
    assert_eq!(likes, [2, 3]);
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn delete_by_query_removes_matching_documents() {
    let store = InMemoryStore::new();
    let repository = Repository::<Tweet, _>::new(&store).unwrap();
    repository.index_objects(&tweets(4)).await.unwrap();

    repository.delete_by_query(None).await.unwrap();
    assert_eq!(store.document_count("twitter").await, 4);

    repository
        .delete_by_query(Some(&Filter::lt("likes", 2)))
        .await
        .unwrap();
    assert_eq!(store.document_count("twitter").await, 2);
}

#[tokio::test]
async fn foreign_hits_are_resolution_errors() {
    let client = RecordingClient {
        foreign_hit: Some(SearchHit {
            index: "twitter".to_string(),
            doc_type: "retweet".to_string(),
            id: "r1".to_string(),
            score: 1.0,
            source: Some(r#"{"id":"r1"}"#.to_string()),
        }),
        ..Default::default()
    };
    let repository = Repository::<Tweet, _>::new(&client).unwrap();
    repository.index_objects(&tweets(1)).await.unwrap();

    let err = repository
        .execute_search(&ComplexQuery::new())
        .await
        .unwrap_err();

    assert_eq!(err.operation, Operation::ExecuteSearch);
    match err.cause() {
        SearchLayerError::Resolution(message) => assert!(message.contains("r1")),
        other => panic!("unexpected error: {other:?}"),
    }
}
