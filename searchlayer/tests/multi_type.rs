use searchlayer::{index::TYPE_NAME_STRATEGY, memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
#[search(index = "social", document_type = "tweet")]
struct Tweet {
    #[search(id)]
    id: String,
    #[search(kind = "string", filterable = false, free_text_searchable = true)]
    message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
#[search(index = "social", document_type = "retweet")]
struct Retweet {
    #[search(id)]
    id: String,
    #[search(kind = "string", filterable = false, free_text_searchable = true)]
    message: String,
    #[search(kind = "string")]
    original: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
#[search(strategy = "type_name", document_type = "Profile")]
struct Profile {
    #[search(id)]
    id: String,
    #[search(kind = "string", filterable = true, free_text_searchable = true)]
    bio: String,
}

fn registry() -> Arc<TypeRegistry> {
    Arc::new(
        TypeRegistry::new()
            .register::<Tweet>()
            .register::<Retweet>()
            .register::<Profile>(),
    )
}

async fn seed(store: &InMemoryStore) {
    let tweets = Repository::<Tweet, _>::new(store).unwrap();
    let retweets = Repository::<Retweet, _>::new(store).unwrap();
    let profiles = Repository::<Profile, _>::new(store).unwrap();

    tweets
        .index_objects(&[
            Tweet {
                id: "t1".to_string(),
                message: "my dog is lazy".to_string(),
            },
            Tweet {
                id: "t2".to_string(),
                message: "my cat is not".to_string(),
            },
        ])
        .await
        .unwrap();
    retweets
        .index_object(&Retweet {
            id: "r1".to_string(),
            message: "lazy dog alert".to_string(),
            original: "t1".to_string(),
        })
        .await
        .unwrap();
    profiles
        .index_object(&Profile {
            id: "p1".to_string(),
            bio: "dog person".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn type_name_strategy_lower_cases_the_document_type() {
    let store = InMemoryStore::new();
    let profiles = Repository::<Profile, _>::new(&store).unwrap();

    assert_eq!(Profile::schema().index().unwrap().strategy, TYPE_NAME_STRATEGY);
    assert_eq!(profiles.index(), "profile");
    assert_eq!(profiles.document_type(), "Profile");
}

#[tokio::test]
async fn searches_every_candidate_and_decodes_each_hit() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let search = MultiTypeRepository::new(&store, registry());

    let query = ComplexQuery::builder()
        .candidates(["tweet", "retweet", "Profile"])
        .query(Filter::or([
            Filter::matches("message", "dog"),
            Filter::matches("bio", "dog"),
        ]))
        .build();
    let results = search.execute_search(&query).await.unwrap();

    assert_eq!(results.total_hits, 3);

    let mut kinds: Vec<_> = results
        .iter()
        .map(|result| (result.document_type.as_str(), result.id.as_str()))
        .collect();
    kinds.sort();
    assert_eq!(kinds, [("Profile", "p1"), ("retweet", "r1"), ("tweet", "t1")]);

    for result in results {
        assert_eq!(result.document.document_type_name(), result.document_type);
        match result.document_type.as_str() {
            "tweet" => assert!(result.document.is::<Tweet>()),
            "retweet" => {
                let retweet = result.document.downcast_ref::<Retweet>().unwrap();
                assert_eq!(retweet.original, "t1");
            }
            _ => assert_eq!(result.document.downcast_ref::<Profile>().unwrap().bio, "dog person"),
        }
    }
}

#[tokio::test]
async fn only_candidate_types_are_searched() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let search = MultiTypeRepository::new(&store, registry());

    let results = search
        .execute_search(&ComplexQuery::builder().candidate("retweet").build())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results.iter().next().unwrap().document.document_id().as_deref(), Some("r1"));
}

#[tokio::test]
async fn a_query_without_candidates_is_rejected() {
    let search = MultiTypeRepository::new(InMemoryStore::new(), registry());

    let err = search.execute_search(&ComplexQuery::new()).await.unwrap_err();

    assert_eq!(err.operation, Operation::ExecuteSearch);
    assert!(matches!(err.cause(), SearchLayerError::Validation(_)));
}

#[tokio::test]
async fn unregistered_candidates_are_resolution_errors() {
    let search = MultiTypeRepository::new(InMemoryStore::new(), registry());

    let err = search
        .execute_search(&ComplexQuery::builder().candidate("like").build())
        .await
        .unwrap_err();

    assert!(matches!(err.cause(), SearchLayerError::Resolution(_)));
}
