use seriesquery::config::ServiceConfig;
use seriesquery::errors::StoreError;
use seriesquery::query::{Filter, StoreLimit};
use seriesquery::store::{MemoryStore, QueryExecutor, load_ndjson};
use seriesquery::{RawRequest, bootstrap};
use std::io::Write;

const SEED: &str = concat!(
    "{\"_id\":\"abc123\",\"fields\":{\"city\":\"Recife\",\"tags\":[\"a\",\"b\"]},\"points\":{\"1577836800\":1.5}}\n",
    "\n",
    "{\"_id\":\"def456\",\"fields\":{\"city\":\"Natal\",\"tags\":[\"b\",\"c\"]}}\n",
);

fn seed_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(SEED.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn open_loads_ndjson_seed() {
    let f = seed_file();
    let store = MemoryStore::open(f.path()).unwrap();
    assert_eq!(store.len(), 2);
    let mut filter = Filter::new();
    filter.insert("uid", "abc123");
    let out = store.find(&filter, StoreLimit::Unlimited).unwrap();
    assert_eq!(out.matched_count, 1);
    assert_eq!(out.documents[0].get_document("points").unwrap().get_f64("1577836800").unwrap(), 1.5);
}

#[test]
fn array_values_match_any_element_and_unwind_in_distinct() {
    let store = MemoryStore::new();
    load_ndjson(&store, SEED.as_bytes()).unwrap();
    let mut filter = Filter::new();
    filter.insert("tags", "b");
    assert_eq!(store.count(&filter).unwrap(), 2);
    let tags = store.distinct("fields.tags", &Filter::new()).unwrap();
    let tags: Vec<&str> = tags.iter().filter_map(bson::Bson::as_str).collect();
    assert_eq!(tags, vec!["a", "b", "c"]);
}

#[test]
fn bad_line_is_reported_with_its_number() {
    let store = MemoryStore::new();
    let err = load_ndjson(&store, "{\"_id\":\"a\"}\n[1,2]\n".as_bytes()).unwrap_err();
    match err {
        StoreError::InvalidDocument(msg) => assert!(msg.contains("line 2"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn corrupt_seed_fails_startup() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"{not json}\n").unwrap();
    f.flush().unwrap();
    let cfg = ServiceConfig { data_path: Some(f.path().to_path_buf()), ..ServiceConfig::default() };
    assert!(matches!(bootstrap(&cfg), Err(StoreError::Connect(_))));
}

#[tokio::test]
async fn bootstrap_wires_store_into_service() {
    let f = seed_file();
    let cfg = ServiceConfig { data_path: Some(f.path().to_path_buf()), ..ServiceConfig::default() };
    let (store, service) = bootstrap(&cfg).unwrap();
    assert_eq!(store.len(), 2);

    store.upsert_fields("ghi789", bson::doc! {"city": "Recife"});
    let env = service.handle(RawRequest::new("city=Recife", -1, None)).await;
    assert_eq!(env.count(), Some(2));
}

#[tokio::test]
async fn bootstrap_without_data_starts_empty() {
    let (store, service) = bootstrap(&ServiceConfig::default()).unwrap();
    assert!(store.is_empty());
    let env = service.handle(RawRequest::new("", 0, Some(vec!["fields".into()]))).await;
    assert_eq!(env.count(), Some(0));
    assert_eq!(env.distinct().unwrap().get("fields"), Some(&[][..]));
}
