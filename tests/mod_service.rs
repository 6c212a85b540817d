mod common;

use bson::Bson;
use common::{FailingExecutor, series_store};
use seriesquery::service::{EmptyFilterPolicy, QueryService};
use seriesquery::{RawRequest, ResponseEnvelope};
use std::sync::Arc;

fn service() -> QueryService {
    QueryService::new(series_store())
}

fn strings(values: &[Bson]) -> Vec<&str> {
    values.iter().filter_map(Bson::as_str).collect()
}

#[tokio::test]
async fn count_only_over_everything_reports_collection_size() {
    let env = service().handle(RawRequest::new("", 0, None)).await;
    assert!(env.is_success());
    assert_eq!(env.count(), Some(4));
    let v = env.to_json().unwrap();
    assert!(v.get("content").is_none());
    assert!(v.get("distinct").is_none());
    assert_eq!(v["len"], 4);
}

#[tokio::test]
async fn uid_lookup_returns_the_single_series() {
    let env = service().handle(RawRequest::new("uid=abc123", -1, None)).await;
    let docs = env.documents().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].get_str("_id").unwrap(), "abc123");
    assert_eq!(env.count(), Some(1));

    let missing = service().handle(RawRequest::new("uid=nope", -1, None)).await;
    assert_eq!(missing.documents().map(<[_]>::len), Some(0));
    assert_eq!(missing.count(), Some(0));
}

#[tokio::test]
async fn schema_keys_cover_every_document() {
    let env = service().handle(RawRequest::new("", 0, Some(vec!["fields".into()]))).await;
    let keys = env.distinct().unwrap().get("fields").unwrap();
    assert_eq!(strings(keys), vec!["age", "city", "estado", "sexo"]);
    assert_eq!(env.count(), Some(4));
}

#[tokio::test]
async fn malformed_query_yields_error_only() {
    let env = service().handle(RawRequest::new("badtoken", -1, Some(vec!["city".into()]))).await;
    assert!(!env.is_success());
    let v = env.to_json().unwrap();
    assert_eq!(v["success"], false);
    assert!(!v["error"].as_str().unwrap().is_empty());
    for key in ["content", "len", "distinct"] {
        assert!(v.get(key).is_none(), "unexpected key {key}");
    }
}

#[tokio::test]
async fn bounded_pages_but_counts_whole_match() {
    let env = service().handle(RawRequest::new("city=Recife", 1, None)).await;
    assert_eq!(env.documents().unwrap().len(), 1);
    assert_eq!(env.count(), Some(2));

    let wide = service().handle(RawRequest::new("city=Recife", 50, None)).await;
    assert_eq!(wide.documents().unwrap().len(), 2);
    assert_eq!(wide.count(), Some(2));
}

#[tokio::test]
async fn every_condition_must_hold() {
    let env = service().handle(RawRequest::new("city=Recife sexo=Feminino", -1, None)).await;
    let docs = env.documents().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].get_str("_id").unwrap(), "abc123");
}

#[tokio::test]
async fn distinct_is_scoped_by_filter_and_keeps_request_order() {
    let env = service()
        .handle(RawRequest::new("city=Recife", 0, Some(vec!["sexo".into(), "fields".into(), "city".into()])))
        .await;
    let d = env.distinct().unwrap();
    assert_eq!(d.keys().collect::<Vec<_>>(), vec!["sexo", "fields", "city"]);
    assert_eq!(strings(d.get("sexo").unwrap()), vec!["Feminino", "Masculino"]);
    assert_eq!(strings(d.get("fields").unwrap()), vec!["age", "city", "sexo"]);
    assert_eq!(strings(d.get("city").unwrap()), vec!["Recife"]);

    let v = env.to_json().unwrap();
    let order: Vec<&str> = v["distinct"].as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(order, vec!["sexo", "fields", "city"]);

    let line = serde_json::to_string(&env).unwrap();
    let (sexo, fields, city) =
        (line.find("\"sexo\":").unwrap(), line.find("\"fields\":").unwrap(), line.find("\"city\":").unwrap());
    assert!(sexo < fields && fields < city, "{line}");
}

#[tokio::test]
async fn schema_keys_are_idempotent() {
    let s = service();
    let once = s.handle(RawRequest::new("", 0, Some(vec!["fields".into()]))).await;
    let again = s.handle(RawRequest::new("", 0, Some(vec!["fields".into()]))).await;
    assert_eq!(once, again);

    let doubled = s.handle(RawRequest::new("", 0, Some(vec!["fields".into(), "fields".into()]))).await;
    assert_eq!(doubled.distinct().unwrap().len(), 1);
    assert_eq!(doubled.distinct(), once.distinct());
}

#[tokio::test]
async fn unknown_distinct_field_is_empty_not_an_error() {
    let env = service().handle(RawRequest::new("", 0, Some(vec!["nonexistent".into()]))).await;
    assert!(env.is_success());
    assert_eq!(env.distinct().unwrap().get("nonexistent"), Some(&[][..]));
}

#[tokio::test]
async fn empty_filter_policy_decides_unbounded_dump() {
    let counted = service().handle(RawRequest::new("", -1, None)).await;
    assert_eq!(counted.documents(), None);
    assert_eq!(counted.count(), Some(4));

    let all = QueryService::new(series_store())
        .with_empty_filter_policy(EmptyFilterPolicy::ReturnAll)
        .handle(RawRequest::new("", -1, None))
        .await;
    assert_eq!(all.documents().unwrap().len(), 4);
    assert_eq!(all.count(), Some(4));

    let omitted = QueryService::new(series_store())
        .with_empty_filter_policy(EmptyFilterPolicy::Omit)
        .handle(RawRequest::new("", -1, None))
        .await;
    assert_eq!(omitted.to_json().unwrap(), serde_json::json!({"success": true}));
}

#[tokio::test]
async fn invalid_length_is_rejected_before_the_store() {
    let env = service().handle(RawRequest::new("city=Recife", -2, None)).await;
    assert!(env.error_message().unwrap().contains("-2"));
}

#[tokio::test]
async fn wire_requests_accept_string_distinct_and_string_len() {
    let raw = RawRequest::from_json_str(r#"{"query":"city=Natal","len":"-1","distinct":"estado"}"#).unwrap();
    let env = service().handle(raw).await;
    assert_eq!(env.count(), Some(1));
    assert_eq!(strings(env.distinct().unwrap().get("estado").unwrap()), vec!["RN"]);
}

#[tokio::test]
async fn wire_request_with_array_query_is_rejected() {
    let raw = RawRequest::from_json_str(r#"{"query":["a=1","b=2"],"len":0}"#).unwrap();
    let env = service().handle(raw).await;
    assert!(!env.is_success());
}

#[tokio::test]
async fn failing_distinct_lookup_fails_the_whole_request() {
    let mut exec = FailingExecutor::new(series_store());
    exec.fail_distinct_on = Some("fields.sexo".into());
    let s = QueryService::new(Arc::new(exec));
    let env = s
        .handle(RawRequest::new("", 0, Some(vec!["city".into(), "sexo".into(), "fields".into()])))
        .await;
    match &env {
        ResponseEnvelope::Err { message } => assert!(message.contains("sexo"), "{message}"),
        ResponseEnvelope::Ok { .. } => panic!("expected an error envelope"),
    }
    assert_eq!(env.distinct(), None);
    assert_eq!(env.count(), None);
}

#[tokio::test]
async fn failing_count_fails_even_when_distinct_succeeds() {
    let mut exec = FailingExecutor::new(series_store());
    exec.fail_count = true;
    let s = QueryService::new(Arc::new(exec));
    let env = s.handle(RawRequest::new("", 0, Some(vec!["city".into()]))).await;
    assert!(env.error_message().unwrap().contains("count refused"));
}

#[tokio::test]
async fn failing_find_is_a_store_failure() {
    let mut exec = FailingExecutor::new(series_store());
    exec.fail_find = true;
    let s = QueryService::new(Arc::new(exec));
    let env = s.handle(RawRequest::new("uid=abc123", -1, None)).await;
    assert!(env.error_message().unwrap().starts_with("Store failure"));
}

#[tokio::test]
async fn concurrent_requests_share_one_service() {
    let s = Arc::new(service());
    let mut set = tokio::task::JoinSet::new();
    for city in ["Recife", "Natal", "Recife", "Olinda"] {
        let s = Arc::clone(&s);
        set.spawn(async move { (city, s.handle(RawRequest::new(&format!("city={city}"), 0, None)).await) });
    }
    while let Some(joined) = set.join_next().await {
        let (city, env) = joined.unwrap();
        let expected = match city {
            "Recife" => 2,
            "Natal" => 1,
            _ => 0,
        };
        assert_eq!(env.count(), Some(expected));
    }
}
