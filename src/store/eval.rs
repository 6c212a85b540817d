use bson::Bson;

use crate::query::Filter;
use crate::types::Document;

const MAX_PATH_DEPTH: usize = 32;

/// True when every condition of `filter` holds for `doc`.
pub fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    filter.iter().all(|(path, want)| get_path(doc, path).is_some_and(|v| value_equals(v, want)))
}

// Arrays match when any element matches, as document stores usually do.
fn value_equals(v: &Bson, want: &str) -> bool {
    match v {
        Bson::String(s) => s == want,
        Bson::ObjectId(oid) => oid.to_hex() == want,
        Bson::Array(items) => items.iter().any(|i| value_equals(i, want)),
        _ => false,
    }
}

/// Resolves a dotted path such as `fields.city`.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    if path.is_empty() {
        return None;
    }
    let mut parts = path.split('.').peekable();
    let mut cur = doc;
    let mut depth = 0usize;
    while let Some(part) = parts.next() {
        depth += 1;
        if depth > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

/// Appends the value at `path` to `out` unless already present; arrays contribute
/// their elements.
pub fn collect_distinct(doc: &Document, path: &str, out: &mut Vec<Bson>) {
    match get_path(doc, path) {
        Some(Bson::Array(items)) => {
            for i in items {
                push_unique(out, i);
            }
        }
        Some(v) => push_unique(out, v),
        None => {}
    }
}

fn push_unique(out: &mut Vec<Bson>, v: &Bson) {
    if !out.contains(v) {
        out.push(v.clone());
    }
}
