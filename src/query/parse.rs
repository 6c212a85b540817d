use crate::errors::QueryError;

use super::types::Filter;

const QUOTES: [char; 3] = ['"', '\'', '`'];

/// Parses `key=value key2="quoted value"` into a [`Filter`].
///
/// Tokens are separated by whitespace outside quotes. Each token splits at its first
/// `=`, so `k=a=b` requires `fields.k` to equal `a=b`.
///
/// # Errors
/// Returns [`QueryError::MalformedQuery`] for a token without `=`, with an empty key,
/// or with an unterminated quote.
pub fn parse_query_string(query: &str) -> Result<Filter, QueryError> {
    let mut filter = Filter::new();
    for token in tokenize(query)? {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| QueryError::MalformedQuery(format!("token '{token}' has no '='")))?;
        if key.is_empty() {
            return Err(QueryError::MalformedQuery(format!("token '{token}' has an empty key")));
        }
        filter.insert(key, value);
    }
    Ok(filter)
}

// A quote opens a run only at the start of a token or right after its first `=`;
// anywhere else it is an ordinary character.
fn opens_value(cur: &str) -> bool {
    cur.is_empty() || (cur.ends_with('=') && cur.matches('=').count() == 1)
}

/// Splits on whitespace not enclosed in matching quotes and strips the quote characters.
pub(crate) fn tokenize(input: &str) -> Result<Vec<String>, QueryError> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut in_token = false;
    let mut open: Option<char> = None;

    for c in input.chars() {
        match open {
            Some(q) if c == q => open = None,
            Some(_) => cur.push(c),
            None if QUOTES.contains(&c) && opens_value(&cur) => {
                open = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut cur));
                    in_token = false;
                }
            }
            None => {
                cur.push(c);
                in_token = true;
            }
        }
    }
    if let Some(q) = open {
        return Err(QueryError::MalformedQuery(format!("unterminated {q} in '{cur}'")));
    }
    if in_token {
        tokens.push(cur);
    }
    Ok(tokens)
}
