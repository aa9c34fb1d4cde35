use std::cmp::Ordering;

use serde_json::{json, Value as JsonValue};

/// Document list predicate, sort or paging option.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
  Equal(String, Vec<JsonValue>),
  Search(String, String),
  OrderDesc(String),
  OrderAsc(String),
  Limit(u64),
  Offset(u64),
}

impl Query {
  pub fn equal<V: Into<JsonValue>>(attribute: &str, values: impl IntoIterator<Item = V>) -> Self {
    Query::Equal(attribute.to_string(), values.into_iter().map(Into::into).collect())
  }

  pub fn search(attribute: &str, text: &str) -> Self {
    Query::Search(attribute.to_string(), text.to_string())
  }

  pub fn order_desc(attribute: &str) -> Self {
    Query::OrderDesc(attribute.to_string())
  }

  pub fn order_asc(attribute: &str) -> Self {
    Query::OrderAsc(attribute.to_string())
  }

  pub fn limit(limit: u64) -> Self {
    Query::Limit(limit)
  }

  pub fn offset(offset: u64) -> Self {
    Query::Offset(offset)
  }

  pub fn to_json(&self) -> JsonValue {
    match self {
      Query::Equal(attr, values) => json!({
        "method": "equal", "attribute": attr, "values": values,
      }),
      Query::Search(attr, text) => json!({
        "method": "search", "attribute": attr, "values": [text],
      }),
      Query::OrderDesc(attr) => json!({ "method": "orderDesc", "attribute": attr }),
      Query::OrderAsc(attr) => json!({ "method": "orderAsc", "attribute": attr }),
      Query::Limit(limit) => json!({ "method": "limit", "values": [limit] }),
      Query::Offset(offset) => json!({ "method": "offset", "values": [offset] }),
    }
  }

  /// Encoded form sent as a `queries[]` parameter.
  pub fn encode(&self) -> String {
    self.to_json().to_string()
  }

  /// Does the document pass this predicate. Sort and paging options always pass.
  pub fn matches(&self, doc: &JsonValue) -> bool {
    match self {
      Query::Equal(attr, values) => {
        let field = &doc[attr.as_str()];
        values.iter().any(|v| v == field)
      },
      Query::Search(attr, text) => {
        let field = doc[attr.as_str()].as_str().unwrap_or_default().to_lowercase();
        text.split_whitespace()
          .any(|term| field.contains(&term.to_lowercase()))
      },
      _ => true,
    }
  }
}

fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
  match (a, b) {
    (JsonValue::Number(a), JsonValue::Number(b)) => {
      let (a, b) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
      a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    },
    (JsonValue::String(a), JsonValue::String(b)) => a.cmp(b),
    (JsonValue::Bool(a), JsonValue::Bool(b)) => a.cmp(b),
    (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
    (JsonValue::Null, _) => Ordering::Less,
    (_, JsonValue::Null) => Ordering::Greater,
    _ => Ordering::Equal,
  }
}

/// Evaluate queries against in-memory documents: filter, sort, then page.
///
/// `docs` must come in insertion order; documents tied on every sort key
/// keep that order, reversed when the first sort is descending.
pub fn apply(queries: &[Query], docs: impl IntoIterator<Item = JsonValue>) -> Vec<JsonValue> {
  let mut out: Vec<(usize, JsonValue)> = docs.into_iter()
    .enumerate()
    .filter(|(_, doc)| queries.iter().all(|q| q.matches(doc)))
    .collect();

  // later sort options only break ties of earlier ones.
  let orders: Vec<(&str, bool)> = queries.iter().filter_map(|q| match q {
    Query::OrderAsc(attr) => Some((attr.as_str(), false)),
    Query::OrderDesc(attr) => Some((attr.as_str(), true)),
    _ => None,
  }).collect();
  if let Some(&(_, newest_first)) = orders.first() {
    out.sort_by(|(a_seq, a), (b_seq, b)| {
      for (attr, desc) in orders.iter() {
        let ord = compare_values(&a[*attr], &b[*attr]);
        let ord = if *desc { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
          return ord;
        }
      }
      if newest_first {
        b_seq.cmp(a_seq)
      } else {
        a_seq.cmp(b_seq)
      }
    });
  }
  let out = out.into_iter().map(|(_, doc)| doc);

  let offset = queries.iter().rev().find_map(|q| match q {
    Query::Offset(offset) => Some(*offset as usize),
    _ => None,
  }).unwrap_or(0);
  let limit = queries.iter().rev().find_map(|q| match q {
    Query::Limit(limit) => Some(*limit as usize),
    _ => None,
  });
  let iter = out.into_iter().skip(offset);
  match limit {
    Some(limit) => iter.take(limit).collect(),
    None => iter.collect(),
  }
}
