//! Pagination walker.
//!
//! Walks every page of one logical query, extracting records from each page
//! and following the `next` cursor until it runs out. Pages are fetched one
//! at a time, in cursor order.

use crate::error::Result;
use crate::extract::{extract, locate, resolve};
use crate::schema::FieldSchema;
use serde_json::Value;
use std::collections::HashSet;

/// Fetches the page that follows a given page.
pub trait NextPage {
    /// Return the page after `page`, or `None` at the end.
    fn next_page(&self, page: &Value) -> Result<Option<Value>>;
}

/// Extract records from `first` and every page after it.
///
/// For shapes that nest the collection one level down (e.g.
/// `{"artists": {"items": [...], "next": "..."}}`), the cursor is read from
/// the enclosing container and that container is what gets passed to
/// [`NextPage::next_page`].
///
/// Stops early, with a warning, if a page hands back any cursor that was
/// already followed, so a cycle of pages is walked once.
pub fn gather<P>(first: Value, schema: &FieldSchema, pager: &P) -> Result<Vec<Value>>
where
    P: NextPage + ?Sized,
{
    let mut data = Vec::new();
    let mut response = Some(first).filter(|v| !v.is_null());
    let mut followed: HashSet<String> = HashSet::new();

    while let Some(current) = response.take() {
        let (container, path) = locate(&current);
        match extract(container, schema) {
            Value::Array(records) => data.extend(records),
            record => data.push(record),
        }

        let page = match path {
            [parent @ .., _] if !parent.is_empty() => resolve(&current, parent).unwrap_or(&current),
            _ => &current,
        };
        let Some(cursor) = page
            .get("next")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
        else {
            break;
        };
        if !followed.insert(cursor.to_owned()) {
            tracing::warn!(cursor, "cursor already followed, stopping pagination");
            break;
        }
        response = pager.next_page(page)?.filter(|v| !v.is_null());
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Hands out canned pages and records what it was asked with.
    struct Pages {
        queue: RefCell<VecDeque<Value>>,
        asked_with: RefCell<Vec<Value>>,
    }

    impl Pages {
        fn new(pages: Vec<Value>) -> Self {
            Self {
                queue: RefCell::new(pages.into()),
                asked_with: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.asked_with.borrow().len()
        }
    }

    impl NextPage for Pages {
        fn next_page(&self, page: &Value) -> Result<Option<Value>> {
            self.asked_with.borrow_mut().push(page.clone());
            Ok(self.queue.borrow_mut().pop_front())
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> Value {
        let items: Vec<Value> = ids.iter().map(|id| json!({ "id": id, "name": "n" })).collect();
        json!({ "items": items, "next": next })
    }

    #[test]
    fn gathers_all_pages_in_order() {
        let pages = Pages::new(vec![page(&["c", "d"], Some("p3")), page(&["e"], None)]);
        let first = page(&["a", "b"], Some("p2"));

        let records = gather(first, &FieldSchema::fields(["id"]), &pages).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);
        assert_eq!(pages.calls(), 2);
    }

    #[test]
    fn nested_shape_passes_parent_container() {
        let first = json!({ "artists": { "items": [{ "id": "a" }], "next": "p2" } });
        let second = json!({ "artists": { "items": [{ "id": "b" }], "next": null } });
        let pages = Pages::new(vec![second]);

        let records = gather(first, &FieldSchema::fields(["id"]), &pages).unwrap();
        assert_eq!(records, vec![json!({ "id": "a" }), json!({ "id": "b" })]);
        assert_eq!(
            pages.asked_with.borrow()[0],
            json!({ "items": [{ "id": "a" }], "next": "p2" })
        );
    }

    #[test]
    fn flat_record_is_wrapped() {
        let pages = Pages::new(vec![]);
        let profile = json!({ "id": "me", "display_name": "Me", "country": "SE" });
        let records = gather(profile, &FieldSchema::fields(["id"]), &pages).unwrap();
        assert_eq!(records, vec![json!({ "id": "me" })]);
        assert_eq!(pages.calls(), 0);
    }

    #[test]
    fn null_response_gathers_nothing() {
        let pages = Pages::new(vec![]);
        assert!(gather(Value::Null, &FieldSchema::node(), &pages).unwrap().is_empty());
    }

    #[test]
    fn pager_returning_null_ends_the_walk() {
        let pages = Pages::new(vec![Value::Null]);
        let records = gather(page(&["a"], Some("p2")), &FieldSchema::fields(["id"]), &pages).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(pages.calls(), 1);
    }

    #[test]
    fn echoed_cursor_stops_the_walk() {
        let pages = Pages::new(vec![page(&["b"], Some("p2")), page(&["c"], None)]);
        let records = gather(page(&["a"], Some("p2")), &FieldSchema::fields(["id"]), &pages).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(pages.calls(), 1);
    }

    #[test]
    fn cursor_cycle_is_walked_once() {
        // p2 leads to p3, which points back at p2.
        let pages = Pages::new(vec![
            page(&["b"], Some("p3")),
            page(&["c"], Some("p2")),
            page(&["b"], Some("p3")),
        ]);
        let records = gather(page(&["a"], Some("p2")), &FieldSchema::fields(["id"]), &pages).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(pages.calls(), 2);
    }
}
