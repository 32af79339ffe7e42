//! Page-number pagination with absolute `next`/`previous` links.

use axum::http::{header, HeaderMap, Uri};
use carebook_core::model::Paginated;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{RestError, RestResult};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number, or `last`.
    pub page: Option<String>,
}

/// Absolute URL of the requested collection, without its query string.
pub fn collection_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    format!("http://{host}{}", uri.path())
}

/// Cuts page `query.page` of `items`.
///
/// # Errors
///
/// Returns `RestError::InvalidPage` for pages that are not numbers or out of range.
pub fn paginate<T>(
    items: Vec<T>,
    query: &PageQuery,
    page_size: usize,
    base_url: &str,
) -> RestResult<Paginated<T>> {
    let count = items.len();
    let pages = count.div_ceil(page_size).max(1);
    let page = match query.page.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some("last") => pages,
        Some(raw) => raw.parse::<usize>().map_err(|_| RestError::InvalidPage)?,
    };
    if page == 0 || page > pages {
        return Err(RestError::InvalidPage);
    }

    let next = (page < pages).then(|| format!("{base_url}?page={}", page + 1));
    let previous = match page {
        1 => None,
        2 => Some(base_url.to_owned()),
        n => Some(format!("{base_url}?page={}", n - 1)),
    };
    let results = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Ok(Paginated {
        count: count as u64,
        next,
        previous,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://testserver/api/patients/";

    fn page(raw: Option<&str>) -> PageQuery {
        PageQuery {
            page: raw.map(str::to_owned),
        }
    }

    #[test]
    fn test_links_between_pages() {
        let items: Vec<u32> = (1..=25).collect();

        let first = paginate(items.clone(), &page(None), 10, BASE).unwrap();
        assert_eq!(first.count, 25);
        assert_eq!(first.results.len(), 10);
        assert_eq!(first.next.as_deref(), Some("http://testserver/api/patients/?page=2"));
        assert_eq!(first.previous, None);

        let second = paginate(items.clone(), &page(Some("2")), 10, BASE).unwrap();
        assert_eq!(second.previous.as_deref(), Some(BASE));

        let last = paginate(items, &page(Some("last")), 10, BASE).unwrap();
        assert_eq!(last.results, vec![21, 22, 23, 24, 25]);
        assert_eq!(last.next, None);
        assert_eq!(last.previous.as_deref(), Some("http://testserver/api/patients/?page=2"));
    }

    #[test]
    fn test_empty_collection_has_one_page() {
        let empty = paginate(Vec::<u32>::new(), &page(Some("1")), 10, BASE).unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.results.is_empty());
    }

    #[test]
    fn test_out_of_range_pages_are_rejected() {
        for raw in ["0", "4", "two", "-1"] {
            let err = paginate(vec![1, 2, 3], &page(Some(raw)), 1, BASE).expect_err(raw);
            assert!(matches!(err, RestError::InvalidPage));
        }
    }

    #[test]
    fn test_collection_url_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "example.org:8000".parse().unwrap());
        let uri: Uri = "/api/custom-fields/?page=3".parse().unwrap();
        assert_eq!(
            collection_url(&headers, &uri),
            "http://example.org:8000/api/custom-fields/"
        );
    }
}
