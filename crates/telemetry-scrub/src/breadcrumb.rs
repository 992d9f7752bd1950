//! Breadcrumb scrubbing.
//!
//! Only two categories carry user data in their `data` mapping:
//!
//! - `http`: the raw `url` (with query filters such as `user_id=eq.…`) is
//!   dropped and replaced by the REST table name when one can be extracted.
//! - `navigation`: `from` and `to` routes lose their query strings.
//!
//! Everything else passes through.

use tracing::debug;

use crate::error::Result;
use crate::redact::{extract_table_name, strip_query, RedactionEngine};
use crate::scrubber::Step;
use crate::value::{Mapping, Value};

/// Breadcrumb category for HTTP requests.
pub const HTTP_CATEGORY: &str = "http";

/// Breadcrumb category for route transitions.
pub const NAVIGATION_CATEGORY: &str = "navigation";

/// Steps applied to every breadcrumb, in order.
pub(crate) const STEPS: &[Step] = &[("http", scrub_http), ("navigation", scrub_navigation)];

/// The breadcrumb's `data` mapping when its category is `category`.
fn data_for(breadcrumb: &Mapping, category: &str) -> Result<Option<Mapping>> {
    let matches = breadcrumb
        .try_get("category")?
        .is_some_and(|c| c.as_str() == Some(category));
    if !matches {
        return Ok(None);
    }
    match breadcrumb.try_get("data")? {
        Some(Value::Mapping(data)) => Ok(Some(data)),
        _ => Ok(None),
    }
}

fn scrub_http(_engine: &RedactionEngine, breadcrumb: &Mapping) -> Result<()> {
    let Some(data) = data_for(breadcrumb, HTTP_CATEGORY)? else {
        return Ok(());
    };

    let data = data.try_copy()?;
    let url = data.try_remove("url")?;
    let table = extract_table_name(url.as_ref().and_then(Value::as_str));
    debug!(table = table.as_deref().unwrap_or("-"), "HTTP breadcrumb url removed");
    if let Some(table) = table {
        data.try_insert("table", table)?;
    }
    breadcrumb.try_insert("data", data)?;
    Ok(())
}

fn scrub_navigation(_engine: &RedactionEngine, breadcrumb: &Mapping) -> Result<()> {
    let Some(data) = data_for(breadcrumb, NAVIGATION_CATEGORY)? else {
        return Ok(());
    };

    let data = data.try_copy()?;
    for key in ["from", "to"] {
        if let Some(Value::String(route)) = data.try_get(key)? {
            let stripped = strip_query(&route);
            if stripped.len() != route.len() {
                data.try_insert(key, stripped)?;
            }
        }
    }
    breadcrumb.try_insert("data", data)?;
    Ok(())
}
