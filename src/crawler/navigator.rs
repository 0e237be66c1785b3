//! Page navigation over a collection's listing
//!
//! The controller only sees the `PageNavigator` seam: point it at a
//! collection, wait for the current page's payload, then ask it to advance.
//! `ApiNavigator` implements the seam against a paginated JSON listing
//! endpoint shaped like
//! `{"code":0,"data":{"list":{"vlist":[{"bvid":..,"title":..}]},"page":{"pn":..,"ps":..,"count":..}}}`.

use crate::download::{HeaderList, Transport};
use crate::model::{CollectionRef, MediaItem, PagePayload, PaginationInfo};
use crate::url::render_template;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Source of listing pages for one collection at a time
#[async_trait]
pub trait PageNavigator: Send {
    /// Positions the navigator on the first page of `collection`
    async fn navigate(&mut self, collection: &CollectionRef) -> Result<()>;

    /// Returns the payload of the current page
    async fn wait_page_data(&mut self) -> Result<PagePayload>;

    /// Moves to the next page; `false` when there is none
    async fn advance(&mut self) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    list: ListingList,
    page: PageInfo,
}

#[derive(Debug, Default, Deserialize)]
struct ListingList {
    #[serde(default)]
    vlist: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    pn: u32,
    ps: u32,
    count: u64,
}

impl PageInfo {
    fn total_pages(&self) -> u32 {
        if self.ps == 0 {
            return self.pn;
        }
        let pages = self.count.div_ceil(u64::from(self.ps));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

/// Parses one listing response into a page payload
///
/// Entries without an id are skipped; a non-zero `code` or a missing `data`
/// object is an error.
pub fn parse_listing(body: &str) -> Result<PagePayload> {
    let response: ListingResponse = serde_json::from_str(body)?;

    if response.code != 0 {
        return Err(HarvestError::Payload(format!(
            "listing returned code {}: {}",
            response.code, response.message
        )));
    }

    let data = response
        .data
        .ok_or_else(|| HarvestError::Payload("listing has no data object".to_string()))?;

    let items = data
        .list
        .vlist
        .into_iter()
        .filter_map(|entry| {
            let id = entry.get("bvid").and_then(Value::as_str)?.to_string();
            if id.is_empty() {
                return None;
            }
            let title = entry
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(MediaItem::new(id, title).with_raw(entry))
        })
        .collect();

    Ok(PagePayload {
        items,
        pagination: PaginationInfo {
            page: data.page.pn,
            total_pages: data.page.total_pages(),
        },
    })
}

/// `PageNavigator` over an HTTP JSON listing endpoint
pub struct ApiNavigator {
    transport: Arc<dyn Transport>,
    listing_url: String,
    headers: HeaderList,
    collection: Option<CollectionRef>,
    page: u32,
    total_pages: Option<u32>,
}

impl ApiNavigator {
    /// `listing_url` is a template with `{collection}` and `{page}` placeholders
    pub fn new(transport: Arc<dyn Transport>, listing_url: impl Into<String>, headers: HeaderList) -> Self {
        Self {
            transport,
            listing_url: listing_url.into(),
            headers,
            collection: None,
            page: 1,
            total_pages: None,
        }
    }

    fn current_url(&self) -> Result<String> {
        let collection = self
            .collection
            .as_ref()
            .ok_or_else(|| HarvestError::Payload("navigator has no collection".to_string()))?;
        let page = self.page.to_string();
        let url = render_template(
            &self.listing_url,
            &[("collection", collection.id.as_str()), ("page", page.as_str())],
        )?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl PageNavigator for ApiNavigator {
    async fn navigate(&mut self, collection: &CollectionRef) -> Result<()> {
        self.collection = Some(collection.clone());
        self.page = 1;
        self.total_pages = None;
        Ok(())
    }

    async fn wait_page_data(&mut self) -> Result<PagePayload> {
        let url = self.current_url()?;
        tracing::debug!("Fetching listing page {}", url);

        let body = self.transport.get_text(&url, &self.headers).await?;
        let mut payload = parse_listing(&body)?;

        // Some listings echo pn=0; trust the page that was requested.
        if payload.pagination.page == 0 {
            payload.pagination.page = self.page;
        }
        self.total_pages = Some(payload.pagination.total_pages);
        Ok(payload)
    }

    async fn advance(&mut self) -> Result<bool> {
        match self.total_pages {
            Some(total) if self.page < total => {
                self.page += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
