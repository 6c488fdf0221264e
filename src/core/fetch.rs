use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::domain::model::{
    fallback_date, CustomizationRecord, ItemRecord, OrderDetail, OrderSummary, UNKNOWN_ITEM,
    UNKNOWN_PERSON, UNKNOWN_STORE,
};
use crate::utils::error::{Result, ScrapeError};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

const ORDERS_QUERY: &str = r#"
    query getConsumerOrdersWithDetails($offset: Int!, $limit: Int!, $includeCancelled: Boolean) {
      getConsumerOrdersWithDetails(
        offset: $offset
        limit: $limit
        includeCancelled: $includeCancelled
      ) {
        id
        orderUuid
        createdAt
        store {
          name
        }
      }
    }
"#;

const ORDER_DETAIL_QUERY: &str = r#"
    query getConsumerOrderDetail($orderUuid: String!) {
      getConsumerOrderDetail(orderUuid: $orderUuid) {
        id
        orderUuid
        createdAt
        submittedAt
        store {
          name
        }
        creator {
          firstName
          lastName
        }
        items {
          name
          orderItemExtras {
            name
            orderItemExtraOptions {
              name
            }
          }
        }
      }
    }
"#;

/// Thin client for the two GraphQL operations the pipeline consumes.
/// Returns raw response text; parsing into the domain model happens in the
/// `parse_*` functions below so the payload can be cached verbatim.
#[derive(Clone)]
pub struct OrderApiClient {
    client: reqwest::Client,
    endpoint: String,
    cookie: String,
}

impl OrderApiClient {
    pub fn new(endpoint: &str, session_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            cookie: session_cookie(session_token),
        })
    }

    pub async fn list_summaries(&self, offset: usize, limit: usize) -> Result<String> {
        let variables = serde_json::json!({
            "offset": offset,
            "limit": limit,
            "includeCancelled": true,
        });
        self.post_query("getConsumerOrdersWithDetails", ORDERS_QUERY, variables)
            .await
    }

    pub async fn order_detail(&self, order_id: &str) -> Result<String> {
        let variables = serde_json::json!({ "orderUuid": order_id });
        self.post_query("getConsumerOrderDetail", ORDER_DETAIL_QUERY, variables)
            .await
    }

    async fn post_query(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<String> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
            "operationName": operation,
        });

        tracing::debug!(operation, "POST {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("cookie", &self.cookie)
            .header("user-agent", USER_AGENT)
            .header("accept", "*/*")
            .header("origin", "https://www.doordash.com")
            .header("referer", "https://www.doordash.com/consumer/order-history/")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScrapeError::AuthFailure {
                reason: format!("HTTP {}", status),
            });
        }
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        Ok(response.text().await?)
    }
}

/// A value that already contains semicolons is a full cookie string copied
/// from the browser; anything else is just the sessionid value.
fn session_cookie(token: &str) -> String {
    if token.contains(';') {
        token.to_string()
    } else {
        format!("sessionid={}", token)
    }
}

pub fn summary_cache_key(limit: usize, offset: usize) -> String {
    format!("summary-limit-{}-offset-{}", limit, offset)
}

pub fn detail_cache_key(order_id: &str) -> String {
    let safe: String = order_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("detail-{}", safe)
}

fn is_retriable(err: &ScrapeError) -> bool {
    match err {
        ScrapeError::ApiError(_) => true,
        ScrapeError::UnexpectedStatus { status, .. } => {
            *status == 429 || (500..=599).contains(status)
        }
        _ => false,
    }
}

/// Executes `operation` with exponential backoff on transient failures
/// (network errors, timeouts, 429/5xx). Auth failures and malformed payloads
/// are returned immediately; retrying cannot fix them.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay = base_delay * (1u32 << attempt.min(16));
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient fetch failure, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    errors: Option<Vec<ApiErrorBody>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(rename = "getConsumerOrdersWithDetails")]
    orders: Option<Vec<SummaryOrder>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryOrder {
    id: Option<String>,
    order_uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailPayload {
    #[serde(rename = "getConsumerOrderDetail")]
    order: Option<WireOrderDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrderDetail {
    id: Option<String>,
    order_uuid: Option<String>,
    created_at: Option<String>,
    submitted_at: Option<String>,
    store: Option<WireStore>,
    creator: Option<WireCreator>,
    #[serde(default)]
    items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
struct WireStore {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCreator {
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    name: Option<String>,
    #[serde(default)]
    order_item_extras: Vec<WireExtra>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireExtra {
    name: Option<String>,
    #[serde(default)]
    order_item_extra_options: Vec<WireExtraOption>,
}

#[derive(Debug, Deserialize)]
struct WireExtraOption {
    name: Option<String>,
}

fn envelope_data<T>(payload: &str, context: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let envelope: Envelope<T> =
        serde_json::from_str(payload).map_err(|e| ScrapeError::MalformedResponse {
            context: context.to_string(),
            reason: format!("invalid JSON: {}", e),
        })?;

    if let Some(errors) = envelope.errors {
        let message = errors
            .into_iter()
            .next()
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown API error".to_string());
        let lowered = message.to_lowercase();
        if ["auth", "login", "session", "credential"]
            .iter()
            .any(|needle| lowered.contains(needle))
        {
            return Err(ScrapeError::AuthFailure { reason: message });
        }
        return Err(ScrapeError::MalformedResponse {
            context: context.to_string(),
            reason: message,
        });
    }

    envelope.data.ok_or_else(|| ScrapeError::MalformedResponse {
        context: context.to_string(),
        reason: "response has no data field".to_string(),
    })
}

/// Parses one summary page into work-list entries. Entries with no usable id
/// are dropped with a warning rather than failing the page.
pub fn parse_summary_batch(offset: usize, payload: &str) -> Result<Vec<OrderSummary>> {
    let context = format!("summary page at offset {}", offset);
    let data: SummaryPayload = envelope_data(payload, &context)?;
    let batch = data.orders.ok_or_else(|| ScrapeError::MalformedResponse {
        context: context.clone(),
        reason: "getConsumerOrdersWithDetails missing".to_string(),
    })?;

    let mut summaries = Vec::with_capacity(batch.len());
    for order in batch {
        match pick_order_id(order.order_uuid, order.id) {
            Some(order_id) => summaries.push(OrderSummary {
                order_id,
                fetched_at_offset: offset,
            }),
            None => tracing::warn!("{}: order entry with no id, skipping", context),
        }
    }
    Ok(summaries)
}

/// Parses one order-detail payload into the domain model. Every optional
/// field decision lives here: downstream stages see fully-populated records.
pub fn parse_order_detail(order_id: &str, payload: &str) -> Result<OrderDetail> {
    let context = format!("order detail {}", order_id);
    let data: DetailPayload = envelope_data(payload, &context)?;
    let wire = data.order.ok_or_else(|| ScrapeError::MalformedResponse {
        context,
        reason: "getConsumerOrderDetail missing".to_string(),
    })?;

    let resolved_id = pick_order_id(wire.order_uuid, wire.id).unwrap_or_else(|| order_id.to_string());
    let date = parse_order_date(
        &resolved_id,
        wire.submitted_at.as_deref().or(wire.created_at.as_deref()),
    );

    let store_name = wire
        .store
        .and_then(|s| s.name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_STORE.to_string());

    let recipient_name = wire
        .creator
        .map(recipient_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_PERSON.to_string());

    let items = wire.items.into_iter().map(parse_item).collect();

    Ok(OrderDetail {
        order_id: resolved_id,
        date,
        store_name,
        recipient_name,
        items,
    })
}

fn pick_order_id(order_uuid: Option<String>, id: Option<String>) -> Option<String> {
    order_uuid
        .filter(|v| !v.is_empty())
        .or(id.filter(|v| !v.is_empty()))
}

fn recipient_name(creator: WireCreator) -> String {
    let first = creator.first_name.unwrap_or_default();
    let last = creator.last_name.unwrap_or_default();
    format!("{} {}", first, last).trim().to_string()
}

fn parse_order_date(order_id: &str, raw: Option<&str>) -> NaiveDate {
    let parsed = raw.and_then(|value| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.date_naive())
            .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
            .ok()
    });
    match parsed {
        Some(date) => date,
        None => {
            tracing::warn!(order_id, "order missing a usable timestamp, using placeholder date");
            fallback_date()
        }
    }
}

fn parse_item(item: WireItem) -> ItemRecord {
    let name = item
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ITEM.to_string());

    let mut customizations = Vec::new();
    for extra in item.order_item_extras {
        let group_label = extra
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Other".to_string());
        for option in extra.order_item_extra_options {
            if let Some(value) = option.name.filter(|v| !v.trim().is_empty()) {
                customizations.push(CustomizationRecord {
                    group_label: group_label.clone(),
                    selected_value: value,
                });
            }
        }
    }

    ItemRecord {
        name,
        customizations,
    }
}
