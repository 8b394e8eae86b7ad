//! Service wiring: the record store behind a timeout, plus the optional chat
//! upstream. Handlers only ever see [`AppServices`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use spendlens_analytics::{
    cash_outflow, category_spend, invoice_trends, rank_vendors, search_invoices, summary_stats,
    top_vendor_rows, CashOutflowRow, CategorySpendRow, InvoiceSearchRow, QueryError, SearchQuery,
    SummaryStats, TopVendorRow, TrendRow, TOP_VENDOR_LIMIT, TREND_WINDOW_MONTHS,
};
use spendlens_core::date::months_before;
use spendlens_infra::{
    ingest_file, IngestError, InMemoryRecordStore, PostgresRecordStore, RecordStore, StoreError,
};

use crate::app::chat::ChatUpstream;
use crate::config::{AppConfig, StoreBackend};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    MalformedInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        ServiceError::MalformedInput(err.to_string())
    }
}

/// Everything a request handler needs.
pub struct AppServices {
    store: Arc<dyn RecordStore>,
    store_timeout: Duration,
    documents_uploaded: u64,
    chat: Option<ChatUpstream>,
}

impl AppServices {
    pub fn new(store: Arc<dyn RecordStore>, store_timeout: Duration, documents_uploaded: u64) -> Self {
        Self {
            store,
            store_timeout,
            documents_uploaded,
            chat: None,
        }
    }

    pub fn with_chat(mut self, chat: ChatUpstream) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn chat(&self) -> Option<&ChatUpstream> {
        self.chat.as_ref()
    }

    /// Run one store call, bounded by the configured timeout.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => Err(ServiceError::StoreUnavailable(format!(
                "{operation} timed out after {}ms",
                self.store_timeout.as_millis()
            ))),
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn cash_outflow(&self) -> Result<Vec<CashOutflowRow>, ServiceError> {
        let unpaid = self
            .bounded("unpaid_invoices", self.store.unpaid_invoices())
            .await?;
        Ok(cash_outflow(&unpaid, Self::today()))
    }

    pub async fn invoice_trends(&self) -> Result<Vec<TrendRow>, ServiceError> {
        let today = Self::today();
        let since = months_before(today, TREND_WINDOW_MONTHS);
        let recent = self
            .bounded("invoices_issued_since", self.store.invoices_issued_since(since))
            .await?;
        Ok(invoice_trends(&recent, today))
    }

    pub async fn category_spend(&self) -> Result<Vec<CategorySpendRow>, ServiceError> {
        let items = self.bounded("line_items", self.store.line_items()).await?;
        Ok(category_spend(&items))
    }

    pub async fn top_vendors(&self) -> Result<Vec<TopVendorRow>, ServiceError> {
        let invoices = self.bounded("all_invoices", self.store.all_invoices()).await?;
        let ranked = rank_vendors(&invoices, TOP_VENDOR_LIMIT);
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<_> = ranked.iter().map(|r| r.vendor_id).collect();
        let vendors = self
            .bounded("vendors_by_ids", self.store.vendors_by_ids(&ids))
            .await?;
        Ok(top_vendor_rows(&ranked, &vendors))
    }

    pub async fn summary(&self) -> Result<SummaryStats, ServiceError> {
        let totals = self
            .bounded("invoice_totals", self.store.invoice_totals())
            .await?;
        Ok(summary_stats(totals, self.documents_uploaded))
    }

    pub async fn search_invoices(&self, query: &SearchQuery) -> Result<Vec<InvoiceSearchRow>, ServiceError> {
        let rows = self
            .bounded("invoices_with_vendor_names", self.store.invoices_with_vendor_names())
            .await?;
        Ok(search_invoices(rows, query))
    }

    pub async fn health(&self) -> Result<(), ServiceError> {
        self.bounded("ping", self.store.ping()).await
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("seeding failed: {0}")]
    Seed(#[from] IngestError),

    #[error("failed to build chat client: {0}")]
    Chat(#[from] reqwest::Error),
}

/// The concrete store selected by configuration. Kept so the process can
/// shut the pool down cleanly.
#[derive(Debug, Clone)]
pub enum StoreHandle {
    InMemory(Arc<InMemoryRecordStore>),
    Postgres(PostgresRecordStore),
}

impl StoreHandle {
    pub async fn open(config: &AppConfig) -> Result<Self, StartupError> {
        match &config.store {
            StoreBackend::InMemory { seed_file } => {
                let store = Arc::new(InMemoryRecordStore::new());
                if let Some(path) = seed_file {
                    let report = ingest_file(&store, path, Utc::now().date_naive(), true).await?;
                    tracing::info!(
                        processed = report.processed,
                        skipped = report.skipped,
                        failed = report.failed,
                        "seeded in-memory store"
                    );
                } else {
                    tracing::warn!("no SEED_FILE set; in-memory store starts empty");
                }
                Ok(StoreHandle::InMemory(store))
            }
            StoreBackend::Postgres {
                database_url,
                max_connections,
            } => {
                let store =
                    PostgresRecordStore::connect(database_url, *max_connections, config.store_timeout)
                        .await?;
                store.ensure_schema().await?;
                tracing::info!(max_connections, "connected to postgres");
                Ok(StoreHandle::Postgres(store))
            }
        }
    }

    pub fn reader(&self) -> Arc<dyn RecordStore> {
        match self {
            StoreHandle::InMemory(store) => store.clone() as Arc<dyn RecordStore>,
            StoreHandle::Postgres(store) => Arc::new(store.clone()),
        }
    }

    pub async fn close(&self) {
        if let StoreHandle::Postgres(store) = self {
            store.close().await;
        }
    }
}

/// Wire services from configuration.
pub async fn build_services(config: &AppConfig) -> Result<(AppServices, StoreHandle), StartupError> {
    let handle = StoreHandle::open(config).await?;
    let mut services = AppServices::new(handle.reader(), config.store_timeout, config.documents_uploaded);

    match &config.chat_base_url {
        Some(base_url) => services = services.with_chat(ChatUpstream::new(base_url.clone())?),
        None => tracing::warn!("VANNA_API_BASE_URL not set; chat endpoint disabled"),
    }

    Ok((services, handle))
}
