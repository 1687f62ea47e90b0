pub mod command;

use log::{error, info, warn};

use crate::fetcher::{FetchError, LoadingFlag, RecordSource};
use crate::model::Record;
use crate::paginator::{Navigation, Page, Paginator};

/// What the renderer should draw right now.
#[derive(Debug)]
pub enum ViewState<'a> {
    Loading,
    Ready(Page<'a, Record>),
    Failed {
        error: &'a FetchError,
        page: Page<'a, Record>,
    },
}

/// The paginated funding table: fetched records, page state and the fetch
/// lifecycle of a single instance.
#[derive(Debug)]
pub struct FundingTable {
    records: Vec<Record>,
    paginator: Paginator,
    loading: LoadingFlag,
    error: Option<FetchError>,
    mounted: bool,
}

impl FundingTable {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            paginator: Paginator::new(page_size),
            loading: LoadingFlag::new(),
            error: None,
            mounted: false,
        }
    }

    /// Handle for observing the loading flag while `mount` is in flight.
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_raised()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.paginator.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages(self.records.len())
    }

    /// Runs the one fetch this instance ever performs.
    ///
    /// Returns `false` without touching the source when the table was
    /// already mounted. The loading flag is lowered however the fetch ends.
    /// If this future is dropped mid-flight the table is left in the failed
    /// state with `FetchError::Cancelled`.
    pub async fn mount<S: RecordSource>(&mut self, source: &S) -> bool {
        if self.mounted {
            warn!("table already mounted, skipping fetch");
            return false;
        }
        self.mounted = true;
        // replaced once the fetch settles
        self.error = Some(FetchError::Cancelled);

        let outcome = {
            let _guard = self.loading.raise();
            source.fetch_records().await
        };

        match outcome {
            Ok(records) => {
                info!("loaded {} records", records.len());
                self.records = records;
                self.error = None;
            }
            Err(e) => {
                error!("failed to load records: {e}");
                self.records.clear();
                self.error = Some(e);
            }
        }
        self.paginator.reconcile(self.records.len());
        true
    }

    pub fn navigate(&mut self, action: Navigation) -> usize {
        self.paginator.navigate(action, self.records.len())
    }

    pub fn page(&self) -> Page<'_, Record> {
        self.paginator.page(&self.records)
    }

    pub fn state(&self) -> ViewState<'_> {
        if self.is_loading() {
            return ViewState::Loading;
        }
        match self.error.as_ref() {
            Some(error) => ViewState::Failed {
                error,
                page: self.page(),
            },
            None => ViewState::Ready(self.page()),
        }
    }
}

impl Default for FundingTable {
    fn default() -> Self {
        Self::new(crate::paginator::DEFAULT_PAGE_SIZE)
    }
}
