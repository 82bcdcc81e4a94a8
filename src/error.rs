use thiserror::Error;

/// Failure classes of the harvest pipeline and the catalog store.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The fixed product-grid selector matched nothing; the site's markup
    /// has drifted and extraction would silently yield zero records.
    #[error("product grid container not found at {url}")]
    ProductGridMissing { url: String },

    #[error("price text {text:?} does not reduce to a valid price")]
    PriceParse { text: String },

    /// Name and price node lists must line up one-to-one; truncating one
    /// side would pair products with the wrong prices.
    #[error("page lists {names} product names but {prices} prices")]
    PairCountMismatch { names: usize, prices: usize },

    #[error("no catalog row with index {id}")]
    RowMissing { id: i64 },

    #[error("catalog is empty; nothing to report")]
    EmptyCatalog,

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),
}
