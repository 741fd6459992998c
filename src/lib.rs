pub mod batch;
pub mod config;
pub mod delay_manager;
pub mod error;
pub mod extractor;
pub mod input_loader;
pub mod logger;
pub mod models;
pub mod output;
pub mod resume_manager;
pub mod scraper;
pub mod tabular;
pub mod user_collector;
pub mod user_csv;
pub mod video_csv;
pub mod video_enricher;

// Exporting types for convenience
pub use batch::{BatchFetcher, BatchItem, BatchOutcome};
pub use delay_manager::{JitterDelay, Pacer};
pub use error::{Result, ScrapeError};
pub use extractor::Extractor;
pub use resume_manager::ProgressState;
pub use scraper::{FetchError, MetadataSource, YtDlp};
