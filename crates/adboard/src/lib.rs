pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod model;
pub mod policy;
pub mod service;

pub use api::ApiClient;
pub use config::{load_config, DeliveryConfig};
pub use error::{AdboardError, ConfigError, FetchError, MediaError, Result, TrackingError};
pub use lifecycle::{CloseReason, PopupController, PopupHandle, RunOutcome, ShowcaseRotator};
pub use media::{candidate_urls, AspectClass, FitMode, HttpProber, MediaResolver, Origin};
pub use model::{Advertisement, Job, MediaType, Placement};
pub use policy::{KeyValueStore, MemoryStore, Partition, SuppressionStore, VisitKind};
pub use service::{AdProvider, AdService};
