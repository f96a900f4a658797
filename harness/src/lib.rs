mod client;
mod config;
mod data;
mod error;
mod report;
mod retry;
mod scenarios;
mod stability;

pub use client::{PetStoreClient, PetStoreClientBuilder, ReqwestTransport, Transport};
pub use config::{HarnessConfig, DEFAULT_API_KEY, DEFAULT_BASE_URL};
pub use data::{
    Category, Pet, RawResponse, RequestIntent, ResponseOutcome, STATUS_AVAILABLE, STATUS_PENDING,
    STATUS_SOLD,
};
pub use error::Error;
pub use report::{render_summary, run_timestamp, write_report};
pub use retry::{classify, Disposition, RetryPolicy, DEFAULT_RETRYABLE_STATUSES};
pub use scenarios::{
    catalog, expect_client_error, expect_last_attempts, expect_pet_matches, expect_status, find,
    run_scenario, sample_pet, suite, unique_pet_id, updated_pet, Scenario, ScenarioResult, Suite,
    NONEXISTENT_PET_ID,
};
pub use stability::{EndpointStats, StabilityRecord, StabilitySummary, StabilityTracker};
