mod negative;
mod positive;
mod stability;

use crate::{
    client::PetStoreClient,
    data::{Category, Pet, ResponseOutcome, STATUS_AVAILABLE, STATUS_SOLD},
    error::Error,
    stability::StabilityTracker,
};
use std::{
    fmt::Display,
    sync::atomic::{AtomicI64, Ordering},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// A pet id the demo service is guaranteed not to know.
pub const NONEXISTENT_PET_ID: i64 = 999_999_999;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Suite {
    Positive,
    Negative,
    Stability,
}

impl Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suite::Positive => write!(f, "positive"),
            Suite::Negative => write!(f, "negative"),
            Suite::Stability => write!(f, "stability"),
        }
    }
}

type ScenarioFn = fn(&PetStoreClient, &mut StabilityTracker) -> Result<(), Error>;

/// A named test case driving the client against the target API.
#[derive(Debug, Copy, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub suite: Suite,
    run: ScenarioFn,
}

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub suite: Suite,
    pub passed: bool,
    pub detail: Option<String>,
    pub duration: Duration,
}

/// Every scenario the harness knows about, in execution order.
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "create_then_read_returns_submitted_fields",
            suite: Suite::Positive,
            run: positive::create_then_read,
        },
        Scenario {
            name: "update_then_read_reflects_update",
            suite: Suite::Positive,
            run: positive::update_then_read,
        },
        Scenario {
            name: "complete_pet_lifecycle",
            suite: Suite::Positive,
            run: positive::complete_lifecycle,
        },
        Scenario {
            name: "create_missing_name_is_rejected",
            suite: Suite::Negative,
            run: negative::create_missing_name,
        },
        Scenario {
            name: "create_invalid_id_type_is_rejected",
            suite: Suite::Negative,
            run: negative::create_invalid_id_type,
        },
        Scenario {
            name: "read_nonexistent_pet_is_not_found",
            suite: Suite::Negative,
            run: negative::read_nonexistent_pet,
        },
        Scenario {
            name: "update_nonexistent_pet_is_not_found",
            suite: Suite::Negative,
            run: negative::update_nonexistent_pet,
        },
        Scenario {
            name: "repeated_reads_stay_stable",
            suite: Suite::Stability,
            run: stability::repeated_reads_stay_stable,
        },
        Scenario {
            name: "churn_success_rate_is_exact",
            suite: Suite::Stability,
            run: stability::churn_success_rate_is_exact,
        },
    ]
}

pub fn suite(suite: Suite) -> Vec<Scenario> {
    catalog()
        .into_iter()
        .filter(|scenario| scenario.suite == suite)
        .collect()
}

pub fn find(name: &str) -> Option<Scenario> {
    catalog().into_iter().find(|scenario| scenario.name == name)
}

/// Run one scenario, turning an `Err` into a failed result. Assertion
/// failures are never swallowed; they land in the result detail.
pub fn run_scenario(
    scenario: &Scenario,
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> ScenarioResult {
    tracing::info!("running {} ({})", scenario.name, scenario.suite);
    let started = Instant::now();
    let outcome = (scenario.run)(client, tracker);
    let duration = started.elapsed();

    match outcome {
        Ok(()) => {
            tracing::info!("{} passed in {:?}", scenario.name, duration);
            ScenarioResult {
                name: scenario.name,
                suite: scenario.suite,
                passed: true,
                detail: None,
                duration,
            }
        }
        Err(error) => {
            tracing::error!("{} failed: {}", scenario.name, error);
            ScenarioResult {
                name: scenario.name,
                suite: scenario.suite,
                passed: false,
                detail: Some(error.to_string()),
                duration,
            }
        }
    }
}

// --- fixture helpers -------------------------------------------------------

static PET_ID_SEQUENCE: AtomicI64 = AtomicI64::new(0);

/// A test-unique pet id in the range the original suite used.
pub fn unique_pet_id() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or(0);
    let sequence = PET_ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    // the sequence keeps ids unique even when two calls land in the same tick
    1_000_000 + (nanos.abs() % 7_000_000) + sequence * 7_000_000
}

pub fn sample_pet(pet_id: i64) -> Pet {
    const NAMES: [&str; 5] = ["Buddy", "Max", "Charlie", "Lucy", "Cooper"];
    Pet {
        id: pet_id,
        name: String::from(NAMES[(pet_id.abs() % NAMES.len() as i64) as usize]),
        category: Some(Category {
            id: 1,
            name: String::from("Dogs"),
        }),
        photo_urls: vec![String::from("https://example.com/pet1.jpg")],
        status: String::from(STATUS_AVAILABLE),
    }
}

/// The updated variant of a pet: new name, flipped status, one more photo.
/// Everything else is left alone so reads can verify it stayed unchanged.
pub fn updated_pet(original: &Pet) -> Pet {
    let mut updated = original.clone();
    updated.name = format!("Updated {}", original.name);
    updated.status = if original.status == STATUS_AVAILABLE {
        String::from(STATUS_SOLD)
    } else {
        String::from(STATUS_AVAILABLE)
    };
    updated
        .photo_urls
        .push(String::from("https://example.com/pet2.jpg"));
    updated
}

/// Best-effort fixture removal; a failed delete is logged, not fatal.
pub(crate) fn cleanup_pet(client: &PetStoreClient, tracker: &mut StabilityTracker, pet_id: i64) {
    if let Err(error) = client.delete_pet(pet_id, tracker) {
        tracing::warn!("cleanup of pet {} failed: {}", pet_id, error);
    }
}

// --- assertion helpers -----------------------------------------------------

pub fn expect_status(outcome: &ResponseOutcome, expected: u16) -> Result<(), Error> {
    if outcome.status_code() == expected {
        Ok(())
    } else {
        Err(Error::assertion(format!(
            "expected status {}, got {} (body: {})",
            expected,
            outcome.status_code(),
            outcome.body_text()
        )))
    }
}

pub fn expect_client_error(outcome: &ResponseOutcome) -> Result<(), Error> {
    if outcome.is_client_error() {
        Ok(())
    } else {
        Err(Error::assertion(format!(
            "expected a client error, got status {}",
            outcome.status_code()
        )))
    }
}

/// The fields the original suite matched exactly: id, name, status and
/// photoUrls.
pub fn expect_pet_matches(outcome: &ResponseOutcome, expected: &Pet) -> Result<(), Error> {
    let actual = outcome.pet()?;
    let mut mismatches = Vec::new();

    if actual.id != expected.id {
        mismatches.push(format!("id: expected {}, got {}", expected.id, actual.id));
    }
    if actual.name != expected.name {
        mismatches.push(format!(
            "name: expected {:?}, got {:?}",
            expected.name, actual.name
        ));
    }
    if actual.status != expected.status {
        mismatches.push(format!(
            "status: expected {:?}, got {:?}",
            expected.status, actual.status
        ));
    }
    if actual.photo_urls != expected.photo_urls {
        mismatches.push(format!(
            "photoUrls: expected {:?}, got {:?}",
            expected.photo_urls, actual.photo_urls
        ));
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(Error::assertion(format!(
            "pet {} does not match: {}",
            expected.id,
            mismatches.join("; ")
        )))
    }
}

/// The number of attempts the most recent call was recorded with.
pub fn expect_last_attempts(tracker: &StabilityTracker, expected: u32) -> Result<(), Error> {
    match tracker.last_record() {
        Some(record) if record.attempts == expected => Ok(()),
        Some(record) => Err(Error::assertion(format!(
            "expected {} attempt(s) for {}, recorded {}",
            expected, record.endpoint, record.attempts
        ))),
        None => Err(Error::assertion("no stability record for the last call")),
    }
}
