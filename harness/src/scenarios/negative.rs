use super::{
    expect_client_error, expect_last_attempts, expect_status, sample_pet, unique_pet_id,
    NONEXISTENT_PET_ID,
};
use crate::{client::PetStoreClient, error::Error, stability::StabilityTracker};
use serde_json::json;

/// A payload without the required name field must come back as a client
/// error, and a genuine client error must not be masked by retries.
pub fn create_missing_name(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let body = json!({
        "id": unique_pet_id(),
        "photoUrls": [],
        "status": "available"
    });

    let outcome = client.create_pet(&body, tracker)?;
    expect_client_error(&outcome)?;
    expect_last_attempts(tracker, 1)
}

pub fn create_invalid_id_type(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let body = json!({
        "id": "not_a_number",
        "name": "Ghost",
        "photoUrls": [],
        "status": "available"
    });

    let outcome = client.create_pet(&body, tracker)?;
    expect_client_error(&outcome)?;
    expect_last_attempts(tracker, 1)
}

/// Reading an id the service never saw is a not-found outcome, recorded as
/// a single attempt.
pub fn read_nonexistent_pet(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let outcome = client.get_pet(NONEXISTENT_PET_ID, tracker)?;
    expect_status(&outcome, 404)?;
    expect_last_attempts(tracker, 1)
}

pub fn update_nonexistent_pet(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let mut ghost = sample_pet(NONEXISTENT_PET_ID);
    ghost.name = String::from("Ghost");

    let outcome = client.update_pet(&ghost.to_value()?, tracker)?;
    expect_status(&outcome, 404)?;
    expect_last_attempts(tracker, 1)
}
