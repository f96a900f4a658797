use super::{
    cleanup_pet, expect_pet_matches, expect_status, sample_pet, unique_pet_id, updated_pet,
};
use crate::{client::PetStoreClient, error::Error, stability::StabilityTracker};

/// Create a pet, read it back, and check the read echoes every submitted
/// field.
pub fn create_then_read(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let pet = sample_pet(unique_pet_id());

    let created = client.create_pet(&pet.to_value()?, tracker)?;
    let result = expect_status(&created, 200)
        .and_then(|_| expect_pet_matches(&created, &pet))
        .and_then(|_| {
            let read = client.get_pet(pet.id, tracker)?;
            expect_status(&read, 200)?;
            expect_pet_matches(&read, &pet)
        });

    cleanup_pet(client, tracker, pet.id);
    result
}

/// Update a pet and verify a subsequent read reflects exactly the updated
/// fields while the untouched ones stay as they were.
pub fn update_then_read(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let pet = sample_pet(unique_pet_id());

    let created = client.create_pet(&pet.to_value()?, tracker)?;
    let result = expect_status(&created, 200).and_then(|_| {
        let updated = updated_pet(&pet);
        let response = client.update_pet(&updated.to_value()?, tracker)?;
        expect_status(&response, 200)?;

        let read = client.get_pet(pet.id, tracker)?;
        expect_status(&read, 200)?;
        expect_pet_matches(&read, &updated)?;

        // untouched fields survived the update
        let actual = read.pet()?;
        if actual.category != pet.category {
            return Err(Error::assertion(format!(
                "category changed unexpectedly: {:?} -> {:?}",
                pet.category, actual.category
            )));
        }
        Ok(())
    });

    cleanup_pet(client, tracker, pet.id);
    result
}

/// The full workflow the original suite called the pet lifecycle:
/// create, read, update, read, delete, and a final read that must 404.
pub fn complete_lifecycle(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let pet = sample_pet(unique_pet_id());

    let created = client.create_pet(&pet.to_value()?, tracker)?;
    expect_status(&created, 200)?;

    let read = client.get_pet(pet.id, tracker)?;
    expect_status(&read, 200)?;
    expect_pet_matches(&read, &pet)?;

    let updated = updated_pet(&pet);
    let response = client.update_pet(&updated.to_value()?, tracker)?;
    expect_status(&response, 200)?;

    let reread = client.get_pet(pet.id, tracker)?;
    expect_pet_matches(&reread, &updated)?;

    let deleted = client.delete_pet(pet.id, tracker)?;
    expect_status(&deleted, 200)?;

    let gone = client.get_pet(pet.id, tracker)?;
    expect_status(&gone, 404)
}
