use super::{cleanup_pet, expect_status, sample_pet, unique_pet_id};
use crate::{client::PetStoreClient, error::Error, stability::StabilityTracker};

/// Below this success rate the original suite considered the API unstable.
pub const UNSTABLE_SUCCESS_RATE_THRESHOLD: f64 = 80.0;

/// Hammer one pet with reads and check the recorded attempt counts never
/// exceed the configured budget, and the endpoint stays above the
/// instability threshold.
pub fn repeated_reads_stay_stable(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let pet = sample_pet(unique_pet_id());
    let first_record = tracker.len();

    let created = client.create_pet(&pet.to_value()?, tracker)?;
    let result = expect_status(&created, 200).and_then(|_| {
        for _ in 0..10 {
            let outcome = client.get_pet(pet.id, tracker)?;
            expect_status(&outcome, 200)?;
        }
        Ok(())
    });
    cleanup_pet(client, tracker, pet.id);
    result?;

    let records = &tracker.records()[first_record..];
    let budget = client.retry_policy().max_attempts();
    for record in records {
        if record.attempts > budget {
            return Err(Error::assertion(format!(
                "{} recorded {} attempts, budget is {}",
                record.endpoint, record.attempts, budget
            )));
        }
    }

    let successes = records.iter().filter(|record| record.success).count();
    let rate = successes as f64 / records.len() as f64 * 100.0;
    if rate < UNSTABLE_SUCCESS_RATE_THRESHOLD {
        return Err(Error::assertion(format!(
            "success rate {:.1}% is below the {:.1}% stability threshold",
            rate, UNSTABLE_SUCCESS_RATE_THRESHOLD
        )));
    }
    Ok(())
}

/// Create/read/delete churn, then cross-check that the summary arithmetic
/// matches the raw records exactly: success rate is successes over total,
/// nothing more.
pub fn churn_success_rate_is_exact(
    client: &PetStoreClient,
    tracker: &mut StabilityTracker,
) -> Result<(), Error> {
    let first_record = tracker.len();

    for _ in 0..3 {
        let pet = sample_pet(unique_pet_id());
        let created = client.create_pet(&pet.to_value()?, tracker)?;
        let result = expect_status(&created, 200).and_then(|_| {
            let read = client.get_pet(pet.id, tracker)?;
            expect_status(&read, 200)
        });
        cleanup_pet(client, tracker, pet.id);
        result?;
    }

    let records = &tracker.records()[first_record..];
    let successes = records.iter().filter(|record| record.success).count();

    let mut scoped = StabilityTracker::new();
    for record in records {
        scoped.record(
            record.endpoint.clone(),
            record.success,
            record.attempts,
            record.total_latency,
        );
    }
    let summary = scoped.summarize();

    if summary.total_calls() != records.len() || summary.total_successes() != successes {
        return Err(Error::assertion(format!(
            "summary counted {}/{} but the run recorded {}/{}",
            summary.total_successes(),
            summary.total_calls(),
            successes,
            records.len()
        )));
    }

    let expected_rate = successes as f64 / records.len() as f64 * 100.0;
    if summary.overall_success_rate() != expected_rate {
        return Err(Error::assertion(format!(
            "summary success rate {:.4}% differs from recorded {:.4}%",
            summary.overall_success_rate(),
            expected_rate
        )));
    }
    Ok(())
}
