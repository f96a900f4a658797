//! End-to-end tests driving the harness against the in-process stub pet
//! server. Each test owns its server instance, so they are free to run in
//! parallel.

#[cfg(test)]
mod tests {
    use petstore_harness::{
        catalog, run_scenario, sample_pet, unique_pet_id, updated_pet, Error,
        PetStoreClientBuilder, RetryPolicy, StabilityTracker, NONEXISTENT_PET_ID,
    };
    use petstore_stub_server::StubPetServer;
    use serde_json::json;
    use std::time::Duration;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(4))
    }

    fn client_for(server: &StubPetServer) -> petstore_harness::PetStoreClient {
        PetStoreClientBuilder::new()
            .with_base_url(server.base_url())
            .with_api_key("test_api_key")
            .with_retry_policy(fast_policy(3))
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn create_then_read_echoes_submitted_fields() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let pet = sample_pet(unique_pet_id());
        let created = client.create_pet(&pet.to_value().unwrap(), &mut tracker).unwrap();
        assert_eq!(created.status_code(), 200);

        let read = client.get_pet(pet.id, &mut tracker).unwrap();
        assert_eq!(read.status_code(), 200);
        assert_eq!(read.pet().unwrap(), pet);
    }

    #[test]
    fn update_then_read_reflects_exactly_the_update() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let pet = sample_pet(unique_pet_id());
        client.create_pet(&pet.to_value().unwrap(), &mut tracker).unwrap();

        let updated = updated_pet(&pet);
        let response = client.update_pet(&updated.to_value().unwrap(), &mut tracker).unwrap();
        assert_eq!(response.status_code(), 200);

        let read = client.get_pet(pet.id, &mut tracker).unwrap();
        let actual = read.pet().unwrap();
        assert_eq!(actual, updated);
        // fields outside the update stayed put
        assert_eq!(actual.id, pet.id);
        assert_eq!(actual.category, pet.category);
    }

    #[test]
    fn transient_failures_are_retried_to_success() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let pet = sample_pet(unique_pet_id());
        client.create_pet(&pet.to_value().unwrap(), &mut tracker).unwrap();

        server.fail_next_requests(2, 503);
        let before = server.requests_seen();

        let outcome = client.get_pet(pet.id, &mut tracker).unwrap();
        assert_eq!(outcome.status_code(), 200);
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(server.requests_seen() - before, 3);

        let record = tracker.last_record().unwrap();
        assert!(record.success);
        assert_eq!(record.attempts, 3);
    }

    #[test]
    fn exhausted_retries_surface_a_transport_error() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        server.fail_next_requests(10, 503);
        let before = server.requests_seen();

        match client.get_pet(1, &mut tracker) {
            Err(Error::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected retry exhaustion, got {:?}", other),
        }

        // max_retries 3 means exactly 4 requests hit the wire
        assert_eq!(server.requests_seen() - before, 4);
        let record = tracker.last_record().unwrap();
        assert!(!record.success);
        assert_eq!(record.attempts, 4);
    }

    #[test]
    fn missing_name_is_a_client_error_with_zero_retries() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let before = server.requests_seen();
        let body = json!({"id": unique_pet_id(), "photoUrls": [], "status": "available"});
        let outcome = client.create_pet(&body, &mut tracker).unwrap();

        assert!(outcome.is_client_error());
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(server.requests_seen() - before, 1);
        assert_eq!(tracker.last_record().unwrap().attempts, 1);
    }

    #[test]
    fn nonexistent_pet_is_not_found_in_one_attempt() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let outcome = client.get_pet(NONEXISTENT_PET_ID, &mut tracker).unwrap();
        assert_eq!(outcome.status_code(), 404);
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(tracker.last_record().unwrap().attempts, 1);
    }

    #[test]
    fn wrong_api_key_fails_fast_with_an_auth_error() {
        let server = StubPetServer::start();
        server.require_api_key("sekrit");
        let client = client_for(&server); // configured with test_api_key
        let mut tracker = StabilityTracker::new();

        let before = server.requests_seen();
        match client.get_pet(1, &mut tracker) {
            Err(Error::Auth { status_code: 401 }) => (),
            other => panic!("expected an auth error, got {:?}", other),
        }
        assert_eq!(server.requests_seen() - before, 1);
        assert!(!tracker.last_record().unwrap().success);
    }

    #[test]
    fn matching_api_key_is_accepted() {
        let server = StubPetServer::start();
        server.require_api_key("test_api_key");
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let pet = sample_pet(unique_pet_id());
        let outcome = client.create_pet(&pet.to_value().unwrap(), &mut tracker).unwrap();
        assert_eq!(outcome.status_code(), 200);
    }

    #[test]
    fn delete_removes_the_pet() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let pet = sample_pet(unique_pet_id());
        client.create_pet(&pet.to_value().unwrap(), &mut tracker).unwrap();
        assert_eq!(server.pet_count(), 1);

        let deleted = client.delete_pet(pet.id, &mut tracker).unwrap();
        assert_eq!(deleted.status_code(), 200);
        assert_eq!(server.pet_count(), 0);

        let gone = client.get_pet(pet.id, &mut tracker).unwrap();
        assert_eq!(gone.status_code(), 404);
    }

    #[test]
    fn health_check_is_true_even_for_not_found() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        assert!(client.health_check(&mut tracker));
    }

    #[test]
    fn stability_summary_matches_the_recorded_run() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        let pet = sample_pet(unique_pet_id());
        client.create_pet(&pet.to_value().unwrap(), &mut tracker).unwrap();
        client.get_pet(pet.id, &mut tracker).unwrap();
        client.get_pet(NONEXISTENT_PET_ID, &mut tracker).unwrap();

        let summary = tracker.summarize();
        assert_eq!(summary.total_calls(), 3);
        assert_eq!(summary.total_successes(), 2);
        assert_eq!(summary.overall_success_rate(), 2.0 / 3.0 * 100.0);

        let reads = summary.endpoint("GET /pet/{petId}").unwrap();
        assert_eq!(reads.calls, 2);
        assert_eq!(reads.successes, 1);
        assert_eq!(reads.success_rate(), 50.0);
    }

    #[test]
    fn full_catalog_passes_against_the_stub() {
        let server = StubPetServer::start();
        let client = client_for(&server);
        let mut tracker = StabilityTracker::new();

        for scenario in catalog() {
            let result = run_scenario(&scenario, &client, &mut tracker);
            assert!(
                result.passed,
                "{} failed: {:?}",
                result.name, result.detail
            );
        }
        assert!(!tracker.is_empty());
    }
}
