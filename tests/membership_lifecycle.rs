//! Lifecycle tests for `oci_identity_user_group_membership`.

mod common;

use common::fixtures::{group, membership, user};
use common::{
    GROUP_TYPE, MEMBERSHIP_TYPE, USER_TYPE, assert_attribute_set, assert_attributes, provider,
    provider_with,
};
use oci_identity_provider::IdentityProvider;
use oci_identity_provider::client::{InMemoryClientOptions, InMemoryIdentityClient};
use oci_identity_provider::error::ProviderError;
use oci_identity_provider::provider::PlanAction;
use oci_identity_provider::resource_data::ResourceState;

async fn user_and_group(
    provider: &IdentityProvider<InMemoryIdentityClient>,
) -> (ResourceState, ResourceState) {
    let member = provider
        .create(USER_TYPE, &user("-tf-user", "automated test user"))
        .await
        .unwrap();
    let team = provider
        .create(GROUP_TYPE, &group("-tf-group", "automated test group"))
        .await
        .unwrap();
    (member, team)
}

#[tokio::test]
async fn test_membership_binds_user_and_group() {
    let (provider, _client) =
        provider_with(InMemoryClientOptions::default().with_creating_reads(1));
    let (member, team) = user_and_group(&provider).await;

    let created = provider
        .create(MEMBERSHIP_TYPE, &membership(&member.id, &team.id))
        .await
        .unwrap();
    assert!(created.id.starts_with("ocid1.groupmembership.oc1.."));

    let read = provider
        .read(MEMBERSHIP_TYPE, &created.id)
        .await
        .unwrap()
        .unwrap();
    assert_attributes(
        &read,
        &[
            ("user_id", member.id.as_str()),
            ("group_id", team.id.as_str()),
            ("state", "ACTIVE"),
        ],
    );
    assert_attribute_set(&read, "time_created");
}

#[tokio::test]
async fn test_membership_changes_are_replacements() {
    let (provider, client) = provider();
    let (member, team) = user_and_group(&provider).await;
    let other = provider
        .create(GROUP_TYPE, &group("-tf-group2", "second group"))
        .await
        .unwrap();
    let created = provider
        .create(MEMBERSHIP_TYPE, &membership(&member.id, &team.id))
        .await
        .unwrap();

    let desired = membership(&member.id, &other.id);
    assert_provider_error!(
        provider.update(MEMBERSHIP_TYPE, &created, &desired).await,
        ProviderError::Conflict { .. }
    );
    assert_eq!(client.stats().await.updates, 0);

    assert_eq!(
        provider.plan(MEMBERSHIP_TYPE, Some(&created), &desired).unwrap(),
        PlanAction::Replace {
            forced_by: vec!["group_id".to_string()],
            tainted: false
        }
    );
    let moved = provider
        .apply(MEMBERSHIP_TYPE, Some(&created), &desired)
        .await
        .unwrap();
    assert_ne!(moved.id, created.id);
    assert_attributes(&moved, &[("group_id", other.id.as_str())]);

    // The original binding is gone, so the first group can be deleted.
    provider.destroy(&team).await.unwrap();
}

#[tokio::test]
async fn test_membership_requires_existing_user() {
    let (provider, _client) = provider();
    let team = provider
        .create(GROUP_TYPE, &group("-tf-group", "automated test group"))
        .await
        .unwrap();

    let error = provider
        .create(
            MEMBERSHIP_TYPE,
            &membership("ocid1.user.oc1..doesnotexist", &team.id),
        )
        .await
        .unwrap_err();
    assert!(error.is_remote_rejected());
}

#[tokio::test]
async fn test_membership_delete_is_idempotent() {
    let (provider, _client) =
        provider_with(InMemoryClientOptions::default().with_deleting_reads(1));
    let (member, team) = user_and_group(&provider).await;
    let created = provider
        .create(MEMBERSHIP_TYPE, &membership(&member.id, &team.id))
        .await
        .unwrap();

    provider.destroy(&created).await.unwrap();
    provider.destroy(&created).await.unwrap();
    assert!(
        provider
            .read(MEMBERSHIP_TYPE, &created.id)
            .await
            .unwrap()
            .is_none()
    );
}
