//! Lifecycle tests for `oci_identity_group`.

mod common;

use common::fixtures::{group, membership, user};
use common::{
    GROUP_TYPE, MEMBERSHIP_TYPE, TENANCY, USER_TYPE, assert_attributes, provider, provider_with,
};
use oci_identity_provider::client::{ClientError, InMemoryClientOptions};
use oci_identity_provider::error::ProviderError;
use oci_identity_provider::lifecycle::InstancePhase;
use oci_identity_provider::provider::PlanAction;

#[tokio::test]
async fn test_group_create_read_update_delete() {
    let (provider, client) =
        provider_with(InMemoryClientOptions::default().with_creating_reads(2).with_deleting_reads(2));

    let created = provider
        .create(GROUP_TYPE, &group("-tf-group", "automated test group"))
        .await
        .unwrap();
    assert!(created.id.starts_with("ocid1.group.oc1.."));
    assert_attributes(
        &created,
        &[
            ("name", "-tf-group"),
            ("description", "automated test group"),
            ("compartment_id", TENANCY),
            ("state", "ACTIVE"),
        ],
    );

    let updated = provider
        .apply(
            GROUP_TYPE,
            Some(&created),
            &group("-tf-group", "automated test group (updated)"),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);

    let read = provider.read(GROUP_TYPE, &created.id).await.unwrap().unwrap();
    assert_eq!(read.attributes, updated.attributes);

    provider.destroy(&updated).await.unwrap();
    assert!(provider.read(GROUP_TYPE, &created.id).await.unwrap().is_none());
    assert_eq!(client.live_object_count().await, 0);
}

#[tokio::test]
async fn test_group_rename_plans_replacement() {
    let (provider, _client) = provider();
    let created = provider
        .create(GROUP_TYPE, &group("-tf-group", "automated test group"))
        .await
        .unwrap();

    let desired = group("-tf-group2", "automated test group");
    assert_eq!(
        provider.plan(GROUP_TYPE, Some(&created), &desired).unwrap(),
        PlanAction::Replace {
            forced_by: vec!["name".to_string()],
            tainted: false
        }
    );

    let replaced = provider.apply(GROUP_TYPE, Some(&created), &desired).await.unwrap();
    assert_ne!(replaced.id, created.id);
}

#[tokio::test]
async fn test_duplicate_group_name_is_rejected() {
    let (provider, _client) = provider();
    provider
        .create(GROUP_TYPE, &group("-tf-group", "first"))
        .await
        .unwrap();

    let result = provider
        .create(GROUP_TYPE, &group("-tf-group", "second"))
        .await;

    assert_provider_error!(
        result,
        ProviderError::RemoteRejected {
            source: Some(ClientError::Service { status: 409, .. }),
            ..
        }
    );
}

#[tokio::test]
async fn test_group_with_members_cannot_be_deleted() {
    let (provider, _client) = provider();
    let member = provider
        .create(USER_TYPE, &user("-tf-user", "automated test user"))
        .await
        .unwrap();
    let team = provider
        .create(GROUP_TYPE, &group("-tf-group", "automated test group"))
        .await
        .unwrap();
    let binding = provider
        .create(MEMBERSHIP_TYPE, &membership(&member.id, &team.id))
        .await
        .unwrap();

    let error = provider.destroy(&team).await.unwrap_err();
    assert!(error.is_remote_rejected());

    provider.destroy(&binding).await.unwrap();
    provider.destroy(&team).await.unwrap();
    provider.destroy(&member).await.unwrap();
}

#[tokio::test]
async fn test_failed_group_is_replaced() {
    let (provider, client) = provider();
    client.fail_next_provisioning(1).await;
    let desired = group("-tf-group", "automated test group");

    let error = provider.create(GROUP_TYPE, &desired).await.unwrap_err();
    let tainted = error.tainted_state().cloned().unwrap();
    assert_eq!(tainted.type_name, GROUP_TYPE);
    assert_eq!(tainted.phase, InstancePhase::Failed);

    let replaced = provider
        .apply(GROUP_TYPE, Some(&tainted), &desired)
        .await
        .unwrap();
    assert_ne!(replaced.id, tainted.id);
    assert_eq!(replaced.phase, InstancePhase::Active);
    assert_eq!(client.live_object_count().await, 1);
}
