//! Desired-state fixtures mirroring the acceptance configurations.

use oci_identity_provider::resource_data::ResourceData;

pub fn user(name: &str, description: &str) -> ResourceData {
    ResourceData::new()
        .with("name", name)
        .with("description", description)
}

pub fn group(name: &str, description: &str) -> ResourceData {
    ResourceData::new()
        .with("name", name)
        .with("description", description)
}

pub fn membership(user_id: &str, group_id: &str) -> ResourceData {
    ResourceData::new()
        .with("user_id", user_id)
        .with("group_id", group_id)
}

pub fn availability_domains(compartment_id: &str) -> ResourceData {
    ResourceData::new().with("compartment_id", compartment_id)
}
