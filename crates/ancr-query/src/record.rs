//! # Credential Records
//!
//! A stored credential plus the tags queries run against. Tags are
//! computed once, when the record is built, and carry every identifier in
//! the form it was issued under and, when one exists, its legacy form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ancr_core::identifier::{self, ObjectKind};
use ancr_core::{Credential, Schema};

pub use ancr_core::normalize_attribute_name;

/// Tag names written on credential records.
pub mod tags {
    /// Credential definition id as issued.
    pub const CRED_DEF_ID: &str = "anonCredsCredentialDefinitionId";
    /// Legacy credential definition id.
    pub const UNQUALIFIED_CRED_DEF_ID: &str = "anonCredsUnqualifiedCredentialDefinitionId";
    /// Credential issuer as issued.
    pub const ISSUER_ID: &str = "anonCredsIssuerId";
    /// Legacy credential issuer.
    pub const UNQUALIFIED_ISSUER_ID: &str = "anonCredsUnqualifiedIssuerId";
    /// Schema id as issued.
    pub const SCHEMA_ID: &str = "anonCredsSchemaId";
    /// Legacy schema id.
    pub const UNQUALIFIED_SCHEMA_ID: &str = "anonCredsUnqualifiedSchemaId";
    /// Schema author as issued.
    pub const SCHEMA_ISSUER_ID: &str = "anonCredsSchemaIssuerId";
    /// Legacy schema author.
    pub const UNQUALIFIED_SCHEMA_ISSUER_ID: &str = "anonCredsUnqualifiedSchemaIssuerId";
    /// Schema name.
    pub const SCHEMA_NAME: &str = "anonCredsSchemaName";
    /// Schema version.
    pub const SCHEMA_VERSION: &str = "anonCredsSchemaVersion";
    /// Revocation registry id as issued.
    pub const REV_REG_ID: &str = "anonCredsRevocationRegistryId";
    /// Legacy revocation registry id.
    pub const UNQUALIFIED_REV_REG_ID: &str = "anonCredsUnqualifiedRevocationRegistryId";
    /// Link secret the credential is bound to.
    pub const LINK_SECRET_ID: &str = "anonCredsLinkSecretId";

    /// `attr::<name>::marker`, `"1"` when the attribute is present.
    pub fn attribute_marker(name: &str) -> String {
        format!("attr::{}::marker", super::normalize_attribute_name(name))
    }

    /// `attr::<name>::value`, the raw value.
    pub fn attribute_value(name: &str) -> String {
        format!("attr::{}::value", super::normalize_attribute_name(name))
    }
}

/// A credential in the holder's store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Wallet id of the credential.
    pub credential_id: String,
    /// The credential.
    pub credential: Credential,
    /// Link secret the credential is bound to.
    pub link_secret_id: String,
    /// Slot in the revocation registry. `None` when not revocable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_index: Option<u32>,
    /// Query tags.
    pub tags: BTreeMap<String, String>,
}

fn tag_identifier(
    tags: &mut BTreeMap<String, String>,
    kind: Option<ObjectKind>,
    qualified_tag: &str,
    unqualified_tag: &str,
    id: &str,
) {
    tags.insert(qualified_tag.to_string(), id.to_string());
    let legacy = match kind {
        Some(kind) => identifier::to_legacy(kind, id).ok(),
        None => identifier::to_legacy_did(id).ok(),
    };
    if let Some(legacy) = legacy {
        tags.insert(unqualified_tag.to_string(), legacy);
    }
}

impl CredentialRecord {
    /// Build a record, computing its tags from the credential, its schema
    /// and its issuer.
    pub fn new(
        credential_id: impl Into<String>,
        credential: Credential,
        link_secret_id: impl Into<String>,
        revocation_index: Option<u32>,
        schema: &Schema,
        issuer_id: &str,
    ) -> Self {
        let link_secret_id = link_secret_id.into();
        let mut record_tags = BTreeMap::new();
        tag_identifier(
            &mut record_tags,
            Some(ObjectKind::CredentialDefinition),
            tags::CRED_DEF_ID,
            tags::UNQUALIFIED_CRED_DEF_ID,
            &credential.cred_def_id,
        );
        tag_identifier(&mut record_tags, None, tags::ISSUER_ID, tags::UNQUALIFIED_ISSUER_ID, issuer_id);
        tag_identifier(
            &mut record_tags,
            Some(ObjectKind::Schema),
            tags::SCHEMA_ID,
            tags::UNQUALIFIED_SCHEMA_ID,
            &credential.schema_id,
        );
        tag_identifier(
            &mut record_tags,
            None,
            tags::SCHEMA_ISSUER_ID,
            tags::UNQUALIFIED_SCHEMA_ISSUER_ID,
            &schema.issuer_id,
        );
        record_tags.insert(tags::SCHEMA_NAME.to_string(), schema.name.clone());
        record_tags.insert(tags::SCHEMA_VERSION.to_string(), schema.version.clone());
        if let Some(rev_reg_id) = &credential.rev_reg_id {
            tag_identifier(
                &mut record_tags,
                Some(ObjectKind::RevocationRegistryDefinition),
                tags::REV_REG_ID,
                tags::UNQUALIFIED_REV_REG_ID,
                rev_reg_id,
            );
        }
        record_tags.insert(tags::LINK_SECRET_ID.to_string(), link_secret_id.clone());
        for (name, value) in &credential.values {
            record_tags.insert(tags::attribute_marker(name), "1".to_string());
            record_tags.insert(tags::attribute_value(name), value.raw.clone());
        }

        Self {
            credential_id: credential_id.into(),
            credential,
            link_secret_id,
            revocation_index,
            tags: record_tags,
        }
    }

    /// Revocation registry and slot, when revocable.
    pub fn revocation_slot(&self) -> Option<(&str, u32)> {
        self.credential.rev_reg_id.as_deref().zip(self.revocation_index)
    }
}
