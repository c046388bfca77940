//! # Identifier Qualifier
//!
//! Pure transforms between the two string encodings of an AnonCreds object
//! identifier.
//!
//! | Kind | Legacy (ledger-native) | Qualified (`did:indy`) |
//! |---|---|---|
//! | Schema | `<nsId>:2:<name>:<version>` | `did:indy:<ns>:<nsId>/anoncreds/v0/SCHEMA/<name>/<version>` |
//! | Credential definition | `<nsId>:3:CL:<seqNo>:<tag>` | `did:indy:<ns>:<nsId>/anoncreds/v0/CLAIM_DEF/<seqNo>/<tag>` |
//! | Revocation registry | `<nsId>:4:<nsId>:3:CL:<seqNo>:<credDefTag>:CL_ACCUM:<tag>` | `did:indy:<ns>:<nsId>/anoncreds/v0/REV_REG_DEF/<seqNo>/<credDefTag>/<tag>` |
//!
//! `<nsId>` is the 21-22 character base58 namespace identifier and `<ns>` is
//! the `did:indy` namespace (`sovrin`, `bcovrin:test`, ...).
//!
//! ## Contract
//!
//! - `to_legacy(to_qualified(y, ns)) == y` for every legacy identifier `y`.
//! - `to_qualified(to_legacy(x))` does not recover `x`: the namespace is lost.
//! - `to_legacy` is idempotent; a legacy input comes back unchanged.
//! - Anything that does not fit the grammar fails with
//!   [`IdentifierError::MalformedIdentifier`].

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

const DID_INDY_PREFIX: &str = "did:indy:";
const DID_SOV_PREFIX: &str = "did:sov:";
const ANONCREDS_PATH: &str = "/anoncreds/v0/";

/// The kind of object an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    /// A schema.
    Schema,
    /// A credential definition.
    CredentialDefinition,
    /// A revocation registry definition. Status lists share its identifier.
    RevocationRegistryDefinition,
}

impl ObjectKind {
    /// Human-readable name used in error messages and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::CredentialDefinition => "credential definition",
            Self::RevocationRegistryDefinition => "revocation registry definition",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two encodings an identifier uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierForm {
    /// Colon-delimited ledger-native form.
    Legacy,
    /// `did:indy` qualified form.
    DidIndy,
    /// Some other DID method. Has no legacy equivalent.
    OtherDid,
}

/// Classify an identifier by its encoding without validating the rest of it.
pub fn identifier_form(identifier: &str) -> IdentifierForm {
    if identifier.starts_with(DID_INDY_PREFIX) {
        IdentifierForm::DidIndy
    } else if identifier.starts_with("did:") && !identifier.starts_with(DID_SOV_PREFIX) {
        IdentifierForm::OtherDid
    } else {
        IdentifierForm::Legacy
    }
}

/// True when `identifier` is a well-formed legacy DID, schema, credential
/// definition or revocation registry identifier.
pub fn is_unqualified_identifier(identifier: &str) -> bool {
    parse_did(identifier).map(|d| d.namespace.is_none()).unwrap_or(false)
        || parse_schema_id(identifier).map(|p| p.namespace.is_none()).unwrap_or(false)
        || parse_credential_definition_id(identifier)
            .map(|p| p.namespace.is_none())
            .unwrap_or(false)
        || parse_revocation_registry_id(identifier)
            .map(|p| p.namespace.is_none())
            .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// DIDs
// ---------------------------------------------------------------------------

/// Parsed issuer DID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidParts {
    /// `did:indy` namespace, `None` for a legacy DID.
    pub namespace: Option<String>,
    /// The base58 namespace identifier.
    pub namespace_identifier: String,
}

impl DidParts {
    /// Legacy form: the bare namespace identifier.
    pub fn to_legacy(&self) -> String {
        self.namespace_identifier.clone()
    }

    /// `did:indy:<ns>:<nsId>`.
    pub fn to_qualified(&self, namespace: &str) -> String {
        format!("{DID_INDY_PREFIX}{namespace}:{}", self.namespace_identifier)
    }
}

/// Parse a legacy DID (`<nsId>` or `did:sov:<nsId>`) or a `did:indy` DID.
pub fn parse_did(did: &str) -> Result<DidParts, IdentifierError> {
    if let Some(rest) = did.strip_prefix(DID_INDY_PREFIX) {
        let (namespace, nsid) = rest
            .rsplit_once(':')
            .ok_or_else(|| IdentifierError::MalformedDid(did.to_string()))?;
        if !is_valid_namespace(namespace) || !is_namespace_identifier(nsid) {
            return Err(IdentifierError::MalformedDid(did.to_string()));
        }
        return Ok(DidParts {
            namespace: Some(namespace.to_string()),
            namespace_identifier: nsid.to_string(),
        });
    }
    let nsid = did.strip_prefix(DID_SOV_PREFIX).unwrap_or(did);
    if !is_namespace_identifier(nsid) {
        return Err(IdentifierError::MalformedDid(did.to_string()));
    }
    Ok(DidParts { namespace: None, namespace_identifier: nsid.to_string() })
}

/// Legacy form of an issuer DID. Other DID methods pass through unchanged
/// since they have no ledger-native form.
pub fn to_legacy_did(did: &str) -> Result<String, IdentifierError> {
    if identifier_form(did) == IdentifierForm::OtherDid {
        return Err(IdentifierError::NoLegacyForm(did.to_string()));
    }
    Ok(parse_did(did)?.to_legacy())
}

/// Qualified `did:indy` form of a legacy DID. Already-qualified input is
/// returned unchanged.
pub fn to_qualified_did(did: &str, namespace: Option<&str>) -> Result<String, IdentifierError> {
    if identifier_form(did) != IdentifierForm::Legacy {
        return Ok(did.to_string());
    }
    let parts = parse_did(did)?;
    let namespace = require_namespace(did, namespace)?;
    Ok(parts.to_qualified(namespace))
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// Parsed schema identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIdParts {
    /// `did:indy` namespace, `None` for the legacy form.
    pub namespace: Option<String>,
    /// Issuer namespace identifier.
    pub namespace_identifier: String,
    /// Schema name.
    pub name: String,
    /// Schema version (digits and dots).
    pub version: String,
}

impl SchemaIdParts {
    /// `<nsId>:2:<name>:<version>`.
    pub fn to_legacy(&self) -> String {
        format!("{}:2:{}:{}", self.namespace_identifier, self.name, self.version)
    }

    /// `did:indy:<ns>:<nsId>/anoncreds/v0/SCHEMA/<name>/<version>`.
    pub fn to_qualified(&self, namespace: &str) -> String {
        format!(
            "{DID_INDY_PREFIX}{namespace}:{}{ANONCREDS_PATH}SCHEMA/{}/{}",
            self.namespace_identifier, self.name, self.version
        )
    }
}

/// Parse either form of a schema identifier.
pub fn parse_schema_id(id: &str) -> Result<SchemaIdParts, IdentifierError> {
    let kind = ObjectKind::Schema;
    if id.starts_with(DID_INDY_PREFIX) {
        let (namespace, nsid, object_type, path) = split_qualified(kind, id)?;
        expect_object_type(kind, id, object_type, "SCHEMA")?;
        let (name, version) = path
            .rsplit_once('/')
            .ok_or_else(|| malformed(kind, id, "expected SCHEMA/<name>/<version>"))?;
        check_name_and_version(kind, id, name, version)?;
        return Ok(SchemaIdParts {
            namespace: Some(namespace),
            namespace_identifier: nsid,
            name: name.to_string(),
            version: version.to_string(),
        });
    }

    let (nsid, rest) = split_legacy_prefix(kind, id, "2")?;
    let (name, version) = rest
        .rsplit_once(':')
        .ok_or_else(|| malformed(kind, id, "expected <nsId>:2:<name>:<version>"))?;
    check_name_and_version(kind, id, name, version)?;
    Ok(SchemaIdParts {
        namespace: None,
        namespace_identifier: nsid.to_string(),
        name: name.to_string(),
        version: version.to_string(),
    })
}

/// Build a legacy schema identifier.
pub fn legacy_schema_id(namespace_identifier: &str, name: &str, version: &str) -> String {
    format!("{namespace_identifier}:2:{name}:{version}")
}

// ---------------------------------------------------------------------------
// Credential definitions
// ---------------------------------------------------------------------------

/// Parsed credential definition identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDefinitionIdParts {
    /// `did:indy` namespace, `None` for the legacy form.
    pub namespace: Option<String>,
    /// Issuer namespace identifier.
    pub namespace_identifier: String,
    /// Ledger sequence number of the schema.
    pub schema_seq_no: u64,
    /// Credential definition tag.
    pub tag: String,
}

impl CredentialDefinitionIdParts {
    /// `<nsId>:3:CL:<seqNo>:<tag>`.
    pub fn to_legacy(&self) -> String {
        legacy_credential_definition_id(&self.namespace_identifier, self.schema_seq_no, &self.tag)
    }

    /// `did:indy:<ns>:<nsId>/anoncreds/v0/CLAIM_DEF/<seqNo>/<tag>`.
    pub fn to_qualified(&self, namespace: &str) -> String {
        format!(
            "{DID_INDY_PREFIX}{namespace}:{}{ANONCREDS_PATH}CLAIM_DEF/{}/{}",
            self.namespace_identifier, self.schema_seq_no, self.tag
        )
    }
}

/// Parse either form of a credential definition identifier.
pub fn parse_credential_definition_id(
    id: &str,
) -> Result<CredentialDefinitionIdParts, IdentifierError> {
    let kind = ObjectKind::CredentialDefinition;
    if id.starts_with(DID_INDY_PREFIX) {
        let (namespace, nsid, object_type, path) = split_qualified(kind, id)?;
        expect_object_type(kind, id, object_type, "CLAIM_DEF")?;
        let (seq_no, tag) = path
            .split_once('/')
            .ok_or_else(|| malformed(kind, id, "expected CLAIM_DEF/<seqNo>/<tag>"))?;
        let schema_seq_no = parse_seq_no(kind, id, seq_no)?;
        check_tag(kind, id, tag)?;
        return Ok(CredentialDefinitionIdParts {
            namespace: Some(namespace),
            namespace_identifier: nsid,
            schema_seq_no,
            tag: tag.to_string(),
        });
    }

    let (nsid, rest) = split_legacy_prefix(kind, id, "3")?;
    let rest = rest
        .strip_prefix("CL:")
        .ok_or_else(|| malformed(kind, id, "signature type must be CL"))?;
    let (seq_no, tag) = rest
        .split_once(':')
        .ok_or_else(|| malformed(kind, id, "expected <nsId>:3:CL:<seqNo>:<tag>"))?;
    let schema_seq_no = parse_seq_no(kind, id, seq_no)?;
    check_tag(kind, id, tag)?;
    Ok(CredentialDefinitionIdParts {
        namespace: None,
        namespace_identifier: nsid.to_string(),
        schema_seq_no,
        tag: tag.to_string(),
    })
}

/// Build a legacy credential definition identifier.
pub fn legacy_credential_definition_id(
    namespace_identifier: &str,
    schema_seq_no: u64,
    tag: &str,
) -> String {
    format!("{namespace_identifier}:3:CL:{schema_seq_no}:{tag}")
}

// ---------------------------------------------------------------------------
// Revocation registries
// ---------------------------------------------------------------------------

/// Parsed revocation registry definition identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRegistryIdParts {
    /// `did:indy` namespace, `None` for the legacy form.
    pub namespace: Option<String>,
    /// Issuer namespace identifier.
    pub namespace_identifier: String,
    /// Ledger sequence number of the schema.
    pub schema_seq_no: u64,
    /// Tag of the owning credential definition.
    pub credential_definition_tag: String,
    /// Revocation registry tag.
    pub revocation_registry_tag: String,
}

impl RevocationRegistryIdParts {
    /// `<nsId>:4:<nsId>:3:CL:<seqNo>:<credDefTag>:CL_ACCUM:<tag>`.
    pub fn to_legacy(&self) -> String {
        let cred_def_id = legacy_credential_definition_id(
            &self.namespace_identifier,
            self.schema_seq_no,
            &self.credential_definition_tag,
        );
        format!(
            "{}:4:{cred_def_id}:CL_ACCUM:{}",
            self.namespace_identifier, self.revocation_registry_tag
        )
    }

    /// `did:indy:<ns>:<nsId>/anoncreds/v0/REV_REG_DEF/<seqNo>/<credDefTag>/<tag>`.
    pub fn to_qualified(&self, namespace: &str) -> String {
        format!(
            "{DID_INDY_PREFIX}{namespace}:{}{ANONCREDS_PATH}REV_REG_DEF/{}/{}/{}",
            self.namespace_identifier,
            self.schema_seq_no,
            self.credential_definition_tag,
            self.revocation_registry_tag
        )
    }

    /// Legacy identifier of the owning credential definition.
    pub fn legacy_credential_definition_id(&self) -> String {
        legacy_credential_definition_id(
            &self.namespace_identifier,
            self.schema_seq_no,
            &self.credential_definition_tag,
        )
    }
}

/// Parse either form of a revocation registry definition identifier.
pub fn parse_revocation_registry_id(
    id: &str,
) -> Result<RevocationRegistryIdParts, IdentifierError> {
    let kind = ObjectKind::RevocationRegistryDefinition;
    if id.starts_with(DID_INDY_PREFIX) {
        let (namespace, nsid, object_type, path) = split_qualified(kind, id)?;
        expect_object_type(kind, id, object_type, "REV_REG_DEF")?;
        let (seq_no, tags) = path
            .split_once('/')
            .ok_or_else(|| malformed(kind, id, "expected REV_REG_DEF/<seqNo>/<credDefTag>/<tag>"))?;
        let (cred_def_tag, rev_reg_tag) = tags
            .rsplit_once('/')
            .ok_or_else(|| malformed(kind, id, "expected REV_REG_DEF/<seqNo>/<credDefTag>/<tag>"))?;
        let schema_seq_no = parse_seq_no(kind, id, seq_no)?;
        check_tag(kind, id, cred_def_tag)?;
        check_tag(kind, id, rev_reg_tag)?;
        return Ok(RevocationRegistryIdParts {
            namespace: Some(namespace),
            namespace_identifier: nsid,
            schema_seq_no,
            credential_definition_tag: cred_def_tag.to_string(),
            revocation_registry_tag: rev_reg_tag.to_string(),
        });
    }

    let (nsid, rest) = split_legacy_prefix(kind, id, "4")?;
    let (cred_def_id, rev_reg_tag) = rest
        .rsplit_once(":CL_ACCUM:")
        .ok_or_else(|| malformed(kind, id, "missing CL_ACCUM revocation type"))?;
    let cred_def = parse_credential_definition_id(cred_def_id)
        .map_err(|_| malformed(kind, id, "embedded credential definition id is malformed"))?;
    if cred_def.namespace.is_some() || cred_def.namespace_identifier != nsid {
        return Err(malformed(kind, id, "embedded credential definition has a different issuer"));
    }
    check_tag(kind, id, rev_reg_tag)?;
    Ok(RevocationRegistryIdParts {
        namespace: None,
        namespace_identifier: nsid.to_string(),
        schema_seq_no: cred_def.schema_seq_no,
        credential_definition_tag: cred_def.tag,
        revocation_registry_tag: rev_reg_tag.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Kind-generic conversion
// ---------------------------------------------------------------------------

/// Legacy form of a qualified identifier of the given kind.
///
/// Legacy input is validated and returned unchanged, so the function is
/// idempotent. Identifiers from DID methods other than `did:indy` have no
/// legacy form and fail with [`IdentifierError::NoLegacyForm`].
pub fn to_legacy(kind: ObjectKind, id: &str) -> Result<String, IdentifierError> {
    if identifier_form(id) == IdentifierForm::OtherDid {
        return Err(IdentifierError::NoLegacyForm(id.to_string()));
    }
    match kind {
        ObjectKind::Schema => parse_schema_id(id).map(|p| p.to_legacy()),
        ObjectKind::CredentialDefinition => parse_credential_definition_id(id).map(|p| p.to_legacy()),
        ObjectKind::RevocationRegistryDefinition => {
            parse_revocation_registry_id(id).map(|p| p.to_legacy())
        }
    }
}

/// Qualified `did:indy` form of a legacy identifier of the given kind.
///
/// Qualified input of any DID method is returned unchanged. Legacy input
/// needs a namespace, else [`IdentifierError::MissingNamespace`].
pub fn to_qualified(
    kind: ObjectKind,
    id: &str,
    namespace: Option<&str>,
) -> Result<String, IdentifierError> {
    if identifier_form(id) != IdentifierForm::Legacy {
        return Ok(id.to_string());
    }
    let qualify = |namespace: &str| -> Result<String, IdentifierError> {
        if !is_valid_namespace(namespace) {
            return Err(malformed(kind, id, &format!("invalid did:indy namespace {namespace:?}")));
        }
        Ok(match kind {
            ObjectKind::Schema => parse_schema_id(id)?.to_qualified(namespace),
            ObjectKind::CredentialDefinition => {
                parse_credential_definition_id(id)?.to_qualified(namespace)
            }
            ObjectKind::RevocationRegistryDefinition => {
                let parts = parse_revocation_registry_id(id)?;
                if parts.credential_definition_tag.contains('/')
                    || parts.revocation_registry_tag.contains('/')
                {
                    return Err(malformed(kind, id, "tags of a qualified revocation registry cannot contain '/'"));
                }
                parts.to_qualified(namespace)
            }
        })
    };
    qualify(require_namespace(id, namespace)?)
}

/// Both forms of an identifier: `(as_given, legacy)`. `legacy` is `None`
/// when the identifier has no legacy equivalent.
pub fn with_legacy_form(kind: ObjectKind, id: &str) -> (String, Option<String>) {
    (id.to_string(), to_legacy(kind, id).ok())
}

/// The `did:indy` namespace of a qualified identifier or DID, if any.
pub fn did_indy_namespace(identifier: &str) -> Option<String> {
    let rest = identifier.strip_prefix(DID_INDY_PREFIX)?;
    let did_part = rest.split('/').next()?;
    let (namespace, _) = did_part.rsplit_once(':')?;
    is_valid_namespace(namespace).then(|| namespace.to_string())
}

// ---------------------------------------------------------------------------
// Grammar helpers
// ---------------------------------------------------------------------------

fn is_namespace_identifier(s: &str) -> bool {
    (21..=22).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_valid_namespace(namespace: &str) -> bool {
    let segments: Vec<&str> = namespace.split(':').collect();
    (1..=2).contains(&segments.len())
        && segments.iter().all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        })
}

fn malformed(kind: ObjectKind, id: &str, reason: &str) -> IdentifierError {
    IdentifierError::MalformedIdentifier {
        kind,
        identifier: id.to_string(),
        reason: reason.to_string(),
    }
}

fn require_namespace<'a>(id: &str, namespace: Option<&'a str>) -> Result<&'a str, IdentifierError> {
    namespace
        .filter(|ns| !ns.is_empty())
        .ok_or_else(|| IdentifierError::MissingNamespace(id.to_string()))
}

/// Split `did:indy:<ns>:<nsId>/anoncreds/v0/<TYPE>/<path>`.
fn split_qualified<'a>(
    kind: ObjectKind,
    id: &'a str,
) -> Result<(String, String, &'a str, &'a str), IdentifierError> {
    let rest = id
        .strip_prefix(DID_INDY_PREFIX)
        .ok_or_else(|| malformed(kind, id, "missing did:indy prefix"))?;
    let (did_part, object_part) = rest
        .split_once(ANONCREDS_PATH)
        .ok_or_else(|| malformed(kind, id, "missing /anoncreds/v0/ path"))?;
    let (namespace, nsid) = did_part
        .rsplit_once(':')
        .ok_or_else(|| malformed(kind, id, "expected did:indy:<namespace>:<id>"))?;
    if !is_valid_namespace(namespace) {
        return Err(malformed(kind, id, "invalid did:indy namespace"));
    }
    if !is_namespace_identifier(nsid) {
        return Err(malformed(kind, id, "namespace identifier must be 21-22 base58 characters"));
    }
    let (object_type, path) = object_part
        .split_once('/')
        .ok_or_else(|| malformed(kind, id, "missing object path"))?;
    Ok((namespace.to_string(), nsid.to_string(), object_type, path))
}

/// Split `<nsId>:<marker>:<rest>`.
fn split_legacy_prefix<'a>(
    kind: ObjectKind,
    id: &'a str,
    marker: &str,
) -> Result<(&'a str, &'a str), IdentifierError> {
    let mut parts = id.splitn(3, ':');
    let nsid = parts.next().unwrap_or_default();
    let found_marker = parts.next();
    let rest = parts.next();
    if !is_namespace_identifier(nsid) {
        return Err(malformed(kind, id, "namespace identifier must be 21-22 base58 characters"));
    }
    match (found_marker, rest) {
        (Some(m), Some(rest)) if m == marker => Ok((nsid, rest)),
        _ => Err(malformed(kind, id, &format!("expected object marker :{marker}:"))),
    }
}

fn expect_object_type(
    kind: ObjectKind,
    id: &str,
    found: &str,
    expected: &str,
) -> Result<(), IdentifierError> {
    if found == expected {
        Ok(())
    } else {
        Err(malformed(kind, id, &format!("expected object type {expected}, found {found}")))
    }
}

fn check_name_and_version(
    kind: ObjectKind,
    id: &str,
    name: &str,
    version: &str,
) -> Result<(), IdentifierError> {
    if name.is_empty() {
        return Err(malformed(kind, id, "empty schema name"));
    }
    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(malformed(kind, id, "schema version must be digits and dots"));
    }
    Ok(())
}

fn check_tag(kind: ObjectKind, id: &str, tag: &str) -> Result<(), IdentifierError> {
    if tag.is_empty() {
        Err(malformed(kind, id, "empty tag"))
    } else {
        Ok(())
    }
}

fn parse_seq_no(kind: ObjectKind, id: &str, seq_no: &str) -> Result<u64, IdentifierError> {
    if seq_no.starts_with('0') {
        return Err(malformed(kind, id, "schema sequence number must not have leading zeros"));
    }
    seq_no
        .parse::<u64>()
        .map_err(|_| malformed(kind, id, "schema sequence number must be a positive integer"))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn nsid() -> impl Strategy<Value = String> {
        "[1-9A-HJ-NP-Za-km-z]{22}"
    }

    fn namespace() -> impl Strategy<Value = String> {
        prop_oneof![Just("sovrin".to_string()), Just("bcovrin:test".to_string()), "[a-z][a-z0-9]{0,6}"]
    }

    proptest! {
        #[test]
        fn legacy_schema_survives_qualification(
            nsid in nsid(),
            name in "[a-zA-Z][a-zA-Z0-9 _-]{0,15}",
            version in "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}",
            ns in namespace(),
        ) {
            let legacy = legacy_schema_id(&nsid, &name, &version);
            let qualified = to_qualified(ObjectKind::Schema, &legacy, Some(&ns)).unwrap();
            prop_assert_eq!(to_legacy(ObjectKind::Schema, &qualified).unwrap(), legacy);
        }

        #[test]
        fn legacy_revocation_registry_survives_qualification(
            nsid in nsid(),
            seq in 1u64..1_000_000,
            cred_def_tag in "[a-zA-Z0-9_-]{1,10}",
            tag in "[a-zA-Z0-9_-]{1,10}",
            ns in namespace(),
        ) {
            let legacy = format!("{nsid}:4:{nsid}:3:CL:{seq}:{cred_def_tag}:CL_ACCUM:{tag}");
            let qualified = to_qualified(ObjectKind::RevocationRegistryDefinition, &legacy, Some(&ns)).unwrap();
            prop_assert_eq!(
                to_legacy(ObjectKind::RevocationRegistryDefinition, &qualified).unwrap(),
                legacy
            );
        }

        #[test]
        fn to_legacy_idempotent_for_credential_definitions(
            nsid in nsid(),
            seq in 1u64..1_000_000,
            tag in "[a-zA-Z0-9_-]{1,10}",
            ns in namespace(),
        ) {
            let qualified = format!("did:indy:{ns}:{nsid}/anoncreds/v0/CLAIM_DEF/{seq}/{tag}");
            let once = to_legacy(ObjectKind::CredentialDefinition, &qualified).unwrap();
            let twice = to_legacy(ObjectKind::CredentialDefinition, &once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
