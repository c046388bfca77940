//! # Identifier Subcommand
//!
//! ```bash
//! ancr identifier legacy did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL/anoncreds/v0/SCHEMA/Employee/1.0
//! ancr identifier qualify --namespace sovrin LjgpST2rjsoxYegQDRm7EL:2:Employee:1.0
//! ancr identifier parse LjgpST2rjsoxYegQDRm7EL:3:CL:15:default
//! ```

use anyhow::{bail, Result};
use clap::{Args, Subcommand, ValueEnum};

use ancr_core::identifier::{
    self, identifier_form, parse_credential_definition_id, parse_did, parse_revocation_registry_id,
    parse_schema_id, to_legacy_did, to_qualified_did, IdentifierForm,
};
use ancr_core::ObjectKind;

/// Kinds accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    /// An issuer DID.
    Did,
    /// A schema identifier.
    Schema,
    /// A credential definition identifier.
    CredDef,
    /// A revocation registry identifier.
    RevReg,
}

impl KindArg {
    fn object_kind(self) -> Option<ObjectKind> {
        match self {
            Self::Did => None,
            Self::Schema => Some(ObjectKind::Schema),
            Self::CredDef => Some(ObjectKind::CredentialDefinition),
            Self::RevReg => Some(ObjectKind::RevocationRegistryDefinition),
        }
    }
}

/// Arguments for `ancr identifier`.
#[derive(Args, Debug)]
pub struct IdentifierArgs {
    #[command(subcommand)]
    pub command: IdentifierCommand,
}

/// Identifier operations.
#[derive(Subcommand, Debug)]
pub enum IdentifierCommand {
    /// Convert to the legacy (ledger-native) form.
    Legacy {
        /// Identifier to convert.
        id: String,
        /// Kind of identifier; detected when omitted.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Convert to the qualified `did:indy` form.
    Qualify {
        /// Identifier to convert.
        id: String,
        /// `did:indy` namespace, e.g. `sovrin` or `sovrin:staging`.
        #[arg(long)]
        namespace: String,
        /// Kind of identifier; detected when omitted.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Print the parts of an identifier as JSON.
    Parse {
        /// Identifier to parse.
        id: String,
    },
}

/// The kind of `id`, trying the most specific grammar first.
pub fn detect_kind(id: &str) -> Option<KindArg> {
    if parse_revocation_registry_id(id).is_ok() {
        Some(KindArg::RevReg)
    } else if parse_credential_definition_id(id).is_ok() {
        Some(KindArg::CredDef)
    } else if parse_schema_id(id).is_ok() {
        Some(KindArg::Schema)
    } else if parse_did(id).is_ok() {
        Some(KindArg::Did)
    } else {
        None
    }
}

fn resolve_kind(id: &str, kind: Option<KindArg>) -> Result<KindArg> {
    match kind.or_else(|| detect_kind(id)) {
        Some(kind) => Ok(kind),
        None => bail!("'{id}' is not a DID, schema, credential definition or revocation registry identifier"),
    }
}

/// Legacy form of `id`.
pub fn legacy(id: &str, kind: Option<KindArg>) -> Result<String> {
    Ok(match resolve_kind(id, kind)?.object_kind() {
        Some(kind) => identifier::to_legacy(kind, id)?,
        None => to_legacy_did(id)?,
    })
}

/// Qualified form of `id` in `namespace`.
pub fn qualify(id: &str, namespace: &str, kind: Option<KindArg>) -> Result<String> {
    Ok(match resolve_kind(id, kind)?.object_kind() {
        Some(kind) => identifier::to_qualified(kind, id, Some(namespace))?,
        None => to_qualified_did(id, Some(namespace))?,
    })
}

fn form_name(id: &str) -> &'static str {
    match identifier_form(id) {
        IdentifierForm::Legacy => "legacy",
        IdentifierForm::DidIndy => "did:indy",
        IdentifierForm::OtherDid => "other-did",
    }
}

/// Structured parts of `id`.
pub fn parse(id: &str) -> Result<serde_json::Value> {
    let form = form_name(id);
    let mut parts = match resolve_kind(id, None)? {
        KindArg::Did => {
            let p = parse_did(id)?;
            serde_json::json!({
                "kind": "did",
                "namespace": p.namespace,
                "namespaceIdentifier": p.namespace_identifier,
            })
        }
        KindArg::Schema => {
            let p = parse_schema_id(id)?;
            serde_json::json!({
                "kind": "schema",
                "namespace": p.namespace,
                "namespaceIdentifier": p.namespace_identifier,
                "name": p.name,
                "version": p.version,
            })
        }
        KindArg::CredDef => {
            let p = parse_credential_definition_id(id)?;
            serde_json::json!({
                "kind": "credentialDefinition",
                "namespace": p.namespace,
                "namespaceIdentifier": p.namespace_identifier,
                "schemaSeqNo": p.schema_seq_no,
                "tag": p.tag,
            })
        }
        KindArg::RevReg => {
            let p = parse_revocation_registry_id(id)?;
            serde_json::json!({
                "kind": "revocationRegistryDefinition",
                "namespace": p.namespace,
                "namespaceIdentifier": p.namespace_identifier,
                "schemaSeqNo": p.schema_seq_no,
                "credentialDefinitionTag": p.credential_definition_tag,
                "revocationRegistryTag": p.revocation_registry_tag,
            })
        }
    };
    parts["form"] = serde_json::Value::from(form);
    Ok(parts)
}

/// Execute the identifier subcommand.
pub fn run_identifier(args: &IdentifierArgs) -> Result<u8> {
    match &args.command {
        IdentifierCommand::Legacy { id, kind } => println!("{}", legacy(id, *kind)?),
        IdentifierCommand::Qualify { id, namespace, kind } => println!("{}", qualify(id, namespace, *kind)?),
        IdentifierCommand::Parse { id } => println!("{}", serde_json::to_string_pretty(&parse(id)?)?),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "LjgpST2rjsoxYegQDRm7EL";

    #[test]
    fn kind_detection() {
        assert_eq!(detect_kind(DID), Some(KindArg::Did));
        assert_eq!(detect_kind(&format!("{DID}:2:Employee:1.0")), Some(KindArg::Schema));
        assert_eq!(detect_kind(&format!("{DID}:3:CL:15:default")), Some(KindArg::CredDef));
        assert_eq!(detect_kind(&format!("{DID}:4:{DID}:3:CL:15:default:CL_ACCUM:0")), Some(KindArg::RevReg));
        assert_eq!(detect_kind("not an id"), None);
    }

    #[test]
    fn qualify_then_legacy() {
        let legacy_id = format!("{DID}:3:CL:15:default");
        let qualified = qualify(&legacy_id, "sovrin", None).unwrap();
        assert_eq!(qualified, format!("did:indy:sovrin:{DID}/anoncreds/v0/CLAIM_DEF/15/default"));
        assert_eq!(legacy(&qualified, None).unwrap(), legacy_id);
        assert_eq!(qualify(DID, "sovrin", None).unwrap(), format!("did:indy:sovrin:{DID}"));
    }

    #[test]
    fn parse_reports_form() {
        let parts = parse(&format!("did:indy:sovrin:{DID}/anoncreds/v0/SCHEMA/Employee/1.0")).unwrap();
        assert_eq!(parts["kind"], "schema");
        assert_eq!(parts["form"], "did:indy");
        assert_eq!(parts["namespace"], "sovrin");
        assert_eq!(parts["name"], "Employee");
    }
}
