//! Revocation status of individual slots in a status list snapshot.

use ancr_core::RevocationStatusList;

use crate::error::RevocationError;

/// `revocationList[index] == 1`. Fails when `index` is outside the list.
pub fn is_revoked(list: &RevocationStatusList, index: u32) -> Result<bool, RevocationError> {
    list.is_revoked(index).ok_or_else(|| RevocationError::IndexOutOfRange {
        rev_reg_def_id: list.rev_reg_def_id.clone(),
        index,
        max_cred_num: u32::try_from(list.revocation_list.len()).unwrap_or(u32::MAX),
    })
}

/// Indices revoked in `list`, ascending.
pub fn revoked_indices(list: &RevocationStatusList) -> Vec<u32> {
    (0u32..)
        .zip(&list.revocation_list)
        .filter(|(_, bit)| **bit == 1)
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(bits: Vec<u8>) -> RevocationStatusList {
        RevocationStatusList {
            issuer_id: "LjgpST2rjsoxYegQDRm7EL".into(),
            rev_reg_def_id: "rev".into(),
            revocation_list: bits,
            current_accumulator: "acc".into(),
            timestamp: None,
        }
    }

    #[test]
    fn bit_lookup() {
        let l = list(vec![0, 1, 0]);
        assert!(!is_revoked(&l, 0).unwrap());
        assert!(is_revoked(&l, 1).unwrap());
        assert!(matches!(is_revoked(&l, 3), Err(RevocationError::IndexOutOfRange { max_cred_num: 3, .. })));
    }

    #[test]
    fn revoked_indices_ascending() {
        assert_eq!(revoked_indices(&list(vec![1, 0, 1, 1])), vec![0, 2, 3]);
        assert!(revoked_indices(&list(vec![0, 0])).is_empty());
    }
}
