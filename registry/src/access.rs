//! # Access Control
//!
//! A single privileged role — the registry operator — gates the sensitive
//! operations: minting policy changes and the auction-finalization
//! whitelist. There is no role hierarchy and no delegation; the check is
//! identity equality, shared by every component that needs it. Per-asset
//! authority (who may list, transfer, or auction an asset) is a holder
//! check and lives with the ownership ledger, not here.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::identity::AccountId;

/// Errors that can occur during privileged-operation checks.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The caller is not the registry operator.
    #[error("unauthorized: {caller} is not the registry operator")]
    NotOperator {
        /// The identity that attempted the operation.
        caller: AccountId,
    },
}

/// The operator role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControl {
    operator: AccountId,
}

impl AccessControl {
    /// Creates the role with its initial operator.
    pub fn new(operator: AccountId) -> Self {
        Self { operator }
    }

    /// Returns the current operator identity.
    pub fn operator(&self) -> &AccountId {
        &self.operator
    }

    /// Returns `true` if `caller` is the operator.
    pub fn is_operator(&self, caller: &AccountId) -> bool {
        &self.operator == caller
    }

    /// Fails unless `caller` is the operator.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NotOperator`] otherwise.
    pub fn require_operator(&self, caller: &AccountId) -> Result<(), AccessError> {
        if self.is_operator(caller) {
            Ok(())
        } else {
            Err(AccessError::NotOperator {
                caller: caller.clone(),
            })
        }
    }

    /// Hands the role to a new operator. Gated on the current operator.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NotOperator`] if `caller` is not the
    /// current operator.
    pub fn set_operator(
        &mut self,
        caller: &AccountId,
        new_operator: AccountId,
    ) -> Result<(), AccessError> {
        self.require_operator(caller)?;
        info!(previous = %self.operator, current = %new_operator, "operator changed");
        self.operator = new_operator;
        Ok(())
    }
}
