use crate::model::AccountId;
use serde::{Deserialize, Serialize};

/// An organisational account (a school) that groups member orders.
///
/// Read-only for the engine; the billing preference decides how a master
/// order created for this account is paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// `true`: the account settles the master order centrally.
    /// `false`: every member pays for their own order.
    pub pays_centrally: bool,
}

/// Payload for registering an account.
#[derive(Debug, Clone)]
pub struct AccountCreate {
    pub name: String,
    pub pays_centrally: bool,
}

/// Payload for changing an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub pays_centrally: Option<bool>,
}
