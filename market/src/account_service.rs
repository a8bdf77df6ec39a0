//! Account service implementation
//!
//! gRPC front of the account registry.

use std::sync::Arc;

use pb::account_service_server::AccountService;
use pb::{GetAccountReply, GetAccountRequest, RegisterAccountReply, RegisterAccountRequest};

use crate::accounts::{Account, AccountRegistry};
use crate::metrics;

/// Protocol buffer definitions for the account service
pub mod pb {
    pub use proto::account_service_server;
    pub use proto::{
        Account, GetAccountReply, GetAccountRequest, RegisterAccountReply, RegisterAccountRequest,
    };
}

impl From<Account> for pb::Account {
    fn from(account: Account) -> Self {
        pb::Account {
            id: account.id,
            balance: account.balance,
            holdings: account.holdings,
        }
    }
}

pub struct AccountServiceSVC {
    registry: Arc<AccountRegistry>,
}

impl AccountServiceSVC {
    pub fn new(registry: Arc<AccountRegistry>) -> Self {
        Self { registry }
    }
}

#[tonic::async_trait]
impl AccountService for AccountServiceSVC {
    /// Registers an account with its opening balance and holdings
    async fn register_account(
        &self,
        request: tonic::Request<RegisterAccountRequest>,
    ) -> Result<tonic::Response<RegisterAccountReply>, tonic::Status> {
        metrics::record_metrics("register_account", move || async move {
            let account = request
                .into_inner()
                .account
                .ok_or_else(|| tonic::Status::invalid_argument("request carries no account"))?;
            let account_id = self.registry.register(account.balance, account.holdings);
            Ok(tonic::Response::new(RegisterAccountReply { account_id }))
        })
        .await
    }

    async fn get_account(
        &self,
        request: tonic::Request<GetAccountRequest>,
    ) -> Result<tonic::Response<GetAccountReply>, tonic::Status> {
        metrics::record_metrics("get_account", move || async move {
            let account_id = request.into_inner().account_id;
            match self.registry.get(&account_id) {
                Some(account) => Ok(tonic::Response::new(GetAccountReply {
                    account: Some(account.into()),
                })),
                None => Err(tonic::Status::not_found(format!(
                    "account {} not found",
                    account_id
                ))),
            }
        })
        .await
    }
}
