//! Binding for `wrapped_credits.aleo`.
//!
//! One thin wrapper per transition, each delegating to the transaction
//! driver so the call sites in the end-to-end suite read like the scenario
//! they assert. Amounts are passed as the client expects them, suffixed
//! literals like `1000u64` or `321u128`; record inputs are the plaintext
//! blocks a previous execution emitted.

use std::path::PathBuf;

use log::debug;

use leodev_common::accounts::TestAccount;
use leodev_common::error::HarnessError;

use crate::adapter::parse_numeric_plaintext;
use crate::driver::{Execution, TransactionDriver};
use crate::query::ChainClient;

pub const PROGRAM_ID: &str = "wrapped_credits.aleo";
pub const BALANCES_MAPPING: &str = "balances";

pub struct WrappedCredits {
    driver: TransactionDriver,
    client: ChainClient,
    program_dir: PathBuf,
}

impl WrappedCredits {
    pub fn new(driver: TransactionDriver, client: ChainClient, program_dir: PathBuf) -> Self {
        Self {
            driver,
            client,
            program_dir,
        }
    }

    pub fn program_dir(&self) -> &PathBuf {
        &self.program_dir
    }

    /// Public wrapped balance of `address`.
    ///
    /// Returns 0 on any failure, and that is intentional for this one
    /// helper: an account that never held wrapped credits has no `balances`
    /// entry at all, which the client reports the same way it reports an
    /// unreachable node, and for balance-delta assertions an absent entry
    /// IS zero. Callers that need the failure mode use
    /// [`ChainClient::mapping_value`] directly.
    pub async fn public_balance(&self, address: &str) -> u128 {
        match self
            .client
            .mapping_value(PROGRAM_ID, BALANCES_MAPPING, address)
            .await
        {
            Ok(stdout) => parse_numeric_plaintext(&stdout).unwrap_or(0),
            Err(err) => {
                debug!("balance read for {address} failed, reporting 0: {err}");
                0
            }
        }
    }

    pub async fn deposit_credits_public(
        &self,
        signer: &TestAccount,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute("deposit_credits_public", &[amount.to_string()], signer)
            .await
    }

    pub async fn deposit_credits_private(
        &self,
        signer: &TestAccount,
        credits_record: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "deposit_credits_private",
            &[credits_record.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    pub async fn withdraw_credits_public(
        &self,
        signer: &TestAccount,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute("withdraw_credits_public", &[amount.to_string()], signer)
            .await
    }

    pub async fn withdraw_credits_public_signer(
        &self,
        signer: &TestAccount,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "withdraw_credits_public_signer",
            &[amount.to_string()],
            signer,
        )
        .await
    }

    pub async fn withdraw_credits_private(
        &self,
        signer: &TestAccount,
        token_record: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "withdraw_credits_private",
            &[token_record.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    pub async fn transfer_public(
        &self,
        signer: &TestAccount,
        to: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "transfer_public",
            &[to.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    pub async fn transfer_public_as_signer(
        &self,
        signer: &TestAccount,
        to: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "transfer_public_as_signer",
            &[to.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    pub async fn transfer_public_to_private(
        &self,
        signer: &TestAccount,
        to: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "transfer_public_to_private",
            &[to.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    pub async fn transfer_private(
        &self,
        signer: &TestAccount,
        token_record: &str,
        to: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "transfer_private",
            &[token_record.to_string(), to.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    pub async fn transfer_private_to_public(
        &self,
        signer: &TestAccount,
        token_record: &str,
        to: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "transfer_private_to_public",
            &[token_record.to_string(), to.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    /// Escape hatch into the base ledger: mint a private `credits.aleo`
    /// record for `to`, used to fabricate inputs for the private deposit
    /// paths.
    pub async fn mint_private_credits(
        &self,
        signer: &TestAccount,
        to: &str,
        amount: &str,
    ) -> Result<Execution, HarnessError> {
        self.execute(
            "credits.aleo/transfer_public_to_private",
            &[to.to_string(), amount.to_string()],
            signer,
        )
        .await
    }

    async fn execute(
        &self,
        function: &str,
        inputs: &[String],
        signer: &TestAccount,
    ) -> Result<Execution, HarnessError> {
        self.driver
            .execute(&self.program_dir, function, inputs, signer)
            .await
    }
}
