//! Settlement flow: the declared loser pays the room owner on-chain, then
//! the room flips to `completed`.
//!
//! The wallet and the chain are external collaborators. They enter this
//! module through the [`WalletSigner`] and [`ChainConnection`] seams; the
//! flow itself is one awaited sequence with no retries. Any failure leaves
//! the room untouched and the caller re-invokes manually.

pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::{RoomStore, StoreError};

/// Lamports per SOL, the chain's base unit.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Settlement failures.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("no wallet connected")]
    NotConnected,
    #[error("transaction failed: {0}")]
    Transaction(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Confirmation commitment levels, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    /// Whether a status reported by the chain satisfies this level.
    #[must_use]
    pub fn is_satisfied_by(&self, reported: &str) -> bool {
        Self::parse(reported).is_some_and(|r| r >= *self)
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "processed" => Some(Self::Processed),
            "confirmed" => Some(Self::Confirmed),
            "finalized" => Some(Self::Finalized),
            _ => None,
        }
    }
}

/// The single native-currency transfer a settlement produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    /// Sender address (the loser's wallet).
    pub from: String,
    /// Recipient address (the room owner).
    pub to: String,
    /// Amount in lamports.
    pub lamports: u64,
}

/// A connection to the currency network.
#[async_trait]
pub trait ChainConnection: Send + Sync {
    /// Submit a signed wire transaction; returns its signature.
    async fn submit(&self, wire_tx: &str) -> Result<String, SettlementError>;

    /// Block until the transaction reaches `commitment`, or fail.
    async fn confirm_transaction(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> Result<(), SettlementError>;
}

/// A wallet able to sign and submit a transfer.
///
/// Implementations wrap whatever wallet adapter the client runtime provides;
/// this crate never holds key material itself.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// The connected wallet's address.
    fn public_key(&self) -> String;

    /// Sign `tx` and submit it through `conn`; returns the signature.
    async fn send_transaction(
        &self,
        tx: &TransferInstruction,
        conn: &dyn ChainConnection,
    ) -> Result<String, SettlementError>;
}

/// Explicit wallet-connection context.
///
/// Holds at most one signer; components receive a reference instead of
/// reading global state. `connect`/`disconnect` are the whole lifecycle.
#[derive(Clone, Default)]
pub struct WalletSession {
    signer: Option<Arc<dyn WalletSigner>>,
}

impl WalletSession {
    /// A session with no wallet attached.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self { signer: None }
    }

    /// Attach a signer, replacing any previous one.
    pub fn connect(&mut self, signer: Arc<dyn WalletSigner>) {
        self.signer = Some(signer);
    }

    /// Detach the current signer.
    pub fn disconnect(&mut self) {
        self.signer = None;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.signer.is_some()
    }

    /// The connected wallet's address, if any.
    #[must_use]
    pub fn public_key(&self) -> Option<String> {
        self.signer.as_ref().map(|s| s.public_key())
    }

    #[must_use]
    pub fn signer(&self) -> Option<&Arc<dyn WalletSigner>> {
        self.signer.as_ref()
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Payout in SOL: the per-person stake scaled by every other seat.
///
/// The full amount goes to the room owner's address, whatever the seat
/// count; there is no per-winner split.
#[must_use]
pub fn payout_sol(amount_per_person: f64, player_count: i32) -> f64 {
    amount_per_person * f64::from(player_count - 1)
}

/// Payout converted to lamports, rounded to the nearest whole lamport.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn payout_lamports(amount_per_person: f64, player_count: i32) -> u64 {
    (payout_sol(amount_per_person, player_count) * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Outcome of a successful settlement, enough to render the victory poster.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReceipt {
    pub room_id: Uuid,
    pub signature: String,
    pub lamports: u64,
    pub recipient: String,
}

/// Run the settlement flow for one room.
///
/// Steps, in order: require a connected wallet, load the room, build the
/// transfer sized by `amount_per_person x (player_count - 1)`, send it,
/// await `confirmed` commitment, then flip the room to `completed`.
///
/// # Errors
///
/// `NotConnected` if the session has no signer; store errors propagate
/// unchanged (`NotFound`, `NotActive`, backend failures); any signing,
/// submission, or confirmation failure is `Transaction`. A failure before
/// the status flip leaves the room `active`. If the transfer confirms but
/// the flip fails, funds have moved and the room stays `active` until the
/// flip is retried.
pub async fn settle(
    store: &RoomStore,
    wallet: &WalletSession,
    chain: &dyn ChainConnection,
    room_id: Uuid,
) -> Result<SettlementReceipt, SettlementError> {
    let signer = wallet.signer().ok_or(SettlementError::NotConnected)?;

    let room = store.get_by_id(room_id).await?;

    let lamports = payout_lamports(room.amount_per_person, room.player_count);
    let tx = TransferInstruction {
        from: signer.public_key(),
        to: room.owner_address.clone(),
        lamports,
    };

    tracing::info!(
        room_id = %room_id,
        from = %tx.from,
        to = %tx.to,
        lamports,
        "submitting settlement transfer"
    );

    let signature = signer.send_transaction(&tx, chain).await?;
    chain
        .confirm_transaction(&signature, Commitment::Confirmed)
        .await?;

    store.complete(room_id).await?;

    tracing::info!(room_id = %room_id, %signature, "settlement confirmed");

    Ok(SettlementReceipt {
        room_id,
        signature,
        lamports,
        recipient: room.owner_address,
    })
}
