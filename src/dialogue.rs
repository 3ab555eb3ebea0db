//! Conversation state for registration, channel submission, payment, and
//! withdrawal flows.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Channel data resolved during a submission conversation, carried between
/// the URL step and the subscriber-package step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDraft {
    pub url: String,
    pub channel_id: String,
    pub channel_name: String,
}

/// Represents the conversation state of a chat
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum BotDialogueState {
    #[default]
    Idle,
    /// Registration: waiting for the user's email address
    AwaitingEmail,
    /// Registration: waiting for the emailed confirmation code
    AwaitingEmailCode {
        email: String,
        code: String,
    },
    /// Registration: waiting for the shared phone contact
    AwaitingPhone {
        email: String,
    },
    /// Channel submission: waiting for the YouTube URL
    AwaitingChannelUrl,
    /// Channel submission: waiting for the subscriber-package choice
    AwaitingSubscriptionChoice {
        draft: ChannelDraft,
    },
    /// Payment: waiting for the payment ID for a selected channel
    AwaitingPaymentId {
        channel_description: String,
    },
    /// Withdrawal: waiting for the amount
    AwaitingWithdrawalAmount,
    /// Withdrawal: waiting for the carrier name
    AwaitingWithdrawalCarrier {
        amount: i64,
    },
    /// Admin: waiting for a channel description to delete
    AwaitingChannelDeletion,
    /// Admin: waiting for a Telegram ID to ban
    AwaitingBanTarget,
    /// Admin: waiting for a Telegram ID to unban
    AwaitingUnbanTarget,
}

/// Type alias for the bot dialogue
pub type BotDialogue = Dialogue<BotDialogueState, InMemStorage<BotDialogueState>>;
