//! Investment, offer, profile and attachment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FileId, InvestmentId, InvestmentStatus, OfferId, Role, UserId};

/// An investment placed by a signer against an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Investment {
    /// Investment identifier.
    #[schema(value_type = uuid::Uuid)]
    pub id: InvestmentId,
    /// Owning signer.
    #[schema(value_type = uuid::Uuid)]
    pub user_id: UserId,
    /// Offer the investment is placed against.
    #[schema(value_type = uuid::Uuid)]
    pub offer_id: OfferId,
    /// Amount in minor currency units (grosze).
    pub amount: i64,
    /// Current lifecycle status.
    pub status: InvestmentStatus,
    /// Justification recorded on rejection or cancellation.
    pub reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Set when the investment reaches `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-delete marker. Soft-deleted investments are treated as absent.
    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Investment {
    /// Creates a new `pending` investment.
    #[must_use]
    pub fn new(user_id: UserId, offer_id: OfferId, amount: i64) -> Self {
        let now = Utc::now();
        Self {
            id: InvestmentId::new(),
            user_id,
            offer_id,
            amount,
            status: InvestmentStatus::Pending,
            reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            deleted_at: None,
        }
    }

    /// Returns `true` unless the record is soft-deleted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// An investable opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Offer {
    /// Offer identifier.
    #[schema(value_type = uuid::Uuid)]
    pub id: OfferId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Amount the offer aims to raise, in minor units.
    pub target_amount: i64,
    /// Smallest accepted investment, in minor units.
    pub min_investment: i64,
    /// Offer status as stored by the backend.
    pub status: String,
    /// End of the validity window.
    pub end_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Profile identifier.
    #[schema(value_type = uuid::Uuid)]
    pub id: UserId,
    /// Contact email.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Role deciding what the user may do.
    pub role: Role,
}

impl UserProfile {
    /// Full name when both parts are present, otherwise the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

/// Metadata of a file attached to an investment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvestmentFile {
    /// File identifier.
    #[schema(value_type = uuid::Uuid)]
    pub id: FileId,
    /// Owning investment.
    #[schema(value_type = uuid::Uuid)]
    pub investment_id: InvestmentId,
    /// Original file name as uploaded.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type recorded at upload.
    pub mime_type: String,
    /// Object-storage key.
    #[serde(skip_serializing, default)]
    pub storage_path: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
    /// Administrator who uploaded the file.
    #[schema(value_type = uuid::Uuid)]
    pub uploaded_by: UserId,
}
