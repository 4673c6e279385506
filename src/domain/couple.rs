use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission tier of a household member. Owners may manage bills and other
/// members' records; members may only touch their own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionTier {
    Owner,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub tier: PermissionTier,
}

impl Profile {
    pub fn new(display_name: impl Into<String>, tier: PermissionTier) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            tier,
        }
    }
}

/// How often an income source pays out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayCadence {
    Weekly,
    Biweekly,
    Monthly,
}

impl PayCadence {
    /// Multiplier converting one payment at this cadence into a monthly amount.
    pub fn monthly_factor(self) -> Decimal {
        match self {
            PayCadence::Weekly => Decimal::new(4_333_333, 6),
            PayCadence::Biweekly => Decimal::new(2_166_667, 6),
            PayCadence::Monthly => Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub cadence: PayCadence,
}

impl IncomeSource {
    pub fn new(
        couple_id: Uuid,
        profile_id: Uuid,
        name: impl Into<String>,
        amount: Decimal,
        cadence: PayCadence,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            couple_id,
            profile_id,
            name: name.into(),
            amount,
            cadence,
        }
    }

    pub fn monthly_equivalent(&self) -> Decimal {
        self.amount * self.cadence.monthly_factor()
    }
}

/// The two-member household that owns every financial record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Couple {
    pub id: Uuid,
    pub partner_a: Profile,
    pub partner_b: Profile,
    pub created_at: DateTime<Utc>,
}

impl Couple {
    pub fn new(partner_a: Profile, partner_b: Profile) -> Self {
        Self {
            id: Uuid::new_v4(),
            partner_a,
            partner_b,
            created_at: Utc::now(),
        }
    }

    pub fn member(&self, profile_id: Uuid) -> Option<&Profile> {
        [&self.partner_a, &self.partner_b]
            .into_iter()
            .find(|profile| profile.id == profile_id)
    }

    pub fn is_owner(&self, profile_id: Uuid) -> bool {
        self.member(profile_id)
            .is_some_and(|profile| profile.tier == PermissionTier::Owner)
    }
}
