use {
  crate::{Address, Amount},
  serde::{Deserialize, Serialize},
};

/// Index of a campaign on the remote ledger.
///
/// Ids are assigned densely by the remote contract in creation order,
/// starting at zero, and are never reused or reordered.
pub type CampaignId = u64;

/// A fundraising campaign as recorded by the remote ledger.
///
/// Clients never mutate these records. A locally held campaign is only
/// ever replaced wholesale by a freshly fetched copy of the remote truth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Campaign {
  /// Position of this campaign in the remote campaigns list.
  pub id: CampaignId,

  /// Account that created the campaign. Set once at creation.
  pub owner: Address,

  /// Fundraising target in the smallest currency unit.
  pub goal: Amount,

  /// Sum of all confirmed donations.
  ///
  /// Grows only while the campaign is open and is frozen
  /// once `ended` becomes true.
  pub total_raised: Amount,

  pub title: String,
  pub description: String,

  /// One-way flag, once a campaign ends it never reopens.
  pub ended: bool,
}

impl Campaign {
  pub fn is_open(&self) -> bool {
    !self.ended
  }

  /// Percentage of the goal raised so far. Campaigns with a zero goal
  /// report zero progress.
  pub fn progress_percent(&self) -> f64 {
    if self.goal.is_zero() {
      return 0.0;
    }
    self.total_raised.get() as f64 / self.goal.get() as f64 * 100.0
  }
}
