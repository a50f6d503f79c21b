use {
  crate::CampaignId,
  serde::{Deserialize, Serialize},
  std::fmt::Display,
};

/// Intents are raw, unvalidated requests made by a user to change the state
/// of the remote ledger.
///
/// They carry user input exactly as entered, validation and conversion to a
/// contract [`Call`](crate::Call) happen later, so a rejected intent can be
/// reported back together with the input that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
  /// Open a new campaign. The goal is free-form text as typed by the user
  /// and must parse as a whole number of smallest currency units.
  CreateCampaign {
    goal: String,
    title: String,
    description: String,
  },

  /// Send one donation unit to a campaign.
  Donate { id: CampaignId },

  /// Close a campaign for further donations.
  EndCampaign { id: CampaignId },
}

impl Display for Intent {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Intent::CreateCampaign { goal, title, .. } => {
        write!(f, "create campaign {title:?} with goal {goal}")
      }
      Intent::Donate { id } => write!(f, "donate to campaign {id}"),
      Intent::EndCampaign { id } => write!(f, "end campaign {id}"),
    }
  }
}
