use {
  crowdfund_client_sdk::{Receipt, Snapshot},
  crowdfund_primitives::Campaign,
};

fn status(campaign: &Campaign) -> &'static str {
  match campaign.ended {
    true => "ended",
    false => "open",
  }
}

pub fn table(snapshot: &Snapshot) {
  if snapshot.is_empty() {
    println!("no campaigns yet");
    return;
  }

  println!(
    "{:>4}  {:<24}  {:>24}  {:>24}  {:>8}  {:<6}",
    "ID", "TITLE", "RAISED", "GOAL", "PROGRESS", "STATUS"
  );
  for campaign in snapshot.iter() {
    println!(
      "{:>4}  {:<24}  {:>24}  {:>24}  {:>7.2}%  {:<6}",
      campaign.id,
      truncate(&campaign.title, 24),
      campaign.total_raised,
      campaign.goal,
      campaign.progress_percent(),
      status(campaign)
    );
  }
}

pub fn details(campaign: &Campaign) {
  println!("Campaign #{}: {}", campaign.id, campaign.title);
  if !campaign.description.is_empty() {
    println!("  {}", campaign.description);
  }
  println!("  Goal:     {} wei", campaign.goal);
  println!("  Raised:   {} wei", campaign.total_raised);
  println!("  Progress: {:.2}%", campaign.progress_percent());
  println!("  Owner:    {}", campaign.owner);
  println!("  Status:   {}", status(campaign));
}

pub fn receipt(receipt: &Receipt) {
  println!(
    "confirmed {} in block {}",
    receipt.tx_hash, receipt.block_height
  );
}

fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let mut short: String = s.chars().take(max.saturating_sub(1)).collect();
  short.push('…');
  short
}
