//! Show what Confidant remembers about the user.

use confidant_agent::session::keys;
use confidant_core::profile::UserProfile;
use confidant_core::store::StateStore;
use confidant_store::FileStore;

pub async fn run() -> anyhow::Result<()> {
    let store = FileStore::new(FileStore::default_path());

    let Some(state) = store.load().await? else {
        println!("No saved session state.");
        return Ok(());
    };

    let profile = state
        .recall(keys::USER_PROFILE)
        .map(UserProfile::from_value)
        .unwrap_or_default();

    let summary = profile.summary();
    if summary.is_empty() {
        println!("Nothing stored about you yet.");
    } else {
        println!("{summary}");
    }

    let stats = profile.interaction_stats();
    println!(
        "{} interactions over {} day(s)",
        stats.total_interactions, stats.days_since_first_interaction
    );

    Ok(())
}
