//! Clear persisted session state.

use confidant_core::store::StateStore;
use confidant_store::FileStore;

pub async fn run() -> anyhow::Result<()> {
    let store = FileStore::new(FileStore::default_path());
    store.clear().await?;
    println!("Session state cleared.");
    Ok(())
}
