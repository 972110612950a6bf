//! `logout`: forget the stored token.

use crate::config::Settings;
use crate::error::ClientResult;

/// Removes the token file. Not being logged in is not an error.
pub fn run(settings: &Settings) -> ClientResult<()> {
    let store = settings.token_store();
    if store.clear()? {
        println!("Logged out, removed {}", store.path().display());
    } else {
        println!("Not logged in.");
    }
    Ok(())
}
