//! Checklist command.

use crate::checklist::{build_message, build_message_for_current_year, ClientProfile};

/// Print the request message. Plain stdout so it can be piped or copied.
pub fn cmd_checklist(profile: &ClientProfile, year: Option<i32>) -> anyhow::Result<()> {
    let message = match year {
        Some(year) => build_message(profile, year),
        None => build_message_for_current_year(profile),
    };
    println!("{}", message);
    Ok(())
}
