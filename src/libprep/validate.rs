use crate::libprep::db::Invite;
use crate::libprep::error::Error;
use log::info;
use rusqlite::Connection;

/// The room code behind a battle invite, without surrounding whitespace.
pub fn invite_code(invite: &str) -> Result<&str, Error> {
    let code = invite.trim();
    if code.is_empty() {
        return Err(Error::EmptyInviteCode);
    }
    Ok(code)
}

/// Loose email check: anything with an `@` and a `.` passes.
pub fn email(address: &str) -> Result<&str, Error> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::MissingEmail);
    }
    if !address.contains('@') || !address.contains('.') {
        return Err(Error::InvalidEmail);
    }
    Ok(address)
}

/// Records an invite for `address` unless it is invalid or was sent before.
pub fn invite_friend(conn: &Connection, address: &str) -> Result<String, Error> {
    let address = email(address)?;
    if Invite::exists(conn, address)? {
        return Err(Error::AlreadyInvited);
    }
    Invite::add(conn, address)?;
    info!("[Invite] Sent invite to {}", address);
    Ok(address.to_string())
}
