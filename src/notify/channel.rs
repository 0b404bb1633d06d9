//! Per-user channel naming and subscription signatures.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub const USER_CHANNEL_PREFIX: &str = "private-user-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelAuthError {
    #[error("Channel {0} does not belong to the caller")]
    Forbidden(String),

    #[error("Invalid socket id: {0}")]
    InvalidSocket(String),

    #[error("Realtime channel signing is not configured")]
    NotConfigured,
}

/// The private channel a user's events are published on.
pub fn channel_for_user(user_id: &str) -> String {
    format!("{}{}", USER_CHANNEL_PREFIX, user_id)
}

/// `"<key>:" + hex(HMAC-SHA256(secret, "<socket_id>:<channel>"))`
pub fn sign_channel(
    key: &str,
    secret: &str,
    socket_id: &str,
    channel: &str,
) -> Result<String, ChannelAuthError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| ChannelAuthError::NotConfigured)?;
    mac.update(format!("{}:{}", socket_id, channel).as_bytes());
    Ok(format!("{}:{}", key, hex::encode(mac.finalize().into_bytes())))
}

/// Sign a subscription only when the channel is the caller's own.
pub fn authorize_channel(
    user_id: &str,
    socket_id: &str,
    channel: &str,
    key: &str,
    secret: &str,
) -> Result<String, ChannelAuthError> {
    if channel != channel_for_user(user_id) {
        return Err(ChannelAuthError::Forbidden(channel.to_string()));
    }
    if socket_id.trim().is_empty() || socket_id.contains(':') {
        return Err(ChannelAuthError::InvalidSocket(socket_id.to_string()));
    }
    sign_channel(key, secret, socket_id, channel)
}
