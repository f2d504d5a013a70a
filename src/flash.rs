//! One-shot user messages carried across a redirect in a cookie.
//!
//! The cookie value is a base64url (unpadded) JSON array of strings.

use crate::router::{RequestContext, Response};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

pub const COOKIE_NAME: &str = "gigboard_flash";

pub fn encode(messages: &[String]) -> String {
    let json = serde_json::to_vec(messages).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Messages in a cookie value; anything malformed yields none.
pub fn decode(value: &str) -> Vec<String> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

/// Flash messages found in a raw `Cookie` header.
pub fn from_cookie_header(header: &str) -> Vec<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| decode(value))
        .unwrap_or_default()
}

pub fn set_cookie(messages: &[String]) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        COOKIE_NAME,
        encode(messages)
    )
}

pub fn clear_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", COOKIE_NAME)
}

/// Post-middleware turning flash messages into the cookie.
///
/// New messages on the response are stored; a redirect carries pending
/// messages forward, and any other response has shown them, so the cookie is
/// cleared.
pub fn persist(ctx: &RequestContext, mut response: Response) -> Response {
    let mut pending = if response.is_redirect() {
        ctx.flashes.clone()
    } else {
        Vec::new()
    };
    pending.append(&mut response.flashes);
    if !pending.is_empty() {
        response.with_header("Set-Cookie", set_cookie(&pending))
    } else if !ctx.flashes.is_empty() {
        response.with_header("Set-Cookie", clear_cookie())
    } else {
        response
    }
}
