//! SOAP envelope and digest header construction.

use crate::tr64::types::SoapRequest;

// ─── Constants ───────────────────────────────────────────────────────

const ENVELOPE_START: &str = "<?xml version='1.0' encoding='utf-8'?>\
<s:Envelope s:encodingStyle='http://schemas.xmlsoap.org/soap/encoding/' \
xmlns:s='http://schemas.xmlsoap.org/soap/envelope/'>";
const ENVELOPE_END: &str = "</s:Envelope>\r\n";

pub const NS_DIGEST: &str = "http://soap-authentication.org/digest/2001/10/";

pub const CONTENT_TYPE_XML: &str = "text/xml; charset=\"utf-8\"";

// ─── Headers ─────────────────────────────────────────────────────────

/// First-round header announcing the user and asking for a nonce.
pub fn init_challenge_header(user: &str) -> String {
    format!(
        "<s:Header><h:InitChallenge xmlns:h=\"{ns}\" s:mustUnderstand=\"1\">\
<UserID>{user}</UserID></h:InitChallenge></s:Header>",
        ns = NS_DIGEST,
        user = xml_escape(user),
    )
}

/// Second-round header answering a challenge. Cached and reused verbatim.
pub fn client_auth_header(nonce: &str, auth: &str, user: &str, realm: &str) -> String {
    format!(
        "<s:Header><h:ClientAuth xmlns:h='{ns}' s:mustUnderstand='1'>\
<Nonce>{nonce}</Nonce><Auth>{auth}</Auth><UserID>{user}</UserID><Realm>{realm}</Realm>\
</h:ClientAuth></s:Header>",
        ns = NS_DIGEST,
        nonce = xml_escape(nonce),
        auth = xml_escape(auth),
        user = xml_escape(user),
        realm = xml_escape(realm),
    )
}

// ─── Envelope ────────────────────────────────────────────────────────

/// Serialize `req` into a complete envelope, with `header` (a full
/// `<s:Header>` element) inserted before the body when given.
pub fn build_envelope(req: &SoapRequest, header: Option<&str>) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(ENVELOPE_START);
    if let Some(h) = header {
        out.push_str(h);
    }
    out.push_str(&format!(
        "<s:Body><u:{action} xmlns:u='{service}'>",
        action = req.action,
        service = xml_escape(&req.service),
    ));
    for (key, value) in &req.params {
        out.push_str(&format!("<{key}>{}</{key}>", xml_escape(value), key = key));
    }
    out.push_str(&format!("</u:{}></s:Body>", req.action));
    out.push_str(ENVELOPE_END);
    out
}

/// Escape special characters for XML content.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
