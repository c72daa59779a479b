use url::form_urlencoded;

/// Percent-encode a phone number for the `msisdn` query parameter.
///
/// Uses `application/x-www-form-urlencoded` rules, so a space becomes `+` and every
/// reserved character is escaped.
#[must_use]
pub fn encode_msisdn(phone: &str) -> String {
    form_urlencoded::byte_serialize(phone.as_bytes()).collect()
}

/// Mask a phone number for logs and the event log, keeping the last 4 characters.
#[must_use]
pub fn mask_msisdn(phone: &str) -> String {
    let count = phone.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = phone.chars().skip(count - 4).collect();
    format!("***{tail}")
}
