//! Server-rendered login page.
//!
//! One card, three states: the empty form, a success banner, or a failure banner with a
//! "Try again" form that resubmits the same phone number.

use crate::relay::VerificationOutcome;

const STYLE: &str = r"
  *{margin:0;padding:0;box-sizing:border-box}
  body{font-family:system-ui,-apple-system,sans-serif;display:flex;
       align-items:center;justify-content:center;min-height:100vh;
       background:#f5f7fa;color:#1a1a2e}
  .card{background:#fff;border-radius:12px;padding:2.5rem;
        box-shadow:0 4px 24px rgba(0,0,0,.08);max-width:400px;width:100%}
  h1{font-size:1.4rem;margin-bottom:.5rem}
  p.sub{color:#666;font-size:.9rem;margin-bottom:1.5rem}
  label{font-size:.85rem;font-weight:600;display:block;margin-bottom:.3rem}
  input{width:100%;padding:.7rem .9rem;border:1px solid #ddd;
        border-radius:8px;font-size:1rem;margin-bottom:1rem}
  input:focus{outline:none;border-color:#4361ee;box-shadow:0 0 0 3px rgba(67,97,238,.15)}
  button{width:100%;padding:.8rem;background:#4361ee;color:#fff;border:none;
         border-radius:8px;font-size:1rem;font-weight:600;cursor:pointer}
  button:hover{background:#3651d4}
  .result{margin-top:1.5rem;padding:1rem;border-radius:8px;font-size:.9rem}
  .result.success{background:#ecfdf5;color:#065f46;border:1px solid #a7f3d0}
  .result.failure{background:#fef2f2;color:#991b1b;border:1px solid #fca5a5}
";

const LOGIN_FORM: &str = r#"<form method="post">
  <label for="phone">Phone number</label>
  <input type="tel" id="phone" name="phone" placeholder="+46701234567" required>
  <button type="submit">Send authentication</button>
</form>"#;

const SUCCESS: &str = r#"<div class="result success">✅ Authentication successful</div>"#;

/// Page with the empty phone number form.
#[must_use]
pub fn login_page() -> String {
    layout(LOGIN_FORM)
}

/// Page for a finished attempt.
#[must_use]
pub fn outcome_page(phone: &str, outcome: &VerificationOutcome) -> String {
    match outcome.failure_message() {
        None => layout(SUCCESS),
        Some(message) => layout(&failure(&message, phone)),
    }
}

fn failure(message: &str, phone: &str) -> String {
    format!(
        r#"<div class="result failure">❌ {}</div>
<form method="post" style="margin-top:1rem">
  <input type="hidden" name="phone" value="{}">
  <button type="submit">Try again</button>
</form>"#,
        escape_html(message),
        escape_html(phone)
    )
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Mideye Login</title>
<style>{STYLE}</style></head><body><div class="card">
<h1>🔐 Mideye Login</h1>
<p class="sub">Enter your phone number to authenticate.</p>
{body}
</div></body></html>"#
    )
}

/// Escape text for use in element content and double- or single-quoted attributes.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
