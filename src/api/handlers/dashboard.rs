use axum::response::Html;

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// `GET /dashboard`: static page; all data is fetched from the bearer-protected endpoints.
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_page_uses_protected_endpoints() {
        assert!(DASHBOARD_HTML.contains("<title>Magic Link Dashboard</title>"));
        for endpoint in [
            "/api/stats",
            "/api/events",
            "/api/export/events",
            "/api/stats/reset",
        ] {
            assert!(DASHBOARD_HTML.contains(endpoint), "missing {endpoint}");
        }
        assert!(DASHBOARD_HTML.contains("Authorization"));
    }
}
