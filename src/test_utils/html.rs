use axum::{body::Body, response::Response};
use scraper::{Html, Selector};

async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not get response body");

    String::from_utf8_lossy(&body).to_string()
}

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&body_text(response).await)
}

pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&body_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// Assert that the alert in `html` contains `want_text`.
#[track_caller]
pub(crate) fn assert_alert_contains(html: &Html, want_text: &str) {
    let alert = html
        .select(&Selector::parse("#alert-container [role=alert]").unwrap())
        .next()
        .expect("No alert found");
    let text = alert.text().collect::<String>();

    assert!(
        text.contains(want_text),
        "want alert containing {want_text:?}, got {text:?}"
    );
}
