//! HTTP client adapter used by `oauth2` for the token exchange

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid HTTP response: {0}")]
    Http(#[from] http::Error),
}

/// Perform an `oauth2` request with `reqwest`
///
/// Redirects are disabled as required for token endpoints. The response body is
/// fully buffered.
pub async fn async_http_client(
    request: oauth2::HttpRequest,
) -> Result<oauth2::HttpResponse, HttpClientError> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let method = request.method().clone();
    let url = request.uri().to_string();
    let headers = request.headers().clone();
    let body = request.into_body();

    let response = client
        .request(method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    let mut builder = http::Response::builder().status(status);
    if let Some(response_headers) = builder.headers_mut() {
        response_headers.extend(headers);
    }

    Ok(builder.body(body)?)
}
