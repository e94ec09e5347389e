use async_trait::async_trait;
use chess_client::api::{ApiError, HttpCall, HttpMethod, HttpResult, Transport};
use url::Url;


pub struct HttpTransport {
    client: reqwest::Client,
    origin: Url,
}

impl HttpTransport {
    // `origin` is the server root, e.g. `http://localhost:8080/`. Request paths are absolute.
    pub fn new(origin: Url) -> Self { HttpTransport { client: reqwest::Client::new(), origin } }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, call: HttpCall) -> Result<HttpResult, ApiError> {
        let url = self.origin.join(&call.path).map_err(|err| ApiError::Network(err.to_string()))?;
        let mut request = match call.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(HttpResult { status, body })
    }
}
