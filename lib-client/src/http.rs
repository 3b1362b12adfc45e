use crate::error::*;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

#[cfg(feature = "reqwest")]
use crate::constants::HTTP_TIMEOUT_SEC;

#[derive(Debug, Clone, Copy)]
/// Authorization header attached to an outbound request
pub enum HttpAuth<'a> {
  /// HTTP Basic auth with the client credential
  Basic { username: &'a str, password: &'a str },
  /// Bearer access token
  Bearer(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raw response handed back by [`OAuthHttpClient`]. Status handling is left to the caller.
pub struct HttpResponse {
  pub status: u16,
  /// Value of the `Location` header if any
  pub location: Option<String>,
  pub body: String,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Decode the body as JSON, `None` if it is not the expected shape
  pub(crate) fn json<R>(&self) -> Option<R>
  where
    R: DeserializeOwned,
  {
    serde_json::from_str(&self.body).ok()
  }
}

/// Trait defining http client for the two request shapes used against the API.
/// Implementations return non-2xx responses as `Ok` and only fail on transport errors.
#[async_trait]
pub trait OAuthHttpClient: Send + Sync {
  /// Send POST request with x-www-form-urlencoded body
  async fn post_form(&self, url: &Url, auth: HttpAuth<'_>, form: &[(&str, &str)]) -> ClientResult<HttpResponse>;

  /// Send POST request with JSON body authorized by a bearer token
  async fn post_json<S>(&self, url: &Url, bearer_token: &str, json_body: &S) -> ClientResult<HttpResponse>
  where
    S: Serialize + Send + Sync;
}

#[cfg(feature = "reqwest")]
#[derive(Debug, Clone)]
/// [`OAuthHttpClient`] backed by reqwest
pub struct ReqwestHttpClient {
  inner: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
  pub fn new() -> ClientResult<Self> {
    Self::with_timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SEC))
  }

  pub fn with_timeout(timeout: std::time::Duration) -> ClientResult<Self> {
    // the embed endpoint answers 201 + Location, which must reach the caller untouched
    let inner = reqwest::Client::builder()
      .timeout(timeout)
      .redirect(reqwest::redirect::Policy::none())
      .build()?;
    Ok(Self { inner })
  }

  async fn into_http_response(res: reqwest::Response) -> ClientResult<HttpResponse> {
    let status = res.status().as_u16();
    let location = res
      .headers()
      .get(reqwest::header::LOCATION)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);
    let body = res.text().await?;
    Ok(HttpResponse { status, location, body })
  }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl OAuthHttpClient for ReqwestHttpClient {
  async fn post_form(&self, url: &Url, auth: HttpAuth<'_>, form: &[(&str, &str)]) -> ClientResult<HttpResponse> {
    let req = self
      .inner
      .post(url.to_owned())
      .header(reqwest::header::ACCEPT, "application/json")
      .form(form);
    let req = match auth {
      HttpAuth::Basic { username, password } => req.basic_auth(username, Some(password)),
      HttpAuth::Bearer(token) => req.bearer_auth(token),
    };
    let res = req.send().await?;
    Self::into_http_response(res).await
  }

  async fn post_json<S>(&self, url: &Url, bearer_token: &str, json_body: &S) -> ClientResult<HttpResponse>
  where
    S: Serialize + Send + Sync,
  {
    let res = self
      .inner
      .post(url.to_owned())
      .header(reqwest::header::ACCEPT, "application/json")
      .bearer_auth(bearer_token)
      .json(json_body)
      .send()
      .await?;
    Self::into_http_response(res).await
  }
}

#[cfg(test)]
pub(crate) mod mock {
  use super::*;
  use std::{collections::VecDeque, sync::Mutex};

  #[derive(Debug, Clone)]
  pub(crate) struct RecordedRequest {
    pub url: Url,
    /// `Basic <id>:<secret>` or `Bearer <token>`
    pub auth: String,
    pub form: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
  }

  impl RecordedRequest {
    pub fn form_value(&self, key: &str) -> Option<&str> {
      self.form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
  }

  /// Answers requests from a queue of canned responses and records what was sent
  #[derive(Default)]
  pub(crate) struct MockHttpClient {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
  }

  impl MockHttpClient {
    pub fn with_responses(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
      Self {
        responses: Mutex::new(responses.into_iter().collect()),
        requests: Mutex::new(vec![]),
      }
    }
    pub fn requests(&self) -> Vec<RecordedRequest> {
      self.requests.lock().unwrap().clone()
    }
    fn next_response(&self, request: RecordedRequest) -> ClientResult<HttpResponse> {
      self.requests.lock().unwrap().push(request);
      self
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .ok_or_else(|| ClientError::HttpTransport {
          source: "no canned response left".into(),
        })
    }
  }

  pub(crate) fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
    HttpResponse {
      status,
      location: None,
      body: body.to_string(),
    }
  }

  #[async_trait]
  impl OAuthHttpClient for MockHttpClient {
    async fn post_form(&self, url: &Url, auth: HttpAuth<'_>, form: &[(&str, &str)]) -> ClientResult<HttpResponse> {
      let auth = match auth {
        HttpAuth::Basic { username, password } => format!("Basic {username}:{password}"),
        HttpAuth::Bearer(token) => format!("Bearer {token}"),
      };
      self.next_response(RecordedRequest {
        url: url.clone(),
        auth,
        form: form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        json: None,
      })
    }

    async fn post_json<S>(&self, url: &Url, bearer_token: &str, json_body: &S) -> ClientResult<HttpResponse>
    where
      S: Serialize + Send + Sync,
    {
      self.next_response(RecordedRequest {
        url: url.clone(),
        auth: format!("Bearer {bearer_token}"),
        form: vec![],
        json: Some(serde_json::to_value(json_body).unwrap()),
      })
    }
  }
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
  use super::*;
  use wiremock::{
    matchers::{body_string_contains, header, header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
  };

  #[tokio::test]
  async fn reqwest_client_sends_basic_auth_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/oauth/token"))
      .and(header_exists("authorization"))
      .and(header("content-type", "application/x-www-form-urlencoded"))
      .and(body_string_contains("grant_type=client_credentials"))
      .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"access_token":"abc","expires_in":60}"#))
      .expect(1)
      .mount(&server)
      .await;

    let client = ReqwestHttpClient::new().unwrap();
    let url = format!("{}/oauth/token", server.uri()).parse::<Url>().unwrap();
    let res = client
      .post_form(
        &url,
        HttpAuth::Basic {
          username: "client",
          password: "secret",
        },
        &[("grant_type", "client_credentials")],
      )
      .await
      .unwrap();

    assert!(res.is_success());
    assert!(res.body.contains("abc"));
  }

  #[tokio::test]
  async fn reqwest_client_keeps_location_and_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/embed/"))
      .and(header("authorization", "Bearer user-token"))
      .respond_with(ResponseTemplate::new(201).insert_header("Location", "https://embed.example/s/xyz"))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/embed"))
      .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
      .mount(&server)
      .await;

    let client = ReqwestHttpClient::new().unwrap();
    let body = serde_json::json!({"session_type": "newsletters"});

    let url = format!("{}/v1/embed/", server.uri()).parse::<Url>().unwrap();
    let res = client.post_json(&url, "user-token", &body).await.unwrap();
    assert_eq!(res.status, 201);
    assert_eq!(res.location.as_deref(), Some("https://embed.example/s/xyz"));

    let url = format!("{}/embed", server.uri()).parse::<Url>().unwrap();
    let res = client.post_json(&url, "user-token", &body).await.unwrap();
    assert_eq!(res.status, 401);
    assert_eq!(res.body, "expired");
  }
}
