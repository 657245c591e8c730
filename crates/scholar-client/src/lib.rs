//! Async HTTP client for the Scholar JSON API.
//!
//! [`ApiClient`] also implements [`CourseTransport`], so the course editor
//! can save a lesson graph straight to a server with
//! [`scholar_core::adapter::save`].

pub mod error;

pub use error::{ClientError, Result};

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

use scholar_core::{
  adapter::CourseTransport,
  course::Course,
  progress::Enrollment,
};

/// Connection settings for the Scholar API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url: String,
  /// Bearer token issued by the identity provider.
  pub token:    String,
}

/// Async HTTP client for the Scholar JSON REST API.
///
/// The inner [`reqwest::Client`] is `Arc`-based, so clones share a pool.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ClientConfig,
}

// ─── Response bodies ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollReceipt {
  pub enrollment: Enrollment,
  pub xp_gained:  u64,
  pub xp:         u64,
  pub level:      u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReceipt {
  pub enrollment:        Enrollment,
  pub xp_gained:         u64,
  pub already_completed: bool,
  pub course_completed:  bool,
  pub xp:                u64,
  pub level:             u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCourses {
  pub enrolled_courses: Vec<String>,
  pub enrollments:      Vec<Enrollment>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressBody<'a> {
  course_id: &'a str,
  lesson_id: &'a str,
  xp_gained: u32,
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl ApiClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .client
      .request(method, self.url(path))
      .bearer_auth(&self.config.token)
  }

  /// Turn a non-success response into [`ClientError::Status`], carrying the
  /// server's `error` message when there is one.
  async fn check(method: &'static str, path: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<serde_json::Value>()
      .await
      .ok()
      .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
      .unwrap_or_else(|| status.to_string());
    tracing::debug!(%method, %path, status = status.as_u16(), %message, "request rejected");
    Err(ClientError::Status {
      method,
      path: path.to_owned(),
      status: status.as_u16(),
      message,
    })
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let resp = self.request(Method::GET, path).send().await?;
    Ok(Self::check("GET", path, resp).await?.json().await?)
  }

  async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let resp = self.request(Method::POST, path).json(body).send().await?;
    Ok(Self::check("POST", path, resp).await?.json().await?)
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  /// `GET /courses`
  pub async fn list_courses(&self) -> Result<Vec<Course>> {
    self.get_json("/courses").await
  }

  /// `GET /courses/{id}`
  pub async fn get_course(&self, id: &str) -> Result<Course> {
    self.get_json(&format!("/courses/{id}")).await
  }

  // ── Progress ──────────────────────────────────────────────────────────────

  /// `POST /courses/enroll`
  pub async fn enroll(&self, course_id: &str) -> Result<EnrollReceipt> {
    self
      .post_json("/courses/enroll", &json!({ "courseId": course_id }))
      .await
  }

  /// `POST /courses/progress`
  pub async fn record_progress(
    &self,
    course_id: &str,
    lesson_id: &str,
    xp_gained: u32,
  ) -> Result<ProgressReceipt> {
    self
      .post_json("/courses/progress", &ProgressBody {
        course_id,
        lesson_id,
        xp_gained,
      })
      .await
  }

  /// `GET /user/courses`
  pub async fn user_courses(&self) -> Result<UserCourses> {
    self.get_json("/user/courses").await
  }

  // ── Admin ─────────────────────────────────────────────────────────────────

  /// `GET /admin/courses/{id}`; `None` on 404.
  pub async fn admin_get_course(&self, id: &str) -> Result<Option<Course>> {
    match self.get_json(&format!("/admin/courses/{id}")).await {
      Ok(course) => Ok(Some(course)),
      Err(e) if e.is_not_found() => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// `POST /admin/courses`
  pub async fn admin_save_course(&self, course: &Course) -> Result<Course> {
    self.post_json("/admin/courses", course).await
  }

  /// `DELETE /admin/courses/{id}`
  pub async fn admin_delete_course(&self, id: &str) -> Result<()> {
    let path = format!("/admin/courses/{id}");
    let resp = self.request(Method::DELETE, &path).send().await?;
    Self::check("DELETE", &path, resp).await?;
    Ok(())
  }
}

impl CourseTransport for ApiClient {
  type Error = ClientError;

  async fn put_course(&self, course: &Course) -> Result<()> {
    self.admin_save_course(course).await.map(|_| ())
  }

  async fn fetch_course(&self, id: &str) -> Result<Option<Course>> {
    self.admin_get_course(id).await
  }
}
