//! Admin routes: login, purge, delete, configuration, fragments, prune counts.

use airlift_protocol::constants::{
    CONFIG_OVERVIEW_PATH, CONFIG_PATH, HISTORY_PATH, LOGIN_PATH, PARTIAL_HEADER, STATUS_OK,
    session_delete_path, upload_path,
};
use airlift_protocol::{PruneCount, PurgeScope};
use airlift_upload::{UploadError, classify_ack, classify_json, classify_login, classify_page};
use tracing::{debug, info};

use crate::client::{Client, read_response, transport_error};
use crate::retention::RetentionLimits;

/// Fields of a server configuration commit.
///
/// The server replaces its whole configuration with the submitted form, so
/// callers pass every setting they want to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigForm {
    fields: Vec<(String, String)>,
}

impl ConfigForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an earlier value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets the retention fields. A zero limit is submitted as disabled.
    pub fn with_limits(self, limits: RetentionLimits) -> Self {
        self.field("MaxSizeEnable", (limits.max_size_mb > 0).to_string())
            .field("Size", limits.max_size_mb.to_string())
            .field("MaxAgeEnable", (limits.max_age_days > 0).to_string())
            .field("Age", limits.max_age_days.to_string())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Sections reloaded after a configuration commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFragments {
    pub config: String,
    pub overview: String,
}

impl Client {
    /// Opens a session. Later requests carry its cookie.
    pub async fn login(&self, password: &str) -> Result<(), UploadError> {
        let resp = self
            .http
            .post(self.url(LOGIN_PATH))
            .form(&[("pass", password)])
            .send()
            .await
            .map_err(transport_error)?;
        let resp = read_response(resp).await?;
        classify_login(resp.status, &resp.body).into_result()?;
        info!("logged in");
        Ok(())
    }

    /// Deletes uploads (or only their thumbnails) on the server.
    pub async fn purge(&self, scope: PurgeScope) -> Result<(), UploadError> {
        let resp = self
            .http
            .post(self.url(scope.path()))
            .send()
            .await
            .map_err(transport_error)?;
        let resp = read_response(resp).await?;
        classify_ack(resp.status, &resp.body).into_result()?;
        info!(scope = ?scope, "purge acknowledged");
        Ok(())
    }

    /// Purges, then reloads the storage overview fragment.
    pub async fn purge_and_refresh(&self, scope: PurgeScope) -> Result<String, UploadError> {
        self.purge(scope).await?;
        self.fetch_fragment(CONFIG_OVERVIEW_PATH).await
    }

    /// Deletes one upload through the password-checked route.
    pub async fn delete_upload(&self, id: &str) -> Result<(), UploadError> {
        let resp = self
            .http
            .delete(self.url(&upload_path(id)))
            .send()
            .await
            .map_err(transport_error)?;
        let resp = read_response(resp).await?;
        classify_ack(resp.status, &resp.body).into_result()?;
        info!(id, "upload deleted");
        Ok(())
    }

    /// Deletes one upload through the session route, then reloads the
    /// history fragment.
    pub async fn delete_from_history(&self, id: &str) -> Result<String, UploadError> {
        let resp = self
            .http
            .post(self.url(&session_delete_path(id)))
            .send()
            .await
            .map_err(transport_error)?;
        let resp = read_response(resp).await?;
        classify_ack(resp.status, &resp.body).into_result()?;
        info!(id, "upload deleted");
        self.fetch_fragment(HISTORY_PATH).await
    }

    /// Replaces the server configuration with `form`.
    pub async fn commit_config(&self, form: &ConfigForm) -> Result<(), UploadError> {
        let resp = self
            .http
            .post(self.url(CONFIG_PATH))
            .form(form.fields())
            .send()
            .await
            .map_err(transport_error)?;
        let resp = read_response(resp).await?;
        classify_ack(resp.status, &resp.body).into_result()?;
        info!(fields = form.fields().len(), "configuration updated");
        Ok(())
    }

    /// Commits `form`, then reloads the configuration and overview fragments.
    pub async fn commit_config_and_refresh(
        &self,
        form: &ConfigForm,
    ) -> Result<ConfigFragments, UploadError> {
        self.commit_config(form).await?;
        Ok(ConfigFragments {
            config: self.fetch_fragment(CONFIG_PATH).await?,
            overview: self.fetch_fragment(CONFIG_OVERVIEW_PATH).await?,
        })
    }

    /// Fetches the page fragment at `path` (partial rendering).
    pub async fn fetch_fragment(&self, path: &str) -> Result<String, UploadError> {
        debug!(path, "fetching fragment");
        let resp = self
            .http
            .get(self.url(path))
            .header(PARTIAL_HEADER, "1")
            .send()
            .await
            .map_err(transport_error)?;
        let resp = read_response(resp).await?;
        classify_page(resp.status, &resp.body).into_result()
    }

    /// Asks how many uploads would be pruned if the limit at `path` became `limit`.
    pub async fn preview_prune(&self, path: &str, limit: u32) -> Result<u32, UploadError> {
        let resp = self
            .http
            .post(self.url(path))
            .form(&[("N", limit.to_string())])
            .send()
            .await
            .map_err(transport_error)?;
        let resp = read_response(resp).await?;
        let count: PruneCount = classify_json(STATUS_OK, resp.status, &resp.body).into_result()?;
        debug!(path, limit, pruned = count.n, "prune preview");
        Ok(count.n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::mock_server::{Reply, mock_server};
    use airlift_protocol::constants::CONFIG_SIZE_PATH;

    fn client(url: &str) -> Client {
        Client::new(ClientConfig::new(url)).unwrap()
    }

    #[tokio::test]
    async fn login_redirect_sets_session_cookie() {
        let (url, requests, handle) = mock_server(vec![
            Reply::new(302, "")
                .header("Location", "/")
                .header("Set-Cookie", "session=abc123; Path=/"),
            Reply::new(200, "<div>overview</div>"),
        ])
        .await;
        let c = client(&url);

        c.login("s3cret").await.unwrap();
        let html = c.fetch_fragment(CONFIG_OVERVIEW_PATH).await.unwrap();
        assert_eq!(html, "<div>overview</div>");

        let reqs = requests.lock().unwrap().clone();
        assert_eq!(reqs[0].method, "POST");
        assert_eq!(reqs[0].path, "/-/login");
        assert_eq!(reqs[0].body, b"pass=s3cret");
        assert_eq!(reqs[1].header("cookie"), Some("session=abc123"));
        assert_eq!(reqs[1].header("x-ajax-partial"), Some("1"));

        handle.abort();
    }

    #[tokio::test]
    async fn wrong_password_rerenders_login() {
        let (url, _requests, handle) = mock_server(vec![Reply::new(200, "<form>")]).await;
        let err = client(&url).login("nope").await.unwrap_err();
        assert!(matches!(err, UploadError::AuthRequired));
        handle.abort();
    }

    #[tokio::test]
    async fn fragment_without_session_needs_auth() {
        let (url, _requests, handle) =
            mock_server(vec![Reply::new(303, "").header("Location", "/-/login")]).await;
        let err = client(&url)
            .fetch_fragment(CONFIG_OVERVIEW_PATH)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::AuthRequired));
        handle.abort();
    }

    #[tokio::test]
    async fn purge_then_refresh() {
        let (url, requests, handle) = mock_server(vec![
            Reply::new(204, ""),
            Reply::new(200, "<p>0 files</p>"),
        ])
        .await;

        let html = client(&url)
            .purge_and_refresh(PurgeScope::Thumbs)
            .await
            .unwrap();
        assert_eq!(html, "<p>0 files</p>");

        let reqs = requests.lock().unwrap().clone();
        assert_eq!(reqs[0].path, "/purge/thumbs");
        assert_eq!(reqs[1].path, "/-/config/overview");
        handle.abort();
    }

    #[tokio::test]
    async fn purge_failure_surfaces_message() {
        let (url, _requests, handle) =
            mock_server(vec![Reply::new(500, r#"{"Err":"disk busy"}"#)]).await;
        let err = client(&url).purge(PurgeScope::All).await.unwrap_err();
        assert_eq!(err.to_string(), "disk busy");
        handle.abort();
    }

    #[tokio::test]
    async fn delete_upload_uses_password_route() {
        let (url, requests, handle) = mock_server(vec![Reply::new(204, "")]).await;
        let c = Client::new(ClientConfig::new(&url).with_password("hunter2")).unwrap();
        c.delete_upload("aB3d").await.unwrap();

        let req = requests.lock().unwrap()[0].clone();
        assert_eq!(req.method, "DELETE");
        assert_eq!(req.path, "/aB3d");
        assert_eq!(req.header("x-airlift-password"), Some("hunter2"));
        handle.abort();
    }

    #[tokio::test]
    async fn delete_upload_failure_surfaces_message() {
        let (url, _requests, handle) =
            mock_server(vec![Reply::new(500, r#"{"Err":"no such file"}"#)]).await;
        let err = client(&url).delete_upload("gone").await.unwrap_err();
        assert_eq!(err.to_string(), "no such file");
        assert_eq!(err.status(), Some(500));
        handle.abort();
    }

    #[tokio::test]
    async fn delete_from_history_reloads_history() {
        let (url, requests, handle) = mock_server(vec![
            Reply::new(204, ""),
            Reply::new(200, "<ul id=\"history\"></ul>"),
        ])
        .await;
        let html = client(&url).delete_from_history("aB3d").await.unwrap();
        assert_eq!(html, "<ul id=\"history\"></ul>");

        let reqs = requests.lock().unwrap().clone();
        assert_eq!(reqs[0].method, "POST");
        assert_eq!(reqs[0].path, "/-/delete/aB3d");
        assert_eq!(reqs[1].path, "/-/history");
        assert_eq!(reqs[1].header("x-ajax-partial"), Some("1"));
        handle.abort();
    }

    #[tokio::test]
    async fn delete_from_history_without_session() {
        let (url, requests, handle) = mock_server(vec![Reply::new(403, "")]).await;
        let err = client(&url).delete_from_history("aB3d").await.unwrap_err();
        assert!(matches!(err, UploadError::AuthRequired));
        assert_eq!(requests.lock().unwrap().len(), 1);
        handle.abort();
    }

    #[test]
    fn config_form_replaces_fields() {
        let form = ConfigForm::new()
            .field("Host", "files.example.com")
            .field("Size", "1")
            .with_limits(RetentionLimits {
                max_size_mb: 0,
                max_age_days: 30,
            });
        assert_eq!(form.get("Host"), Some("files.example.com"));
        assert_eq!(form.get("MaxSizeEnable"), Some("false"));
        assert_eq!(form.get("Size"), Some("0"));
        assert_eq!(form.get("MaxAgeEnable"), Some("true"));
        assert_eq!(form.get("Age"), Some("30"));
        assert_eq!(form.fields().len(), 5);
    }

    #[tokio::test]
    async fn commit_config_reloads_both_fragments() {
        let (url, requests, handle) = mock_server(vec![
            Reply::new(204, ""),
            Reply::new(200, "<form id=\"config\">"),
            Reply::new(200, "<p>3 files</p>"),
        ])
        .await;
        let form = ConfigForm::new().field("Host", "h").field("Age", "7");
        let fragments = client(&url).commit_config_and_refresh(&form).await.unwrap();
        assert_eq!(fragments.config, "<form id=\"config\">");
        assert_eq!(fragments.overview, "<p>3 files</p>");

        let reqs = requests.lock().unwrap().clone();
        assert_eq!(reqs[0].method, "POST");
        assert_eq!(reqs[0].path, "/-/config");
        assert_eq!(reqs[0].body, b"Host=h&Age=7");
        assert_eq!(reqs[1].path, "/-/config");
        assert_eq!(reqs[1].method, "GET");
        assert_eq!(reqs[2].path, "/-/config/overview");
        handle.abort();
    }

    #[tokio::test]
    async fn rejected_config_keeps_server_message() {
        let (url, _requests, handle) =
            mock_server(vec![Reply::new(400, r#"{"Err":"passwords do not match"}"#)]).await;
        let err = client(&url)
            .commit_config(&ConfigForm::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "passwords do not match");
        handle.abort();
    }

    #[tokio::test]
    async fn prune_preview_posts_limit() {
        let (url, requests, handle) = mock_server(vec![Reply::new(200, r#"{"N":12}"#)]).await;
        let n = client(&url).preview_prune(CONFIG_SIZE_PATH, 250).await.unwrap();
        assert_eq!(n, 12);

        let req = requests.lock().unwrap()[0].clone();
        assert_eq!(req.path, "/-/config/size");
        assert_eq!(req.body, b"N=250");
        handle.abort();
    }
}
