use crate::Environment;
use axum::{http::StatusCode, routing::get, Router};

pub mod external_file;

pub const DEFAULT_BASE_PATH: &str = "/api/externalFileResources";

/// Route table of the gateway. `base_path` prefixes the access token route.
pub fn routes(env: Environment, base_path: &str) -> Router {
    let files = Router::new().route("/:access_token", get(external_file::run));

    let base_path = base_path.trim_end_matches('/');
    let app = match base_path.is_empty() {
        true => Router::new().merge(files),
        false => Router::new().nest(base_path, files),
    };

    app.route("/healthCheck", get(StatusCode::OK))
        .with_state(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        http::external_file::tests::{environment, FakeFiles},
        resource::{tests::share, FileResourceDomain},
    };
    use reqwest::{header, redirect::Policy, Client};
    use std::{net::SocketAddr, sync::Arc};
    use url::Url;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        addr
    }

    fn client() -> Client {
        Client::builder().redirect(Policy::none()).build().unwrap()
    }

    fn env(signed: Option<&str>) -> Environment {
        let files = FakeFiles {
            signed: signed.map(|uri| Url::parse(uri).unwrap()),
            content: Some(b"hello world"),
            ..Default::default()
        };
        environment(
            vec![
                share("abc", None, FileResourceDomain::External),
                share("private", None, FileResourceDomain::UserAvatar),
            ],
            Arc::new(files),
        )
    }

    #[tokio::test]
    async fn serves_files_under_the_base_path() {
        let addr = serve(routes(env(None), DEFAULT_BASE_PATH)).await;

        let response = client()
            .get(format!("http://{addr}/api/externalFileResources/abc"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
        assert_eq!(response.text().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn redirects_to_signed_uri() {
        let addr = serve(routes(env(Some("https://cdn/x")), DEFAULT_BASE_PATH)).await;

        let response = client()
            .get(format!("http://{addr}/api/externalFileResources/abc"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://cdn/x");
        assert!(response.bytes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_failures_as_json_web_messages() {
        let addr = serve(routes(env(None), DEFAULT_BASE_PATH)).await;

        let response = client()
            .get(format!("http://{addr}/api/externalFileResources/missing"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        let message: serde_json::Value = response.json().await.unwrap();
        assert_eq!(message["httpStatusCode"], 404);
        assert_eq!(message["message"], "No file found with key 'missing'");

        let response = client()
            .get(format!("http://{addr}/api/externalFileResources/private"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn health_check_and_unknown_routes() {
        let addr = serve(routes(env(None), "/files/")).await;

        let health = client().get(format!("http://{addr}/healthCheck")).send().await.unwrap();
        assert_eq!(health.status(), reqwest::StatusCode::OK);

        let moved = client().get(format!("http://{addr}/files/abc")).send().await.unwrap();
        assert_eq!(moved.status(), reqwest::StatusCode::OK);

        let old = client()
            .get(format!("http://{addr}/api/externalFileResources/abc"))
            .send()
            .await
            .unwrap();
        assert_eq!(old.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn root_base_path_is_supported() {
        let addr = serve(routes(env(None), "/")).await;

        let response = client().get(format!("http://{addr}/abc")).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn only_get_is_routed() {
        let addr = serve(routes(env(None), DEFAULT_BASE_PATH)).await;

        let response = client()
            .post(format!("http://{addr}/api/externalFileResources/abc"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
    }
}
