//! HTTP client posting job outcomes back to `vclip-api`'s worker-callback
//! routes (§2: "workers call back into the orchestration plane").

use serde::Serialize;
use tracing::warn;

use crate::config::WorkerConfig;

#[derive(Clone)]
pub struct CallbackClient {
    http: reqwest::Client,
    base_url: String,
}

impl CallbackClient {
    pub fn new(config: &WorkerConfig) -> Self {
        Self { http: reqwest::Client::new(), base_url: config.callback_base_url.clone() }
    }

    /// POST `body` to `{base_url}/{path}`, logging (not failing the job) on
    /// transport error — a dropped callback is recovered by the stuck-job
    /// sweep on the API side rather than by retrying the whole job here.
    pub async fn post(&self, path: &str, body: &impl Serialize) {
        let url = join_url(&self.base_url, path);
        if let Err(e) = self.http.post(&url).json(body).send().await {
            warn!(url, error = %e, "worker callback post failed");
        }
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_regardless_of_slash_placement() {
        assert_eq!(join_url("http://localhost:8080/api/callbacks", "transcode/started"), "http://localhost:8080/api/callbacks/transcode/started");
        assert_eq!(join_url("http://localhost:8080/api/callbacks/", "/transcode/started"), "http://localhost:8080/api/callbacks/transcode/started");
    }
}
