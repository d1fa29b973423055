use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use threadline_models::engagement::{
    BallotRequest, MyVotes, SaveResponse, VoteRequest, VoteResponse,
};
use threadline_models::{PollView, VoteDirection};

use crate::error::ClientError;

/// Server calls the engagement client depends on.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    async fn vote_post(
        &self,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteResponse, ClientError>;

    async fn vote_comment(
        &self,
        comment_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteResponse, ClientError>;

    async fn cast_ballot(
        &self,
        poll_id: i64,
        option_indexes: &[usize],
    ) -> Result<PollView, ClientError>;

    async fn toggle_save(&self, post_id: i64) -> Result<SaveResponse, ClientError>;

    async fn my_votes(
        &self,
        post_ids: &[i64],
        comment_ids: &[i64],
    ) -> Result<MyVotes, ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// [`Transport`] over the JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.code, body.message),
            Err(_) => ("UNKNOWN".to_string(), text),
        };
        tracing::debug!(status = status.as_u16(), %code, "request rejected");
        Err(ClientError::Rejected {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

/// Both filters are always sent. An empty list asks for nothing, while a
/// missing one would ask for every vote the user holds.
fn my_votes_query(post_ids: &[i64], comment_ids: &[i64]) -> [(&'static str, String); 2] {
    [
        ("post_ids", join_ids(post_ids)),
        ("comment_ids", join_ids(comment_ids)),
    ]
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl Transport for HttpTransport {
    async fn vote_post(
        &self,
        post_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteResponse, ClientError> {
        let request = self
            .client
            .post(self.url(&format!("/posts/{post_id}/vote")))
            .json(&VoteRequest { direction });
        self.send(request).await
    }

    async fn vote_comment(
        &self,
        comment_id: i64,
        direction: VoteDirection,
    ) -> Result<VoteResponse, ClientError> {
        let request = self
            .client
            .post(self.url(&format!("/comments/{comment_id}/vote")))
            .json(&VoteRequest { direction });
        self.send(request).await
    }

    async fn cast_ballot(
        &self,
        poll_id: i64,
        option_indexes: &[usize],
    ) -> Result<PollView, ClientError> {
        let request = self
            .client
            .post(self.url(&format!("/polls/{poll_id}/votes")))
            .json(&BallotRequest {
                option_indexes: option_indexes.to_vec(),
            });
        self.send(request).await
    }

    async fn toggle_save(&self, post_id: i64) -> Result<SaveResponse, ClientError> {
        let request = self.client.post(self.url(&format!("/posts/{post_id}/save")));
        self.send(request).await
    }

    async fn my_votes(
        &self,
        post_ids: &[i64],
        comment_ids: &[i64],
    ) -> Result<MyVotes, ClientError> {
        let request = self
            .client
            .get(self.url("/users/@me/votes"))
            .query(&my_votes_query(post_ids, comment_ids));
        self.send(request).await
    }
}
