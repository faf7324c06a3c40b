use log::{debug, warn};
use reqwest::Client as HttpClient;
use rocket::serde::json::{serde_json, serde_json::json};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    auth::AuthToken,
    awards::{Awards, PriorVote},
    vote::VoteInput,
};

use super::AwardsApi;

const CURRENT_AWARDS_QUERY: &str = "query CurrentAwards {
  currentAwards {
    id
    year
    isActive
    showResults
    categories {
      id
      title
      shortTitle
      icon
      description
      options {
        id
        title
        brand
        subtitle
        badge
        votesCount
        product { id name imageUrl slug }
      }
    }
  }
}";

const MY_VOTES_QUERY: &str = "query MyAwardsVotes($awardsId: ID!) {
  myAwardsVotes(awardsId: $awardsId) {
    id
    awardsCategoryOptionId
  }
}";

const CAST_VOTES_MUTATION: &str = "mutation CastAwardsVotes($votes: [AwardsVoteInput!]!) {
  castAwardsVotes(votes: $votes) {
    id
    awardsCategoryOptionId
  }
}";

/// HTTP client for the GraphQL endpoint.
pub struct GraphQlClient {
    http: HttpClient,
    endpoint: String,
}

/// A GraphQL request body.
#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    #[serde(rename = "operationName")]
    operation_name: &'a str,
    variables: serde_json::Value,
}

/// A GraphQL response body. Either part may be present.
#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentAwardsData {
    current_awards: Option<Awards>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyVotesData {
    my_awards_votes: Vec<PriorVote>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CastVotesData {
    cast_awards_votes: Vec<PriorVote>,
}

impl GraphQlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http(HttpClient::new(), endpoint)
    }

    pub fn with_http(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one operation, attaching the bearer credential if given.
    async fn execute<T>(
        &self,
        operation_name: &str,
        query: &str,
        variables: serde_json::Value,
        token: Option<&AuthToken>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = GraphQlRequest {
            query,
            operation_name,
            variables,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token.credential());
        }

        debug!("GraphQL {operation_name} -> {}", self.endpoint);
        let response = request.send().await?.error_for_status()?;
        let response: GraphQlResponse<T> = response.json().await?;
        unwrap_response(operation_name, response)
    }
}

/// Turn a GraphQL response into its data, treating any reported error as a failure.
fn unwrap_response<T>(operation_name: &str, response: GraphQlResponse<T>) -> Result<T> {
    if !response.errors.is_empty() {
        let message = response
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        warn!("GraphQL {operation_name} failed: {message}");
        return Err(Error::Api(message));
    }
    response
        .data
        .ok_or_else(|| Error::Api(format!("{operation_name} returned no data")))
}

#[rocket::async_trait]
impl AwardsApi for GraphQlClient {
    async fn current_awards(&self) -> Result<Option<Awards>> {
        let data: CurrentAwardsData = self
            .execute("CurrentAwards", CURRENT_AWARDS_QUERY, json!({}), None)
            .await?;
        Ok(data.current_awards)
    }

    async fn my_votes(&self, token: &AuthToken, awards_id: &str) -> Result<Vec<PriorVote>> {
        let data: MyVotesData = self
            .execute(
                "MyAwardsVotes",
                MY_VOTES_QUERY,
                json!({ "awardsId": awards_id }),
                Some(token),
            )
            .await?;
        Ok(data.my_awards_votes)
    }

    async fn cast_votes(&self, token: &AuthToken, votes: &[VoteInput]) -> Result<Vec<PriorVote>> {
        let data: CastVotesData = self
            .execute(
                "CastAwardsVotes",
                CAST_VOTES_MUTATION,
                json!({ "votes": votes }),
                Some(token),
            )
            .await?;
        Ok(data.cast_awards_votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: DeserializeOwned>(raw: &str) -> GraphQlResponse<T> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn data_is_returned() {
        let response = parse::<MyVotesData>(
            r#"{"data": {"myAwardsVotes": [{"id": "v1", "awardsCategoryOptionId": "o1"}]}}"#,
        );
        let data = unwrap_response("MyAwardsVotes", response).unwrap();
        assert_eq!(data.my_awards_votes, vec![PriorVote {
            id: "v1".to_string(),
            awards_category_option_id: "o1".to_string(),
        }]);
    }

    #[test]
    fn errors_win_over_partial_data() {
        let response = parse::<CastVotesData>(
            r#"{
                "data": null,
                "errors": [{"message": "Voting is closed"}, {"message": "Try later"}]
            }"#,
        );
        match unwrap_response("CastAwardsVotes", response) {
            Err(Error::Api(message)) => assert_eq!(message, "Voting is closed; Try later"),
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_data_is_an_error() {
        let response = parse::<CurrentAwardsData>(r#"{}"#);
        assert!(matches!(
            unwrap_response("CurrentAwards", response),
            Err(Error::Api(_))
        ));
    }

    #[test]
    fn no_current_edition() {
        let response = parse::<CurrentAwardsData>(r#"{"data": {"currentAwards": null}}"#);
        let data = unwrap_response("CurrentAwards", response).unwrap();
        assert!(data.current_awards.is_none());
    }

    #[test]
    fn request_body_shape() {
        let votes = vec![VoteInput {
            awards_category_option_id: "o1".to_string(),
        }];
        let body = GraphQlRequest {
            query: CAST_VOTES_MUTATION,
            operation_name: "CastAwardsVotes",
            variables: json!({ "votes": votes }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["operationName"], json!("CastAwardsVotes"));
        assert_eq!(
            value["variables"]["votes"],
            json!([{ "awardsCategoryOptionId": "o1" }])
        );
    }
}
