use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MarketplaceApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The API credentials are not configured")]
    MissingCredentials,
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The API returned error code {code}. {message}")]
    ApiError { code: i64, message: String },
    #[error("Invalid GraphQL query: {0}")]
    InvalidGraphQL(String),
    #[error("GraphQL query failed: {0}")]
    GraphQLError(String),
    #[error("The response did not contain any data")]
    EmptyResponse,
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
    #[error("Invalid commission rate: {0}")]
    InvalidRate(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl MarketplaceApiError {
    /// True for failures where the request never got an answer, as opposed to an answer we did not like.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::RestResponseError(_) | Self::RestRequestError(_))
    }
}
