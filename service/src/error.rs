use rocket::response::Responder;
use rocket::serde::Serialize;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::{JsonSchema, Map};
use rocket_okapi::response::OpenApiResponderInner;
use std::fmt::Debug;

#[derive(Serialize, JsonSchema, Debug, Responder)]
pub enum GenericError {
    #[response(status = 404)]
    NotFound(&'static str),
    #[response(status = 500)]
    UnknownError(&'static str),
    PickError(PickError),
    AuthError(AuthError),
    #[response(status = 409)]
    Conflict(&'static str),
    #[response(status = 400)]
    BadRequest(&'static str),
    #[response(status = 503)]
    Configuration(&'static str),
    #[response(status = 502)]
    Upstream(&'static str),
    #[response(status = 504)]
    UpstreamTimeout(&'static str),
}

/// One variant per reason a pick submission can be turned down.
#[derive(Serialize, JsonSchema, Debug, Responder, PartialEq, Eq)]
pub enum PickError {
    #[response(status = 423)]
    Locked(&'static str),
    #[response(status = 409)]
    GolferAlreadyUsed(&'static str),
    #[response(status = 409)]
    SecondGolferAlreadyUsed(&'static str),
    #[response(status = 422)]
    SameGolferTwice(&'static str),
    #[response(status = 409)]
    DoublePickExhausted(&'static str),
    #[response(status = 422)]
    SecondPickNeedsDoublePick(&'static str),
    #[response(status = 422)]
    MajorNeedsTwoGolfers(&'static str),
    #[response(status = 404)]
    UnknownGolfer(&'static str),
    #[response(status = 403)]
    NotPermitted(&'static str),
}

impl PickError {
    pub fn reason(&self) -> &'static str {
        use PickError::*;
        match self {
            Locked(r)
            | GolferAlreadyUsed(r)
            | SecondGolferAlreadyUsed(r)
            | SameGolferTwice(r)
            | DoublePickExhausted(r)
            | SecondPickNeedsDoublePick(r)
            | MajorNeedsTwoGolfers(r)
            | UnknownGolfer(r)
            | NotPermitted(r) => r,
        }
    }
}

#[derive(Debug, JsonSchema, Serialize, Responder)]
pub enum AuthError {
    #[response(status = 401)]
    Missing(&'static str),
    #[response(status = 403)]
    Invalid(&'static str),
    #[response(status = 403)]
    WrongPin(&'static str),
    #[response(status = 422)]
    MalformedPin(&'static str),
    #[response(status = 403)]
    NotAdmin(&'static str),
}

impl From<PickError> for GenericError {
    fn from(e: PickError) -> Self {
        Self::PickError(e)
    }
}

impl From<AuthError> for GenericError {
    fn from(e: AuthError) -> Self {
        Self::AuthError(e)
    }
}

/// Failure while talking to one of the upstream golf data providers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("credential {0} is not configured")]
    MissingCredential(&'static str),
    #[error("{resource} answered with HTTP {status}")]
    Status { resource: String, status: u16 },
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("transport failure: {0}")]
    Transport(reqwest::Error),
    #[error("malformed payload from {resource}: {message}")]
    Payload { resource: String, message: String },
}

impl GatewayError {
    /// Only 400 and 404 mean "this route spelling does not exist".
    pub fn allows_route_fallback(&self) -> bool {
        matches!(self, GatewayError::Status { status: 400 | 404, .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout(_) | GatewayError::Transport(_) => true,
            GatewayError::Status { status, .. } => *status >= 500,
            GatewayError::MissingCredential(_) | GatewayError::Payload { .. } => false,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, GatewayError::MissingCredential(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        let resource = e
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        if e.is_timeout() {
            GatewayError::Timeout(resource)
        } else if let Some(status) = e.status() {
            GatewayError::Status {
                resource,
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            GatewayError::Payload {
                resource,
                message: e.to_string(),
            }
        } else {
            GatewayError::Transport(e)
        }
    }
}

impl From<GatewayError> for GenericError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::MissingCredential(_) => {
                GenericError::Configuration("Upstream provider credential is not configured")
            }
            GatewayError::Timeout(_) => {
                GenericError::UpstreamTimeout("Upstream provider did not answer in time")
            }
            GatewayError::Status { .. } | GatewayError::Transport(_) => {
                GenericError::Upstream("Upstream provider request failed")
            }
            GatewayError::Payload { .. } => {
                GenericError::Upstream("Upstream provider returned an unreadable payload")
            }
        }
    }
}

/// Failure while talking to the remote spreadsheet store.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote store is not configured")]
    NotConfigured,
    #[error("remote store answered with HTTP {0}")]
    Status(u16),
    #[error("remote store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("snapshot io: {0}")]
    SnapshotIo(#[from] std::io::Error),
    #[error("snapshot format: {0}")]
    SnapshotFormat(#[from] serde_json::Error),
}

/// Logs a database error and maps it to a generic 500 carrying `context`.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sea_orm::DbErr) -> GenericError {
    move |e| {
        log::error!("{}: {:#?}", context, e);
        GenericError::UnknownError(context)
    }
}

impl From<SyncError> for GenericError {
    fn from(e: SyncError) -> Self {
        log::error!("Sync error: {:#?}", e);
        match e {
            SyncError::Db(_) => GenericError::UnknownError("Database error while synchronizing"),
            SyncError::Remote(_) => GenericError::Upstream("Remote store request failed"),
            SyncError::SnapshotIo(_) | SyncError::SnapshotFormat(_) => {
                GenericError::UnknownError("Unable to read or write the picks snapshot")
            }
        }
    }
}

fn describe(code: &str, title: &str, text: &str) -> rocket_okapi::okapi::openapi3::RefOr<rocket_okapi::okapi::openapi3::Response> {
    use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse};
    RefOr::Object(OpenApiResponse {
        description: format!(
            "# [{code} {title}](https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/{code})\n{text}"
        ),
        ..Default::default()
    })
}

impl OpenApiResponderInner for GenericError {
    fn responses(_: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Map::new();
        for (code, title, text) in [
            ("400", "Bad Request", "The request is missing parameters or is wrongly formatted."),
            ("401", "Unauthorized", "No sign-in cookie or sync token was given."),
            ("403", "Forbidden", "The signed-in user may not do this."),
            ("404", "Not Found", "The user, golfer or tournament does not exist."),
            ("409", "Conflict", "The golfer was already used this season or the double pick is spent."),
            ("422", "Unprocessable Entity", "The pick combination is not allowed for this tournament."),
            ("423", "Locked", "Picks for this tournament are locked since the reveal time passed."),
            ("500", "Internal Server Error", "Something went wrong on the server."),
            ("502", "Bad Gateway", "An upstream golf data provider failed."),
            ("503", "Service Unavailable", "A credential or token is not configured."),
            ("504", "Gateway Timeout", "An upstream golf data provider did not answer in time."),
        ] {
            responses.insert(code.to_string(), describe(code, title, text));
        }
        Ok(Responses {
            responses,
            ..Default::default()
        })
    }
}
