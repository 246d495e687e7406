#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
    Persistence(PersistenceError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
            Self::Persistence(err) => write!(f, "server storage error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<PersistenceError> for ServerError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, details),
        }
    }

    fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }

    fn from_engine(err: EngineError) -> Self {
        match err {
            EngineError::Stat(parse) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::new(
                    ErrorCode::DocumentMalformed,
                    "mirrored document is malformed beyond repair",
                    Some(parse.to_string()),
                ),
            },
            EngineError::Host(host) => {
                Self::internal("host collaborator failed", Some(host.to_string()))
            }
        }
    }

    fn from_persistence(err: PersistenceError) -> Self {
        Self::internal("storage operation failed", Some(err.to_string()))
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
