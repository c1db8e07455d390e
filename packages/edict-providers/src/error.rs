pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider rejected the credentials (HTTP {status}).")]
	Unauthorized { status: u16 },
	#[error("Provider call timed out.")]
	Timeout,
	#[error("Provider refused the request: {message}")]
	Refused { message: String },
	#[error("Provider returned HTTP {status}.")]
	Http { status: u16 },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("{message}")]
	InvalidConfig { message: String },
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			return Self::Timeout;
		}

		match err.status() {
			Some(status) if status.as_u16() == 401 || status.as_u16() == 403 =>
				Self::Unauthorized { status: status.as_u16() },
			Some(status) => Self::Http { status: status.as_u16() },
			None => Self::InvalidResponse { message: err.to_string() },
		}
	}
}

impl From<reqwest::header::InvalidHeaderName> for Error {
	fn from(err: reqwest::header::InvalidHeaderName) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
	fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}
