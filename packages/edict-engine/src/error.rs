pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors the engine raises to callers. Everything else (provider timeouts,
/// auth failures, index errors) is absorbed stage-locally and surfaces only
/// through the output's `partial` flag, result count, and trace steps.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid query: {message}")]
	InvalidQuery { message: String },
	#[error("Internal invariant violation: {message}")]
	InvariantViolation { message: String },
	#[error("Invalid configuration: {message}")]
	InvalidConfig { message: String },
}

/// Stage-local failure classification. Never propagated out of the engine;
/// drives trace steps, logging, and the circuit breaker.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
	#[error("Dependency timed out during {stage}.")]
	DependencyTimeout { stage: &'static str },
	#[error("Authorization denied by the {provider} provider.")]
	AuthorizationDenied { provider: &'static str },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl StageError {
	pub fn from_provider(stage: &'static str, err: edict_providers::Error) -> Self {
		match err {
			edict_providers::Error::Timeout => Self::DependencyTimeout { stage },
			edict_providers::Error::Unauthorized { .. } =>
				Self::AuthorizationDenied { provider: stage },
			other => Self::Provider { message: other.to_string() },
		}
	}
}
