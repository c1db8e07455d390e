pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Collection {collection} is missing.")]
	CollectionMissing { collection: String },
	#[error("Invalid filter: {message}")]
	InvalidFilter { message: String },
	#[error("Failed to decode chunk payload: {message}")]
	Decode { message: String },
	#[error("Index backend error: {message}")]
	Backend { message: String },
}
