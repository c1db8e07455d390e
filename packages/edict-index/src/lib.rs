pub mod clause;
pub mod qdrant;

mod client;
mod error;

pub use self::{
	clause::{ClauseEntry, ClauseIndex},
	client::{BoxFuture, ChunkPayload, FilterCond, IndexClient, IndexFilter, IndexHit},
	error::{Error, Result},
	qdrant::QdrantIndex,
};
