pub const DENSE_VECTOR_NAME: &str = "dense";
pub const BM25_VECTOR_NAME: &str = "bm25";
pub const BM25_MODEL: &str = "qdrant/bm25";

use std::collections::HashMap;

use qdrant_client::qdrant::{
	Condition, Document, Filter, Query, QueryPointsBuilder, Range, ScoredPoint, Value,
	VectorsOutput, value::Kind, vectors_output::VectorsOptions,
};

use crate::{
	BoxFuture, ChunkPayload, Error, FilterCond, IndexClient, IndexFilter, IndexHit, Result,
};

/// Qdrant-backed index. One collection per vertical; every collection carries
/// a named dense vector and a server-side BM25 document vector.
pub struct QdrantIndex {
	pub client: qdrant_client::Qdrant,
	pub vector_dim: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &edict_config::Index) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url)
			.build()
			.map_err(|err| Error::Backend { message: err.to_string() })?;

		Ok(Self { client, vector_dim: cfg.vector_dim })
	}

	pub async fn collection_exists(&self, collection: &str) -> Result<bool> {
		self.client
			.collection_exists(collection)
			.await
			.map_err(|err| Error::Backend { message: err.to_string() })
	}

	async fn run_query(
		&self,
		collection: &str,
		builder: QueryPointsBuilder,
	) -> Result<Vec<IndexHit>> {
		let response = self
			.client
			.query(builder)
			.await
			.map_err(|err| backend_error(collection, err))?;

		response.result.into_iter().map(scored_point_to_hit).collect()
	}
}

impl IndexClient for QdrantIndex {
	fn knn<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		k: usize,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			if vector.len() != self.vector_dim as usize {
				return Err(Error::InvalidFilter {
					message: format!(
						"Query vector width {} does not match index width {}.",
						vector.len(),
						self.vector_dim
					),
				});
			}

			let mut builder = QueryPointsBuilder::new(collection.to_string())
				.query(Query::new_nearest(vector.to_vec()))
				.using(DENSE_VECTOR_NAME)
				.limit(k as u64)
				.with_payload(true)
				.with_vectors(true);

			if let Some(filter) = filter.filter(|f| !f.is_empty()) {
				builder = builder.filter(build_filter(filter));
			}

			self.run_query(collection, builder).await
		})
	}

	fn bm25<'a>(
		&'a self,
		collection: &'a str,
		text: &'a str,
		k: usize,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let mut builder = QueryPointsBuilder::new(collection.to_string())
				.query(Query::new_nearest(Document::new(text.to_string(), BM25_MODEL)))
				.using(BM25_VECTOR_NAME)
				.limit(k as u64)
				.with_payload(true);

			if let Some(filter) = filter.filter(|f| !f.is_empty()) {
				builder = builder.filter(build_filter(filter));
			}

			self.run_query(collection, builder).await
		})
	}

	fn fetch_by_filter<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a IndexFilter,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ChunkPayload>>> {
		Box::pin(async move {
			let builder = QueryPointsBuilder::new(collection.to_string())
				.filter(build_filter(filter))
				.limit(limit as u64)
				.with_payload(true);
			let hits = self.run_query(collection, builder).await?;

			Ok(hits.into_iter().map(|hit| hit.payload).collect())
		})
	}

	fn get_by_ids<'a>(
		&'a self,
		collection: &'a str,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChunkPayload>>> {
		Box::pin(async move {
			if ids.is_empty() {
				return Ok(Vec::new());
			}

			// Point ids are internal uuids; chunk ids live in the payload, so
			// id lookup is a should-match filter over the chunk_id field.
			let conditions: Vec<Condition> = ids
				.iter()
				.map(|id| Condition::matches("chunk_id", id.clone()))
				.collect();
			let filter =
				Filter { must: Vec::new(), should: conditions, must_not: Vec::new(), min_should: None };
			let builder = QueryPointsBuilder::new(collection.to_string())
				.filter(filter)
				.limit(ids.len() as u64)
				.with_payload(true)
				.with_vectors(true);
			let hits = self.run_query(collection, builder).await?;

			Ok(hits.into_iter().map(|hit| hit.payload).collect())
		})
	}
}

pub fn build_filter(filter: &IndexFilter) -> Filter {
	let must = filter
		.must
		.iter()
		.map(|cond| match cond {
			FilterCond::Match { key, value } => Condition::matches(key.as_str(), value.clone()),
			FilterCond::Range { key, gte, lte } => Condition::range(
				key.as_str(),
				Range {
					gte: gte.map(|v| v as f64),
					lte: lte.map(|v| v as f64),
					..Default::default()
				},
			),
		})
		.collect();

	Filter { must, should: Vec::new(), must_not: Vec::new(), min_should: None }
}

fn backend_error(collection: &str, err: qdrant_client::QdrantError) -> Error {
	let message = err.to_string();

	if message.contains("Not found") || message.contains("doesn't exist") {
		return Error::CollectionMissing { collection: collection.to_string() };
	}

	Error::Backend { message }
}

fn scored_point_to_hit(point: ScoredPoint) -> Result<IndexHit> {
	let mut payload = decode_payload(&point.payload)?;

	if payload.vector.is_none() {
		payload.vector = extract_dense_vector(point.vectors.as_ref());
	}

	Ok(IndexHit { chunk_id: payload.chunk_id.clone(), score: point.score, payload })
}

fn decode_payload(payload: &HashMap<String, Value>) -> Result<ChunkPayload> {
	let mut object = serde_json::Map::new();

	for (key, value) in payload {
		object.insert(key.clone(), qdrant_value_to_json(value));
	}

	serde_json::from_value(serde_json::Value::Object(object))
		.map_err(|err| Error::Decode { message: err.to_string() })
}

fn extract_dense_vector(vectors: Option<&VectorsOutput>) -> Option<Vec<f32>> {
	match vectors?.vectors_options.as_ref()? {
		VectorsOptions::Vector(vector) => Some(vector.data.clone()),
		VectorsOptions::Vectors(named) =>
			named.vectors.get(DENSE_VECTOR_NAME).map(|vector| vector.data.clone()),
	}
}

fn qdrant_value_to_json(value: &Value) -> serde_json::Value {
	match &value.kind {
		Some(Kind::BoolValue(v)) => serde_json::Value::Bool(*v),
		Some(Kind::IntegerValue(v)) => serde_json::Value::from(*v),
		Some(Kind::DoubleValue(v)) => serde_json::Value::from(*v),
		Some(Kind::StringValue(v)) => serde_json::Value::String(v.clone()),
		Some(Kind::ListValue(list)) =>
			serde_json::Value::Array(list.values.iter().map(qdrant_value_to_json).collect()),
		Some(Kind::StructValue(object)) => serde_json::Value::Object(
			object
				.fields
				.iter()
				.map(|(key, value)| (key.clone(), qdrant_value_to_json(value)))
				.collect(),
		),
		Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
	}
}
