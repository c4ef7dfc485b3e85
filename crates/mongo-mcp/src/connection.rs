//! MongoDB connection management with pool configuration and health checking

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongo_guard::{ValidatedCollectionName, ValidatedDatabaseName};
use mongo_mcp_common::{MongoMcpError, Result};
use mongodb::{
    options::{
        AggregateOptions, ClientOptions, CountOptions, FindOneOptions, FindOptions, IndexOptions,
        UpdateOptions,
    },
    Client, Collection, IndexModel,
};
use tracing::debug;

use crate::store::{DatabaseInfo, DocumentStore, FindQuery, IndexSpec, UpdateSummary};

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool
    pub max_pool_size: Option<u32>,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: 30s)
    pub server_selection_timeout: Option<Duration>,
    /// Server-side time limit for each read (default: 30s)
    pub max_time: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: Some(1),
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            max_time: Some(Duration::from_secs(30)),
            app_name: Some("mongo-mcp".to_string()),
        }
    }
}

impl PoolConfig {
    /// Default pool with every timeout set to `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(timeout),
            server_selection_timeout: Some(timeout),
            max_time: Some(timeout),
            ..Self::default()
        }
    }
}

/// MongoDB connection manager with pooling support
pub struct Connection {
    client: Client,
    max_time: Option<Duration>,
}

impl Connection {
    /// Create a new MongoDB connection with default pool settings
    pub async fn new(connection_string: &str) -> Result<Self> {
        Self::with_config(connection_string, PoolConfig::default()).await
    }

    /// Create a new MongoDB connection with custom pool configuration
    ///
    /// The driver connects lazily; call [`DocumentStore::ping`] to verify
    /// the server is reachable.
    pub async fn with_config(connection_string: &str, config: PoolConfig) -> Result<Self> {
        let mut client_options = ClientOptions::parse(connection_string).await?;

        if let Some(min) = config.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = config.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(connect) = config.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = config.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = config.app_name {
            client_options.app_name = Some(app);
        }

        let client = Client::with_options(client_options)?;

        Ok(Self {
            client,
            max_time: config.max_time,
        })
    }

    /// Get a reference to the client
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
    ) -> Collection<Document> {
        self.client.database(db.as_str()).collection(coll.as_str())
    }
}

#[async_trait]
impl DocumentStore for Connection {
    async fn ping(&self) -> Result<()> {
        match self.client.database("admin").run_command(doc! { "ping": 1 }).await {
            Ok(_) => Ok(()),
            Err(e) => match MongoMcpError::from(e) {
                auth @ MongoMcpError::Authentication(_) => Err(auth),
                other => Err(MongoMcpError::Connection(format!("Ping failed: {}", other))),
            },
        }
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>> {
        let specs = self.client.list_databases().await?;
        Ok(specs
            .into_iter()
            .map(|spec| DatabaseInfo {
                name: spec.name,
                size_on_disk: spec.size_on_disk,
                empty: spec.empty,
            })
            .collect())
    }

    async fn database_stats(&self, db: &ValidatedDatabaseName) -> Result<Document> {
        let stats = self
            .client
            .database(db.as_str())
            .run_command(doc! { "dbStats": 1 })
            .await?;
        Ok(stats)
    }

    async fn list_collections(&self, db: &ValidatedDatabaseName) -> Result<Vec<String>> {
        let names = self.client.database(db.as_str()).list_collection_names().await?;
        Ok(names)
    }

    async fn collection_stats(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
    ) -> Result<Document> {
        let stats = self
            .client
            .database(db.as_str())
            .run_command(doc! { "collStats": coll.as_str() })
            .await?;
        Ok(stats)
    }

    async fn list_indexes(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
    ) -> Result<Vec<Document>> {
        let models: Vec<IndexModel> = self
            .collection(db, coll)
            .list_indexes()
            .await?
            .try_collect()
            .await?;

        let mut indexes = Vec::with_capacity(models.len());
        for model in &models {
            indexes.push(bson::to_document(model)?);
        }
        Ok(indexes)
    }

    async fn find(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        query: FindQuery,
    ) -> Result<Vec<Document>> {
        let options = FindOptions::builder()
            .projection(query.get_projection().cloned())
            .sort(query.get_sort().cloned())
            .skip(query.get_skip())
            .limit(query.get_limit())
            .max_time(self.max_time)
            .build();

        debug!(database = %db, collection = %coll, "find");
        let documents: Vec<Document> = self
            .collection(db, coll)
            .find(query.get_filter().clone())
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(documents)
    }

    async fn find_one(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>> {
        let options = FindOneOptions::builder()
            .projection(projection)
            .max_time(self.max_time)
            .build();

        let document = self
            .collection(db, coll)
            .find_one(filter)
            .with_options(options)
            .await?;
        Ok(document)
    }

    async fn count(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64> {
        let options = CountOptions::builder().max_time(self.max_time).build();
        let count = self
            .collection(db, coll)
            .count_documents(filter)
            .with_options(options)
            .await?;
        Ok(count)
    }

    async fn aggregate(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>> {
        let options = AggregateOptions::builder().max_time(self.max_time).build();

        debug!(database = %db, collection = %coll, stages = pipeline.len(), "aggregate");
        let documents: Vec<Document> = self
            .collection(db, coll)
            .aggregate(pipeline)
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(documents)
    }

    async fn explain_aggregate(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        pipeline: Vec<Document>,
    ) -> Result<Document> {
        let command = doc! {
            "explain": {
                "aggregate": coll.as_str(),
                "pipeline": pipeline,
                "cursor": {},
            },
            "verbosity": "executionStats",
        };
        let plan = self.client.database(db.as_str()).run_command(command).await?;
        Ok(plan)
    }

    async fn insert_one(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        document: Document,
    ) -> Result<Bson> {
        let result = self.collection(db, coll).insert_one(document).await?;
        Ok(result.inserted_id)
    }

    async fn update_many(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary> {
        let options = UpdateOptions::builder().upsert(upsert).build();
        let result = self
            .collection(db, coll)
            .update_many(filter, update)
            .with_options(options)
            .await?;
        Ok(UpdateSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_many(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64> {
        let result = self.collection(db, coll).delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn create_index(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        index: IndexSpec,
    ) -> Result<String> {
        let options = IndexOptions::builder()
            .name(index.name)
            .unique(index.unique)
            .build();
        let model = IndexModel::builder().keys(index.keys).options(options).build();
        let result = self.collection(db, coll).create_index(model).await?;
        Ok(result.index_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_pool_size, Some(10));
        assert_eq!(config.max_time, Some(Duration::from_secs(30)));
        assert_eq!(config.app_name, Some("mongo-mcp".to_string()));
    }

    #[test]
    fn test_pool_config_with_timeout() {
        let config = PoolConfig::with_timeout(Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.server_selection_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.max_time, Some(Duration::from_secs(5)));
        assert_eq!(config.max_pool_size, Some(10));
    }

    #[tokio::test]
    async fn test_connection_is_lazy() {
        // Parsing and client construction never touch the network
        let conn = Connection::with_config(
            "mongodb://localhost:27017",
            PoolConfig::with_timeout(Duration::from_millis(100)),
        )
        .await;
        assert!(conn.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_uri_is_rejected() {
        let conn = Connection::new("not-a-uri").await;
        assert!(conn.is_err());
    }
}
