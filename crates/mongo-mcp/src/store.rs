//! Database seam
//!
//! Every tool handler talks to MongoDB through [`DocumentStore`]. Arguments
//! arriving here have already passed the gate and the validators; the store
//! only relays them to the driver and hands results back.

use async_trait::async_trait;
use bson::{Bson, Document};
use mongo_guard::{ValidatedCollectionName, ValidatedDatabaseName};
use mongo_mcp_common::Result;

/// Summary of one database on the server
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,
    pub size_on_disk: u64,
    pub empty: bool,
}

/// Outcome of an `update_many`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
}

/// Index to create on a collection
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub keys: Document,
    pub name: Option<String>,
    pub unique: bool,
}

/// Find parameters for one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    filter: Document,
    projection: Option<Document>,
    sort: Option<Document>,
    skip: Option<u64>,
    limit: Option<i64>,
}

impl FindQuery {
    /// Create a query matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter document
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Set the projection
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Set the sort order
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the number of documents to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents to return
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn get_filter(&self) -> &Document {
        &self.filter
    }

    pub fn get_projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub fn get_sort(&self) -> Option<&Document> {
        self.sort.as_ref()
    }

    pub fn get_skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }
}

/// Driver operations used by the tool handlers
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check the server is reachable
    async fn ping(&self) -> Result<()>;

    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>>;

    /// Raw `dbStats` output
    async fn database_stats(&self, db: &ValidatedDatabaseName) -> Result<Document>;

    async fn list_collections(&self, db: &ValidatedDatabaseName) -> Result<Vec<String>>;

    /// Raw `collStats` output
    async fn collection_stats(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
    ) -> Result<Document>;

    async fn list_indexes(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
    ) -> Result<Vec<Document>>;

    async fn find(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        query: FindQuery,
    ) -> Result<Vec<Document>>;

    async fn find_one(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>>;

    async fn count(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64>;

    async fn aggregate(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>>;

    /// `explain` of an aggregation with `executionStats` verbosity
    async fn explain_aggregate(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        pipeline: Vec<Document>,
    ) -> Result<Document>;

    /// Insert one document, returning its `_id`
    async fn insert_one(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        document: Document,
    ) -> Result<Bson>;

    async fn update_many(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary>;

    /// Delete every match, returning the deleted count
    async fn delete_many(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64>;

    /// Create an index, returning its name
    async fn create_index(
        &self,
        db: &ValidatedDatabaseName,
        coll: &ValidatedCollectionName,
        index: IndexSpec,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_find_query_new() {
        let query = FindQuery::new();
        assert!(query.get_filter().is_empty());
        assert!(query.get_projection().is_none());
        assert!(query.get_sort().is_none());
        assert!(query.get_skip().is_none());
        assert!(query.get_limit().is_none());
    }

    #[test]
    fn test_find_query_chaining() {
        let filter = doc! { "active": true };
        let sort = doc! { "name": 1 };
        let projection = doc! { "name": 1, "_id": 0 };

        let query = FindQuery::new()
            .filter(filter.clone())
            .projection(projection.clone())
            .sort(sort.clone())
            .skip(5)
            .limit(10);

        assert_eq!(query.get_filter(), &filter);
        assert_eq!(query.get_projection(), Some(&projection));
        assert_eq!(query.get_sort(), Some(&sort));
        assert_eq!(query.get_skip(), Some(5));
        assert_eq!(query.get_limit(), Some(10));
    }
}
