//! Database implementation of SeenStore

use anyhow::Result;

use crate::model::ArchiveRef;
use crate::repository::Database;

use super::store::SeenStore;

impl SeenStore for Database {
    async fn contains(&self, archive: &ArchiveRef) -> Result<bool> {
        Database::contains(self, archive).await
    }

    async fn insert_batch(&self, archives: &[ArchiveRef]) -> Result<()> {
        Database::insert_batch(self, archives).await
    }
}
