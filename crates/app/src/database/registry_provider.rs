use async_trait::async_trait;
use sqlx::Row;

use common::crypto::{DataKey, PublicKey, Signature};
use common::locator::EntryId;
use common::registry::{PointerRecord, RegistryError, RegistryProvider, SignedEntry};

use crate::database::Database;

#[derive(Debug, thiserror::Error)]
pub enum RegistryStoreError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("corrupt registry row for {0}: {1}")]
    Corrupt(EntryId, String),
}

fn encode_revision(revision: u64) -> [u8; 8] {
    revision.to_be_bytes()
}

fn decode_revision(entry_id: &EntryId, bytes: &[u8]) -> Result<u64, RegistryStoreError> {
    let bytes: [u8; 8] = bytes.try_into().map_err(|_| {
        RegistryStoreError::Corrupt(*entry_id, format!("revision is {} bytes", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

impl Database {
    async fn stored_revision(
        &self,
        entry_id: &EntryId,
    ) -> Result<Option<u64>, RegistryStoreError> {
        let row = sqlx::query(
            r#"
            SELECT revision
            FROM registry_entries
            WHERE entry_id = ?
            "#,
        )
        .bind(entry_id.to_hex())
        .fetch_optional(&**self)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let revision: Vec<u8> = row.try_get("revision")?;
        decode_revision(entry_id, &revision).map(Some)
    }

    fn entry_from_row(
        entry_id: &EntryId,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<SignedEntry, RegistryStoreError> {
        let corrupt = |what: &str, e: String| {
            RegistryStoreError::Corrupt(*entry_id, format!("{}: {}", what, e))
        };

        let public_key: Vec<u8> = row.try_get("public_key")?;
        let data_key: Vec<u8> = row.try_get("data_key")?;
        let revision: Vec<u8> = row.try_get("revision")?;
        let entry_data: Vec<u8> = row.try_get("entry_data")?;
        let signature: Vec<u8> = row.try_get("signature")?;

        let record = PointerRecord {
            public_key: PublicKey::try_from(public_key.as_slice())
                .map_err(|e| corrupt("public key", e.to_string()))?,
            data_key: DataKey::try_from(data_key.as_slice())
                .map_err(|e| corrupt("data key", e.to_string()))?,
            revision: decode_revision(entry_id, &revision)?,
            entry_data,
        };
        let signature = Signature::from_slice(&signature)
            .map_err(|e| corrupt("signature", e.to_string()))?;

        Ok(SignedEntry::from_parts(record, signature))
    }
}

#[async_trait]
impl RegistryProvider for Database {
    type Error = RegistryStoreError;

    async fn get(
        &self,
        entry_id: &EntryId,
    ) -> Result<Option<SignedEntry>, RegistryError<Self::Error>> {
        let row = sqlx::query(
            r#"
            SELECT public_key, data_key, revision, entry_data, signature
            FROM registry_entries
            WHERE entry_id = ?
            "#,
        )
        .bind(entry_id.to_hex())
        .fetch_optional(&**self)
        .await
        .map_err(|e| RegistryError::Provider(e.into()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let entry = Database::entry_from_row(entry_id, &row)?;
        Ok(Some(entry))
    }

    async fn set(&self, entry: SignedEntry) -> Result<(), RegistryError<Self::Error>> {
        let entry_id = entry.entry_id();
        if entry.verify().is_err() {
            return Err(RegistryError::InvalidSignature(entry_id));
        }
        let record = entry.record();

        // Insert, or replace only when the new revision is strictly greater;
        //  the check and the write happen in one statement
        let result = sqlx::query(
            r#"
            INSERT INTO registry_entries
                (entry_id, public_key, data_key, revision, entry_data, signature, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, CAST(strftime('%s', 'now') AS INTEGER))
            ON CONFLICT(entry_id) DO UPDATE SET
                revision = excluded.revision,
                entry_data = excluded.entry_data,
                signature = excluded.signature,
                updated_at = excluded.updated_at
            WHERE excluded.revision > registry_entries.revision
            "#,
        )
        .bind(entry_id.to_hex())
        .bind(record.public_key.to_bytes().to_vec())
        .bind(record.data_key.as_bytes().to_vec())
        .bind(encode_revision(record.revision).to_vec())
        .bind(record.entry_data.clone())
        .bind(entry.signature().to_bytes().to_vec())
        .execute(&**self)
        .await
        .map_err(|e| RegistryError::Provider(e.into()))?;

        if result.rows_affected() == 0 {
            let stored = self.stored_revision(&entry_id).await?.unwrap_or_default();
            tracing::debug!(
                %entry_id,
                stored,
                attempted = record.revision,
                "stale registry write"
            );
            return Err(RegistryError::RevisionConflict(
                entry_id,
                stored,
                record.revision,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::crypto::{derive_registry_keys, KeyPair, Seed};
    use common::document::{ListItem, TaskList};
    use common::persist::{Persister, RetryPolicy};
    use common::portal::{BlobsStore, Portal};
    use common::registry::RegistryClient;
    use common::testkit::GatedRegistry;

    fn keys(tag: &str) -> (KeyPair, DataKey) {
        derive_registry_keys(&Seed::from([2u8; 16]), "moduleA", tag)
    }

    #[tokio::test]
    async fn test_get_absent() {
        let db = Database::in_memory().await.unwrap();
        let (kp, dk) = keys("list1");
        let entry_id = EntryId::derive(kp.public_key(), &dk);
        assert!(db.get(&entry_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips_entry() {
        let db = Database::in_memory().await.unwrap();
        let (kp, dk) = keys("list1");
        let entry = SignedEntry::sign(&kp, dk, vec![7u8; 34], 0).unwrap();

        db.set(entry.clone()).await.unwrap();
        let stored = db.get(&entry.entry_id()).await.unwrap().unwrap();
        assert_eq!(stored, entry);
        assert!(stored.verify().is_ok());
    }

    #[tokio::test]
    async fn test_stale_revision_is_conflict() {
        let db = Database::in_memory().await.unwrap();
        let (kp, dk) = keys("list1");

        db.set(SignedEntry::sign(&kp, dk, vec![1], 0).unwrap())
            .await
            .unwrap();
        db.set(SignedEntry::sign(&kp, dk, vec![2], 1).unwrap())
            .await
            .unwrap();

        for revision in [0, 1] {
            let result = db
                .set(SignedEntry::sign(&kp, dk, vec![3], revision).unwrap())
                .await;
            assert!(matches!(
                result,
                Err(RegistryError::RevisionConflict(_, 1, attempted)) if attempted == revision
            ));
        }

        let entry_id = EntryId::derive(kp.public_key(), &dk);
        let stored = db.get(&entry_id).await.unwrap().unwrap();
        assert_eq!(stored.revision(), 1);
        assert_eq!(stored.record().entry_data, vec![2]);
    }

    #[tokio::test]
    async fn test_revisions_compare_unsigned() {
        let db = Database::in_memory().await.unwrap();
        let (kp, dk) = keys("list1");

        // Above i64::MAX a signed comparison would go backwards
        db.set(SignedEntry::sign(&kp, dk, vec![1], 255).unwrap())
            .await
            .unwrap();
        db.set(SignedEntry::sign(&kp, dk, vec![2], u64::MAX - 1).unwrap())
            .await
            .unwrap();
        let result = db
            .set(SignedEntry::sign(&kp, dk, vec![3], 256).unwrap())
            .await;
        assert!(matches!(result, Err(RegistryError::RevisionConflict(..))));

        db.set(SignedEntry::sign(&kp, dk, vec![4], u64::MAX).unwrap())
            .await
            .unwrap();
        let entry_id = EntryId::derive(kp.public_key(), &dk);
        assert_eq!(db.get(&entry_id).await.unwrap().unwrap().revision(), u64::MAX);
    }

    #[tokio::test]
    async fn test_forged_entry_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let (kp, dk) = keys("list1");
        let (other, _) = keys("list2");

        let honest = SignedEntry::sign(&kp, dk, vec![1], 0).unwrap();
        let forged_by = SignedEntry::sign(&other, dk, vec![1], 0).unwrap();
        let forged = SignedEntry::from_parts(honest.record().clone(), *forged_by.signature());

        let result = db.set(forged).await;
        assert!(matches!(result, Err(RegistryError::InvalidSignature(_))));
        assert!(db.get(&honest.entry_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_slots_are_separate_rows() {
        let db = Database::in_memory().await.unwrap();
        let client = RegistryClient::new(db.clone());
        let (kp1, dk1) = keys("list1");
        let (kp2, dk2) = keys("list2");

        client.write(&kp1, &dk1, vec![1], 0).await.unwrap();
        client.write(&kp2, &dk2, vec![2], 5).await.unwrap();

        let first = client.read(kp1.public_key(), &dk1).await.unwrap().unwrap();
        let second = client.read(kp2.public_key(), &dk2).await.unwrap().unwrap();
        assert_eq!((first.revision, first.entry_data), (0, vec![1]));
        assert_eq!((second.revision, second.entry_data), (5, vec![2]));
    }

    #[tokio::test]
    async fn test_file_database_persists_entries() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("db.sqlite");
        let (kp, dk) = keys("list1");
        let entry = SignedEntry::sign(&kp, dk, vec![9u8; 34], 3).unwrap();

        {
            let db = Database::connect(&path).await.unwrap();
            db.set(entry.clone()).await.unwrap();
            db.close().await;
        }

        let db = Database::connect(&path).await.unwrap();
        assert_eq!(db.get(&entry.entry_id()).await.unwrap(), Some(entry));
    }

    #[tokio::test]
    async fn test_concurrent_saves_both_land() {
        let temp = tempfile::tempdir().unwrap();
        let db = Database::connect(&temp.path().join("db.sqlite")).await.unwrap();
        let portal = Portal::new(BlobsStore::memory().await.unwrap(), db.clone());
        let seed = Seed::from([5u8; 16]);

        let prior = Persister::new(seed.clone(), portal.clone(), db.clone());
        prior
            .save(&TaskList::default(), "moduleA", "list1")
            .await
            .unwrap();

        // Both savers read revision 0 before either writes
        let gated = GatedRegistry::gated(db.clone(), 2);
        let first = Persister::new(seed.clone(), portal.clone(), gated.clone())
            .with_retry_policy(RetryPolicy::immediate(3));
        let second = Persister::new(seed, portal.clone(), gated)
            .with_retry_policy(RetryPolicy::immediate(3));
        let list_a = TaskList::new(vec![ListItem::new("from first")]);
        let list_b = TaskList::new(vec![ListItem::new("from second")]);

        let (a, b) = tokio::join!(
            first.save(&list_a, "moduleA", "list1"),
            second.save(&list_b, "moduleA", "list1"),
        );
        assert_eq!(a.unwrap(), b.unwrap());

        let state = prior.inspect("moduleA", "list1").await.unwrap().unwrap();
        assert_eq!(state.revision, 2);

        let loaded: TaskList = prior.load("moduleA", "list1").await.unwrap();
        assert!(loaded == list_a || loaded == list_b, "{loaded:?}");
    }
}
