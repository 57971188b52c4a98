use derive_new::new;
use serde::Deserialize;
use tracing::instrument;

use crate::anonymize::ClientToken;
use crate::database::{Database, Result};
use crate::model::Symbol;

/// Creates the record on first like, counts the token only if it has not been seen for this symbol.
///
/// Both assignments are evaluated inside one statement on one record, so concurrent likes from the same
/// client cannot both observe the token as absent.
const RECORD_LIKE: &str = "
    UPDATE type::thing('stocks', $symbol) SET
        symbol = $symbol,
        likes = IF (voters OR []) CONTAINS $voter THEN likes ELSE (likes OR 0) + 1 END,
        voters = array::union(voters OR [], [$voter])
    RETURN AFTER
";

const LIKE_COUNT: &str = "SELECT VALUE likes FROM type::thing('stocks', $symbol)";

#[derive(Debug, Deserialize)]
struct Likes {
    likes: u64,
}

/// Persisted like counters, one record per symbol.
#[derive(Debug, Clone, new)]
pub struct LikeLedger {
    database: Database,
}

impl LikeLedger {
    /// Register a like from `token` unless it already liked `symbol`, returning the resulting count either way.
    #[instrument(skip(self, token))]
    pub async fn record_like_if_absent(&self, symbol: &Symbol, token: &ClientToken) -> Result<u64> {
        let record: Option<Likes> = self
            .database
            .sql(RECORD_LIKE)
            .bind(("symbol", symbol.to_string()))
            .bind(("voter", token.to_string()))
            .fetch_first()
            .await?;

        let likes = record.map(|record| record.likes).unwrap_or_default();
        tracing::debug!(%symbol, likes, "recorded like");

        Ok(likes)
    }

    /// Current like count for `symbol`, 0 when nobody liked it yet.
    #[instrument(skip(self))]
    pub async fn like_count(&self, symbol: &Symbol) -> Result<u64> {
        let likes: Option<u64> = self
            .database
            .sql(LIKE_COUNT)
            .bind(("symbol", symbol.to_string()))
            .fetch_first()
            .await?;

        Ok(likes.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::database::DatabaseConfig;

    use super::*;

    async fn ledger() -> LikeLedger {
        let database = Database::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        LikeLedger::new(database)
    }

    fn symbol(text: &str) -> Symbol {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn unseen_symbol_has_no_likes() {
        let ledger = ledger().await;
        assert_eq!(ledger.like_count(&symbol("GOOG")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn first_like_creates_record() {
        let ledger = ledger().await;
        let token = ClientToken::from_address("203.0.113.7");

        let likes = ledger
            .record_like_if_absent(&symbol("GOOG"), &token)
            .await
            .unwrap();

        assert_eq!(likes, 1);
        assert_eq!(ledger.like_count(&symbol("GOOG")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn repeated_like_is_idempotent() {
        let ledger = ledger().await;
        let token = ClientToken::from_address("203.0.113.7");

        let first = ledger
            .record_like_if_absent(&symbol("GOOG"), &token)
            .await
            .unwrap();
        let second = ledger
            .record_like_if_absent(&symbol("GOOG"), &token)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.like_count(&symbol("GOOG")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn distinct_tokens_each_count_once() {
        let ledger = ledger().await;
        let alice = ClientToken::from_address("203.0.113.7");
        let bob = ClientToken::from_address("198.51.100.4");

        let first = ledger
            .record_like_if_absent(&symbol("GOOG"), &alice)
            .await
            .unwrap();
        let second = ledger
            .record_like_if_absent(&symbol("GOOG"), &bob)
            .await
            .unwrap();

        assert_eq!(second, first + 1);
    }

    #[tokio::test]
    async fn likes_are_kept_per_symbol() {
        let ledger = ledger().await;
        let token = ClientToken::from_address("203.0.113.7");

        ledger
            .record_like_if_absent(&symbol("GOOG"), &token)
            .await
            .unwrap();

        assert_eq!(ledger.like_count(&symbol("MSFT")).await.unwrap(), 0);
        assert_eq!(
            ledger
                .record_like_if_absent(&symbol("MSFT"), &token)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn lowercase_request_hits_the_same_record() {
        let ledger = ledger().await;
        let token = ClientToken::from_address("203.0.113.7");

        ledger
            .record_like_if_absent(&symbol("goog"), &token)
            .await
            .unwrap();

        assert_eq!(ledger.like_count(&symbol("GOOG")).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_likes_from_one_client_count_once() {
        let ledger = ledger().await;
        let token = ClientToken::from_address("203.0.113.7");

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let ledger = ledger.clone();
                let token = token.clone();
                tokio::spawn(async move { ledger.record_like_if_absent(&symbol("GOOG"), &token).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), 1);
        }
        assert_eq!(ledger.like_count(&symbol("GOOG")).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_likes_from_distinct_clients_all_count() {
        let ledger = ledger().await;

        let tasks: Vec<_> = (0..32)
            .map(|n| {
                let ledger = ledger.clone();
                let token = ClientToken::from_address(&format!("198.51.100.{n}"));
                tokio::spawn(async move { ledger.record_like_if_absent(&symbol("GOOG"), &token).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(ledger.like_count(&symbol("GOOG")).await.unwrap(), 32);
    }

    #[tokio::test]
    async fn failed_write_records_nothing() {
        let ledger = ledger().await;
        let token = ClientToken::from_address("203.0.113.7");

        let _: Option<u64> = ledger
            .database
            .sql("DEFINE FIELD likes ON TABLE stocks TYPE int ASSERT $value < 0")
            .fetch_first()
            .await
            .unwrap();

        assert!(ledger
            .record_like_if_absent(&symbol("GOOG"), &token)
            .await
            .is_err());
        assert_eq!(ledger.like_count(&symbol("GOOG")).await.unwrap(), 0);
    }
}
