use super::response::TransactionResponse;
use crate::transaction::RegistryView;
use serde_json::json;

/// Basic health check endpoint returning `{ "status": "ok" }`.
#[must_use]
pub fn health_endpoint() -> TransactionResponse {
    TransactionResponse::json(200, json!({ "status": "ok" }))
}

/// Pending transactions, oldest first.
///
/// ```json
/// { "pending": 1, "transactions": [{ "id": "01H..", "method": "GET", "path": "/pets", "age_ms": 12 }] }
/// ```
#[must_use]
pub fn diagnostics_endpoint(registry: &RegistryView) -> TransactionResponse {
    let transactions: Vec<_> = registry
        .snapshot()
        .into_iter()
        .map(|entry| {
            json!({
                "id": entry.id,
                "method": entry.method,
                "path": entry.path,
                "age_ms": entry.age().as_millis() as u64,
            })
        })
        .collect();
    TransactionResponse::json(
        200,
        json!({ "pending": transactions.len(), "transactions": transactions }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::TransactionRequest;
    use crate::transaction::TransactionManager;
    use http::Method;

    #[test]
    fn test_health_endpoint() {
        let resp = health_endpoint();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, Some(json!({ "status": "ok" })));
    }

    #[tokio::test]
    async fn test_diagnostics_lists_pending() {
        let manager = TransactionManager::default();
        let (transaction, _receiver) = manager.create(TransactionRequest::new(Method::POST, "/pets"));

        let body = diagnostics_endpoint(&manager.registry()).body.unwrap();
        assert_eq!(body["pending"], 1);
        assert_eq!(body["transactions"][0]["id"], transaction.id().to_string());
        assert_eq!(body["transactions"][0]["method"], "POST");

        transaction.end(health_endpoint());
        let body = diagnostics_endpoint(&manager.registry()).body.unwrap();
        assert_eq!(body["pending"], 0);
    }
}
