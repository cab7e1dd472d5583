//! HTTP gateway over reqwest.
//!
//! Every route but `/tx/{id}/status` treats a non-2xx answer as an error.
//! The status route reports its code as a [`TxStatus`] instead.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use weavekit_core::{
    b64url_decode, Address, Amount, ChunkUpload, Transaction, TransactionId, TransactionJson,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{ChainReader, Gateway, Result};
use crate::types::{ChainInfo, StatusData, TxStatus};

/// A gateway reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
}

impl HttpGateway {
    /// Build a client honoring the configured timeout.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Use a preconfigured reqwest client.
    pub fn with_client(config: GatewayConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        check(response).await
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        Ok(self.get(path).await?.text().await?)
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %body, "gateway rejected request");
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

fn parse_amount(body: &str) -> Result<Amount> {
    body.trim()
        .parse::<Amount>()
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn anchor(&self) -> Result<String> {
        Ok(self.get_text("/tx_anchor").await?.trim().to_string())
    }

    async fn price(&self, bytes: u64, target: Option<&Address>) -> Result<Amount> {
        let path = match target {
            Some(target) => format!("/price/{}/{}", bytes, target),
            None => format!("/price/{}", bytes),
        };
        parse_amount(&self.get_text(&path).await?)
    }

    async fn submit(&self, tx: &Transaction) -> Result<Vec<u8>> {
        let url = self.url("/tx");
        tracing::debug!(%url, id = ?tx.id(), "POST");
        let response = self
            .client
            .post(&url)
            .json(&TransactionJson::from(tx))
            .send()
            .await?;
        Ok(check(response).await?.bytes().await?.to_vec())
    }

    async fn post_chunk(&self, chunk: &ChunkUpload) -> Result<()> {
        let url = self.url("/chunk");
        tracing::debug!(%url, offset = %chunk.offset, "POST");
        let response = self.client.post(&url).json(chunk).send().await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ChainReader for HttpGateway {
    async fn status(&self, id: &TransactionId) -> Result<TxStatus> {
        let url = self.url(&format!("/tx/{}/status", id));
        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let data: StatusData = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::Decode(e.to_string()))?;
                Ok(TxStatus::Accepted(data))
            }
            other => Ok(TxStatus::from_code(other.as_u16())),
        }
    }

    async fn transaction(&self, id: &TransactionId) -> Result<Transaction> {
        let json: TransactionJson = self
            .get(&format!("/tx/{}", id))
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Transaction::try_from(json).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn transaction_data(&self, id: &TransactionId) -> Result<Bytes> {
        let body = self.get_text(&format!("/tx/{}/data", id)).await?;
        let data = b64url_decode(body.trim()).map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(Bytes::from(data))
    }

    async fn balance(&self, address: &Address) -> Result<Amount> {
        parse_amount(&self.get_text(&format!("/wallet/{}/balance", address)).await?)
    }

    async fn last_tx(&self, address: &Address) -> Result<String> {
        Ok(self
            .get_text(&format!("/wallet/{}/last_tx", address))
            .await?
            .trim()
            .to_string())
    }

    async fn info(&self) -> Result<ChainInfo> {
        self.get("/info")
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{Method, StatusCode as AxumStatus, Uri};
    use axum::Router;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// A request as seen by the test server.
    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        body: String,
    }

    #[derive(Clone)]
    struct Canned {
        responses: Arc<Mutex<VecDeque<(u16, &'static str)>>>,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    async fn answer(
        State(canned): State<Canned>,
        method: Method,
        uri: Uri,
        body: String,
    ) -> (AxumStatus, &'static str) {
        canned.seen.lock().await.push(Seen {
            method: method.to_string(),
            path: uri.path().to_string(),
            body,
        });
        let (status, text) = canned
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or((500, "no canned response left"));
        (AxumStatus::from_u16(status).unwrap(), text)
    }

    /// Answer requests in order with canned responses and record each one.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (GatewayConfig, Arc<Mutex<Vec<Seen>>>) {
        let canned = Canned {
            responses: Arc::new(Mutex::new(responses.into())),
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let seen = Arc::clone(&canned.seen);
        let app = Router::new().fallback(answer).with_state(canned);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (GatewayConfig::new(format!("http://{}/", addr)), seen)
    }

    #[tokio::test]
    async fn test_anchor_and_price_routes() {
        let (config, seen) = serve(vec![(200, "anchor-value\n"), (200, "65595508"), (200, "100")]).await;
        let gateway = HttpGateway::new(config).unwrap();
        let target = Address::from_owner(b"recipient");

        assert_eq!(gateway.anchor().await.unwrap(), "anchor-value");
        assert_eq!(gateway.price(11, None).await.unwrap(), Amount::from_winston(65_595_508));
        assert_eq!(gateway.price(0, Some(&target)).await.unwrap(), Amount::from_winston(100));

        let seen = seen.lock().await;
        assert_eq!(seen[0].path, "/tx_anchor");
        assert_eq!(seen[1].path, "/price/11");
        assert_eq!(seen[2].path, format!("/price/0/{}", target));
        assert!(seen.iter().all(|r| r.method == "GET"));
    }

    #[tokio::test]
    async fn test_non_numeric_price_is_decode_error() {
        let (config, _) = serve(vec![(200, "not a number")]).await;
        let gateway = HttpGateway::new(config).unwrap();
        assert!(matches!(
            gateway.price(1, None).await,
            Err(GatewayError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_posts_wire_json() {
        let (config, seen) = serve(vec![(200, "OK"), (400, "Transaction verification failed.")]).await;
        let gateway = HttpGateway::new(config).unwrap();
        let tx = Transaction::from_data(&b"hello world"[..]);

        assert_eq!(gateway.submit(&tx).await.unwrap(), b"OK");
        let err = gateway.submit(&tx).await.unwrap_err();
        assert_eq!(err.status(), Some(400));

        let seen = seen.lock().await;
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].path, "/tx");
        let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(body["format"], 2);
        assert_eq!(body["data_size"], "11");
        assert!(body.get("chunks").is_none());
    }

    #[tokio::test]
    async fn test_status_route_maps_codes() {
        let accepted = r#"{"block_height":10,"block_indep_hash":"h","number_of_confirmations":3}"#;
        let (config, seen) = serve(vec![(200, accepted), (202, "Pending"), (404, "Not Found"), (500, "")]).await;
        let gateway = HttpGateway::new(config).unwrap();
        let id = TransactionId::from_bytes([1; 32]);

        match gateway.status(&id).await.unwrap() {
            TxStatus::Accepted(data) => assert_eq!(data.number_of_confirmations, 3),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(gateway.status(&id).await.unwrap(), TxStatus::Pending);
        assert_eq!(gateway.status(&id).await.unwrap(), TxStatus::NotFound);
        assert_eq!(gateway.status(&id).await.unwrap(), TxStatus::Unknown(500));

        assert_eq!(seen.lock().await[0].path, format!("/tx/{}/status", id));
    }

    #[tokio::test]
    async fn test_wallet_routes() {
        let (config, seen) = serve(vec![(200, "1000000000000"), (200, "last-id"), (500, "boom")]).await;
        let gateway = HttpGateway::new(config).unwrap();
        let address = Address::from_owner(b"wallet");

        assert_eq!(
            gateway.balance(&address).await.unwrap(),
            Amount::from_winston(1_000_000_000_000)
        );
        assert_eq!(gateway.last_tx(&address).await.unwrap(), "last-id");
        assert!(matches!(
            gateway.balance(&address).await,
            Err(GatewayError::Status { status: 500, .. })
        ));

        let seen = seen.lock().await;
        assert_eq!(seen[0].path, format!("/wallet/{}/balance", address));
        assert_eq!(seen[1].path, format!("/wallet/{}/last_tx", address));
    }

    #[tokio::test]
    async fn test_transaction_data_is_decoded() {
        let (config, _) = serve(vec![(200, "aGVsbG8gd29ybGQ")]).await;
        let gateway = HttpGateway::new(config).unwrap();
        let data = gateway
            .transaction_data(&TransactionId::from_bytes([2; 32]))
            .await
            .unwrap();
        assert_eq!(data.as_ref(), b"hello world");
    }
}
