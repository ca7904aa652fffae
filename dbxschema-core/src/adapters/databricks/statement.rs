//! Statement submission, polling and result collection.

use super::DatabricksConnection;
use super::types::{
    DISPOSITION_INLINE, ExecuteStatementRequest, FORMAT_JSON_ARRAY, ON_WAIT_TIMEOUT_CONTINUE,
    ResultData, ServiceError, StatementResponse, StatementState,
};
use crate::Result;
use crate::adapters::{ResultSet, Row};
use crate::error::IntrospectError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio::time::Instant;

impl DatabricksConnection {
    /// Submits a statement, waits for it, and gathers every inline chunk.
    pub(super) async fn run_statement(&self, sql: &str) -> Result<ResultSet> {
        let response = self.submit_statement(sql).await?;
        let response = self.wait_for_completion(response).await?;
        self.collect_rows(response).await
    }

    async fn submit_statement(&self, sql: &str) -> Result<StatementResponse> {
        const FUNC: &str = "submit_statement";

        let body = ExecuteStatementRequest {
            warehouse_id: self.warehouse_id.clone(),
            statement: sql.to_string(),
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
            disposition: DISPOSITION_INLINE.to_string(),
            format: FORMAT_JSON_ARRAY.to_string(),
            wait_timeout: self.config.wait_timeout_param(),
            on_wait_timeout: ON_WAIT_TIMEOUT_CONTINUE.to_string(),
        };

        tracing::trace!("Submitting statement: {}", sql);
        let response: StatementResponse = self
            .send(FUNC, self.client.post(self.statements_url()).json(&body))
            .await?;

        tracing::debug!(
            "Statement {} submitted, state {:?}",
            response.statement_id,
            response.status.state
        );
        Ok(response)
    }

    async fn wait_for_completion(&self, response: StatementResponse) -> Result<StatementResponse> {
        const FUNC: &str = "wait_for_completion";

        let start = Instant::now();
        let mut current = response;

        loop {
            match current.status.state {
                StatementState::Succeeded => return Ok(current),
                StatementState::Failed => {
                    let error = current.status.error.unwrap_or_default();
                    return Err(IntrospectError::query_rejected(
                        FUNC,
                        format!("statement {} failed", current.statement_id),
                        error.to_string(),
                    ));
                }
                StatementState::Canceled => {
                    return Err(IntrospectError::query_rejected(
                        FUNC,
                        format!("statement {} did not complete", current.statement_id),
                        "statement was canceled",
                    ));
                }
                StatementState::Closed => {
                    // Inline results may arrive together with CLOSED
                    if current.result.is_some() {
                        return Ok(current);
                    }
                    return Err(IntrospectError::query_rejected(
                        FUNC,
                        format!("statement {} did not complete", current.statement_id),
                        "statement was closed before returning results",
                    ));
                }
                StatementState::Pending | StatementState::Running => {
                    if start.elapsed() >= self.config.statement_timeout {
                        self.cancel_statement(&current.statement_id).await;
                        return Err(IntrospectError::query_rejected(
                            FUNC,
                            format!("statement {} did not complete", current.statement_id),
                            format!(
                                "timed out after {}s",
                                self.config.statement_timeout.as_secs()
                            ),
                        ));
                    }

                    tokio::time::sleep(self.config.poll_interval).await;

                    tracing::debug!("Polling statement status: {}", current.statement_id);
                    let url = format!("{}/{}", self.statements_url(), current.statement_id);
                    current = self.send(FUNC, self.client.get(url)).await?;
                }
            }
        }
    }

    async fn collect_rows(&self, response: StatementResponse) -> Result<ResultSet> {
        let columns = response
            .manifest
            .as_ref()
            .map(|manifest| {
                let mut columns = manifest.schema.columns.clone();
                columns.sort_by_key(|c| c.position.unwrap_or_default());
                columns.into_iter().map(|c| c.name).collect()
            })
            .unwrap_or_default();

        if response.manifest.as_ref().is_some_and(|m| m.truncated) {
            tracing::warn!(
                "Statement {} result was truncated by the warehouse",
                response.statement_id
            );
        }

        let mut rows: Vec<Row> = Vec::new();
        let mut chunk = response.result;
        while let Some(data) = chunk {
            let next = data.next_chunk_index;
            rows.extend(data.data_array.unwrap_or_default());
            chunk = match next {
                Some(index) => Some(self.fetch_chunk(&response.statement_id, index).await?),
                None => None,
            };
        }

        tracing::debug!(
            "Statement {} returned {} rows",
            response.statement_id,
            rows.len()
        );
        Ok(ResultSet::new(columns, rows))
    }

    async fn fetch_chunk(&self, statement_id: &str, chunk_index: i64) -> Result<ResultData> {
        const FUNC: &str = "fetch_chunk";

        let url = format!(
            "{}/{}/result/chunks/{}",
            self.statements_url(),
            statement_id,
            chunk_index
        );
        tracing::debug!("Fetching chunk {} of statement {}", chunk_index, statement_id);
        self.send(FUNC, self.client.get(url)).await
    }

    /// Best-effort cancel; failures are logged and ignored.
    async fn cancel_statement(&self, statement_id: &str) {
        let url = format!("{}/{}/cancel", self.statements_url(), statement_id);
        match self.client.post(url).send().await {
            Ok(_) => tracing::debug!("Canceled statement {}", statement_id),
            Err(e) => tracing::warn!("Failed to cancel statement {}: {}", statement_id, e),
        }
    }

    /// Sends a request and decodes a JSON body, mapping HTTP and decode
    /// failures to query execution errors tagged with `function`.
    async fn send<T: DeserializeOwned>(
        &self,
        function: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            IntrospectError::query_failed(function, "request to the warehouse failed", e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            IntrospectError::query_failed(function, "failed to read warehouse response", e)
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ServiceError>(&body)
                .map_or_else(|_| body.trim().to_string(), |e| e.to_string());
            return Err(IntrospectError::query_rejected(
                function,
                format!("warehouse returned HTTP {}", status.as_u16()),
                detail,
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            IntrospectError::query_failed(function, "failed to parse warehouse response", e)
        })
    }
}
