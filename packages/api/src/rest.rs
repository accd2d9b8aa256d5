//! [`LeadTable`] over the hosted PostgREST endpoint.
//!
//! Every request carries the project `apikey` and the caller's bearer token, so
//! the server's row-level security sees the real user. Filters are rendered as
//! PostgREST query operators (`user_id=eq.<id>`, `id=in.(a,b)`), and writes ask
//! for `return=representation` so the affected rows come back in the response.
//!
//! A bulk insert must name one column set for the whole batch. Rows that leave
//! a server-defaulted column unset simply omit the key, so inserts send the
//! union of keys as `columns=` together with `Prefer: missing=default`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use store::repo::expect_single;
use store::{Caller, Filter, Lead, LeadPatch, LeadTable, NewLead, Order, TableError};

use crate::config::BackendConfig;
use crate::http::{bearer, read_failure};

#[derive(Clone)]
pub struct RestTable {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
}

impl RestTable {
    pub fn new(config: Arc<BackendConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        caller: &Caller,
        query: &[(String, String)],
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.config.rest_url())
            .query(query)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", bearer(&caller.access_token))
    }

    fn insert_request(
        &self,
        caller: &Caller,
        rows: &[NewLead],
    ) -> Result<reqwest::RequestBuilder, TableError> {
        let query = insert_query(rows)?;
        Ok(self
            .request(reqwest::Method::POST, caller, &query)
            .header("Prefer", "return=representation,missing=default")
            .json(rows))
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TableError> {
        let response = request.send().await.map_err(transport)?;
        if !response.status().is_success() {
            let (status, message) = read_failure(response).await;
            tracing::debug!(status, "leads request rejected: {message}");
            return Err(TableError::Rejected { status, message });
        }
        response.json().await.map_err(transport)
    }
}

fn transport(err: reqwest::Error) -> TableError {
    TableError::Transport(err.to_string())
}

fn select_query(filter: &Filter, order: Option<Order>) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), "*".to_string())];
    query.extend(filter.to_query_pairs());
    query.extend(order.map(|o| o.to_query_pair()));
    query
}

fn insert_query(rows: &[NewLead]) -> Result<Vec<(String, String)>, TableError> {
    let mut columns = BTreeSet::new();
    for row in rows {
        let value =
            serde_json::to_value(row).map_err(|e| TableError::Transport(e.to_string()))?;
        if let serde_json::Value::Object(map) = value {
            columns.extend(map.into_iter().map(|(key, _)| key));
        }
    }
    let columns = columns.into_iter().collect::<Vec<_>>().join(",");
    Ok(vec![
        ("columns".to_string(), columns),
        ("select".to_string(), "*".to_string()),
    ])
}

impl LeadTable for RestTable {
    async fn select(
        &self,
        caller: &Caller,
        filter: &Filter,
        order: Order,
    ) -> Result<Vec<Lead>, TableError> {
        let query = select_query(filter, Some(order));
        self.rows(self.request(reqwest::Method::GET, caller, &query))
            .await
    }

    async fn select_single(&self, caller: &Caller, filter: &Filter) -> Result<Lead, TableError> {
        let query = select_query(filter, None);
        let rows = self
            .rows(self.request(reqwest::Method::GET, caller, &query))
            .await?;
        expect_single(rows)
    }

    async fn insert(&self, caller: &Caller, rows: &[NewLead]) -> Result<Vec<Lead>, TableError> {
        let request = self.insert_request(caller, rows)?;
        self.rows(request).await
    }

    async fn update(
        &self,
        caller: &Caller,
        filter: &Filter,
        patch: &LeadPatch,
    ) -> Result<Vec<Lead>, TableError> {
        let query = select_query(filter, None);
        let request = self
            .request(reqwest::Method::PATCH, caller, &query)
            .header("Prefer", "return=representation")
            .json(patch);
        self.rows(request).await
    }

    async fn delete(&self, caller: &Caller, filter: &Filter) -> Result<Vec<Lead>, TableError> {
        let query = select_query(filter, None);
        let request = self
            .request(reqwest::Method::DELETE, caller, &query)
            .header("Prefer", "return=representation");
        self.rows(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{Column, LeadFields, LeadStatus, TargetType};
    use uuid::Uuid;

    fn table() -> RestTable {
        RestTable::new(Arc::new(BackendConfig::new("https://demo.supabase.co", "anon")))
    }

    #[test]
    fn test_select_query_rendering() {
        let owner = Uuid::from_u128(1);
        let filter = Filter::owned_by(owner).eq(Column::Status, LeadStatus::Pending);
        let query = select_query(&filter, Some(Order::newest_first()));
        assert_eq!(
            query,
            vec![
                ("select".to_string(), "*".to_string()),
                ("user_id".to_string(), format!("eq.{owner}")),
                ("status".to_string(), "eq.Pending".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_bulk_filter_rendering() {
        let a = Uuid::from_u128(10);
        let b = Uuid::from_u128(11);
        let query = select_query(&Filter::new().with_ids(&[a, b]), None);
        assert_eq!(query[1], ("id".to_string(), format!("in.({a},{b})")));
    }

    #[test]
    fn test_request_carries_keys() {
        let table = table();
        let caller = Caller {
            user_id: Uuid::nil(),
            access_token: "token".to_string(),
        };
        let request = table
            .request(reqwest::Method::GET, &caller, &select_query(&Filter::new(), None))
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/rest/v1/leads");
        assert_eq!(request.url().query(), Some("select=*"));
        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.headers()["Authorization"], "Bearer token");
    }

    #[test]
    fn test_mixed_insert_batch_names_column_union() {
        let owner = Uuid::from_u128(3);
        let rows = vec![
            LeadFields {
                name: "a".to_string(),
                target_type: Some(TargetType::Target),
                ..LeadFields::default()
            }
            .owned_by(owner),
            LeadFields {
                name: "b".to_string(),
                ..LeadFields::default()
            }
            .owned_by(owner),
        ];
        let caller = Caller {
            user_id: owner,
            access_token: "token".to_string(),
        };
        let request = table().insert_request(&caller, &rows).unwrap().build().unwrap();

        let columns = request
            .url()
            .query_pairs()
            .find(|(key, _)| key == "columns")
            .map(|(_, value)| value.into_owned());
        assert_eq!(
            columns.as_deref(),
            Some(
                "address,email,is_active,last_followup_remarks,name,next_steps,\
                 phone,priority,status,target_type,user_id"
            )
        );
        assert_eq!(
            request.headers()["Prefer"],
            "return=representation,missing=default"
        );
        assert_eq!(*request.method(), reqwest::Method::POST);
    }
}
