//! Typed client for the remote `users` collection.
//!
//! Every call is independent: no caching, no retry, no de-duplication.

use userdesk_core::{ApiResult, NewUser, UserFilter, UserId, UserPage, UserPatch, UserRecord};

use crate::http::{RequestClient, RequestOptions};

const USERS_PATH: &str = "/users";

/// Page size used when the caller does not pick one.
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Clone)]
pub struct UsersClient {
    client: RequestClient,
}

impl UsersClient {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    /// `GET /users?skip=&limit=`
    pub async fn list(&self, skip: u64, limit: u64) -> ApiResult<UserPage> {
        let path = format!("{USERS_PATH}?skip={skip}&limit={limit}");
        self.client.get(&path, RequestOptions::default()).await
    }

    /// First page with the default page size.
    pub async fn list_default(&self) -> ApiResult<UserPage> {
        self.list(0, DEFAULT_LIMIT).await
    }

    /// `GET /users/{id}`
    pub async fn get(&self, id: UserId) -> ApiResult<UserRecord> {
        self.client
            .get(&record_path(id), RequestOptions::default())
            .await
    }

    /// `GET /users/search?q=`
    pub async fn search(&self, query: &str) -> ApiResult<UserPage> {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let path = format!("{USERS_PATH}/search?q={encoded}");
        self.client.get(&path, RequestOptions::default()).await
    }

    /// `POST /users/add`
    pub async fn create(&self, user: &NewUser) -> ApiResult<UserRecord> {
        let path = format!("{USERS_PATH}/add");
        self.client
            .post(&path, user, RequestOptions::default())
            .await
    }

    /// `PUT /users/{id}` with the whole record.
    pub async fn update(&self, id: UserId, record: &UserRecord) -> ApiResult<UserRecord> {
        self.client
            .put(&record_path(id), record, RequestOptions::default())
            .await
    }

    /// `PUT /users/{id}` with only the changed fields.
    pub async fn patch(&self, id: UserId, patch: &UserPatch) -> ApiResult<UserRecord> {
        self.client
            .put(&record_path(id), patch, RequestOptions::default())
            .await
    }

    /// `DELETE /users/{id}`; returns the deleted record.
    pub async fn delete(&self, id: UserId) -> ApiResult<UserRecord> {
        self.client
            .delete(&record_path(id), RequestOptions::default())
            .await
    }

    /// `GET /users/filter?...` with only the filters that are set.
    pub async fn filter(&self, filter: &UserFilter) -> ApiResult<UserPage> {
        self.client
            .get(&filter_path(filter), RequestOptions::default())
            .await
    }
}

fn record_path(id: UserId) -> String {
    format!("{USERS_PATH}/{id}")
}

fn filter_path(filter: &UserFilter) -> String {
    match filter.to_query_string() {
        query if query.is_empty() => format!("{USERS_PATH}/filter"),
        query => format!("{USERS_PATH}/filter?{query}"),
    }
}
