use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts, Request},
    http::header::CONTENT_TYPE,
};
use axum_extra::extract::{Form, Query};
use serde::de::DeserializeOwned;

/// Decode `body` the way a handler taking `Form<T>` would.
pub(crate) async fn extract_form<T: DeserializeOwned>(body: &str) -> T {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .expect("Could not build request");

    match Form::<T>::from_request(request, &()).await {
        Ok(Form(form)) => form,
        Err(rejection) => panic!("Could not extract form from {body:?}: {rejection:?}"),
    }
}

/// Decode `query` the way a handler taking `Query<T>` would.
pub(crate) async fn extract_query<T: DeserializeOwned>(query: &str) -> T {
    let (mut parts, _) = Request::builder()
        .uri(format!("/?{query}"))
        .body(())
        .expect("Could not build request")
        .into_parts();

    match Query::<T>::from_request_parts(&mut parts, &()).await {
        Ok(Query(query)) => query,
        Err(rejection) => panic!("Could not extract query from {query:?}: {rejection:?}"),
    }
}
