//! Admin console request handlers

use axum::{
    extract::{
        rejection::{FormRejection, PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::WithRejection;
use serde_json::{Map, Value};

use super::{
    html::{self, ChangeList, FormValues},
    BookAdmin, ChangeListParams, CHANGE_LIST_PATH,
};
use crate::{
    error::{AppError, FieldErrors},
    models::{book::NewBook, query::QueryParams},
    AppState,
};

/// Errors of the console. Missing books get an HTML page, everything else
/// keeps the API error body.
#[derive(Debug)]
pub struct AdminError(AppError);

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, Html(html::not_found())).into_response(),
            other => other.into_response(),
        }
    }
}

impl From<AppError> for AdminError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<PathRejection> for AdminError {
    fn from(rejection: PathRejection) -> Self {
        Self(rejection.into())
    }
}

impl From<FormRejection> for AdminError {
    fn from(rejection: FormRejection) -> Self {
        Self(rejection.into())
    }
}

impl From<QueryRejection> for AdminError {
    fn from(rejection: QueryRejection) -> Self {
        Self(rejection.into())
    }
}

type AdminResult<T> = Result<T, AdminError>;
type BookId = WithRejection<Path<i32>, AdminError>;
type FormPairs = WithRejection<Form<Vec<(String, String)>>, AdminError>;

/// Submitted form fields as the JSON shape the book parsers take
fn form_fields(pairs: &[(String, String)]) -> (Map<String, Value>, FormValues) {
    let params = QueryParams::new(pairs.to_vec());
    let mut fields = Map::new();
    for name in ["title", "author", "year", "status"] {
        if let Some(value) = params.get(name) {
            fields.insert(name.to_string(), Value::String(value.to_string()));
        }
    }
    let values = FormValues {
        title: params.get("title").unwrap_or_default().to_string(),
        author: params.get("author").unwrap_or_default().to_string(),
        year: params.get("year").unwrap_or_default().to_string(),
        status: params.get("status").unwrap_or_default().to_string(),
    };
    (fields, values)
}

pub async fn index() -> Redirect {
    Redirect::to(CHANGE_LIST_PATH)
}

pub async fn change_list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    WithRejection(Query(pairs), _): WithRejection<Query<Vec<(String, String)>>, AdminError>,
) -> AdminResult<Html<String>> {
    let admin = BookAdmin::new(&state.config.admin);
    let catalog = &state.services.catalog;
    let mut params = ChangeListParams::from_params(&QueryParams::new(pairs), &admin);

    let page = match catalog.list_books(&params.to_query(&admin)).await {
        Err(AppError::NotFound(_)) if params.page != 1 => {
            params.page = 1;
            catalog.list_books(&params.to_query(&admin)).await?
        }
        result => result?,
    };
    let years = catalog.years().await?;

    Ok(Html(
        ChangeList {
            admin: &admin,
            params: &params,
            page: &page,
            query: uri.query(),
            years: &years,
        }
        .render(),
    ))
}

pub async fn add_form() -> Html<String> {
    Html(html::book_form(None, &FormValues::initial(), &FieldErrors::new()))
}

pub async fn add_submit(
    State(state): State<AppState>,
    WithRejection(Form(pairs), _): FormPairs,
) -> AdminResult<Response> {
    let (fields, values) = form_fields(&pairs);
    let record = match NewBook::from_fields(&fields) {
        Ok(record) => record,
        Err(AppError::Validation(errors)) => {
            return Ok(Html(html::book_form(None, &values, &errors)).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    state.services.catalog.create_record(&record).await?;
    Ok(Redirect::to(CHANGE_LIST_PATH).into_response())
}

pub async fn change_form(
    State(state): State<AppState>,
    WithRejection(Path(id), _): BookId,
) -> AdminResult<Html<String>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Html(html::book_form(
        Some(&book),
        &FormValues::from(&book),
        &FieldErrors::new(),
    )))
}

pub async fn change_submit(
    State(state): State<AppState>,
    WithRejection(Path(id), _): BookId,
    WithRejection(Form(pairs), _): FormPairs,
) -> AdminResult<Response> {
    let catalog = &state.services.catalog;
    let book = catalog.get_book(id).await?;
    let (fields, values) = form_fields(&pairs);
    let record = match NewBook::from_fields(&fields) {
        Ok(record) => record,
        Err(AppError::Validation(errors)) => {
            return Ok(Html(html::book_form(Some(&book), &values, &errors)).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    catalog.update_book(id, &record.into_changes()).await?;
    Ok(Redirect::to(CHANGE_LIST_PATH).into_response())
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    WithRejection(Path(id), _): BookId,
) -> AdminResult<Html<String>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Html(html::delete_confirmation(&book)))
}

pub async fn delete_submit(
    State(state): State<AppState>,
    WithRejection(Path(id), _): BookId,
) -> AdminResult<Redirect> {
    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to(CHANGE_LIST_PATH))
}
