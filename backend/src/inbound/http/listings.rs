//! Listing HTTP handlers.
//!
//! ```text
//! GET    /api/v1/listings          Search active listings
//! GET    /api/v1/listings/mine     Authenticated user's listings
//! GET    /api/v1/listings/{id}     Fetch one listing
//! POST   /api/v1/listings          Create (JSON, or multipart with image)
//! PUT    /api/v1/listings/{id}     Owner update
//! DELETE /api/v1/listings/{id}     Owner delete
//! ```

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use chrono::NaiveDateTime;
use futures_util::{StreamExt, TryStreamExt};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Category, Error, ImageUpload, Listing, ListingChanges, ListingDraft, ListingId,
    ListingService, ListingStatus, ListingType, Page, SearchCriteria,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Upper bound on an uploaded image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Upper bound on the JSON metadata part of a multipart request.
const MAX_METADATA_BYTES: usize = 64 * 1024;

const LISTING_PART: &str = "listing";
const IMAGE_PART: &str = "image";

/// Request body for creating a listing.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub listing_type: ListingType,
    /// Required for rent and sell, forbidden for borrow.
    #[serde(default)]
    pub price: Option<f64>,
}

impl From<ListingPayload> for ListingDraft {
    fn from(payload: ListingPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            category: payload.category,
            listing_type: payload.listing_type,
            price: payload.price,
        }
    }
}

/// Distinguish an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Request body for updating a listing. Absent fields stay untouched;
/// `"price": null` clears the price.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub listing_type: Option<ListingType>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>, nullable)]
    pub price: Option<Option<f64>>,
    pub status: Option<ListingStatus>,
}

impl From<ListingPatch> for ListingChanges {
    fn from(patch: ListingPatch) -> Self {
        Self {
            title: patch.title,
            description: patch.description,
            category: patch.category,
            listing_type: patch.listing_type,
            price: patch.price,
            status: patch.status,
        }
    }
}

/// Listing as returned to clients, with the image resolved to a URL.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub listing_type: ListingType,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub status: ListingStatus,
    pub created_at: NaiveDateTime,
}

impl ListingResponse {
    fn from_domain(listing: Listing, service: &ListingService) -> Self {
        let image_url = service.image_url(&listing);
        Self {
            id: listing.id.to_string(),
            owner_id: listing.owner.to_string(),
            title: listing.title,
            description: listing.description,
            category: listing.category,
            listing_type: listing.listing_type,
            price: listing.price,
            image_url,
            status: listing.status,
            created_at: listing.created_at,
        }
    }
}

/// Query parameters for listing search.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Filter by category.
    pub category: Option<String>,
    /// Filter by listing type.
    pub listing_type: Option<String>,
    /// Case-insensitive substring match over title and description.
    pub q: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Items per page, capped at 100.
    pub page_size: Option<u32>,
}

fn parse_criteria(query: SearchQuery) -> Result<SearchCriteria, Error> {
    let category = query
        .category
        .as_deref()
        .map(|raw| {
            Category::from_str_opt(raw)
                .ok_or_else(|| Error::invalid_request(format!("unknown category: {raw}")))
        })
        .transpose()?;
    let listing_type = query
        .listing_type
        .as_deref()
        .map(|raw| {
            ListingType::from_str_opt(raw)
                .ok_or_else(|| Error::invalid_request(format!("unknown listing type: {raw}")))
        })
        .transpose()?;
    Ok(SearchCriteria::new(
        category,
        listing_type,
        query.q,
        query.page,
        query.page_size,
    ))
}

fn parse_listing_id(raw: &str) -> Result<ListingId, Error> {
    ListingId::parse(raw).map_err(|_| Error::invalid_request("listing id must be a UUID"))
}

fn map_multipart_error(err: actix_multipart::MultipartError) -> Error {
    Error::invalid_request(format!("malformed multipart request: {err}"))
}

async fn read_part(
    field: &mut actix_multipart::Field,
    limit: usize,
    part: &str,
) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(map_multipart_error)? {
        if buffer.len() + chunk.len() > limit {
            return Err(Error::invalid_request(format!(
                "{part} part exceeds the {limit}-byte limit"
            )));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

/// Pull the JSON metadata and optional image out of a multipart request.
async fn parse_multipart(
    mut multipart: Multipart,
) -> Result<(ListingPayload, Option<ImageUpload>), Error> {
    let mut payload: Option<ListingPayload> = None;
    let mut image: Option<ImageUpload> = None;

    while let Some(mut field) = multipart.try_next().await.map_err(map_multipart_error)? {
        match field.name() {
            Some(LISTING_PART) => {
                let bytes = read_part(&mut field, MAX_METADATA_BYTES, LISTING_PART).await?;
                payload = Some(serde_json::from_slice(&bytes).map_err(|err| {
                    Error::invalid_request(format!("invalid listing JSON: {err}"))
                })?);
            }
            Some(IMAGE_PART) => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(ToOwned::to_owned)
                    .ok_or_else(|| {
                        Error::invalid_request("image part must carry a filename")
                    })?;
                let bytes = read_part(&mut field, MAX_IMAGE_BYTES, IMAGE_PART).await?;
                image = Some(ImageUpload { filename, bytes });
            }
            // Unknown parts are drained and ignored.
            _ => while field.try_next().await.map_err(map_multipart_error)?.is_some() {},
        }
    }

    let payload = payload
        .ok_or_else(|| Error::invalid_request(format!("missing {LISTING_PART} part")))?;
    Ok((payload, image))
}

async fn read_json_body(mut body: web::Payload) -> Result<ListingPayload, Error> {
    let mut buffer = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk =
            chunk.map_err(|err| Error::invalid_request(format!("unreadable body: {err}")))?;
        if buffer.len() + chunk.len() > MAX_METADATA_BYTES {
            return Err(Error::invalid_request("request body too large"));
        }
        buffer.extend_from_slice(&chunk);
    }
    serde_json::from_slice(&buffer)
        .map_err(|err| Error::invalid_request(format!("invalid listing JSON: {err}")))
}

/// Search active listings.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(SearchQuery),
    responses(
        (status = 200, description = "One page of matching listings"),
        (status = 400, description = "Invalid filter or paging", body = Error)
    ),
    tags = ["listings"],
    operation_id = "searchListings"
)]
#[get("/listings")]
pub async fn search_listings(
    state: web::Data<HttpState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let criteria = parse_criteria(query.into_inner())?;
    let page = state.listings.search(&criteria).await?;
    let page: Page<ListingResponse> =
        page.map(|listing| ListingResponse::from_domain(listing, &state.listings));
    Ok(HttpResponse::Ok().json(page))
}

/// All listings owned by the caller, any status.
#[utoipa::path(
    get,
    path = "/api/v1/listings/mine",
    responses(
        (status = 200, description = "The caller's listings, newest first",
            body = [ListingResponse]),
        (status = 401, description = "Missing or invalid token", body = Error)
    ),
    tags = ["listings"],
    operation_id = "listOwnListings"
)]
#[get("/listings/mine")]
pub async fn my_listings(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let listings = state.listings.list_owned(&user.0.id).await?;
    let items: Vec<ListingResponse> = listings
        .into_iter()
        .map(|listing| ListingResponse::from_domain(listing, &state.listings))
        .collect();
    Ok(HttpResponse::Ok().json(items))
}

/// Fetch a single listing.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 200, description = "The listing", body = ListingResponse),
        (status = 404, description = "No such listing", body = Error)
    ),
    tags = ["listings"],
    operation_id = "getListing"
)]
#[get("/listings/{id}")]
pub async fn get_listing(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_listing_id(&path)?;
    let listing = state.listings.get(&id).await?;
    Ok(HttpResponse::Ok().json(ListingResponse::from_domain(listing, &state.listings)))
}

/// Create a listing.
///
/// Accepts either a plain JSON body or `multipart/form-data` with a JSON
/// `listing` part and an optional `image` file part.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body(content = ListingPayload),
    responses(
        (status = 201, description = "Listing created", body = ListingResponse),
        (status = 400, description = "Validation failure", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error)
    ),
    tags = ["listings"],
    operation_id = "createListing"
)]
#[post("/listings")]
pub async fn create_listing(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let is_multipart = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let (payload, image) = if is_multipart {
        parse_multipart(Multipart::new(req.headers(), body)).await?
    } else {
        (read_json_body(body).await?, None)
    };

    let listing = state
        .listings
        .create(&user.0.id, payload.into(), image)
        .await?;
    Ok(HttpResponse::Created().json(ListingResponse::from_domain(listing, &state.listings)))
}

/// Update a listing owned by the caller.
#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing identifier")),
    request_body = ListingPatch,
    responses(
        (status = 200, description = "Updated listing", body = ListingResponse),
        (status = 400, description = "Merged state violates an invariant", body = Error),
        (status = 403, description = "Caller does not own the listing", body = Error),
        (status = 404, description = "No such listing", body = Error)
    ),
    tags = ["listings"],
    operation_id = "updateListing"
)]
#[put("/listings/{id}")]
pub async fn update_listing(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    patch: web::Json<ListingPatch>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let id = parse_listing_id(&path)?;
    let listing = state
        .listings
        .update(&id, &user.0.id, patch.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(ListingResponse::from_domain(listing, &state.listings)))
}

/// Delete a listing owned by the caller.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 204, description = "Listing removed"),
        (status = 403, description = "Caller does not own the listing", body = Error),
        (status = 404, description = "No such listing", body = Error)
    ),
    tags = ["listings"],
    operation_id = "deleteListing"
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let id = parse_listing_id(&path)?;
    state.listings.delete(&id, &user.0.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn patch_distinguishes_absent_from_null_price() {
        let absent: ListingPatch = serde_json::from_str(r#"{"title": "x"}"#).expect("parses");
        assert_eq!(absent.price, None);

        let cleared: ListingPatch = serde_json::from_str(r#"{"price": null}"#).expect("parses");
        assert_eq!(cleared.price, Some(None));

        let set: ListingPatch = serde_json::from_str(r#"{"price": 12.5}"#).expect("parses");
        assert_eq!(set.price, Some(Some(12.5)));
    }

    #[test]
    fn payload_parses_camel_case_fields() {
        let payload: ListingPayload = serde_json::from_str(
            r#"{
                "title": "Seed drill",
                "description": "Three-row drill",
                "category": "equipment",
                "listingType": "rent",
                "price": 30.0
            }"#,
        )
        .expect("parses");
        assert_eq!(payload.category, Category::Equipment);
        assert_eq!(payload.listing_type, ListingType::Rent);
    }

    #[rstest]
    #[case(Some("tool"), None, true)]
    #[case(Some("vehicle"), None, false)]
    #[case(None, Some("borrow"), true)]
    #[case(None, Some("lease"), false)]
    fn criteria_parsing_validates_enums(
        #[case] category: Option<&str>,
        #[case] listing_type: Option<&str>,
        #[case] ok: bool,
    ) {
        let query = SearchQuery {
            category: category.map(ToOwned::to_owned),
            listing_type: listing_type.map(ToOwned::to_owned),
            q: None,
            page: None,
            page_size: None,
        };
        assert_eq!(parse_criteria(query).is_ok(), ok);
    }

    #[test]
    fn listing_ids_must_be_uuids() {
        assert!(parse_listing_id("not-a-uuid").is_err());
        assert!(parse_listing_id(&ListingId::generate().to_string()).is_ok());
    }
}
