//! Marketplace listing entities and their invariants.
//!
//! The central rule of the marketplace: rent and sell listings carry a
//! positive price, borrow listings carry none. It is enforced here, at
//! construction and on every update, so no adapter can persist an
//! inconsistent row.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Opaque listing identifier (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its canonical string form.
    ///
    /// # Errors
    /// Returns the underlying parse error when `raw` is not a valid UUID.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of listing categories seeded in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tool,
    Seed,
    Equipment,
    Livestock,
    Produce,
}

impl Category {
    /// Stable string form used in persistence and query parameters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Seed => "seed",
            Self::Equipment => "equipment",
            Self::Livestock => "livestock",
            Self::Produce => "produce",
        }
    }

    /// Parse the stable string form.
    pub fn from_str_opt(raw: &str) -> Option<Self> {
        match raw {
            "tool" => Some(Self::Tool),
            "seed" => Some(Self::Seed),
            "equipment" => Some(Self::Equipment),
            "livestock" => Some(Self::Livestock),
            "produce" => Some(Self::Produce),
            _ => None,
        }
    }
}

/// How a listing is offered to other farmers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Rent,
    Borrow,
    Sell,
}

impl ListingType {
    /// Stable string form used in persistence and query parameters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::Borrow => "borrow",
            Self::Sell => "sell",
        }
    }

    /// Parse the stable string form.
    pub fn from_str_opt(raw: &str) -> Option<Self> {
        match raw {
            "rent" => Some(Self::Rent),
            "borrow" => Some(Self::Borrow),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    /// Whether this listing type carries a price.
    pub const fn requires_price(self) -> bool {
        matches!(self, Self::Rent | Self::Sell)
    }
}

/// Lifecycle state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Inactive,
}

impl ListingStatus {
    /// Stable string form used in persistence.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Parse the stable string form.
    pub fn from_str_opt(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Opaque reference to a stored listing image (path or object key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Wrap a raw locator produced by an image store.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A marketplace listing row as seen by the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub listing_type: ListingType,
    /// Present and positive for rent/sell, absent for borrow.
    pub price: Option<f64>,
    pub image: Option<Locator>,
    pub status: ListingStatus,
    pub created_at: NaiveDateTime,
}

/// Validation failures for listing drafts and updates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {0} characters")]
    TitleTooLong(usize),
    #[error("{listing_type} listings require a positive price")]
    MissingPrice { listing_type: &'static str },
    #[error("price must be positive, got {0}")]
    NonPositivePrice(f64),
    #[error("borrow listings must not carry a price")]
    PriceOnBorrow,
}

const MAX_TITLE_LEN: usize = 200;

/// User-submitted fields for creating a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub listing_type: ListingType,
    pub price: Option<f64>,
}

impl ListingDraft {
    /// Check the draft against listing invariants.
    ///
    /// # Errors
    /// Returns a [`ListingValidationError`] naming the violated constraint.
    pub fn validate(&self) -> Result<(), ListingValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ListingValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ListingValidationError::TitleTooLong(MAX_TITLE_LEN));
        }
        validate_price(self.listing_type, self.price)
    }
}

/// Partial update applied to an existing listing by its owner.
///
/// `None` fields are left untouched; `price` uses a double option so a
/// caller can distinguish "leave as is" from "clear the price".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub listing_type: Option<ListingType>,
    pub price: Option<Option<f64>>,
    pub status: Option<ListingStatus>,
}

impl Listing {
    /// Apply changes, re-validating the merged state.
    ///
    /// # Errors
    /// Returns a [`ListingValidationError`] when the merged listing would
    /// violate an invariant; the listing is left unmodified in that case.
    pub fn apply(&self, changes: ListingChanges) -> Result<Self, ListingValidationError> {
        let mut updated = self.clone();
        if let Some(title) = changes.title {
            // Stored titles are always trimmed, matching creation.
            updated.title = title.trim().to_owned();
        }
        if let Some(description) = changes.description {
            updated.description = description;
        }
        if let Some(category) = changes.category {
            updated.category = category;
        }
        if let Some(listing_type) = changes.listing_type {
            updated.listing_type = listing_type;
        }
        if let Some(price) = changes.price {
            updated.price = price;
        }
        if let Some(status) = changes.status {
            updated.status = status;
        }

        let draft = ListingDraft {
            title: updated.title.clone(),
            description: updated.description.clone(),
            category: updated.category,
            listing_type: updated.listing_type,
            price: updated.price,
        };
        draft.validate()?;
        Ok(updated)
    }
}

pub(crate) fn validate_price(
    listing_type: ListingType,
    price: Option<f64>,
) -> Result<(), ListingValidationError> {
    match (listing_type.requires_price(), price) {
        (true, None) => Err(ListingValidationError::MissingPrice {
            listing_type: listing_type.as_str(),
        }),
        (true, Some(value)) if !(value.is_finite() && value > 0.0) => {
            Err(ListingValidationError::NonPositivePrice(value))
        }
        (false, Some(_)) => Err(ListingValidationError::PriceOnBorrow),
        _ => Ok(()),
    }
}

/// Raw image bytes submitted alongside a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Image file extensions accepted for listing uploads.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

impl ImageUpload {
    /// Check the filename carries an allowed image extension.
    pub fn has_allowed_extension(&self) -> bool {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| {
                let ext = ext.to_ascii_lowercase();
                ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn draft(listing_type: ListingType, price: Option<f64>) -> ListingDraft {
        ListingDraft {
            title: "Spade".to_owned(),
            description: "Sturdy garden spade".to_owned(),
            category: Category::Tool,
            listing_type,
            price,
        }
    }

    fn listing() -> Listing {
        Listing {
            id: ListingId::generate(),
            owner: UserId::generate(),
            title: "Spade".to_owned(),
            description: "Sturdy garden spade".to_owned(),
            category: Category::Tool,
            listing_type: ListingType::Sell,
            price: Some(500.0),
            image: None,
            status: ListingStatus::Active,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[rstest]
    #[case(ListingType::Sell, Some(500.0))]
    #[case(ListingType::Rent, Some(25.5))]
    #[case(ListingType::Borrow, None)]
    fn accepts_consistent_type_price_pairs(
        #[case] listing_type: ListingType,
        #[case] price: Option<f64>,
    ) {
        assert!(draft(listing_type, price).validate().is_ok());
    }

    #[rstest]
    #[case(ListingType::Sell, None)]
    #[case(ListingType::Rent, None)]
    fn rejects_missing_price_for_priced_types(
        #[case] listing_type: ListingType,
        #[case] price: Option<f64>,
    ) {
        assert!(matches!(
            draft(listing_type, price).validate(),
            Err(ListingValidationError::MissingPrice { .. })
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-10.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_non_positive_prices(#[case] price: f64) {
        assert!(matches!(
            draft(ListingType::Sell, Some(price)).validate(),
            Err(ListingValidationError::NonPositivePrice(_))
        ));
    }

    #[test]
    fn rejects_price_on_borrow() {
        assert_eq!(
            draft(ListingType::Borrow, Some(100.0)).validate(),
            Err(ListingValidationError::PriceOnBorrow)
        );
    }

    #[test]
    fn rejects_blank_title() {
        let mut d = draft(ListingType::Borrow, None);
        d.title = "   ".to_owned();
        assert_eq!(d.validate(), Err(ListingValidationError::EmptyTitle));
    }

    #[test]
    fn apply_merges_and_revalidates() {
        let updated = listing()
            .apply(ListingChanges {
                price: Some(Some(750.0)),
                status: Some(ListingStatus::Inactive),
                ..ListingChanges::default()
            })
            .expect("valid update");
        assert_eq!(updated.price, Some(750.0));
        assert_eq!(updated.status, ListingStatus::Inactive);
        // Untouched fields survive.
        assert_eq!(updated.title, "Spade");
    }

    #[test]
    fn apply_trims_the_replacement_title() {
        let updated = listing()
            .apply(ListingChanges {
                title: Some("  Long-handled spade  ".to_owned()),
                ..ListingChanges::default()
            })
            .expect("valid update");
        assert_eq!(updated.title, "Long-handled spade");
    }

    #[test]
    fn apply_rejects_switch_to_borrow_with_price_retained() {
        let err = listing()
            .apply(ListingChanges {
                listing_type: Some(ListingType::Borrow),
                ..ListingChanges::default()
            })
            .expect_err("borrow with retained price must fail");
        assert_eq!(err, ListingValidationError::PriceOnBorrow);
    }

    #[test]
    fn apply_allows_switch_to_borrow_when_price_cleared() {
        let updated = listing()
            .apply(ListingChanges {
                listing_type: Some(ListingType::Borrow),
                price: Some(None),
                ..ListingChanges::default()
            })
            .expect("clearing the price makes borrow valid");
        assert_eq!(updated.price, None);
    }

    #[rstest]
    #[case("photo.PNG", true)]
    #[case("shed.jpeg", true)]
    #[case("tractor.webp", true)]
    #[case("notes.txt", false)]
    #[case("no-extension", false)]
    fn image_extension_allow_list(#[case] filename: &str, #[case] expected: bool) {
        let upload = ImageUpload {
            filename: filename.to_owned(),
            bytes: vec![0u8; 4],
        };
        assert_eq!(upload.has_allowed_extension(), expected);
    }

    #[test]
    fn enum_string_forms_round_trip() {
        for category in [
            Category::Tool,
            Category::Seed,
            Category::Equipment,
            Category::Livestock,
            Category::Produce,
        ] {
            assert_eq!(Category::from_str_opt(category.as_str()), Some(category));
        }
        for listing_type in [ListingType::Rent, ListingType::Borrow, ListingType::Sell] {
            assert_eq!(
                ListingType::from_str_opt(listing_type.as_str()),
                Some(listing_type)
            );
        }
        assert_eq!(Category::from_str_opt("fertilizer"), None);
    }
}
