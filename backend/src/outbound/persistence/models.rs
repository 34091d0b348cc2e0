//! Row structs and domain mapping shared by both repository backends.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::listing::{
    Category, Listing, ListingId, ListingStatus, ListingType, Locator,
};
use crate::domain::user::{User, UserId, UserProfile};

use super::schema::{listings, users};

/// A `users` row in storage form.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserRow {
    pub id: String,
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            subject: user.subject.clone(),
            display_name: user.profile.display_name.clone(),
            email: user.profile.email.clone(),
            phone: user.profile.phone.clone(),
            location: user.profile.location.clone(),
            created_at: user.created_at,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = UserId::parse(&row.id).map_err(|err| format!("user id {}: {err}", row.id))?;
        Ok(Self {
            id,
            subject: row.subject,
            profile: UserProfile {
                display_name: row.display_name,
                email: row.email,
                phone: row.phone,
                location: row.location,
            },
            created_at: row.created_at,
        })
    }
}

/// Profile fields written by `update_profile`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct ProfileChangeset {
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

impl From<&UserProfile> for ProfileChangeset {
    fn from(profile: &UserProfile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            location: profile.location.clone(),
        }
    }
}

/// A `listings` row in storage form.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = listings)]
#[diesel(treat_none_as_null = true)]
pub struct ListingRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub listing_type: String,
    pub price: Option<f64>,
    pub image_locator: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl From<&Listing> for ListingRow {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id.to_string(),
            owner_id: listing.owner.to_string(),
            title: listing.title.clone(),
            description: listing.description.clone(),
            category: listing.category.as_str().to_owned(),
            listing_type: listing.listing_type.as_str().to_owned(),
            price: listing.price,
            image_locator: listing
                .image
                .as_ref()
                .map(|locator| locator.as_ref().to_owned()),
            status: listing.status.as_str().to_owned(),
            created_at: listing.created_at,
        }
    }
}

impl TryFrom<ListingRow> for Listing {
    type Error = String;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let id =
            ListingId::parse(&row.id).map_err(|err| format!("listing id {}: {err}", row.id))?;
        let owner = UserId::parse(&row.owner_id)
            .map_err(|err| format!("owner id {}: {err}", row.owner_id))?;
        let category = Category::from_str_opt(&row.category)
            .ok_or_else(|| format!("unknown category {}", row.category))?;
        let listing_type = ListingType::from_str_opt(&row.listing_type)
            .ok_or_else(|| format!("unknown listing type {}", row.listing_type))?;
        let status = ListingStatus::from_str_opt(&row.status)
            .ok_or_else(|| format!("unknown status {}", row.status))?;
        Ok(Self {
            id,
            owner,
            title: row.title,
            description: row.description,
            category,
            listing_type,
            price: row.price,
            image: row.image_locator.map(Locator::new),
            status,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing() -> Listing {
        Listing {
            id: ListingId::generate(),
            owner: UserId::generate(),
            title: "Rotavator".to_owned(),
            description: "7-foot rotavator, well maintained".to_owned(),
            category: Category::Equipment,
            listing_type: ListingType::Rent,
            price: Some(1200.0),
            image: Some(Locator::new("uploads/rotavator.jpg")),
            status: ListingStatus::Active,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn listing_round_trips_through_row_form() {
        let original = listing();
        let row = ListingRow::from(&original);
        let restored = Listing::try_from(row).expect("row maps back");
        assert_eq!(restored, original);
    }

    #[test]
    fn corrupt_listing_type_is_rejected() {
        let mut row = ListingRow::from(&listing());
        row.listing_type = "lease".to_owned();
        assert!(Listing::try_from(row).is_err());
    }

    #[test]
    fn corrupt_id_is_rejected() {
        let mut row = ListingRow::from(&listing());
        row.id = "not-a-uuid".to_owned();
        assert!(Listing::try_from(row).is_err());
    }
}
