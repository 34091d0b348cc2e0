//! Diesel table definitions shared by both database backends.
//!
//! Column types are deliberately portable (TEXT identifiers, TIMESTAMP,
//! DOUBLE PRECISION) so the same definitions serve PostgreSQL and the
//! embedded SQLite fallback. They must match `migrations/` exactly.

diesel::table! {
    /// Registered farmers, keyed by UUID stored in text form.
    users (id) {
        id -> Text,
        /// Identity-provider subject; unique, immutable.
        subject -> Text,
        display_name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        location -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    /// Marketplace listings.
    listings (id) {
        id -> Text,
        owner_id -> Text,
        title -> Text,
        description -> Text,
        /// Stable string form of the category enum.
        category -> Text,
        /// Stable string form of the listing type enum (rent/borrow/sell).
        listing_type -> Text,
        /// Present for rent/sell, NULL for borrow.
        price -> Nullable<Double>,
        /// Opaque image locator from the configured store.
        image_locator -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamp,
    }
}

diesel::joinable!(listings -> users (owner_id));
diesel::allow_tables_to_appear_in_same_query!(listings, users);
