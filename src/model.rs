use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use derive_builder::Builder;
use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;

/// Scraping site a listing originates from.
///
/// `(source, external_id)` is the only identity a listing has. URLs are
/// not unique — sites reissue them — so they never participate in
/// identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Immobiliare,
    Idealista,
    Subito,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Immobiliare, Source::Idealista, Source::Subito];

    /// Parses a payload source string. Returns `None` for unrecognized
    /// sites; ingestion turns that into a validation error.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "immobiliare" => Some(Source::Immobiliare),
            "idealista" => Some(Source::Idealista),
            "subito" => Some(Source::Subito),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Immobiliare => "immobiliare",
            Source::Idealista => "idealista",
            Source::Subito => "subito",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scraped property ad as stored.
///
/// Tri-state amenity flags are `Option<bool>`: `None` means the scraper
/// could not determine the value, which is distinct from `false` and
/// never defaulted. The three floor fields are derived once at upsert
/// time from the raw floor string.
#[derive(FromRow, Serialize, Clone, Debug)]
pub struct ListingModel {
    pub id: i64,
    pub source: Source,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub city: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    /// Canonical property type after synonym normalization.
    pub property_type: Option<String>,
    /// Raw scraped property type string, kept for audit.
    pub property_type_raw: Option<String>,
    pub rooms: Option<f64>,
    pub area: Option<f64>,
    pub year_built: Option<i64>,
    pub floor_raw: Option<String>,
    pub floor_number: Option<i64>,
    pub total_floors: Option<i64>,
    pub is_first_floor: Option<bool>,
    pub is_top_floor: Option<bool>,
    pub renovation: Option<String>,
    pub furnished: Option<bool>,
    pub pets_allowed: Option<bool>,
    pub children_friendly: Option<bool>,
    pub agency_commission: Option<bool>,
    pub park_nearby: Option<bool>,
    pub noisy_roads_nearby: Option<bool>,
    pub is_active: bool,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw ingestion payload produced by a scraper.
///
/// Only `source`, `external_id`, `url`, `title` and `city` are required;
/// everything else is optional and stored as unknown when absent.
#[derive(Deserialize, Default, Clone, Debug)]
pub struct ListingPayload {
    pub source: String,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub city: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub rooms: Option<f64>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub year_built: Option<i64>,
    /// Raw floor string as scraped, e.g. "3", "attico", "piano terra".
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub total_floors: Option<i64>,
    #[serde(default)]
    pub renovation: Option<String>,
    #[serde(default)]
    pub furnished: Option<bool>,
    #[serde(default)]
    pub pets_allowed: Option<bool>,
    #[serde(default)]
    pub children_friendly: Option<bool>,
    #[serde(default)]
    pub agency_commission: Option<bool>,
    #[serde(default)]
    pub park_nearby: Option<bool>,
    #[serde(default)]
    pub noisy_roads_nearby: Option<bool>,
}

/// Normalized listing row ready for the store, identity plus derived
/// fields resolved. Produced by `ListingService::ingest`.
#[derive(Clone, Debug)]
pub struct NewListing {
    pub source: Source,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub city: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub property_type: Option<String>,
    pub property_type_raw: Option<String>,
    pub rooms: Option<f64>,
    pub area: Option<f64>,
    pub year_built: Option<i64>,
    pub floor_raw: Option<String>,
    pub floor_number: Option<i64>,
    pub total_floors: Option<i64>,
    pub is_first_floor: Option<bool>,
    pub is_top_floor: Option<bool>,
    pub renovation: Option<String>,
    pub furnished: Option<bool>,
    pub pets_allowed: Option<bool>,
    pub children_friendly: Option<bool>,
    pub agency_commission: Option<bool>,
    pub park_nearby: Option<bool>,
    pub noisy_roads_nearby: Option<bool>,
}

/// Inclusive numeric bound pair. Both bounds optional; a fully unset
/// range constrains nothing.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RangeCriterion<T> {
    #[serde(default)]
    pub min: Option<T>,
    #[serde(default)]
    pub max: Option<T>,
}

impl<T> Default for RangeCriterion<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl<T: PartialOrd + Copy> RangeCriterion<T> {
    pub fn min(value: T) -> Self {
        Self {
            min: Some(value),
            max: None,
        }
    }

    pub fn max(value: T) -> Self {
        Self {
            min: None,
            max: Some(value),
        }
    }

    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// `false` only when both bounds are present and inverted. Filters
    /// with inconsistent bounds never match instead of erroring, so a
    /// single bad legacy row cannot take down a whole cycle.
    pub fn is_consistent(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }

    /// Unconstrained ranges accept everything, unknown values included.
    /// Once either bound is set, an unknown listing value is rejected.
    pub fn accepts(&self, value: Option<T>) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Floor classification a filter can request. A selected set is a
/// disjunction: the listing passes if any one category is satisfied.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FloorCategory {
    NotFirst,
    NotLast,
    NotFirstNotLast,
    OnlyLast,
}

/// Saved-search criteria, one typed optional field per constraint kind.
///
/// Every field left at its default constrains nothing. Tri-state
/// requests are only applied when explicitly `Some(true)`.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct FilterCriteria {
    #[serde(default)]
    pub price: RangeCriterion<f64>,
    #[serde(default)]
    pub rooms: RangeCriterion<f64>,
    #[serde(default)]
    pub area: RangeCriterion<f64>,
    #[serde(default)]
    pub year_built: RangeCriterion<i64>,
    #[serde(default)]
    pub floor: RangeCriterion<i64>,
    #[serde(default)]
    pub total_floors: RangeCriterion<i64>,
    /// Case-insensitive substring match against the listing city.
    #[serde(default)]
    pub city: Option<String>,
    /// Expanded through the synonym table before comparison.
    #[serde(default)]
    pub property_types: Vec<String>,
    #[serde(default)]
    pub renovation_types: Vec<String>,
    #[serde(default)]
    pub floor_categories: Vec<FloorCategory>,
    /// Opt-in exclusion family: the listing passes unless explicitly false.
    #[serde(default)]
    pub furnished: Option<bool>,
    #[serde(default)]
    pub pets_allowed: Option<bool>,
    #[serde(default)]
    pub children_allowed: Option<bool>,
    #[serde(default)]
    pub park_nearby: Option<bool>,
    /// Strict family: the listing attribute must be explicitly false.
    #[serde(default)]
    pub no_commission: Option<bool>,
    #[serde(default)]
    pub no_noisy_roads: Option<bool>,
}

impl FilterCriteria {
    pub fn ranges(&self) -> [RangeCriterion<f64>; 3] {
        [self.price, self.rooms, self.area]
    }

    pub fn integer_ranges(&self) -> [RangeCriterion<i64>; 3] {
        [self.year_built, self.floor, self.total_floors]
    }

    pub fn is_consistent(&self) -> bool {
        self.ranges().iter().all(RangeCriterion::is_consistent)
            && self
                .integer_ranges()
                .iter()
                .all(RangeCriterion::is_consistent)
    }
}

/// A saved search owned by exactly one user.
#[derive(FromRow, Serialize, Clone, Debug)]
pub struct FilterModel {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub criteria: sqlx::types::Json<FilterCriteria>,
    pub is_active: bool,
    pub notification_enabled: bool,
    /// Cooldown window in hours, valid range 1..=168.
    pub notification_frequency_hours: i64,
    pub last_notification_sent: Option<DateTime<Utc>>,
}

/// Throttle state of a filter relative to its cooldown window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// Inactive or notifications disabled; never processed.
    Dormant,
    /// Due for a notification pass this cycle.
    Eligible,
    /// Active and enabled, but inside the frequency window.
    Cooling,
}

impl FilterModel {
    pub fn state(&self, now: DateTime<Utc>) -> FilterState {
        if !self.is_active || !self.notification_enabled {
            return FilterState::Dormant;
        }
        match self.last_notification_sent {
            None => FilterState::Eligible,
            Some(sent_at) => {
                if now - sent_at >= Duration::hours(self.notification_frequency_hours) {
                    FilterState::Eligible
                } else {
                    FilterState::Cooling
                }
            }
        }
    }
}

/// Input for filter creation, validated by `FilterService`.
#[derive(Builder, Clone, Debug)]
#[builder(pattern = "immutable")]
pub struct NewFilter {
    pub user_id: i64,
    pub name: String,
    #[builder(default)]
    pub criteria: FilterCriteria,
    #[builder(default = "24")]
    pub notification_frequency_hours: i64,
}

/// Ledger entry proving a notification for a (user, listing) pair went
/// out. At most one row exists per pair; this is the dedup invariant.
#[derive(FromRow, Serialize, Clone, Debug)]
pub struct DeliveryRecordModel {
    pub id: i64,
    pub user_id: i64,
    pub listing_id: i64,
    /// Filter that triggered the delivery, kept for audit only.
    pub filter_id: Option<i64>,
    pub sent_at: DateTime<Utc>,
}

/// Delivery channels a user has configured. Opaque to the core; read
/// when building dispatch requests and passed through unchanged.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct ChannelPreferences {
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

/// External user entity surface: id plus channel preferences.
#[derive(FromRow, Serialize, Deserialize, Clone, Debug)]
pub struct UserModel {
    pub id: i64,
    pub channel_preferences: sqlx::types::Json<ChannelPreferences>,
}

/// Delivery request handed to the dispatch gateway.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DispatchRequest {
    pub user_id: i64,
    pub listing_id: i64,
    pub filter_id: i64,
    pub channel_preferences: ChannelPreferences,
}
