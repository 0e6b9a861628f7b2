//! ============================================================================
//! Core Types for the Tilestore Client
//! ============================================================================
//! Wire models for catalog, inventory, wishlist, reservations, users and
//! notifications. Canonical field names are English; the older Spanish
//! spellings (`nombre`, `categoria`, ...) are accepted on input only.
//! ============================================================================

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Catalog
// ============================================================================

/// A specific size/SKU of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "tamano", alias = "medida", default)]
    pub size: String,
    #[serde(alias = "precio", default)]
    pub price: f64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "categoria", default)]
    pub category: String,
    #[serde(alias = "descripcion", default)]
    pub description: String,
    #[serde(alias = "imagenes", default)]
    pub images: Vec<String>,
    #[serde(alias = "etiquetas", default)]
    pub tags: Vec<String>,
    #[serde(alias = "variantes", default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    /// Lowest variant price, for catalog cards
    pub fn price_from(&self) -> Option<f64> {
        self.variants
            .iter()
            .map(|v| v.price)
            .fold(None, |acc, p| Some(acc.map_or(p, |a: f64| a.min(p))))
    }

    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

/// Variant payload for admin product create/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInput {
    pub size: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Admin product create/update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub variants: Vec<VariantInput>,
}

/// Catalog listing filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
}

impl ProductQuery {
    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(format!("page={}", page));
        }
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={}", limit));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(format!("category={}", urlencoding::encode(category)));
        }
        pairs.join("&")
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Server-computed inventory for one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub stock_total: u32,
    #[serde(default)]
    pub stock_retenido: u32,
    #[serde(default)]
    pub stock_disponible: u32,
    #[serde(default)]
    pub disponible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    /// Signed delta applied to stock_total
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryQuantity {
    pub quantity: u32,
}

// ============================================================================
// Wishlist
// ============================================================================

/// Variant snapshot embedded in a wishlist item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistVariant {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "tamano", alias = "medida", default)]
    pub size: String,
    #[serde(alias = "precio", default)]
    pub price: f64,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub stock: u32,
}

fn default_quantity() -> u32 {
    1
}

/// A stored quantity below 1 is read as 1
fn at_least_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(u32::deserialize(deserializer)?.max(1))
}

/// One saved product/variant selection.
/// `available`/`stock` mirror server inventory and are never computed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    #[serde(alias = "itemId")]
    pub item_id: String,
    #[serde(alias = "productId")]
    pub product_id: String,
    #[serde(alias = "variantId")]
    pub variant_id: String,
    #[serde(alias = "nombre", alias = "product_name", default)]
    pub name: String,
    #[serde(alias = "categoria", default)]
    pub category: String,
    #[serde(alias = "imagen", default)]
    pub image: Option<String>,
    #[serde(default)]
    pub variant: Option<WishlistVariant>,
    #[serde(
        alias = "cantidad",
        default = "default_quantity",
        deserialize_with = "at_least_one"
    )]
    pub quantity: u32,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub stock: u32,
    #[serde(alias = "addedAt", default)]
    pub added_at: Option<String>,
}

/// Clamp a requested quantity to `[1, stock]` (`[1, 1]` when out of stock)
pub fn clamp_quantity(requested: u32, stock: u32) -> u32 {
    requested.clamp(1, stock.max(1))
}

impl WishlistItem {
    /// Eligible for reservation at the last known snapshot
    pub fn is_reservable(&self) -> bool {
        self.available && self.quantity >= 1 && self.stock >= self.quantity
    }

    /// Apply a user-edited quantity, clamped to the known stock
    pub fn set_quantity(&mut self, requested: u32) -> u32 {
        self.quantity = clamp_quantity(requested, self.stock);
        self.quantity
    }

    pub fn unit_price(&self) -> Option<f64> {
        self.variant.as_ref().map(|v| v.price)
    }

    pub fn size(&self) -> &str {
        self.variant.as_ref().map(|v| v.size.as_str()).unwrap_or("-")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWishlistItem {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWishlistItem {
    pub quantity: u32,
}

/// One line of a wishlist conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertItem {
    pub item_id: String,
    pub quantity: u32,
}

/// Body of `POST /api/wishlist/convert-to-reservation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub items: Vec<ConvertItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// What the server said about a conversion
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub reservation: Option<Reservation>,
    pub message: Option<String>,
}

impl ConvertOutcome {
    /// Accepts either a bare reservation or `{reservation, message}`
    pub fn from_value(value: serde_json::Value) -> Self {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from);

        let reservation = value
            .get("reservation")
            .cloned()
            .and_then(|r| serde_json::from_value::<Reservation>(r).ok())
            .or_else(|| serde_json::from_value::<Reservation>(value).ok());

        Self { reservation, message }
    }
}

// ============================================================================
// Reservations
// ============================================================================

/// Server-owned reservation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationState {
    Pendiente,
    Aprobada,
    Rechazada,
    Cancelada,
    Expirada,
    /// Anything the server sends that we do not know about
    Unknown,
}

impl ReservationState {
    pub const ALL: [ReservationState; 5] = [
        ReservationState::Pendiente,
        ReservationState::Aprobada,
        ReservationState::Rechazada,
        ReservationState::Cancelada,
        ReservationState::Expirada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Pendiente => "Pendiente",
            ReservationState::Aprobada => "Aprobada",
            ReservationState::Rechazada => "Rechazada",
            ReservationState::Cancelada => "Cancelada",
            ReservationState::Expirada => "Expirada",
            ReservationState::Unknown => "Desconocido",
        }
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" | "pending" => Ok(ReservationState::Pendiente),
            "aprobada" | "approved" => Ok(ReservationState::Aprobada),
            "rechazada" | "rejected" => Ok(ReservationState::Rechazada),
            "cancelada" | "cancelled" | "canceled" => Ok(ReservationState::Cancelada),
            "expirada" | "expired" => Ok(ReservationState::Expirada),
            _ => Err(format!(
                "Unknown reservation state '{}'. Valid values: pendiente, aprobada, rechazada, cancelada, expirada",
                s
            )),
        }
    }
}

impl Serialize for ReservationState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReservationState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(ReservationState::Unknown))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationItem {
    pub variant_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub variant_name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<ReservationItem>,
    #[serde(alias = "estado")]
    pub state: ReservationState,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl Reservation {
    pub fn total_units(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// One line of a direct "reserve now" request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLine {
    pub variant_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub items: Vec<ReservationLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Admin approve/reject body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Which reservation list a view renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationScope {
    /// `GET /api/reservations/my`
    Mine,
    /// `GET /api/reservations/` (admin), optionally filtered by state
    All { state: Option<ReservationState> },
}

// ============================================================================
// Users & Auth
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[serde(alias = "user", alias = "customer")]
    Cliente,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cliente => "cliente",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cliente" | "user" | "customer" => Ok(Role::Cliente),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role '{}'. Valid values: cliente, admin", s)),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub email: String,
    #[serde(alias = "nombre", default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Admin user update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

/// Login/register/refresh answer
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Notifications (admin bell)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(alias = "mensaje", default)]
    pub message: String,
    #[serde(alias = "type", alias = "tipo", default)]
    pub kind: String,
    #[serde(alias = "leida", default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub reservation_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unread", alias = "unread_count")]
    pub count: u64,
}

// ============================================================================
// List envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct Wrapped<T> {
    #[serde(
        alias = "products",
        alias = "reservations",
        alias = "users",
        alias = "notifications",
        alias = "data"
    )]
    items: Vec<T>,
}

/// List endpoints answer either `[...]` or `{items: [...]}` (or a named key)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

impl<T> ListBody<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) => items,
            ListBody::Wrapped(w) => w.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wishlist_item(id: &str, available: bool, stock: u32, quantity: u32) -> WishlistItem {
        WishlistItem {
            item_id: id.into(),
            product_id: format!("p-{}", id),
            variant_id: format!("v-{}", id),
            name: "Porcelánico Roble".into(),
            category: "Pisos".into(),
            image: None,
            variant: None,
            quantity,
            available,
            stock,
            added_at: None,
        }
    }

    #[test]
    fn test_product_accepts_legacy_spanish_fields() {
        let json = serde_json::json!({
            "_id": "p1",
            "nombre": "Cerámica Gris",
            "categoria": "Azulejos",
            "variantes": [{ "_id": "v1", "tamano": "60x60", "precio": 19.5 }]
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.name, "Cerámica Gris");
        assert_eq!(product.category, "Azulejos");
        assert_eq!(product.variants[0].size, "60x60");
        assert_eq!(product.price_from(), Some(19.5));

        let out = serde_json::to_value(&product).unwrap();
        assert!(out.get("name").is_some());
        assert!(out.get("nombre").is_none());
    }

    #[test]
    fn test_wishlist_item_accepts_camel_case() {
        let json = serde_json::json!({
            "itemId": "a",
            "productId": "p",
            "variantId": "v",
            "name": "Tile",
            "quantity": 3,
            "available": true,
            "stock": 5,
            "addedAt": "2026-01-01T00:00:00Z"
        });
        let item: WishlistItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.item_id, "a");
        assert_eq!(item.quantity, 3);
        assert!(item.is_reservable());
    }

    #[test]
    fn test_zero_quantity_normalized_on_read() {
        let item: WishlistItem = serde_json::from_value(serde_json::json!({
            "itemId": "z",
            "productId": "p",
            "variantId": "v",
            "quantity": 0,
            "available": true,
            "stock": 5
        }))
        .unwrap();
        assert_eq!(item.quantity, 1);
        assert!(item.is_reservable());

        // constructed in code, never normalized
        assert!(!wishlist_item("z", true, 5, 0).is_reservable());
    }

    #[test]
    fn test_wishlist_item_with_mongo_id_and_item_id() {
        let item: WishlistItem = serde_json::from_value(serde_json::json!({
            "_id": "665f0c",
            "item_id": "a",
            "product_id": "p",
            "variant_id": "v",
            "quantity": 2,
            "available": true,
            "stock": 3
        }))
        .unwrap();
        assert_eq!(item.item_id, "a");
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0, 5), 1);
        assert_eq!(clamp_quantity(3, 5), 3);
        assert_eq!(clamp_quantity(9, 5), 5);
        assert_eq!(clamp_quantity(4, 0), 1);
    }

    #[test]
    fn test_set_quantity_clamps_to_stock() {
        let mut item = wishlist_item("a", true, 4, 1);
        assert_eq!(item.set_quantity(10), 4);
        assert_eq!(item.set_quantity(0), 1);
    }

    #[test]
    fn test_reservation_state_parsing() {
        let r: Reservation = serde_json::from_value(serde_json::json!({
            "_id": "r1",
            "user_id": "u1",
            "items": [{ "variant_id": "v1", "product_name": "Tile", "variant_name": "30x30", "quantity": 2 }],
            "state": "Aprobada"
        }))
        .unwrap();
        assert_eq!(r.state, ReservationState::Aprobada);
        assert_eq!(r.total_units(), 2);

        let odd: ReservationState = serde_json::from_value(serde_json::json!("Archivada")).unwrap();
        assert_eq!(odd, ReservationState::Unknown);

        assert_eq!("PENDIENTE".parse::<ReservationState>(), Ok(ReservationState::Pendiente));
        assert!("whatever".parse::<ReservationState>().is_err());
    }

    #[test]
    fn test_list_body_shapes() {
        let bare: ListBody<Notification> = serde_json::from_str(r#"[{"_id": "n1", "message": "hola"}]"#).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: ListBody<Notification> =
            serde_json::from_str(r#"{"notifications": [{"_id": "n1"}, {"_id": "n2"}], "total": 2}"#).unwrap();
        assert_eq!(wrapped.into_vec().len(), 2);
    }

    #[test]
    fn test_convert_outcome_shapes() {
        let wrapped = ConvertOutcome::from_value(serde_json::json!({
            "message": "Reserva creada",
            "reservation": { "_id": "r9", "state": "Pendiente" }
        }));
        assert_eq!(wrapped.message.as_deref(), Some("Reserva creada"));
        assert_eq!(wrapped.reservation.map(|r| r.id), Some("r9".to_string()));

        let bare = ConvertOutcome::from_value(serde_json::json!({ "_id": "r1", "state": "Pendiente" }));
        assert!(bare.reservation.is_some());
        assert!(bare.message.is_none());
    }

    #[test]
    fn test_product_query_string() {
        let q = ProductQuery {
            page: Some(2),
            limit: Some(20),
            category: Some("Pisos de madera".into()),
        };
        assert_eq!(q.to_query_string(), "page=2&limit=20&category=Pisos%20de%20madera");
        assert_eq!(ProductQuery::default().to_query_string(), "");
    }

    #[test]
    fn test_auth_response_flattens_tokens() {
        let resp: AuthResponse = serde_json::from_value(serde_json::json!({
            "access_token": "abc",
            "refresh_token": "def",
            "user": { "_id": "u1", "email": "a@b.com", "role": "admin" }
        }))
        .unwrap();
        assert_eq!(resp.tokens.access_token, "abc");
        assert_eq!(resp.tokens.token_type, "bearer");
        assert!(resp.user.unwrap().role.is_admin());
    }
}
