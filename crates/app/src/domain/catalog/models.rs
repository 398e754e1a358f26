//! Catalog Models
//!
//! Read-only views of the catalog. Products, brands and categories are
//! administered elsewhere; the cart engine only consumes them.

use jiff::Timestamp;
use smallvec::SmallVec;

use crate::uuids::TypedUuid;

/// Marker for product identifiers.
#[derive(Debug)]
pub struct Product;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Marker for brand identifiers.
#[derive(Debug)]
pub struct Brand;

/// Brand UUID
pub type BrandUuid = TypedUuid<Brand>;

/// Marker for category identifiers.
#[derive(Debug)]
pub struct Category;

/// Category UUID
pub type CategoryUuid = TypedUuid<Category>;

/// Subproduct UUID
pub type SubproductUuid = TypedUuid<Subproduct>;

/// A purchasable variant of a product, carrying its own price and stock.
#[derive(Debug, Clone)]
pub struct Subproduct {
    pub uuid: SubproductUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    pub price: u64,
    pub stock: u32,
    pub available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Subproduct {
    /// Whether `quantity` units can be bought right now: the variant is
    /// enabled and has that much stock.
    #[must_use]
    pub const fn is_purchasable(&self, quantity: u32) -> bool {
        self.available && self.stock >= quantity
    }
}

/// A subproduct joined with the catalog identifiers deals can be scoped to.
#[derive(Debug, Clone)]
pub struct CatalogLine {
    pub subproduct_uuid: SubproductUuid,
    pub product_uuid: ProductUuid,
    pub brand_uuid: Option<BrandUuid>,
    pub categories: SmallVec<[CategoryUuid; 4]>,
    pub name: String,
    pub price: u64,
    pub stock: u32,
    pub available: bool,
}
