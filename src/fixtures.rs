//! Expected storefront catalogue data and canned carts used by scenarios.

use crate::domain::model::{Money, ProductData};

pub const EXPECTED_PRODUCT_COUNT: u64 = 16;
pub const SIZES: [&str; 7] = ["XS", "S", "M", "ML", "L", "XL", "XXL"];
pub const EMPTY_CART_MESSAGE: &str = "Add some product in the cart!";
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/jeffersonRibeiro/react-shopping-cart";

/// The products whose names, prices and sizes scenarios assert on, in catalogue order.
pub fn expected_products() -> Vec<ProductData> {
    vec![
        ProductData::new("Cropped Stay Groovy off white", Money::new(10, 90), &["L", "XL", "XXL"]),
        ProductData::new("Basic cactus White T-shirt", Money::new(13, 25), &["ML", "L"]),
        ProductData::new("Skater Black Sweatshirt", Money::new(25, 90), &["XL"]),
        ProductData::new("Black Tule Oversized", Money::new(13, 25), &["M", "ML"]),
        ProductData::new("Black Batman T-shirt", Money::new(10, 90), &["XS", "S"]),
        ProductData::new("Blue T-Shirt", Money::new(9, 0), &["L", "XL"]),
        ProductData::new("Loose Black T-shirt", Money::new(14, 0), &["L", "XL", "XXL"]),
        ProductData::new("Ringer Hall Pass", Money::new(10, 90), &["L", "XL", "XXL"]),
    ]
}

/// The whole catalogue: the expected products first, then the rest of the range.
pub fn full_catalogue() -> Vec<ProductData> {
    let mut products = expected_products();
    products.extend([
        ProductData::new("Danger Knife Grey", Money::new(14, 90), &["XS", "S", "M"]),
        ProductData::new("White DGK Script Tee", Money::new(14, 90), &["S", "M"]),
        ProductData::new("Born On The Streets", Money::new(25, 90), &["XL", "XXL"]),
        ProductData::new("Tso 3D Short Sleeve T-Shirt A", Money::new(10, 90), &["XS", "L"]),
        ProductData::new("Man Tie Dye Cinza Grey", Money::new(49, 0), &["M", "ML", "L"]),
        ProductData::new("Crazy Monkey Black", Money::new(22, 50), &["S", "M", "L"]),
        ProductData::new("Tso 3D Black T-Shirt", Money::new(18, 70), &["L", "XL"]),
        ProductData::new("Crazy Monkey Grey", Money::new(134, 90), &["XXL"]),
    ]);
    products
}

/// Products that carry any of the given sizes, in catalogue order.
pub fn products_for_sizes<'a>(catalogue: &'a [ProductData], sizes: &[&str]) -> Vec<&'a ProductData> {
    catalogue
        .iter()
        .filter(|p| sizes.iter().any(|s| p.has_size(s)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct CartItem {
    pub product: ProductData,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct TestCart {
    pub items: Vec<CartItem>,
    pub expected_subtotal: Money,
}

impl TestCart {
    fn of(items: Vec<(ProductData, u32)>) -> Self {
        let items: Vec<CartItem> = items
            .into_iter()
            .map(|(product, quantity)| CartItem { product, quantity })
            .collect();
        let expected_subtotal: Money = items.iter().map(|i| i.product.price * i.quantity).sum();
        Self {
            items,
            expected_subtotal,
        }
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// One unit of the first catalogue product.
    pub fn single_item() -> Self {
        Self::of(vec![(expected_products()[0].clone(), 1)])
    }

    /// Two units of the first catalogue product.
    pub fn double_quantity() -> Self {
        Self::of(vec![(expected_products()[0].clone(), 2)])
    }

    /// Two units each of the first two catalogue products.
    pub fn double_item_double_quantity() -> Self {
        let products = expected_products();
        Self::of(vec![(products[0].clone(), 2), (products[1].clone(), 2)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_has_expected_size() {
        let catalogue = full_catalogue();
        assert_eq!(catalogue.len() as u64, EXPECTED_PRODUCT_COUNT);
        assert!(catalogue
            .iter()
            .all(|p| p.sizes.iter().all(|s| SIZES.contains(&s.as_str()))));
    }

    #[test]
    fn test_canned_cart_subtotals() {
        assert_eq!(TestCart::single_item().expected_subtotal.to_string(), "10.90");
        assert_eq!(TestCart::double_quantity().expected_subtotal.to_string(), "21.80");
        let cart = TestCart::double_item_double_quantity();
        assert_eq!(cart.expected_subtotal.to_string(), "48.30");
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_products_for_sizes_is_a_union() {
        let catalogue = expected_products();
        let xs = products_for_sizes(&catalogue, &["XS"]);
        assert_eq!(xs.len(), 1);
        assert_eq!(xs[0].name, "Black Batman T-shirt");

        let xs_or_m = products_for_sizes(&catalogue, &["XS", "M"]);
        assert_eq!(xs_or_m.len(), 2);
    }
}
