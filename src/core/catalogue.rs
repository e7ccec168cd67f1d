use crate::core::reader;
use crate::core::wait::WaitPolicy;
use crate::domain::locator::{Locator, Role, Selector};
use crate::domain::model::{CountReading, Money};
use crate::domain::ports::{ElementHandle, StateQuery, UiDriver};
use crate::utils::error::{HarnessError, Result};
use regex::Regex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CatalogueSelectors {
    pub count_caption: Locator,
    pub size_filters: Locator,
    /// Attribute on each size option holding its label.
    pub size_attribute: String,
    pub size_checkbox: Selector,
    pub product_card: Locator,
    pub product_name: Locator,
    pub add_to_cart: Selector,
}

impl Default for CatalogueSelectors {
    fn default() -> Self {
        Self {
            count_caption: Locator::new(Selector::text("Product(s) found")),
            size_filters: Locator::new(Selector::class("filters")),
            size_attribute: "data-size".to_string(),
            size_checkbox: Selector::attr_equals("type", "checkbox"),
            product_card: Locator::new(Selector::class("product")),
            product_name: Locator::new(Selector::role(Role::Heading)),
            add_to_cart: Selector::button("Add to cart"),
        }
    }
}

/// Boolean attributes read as set when present, whatever the driver reports as the
/// value (`""`, `"checked"`, `"true"`), unless it says `"false"`.
fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().eq_ignore_ascii_case("false"))
}

/// Semantic view of the product catalogue.
pub struct ProductPage<D: UiDriver + ?Sized> {
    driver: Arc<D>,
    selectors: CatalogueSelectors,
    wait: WaitPolicy,
}

impl<D: UiDriver + ?Sized> ProductPage<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self::with_selectors(driver, CatalogueSelectors::default())
    }

    pub fn with_selectors(driver: Arc<D>, selectors: CatalogueSelectors) -> Self {
        Self {
            driver,
            selectors,
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.driver.navigate(url).await
    }

    async fn first_visible(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        for handle in self.driver.locate(locator).await? {
            if self.driver.is_visible(&handle).await? {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    async fn click_control(&self, locator: &Locator, what: &str) -> Result<()> {
        let handle = self
            .wait
            .poll(move || self.first_visible(locator))
            .await?
            .ok_or_else(|| {
                HarnessError::PreconditionFailed(format!("{} is not visible ({})", what, locator))
            })?;
        tracing::debug!("Clicking {} ({})", what, locator);
        self.driver.click(&handle).await
    }

    pub async fn read_product_count(&self) -> Result<CountReading> {
        if let Some(count) = self
            .driver
            .query_state(StateQuery::CatalogueProductCount)
            .await?
        {
            return Ok(match count {
                0 => CountReading::ConfirmedAbsent,
                n => CountReading::Found(n),
            });
        }

        let pattern = Regex::new(reader::PRODUCT_COUNT_PATTERN)?;
        let text = match self.first_visible(&self.selectors.count_caption).await? {
            Some(caption) => Some(self.driver.read_text(&caption).await?),
            None => None,
        };
        Ok(reader::read_count(text.as_deref(), &pattern))
    }

    /// Count from the "N Product(s) found" caption; `0` also when it cannot be read.
    pub async fn product_count(&self) -> Result<u64> {
        Ok(self.read_product_count().await?.or_zero("product count"))
    }

    fn size_option(&self, label: &str) -> Locator {
        self.selectors
            .size_filters
            .clone()
            .find(Selector::attr_equals(&self.selectors.size_attribute, label))
    }

    /// Selects a size filter. Filters accumulate: an already selected size stays selected.
    pub async fn filter_by_size(&self, label: &str) -> Result<()> {
        let option = self.size_option(label);
        let checkbox = option.clone().find(self.selectors.size_checkbox.clone());
        // The checkbox itself is usually visually hidden behind a custom checkmark.
        if let Some(handle) = self.driver.locate(&checkbox).await?.into_iter().next() {
            let checked = self.driver.read_attribute(&handle, "checked").await?;
            if is_set(checked.as_deref()) {
                tracing::debug!("Size filter {} already selected", label);
                return Ok(());
            }
        }
        self.click_control(&option, &format!("size filter '{}'", label))
            .await
    }

    /// Visible heading texts. Assumes every heading on the page is a product name.
    pub async fn product_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for handle in self.driver.locate(&self.selectors.product_name).await? {
            if !self.driver.is_visible(&handle).await? {
                continue;
            }
            let text = self.driver.read_text(&handle).await?;
            let name = text.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    pub async fn verify_price_visible(&self, amount: &Money) -> Result<()> {
        let root = Locator::root();
        let page = &root;
        let visible = self
            .wait
            .until(move || async move {
                Ok(match self.first_visible(page).await? {
                    Some(handle) => {
                        reader::matches_money(&self.driver.read_text(&handle).await?, amount)
                    }
                    None => false,
                })
            })
            .await?;
        if visible {
            return Ok(());
        }
        Err(HarnessError::AssertionFailed(format!(
            "price ${} is not visible on the page",
            amount
        )))
    }

    /// Clicks the `index`-th add-to-cart control in document order.
    pub async fn add_product_to_cart(&self, index: usize) -> Result<()> {
        let button = Locator::root()
            .find(self.selectors.add_to_cart.clone())
            .nth(index);
        self.click_control(&button, &format!("add-to-cart button #{}", index))
            .await
    }

    /// Clicks add-to-cart on the card whose product name is exactly `name`.
    pub async fn add_product_to_cart_by_name(&self, name: &str) -> Result<()> {
        let button = self
            .selectors
            .product_card
            .clone()
            .has(self.selectors.product_name.clone().text_is(name))
            .first()
            .find(self.selectors.add_to_cart.clone());
        self.click_control(&button, &format!("add-to-cart button of '{}'", name))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_attribute_encodings() {
        assert!(is_set(Some("")));
        assert!(is_set(Some("checked")));
        assert!(is_set(Some("true")));
        assert!(!is_set(Some("false")));
        assert!(!is_set(None));
    }
}
