use crate::core::reader;
use crate::core::wait::WaitPolicy;
use crate::domain::locator::{Locator, Selector};
use crate::domain::model::{CartLine, CountReading, DomainState, LineRef, Money, PanelState};
use crate::domain::ports::{ElementHandle, StateQuery, UiDriver};
use crate::utils::error::{HarnessError, Result};
use std::sync::Arc;
use std::time::Instant;

/// Where the cart panel's parts live in the document. Child selectors are resolved
/// inside `panel`.
#[derive(Debug, Clone)]
pub struct CartSelectors {
    pub panel: Locator,
    pub open_marker: Selector,
    pub toggle: Selector,
    pub subtotal: Selector,
    pub line: Selector,
    pub line_name: Selector,
    pub remove: Selector,
    pub increment: Selector,
    pub decrement: Selector,
    pub checkout: Selector,
    /// Glyph rendered right before the item count in the panel header.
    pub marker_glyph: String,
}

impl Default for CartSelectors {
    fn default() -> Self {
        Self {
            panel: Locator::new(Selector::class("cart")),
            open_marker: Selector::exact_text("SUBTOTAL"),
            toggle: Selector::class("cart-toggle"),
            subtotal: Selector::class("subtotal"),
            line: Selector::class("cart-line"),
            line_name: Selector::class("line-title"),
            remove: Selector::attr_contains("title", "remove product"),
            increment: Selector::button("+"),
            decrement: Selector::button("-"),
            checkout: Selector::button("Checkout"),
            marker_glyph: "X".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Increase,
    Decrease,
}

/// Semantic view of the storefront cart panel.
///
/// Every read and verification opens the panel first, so they can be called from
/// either panel state. `close` is not guarded the way `open` is: it always clicks the
/// toggle.
pub struct CartPanel<D: UiDriver + ?Sized> {
    driver: Arc<D>,
    selectors: CartSelectors,
    wait: WaitPolicy,
}

impl<D: UiDriver + ?Sized> CartPanel<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self::with_selectors(driver, CartSelectors::default())
    }

    pub fn with_selectors(driver: Arc<D>, selectors: CartSelectors) -> Self {
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

    fn in_panel(&self, selector: &Selector) -> Locator {
        self.selectors.panel.clone().find(selector.clone())
    }

    async fn first_visible(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        for handle in self.driver.locate(locator).await? {
            if self.driver.is_visible(&handle).await? {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    async fn eventually_visible(&self, locator: &Locator) -> Result<bool> {
        self.wait
            .until(move || async move { Ok(self.first_visible(locator).await?.is_some()) })
            .await
    }

    async fn click_control(&self, locator: &Locator, what: &str) -> Result<()> {
        let handle = self
            .wait
            .poll(move || self.first_visible(locator))
            .await?
            .ok_or_else(|| {
                HarnessError::PreconditionFailed(format!(
                    "{} is not visible ({})",
                    what, locator
                ))
            })?;
        tracing::debug!("Clicking {} ({})", what, locator);
        self.driver.click(&handle).await
    }

    pub async fn is_open(&self) -> Result<bool> {
        let marker = self.in_panel(&self.selectors.open_marker);
        Ok(self.first_visible(&marker).await?.is_some())
    }

    pub async fn panel_state(&self) -> Result<PanelState> {
        Ok(if self.is_open().await? {
            PanelState::Open
        } else {
            PanelState::Closed
        })
    }

    pub async fn open(&self) -> Result<()> {
        if self.is_open().await? {
            return Ok(());
        }
        let toggle = self.in_panel(&self.selectors.toggle);
        self.click_control(&toggle, "cart toggle").await?;

        if !self.wait.until(move || self.is_open()).await? {
            return Err(HarnessError::AssertionFailed(
                "cart panel did not open after clicking the toggle".to_string(),
            ));
        }
        tracing::debug!("Cart panel opened");
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        let toggle = self.in_panel(&self.selectors.toggle);
        self.click_control(&toggle, "cart toggle").await
    }

    pub async fn verify_product_present(&self, name: &str) -> Result<()> {
        self.open().await?;
        let product = self.in_panel(&Selector::text(name)).first();
        if self.eventually_visible(&product).await? {
            return Ok(());
        }
        Err(HarnessError::AssertionFailed(format!(
            "product '{}' is not visible in the cart",
            name
        )))
    }

    /// Passes when any line shows exactly `Quantity: {expected}`; it cannot tell which.
    pub async fn verify_quantity_text(&self, expected: u32) -> Result<()> {
        self.open().await?;
        let text = format!("Quantity: {}", expected);
        let quantity = self.in_panel(&Selector::exact_text(&text));
        if self.eventually_visible(&quantity).await? {
            return Ok(());
        }
        Err(HarnessError::AssertionFailed(format!(
            "no cart line shows '{}'",
            text
        )))
    }

    async fn subtotal_text(&self) -> Result<Option<String>> {
        let region = self.in_panel(&self.selectors.subtotal);
        match self.first_visible(&region).await? {
            Some(handle) => Ok(Some(self.driver.read_text(&handle).await?)),
            None => Ok(None),
        }
    }

    pub async fn verify_subtotal(&self, expected: &Money) -> Result<()> {
        self.open().await?;
        let matched = self
            .wait
            .until(move || async move {
                Ok(self
                    .subtotal_text()
                    .await?
                    .is_some_and(|text| reader::matches_money(&text, expected)))
            })
            .await?;
        if matched {
            return Ok(());
        }
        let shown = self.subtotal_text().await?.unwrap_or_default();
        Err(HarnessError::AssertionFailed(format!(
            "expected subtotal ${} but the subtotal region shows '{}'",
            expected,
            shown.trim()
        )))
    }

    /// Subtotal as currently rendered, if it can be read.
    pub async fn subtotal(&self) -> Result<Option<Money>> {
        self.open().await?;
        Ok(self
            .subtotal_text()
            .await?
            .and_then(|text| reader::extract_money(&text)))
    }

    /// Item count from the driver's structured state when available, otherwise from the
    /// panel header marker.
    pub async fn read_item_count(&self) -> Result<CountReading> {
        self.open().await?;
        if let Some(count) = self.driver.query_state(StateQuery::CartItemCount).await? {
            return Ok(match count {
                0 => CountReading::ConfirmedAbsent,
                n => CountReading::Found(n),
            });
        }

        let marker = reader::cart_marker_pattern(&self.selectors.marker_glyph)?;
        let text = match self.first_visible(&self.selectors.panel).await? {
            Some(panel) => Some(self.driver.read_text(&panel).await?),
            None => None,
        };
        Ok(reader::read_count(text.as_deref(), &marker))
    }

    /// Total units in the cart; `0` also when the count could not be read.
    pub async fn item_count(&self) -> Result<u64> {
        Ok(self.read_item_count().await?.or_zero("cart item count"))
    }

    /// Number of distinct lines, counted from their remove controls.
    pub async fn unique_item_count(&self) -> Result<usize> {
        self.open().await?;
        let remove = self.in_panel(&self.selectors.remove);
        let mut count = 0;
        for handle in self.driver.locate(&remove).await? {
            if self.driver.is_visible(&handle).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Lines in rendered order.
    pub async fn lines(&self) -> Result<Vec<CartLine>> {
        self.open().await?;
        let line = self.in_panel(&self.selectors.line);
        let total = self.driver.locate(&line).await?.len();

        let mut lines = Vec::with_capacity(total);
        for index in 0..total {
            let row = line.clone().nth(index);
            let Some(row_handle) = self.first_visible(&row).await? else {
                continue;
            };
            let row_text = self.driver.read_text(&row_handle).await?;
            let name = match self
                .first_visible(&row.clone().find(self.selectors.line_name.clone()))
                .await?
            {
                Some(handle) => self.driver.read_text(&handle).await?.trim().to_string(),
                None => String::new(),
            };
            let quantity = reader::extract_quantity(&row_text).ok_or_else(|| {
                HarnessError::AssertionFailed(format!("cart line {} shows no quantity", index))
            })?;
            lines.push(CartLine { name, quantity });
        }
        Ok(lines)
    }

    /// Typed snapshot of the cart. When the header count is unreadable the line
    /// quantities stand in for it.
    pub async fn state(&self) -> Result<DomainState> {
        let lines = self.lines().await?;
        let unique_line_count = self.unique_item_count().await?;
        let subtotal = self.subtotal().await?.ok_or_else(|| {
            HarnessError::AssertionFailed("cart subtotal is not readable".to_string())
        })?;
        let quantity_total: u64 = lines.iter().map(|l| u64::from(l.quantity)).sum();
        let item_count = match self.read_item_count().await? {
            CountReading::Found(n) => n,
            CountReading::ConfirmedAbsent => 0,
            CountReading::ExtractionFailed(reason) => {
                tracing::warn!(
                    "Cart count unreadable ({}); using line quantities ({})",
                    reason,
                    quantity_total
                );
                quantity_total
            }
        };

        Ok(DomainState {
            item_count,
            unique_line_count,
            subtotal,
            lines,
        })
    }

    fn adjustment_control(&self, line: &LineRef, adjustment: Adjustment) -> Locator {
        let control = match adjustment {
            Adjustment::Increase => self.selectors.increment.clone(),
            Adjustment::Decrease => self.selectors.decrement.clone(),
        };
        match line {
            LineRef::Position(index) => self.in_panel(&control).nth(*index),
            LineRef::Product(name) => self
                .in_panel(&self.selectors.line)
                .has(Locator::new(self.selectors.line_name.clone()).text_is(name))
                .first()
                .find(control),
        }
    }

    async fn adjust(&self, line: &LineRef, adjustment: Adjustment) -> Result<()> {
        self.open().await?;
        let control = self.adjustment_control(line, adjustment);
        let what = match adjustment {
            Adjustment::Increase => format!("increase control of {}", line),
            Adjustment::Decrease => format!("decrease control of {}", line),
        };
        self.click_control(&control, &what).await
    }

    /// Clicks the `index`-th increase control in document order, which is insertion order.
    pub async fn increase_quantity(&self, index: usize) -> Result<()> {
        self.adjust(&LineRef::Position(index), Adjustment::Increase).await
    }

    pub async fn decrease_quantity(&self, index: usize) -> Result<()> {
        self.adjust(&LineRef::Position(index), Adjustment::Decrease).await
    }

    pub async fn increase_line_quantity(&self, line: &LineRef) -> Result<()> {
        self.adjust(line, Adjustment::Increase).await
    }

    pub async fn decrease_line_quantity(&self, line: &LineRef) -> Result<()> {
        self.adjust(line, Adjustment::Decrease).await
    }

    /// Clicks checkout without looking at the confirmation it raises.
    pub async fn proceed_to_checkout(&self) -> Result<()> {
        self.open().await?;
        let checkout = self.in_panel(&self.selectors.checkout);
        self.click_control(&checkout, "checkout button").await
    }

    /// Listens for the checkout confirmation, triggers it, accepts it and returns its message.
    pub async fn checkout_and_confirm(&self) -> Result<String> {
        let mut confirmations = self.driver.on_confirmation().await?;
        self.proceed_to_checkout().await?;

        let started = Instant::now();
        match tokio::time::timeout(self.wait.timeout, confirmations.recv()).await {
            Ok(Some(confirmation)) => {
                let message = confirmation.accept();
                tracing::debug!("Accepted checkout confirmation: {}", message);
                Ok(message)
            }
            Ok(None) => Err(HarnessError::AssertionFailed(
                "confirmation channel closed before checkout raised a message".to_string(),
            )),
            Err(_) => Err(HarnessError::Timeout {
                what: "checkout confirmation".to_string(),
                elapsed_ms: started.elapsed().as_millis(),
            }),
        }
    }
}
