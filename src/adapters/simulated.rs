//! In-memory storefront that implements [`UiDriver`].
//!
//! The document is re-rendered from store state on every query, so element handles are
//! paths into the current render and go stale once a click changes the layout, much as
//! they do in a real browser. Clicks can be delayed to exercise the retrying
//! verifications.

use crate::domain::locator::{AttrMatch, Locator, Role, Selector, Step};
use crate::domain::model::{CartLine, Money, ProductData};
use crate::domain::ports::{
    Confirmation, ConfirmationReceiver, ElementHandle, StateQuery, UiDriver,
};
use crate::fixtures::{self, EMPTY_CART_MESSAGE, SIZES};
use crate::utils::error::{HarnessError, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    ToggleCart,
    ToggleSize(String),
    AddToCart(usize),
    Increment(usize),
    Decrement(usize),
    Remove(usize),
    Checkout,
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: &'static str,
    classes: Vec<&'static str>,
    attrs: Vec<(&'static str, String)>,
    text: String,
    hidden: bool,
    action: Option<Action>,
    children: Vec<Node>,
}

impl Node {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    fn class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn on_click(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    fn role(&self) -> Option<Role> {
        match self.tag {
            "button" => Some(Role::Button),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(Role::Heading),
            "a" if self.attribute("href").is_some() => Some(Role::Link),
            "input" if self.attribute("type") == Some("checkbox") => Some(Role::Checkbox),
            _ => None,
        }
    }

    fn full_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.full_text());
        }
        out
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Tag(tag) => self.tag == tag.as_str(),
            Selector::Class(class) => self.classes.iter().any(|c| *c == class.as_str()),
            Selector::Attribute { name, matcher } => match (self.attribute(name), matcher) {
                (None, _) => false,
                (Some(_), AttrMatch::Exists) => true,
                (Some(value), AttrMatch::Equals(expected)) => value == expected.as_str(),
                (Some(value), AttrMatch::Contains(part)) => value.contains(part.as_str()),
            },
            Selector::Text { text, exact: true } => self.text.trim() == text.as_str(),
            Selector::Text { text, exact: false } => {
                !self.text.is_empty() && self.text.contains(text.as_str())
            }
            Selector::Role { role, name } => {
                self.role() == Some(*role)
                    && name
                        .as_ref()
                        .map_or(true, |n| self.full_text().trim() == n.as_str())
            }
        }
    }

    fn at(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    fn is_visible_at(&self, path: &[usize]) -> bool {
        let mut node = self;
        if node.hidden {
            return false;
        }
        for &index in path {
            match node.children.get(index) {
                Some(child) if !child.hidden => node = child,
                _ => return false,
            }
        }
        true
    }

    fn collect_matches(
        &self,
        path: &mut Vec<usize>,
        selector: &Selector,
        out: &mut BTreeSet<Vec<usize>>,
    ) {
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            if child.matches(selector) {
                out.insert(path.clone());
            }
            child.collect_matches(path, selector, out);
            path.pop();
        }
    }
}

fn resolve(root: &Node, locator: &Locator) -> Vec<Vec<usize>> {
    resolve_from(root, vec![Vec::new()], locator)
}

fn resolve_from(root: &Node, start: Vec<Vec<usize>>, locator: &Locator) -> Vec<Vec<usize>> {
    let mut current = start;
    for step in locator.steps() {
        current = match step {
            Step::Find(selector) => {
                // Paths sort in document order.
                let mut found = BTreeSet::new();
                for path in &current {
                    if let Some(node) = root.at(path) {
                        let mut cursor = path.clone();
                        node.collect_matches(&mut cursor, selector, &mut found);
                    }
                }
                found.into_iter().collect()
            }
            Step::HasText(text) => current
                .into_iter()
                .filter(|path| {
                    root.at(path)
                        .is_some_and(|node| node.full_text().contains(text.as_str()))
                })
                .collect(),
            Step::TextIs(text) => current
                .into_iter()
                .filter(|path| {
                    root.at(path)
                        .is_some_and(|node| node.full_text().trim() == text.as_str())
                })
                .collect(),
            Step::Has(inner) => current
                .into_iter()
                .filter(|path| !resolve_from(root, vec![path.clone()], inner).is_empty())
                .collect(),
            Step::Nth(index) => current.into_iter().nth(*index).into_iter().collect(),
            Step::First => current.into_iter().take(1).collect(),
            Step::Last => current.into_iter().last().into_iter().collect(),
        };
    }
    current
}

fn encode(path: &[usize]) -> ElementHandle {
    let parts: Vec<String> = path.iter().map(|i| i.to_string()).collect();
    ElementHandle(parts.join("/"))
}

fn decode(handle: &ElementHandle) -> Result<Vec<usize>> {
    handle
        .0
        .split('/')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| HarnessError::driver(format!("malformed element handle '{}'", handle.0)))
        })
        .collect()
}

fn money_node(amount: Money) -> Node {
    Node::new("p")
        .child(Node::new("small").text("$"))
        .child(Node::new("b").text(amount.dollars().to_string()))
        .child(Node::new("span").text(format!(".{:02}", amount.cents())))
}

#[derive(Debug)]
struct StoreState {
    url: Option<String>,
    catalogue: Vec<ProductData>,
    selected_sizes: BTreeSet<String>,
    /// (catalogue index, quantity) in insertion order.
    cart: Vec<(usize, u32)>,
    cart_open: bool,
    repository_url: Option<String>,
    expose_state: bool,
    update_delay: Duration,
    pending: Vec<(Instant, Action)>,
    listeners: Vec<mpsc::UnboundedSender<Confirmation>>,
    confirmations: Vec<String>,
    acknowledgements: Vec<oneshot::Receiver<()>>,
    clicks: Vec<String>,
}

impl StoreState {
    fn settle(&mut self) {
        let now = Instant::now();
        while let Some((due, _)) = self.pending.first() {
            if *due > now {
                break;
            }
            let (_, action) = self.pending.remove(0);
            self.apply(action);
        }
    }

    fn visible_products(&self) -> Vec<usize> {
        (0..self.catalogue.len())
            .filter(|&i| {
                self.selected_sizes.is_empty()
                    || self.catalogue[i]
                        .sizes
                        .iter()
                        .any(|s| self.selected_sizes.contains(s))
            })
            .collect()
    }

    fn item_count(&self) -> u64 {
        self.cart.iter().map(|(_, q)| u64::from(*q)).sum()
    }

    fn subtotal(&self) -> Money {
        self.cart
            .iter()
            .map(|(i, q)| self.catalogue[*i].price * *q)
            .sum()
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::ToggleCart => self.cart_open = !self.cart_open,
            Action::ToggleSize(size) => {
                if !self.selected_sizes.remove(&size) {
                    self.selected_sizes.insert(size);
                }
            }
            Action::AddToCart(product) => {
                match self.cart.iter_mut().find(|(p, _)| *p == product) {
                    Some((_, quantity)) => *quantity += 1,
                    None => self.cart.push((product, 1)),
                }
                self.cart_open = true;
            }
            Action::Increment(product) => {
                if let Some((_, quantity)) = self.cart.iter_mut().find(|(p, _)| *p == product) {
                    *quantity += 1;
                }
            }
            Action::Decrement(product) => {
                if let Some((_, quantity)) = self.cart.iter_mut().find(|(p, _)| *p == product) {
                    if *quantity > 1 {
                        *quantity -= 1;
                    }
                }
            }
            Action::Remove(product) => self.cart.retain(|(p, _)| *p != product),
            Action::Checkout => {
                let message = if self.cart.is_empty() {
                    EMPTY_CART_MESSAGE.to_string()
                } else {
                    format!("Checkout - Subtotal: $ {}", self.subtotal())
                };
                self.raise_confirmation(message);
            }
        }
    }

    fn raise_confirmation(&mut self, message: String) {
        self.confirmations.push(message.clone());
        let mut delivered = false;
        let mut live = Vec::with_capacity(self.listeners.len());
        for listener in self.listeners.drain(..) {
            let (confirmation, accepted) = Confirmation::new(message.clone());
            if listener.send(confirmation).is_ok() {
                self.acknowledgements.push(accepted);
                delivered = true;
                live.push(listener);
            }
        }
        self.listeners = live;
        if !delivered {
            tracing::debug!("No confirmation listener; dismissing '{}'", message);
        }
    }

    fn render(&self) -> Node {
        let filters = Node::new("div")
            .class("filters")
            .child(Node::new("p").text("Sizes:"))
            .children(SIZES.iter().map(|size| {
                let mut checkbox = Node::new("input")
                    .attr("type", "checkbox")
                    .attr("value", *size)
                    .hidden();
                // Boolean attribute: present and empty when set, as a browser reports it.
                if self.selected_sizes.contains(*size) {
                    checkbox = checkbox.attr("checked", "");
                }
                Node::new("label")
                    .class("size-option")
                    .attr("data-size", *size)
                    .on_click(Action::ToggleSize(size.to_string()))
                    .child(checkbox)
                    .child(Node::new("span").class("checkmark").text(*size))
            }));

        let visible = self.visible_products();
        let products = Node::new("div").class("products").children(visible.iter().map(|&i| {
            let product = &self.catalogue[i];
            Node::new("div")
                .class("product")
                .attr("data-sku", i.to_string())
                .child(Node::new("h3").class("product-title").text(product.name.clone()))
                .child(money_node(product.price).class("product-price"))
                .child(
                    Node::new("button")
                        .class("add-to-cart")
                        .text("Add to cart")
                        .on_click(Action::AddToCart(i)),
                )
        }));

        let catalogue = Node::new("div")
            .class("catalogue")
            .child(
                Node::new("p")
                    .class("product-count")
                    .text(format!("{} Product(s) found", visible.len())),
            )
            .child(products);

        let mut header = Node::new("header");
        if let Some(url) = &self.repository_url {
            header = header.child(
                Node::new("a")
                    .class("github-link")
                    .attr("href", url.clone())
                    .text("View source"),
            );
        }

        Node::new("div")
            .attr("id", "root")
            .child(header)
            .child(Node::new("main").child(filters).child(catalogue))
            .child(self.render_cart())
    }

    fn badge(&self) -> Node {
        Node::new("span")
            .class("cart-icon")
            .child(Node::new("span").class("badge").text(self.item_count().to_string()))
    }

    fn render_cart(&self) -> Node {
        let toggle = Node::new("button")
            .class("cart-toggle")
            .on_click(Action::ToggleCart);
        let toggle = if self.cart_open {
            toggle.text("X")
        } else {
            toggle.child(self.badge())
        };

        let mut cart = Node::new("div").class("cart").child(toggle);
        if !self.cart_open {
            return cart;
        }

        let lines = if self.cart.is_empty() {
            vec![Node::new("p").class("empty").text("Add some products in the cart :)")]
        } else {
            self.cart
                .iter()
                .map(|&(i, quantity)| {
                    let product = &self.catalogue[i];
                    let mut decrement = Node::new("button")
                        .class("decrement")
                        .text("-")
                        .on_click(Action::Decrement(i));
                    if quantity <= 1 {
                        decrement = decrement.attr("disabled", "true");
                    }
                    Node::new("div")
                        .class("cart-line")
                        .attr("data-sku", i.to_string())
                        .child(
                            Node::new("button")
                                .class("remove")
                                .attr("title", "remove product from cart")
                                .text("X")
                                .on_click(Action::Remove(i)),
                        )
                        .child(Node::new("p").class("line-title").text(product.name.clone()))
                        .child(
                            Node::new("p")
                                .class("line-quantity")
                                .text(format!("Quantity: {}", quantity)),
                        )
                        .child(
                            Node::new("div")
                                .class("line-price")
                                .child(Node::new("p").text(format!("$ {}", product.price)))
                                .child(decrement)
                                .child(
                                    Node::new("button")
                                        .class("increment")
                                        .text("+")
                                        .on_click(Action::Increment(i)),
                                ),
                        )
                })
                .collect()
        };

        cart = cart.child(
            Node::new("div")
                .class("cart-content")
                .child(
                    Node::new("div")
                        .class("cart-header")
                        .child(self.badge())
                        .child(Node::new("span").class("cart-title").text("Cart")),
                )
                .child(Node::new("div").class("cart-lines").children(lines))
                .child(
                    Node::new("div")
                        .class("cart-footer")
                        .child(Node::new("p").class("subtotal-label").text("SUBTOTAL"))
                        .child(
                            Node::new("div").class("subtotal").child(
                                Node::new("p")
                                    .class("subtotal-amount")
                                    .text(format!("$ {}", self.subtotal())),
                            ),
                        )
                        .child(
                            Node::new("button")
                                .class("checkout")
                                .text("Checkout")
                                .on_click(Action::Checkout),
                        ),
                ),
        );
        cart
    }
}

/// Storefront document held in memory; one instance per scenario.
#[derive(Debug)]
pub struct SimulatedStorefront {
    state: Arc<Mutex<StoreState>>,
}

impl Default for SimulatedStorefront {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedStorefront {
    pub fn new() -> Self {
        Self::with_catalogue(fixtures::full_catalogue())
    }

    pub fn with_catalogue(catalogue: Vec<ProductData>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                url: None,
                catalogue,
                selected_sizes: BTreeSet::new(),
                cart: Vec::new(),
                cart_open: false,
                repository_url: Some(fixtures::DEFAULT_REPOSITORY_URL.to_string()),
                expose_state: false,
                update_delay: Duration::ZERO,
                pending: Vec::new(),
                listeners: Vec::new(),
                confirmations: Vec::new(),
                acknowledgements: Vec::new(),
                clicks: Vec::new(),
            })),
        }
    }

    /// Builders run before the store is shared with any background update.
    fn configure(mut self, apply: impl FnOnce(&mut StoreState)) -> Self {
        if let Some(state) = Arc::get_mut(&mut self.state) {
            apply(state.get_mut());
        }
        self
    }

    pub fn with_repository_url(self, url: Option<&str>) -> Self {
        let url = url.map(str::to_string);
        self.configure(|state| state.repository_url = url)
    }

    /// Lets models read counts through [`UiDriver::query_state`].
    pub fn with_state_queries(self, enabled: bool) -> Self {
        self.configure(|state| state.expose_state = enabled)
    }

    /// Applies each click only after `delay`.
    pub fn with_update_delay(self, delay: Duration) -> Self {
        self.configure(|state| state.update_delay = delay)
    }

    pub async fn current_url(&self) -> Option<String> {
        self.state.lock().await.url.clone()
    }

    /// Cart contents straight from the store, bypassing the rendered document.
    pub async fn cart_contents(&self) -> Vec<CartLine> {
        let state = self.state.lock().await;
        state
            .cart
            .iter()
            .map(|&(i, quantity)| CartLine {
                name: state.catalogue[i].name.clone(),
                quantity,
            })
            .collect()
    }

    pub async fn toggle_clicks(&self) -> usize {
        self.state
            .lock()
            .await
            .clicks
            .iter()
            .filter(|c| c.as_str() == "cart-toggle")
            .count()
    }

    /// Messages of every confirmation raised so far, delivered or not.
    pub async fn confirmations(&self) -> Vec<String> {
        self.state.lock().await.confirmations.clone()
    }

    /// Confirmations handed to a listener that have not been accepted yet.
    pub async fn unacknowledged_confirmations(&self) -> usize {
        let mut state = self.state.lock().await;
        state
            .acknowledgements
            .retain_mut(|ack| matches!(ack.try_recv(), Err(oneshot::error::TryRecvError::Empty)));
        state.acknowledgements.len()
    }

    async fn rendered(&self) -> Node {
        let mut state = self.state.lock().await;
        state.settle();
        state.render()
    }
}

#[async_trait]
impl UiDriver for SimulatedStorefront {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.url = Some(url.to_string());
        state.selected_sizes.clear();
        state.cart.clear();
        state.cart_open = false;
        state.pending.clear();
        Ok(())
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let root = self.rendered().await;
        Ok(resolve(&root, locator).iter().map(|p| encode(p)).collect())
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool> {
        let path = decode(handle)?;
        Ok(self.rendered().await.is_visible_at(&path))
    }

    async fn read_text(&self, handle: &ElementHandle) -> Result<String> {
        let path = decode(handle)?;
        let root = self.rendered().await;
        root.at(&path)
            .map(Node::full_text)
            .ok_or_else(|| HarnessError::driver(format!("stale element handle '{}'", handle.0)))
    }

    async fn read_attribute(&self, handle: &ElementHandle, name: &str) -> Result<Option<String>> {
        let path = decode(handle)?;
        let root = self.rendered().await;
        let node = root
            .at(&path)
            .ok_or_else(|| HarnessError::driver(format!("stale element handle '{}'", handle.0)))?;
        Ok(node.attribute(name).map(str::to_string))
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let path = decode(handle)?;
        let mut state = self.state.lock().await;
        state.settle();
        let root = state.render();
        let node = root
            .at(&path)
            .ok_or_else(|| HarnessError::driver(format!("stale element handle '{}'", handle.0)))?;
        if !root.is_visible_at(&path) {
            return Err(HarnessError::driver(format!(
                "element '{}' is not visible",
                handle.0
            )));
        }

        state
            .clicks
            .push(node.classes.first().copied().unwrap_or(node.tag).to_string());
        if node.attribute("disabled") == Some("true") {
            return Ok(());
        }
        let Some(action) = node.action.clone() else {
            return Ok(());
        };
        if state.update_delay.is_zero() {
            state.apply(action);
            return Ok(());
        }

        let due = Instant::now() + state.update_delay;
        state.pending.push((due, action));
        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep_until(tokio::time::Instant::from_std(due)).await;
            shared.lock().await.settle();
        });
        Ok(())
    }

    async fn wait_visible(&self, handle: &ElementHandle, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            if self.is_visible(handle).await? {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(HarnessError::Timeout {
                    what: format!("element '{}' to become visible", handle.0),
                    elapsed_ms: started.elapsed().as_millis(),
                });
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn on_confirmation(&self) -> Result<ConfirmationReceiver> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().await.listeners.push(sender);
        Ok(receiver)
    }

    async fn query_state(&self, query: StateQuery) -> Result<Option<u64>> {
        let mut state = self.state.lock().await;
        if !state.expose_state {
            return Ok(None);
        }
        state.settle();
        Ok(Some(match query {
            StateQuery::CartItemCount => state.item_count(),
            StateQuery::CatalogueProductCount => state.visible_products().len() as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locate_returns_matches_in_document_order() {
        let store = SimulatedStorefront::new();
        let buttons = store
            .locate(&Locator::new(Selector::button("Add to cart")))
            .await
            .unwrap();
        assert_eq!(buttons.len(), 16);

        let titles = store
            .locate(&Locator::new(Selector::class("product-title")))
            .await
            .unwrap();
        let first = store.read_text(&titles[0]).await.unwrap();
        assert_eq!(first, "Cropped Stay Groovy off white");
    }

    #[tokio::test]
    async fn test_product_price_renders_across_spans() {
        let store = SimulatedStorefront::new();
        let prices = store
            .locate(&Locator::new(Selector::class("product-price")).first())
            .await
            .unwrap();
        assert_eq!(store.read_text(&prices[0]).await.unwrap(), "$10.90");
    }

    #[tokio::test]
    async fn test_has_text_and_nth_narrow_the_match_set() {
        let store = SimulatedStorefront::new();
        let card = Locator::new(Selector::class("product"))
            .has_text("Blue T-Shirt")
            .find(Selector::button("Add to cart"));
        let handles = store.locate(&card).await.unwrap();
        assert_eq!(handles.len(), 1);

        store.click(&handles[0]).await.unwrap();
        let lines = store.cart_contents().await;
        assert_eq!(lines[0].name, "Blue T-Shirt");

        let none = store
            .locate(&Locator::new(Selector::class("product")).nth(99))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_hidden_checkboxes_are_located_but_not_visible() {
        let store = SimulatedStorefront::new();
        let boxes = store
            .locate(&Locator::new(Selector::role(Role::Checkbox)))
            .await
            .unwrap();
        assert_eq!(boxes.len(), SIZES.len());
        assert!(!store.is_visible(&boxes[0]).await.unwrap());
        assert!(store.click(&boxes[0]).await.is_err());
    }

    #[tokio::test]
    async fn test_checked_is_a_boolean_attribute() {
        let store = SimulatedStorefront::new();
        let option = Locator::new(Selector::attr_equals("data-size", "M"));
        let checkbox = option.clone().find(Selector::role(Role::Checkbox));

        let handle = store.locate(&checkbox).await.unwrap().remove(0);
        assert_eq!(store.read_attribute(&handle, "checked").await.unwrap(), None);

        let label = store.locate(&option).await.unwrap().remove(0);
        store.click(&label).await.unwrap();
        let handle = store.locate(&checkbox).await.unwrap().remove(0);
        assert_eq!(
            store.read_attribute(&handle, "checked").await.unwrap(),
            Some(String::new())
        );
    }

    #[tokio::test]
    async fn test_has_matches_exact_descendant_text() {
        let store = SimulatedStorefront::with_catalogue(vec![
            ProductData::new("Dark Blue T-Shirt", Money::new(12, 0), &["M"]),
            ProductData::new("Blue T-Shirt", Money::new(9, 0), &["M"]),
        ]);
        let card = Locator::new(Selector::class("product"))
            .has(Locator::new(Selector::class("product-title")).text_is("Blue T-Shirt"));
        let cards = store.locate(&card).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(store.read_text(&cards[0]).await.unwrap(), "Blue T-Shirt$9.00Add to cart");

        let loose = Locator::new(Selector::class("product")).has_text("Blue T-Shirt");
        assert_eq!(store.locate(&loose).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_and_malformed_handles_are_driver_errors() {
        let store = SimulatedStorefront::new();
        assert!(store
            .read_text(&ElementHandle("9/9/9".to_string()))
            .await
            .is_err());
        assert!(store
            .read_text(&ElementHandle("a/b".to_string()))
            .await
            .is_err());
        assert!(!store
            .is_visible(&ElementHandle("9/9/9".to_string()))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_checkout_without_listener_is_dismissed() {
        let store = SimulatedStorefront::new();
        let toggle = store
            .locate(&Locator::new(Selector::class("cart-toggle")))
            .await
            .unwrap();
        store.click(&toggle[0]).await.unwrap();
        let checkout = store
            .locate(&Locator::new(Selector::button("Checkout")))
            .await
            .unwrap();
        store.click(&checkout[0]).await.unwrap();

        assert_eq!(store.confirmations().await, vec![EMPTY_CART_MESSAGE.to_string()]);
        assert_eq!(store.unacknowledged_confirmations().await, 0);
    }

    #[tokio::test]
    async fn test_delayed_updates_apply_after_the_delay() {
        let store = SimulatedStorefront::new().with_update_delay(Duration::from_millis(30));
        let add = store
            .locate(&Locator::new(Selector::button("Add to cart")).first())
            .await
            .unwrap();
        store.click(&add[0]).await.unwrap();
        assert!(store.cart_contents().await.is_empty());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.cart_contents().await.len(), 1);
    }
}
