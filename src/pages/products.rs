use std::fmt::Write;
use std::sync::Arc;

use crate::error::{ApiError, CliError};
use crate::i18n::{self, Locale};
use crate::models::{Product, ProductInput};
use crate::pages::{rupiah, StoreBotSelector};
use crate::services::ApiClient;

/// Product modal fields as typed; numbers are parsed on save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category: String,
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            category: product.category.clone().unwrap_or_default(),
        }
    }

    pub fn to_input(&self, locale: Locale) -> Result<ProductInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(i18n::required_field(locale, "Nama produk"));
        }
        let price = parse_field::<f64>(&self.price, "Harga", locale)?;
        let stock = parse_field::<i64>(&self.stock, "Stok", locale)?;

        Ok(ProductInput {
            name: name.to_string(),
            description: self.description.clone(),
            price,
            stock,
            category: self.category.clone(),
        })
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, field: &str, locale: Locale) -> Result<T, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(i18n::required_field(locale, field));
    }
    raw.parse().map_err(|_| i18n::invalid_number(locale, field))
}

pub struct ProductsPage {
    api: Arc<ApiClient>,
    pub store_bots: StoreBotSelector,
    pub products: Vec<Product>,
    /// `Some` while the modal is open; holds the product being edited, if any.
    pub editing: Option<Option<i64>>,
    pub form: ProductForm,
    pub error: Option<String>,
}

impl ProductsPage {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            store_bots: StoreBotSelector::default(),
            products: Vec::new(),
            editing: None,
            form: ProductForm::default(),
            error: None,
        }
    }

    /// Loads the store bots, auto-selects the first and fetches its products.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.store_bots = StoreBotSelector::load(&self.api).await?;
        self.refresh().await
    }

    pub async fn select_bot(&mut self, bot_id: i64) -> Result<bool, ApiError> {
        if !self.store_bots.select(bot_id) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        match self.store_bots.selected() {
            Some(bot_id) => self.products = self.api.products(bot_id).await?,
            None => self.products.clear(),
        }
        Ok(())
    }

    pub fn open_add(&mut self) {
        self.editing = Some(None);
        self.form = ProductForm::default();
        self.error = None;
    }

    pub fn open_edit(&mut self, product_id: i64) -> bool {
        let Some(product) = self.products.iter().find(|p| p.id == product_id) else {
            return false;
        };
        self.form = ProductForm::from_product(product);
        self.editing = Some(Some(product_id));
        self.error = None;
        true
    }

    pub fn close(&mut self) {
        self.editing = None;
        self.error = None;
    }

    /// Creates or updates from the form. A failure leaves the product list
    /// untouched and keeps the modal open with the error.
    pub async fn save(&mut self) -> Result<(), CliError> {
        let (Some(bot_id), Some(editing)) = (self.store_bots.selected(), self.editing) else {
            return Ok(());
        };
        self.error = None;
        let locale = self.api.locale();

        let input = match self.form.to_input(locale) {
            Ok(input) => input,
            Err(message) => {
                self.error = Some(message.clone());
                return Err(CliError::Invalid(message));
            }
        };

        let saved = match editing {
            Some(product_id) => self.api.update_product(bot_id, product_id, &input).await,
            None => self.api.create_product(bot_id, &input).await,
        };
        if let Err(e) = saved {
            self.error = Some(e.message(locale));
            return Err(e.into());
        }

        self.refresh().await?;
        self.close();
        Ok(())
    }

    pub async fn delete(&mut self, product_id: i64) -> Result<(), ApiError> {
        let Some(bot_id) = self.store_bots.selected() else {
            return Ok(());
        };
        self.api.delete_product(bot_id, product_id).await?;
        self.refresh().await
    }

    pub async fn add_stock(&mut self, product_id: i64, items: &[String]) -> Result<i64, ApiError> {
        let added = self.api.add_product_stock(product_id, items).await?;
        self.refresh().await?;
        Ok(added)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.store_bots.selected_bot() {
            Some(bot) => {
                let _ = writeln!(out, "Produk @{} ({})", bot.bot_username, self.products.len());
            }
            None => {
                let _ = writeln!(out, "Belum ada store bot");
                return out;
            }
        }
        for p in &self.products {
            let _ = writeln!(
                out,
                "#{:<5} {:<28} {:>14} stok={:<5} {:<12} {}",
                p.id,
                p.name,
                rupiah(p.price),
                p.stock,
                p.category.as_deref().unwrap_or("-"),
                if p.is_active { "aktif" } else { "nonaktif" },
            );
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "! {error}");
        }
        out
    }
}
