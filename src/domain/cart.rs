use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::csv_import::MAX_PRICE, error::AppError};

/// Upper bound for a single line so totals cannot overflow.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// One line of a cart, and of the order created from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: i64,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_set: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_items: Vec<String>,
}

impl CartLine {
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }
}

/// Cart arithmetic shared by the menu page and checkout.
///
/// Plain items with the same id merge into one line; set products keep one
/// line per selection because two sets of the same product can hold
/// different choices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Result<Self, AppError> {
        let mut cart = Cart::new();
        for line in lines {
            cart.add(line)?;
        }
        Ok(cart)
    }

    pub fn add(&mut self, line: CartLine) -> Result<(), AppError> {
        if line.quantity <= 0 {
            return Err(AppError::bad_request(format!(
                "Invalid quantity for {}",
                line.name
            )));
        }
        if !(0..=MAX_PRICE).contains(&line.price) {
            return Err(AppError::bad_request(format!(
                "Invalid price for {}",
                line.name
            )));
        }
        if !line.is_set {
            if let Some(existing) = self
                .lines
                .iter_mut()
                .find(|l| !l.is_set && l.id == line.id)
            {
                let merged = existing.quantity + line.quantity;
                if merged > MAX_LINE_QUANTITY {
                    return Err(too_many(&existing.name));
                }
                existing.quantity = merged;
                return Ok(());
            }
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(too_many(&line.name));
        }
        self.lines.push(line);
        Ok(())
    }

    pub fn increment(&mut self, index: usize) -> Result<(), AppError> {
        let line = self.line_mut(index)?;
        if line.quantity >= MAX_LINE_QUANTITY {
            return Err(too_many(&line.name));
        }
        line.quantity += 1;
        Ok(())
    }

    /// Decrements a line, never going below one. Use [`Cart::remove`] to drop it.
    pub fn decrement(&mut self, index: usize) -> Result<(), AppError> {
        let line = self.line_mut(index)?;
        if line.quantity > 1 {
            line.quantity -= 1;
        }
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<CartLine, AppError> {
        if index >= self.lines.len() {
            return Err(AppError::NotFound);
        }
        Ok(self.lines.remove(index))
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut CartLine> {
        self.lines.iter_mut()
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    pub fn total_price(&self) -> i64 {
        self.lines
            .iter()
            .map(CartLine::subtotal)
            .fold(0, i64::saturating_add)
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut CartLine, AppError> {
        self.lines.get_mut(index).ok_or(AppError::NotFound)
    }
}

fn too_many(name: &str) -> AppError {
    AppError::bad_request(format!(
        "At most {MAX_LINE_QUANTITY} of {name} can be ordered at once"
    ))
}

/// Checks the choices made in the set-product modal: exactly `set_count`
/// distinct choices, each one of the offered options.
pub fn validate_set_selection(
    set_name: &str,
    set_count: i32,
    options: &[String],
    selected: &[String],
) -> Result<(), AppError> {
    if set_count <= 0 {
        return Err(AppError::bad_request(format!(
            "{set_name} is not configured as a set"
        )));
    }
    if selected.len() != set_count as usize {
        return Err(AppError::bad_request(format!(
            "{set_name} needs exactly {set_count} choices, got {}",
            selected.len()
        )));
    }
    for (i, choice) in selected.iter().enumerate() {
        if !options.iter().any(|o| o == choice) {
            return Err(AppError::bad_request(format!(
                "{choice} is not available in {set_name}"
            )));
        }
        if selected[..i].contains(choice) {
            return Err(AppError::bad_request(format!(
                "{choice} was chosen twice in {set_name}"
            )));
        }
    }
    Ok(())
}
