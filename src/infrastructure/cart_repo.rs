use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartItem, CartLine};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartStore;
use crate::schema::{cart_lines, products};

use super::models::{CartLineRow, NewCartLineRow, ProductRow};

/// Delete every cart line of `user_id`. Runs on the caller's connection so it
/// can join an enclosing transaction.
pub(crate) fn clear_cart(conn: &mut PgConnection, user_id: Uuid) -> Result<usize, DomainError> {
    Ok(diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(user_id))).execute(conn)?)
}

pub struct DieselCartStore {
    pool: DbPool,
}

impl DieselCartStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartStore for DieselCartStore {
    fn get(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<(CartLineRow, ProductRow)> = cart_lines::table
            .inner_join(products::table)
            .filter(cart_lines::user_id.eq(user_id))
            .order(cart_lines::created_at.asc())
            .select((CartLineRow::as_select(), ProductRow::as_select()))
            .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(line, product)| CartItem {
                line: line.into(),
                product: product.into(),
            })
            .collect())
    }

    fn add_line(&self, user_id: Uuid, product_id: Uuid) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(cart_lines::table)
            .values(&NewCartLineRow {
                id: Uuid::new_v4(),
                user_id,
                product_id,
                quantity: 1,
            })
            .returning(CartLineRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Conflict("Item already in cart".to_string())
                }
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    DomainError::NotFound("Product not found".to_string())
                }
                other => other.into(),
            })?;

        Ok(row.into())
    }

    fn set_quantity(&self, user_id: Uuid, line_id: Uuid, quantity: i32) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(
            cart_lines::table
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::user_id.eq(user_id)),
        )
        .set(cart_lines::quantity.eq(quantity))
        .returning(CartLineRow::as_returning())
        .get_result(&mut conn)
        .optional()?;

        row.map(Into::into)
            .ok_or_else(|| DomainError::NotFound("Cart item not found".to_string()))
    }

    fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(
            cart_lines::table
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(DomainError::NotFound("Cart item not found".to_string()));
        }
        Ok(())
    }

    fn clear_all(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        clear_cart(&mut conn, user_id)
    }
}
