use kumiai_core::{AccountingClass, Category, CategoryId};

use crate::db::DbPool;
use crate::StorageError;

type CategoryTuple = (i64, String, i64, i64, bool, bool, bool, bool);

fn category_from_tuple(row: CategoryTuple) -> Result<Category, StorageError> {
    let class = AccountingClass::from_code(row.3)
        .ok_or_else(|| StorageError::Corrupt(format!("unknown accounting class code {}", row.3)))?;
    Ok(Category {
        id: Some(CategoryId(row.0)),
        name: row.1,
        code: row.2,
        class,
        is_income: row.4,
        aggregate_flag: row.5,
        alive: row.6,
        is_default: row.7,
    })
}

const CATEGORY_COLUMNS: &str =
    "id, name, code, class_code, is_income, aggregate_flag, alive, is_default";

pub async fn insert_category(pool: &DbPool, category: &Category) -> Result<CategoryId, StorageError> {
    let id: (i64,) = sqlx::query_as(
        "INSERT INTO himoku (name, code, class_code, is_income, aggregate_flag, alive, is_default)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&category.name)
    .bind(category.code)
    .bind(category.class.code())
    .bind(category.is_income)
    .bind(category.aggregate_flag)
    .bind(category.alive)
    .bind(category.is_default)
    .fetch_one(pool)
    .await?;
    Ok(CategoryId(id.0))
}

/// The resolver's vocabulary: live himoku of one class, ascending sort
/// code. The order is load-bearing: first substring match wins.
pub async fn categories_for_class(
    pool: &DbPool,
    class: AccountingClass,
    is_income: Option<bool>,
) -> Result<Vec<Category>, StorageError> {
    let rows: Vec<CategoryTuple> = match is_income {
        Some(kind) => {
            sqlx::query_as(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM himoku
                 WHERE class_code = ? AND alive = 1 AND is_income = ? ORDER BY code"
            ))
            .bind(class.code())
            .bind(kind)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM himoku
                 WHERE class_code = ? AND alive = 1 ORDER BY code"
            ))
            .bind(class.code())
            .fetch_all(pool)
            .await?
        }
    };
    rows.into_iter().map(category_from_tuple).collect()
}

/// The system-wide fallback himoku, if one is configured.
pub async fn default_category(pool: &DbPool) -> Result<Option<Category>, StorageError> {
    let row: Option<CategoryTuple> = sqlx::query_as(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM himoku WHERE is_default = 1 AND alive = 1"
    ))
    .fetch_optional(pool)
    .await?;
    row.map(category_from_tuple).transpose()
}
