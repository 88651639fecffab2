//! Catalog schema for [`PgCatalogStore`](super::PgCatalogStore)
//!
//! Tables are listed parents first so the foreign keys resolve when the
//! statements run in order. The unique constraints carry the names in
//! [`constraints`], which is how storage errors are traced back to the
//! invariant they protect.

use super::constraints;
use crate::{LifeError, LifeExecutor};
use sea_query::{
    ColumnDef, Expr, ForeignKey, ForeignKeyAction, Index, PostgresQueryBuilder, Table,
    TableCreateStatement,
};

fn id_column(name: &'static str) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn created_at() -> ColumnDef {
    ColumnDef::new("created_at")
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn updated_at() -> ColumnDef {
    ColumnDef::new("updated_at")
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

/// `categories`: self-referencing hierarchy
pub fn categories_table() -> TableCreateStatement {
    Table::create()
        .table("categories")
        .if_not_exists()
        .col(id_column("category_id"))
        .col(ColumnDef::new("category_name").string_len(100).not_null())
        .col(ColumnDef::new("description").text().null())
        .col(ColumnDef::new("parent_category_id").integer().null())
        .col(created_at())
        .col(updated_at())
        .foreign_key(
            ForeignKey::create()
                .name("fk_categories_parent")
                .from("categories", "parent_category_id")
                .to("categories", "category_id")
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

pub fn items_table() -> TableCreateStatement {
    Table::create()
        .table("items")
        .if_not_exists()
        .col(id_column("item_id"))
        .col(ColumnDef::new("part_number").string_len(50).not_null())
        .col(ColumnDef::new("description").text().not_null())
        .col(ColumnDef::new("category_id").integer().null())
        .col(ColumnDef::new("buy_price").decimal_len(10, 2).not_null().default(0))
        .col(ColumnDef::new("sell_price").decimal_len(10, 2).not_null().default(0))
        .col(ColumnDef::new("current_stock").integer().not_null().default(0))
        .col(ColumnDef::new("minimum_stock").integer().not_null().default(0))
        .col(ColumnDef::new("barcode").string_len(100).null())
        .col(ColumnDef::new("supplier_id").integer().null())
        .col(ColumnDef::new("is_active").boolean().not_null().default(true))
        .col(ColumnDef::new("notes").text().null())
        .col(created_at())
        .col(updated_at())
        .index(
            Index::create()
                .name(constraints::PART_NUMBER)
                .col("part_number")
                .unique(),
        )
        .index(Index::create().name(constraints::BARCODE).col("barcode").unique())
        .foreign_key(
            ForeignKey::create()
                .name("fk_items_category")
                .from("items", "category_id")
                .to("categories", "category_id")
                .on_delete(ForeignKeyAction::SetNull),
        )
        .to_owned()
}

pub fn vehicle_makes_table() -> TableCreateStatement {
    Table::create()
        .table("vehicle_makes")
        .if_not_exists()
        .col(id_column("make_id"))
        .col(ColumnDef::new("make_name").string_len(100).not_null())
        .col(ColumnDef::new("country").string_len(100).null())
        .col(created_at())
        .col(updated_at())
        .to_owned()
}

pub fn vehicle_models_table() -> TableCreateStatement {
    Table::create()
        .table("vehicle_models")
        .if_not_exists()
        .col(id_column("model_id"))
        .col(ColumnDef::new("make_id").integer().not_null())
        .col(ColumnDef::new("model_name").string_len(100).not_null())
        .col(created_at())
        .col(updated_at())
        .foreign_key(
            ForeignKey::create()
                .name("fk_vehicle_models_make")
                .from("vehicle_models", "make_id")
                .to("vehicle_makes", "make_id")
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

pub fn vehicle_submodels_table() -> TableCreateStatement {
    Table::create()
        .table("vehicle_submodels")
        .if_not_exists()
        .col(id_column("submodel_id"))
        .col(ColumnDef::new("model_id").integer().not_null())
        .col(ColumnDef::new("submodel_name").string_len(100).not_null())
        .col(ColumnDef::new("year_from").integer().not_null())
        .col(ColumnDef::new("year_to").integer().null())
        .col(ColumnDef::new("engine_type").string_len(50).not_null())
        .col(ColumnDef::new("engine_displacement").double().not_null())
        .col(ColumnDef::new("fuel_type").string_len(30).not_null())
        .col(ColumnDef::new("transmission_type").string_len(30).not_null())
        .col(ColumnDef::new("body_type").string_len(30).not_null())
        .col(created_at())
        .col(updated_at())
        .foreign_key(
            ForeignKey::create()
                .name("fk_vehicle_submodels_model")
                .from("vehicle_submodels", "model_id")
                .to("vehicle_models", "model_id")
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

/// `compatibility`: the fitment relation, one row per (item, submodel)
pub fn compatibility_table() -> TableCreateStatement {
    Table::create()
        .table("compatibility")
        .if_not_exists()
        .col(id_column("compat_id"))
        .col(ColumnDef::new("item_id").integer().not_null())
        .col(ColumnDef::new("submodel_id").integer().not_null())
        .col(ColumnDef::new("notes").text().null())
        .col(created_at())
        .index(
            Index::create()
                .name(constraints::FITMENT_PAIR)
                .col("item_id")
                .col("submodel_id")
                .unique(),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_compatibility_item")
                .from("compatibility", "item_id")
                .to("items", "item_id")
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_compatibility_submodel")
                .from("compatibility", "submodel_id")
                .to("vehicle_submodels", "submodel_id")
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

/// Every catalog table, parents before children.
pub fn catalog_tables() -> Vec<TableCreateStatement> {
    vec![
        categories_table(),
        items_table(),
        vehicle_makes_table(),
        vehicle_models_table(),
        vehicle_submodels_table(),
        compatibility_table(),
    ]
}

/// Rendered `CREATE TABLE IF NOT EXISTS` statements, in execution order.
pub fn schema_sql() -> Vec<String> {
    catalog_tables()
        .iter()
        .map(|table| table.build(PostgresQueryBuilder))
        .collect()
}

/// Create the catalog tables that do not exist yet.
///
/// Safe to run against an initialized database.
pub fn initialize_schema(executor: &dyn LifeExecutor) -> Result<(), LifeError> {
    let statements = schema_sql();
    for sql in &statements {
        log::debug!("{sql}");
        executor.execute(sql, &[])?;
    }
    log::info!("catalog schema ready ({} tables)", statements.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_ordered_parents_first() {
        let sql = schema_sql();
        assert_eq!(sql.len(), 6);
        assert!(sql[0].contains("\"categories\""));
        assert!(sql[5].contains("\"compatibility\""));
        assert!(sql.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[test]
    fn unique_constraints_carry_their_names() {
        let sql = schema_sql().join("\n");
        assert!(sql.contains(constraints::FITMENT_PAIR));
        assert!(sql.contains(constraints::PART_NUMBER));
        assert!(sql.contains(constraints::BARCODE));
    }

    #[test]
    fn category_parent_is_a_self_reference() {
        let sql = categories_table().build(PostgresQueryBuilder);
        assert!(sql.contains("fk_categories_parent"));
        assert!(sql.contains("REFERENCES \"categories\""));
    }
}
