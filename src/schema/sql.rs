// src/schema/sql.rs

use std::path::Path;

use super::types::{SqlType, TableSchema};

fn render_type(ty: SqlType) -> String {
    match ty {
        SqlType::Text => "TEXT".to_string(),
        SqlType::Varchar(n) => format!("VARCHAR({})", n),
    }
}

/// PostgreSQL `CREATE TABLE IF NOT EXISTS` for the descriptor, one column per line.
pub fn create_table_sql(schema: &TableSchema) -> String {
    let cols: Vec<String> = schema
        .columns
        .iter()
        .map(|c| {
            let null = if c.nullable { "" } else { " NOT NULL" };
            format!("    {} {}{}", c.name, render_type(c.sql_type), null)
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        schema.table,
        cols.join(",\n")
    )
}

/// psql `\copy` that bulk loads a cleaned file (header row skipped by the server).
pub fn copy_sql(schema: &TableSchema, cleaned_csv: &Path) -> String {
    let path = cleaned_csv.display().to_string().replace('\'', "''");
    format!(
        "\\copy {} ({}) FROM '{}' WITH (FORMAT csv, HEADER true)",
        schema.table,
        schema.column_names().join(", "),
        path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{entities, other_names};

    #[test]
    fn create_table_lists_every_column_in_order() {
        let sql = create_table_sql(&other_names());
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS other_names (\n    abn VARCHAR(20) NOT NULL,\n    name_type VARCHAR(20),\n    name TEXT\n);"
        );

        let sql = create_table_sql(&entities());
        assert_eq!(sql.matches(",\n").count(), 11);
        assert!(sql.contains("main_location_postcode VARCHAR(10)"));
    }

    #[test]
    fn copy_escapes_quotes_in_path() {
        let sql = copy_sql(&other_names(), Path::new("/data/o'names.csv"));
        assert_eq!(
            sql,
            "\\copy other_names (abn, name_type, name) FROM '/data/o''names.csv' WITH (FORMAT csv, HEADER true)"
        );
    }
}
