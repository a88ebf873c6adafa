// src/schema/tables.rs
//
// Built-in descriptors for the ABN bulk extract tables.

use super::types::{ColumnSpec, SqlType, TableSchema};

/// `entities.csv` → `entities` (12 columns, ABN in field 0).
pub fn entities() -> TableSchema {
    use SqlType::*;
    TableSchema {
        table: "entities".into(),
        columns: vec![
            ColumnSpec::new("abn", Varchar(20), false),
            ColumnSpec::new("legal_name", Text, true),
            ColumnSpec::new("entity_type", Varchar(100), true),
            ColumnSpec::new("abn_status", Varchar(10), true),
            ColumnSpec::new("abn_status_date", Varchar(20), true),
            ColumnSpec::new("gst_status", Varchar(10), true),
            ColumnSpec::new("gst_registration_date", Varchar(20), true),
            ColumnSpec::new("dgr_status", Varchar(10), true),
            ColumnSpec::new("dgr_effective_date", Varchar(20), true),
            ColumnSpec::new("acn_arbn", Varchar(20), true),
            ColumnSpec::new("main_location_state", Varchar(10), true),
            ColumnSpec::new("main_location_postcode", Varchar(10), true),
        ],
        identifier_column: Some(0),
    }
}

/// `other_names.csv` → `other_names` (3 columns).
pub fn other_names() -> TableSchema {
    use SqlType::*;
    TableSchema {
        table: "other_names".into(),
        columns: vec![
            ColumnSpec::new("abn", Varchar(20), false),
            ColumnSpec::new("name_type", Varchar(20), true),
            ColumnSpec::new("name", Text, true),
        ],
        identifier_column: Some(0),
    }
}
