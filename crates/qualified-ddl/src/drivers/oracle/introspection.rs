//! Oracle catalog readers over the `ALL_*` dictionary views.
//!
//! Dictionary views store identifiers upper-cased, so bind values are
//! upper-cased on the way in and results are lower-cased on the way out.

use async_trait::async_trait;
use indexmap::IndexMap;

use super::OracleBackend;
use crate::core::qname::QualifiedName;
use crate::core::traits::{
    ColumnInfo, Connection, IndexInfo, Introspection, Relation, SchemaBackend,
};
use crate::core::value::Value;
use crate::drivers::common::{column_index, placeholders};
use crate::error::Result;

const RELATIONS_SQL: &str = "\
SELECT ta.column_id - 1, tb.table_name, tb.owner, tb.column_id - 1
FROM   all_constraints, all_cons_columns ca, all_cons_columns cb,
       all_tab_cols ta, all_tab_cols tb
WHERE  all_constraints.table_name = :1 AND
       all_constraints.owner = :2 AND
       ta.table_name = all_constraints.table_name AND
       ta.owner = all_constraints.owner AND
       ta.column_name = ca.column_name AND
       ca.table_name = ta.table_name AND
       ca.owner = ta.owner AND
       all_constraints.constraint_name = ca.constraint_name AND
       all_constraints.r_constraint_name = cb.constraint_name AND
       cb.table_name = tb.table_name AND
       cb.column_name = tb.column_name AND
       ca.position = cb.position";

const INDEXES_SQL: &str = "\
SELECT LOWER(all_tab_cols.column_name) AS column_name,
       CASE all_constraints.constraint_type
           WHEN 'P' THEN 1 ELSE 0
       END AS is_primary_key,
       CASE all_indexes.uniqueness
           WHEN 'UNIQUE' THEN 1 ELSE 0
       END AS is_unique
FROM   all_tab_cols, all_cons_columns, all_constraints, all_ind_columns,
       all_indexes
WHERE  all_tab_cols.column_name = all_cons_columns.column_name (+)
  AND  all_tab_cols.table_name = all_cons_columns.table_name (+)
  AND  all_tab_cols.owner = all_cons_columns.owner (+)
  AND  all_cons_columns.constraint_name = all_constraints.constraint_name
  AND  all_cons_columns.owner = all_constraints.owner
  AND  all_ind_columns.column_name (+) = all_tab_cols.column_name
  AND  all_ind_columns.table_name (+) = all_tab_cols.table_name
  AND  all_ind_columns.table_owner (+) = all_tab_cols.owner
  AND  all_indexes.uniqueness (+) = 'UNIQUE'
  AND  all_indexes.index_name (+) = all_ind_columns.index_name
  AND  all_indexes.owner (+) = all_ind_columns.table_owner
  AND  all_tab_cols.table_name = :1
  AND  all_tab_cols.owner = :2
  AND  all_ind_columns.column_position = 1
  AND  all_constraints.constraint_type != 'R'
  AND  NOT EXISTS (
          SELECT 1
          FROM   all_ind_columns aic2
          WHERE  aic2.index_name = all_ind_columns.index_name
            AND  aic2.table_owner = all_ind_columns.table_owner
            AND  aic2.column_position = 2
       )";

/// Oracle introspection.
#[derive(Debug, Clone)]
pub struct OracleIntrospection {
    backend: OracleBackend,
}

impl OracleIntrospection {
    pub fn new(backend: OracleBackend) -> Self {
        Self { backend }
    }

    /// Upper-cased (schema, table) binds for a force-resolved name.
    fn binds(&self, name: &QualifiedName) -> (String, String) {
        let name = self.backend.resolve(name, true);
        (
            name.schema().unwrap_or_default().to_uppercase(),
            name.table().to_uppercase(),
        )
    }
}

#[async_trait]
impl Introspection for OracleIntrospection {
    fn backend_name(&self) -> &'static str {
        "oracle"
    }

    /// Table name comparison is case insensitive under Oracle.
    fn identifier_converter(&self, name: &str) -> String {
        name.to_lowercase()
    }

    async fn get_schema_list(&self, conn: &mut dyn Connection) -> Result<Vec<String>> {
        let rows = conn.execute("SELECT USERNAME FROM ALL_USERS", &[]).await?;
        rows.iter()
            .map(|r| Ok(self.identifier_converter(&r.text(0)?)))
            .collect()
    }

    async fn get_visible_tables_list(
        &self,
        conn: &mut dyn Connection,
    ) -> Result<Vec<QualifiedName>> {
        let user = self.backend.settings().user.clone();
        self.get_qualified_tables_list(conn, &[user]).await
    }

    async fn get_qualified_tables_list(
        &self,
        conn: &mut dyn Connection,
        schemas: &[String],
    ) -> Result<Vec<QualifiedName>> {
        let mut schemas = schemas.to_vec();
        if let Some(default_schema) = self.backend.convert_schema(None) {
            schemas.push(default_schema);
        }
        if schemas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT OWNER, TABLE_NAME FROM ALL_TABLES WHERE OWNER IN ({})",
            placeholders(schemas.len(), 1, |i| format!(":{}", i))
        );
        let params: Vec<Value> = schemas
            .iter()
            .map(|s| Value::from(s.to_uppercase()))
            .collect();
        let rows = conn.execute(&sql, &params).await?;
        rows.iter()
            .map(|r| {
                QualifiedName::resolved(
                    Some(r.text(0)?.to_lowercase().as_str()),
                    &r.text(1)?.to_lowercase(),
                )
            })
            .collect()
    }

    async fn get_table_description(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<Vec<ColumnInfo>> {
        let (schema, table) = self.binds(name);
        let rows = conn
            .execute(
                "SELECT column_name, data_type, data_length, data_precision, \
                        data_scale, nullable \
                 FROM all_tab_columns \
                 WHERE owner = :1 AND table_name = :2 \
                 ORDER BY column_id",
                &[Value::from(schema), Value::from(table)],
            )
            .await?;
        rows.iter()
            .map(|r| {
                Ok(ColumnInfo {
                    name: r.text(0)?.to_lowercase(),
                    data_type: r.text(1)?,
                    max_length: r.opt_int(2)?,
                    precision: r.opt_int(3)?,
                    scale: r.opt_int(4)?,
                    nullable: r.text(5)? == "Y",
                })
            })
            .collect()
    }

    async fn get_relations(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<Vec<Relation>> {
        let (schema, table) = self.binds(name);
        let rows = conn
            .execute(RELATIONS_SQL, &[Value::from(table), Value::from(schema)])
            .await?;
        rows.iter()
            .map(|r| {
                Ok(Relation {
                    column_index: column_index(r.int(0)?, 0)?,
                    target_column_index: column_index(r.int(3)?, 0)?,
                    target_table: QualifiedName::resolved(
                        Some(r.text(2)?.to_lowercase().as_str()),
                        &r.text(1)?.to_lowercase(),
                    )?,
                })
            })
            .collect()
    }

    async fn get_indexes(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<IndexMap<String, IndexInfo>> {
        let (schema, table) = self.binds(name);
        let rows = conn
            .execute(INDEXES_SQL, &[Value::from(table), Value::from(schema)])
            .await?;
        let mut indexes = IndexMap::new();
        for row in &rows {
            indexes.insert(
                row.text(0)?,
                IndexInfo {
                    primary_key: row.bool(1)?,
                    unique: row.bool(2)?,
                },
            );
        }
        Ok(indexes)
    }
}
