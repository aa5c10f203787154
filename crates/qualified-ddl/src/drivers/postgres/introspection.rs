//! PostgreSQL catalog readers over `pg_catalog` and `information_schema`.
//!
//! Names without a schema are looked up by table name alone, which matches
//! whatever `search_path` makes visible.

use async_trait::async_trait;
use indexmap::IndexMap;

use super::PostgresBackend;
use crate::core::qname::QualifiedName;
use crate::core::traits::{
    ColumnInfo, Connection, IndexInfo, Introspection, Relation, SchemaBackend,
};
use crate::core::value::Value;
use crate::drivers::common::{column_index, placeholders};
use crate::error::Result;

/// PostgreSQL introspection.
#[derive(Debug, Clone)]
pub struct PostgresIntrospection {
    backend: PostgresBackend,
}

impl PostgresIntrospection {
    pub fn new(backend: PostgresBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Introspection for PostgresIntrospection {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn get_schema_list(&self, conn: &mut dyn Connection) -> Result<Vec<String>> {
        let rows = conn
            .execute(
                "SELECT n.nspname \
                 FROM pg_catalog.pg_namespace n \
                 WHERE n.nspname != 'information_schema' AND n.nspname NOT LIKE 'pg_%'",
                &[],
            )
            .await?;
        rows.iter().map(|r| r.text(0)).collect()
    }

    /// Tables on the search path plus those in the configured connection schema.
    async fn get_visible_tables_list(
        &self,
        conn: &mut dyn Connection,
    ) -> Result<Vec<QualifiedName>> {
        let mut sql = String::from(
            "SELECT n.nspname, c.relname \
             FROM pg_catalog.pg_class c \
             LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
             WHERE c.relkind IN ('r', 'v', '') \
               AND n.nspname NOT IN ('pg_catalog', 'pg_toast') \
               AND (pg_catalog.pg_table_is_visible(c.oid)",
        );
        let mut params = Vec::new();
        if let Some(schema) = self.backend.convert_schema(None) {
            sql.push_str(" OR n.nspname = $1");
            params.push(Value::from(schema));
        }
        sql.push(')');
        let rows = conn.execute(&sql, &params).await?;
        rows.iter()
            .map(|r| QualifiedName::resolved(Some(r.text(0)?.as_str()), &r.text(1)?))
            .collect()
    }

    async fn get_qualified_tables_list(
        &self,
        conn: &mut dyn Connection,
        schemas: &[String],
    ) -> Result<Vec<QualifiedName>> {
        if schemas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT n.nspname, c.relname \
             FROM pg_catalog.pg_class c \
             LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
             WHERE c.relkind IN ('r', 'v', '') \
               AND n.nspname IN ({})",
            placeholders(schemas.len(), 1, |i| format!("${}", i))
        );
        let params: Vec<Value> = schemas.iter().map(|s| Value::from(s.as_str())).collect();
        let rows = conn.execute(&sql, &params).await?;
        rows.iter()
            .map(|r| QualifiedName::resolved(Some(r.text(0)?.as_str()), &r.text(1)?))
            .collect()
    }

    async fn get_table_description(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<Vec<ColumnInfo>> {
        let name = self.backend.resolve(name, false);
        let columns = "SELECT column_name, data_type, character_maximum_length, \
                              numeric_precision, numeric_scale, is_nullable \
                       FROM information_schema.columns";
        let rows = match name.schema() {
            Some(schema) => {
                let sql = format!(
                    "{} WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
                    columns
                );
                conn.execute(&sql, &[Value::from(schema), Value::from(name.table())])
                    .await?
            }
            None => {
                let sql = format!("{} WHERE table_name = $1 ORDER BY ordinal_position", columns);
                conn.execute(&sql, &[Value::from(name.table())]).await?
            }
        };
        rows.iter()
            .map(|r| {
                Ok(ColumnInfo {
                    name: r.text(0)?,
                    data_type: r.text(1)?,
                    max_length: r.opt_int(2)?,
                    precision: r.opt_int(3)?,
                    scale: r.opt_int(4)?,
                    nullable: r.text(5)? == "YES",
                })
            })
            .collect()
    }

    /// Single-column foreign keys; constraint keys are 1-based attribute numbers.
    async fn get_relations(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<Vec<Relation>> {
        let name = self.backend.resolve(name, false);
        let rows = match name.schema() {
            Some(schema) => {
                conn.execute(
                    "SELECT con.conkey, con.confkey, nsp2.nspname, c2.relname \
                     FROM pg_constraint con, pg_class c1, pg_class c2, \
                          pg_namespace nsp1, pg_namespace nsp2 \
                     WHERE c1.oid = con.conrelid \
                       AND nsp1.oid = c1.relnamespace \
                       AND c2.oid = con.confrelid \
                       AND nsp2.oid = c2.relnamespace \
                       AND nsp1.nspname = $1 \
                       AND c1.relname = $2 \
                       AND con.contype = 'f'",
                    &[Value::from(schema), Value::from(name.table())],
                )
                .await?
            }
            None => {
                conn.execute(
                    "SELECT con.conkey, con.confkey, nsp2.nspname, c2.relname \
                     FROM pg_constraint con, pg_class c1, pg_class c2, pg_namespace nsp2 \
                     WHERE c1.oid = con.conrelid \
                       AND c2.oid = con.confrelid \
                       AND nsp2.oid = c2.relnamespace \
                       AND c1.relname = $1 \
                       AND con.contype = 'f'",
                    &[Value::from(name.table())],
                )
                .await?
            }
        };
        let mut relations = Vec::new();
        for row in &rows {
            let (conkey, confkey) = (row.int_array(0)?, row.int_array(1)?);
            let (Some(&own), Some(&other)) = (conkey.first(), confkey.first()) else {
                continue;
            };
            relations.push(Relation {
                column_index: column_index(own, 1)?,
                target_column_index: column_index(other, 1)?,
                target_table: QualifiedName::resolved(Some(row.text(2)?.as_str()), &row.text(3)?)?,
            });
        }
        Ok(relations)
    }

    /// Indexes keyed by their first column; multi-column indexes are skipped.
    async fn get_indexes(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<IndexMap<String, IndexInfo>> {
        let name = self.backend.resolve(name, false);
        let rows = match name.schema() {
            Some(schema) => {
                conn.execute(
                    "SELECT attr.attname, idx.indkey, idx.indisunique, idx.indisprimary \
                     FROM pg_catalog.pg_class c, pg_catalog.pg_namespace nsp, \
                          pg_catalog.pg_class c2, pg_catalog.pg_index idx, \
                          pg_catalog.pg_attribute attr \
                     WHERE c.oid = idx.indrelid \
                       AND nsp.oid = c.relnamespace \
                       AND idx.indexrelid = c2.oid \
                       AND attr.attrelid = c.oid \
                       AND attr.attnum = idx.indkey[0] \
                       AND nsp.nspname = $1 AND c.relname = $2",
                    &[Value::from(schema), Value::from(name.table())],
                )
                .await?
            }
            None => {
                conn.execute(
                    "SELECT attr.attname, idx.indkey, idx.indisunique, idx.indisprimary \
                     FROM pg_catalog.pg_class c, pg_catalog.pg_class c2, \
                          pg_catalog.pg_index idx, pg_catalog.pg_attribute attr \
                     WHERE c.oid = idx.indrelid \
                       AND idx.indexrelid = c2.oid \
                       AND attr.attrelid = c.oid \
                       AND attr.attnum = idx.indkey[0] \
                       AND c.relname = $1",
                    &[Value::from(name.table())],
                )
                .await?
            }
        };
        let mut indexes = IndexMap::new();
        for row in &rows {
            if row.int_array(1)?.len() > 1 {
                continue;
            }
            indexes.insert(
                row.text(0)?,
                IndexInfo {
                    primary_key: row.bool(3)?,
                    unique: row.bool(2)?,
                },
            );
        }
        Ok(indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, Engine};
    use crate::core::testing::RecordingConnection;
    use crate::core::value::Row;

    fn settings(schema: Option<&str>) -> DatabaseConfig {
        let mut settings = DatabaseConfig::new(Engine::Postgresql, "app").user("app");
        settings.schema = schema.map(str::to_string);
        settings
    }

    fn introspection(schema: Option<&str>) -> PostgresIntrospection {
        PostgresIntrospection::new(PostgresBackend::new(settings(schema)))
    }

    #[tokio::test]
    async fn test_visible_tables_include_connection_schema() {
        let mut conn = RecordingConnection::new(settings(Some("foo")));
        conn.respond(
            "pg_table_is_visible",
            vec![Row::new(vec!["foo".into(), "bar".into()])],
        );
        let tables = introspection(Some("foo"))
            .get_visible_tables_list(&mut conn)
            .await
            .unwrap();
        assert!(conn.statements()[0].ends_with("OR n.nspname = $1)"));
        assert_eq!(tables[0], QualifiedName::resolved(Some("foo"), "bar").unwrap());
    }

    #[tokio::test]
    async fn test_visible_tables_without_schema() {
        let mut conn = RecordingConnection::new(settings(None));
        introspection(None)
            .get_visible_tables_list(&mut conn)
            .await
            .unwrap();
        assert!(conn.statements()[0].ends_with("pg_table_is_visible(c.oid))"));
        assert!(conn.params()[0].is_empty());
    }

    #[tokio::test]
    async fn test_relations_are_zero_based() {
        let mut conn = RecordingConnection::new(settings(None));
        conn.respond(
            "pg_constraint",
            vec![Row::new(vec![
                Value::IntArray(vec![2]),
                Value::IntArray(vec![1]),
                "schema2".into(),
                "sn".into(),
            ])],
        );
        let name = QualifiedName::new(Some("schema1"), "sn").unwrap();
        let relations = introspection(None).get_relations(&mut conn, &name).await.unwrap();
        assert_eq!(relations[0].column_index, 1);
        assert_eq!(relations[0].target_column_index, 0);
        assert_eq!(relations[0].target_table.schema(), Some("schema2"));
        assert_eq!(conn.params()[0], vec![Value::from("schema1"), Value::from("sn")]);
    }

    #[tokio::test]
    async fn test_relations_reject_system_column() {
        let mut conn = RecordingConnection::new(settings(None));
        conn.respond(
            "pg_constraint",
            vec![Row::new(vec![
                Value::IntArray(vec![0]),
                Value::IntArray(vec![1]),
                "schema2".into(),
                "sn".into(),
            ])],
        );
        let name = QualifiedName::new(None, "sn").unwrap();
        let err = introspection(None)
            .get_relations(&mut conn, &name)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::DdlError::Decode(_)));
    }

    #[tokio::test]
    async fn test_indexes_skip_multicolumn() {
        let mut conn = RecordingConnection::new(settings(None));
        conn.respond(
            "pg_index",
            vec![
                Row::new(vec!["id".into(), "1".into(), true.into(), true.into()]),
                Row::new(vec!["a".into(), "2 3".into(), true.into(), false.into()]),
            ],
        );
        let name = QualifiedName::new(None, "t").unwrap();
        let indexes = introspection(None).get_indexes(&mut conn, &name).await.unwrap();
        assert_eq!(indexes.len(), 1);
        assert!(indexes["id"].primary_key);
    }
}
