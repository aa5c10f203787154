//! MySQL catalog readers over `information_schema` and `SHOW` statements.

use std::collections::HashSet;

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use super::MysqlBackend;
use crate::core::qname::QualifiedName;
use crate::core::traits::{
    ColumnInfo, Connection, IndexInfo, Introspection, KeyColumn, Relation, SchemaBackend,
};
use crate::core::value::Value;
use crate::drivers::common::placeholders;
use crate::error::{DdlError, Result};

/// MySQL introspection.
#[derive(Debug, Clone)]
pub struct MysqlIntrospection {
    backend: MysqlBackend,
}

impl MysqlIntrospection {
    pub fn new(backend: MysqlBackend) -> Self {
        Self { backend }
    }

    fn column_positions(columns: &[ColumnInfo]) -> IndexMap<String, usize> {
        columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect()
    }
}

#[async_trait]
impl Introspection for MysqlIntrospection {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    async fn get_schema_list(&self, conn: &mut dyn Connection) -> Result<Vec<String>> {
        let rows = conn.execute("SHOW DATABASES", &[]).await?;
        rows.iter().map(|r| r.text(0)).collect()
    }

    async fn get_visible_tables_list(
        &self,
        conn: &mut dyn Connection,
    ) -> Result<Vec<QualifiedName>> {
        let database = self.backend.settings().name.clone();
        self.get_qualified_tables_list(conn, &[database]).await
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
            "SELECT table_schema, table_name \
             FROM information_schema.tables \
             WHERE table_schema IN ({})",
            placeholders(schemas.len(), 1, |_| "%s".to_string())
        );
        let params: Vec<Value> = schemas.into_iter().map(Value::from).collect();
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
        let name = self.backend.resolve(name, true);
        let schema = name.schema().unwrap_or_default().to_string();
        let rows = conn
            .execute(
                "SELECT column_name, data_type, character_maximum_length, \
                        numeric_precision, numeric_scale, is_nullable \
                 FROM information_schema.columns \
                 WHERE table_schema = %s AND table_name = %s \
                 ORDER BY ordinal_position",
                &[Value::from(schema), Value::from(name.table())],
            )
            .await?;
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

    async fn get_relations(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<Vec<Relation>> {
        let own = Self::column_positions(&self.get_table_description(conn, name).await?);
        let mut relations = Vec::new();
        for key in self.get_key_columns(conn, name).await? {
            let other = Self::column_positions(
                &self
                    .get_table_description(conn, &key.referenced_table)
                    .await?,
            );
            let (Some(&column_index), Some(&target_column_index)) =
                (own.get(&key.column), other.get(&key.referenced_column))
            else {
                return Err(DdlError::Decode(format!(
                    "foreign key {} of {} names a missing column",
                    key.column, name
                )));
            };
            relations.push(Relation {
                column_index,
                target_column_index,
                target_table: key.referenced_table,
            });
        }
        Ok(relations)
    }

    async fn get_key_columns(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<Vec<KeyColumn>> {
        let name = self.backend.resolve(name, true);
        let schema = name.schema().unwrap_or_default().to_string();
        let rows = conn
            .execute(
                "SELECT column_name, referenced_table_schema, referenced_table_name, \
                        referenced_column_name \
                 FROM information_schema.key_column_usage \
                 WHERE table_name = %s \
                   AND table_schema = %s \
                   AND referenced_table_name IS NOT NULL \
                   AND referenced_column_name IS NOT NULL",
                &[Value::from(name.table()), Value::from(schema)],
            )
            .await?;
        rows.iter()
            .map(|r| {
                Ok(KeyColumn {
                    column: r.text(0)?,
                    referenced_table: QualifiedName::resolved(Some(r.text(1)?.as_str()), &r.text(2)?)?,
                    referenced_column: r.text(3)?,
                })
            })
            .collect()
    }

    /// Single-column indexes from `SHOW INDEX`; multi-column indexes are skipped.
    async fn get_indexes(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<IndexMap<String, IndexInfo>> {
        let sql = format!("SHOW INDEX FROM {}", self.backend.compose(name));
        let rows = conn.execute(&sql, &[]).await?;

        let mut multicolumn = HashSet::new();
        for row in &rows {
            if row.int(3)? > 1 {
                multicolumn.insert(row.text(2)?);
            }
        }

        let mut indexes = IndexMap::new();
        for row in &rows {
            let key_name = row.text(2)?;
            if multicolumn.contains(&key_name) {
                continue;
            }
            indexes.insert(
                row.text(4)?,
                IndexInfo {
                    primary_key: key_name == "PRIMARY",
                    unique: !row.bool(1)?,
                },
            );
        }
        debug!("{}: {} single-column indexes", name, indexes.len());
        Ok(indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, Engine};
    use crate::core::testing::RecordingConnection;
    use crate::core::value::Row;

    fn introspection() -> MysqlIntrospection {
        MysqlIntrospection::new(MysqlBackend::new(
            DatabaseConfig::new(Engine::Mysql, "appdb").user("root"),
        ))
    }

    #[tokio::test]
    async fn test_visible_tables_query_database() {
        let mut conn = RecordingConnection::new(DatabaseConfig::new(Engine::Mysql, "appdb"));
        conn.respond(
            "information_schema.tables",
            vec![Row::new(vec!["appdb".into(), "author".into()])],
        );
        let tables = introspection()
            .get_visible_tables_list(&mut conn)
            .await
            .unwrap();
        assert_eq!(tables, vec![QualifiedName::resolved(Some("appdb"), "author").unwrap()]);
        assert_eq!(conn.params()[0], vec![Value::from("appdb")]);
    }

    #[tokio::test]
    async fn test_get_indexes_skips_multicolumn() {
        let mut conn = RecordingConnection::new(DatabaseConfig::new(Engine::Mysql, "appdb"));
        conn.respond(
            "SHOW INDEX",
            vec![
                Row::new(vec!["t".into(), Value::Int(0), "PRIMARY".into(), Value::Int(1), "id".into()]),
                Row::new(vec!["t".into(), Value::Int(1), "t_ab".into(), Value::Int(1), "a".into()]),
                Row::new(vec!["t".into(), Value::Int(1), "t_ab".into(), Value::Int(2), "b".into()]),
                Row::new(vec!["t".into(), Value::Int(1), "t_c".into(), Value::Int(1), "c".into()]),
            ],
        );
        let name = QualifiedName::new(Some("s1"), "t").unwrap();
        let indexes = introspection().get_indexes(&mut conn, &name).await.unwrap();
        assert_eq!(conn.statements()[0], "SHOW INDEX FROM `s1`.`t`");
        assert_eq!(indexes.len(), 2);
        assert!(indexes["id"].primary_key && indexes["id"].unique);
        assert!(!indexes["c"].unique);
        assert_eq!(
            introspection()
                .get_primary_key_column(&mut conn, &name)
                .await
                .unwrap()
                .as_deref(),
            Some("id")
        );
    }

    #[tokio::test]
    async fn test_key_columns_force_schema() {
        let mut conn = RecordingConnection::new(DatabaseConfig::new(Engine::Mysql, "appdb"));
        conn.respond(
            "key_column_usage",
            vec![Row::new(vec![
                "author_id".into(),
                "s2".into(),
                "author".into(),
                "id".into(),
            ])],
        );
        let name = QualifiedName::new(None, "book").unwrap();
        let keys = introspection().get_key_columns(&mut conn, &name).await.unwrap();
        assert_eq!(conn.params()[0], vec![Value::from("book"), Value::from("appdb")]);
        assert_eq!(keys[0].referenced_table.schema(), Some("s2"));
    }
}
