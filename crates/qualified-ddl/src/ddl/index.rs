//! `CREATE INDEX` generation.

use super::DdlGenerator;
use crate::core::model::Model;

impl DdlGenerator<'_> {
    /// One `CREATE INDEX` per indexed column that is not already unique.
    pub fn index_statements(&self, model: &Model) -> Vec<String> {
        if !model.owns_table() {
            return Vec::new();
        }
        let backend = self.backend();
        let table = backend.compose(&model.qualified_name());
        model
            .fields
            .iter()
            .filter(|f| f.is_indexed() && !f.is_unique())
            .map(|field| {
                let column = field.column();
                let tablespace = self
                    .tablespace_for(model, field, false)
                    .map(|ts| format!(" {}", ts))
                    .unwrap_or_default();
                format!(
                    "CREATE INDEX {} ON {} ({}){}",
                    backend.qualified_index_name(model, &column),
                    table,
                    backend.quote_name(&column),
                    tablespace
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{DatabaseConfig, Engine};
    use crate::core::model::{Field, Model, ModelRegistry};
    use crate::ddl::DdlGenerator;
    use crate::drivers::BackendImpl;

    fn models() -> ModelRegistry {
        ModelRegistry::new(vec![
            Model::new("app.Author", "author")
                .schema("people")
                .field(Field::auto("id"))
                .field(Field::char("email", 100).unique().indexed(true)),
            Model::new("app.Book", "book")
                .schema("library")
                .field(Field::auto("id"))
                .field(Field::char("title", 100).indexed(true).tablespace("idx"))
                .field(Field::foreign_key("author", "app.Author"))
                .field(Field::one_to_one("cover", "app.Author"))
                .field(Field::integer("pages")),
        ])
        .unwrap()
    }

    #[test]
    fn test_index_statements_postgres() {
        let models = models();
        let backend = BackendImpl::from_config(
            &DatabaseConfig::new(Engine::Postgresql, "app").user("app"),
        );
        let generator = DdlGenerator::new(&backend, &models);

        assert!(generator
            .index_statements(models.get("app.Author").unwrap())
            .is_empty());

        let statements = generator.index_statements(models.get("app.Book").unwrap());
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE INDEX \"book_"));
        assert!(statements[0].ends_with("ON \"library\".\"book\" (\"title\") TABLESPACE \"idx\""));
        assert!(statements[1].ends_with("ON \"library\".\"book\" (\"author_id\")"));
    }

    #[test]
    fn test_index_statements_deterministic() {
        let models = models();
        let backend =
            BackendImpl::from_config(&DatabaseConfig::new(Engine::Mysql, "app").user("app"));
        let generator = DdlGenerator::new(&backend, &models);
        let book = models.get("app.Book").unwrap();
        assert_eq!(generator.index_statements(book), generator.index_statements(book));
    }

    #[test]
    fn test_unmanaged_has_no_indexes() {
        let models = ModelRegistry::new(vec![Model::new("app.Legacy", "legacy")
            .unmanaged()
            .field(Field::integer("n").indexed(true))])
        .unwrap();
        let backend =
            BackendImpl::from_config(&DatabaseConfig::new(Engine::Mysql, "app").user("app"));
        let generator = DdlGenerator::new(&backend, &models);
        assert!(generator
            .index_statements(models.get("app.Legacy").unwrap())
            .is_empty());
    }

    #[test]
    fn test_long_table_index_names_stay_distinct() {
        let prefix = "x".repeat(60);
        for (engine, first, second) in [
            (Engine::Postgresql, format!("{}_one", prefix), format!("{}_two", prefix)),
            (
                Engine::Oracle,
                "customer_address_history".to_string(),
                "customer_address_history_old".to_string(),
            ),
        ] {
            let models = ModelRegistry::new(vec![
                Model::new("app.First", first)
                    .schema("s")
                    .field(Field::auto("id"))
                    .field(Field::date_time("created_at").indexed(true)),
                Model::new("app.Second", second)
                    .schema("s")
                    .field(Field::auto("id"))
                    .field(Field::date_time("created_at").indexed(true)),
            ])
            .unwrap();
            let backend =
                BackendImpl::from_config(&DatabaseConfig::new(engine, "app").user("app"));
            let generator = DdlGenerator::new(&backend, &models);

            let first = generator.index_statements(models.get("app.First").unwrap());
            let second = generator.index_statements(models.get("app.Second").unwrap());
            let index_name = |sql: &str| sql.split(" ON ").next().unwrap().to_string();
            assert_eq!(first.len(), 1);
            assert_eq!(second.len(), 1);
            assert_ne!(index_name(&first[0]), index_name(&second[0]), "{}", engine);
        }
    }
}
