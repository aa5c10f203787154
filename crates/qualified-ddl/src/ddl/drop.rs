//! Drop generation, the mirror of table creation.

use tracing::debug;

use super::pending::{PendingReference, ReferenceMap};
use super::DdlGenerator;
use crate::core::model::Model;
use crate::error::Result;

impl DdlGenerator<'_> {
    /// Foreign keys that must be removed explicitly before dropping tables.
    ///
    /// Models are visited in declaration order; a reference is recorded
    /// only when its target has not been visited yet, that is when the
    /// target is the model itself or one declared after it.
    pub fn references_to_delete(&self) -> Result<ReferenceMap> {
        let mut visited = Vec::new();
        let mut references = ReferenceMap::new();
        for model in self.models().iter().filter(|m| m.owns_table()) {
            for field in model.fields.iter().filter(|f| f.is_relation()) {
                let target = self.models().target_of(field)?;
                if !visited.contains(&target.name.as_str()) {
                    references
                        .entry(target.name.clone())
                        .or_default()
                        .push(PendingReference::new(&model.name, &field.name));
                }
            }
            visited.push(model.name.as_str());
        }
        Ok(references)
    }

    /// Statements dropping a model's table.
    ///
    /// Constraints recorded for this model in `references_to_delete` are
    /// dropped first and removed from the map; then the table; then the
    /// auto-increment sequence where the backend keeps one.
    pub fn drop_table_statements(
        &self,
        model: &Model,
        references_to_delete: &mut ReferenceMap,
    ) -> Result<Vec<String>> {
        if !model.owns_table() {
            return Ok(Vec::new());
        }
        let backend = self.backend();
        let qname = model.qualified_name();
        let mut output = Vec::new();

        for reference in references_to_delete
            .shift_remove(&model.name)
            .unwrap_or_default()
        {
            let referencing = self.models().get(&reference.model)?;
            let field = self.field_of(referencing, &reference.field)?;
            let name = self.foreign_key_constraint_name(referencing, field, model)?;
            output.push(format!(
                "ALTER TABLE {} {} {}",
                backend.compose(&referencing.qualified_name()),
                backend.drop_foreignkey_sql(),
                backend.quote_name(&name)
            ));
        }

        output.push(format!("DROP TABLE {}", backend.compose(&qname)));
        if model.auto_field().is_some() {
            output.extend(backend.drop_sequence_sql(&qname));
        }
        debug!("Generated {} drop statement(s) for {}", output.len(), model.name);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{DatabaseConfig, Engine};
    use crate::core::model::{Field, Model, ModelRegistry};
    use crate::ddl::{BatchState, DdlGenerator};
    use crate::drivers::BackendImpl;

    fn models() -> ModelRegistry {
        ModelRegistry::new(vec![
            Model::new("app.Book", "book")
                .field(Field::auto("id"))
                .field(Field::foreign_key("author", "app.Author")),
            Model::new("app.Author", "author")
                .field(Field::auto("id"))
                .field(Field::foreign_key("mentor", "app.Author").nullable()),
            Model::new("app.Review", "review")
                .field(Field::auto("id"))
                .field(Field::foreign_key("book", "app.Book")),
        ])
        .unwrap()
    }

    fn backend(engine: Engine) -> BackendImpl {
        BackendImpl::from_config(&DatabaseConfig::new(engine, "app").user("app"))
    }

    #[test]
    fn test_references_to_delete_only_later_targets() {
        let models = models();
        let backend = backend(Engine::Postgresql);
        let generator = DdlGenerator::new(&backend, &models);
        let refs = generator.references_to_delete().unwrap();

        assert_eq!(refs.len(), 1);
        let author = &refs["app.Author"];
        assert_eq!(author.len(), 2);
        assert_eq!(author[0].model, "app.Book");
        assert_eq!(author[1].model, "app.Author");
    }

    #[test]
    fn test_drop_statements_mysql() {
        let models = models();
        let backend = backend(Engine::Mysql);
        let generator = DdlGenerator::new(&backend, &models);
        let mut refs = generator.references_to_delete().unwrap();

        let statements = generator
            .drop_table_statements(models.get("app.Author").unwrap(), &mut refs)
            .unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("ALTER TABLE `book` DROP FOREIGN KEY `author_id_refs_id_"));
        assert!(statements[1].starts_with("ALTER TABLE `author` DROP FOREIGN KEY `mentor_id_refs_id_"));
        assert_eq!(statements[2], "DROP TABLE `author`");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_drop_sequence_on_oracle() {
        let models = models();
        let backend = backend(Engine::Oracle);
        let generator = DdlGenerator::new(&backend, &models);
        let mut refs = generator.references_to_delete().unwrap();
        let statements = generator
            .drop_table_statements(models.get("app.Review").unwrap(), &mut refs)
            .unwrap();
        assert_eq!(statements, vec!["DROP TABLE \"REVIEW\"", "DROP SEQUENCE \"REVIEW_SQ\""]);
    }

    #[test]
    fn test_drop_constraint_name_matches_create() {
        let models = models();
        let backend = backend(Engine::Mysql);
        let generator = DdlGenerator::new(&backend, &models);

        let mut state = BatchState::new();
        let mut created = Vec::new();
        for model in models.iter() {
            created.extend(generator.create_model_statements(model, &mut state).unwrap().deferred);
        }

        let mut refs = generator.references_to_delete().unwrap();
        let dropped = generator
            .drop_table_statements(models.get("app.Author").unwrap(), &mut refs)
            .unwrap();
        let name_of = |sql: &str, keyword: &str| {
            let rest = &sql[sql.find(keyword).unwrap() + keyword.len()..];
            rest.split_whitespace().next().unwrap().to_string()
        };
        let created_book = created
            .iter()
            .find(|s| s.starts_with("ALTER TABLE `book`") && s.contains("`author`"))
            .unwrap();
        assert_eq!(
            name_of(created_book.as_str(), "ADD CONSTRAINT "),
            name_of(dropped[0].as_str(), "DROP FOREIGN KEY ")
        );
    }
}
