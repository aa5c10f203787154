//! Model metadata consumed by the DDL generator.
//!
//! A [`Model`] is a plain description of one table: its declared name and
//! schema, lifecycle flags, ordered fields and multi-column uniqueness groups.
//! Models are usually loaded from the project YAML file, but they can also be
//! built in code with the builder methods, which is how the database cache
//! table is described.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::identifier::validate_identifier;
use super::qname::QualifiedName;
use crate::error::{DdlError, Result};

fn default_true() -> bool {
    true
}

fn default_slug_length() -> u32 {
    50
}

/// Column type family of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Auto-assigned integer primary key.
    Auto,
    BigInteger,
    Boolean,
    Char {
        max_length: u32,
    },
    Slug {
        #[serde(default = "default_slug_length")]
        max_length: u32,
    },
    Text,
    Date,
    DateTime,
    Time,
    Decimal {
        max_digits: u32,
        decimal_places: u32,
    },
    Float,
    Integer,
    SmallInteger,
    PositiveInteger,
    PositiveSmallInteger,
    GenericIpAddress,
    /// Many-to-one reference to another model.
    ForeignKey {
        to: String,
        #[serde(default)]
        to_field: Option<String>,
    },
    /// Unique reference to another model.
    OneToOne {
        to: String,
        #[serde(default)]
        to_field: Option<String>,
    },
}

impl FieldKind {
    /// Whether values of this kind may be the empty string.
    pub fn allows_empty_strings(&self) -> bool {
        matches!(
            self,
            FieldKind::Char { .. } | FieldKind::Slug { .. } | FieldKind::Text
        )
    }

    /// Target model label and optional target field for relation kinds.
    pub fn relation(&self) -> Option<(&str, Option<&str>)> {
        match self {
            FieldKind::ForeignKey { to, to_field } | FieldKind::OneToOne { to, to_field } => {
                Some((to.as_str(), to_field.as_deref()))
            }
            _ => None,
        }
    }
}

/// One column-backed field of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// Explicit column name; defaults to the field name (`<name>_id` for relations).
    #[serde(default, rename = "db_column", skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(flatten)]
    pub kind: FieldKind,

    #[serde(default)]
    pub null: bool,

    /// Form-level flag carried for metadata compatibility. Column nullability
    /// never reads it; see [`FieldKind::allows_empty_strings`].
    #[serde(default)]
    pub blank: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub primary_key: bool,

    /// Explicit index flag; relations are indexed unless set to false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_index: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_tablespace: Option<String>,
}

impl Field {
    /// Field of the given kind with every flag off.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind,
            null: false,
            blank: false,
            unique: false,
            primary_key: false,
            db_index: None,
            db_tablespace: None,
        }
    }

    /// Auto-assigned integer primary key.
    pub fn auto(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Auto).primary_key()
    }

    pub fn char(name: impl Into<String>, max_length: u32) -> Self {
        Self::new(name, FieldKind::Char { max_length })
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn foreign_key(name: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::ForeignKey {
                to: to.into(),
                to_field: None,
            },
        )
    }

    pub fn one_to_one(name: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::OneToOne {
                to: to.into(),
                to_field: None,
            },
        )
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    pub fn indexed(mut self, db_index: bool) -> Self {
        self.db_index = Some(db_index);
        self
    }

    pub fn db_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn tablespace(mut self, tablespace: impl Into<String>) -> Self {
        self.db_tablespace = Some(tablespace.into());
        self
    }

    /// Database column name.
    pub fn column(&self) -> String {
        match (&self.column, self.kind.relation()) {
            (Some(column), _) => column.clone(),
            (None, Some(_)) => format!("{}_id", self.name),
            (None, None) => self.name.clone(),
        }
    }

    /// Whether the column carries a uniqueness guarantee (and therefore its own index).
    pub fn is_unique(&self) -> bool {
        self.unique || self.primary_key || matches!(self.kind, FieldKind::OneToOne { .. })
    }

    /// Whether the column wants a plain index.
    pub fn is_indexed(&self) -> bool {
        self.db_index.unwrap_or_else(|| self.kind.relation().is_some())
    }

    /// Whether this field references another model.
    pub fn is_relation(&self) -> bool {
        self.kind.relation().is_some()
    }
}

/// Metadata for one model (one table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Unique label, e.g. `app.ModelName`.
    pub name: String,

    pub db_table: String,

    #[serde(default)]
    pub db_schema: Option<String>,

    /// Unmanaged models own no physical table.
    #[serde(default = "default_true")]
    pub managed: bool,

    /// Proxy models share their parent's table.
    #[serde(default)]
    pub proxy: bool,

    #[serde(default)]
    pub db_tablespace: Option<String>,

    /// Multi-column uniqueness groups, by field name.
    #[serde(default)]
    pub unique_together: Vec<Vec<String>>,

    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Model {
    pub fn new(name: impl Into<String>, db_table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_table: db_table.into(),
            db_schema: None,
            managed: true,
            proxy: false,
            db_tablespace: None,
            unique_together: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.db_schema = Some(schema.into());
        self
    }

    pub fn unmanaged(mut self) -> Self {
        self.managed = false;
        self
    }

    pub fn proxy(mut self) -> Self {
        self.proxy = true;
        self
    }

    pub fn tablespace(mut self, tablespace: impl Into<String>) -> Self {
        self.db_tablespace = Some(tablespace.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn unique_together<I, S>(mut self, group: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_together
            .push(group.into_iter().map(Into::into).collect());
        self
    }

    /// Model describing the database cache table.
    pub fn cache_table(table: &str) -> Self {
        Model::new(format!("cache.{}", table), table)
            .field(Field::char("cache_key", 255).primary_key())
            .field(Field::text("value"))
            .field(Field::date_time("expires").indexed(true))
    }

    /// Unresolved qualified name as declared.
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::from_parts(self.db_schema.clone(), self.db_table.clone(), false)
            .with_model(self.name.clone())
    }

    /// Whether DDL should be generated for this model.
    pub fn owns_table(&self) -> bool {
        self.managed && !self.proxy
    }

    /// Look up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary key field.
    pub fn pk(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// The auto-assigned primary key, if the model has one.
    pub fn auto_field(&self) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.primary_key && f.kind == FieldKind::Auto)
    }
}

/// Models of one project, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Model>,
}

impl ModelRegistry {
    /// Build a registry, validating names and relation targets.
    ///
    /// # Errors
    ///
    /// Returns `DdlError::Config` for duplicate labels, bad identifiers or
    /// unknown `unique_together` members, and `DdlError::UnknownModel` for a
    /// relation to an unregistered model.
    pub fn new(models: Vec<Model>) -> Result<Self> {
        let mut map = IndexMap::with_capacity(models.len());
        for model in models {
            if map.contains_key(&model.name) {
                return Err(DdlError::Config(format!(
                    "Duplicate model name: {}",
                    model.name
                )));
            }
            map.insert(model.name.clone(), model);
        }
        let registry = Self { models: map };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        for model in self.models.values() {
            validate_identifier(&model.db_table).map_err(|e| {
                DdlError::Config(format!("Model {}: invalid db_table: {}", model.name, e))
            })?;
            if let Some(schema) = &model.db_schema {
                validate_identifier(schema).map_err(|e| {
                    DdlError::Config(format!("Model {}: invalid db_schema: {}", model.name, e))
                })?;
            }
            for field in &model.fields {
                validate_identifier(&field.column()).map_err(|e| {
                    DdlError::Config(format!(
                        "Model {}: invalid column for field {}: {}",
                        model.name, field.name, e
                    ))
                })?;
                if field.is_relation() {
                    self.target_field(field)?;
                }
            }
            for group in &model.unique_together {
                for name in group {
                    if model.get_field(name).is_none() {
                        return Err(DdlError::Config(format!(
                            "Model {}: unique_together names unknown field {}",
                            model.name, name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up a model by label.
    pub fn get(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| DdlError::UnknownModel(name.to_string()))
    }

    /// Declaration position of a model.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.models.get_index_of(name)
    }

    /// Model referenced by a relation field.
    pub fn target_of(&self, field: &Field) -> Result<&Model> {
        let (to, _) = field.kind.relation().ok_or_else(|| {
            DdlError::Config(format!("Field {} is not a relation", field.name))
        })?;
        self.get(to)
    }

    /// Field referenced by a relation: `to_field` when given, else the target's primary key.
    pub fn target_field(&self, field: &Field) -> Result<&Field> {
        let target = self.target_of(field)?;
        let found = match field.kind.relation() {
            Some((_, Some(to_field))) => target.get_field(to_field),
            _ => target.pk(),
        };
        found.ok_or_else(|| {
            DdlError::Config(format!(
                "Field {} references {} which has no matching target field",
                field.name, target.name
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Model {
        Model::new("app.Author", "author")
            .field(Field::auto("id"))
            .field(Field::char("name", 100))
    }

    #[test]
    fn test_relation_column_defaults_to_id_suffix() {
        let fk = Field::foreign_key("author", "app.Author");
        assert_eq!(fk.column(), "author_id");
        assert!(fk.is_indexed());
        assert_eq!(fk.clone().db_column("writer").column(), "writer");
        assert_eq!(Field::integer("n").column(), "n");
    }

    #[test]
    fn test_unique_covers_pk_and_one_to_one() {
        assert!(Field::auto("id").is_unique());
        assert!(Field::one_to_one("profile", "app.P").is_unique());
        assert!(!Field::integer("n").is_unique());
    }

    #[test]
    fn test_registry_rejects_unknown_target() {
        let book = Model::new("app.Book", "book")
            .field(Field::auto("id"))
            .field(Field::foreign_key("author", "app.Missing"));
        let err = ModelRegistry::new(vec![author(), book]).unwrap_err();
        assert!(matches!(err, DdlError::UnknownModel(ref m) if m == "app.Missing"));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let err = ModelRegistry::new(vec![author(), author()]).unwrap_err();
        assert!(err.to_string().contains("Duplicate model name"));
    }

    #[test]
    fn test_registry_rejects_unknown_unique_together_member() {
        let model = author().unique_together(["name", "missing"]);
        let err = ModelRegistry::new(vec![model]).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_target_field_defaults_to_pk() {
        let book = Model::new("app.Book", "book")
            .field(Field::auto("id"))
            .field(Field::foreign_key("author", "app.Author"));
        let registry = ModelRegistry::new(vec![author(), book]).unwrap();
        let fk = registry.get("app.Book").unwrap().get_field("author").unwrap();
        assert_eq!(registry.target_field(fk).unwrap().name, "id");
        assert_eq!(registry.position("app.Book"), Some(1));
    }

    #[test]
    fn test_cache_table_model() {
        let model = Model::cache_table("cache_entries");
        assert_eq!(model.db_table, "cache_entries");
        assert_eq!(model.pk().unwrap().name, "cache_key");
        assert!(model.auto_field().is_none());
        assert!(model.get_field("expires").unwrap().is_indexed());
    }

    #[test]
    fn test_deserialize_field_kinds() {
        let yaml = r#"
name: app.Entry
db_table: entry
db_schema: blog
fields:
  - { name: id, type: auto, primary_key: true }
  - { name: slug, type: slug }
  - { name: price, type: decimal, max_digits: 10, decimal_places: 2 }
  - { name: author, type: foreign_key, to: app.Author, null: true }
"#;
        let model: Model = serde_yaml::from_str(yaml).unwrap();
        assert!(model.managed);
        assert_eq!(model.db_schema.as_deref(), Some("blog"));
        assert_eq!(model.fields[1].kind, FieldKind::Slug { max_length: 50 });
        assert_eq!(
            model.fields[3].kind.relation(),
            Some(("app.Author", None))
        );
        assert!(model.fields[3].null);
    }
}
