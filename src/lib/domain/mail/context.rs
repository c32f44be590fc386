//! Rendering context assembly

mod path;

use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

pub use path::{DottedPath, PathError};

/// A field value, either stored or computed on demand
#[derive(Clone)]
pub enum FieldValue {
    /// A plain value
    Literal(Value),

    /// A zero-argument accessor, evaluated while the context is built
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldValue {
    /// Evaluates the value
    pub fn resolve(&self) -> Value {
        match self {
            FieldValue::Literal(value) => value.clone(),
            FieldValue::Computed(accessor) => accessor(),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            FieldValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A field exposed by an [`Entity`]
#[derive(Clone, Debug)]
pub enum Field {
    /// A scalar field
    Value {
        /// Field name
        name: String,

        /// Field value
        value: FieldValue,
    },

    /// A many-to-many relation, flattened to the related identifiers
    ManyToMany {
        /// Field name
        name: String,

        /// Identifiers of the related objects, in order
        ids: Vec<Value>,
    },

    /// A single-valued relation, flattened to the related object's display string
    ForeignKey {
        /// Field name
        name: String,

        /// The related object, if set
        related: Option<Arc<dyn Entity>>,
    },
}

impl Field {
    /// A scalar field
    pub fn value(name: &str, value: impl Into<Value>) -> Self {
        Field::Value {
            name: name.to_string(),
            value: FieldValue::Literal(value.into()),
        }
    }

    /// A scalar field computed when the context is built
    pub fn computed(name: &str, accessor: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Field::Value {
            name: name.to_string(),
            value: FieldValue::Computed(Arc::new(accessor)),
        }
    }

    /// A many-to-many relation
    pub fn many_to_many(name: &str, ids: Vec<Value>) -> Self {
        Field::ManyToMany {
            name: name.to_string(),
            ids,
        }
    }

    /// A single-valued relation
    pub fn foreign_key(name: &str, related: Option<Arc<dyn Entity>>) -> Self {
        Field::ForeignKey {
            name: name.to_string(),
            related,
        }
    }
}

/// An object that can be flattened into a rendering context.
///
/// Each implementor lists the fields it exposes explicitly.
pub trait Entity: fmt::Debug + Send + Sync {
    /// Lowercase type name, used as the context key for the whole object
    fn type_name(&self) -> &str;

    /// The object's identity, [`None`] if it has not been stored yet
    fn pk(&self) -> Option<Value>;

    /// Human readable representation
    fn display(&self) -> String;

    /// Exposed fields
    fn fields(&self) -> Vec<Field>;
}

/// Flattens an entity's fields into context entries
pub fn flatten(entity: &dyn Entity) -> Map<String, Value> {
    let mut data = Map::new();

    for field in entity.fields() {
        match field {
            Field::Value { name, value } => {
                data.insert(name, value.resolve());
            }
            Field::ManyToMany { name, ids } => {
                let ids = if entity.pk().is_some() { ids } else { vec![] };
                data.insert(name, Value::Array(ids));
            }
            Field::ForeignKey { name, related } => {
                if let Some(related) = related {
                    data.insert(name, Value::String(related.display()));
                }
            }
        }
    }

    data
}

/// Converts an entity into a nested value, following single-valued relations
pub fn to_value(entity: &dyn Entity) -> Value {
    let mut data = flatten(entity);

    for field in entity.fields() {
        if let Field::ForeignKey {
            name,
            related: Some(related),
        } = field
        {
            data.insert(name, to_value(related.as_ref()));
        }
    }

    Value::Object(data)
}

/// An extra object passed to the dispatcher
#[derive(Clone, Debug)]
pub enum ContextObject {
    /// Merged key by key
    Map(Map<String, Value>),

    /// Flattened, and also exposed whole under its type name
    Entity(Arc<dyn Entity>),
}

impl ContextObject {
    /// Wraps an entity
    pub fn entity(entity: impl Entity + 'static) -> Self {
        ContextObject::Entity(Arc::new(entity))
    }
}

impl From<Map<String, Value>> for ContextObject {
    fn from(map: Map<String, Value>) -> Self {
        ContextObject::Map(map)
    }
}

/// The site a message is sent on behalf of
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Site {
    /// Site ID
    pub id: i64,

    /// Domain name
    pub domain: String,

    /// Display name
    pub name: String,
}

impl Entity for Site {
    fn type_name(&self) -> &str {
        "site"
    }

    fn pk(&self) -> Option<Value> {
        Some(self.id.into())
    }

    fn display(&self) -> String {
        self.domain.clone()
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::value("id", self.id),
            Field::value("domain", self.domain.as_str()),
            Field::value("name", self.name.as_str()),
        ]
    }
}

/// The merged rendering context
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    /// Looks up a top level key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Looks up a dotted path such as `user.email`
    pub fn dotval(&self, path: &str) -> Result<Option<&Value>, PathError> {
        Ok(path.parse::<DottedPath>()?.resolve(&self.0))
    }

    /// The underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn merge(&mut self, data: Map<String, Value>) {
        self.0.extend(data);
    }
}

/// Builds rendering contexts seeded with the current site
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    site: Site,
    show_context: bool,
}

impl ContextBuilder {
    /// Creates a new context builder.
    ///
    /// # Arguments
    /// * `site` - The site every context is seeded with.
    /// * `show_context` - Emit each built context as a diagnostic.
    pub fn new(site: Site, show_context: bool) -> Self {
        Self { site, show_context }
    }

    /// The seed site
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Merges the site and the extra objects in order, later keys winning
    pub fn build(&self, objects: &[ContextObject]) -> Context {
        let mut context = Context(flatten(&self.site));

        for object in objects {
            match object {
                ContextObject::Map(map) => context.merge(map.clone()),
                ContextObject::Entity(entity) => {
                    context.merge(flatten(entity.as_ref()));
                    context
                        .0
                        .insert(entity.type_name().to_lowercase(), to_value(entity.as_ref()));
                }
            }
        }

        if self.show_context {
            info!(target: "db_mailer::context", "{:#?}", context.0);
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug)]
    struct Company {
        name: String,
    }

    impl Entity for Company {
        fn type_name(&self) -> &str {
            "Company"
        }

        fn pk(&self) -> Option<Value> {
            Some(json!(7))
        }

        fn display(&self) -> String {
            self.name.clone()
        }

        fn fields(&self) -> Vec<Field> {
            vec![Field::value("name", self.name.as_str())]
        }
    }

    #[derive(Debug)]
    struct Customer {
        id: Option<i64>,
        email: String,
        company: Option<Arc<dyn Entity>>,
        tags: Vec<i64>,
    }

    impl Entity for Customer {
        fn type_name(&self) -> &str {
            "Customer"
        }

        fn pk(&self) -> Option<Value> {
            self.id.map(Value::from)
        }

        fn display(&self) -> String {
            self.email.clone()
        }

        fn fields(&self) -> Vec<Field> {
            let email = self.email.clone();

            vec![
                Field::value("email", self.email.as_str()),
                Field::computed("greeting", move || json!(format!("Hi {}", email))),
                Field::foreign_key("company", self.company.clone()),
                Field::many_to_many("tags", self.tags.iter().map(|t| json!(t)).collect()),
            ]
        }
    }

    fn site() -> Site {
        Site {
            id: 1,
            domain: "example.com".to_string(),
            name: "Example".to_string(),
        }
    }

    fn customer(id: Option<i64>) -> Customer {
        Customer {
            id,
            email: "ann@example.com".to_string(),
            company: Some(Arc::new(Company {
                name: "Acme".to_string(),
            })),
            tags: vec![3, 5],
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_context_is_seeded_with_site() {
        let context = ContextBuilder::new(site(), false).build(&[]);

        assert_eq!(context.get("domain"), Some(&json!("example.com")));
        assert_eq!(context.get("name"), Some(&json!("Example")));
        assert_eq!(context.get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_later_objects_overwrite_earlier_keys() {
        let context = ContextBuilder::new(site(), false).build(&[
            map(json!({"name": "first", "a": 1})).into(),
            map(json!({"name": "second"})).into(),
        ]);

        assert_eq!(context.get("name"), Some(&json!("second")));
        assert_eq!(context.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_entity_is_flattened_and_exposed_whole() -> TestResult {
        let context = ContextBuilder::new(site(), false)
            .build(&[ContextObject::entity(customer(Some(9)))]);

        assert_eq!(context.get("email"), Some(&json!("ann@example.com")));
        assert_eq!(context.get("greeting"), Some(&json!("Hi ann@example.com")));
        assert_eq!(context.get("company"), Some(&json!("Acme")));
        assert_eq!(context.get("tags"), Some(&json!([3, 5])));
        assert_eq!(
            context.dotval("customer.company.name")?,
            Some(&json!("Acme"))
        );

        Ok(())
    }

    #[test]
    fn test_unsaved_entity_has_empty_many_to_many() {
        let context =
            ContextBuilder::new(site(), false).build(&[ContextObject::entity(customer(None))]);

        assert_eq!(context.get("tags"), Some(&json!([])));
    }

    #[test]
    fn test_unset_foreign_key_is_omitted() {
        let mut customer = customer(Some(1));
        customer.company = None;

        let context =
            ContextBuilder::new(site(), false).build(&[ContextObject::entity(customer)]);

        assert_eq!(context.get("company"), None);
    }

    #[test]
    fn test_building_twice_gives_identical_contexts() {
        let builder = ContextBuilder::new(site(), true);
        let objects = vec![
            ContextObject::entity(customer(Some(2))),
            map(json!({"email": "override@example.com"})).into(),
        ];

        let first = builder.build(&objects);
        let second = builder.build(&objects);

        assert_eq!(first, second);
        assert_eq!(first.get("email"), Some(&json!("override@example.com")));
    }
}
