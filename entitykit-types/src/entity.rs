use crate::{EntityId, Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Name of the identifier field inside every entity record.
pub const ID_FIELD: &str = "id";

/// A record held in a feature's entity collection.
///
/// The record is a flat JSON object whose `id` field identifies it; the rest
/// of the shape is defined by whoever loads the data. The identifier is
/// cached alongside the fields and always agrees with `fields["id"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    fields: Map<String, Value>,
}

impl Entity {
    /// Builds an entity from a JSON object with a string or integer `id`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(Error::InvalidEntity("entity must be a JSON object".into()));
        };
        let id = fields
            .get(ID_FIELD)
            .and_then(EntityId::from_value)
            .ok_or_else(|| Error::InvalidEntity("entity has no resolvable id".into()))?;
        fields.insert(ID_FIELD.into(), id.to_value());
        Ok(Self { id, fields })
    }

    /// Creates an entity with the given ID and fields. Any `id` in `fields`
    /// is overwritten.
    #[must_use]
    pub fn with_fields(id: impl Into<EntityId>, mut fields: Map<String, Value>) -> Self {
        let id = id.into();
        fields.insert(ID_FIELD.into(), id.to_value());
        Self { id, fields }
    }

    /// A record carrying nothing but its ID. Used where a deleted entity has
    /// to be reported without its data.
    #[must_use]
    pub fn stub(id: impl Into<EntityId>) -> Self {
        Self::with_fields(id, Map::new())
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Extract a string value using a JSON pointer (e.g., "/title").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean value using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a numeric value using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.pointer(pointer).and_then(|v| v.as_f64())
    }

    /// Resolves the first reference token against the record, then hands the
    /// rest of the pointer to [`Value::pointer`].
    fn pointer(&self, pointer: &str) -> Option<&Value> {
        let tail = pointer.strip_prefix('/')?;
        let (token, rest) = tail.split_at(tail.find('/').unwrap_or(tail.len()));
        let field = self.fields.get(&token.replace("~1", "/").replace("~0", "~"))?;
        field.pointer(rest)
    }

    /// Returns a copy with `changes` shallow-merged over the current fields.
    ///
    /// A resolvable `id` in `changes` renames the entity; an unresolvable one
    /// is ignored so the record never loses its identity.
    #[must_use]
    pub fn apply_changes(&self, changes: &Map<String, Value>) -> Self {
        let mut fields = self.fields.clone();
        let mut id = self.id.clone();
        for (key, value) in changes {
            if key == ID_FIELD {
                if let Some(new_id) = EntityId::from_value(value) {
                    id = new_id;
                }
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
        fields.insert(ID_FIELD.into(), id.to_value());
        Self { id, fields }
    }

    /// The record as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// A partial update addressed to one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub id: EntityId,
    pub changes: Map<String, Value>,
}

impl EntityUpdate {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, changes: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            changes,
        }
    }

    /// The new ID when this update renames the entity.
    #[must_use]
    pub fn renamed_to(&self) -> Option<EntityId> {
        self.changes
            .get(ID_FIELD)
            .and_then(EntityId::from_value)
            .filter(|new_id| *new_id != self.id)
    }
}
