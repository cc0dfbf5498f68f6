use super::Entity;
use core::fmt;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

impl Serialize for Entity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.to_integral())
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntityVisitor;

        impl<'de> Visitor<'de> for EntityVisitor {
            type Value = Entity;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an entity identifier")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Entity, E>
            where
                E: de::Error,
            {
                Ok(Entity::from_integral(value))
            }
        }

        deserializer.deserialize_u64(EntityVisitor)
    }
}

#[test]
fn serde_json() {
    let entity = Entity::from_parts(10, 2);
    let string = serde_json::to_string(&entity).unwrap();

    assert_eq!(serde_json::from_str::<Entity>(&string).unwrap(), entity);
}
